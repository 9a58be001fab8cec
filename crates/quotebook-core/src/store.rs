//! Quote store
//!
//! The `QuoteStore` owns the quote list and mirrors it to a key-value
//! backend after every mutation.
//!
//! ## Snapshot
//!
//! The whole list is written as one JSON array under the `quotes` key. On
//! startup the snapshot is read back; a missing or unreadable snapshot is
//! replaced by the seed quotes, which are persisted right away.
//!
//! ## Commit rule
//!
//! Mutations build the next list, persist it, and only then swap it in.
//! A failed write leaves both memory and storage at the previous state.
//!
//! ## Usage
//!
//! ```ignore
//! let mut store = QuoteStore::open(&config)?;
//! store.add("Stay hungry, stay foolish.", "Motivation")?;
//! let life = store.list_by_category(&CategoryFilter::only("Life"));
//! ```

use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{QuoteError, QuoteResult};
use crate::models::{seed_quotes, CategoryFilter, Quote};
use crate::storage::{
    KeyValueStore, MemoryStore, SqliteStore, StorageStats, LAST_CATEGORY_KEY, LAST_QUOTE_KEY,
    LAST_SYNCED_KEY, QUOTES_KEY,
};

/// How the store obtained its initial list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitSource {
    /// Read from a valid snapshot
    Snapshot,
    /// No usable snapshot; the seed list was written
    Seeded,
}

/// Owner of the quote list
pub struct QuoteStore {
    quotes: Vec<Quote>,
    backend: Box<dyn KeyValueStore>,
    session: Box<dyn KeyValueStore>,
    init_source: InitSource,
}

impl QuoteStore {
    /// Open the durable store described by `config`
    ///
    /// Session state lives in memory and disappears with the process.
    pub fn open(config: &Config) -> QuoteResult<Self> {
        let backend = SqliteStore::open(&config.database_path())?;
        Self::initialize(Box::new(backend), Box::new(MemoryStore::new()))
    }

    /// Load the quote list from `backend`, seeding it if necessary
    ///
    /// Malformed snapshot data is treated as absent. Only a failing backend
    /// makes this return an error.
    pub fn initialize(
        mut backend: Box<dyn KeyValueStore>,
        session: Box<dyn KeyValueStore>,
    ) -> QuoteResult<Self> {
        let loaded = match backend.get(QUOTES_KEY)? {
            Some(raw) => match serde_json::from_str::<Vec<Quote>>(&raw) {
                Ok(quotes) => Some(quotes),
                Err(e) => {
                    warn!("Ignoring malformed quote snapshot: {}", e);
                    None
                }
            },
            None => None,
        };

        let (quotes, init_source) = match loaded {
            Some(quotes) => (quotes, InitSource::Snapshot),
            None => {
                let seed = seed_quotes();
                write_snapshot(backend.as_mut(), &seed)?;
                debug!("Seeded quote store with {} quotes", seed.len());
                (seed, InitSource::Seeded)
            }
        };

        Ok(Self {
            quotes,
            backend,
            session,
            init_source,
        })
    }

    /// Whether the list came from a snapshot or the seed
    pub fn init_source(&self) -> InitSource {
        self.init_source
    }

    /// What the durable backend holds
    pub fn storage_stats(&self) -> QuoteResult<StorageStats> {
        Ok(self.backend.stats()?)
    }

    // ==================== Reads ====================

    /// Every quote, in insertion order
    pub fn list_all(&self) -> &[Quote] {
        &self.quotes
    }

    /// Quotes passing `filter`; `All` returns the full list
    pub fn list_by_category(&self, filter: &CategoryFilter) -> Vec<Quote> {
        self.quotes
            .iter()
            .filter(|q| filter.matches(q))
            .cloned()
            .collect()
    }

    /// Unique categories in order of first appearance
    pub fn distinct_categories(&self) -> Vec<String> {
        let mut categories: Vec<String> = Vec::new();
        for quote in &self.quotes {
            if !categories.contains(&quote.category) {
                categories.push(quote.category.clone());
            }
        }
        categories
    }

    /// Categories with the number of quotes in each
    pub fn category_counts(&self) -> Vec<(String, usize)> {
        self.distinct_categories()
            .into_iter()
            .map(|category| {
                let count = self
                    .quotes
                    .iter()
                    .filter(|q| q.category == category)
                    .count();
                (category, count)
            })
            .collect()
    }

    /// Number of quotes
    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    /// Whether the list is empty
    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }

    /// Whether any quote has exactly this text
    pub fn contains_text(&self, text: &str) -> bool {
        self.quotes.iter().any(|q| q.text == text)
    }

    /// The list as pretty-printed JSON, as written by `export`
    pub fn export_json(&self) -> QuoteResult<String> {
        Ok(serde_json::to_string_pretty(&self.quotes)?)
    }

    // ==================== Mutations ====================

    /// Add a quote
    ///
    /// Both fields are trimmed; an empty field is rejected without touching
    /// the list or the backend.
    pub fn add(&mut self, text: &str, category: &str) -> QuoteResult<()> {
        let text = text.trim();
        let category = category.trim();

        if text.is_empty() {
            return Err(QuoteError::Validation { field: "text" });
        }
        if category.is_empty() {
            return Err(QuoteError::Validation { field: "category" });
        }

        let mut next = self.quotes.clone();
        next.push(Quote::new(text, category));
        self.commit(next)
    }

    /// Append a batch of raw quote records
    ///
    /// `candidates` must be a JSON array whose elements are objects with
    /// non-empty `text` and `category` strings. Any bad element rejects the
    /// whole batch. Valid batches are appended verbatim, without dedup.
    pub fn bulk_import(&mut self, candidates: Value) -> QuoteResult<usize> {
        let Value::Array(items) = candidates else {
            return Err(QuoteError::Format(
                "expected a JSON array of quotes".to_string(),
            ));
        };

        let mut imported = Vec::with_capacity(items.len());
        for (index, item) in items.into_iter().enumerate() {
            imported.push(quote_from_value(index, item)?);
        }

        let count = imported.len();
        let mut next = self.quotes.clone();
        next.extend(imported);
        self.commit(next)?;

        debug!("Imported {} quotes", count);
        Ok(count)
    }

    /// Parse `json` and import it with [`QuoteStore::bulk_import`]
    pub fn import_json(&mut self, json: &str) -> QuoteResult<usize> {
        let value: Value = serde_json::from_str(json)?;
        self.bulk_import(value)
    }

    /// Append each quote whose text is not present yet
    ///
    /// Quotes appended earlier in the same call count as present.
    /// Returns the number appended; nothing is written when that is zero.
    pub fn merge_missing_by_text(&mut self, incoming: Vec<Quote>) -> QuoteResult<usize> {
        let mut next = self.quotes.clone();
        let mut added = 0;

        for quote in incoming {
            if !next.iter().any(|q| q.same_text(&quote)) {
                next.push(quote);
                added += 1;
            }
        }

        if added > 0 {
            self.commit(next)?;
        }
        Ok(added)
    }

    /// Drop every quote tagged `category`, then append `incoming`
    ///
    /// Returns the number of quotes removed.
    pub fn replace_category(&mut self, category: &str, incoming: Vec<Quote>) -> QuoteResult<usize> {
        let mut next: Vec<Quote> = self
            .quotes
            .iter()
            .filter(|q| q.category != category)
            .cloned()
            .collect();
        let removed = self.quotes.len() - next.len();

        next.extend(incoming);
        self.commit(next)?;
        Ok(removed)
    }

    /// Persist `next` and make it the current list
    fn commit(&mut self, next: Vec<Quote>) -> QuoteResult<()> {
        write_snapshot(self.backend.as_mut(), &next)?;
        self.quotes = next;
        Ok(())
    }

    // ==================== Display state ====================

    /// Pick a random quote among those passing `filter`
    ///
    /// The pick is remembered as the session's last viewed quote.
    pub fn random_quote<R: Rng + ?Sized>(
        &mut self,
        filter: &CategoryFilter,
        rng: &mut R,
    ) -> QuoteResult<Option<Quote>> {
        let visible = self.list_by_category(filter);
        let Some(quote) = visible.choose(rng).cloned() else {
            return Ok(None);
        };

        self.session
            .set(LAST_QUOTE_KEY, &serde_json::to_string(&quote)?)?;
        Ok(Some(quote))
    }

    /// The last quote shown in this session
    pub fn last_viewed(&self) -> QuoteResult<Option<Quote>> {
        let Some(raw) = self.session.get(LAST_QUOTE_KEY)? else {
            return Ok(None);
        };
        Ok(serde_json::from_str(&raw).ok())
    }

    /// The persisted category selection (`All` when never set)
    pub fn selected_category(&self) -> QuoteResult<CategoryFilter> {
        Ok(CategoryFilter::from(self.backend.get(LAST_CATEGORY_KEY)?))
    }

    /// Persist the category selection
    pub fn select_category(&mut self, filter: &CategoryFilter) -> QuoteResult<()> {
        self.backend.set(LAST_CATEGORY_KEY, filter.as_str())?;
        Ok(())
    }

    /// When the remote feed was last merged successfully
    pub fn last_synced_at(&self) -> QuoteResult<Option<DateTime<Utc>>> {
        let Some(raw) = self.backend.get(LAST_SYNCED_KEY)? else {
            return Ok(None);
        };
        Ok(DateTime::parse_from_rfc3339(&raw)
            .ok()
            .map(|t| t.with_timezone(&Utc)))
    }

    /// Record a successful sync
    pub fn mark_synced(&mut self, at: DateTime<Utc>) -> QuoteResult<()> {
        self.backend.set(LAST_SYNCED_KEY, &at.to_rfc3339())?;
        Ok(())
    }
}

/// Serialize and write the full list
fn write_snapshot(backend: &mut dyn KeyValueStore, quotes: &[Quote]) -> QuoteResult<()> {
    let json = serde_json::to_string(quotes)?;
    backend.set(QUOTES_KEY, &json)?;
    debug!("Persisted {} quotes", quotes.len());
    Ok(())
}

/// Validate one element of an import batch
fn quote_from_value(index: usize, item: Value) -> QuoteResult<Quote> {
    let field = |name: &str| -> QuoteResult<String> {
        match item.get(name).and_then(Value::as_str) {
            Some(s) if !s.trim().is_empty() => Ok(s.to_string()),
            _ => Err(QuoteError::Format(format!(
                "item {} is missing a non-empty \"{}\"",
                index, name
            ))),
        }
    };

    if !item.is_object() {
        return Err(QuoteError::Format(format!("item {} is not an object", index)));
    }

    Ok(Quote::new(field("text")?, field("category")?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StorageError;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use serde_json::json;

    fn empty_store() -> QuoteStore {
        QuoteStore::initialize(Box::new(MemoryStore::new()), Box::new(MemoryStore::new()))
            .unwrap()
    }

    fn store_with(quotes: &[(&str, &str)]) -> QuoteStore {
        let list: Vec<Quote> = quotes.iter().map(|(t, c)| Quote::new(*t, *c)).collect();
        let backend = MemoryStore::with_entry(QUOTES_KEY, &serde_json::to_string(&list).unwrap());
        QuoteStore::initialize(Box::new(backend), Box::new(MemoryStore::new())).unwrap()
    }

    fn persisted(store: &QuoteStore) -> Vec<Quote> {
        let raw = store.backend.get(QUOTES_KEY).unwrap().unwrap();
        serde_json::from_str(&raw).unwrap()
    }

    /// Reopen a store over a read-only copy of its backend
    fn read_only(store: QuoteStore) -> QuoteStore {
        let raw = store.backend.get(QUOTES_KEY).unwrap().unwrap();
        let mut backend = MemoryStore::with_entry(QUOTES_KEY, &raw);
        backend.set_read_only(true);
        QuoteStore::initialize(Box::new(backend), Box::new(MemoryStore::new())).unwrap()
    }

    #[test]
    fn test_initialize_seeds_empty_backend() {
        let store = empty_store();

        assert_eq!(store.init_source(), InitSource::Seeded);
        assert_eq!(store.list_all(), seed_quotes().as_slice());
        assert_eq!(persisted(&store), seed_quotes());
    }

    #[test]
    fn test_initialize_treats_corrupt_snapshot_as_absent() {
        for raw in ["{not json", r#"{"text":"a"}"#, r#"[{"text":"a"}]"#, "42"] {
            let backend = MemoryStore::with_entry(QUOTES_KEY, raw);
            let store =
                QuoteStore::initialize(Box::new(backend), Box::new(MemoryStore::new())).unwrap();

            assert_eq!(store.init_source(), InitSource::Seeded, "snapshot {raw}");
            assert_eq!(store.list_all(), seed_quotes().as_slice());
            assert_eq!(persisted(&store), seed_quotes());
        }
    }

    #[test]
    fn test_initialize_loads_snapshot() {
        let store = store_with(&[("a", "b"), ("c", "d"), ("a", "e")]);

        assert_eq!(store.init_source(), InitSource::Snapshot);
        assert_eq!(store.len(), 3);
        assert_eq!(store.list_all()[2], Quote::new("a", "e"));
    }

    #[test]
    fn test_initialize_keeps_empty_snapshot() {
        let store = store_with(&[]);
        assert_eq!(store.init_source(), InitSource::Snapshot);
        assert!(store.is_empty());
    }

    #[test]
    fn test_add_rejects_empty_fields() {
        let mut store = empty_store();
        let before = store.list_all().to_vec();

        let err = store.add("", "X").unwrap_err();
        assert!(matches!(err, QuoteError::Validation { field: "text" }));

        let err = store.add("X", "   ").unwrap_err();
        assert!(matches!(err, QuoteError::Validation { field: "category" }));

        assert_eq!(store.list_all(), before.as_slice());
    }

    #[test]
    fn test_add_rejected_without_persisting() {
        // Any write attempt would surface as a storage error
        let mut store = read_only(empty_store());

        let err = store.add("", "X").unwrap_err();
        assert!(matches!(err, QuoteError::Validation { .. }));
        let err = store.add("X", "").unwrap_err();
        assert!(matches!(err, QuoteError::Validation { .. }));
    }

    #[test]
    fn test_add_appends_and_persists() {
        let mut store = empty_store();
        let before = store.len();

        store.add("hello", "Life").unwrap();

        assert_eq!(store.len(), before + 1);
        assert_eq!(store.list_all().last(), Some(&Quote::new("hello", "Life")));
        assert_eq!(persisted(&store), store.list_all());
    }

    #[test]
    fn test_add_trims_and_allows_duplicates() {
        let mut store = store_with(&[]);

        store.add("  hello  ", " Life ").unwrap();
        store.add("hello", "Life").unwrap();

        assert_eq!(
            store.list_all(),
            &[Quote::new("hello", "Life"), Quote::new("hello", "Life")]
        );
    }

    #[test]
    fn test_failed_persist_leaves_list_unchanged() {
        let mut store = read_only(store_with(&[("a", "b")]));

        let err = store.add("c", "d").unwrap_err();
        assert!(matches!(err, QuoteError::Storage(StorageError::Rejected { .. })));
        assert_eq!(store.list_all(), &[Quote::new("a", "b")]);

        assert!(store.import_json(r#"[{"text":"x","category":"y"}]"#).is_err());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_bulk_import_rejects_non_array() {
        let mut store = empty_store();
        let before = store.list_all().to_vec();

        for payload in [json!({"text": "a", "category": "b"}), json!("quotes"), json!(null)] {
            let err = store.bulk_import(payload).unwrap_err();
            assert!(matches!(err, QuoteError::Format(_)));
        }
        assert_eq!(store.list_all(), before.as_slice());
    }

    #[test]
    fn test_bulk_import_appends_in_order() {
        let mut store = empty_store();
        let before = store.len();

        let count = store
            .bulk_import(json!([
                {"text": "a", "category": "b"},
                {"text": "c", "category": "d"}
            ]))
            .unwrap();

        assert_eq!(count, 2);
        assert_eq!(store.len(), before + 2);
        assert_eq!(
            &store.list_all()[before..],
            &[Quote::new("a", "b"), Quote::new("c", "d")]
        );
        assert_eq!(persisted(&store), store.list_all());
    }

    #[test]
    fn test_bulk_import_rejects_incomplete_items() {
        let mut store = store_with(&[]);

        let bad_batches = [
            json!([{"text": "a", "category": "b"}, {"text": "c"}]),
            json!([{"text": "", "category": "b"}]),
            json!([{"text": "a", "category": 3}]),
            json!(["just a string"]),
        ];

        for batch in bad_batches {
            let err = store.bulk_import(batch).unwrap_err();
            assert!(matches!(err, QuoteError::Format(_)));
        }
        assert!(store.is_empty());
    }

    #[test]
    fn test_bulk_import_keeps_duplicates_and_extra_fields() {
        let mut store = store_with(&[("a", "b")]);

        let count = store
            .bulk_import(json!([{"text": "a", "category": "b", "author": "anon"}]))
            .unwrap();

        assert_eq!(count, 1);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_import_json_reports_parse_errors() {
        let mut store = store_with(&[]);
        let err = store.import_json("[{").unwrap_err();
        assert!(matches!(err, QuoteError::Parse(_)));
    }

    #[test]
    fn test_export_then_import_round_trip() {
        let source = store_with(&[("a", "b"), ("c", "d"), ("a", "Server")]);
        let exported = source.export_json().unwrap();
        assert!(exported.contains("\n  {"), "export should be pretty-printed");

        let mut target = store_with(&[]);
        target.import_json(&exported).unwrap();
        assert_eq!(target.list_all(), source.list_all());
    }

    #[test]
    fn test_list_by_category() {
        let store = store_with(&[("a", "Life"), ("b", "Server"), ("c", "Life")]);

        let life = store.list_by_category(&CategoryFilter::only("Life"));
        assert_eq!(life, vec![Quote::new("a", "Life"), Quote::new("c", "Life")]);

        assert!(store
            .list_by_category(&CategoryFilter::only("Nope"))
            .is_empty());
    }

    #[test]
    fn test_all_filter_matches_list_all() {
        let mut store = empty_store();
        assert_eq!(store.list_by_category(&CategoryFilter::All), store.list_all());

        store.add("x", "y").unwrap();
        assert_eq!(
            store.list_by_category(&CategoryFilter::from("all")),
            store.list_all()
        );

        let empty = store_with(&[]);
        assert_eq!(empty.list_by_category(&CategoryFilter::All), empty.list_all());
    }

    #[test]
    fn test_distinct_categories() {
        let store = store_with(&[("a", "Life"), ("b", "Server"), ("c", "Life"), ("d", "Art")]);

        assert_eq!(store.distinct_categories(), vec!["Life", "Server", "Art"]);
        assert_eq!(
            store.category_counts(),
            vec![
                ("Life".to_string(), 2),
                ("Server".to_string(), 1),
                ("Art".to_string(), 1)
            ]
        );
    }

    #[test]
    fn test_merge_missing_by_text() {
        let mut store = store_with(&[("hello", "Life")]);

        let added = store
            .merge_missing_by_text(vec![
                Quote::new("hello", "Server"),
                Quote::new("new", "Server"),
                Quote::new("new", "Server"),
            ])
            .unwrap();

        assert_eq!(added, 1);
        assert_eq!(
            store.list_all(),
            &[Quote::new("hello", "Life"), Quote::new("new", "Server")]
        );
        assert_eq!(persisted(&store), store.list_all());
    }

    #[test]
    fn test_merge_without_additions_skips_write() {
        // Read-only backend would fail any write
        let mut store = read_only(store_with(&[("hello", "Life")]));
        let added = store
            .merge_missing_by_text(vec![Quote::new("hello", "Server")])
            .unwrap();
        assert_eq!(added, 0);
    }

    #[test]
    fn test_replace_category() {
        let mut store = store_with(&[("old", "Server"), ("mine", "Life"), ("older", "Server")]);

        let removed = store
            .replace_category(
                "Server",
                vec![Quote::new("n1", "Server"), Quote::new("n2", "Server")],
            )
            .unwrap();

        assert_eq!(removed, 2);
        assert_eq!(
            store.list_all(),
            &[
                Quote::new("mine", "Life"),
                Quote::new("n1", "Server"),
                Quote::new("n2", "Server")
            ]
        );
        assert_eq!(persisted(&store), store.list_all());
    }

    #[test]
    fn test_random_quote_respects_filter() {
        let mut store = store_with(&[("a", "Life"), ("b", "Server"), ("c", "Life")]);
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..20 {
            let quote = store
                .random_quote(&CategoryFilter::only("Life"), &mut rng)
                .unwrap()
                .unwrap();
            assert_eq!(quote.category, "Life");
        }
    }

    #[test]
    fn test_random_quote_with_no_match() {
        let mut store = store_with(&[("a", "Life")]);
        let mut rng = StdRng::seed_from_u64(1);

        let quote = store
            .random_quote(&CategoryFilter::only("Server"), &mut rng)
            .unwrap();
        assert!(quote.is_none());
        assert!(store.last_viewed().unwrap().is_none());
    }

    #[test]
    fn test_random_quote_sets_last_viewed() {
        let mut store = store_with(&[("only", "Life")]);
        let mut rng = StdRng::seed_from_u64(1);

        assert!(store.last_viewed().unwrap().is_none());
        store.random_quote(&CategoryFilter::All, &mut rng).unwrap();
        assert_eq!(
            store.last_viewed().unwrap(),
            Some(Quote::new("only", "Life"))
        );

        // Session state never reaches the durable backend
        assert!(store.backend.get(LAST_QUOTE_KEY).unwrap().is_none());
    }

    #[test]
    fn test_last_viewed_ignores_malformed_session_value() {
        let session = MemoryStore::with_entry(LAST_QUOTE_KEY, "not json");
        let store = QuoteStore::initialize(Box::new(MemoryStore::new()), Box::new(session)).unwrap();
        assert!(store.last_viewed().unwrap().is_none());
    }

    #[test]
    fn test_category_selection_persists() {
        let mut store = empty_store();
        assert_eq!(store.selected_category().unwrap(), CategoryFilter::All);

        store
            .select_category(&CategoryFilter::only("Motivation"))
            .unwrap();

        let QuoteStore {
            backend, session, ..
        } = store;
        let reopened = QuoteStore::initialize(backend, session).unwrap();
        assert_eq!(
            reopened.selected_category().unwrap(),
            CategoryFilter::only("Motivation")
        );
        assert_eq!(reopened.init_source(), InitSource::Snapshot);
    }

    #[test]
    fn test_mark_synced() {
        let mut store = empty_store();
        assert!(store.last_synced_at().unwrap().is_none());

        let now = Utc::now();
        store.mark_synced(now).unwrap();

        let stored = store.last_synced_at().unwrap().unwrap();
        assert_eq!(stored.timestamp(), now.timestamp());
    }

    #[test]
    fn test_snapshot_survives_reopen_on_sqlite() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let config = Config {
            data_dir: temp_dir.path().to_path_buf(),
            ..Config::default()
        };

        {
            let mut store = QuoteStore::open(&config).unwrap();
            assert_eq!(store.init_source(), InitSource::Seeded);
            store.add("persisted", "Life").unwrap();
        }

        let store = QuoteStore::open(&config).unwrap();
        assert_eq!(store.init_source(), InitSource::Snapshot);
        assert_eq!(store.len(), 3);
        assert!(store.contains_text("persisted"));

        let stats = store.storage_stats().unwrap();
        assert_eq!(stats.location, Some(config.database_path()));
        assert!(stats.size_bytes > 0);
        assert_eq!(stats.keys, 1);
    }
}
