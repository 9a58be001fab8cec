//! Quote command handlers

use anyhow::{bail, Result};
use rand::Rng;

use quotebook_core::{CategoryFilter, QuoteError, QuoteStore};

use crate::output::{Output, NO_QUOTES_MESSAGE};

/// Add a new quote
pub fn add(store: &mut QuoteStore, text: &str, category: &str, output: &Output) -> Result<()> {
    match store.add(text, category) {
        Err(QuoteError::Validation { .. }) => {
            bail!("Please provide both quote text and category.")
        }
        result => result?,
    }
    output.success("Quote added!");
    Ok(())
}

/// List quotes, using the saved category selection when no filter is given
pub fn list(store: &QuoteStore, category: Option<String>, output: &Output) -> Result<()> {
    let filter = resolve_filter(store, category)?;
    output.print_quotes(&store.list_by_category(&filter));
    Ok(())
}

/// List categories with usage counts
pub fn categories(store: &QuoteStore, output: &Output) -> Result<()> {
    output.print_categories(&store.category_counts());
    Ok(())
}

/// Show a random quote
pub fn random<R: Rng + ?Sized>(
    store: &mut QuoteStore,
    category: Option<String>,
    rng: &mut R,
    output: &Output,
) -> Result<()> {
    let filter = resolve_filter(store, category)?;
    match store.random_quote(&filter, rng)? {
        Some(quote) => output.print_quote(&quote),
        None => output.message(NO_QUOTES_MESSAGE),
    }
    Ok(())
}

/// Select a category (or show the current one) and list its quotes
pub fn filter(store: &mut QuoteStore, category: Option<String>, output: &Output) -> Result<()> {
    let filter = match category {
        Some(category) => {
            let filter = CategoryFilter::from(category);
            store.select_category(&filter)?;
            filter
        }
        None => store.selected_category()?,
    };

    if !output.is_json() {
        output.message(&format!("Category: {}", describe_filter(&filter)));
    }
    output.print_quotes(&store.list_by_category(&filter));
    Ok(())
}

/// Show the last quote displayed in this session
pub fn last(store: &QuoteStore, output: &Output) -> Result<()> {
    match store.last_viewed()? {
        Some(quote) => output.print_quote(&quote),
        None => output.message("No quote shown yet."),
    }
    Ok(())
}

fn resolve_filter(store: &QuoteStore, category: Option<String>) -> Result<CategoryFilter> {
    match category {
        Some(category) => Ok(CategoryFilter::from(category)),
        None => Ok(store.selected_category()?),
    }
}

/// Human label for a filter
pub fn describe_filter(filter: &CategoryFilter) -> &str {
    match filter {
        CategoryFilter::All => "All Categories",
        CategoryFilter::Only(category) => category.as_str(),
    }
}
