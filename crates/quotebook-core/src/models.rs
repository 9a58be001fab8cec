//! Data models for quotebook
//!
//! Defines the core data structures: `Quote`, the `CategoryFilter` used to
//! narrow the list, and `RemotePost`, one entry of the remote quote feed.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Sentinel value meaning "no category filter"
pub const ALL_CATEGORIES: &str = "all";

/// A quote with its category
///
/// Quotes carry no identifier. Two quotes are considered the same entry for
/// dedup purposes when their `text` matches; the category is ignored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Quote {
    /// The quote itself
    pub text: String,
    /// Free-form category label
    pub category: String,
}

impl Quote {
    /// Create a new quote
    pub fn new(text: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            category: category.into(),
        }
    }

    /// Whether this quote has the same text as `other`
    pub fn same_text(&self, other: &Quote) -> bool {
        self.text == other.text
    }
}

impl fmt::Display for Quote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\" — [{}]", self.text, self.category)
    }
}

/// The quotes a fresh store starts with
pub fn seed_quotes() -> Vec<Quote> {
    vec![
        Quote::new(
            "The best way to get started is to quit talking and begin doing.",
            "Motivation",
        ),
        Quote::new(
            "Life is what happens when you’re busy making other plans.",
            "Life",
        ),
    ]
}

/// Which quotes to show
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    /// Every quote, regardless of category
    #[default]
    All,
    /// Only quotes whose category matches exactly
    Only(String),
}

impl CategoryFilter {
    /// Filter for a single category
    pub fn only(category: impl Into<String>) -> Self {
        CategoryFilter::Only(category.into())
    }

    /// Check whether a quote passes this filter
    pub fn matches(&self, quote: &Quote) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(category) => quote.category == *category,
        }
    }

    /// The value stored for this selection
    pub fn as_str(&self) -> &str {
        match self {
            CategoryFilter::All => ALL_CATEGORIES,
            CategoryFilter::Only(category) => category,
        }
    }
}

impl From<&str> for CategoryFilter {
    fn from(s: &str) -> Self {
        if s == ALL_CATEGORIES || s.is_empty() {
            CategoryFilter::All
        } else {
            CategoryFilter::Only(s.to_string())
        }
    }
}

impl From<String> for CategoryFilter {
    fn from(s: String) -> Self {
        CategoryFilter::from(s.as_str())
    }
}

impl From<Option<String>> for CategoryFilter {
    fn from(s: Option<String>) -> Self {
        s.map(CategoryFilter::from).unwrap_or_default()
    }
}

impl FromStr for CategoryFilter {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(CategoryFilter::from(s))
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of the remote quote feed
///
/// The feed is a JSON array of post-like objects. Only `title` is used;
/// every other field is ignored whatever its type.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RemotePost {
    pub title: Option<String>,
}

impl RemotePost {
    /// Create a post with just a title
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
        }
    }

    /// Read a post from one feed element
    ///
    /// A missing or non-string `title` yields a post without a title.
    pub fn from_value(value: &serde_json::Value) -> Self {
        Self {
            title: value
                .get("title")
                .and_then(serde_json::Value::as_str)
                .map(str::to_string),
        }
    }

    /// Convert to a quote under the given category tag
    ///
    /// Returns `None` when the post has no usable title.
    pub fn to_quote(&self, tag: &str) -> Option<Quote> {
        let title = self.title.as_deref()?;
        if title.trim().is_empty() {
            return None;
        }
        Some(Quote::new(title, tag))
    }
}
