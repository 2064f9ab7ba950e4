//! List envelopes exchanged with record collaborators.
//!
//! # Responsibility
//! - Resolve "paginated or bare array" list payloads into one typed shape.
//! - Provide the page envelope produced by local list queries.
//!
//! # Invariants
//! - A payload with a `results` field is always read as [`Listing::Paginated`].
//! - Callers only see items through [`Listing::items`] or
//!   [`Listing::into_items`]; they never branch on the wire shape.

use serde::{Deserialize, Serialize};

/// One page of a paginated listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    /// Total matching items across all pages.
    pub count: u64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

/// List payload as returned by a collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Listing<T> {
    Paginated(Page<T>),
    Plain(Vec<T>),
}

impl<T> Listing<T> {
    pub fn items(&self) -> &[T] {
        match self {
            Self::Paginated(page) => &page.results,
            Self::Plain(items) => items,
        }
    }

    pub fn into_items(self) -> Vec<T> {
        match self {
            Self::Paginated(page) => page.results,
            Self::Plain(items) => items,
        }
    }

    /// Total across all pages; for plain payloads, the item count.
    pub fn total(&self) -> u64 {
        match self {
            Self::Paginated(page) => page.count,
            Self::Plain(items) => items.len() as u64,
        }
    }

    pub fn has_more(&self) -> bool {
        matches!(self, Self::Paginated(page) if page.next.is_some())
    }
}

impl<T> Listing<T>
where
    T: for<'de> Deserialize<'de>,
{
    /// Parses a JSON list payload in either shape.
    pub fn from_json(input: &str) -> serde_json::Result<Self> {
        serde_json::from_str(input)
    }
}
