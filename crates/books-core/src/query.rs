//! Listing parameters: filter, sort and pagination window.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::types::Book;

/// Field a listing is ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortField {
    Id,
    #[default]
    Title,
    Author,
    Summary,
    /// Insertion order. Used when the requested field is not a book field.
    Natural,
}

impl SortField {
    /// Resolves a request field name. Unknown names sort in insertion order.
    pub fn from_name(name: &str) -> Self {
        match name {
            "id" | "_id" => Self::Id,
            "title" => Self::Title,
            "author" => Self::Author,
            "summary" => Self::Summary,
            _ => Self::Natural,
        }
    }
}

/// Ascending or descending order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    pub const fn is_ascending(self) -> bool {
        matches!(self, Self::Ascending)
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Ascending => "asc",
            Self::Descending => "desc",
        })
    }
}

/// Sort order string outside the accepted vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized sort direction: {0}")]
pub struct UnknownSortDirection(pub String);

impl FromStr for SortDirection {
    type Err = UnknownSortDirection;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" | "ascending" | "1" => Ok(Self::Ascending),
            "desc" | "descending" | "-1" => Ok(Self::Descending),
            _ => Err(UnknownSortDirection(s.to_string())),
        }
    }
}

/// Requested sort could not be interpreted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid sort value: {{{field}: {value}}}")]
pub struct InvalidSortError {
    pub field: String,
    pub value: String,
}

/// A single field plus direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SortSpec {
    pub field: SortField,
    pub direction: SortDirection,
}

impl SortSpec {
    pub const fn new(field: SortField, direction: SortDirection) -> Self {
        Self { field, direction }
    }

    /// Parses the raw `sortField` / `sortOrder` pair from a request.
    pub fn parse(field: &str, order: &str) -> Result<Self, InvalidSortError> {
        let direction = order.parse().map_err(|_| InvalidSortError {
            field: field.to_string(),
            value: order.to_string(),
        })?;
        Ok(Self::new(SortField::from_name(field), direction))
    }
}

/// Optional free-text search.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookFilter {
    pub search_term: Option<String>,
}

impl BookFilter {
    /// Filter on a search term; an empty term matches everything.
    pub fn search(term: impl Into<String>) -> Self {
        let term = term.into();
        Self {
            search_term: (!term.is_empty()).then_some(term),
        }
    }

    /// Case-insensitive substring match on title, author or summary.
    pub fn matches(&self, book: &Book) -> bool {
        let Some(term) = &self.search_term else {
            return true;
        };
        let needle = term.to_lowercase();
        let contains = |haystack: &str| haystack.to_lowercase().contains(&needle);

        contains(&book.title)
            || contains(&book.author)
            || book.summary.as_deref().is_some_and(contains)
    }
}

/// Everything a listing needs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookQuery {
    pub filter: BookFilter,
    pub sort: SortSpec,
    /// Matches to pass over before the first returned book.
    pub skip: u64,
    /// Maximum books returned; 0 means no limit.
    pub limit: u64,
}

impl BookQuery {
    /// The limit as an `Option`, with 0 mapped to `None`.
    pub fn effective_limit(&self) -> Option<u64> {
        (self.limit > 0).then_some(self.limit)
    }
}

/// One page of a listing plus the number of matches across all pages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BookPage {
    pub total: u64,
    pub books: Vec<Book>,
}
