//! Database models for the storage layer.
//!
//! These types map directly to database rows and are kept separate from
//! the domain types in books-core.

use books_core::{Book, BookId};
use sqlx::FromRow;
use uuid::Uuid;

/// Column list shared by every query that returns a book.
pub(crate) const BOOK_COLUMNS: &str = "id, title, author, summary";

/// Database row for the `books` table.
#[derive(Debug, Clone, FromRow)]
pub struct BookRow {
    pub id: Uuid,
    pub title: String,
    pub author: String,
    pub summary: Option<String>,
}

impl From<BookRow> for Book {
    fn from(row: BookRow) -> Self {
        Self {
            id: BookId::from_uuid(row.id),
            title: row.title,
            author: row.author,
            summary: row.summary,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_into_book() {
        let id = Uuid::new_v4();
        let book: Book = BookRow {
            id,
            title: "Title".to_string(),
            author: "Author".to_string(),
            summary: None,
        }
        .into();
        assert_eq!(book.id, BookId::from_uuid(id));
        assert_eq!(book.title, "Title");
        assert!(book.summary.is_none());
    }
}
