//! books-core: domain types for the books API
//!
//! This crate provides:
//! - `BookId`, `Book` and the write inputs `NewBook` / `BookPatch`
//! - Lenient reading of text fields from request bodies (`FieldValue`)
//! - Field validation shared by every store backend
//! - Listing parameters (`BookQuery`, `SortSpec`, `BookFilter`) and `BookPage`
//!
//! No I/O happens here; persistence lives in `books-store`.

pub mod field;
pub mod query;
pub mod types;

pub use field::{FieldValue, ValueKind};
pub use query::{
    BookFilter, BookPage, BookQuery, InvalidSortError, SortDirection, SortField, SortSpec,
    UnknownSortDirection,
};
pub use types::{
    Book, BookChanges, BookDraft, BookField, BookId, BookPatch, BookValidationError, FieldError,
    FieldProblem, NewBook, ValidationStage,
};
