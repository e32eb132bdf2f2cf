//! Core data types for the books API.
//!
//! A [`Book`] is the only managed record. It is created from a [`NewBook`]
//! (every field optional on the wire, validated into a [`BookDraft`]) and
//! changed in place through a [`BookPatch`], validated into [`BookChanges`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::field::{FieldValue, ValueKind};

// ============================================================================
// ID Types
// ============================================================================

/// Unique identifier for a book.
///
/// Wraps a UUID v4 assigned by the store when the book is created. Any string
/// that parses as a UUID is a well-formed identifier, whether or not a book
/// with that id exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookId(pub Uuid);

impl BookId {
    /// Creates a new random BookId using UUID v4.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a BookId from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the inner UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for BookId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for BookId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

// ============================================================================
// Book
// ============================================================================

/// A persisted book record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub id: BookId,
    pub title: String,
    pub author: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

impl Book {
    /// Builds a book from validated fields and the id the store assigned.
    pub fn from_draft(id: BookId, draft: BookDraft) -> Self {
        Self {
            id,
            title: draft.title,
            author: draft.author,
            summary: draft.summary,
        }
    }

    /// Overwrites the fields present in `changes`. The id never changes.
    pub fn apply(&mut self, changes: &BookChanges) {
        if let Some(title) = &changes.title {
            self.title.clone_from(title);
        }
        if let Some(author) = &changes.author {
            self.author.clone_from(author);
        }
        if let Some(summary) = &changes.summary {
            self.summary.clone_from(summary);
        }
    }
}

// ============================================================================
// Validation
// ============================================================================

/// Text fields of a book, in the order problems are reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookField {
    Title,
    Author,
    Summary,
}

impl BookField {
    /// Field name as it appears in JSON bodies.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Author => "author",
            Self::Summary => "summary",
        }
    }

    const fn required_message(self) -> &'static str {
        match self {
            Self::Title => "Title is required",
            Self::Author => "Author is required",
            Self::Summary => "Summary is required",
        }
    }
}

/// What was wrong with a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldProblem {
    /// Absent, null or empty where a value is required.
    Required,
    /// A JSON value with no text form.
    NotText(ValueKind),
}

/// A single rejected field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldError {
    pub field: BookField,
    pub problem: FieldProblem,
}

impl FieldError {
    pub const fn required(field: BookField) -> Self {
        Self {
            field,
            problem: FieldProblem::Required,
        }
    }

    pub const fn not_text(field: BookField, kind: ValueKind) -> Self {
        Self {
            field,
            problem: FieldProblem::NotText(kind),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.field.name();
        match self.problem {
            FieldProblem::Required => write!(f, "{name}: {}", self.field.required_message()),
            FieldProblem::NotText(kind) => write!(
                f,
                "{name}: Cast to string failed for value of type {kind} at path \"{name}\""
            ),
        }
    }
}

/// Which write path rejected the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationStage {
    Create,
    Update,
}

impl ValidationStage {
    const fn prefix(self) -> &'static str {
        match self {
            Self::Create => "Book validation failed",
            Self::Update => "Validation failed",
        }
    }
}

/// One or more fields were missing or not text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}: {}", .stage.prefix(), describe(.errors))]
pub struct BookValidationError {
    pub stage: ValidationStage,
    pub errors: Vec<FieldError>,
}

impl BookValidationError {
    /// Fields rejected for being missing or empty.
    pub fn missing(&self) -> Vec<BookField> {
        self.errors
            .iter()
            .filter(|e| e.problem == FieldProblem::Required)
            .map(|e| e.field)
            .collect()
    }
}

fn describe(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Collects field errors while values are extracted.
struct FieldChecker {
    errors: Vec<FieldError>,
}

impl FieldChecker {
    fn new() -> Self {
        Self { errors: Vec::new() }
    }

    /// A value that must be present and non-empty. On failure the error is
    /// recorded and an empty string returned.
    fn required(&mut self, field: BookField, value: FieldValue) -> String {
        match value {
            FieldValue::Text(text) if !text.is_empty() => return text,
            FieldValue::Unsupported(kind) => self.errors.push(FieldError::not_text(field, kind)),
            _ => self.errors.push(FieldError::required(field)),
        }
        String::new()
    }

    /// A value that may be absent or null.
    fn optional(&mut self, field: BookField, value: FieldValue) -> Option<Option<String>> {
        match value {
            FieldValue::Absent => None,
            FieldValue::Null => Some(None),
            FieldValue::Text(text) => Some(Some(text)),
            FieldValue::Unsupported(kind) => {
                self.errors.push(FieldError::not_text(field, kind));
                None
            }
        }
    }

    fn finish(self, stage: ValidationStage) -> Result<(), BookValidationError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(BookValidationError {
                stage,
                errors: self.errors,
            })
        }
    }
}

// ============================================================================
// Write inputs
// ============================================================================

/// Fields supplied when creating a book. Nothing is required at this level;
/// [`NewBook::validate`] enforces the required fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct NewBook {
    #[serde(default)]
    pub title: FieldValue,
    #[serde(default)]
    pub author: FieldValue,
    #[serde(default)]
    pub summary: FieldValue,
}

impl NewBook {
    pub fn new(title: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            title: FieldValue::Text(title.into()),
            author: FieldValue::Text(author.into()),
            summary: FieldValue::Absent,
        }
    }

    #[must_use]
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = FieldValue::Text(summary.into());
        self
    }

    /// Checks every field, reporting all problems at once.
    pub fn validate(self) -> Result<BookDraft, BookValidationError> {
        let mut checker = FieldChecker::new();
        let title = checker.required(BookField::Title, self.title);
        let author = checker.required(BookField::Author, self.author);
        let summary = checker.optional(BookField::Summary, self.summary).flatten();
        checker.finish(ValidationStage::Create)?;

        Ok(BookDraft {
            title,
            author,
            summary,
        })
    }
}

/// A [`NewBook`] whose required fields are known to be present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookDraft {
    pub title: String,
    pub author: String,
    pub summary: Option<String>,
}

/// Partial update as received. An absent key leaves the stored value
/// untouched; `"summary": null` clears the summary.
///
/// Unknown keys (including `id`) are ignored when deserializing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct BookPatch {
    #[serde(default)]
    pub title: FieldValue,
    #[serde(default)]
    pub author: FieldValue,
    #[serde(default)]
    pub summary: FieldValue,
}

impl BookPatch {
    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = FieldValue::Text(title.into());
        self
    }

    #[must_use]
    pub fn author(mut self, author: impl Into<String>) -> Self {
        self.author = FieldValue::Text(author.into());
        self
    }

    #[must_use]
    pub fn summary(mut self, summary: Option<String>) -> Self {
        self.summary = summary.into();
        self
    }

    /// Rejects a supplied title or author that is null or empty, and any
    /// field that is not text.
    pub fn validate(self) -> Result<BookChanges, BookValidationError> {
        let mut checker = FieldChecker::new();
        let title = (!self.title.is_absent())
            .then(|| checker.required(BookField::Title, self.title));
        let author = (!self.author.is_absent())
            .then(|| checker.required(BookField::Author, self.author));
        let summary = checker.optional(BookField::Summary, self.summary);
        checker.finish(ValidationStage::Update)?;

        Ok(BookChanges {
            title,
            author,
            summary,
        })
    }
}

/// A validated [`BookPatch`]. `None` leaves a field untouched;
/// `summary: Some(None)` clears the summary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookChanges {
    pub title: Option<String>,
    pub author: Option<String>,
    pub summary: Option<Option<String>>,
}

impl BookChanges {
    /// True when applying these changes would not alter anything.
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.author.is_none() && self.summary.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn book_id_display_fromstr() {
        let id = BookId::new();
        let parsed: BookId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn book_id_rejects_malformed() {
        assert!("not-an-id".parse::<BookId>().is_err());
        assert!("".parse::<BookId>().is_err());
        assert!("507f1f77bcf86cd799439011".parse::<BookId>().is_err());
    }

    #[test]
    fn book_serializes_without_absent_summary() {
        let book = Book {
            id: BookId::from_uuid(Uuid::nil()),
            title: "A".to_string(),
            author: "B".to_string(),
            summary: None,
        };
        let json = serde_json::to_value(&book).unwrap();
        assert_eq!(json["id"], "00000000-0000-0000-0000-000000000000");
        assert_eq!(json["title"], "A");
        assert!(json.get("summary").is_none());
    }

    #[test]
    fn new_book_requires_title_and_author() {
        let err = NewBook::default().validate().unwrap_err();
        assert_eq!(err.missing(), vec![BookField::Title, BookField::Author]);
        assert_eq!(
            err.to_string(),
            "Book validation failed: title: Title is required, author: Author is required"
        );
    }

    #[test]
    fn new_book_treats_empty_and_null_as_missing() {
        let err = NewBook::new("", "Someone").validate().unwrap_err();
        assert_eq!(err.missing(), vec![BookField::Title]);

        let book: NewBook = serde_json::from_str(r#"{"title": "T", "author": null}"#).unwrap();
        assert_eq!(book.validate().unwrap_err().missing(), vec![BookField::Author]);
    }

    #[test]
    fn new_book_keeps_whitespace_values() {
        let draft = NewBook::new("   ", "Someone").validate().unwrap();
        assert_eq!(draft.title, "   ");
    }

    #[test]
    fn new_book_validates_into_draft() {
        let draft = NewBook::new("Dune", "Frank Herbert")
            .with_summary("Spice")
            .validate()
            .unwrap();
        assert_eq!(draft.title, "Dune");
        assert_eq!(draft.summary.as_deref(), Some("Spice"));
    }

    #[test]
    fn new_book_reads_scalars_as_text() {
        let book: NewBook =
            serde_json::from_str(r#"{"title": 1984, "author": "Orwell", "summary": false}"#)
                .unwrap();
        let draft = book.validate().unwrap();
        assert_eq!(draft.title, "1984");
        assert_eq!(draft.summary.as_deref(), Some("false"));
    }

    #[test]
    fn new_book_rejects_containers() {
        let book: NewBook =
            serde_json::from_str(r#"{"title": ["x"], "author": {"name": "B"}}"#).unwrap();
        let err = book.validate().unwrap_err();
        assert!(err.missing().is_empty());
        assert_eq!(
            err.to_string(),
            "Book validation failed: \
             title: Cast to string failed for value of type Array at path \"title\", \
             author: Cast to string failed for value of type Object at path \"author\""
        );
    }

    #[test]
    fn patch_ignores_unknown_keys() {
        let patch: BookPatch =
            serde_json::from_str(r#"{"id": "x", "title": "New", "extra": 1}"#).unwrap();
        let changes = patch.validate().unwrap();
        assert_eq!(changes.title.as_deref(), Some("New"));
        assert!(changes.author.is_none());
        assert!(changes.summary.is_none());
    }

    #[test]
    fn patch_rejects_empty_author() {
        let err = BookPatch::default().author("").validate().unwrap_err();
        assert_eq!(err.to_string(), "Validation failed: author: Author is required");
    }

    #[test]
    fn patch_rejects_null_title() {
        let patch: BookPatch = serde_json::from_str(r#"{"title": null}"#).unwrap();
        assert_eq!(patch.validate().unwrap_err().missing(), vec![BookField::Title]);
    }

    #[test]
    fn patch_null_summary_clears() {
        let patch: BookPatch = serde_json::from_str(r#"{"summary": null}"#).unwrap();
        let changes = patch.validate().unwrap();
        assert_eq!(changes.summary, Some(None));
        assert!(!changes.is_empty());

        let changes = BookPatch::default().validate().unwrap();
        assert!(changes.is_empty());
    }

    #[test]
    fn apply_changes_only_supplied_fields() {
        let id = BookId::new();
        let mut book = Book {
            id,
            title: "Old".to_string(),
            author: "Author".to_string(),
            summary: Some("Summary".to_string()),
        };
        book.apply(&BookPatch::default().title("New").validate().unwrap());
        assert_eq!(book.id, id);
        assert_eq!(book.title, "New");
        assert_eq!(book.author, "Author");
        assert_eq!(book.summary.as_deref(), Some("Summary"));

        book.apply(&BookPatch::default().summary(None).validate().unwrap());
        assert_eq!(book.summary, None);
    }
}
