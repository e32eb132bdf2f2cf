//! Book routes.
//!
//! This module implements the book resource endpoints:
//! - POST /books - Create a book
//! - GET /books - List books with search, sort and pagination
//! - GET /books/{id} - Read one book
//! - PUT /books/{id} - Update supplied fields of a book
//! - DELETE /books/{id} - Delete a book
//!
//! Every handler turns its own failures into a JSON `{"error": ...}` response.

use std::collections::HashMap;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
};
use books_core::{Book, BookFilter, BookId, BookPatch, BookQuery, NewBook, SortSpec};
use books_store::{StoreError, StoreResult};
use serde::Serialize;

use crate::error::{ApiError, ApiResult, Operation};
use crate::extract::JsonBody;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

const DEFAULT_PAGE: i64 = 1;
const DEFAULT_LIMIT: i64 = 0;
const DEFAULT_SORT_FIELD: &str = "title";
const DEFAULT_SORT_ORDER: &str = "asc";

/// Listing parameters after defaults are applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListParams {
    pub page: i64,
    pub limit: i64,
    pub sort_field: String,
    pub sort_order: String,
    pub search: String,
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
            sort_field: DEFAULT_SORT_FIELD.to_string(),
            sort_order: DEFAULT_SORT_ORDER.to_string(),
            search: String::new(),
        }
    }
}

impl ListParams {
    /// Read parameters from the raw query string map.
    ///
    /// Numbers use their leading integer (`"10abc"` is 10). Missing,
    /// unparseable or zero values fall back to the defaults, as do empty
    /// strings.
    pub fn from_query(raw: &HashMap<String, String>) -> Self {
        let number = |key: &str, default: i64| {
            raw.get(key)
                .and_then(|s| parse_leading_int(s))
                .filter(|&n| n != 0)
                .unwrap_or(default)
        };
        let text = |key: &str, default: &str| {
            raw.get(key)
                .filter(|s| !s.is_empty())
                .cloned()
                .unwrap_or_else(|| default.to_string())
        };

        Self {
            page: number("page", DEFAULT_PAGE),
            limit: number("limit", DEFAULT_LIMIT),
            sort_field: text("sortField", DEFAULT_SORT_FIELD),
            sort_order: text("sortOrder", DEFAULT_SORT_ORDER),
            search: text("search", ""),
        }
    }

    /// Translate into a store query; `skip = (page - 1) * limit`.
    ///
    /// A negative limit caps the page at its magnitude. A negative skip is
    /// rejected.
    pub fn to_query(&self) -> StoreResult<BookQuery> {
        let sort = SortSpec::parse(&self.sort_field, &self.sort_order)?;

        let skip = (self.page - 1)
            .checked_mul(self.limit)
            .filter(|&skip| skip >= 0)
            .ok_or_else(|| {
                StoreError::InvalidQuery(format!(
                    "page {} with limit {} does not give a valid skip",
                    self.page, self.limit
                ))
            })?;

        Ok(BookQuery {
            filter: BookFilter::search(self.search.as_str()),
            sort,
            skip: skip.unsigned_abs(),
            limit: self.limit.unsigned_abs(),
        })
    }
}

/// Response for GET /books.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListBooksResponse {
    pub total: u64,
    pub page: i64,
    pub limit: i64,
    pub sort_field: String,
    pub sort_order: String,
    pub books: Vec<Book>,
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Parse the longest leading integer, skipping leading whitespace.
fn parse_leading_int(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let sign_len = usize::from(s.starts_with(['+', '-']));
    let digits = s[sign_len..]
        .bytes()
        .take_while(u8::is_ascii_digit)
        .count();
    if digits == 0 {
        return None;
    }
    s[..sign_len + digits].parse().ok()
}

/// Check a path id against the store's id format.
fn parse_book_id(raw: &str, operation: Operation) -> ApiResult<BookId> {
    raw.parse()
        .map_err(|_| ApiError::store(operation)(StoreError::InvalidIdentifier(raw.to_string())))
}

// ============================================================================
// Route Handlers
// ============================================================================

/// POST /books - Create a book.
///
/// # Request
///
/// Body: `{ "title": "...", "author": "...", "summary": "..." }`
///
/// # Response
///
/// - 201 Created: the stored book including its `id`
/// - 500: missing title/author or storage failure
async fn create_book(
    State(state): State<AppState>,
    JsonBody(new_book): JsonBody<NewBook>,
) -> ApiResult<(StatusCode, Json<Book>)> {
    let book = state
        .store()
        .create(new_book)
        .await
        .map_err(ApiError::store(Operation::Create))?;

    tracing::info!(book_id = %book.id, title = %book.title, "Book created");

    Ok((StatusCode::CREATED, Json(book)))
}

/// GET /books - List books.
///
/// Query: `page`, `limit`, `sortField`, `sortOrder`, `search`.
///
/// # Response
///
/// - 200 OK: `{ "total", "page", "limit", "sortField", "sortOrder", "books" }`
/// - 500: unusable sort/pagination values or storage failure
async fn list_books(
    State(state): State<AppState>,
    Query(raw): Query<HashMap<String, String>>,
) -> ApiResult<Json<ListBooksResponse>> {
    let params = ListParams::from_query(&raw);
    let query = params.to_query().map_err(ApiError::store(Operation::List))?;

    let page = state
        .store()
        .find_many(&query)
        .await
        .map_err(ApiError::store(Operation::List))?;

    tracing::debug!(
        total = page.total,
        returned = page.books.len(),
        "Listed books"
    );

    Ok(Json(ListBooksResponse {
        total: page.total,
        page: params.page,
        limit: params.limit,
        sort_field: params.sort_field,
        sort_order: params.sort_order,
        books: page.books,
    }))
}

/// GET /books/{id} - Read one book.
///
/// # Response
///
/// - 200 OK: the book
/// - 404 Not Found: no book has this id
/// - 500: malformed id or storage failure
async fn get_book(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> ApiResult<Json<Book>> {
    let id = parse_book_id(&raw_id, Operation::Read)?;

    let book = state
        .store()
        .find_by_id(id)
        .await
        .map_err(ApiError::store(Operation::Read))?
        .ok_or_else(ApiError::book_not_found)?;

    tracing::debug!(book_id = %id, "Read book");

    Ok(Json(book))
}

/// PUT /books/{id} - Update a book.
///
/// Body: any subset of `{ "title", "author", "summary" }`. Other keys,
/// including `id`, are ignored.
///
/// # Response
///
/// - 200 OK: the book after the update
/// - 404 Not Found: no book has this id
/// - 500: malformed id, blank title/author, or storage failure
async fn update_book(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    JsonBody(patch): JsonBody<BookPatch>,
) -> ApiResult<Json<Book>> {
    let id = parse_book_id(&raw_id, Operation::Update)?;

    let book = state
        .store()
        .update_by_id(id, patch)
        .await
        .map_err(ApiError::store(Operation::Update))?
        .ok_or_else(ApiError::book_not_found)?;

    tracing::info!(book_id = %id, "Book updated");

    Ok(Json(book))
}

/// DELETE /books/{id} - Delete a book.
///
/// # Response
///
/// - 200 OK: the book as it was before deletion
/// - 404 Not Found: no book has this id
/// - 500: malformed id or storage failure
async fn delete_book(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> ApiResult<Json<Book>> {
    let id = parse_book_id(&raw_id, Operation::Delete)?;

    let book = state
        .store()
        .delete_by_id(id)
        .await
        .map_err(ApiError::store(Operation::Delete))?
        .ok_or_else(ApiError::book_not_found)?;

    tracing::info!(book_id = %id, "Book deleted");

    Ok(Json(book))
}

/// Build book routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/books", get(list_books).post(create_book))
        .route(
            "/books/{id}",
            get(get_book).put(update_book).delete(delete_book),
        )
}

// ============================================================================
// Tests
// ============================================================================
