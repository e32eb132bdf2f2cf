//! In-process backend.
//!
//! Keeps books in insertion order behind an async `RwLock`. Sorting mirrors
//! the PostgreSQL backend: byte-wise text order, absent summaries lowest,
//! insertion order on ties.

use std::cmp::Ordering;

use async_trait::async_trait;
use books_core::{Book, BookId, BookPage, BookPatch, BookQuery, NewBook, SortField, SortSpec};
use tokio::sync::RwLock;

use crate::error::StoreResult;
use crate::store::BookStore;

/// Book store held entirely in memory. Contents are lost on drop.
#[derive(Debug, Default)]
pub struct MemoryBookStore {
    books: RwLock<Vec<Book>>,
}

impl MemoryBookStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BookStore for MemoryBookStore {
    async fn create(&self, book: NewBook) -> StoreResult<Book> {
        let draft = book.validate()?;
        let book = Book::from_draft(BookId::new(), draft);
        self.books.write().await.push(book.clone());
        Ok(book)
    }

    async fn find_by_id(&self, id: BookId) -> StoreResult<Option<Book>> {
        let books = self.books.read().await;
        Ok(books.iter().find(|b| b.id == id).cloned())
    }

    async fn find_many(&self, query: &BookQuery) -> StoreResult<BookPage> {
        let books = self.books.read().await;

        let mut matches: Vec<&Book> = books.iter().filter(|b| query.filter.matches(b)).collect();
        // Stable sort keeps insertion order among equal keys.
        matches.sort_by(|a, b| compare(query.sort, a, b));

        let total = matches.len() as u64;
        let skip = usize::try_from(query.skip).unwrap_or(usize::MAX);
        let take = query
            .effective_limit()
            .map_or(usize::MAX, |limit| usize::try_from(limit).unwrap_or(usize::MAX));

        Ok(BookPage {
            total,
            books: matches.into_iter().skip(skip).take(take).cloned().collect(),
        })
    }

    async fn update_by_id(&self, id: BookId, patch: BookPatch) -> StoreResult<Option<Book>> {
        let changes = patch.validate()?;

        let mut books = self.books.write().await;
        Ok(books.iter_mut().find(|b| b.id == id).map(|book| {
            book.apply(&changes);
            book.clone()
        }))
    }

    async fn delete_by_id(&self, id: BookId) -> StoreResult<Option<Book>> {
        let mut books = self.books.write().await;
        let index = books.iter().position(|b| b.id == id);
        Ok(index.map(|index| books.remove(index)))
    }
}

fn compare(sort: SortSpec, a: &Book, b: &Book) -> Ordering {
    let ordering = match sort.field {
        SortField::Natural => return Ordering::Equal,
        SortField::Id => a.id.cmp(&b.id),
        SortField::Title => a.title.cmp(&b.title),
        SortField::Author => a.author.cmp(&b.author),
        SortField::Summary => a.summary.cmp(&b.summary),
    };

    if sort.direction.is_ascending() {
        ordering
    } else {
        ordering.reverse()
    }
}
