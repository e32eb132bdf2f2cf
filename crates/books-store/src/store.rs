//! Store contract and backend selection.
//!
//! `BookStore` is the single seam between the HTTP layer and persistence.
//! Two backends implement it: [`PgBookStore`] for PostgreSQL and
//! [`MemoryBookStore`] for a process-local collection.

use std::sync::Arc;

use async_trait::async_trait;
use books_core::{Book, BookId, BookPage, BookPatch, BookQuery, NewBook};

use crate::error::StoreResult;
use crate::memory::MemoryBookStore;
use crate::postgres::PgBookStore;

/// Connection string prefix that selects the in-memory backend.
pub const MEMORY_URL_SCHEME: &str = "memory:";

/// Default database when `DATABASE_URL` is not set.
pub const DEFAULT_DATABASE_URL: &str = "postgres://localhost/books-api";

/// Configuration for connecting to the database.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Database connection URL.
    pub database_url: String,
    /// Maximum number of connections in the pool.
    pub max_connections: u32,
    /// Minimum number of connections to maintain.
    pub min_connections: u32,
    /// Run migrations when the store is initialized.
    pub run_migrations: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            max_connections: 10,
            min_connections: 0,
            run_migrations: true,
        }
    }
}

impl StoreConfig {
    /// Create configuration from environment variables.
    ///
    /// Reads:
    /// - `DATABASE_URL` - Optional, defaults to `postgres://localhost/books-api`
    /// - `DATABASE_MAX_CONNECTIONS` - Optional, defaults to 10
    /// - `DATABASE_MIN_CONNECTIONS` - Optional, defaults to 0
    /// - `DATABASE_RUN_MIGRATIONS` - Optional, defaults to true
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create configuration from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let database_url = lookup("DATABASE_URL")
            .filter(|s| !s.is_empty())
            .unwrap_or(defaults.database_url);

        let max_connections = lookup("DATABASE_MAX_CONNECTIONS")
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.max_connections);

        let min_connections = lookup("DATABASE_MIN_CONNECTIONS")
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.min_connections);

        let run_migrations = lookup("DATABASE_RUN_MIGRATIONS")
            .map(|s| s.to_lowercase() != "false" && s != "0")
            .unwrap_or(defaults.run_migrations);

        Self {
            database_url,
            max_connections,
            min_connections,
            run_migrations,
        }
    }

    /// Whether the URL selects the in-memory backend.
    pub fn is_memory(&self) -> bool {
        self.database_url.starts_with(MEMORY_URL_SCHEME)
    }
}

/// Durable CRUD over book records.
///
/// By-id lookups that match nothing return `Ok(None)`; "not found" is not
/// an error at this layer.
#[async_trait]
pub trait BookStore: Send + Sync {
    /// Prepare the backend for use (e.g. run migrations).
    async fn initialize(&self) -> StoreResult<()> {
        Ok(())
    }

    /// Validate and persist a new book, assigning its id.
    async fn create(&self, book: NewBook) -> StoreResult<Book>;

    /// Fetch one book.
    async fn find_by_id(&self, id: BookId) -> StoreResult<Option<Book>>;

    /// Filter, sort and page through books.
    async fn find_many(&self, query: &BookQuery) -> StoreResult<BookPage>;

    /// Apply a partial update and return the post-update state.
    async fn update_by_id(&self, id: BookId, patch: BookPatch) -> StoreResult<Option<Book>>;

    /// Remove a book and return its last state.
    async fn delete_by_id(&self, id: BookId) -> StoreResult<Option<Book>>;

    /// Round-trip to the backend to confirm it can serve requests.
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    /// Release backend resources.
    async fn close(&self) {}
}

/// Build the backend selected by `config` without waiting on connectivity.
///
/// For PostgreSQL the pool connects lazily; call [`BookStore::initialize`]
/// to run migrations.
pub fn open(config: &StoreConfig) -> StoreResult<Arc<dyn BookStore>> {
    if config.is_memory() {
        tracing::info!("Using in-memory book store");
        return Ok(Arc::new(MemoryBookStore::new()));
    }

    Ok(Arc::new(PgBookStore::connect_lazy(config)?))
}
