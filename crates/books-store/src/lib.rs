//! books-store: Storage layer for the books API
//!
//! This crate provides:
//! - The `BookStore` trait: create, find-by-id, find-many, update, delete
//! - `PgBookStore`, a PostgreSQL backend with an embedded migration
//! - `MemoryBookStore`, an in-process backend for development and tests
//!
//! # Usage
//!
//! ```rust,ignore
//! use books_store::{StoreConfig, open};
//!
//! let store = open(&StoreConfig::from_env())?;
//! store.initialize().await?;
//!
//! let book = store.create(NewBook::new("Dune", "Frank Herbert")).await?;
//! let found = store.find_by_id(book.id).await?;
//! ```

pub mod error;
pub mod memory;
pub mod models;
pub mod postgres;
pub mod schema;
pub mod store;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryBookStore;
pub use models::BookRow;
pub use postgres::PgBookStore;
pub use store::{BookStore, DEFAULT_DATABASE_URL, StoreConfig, open};

// Re-export books-core for downstream crates
pub use books_core;
