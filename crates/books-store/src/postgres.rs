//! PostgreSQL backend.
//!
//! Each operation is a single statement, so there is no transaction
//! handling here. Concurrent writes to the same row are ordered by
//! PostgreSQL (last write wins on overlapping fields).

use async_trait::async_trait;
use books_core::{Book, BookId, BookPage, BookPatch, BookQuery, NewBook, SortField, SortSpec};
use sqlx::postgres::{PgPool, PgPoolOptions};

use crate::error::{StoreError, StoreResult};
use crate::models::{BOOK_COLUMNS, BookRow};
use crate::schema;
use crate::store::{BookStore, StoreConfig};

/// Matches every row when `$1` is NULL, otherwise any text field containing it.
const SEARCH_PREDICATE: &str =
    "($1::text IS NULL OR title ILIKE $1 OR author ILIKE $1 OR summary ILIKE $1)";

/// Book store backed by a PostgreSQL `books` table.
#[derive(Debug, Clone)]
pub struct PgBookStore {
    pool: PgPool,
    run_migrations: bool,
}

impl PgBookStore {
    /// Connect to the database with the given configuration.
    ///
    /// Waits for a connection and runs migrations if `config.run_migrations`
    /// is true.
    pub async fn connect(config: &StoreConfig) -> StoreResult<Self> {
        let pool = Self::pool_options(config)
            .connect(&config.database_url)
            .await?;

        let store = Self {
            pool,
            run_migrations: config.run_migrations,
        };
        store.initialize().await?;
        Ok(store)
    }

    /// Build a store whose pool opens connections on first use.
    ///
    /// Fails only if the connection string cannot be parsed.
    pub fn connect_lazy(config: &StoreConfig) -> StoreResult<Self> {
        let pool = Self::pool_options(config).connect_lazy(&config.database_url)?;

        Ok(Self {
            pool,
            run_migrations: config.run_migrations,
        })
    }

    fn pool_options(config: &StoreConfig) -> PgPoolOptions {
        PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
    }
}

#[async_trait]
impl BookStore for PgBookStore {
    async fn initialize(&self) -> StoreResult<()> {
        tracing::info!("Connecting to database...");
        drop(self.pool.acquire().await?);
        tracing::info!("Connected to database");

        if self.run_migrations {
            schema::run_migrations(&self.pool).await?;
        } else if !schema::is_schema_initialized(&self.pool).await? {
            tracing::warn!("Migrations disabled and the books table does not exist");
        }
        Ok(())
    }

    async fn create(&self, book: NewBook) -> StoreResult<Book> {
        let draft = book.validate()?;
        let id = BookId::new();

        let row = sqlx::query_as::<_, BookRow>(&format!(
            r#"
            INSERT INTO books (id, title, author, summary)
            VALUES ($1, $2, $3, $4)
            RETURNING {BOOK_COLUMNS}
            "#
        ))
        .bind(id.as_uuid())
        .bind(&draft.title)
        .bind(&draft.author)
        .bind(&draft.summary)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn find_by_id(&self, id: BookId) -> StoreResult<Option<Book>> {
        let row = sqlx::query_as::<_, BookRow>(&format!(
            "SELECT {BOOK_COLUMNS} FROM books WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Book::from))
    }

    async fn find_many(&self, query: &BookQuery) -> StoreResult<BookPage> {
        let pattern = query.filter.search_term.as_deref().map(like_pattern);
        let offset = to_sql_count("skip", query.skip)?;
        let limit = query
            .effective_limit()
            .map(|limit| to_sql_count("limit", limit))
            .transpose()?;

        let (total,): (i64,) =
            sqlx::query_as(&format!("SELECT COUNT(*) FROM books WHERE {SEARCH_PREDICATE}"))
                .bind(&pattern)
                .fetch_one(&self.pool)
                .await?;

        let rows = sqlx::query_as::<_, BookRow>(&format!(
            r#"
            SELECT {BOOK_COLUMNS}
            FROM books
            WHERE {SEARCH_PREDICATE}
            ORDER BY {}
            OFFSET $2
            LIMIT $3
            "#,
            order_by(query.sort)
        ))
        .bind(&pattern)
        .bind(offset)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(BookPage {
            total: u64::try_from(total).unwrap_or_default(),
            books: rows.into_iter().map(Book::from).collect(),
        })
    }

    async fn update_by_id(&self, id: BookId, patch: BookPatch) -> StoreResult<Option<Book>> {
        let changes = patch.validate()?;
        let set_summary = changes.summary.is_some();

        // $4 says whether summary is being written; $5 may be NULL to clear it.
        let row = sqlx::query_as::<_, BookRow>(&format!(
            r#"
            UPDATE books
            SET title = COALESCE($2, title),
                author = COALESCE($3, author),
                summary = CASE WHEN $4 THEN $5 ELSE summary END
            WHERE id = $1
            RETURNING {BOOK_COLUMNS}
            "#
        ))
        .bind(id.as_uuid())
        .bind(&changes.title)
        .bind(&changes.author)
        .bind(set_summary)
        .bind(changes.summary.flatten())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Book::from))
    }

    async fn delete_by_id(&self, id: BookId) -> StoreResult<Option<Book>> {
        let row = sqlx::query_as::<_, BookRow>(&format!(
            "DELETE FROM books WHERE id = $1 RETURNING {BOOK_COLUMNS}"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Book::from))
    }

    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn close(&self) {
        tracing::info!("Closing database pool");
        self.pool.close().await;
    }
}

/// Wrap a search term for `ILIKE`, escaping its wildcards.
fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// `ORDER BY` clause for a sort. Built only from fixed fragments.
///
/// Text compares byte-wise, absent summaries sort lowest, and insertion
/// order breaks ties.
fn order_by(sort: SortSpec) -> String {
    let dir = if sort.direction.is_ascending() {
        "ASC"
    } else {
        "DESC"
    };
    let nulls = if sort.direction.is_ascending() {
        "NULLS FIRST"
    } else {
        "NULLS LAST"
    };

    match sort.field {
        SortField::Natural => "seq ASC".to_string(),
        SortField::Id => format!("id {dir}, seq ASC"),
        SortField::Title => format!(r#"title COLLATE "C" {dir}, seq ASC"#),
        SortField::Author => format!(r#"author COLLATE "C" {dir}, seq ASC"#),
        SortField::Summary => format!(r#"summary COLLATE "C" {dir} {nulls}, seq ASC"#),
    }
}

fn to_sql_count(name: &str, value: u64) -> StoreResult<i64> {
    i64::try_from(value)
        .map_err(|_| StoreError::InvalidQuery(format!("{name} is too large: {value}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use books_core::SortDirection;

    #[test]
    fn test_like_pattern_wraps_term() {
        assert_eq!(like_pattern("foo"), "%foo%");
    }

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("50%_off\\"), "%50\\%\\_off\\\\%");
    }

    #[test]
    fn test_order_by_title_descending() {
        let sort = SortSpec::new(SortField::Title, SortDirection::Descending);
        assert_eq!(order_by(sort), r#"title COLLATE "C" DESC, seq ASC"#);
    }

    #[test]
    fn test_order_by_summary_puts_missing_first_when_ascending() {
        let sort = SortSpec::new(SortField::Summary, SortDirection::Ascending);
        assert!(order_by(sort).contains("NULLS FIRST"));
    }

    #[test]
    fn test_order_by_unknown_field_is_insertion_order() {
        let sort = SortSpec::new(SortField::Natural, SortDirection::Descending);
        assert_eq!(order_by(sort), "seq ASC");
    }

    #[test]
    fn test_to_sql_count_rejects_overflow() {
        assert!(to_sql_count("skip", u64::MAX).is_err());
        assert_eq!(to_sql_count("skip", 20).unwrap(), 20);
    }
}
