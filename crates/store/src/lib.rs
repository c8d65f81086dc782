//! Book store collaborator for BIBLIO.
//!
//! The service layer talks to persistence exclusively through the
//! [`BookStore`] trait; [`memory::MemoryStore`] is the bundled backend.

pub mod memory;
pub mod model;
pub mod query;

use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;

pub use memory::MemoryStore;
pub use model::{BookRecord, LogicalKey, NewBook};
pub use query::{
    compare_books, BookFilter, Page, PageRequest, SortClause, SortDirection, SortField,
};

/// Failures a store backend can report.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Insert would violate the (title, author, release date) unique
    /// constraint.
    #[error("book '{title}' by {author} already stored")]
    DuplicateKey { title: String, author: String },

    /// Update or delete targeted an id that is not in the store.
    #[error("no book with id {0}")]
    NotFound(u64),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// Persistence abstraction over book records.
///
/// Implementations enforce the logical-key unique constraint inside
/// `insert`, so two concurrent inserts of the same logical book cannot
/// both commit even when the caller's duplicate pre-check races.
#[async_trait]
pub trait BookStore: Send + Sync {
    /// Insert a new record, assigning its id and stamping both timestamps.
    async fn insert(&self, new: NewBook) -> Result<BookRecord, StoreError>;

    async fn find_by_id(&self, id: u64) -> Result<Option<BookRecord>, StoreError>;

    /// Replace the record with `record.id`, stamping `last_modified`.
    async fn update(&self, record: BookRecord) -> Result<BookRecord, StoreError>;

    /// Remove and return the record with the given id.
    async fn delete_by_id(&self, id: u64) -> Result<BookRecord, StoreError>;

    /// Exact (case-sensitive) title match.
    async fn find_by_title(&self, title: &str) -> Result<Vec<BookRecord>, StoreError>;

    /// Exact (case-sensitive) author match.
    async fn find_by_author(&self, author: &str) -> Result<Vec<BookRecord>, StoreError>;

    /// Look up by the logical identity triple.
    async fn find_by_logical_key(
        &self,
        title: &str,
        author: &str,
        release_date: NaiveDate,
    ) -> Result<Option<BookRecord>, StoreError>;

    /// Filtered, sorted, paginated listing.
    async fn find_page(
        &self,
        filter: &BookFilter,
        sort: &[SortClause],
        page: PageRequest,
    ) -> Result<Page<BookRecord>, StoreError>;
}
