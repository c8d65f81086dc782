//! In-memory store backend.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use tokio::sync::RwLock;

use crate::model::{BookRecord, LogicalKey, NewBook};
use crate::query::{compare_books, BookFilter, Page, PageRequest, SortClause};
use crate::{BookStore, StoreError};

/// Book store backed by a `BTreeMap` behind an async `RwLock`.
///
/// The logical-key check and the insert happen under the same write lock,
/// which is this backend's equivalent of a unique index: concurrent
/// inserts of the same logical book serialize, and the loser gets
/// `StoreError::DuplicateKey`.
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

struct Inner {
    seq: u64,
    books: BTreeMap<u64, BookRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                seq: 0,
                books: BTreeMap::new(),
            }),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn key_matches(record: &BookRecord, key: LogicalKey<'_>) -> bool {
    record.logical_key() == key
}

#[async_trait]
impl BookStore for MemoryStore {
    async fn insert(&self, new: NewBook) -> Result<BookRecord, StoreError> {
        let mut inner = self.inner.write().await;

        if inner
            .books
            .values()
            .any(|b| key_matches(b, new.logical_key()))
        {
            return Err(StoreError::DuplicateKey {
                title: new.title,
                author: new.author,
            });
        }

        inner.seq += 1;
        let now = Utc::now();
        let record = BookRecord {
            id: inner.seq,
            title: new.title,
            author: new.author,
            price: new.price,
            release_date: new.release_date,
            created_at: now,
            last_modified: now,
        };

        inner.books.insert(record.id, record.clone());
        tracing::debug!(id = record.id, "book inserted");
        Ok(record)
    }

    async fn find_by_id(&self, id: u64) -> Result<Option<BookRecord>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.books.get(&id).cloned())
    }

    async fn update(&self, mut record: BookRecord) -> Result<BookRecord, StoreError> {
        let mut inner = self.inner.write().await;

        if !inner.books.contains_key(&record.id) {
            return Err(StoreError::NotFound(record.id));
        }

        record.last_modified = Utc::now();
        inner.books.insert(record.id, record.clone());
        tracing::debug!(id = record.id, "book updated");
        Ok(record)
    }

    async fn delete_by_id(&self, id: u64) -> Result<BookRecord, StoreError> {
        let mut inner = self.inner.write().await;

        match inner.books.remove(&id) {
            Some(record) => {
                tracing::debug!(id, "book deleted");
                Ok(record)
            }
            None => Err(StoreError::NotFound(id)),
        }
    }

    async fn find_by_title(&self, title: &str) -> Result<Vec<BookRecord>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .books
            .values()
            .filter(|b| b.title == title)
            .cloned()
            .collect())
    }

    async fn find_by_author(&self, author: &str) -> Result<Vec<BookRecord>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .books
            .values()
            .filter(|b| b.author == author)
            .cloned()
            .collect())
    }

    async fn find_by_logical_key(
        &self,
        title: &str,
        author: &str,
        release_date: NaiveDate,
    ) -> Result<Option<BookRecord>, StoreError> {
        let key = LogicalKey {
            title,
            author,
            release_date,
        };

        let inner = self.inner.read().await;
        Ok(inner
            .books
            .values()
            .find(|b| key_matches(b, key))
            .cloned())
    }

    async fn find_page(
        &self,
        filter: &BookFilter,
        sort: &[SortClause],
        page: PageRequest,
    ) -> Result<Page<BookRecord>, StoreError> {
        let inner = self.inner.read().await;

        let mut matched: Vec<BookRecord> = inner
            .books
            .values()
            .filter(|b| filter.matches(b))
            .cloned()
            .collect();

        matched.sort_by(|a, b| compare_books(sort, a, b));

        Ok(Page::assemble(matched, page))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{SortDirection, SortField};
    use rust_decimal::Decimal;

    fn new_book(title: &str, author: &str, price: &str, date: (i32, u32, u32)) -> NewBook {
        NewBook {
            title: title.to_string(),
            author: author.to_string(),
            price: price.parse().unwrap(),
            release_date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
        }
    }

    #[tokio::test]
    async fn insert_assigns_sequential_ids_and_timestamps() {
        let store = MemoryStore::new();

        let first = store
            .insert(new_book("A", "X", "10", (2020, 1, 1)))
            .await
            .unwrap();
        let second = store
            .insert(new_book("B", "Y", "20", (2020, 1, 2)))
            .await
            .unwrap();

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert_eq!(first.created_at, first.last_modified);
    }

    #[tokio::test]
    async fn insert_rejects_logical_duplicates_even_at_different_price() {
        let store = MemoryStore::new();
        store
            .insert(new_book("Don Quijote de la Mancha", "Miguel de Cervantes", "999.95", (1605, 1, 16)))
            .await
            .unwrap();

        let err = store
            .insert(new_book("Don Quijote de la Mancha", "Miguel de Cervantes", "5", (1605, 1, 16)))
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::DuplicateKey { .. }));
    }

    #[tokio::test]
    async fn logical_key_lookup_matches_on_the_full_triple() {
        let store = MemoryStore::new();
        let date = NaiveDate::from_ymd_opt(2021, 5, 4).unwrap();
        store
            .insert(new_book("T", "A", "10", (2021, 5, 4)))
            .await
            .unwrap();

        assert!(store
            .find_by_logical_key("T", "A", date)
            .await
            .unwrap()
            .is_some());
        assert!(store
            .find_by_logical_key("T", "A", date.succ_opt().unwrap())
            .await
            .unwrap()
            .is_none());
        assert!(store
            .find_by_logical_key("T", "B", date)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn update_bumps_last_modified_and_keeps_created_at() {
        let store = MemoryStore::new();
        let created = store
            .insert(new_book("T", "A", "10", (2021, 5, 4)))
            .await
            .unwrap();

        let mut changed = created.clone();
        changed.price = Decimal::from(42);
        let updated = store.update(changed).await.unwrap();

        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.last_modified >= created.last_modified);
        assert_eq!(updated.price, Decimal::from(42));
    }

    #[tokio::test]
    async fn update_and_delete_fail_on_missing_id() {
        let store = MemoryStore::new();

        let missing = BookRecord {
            id: 99,
            title: "T".to_string(),
            author: "A".to_string(),
            price: Decimal::ONE,
            release_date: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            created_at: Utc::now(),
            last_modified: Utc::now(),
        };

        assert!(matches!(
            store.update(missing).await.unwrap_err(),
            StoreError::NotFound(99)
        ));
        assert!(matches!(
            store.delete_by_id(99).await.unwrap_err(),
            StoreError::NotFound(99)
        ));
    }

    #[tokio::test]
    async fn delete_twice_fails_the_second_time() {
        let store = MemoryStore::new();
        let record = store
            .insert(new_book("T", "A", "10", (2021, 5, 4)))
            .await
            .unwrap();

        store.delete_by_id(record.id).await.unwrap();
        assert!(matches!(
            store.delete_by_id(record.id).await.unwrap_err(),
            StoreError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn exact_title_and_author_lookups() {
        let store = MemoryStore::new();
        store
            .insert(new_book("Dune", "Frank Herbert", "15", (1965, 8, 1)))
            .await
            .unwrap();
        store
            .insert(new_book("Dune Messiah", "Frank Herbert", "15", (1969, 10, 15)))
            .await
            .unwrap();

        assert_eq!(store.find_by_title("Dune").await.unwrap().len(), 1);
        assert_eq!(
            store.find_by_author("Frank Herbert").await.unwrap().len(),
            2
        );
        // Exact match, not containment.
        assert!(store.find_by_title("dune").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn find_page_filters_sorts_and_slices() {
        let store = MemoryStore::new();
        for (title, price) in [("C", "999"), ("A", "2000"), ("D", "35000"), ("B", "48000")] {
            store
                .insert(new_book(title, "Author", price, (2020, 1, 1)))
                .await
                .unwrap();
        }

        let filter = BookFilter {
            price_from: Decimal::from(10_000),
            price_to: Decimal::from(50_000),
            ..BookFilter::default()
        };
        let sort = [SortClause {
            field: SortField::Title,
            direction: SortDirection::Asc,
        }];

        let page = store
            .find_page(&filter, &sort, PageRequest { page: 0, size: 10 })
            .await
            .unwrap();

        let titles: Vec<&str> = page.content.iter().map(|b| b.title.as_str()).collect();
        assert_eq!(titles, vec!["B", "D"]);
        assert_eq!(page.total_elements, 2);
        assert_eq!(page.total_pages, 1);
    }

    #[tokio::test]
    async fn find_page_default_order_is_by_id() {
        let store = MemoryStore::new();
        for title in ["Z", "M", "A"] {
            store
                .insert(new_book(title, "Author", "10", (2020, 1, 1)))
                .await
                .unwrap();
        }

        let page = store
            .find_page(&BookFilter::default(), &[], PageRequest { page: 0, size: 10 })
            .await
            .unwrap();

        let ids: Vec<u64> = page.content.iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn find_page_second_page() {
        let store = MemoryStore::new();
        for i in 0..25 {
            store
                .insert(new_book(&format!("Book {i:02}"), "Author", "10", (2020, 1, 1 + i as u32 % 28)))
                .await
                .unwrap();
        }

        let page = store
            .find_page(&BookFilter::default(), &[], PageRequest { page: 2, size: 10 })
            .await
            .unwrap();

        assert_eq!(page.content.len(), 5);
        assert_eq!(page.total_elements, 25);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.page, 2);
    }
}
