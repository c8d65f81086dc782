//! Thin orchestration over the book store: validation, duplicate check,
//! and the CRUD operations exposed by the HTTP handlers.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde_json::json;

use biblio_http::error::AppError;
use biblio_kernel::settings::BooksSettings;
use biblio_store::{BookRecord, BookStore, NewBook, Page, StoreError};

use super::models::BookPayload;
use super::query::{build_filter, page_request, resolve_sort, ListParams};

const PATCH_PRICE_MESSAGE: &str =
    "It is mandatory to denote a digit that represents the new price of the book";

/// Book query/command service. Stateless between requests; everything
/// lives in the store.
pub struct BookService {
    store: Arc<dyn BookStore>,
    settings: BooksSettings,
}

impl BookService {
    pub fn new(store: Arc<dyn BookStore>, settings: BooksSettings) -> Self {
        Self { store, settings }
    }

    /// True iff a stored record shares the candidate's logical identity
    /// triple, regardless of price or id.
    pub async fn is_duplicate(&self, candidate: &NewBook) -> Result<bool, AppError> {
        let existing = self
            .store
            .find_by_logical_key(&candidate.title, &candidate.author, candidate.release_date)
            .await
            .map_err(store_error)?;

        Ok(existing.is_some())
    }

    /// Validate, reject logical duplicates, insert.
    ///
    /// The pre-check makes the 409 observable; the store's unique
    /// constraint closes the race against a concurrent create that the
    /// check cannot see.
    pub async fn create(&self, payload: BookPayload) -> Result<BookRecord, AppError> {
        let new = payload
            .validate()
            .map_err(|details| AppError::validation(details, "Book validation failed"))?;

        if self.is_duplicate(&new).await? {
            return Err(already_exists(&new.title, &new.author));
        }

        self.store.insert(new).await.map_err(store_error)
    }

    pub async fn get(&self, id: u64) -> Result<BookRecord, AppError> {
        self.store
            .find_by_id(id)
            .await
            .map_err(store_error)?
            .ok_or_else(|| book_not_found(id))
    }

    /// Filtered, sorted, paginated listing.
    pub async fn list(&self, params: &ListParams) -> Result<Page<BookRecord>, AppError> {
        let sort = resolve_sort(
            params.sort_by.as_deref().unwrap_or(""),
            self.settings.sort_policy,
        )?;
        let filter = build_filter(params)?;
        let page = page_request(params, &self.settings);

        self.store
            .find_page(&filter, &sort, page)
            .await
            .map_err(store_error)
    }

    /// Full replace of the four business fields.
    pub async fn replace(&self, id: u64, payload: BookPayload) -> Result<BookRecord, AppError> {
        let new = payload
            .validate()
            .map_err(|details| AppError::validation(details, "Book validation failed"))?;

        let mut current = self.get(id).await?;
        current.title = new.title;
        current.author = new.author;
        current.price = new.price;
        current.release_date = new.release_date;

        self.store.update(current).await.map_err(store_error)
    }

    /// Partial update of the price only. The body is the raw decimal
    /// string, not JSON.
    pub async fn patch_price(&self, id: u64, raw_price: &str) -> Result<BookRecord, AppError> {
        let mut current = self.get(id).await?;

        let price: Decimal = raw_price
            .trim()
            .parse()
            .map_err(|_| AppError::bad_request(PATCH_PRICE_MESSAGE))?;
        if price < Decimal::ZERO {
            return Err(AppError::bad_request(PATCH_PRICE_MESSAGE));
        }

        current.price = price;
        self.store.update(current).await.map_err(store_error)
    }

    /// Delete by id, returning the deleted record's representation.
    pub async fn delete(&self, id: u64) -> Result<BookRecord, AppError> {
        self.store.delete_by_id(id).await.map_err(store_error)
    }
}

fn book_not_found(id: u64) -> AppError {
    AppError::not_found(format!("Could not find book {id}"))
}

fn already_exists(title: &str, author: &str) -> AppError {
    AppError::conflict(
        vec![json!({"title": title, "author": author})],
        format!("The book {title} by {author} already exist"),
    )
}

fn store_error(err: StoreError) -> AppError {
    match err {
        StoreError::DuplicateKey { title, author } => already_exists(&title, &author),
        StoreError::NotFound(id) => book_not_found(id),
        StoreError::Internal(e) => AppError::Internal(e),
    }
}
