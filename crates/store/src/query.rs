//! Query vocabulary shared between the store and its callers: the
//! normalized filter predicate, sort clauses, and page descriptors.

use std::cmp::Ordering;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::model::BookRecord;

/// Sortable fields of a book, named as they appear on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Title,
    Author,
    Price,
    ReleaseDate,
}

impl SortField {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortField::Title => "title",
            SortField::Author => "author",
            SortField::Price => "price",
            SortField::ReleaseDate => "releaseDate",
        }
    }
}

impl FromStr for SortField {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "title" => Ok(SortField::Title),
            "author" => Ok(SortField::Author),
            "price" => Ok(SortField::Price),
            "releaseDate" => Ok(SortField::ReleaseDate),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

/// One `field:direction` pair. A sort is an ordered list of these,
/// primary first; duplicates are legal and simply re-compare equal keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortClause {
    pub field: SortField,
    pub direction: SortDirection,
}

/// Compare two records under a composite sort. Records that compare equal
/// under every clause fall back to id order so results are deterministic.
pub fn compare_books(sort: &[SortClause], a: &BookRecord, b: &BookRecord) -> Ordering {
    for clause in sort {
        let ord = match clause.field {
            SortField::Title => a.title.cmp(&b.title),
            SortField::Author => a.author.cmp(&b.author),
            SortField::Price => a.price.cmp(&b.price),
            SortField::ReleaseDate => a.release_date.cmp(&b.release_date),
        };

        let ord = match clause.direction {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        };

        if ord != Ordering::Equal {
            return ord;
        }
    }

    a.id.cmp(&b.id)
}

/// Normalized filter predicate over books. All five conditions are ANDed;
/// both ranges are inclusive on both ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookFilter {
    /// Case-insensitive substring of the title; empty matches all.
    pub title: String,
    /// Case-insensitive substring of the author; empty matches all.
    pub author: String,
    pub price_from: Decimal,
    pub price_to: Decimal,
    pub release_date_from: NaiveDate,
    pub release_date_to: NaiveDate,
}

impl BookFilter {
    /// Upper price sentinel used when the caller supplies no bound.
    pub fn default_price_ceiling() -> Decimal {
        Decimal::from(1_000_000)
    }

    pub fn matches(&self, book: &BookRecord) -> bool {
        let title_ok = self.title.is_empty()
            || book.title.to_lowercase().contains(&self.title.to_lowercase());
        let author_ok = self.author.is_empty()
            || book.author.to_lowercase().contains(&self.author.to_lowercase());

        title_ok
            && author_ok
            && book.price >= self.price_from
            && book.price <= self.price_to
            && book.release_date >= self.release_date_from
            && book.release_date <= self.release_date_to
    }
}

impl Default for BookFilter {
    fn default() -> Self {
        Self {
            title: String::new(),
            author: String::new(),
            price_from: Decimal::ZERO,
            price_to: Self::default_price_ceiling(),
            release_date_from: NaiveDate::MIN,
            release_date_to: NaiveDate::MAX,
        }
    }
}

/// Zero-based page request. Values are expected to be pre-clamped by the
/// caller; `size` must be at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub size: u32,
}

/// A bounded slice of a larger result set plus its totals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub content: Vec<T>,
    pub page: u32,
    pub size: u32,
    pub total_elements: u64,
    pub total_pages: u32,
}

impl<T> Page<T> {
    /// Slice `items` (already filtered and sorted) down to the requested
    /// page and compute totals.
    pub fn assemble(items: Vec<T>, request: PageRequest) -> Self {
        let total_elements = items.len() as u64;
        let size = request.size.max(1);
        let total_pages = total_elements.div_ceil(u64::from(size)) as u32;

        let start = (request.page as usize).saturating_mul(size as usize);
        let content: Vec<T> = items
            .into_iter()
            .skip(start)
            .take(size as usize)
            .collect();

        Self {
            content,
            page: request.page,
            size,
            total_elements,
            total_pages,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            content: self.content.into_iter().map(f).collect(),
            page: self.page,
            size: self.size,
            total_elements: self.total_elements,
            total_pages: self.total_pages,
        }
    }
}
