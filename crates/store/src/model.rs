use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A persisted catalog entry.
///
/// `id`, `created_at`, and `last_modified` are owned by the store: the id
/// comes from the store's sequence on insert and the timestamps are
/// stamped on insert/update. Callers never set them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookRecord {
    pub id: u64,
    pub title: String,
    pub author: String,
    pub price: Decimal,
    pub release_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
}

impl BookRecord {
    /// The triple that defines logical identity. Two records with the same
    /// key are the same book regardless of id or price.
    pub fn logical_key(&self) -> LogicalKey<'_> {
        LogicalKey {
            title: &self.title,
            author: &self.author,
            release_date: self.release_date,
        }
    }
}

/// Logical identity of a book: (title, author, release date).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogicalKey<'a> {
    pub title: &'a str,
    pub author: &'a str,
    pub release_date: NaiveDate,
}

/// Caller-supplied fields for an insert. The store fills in the rest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub price: Decimal,
    pub release_date: NaiveDate,
}

impl NewBook {
    pub fn logical_key(&self) -> LogicalKey<'_> {
        LogicalKey {
            title: &self.title,
            author: &self.author,
            release_date: self.release_date,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: u64, title: &str, author: &str, price: i64, date: NaiveDate) -> BookRecord {
        BookRecord {
            id,
            title: title.to_string(),
            author: author.to_string(),
            price: Decimal::from(price),
            release_date: date,
            created_at: Utc::now(),
            last_modified: Utc::now(),
        }
    }

    #[test]
    fn logical_key_ignores_id_and_price() {
        let date = NaiveDate::from_ymd_opt(1605, 1, 16).unwrap();
        let a = record(1, "Don Quijote de la Mancha", "Miguel de Cervantes", 999, date);
        let b = record(7, "Don Quijote de la Mancha", "Miguel de Cervantes", 12, date);

        assert_eq!(a.logical_key(), b.logical_key());
    }

    #[test]
    fn logical_key_differs_on_release_date() {
        let a = record(1, "T", "A", 1, NaiveDate::from_ymd_opt(2000, 1, 1).unwrap());
        let b = record(1, "T", "A", 1, NaiveDate::from_ymd_opt(2000, 1, 2).unwrap());

        assert_ne!(a.logical_key(), b.logical_key());
    }
}
