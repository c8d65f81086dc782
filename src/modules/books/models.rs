use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use biblio_store::{BookRecord, NewBook, Page};

/// External textual date format used everywhere on the wire.
pub const DATE_FORMAT: &str = "%d-%m-%Y";

pub fn parse_wire_date(raw: &str) -> Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
}

/// Incoming create/replace body.
///
/// Every business field is optional at the serde level so validation can
/// report all missing fields in one pass instead of failing on the first.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookPayload {
    pub title: Option<String>,
    pub author: Option<String>,
    pub price: Option<Decimal>,
    pub release_date: Option<String>,
}

impl BookPayload {
    /// Validate the payload into store-ready fields, or return the full
    /// field-to-message detail list.
    pub fn validate(&self) -> Result<NewBook, Vec<Value>> {
        let mut details = Vec::new();

        let title = match self.title.as_deref().map(str::trim) {
            Some(t) if !t.is_empty() => Some(t.to_string()),
            _ => {
                details.push(json!({"field": "title", "error": "Title is mandatory"}));
                None
            }
        };

        let author = match self.author.as_deref().map(str::trim) {
            Some(a) if !a.is_empty() => Some(a.to_string()),
            _ => {
                details.push(json!({"field": "author", "error": "Author is mandatory"}));
                None
            }
        };

        let price = match self.price {
            Some(p) if p >= Decimal::ZERO => Some(p),
            Some(_) => {
                details.push(json!({"field": "price", "error": "Price must not be negative"}));
                None
            }
            None => {
                details.push(json!({"field": "price", "error": "Price is mandatory"}));
                None
            }
        };

        let release_date = match self.release_date.as_deref() {
            Some(raw) => match parse_wire_date(raw) {
                Ok(date) => Some(date),
                Err(_) => {
                    details.push(json!({
                        "field": "releaseDate",
                        "error": format!("Invalid date format. Cannot parse '{}' as dd-MM-yyyy", raw)
                    }));
                    None
                }
            },
            None => {
                details.push(json!({
                    "field": "releaseDate",
                    "error": "Release date is mandatory"
                }));
                None
            }
        };

        match (title, author, price, release_date) {
            (Some(title), Some(author), Some(price), Some(release_date)) => Ok(NewBook {
                title,
                author,
                price,
                release_date,
            }),
            _ => Err(details),
        }
    }
}

/// Pure link assembly: resource id to its HATEOAS-style link set.
pub fn links_for(id: u64) -> Value {
    json!({
        "self": { "href": format!("/api/books/{id}") },
        "books": { "href": "/api/books" }
    })
}

/// Outbound representation of a stored book.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookResponse {
    pub id: u64,
    pub title: String,
    pub author: String,
    pub price: Decimal,
    pub release_date: String,
    pub created_at: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
    #[serde(rename = "_links")]
    pub links: Value,
}

impl From<BookRecord> for BookResponse {
    fn from(record: BookRecord) -> Self {
        let links = links_for(record.id);
        Self {
            id: record.id,
            title: record.title,
            author: record.author,
            price: record.price,
            release_date: record.release_date.format(DATE_FORMAT).to_string(),
            created_at: record.created_at,
            last_modified: record.last_modified,
            links,
        }
    }
}

/// One page of books plus pagination metadata.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResponse {
    pub content: Vec<BookResponse>,
    pub page: u32,
    pub size: u32,
    pub total_elements: u64,
    pub total_pages: u32,
    #[serde(rename = "_links")]
    pub links: Value,
}

impl From<Page<BookRecord>> for PageResponse {
    fn from(page: Page<BookRecord>) -> Self {
        let page = page.map(BookResponse::from);
        Self {
            content: page.content,
            page: page.page,
            size: page.size,
            total_elements: page.total_elements,
            total_pages: page.total_pages,
            links: json!({ "self": { "href": "/api/books" } }),
        }
    }
}
