//! Boundary parsing for the listing endpoint: the `sortBy` grammar, the
//! filter/range normalizer, and pagination clamping.

use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;

use biblio_http::error::AppError;
use biblio_kernel::settings::{BooksSettings, SortPolicy};
use biblio_store::{BookFilter, PageRequest, SortClause, SortDirection, SortField};

use super::models::parse_wire_date;

/// Upper bound on `field:DIR` clauses in one sort expression.
pub const MAX_SORT_CLAUSES: usize = 4;

const PRICE_FILTER_MESSAGE: &str = "Enter a valid numeric value to filter by book price.";

/// Raw query parameters of `GET /api/books`, exactly as they arrive.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    pub page: Option<i64>,
    pub size: Option<i64>,
    pub title: Option<String>,
    pub author: Option<String>,
    pub start_price: Option<String>,
    pub end_price: Option<String>,
    pub release_date_from: Option<String>,
    pub release_date_to: Option<String>,
    pub sort_by: Option<String>,
}

/// Ways a sort expression can fail the grammar.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SortParseError {
    #[error("unknown sort field '{0}'")]
    UnknownField(String),

    #[error("invalid sort direction '{0}', expected ASC or DESC")]
    InvalidDirection(String),

    #[error("sort clause '{0}' is missing a direction")]
    MissingDirection(String),

    #[error("empty sort clause")]
    EmptyClause,

    #[error("too many sort clauses, at most {MAX_SORT_CLAUSES} are allowed")]
    TooManyClauses,
}

/// Parse `field1:DIR1, field2:DIR2, ...` into an ordered clause list.
///
/// Left-to-right order is sort precedence and is preserved; duplicate
/// fields are kept as given. A blank string is the empty sort.
pub fn parse_sort(raw: &str) -> Result<Vec<SortClause>, SortParseError> {
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }

    let mut clauses = Vec::new();

    for part in raw.split(',') {
        let part = part.trim();
        if part.is_empty() {
            // Dangling comma or duplicate separator.
            return Err(SortParseError::EmptyClause);
        }

        let (field, direction) = part
            .split_once(':')
            .ok_or_else(|| SortParseError::MissingDirection(part.to_string()))?;

        let field: SortField = field
            .trim()
            .parse()
            .map_err(|_| SortParseError::UnknownField(field.trim().to_string()))?;

        let direction = match direction.trim().to_ascii_uppercase().as_str() {
            "ASC" => SortDirection::Asc,
            "DESC" => SortDirection::Desc,
            _ => return Err(SortParseError::InvalidDirection(direction.trim().to_string())),
        };

        clauses.push(SortClause { field, direction });

        if clauses.len() > MAX_SORT_CLAUSES {
            return Err(SortParseError::TooManyClauses);
        }
    }

    Ok(clauses)
}

/// Apply the configured policy to a raw sort string: strict surfaces the
/// grammar failure as a 400, lenient logs it and falls back to the
/// default ordering.
pub fn resolve_sort(raw: &str, policy: SortPolicy) -> Result<Vec<SortClause>, AppError> {
    match parse_sort(raw) {
        Ok(clauses) => Ok(clauses),
        Err(err) => match policy {
            SortPolicy::Strict => Err(AppError::malformed_sort(err.to_string())),
            SortPolicy::Lenient => {
                tracing::warn!(sort = raw, error = %err, "ignoring malformed sort expression");
                Ok(Vec::new())
            }
        },
    }
}

/// Normalize the raw filter parameters into the store predicate.
pub fn build_filter(params: &ListParams) -> Result<BookFilter, AppError> {
    let price_from = parse_filter_price(params.start_price.as_deref(), Decimal::ZERO)?;
    let price_to = parse_filter_price(
        params.end_price.as_deref(),
        BookFilter::default_price_ceiling(),
    )?;

    let defaults = BookFilter::default();
    let release_date_from = match params.release_date_from.as_deref() {
        Some(raw) => parse_filter_date(raw)?,
        None => defaults.release_date_from,
    };
    let release_date_to = match params.release_date_to.as_deref() {
        Some(raw) => parse_filter_date(raw)?,
        None => defaults.release_date_to,
    };

    Ok(BookFilter {
        title: params.title.clone().unwrap_or_default(),
        author: params.author.clone().unwrap_or_default(),
        price_from,
        price_to,
        release_date_from,
        release_date_to,
    })
}

fn parse_filter_price(raw: Option<&str>, default: Decimal) -> Result<Decimal, AppError> {
    let Some(raw) = raw else {
        return Ok(default);
    };

    let price: Decimal = raw
        .trim()
        .parse()
        .map_err(|_| AppError::bad_request(PRICE_FILTER_MESSAGE))?;

    if price < Decimal::ZERO {
        return Err(AppError::bad_request(PRICE_FILTER_MESSAGE));
    }

    Ok(price)
}

fn parse_filter_date(raw: &str) -> Result<chrono::NaiveDate, AppError> {
    parse_wire_date(raw).map_err(|_| {
        AppError::bad_request(format!(
            "Invalid date format. Cannot parse '{}' as dd-MM-yyyy",
            raw
        ))
    })
}

/// Clamp raw pagination inputs: negative page goes to 0, missing or
/// non-positive size takes the configured default, oversized requests cap
/// at the configured maximum.
pub fn page_request(params: &ListParams, settings: &BooksSettings) -> PageRequest {
    let page = params.page.unwrap_or(0).max(0) as u32;

    let size = match params.size {
        Some(size) if size > 0 => (size as u64).min(u64::from(settings.max_page_size)) as u32,
        _ => settings.default_page_size,
    };

    PageRequest { page, size }
}
