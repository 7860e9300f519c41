use chrono::{DateTime, Days, NaiveDate, NaiveTime, Utc};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entity::{orders::OrderStatus, products::Column as ProdCol};

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct Pagination {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl Pagination {
    pub fn normalize(&self) -> (i64, i64, i64) {
        let page = self.page.unwrap_or(1).max(1);
        let per_page = self.per_page.unwrap_or(10).clamp(1, 100);
        // Saturate: an absurd page must answer an empty page, not overflow.
        let offset = page.saturating_sub(1).saturating_mul(per_page);
        (page, per_page, offset)
    }
}

/// Public catalogue filters. `stock_available` defaults to true:
/// out-of-stock products stay hidden unless explicitly requested.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ProductQuery {
    #[serde(flatten)]
    pub pagination: Pagination,
    pub category_id: Option<Uuid>,
    pub category_name: Option<String>,
    pub stock_available: Option<bool>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CategoryQuery {
    #[serde(flatten)]
    pub pagination: Pagination,
    /// Case-insensitive substring match on the category name.
    pub name: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct InventoryQuery {
    #[serde(flatten)]
    pub pagination: Pagination,
    pub category_id: Option<Uuid>,
    /// One of name, price, stock_quantity, optionally prefixed with `-`
    /// for descending. Anything else falls back to name ascending.
    pub sort_by: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct OrderListQuery {
    #[serde(flatten)]
    pub pagination: Pagination,
    pub status: Option<OrderStatus>,
    pub is_paid: Option<bool>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SellerOrderQuery {
    #[serde(flatten)]
    pub pagination: Pagination,
    pub status: Option<OrderStatus>,
    pub is_paid: Option<bool>,
    pub category_id: Option<Uuid>,
    pub product_id: Option<Uuid>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SalesQuery {
    #[serde(flatten)]
    pub pagination: Pagination,
    pub category_id: Option<Uuid>,
    pub product_id: Option<Uuid>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// Lenient `%Y-%m-%d` parse; malformed input is treated as absent rather
/// than rejected, so a bad date filter degrades to "filter not applied".
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

/// Turn optional date strings into an inclusive range over a timestamp
/// column: `>= start 00:00` and `< end + 1 day 00:00`, both UTC.
pub fn date_bounds(
    start: Option<&str>,
    end: Option<&str>,
) -> (Option<DateTime<Utc>>, Option<DateTime<Utc>>) {
    let midnight = NaiveTime::MIN;
    let lower = start
        .and_then(parse_date)
        .map(|d| d.and_time(midnight).and_utc());
    let upper = end
        .and_then(parse_date)
        .and_then(|d| d.checked_add_days(Days::new(1)))
        .map(|d| d.and_time(midnight).and_utc());
    (lower, upper)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InventorySortColumn {
    Name,
    Price,
    StockQuantity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InventorySort {
    pub column: InventorySortColumn,
    pub descending: bool,
}

impl InventorySort {
    /// Lenient parse of `sort_by`; unknown fields fall back to name
    /// ascending instead of erroring.
    pub fn parse(raw: Option<&str>) -> Self {
        let raw = raw.unwrap_or("name");
        let (descending, field) = match raw.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, raw),
        };
        let column = match field {
            "price" => InventorySortColumn::Price,
            "stock_quantity" => InventorySortColumn::StockQuantity,
            "name" => InventorySortColumn::Name,
            _ => {
                return InventorySort {
                    column: InventorySortColumn::Name,
                    descending: false,
                };
            }
        };
        InventorySort { column, descending }
    }

    pub fn column(&self) -> ProdCol {
        match self.column {
            InventorySortColumn::Name => ProdCol::Name,
            InventorySortColumn::Price => ProdCol::Price,
            InventorySortColumn::StockQuantity => ProdCol::StockQuantity,
        }
    }
}
