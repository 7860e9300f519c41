use axum_marketplace_api::{
    entity::users::Role,
    error::AppError,
    routes::params::{InventorySort, InventorySortColumn, Pagination, date_bounds, parse_date},
    services::{admin_service, category_service},
};
use chrono::{TimeZone, Utc};

#[test]
fn pagination_defaults_and_clamping() {
    let (page, per_page, offset) = Pagination::default().normalize();
    assert_eq!((page, per_page, offset), (1, 10, 0));

    let (page, per_page, offset) = Pagination {
        page: Some(3),
        per_page: Some(25),
    }
    .normalize();
    assert_eq!((page, per_page, offset), (3, 25, 50));

    let (_, per_page, _) = Pagination {
        page: Some(1),
        per_page: Some(5000),
    }
    .normalize();
    assert_eq!(per_page, 100);

    let (page, _, offset) = Pagination {
        page: Some(-2),
        per_page: None,
    }
    .normalize();
    assert_eq!((page, offset), (1, 0));

    // A huge page number saturates instead of overflowing.
    let (page, per_page, offset) = Pagination {
        page: Some(i64::MAX),
        per_page: Some(100),
    }
    .normalize();
    assert_eq!((page, per_page), (i64::MAX, 100));
    assert_eq!(offset, i64::MAX);
}

#[test]
fn date_parsing_is_lenient() {
    assert!(parse_date("2024-03-01").is_some());
    assert!(parse_date("not-a-date").is_none());
    assert!(parse_date("2024-02-30").is_none());
    assert!(parse_date("01/03/2024").is_none());
}

#[test]
fn date_bounds_cover_the_end_day() {
    let (lower, upper) = date_bounds(Some("2024-01-01"), Some("2024-01-31"));
    assert_eq!(lower, Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()));
    // Upper bound is exclusive midnight of the next day, so the whole of
    // Jan 31 falls inside the range.
    assert_eq!(upper, Some(Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap()));
}

#[test]
fn malformed_date_bounds_are_dropped_individually() {
    let (lower, upper) = date_bounds(Some("junk"), Some("2024-01-31"));
    assert!(lower.is_none());
    assert!(upper.is_some());

    let (lower, upper) = date_bounds(None, Some("also junk"));
    assert!(lower.is_none());
    assert!(upper.is_none());
}

#[test]
fn inventory_sort_parses_leniently() {
    let sort = InventorySort::parse(None);
    assert_eq!(sort.column, InventorySortColumn::Name);
    assert!(!sort.descending);

    let sort = InventorySort::parse(Some("-price"));
    assert_eq!(sort.column, InventorySortColumn::Price);
    assert!(sort.descending);

    let sort = InventorySort::parse(Some("stock_quantity"));
    assert_eq!(sort.column, InventorySortColumn::StockQuantity);
    assert!(!sort.descending);

    // Unknown fields fall back to name ascending instead of erroring.
    let sort = InventorySort::parse(Some("sideways"));
    assert_eq!(sort.column, InventorySortColumn::Name);
    assert!(!sort.descending);
}

#[test]
fn effective_role_prefers_the_request() {
    assert_eq!(
        admin_service::effective_role(Some(Role::Seller), Role::Customer),
        Role::Seller
    );
    assert_eq!(
        admin_service::effective_role(None, Role::Customer),
        Role::Customer
    );
}

#[test]
fn contact_number_shape() {
    assert!(admin_service::validate_contact_number("+123456789").is_ok());
    assert!(admin_service::validate_contact_number("123456789012345").is_ok());

    // Too short, too long, non-digits.
    assert!(admin_service::validate_contact_number("12345678").is_err());
    assert!(admin_service::validate_contact_number("1234567890123456").is_err());
    assert!(admin_service::validate_contact_number("+12345678x").is_err());
}

#[test]
fn category_names_must_not_be_blank() {
    assert!(matches!(
        category_service::validate_category_name(""),
        Err(AppError::Validation { .. })
    ));
    assert!(category_service::validate_category_name("   ").is_err());
    // Leading whitespace alone does not make a name blank.
    assert!(category_service::validate_category_name(" Electronics").is_ok());
}

#[test]
fn email_shape() {
    assert!(admin_service::validate_email("user@example.com").is_ok());
    assert!(admin_service::validate_email("no-at-sign").is_err());
    assert!(admin_service::validate_email("@example.com").is_err());
    assert!(admin_service::validate_email("user@nodot").is_err());
}
