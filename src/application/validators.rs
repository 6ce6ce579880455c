use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    domain::entities::billing_month::BillingMonth,
};

/// A service name must contain something other than whitespace.
pub fn is_valid_service_name(name: &str) -> bool {
    !name.trim().is_empty()
}

/// Upper bound on a monthly price in minor units. Keeps every total of a
/// realistic history well inside `i64`.
pub const MAX_PRICE: i64 = i32::MAX as i64;

/// Prices are minor currency units and may be zero (free tiers).
pub fn is_valid_price(price: i64) -> bool {
    (0..=MAX_PRICE).contains(&price)
}

/// Parse a required `MM-YYYY` field, naming the field in the error.
pub fn parse_month_field(field: &str, raw: &str) -> AppResult<BillingMonth> {
    BillingMonth::parse(raw.trim()).map_err(|_| {
        AppError::InvalidInput(format!("invalid {field} format, expected MM-YYYY"))
    })
}

/// Parse an optional `MM-YYYY` field. Absent and empty both mean "not set".
pub fn parse_optional_month_field(field: &str, raw: Option<&str>) -> AppResult<Option<BillingMonth>> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => parse_month_field(field, value).map(Some),
    }
}

/// Parse a user id. The nil UUID is treated as missing.
pub fn parse_user_id(raw: &str) -> AppResult<Uuid> {
    let id = Uuid::parse_str(raw.trim())
        .map_err(|_| AppError::InvalidInput("invalid user_id format".into()))?;
    if id.is_nil() {
        return Err(AppError::InvalidInput("user_id is required".into()));
    }
    Ok(id)
}
