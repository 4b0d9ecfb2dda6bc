pub mod ad;
pub mod article;
pub mod category;
pub mod payroll;
pub mod role;
pub mod salary_component;
pub mod user;

use std::str::FromStr;

use rust_decimal::Decimal;

use crate::error::{PayrollError, PayrollResult};

/// SQLite has no decimal type; monetary columns are stored as TEXT and
/// parsed back on read.
pub(crate) fn parse_amount(column: &'static str, raw: &str) -> PayrollResult<Decimal> {
    Decimal::from_str(raw).map_err(|_| PayrollError::Corrupt {
        column,
        raw: raw.to_string(),
    })
}
