use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::{PayrollError, PayrollResult};
use crate::model::parse_amount;

/// One generated payslip. Rows are written once by the ledger and never
/// mutated; totals are stored values, not recomputed from components.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Payroll {
    pub id: i64,
    pub author_id: i64,
    pub month: u32,
    pub year: i32,
    pub articles_count: i64,
    #[schema(value_type = String, example = "20000")]
    pub view_bonus: Decimal,
    #[schema(value_type = String, example = "158500")]
    pub deductions: Decimal,
    #[schema(value_type = String, example = "3011500")]
    pub total: Decimal,
    pub pdf_path: Option<String>,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: NaiveDateTime,
}

#[derive(sqlx::FromRow)]
pub(crate) struct PayrollRow {
    pub id: i64,
    pub author_id: i64,
    pub month: i64,
    pub year: i64,
    pub articles_count: i64,
    pub view_bonus: String,
    pub deductions: String,
    pub total: String,
    pub pdf_path: Option<String>,
    pub created_at: NaiveDateTime,
}

impl TryFrom<PayrollRow> for Payroll {
    type Error = PayrollError;

    fn try_from(row: PayrollRow) -> PayrollResult<Self> {
        Ok(Payroll {
            id: row.id,
            author_id: row.author_id,
            month: row.month as u32,
            year: row.year as i32,
            articles_count: row.articles_count,
            view_bonus: parse_amount("payrolls.view_bonus", &row.view_bonus)?,
            deductions: parse_amount("payrolls.deductions", &row.deductions)?,
            total: parse_amount("payrolls.total", &row.total)?,
            pdf_path: row.pdf_path,
            created_at: row.created_at,
        })
    }
}
