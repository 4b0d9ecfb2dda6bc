//! Durable, append-mostly record of generated payrolls. At most one row
//! per (author, month, year); the unique index in the schema is the only
//! concurrency control the batch needs.

use serde::Deserialize;
use sqlx::SqlitePool;
use utoipa::IntoParams;

use crate::error::{PayrollError, PayrollResult};
use crate::model::payroll::{Payroll, PayrollRow};
use crate::payroll::calculator::PayrollBreakdown;
use crate::payroll::storage::DocumentStore;
use crate::payroll::Period;

/// Insert payload: the computed breakdown plus the stored artifact
/// reference. Totals are copied in, never recomputed later.
#[derive(Debug, Clone)]
pub struct NewPayroll {
    pub author_id: i64,
    pub period: Period,
    pub breakdown: PayrollBreakdown,
    pub pdf_path: String,
}

/// Enumerated optional filters for ledger reads. Role scoping (an author
/// only seeing their own rows) happens at the HTTP boundary, not here.
#[derive(Debug, Default, Clone, Deserialize, IntoParams)]
pub struct PayrollFilter {
    pub author_id: Option<i64>,
    pub month: Option<u32>,
    pub year: Option<i32>,
}

#[derive(Clone)]
pub struct PayrollLedger {
    pool: SqlitePool,
}

impl PayrollLedger {
    pub fn new(pool: SqlitePool) -> Self {
        PayrollLedger { pool }
    }

    pub async fn exists(&self, author_id: i64, period: Period) -> PayrollResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM payrolls
                WHERE author_id = ? AND month = ? AND year = ?
            )
            "#,
        )
        .bind(author_id)
        .bind(period.month)
        .bind(period.year)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    /// Persists one computed payroll. A second insert for the same
    /// (author, month, year) fails with [`PayrollError::DuplicatePayroll`].
    pub async fn record(&self, new: &NewPayroll) -> PayrollResult<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO payrolls
            (author_id, month, year, articles_count, view_bonus, deductions, total, pdf_path)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(new.author_id)
        .bind(new.period.month)
        .bind(new.period.year)
        .bind(new.breakdown.articles_count)
        .bind(new.breakdown.view_bonus.to_string())
        .bind(new.breakdown.deductions.to_string())
        .bind(new.breakdown.total.to_string())
        .bind(&new.pdf_path)
        .execute(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                PayrollError::DuplicatePayroll {
                    author_id: new.author_id,
                    month: new.period.month,
                    year: new.period.year,
                }
            }
            _ => PayrollError::Database(e),
        })?;

        Ok(result.last_insert_rowid())
    }

    pub async fn list(&self, filter: &PayrollFilter) -> PayrollResult<Vec<Payroll>> {
        let mut conditions: Vec<&str> = Vec::new();
        if filter.author_id.is_some() {
            conditions.push("author_id = ?");
        }
        if filter.month.is_some() {
            conditions.push("month = ?");
        }
        if filter.year.is_some() {
            conditions.push("year = ?");
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let sql = format!(
            "SELECT id, author_id, month, year, articles_count, view_bonus, deductions, \
             total, pdf_path, created_at FROM payrolls {} \
             ORDER BY year DESC, month DESC, author_id ASC",
            where_clause
        );

        let mut query = sqlx::query_as::<_, PayrollRow>(&sql);
        if let Some(author_id) = filter.author_id {
            query = query.bind(author_id);
        }
        if let Some(month) = filter.month {
            query = query.bind(month);
        }
        if let Some(year) = filter.year {
            query = query.bind(year);
        }

        let rows = query.fetch_all(&self.pool).await?;
        rows.into_iter().map(Payroll::try_from).collect()
    }

    pub async fn find(&self, id: i64) -> PayrollResult<Option<Payroll>> {
        let row = sqlx::query_as::<_, PayrollRow>(
            r#"
            SELECT id, author_id, month, year, articles_count, view_bonus, deductions,
                   total, pdf_path, created_at
            FROM payrolls
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Payroll::try_from).transpose()
    }

    /// Resolves a ledger row to its stored artifact bytes.
    pub async fn fetch_document(
        &self,
        docs: &DocumentStore,
        id: i64,
    ) -> PayrollResult<(Payroll, Vec<u8>)> {
        let payroll = self
            .find(id)
            .await?
            .ok_or(PayrollError::NotFound { entity: "payroll" })?;

        let reference = payroll
            .pdf_path
            .clone()
            .ok_or(PayrollError::NotFound { entity: "payslip document" })?;

        let bytes = docs.load(&reference)?;
        Ok((payroll, bytes))
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use rust_decimal::Decimal;

    use super::*;
    use crate::db::create_schema;

    async fn memory_pool() -> SqlitePool {
        // one connection: every pooled connection would otherwise open its
        // own empty in-memory database
        let pool = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        create_schema(&pool).await.unwrap();

        // payrolls.author_id references users
        for (id, name) in [(1, "Siti Rahma"), (2, "Budi Santoso")] {
            sqlx::query(
                "INSERT INTO users (id, name, email, password_hash, role) \
                 VALUES (?, ?, ?, 'x', 'writer')",
            )
            .bind(id)
            .bind(name)
            .bind(format!("user{id}@langsapost.test"))
            .execute(&pool)
            .await
            .unwrap();
        }

        pool
    }

    fn breakdown(total: &str) -> PayrollBreakdown {
        let total = Decimal::from_str(total).unwrap();
        PayrollBreakdown {
            articles_count: 3,
            base: Decimal::from_str("3000000").unwrap(),
            article_bonus: Decimal::from_str("150000").unwrap(),
            view_bonus: Decimal::from_str("20000").unwrap(),
            gross: Decimal::from_str("3170000").unwrap(),
            deductions: Decimal::from_str("158500").unwrap(),
            total,
        }
    }

    fn new_payroll(author_id: i64, month: u32, year: i32) -> NewPayroll {
        NewPayroll {
            author_id,
            period: Period::new(month, year).unwrap(),
            breakdown: breakdown("3011500"),
            pdf_path: format!("payroll_{author_id}_{year}_{month}.pdf"),
        }
    }

    #[actix_web::test]
    async fn record_then_exists_round_trip() {
        let ledger = PayrollLedger::new(memory_pool().await);
        let period = Period::new(5, 2025).unwrap();

        assert!(!ledger.exists(1, period).await.unwrap());
        let id = ledger.record(&new_payroll(1, 5, 2025)).await.unwrap();
        assert!(id > 0);
        assert!(ledger.exists(1, period).await.unwrap());
    }

    #[actix_web::test]
    async fn second_record_for_same_period_is_a_duplicate() {
        let ledger = PayrollLedger::new(memory_pool().await);

        ledger.record(&new_payroll(1, 5, 2025)).await.unwrap();
        let err = ledger.record(&new_payroll(1, 5, 2025)).await.unwrap_err();

        match err {
            PayrollError::DuplicatePayroll {
                author_id,
                month,
                year,
            } => {
                assert_eq!(author_id, 1);
                assert_eq!(month, 5);
                assert_eq!(year, 2025);
            }
            other => panic!("expected DuplicatePayroll, got {:?}", other),
        }

        // exactly one row survived
        let rows = ledger.list(&PayrollFilter::default()).await.unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[actix_web::test]
    async fn same_author_different_period_is_allowed() {
        let ledger = PayrollLedger::new(memory_pool().await);

        ledger.record(&new_payroll(1, 5, 2025)).await.unwrap();
        ledger.record(&new_payroll(1, 6, 2025)).await.unwrap();
        ledger.record(&new_payroll(1, 5, 2024)).await.unwrap();
        ledger.record(&new_payroll(2, 5, 2025)).await.unwrap();

        let rows = ledger.list(&PayrollFilter::default()).await.unwrap();
        assert_eq!(rows.len(), 4);
    }

    #[actix_web::test]
    async fn list_applies_typed_filters() {
        let ledger = PayrollLedger::new(memory_pool().await);
        ledger.record(&new_payroll(1, 5, 2025)).await.unwrap();
        ledger.record(&new_payroll(2, 5, 2025)).await.unwrap();
        ledger.record(&new_payroll(1, 4, 2025)).await.unwrap();
        ledger.record(&new_payroll(1, 5, 2024)).await.unwrap();

        let by_author = ledger
            .list(&PayrollFilter {
                author_id: Some(1),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(by_author.len(), 3);
        assert!(by_author.iter().all(|p| p.author_id == 1));

        let by_period = ledger
            .list(&PayrollFilter {
                month: Some(5),
                year: Some(2025),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(by_period.len(), 2);

        let exact = ledger
            .list(&PayrollFilter {
                author_id: Some(1),
                month: Some(5),
                year: Some(2024),
            })
            .await
            .unwrap();
        assert_eq!(exact.len(), 1);
    }

    #[actix_web::test]
    async fn stored_totals_round_trip_as_decimals() {
        let ledger = PayrollLedger::new(memory_pool().await);
        let id = ledger.record(&new_payroll(1, 5, 2025)).await.unwrap();

        let payroll = ledger.find(id).await.unwrap().unwrap();
        assert_eq!(payroll.total, Decimal::from_str("3011500").unwrap());
        assert_eq!(payroll.deductions, Decimal::from_str("158500").unwrap());
        assert_eq!(payroll.view_bonus, Decimal::from_str("20000").unwrap());
        assert_eq!(payroll.articles_count, 3);
    }

    #[actix_web::test]
    async fn fetch_document_for_missing_payroll_is_not_found() {
        let ledger = PayrollLedger::new(memory_pool().await);
        let docs = DocumentStore::new(std::env::temp_dir());

        let err = ledger.fetch_document(&docs, 999).await.unwrap_err();
        assert!(matches!(err, PayrollError::NotFound { entity: "payroll" }));
    }
}
