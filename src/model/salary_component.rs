use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

use crate::error::{PayrollError, PayrollResult};
use crate::model::parse_amount;

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    /// Flat amount added to gross regardless of output.
    Fixed,
    /// Amount multiplied by the number of articles published in the period.
    PerArticle,
    /// Amount per completed bucket of 1000 views in the period.
    PerViewBucket,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SalaryComponent {
    pub id: i64,
    pub name: String,
    pub kind: ComponentKind,
    #[schema(value_type = String, example = "3000000")]
    pub value: Decimal,
    pub is_active: bool,
}

#[derive(sqlx::FromRow)]
struct SalaryComponentRow {
    id: i64,
    name: String,
    kind: String,
    value: String,
    is_active: bool,
}

impl TryFrom<SalaryComponentRow> for SalaryComponent {
    type Error = PayrollError;

    fn try_from(row: SalaryComponentRow) -> PayrollResult<Self> {
        let kind = ComponentKind::from_str(&row.kind).map_err(|_| PayrollError::Corrupt {
            column: "salary_components.kind",
            raw: row.kind.clone(),
        })?;
        let value = parse_amount("salary_components.value", &row.value)?;
        Ok(SalaryComponent {
            id: row.id,
            name: row.name,
            kind,
            value,
            is_active: row.is_active,
        })
    }
}

impl SalaryComponent {
    /// Active rule set snapshot in stable id order, as fed to the calculator.
    pub async fn list_active(pool: &SqlitePool) -> PayrollResult<Vec<SalaryComponent>> {
        let rows = sqlx::query_as::<_, SalaryComponentRow>(
            r#"
            SELECT id, name, kind, value, is_active
            FROM salary_components
            WHERE is_active = 1
            ORDER BY id
            "#,
        )
        .fetch_all(pool)
        .await?;

        rows.into_iter().map(SalaryComponent::try_from).collect()
    }

    pub async fn list_all(pool: &SqlitePool) -> PayrollResult<Vec<SalaryComponent>> {
        let rows = sqlx::query_as::<_, SalaryComponentRow>(
            r#"
            SELECT id, name, kind, value, is_active
            FROM salary_components
            ORDER BY id
            "#,
        )
        .fetch_all(pool)
        .await?;

        rows.into_iter().map(SalaryComponent::try_from).collect()
    }

    pub async fn find(pool: &SqlitePool, id: i64) -> PayrollResult<Option<SalaryComponent>> {
        let row = sqlx::query_as::<_, SalaryComponentRow>(
            r#"
            SELECT id, name, kind, value, is_active
            FROM salary_components
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        row.map(SalaryComponent::try_from).transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_round_trips_through_text_column() {
        for kind in [
            ComponentKind::Fixed,
            ComponentKind::PerArticle,
            ComponentKind::PerViewBucket,
        ] {
            assert_eq!(ComponentKind::from_str(&kind.to_string()).unwrap(), kind);
        }
        assert_eq!(ComponentKind::PerViewBucket.to_string(), "per_view_bucket");
    }

    #[test]
    fn unknown_kind_is_corrupt() {
        let row = SalaryComponentRow {
            id: 1,
            name: "Bonus".into(),
            kind: "percentage".into(),
            value: "10000".into(),
            is_active: true,
        };
        match SalaryComponent::try_from(row) {
            Err(PayrollError::Corrupt { column, raw }) => {
                assert_eq!(column, "salary_components.kind");
                assert_eq!(raw, "percentage");
            }
            other => panic!("expected Corrupt, got {:?}", other),
        }
    }

    #[test]
    fn malformed_value_is_corrupt() {
        let row = SalaryComponentRow {
            id: 1,
            name: "Gaji Pokok".into(),
            kind: "fixed".into(),
            value: "three million".into(),
            is_active: true,
        };
        assert!(matches!(
            SalaryComponent::try_from(row),
            Err(PayrollError::Corrupt { .. })
        ));
    }
}
