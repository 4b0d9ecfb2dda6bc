use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const POSITIONS: [&str; 4] = ["header", "sidebar", "article", "footer"];
pub const KINDS: [&str; 2] = ["script", "image"];

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Ad {
    pub id: i64,
    pub name: String,
    pub kind: String,
    pub content: String,
    pub position: String,
    pub is_active: bool,
    #[schema(value_type = Option<String>, format = "date")]
    pub start_date: Option<NaiveDate>,
    #[schema(value_type = Option<String>, format = "date")]
    pub end_date: Option<NaiveDate>,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: NaiveDateTime,
}
