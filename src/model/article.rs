use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const STATUS_DRAFT: &str = "draft";
pub const STATUS_PUBLISHED: &str = "published";

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Article {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub excerpt: Option<String>,
    pub content: String,
    pub author_id: i64,
    pub category_id: i64,
    pub featured_image: Option<String>,
    pub status: String,
    pub views: i64,
    pub is_headline: bool,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub published_at: Option<NaiveDateTime>,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: NaiveDateTime,
    #[schema(value_type = String, format = "date-time")]
    pub updated_at: NaiveDateTime,
}

/// Listing row with the joined author and category names.
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
pub struct ArticleListItem {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub excerpt: Option<String>,
    pub author_id: i64,
    pub author_name: String,
    pub category_id: i64,
    pub category_name: String,
    pub category_slug: String,
    pub featured_image: Option<String>,
    pub views: i64,
    pub is_headline: bool,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub published_at: Option<NaiveDateTime>,
}
