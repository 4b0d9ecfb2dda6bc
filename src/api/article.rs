use actix_web::{error::ErrorInternalServerError, web, HttpResponse, Responder};
use chrono::{Local, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::SqlitePool;
use tracing::{debug, error};
use utoipa::{IntoParams, ToSchema};

use crate::auth::auth::AuthUser;
use crate::model::article::{Article, ArticleListItem, STATUS_DRAFT, STATUS_PUBLISHED};

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct ArticleQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    /// Category slug.
    pub category: Option<String>,
    /// Matches title or excerpt.
    pub search: Option<String>,
    /// latest (default) | oldest | popular
    pub sort: Option<String>,
    /// Headline articles only.
    pub featured: Option<bool>,
}

#[derive(Deserialize, ToSchema)]
pub struct CreateArticle {
    #[schema(example = "Banjir di Kota Langsa")]
    pub title: String,
    pub content: String,
    pub excerpt: Option<String>,
    pub category_id: i64,
    pub featured_image: Option<String>,
    #[serde(default)]
    pub is_headline: bool,
    /// draft (default) | published
    pub status: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateArticle {
    pub title: Option<String>,
    pub content: Option<String>,
    pub excerpt: Option<String>,
    pub category_id: Option<i64>,
    pub featured_image: Option<String>,
    pub is_headline: Option<bool>,
    pub status: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: i64,
    pub total_pages: i64,
}

#[derive(Serialize, ToSchema)]
pub struct ArticleListResponse {
    pub articles: Vec<ArticleListItem>,
    pub pagination: Pagination,
}

/// URL slug from a title; a millisecond suffix keeps slugs unique without
/// a retry loop on the unique index.
fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut last_dash = true;
    for c in title.to_lowercase().chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c);
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }
    let slug = slug.trim_matches('-').to_string();
    format!("{}-{}", slug, Utc::now().timestamp_millis())
}

#[utoipa::path(
    get,
    path = "/api/articles",
    params(ArticleQuery),
    responses(
        (status = 200, description = "Paginated published articles", body = ArticleListResponse)
    ),
    tag = "Articles"
)]
pub async fn list_articles(
    pool: web::Data<SqlitePool>,
    query: web::Query<ArticleQuery>,
) -> actix_web::Result<impl Responder> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(10).clamp(1, 50);
    let offset = (page - 1) * limit;

    // ---------- build WHERE clause dynamically ----------
    let mut conditions = vec!["a.status = 'published'"];
    let mut bindings: Vec<String> = Vec::new();

    if let Some(category) = &query.category {
        conditions.push("c.slug = ?");
        bindings.push(category.clone());
    }

    if let Some(search) = &query.search {
        conditions.push("(a.title LIKE ? OR a.excerpt LIKE ?)");
        let like = format!("%{}%", search);
        bindings.push(like.clone());
        bindings.push(like);
    }

    if query.featured == Some(true) {
        conditions.push("a.is_headline = 1");
    }

    let where_clause = format!("WHERE {}", conditions.join(" AND "));

    let order_clause = match query.sort.as_deref() {
        Some("popular") => "ORDER BY a.views DESC",
        Some("oldest") => "ORDER BY a.published_at ASC",
        _ => "ORDER BY a.published_at DESC",
    };

    let count_sql = format!(
        "SELECT COUNT(*) FROM articles a JOIN categories c ON a.category_id = c.id {}",
        where_clause
    );
    debug!(sql = %count_sql, "Counting articles");

    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
    for b in &bindings {
        count_query = count_query.bind(b);
    }
    let total = count_query.fetch_one(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, "Failed to count articles");
        ErrorInternalServerError("Database error")
    })?;

    let data_sql = format!(
        "SELECT a.id, a.title, a.slug, a.excerpt, a.author_id, u.name AS author_name, \
         a.category_id, c.name AS category_name, c.slug AS category_slug, \
         a.featured_image, a.views, a.is_headline, a.published_at \
         FROM articles a \
         JOIN users u ON a.author_id = u.id \
         JOIN categories c ON a.category_id = c.id \
         {} {} LIMIT ? OFFSET ?",
        where_clause, order_clause
    );

    let mut data_query = sqlx::query_as::<_, ArticleListItem>(&data_sql);
    for b in &bindings {
        data_query = data_query.bind(b);
    }
    data_query = data_query.bind(limit as i64).bind(offset as i64);

    let articles = data_query.fetch_all(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, "Failed to fetch articles");
        ErrorInternalServerError("Database error")
    })?;

    Ok(HttpResponse::Ok().json(ArticleListResponse {
        articles,
        pagination: Pagination {
            page,
            limit,
            total,
            total_pages: (total + limit as i64 - 1) / limit as i64,
        },
    }))
}

#[utoipa::path(
    get,
    path = "/api/articles/{slug}",
    params(("slug", description = "Article slug")),
    responses(
        (status = 200, body = Article),
        (status = 404)
    ),
    tag = "Articles"
)]
pub async fn get_article(
    pool: web::Data<SqlitePool>,
    path: web::Path<String>,
) -> actix_web::Result<impl Responder> {
    let slug = path.into_inner();

    let article = sqlx::query_as::<_, Article>(
        r#"
        SELECT * FROM articles
        WHERE slug = ? AND status = 'published'
        "#,
    )
    .bind(&slug)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, slug, "Failed to fetch article");
        ErrorInternalServerError("Database error")
    })?;

    let mut article = match article {
        Some(a) => a,
        None => {
            return Ok(HttpResponse::NotFound().json(json!({
                "message": "Article not found"
            })));
        }
    };

    // public reads count toward the author's view bonus
    if let Err(e) = sqlx::query("UPDATE articles SET views = views + 1 WHERE id = ?")
        .bind(article.id)
        .execute(pool.get_ref())
        .await
    {
        error!(error = %e, article_id = article.id, "Failed to increment views");
    } else {
        article.views += 1;
    }

    Ok(HttpResponse::Ok().json(article))
}

#[utoipa::path(
    post,
    path = "/api/articles",
    request_body = CreateArticle,
    responses(
        (status = 201, description = "Article created"),
        (status = 400),
        (status = 401)
    ),
    security(("bearer_auth" = [])),
    tag = "Articles"
)]
pub async fn create_article(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
    payload: web::Json<CreateArticle>,
) -> actix_web::Result<impl Responder> {
    if payload.title.trim().is_empty() || payload.content.trim().is_empty() {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "Title and content are required"
        })));
    }

    let status = match payload.status.as_deref() {
        None => STATUS_DRAFT,
        Some(STATUS_DRAFT) => STATUS_DRAFT,
        Some(STATUS_PUBLISHED) => STATUS_PUBLISHED,
        Some(other) => {
            return Ok(HttpResponse::BadRequest().json(json!({
                "message": format!("Unknown status '{other}'")
            })));
        }
    };

    let slug = slugify(&payload.title);
    let published_at = (status == STATUS_PUBLISHED).then(|| Local::now().naive_local());

    let result = sqlx::query(
        r#"
        INSERT INTO articles
        (title, slug, excerpt, content, author_id, category_id, featured_image,
         status, is_headline, published_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&payload.title)
    .bind(&slug)
    .bind(&payload.excerpt)
    .bind(&payload.content)
    .bind(auth.user_id)
    .bind(payload.category_id)
    .bind(&payload.featured_image)
    .bind(status)
    .bind(payload.is_headline)
    .bind(published_at)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, "Failed to create article");
        ErrorInternalServerError("Database error")
    })?;

    Ok(HttpResponse::Created().json(json!({
        "message": "Article created successfully",
        "id": result.last_insert_rowid(),
        "slug": slug
    })))
}

#[utoipa::path(
    put,
    path = "/api/articles/id/{article_id}",
    request_body = UpdateArticle,
    params(("article_id", description = "Article ID")),
    responses(
        (status = 200, description = "Article updated"),
        (status = 403),
        (status = 404)
    ),
    security(("bearer_auth" = [])),
    tag = "Articles"
)]
pub async fn update_article(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
    path: web::Path<i64>,
    body: web::Json<UpdateArticle>,
) -> actix_web::Result<impl Responder> {
    let article_id = path.into_inner();

    let current = sqlx::query_as::<_, Article>("SELECT * FROM articles WHERE id = ?")
        .bind(article_id)
        .fetch_optional(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, article_id, "Failed to fetch article");
            ErrorInternalServerError("Database error")
        })?;

    let current = match current {
        Some(a) => a,
        None => {
            return Ok(HttpResponse::NotFound().json(json!({
                "message": "Article not found"
            })));
        }
    };

    if !auth.can_manage_content_of(current.author_id) {
        return Ok(HttpResponse::Forbidden().json(json!({
            "message": "You may only edit your own articles"
        })));
    }

    let status = match body.status.as_deref() {
        None => current.status.clone(),
        Some(s @ (STATUS_DRAFT | STATUS_PUBLISHED)) => s.to_string(),
        Some(other) => {
            return Ok(HttpResponse::BadRequest().json(json!({
                "message": format!("Unknown status '{other}'")
            })));
        }
    };

    // first transition to published stamps the date the aggregate uses
    let published_at = if status == STATUS_PUBLISHED && current.published_at.is_none() {
        Some(Local::now().naive_local())
    } else {
        current.published_at
    };

    let title = body.title.clone().unwrap_or(current.title);
    let content = body.content.clone().unwrap_or(current.content);
    let excerpt = body.excerpt.clone().or(current.excerpt);
    let category_id = body.category_id.unwrap_or(current.category_id);
    let featured_image = body.featured_image.clone().or(current.featured_image);
    let is_headline = body.is_headline.unwrap_or(current.is_headline);

    sqlx::query(
        r#"
        UPDATE articles
        SET title = ?, content = ?, excerpt = ?, category_id = ?, featured_image = ?,
            status = ?, is_headline = ?, published_at = ?, updated_at = CURRENT_TIMESTAMP
        WHERE id = ?
        "#,
    )
    .bind(&title)
    .bind(&content)
    .bind(&excerpt)
    .bind(category_id)
    .bind(&featured_image)
    .bind(&status)
    .bind(is_headline)
    .bind(published_at)
    .bind(article_id)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, article_id, "Failed to update article");
        ErrorInternalServerError("Database error")
    })?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Article updated successfully"
    })))
}

#[utoipa::path(
    delete,
    path = "/api/articles/id/{article_id}",
    params(("article_id", description = "Article ID")),
    responses(
        (status = 200, description = "Article deleted"),
        (status = 403),
        (status = 404)
    ),
    security(("bearer_auth" = [])),
    tag = "Articles"
)]
pub async fn delete_article(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
    path: web::Path<i64>,
) -> actix_web::Result<impl Responder> {
    let article_id = path.into_inner();

    let author_id = sqlx::query_scalar::<_, i64>("SELECT author_id FROM articles WHERE id = ?")
        .bind(article_id)
        .fetch_optional(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, article_id, "Failed to fetch article");
            ErrorInternalServerError("Database error")
        })?;

    let author_id = match author_id {
        Some(id) => id,
        None => {
            return Ok(HttpResponse::NotFound().json(json!({
                "message": "Article not found"
            })));
        }
    };

    if !auth.can_manage_content_of(author_id) {
        return Ok(HttpResponse::Forbidden().json(json!({
            "message": "You may only delete your own articles"
        })));
    }

    sqlx::query("DELETE FROM articles WHERE id = ?")
        .bind(article_id)
        .execute(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, article_id, "Failed to delete article");
            ErrorInternalServerError("Database error")
        })?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Article deleted successfully"
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_normalizes_title() {
        let slug = slugify("Banjir di Kota Langsa!");
        assert!(slug.starts_with("banjir-di-kota-langsa-"));
        assert!(!slug.contains("--"));
        assert!(!slug.contains('!'));
    }

    #[test]
    fn slugify_trims_leading_and_trailing_separators() {
        let slug = slugify("  ¡Hola! ");
        assert!(slug.starts_with("hola-"));
    }
}
