use actix_web::{error::ErrorInternalServerError, web, HttpResponse, Responder};
use serde::Deserialize;
use serde_json::json;
use sqlx::SqlitePool;
use tracing::error;
use utoipa::ToSchema;

use crate::auth::auth::AuthUser;
use crate::model::category::Category;

#[derive(Deserialize, ToSchema)]
pub struct CreateCategory {
    #[schema(example = "Politik")]
    pub name: String,
    #[schema(example = "politik")]
    pub slug: String,
    pub icon: Option<String>,
    pub order_index: Option<i64>,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateCategory {
    pub name: Option<String>,
    pub icon: Option<String>,
    pub order_index: Option<i64>,
}

#[utoipa::path(
    get,
    path = "/api/categories",
    responses((status = 200, body = [Category])),
    tag = "Categories"
)]
pub async fn list_categories(pool: web::Data<SqlitePool>) -> actix_web::Result<impl Responder> {
    let categories = sqlx::query_as::<_, Category>(
        "SELECT * FROM categories ORDER BY order_index ASC, id ASC",
    )
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, "Failed to fetch categories");
        ErrorInternalServerError("Database error")
    })?;

    Ok(HttpResponse::Ok().json(categories))
}

#[utoipa::path(
    post,
    path = "/api/categories",
    request_body = CreateCategory,
    responses((status = 201), (status = 403), (status = 409)),
    security(("bearer_auth" = [])),
    tag = "Categories"
)]
pub async fn create_category(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
    payload: web::Json<CreateCategory>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let result = sqlx::query(
        r#"
        INSERT INTO categories (name, slug, icon, order_index)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(&payload.name)
    .bind(&payload.slug)
    .bind(&payload.icon)
    .bind(payload.order_index.unwrap_or(0))
    .execute(pool.get_ref())
    .await;

    match result {
        Ok(r) => Ok(HttpResponse::Created().json(json!({
            "message": "Category created successfully",
            "id": r.last_insert_rowid()
        }))),
        Err(e) => {
            if let sqlx::Error::Database(db) = &e {
                if db.is_unique_violation() {
                    return Ok(HttpResponse::Conflict().json(json!({
                        "message": "Category slug already exists"
                    })));
                }
            }
            error!(error = %e, "Failed to create category");
            Ok(HttpResponse::InternalServerError().json(json!({
                "message": "Internal Server Error"
            })))
        }
    }
}

#[utoipa::path(
    put,
    path = "/api/categories/{category_id}",
    request_body = UpdateCategory,
    params(("category_id", description = "Category ID")),
    responses((status = 200), (status = 403), (status = 404)),
    security(("bearer_auth" = [])),
    tag = "Categories"
)]
pub async fn update_category(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
    path: web::Path<i64>,
    body: web::Json<UpdateCategory>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let category_id = path.into_inner();

    let current = sqlx::query_as::<_, Category>("SELECT * FROM categories WHERE id = ?")
        .bind(category_id)
        .fetch_optional(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, category_id, "Failed to fetch category");
            ErrorInternalServerError("Database error")
        })?;

    let current = match current {
        Some(c) => c,
        None => {
            return Ok(HttpResponse::NotFound().json(json!({
                "message": "Category not found"
            })));
        }
    };

    sqlx::query("UPDATE categories SET name = ?, icon = ?, order_index = ? WHERE id = ?")
        .bind(body.name.clone().unwrap_or(current.name))
        .bind(body.icon.clone().or(current.icon))
        .bind(body.order_index.unwrap_or(current.order_index))
        .bind(category_id)
        .execute(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, category_id, "Failed to update category");
            ErrorInternalServerError("Database error")
        })?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Category updated successfully"
    })))
}
