use actix_web::{error::ErrorInternalServerError, web, HttpResponse, Responder};
use chrono::{Local, NaiveDate};
use serde::Deserialize;
use serde_json::json;
use sqlx::SqlitePool;
use tracing::error;
use utoipa::{IntoParams, ToSchema};

use crate::auth::auth::AuthUser;
use crate::model::ad::{Ad, KINDS, POSITIONS};

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct ActiveAdQuery {
    /// header | sidebar | article | footer
    pub position: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct CreateAd {
    pub name: String,
    /// script | image
    pub kind: String,
    pub content: String,
    /// header | sidebar | article | footer
    pub position: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[schema(value_type = Option<String>, format = "date")]
    pub start_date: Option<NaiveDate>,
    #[schema(value_type = Option<String>, format = "date")]
    pub end_date: Option<NaiveDate>,
}

fn default_true() -> bool {
    true
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateAd {
    pub name: Option<String>,
    pub kind: Option<String>,
    pub content: Option<String>,
    pub position: Option<String>,
    pub is_active: Option<bool>,
    #[schema(value_type = Option<String>, format = "date")]
    pub start_date: Option<NaiveDate>,
    #[schema(value_type = Option<String>, format = "date")]
    pub end_date: Option<NaiveDate>,
}

/// Active ads inside their date window, for the public site to embed.
#[utoipa::path(
    get,
    path = "/api/ads/active",
    params(ActiveAdQuery),
    responses((status = 200, body = [Ad])),
    tag = "Ads"
)]
pub async fn list_active_ads(
    pool: web::Data<SqlitePool>,
    query: web::Query<ActiveAdQuery>,
) -> actix_web::Result<impl Responder> {
    let today = Local::now().date_naive();

    let mut sql = String::from(
        "SELECT * FROM ads WHERE is_active = 1 \
         AND (start_date IS NULL OR start_date <= ?) \
         AND (end_date IS NULL OR end_date >= ?)",
    );
    if query.position.is_some() {
        sql.push_str(" AND position = ?");
    }
    sql.push_str(" ORDER BY id ASC");

    let mut q = sqlx::query_as::<_, Ad>(&sql).bind(today).bind(today);
    if let Some(position) = &query.position {
        q = q.bind(position);
    }

    let ads = q.fetch_all(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, "Failed to fetch active ads");
        ErrorInternalServerError("Database error")
    })?;

    Ok(HttpResponse::Ok().json(ads))
}

#[utoipa::path(
    get,
    path = "/api/ads",
    responses((status = 200, body = [Ad]), (status = 403)),
    security(("bearer_auth" = [])),
    tag = "Ads"
)]
pub async fn list_ads(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let ads = sqlx::query_as::<_, Ad>("SELECT * FROM ads ORDER BY id ASC")
        .fetch_all(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to fetch ads");
            ErrorInternalServerError("Database error")
        })?;

    Ok(HttpResponse::Ok().json(ads))
}

#[utoipa::path(
    post,
    path = "/api/ads",
    request_body = CreateAd,
    responses((status = 201), (status = 400), (status = 403)),
    security(("bearer_auth" = [])),
    tag = "Ads"
)]
pub async fn create_ad(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
    payload: web::Json<CreateAd>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    if !KINDS.contains(&payload.kind.as_str()) {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": format!("Unknown ad kind '{}'", payload.kind)
        })));
    }
    if !POSITIONS.contains(&payload.position.as_str()) {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": format!("Unknown ad position '{}'", payload.position)
        })));
    }

    let result = sqlx::query(
        r#"
        INSERT INTO ads (name, kind, content, position, is_active, start_date, end_date)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&payload.name)
    .bind(&payload.kind)
    .bind(&payload.content)
    .bind(&payload.position)
    .bind(payload.is_active)
    .bind(payload.start_date)
    .bind(payload.end_date)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, "Failed to create ad");
        ErrorInternalServerError("Database error")
    })?;

    Ok(HttpResponse::Created().json(json!({
        "message": "Ad created successfully",
        "id": result.last_insert_rowid()
    })))
}

#[utoipa::path(
    put,
    path = "/api/ads/{ad_id}",
    request_body = UpdateAd,
    params(("ad_id", description = "Ad ID")),
    responses((status = 200), (status = 400), (status = 403), (status = 404)),
    security(("bearer_auth" = [])),
    tag = "Ads"
)]
pub async fn update_ad(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
    path: web::Path<i64>,
    body: web::Json<UpdateAd>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let ad_id = path.into_inner();

    if let Some(kind) = &body.kind {
        if !KINDS.contains(&kind.as_str()) {
            return Ok(HttpResponse::BadRequest().json(json!({
                "message": format!("Unknown ad kind '{kind}'")
            })));
        }
    }
    if let Some(position) = &body.position {
        if !POSITIONS.contains(&position.as_str()) {
            return Ok(HttpResponse::BadRequest().json(json!({
                "message": format!("Unknown ad position '{position}'")
            })));
        }
    }

    let current = sqlx::query_as::<_, Ad>("SELECT * FROM ads WHERE id = ?")
        .bind(ad_id)
        .fetch_optional(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, ad_id, "Failed to fetch ad");
            ErrorInternalServerError("Database error")
        })?;

    let current = match current {
        Some(a) => a,
        None => {
            return Ok(HttpResponse::NotFound().json(json!({
                "message": "Ad not found"
            })));
        }
    };

    sqlx::query(
        r#"
        UPDATE ads
        SET name = ?, kind = ?, content = ?, position = ?, is_active = ?,
            start_date = ?, end_date = ?
        WHERE id = ?
        "#,
    )
    .bind(body.name.clone().unwrap_or(current.name))
    .bind(body.kind.clone().unwrap_or(current.kind))
    .bind(body.content.clone().unwrap_or(current.content))
    .bind(body.position.clone().unwrap_or(current.position))
    .bind(body.is_active.unwrap_or(current.is_active))
    .bind(body.start_date.or(current.start_date))
    .bind(body.end_date.or(current.end_date))
    .bind(ad_id)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, ad_id, "Failed to update ad");
        ErrorInternalServerError("Database error")
    })?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Ad updated successfully"
    })))
}

#[utoipa::path(
    delete,
    path = "/api/ads/{ad_id}",
    params(("ad_id", description = "Ad ID")),
    responses((status = 200), (status = 403), (status = 404)),
    security(("bearer_auth" = [])),
    tag = "Ads"
)]
pub async fn delete_ad(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
    path: web::Path<i64>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let ad_id = path.into_inner();

    let result = sqlx::query("DELETE FROM ads WHERE id = ?")
        .bind(ad_id)
        .execute(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, ad_id, "Failed to delete ad");
            ErrorInternalServerError("Database error")
        })?;

    if result.rows_affected() == 0 {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "Ad not found"
        })));
    }

    Ok(HttpResponse::Ok().json(json!({
        "message": "Ad deleted successfully"
    })))
}
