use std::collections::BTreeMap;

use actix_web::{error::ErrorInternalServerError, web, HttpResponse, Responder};
use serde::Deserialize;
use serde_json::json;
use sqlx::SqlitePool;
use tracing::error;
use utoipa::ToSchema;

use crate::auth::auth::AuthUser;

#[derive(Deserialize, ToSchema)]
pub struct UpdateSetting {
    #[schema(example = "LangsaPost")]
    pub value: String,
}

/// Public key/value map the frontend renders from (site name, contact
/// details, ticker text).
#[utoipa::path(
    get,
    path = "/api/settings",
    responses((status = 200, description = "Settings as a key/value object")),
    tag = "Settings"
)]
pub async fn get_settings(pool: web::Data<SqlitePool>) -> actix_web::Result<impl Responder> {
    let rows = sqlx::query_as::<_, (String, Option<String>)>(
        "SELECT key, value FROM site_settings ORDER BY key",
    )
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, "Failed to fetch settings");
        ErrorInternalServerError("Database error")
    })?;

    let settings: BTreeMap<String, Option<String>> = rows.into_iter().collect();
    Ok(HttpResponse::Ok().json(settings))
}

#[utoipa::path(
    put,
    path = "/api/settings/{key}",
    request_body = UpdateSetting,
    params(("key", description = "Setting key")),
    responses((status = 200), (status = 403)),
    security(("bearer_auth" = [])),
    tag = "Settings"
)]
pub async fn update_setting(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
    path: web::Path<String>,
    body: web::Json<UpdateSetting>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let key = path.into_inner();

    sqlx::query(
        r#"
        INSERT INTO site_settings (key, value, updated_at)
        VALUES (?, ?, CURRENT_TIMESTAMP)
        ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(&key)
    .bind(&body.value)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, key, "Failed to update setting");
        ErrorInternalServerError("Database error")
    })?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Setting updated successfully"
    })))
}
