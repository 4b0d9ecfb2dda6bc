use actix_web::{error::ErrorInternalServerError, web, HttpResponse, Responder};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use sqlx::SqlitePool;
use tracing::error;
use utoipa::ToSchema;

use crate::auth::auth::AuthUser;
use crate::model::salary_component::{ComponentKind, SalaryComponent};

#[derive(Deserialize, ToSchema)]
pub struct CreateComponent {
    #[schema(example = "Gaji Pokok")]
    pub name: String,
    pub kind: ComponentKind,
    #[schema(value_type = String, example = "3000000")]
    pub value: Decimal,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateComponent {
    pub name: Option<String>,
    pub kind: Option<ComponentKind>,
    #[schema(value_type = Option<String>, example = "55000")]
    pub value: Option<Decimal>,
    pub is_active: Option<bool>,
}

#[utoipa::path(
    get,
    path = "/api/payroll/components",
    responses((status = 200, body = [SalaryComponent]), (status = 403)),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn list_components(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let components = SalaryComponent::list_all(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, "Failed to fetch salary components");
        ErrorInternalServerError("Database error")
    })?;

    Ok(HttpResponse::Ok().json(components))
}

#[utoipa::path(
    post,
    path = "/api/payroll/components",
    request_body = CreateComponent,
    responses((status = 201), (status = 400), (status = 403)),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn create_component(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
    payload: web::Json<CreateComponent>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    if payload.name.trim().is_empty() {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "Component name is required"
        })));
    }
    if payload.value.is_sign_negative() {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "Component value must not be negative"
        })));
    }

    let result = sqlx::query(
        r#"
        INSERT INTO salary_components (name, kind, value, is_active)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(payload.name.trim())
    .bind(payload.kind.to_string())
    .bind(payload.value.to_string())
    .bind(payload.is_active)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, "Failed to create salary component");
        ErrorInternalServerError("Database error")
    })?;

    Ok(HttpResponse::Created().json(json!({
        "message": "Salary component created successfully",
        "id": result.last_insert_rowid()
    })))
}

/// Edits apply to future payroll runs only; generated payrolls keep the
/// totals they were recorded with.
#[utoipa::path(
    put,
    path = "/api/payroll/components/{component_id}",
    request_body = UpdateComponent,
    params(("component_id", description = "Salary component ID")),
    responses((status = 200), (status = 400), (status = 403), (status = 404)),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn update_component(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
    path: web::Path<i64>,
    body: web::Json<UpdateComponent>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let component_id = path.into_inner();

    if let Some(value) = body.value {
        if value.is_sign_negative() {
            return Ok(HttpResponse::BadRequest().json(json!({
                "message": "Component value must not be negative"
            })));
        }
    }

    let current = SalaryComponent::find(pool.get_ref(), component_id)
        .await
        .map_err(|e| {
            error!(error = %e, component_id, "Failed to fetch salary component");
            ErrorInternalServerError("Database error")
        })?;

    let current = match current {
        Some(c) => c,
        None => {
            return Ok(HttpResponse::NotFound().json(json!({
                "message": "Salary component not found"
            })));
        }
    };

    let name = body.name.clone().unwrap_or(current.name);
    let kind = body.kind.unwrap_or(current.kind);
    let value = body.value.unwrap_or(current.value);
    let is_active = body.is_active.unwrap_or(current.is_active);

    sqlx::query(
        r#"
        UPDATE salary_components
        SET name = ?, kind = ?, value = ?, is_active = ?
        WHERE id = ?
        "#,
    )
    .bind(&name)
    .bind(kind.to_string())
    .bind(value.to_string())
    .bind(is_active)
    .bind(component_id)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, component_id, "Failed to update salary component");
        ErrorInternalServerError("Database error")
    })?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Salary component updated successfully"
    })))
}

// ComponentKind deserializes from the same snake_case strings the column
// stores, so FromStr keeps API payloads and rows aligned.
#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn component_kind_payload_matches_column_encoding() {
        let kind: ComponentKind = serde_json::from_str("\"per_view_bucket\"").unwrap();
        assert_eq!(kind, ComponentKind::PerViewBucket);
        assert_eq!(ComponentKind::from_str("per_view_bucket").unwrap(), kind);
    }
}
