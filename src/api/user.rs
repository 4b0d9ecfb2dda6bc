use std::str::FromStr;

use actix_web::{error::ErrorInternalServerError, web, HttpResponse, Responder};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::SqlitePool;
use tracing::{debug, error};
use utoipa::{IntoParams, ToSchema};

use crate::auth::auth::AuthUser;
use crate::auth::password::hash_password;
use crate::model::role::Role;
use crate::model::user::User;

#[derive(Deserialize, ToSchema)]
pub struct CreateUser {
    #[schema(example = "Siti Rahma")]
    pub name: String,
    #[schema(example = "siti@langsapost.com", format = "email")]
    pub email: String,
    pub password: String,
    #[schema(example = "writer")]
    pub role: String,
    /// Tax identifier printed on payslips.
    pub nik: Option<String>,
    pub phone: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateUser {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
    pub nik: Option<String>,
    pub phone: Option<String>,
    pub avatar_url: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct UserQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub role: Option<String>,
    pub is_active: Option<bool>,
    /// Search by name or email.
    pub search: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct UserListResponse {
    pub data: Vec<User>,
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
}

#[utoipa::path(
    get,
    path = "/api/users",
    params(UserQuery),
    responses((status = 200, body = UserListResponse), (status = 403)),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn list_users(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
    query: web::Query<UserQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
    let offset = (page - 1) * per_page;

    // ---------- build WHERE clause dynamically ----------
    let mut conditions = Vec::new();
    let mut bindings: Vec<String> = Vec::new();

    if let Some(role) = &query.role {
        conditions.push("role = ?");
        bindings.push(role.clone());
    }

    if let Some(is_active) = query.is_active {
        conditions.push("is_active = ?");
        bindings.push(if is_active { "1".into() } else { "0".into() });
    }

    if let Some(search) = &query.search {
        conditions.push("(name LIKE ? OR email LIKE ?)");
        let like = format!("%{}%", search);
        bindings.push(like.clone());
        bindings.push(like);
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };

    let count_sql = format!("SELECT COUNT(*) FROM users {}", where_clause);
    debug!(sql = %count_sql, "Counting users");

    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
    for b in &bindings {
        count_query = count_query.bind(b);
    }
    let total = count_query.fetch_one(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, "Failed to count users");
        ErrorInternalServerError("Database error")
    })?;

    let data_sql = format!(
        "SELECT * FROM users {} ORDER BY id ASC LIMIT ? OFFSET ?",
        where_clause
    );

    let mut data_query = sqlx::query_as::<_, User>(&data_sql);
    for b in &bindings {
        data_query = data_query.bind(b);
    }
    data_query = data_query.bind(per_page as i64).bind(offset as i64);

    let users = data_query.fetch_all(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, "Failed to fetch users");
        ErrorInternalServerError("Database error")
    })?;

    Ok(HttpResponse::Ok().json(UserListResponse {
        data: users,
        page,
        per_page,
        total,
    }))
}

#[utoipa::path(
    post,
    path = "/api/users",
    request_body = CreateUser,
    responses((status = 201), (status = 400), (status = 403), (status = 409)),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn create_user(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
    payload: web::Json<CreateUser>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    if payload.name.trim().is_empty()
        || payload.email.trim().is_empty()
        || payload.password.is_empty()
    {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "Name, email and password are required"
        })));
    }

    if Role::from_str(&payload.role).is_err() {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": format!("Unknown role '{}'", payload.role)
        })));
    }

    let result = sqlx::query(
        r#"
        INSERT INTO users (name, email, password_hash, role, nik, phone)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(payload.name.trim())
    .bind(payload.email.trim())
    .bind(hash_password(&payload.password))
    .bind(&payload.role)
    .bind(&payload.nik)
    .bind(&payload.phone)
    .execute(pool.get_ref())
    .await;

    match result {
        Ok(r) => Ok(HttpResponse::Created().json(json!({
            "message": "User created successfully",
            "id": r.last_insert_rowid()
        }))),
        Err(e) => {
            if let sqlx::Error::Database(db) = &e {
                if db.is_unique_violation() {
                    return Ok(HttpResponse::Conflict().json(json!({
                        "message": "Email or NIK already exists"
                    })));
                }
            }
            error!(error = %e, "Failed to create user");
            Ok(HttpResponse::InternalServerError().json(json!({
                "message": "Internal Server Error"
            })))
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/users/{user_id}",
    params(("user_id", description = "User ID")),
    responses((status = 200, body = User), (status = 403), (status = 404)),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn get_user(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
    path: web::Path<i64>,
) -> actix_web::Result<impl Responder> {
    let user_id = path.into_inner();

    // admins see everyone, others only themselves
    if !auth.is_admin() && auth.user_id != user_id {
        return Err(actix_web::error::ErrorForbidden("Access denied"));
    }

    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_optional(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, user_id, "Failed to fetch user");
            ErrorInternalServerError("Database error")
        })?;

    match user {
        Some(u) => Ok(HttpResponse::Ok().json(u)),
        None => Ok(HttpResponse::NotFound().json(json!({
            "message": "User not found"
        }))),
    }
}

#[utoipa::path(
    put,
    path = "/api/users/{user_id}",
    request_body = UpdateUser,
    params(("user_id", description = "User ID")),
    responses((status = 200), (status = 400), (status = 403), (status = 404)),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn update_user(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
    path: web::Path<i64>,
    body: web::Json<UpdateUser>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let user_id = path.into_inner();

    if let Some(role) = &body.role {
        if Role::from_str(role).is_err() {
            return Ok(HttpResponse::BadRequest().json(json!({
                "message": format!("Unknown role '{role}'")
            })));
        }
    }

    let current = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_optional(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, user_id, "Failed to fetch user");
            ErrorInternalServerError("Database error")
        })?;

    let current = match current {
        Some(u) => u,
        None => {
            return Ok(HttpResponse::NotFound().json(json!({
                "message": "User not found"
            })));
        }
    };

    let password_hash = match &body.password {
        Some(p) if !p.is_empty() => hash_password(p),
        _ => current.password_hash,
    };

    sqlx::query(
        r#"
        UPDATE users
        SET name = ?, email = ?, password_hash = ?, role = ?, nik = ?, phone = ?,
            avatar_url = ?, is_active = ?
        WHERE id = ?
        "#,
    )
    .bind(body.name.clone().unwrap_or(current.name))
    .bind(body.email.clone().unwrap_or(current.email))
    .bind(password_hash)
    .bind(body.role.clone().unwrap_or(current.role))
    .bind(body.nik.clone().or(current.nik))
    .bind(body.phone.clone().or(current.phone))
    .bind(body.avatar_url.clone().or(current.avatar_url))
    .bind(body.is_active.unwrap_or(current.is_active))
    .bind(user_id)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, user_id, "Failed to update user");
        ErrorInternalServerError("Database error")
    })?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "User updated successfully"
    })))
}

#[utoipa::path(
    delete,
    path = "/api/users/{user_id}",
    params(("user_id", description = "User ID")),
    responses((status = 200, description = "User deactivated"), (status = 403), (status = 404)),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn deactivate_user(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
    path: web::Path<i64>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let user_id = path.into_inner();

    if user_id == auth.user_id {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "You cannot deactivate your own account"
        })));
    }

    // soft switch: historical payrolls keep referencing the row
    let result = sqlx::query("UPDATE users SET is_active = 0 WHERE id = ?")
        .bind(user_id)
        .execute(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, user_id, "Failed to deactivate user");
            ErrorInternalServerError("Database error")
        })?;

    if result.rows_affected() == 0 {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "User not found"
        })));
    }

    Ok(HttpResponse::Ok().json(json!({
        "message": "User deactivated successfully"
    })))
}
