use actix_web::{error::ErrorInternalServerError, web, HttpResponse, Responder};
use chrono::Local;
use serde::Deserialize;
use serde_json::json;
use sqlx::SqlitePool;
use tracing::{error, info};
use utoipa::ToSchema;

use crate::auth::auth::AuthUser;
use crate::error::PayrollError;
use crate::payroll::ledger::{PayrollFilter, PayrollLedger};
use crate::payroll::renderer::month_name;
use crate::payroll::scheduler::{PayrollScheduler, RunOutcome, RunState, TriggerMode};
use crate::payroll::Period;

#[derive(Deserialize, ToSchema)]
pub struct GeneratePayrollReq {
    #[schema(example = 5, minimum = 1, maximum = 12)]
    pub month: u32,
    #[schema(example = 2025)]
    pub year: i32,
}

/// Manual trigger: runs the same pipeline as the monthly timer for an
/// explicit, already-closed period. Safe to re-run; recorded authors are
/// skipped.
#[utoipa::path(
    post,
    path = "/api/payroll/generate",
    request_body = GeneratePayrollReq,
    responses(
        (status = 200, description = "Per-author outcome of the run", body = RunOutcome),
        (status = 400, description = "Invalid or still-open period"),
        (status = 403)
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn generate_payroll(
    auth: AuthUser,
    scheduler: web::Data<PayrollScheduler>,
    payload: web::Json<GeneratePayrollReq>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let period = match Period::new(payload.month, payload.year) {
        Ok(p) => p,
        Err(e) => {
            return Ok(HttpResponse::BadRequest().json(json!({
                "message": e.to_string()
            })));
        }
    };

    if let Err(e) = period.ensure_closed(Local::now().date_naive()) {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": e.to_string()
        })));
    }

    info!(period = %period, admin = auth.user_id, "manual payroll generation requested");

    let outcome = scheduler
        .trigger(period, TriggerMode::Manual)
        .await
        .map_err(|e| {
            error!(error = %e, period = %period, "payroll run failed");
            ErrorInternalServerError("Payroll generation failed")
        })?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Payroll generation completed",
        "period": outcome.period,
        "created": outcome.created,
        "skipped": outcome.skipped,
        "failed": outcome.failed,
    })))
}

/// Where the state machine currently sits: idle, mid-run, or how the
/// last run ended.
#[utoipa::path(
    get,
    path = "/api/payroll/status",
    responses((status = 200, description = "Scheduler run state"), (status = 403)),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn payroll_status(
    auth: AuthUser,
    scheduler: web::Data<PayrollScheduler>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let body = match scheduler.state() {
        RunState::Idle => json!({ "state": "idle" }),
        RunState::Running(period) => json!({ "state": "running", "period": period }),
        RunState::Completed(period) => json!({ "state": "completed", "period": period }),
        RunState::PartiallyFailed(period) => {
            json!({ "state": "partially_failed", "period": period })
        }
    };

    Ok(HttpResponse::Ok().json(body))
}

/// Ledger read. Admins see every author; anyone else is pinned to their
/// own rows no matter what the query string says.
#[utoipa::path(
    get,
    path = "/api/payroll",
    params(PayrollFilter),
    responses((status = 200, description = "Matching payroll rows")),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn list_payrolls(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
    query: web::Query<PayrollFilter>,
) -> actix_web::Result<impl Responder> {
    let mut filter = query.into_inner();
    if !auth.is_admin() {
        filter.author_id = Some(auth.user_id);
    }

    let ledger = PayrollLedger::new(pool.get_ref().clone());
    let payrolls = ledger.list(&filter).await.map_err(|e| {
        error!(error = %e, "Failed to list payrolls");
        ErrorInternalServerError("Database error")
    })?;

    Ok(HttpResponse::Ok().json(payrolls))
}

#[utoipa::path(
    get,
    path = "/api/payroll/{payroll_id}/download",
    params(("payroll_id", description = "Payroll ID")),
    responses(
        (status = 200, description = "Payslip PDF", content_type = "application/pdf"),
        (status = 403),
        (status = 404)
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn download_payroll(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
    scheduler: web::Data<PayrollScheduler>,
    path: web::Path<i64>,
) -> actix_web::Result<impl Responder> {
    let payroll_id = path.into_inner();

    let ledger = PayrollLedger::new(pool.get_ref().clone());
    let result = ledger
        .fetch_document(scheduler.document_store(), payroll_id)
        .await;

    let (payroll, bytes) = match result {
        Ok(found) => found,
        Err(PayrollError::NotFound { entity }) => {
            return Ok(HttpResponse::NotFound().json(json!({
                "message": format!("{entity} not found")
            })));
        }
        Err(e) => {
            error!(error = %e, payroll_id, "Failed to fetch payslip document");
            return Err(ErrorInternalServerError("Internal Server Error"));
        }
    };

    // admins and the owning author only
    if !auth.is_admin() && auth.user_id != payroll.author_id {
        return Err(actix_web::error::ErrorForbidden("Access denied"));
    }

    let author_name = sqlx::query_scalar::<_, String>("SELECT name FROM users WHERE id = ?")
        .bind(payroll.author_id)
        .fetch_optional(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, payroll_id, "Failed to fetch author name");
            ErrorInternalServerError("Internal Server Error")
        })?
        .unwrap_or_else(|| "unknown".to_string());

    info!(
        payroll_id,
        author_id = payroll.author_id,
        period = %format!("{} {}", month_name(payroll.month), payroll.year),
        "payslip downloaded"
    );

    Ok(HttpResponse::Ok()
        .content_type("application/pdf")
        .insert_header((
            "Content-Disposition",
            format!(
                "attachment; filename=\"slip_gaji_{}_{}_{}.pdf\"",
                author_name, payroll.year, payroll.month
            ),
        ))
        .body(bytes))
}
