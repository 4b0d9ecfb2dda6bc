//! The batch pipeline and its two trigger paths. The periodic timer and
//! the manual HTTP trigger share one body: resolve the author list, and
//! for each author check the ledger, aggregate, compute, render, store,
//! record. One author's failure never halts the sweep.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{Datelike, Local, Months, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::{error, info, warn};
use utoipa::ToSchema;

use crate::error::{PayrollError, PayrollResult};
use crate::model::salary_component::SalaryComponent;
use crate::model::user::User;
use crate::payroll::aggregate::aggregate_for_author;
use crate::payroll::calculator::compute;
use crate::payroll::ledger::{NewPayroll, PayrollLedger};
use crate::payroll::renderer::{layout_slip, PdfRenderer, SlipRenderer};
use crate::payroll::storage::DocumentStore;
use crate::payroll::Period;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerMode {
    Periodic,
    Manual,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Running(Period),
    Completed(Period),
    PartiallyFailed(Period),
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CreatedSlip {
    pub author_id: i64,
    pub author_name: String,
    pub payroll_id: i64,
    #[schema(value_type = String, example = "3011500")]
    pub total: Decimal,
    pub document_ref: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SkippedAuthor {
    pub author_id: i64,
    pub author_name: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct FailedAuthor {
    pub author_id: i64,
    pub author_name: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RunOutcome {
    pub period: Period,
    pub created: Vec<CreatedSlip>,
    pub skipped: Vec<SkippedAuthor>,
    pub failed: Vec<FailedAuthor>,
}

enum AuthorOutcome {
    Created(CreatedSlip),
    Skipped,
}

/// Runs the full sweep for one period. Errors before the author loop
/// (author list, rule set) abort the run; everything after is isolated
/// per author.
pub async fn run_payroll<R: SlipRenderer>(
    pool: &SqlitePool,
    docs: &DocumentStore,
    renderer: &R,
    period: Period,
    mode: TriggerMode,
) -> PayrollResult<RunOutcome> {
    info!(period = %period, ?mode, "starting payroll run");

    let ledger = PayrollLedger::new(pool.clone());
    let components = SalaryComponent::list_active(pool).await?;
    let authors = sqlx::query_as::<_, User>(
        "SELECT * FROM users WHERE is_active = 1 ORDER BY id",
    )
    .fetch_all(pool)
    .await?;

    let generated_on = Local::now().date_naive();
    let mut outcome = RunOutcome {
        period,
        created: Vec::new(),
        skipped: Vec::new(),
        failed: Vec::new(),
    };

    for author in &authors {
        let result = process_author(
            pool, &ledger, docs, renderer, &components, author, period, generated_on,
        )
        .await;

        match result {
            Ok(AuthorOutcome::Created(slip)) => {
                info!(author_id = author.id, payroll_id = slip.payroll_id, "payslip generated");
                outcome.created.push(slip);
            }
            Ok(AuthorOutcome::Skipped) => {
                outcome.skipped.push(SkippedAuthor {
                    author_id: author.id,
                    author_name: author.name.clone(),
                });
            }
            Err(e) => {
                warn!(author_id = author.id, error = %e, "payroll generation failed for author");
                outcome.failed.push(FailedAuthor {
                    author_id: author.id,
                    author_name: author.name.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    info!(
        period = %period,
        created = outcome.created.len(),
        skipped = outcome.skipped.len(),
        failed = outcome.failed.len(),
        "payroll run finished"
    );
    Ok(outcome)
}

#[allow(clippy::too_many_arguments)]
async fn process_author<R: SlipRenderer>(
    pool: &SqlitePool,
    ledger: &PayrollLedger,
    docs: &DocumentStore,
    renderer: &R,
    components: &[SalaryComponent],
    author: &User,
    period: Period,
    generated_on: NaiveDate,
) -> PayrollResult<AuthorOutcome> {
    if ledger.exists(author.id, period).await? {
        return Ok(AuthorOutcome::Skipped);
    }

    let aggregate = aggregate_for_author(pool, author.id, period).await?;
    let breakdown = compute(&aggregate, components);

    let slip = layout_slip(author, period, &breakdown, generated_on);
    let bytes = renderer.render(&slip)?;

    let filename = format!("payroll_{}_{}_{}.pdf", author.id, period.year, period.month);
    let reference = docs.save(&filename, &bytes)?;

    let record = NewPayroll {
        author_id: author.id,
        period,
        breakdown: breakdown.clone(),
        pdf_path: reference.clone(),
    };
    let payroll_id = match ledger.record(&record).await {
        Ok(id) => id,
        // Lost a check-then-insert race: an entry exists, which is what
        // the idempotency contract asks for.
        Err(PayrollError::DuplicatePayroll { .. }) => return Ok(AuthorOutcome::Skipped),
        Err(e) => return Err(e),
    };

    Ok(AuthorOutcome::Created(CreatedSlip {
        author_id: author.id,
        author_name: author.name.clone(),
        payroll_id,
        total: breakdown.total,
        document_ref: reference,
    }))
}

/// Owns the pipeline collaborators and tracks the run state machine:
/// Idle -> Running(period) -> Completed | PartiallyFailed.
pub struct PayrollScheduler {
    pool: SqlitePool,
    docs: DocumentStore,
    renderer: PdfRenderer,
    state: Mutex<RunState>,
}

impl PayrollScheduler {
    pub fn new(pool: SqlitePool, docs: DocumentStore, renderer: PdfRenderer) -> Self {
        PayrollScheduler {
            pool,
            docs,
            renderer,
            state: Mutex::new(RunState::Idle),
        }
    }

    pub fn state(&self) -> RunState {
        self.state.lock().unwrap().clone()
    }

    pub fn document_store(&self) -> &DocumentStore {
        &self.docs
    }

    pub async fn trigger(&self, period: Period, mode: TriggerMode) -> PayrollResult<RunOutcome> {
        *self.state.lock().unwrap() = RunState::Running(period);

        let result = run_payroll(&self.pool, &self.docs, &self.renderer, period, mode).await;

        let next = match &result {
            Ok(outcome) if outcome.failed.is_empty() => RunState::Completed(period),
            _ => RunState::PartiallyFailed(period),
        };
        *self.state.lock().unwrap() = next;

        result
    }
}

/// Background timer: fires at `day`/`hour` local time each month and
/// generates the previous calendar month.
pub fn spawn_periodic(scheduler: Arc<PayrollScheduler>, day: u32, hour: u32) {
    actix_web::rt::spawn(async move {
        loop {
            let now = Local::now().naive_local();
            let fire_at = next_fire(now, day, hour);
            let wait = (fire_at - now).num_seconds().max(1) as u64;
            info!(%fire_at, "payroll scheduler waiting for next fire time");
            actix_web::rt::time::sleep(Duration::from_secs(wait)).await;

            let period = Period::previous_month(Local::now().date_naive());
            if let Err(e) = scheduler.trigger(period, TriggerMode::Periodic).await {
                error!(error = %e, period = %period, "periodic payroll run failed");
            }
        }
    });
}

fn fire_in_month(year: i32, month: u32, day: u32, hour: u32) -> NaiveDateTime {
    let first = NaiveDate::from_ymd_opt(year, month, 1).expect("valid month");
    let last_day = first
        .checked_add_months(Months::new(1))
        .expect("next month is representable")
        .pred_opt()
        .expect("month has a last day")
        .day();

    first
        .with_day(day.clamp(1, last_day))
        .expect("clamped day is valid")
        .and_hms_opt(hour.min(23), 0, 0)
        .expect("clamped hour is valid")
}

fn next_fire(now: NaiveDateTime, day: u32, hour: u32) -> NaiveDateTime {
    let mut candidate = fire_in_month(now.date().year(), now.date().month(), day, hour);
    while candidate <= now {
        let next_month = candidate
            .date()
            .with_day(1)
            .expect("day 1 is valid")
            .checked_add_months(Months::new(1))
            .expect("next month is representable");
        candidate = fire_in_month(next_month.year(), next_month.month(), day, hour);
    }
    candidate
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    #[test]
    fn fires_later_this_month_when_still_ahead() {
        assert_eq!(next_fire(at(2025, 6, 10, 12), 25, 9), at(2025, 6, 25, 9));
    }

    #[test]
    fn rolls_to_next_month_after_the_fire_time() {
        assert_eq!(next_fire(at(2025, 6, 25, 9), 25, 9), at(2025, 7, 25, 9));
        assert_eq!(next_fire(at(2025, 6, 26, 0), 25, 9), at(2025, 7, 25, 9));
    }

    #[test]
    fn rolls_across_the_year_boundary() {
        assert_eq!(next_fire(at(2025, 12, 26, 0), 25, 9), at(2026, 1, 25, 9));
    }

    #[test]
    fn clamps_the_day_to_short_months() {
        // configured for the 31st: February fires on its last day
        assert_eq!(next_fire(at(2025, 2, 1, 0), 31, 9), at(2025, 2, 28, 9));
        assert_eq!(next_fire(at(2024, 2, 1, 0), 31, 9), at(2024, 2, 29, 9));
    }

    #[actix_web::test]
    async fn trigger_walks_the_state_machine() {
        let pool = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        crate::db::create_schema(&pool).await.unwrap();

        let dir = tempfile::tempdir().unwrap();
        let scheduler = PayrollScheduler::new(
            pool,
            DocumentStore::new(dir.path()),
            PdfRenderer::new("fonts"),
        );
        assert_eq!(scheduler.state(), RunState::Idle);

        // no authors: the sweep completes without failures
        let period = Period::new(5, 2025).unwrap();
        let outcome = scheduler.trigger(period, TriggerMode::Manual).await.unwrap();
        assert!(outcome.created.is_empty());
        assert_eq!(scheduler.state(), RunState::Completed(period));
    }
}
