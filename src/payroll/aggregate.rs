use sqlx::SqlitePool;

use crate::error::PayrollResult;
use crate::payroll::calculator::AuthorPeriodAggregate;
use crate::payroll::Period;

/// Counts published articles and sums their views for one author inside
/// one calendar month. Drafts and articles published outside the period
/// do not count, regardless of when they were created.
pub async fn aggregate_for_author(
    pool: &SqlitePool,
    author_id: i64,
    period: Period,
) -> PayrollResult<AuthorPeriodAggregate> {
    let (published_articles, total_views): (i64, i64) = sqlx::query_as(
        r#"
        SELECT COUNT(*), COALESCE(SUM(views), 0)
        FROM articles
        WHERE author_id = ?
          AND status = 'published'
          AND published_at >= ?
          AND published_at < ?
        "#,
    )
    .bind(author_id)
    .bind(period.start())
    .bind(period.end_exclusive())
    .fetch_one(pool)
    .await?;

    Ok(AuthorPeriodAggregate {
        author_id,
        month: period.month,
        year: period.year,
        published_articles,
        total_views,
    })
}
