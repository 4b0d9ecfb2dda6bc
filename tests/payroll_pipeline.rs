//! End-to-end pipeline tests on an in-memory database: seeded authors and
//! articles, a temp-dir document store and a text stub renderer standing in
//! for the PDF stage (slip content is pinned through the layout model).

use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::SqlitePool;

use langsapost::db::create_schema;
use langsapost::error::{PayrollResult, PayrollError};
use langsapost::payroll::ledger::{PayrollFilter, PayrollLedger};
use langsapost::payroll::renderer::{SlipDocument, SlipLine, SlipRenderer};
use langsapost::payroll::scheduler::{run_payroll, TriggerMode};
use langsapost::payroll::storage::DocumentStore;
use langsapost::payroll::Period;

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

/// Serializes the slip line model to plain text, which keeps the stored
/// artifact inspectable in assertions.
struct TextRenderer;

impl SlipRenderer for TextRenderer {
    fn render(&self, slip: &SlipDocument) -> PayrollResult<Vec<u8>> {
        let mut out = String::new();
        out.push_str(&slip.masthead);
        out.push('\n');
        out.push_str(&slip.title);
        out.push('\n');
        for (label, value) in &slip.info {
            out.push_str(&format!("{label}: {value}\n"));
        }
        for line in &slip.lines {
            match line {
                SlipLine::Blank => out.push('\n'),
                SlipLine::Rule => out.push_str("----\n"),
                SlipLine::SectionHeader(h) => out.push_str(&format!("{h}\n")),
                SlipLine::Entry { label, amount, .. } => {
                    out.push_str(&format!("{label} {amount}\n"))
                }
            }
        }
        Ok(out.into_bytes())
    }
}

/// Fails for one author by name; everyone else renders normally.
struct FailingFor(&'static str);

impl SlipRenderer for FailingFor {
    fn render(&self, slip: &SlipDocument) -> PayrollResult<Vec<u8>> {
        if slip.info.iter().any(|(l, v)| l == "Nama" && v == self.0) {
            return Err(PayrollError::render("font table is corrupt"));
        }
        TextRenderer.render(slip)
    }
}

async fn test_pool() -> SqlitePool {
    // one connection: every pooled connection would otherwise open its own
    // empty in-memory database
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    create_schema(&pool).await.unwrap();

    // articles.category_id references categories
    sqlx::query("INSERT INTO categories (id, name, slug, order_index) VALUES (1, 'Langsa', 'langsa', 1)")
        .execute(&pool)
        .await
        .unwrap();

    pool
}

async fn insert_author(pool: &SqlitePool, name: &str, active: bool) -> i64 {
    let email = format!(
        "{}@langsapost.test",
        name.to_lowercase().replace(' ', ".")
    );
    sqlx::query(
        "INSERT INTO users (name, email, password_hash, role, nik, is_active) \
         VALUES (?, ?, 'x', 'writer', NULL, ?)",
    )
    .bind(name)
    .bind(email)
    .bind(active)
    .execute(pool)
    .await
    .unwrap()
    .last_insert_rowid()
}

async fn insert_component(pool: &SqlitePool, name: &str, kind: &str, value: &str, active: bool) {
    sqlx::query("INSERT INTO salary_components (name, kind, value, is_active) VALUES (?, ?, ?, ?)")
        .bind(name)
        .bind(kind)
        .bind(value)
        .bind(active)
        .execute(pool)
        .await
        .unwrap();
}

async fn default_components(pool: &SqlitePool) {
    insert_component(pool, "Gaji Pokok", "fixed", "3000000", true).await;
    insert_component(pool, "Bonus Per Artikel", "per_article", "50000", true).await;
    insert_component(pool, "Bonus Views (per 1000)", "per_view_bucket", "10000", true).await;
}

async fn insert_article(
    pool: &SqlitePool,
    author_id: i64,
    title: &str,
    status: &str,
    views: i64,
    published_at: Option<NaiveDate>,
) {
    sqlx::query(
        "INSERT INTO articles \
         (title, slug, content, author_id, category_id, status, views, published_at) \
         VALUES (?, ?, 'body', ?, 1, ?, ?, ?)",
    )
    .bind(title)
    .bind(format!("{}-{}", title.to_lowercase().replace(' ', "-"), author_id))
    .bind(author_id)
    .bind(status)
    .bind(views)
    .bind(published_at.map(|d| d.and_hms_opt(10, 0, 0).unwrap()))
    .execute(pool)
    .await
    .unwrap();
}

fn may_2025() -> Period {
    Period::new(5, 2025).unwrap()
}

fn in_may(day: u32) -> Option<NaiveDate> {
    Some(NaiveDate::from_ymd_opt(2025, 5, day).unwrap())
}

#[actix_web::test]
async fn reference_scenario_end_to_end() {
    let pool = test_pool().await;
    default_components(&pool).await;
    let author_id = insert_author(&pool, "Siti Rahma", true).await;

    // 3 published articles with 500 + 800 + 1200 = 2500 views
    insert_article(&pool, author_id, "Banjir", "published", 500, in_may(3)).await;
    insert_article(&pool, author_id, "Pilkada", "published", 800, in_may(12)).await;
    insert_article(&pool, author_id, "Harga Cabai", "published", 1200, in_may(28)).await;

    let dir = tempfile::tempdir().unwrap();
    let docs = DocumentStore::new(dir.path());

    let outcome = run_payroll(&pool, &docs, &TextRenderer, may_2025(), TriggerMode::Manual)
        .await
        .unwrap();

    assert_eq!(outcome.created.len(), 1);
    assert_eq!(outcome.skipped.len(), 0);
    assert_eq!(outcome.failed.len(), 0);

    let slip = &outcome.created[0];
    assert_eq!(slip.author_name, "Siti Rahma");
    assert_eq!(slip.total, dec("3011500"));
    assert_eq!(slip.document_ref, format!("payroll_{author_id}_2025_5.pdf"));

    // ledger row carries the same totals the document embeds
    let ledger = PayrollLedger::new(pool.clone());
    let row = ledger.find(slip.payroll_id).await.unwrap().unwrap();
    assert_eq!(row.author_id, author_id);
    assert_eq!(row.articles_count, 3);
    assert_eq!(row.view_bonus, dec("20000"));
    assert_eq!(row.deductions, dec("158500"));
    assert_eq!(row.total, dec("3011500"));

    let (_, bytes) = ledger.fetch_document(&docs, slip.payroll_id).await.unwrap();
    let text = String::from_utf8(bytes).unwrap();
    assert!(text.contains("SLIP GAJI KARYAWAN"));
    assert!(text.contains("Periode: Mei 2025"));
    assert!(text.contains("TOTAL GAJI KOTOR Rp 3.170.000"));
    assert!(text.contains("TOTAL GAJI BERSIH Rp 3.011.500"));
}

#[actix_web::test]
async fn second_run_for_the_same_period_is_a_no_op() {
    let pool = test_pool().await;
    default_components(&pool).await;
    insert_author(&pool, "Siti Rahma", true).await;
    insert_author(&pool, "Budi Santoso", true).await;

    let dir = tempfile::tempdir().unwrap();
    let docs = DocumentStore::new(dir.path());

    let first = run_payroll(&pool, &docs, &TextRenderer, may_2025(), TriggerMode::Periodic)
        .await
        .unwrap();
    assert_eq!(first.created.len(), 2);

    let second = run_payroll(&pool, &docs, &TextRenderer, may_2025(), TriggerMode::Periodic)
        .await
        .unwrap();
    assert_eq!(second.created.len(), 0);
    assert_eq!(second.skipped.len(), 2);
    assert_eq!(second.failed.len(), 0);

    let rows = PayrollLedger::new(pool.clone())
        .list(&PayrollFilter::default())
        .await
        .unwrap();
    assert_eq!(rows.len(), 2);
}

#[actix_web::test]
async fn pre_existing_entry_among_five_authors_is_skipped() {
    let pool = test_pool().await;
    default_components(&pool).await;

    let names = ["Aminah", "Budi", "Citra", "Dewi", "Eko"];
    let mut ids = Vec::new();
    for name in names {
        ids.push(insert_author(&pool, name, true).await);
    }

    let dir = tempfile::tempdir().unwrap();
    let docs = DocumentStore::new(dir.path());

    // generate Citra's slip ahead of the batch
    sqlx::query(
        "INSERT INTO payrolls (author_id, month, year, articles_count, total, pdf_path) \
         VALUES (?, 5, 2025, 0, '2850000', 'existing.pdf')",
    )
    .bind(ids[2])
    .execute(&pool)
    .await
    .unwrap();

    let outcome = run_payroll(&pool, &docs, &TextRenderer, may_2025(), TriggerMode::Periodic)
        .await
        .unwrap();

    assert_eq!(outcome.created.len(), 4);
    assert_eq!(outcome.skipped.len(), 1);
    assert_eq!(outcome.failed.len(), 0);
    assert_eq!(outcome.skipped[0].author_name, "Citra");
}

#[actix_web::test]
async fn render_failure_is_isolated_to_one_author() {
    let pool = test_pool().await;
    default_components(&pool).await;
    insert_author(&pool, "Aminah", true).await;
    insert_author(&pool, "Budi", true).await;
    insert_author(&pool, "Citra", true).await;

    let dir = tempfile::tempdir().unwrap();
    let docs = DocumentStore::new(dir.path());

    let outcome = run_payroll(
        &pool,
        &docs,
        &FailingFor("Budi"),
        may_2025(),
        TriggerMode::Periodic,
    )
    .await
    .unwrap();

    assert_eq!(outcome.created.len(), 2);
    assert_eq!(outcome.failed.len(), 1);
    assert_eq!(outcome.failed[0].author_name, "Budi");
    assert!(outcome.failed[0].reason.contains("render"));

    // the failed author has no ledger row and can be retried
    let ledger = PayrollLedger::new(pool.clone());
    let rows = ledger.list(&PayrollFilter::default()).await.unwrap();
    assert_eq!(rows.len(), 2);

    let retry = run_payroll(&pool, &docs, &TextRenderer, may_2025(), TriggerMode::Manual)
        .await
        .unwrap();
    assert_eq!(retry.created.len(), 1);
    assert_eq!(retry.created[0].author_name, "Budi");
    assert_eq!(retry.skipped.len(), 2);
}

#[actix_web::test]
async fn drafts_and_out_of_period_articles_do_not_count() {
    let pool = test_pool().await;
    default_components(&pool).await;
    let author_id = insert_author(&pool, "Siti Rahma", true).await;

    insert_article(&pool, author_id, "Draft", "draft", 9000, in_may(10)).await;
    insert_article(
        &pool,
        author_id,
        "Too Early",
        "published",
        5000,
        Some(NaiveDate::from_ymd_opt(2025, 4, 30).unwrap()),
    )
    .await;
    insert_article(
        &pool,
        author_id,
        "Too Late",
        "published",
        5000,
        Some(NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()),
    )
    .await;

    let dir = tempfile::tempdir().unwrap();
    let docs = DocumentStore::new(dir.path());

    let outcome = run_payroll(&pool, &docs, &TextRenderer, may_2025(), TriggerMode::Manual)
        .await
        .unwrap();

    // fixed component only, minus the 5% withholding
    assert_eq!(outcome.created[0].total, dec("2850000"));

    let row = PayrollLedger::new(pool.clone())
        .find(outcome.created[0].payroll_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.articles_count, 0);
    assert_eq!(row.view_bonus, dec("0"));
}

#[actix_web::test]
async fn inactive_authors_and_components_are_excluded() {
    let pool = test_pool().await;
    insert_component(&pool, "Gaji Pokok", "fixed", "3000000", true).await;
    insert_component(&pool, "Bonus Per Artikel", "per_article", "50000", false).await;

    let active_id = insert_author(&pool, "Siti Rahma", true).await;
    insert_author(&pool, "Mantan Penulis", false).await;

    insert_article(&pool, active_id, "Banjir", "published", 100, in_may(3)).await;

    let dir = tempfile::tempdir().unwrap();
    let docs = DocumentStore::new(dir.path());

    let outcome = run_payroll(&pool, &docs, &TextRenderer, may_2025(), TriggerMode::Periodic)
        .await
        .unwrap();

    // only the active author, and the disabled per-article rule pays nothing
    assert_eq!(outcome.created.len(), 1);
    assert_eq!(outcome.created[0].author_name, "Siti Rahma");
    assert_eq!(outcome.created[0].total, dec("2850000"));
    assert_eq!(outcome.skipped.len(), 0);
    assert_eq!(outcome.failed.len(), 0);
}
