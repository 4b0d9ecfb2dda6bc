use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::auth::password::hash_password;

/// Opens the pool and brings the schema and default rows up. The pool is
/// closed explicitly in `main` on shutdown.
pub async fn init_db(database_url: &str) -> SqlitePool {
    let pool = SqlitePool::connect(database_url)
        .await
        .expect("Failed to connect to database");

    create_schema(&pool)
        .await
        .expect("Failed to create database schema");
    seed_defaults(&pool)
        .await
        .expect("Failed to seed default data");

    pool
}

pub async fn create_schema(pool: &SqlitePool) -> anyhow::Result<()> {
    let tables = [
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            email TEXT UNIQUE NOT NULL,
            password_hash TEXT NOT NULL,
            role TEXT CHECK(role IN ('admin', 'editor', 'writer')) NOT NULL DEFAULT 'writer',
            nik TEXT UNIQUE,
            phone TEXT,
            avatar_url TEXT,
            is_active BOOLEAN NOT NULL DEFAULT 1,
            created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS categories (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            slug TEXT UNIQUE NOT NULL,
            icon TEXT,
            order_index INTEGER NOT NULL DEFAULT 0,
            created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS articles (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            slug TEXT UNIQUE NOT NULL,
            excerpt TEXT,
            content TEXT NOT NULL,
            author_id INTEGER NOT NULL REFERENCES users (id),
            category_id INTEGER NOT NULL REFERENCES categories (id),
            featured_image TEXT,
            status TEXT CHECK(status IN ('draft', 'published')) NOT NULL DEFAULT 'draft',
            views INTEGER NOT NULL DEFAULT 0,
            is_headline BOOLEAN NOT NULL DEFAULT 0,
            published_at DATETIME,
            created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS ads (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            kind TEXT CHECK(kind IN ('script', 'image')) NOT NULL,
            content TEXT NOT NULL,
            position TEXT CHECK(position IN ('header', 'sidebar', 'article', 'footer')) NOT NULL,
            is_active BOOLEAN NOT NULL DEFAULT 1,
            start_date DATE,
            end_date DATE,
            created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS salary_components (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            kind TEXT CHECK(kind IN ('fixed', 'per_article', 'per_view_bucket')) NOT NULL,
            value TEXT NOT NULL,
            is_active BOOLEAN NOT NULL DEFAULT 1,
            created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS payrolls (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            author_id INTEGER NOT NULL REFERENCES users (id),
            month INTEGER NOT NULL,
            year INTEGER NOT NULL,
            articles_count INTEGER NOT NULL DEFAULT 0,
            view_bonus TEXT NOT NULL DEFAULT '0',
            deductions TEXT NOT NULL DEFAULT '0',
            total TEXT NOT NULL,
            pdf_path TEXT,
            created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
        // the idempotency contract: at most one payroll per author-period
        r#"
        CREATE UNIQUE INDEX IF NOT EXISTS idx_payrolls_author_period
        ON payrolls (author_id, month, year)
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS site_settings (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            key TEXT UNIQUE NOT NULL,
            value TEXT,
            updated_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS refresh_tokens (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL REFERENCES users (id),
            jti TEXT UNIQUE NOT NULL,
            expires_at DATETIME NOT NULL,
            revoked BOOLEAN NOT NULL DEFAULT 0,
            created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    ];

    for table in tables {
        sqlx::query(table).execute(pool).await?;
    }

    Ok(())
}

/// Inserts the rows a fresh install needs: one admin account, the category
/// tree, the default salary rule set and the site settings. Idempotent.
pub async fn seed_defaults(pool: &SqlitePool) -> anyhow::Result<()> {
    let admin_exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM users WHERE role = 'admin' LIMIT 1)",
    )
    .fetch_one(pool)
    .await?;

    if !admin_exists {
        sqlx::query(
            r#"
            INSERT INTO users (name, email, password_hash, role, nik)
            VALUES (?, ?, ?, 'admin', ?)
            "#,
        )
        .bind("Admin User")
        .bind("admin@langsapost.test")
        .bind(hash_password("Password123!"))
        .bind("ADM001")
        .execute(pool)
        .await?;

        warn!("Default admin account created; change its password");
    }

    let categories = [
        ("Politik", "politik", "Vote"),
        ("Ekonomi", "ekonomi", "TrendingUp"),
        ("Olahraga", "olahraga", "Trophy"),
        ("Teknologi", "teknologi", "Smartphone"),
        ("Kesehatan", "kesehatan", "Heart"),
        ("Internasional", "internasional", "Globe"),
        ("Nasional", "nasional", "Flag"),
        ("Hiburan", "hiburan", "Music"),
        ("Pendidikan", "pendidikan", "BookOpen"),
        ("Otomotif", "otomotif", "Car"),
        ("Langsa", "langsa", "MapPin"),
        ("Loker", "loker", "Briefcase"),
        ("Zodiak", "zodiak", "Star"),
    ];

    for (i, (name, slug, icon)) in categories.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO categories (name, slug, icon, order_index)
            SELECT ?, ?, ?, ?
            WHERE NOT EXISTS (SELECT 1 FROM categories WHERE slug = ?)
            "#,
        )
        .bind(name)
        .bind(slug)
        .bind(icon)
        .bind((i + 1) as i64)
        .bind(slug)
        .execute(pool)
        .await?;
    }

    let components = [
        ("Gaji Pokok", "fixed", "3000000"),
        ("Bonus Per Artikel", "per_article", "50000"),
        ("Bonus Views (per 1000)", "per_view_bucket", "10000"),
    ];

    for (name, kind, value) in components {
        sqlx::query(
            r#"
            INSERT INTO salary_components (name, kind, value)
            SELECT ?, ?, ?
            WHERE NOT EXISTS (SELECT 1 FROM salary_components WHERE name = ?)
            "#,
        )
        .bind(name)
        .bind(kind)
        .bind(value)
        .bind(name)
        .execute(pool)
        .await?;
    }

    let settings = [
        ("site_name", "LangsaPost"),
        (
            "site_description",
            "Portal Berita Terpercaya Langsa dan Sekitarnya",
        ),
        ("contact_email", "info@langsapost.com"),
        ("contact_phone", "+62 812-3456-7890"),
        (
            "news_ticker_text",
            "Selamat datang di LangsaPost - Portal berita terpercaya untuk informasi terkini Langsa dan sekitarnya",
        ),
    ];

    for (key, value) in settings {
        sqlx::query(
            r#"
            INSERT INTO site_settings (key, value)
            SELECT ?, ?
            WHERE NOT EXISTS (SELECT 1 FROM site_settings WHERE key = ?)
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(key)
        .execute(pool)
        .await?;
    }

    info!("Database schema and defaults ready");
    Ok(())
}
