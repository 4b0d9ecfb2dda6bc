use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{get, App, HttpServer, Responder};
use dotenvy::dotenv;
use std::sync::Arc;

use langsapost::config::Config;
use langsapost::db::init_db;
use langsapost::docs::ApiDoc;
use langsapost::payroll::renderer::PdfRenderer;
use langsapost::payroll::scheduler::{spawn_periodic, PayrollScheduler};
use langsapost::payroll::storage::DocumentStore;
use langsapost::routes;
use tracing::info;
use tracing_appender::rolling;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[get("/")]
async fn index() -> impl Responder {
    "LangsaPost API"
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();

    let config = Config::from_env();

    // Rolling daily log
    let file_appender = rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_target(false) // removes module path
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!("Server starting...");

    let pool = init_db(&config.database_url).await;

    let scheduler = Arc::new(PayrollScheduler::new(
        pool.clone(),
        DocumentStore::new(&config.upload_dir),
        PdfRenderer::new(&config.font_dir),
    ));
    spawn_periodic(scheduler.clone(), config.payroll_day, config.payroll_hour);

    // clone what the closure needs BEFORE moving config
    let server_addr = config.server_addr.clone();
    let config_data = config.clone();
    let pool_data = Data::new(pool.clone());
    let scheduler_data = Data::from(scheduler);

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // wildcard {_:.*} to match JS/CSS files
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(pool_data.clone())
            .app_data(Data::new(config.clone()))
            .app_data(scheduler_data.clone())
            .service(index)
            .configure(|cfg| routes::configure(cfg, config_data.clone()))
    })
    .bind(server_addr)?
    .run()
    .await?;

    // explicit lifecycle: drain the pool before the process exits
    pool.close().await;
    Ok(())
}
