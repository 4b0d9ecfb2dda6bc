use crate::{
    api::{ad, article, category, payroll, salary_component, settings, user},
    auth::handlers,
    config::Config,
};
use actix_governor::{
    governor::middleware::NoOpMiddleware, Governor, GovernorConfig, GovernorConfigBuilder,
    PeerIpKeyExtractor,
};
use actix_web::{web, HttpResponse, Responder};
use serde_json::json;

async fn health() -> impl Responder {
    HttpResponse::Ok().json(json!({
        "status": "OK",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    // Helper to build per-route limiter
    fn build_limiter(requests_per_min: u32) -> GovernorConfig<PeerIpKeyExtractor, NoOpMiddleware> {
        let per_ms = if requests_per_min == 0 {
            1
        } else {
            60_000 / requests_per_min as u64
        };
        GovernorConfigBuilder::default()
            .per_millisecond(per_ms)
            .burst_size(requests_per_min)
            .key_extractor(PeerIpKeyExtractor)
            .finish()
            .unwrap()
    }

    let login_limiter = build_limiter(config.rate_login_per_min);
    let refresh_limiter = build_limiter(config.rate_refresh_per_min);
    let api_limiter = build_limiter(config.rate_api_per_min);

    // Auth routes
    cfg.service(
        web::scope("/auth")
            .service(
                web::resource("/login")
                    .wrap(Governor::new(&login_limiter))
                    .route(web::post().to(handlers::login)),
            )
            .service(
                web::resource("/refresh")
                    .wrap(Governor::new(&refresh_limiter))
                    .route(web::post().to(handlers::refresh_token)),
            )
            .service(
                web::resource("/logout")
                    .wrap(Governor::new(&login_limiter))
                    .route(web::post().to(handlers::logout)),
            ),
    );

    // Public reads and protected writes share these paths; handlers that
    // need a user pull in the AuthUser extractor themselves.
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(Governor::new(&api_limiter))
            .service(web::resource("/health").route(web::get().to(health)))
            .service(
                web::scope("/articles")
                    // /articles
                    .service(
                        web::resource("")
                            .route(web::get().to(article::list_articles))
                            .route(web::post().to(article::create_article)),
                    )
                    // /articles/id/{id}
                    .service(
                        web::resource("/id/{id}")
                            .route(web::put().to(article::update_article))
                            .route(web::delete().to(article::delete_article)),
                    )
                    // /articles/{slug}
                    .service(web::resource("/{slug}").route(web::get().to(article::get_article))),
            )
            .service(
                web::scope("/categories")
                    .service(
                        web::resource("")
                            .route(web::get().to(category::list_categories))
                            .route(web::post().to(category::create_category)),
                    )
                    .service(
                        web::resource("/{id}").route(web::put().to(category::update_category)),
                    ),
            )
            .service(
                web::scope("/users")
                    .service(
                        web::resource("")
                            .route(web::get().to(user::list_users))
                            .route(web::post().to(user::create_user)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(user::get_user))
                            .route(web::put().to(user::update_user))
                            .route(web::delete().to(user::deactivate_user)),
                    ),
            )
            .service(
                web::scope("/ads")
                    .service(web::resource("/active").route(web::get().to(ad::list_active_ads)))
                    .service(
                        web::resource("")
                            .route(web::get().to(ad::list_ads))
                            .route(web::post().to(ad::create_ad)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::put().to(ad::update_ad))
                            .route(web::delete().to(ad::delete_ad)),
                    ),
            )
            .service(
                web::scope("/settings")
                    .service(web::resource("").route(web::get().to(settings::get_settings)))
                    .service(
                        web::resource("/{key}").route(web::put().to(settings::update_setting)),
                    ),
            )
            .service(
                web::scope("/payroll")
                    .service(
                        web::resource("/generate")
                            .route(web::post().to(payroll::generate_payroll)),
                    )
                    .service(
                        web::resource("/status").route(web::get().to(payroll::payroll_status)),
                    )
                    .service(
                        web::resource("/components")
                            .route(web::get().to(salary_component::list_components))
                            .route(web::post().to(salary_component::create_component)),
                    )
                    .service(
                        web::resource("/components/{id}")
                            .route(web::put().to(salary_component::update_component)),
                    )
                    .service(web::resource("").route(web::get().to(payroll::list_payrolls)))
                    .service(
                        web::resource("/{id}/download")
                            .route(web::get().to(payroll::download_payroll)),
                    ),
            ),
    );
}
