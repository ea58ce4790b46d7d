// API route configuration

use crate::api::handlers;
use actix_web::web;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(handlers::health_check))
        .service(
            web::scope("/api/rankings")
                .route("", web::get().to(handlers::get_rankings_by_query))
                .route("/update", web::post().to(handlers::trigger_update))
                .route(
                    "/{region}/{serviceType}/{year}/{month}",
                    web::get().to(handlers::get_rankings),
                ),
        )
        .default_service(web::to(handlers::not_found));
}
