pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;
pub mod scoring;
pub mod services;
pub mod state;
pub mod validation;

use ntex::web;

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg
        // Health check
        .route("/api/health", web::get().to(health))
        // Boulder
        .route("/api/boulder/score", web::post().to(handlers::boulder::score))
        .route(
            "/api/boulder/{competition_id}/{climber_id}/{problem}/action",
            web::post().to(handlers::boulder::apply_action),
        )
        .route("/api/boulder/{competition_id}/standings", web::get().to(handlers::boulder::get_standings))
        // Speed qualification
        .route("/api/speed/qualification", web::post().to(handlers::speed_qualification::compute))
        .route(
            "/api/speed/{competition_id}/qualification",
            web::get().to(handlers::speed_qualification::get_ranked),
        )
        .route(
            "/api/speed/{competition_id}/qualification/status",
            web::get().to(handlers::speed_qualification::get_round_status),
        )
        .route(
            "/api/speed/{competition_id}/qualification/finalize",
            web::post().to(handlers::speed_qualification::finalize_round),
        )
        .route(
            "/api/speed/{competition_id}/qualification/{climber_id}",
            web::put().to(handlers::speed_qualification::save_result),
        )
        // Speed finals
        .route("/api/speed/finals/resolve", web::post().to(handlers::speed_finals::resolve))
        .service(
            web::resource("/api/speed/{competition_id}/bracket")
                .route(web::get().to(handlers::speed_finals::get_bracket))
                .route(web::post().to(handlers::speed_finals::generate_bracket)),
        )
        .route(
            "/api/speed/{competition_id}/bracket/{stage}/{position}/result",
            web::post().to(handlers::speed_finals::record_result),
        )
        .route(
            "/api/speed/{competition_id}/bracket/{stage}/{position}/override",
            web::post().to(handlers::speed_finals::override_winner),
        );
}

async fn health() -> web::HttpResponse {
    web::HttpResponse::Ok().json(&serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
