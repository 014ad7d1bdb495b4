use climb_score::cache::StandingsCache;
use climb_score::config::ServerConfig;
use climb_score::db::Db;
use climb_score::state::AppState;
use ntex::web;
use ntex_cors::Cors;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[ntex::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("climb_score=info")),
        )
        .init();

    let config = ServerConfig::from_env();
    let db = Db::open(&config.database_path)
        .map_err(|e| std::io::Error::other(format!("open database {}: {e}", config.database_path)))?;
    let state = Arc::new(AppState {
        db,
        cache: StandingsCache::new(config.cache_ttl),
    });

    info!(addr = %config.bind_addr(), db = %config.database_path, "climb score server starting");

    web::HttpServer::new(move || {
        web::App::new()
            .state(state.clone())
            .wrap(
                Cors::new()
                    .allowed_origin("*")
                    .allowed_methods(vec!["GET", "POST", "PUT", "OPTIONS"])
                    .allowed_headers(vec!["Content-Type", "If-None-Match"])
                    .max_age(3600)
                    .finish(),
            )
            .configure(climb_score::routes)
    })
    .bind(config.bind_addr())?
    .run()
    .await
}
