use crate::cache::CacheKey;
use crate::error::AppError;
use crate::models::boulder::*;
use crate::services::boulder as service;
use crate::state::AppState;
use ntex::web::{self, HttpRequest, HttpResponse};
use std::sync::Arc;

pub async fn score(
    body: web::types::Json<BoulderScoreRequest>,
) -> Result<HttpResponse, AppError> {
    let result = service::compute_score(body.into_inner())?;
    Ok(HttpResponse::Ok().json(&result))
}

pub async fn apply_action(
    state: web::types::State<Arc<AppState>>,
    path: web::types::Path<(i64, i64, i64)>,
    body: web::types::Json<BoulderActionRequest>,
) -> Result<HttpResponse, AppError> {
    let (competition_id, climber_id, problem) = path.into_inner();
    let result = service::apply_action(&state.db, competition_id, climber_id, problem, body.action)?;
    state.cache.invalidate(competition_id);
    Ok(HttpResponse::Ok().json(&result))
}

pub async fn get_standings(
    state: web::types::State<Arc<AppState>>,
    req: HttpRequest,
    path: web::types::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let competition_id = path.into_inner();
    let cached = state.cache.get_or_build(CacheKey::BoulderStandings(competition_id), || {
        let standings = service::get_standings(&state.db, competition_id)?;
        Ok(serde_json::to_string(&standings)?)
    })?;
    Ok(super::cached_json(&req, &cached))
}
