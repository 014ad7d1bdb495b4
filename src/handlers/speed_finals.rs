use crate::cache::CacheKey;
use crate::error::AppError;
use crate::models::finals::*;
use crate::scoring::bracket::Stage;
use crate::services::speed_finals as service;
use crate::state::AppState;
use ntex::web::{self, HttpRequest, HttpResponse};
use std::sync::Arc;

pub async fn resolve(
    body: web::types::Json<FinalsResolveRequest>,
) -> Result<HttpResponse, AppError> {
    let decision = service::resolve(&body)?;
    Ok(HttpResponse::Ok().json(&decision))
}

pub async fn generate_bracket(
    state: web::types::State<Arc<AppState>>,
    path: web::types::Path<i64>,
    body: web::types::Json<BracketRequest>,
) -> Result<HttpResponse, AppError> {
    let competition_id = path.into_inner();
    let view = service::generate_bracket(&state.db, competition_id, &body)?;
    state.cache.invalidate(competition_id);
    Ok(HttpResponse::Ok().json(&view))
}

pub async fn get_bracket(
    state: web::types::State<Arc<AppState>>,
    req: HttpRequest,
    path: web::types::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let competition_id = path.into_inner();
    let cached = state.cache.get_or_build(CacheKey::SpeedBracket(competition_id), || {
        let view = service::get_bracket(&state.db, competition_id)?;
        Ok(serde_json::to_string(&view)?)
    })?;
    Ok(super::cached_json(&req, &cached))
}

pub async fn record_result(
    state: web::types::State<Arc<AppState>>,
    path: web::types::Path<(i64, String, usize)>,
    body: web::types::Json<MatchResultRequest>,
) -> Result<HttpResponse, AppError> {
    let (competition_id, stage, position) = path.into_inner();
    let stage = parse_stage(&stage)?;
    let updated = service::record_result(&state.db, competition_id, stage, position, &body)?;
    state.cache.invalidate(competition_id);
    Ok(HttpResponse::Ok().json(&updated))
}

pub async fn override_winner(
    state: web::types::State<Arc<AppState>>,
    path: web::types::Path<(i64, String, usize)>,
    body: web::types::Json<OverrideRequest>,
) -> Result<HttpResponse, AppError> {
    let (competition_id, stage, position) = path.into_inner();
    let stage = parse_stage(&stage)?;
    let updated = service::override_winner(&state.db, competition_id, stage, position, &body)?;
    state.cache.invalidate(competition_id);
    Ok(HttpResponse::Ok().json(&updated))
}

fn parse_stage(raw: &str) -> Result<Stage, AppError> {
    raw.parse().map_err(AppError::BadRequest)
}
