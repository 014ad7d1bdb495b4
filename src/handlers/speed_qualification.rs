use crate::cache::CacheKey;
use crate::error::AppError;
use crate::models::qualification::*;
use crate::services::speed_qualification as service;
use crate::state::AppState;
use ntex::web::{self, HttpRequest, HttpResponse};
use std::sync::Arc;

pub async fn compute(
    body: web::types::Json<QualificationRequest>,
) -> Result<HttpResponse, AppError> {
    let outcome = service::compute(&body)?;
    Ok(HttpResponse::Ok().json(&outcome))
}

pub async fn save_result(
    state: web::types::State<Arc<AppState>>,
    path: web::types::Path<(i64, i64)>,
    body: web::types::Json<QualificationRequest>,
) -> Result<HttpResponse, AppError> {
    let (competition_id, climber_id) = path.into_inner();
    let record = service::save_result(&state.db, competition_id, climber_id, &body)?;
    state.cache.invalidate(competition_id);
    Ok(HttpResponse::Ok().json(&record))
}

pub async fn get_ranked(
    state: web::types::State<Arc<AppState>>,
    req: HttpRequest,
    path: web::types::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let competition_id = path.into_inner();
    let cached = state.cache.get_or_build(CacheKey::SpeedQualification(competition_id), || {
        let ranked = service::get_ranked(&state.db, competition_id)?;
        Ok(serde_json::to_string(&ranked)?)
    })?;
    Ok(super::cached_json(&req, &cached))
}

pub async fn get_round_status(
    state: web::types::State<Arc<AppState>>,
    path: web::types::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let status = service::get_round_status(&state.db, path.into_inner())?;
    Ok(HttpResponse::Ok().json(&status))
}

pub async fn finalize_round(
    state: web::types::State<Arc<AppState>>,
    path: web::types::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let competition_id = path.into_inner();
    let status = service::finalize_round(&state.db, competition_id)?;
    state.cache.invalidate(competition_id);
    Ok(HttpResponse::Ok().json(&status))
}
