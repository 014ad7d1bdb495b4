use crate::db::Db;
use crate::error::AppError;
use crate::models::finals::*;
use crate::scoring::bracket::{Bracket, BracketMatch, Stage};
use crate::scoring::finals::{decide, DecidedBy, MatchDecision, MatchSide};
use crate::services::speed_qualification::{load_ranked, round_finalized};
use crate::validation;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{info, warn};

pub fn resolve(req: &FinalsResolveRequest) -> Result<MatchDecision, AppError> {
    validation::validate_runs(&req.climber_a.runs)?;
    validation::validate_runs(&req.climber_b.runs)?;
    if req.climber_a.climber_id == req.climber_b.climber_id {
        return Err(AppError::BadRequest("A climber cannot race themselves".into()));
    }

    let a = MatchSide::new(req.climber_a.climber_id, &req.climber_a.runs, req.climber_a.rank);
    let b = MatchSide::new(req.climber_b.climber_id, &req.climber_b.runs, req.climber_b.rank);
    let decision = decide(&a, &b);
    if decision.decided_by == DecidedBy::Undecided {
        warn!(climber_a = a.climber_id, climber_b = b.climber_id, "match needs a judge decision");
    }
    Ok(decision)
}

/// Seeds a fresh bracket from the finalized qualification ranking. Replacing
/// a bracket is refused once any match in it has a result.
pub fn generate_bracket(db: &Db, competition_id: i64, req: &BracketRequest) -> Result<BracketView, AppError> {
    validation::validate_id(competition_id, "competition")?;
    let top_count = validation::validate_top_count(req.top_count)?;

    db.with_conn(|conn| {
        if !round_finalized(conn, competition_id)? {
            return Err(AppError::Conflict("Qualification round is not finalized".into()));
        }
        if let Some(existing) = load_bracket(conn, competition_id)? {
            if existing.matches.iter().any(BracketMatch::has_results) {
                warn!(competition_id, "bracket regeneration refused, results entered");
                return Err(AppError::Conflict("Bracket already has results".into()));
            }
        }

        let records = load_ranked(conn, competition_id)?;
        let bracket = Bracket::generate(&records, top_count)?;
        save_bracket(conn, competition_id, &bracket)?;
        info!(
            competition_id,
            top_count,
            entry_stage = ?bracket.entry_stage(),
            byes = bracket.matches.iter().filter(|m| m.is_bye()).count(),
            "bracket generated"
        );
        Ok(BracketView::new(competition_id, bracket))
    })
}

pub fn get_bracket(db: &Db, competition_id: i64) -> Result<BracketView, AppError> {
    validation::validate_id(competition_id, "competition")?;
    db.with_conn(|conn| {
        let bracket = require_bracket(conn, competition_id)?;
        Ok(BracketView::new(competition_id, bracket))
    })
}

pub fn record_result(
    db: &Db,
    competition_id: i64,
    stage: Stage,
    position: usize,
    req: &MatchResultRequest,
) -> Result<BracketMatch, AppError> {
    validation::validate_id(competition_id, "competition")?;
    validation::validate_runs(&req.runs_a)?;
    validation::validate_runs(&req.runs_b)?;

    db.with_conn(|conn| {
        let mut bracket = require_bracket(conn, competition_id)?;
        let decision = bracket.record_result(stage, position, req.runs_a, req.runs_b)?;
        save_bracket(conn, competition_id, &bracket)?;

        match decision.winner_id {
            Some(winner_id) => info!(competition_id, %stage, position, winner_id, decided_by = ?decision.decided_by, "match resolved"),
            None => warn!(competition_id, %stage, position, "match undecided, waiting for override"),
        }
        log_podium(competition_id, &bracket);
        stored_match(&bracket, stage, position)
    })
}

pub fn override_winner(
    db: &Db,
    competition_id: i64,
    stage: Stage,
    position: usize,
    req: &OverrideRequest,
) -> Result<BracketMatch, AppError> {
    validation::validate_id(competition_id, "competition")?;

    db.with_conn(|conn| {
        let mut bracket = require_bracket(conn, competition_id)?;
        bracket.override_winner(stage, position, req.winner_id)?;
        save_bracket(conn, competition_id, &bracket)?;
        info!(competition_id, %stage, position, winner_id = req.winner_id, "winner set by judge");
        log_podium(competition_id, &bracket);
        stored_match(&bracket, stage, position)
    })
}

fn log_podium(competition_id: i64, bracket: &Bracket) {
    if let Some(podium) = bracket.podium() {
        info!(competition_id, first = podium.first, second = ?podium.second, third = ?podium.third, "speed finals complete");
    }
}

fn stored_match(bracket: &Bracket, stage: Stage, position: usize) -> Result<BracketMatch, AppError> {
    bracket
        .get(stage, position)
        .cloned()
        .ok_or_else(|| AppError::Internal("match missing after update".into()))
}

fn require_bracket(conn: &Connection, competition_id: i64) -> Result<Bracket, AppError> {
    load_bracket(conn, competition_id)?
        .ok_or_else(|| AppError::NotFound(format!("No bracket for competition {}", competition_id)))
}

fn load_bracket(conn: &Connection, competition_id: i64) -> Result<Option<Bracket>, AppError> {
    let raw: Option<String> = conn
        .query_row(
            "SELECT bracket FROM speed_brackets WHERE competition_id = ?1",
            params![competition_id],
            |row| row.get(0),
        )
        .optional()?;
    match raw {
        Some(json) => Ok(Some(serde_json::from_str(&json)?)),
        None => Ok(None),
    }
}

fn save_bracket(conn: &Connection, competition_id: i64, bracket: &Bracket) -> Result<(), AppError> {
    let json = serde_json::to_string(bracket)?;
    let updated_at = Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string();
    conn.execute(
        "INSERT INTO speed_brackets (competition_id, bracket, updated_at) VALUES (?1, ?2, ?3)
         ON CONFLICT (competition_id) DO UPDATE SET
         bracket = excluded.bracket, updated_at = excluded.updated_at",
        params![competition_id, json, updated_at],
    )?;
    Ok(())
}
