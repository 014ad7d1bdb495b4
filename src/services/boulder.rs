use crate::db::Db;
use crate::error::AppError;
use crate::models::boulder::*;
use crate::scoring::boulder::{rank_totals, BoulderAction, BoulderProgress, BoulderTotal, ClimberAttempt};
use crate::validation;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::{info, warn};

pub fn compute_score(req: BoulderScoreRequest) -> Result<BoulderScoreResult, AppError> {
    let attempt = ClimberAttempt {
        is_top: req.is_top,
        top_attempts: validation::validate_attempts(req.top_attempts, "topAttempts")?,
        is_zone: req.is_zone,
        zone_attempts: validation::validate_attempts(req.zone_attempts, "zoneAttempts")?,
    };
    attempt.check()?;
    Ok(BoulderScoreResult {
        score: attempt.score(),
    })
}

pub fn apply_action(
    db: &Db,
    competition_id: i64,
    climber_id: i64,
    problem: i64,
    action: BoulderAction,
) -> Result<BoulderProblemScore, AppError> {
    validation::validate_id(competition_id, "competition")?;
    validation::validate_id(climber_id, "climber")?;
    validation::validate_id(problem, "problem")?;

    db.with_conn(|conn| {
        let mut progress = load_progress(conn, competition_id, climber_id, problem)?.unwrap_or_default();
        if let Err(e) = progress.apply(action) {
            warn!(competition_id, climber_id, problem, ?action, "boulder action rejected: {e}");
            return Err(e.into());
        }

        let score = progress.score();
        let updated_at = Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string();
        conn.execute(
            "INSERT INTO boulder_scores (competition_id, climber_id, problem, attempts, is_top,
             top_attempts, is_zone, zone_attempts, finalized, disqualified, score, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
             ON CONFLICT (competition_id, climber_id, problem) DO UPDATE SET
             attempts = excluded.attempts, is_top = excluded.is_top,
             top_attempts = excluded.top_attempts, is_zone = excluded.is_zone,
             zone_attempts = excluded.zone_attempts, finalized = excluded.finalized,
             disqualified = excluded.disqualified, score = excluded.score,
             updated_at = excluded.updated_at",
            params![
                competition_id,
                climber_id,
                problem,
                progress.attempts,
                progress.attempt.is_top,
                progress.attempt.top_attempts,
                progress.attempt.is_zone,
                progress.attempt.zone_attempts,
                progress.finalized,
                progress.disqualified,
                score,
                updated_at,
            ],
        )?;

        match action {
            BoulderAction::Finalize => info!(competition_id, climber_id, problem, score, "boulder score finalized"),
            BoulderAction::Disqualify => info!(competition_id, climber_id, problem, "climber disqualified on problem"),
            _ => {}
        }

        Ok(BoulderProblemScore {
            competition_id,
            climber_id,
            problem,
            progress,
            score,
            updated_at,
        })
    })
}

pub fn get_standings(db: &Db, competition_id: i64) -> Result<Vec<BoulderTotal>, AppError> {
    validation::validate_id(competition_id, "competition")?;

    db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT climber_id, attempts, is_top, top_attempts, is_zone, zone_attempts,
             finalized, disqualified
             FROM boulder_scores WHERE competition_id = ?1 ORDER BY climber_id, problem",
        )?;
        let rows = stmt.query_map(params![competition_id], |row| {
            Ok((row.get::<_, i64>(0)?, progress_from_row(row, 1)?))
        })?;

        let mut problems = Vec::new();
        for row in rows {
            problems.push(row?);
        }
        Ok(rank_totals(problems))
    })
}

fn load_progress(
    conn: &Connection,
    competition_id: i64,
    climber_id: i64,
    problem: i64,
) -> Result<Option<BoulderProgress>, AppError> {
    Ok(conn
        .query_row(
            "SELECT attempts, is_top, top_attempts, is_zone, zone_attempts, finalized, disqualified
             FROM boulder_scores WHERE competition_id = ?1 AND climber_id = ?2 AND problem = ?3",
            params![competition_id, climber_id, problem],
            |row| progress_from_row(row, 0),
        )
        .optional()?)
}

/// Reads the seven progress columns starting at `first`.
fn progress_from_row(row: &Row<'_>, first: usize) -> Result<BoulderProgress, rusqlite::Error> {
    Ok(BoulderProgress {
        attempts: row.get(first)?,
        attempt: ClimberAttempt {
            is_top: row.get(first + 1)?,
            top_attempts: row.get(first + 2)?,
            is_zone: row.get(first + 3)?,
            zone_attempts: row.get(first + 4)?,
        },
        finalized: row.get(first + 5)?,
        disqualified: row.get(first + 6)?,
    })
}
