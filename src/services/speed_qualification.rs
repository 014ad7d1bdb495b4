use crate::db::Db;
use crate::error::AppError;
use crate::models::qualification::*;
use crate::scoring::qualification::{
    compute_qualification, rank_all, LaneResult, LaneStatus, QualificationOutcome,
    QualificationRecord,
};
use crate::validation;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{info, warn};

pub fn compute(req: &QualificationRequest) -> Result<QualificationOutcome, AppError> {
    let (lane_a, lane_b) = req.lanes();
    validation::validate_lane(&lane_a)?;
    validation::validate_lane(&lane_b)?;
    Ok(compute_qualification(&lane_a, &lane_b))
}

/// Stores one climber's lane pair and returns it with its current rank.
pub fn save_result(
    db: &Db,
    competition_id: i64,
    climber_id: i64,
    req: &QualificationRequest,
) -> Result<QualificationRecord, AppError> {
    validation::validate_id(competition_id, "competition")?;
    validation::validate_id(climber_id, "climber")?;
    let (lane_a, lane_b) = req.lanes();
    validation::validate_lane(&lane_a)?;
    validation::validate_lane(&lane_b)?;

    db.with_conn(|conn| {
        if round_finalized(conn, competition_id)? {
            warn!(competition_id, climber_id, "qualification write after finalize");
            return Err(AppError::Conflict("Qualification round is finalized".into()));
        }

        let updated_at = Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string();
        conn.execute(
            "INSERT INTO speed_qualifications (competition_id, climber_id, lane_a_time,
             lane_a_status, lane_b_time, lane_b_status, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT (competition_id, climber_id) DO UPDATE SET
             lane_a_time = excluded.lane_a_time, lane_a_status = excluded.lane_a_status,
             lane_b_time = excluded.lane_b_time, lane_b_status = excluded.lane_b_status,
             updated_at = excluded.updated_at",
            params![
                competition_id,
                climber_id,
                lane_a.time,
                lane_a.status.as_str(),
                lane_b.time,
                lane_b.status.as_str(),
                updated_at,
            ],
        )?;

        load_ranked(conn, competition_id)?
            .into_iter()
            .find(|r| r.climber_id == climber_id)
            .ok_or_else(|| AppError::Internal("stored qualification record vanished".into()))
    })
}

pub fn get_ranked(db: &Db, competition_id: i64) -> Result<Vec<QualificationRecord>, AppError> {
    validation::validate_id(competition_id, "competition")?;
    db.with_conn(|conn| load_ranked(conn, competition_id))
}

pub fn finalize_round(db: &Db, competition_id: i64) -> Result<RoundStatus, AppError> {
    validation::validate_id(competition_id, "competition")?;

    db.with_conn(|conn| {
        let finalized_at = Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string();
        let changed = conn.execute(
            "INSERT INTO speed_rounds (competition_id, finalized, finalized_at) VALUES (?1, 1, ?2)
             ON CONFLICT (competition_id) DO NOTHING",
            params![competition_id, finalized_at],
        )?;
        if changed > 0 {
            info!(competition_id, "speed qualification finalized");
        }
        round_status(conn, competition_id)
    })
}

pub fn get_round_status(db: &Db, competition_id: i64) -> Result<RoundStatus, AppError> {
    validation::validate_id(competition_id, "competition")?;
    db.with_conn(|conn| round_status(conn, competition_id))
}

pub(crate) fn round_finalized(conn: &Connection, competition_id: i64) -> Result<bool, AppError> {
    Ok(round_status(conn, competition_id)?.finalized)
}

fn round_status(conn: &Connection, competition_id: i64) -> Result<RoundStatus, AppError> {
    let row = conn
        .query_row(
            "SELECT finalized, finalized_at FROM speed_rounds WHERE competition_id = ?1",
            params![competition_id],
            |row| Ok((row.get::<_, bool>(0)?, row.get::<_, Option<String>>(1)?)),
        )
        .optional()?;
    let (finalized, finalized_at) = row.unwrap_or((false, None));
    Ok(RoundStatus {
        competition_id,
        finalized,
        finalized_at,
    })
}

/// Every record of the round, ranked. Rows come back in registration order,
/// which is what equal totals fall back to.
pub(crate) fn load_ranked(conn: &Connection, competition_id: i64) -> Result<Vec<QualificationRecord>, AppError> {
    let mut stmt = conn.prepare(
        "SELECT climber_id, lane_a_time, lane_a_status, lane_b_time, lane_b_status
         FROM speed_qualifications WHERE competition_id = ?1 ORDER BY rowid",
    )?;
    let rows = stmt.query_map(params![competition_id], |row| {
        Ok((
            row.get::<_, i64>(0)?,
            row.get::<_, Option<f64>>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, Option<f64>>(3)?,
            row.get::<_, String>(4)?,
        ))
    })?;

    let mut records = Vec::new();
    for row in rows {
        let (climber_id, a_time, a_status, b_time, b_status) = row?;
        let lane_a = LaneResult { time: a_time, status: parse_status(&a_status)? };
        let lane_b = LaneResult { time: b_time, status: parse_status(&b_status)? };
        records.push(QualificationRecord::new(climber_id, lane_a, lane_b));
    }
    Ok(rank_all(records))
}

fn parse_status(raw: &str) -> Result<LaneStatus, AppError> {
    raw.parse().map_err(AppError::Internal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::qualification::QualificationStatus;

    fn lanes(a: Option<f64>, b: Option<f64>) -> QualificationRequest {
        QualificationRequest {
            lane_a_time: a,
            lane_b_time: b,
            lane_a_status: LaneStatus::Valid,
            lane_b_status: LaneStatus::Valid,
        }
    }

    #[test]
    fn test_compute() {
        let out = compute(&lanes(Some(10.5), Some(11.2))).unwrap();
        assert_eq!(out.total_time, Some(21.7));
        assert_eq!(out.status, QualificationStatus::Valid);

        let out = compute(&lanes(Some(10.5), None)).unwrap();
        assert_eq!(out.status, QualificationStatus::Invalid);

        assert!(compute(&lanes(Some(-3.0), Some(5.0))).is_err());
    }

    #[test]
    fn test_save_and_rank() {
        let db = Db::open_in_memory().unwrap();
        save_result(&db, 1, 10, &lanes(Some(7.0), Some(7.2))).unwrap();
        let mut fall = lanes(Some(6.0), Some(6.1));
        fall.lane_b_status = LaneStatus::Fall;
        save_result(&db, 1, 11, &fall).unwrap();
        let saved = save_result(&db, 1, 12, &lanes(Some(6.0), Some(6.3))).unwrap();
        assert_eq!(saved.rank, Some(1));

        let ranked = get_ranked(&db, 1).unwrap();
        let view: Vec<_> = ranked.iter().map(|r| (r.climber_id, r.rank)).collect();
        assert_eq!(view, vec![(12, Some(1)), (10, Some(2)), (11, None)]);
    }

    #[test]
    fn test_resubmission_replaces_times() {
        let db = Db::open_in_memory().unwrap();
        save_result(&db, 1, 10, &lanes(Some(7.0), Some(7.2))).unwrap();
        let updated = save_result(&db, 1, 10, &lanes(Some(6.0), Some(6.0))).unwrap();
        assert_eq!(updated.total_time, Some(12.0));
        assert_eq!(get_ranked(&db, 1).unwrap().len(), 1);
    }

    #[test]
    fn test_finalized_round_is_locked() {
        let db = Db::open_in_memory().unwrap();
        save_result(&db, 1, 10, &lanes(Some(7.0), Some(7.2))).unwrap();
        let status = finalize_round(&db, 1).unwrap();
        assert!(status.finalized);
        assert!(status.finalized_at.is_some());

        let err = save_result(&db, 1, 10, &lanes(Some(5.0), Some(5.0)));
        assert!(matches!(err, Err(AppError::Conflict(_))));
        assert!(!get_round_status(&db, 2).unwrap().finalized);
    }

    #[test]
    fn test_finalize_is_idempotent() {
        let db = Db::open_in_memory().unwrap();
        let first = finalize_round(&db, 1).unwrap();
        let again = finalize_round(&db, 1).unwrap();
        assert!(again.finalized);
        assert_eq!(again.finalized_at, first.finalized_at);
        let rows: i64 = db
            .with_conn(|conn| {
                Ok(conn.query_row("SELECT COUNT(*) FROM speed_rounds WHERE competition_id = 1", [], |row| row.get(0))?)
            })
            .unwrap();
        assert_eq!(rows, 1);
    }
}
