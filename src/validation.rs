use crate::error::AppError;
use crate::scoring::bracket::{MAX_TOP_COUNT, MIN_TOP_COUNT};
use crate::scoring::finals::MatchRuns;
use crate::scoring::qualification::LaneResult;

const MAX_ATTEMPTS: i64 = 999;
const MAX_CLIMB_TIME_SECS: f64 = 600.0;

pub fn validate_id(id: i64, what: &str) -> Result<(), AppError> {
    if id < 1 {
        Err(AppError::BadRequest(format!("Invalid {} id: {}", what, id)))
    } else {
        Ok(())
    }
}

pub fn validate_attempts(attempts: i64, field: &str) -> Result<u32, AppError> {
    if attempts < 0 {
        Err(AppError::BadRequest(format!("{} cannot be negative", field)))
    } else if attempts > MAX_ATTEMPTS {
        Err(AppError::BadRequest(format!("{} must be at most {}", field, MAX_ATTEMPTS)))
    } else {
        Ok(attempts as u32)
    }
}

pub fn validate_time(time: Option<f64>) -> Result<(), AppError> {
    match time {
        Some(t) if !t.is_finite() || t <= 0.0 => {
            Err(AppError::BadRequest(format!("Invalid time: {}", t)))
        }
        Some(t) if t > MAX_CLIMB_TIME_SECS => {
            Err(AppError::BadRequest(format!("Time {} exceeds {}s", t, MAX_CLIMB_TIME_SECS)))
        }
        _ => Ok(()),
    }
}

pub fn validate_lane(lane: &LaneResult) -> Result<(), AppError> {
    validate_time(lane.time)
}

pub fn validate_runs(runs: &MatchRuns) -> Result<(), AppError> {
    match runs {
        MatchRuns::Single(run) => validate_lane(run),
        MatchRuns::Classic { run1, run2 } => {
            validate_lane(run1)?;
            validate_lane(run2)
        }
    }
}

pub fn validate_top_count(top_count: i64) -> Result<usize, AppError> {
    let range = MIN_TOP_COUNT as i64..=MAX_TOP_COUNT as i64;
    if range.contains(&top_count) {
        Ok(top_count as usize)
    } else {
        Err(AppError::BadRequest(format!(
            "topCount must be between {} and {}",
            MIN_TOP_COUNT, MAX_TOP_COUNT
        )))
    }
}
