use super::{round_to, ClimberId};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LaneStatus {
    Valid,
    Fall,
    FalseStart,
    Dns,
}

impl LaneStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            LaneStatus::Valid => "VALID",
            LaneStatus::Fall => "FALL",
            LaneStatus::FalseStart => "FALSE_START",
            LaneStatus::Dns => "DNS",
        }
    }
}

impl FromStr for LaneStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "VALID" => Ok(LaneStatus::Valid),
            "FALL" => Ok(LaneStatus::Fall),
            "FALSE_START" => Ok(LaneStatus::FalseStart),
            "DNS" => Ok(LaneStatus::Dns),
            other => Err(format!("unknown lane status: {other}")),
        }
    }
}

/// One run on one lane. Also used for finals runs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LaneResult {
    pub time: Option<f64>,
    pub status: LaneStatus,
}

impl LaneResult {
    pub fn valid(time: f64) -> Self {
        LaneResult { time: Some(time), status: LaneStatus::Valid }
    }

    pub fn failed(status: LaneStatus) -> Self {
        LaneResult { time: None, status }
    }

    /// The time, if this run counts.
    pub fn valid_time(&self) -> Option<f64> {
        match self.status {
            LaneStatus::Valid => self.time.filter(|t| t.is_finite()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QualificationStatus {
    Valid,
    Invalid,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualificationOutcome {
    pub total_time: Option<f64>,
    pub status: QualificationStatus,
}

/// Sum of both lanes, or invalid when either lane does not count.
pub fn compute_qualification(lane_a: &LaneResult, lane_b: &LaneResult) -> QualificationOutcome {
    match (lane_a.valid_time(), lane_b.valid_time()) {
        (Some(a), Some(b)) => QualificationOutcome {
            total_time: Some(round_to(a + b, 3)),
            status: QualificationStatus::Valid,
        },
        _ => QualificationOutcome { total_time: None, status: QualificationStatus::Invalid },
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualificationRecord {
    pub climber_id: ClimberId,
    pub lane_a: LaneResult,
    pub lane_b: LaneResult,
    pub total_time: Option<f64>,
    pub status: QualificationStatus,
    pub rank: Option<u32>,
}

impl QualificationRecord {
    /// Builds an unranked record with the derived total and status.
    pub fn new(climber_id: ClimberId, lane_a: LaneResult, lane_b: LaneResult) -> Self {
        let outcome = compute_qualification(&lane_a, &lane_b);
        QualificationRecord {
            climber_id,
            lane_a,
            lane_b,
            total_time: outcome.total_time,
            status: outcome.status,
            rank: None,
        }
    }
}

/// Ranks valid records by ascending total time and appends the invalid ones
/// unranked. Exact ties keep their input order.
pub fn rank_all(records: Vec<QualificationRecord>) -> Vec<QualificationRecord> {
    let (mut valid, mut invalid): (Vec<_>, Vec<_>) = records
        .into_iter()
        .partition(|r| r.status == QualificationStatus::Valid && r.total_time.is_some());

    valid.sort_by(|a, b| {
        let a = a.total_time.unwrap_or(f64::INFINITY);
        let b = b.total_time.unwrap_or(f64::INFINITY);
        a.total_cmp(&b)
    });
    for (index, record) in valid.iter_mut().enumerate() {
        record.rank = Some(index as u32 + 1);
    }
    for record in invalid.iter_mut() {
        record.rank = None;
    }

    valid.append(&mut invalid);
    valid
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: ClimberId, a: f64, b: f64) -> QualificationRecord {
        QualificationRecord::new(id, LaneResult::valid(a), LaneResult::valid(b))
    }

    #[test]
    fn valid_lanes_sum_to_three_decimals() {
        let out = compute_qualification(&LaneResult::valid(10.5), &LaneResult::valid(11.2));
        assert_eq!(out.status, QualificationStatus::Valid);
        assert_eq!(out.total_time, Some(21.7));

        let out = compute_qualification(&LaneResult::valid(5.1231), &LaneResult::valid(6.0003));
        assert_eq!(out.total_time, Some(11.123));
    }

    #[test]
    fn missing_time_is_invalid() {
        let lane_b = LaneResult { time: None, status: LaneStatus::Valid };
        let out = compute_qualification(&LaneResult::valid(10.5), &lane_b);
        assert_eq!(out, QualificationOutcome { total_time: None, status: QualificationStatus::Invalid });
    }

    #[test]
    fn fall_is_invalid_even_with_a_time() {
        let lane_a = LaneResult { time: Some(10.5), status: LaneStatus::Fall };
        let out = compute_qualification(&lane_a, &LaneResult::valid(11.2));
        assert_eq!(out.total_time, None);
        assert_eq!(out.status, QualificationStatus::Invalid);
    }

    #[test]
    fn ranks_ascending_with_invalid_last() {
        let records = vec![
            record(1, 7.0, 7.1),
            QualificationRecord::new(2, LaneResult::failed(LaneStatus::Dns), LaneResult::valid(6.0)),
            record(3, 5.5, 5.6),
            QualificationRecord::new(4, LaneResult::valid(6.0), LaneResult::failed(LaneStatus::FalseStart)),
            record(5, 6.2, 6.3),
        ];
        let ranked = rank_all(records);
        let order: Vec<_> = ranked.iter().map(|r| (r.climber_id, r.rank)).collect();
        assert_eq!(
            order,
            vec![(3, Some(1)), (5, Some(2)), (1, Some(3)), (2, None), (4, None)]
        );
    }

    #[test]
    fn exact_ties_keep_input_order() {
        let ranked = rank_all(vec![record(9, 6.0, 6.0), record(4, 5.0, 7.0)]);
        assert_eq!(ranked[0].climber_id, 9);
        assert_eq!(ranked[0].rank, Some(1));
        assert_eq!(ranked[1].climber_id, 4);
        assert_eq!(ranked[1].rank, Some(2));
    }

    #[test]
    fn stale_rank_on_invalid_record_is_cleared() {
        let mut stale = QualificationRecord::new(1, LaneResult::failed(LaneStatus::Fall), LaneResult::valid(6.0));
        stale.rank = Some(1);
        let ranked = rank_all(vec![stale]);
        assert_eq!(ranked[0].rank, None);
    }

    #[test]
    fn status_names_on_the_wire() {
        let json = serde_json::to_string(&LaneStatus::FalseStart).unwrap();
        assert_eq!(json, "\"FALSE_START\"");
    }
}
