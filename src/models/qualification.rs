use crate::scoring::qualification::{LaneResult, LaneStatus};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualificationRequest {
    pub lane_a_time: Option<f64>,
    pub lane_b_time: Option<f64>,
    pub lane_a_status: LaneStatus,
    pub lane_b_status: LaneStatus,
}

impl QualificationRequest {
    pub fn lanes(&self) -> (LaneResult, LaneResult) {
        (
            LaneResult { time: self.lane_a_time, status: self.lane_a_status },
            LaneResult { time: self.lane_b_time, status: self.lane_b_status },
        )
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundStatus {
    pub competition_id: i64,
    pub finalized: bool,
    pub finalized_at: Option<String>,
}
