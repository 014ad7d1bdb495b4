use crate::scoring::boulder::{BoulderAction, BoulderProgress};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoulderScoreRequest {
    pub is_top: bool,
    pub top_attempts: i64,
    pub is_zone: bool,
    pub zone_attempts: i64,
}

#[derive(Debug, Serialize)]
pub struct BoulderScoreResult {
    pub score: f64,
}

#[derive(Debug, Deserialize)]
pub struct BoulderActionRequest {
    pub action: BoulderAction,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoulderProblemScore {
    pub competition_id: i64,
    pub climber_id: i64,
    pub problem: i64,
    #[serde(flatten)]
    pub progress: BoulderProgress,
    pub score: f64,
    pub updated_at: String,
}
