use crate::scoring::bracket::{Bracket, Podium, Stage};
use crate::scoring::finals::MatchRuns;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalsSide {
    pub climber_id: i64,
    pub runs: MatchRuns,
    pub rank: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalsResolveRequest {
    pub climber_a: FinalsSide,
    pub climber_b: FinalsSide,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BracketRequest {
    pub top_count: i64,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResultRequest {
    pub runs_a: MatchRuns,
    pub runs_b: MatchRuns,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverrideRequest {
    pub winner_id: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BracketView {
    pub competition_id: i64,
    pub entry_stage: Option<Stage>,
    pub complete: bool,
    pub podium: Option<Podium>,
    #[serde(flatten)]
    pub bracket: Bracket,
}

impl BracketView {
    pub fn new(competition_id: i64, bracket: Bracket) -> Self {
        BracketView {
            competition_id,
            entry_stage: bracket.entry_stage(),
            complete: bracket.is_complete(),
            podium: bracket.podium(),
            bracket,
        }
    }
}
