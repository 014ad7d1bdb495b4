use super::qualification::{LaneResult, LaneStatus};
use super::ClimberId;
use serde::{Deserialize, Serialize};

/// What a climber ran in one finals match.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MatchRuns {
    Single(LaneResult),
    /// Two-run format, best valid run counts.
    Classic { run1: LaneResult, run2: LaneResult },
}

impl MatchRuns {
    /// Collapses the runs into the single result the decision table compares.
    pub fn reduce(&self) -> LaneResult {
        match self {
            MatchRuns::Single(run) => *run,
            MatchRuns::Classic { run1, run2 } => match (run1.valid_time(), run2.valid_time()) {
                (Some(a), Some(b)) => LaneResult::valid(a.min(b)),
                (Some(a), None) => LaneResult::valid(a),
                (None, Some(b)) => LaneResult::valid(b),
                (None, None) => {
                    let status = if run1.status != LaneStatus::Valid {
                        run1.status
                    } else {
                        run2.status
                    };
                    LaneResult { time: None, status }
                }
            },
        }
    }
}

/// One side of a match as the resolver sees it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchSide {
    pub climber_id: ClimberId,
    pub result: LaneResult,
    /// Qualification rank, the tie-breaker.
    pub rank: Option<u32>,
}

impl MatchSide {
    pub fn new(climber_id: ClimberId, runs: &MatchRuns, rank: Option<u32>) -> Self {
        MatchSide { climber_id, result: runs.reduce(), rank }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DecidedBy {
    Time,
    Forfeit,
    QualificationRank,
    /// Needs a manual override from the judge.
    Undecided,
    /// Set by a judge, never produced by `decide`.
    Override,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchDecision {
    pub winner_id: Option<ClimberId>,
    pub decided_by: DecidedBy,
}

impl MatchDecision {
    fn won(side: &MatchSide, decided_by: DecidedBy) -> Self {
        MatchDecision { winner_id: Some(side.climber_id), decided_by }
    }

    fn undecided() -> Self {
        MatchDecision { winner_id: None, decided_by: DecidedBy::Undecided }
    }
}

pub fn decide(a: &MatchSide, b: &MatchSide) -> MatchDecision {
    match (a.result.valid_time(), b.result.valid_time()) {
        (None, None) => by_rank(a, b),
        (Some(_), None) => MatchDecision::won(a, DecidedBy::Forfeit),
        (None, Some(_)) => MatchDecision::won(b, DecidedBy::Forfeit),
        (Some(time_a), Some(time_b)) => {
            if time_a < time_b {
                MatchDecision::won(a, DecidedBy::Time)
            } else if time_b < time_a {
                MatchDecision::won(b, DecidedBy::Time)
            } else {
                by_rank(a, b)
            }
        }
    }
}

/// Winner of a head-to-head match, `None` when nothing separates the two.
pub fn resolve_match(a: &MatchSide, b: &MatchSide) -> Option<ClimberId> {
    decide(a, b).winner_id
}

fn by_rank(a: &MatchSide, b: &MatchSide) -> MatchDecision {
    match (a.rank, b.rank) {
        (Some(rank_a), Some(rank_b)) if rank_a < rank_b => {
            MatchDecision::won(a, DecidedBy::QualificationRank)
        }
        (Some(rank_a), Some(rank_b)) if rank_b < rank_a => {
            MatchDecision::won(b, DecidedBy::QualificationRank)
        }
        (Some(_), None) => MatchDecision::won(a, DecidedBy::QualificationRank),
        (None, Some(_)) => MatchDecision::won(b, DecidedBy::QualificationRank),
        _ => MatchDecision::undecided(),
    }
}
