use super::{round_to, ClimberId, ScoringError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const TOP_POINTS: f64 = 25.0;
const ZONE_POINTS: f64 = 10.0;
const ATTEMPT_PENALTY: f64 = 0.1;

/// Points for one boulder problem. Attempt counts are attempts-to-reach; 0
/// means not reached. A top always supersedes the zone.
pub fn score(is_top: bool, top_attempts: u32, is_zone: bool, zone_attempts: u32) -> f64 {
    if is_top && top_attempts > 0 {
        penalised(TOP_POINTS, top_attempts)
    } else if is_zone && zone_attempts > 0 {
        penalised(ZONE_POINTS, zone_attempts)
    } else {
        0.0
    }
}

fn penalised(base: f64, attempts: u32) -> f64 {
    let raw = base - f64::from(attempts - 1) * ATTEMPT_PENALTY;
    round_to(raw.max(0.0), 1)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClimberAttempt {
    pub is_top: bool,
    pub top_attempts: u32,
    pub is_zone: bool,
    pub zone_attempts: u32,
}

impl ClimberAttempt {
    pub fn score(&self) -> f64 {
        score(self.is_top, self.top_attempts, self.is_zone, self.zone_attempts)
    }

    /// Rejects flag/count combinations a judge could not have produced.
    /// `score` ignores these; this is for callers that persist records.
    pub fn check(&self) -> Result<(), ScoringError> {
        if self.is_top && self.top_attempts == 0 {
            return Err(ScoringError::InconsistentAttempt("top without an attempt count"));
        }
        if !self.is_top && self.top_attempts > 0 {
            return Err(ScoringError::InconsistentAttempt("top attempts without a top"));
        }
        if self.is_zone && self.zone_attempts == 0 {
            return Err(ScoringError::InconsistentAttempt("zone without an attempt count"));
        }
        if !self.is_zone && self.zone_attempts > 0 {
            return Err(ScoringError::InconsistentAttempt("zone attempts without a zone"));
        }
        if self.is_top && self.is_zone && self.zone_attempts > self.top_attempts {
            return Err(ScoringError::InconsistentAttempt("zone reached after the top"));
        }
        Ok(())
    }
}

/// What a judge can record for a climber on one problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoulderAction {
    Attempt,
    Zone,
    Top,
    Finalize,
    Disqualify,
}

/// Running state of one climber on one problem while the judge records it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoulderProgress {
    pub attempts: u32,
    #[serde(flatten)]
    pub attempt: ClimberAttempt,
    pub finalized: bool,
    pub disqualified: bool,
}

impl BoulderProgress {
    pub fn apply(&mut self, action: BoulderAction) -> Result<(), ScoringError> {
        if self.finalized {
            return Err(ScoringError::Finalized);
        }
        match action {
            BoulderAction::Attempt => {
                self.attempts += 1;
            }
            BoulderAction::Zone => {
                self.attempts = self.attempts.max(1);
                if !self.attempt.is_zone {
                    self.attempt.is_zone = true;
                    self.attempt.zone_attempts = self.attempts;
                }
            }
            BoulderAction::Top => {
                self.attempts = self.attempts.max(1);
                if !self.attempt.is_top {
                    self.attempt.is_top = true;
                    self.attempt.top_attempts = self.attempts;
                }
                if !self.attempt.is_zone {
                    self.attempt.is_zone = true;
                    self.attempt.zone_attempts = self.attempts;
                }
            }
            BoulderAction::Finalize => {
                self.finalized = true;
            }
            BoulderAction::Disqualify => {
                self.disqualified = true;
                self.finalized = true;
            }
        }
        Ok(())
    }

    pub fn score(&self) -> f64 {
        if self.disqualified {
            0.0
        } else {
            self.attempt.score()
        }
    }
}

/// One climber's round total across all problems.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoulderTotal {
    pub climber_id: ClimberId,
    pub tops: u32,
    pub zones: u32,
    pub points: f64,
    pub rank: u32,
}

/// Sums points per climber and ranks by points, highest first. Equal points
/// share a rank and the next rank is skipped (1, 1, 3).
pub fn rank_totals<I>(problems: I) -> Vec<BoulderTotal>
where
    I: IntoIterator<Item = (ClimberId, BoulderProgress)>,
{
    let mut by_climber: BTreeMap<ClimberId, BoulderTotal> = BTreeMap::new();
    for (climber_id, progress) in problems {
        let total = by_climber.entry(climber_id).or_insert(BoulderTotal {
            climber_id,
            tops: 0,
            zones: 0,
            points: 0.0,
            rank: 0,
        });
        if progress.disqualified {
            continue;
        }
        if progress.attempt.is_top && progress.attempt.top_attempts > 0 {
            total.tops += 1;
        }
        if progress.attempt.is_zone && progress.attempt.zone_attempts > 0 {
            total.zones += 1;
        }
        total.points = round_to(total.points + progress.score(), 1);
    }

    let mut totals: Vec<BoulderTotal> = by_climber.into_values().collect();
    totals.sort_by(|a, b| b.points.total_cmp(&a.points));
    let points: Vec<f64> = totals.iter().map(|t| t.points).collect();
    for total in totals.iter_mut() {
        total.rank = points.iter().filter(|p| **p > total.points).count() as u32 + 1;
    }
    totals
}
