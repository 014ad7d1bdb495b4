use super::bracket::Stage;
use super::ClimberId;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ScoringError {
    #[error("score is finalized and can no longer change")]
    Finalized,

    #[error("inconsistent attempt record: {0}")]
    InconsistentAttempt(&'static str),
}

/// Structural failures of the bracket. An undecided match is not one of them.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BracketError {
    #[error("top count must be between 2 and 16, got {0}")]
    TopCountOutOfRange(usize),

    #[error("need at least 2 ranked climbers, found {0}")]
    NotEnoughClimbers(usize),

    #[error("no {stage} match at position {position}")]
    MatchNotFound { stage: Stage, position: usize },

    #[error("climber {climber_id} is not part of {stage} match {position}")]
    ClimberNotInMatch {
        climber_id: ClimberId,
        stage: Stage,
        position: usize,
    },

    #[error("{stage} match {position} is a bye and takes no result")]
    ByeMatch { stage: Stage, position: usize },

    #[error("{0} already has results, earlier stages are locked")]
    LaterStageScored(Stage),
}
