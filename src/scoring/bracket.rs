//! Single-elimination bracket for speed finals.
//!
//! Stages run `RoundOf16 -> QuarterFinal -> SemiFinal -> {SmallFinal, BigFinal}`.
//! A stage is only created once every match of the stage before it has a
//! winner, so a match always knows both of its climbers (or knows it is a bye).

use super::error::BracketError;
use super::finals::{decide, DecidedBy, MatchDecision, MatchRuns, MatchSide};
use super::qualification::QualificationRecord;
use super::ClimberId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const MIN_TOP_COUNT: usize = 2;
pub const MAX_TOP_COUNT: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Stage {
    RoundOf16,
    QuarterFinal,
    SemiFinal,
    SmallFinal,
    BigFinal,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::RoundOf16 => "roundOf16",
            Stage::QuarterFinal => "quarterFinal",
            Stage::SemiFinal => "semiFinal",
            Stage::SmallFinal => "smallFinal",
            Stage::BigFinal => "bigFinal",
        }
    }

    /// Smallest stage that holds a field of this size.
    pub fn entry_for(field_size: usize) -> Stage {
        match field_size {
            0..=2 => Stage::BigFinal,
            3..=4 => Stage::SemiFinal,
            5..=8 => Stage::QuarterFinal,
            _ => Stage::RoundOf16,
        }
    }

    /// Where the winners of this stage go.
    pub fn next(self) -> Option<Stage> {
        match self {
            Stage::RoundOf16 => Some(Stage::QuarterFinal),
            Stage::QuarterFinal => Some(Stage::SemiFinal),
            Stage::SemiFinal => Some(Stage::BigFinal),
            Stage::SmallFinal | Stage::BigFinal => None,
        }
    }

    /// Stages that only exist because this one was completed.
    fn downstream(self) -> &'static [Stage] {
        match self {
            Stage::RoundOf16 => &[Stage::QuarterFinal, Stage::SemiFinal, Stage::SmallFinal, Stage::BigFinal],
            Stage::QuarterFinal => &[Stage::SemiFinal, Stage::SmallFinal, Stage::BigFinal],
            Stage::SemiFinal => &[Stage::SmallFinal, Stage::BigFinal],
            Stage::SmallFinal | Stage::BigFinal => &[],
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Stage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "roundOf16" => Ok(Stage::RoundOf16),
            "quarterFinal" => Ok(Stage::QuarterFinal),
            "semiFinal" => Ok(Stage::SemiFinal),
            "smallFinal" => Ok(Stage::SmallFinal),
            "bigFinal" => Ok(Stage::BigFinal),
            other => Err(format!("unknown stage: {other}")),
        }
    }
}

/// A qualified climber and their qualification rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entrant {
    pub climber_id: ClimberId,
    pub seed: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BracketMatch {
    pub stage: Stage,
    pub position: usize,
    pub climber_a: Entrant,
    /// `None` marks a bye.
    pub climber_b: Option<Entrant>,
    pub runs_a: Option<MatchRuns>,
    pub runs_b: Option<MatchRuns>,
    pub decided_by: Option<DecidedBy>,
    pub winner_id: Option<ClimberId>,
}

impl BracketMatch {
    fn new(stage: Stage, position: usize, climber_a: Entrant, climber_b: Option<Entrant>) -> Self {
        // byes resolve on creation, no time is ever recorded for them
        let winner_id = match climber_b {
            None => Some(climber_a.climber_id),
            Some(_) => None,
        };
        BracketMatch {
            stage,
            position,
            climber_a,
            climber_b,
            runs_a: None,
            runs_b: None,
            decided_by: None,
            winner_id,
        }
    }

    pub fn is_bye(&self) -> bool {
        self.climber_b.is_none()
    }

    /// Whether a judge has entered anything for this match.
    pub fn has_results(&self) -> bool {
        !self.is_bye() && (self.runs_a.is_some() || self.runs_b.is_some() || self.winner_id.is_some())
    }

    pub fn contains(&self, climber_id: ClimberId) -> bool {
        self.climber_a.climber_id == climber_id
            || self.climber_b.is_some_and(|b| b.climber_id == climber_id)
    }

    fn winner(&self) -> Option<Entrant> {
        let winner_id = self.winner_id?;
        self.entrants().into_iter().find(|e| e.climber_id == winner_id)
    }

    fn loser(&self) -> Option<Entrant> {
        let winner_id = self.winner_id?;
        self.entrants().into_iter().find(|e| e.climber_id != winner_id)
    }

    pub fn loser_id(&self) -> Option<ClimberId> {
        self.loser().map(|e| e.climber_id)
    }

    fn entrants(&self) -> Vec<Entrant> {
        let mut out = vec![self.climber_a];
        out.extend(self.climber_b);
        out
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Podium {
    pub first: ClimberId,
    pub second: Option<ClimberId>,
    pub third: Option<ClimberId>,
    pub fourth: Option<ClimberId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bracket {
    pub top_count: usize,
    pub matches: Vec<BracketMatch>,
}

impl Bracket {
    /// Seeds the entry stage from ranked qualification records. Only ranked
    /// records qualify; the best `top_count` of them make the field.
    pub fn generate(records: &[QualificationRecord], top_count: usize) -> Result<Bracket, BracketError> {
        if !(MIN_TOP_COUNT..=MAX_TOP_COUNT).contains(&top_count) {
            return Err(BracketError::TopCountOutOfRange(top_count));
        }

        let mut field: Vec<Entrant> = records
            .iter()
            .filter_map(|r| r.rank.map(|seed| Entrant { climber_id: r.climber_id, seed }))
            .collect();
        field.sort_by_key(|e| e.seed);
        field.truncate(top_count);
        if field.len() < MIN_TOP_COUNT {
            return Err(BracketError::NotEnoughClimbers(field.len()));
        }

        let mut bracket = Bracket { top_count, matches: Vec::new() };
        let stage = Stage::entry_for(field.len());
        bracket.push_stage(stage, pairings(field));
        Ok(bracket)
    }

    pub fn entry_stage(&self) -> Option<Stage> {
        self.matches.first().map(|m| m.stage)
    }

    pub fn stage_matches(&self, stage: Stage) -> impl Iterator<Item = &BracketMatch> {
        self.matches.iter().filter(move |m| m.stage == stage)
    }

    pub fn stage_has_results(&self, stage: Stage) -> bool {
        self.stage_matches(stage).any(BracketMatch::has_results)
    }

    pub fn get(&self, stage: Stage, position: usize) -> Option<&BracketMatch> {
        self.matches
            .iter()
            .find(|m| m.stage == stage && m.position == position)
    }

    /// Enters both climbers' runs, resolves the match and advances the
    /// bracket when the stage is complete.
    pub fn record_result(
        &mut self,
        stage: Stage,
        position: usize,
        runs_a: MatchRuns,
        runs_b: MatchRuns,
    ) -> Result<MatchDecision, BracketError> {
        self.ensure_downstream_unscored(stage)?;
        let slot = self.match_mut(stage, position)?;
        let climber_b = slot
            .climber_b
            .ok_or(BracketError::ByeMatch { stage, position })?;
        let side_a = MatchSide::new(slot.climber_a.climber_id, &runs_a, Some(slot.climber_a.seed));
        let side_b = MatchSide::new(climber_b.climber_id, &runs_b, Some(climber_b.seed));
        let decision = decide(&side_a, &side_b);

        slot.runs_a = Some(runs_a);
        slot.runs_b = Some(runs_b);
        slot.winner_id = decision.winner_id;
        slot.decided_by = Some(decision.decided_by);

        self.rebuild_downstream(stage);
        Ok(decision)
    }

    /// Judge decision for a match the times could not settle.
    pub fn override_winner(
        &mut self,
        stage: Stage,
        position: usize,
        climber_id: ClimberId,
    ) -> Result<(), BracketError> {
        self.ensure_downstream_unscored(stage)?;
        let slot = self.match_mut(stage, position)?;
        if slot.is_bye() {
            return Err(BracketError::ByeMatch { stage, position });
        }
        if !slot.contains(climber_id) {
            return Err(BracketError::ClimberNotInMatch { climber_id, stage, position });
        }
        slot.winner_id = Some(climber_id);
        slot.decided_by = Some(DecidedBy::Override);

        self.rebuild_downstream(stage);
        Ok(())
    }

    pub fn is_complete(&self) -> bool {
        let decided = |stage| {
            let mut matches = self.stage_matches(stage).peekable();
            matches.peek().is_some() && matches.all(|m| m.winner_id.is_some())
        };
        let needs_small_final = self.stage_matches(Stage::SemiFinal).next().is_some();
        decided(Stage::BigFinal) && (!needs_small_final || decided(Stage::SmallFinal))
    }

    pub fn podium(&self) -> Option<Podium> {
        if !self.is_complete() {
            return None;
        }
        let big = self.stage_matches(Stage::BigFinal).next()?;
        let small = self.stage_matches(Stage::SmallFinal).next();
        Some(Podium {
            first: big.winner_id?,
            second: big.loser_id(),
            third: small.and_then(|m| m.winner_id),
            fourth: small.and_then(BracketMatch::loser_id),
        })
    }

    fn match_mut(&mut self, stage: Stage, position: usize) -> Result<&mut BracketMatch, BracketError> {
        self.matches
            .iter_mut()
            .find(|m| m.stage == stage && m.position == position)
            .ok_or(BracketError::MatchNotFound { stage, position })
    }

    fn ensure_downstream_unscored(&self, stage: Stage) -> Result<(), BracketError> {
        match stage
            .downstream()
            .iter()
            .find(|later| self.stage_has_results(**later))
        {
            Some(later) => Err(BracketError::LaterStageScored(*later)),
            None => Ok(()),
        }
    }

    /// Drops unscored later stages and recreates them from the current
    /// winners, if the stage is now complete.
    fn rebuild_downstream(&mut self, stage: Stage) {
        let downstream = stage.downstream();
        self.matches.retain(|m| !downstream.contains(&m.stage));
        self.advance(stage);
    }

    fn advance(&mut self, stage: Stage) {
        let Some(next) = stage.next() else {
            return;
        };
        let finished: Vec<&BracketMatch> = self.stage_matches(stage).collect();
        if finished.is_empty() || finished.iter().any(|m| m.winner_id.is_none()) {
            return;
        }

        // Only a power-of-two, bye-free stage is in bracket order; fold
        // pairings of other sizes must be reseeded or seeds 1 and 2 can meet
        // before the big final.
        let positional = finished.len().is_power_of_two() && !finished.iter().any(|m| m.is_bye());
        let winners: Vec<Entrant> = finished.iter().filter_map(|m| m.winner()).collect();
        let losers: Vec<Entrant> = finished.iter().filter_map(|m| m.loser()).collect();

        let next_pairs = if positional {
            winners
                .chunks(2)
                .map(|pair| ordered(pair[0], pair[1]))
                .collect()
        } else {
            pairings(winners)
        };
        self.push_stage(next, next_pairs);

        if stage == Stage::SemiFinal && !losers.is_empty() {
            self.push_stage(Stage::SmallFinal, pairings(losers));
        }

        // a stage made only of byes is already complete
        if self.stage_matches(next).all(BracketMatch::is_bye) {
            self.advance(next);
        }
    }

    fn push_stage(&mut self, stage: Stage, pairs: Vec<(Entrant, Option<Entrant>)>) {
        for (position, (a, b)) in pairs.into_iter().enumerate() {
            self.matches.push(BracketMatch::new(stage, position, a, b));
        }
    }
}

/// Pairs a field by seed: 1 vs N, 2 vs N-1, ... A power-of-two field is laid
/// out in bracket order so seeds 1 and 2 can only meet in the last match. An
/// odd field leaves the middle seed over, who gets the bye; top seeds are
/// not given byes, they race the bottom of the field like everyone else.
fn pairings(mut field: Vec<Entrant>) -> Vec<(Entrant, Option<Entrant>)> {
    field.sort_by_key(|e| e.seed);
    let n = field.len();
    if n == 1 {
        return vec![(field[0], None)];
    }
    if n.is_power_of_two() {
        let order = seed_positions(n);
        return order
            .chunks(2)
            .map(|pair| ordered(field[pair[0] - 1], field[pair[1] - 1]))
            .collect();
    }

    let mut pairs: Vec<(Entrant, Option<Entrant>)> = (0..n / 2)
        .map(|i| (field[i], Some(field[n - 1 - i])))
        .collect();
    if n % 2 == 1 {
        pairs.push((field[n / 2], None));
    }
    pairs
}

fn ordered(a: Entrant, b: Entrant) -> (Entrant, Option<Entrant>) {
    if b.seed < a.seed {
        (b, Some(a))
    } else {
        (a, Some(b))
    }
}

/// 1-based seed at each bracket line: 2 -> [1, 2], 4 -> [1, 4, 2, 3],
/// 8 -> [1, 8, 4, 5, 2, 7, 3, 6].
fn seed_positions(size: usize) -> Vec<usize> {
    let mut seeds = vec![1usize];
    while seeds.len() < size {
        let n = seeds.len();
        let mut next = Vec::with_capacity(n * 2);
        for seed in seeds.iter().copied() {
            next.push(seed);
            next.push(n * 2 + 1 - seed);
        }
        seeds = next;
    }
    seeds
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::qualification::{rank_all, LaneResult, LaneStatus};

    /// Climber `i` qualifies `i`-th (ids 1..=n).
    fn ranked(n: usize) -> Vec<QualificationRecord> {
        let records = (1..=n as i64)
            .map(|id| {
                let t = 5.0 + id as f64 * 0.1;
                QualificationRecord::new(id, LaneResult::valid(t), LaneResult::valid(t))
            })
            .collect();
        rank_all(records)
    }

    fn pairs(bracket: &Bracket, stage: Stage) -> Vec<(ClimberId, Option<ClimberId>)> {
        bracket
            .stage_matches(stage)
            .map(|m| (m.climber_a.climber_id, m.climber_b.map(|b| b.climber_id)))
            .collect()
    }

    fn win_a(bracket: &mut Bracket, stage: Stage, position: usize) {
        bracket
            .record_result(
                stage,
                position,
                MatchRuns::Single(LaneResult::valid(6.0)),
                MatchRuns::Single(LaneResult::valid(6.5)),
            )
            .unwrap();
    }

    #[test]
    fn seed_positions_follow_standard_order() {
        assert_eq!(seed_positions(4), vec![1, 4, 2, 3]);
        assert_eq!(seed_positions(8), vec![1, 8, 4, 5, 2, 7, 3, 6]);
    }

    #[test]
    fn entry_stage_follows_field_size() {
        assert_eq!(Stage::entry_for(2), Stage::BigFinal);
        assert_eq!(Stage::entry_for(4), Stage::SemiFinal);
        assert_eq!(Stage::entry_for(5), Stage::QuarterFinal);
        assert_eq!(Stage::entry_for(16), Stage::RoundOf16);
    }

    #[test]
    fn eight_climbers_enter_at_quarter_finals() {
        let bracket = Bracket::generate(&ranked(12), 8).unwrap();
        assert_eq!(bracket.entry_stage(), Some(Stage::QuarterFinal));
        assert_eq!(
            pairs(&bracket, Stage::QuarterFinal),
            vec![(1, Some(8)), (4, Some(5)), (2, Some(7)), (3, Some(6))]
        );
    }

    #[test]
    fn top_count_is_bounded() {
        assert_eq!(Bracket::generate(&ranked(4), 1), Err(BracketError::TopCountOutOfRange(1)));
        assert_eq!(Bracket::generate(&ranked(20), 17), Err(BracketError::TopCountOutOfRange(17)));
    }

    #[test]
    fn unranked_climbers_do_not_qualify() {
        let records = rank_all(vec![
            QualificationRecord::new(1, LaneResult::valid(6.0), LaneResult::valid(6.0)),
            QualificationRecord::new(2, LaneResult::failed(LaneStatus::Dns), LaneResult::valid(6.0)),
        ]);
        assert_eq!(Bracket::generate(&records, 4), Err(BracketError::NotEnoughClimbers(1)));
    }

    #[test]
    fn five_climbers_get_one_bye() {
        let bracket = Bracket::generate(&ranked(5), 8).unwrap();
        assert_eq!(
            pairs(&bracket, Stage::QuarterFinal),
            vec![(1, Some(5)), (2, Some(4)), (3, None)]
        );
        let byes: Vec<_> = bracket.matches.iter().filter(|m| m.is_bye()).collect();
        assert_eq!(byes.len(), 1);
        assert_eq!(byes[0].winner_id, Some(3));
        assert!(byes[0].runs_a.is_none());
        assert!(!bracket.stage_has_results(Stage::QuarterFinal));
    }

    #[test]
    fn quarter_final_winners_meet_in_bracket_order() {
        let mut bracket = Bracket::generate(&ranked(8), 8).unwrap();
        for position in 0..4 {
            win_a(&mut bracket, Stage::QuarterFinal, position);
        }
        assert_eq!(pairs(&bracket, Stage::SemiFinal), vec![(1, Some(4)), (2, Some(3))]);
    }

    #[test]
    fn semi_final_losers_meet_in_small_final() {
        let mut bracket = Bracket::generate(&ranked(4), 4).unwrap();
        win_a(&mut bracket, Stage::SemiFinal, 0);
        assert!(bracket.stage_matches(Stage::BigFinal).next().is_none());
        // seed 3 upsets seed 2
        bracket
            .record_result(
                Stage::SemiFinal,
                1,
                MatchRuns::Single(LaneResult::failed(LaneStatus::Fall)),
                MatchRuns::Single(LaneResult::valid(7.0)),
            )
            .unwrap();

        assert_eq!(pairs(&bracket, Stage::BigFinal), vec![(1, Some(3))]);
        assert_eq!(pairs(&bracket, Stage::SmallFinal), vec![(2, Some(4))]);

        win_a(&mut bracket, Stage::BigFinal, 0);
        assert!(!bracket.is_complete());
        win_a(&mut bracket, Stage::SmallFinal, 0);
        assert_eq!(
            bracket.podium(),
            Some(Podium { first: 1, second: Some(3), third: Some(2), fourth: Some(4) })
        );
    }

    #[test]
    fn odd_stage_reseeds_with_a_bye() {
        let mut bracket = Bracket::generate(&ranked(5), 8).unwrap();
        win_a(&mut bracket, Stage::QuarterFinal, 0);
        win_a(&mut bracket, Stage::QuarterFinal, 1);
        assert_eq!(pairs(&bracket, Stage::SemiFinal), vec![(1, Some(3)), (2, None)]);

        win_a(&mut bracket, Stage::SemiFinal, 0);
        assert_eq!(pairs(&bracket, Stage::BigFinal), vec![(1, Some(2))]);
        // the only semi-final loser takes third unopposed
        assert_eq!(pairs(&bracket, Stage::SmallFinal), vec![(3, None)]);
    }

    #[test]
    fn top_two_seeds_meet_only_in_the_big_final() {
        for n in 2..=16 {
            let mut bracket = Bracket::generate(&ranked(n), 16).unwrap();
            for stage in [Stage::RoundOf16, Stage::QuarterFinal, Stage::SemiFinal, Stage::BigFinal] {
                let open: Vec<usize> = bracket
                    .stage_matches(stage)
                    .filter(|m| m.winner_id.is_none())
                    .map(|m| m.position)
                    .collect();
                for position in open {
                    win_a(&mut bracket, stage, position);
                }
            }

            let meetings: Vec<Stage> = bracket
                .matches
                .iter()
                .filter(|m| m.contains(1) && m.contains(2))
                .map(|m| m.stage)
                .collect();
            assert_eq!(meetings, vec![Stage::BigFinal], "field of {}", n);
        }
    }

    #[test]
    fn twelve_climbers_reseed_after_round_of_16() {
        let mut bracket = Bracket::generate(&ranked(12), 12).unwrap();
        for position in 0..6 {
            win_a(&mut bracket, Stage::RoundOf16, position);
        }
        assert_eq!(
            pairs(&bracket, Stage::QuarterFinal),
            vec![(1, Some(6)), (2, Some(5)), (3, Some(4))]
        );
    }

    #[test]
    fn two_climbers_race_the_big_final_only() {
        let mut bracket = Bracket::generate(&ranked(2), 2).unwrap();
        assert_eq!(bracket.entry_stage(), Some(Stage::BigFinal));
        win_a(&mut bracket, Stage::BigFinal, 0);
        assert_eq!(
            bracket.podium(),
            Some(Podium { first: 1, second: Some(2), third: None, fourth: None })
        );
    }

    #[test]
    fn structural_errors_are_reported() {
        let mut bracket = Bracket::generate(&ranked(5), 8).unwrap();
        let run = MatchRuns::Single(LaneResult::valid(6.0));
        assert_eq!(
            bracket.record_result(Stage::SemiFinal, 0, run, run),
            Err(BracketError::MatchNotFound { stage: Stage::SemiFinal, position: 0 })
        );
        assert_eq!(
            bracket.record_result(Stage::QuarterFinal, 2, run, run),
            Err(BracketError::ByeMatch { stage: Stage::QuarterFinal, position: 2 })
        );
        assert_eq!(
            bracket.override_winner(Stage::QuarterFinal, 0, 3),
            Err(BracketError::ClimberNotInMatch { climber_id: 3, stage: Stage::QuarterFinal, position: 0 })
        );
    }

    #[test]
    fn correction_rebuilds_unscored_later_stage() {
        let mut bracket = Bracket::generate(&ranked(4), 4).unwrap();
        win_a(&mut bracket, Stage::SemiFinal, 0);
        win_a(&mut bracket, Stage::SemiFinal, 1);
        assert_eq!(pairs(&bracket, Stage::BigFinal), vec![(1, Some(2))]);

        bracket.override_winner(Stage::SemiFinal, 1, 3).unwrap();
        assert_eq!(pairs(&bracket, Stage::BigFinal), vec![(1, Some(3))]);
        assert_eq!(pairs(&bracket, Stage::SmallFinal), vec![(2, Some(4))]);
    }

    #[test]
    fn scored_later_stage_locks_earlier_results() {
        let mut bracket = Bracket::generate(&ranked(4), 4).unwrap();
        win_a(&mut bracket, Stage::SemiFinal, 0);
        win_a(&mut bracket, Stage::SemiFinal, 1);
        win_a(&mut bracket, Stage::BigFinal, 0);
        assert_eq!(
            bracket.override_winner(Stage::SemiFinal, 1, 3),
            Err(BracketError::LaterStageScored(Stage::BigFinal))
        );
    }

    #[test]
    fn stage_names_round_trip_through_paths() {
        for stage in [Stage::RoundOf16, Stage::QuarterFinal, Stage::SemiFinal, Stage::SmallFinal, Stage::BigFinal] {
            assert_eq!(stage.as_str().parse::<Stage>(), Ok(stage));
        }
        assert!("final".parse::<Stage>().is_err());
    }
}
