//! Daily challenges
//!
//! Every few days the factory throws a curveball: a modifier that lasts for
//! one day and may change the quota, the scoring of number hits, Numby's
//! physics or the board itself.

use serde::{Deserialize, Serialize};

use super::board::Board;
use super::character::CharacterTweak;
use crate::consts::SPECIAL_PEG_SCORE;
use crate::items::effect::scale;
use crate::items::NumberTraits;
use crate::rng::GameRng;

/// Pegs promoted to special by the Special Node Shower
const SHOWER_PEGS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DailyChallenge {
    /// Quota doubled, numbers worth 50% more
    DoubleQuota,
    /// Stronger gravity, primes worth triple
    HighGravity,
    /// Less drag, even numbers worth 25% more
    SlipperyFloor,
    /// More special pegs, special numbers doubled and the rest worth less
    SpecialShower,
    /// Peg scores doubled, quota 50% higher
    PegBonanza,
}

impl DailyChallenge {
    pub const ALL: [DailyChallenge; 5] = [
        DailyChallenge::DoubleQuota,
        DailyChallenge::HighGravity,
        DailyChallenge::SlipperyFloor,
        DailyChallenge::SpecialShower,
        DailyChallenge::PegBonanza,
    ];

    pub fn roll(rng: &mut GameRng) -> Self {
        Self::ALL[rng.index(Self::ALL.len())]
    }

    pub fn name(self) -> &'static str {
        match self {
            DailyChallenge::DoubleQuota => "Double Quota",
            DailyChallenge::HighGravity => "High Gravity",
            DailyChallenge::SlipperyFloor => "Slippery Factory Floor",
            DailyChallenge::SpecialShower => "Special Node Shower",
            DailyChallenge::PegBonanza => "Peg Bonanza",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            DailyChallenge::DoubleQuota => {
                "Today's quota is doubled, but all numbers are worth 50% more!"
            }
            DailyChallenge::HighGravity => {
                "Gravity is increased! Numby falls faster, but all prime numbers are worth triple."
            }
            DailyChallenge::SlipperyFloor => {
                "Extra slippery today! Numby has less friction but collects 25% more from even numbers."
            }
            DailyChallenge::SpecialShower => {
                "Many special nodes today, but regular nodes are worth less."
            }
            DailyChallenge::PegBonanza => "All pegs score double points, but the quota is 50% higher!",
        }
    }

    /// Factor applied to the day's quota
    pub fn quota_modifier(self) -> Option<f64> {
        match self {
            DailyChallenge::DoubleQuota => Some(2.0),
            DailyChallenge::PegBonanza => Some(1.5),
            _ => None,
        }
    }

    /// Score rule for a number hit; `traits` describe the peg's pre-hit score
    pub fn apply_score(self, score: u64, traits: NumberTraits) -> u64 {
        match self {
            DailyChallenge::DoubleQuota => scale(score, 1.5),
            DailyChallenge::HighGravity if traits.prime => score.saturating_mul(3),
            DailyChallenge::SlipperyFloor if traits.even => scale(score, 1.25),
            DailyChallenge::SpecialShower => {
                if traits.special {
                    score.saturating_mul(2)
                } else {
                    scale(score, 0.8)
                }
            }
            _ => score,
        }
    }

    pub fn character_tweak(self) -> Option<CharacterTweak> {
        match self {
            DailyChallenge::HighGravity => Some(CharacterTweak::Gravity(1.5)),
            DailyChallenge::SlipperyFloor => Some(CharacterTweak::LessDrag(0.5)),
            _ => None,
        }
    }

    /// Rework the freshly built board; returns whether anything changed
    pub fn modify_board(self, board: &mut Board, rng: &mut GameRng) -> bool {
        match self {
            DailyChallenge::SpecialShower => {
                board.boost_random_pegs(SHOWER_PEGS, SPECIAL_PEG_SCORE, rng);
                true
            }
            DailyChallenge::PegBonanza => {
                board.scale_peg_scores(2);
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tuning::BoardTuning;

    #[test]
    fn test_score_rules() {
        let prime = NumberTraits::of(7);
        let even = NumberTraits::of(8);
        let special = NumberTraits::of(32);

        assert_eq!(DailyChallenge::DoubleQuota.apply_score(10, even), 15);
        assert_eq!(DailyChallenge::HighGravity.apply_score(10, prime), 30);
        assert_eq!(DailyChallenge::HighGravity.apply_score(10, even), 10);
        assert_eq!(DailyChallenge::SlipperyFloor.apply_score(8, even), 10);
        assert_eq!(DailyChallenge::SlipperyFloor.apply_score(7, prime), 7);
        assert_eq!(DailyChallenge::SpecialShower.apply_score(10, special), 20);
        assert_eq!(DailyChallenge::SpecialShower.apply_score(10, even), 8);
        assert_eq!(DailyChallenge::PegBonanza.apply_score(10, even), 10);
    }

    #[test]
    fn test_board_modifications() {
        let mut rng = GameRng::new(9);
        let mut board = Board::new(BoardTuning::default());
        board.generate_board(1, &mut rng);

        assert!(DailyChallenge::PegBonanza.modify_board(&mut board, &mut rng));
        assert!(board.pegs().iter().all(|p| p.score == 2));

        assert!(DailyChallenge::SpecialShower.modify_board(&mut board, &mut rng));
        let special = board.pegs().iter().filter(|p| p.score >= SPECIAL_PEG_SCORE).count();
        assert_eq!(special, SHOWER_PEGS);

        assert!(!DailyChallenge::HighGravity.modify_board(&mut board, &mut rng));
    }
}
