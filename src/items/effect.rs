//! Item effects as data
//!
//! Every owned item carries one or two [`Effect`]s materialized for its level.
//! The variant is the trigger; the payload is a typed rule interpreted by the
//! pure `apply` functions below. Hit-time inputs and side outputs travel in a
//! [`HitContext`].

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::SPECIAL_PEG_SCORE;
use crate::rng::GameRng;
use crate::sim::board::Peg;
use crate::sim::character::{Character, CharacterTweak};

/// Acceleration per unit of attractor strength, px/tick²
pub const ATTRACT_ACCEL: f32 = 0.05;
/// Pegs within this distance pull on Numby
pub const ATTRACT_RADIUS: f32 = 150.0;
/// Score chains stop growing after this many links
pub const MAX_CHAIN: u32 = 5;

/// Value-transforming events routed through the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScoreEvent {
    /// Value generated by a hit (added to the day's score)
    NumberHit,
    /// Value a peg keeps after being hit
    PegHit,
}

/// Number classes some rules care about, derived from the peg's pre-hit score
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumberTraits {
    pub prime: bool,
    pub fibonacci: bool,
    pub special: bool,
    pub even: bool,
}

impl NumberTraits {
    pub fn of(value: u64) -> Self {
        Self {
            prime: is_prime(value),
            fibonacci: is_fibonacci(value),
            special: value >= SPECIAL_PEG_SCORE,
            even: value % 2 == 0,
        }
    }
}

fn is_prime(n: u64) -> bool {
    if n < 2 {
        return false;
    }
    if n % 2 == 0 {
        return n == 2;
    }
    let mut d = 3u64;
    while d.saturating_mul(d) <= n {
        if n % d == 0 {
            return false;
        }
        d += 2;
    }
    true
}

fn is_fibonacci(n: u64) -> bool {
    let (mut a, mut b) = (0u64, 1u64);
    while a < n {
        let Some(next) = a.checked_add(b) else {
            return false;
        };
        a = b;
        b = next;
    }
    a == n
}

fn digit_sum(mut n: u64) -> u64 {
    let mut sum = 0;
    while n > 0 {
        sum += n % 10;
        n /= 10;
    }
    sum
}

fn contains_digit(n: u64, digit: u8) -> bool {
    n.to_string().bytes().any(|b| b == b'0' + digit)
}

/// `floor(value * factor)`, saturating
#[inline]
pub fn scale(value: u64, factor: f64) -> u64 {
    (value as f64 * factor).floor() as u64
}

/// Inputs and side outputs of one peg hit
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HitContext {
    pub day: u32,
    pub consecutive_hits: u32,
    pub traits: NumberTraits,
    /// Peg score before this hit
    pub peg_score: u64,
    /// Hits the peg had taken before this one
    pub peg_hits: u32,
    /// A retain rule kept the peg's full value
    pub retained: bool,
    /// The peg shatters: it is removed and its remaining value is paid out
    pub shattered: bool,
    /// A copy of the peg should be spawned
    pub duplicate: bool,
}

impl HitContext {
    pub fn new(day: u32, consecutive_hits: u32, peg_score: u64, peg_hits: u32) -> Self {
        Self {
            day,
            consecutive_hits,
            traits: NumberTraits::of(peg_score),
            peg_score,
            peg_hits,
            ..Default::default()
        }
    }
}

/// `onNumberHit` transforms
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum NumberRule {
    Multiply(f64),
    Add(u64),
    /// Square values below the threshold
    SquareBelow(u64),
    /// Multiply values whose decimal form contains the digit
    ContainsDigit { digit: u8, factor: f64 },
    /// Multiply even (or odd) values
    Parity { even: bool, factor: f64 },
    /// Add the digit sum times the factor
    DigitSum(f64),
    Prime(f64),
    Fibonacci { factor: f64, bonus: u64 },
    /// Chance to square values above the threshold
    SquareChance { above: u64, chance: f64 },
    Special(f64),
    /// Chance to multiply
    Lucky { chance: f64, factor: f64 },
    /// Round to the nearest ten, then add a bonus fraction
    RoundToTen { bonus: f64 },
    /// Multiply by the current day (times the factor)
    DayScaled(f64),
    /// Grows with each consecutive hit of the flight
    Chain(f64),
    /// Chance to request a copy of the hit peg
    Duplicate { chance: f64 },
}

impl NumberRule {
    pub fn apply(&self, value: u64, ctx: &mut HitContext, rng: &mut GameRng) -> u64 {
        match *self {
            NumberRule::Multiply(f) => scale(value, f),
            NumberRule::Add(n) => value.saturating_add(n),
            NumberRule::SquareBelow(limit) => {
                if value < limit {
                    value.saturating_mul(value)
                } else {
                    value
                }
            }
            NumberRule::ContainsDigit { digit, factor } => {
                if contains_digit(value, digit) {
                    scale(value, factor)
                } else {
                    value
                }
            }
            NumberRule::Parity { even, factor } => {
                if (value % 2 == 0) == even {
                    scale(value, factor)
                } else {
                    value
                }
            }
            NumberRule::DigitSum(f) => value.saturating_add(scale(digit_sum(value), f)),
            NumberRule::Prime(f) => {
                if ctx.traits.prime {
                    scale(value, f)
                } else {
                    value
                }
            }
            NumberRule::Fibonacci { factor, bonus } => {
                if ctx.traits.fibonacci {
                    scale(value, factor).saturating_add(bonus)
                } else {
                    value
                }
            }
            NumberRule::SquareChance { above, chance } => {
                if value > above && rng.chance(chance) {
                    value.saturating_mul(value)
                } else {
                    value
                }
            }
            NumberRule::Special(f) => {
                if ctx.traits.special {
                    scale(value, f)
                } else {
                    value
                }
            }
            NumberRule::Lucky { chance, factor } => {
                if rng.chance(chance) {
                    scale(value, factor)
                } else {
                    value
                }
            }
            NumberRule::RoundToTen { bonus } => {
                let rounded = (value.saturating_add(5) / 10).saturating_mul(10);
                scale(rounded, 1.0 + bonus)
            }
            NumberRule::DayScaled(f) => scale(value, f64::from(ctx.day.max(1)) * f),
            NumberRule::Chain(f) => {
                let links = ctx.consecutive_hits.saturating_sub(1).min(MAX_CHAIN);
                scale(value, f.powi(links as i32))
            }
            NumberRule::Duplicate { chance } => {
                if rng.chance(chance) {
                    ctx.duplicate = true;
                }
                value
            }
        }
    }
}

/// `onPegHit` transforms; the value is what the peg keeps
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PegRule {
    /// Pegs keep their full value for their first N hits
    Retain(u32),
    /// Pegs lose this percentage less per hit
    SlowDecay(f64),
    /// Percentage chance the peg shatters and pays out in full
    Shatter(f64),
}

impl PegRule {
    pub fn apply(&self, value: u64, ctx: &mut HitContext, rng: &mut GameRng) -> u64 {
        match *self {
            PegRule::Retain(hits) => {
                if ctx.peg_hits < hits {
                    ctx.retained = true;
                    ctx.peg_score
                } else {
                    value
                }
            }
            PegRule::SlowDecay(percent) => {
                let lost = ctx.peg_score.saturating_sub(value);
                if lost == 0 {
                    return value;
                }
                let lost = scale(lost, 1.0 - percent / 100.0);
                ctx.peg_score - lost
            }
            PegRule::Shatter(percent) => {
                if rng.chance(percent / 100.0) {
                    ctx.shattered = true;
                }
                value
            }
        }
    }
}

/// `onLaunch` transforms
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum LaunchRule {
    Scale(f32),
}

impl LaunchRule {
    pub fn apply(&self, vel: Vec2) -> Vec2 {
        match *self {
            LaunchRule::Scale(f) => vel * f,
        }
    }
}

/// `onRun` multipliers, driven by consecutive hits in one flight
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum RunRule {
    /// `1 + hits * per_hit`
    Consecutive(f64),
    /// `1 + min(hits * per_hit, cap)`
    Combo { per_hit: f64, cap: f64 },
}

impl RunRule {
    pub fn multiplier(&self, consecutive_hits: u32) -> f64 {
        let hits = f64::from(consecutive_hits);
        match *self {
            RunRule::Consecutive(per_hit) => 1.0 + hits * per_hit,
            RunRule::Combo { per_hit, cap } => 1.0 + (hits * per_hit).min(cap),
        }
    }
}

/// `onUpdate` behaviour, run once per tick in flight
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum UpdateRule {
    /// Special pegs pull Numby toward them
    Attract(f32),
}

impl UpdateRule {
    pub fn apply(&self, character: &mut Character, pegs: &[Peg]) {
        match *self {
            UpdateRule::Attract(strength) => {
                for peg in pegs.iter().filter(|p| p.score >= SPECIAL_PEG_SCORE) {
                    if character.pos.distance(peg.pos) < ATTRACT_RADIUS {
                        character.nudge_toward(peg.pos, strength * ATTRACT_ACCEL);
                    }
                }
            }
        }
    }
}

/// Global score multiplier for a number of number hits
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TemporaryEffect {
    pub multiplier: f64,
    pub remaining: u32,
}

/// `onDayStart` behaviour
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum DayStartRule {
    TempMultiplier { factor: f64, hits: u32 },
}

impl DayStartRule {
    pub fn apply(&self) -> TemporaryEffect {
        match *self {
            DayStartRule::TempMultiplier { factor, hits } => TemporaryEffect {
                multiplier: factor,
                remaining: hits,
            },
        }
    }
}

/// An effect and the trigger it fires on
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Effect {
    NumberHit(NumberRule),
    PegHit(PegRule),
    CharacterInit(CharacterTweak),
    Launch(LaunchRule),
    Run(RunRule),
    Update(UpdateRule),
    DayStart(DayStartRule),
}

impl Effect {
    /// Run a value transform if this effect fires on `event`
    pub fn transform(
        &self,
        event: ScoreEvent,
        value: u64,
        ctx: &mut HitContext,
        rng: &mut GameRng,
    ) -> u64 {
        match (self, event) {
            (Effect::NumberHit(rule), ScoreEvent::NumberHit) => rule.apply(value, ctx, rng),
            (Effect::PegHit(rule), ScoreEvent::PegHit) => rule.apply(value, ctx, rng),
            _ => value,
        }
    }
}
