//! Static item definitions
//!
//! Definitions never change at runtime. An item's effect magnitude at a given
//! level is read from its five-entry upgrade table.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::effect::{
    DayStartRule, Effect, LaunchRule, NumberRule, PegRule, RunRule, UpdateRule,
};
use crate::consts::MAX_ITEM_LEVEL;
use crate::sim::character::CharacterTweak;

/// Item rarity tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rarity {
    Common,
    Rare,
    Legendary,
}

impl Rarity {
    pub const ALL: [Rarity; 3] = [Rarity::Common, Rarity::Rare, Rarity::Legendary];

    /// Chance of rolling this tier
    pub fn weight(self) -> f64 {
        match self {
            Rarity::Common => 0.80,
            Rarity::Rare => 0.15,
            Rarity::Legendary => 0.05,
        }
    }

    /// This tier and every tier below it, highest first
    pub fn cascade(self) -> &'static [Rarity] {
        match self {
            Rarity::Legendary => &[Rarity::Legendary, Rarity::Rare, Rarity::Common],
            Rarity::Rare => &[Rarity::Rare, Rarity::Common],
            Rarity::Common => &[Rarity::Common],
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Rarity::Common => "common",
            Rarity::Rare => "rare",
            Rarity::Legendary => "legendary",
        }
    }
}

/// Every item in the game; discriminants index [`CATALOG`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemId {
    Multiplier,
    Adder,
    BouncyNumby,
    PercentageBoost,
    GravityReducer,
    QuadMultiplier,
    LuckySeven,
    FrictionReducer,
    NodeMagnet,
    EvenDoubler,
    OddTripler,
    DigitAdder,
    PrimeSpecialist,
    PrimeDoubler,
    FibonacciFan,
    SpeedBooster,
    ValueSquarer,
    SpecialEnhancer,
    ConsecutiveBooster,
    DoubleChance,
    ValueRounder,
    DayMultiplier,
    MorningCoffee,
    PlatinumCalculator,
    SuperBouncer,
    MultiplierMagic,
    PegDestroyer,
    SpecialAttractor,
    NodeDuplicator,
    ComboMaster,
    DivineMultiplier,
    PegMaster,
    ScoreChain,
}

impl ItemId {
    pub fn def(self) -> &'static ItemDef {
        &CATALOG[self as usize]
    }

    pub fn name(self) -> &'static str {
        self.def().name
    }

    pub fn rarity(self) -> Rarity {
        self.def().rarity
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Static description of an item
#[derive(Debug)]
pub struct ItemDef {
    pub id: ItemId,
    pub name: &'static str,
    pub icon: &'static str,
    pub rarity: Rarity,
    /// Level 1 text
    pub description: &'static str,
    /// Text for upgrades; `{VALUE}` and `{VALUE2}` are filled from the tables
    pub upgrade_description: &'static str,
    pub upgrade_values: [f64; 5],
    pub secondary_values: Option<[f64; 5]>,
    pub synergies: &'static [ItemId],
}

impl ItemDef {
    fn index(level: u8) -> usize {
        usize::from(level.clamp(1, MAX_ITEM_LEVEL) - 1)
    }

    /// Upgrade table entry for `level` (clamped to 1..=5)
    pub fn value(&self, level: u8) -> f64 {
        self.upgrade_values[Self::index(level)]
    }

    pub fn secondary_value(&self, level: u8) -> Option<f64> {
        self.secondary_values.map(|table| table[Self::index(level)])
    }

    /// Player-facing description at `level`
    pub fn describe(&self, level: u8) -> String {
        if level <= 1 {
            return self.description.to_string();
        }
        let mut text = self
            .upgrade_description
            .replace("{VALUE}", &format_value(self.value(level)));
        if let Some(v2) = self.secondary_value(level) {
            text = text.replace("{VALUE2}", &format_value(v2));
        }
        text
    }

    /// Whether `other` is listed as a synergy partner in either direction
    pub fn synergizes_with(&self, other: ItemId) -> bool {
        self.id != other && (self.synergies.contains(&other) || other.def().synergies.contains(&self.id))
    }

    /// Materialize the primary and secondary effects for `level`
    pub fn effects(&self, level: u8) -> (Effect, Option<Effect>) {
        let v = self.value(level);
        let pct = v / 100.0;
        let primary = match self.id {
            ItemId::Multiplier => Effect::NumberHit(NumberRule::Multiply(v)),
            ItemId::Adder => Effect::NumberHit(NumberRule::Add(v as u64)),
            ItemId::BouncyNumby => Effect::CharacterInit(CharacterTweak::Bouncier {
                factor: 1.0 + pct as f32,
                bounce_boost: 1.0,
            }),
            ItemId::PercentageBoost => Effect::NumberHit(NumberRule::Multiply(1.0 + pct)),
            ItemId::GravityReducer => Effect::CharacterInit(CharacterTweak::Gravity(1.0 - pct as f32)),
            ItemId::QuadMultiplier => Effect::NumberHit(NumberRule::SquareBelow(v as u64)),
            ItemId::LuckySeven => Effect::NumberHit(NumberRule::ContainsDigit { digit: 7, factor: v }),
            ItemId::FrictionReducer => Effect::CharacterInit(CharacterTweak::LessDrag(pct as f32)),
            ItemId::NodeMagnet => Effect::CharacterInit(CharacterTweak::Reach(1.0 + pct as f32)),
            ItemId::EvenDoubler => Effect::NumberHit(NumberRule::Parity {
                even: true,
                factor: v,
            }),
            ItemId::OddTripler => Effect::NumberHit(NumberRule::Parity {
                even: false,
                factor: v,
            }),
            ItemId::DigitAdder => Effect::NumberHit(NumberRule::DigitSum(v)),
            ItemId::PrimeSpecialist => Effect::NumberHit(NumberRule::Prime(v)),
            ItemId::PrimeDoubler => Effect::NumberHit(NumberRule::Add(v as u64)),
            ItemId::FibonacciFan => Effect::NumberHit(NumberRule::Fibonacci { factor: v, bonus: 5 }),
            ItemId::SpeedBooster => Effect::Launch(LaunchRule::Scale(1.0 + pct as f32)),
            ItemId::ValueSquarer => Effect::NumberHit(NumberRule::SquareChance {
                above: 50,
                chance: pct,
            }),
            ItemId::SpecialEnhancer => Effect::NumberHit(NumberRule::Special(1.0 + pct)),
            ItemId::ConsecutiveBooster => Effect::Run(RunRule::Consecutive(pct)),
            ItemId::DoubleChance => Effect::NumberHit(NumberRule::Lucky {
                chance: pct,
                factor: 2.0,
            }),
            ItemId::ValueRounder => Effect::NumberHit(NumberRule::RoundToTen { bonus: pct }),
            ItemId::DayMultiplier => Effect::NumberHit(NumberRule::DayScaled(v)),
            ItemId::MorningCoffee => Effect::DayStart(DayStartRule::TempMultiplier {
                factor: v,
                hits: 5,
            }),
            ItemId::PlatinumCalculator => Effect::NumberHit(NumberRule::Multiply(1.0 + pct)),
            ItemId::SuperBouncer => Effect::CharacterInit(CharacterTweak::Bouncier {
                factor: 1.0 + pct as f32,
                bounce_boost: 1.2,
            }),
            ItemId::MultiplierMagic => Effect::NumberHit(NumberRule::Multiply(v)),
            ItemId::PegDestroyer => Effect::PegHit(PegRule::Shatter(v)),
            ItemId::SpecialAttractor => Effect::Update(UpdateRule::Attract(v as f32)),
            ItemId::NodeDuplicator => Effect::NumberHit(NumberRule::Duplicate { chance: pct }),
            ItemId::ComboMaster => Effect::Run(RunRule::Combo {
                per_hit: pct,
                cap: 1.0,
            }),
            ItemId::DivineMultiplier => Effect::NumberHit(NumberRule::Multiply(v)),
            ItemId::PegMaster => Effect::PegHit(PegRule::Retain(v as u32)),
            ItemId::ScoreChain => Effect::NumberHit(NumberRule::Chain(v)),
        };

        let secondary = match self.id {
            ItemId::DivineMultiplier => self
                .secondary_value(level)
                .map(|slow| Effect::PegHit(PegRule::SlowDecay(slow))),
            _ => None,
        };

        (primary, secondary)
    }
}

fn format_value(v: f64) -> String {
    if v.fract() == 0.0 {
        format!("{}", v as i64)
    } else {
        format!("{v}")
    }
}

macro_rules! item {
    ($id:ident, $name:literal, $icon:literal, $rarity:ident, $desc:literal, $up:literal, $values:expr) => {
        item!($id, $name, $icon, $rarity, $desc, $up, $values, None, &[])
    };
    ($id:ident, $name:literal, $icon:literal, $rarity:ident, $desc:literal, $up:literal, $values:expr, $syn:expr) => {
        item!($id, $name, $icon, $rarity, $desc, $up, $values, None, $syn)
    };
    ($id:ident, $name:literal, $icon:literal, $rarity:ident, $desc:literal, $up:literal, $values:expr, $second:expr, $syn:expr) => {
        ItemDef {
            id: ItemId::$id,
            name: $name,
            icon: $icon,
            rarity: Rarity::$rarity,
            description: $desc,
            upgrade_description: $up,
            upgrade_values: $values,
            secondary_values: $second,
            synergies: $syn,
        }
    };
}

/// All items, in [`ItemId`] order
pub static CATALOG: [ItemDef; 33] = [
    item!(Multiplier, "Number Multiplier", "×2", Common,
        "Doubles the value of all number nodes.",
        "Multiplies all number values by {VALUE}.",
        [2.0, 2.5, 3.0, 3.5, 4.0]),
    item!(Adder, "Number Adder", "+5", Common,
        "Adds 5 to all number values.",
        "Adds {VALUE} to all number values.",
        [5.0, 8.0, 12.0, 16.0, 20.0]),
    item!(BouncyNumby, "Bouncy Numby", "↑↓", Common,
        "Increases Numby's bounciness by 20%.",
        "Increases Numby's bounciness by {VALUE}%.",
        [20.0, 25.0, 30.0, 35.0, 40.0]),
    item!(PercentageBoost, "Percentage Booster", "%↑", Common,
        "Adds 15% to each number value.",
        "Adds {VALUE}% to each number value.",
        [15.0, 20.0, 25.0, 30.0, 40.0]),
    item!(GravityReducer, "Gravity Reducer", "⬇️-", Common,
        "Reduces gravity by 25%, making Numby float longer.",
        "Reduces gravity by {VALUE}%, making Numby float longer.",
        [25.0, 30.0, 35.0, 40.0, 45.0]),
    item!(QuadMultiplier, "Quadratic Multiplier", "x²", Common,
        "Squares numbers less than 10.",
        "Squares numbers less than {VALUE}.",
        [10.0, 12.0, 15.0, 18.0, 20.0]),
    item!(LuckySeven, "Lucky Seven", "7✨", Common,
        "Any number containing 7 is multiplied by 7.",
        "Any number containing 7 is multiplied by {VALUE}.",
        [7.0, 8.0, 9.0, 10.0, 12.0]),
    item!(FrictionReducer, "Friction Reducer", "→→", Common,
        "Reduces friction by 20%, making Numby slide further.",
        "Reduces friction by {VALUE}%, making Numby slide further.",
        [20.0, 30.0, 40.0, 50.0, 60.0]),
    item!(NodeMagnet, "Node Magnet", "🧲", Common,
        "Increases the collision radius with number nodes by 20%.",
        "Increases the collision radius with number nodes by {VALUE}%.",
        [20.0, 25.0, 30.0, 35.0, 40.0]),
    item!(EvenDoubler, "Even Number Doubler", "2×", Common,
        "Doubles the value of even numbers.",
        "Multiplies even numbers by {VALUE}.",
        [2.0, 2.5, 3.0, 3.5, 4.0]),
    item!(OddTripler, "Odd Number Tripler", "3×", Common,
        "Triples the value of odd numbers.",
        "Multiplies odd numbers by {VALUE}.",
        [3.0, 3.5, 4.0, 4.5, 5.0]),
    item!(DigitAdder, "Digit Adder", "+#", Common,
        "Adds the sum of digits to the number value.",
        "Adds {VALUE}× the sum of digits to the number value.",
        [1.0, 2.0, 3.0, 4.0, 5.0]),
    item!(PrimeSpecialist, "Prime Specialist", "P×", Common,
        "Triples the value of prime number nodes.",
        "Multiplies prime number nodes by {VALUE}.",
        [3.0, 3.5, 4.0, 4.5, 5.0],
        &[ItemId::PrimeDoubler, ItemId::OddTripler]),
    item!(PrimeDoubler, "Prime Doubler", "P+", Common,
        "Adds a prime number to all values.",
        "Adds {VALUE} to all values.",
        [7.0, 11.0, 13.0, 17.0, 19.0],
        &[ItemId::PrimeSpecialist]),
    item!(FibonacciFan, "Fibonacci Fan", "F+", Common,
        "Doubles fibonacci numbers and adds 5.",
        "Multiplies fibonacci numbers by {VALUE} and adds 5.",
        [2.0, 2.5, 3.0, 3.5, 4.0],
        &[ItemId::DigitAdder]),
    item!(SpeedBooster, "Speed Booster", "🚀", Common,
        "Increases Numby's initial speed by 25%.",
        "Increases Numby's initial speed by {VALUE}%.",
        [25.0, 30.0, 35.0, 40.0, 50.0],
        &[ItemId::FrictionReducer]),
    item!(ValueSquarer, "Value Squarer", "²", Common,
        "Numbers over 50 have a 10% chance to be squared.",
        "Numbers over 50 have a {VALUE}% chance to be squared.",
        [10.0, 12.0, 15.0, 18.0, 20.0],
        &[ItemId::QuadMultiplier]),
    item!(SpecialEnhancer, "Special Enhancer", "✨+", Common,
        "Special nodes have 50% more value.",
        "Special nodes have {VALUE}% more value.",
        [50.0, 60.0, 75.0, 90.0, 100.0]),
    item!(ConsecutiveBooster, "Consecutive Booster", "⏩", Common,
        "Each consecutive node hit without exiting gives +10% value.",
        "Each consecutive node hit without exiting gives +{VALUE}% value.",
        [10.0, 12.0, 15.0, 18.0, 20.0],
        &[ItemId::ComboMaster]),
    item!(DoubleChance, "Double Chance", "🎲", Common,
        "20% chance to double any number.",
        "{VALUE}% chance to double any number.",
        [20.0, 25.0, 30.0, 35.0, 40.0]),
    item!(ValueRounder, "Value Rounder", "⚪", Common,
        "Rounds numbers to nearest 10, then adds 10%.",
        "Rounds numbers to nearest 10, then adds {VALUE}%.",
        [10.0, 15.0, 20.0, 25.0, 30.0]),
    item!(DayMultiplier, "Day Multiplier", "📆", Common,
        "Multiplies numbers by your current day.",
        "Multiplies numbers by {VALUE}× your current day.",
        [1.0, 1.25, 1.5, 1.75, 2.0],
        &[ItemId::PercentageBoost]),
    item!(MorningCoffee, "Morning Coffee", "☕", Common,
        "The first 5 numbers each day are worth 1.5×.",
        "The first 5 numbers each day are worth {VALUE}×.",
        [1.5, 1.75, 2.0, 2.25, 2.5],
        &[ItemId::DayMultiplier]),
    item!(PlatinumCalculator, "Platinum Calculator", "📱", Rare,
        "Increases number values by 30%",
        "Increases number values by {VALUE}%",
        [30.0, 40.0, 50.0, 60.0, 75.0]),
    item!(SuperBouncer, "Super Bouncer", "🔄", Rare,
        "Increases elasticity by 20% and adds velocity on bounce",
        "Increases elasticity by {VALUE}% and adds velocity on bounce",
        [20.0, 25.0, 30.0, 35.0, 40.0]),
    item!(MultiplierMagic, "Multiplier Magic", "✖️", Rare,
        "Multiplies all number values by 1.5",
        "Multiplies all number values by {VALUE}",
        [1.5, 1.65, 1.8, 1.95, 2.1]),
    item!(PegDestroyer, "Peg Destroyer", "💥", Rare,
        "Pegs have 20% chance to be destroyed with full value",
        "Pegs have {VALUE}% chance to be destroyed with full value",
        [20.0, 30.0, 40.0, 50.0, 60.0]),
    item!(SpecialAttractor, "Special Attractor", "🌠", Rare,
        "Numby is drawn toward special nodes",
        "Numby is drawn toward special nodes with {VALUE}× strength",
        [1.0, 1.5, 2.0, 2.5, 3.0]),
    item!(NodeDuplicator, "Node Duplicator", "🧬", Rare,
        "10% chance to create duplicate node on hit",
        "{VALUE}% chance to create duplicate node on hit",
        [10.0, 15.0, 20.0, 25.0, 30.0]),
    item!(ComboMaster, "Combo Master", "🔥", Rare,
        "Each consecutive hit gives +5% points, stacking up to 100%",
        "Each consecutive hit gives +{VALUE}% points, stacking up to 100%",
        [5.0, 7.0, 10.0, 12.0, 15.0]),
    item!(DivineMultiplier, "Divine Multiplier", "🌟", Legendary,
        "All node values are doubled, and pegs lose value 25% more slowly",
        "All values {VALUE}×, pegs lose value {VALUE2}% more slowly",
        [2.0, 2.5, 3.0, 3.5, 4.0],
        Some([25.0, 30.0, 35.0, 40.0, 45.0]),
        &[]),
    item!(PegMaster, "Peg Master", "👑", Legendary,
        "Pegs retain full value on first hit, then follow normal halving",
        "Pegs retain full value for {VALUE} hits",
        [1.0, 2.0, 2.0, 3.0, 3.0]),
    item!(ScoreChain, "Score Chain", "⚡", Legendary,
        "Each consecutive peg hit doubles its bonus value",
        "Each consecutive hit multiplies bonus by {VALUE}",
        [2.0, 2.5, 3.0, 3.5, 4.0]),
];

/// Items of one tier, in catalog order
pub fn items_of(rarity: Rarity) -> impl Iterator<Item = ItemId> {
    CATALOG.iter().filter(move |d| d.rarity == rarity).map(|d| d.id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_is_indexed_by_id() {
        for (i, def) in CATALOG.iter().enumerate() {
            assert_eq!(def.id as usize, i, "{} out of place", def.name);
            assert_eq!(def.id.def().id, def.id);
        }
    }

    #[test]
    fn test_tier_sizes() {
        assert_eq!(items_of(Rarity::Common).count(), 23);
        assert_eq!(items_of(Rarity::Rare).count(), 7);
        assert_eq!(items_of(Rarity::Legendary).count(), 3);
        let total: f64 = Rarity::ALL.iter().map(|r| r.weight()).sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_upgrade_tables_never_weaken() {
        for def in CATALOG.iter() {
            for pair in def.upgrade_values.windows(2) {
                assert!(pair[1] >= pair[0], "{} weakens on upgrade", def.name);
            }
        }
    }

    #[test]
    fn test_describe_fills_values() {
        let def = ItemId::DivineMultiplier.def();
        assert_eq!(def.describe(3), "All values 3×, pegs lose value 35% more slowly");
        let def = ItemId::MultiplierMagic.def();
        assert_eq!(def.describe(2), "Multiplies all number values by 1.65");
        assert_eq!(def.describe(1), def.description);
    }

    #[test]
    fn test_synergies_are_symmetric() {
        let a = ItemId::PrimeSpecialist.def();
        assert!(a.synergizes_with(ItemId::PrimeDoubler));
        assert!(ItemId::OddTripler.def().synergizes_with(ItemId::PrimeSpecialist));
        assert!(!a.synergizes_with(ItemId::PrimeSpecialist));
        assert!(!a.synergizes_with(ItemId::Adder));
    }

    #[test]
    fn test_effects_scale_with_level() {
        let def = ItemId::PlatinumCalculator.def();
        let factor = |level| match def.effects(level).0 {
            Effect::NumberHit(NumberRule::Multiply(f)) => f,
            other => panic!("unexpected effect {other:?}"),
        };
        assert!((factor(1) - 1.3).abs() < 1e-9);
        assert!((factor(5) - 1.75).abs() < 1e-9);
        let (_, secondary) = ItemId::DivineMultiplier.def().effects(2);
        assert_eq!(secondary, Some(Effect::PegHit(PegRule::SlowDecay(30.0))));
        assert!(ItemId::Multiplier.def().effects(1).1.is_none());
    }
}
