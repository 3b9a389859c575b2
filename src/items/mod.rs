//! Items, synergies and the score-effect pipeline
//!
//! The [`ItemSystem`] owns the player's inventory (an ordered list of owned
//! items) and the synergies discovered this run. Value transforms run in a
//! fixed order: primary effects in inventory order, then secondary effects,
//! then every synergy, then temporary global multipliers.

pub mod catalog;
pub mod effect;

use glam::Vec2;
use serde::{Deserialize, Serialize};

pub use catalog::{CATALOG, ItemDef, ItemId, Rarity};
pub use effect::{Effect, HitContext, NumberTraits, ScoreEvent, TemporaryEffect};

use crate::consts::{MAX_ITEM_LEVEL, SYNERGY_MULTIPLIER};
use crate::rng::GameRng;
use crate::sim::board::Peg;
use crate::sim::character::Character;

/// Chance that a rarity roll upgrades an owned item instead of offering a new one
pub const UPGRADE_CHANCE: f64 = 0.4;
/// Chance that a shop leads with an upgrade
pub const SHOP_UPGRADE_CHANCE: f64 = 0.7;
/// Random draws per shop slot before giving up on distinct offers
const SHOP_ATTEMPTS_PER_SLOT: usize = 20;

/// An item in the inventory with its effects materialized for its level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OwnedItem {
    pub id: ItemId,
    pub level: u8,
    pub effect: Effect,
    pub secondary: Option<Effect>,
}

impl OwnedItem {
    pub fn new(id: ItemId, level: u8) -> Self {
        let level = level.clamp(1, MAX_ITEM_LEVEL);
        let (effect, secondary) = id.def().effects(level);
        Self {
            id,
            level,
            effect,
            secondary,
        }
    }

    pub fn def(&self) -> &'static ItemDef {
        self.id.def()
    }

    pub fn is_maxed(&self) -> bool {
        self.level >= MAX_ITEM_LEVEL
    }

    /// The same item one level up (a fresh instance)
    pub fn upgraded(&self) -> Self {
        Self::new(self.id, self.level.saturating_add(1))
    }
}

/// Something the shop can hand out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemOffer {
    pub id: ItemId,
    /// Level the item will have once taken
    pub level: u8,
    pub upgrade: bool,
}

impl ItemOffer {
    pub fn new_item(id: ItemId) -> Self {
        Self {
            id,
            level: 1,
            upgrade: false,
        }
    }

    pub fn upgrade_of(item: &OwnedItem) -> Self {
        Self {
            id: item.id,
            level: (item.level + 1).min(MAX_ITEM_LEVEL),
            upgrade: true,
        }
    }

    pub fn def(&self) -> &'static ItemDef {
        self.id.def()
    }

    pub fn description(&self) -> String {
        self.def().describe(self.level)
    }
}

/// Persistent multiplier for owning two complementary items
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Synergy {
    pub items: (ItemId, ItemId),
    pub multiplier: f64,
}

impl Synergy {
    fn new(a: ItemId, b: ItemId) -> Self {
        // Normalized so (a, b) and (b, a) compare equal
        let items = if a <= b { (a, b) } else { (b, a) };
        Self {
            items,
            multiplier: SYNERGY_MULTIPLIER,
        }
    }

    pub fn involves(&self, a: ItemId, b: ItemId) -> bool {
        self.items == (a, b) || self.items == (b, a)
    }

    pub fn name(&self) -> String {
        format!("{} + {}", self.items.0.name(), self.items.1.name())
    }
}

/// Result of taking an offer
#[derive(Debug, Clone, PartialEq)]
pub enum ItemAdded {
    New { id: ItemId, synergies: Vec<Synergy> },
    Upgraded { id: ItemId, level: u8 },
    /// Already at the top level; nothing changed
    Maxed { id: ItemId },
}

#[derive(Debug, Clone, Default)]
pub struct ItemSystem {
    items: Vec<OwnedItem>,
    synergies: Vec<Synergy>,
}

impl ItemSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inventory in acquisition order
    pub fn items(&self) -> &[OwnedItem] {
        &self.items
    }

    pub fn synergies(&self) -> &[Synergy] {
        &self.synergies
    }

    pub fn owned(&self, id: ItemId) -> Option<&OwnedItem> {
        self.items.iter().find(|i| i.id == id)
    }

    pub fn reset_items(&mut self) {
        self.items.clear();
        self.synergies.clear();
    }

    /// Take an offer: upgrade the owned instance in place, or append a new item
    pub fn add_item(&mut self, offer: ItemOffer) -> ItemAdded {
        if let Some(slot) = self.items.iter_mut().find(|i| i.id == offer.id) {
            if slot.is_maxed() {
                log::debug!("{} is already at level {}", offer.id, slot.level);
                return ItemAdded::Maxed { id: offer.id };
            }
            *slot = slot.upgraded();
            log::info!("Upgraded {} to level {}", offer.id, slot.level);
            return ItemAdded::Upgraded {
                id: offer.id,
                level: slot.level,
            };
        }

        self.items.push(OwnedItem::new(offer.id, offer.level));
        log::info!("Added item {}", offer.id);
        let synergies = self.check_for_synergies(offer.id);
        ItemAdded::New {
            id: offer.id,
            synergies,
        }
    }

    /// Record a synergy for every owned partner of `new`; returns the new ones
    fn check_for_synergies(&mut self, new: ItemId) -> Vec<Synergy> {
        if self.owned(new).is_none() {
            return Vec::new();
        }
        let partners: Vec<ItemId> = self
            .items
            .iter()
            .map(|i| i.id)
            .filter(|&id| new.def().synergizes_with(id))
            .collect();

        let mut found = Vec::new();
        for partner in partners {
            if self.synergies.iter().any(|s| s.involves(new, partner)) {
                continue;
            }
            let synergy = Synergy::new(new, partner);
            log::info!("Synergy discovered: {}", synergy.name());
            self.synergies.push(synergy.clone());
            found.push(synergy);
        }
        found
    }

    /// Fold a value through the pipeline
    ///
    /// Temporary multipliers only apply to number hits; each application uses
    /// up one charge and spent effects are dropped.
    pub fn apply_item_effects(
        &self,
        event: ScoreEvent,
        value: u64,
        ctx: &mut HitContext,
        temporaries: &mut Vec<TemporaryEffect>,
        rng: &mut GameRng,
    ) -> u64 {
        let mut result = value;

        for item in &self.items {
            result = item.effect.transform(event, result, ctx, rng);
        }
        for item in &self.items {
            if let Some(secondary) = &item.secondary {
                result = secondary.transform(event, result, ctx, rng);
            }
        }
        for synergy in &self.synergies {
            result = effect::scale(result, synergy.multiplier);
        }

        if event == ScoreEvent::NumberHit {
            temporaries.retain_mut(|temp| {
                if temp.remaining == 0 {
                    return false;
                }
                result = effect::scale(result, temp.multiplier);
                temp.remaining -= 1;
                temp.remaining > 0
            });
        }

        result
    }

    /// `onCharacterInit` tweaks, in inventory order
    pub fn apply_character_init(&self, character: &mut Character) {
        for item in &self.items {
            if let Effect::CharacterInit(tweak) = item.effect {
                character.apply_tweak(tweak);
            }
        }
    }

    /// `onLaunch` transforms of the launch velocity
    pub fn apply_launch(&self, vel: Vec2) -> Vec2 {
        self.items.iter().fold(vel, |vel, item| match item.effect {
            Effect::Launch(rule) => rule.apply(vel),
            _ => vel,
        })
    }

    /// Product of every `onRun` multiplier (1.0 with none owned)
    pub fn run_multiplier(&self, consecutive_hits: u32) -> f64 {
        self.items
            .iter()
            .filter_map(|item| match item.effect {
                Effect::Run(rule) => Some(rule.multiplier(consecutive_hits)),
                _ => None,
            })
            .product()
    }

    /// `onUpdate` behaviour for one tick in flight
    pub fn apply_update(&self, character: &mut Character, pegs: &[Peg]) {
        for item in &self.items {
            if let Effect::Update(rule) = item.effect {
                rule.apply(character, pegs);
            }
        }
    }

    /// `onDayStart` effects; returns the temporary effects they grant
    pub fn apply_day_start(&self) -> Vec<TemporaryEffect> {
        self.items
            .iter()
            .filter_map(|item| match item.effect {
                Effect::DayStart(rule) => Some(rule.apply()),
                _ => None,
            })
            .collect()
    }

    fn upgradeable(&self, rarity: Option<Rarity>) -> Vec<&OwnedItem> {
        self.items
            .iter()
            .filter(|i| !i.is_maxed() && rarity.is_none_or(|r| i.id.rarity() == r))
            .collect()
    }

    fn roll_rarity(rng: &mut GameRng) -> Rarity {
        let roll = rng.unit();
        if roll < Rarity::Legendary.weight() {
            Rarity::Legendary
        } else if roll < Rarity::Legendary.weight() + Rarity::Rare.weight() {
            Rarity::Rare
        } else {
            Rarity::Common
        }
    }

    /// Roll one offer
    ///
    /// The rolled tier cascades down (legendary, rare, common) until a tier
    /// has something to give. `None` only when every item is owned and maxed.
    pub fn generate_random_item(&self, rng: &mut GameRng) -> Option<ItemOffer> {
        let rolled = Self::roll_rarity(rng);

        for &tier in rolled.cascade() {
            let upgradeable = self.upgradeable(Some(tier));
            if !upgradeable.is_empty() && rng.chance(UPGRADE_CHANCE) {
                return rng.pick(&upgradeable).map(|i| ItemOffer::upgrade_of(i));
            }

            let unowned: Vec<ItemId> = catalog::items_of(tier)
                .filter(|&id| self.owned(id).is_none())
                .collect();
            if let Some(&id) = rng.pick(&unowned) {
                return Some(ItemOffer::new_item(id));
            }

            if let Some(item) = rng.pick(&upgradeable) {
                return Some(ItemOffer::upgrade_of(item));
            }
        }

        let upgradeable = self.upgradeable(None);
        rng.pick(&upgradeable).map(|i| ItemOffer::upgrade_of(i))
    }

    /// Up to `count` offers with distinct items
    pub fn generate_shop_items(&self, count: usize, rng: &mut GameRng) -> Vec<ItemOffer> {
        let mut offers: Vec<ItemOffer> = Vec::with_capacity(count);

        let upgradeable = self.upgradeable(None);
        if count > 0 && !upgradeable.is_empty() && rng.chance(SHOP_UPGRADE_CHANCE) {
            if let Some(item) = rng.pick(&upgradeable) {
                offers.push(ItemOffer::upgrade_of(item));
            }
        }

        let mut attempts = count * SHOP_ATTEMPTS_PER_SLOT;
        while offers.len() < count && attempts > 0 {
            attempts -= 1;
            let Some(offer) = self.generate_random_item(rng) else {
                break;
            };
            if offers.iter().all(|o| o.id != offer.id) {
                offers.push(offer);
            }
        }

        if offers.len() < count {
            log::debug!("Shop filled {} of {} slots", offers.len(), count);
        }
        offers
    }
}
