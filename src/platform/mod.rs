//! Platform abstraction layer
//!
//! The simulation never talks to the outside world directly. Everything it
//! needs to show, play or remember goes through the collaborator traits below,
//! which [`crate::game::Game`] receives at construction.
//!
//! - Native builds and tests use [`Headless`], [`MemoryStore`] and [`MessageLog`]
//! - The browser build uses the implementations in the `web` submodule

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use glam::Vec2;
use serde::Serialize;

use crate::audio::SoundCue;
use crate::error::StoreError;
use crate::items::{ItemId, ItemOffer};
use crate::sim::{GamePhase, Peg};

#[cfg(target_arch = "wasm32")]
pub mod web;

/// Everything a renderer needs for one frame
#[derive(Debug, Clone, Copy, Serialize)]
pub struct FrameView<'a> {
    pub board_size: Vec2,
    pub character_pos: Vec2,
    pub character_radius: f32,
    pub pegs: &'a [Peg],
    pub phase: &'a GamePhase,
    pub day: u32,
    pub score: u64,
    pub quota: u64,
    pub lives: u8,
    pub max_lives: u8,
    pub time_ticks: u64,
}

/// One-off visual feedback
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VisualEffect {
    /// Floating number above a hit peg
    ScorePopup { pos: Vec2, value: u64 },
    PegBurst { pos: Vec2 },
    Merge { from: Vec2, to: Vec2 },
    SynergyFlash { name: String },
    UpgradeFlash { item: ItemId, level: u8 },
}

/// Wall-clock milliseconds since the Unix epoch; only used for record keeping
pub fn now_ms() -> f64 {
    #[cfg(target_arch = "wasm32")]
    {
        js_sys::Date::now()
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map_or(0.0, |d| d.as_secs_f64() * 1000.0)
    }
}

pub trait Renderer {
    fn render(&mut self, frame: &FrameView<'_>);
    fn effect(&mut self, effect: VisualEffect);
}

pub trait AudioNotifier {
    fn notify(&mut self, cue: SoundCue);
}

/// String key/value storage
pub trait PersistenceStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
}

pub trait MessageSink {
    fn add_message(&mut self, text: &str);
}

/// Shows the end-of-day offers; the pick comes back through
/// [`crate::game::Game::choose_reward`]
pub trait ShopPresenter {
    fn present(&mut self, offers: &[ItemOffer]);
}

/// Discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct Headless;

impl Renderer for Headless {
    fn render(&mut self, _frame: &FrameView<'_>) {}
    fn effect(&mut self, _effect: VisualEffect) {}
}

impl AudioNotifier for Headless {
    fn notify(&mut self, _cue: SoundCue) {}
}

impl MessageSink for Headless {
    fn add_message(&mut self, _text: &str) {}
}

impl ShopPresenter for Headless {
    fn present(&mut self, _offers: &[ItemOffer]) {}
}

/// In-memory store; clones share the same map
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Rc<RefCell<HashMap<String, String>>>,
    read_only: bool,
}

impl MemoryStore {
    /// A store that rejects every write (full quota, private browsing)
    pub fn read_only() -> Self {
        Self {
            read_only: true,
            ..Self::default()
        }
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl PersistenceStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        if self.read_only {
            return Err(StoreError::Write {
                key: key.to_string(),
                reason: "store is read-only".to_string(),
            });
        }
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Keeps messages for later inspection; clones share the log
#[derive(Debug, Clone, Default)]
pub struct MessageLog {
    lines: Rc<RefCell<Vec<String>>>,
}

impl MessageLog {
    pub fn messages(&self) -> Vec<String> {
        self.lines.borrow().clone()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines.borrow().iter().any(|l| l.contains(needle))
    }
}

impl MessageSink for MessageLog {
    fn add_message(&mut self, text: &str) {
        log::debug!("message: {text}");
        self.lines.borrow_mut().push(text.to_string());
    }
}

/// The full set of collaborators handed to [`crate::game::Game`]
pub struct Collaborators {
    pub renderer: Box<dyn Renderer>,
    pub audio: Box<dyn AudioNotifier>,
    pub store: Box<dyn PersistenceStore>,
    pub messages: Box<dyn MessageSink>,
    pub shop: Box<dyn ShopPresenter>,
}

impl Collaborators {
    /// No output at all, storage in memory
    pub fn headless() -> Self {
        Self {
            renderer: Box::new(Headless),
            audio: Box::new(Headless),
            store: Box::new(MemoryStore::default()),
            messages: Box::new(Headless),
            shop: Box::new(Headless),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_clones_share_entries() {
        let mut store = MemoryStore::default();
        let view = store.clone();
        store.set("a", "1").unwrap();
        assert_eq!(view.get("a").as_deref(), Some("1"));
        assert_eq!(view.len(), 1);
    }

    #[test]
    fn test_read_only_store_rejects_writes() {
        let mut store = MemoryStore::read_only();
        let err = store.set("a", "1").unwrap_err();
        assert!(matches!(err, StoreError::Write { .. }));
        assert!(store.is_empty());
    }

    #[test]
    fn test_message_log_records_in_order() {
        let log = MessageLog::default();
        let mut sink = log.clone();
        sink.add_message("first");
        sink.add_message("second");
        assert_eq!(log.messages(), vec!["first", "second"]);
        assert!(log.contains("sec"));
    }
}
