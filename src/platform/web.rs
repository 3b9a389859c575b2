//! Browser collaborators
//!
//! Storage goes to `window.localStorage`, messages to the console, and
//! frames, effects and shop offers are handed to JavaScript callbacks as JSON
//! so the page can draw them however it likes.

use js_sys::Function;
use serde::Serialize;
use wasm_bindgen::JsValue;
use web_sys::Storage;

use super::{FrameView, MessageSink, PersistenceStore, Renderer, ShopPresenter, VisualEffect};
use crate::error::StoreError;
use crate::items::ItemOffer;

/// `window.localStorage`, or nothing when the browser refuses it
pub struct LocalStorageStore {
    storage: Option<Storage>,
}

impl LocalStorageStore {
    pub fn new() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();
        if storage.is_none() {
            log::warn!("LocalStorage unavailable - progress will not be saved");
        }
        Self { storage }
    }
}

impl Default for LocalStorageStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PersistenceStore for LocalStorageStore {
    fn get(&self, key: &str) -> Option<String> {
        self.storage.as_ref()?.get_item(key).ok().flatten()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        let storage = self.storage.as_ref().ok_or(StoreError::Unavailable)?;
        storage.set_item(key, value).map_err(|e| StoreError::Write {
            key: key.to_string(),
            reason: format!("{e:?}"),
        })
    }
}

/// Player messages to the browser console
#[derive(Debug, Default)]
pub struct ConsoleMessages;

impl MessageSink for ConsoleMessages {
    fn add_message(&mut self, text: &str) {
        web_sys::console::log_1(&JsValue::from_str(text));
    }
}

fn call_json<T: Serialize + ?Sized>(callback: &Function, value: &T) {
    match serde_json::to_string(value) {
        Ok(json) => {
            if let Err(e) = callback.call1(&JsValue::NULL, &JsValue::from_str(&json)) {
                log::warn!("JS callback failed: {e:?}");
            }
        }
        Err(e) => log::warn!("Could not encode callback payload: {e}"),
    }
}

/// Forwards frames and effects to page-supplied functions
pub struct JsRenderer {
    on_frame: Function,
    on_effect: Function,
}

impl JsRenderer {
    pub fn new(on_frame: Function, on_effect: Function) -> Self {
        Self { on_frame, on_effect }
    }
}

impl Renderer for JsRenderer {
    fn render(&mut self, frame: &FrameView<'_>) {
        call_json(&self.on_frame, frame);
    }

    fn effect(&mut self, effect: VisualEffect) {
        call_json(&self.on_effect, &effect);
    }
}

/// Offers go to the page as `[{id, level, upgrade, name, icon, rarity, description}]`
pub struct JsShop {
    on_offers: Function,
}

#[derive(Serialize)]
struct OfferCard<'a> {
    #[serde(flatten)]
    offer: &'a ItemOffer,
    name: &'static str,
    icon: &'static str,
    rarity: &'static str,
    description: String,
}

impl JsShop {
    pub fn new(on_offers: Function) -> Self {
        Self { on_offers }
    }
}

impl ShopPresenter for JsShop {
    fn present(&mut self, offers: &[ItemOffer]) {
        let cards: Vec<OfferCard<'_>> = offers
            .iter()
            .map(|offer| {
                let def = offer.def();
                OfferCard {
                    offer,
                    name: def.name,
                    icon: def.icon,
                    rarity: def.rarity.as_str(),
                    description: offer.description(),
                }
            })
            .collect();
        call_json(&self.on_offers, &cards);
    }
}
