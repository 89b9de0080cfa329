//! JavaScript binding for the engine (wasm32 only)
//!
//! The page owns rendering, input gestures and sound; it drives this wrapper
//! from its animation frame and reads state back as JSON.

use wasm_bindgen::prelude::*;

use crate::engine::Engine;
use crate::persistence::KeyValueStore;
use crate::progress::reset_progress;
use crate::settings::Settings;
use crate::sim::Direction;

use super::FrameClock;

#[wasm_bindgen(start)]
pub fn wasm_start() {
    console_error_panic_hook::set_once();
    let settings = Settings::load(&super::default_store());
    let level = settings.log_level().to_level().unwrap_or(log::Level::Info);
    if console_log::init_with_level(level).is_err() {
        web_sys::console::warn_1(&"Logger already initialized".into());
    }
    log::info!("Swipe Nexus engine loaded (log level {})", level);
}

#[wasm_bindgen]
pub struct WebGame {
    engine: Engine<Box<dyn KeyValueStore>>,
    clock: FrameClock,
}

#[wasm_bindgen]
impl WebGame {
    #[wasm_bindgen(constructor)]
    pub fn new() -> WebGame {
        let seed = (js_sys::Date::now() as u64) ^ ((js_sys::Math::random() * u32::MAX as f64) as u64);
        WebGame {
            engine: Engine::with_seed(super::default_store(), seed),
            clock: FrameClock::default(),
        }
    }

    pub fn select_level(&mut self, level_id: u32) -> Result<(), JsValue> {
        self.engine
            .select_level(level_id)
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    pub fn level_unlocked(&self, level_id: u32) -> bool {
        self.engine.level_progress().is_unlocked(level_id)
    }

    pub fn start(&mut self) -> Result<(), JsValue> {
        self.clock.reset();
        self.engine
            .start_session()
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    pub fn end(&mut self) -> bool {
        self.engine.end_session()
    }

    pub fn toggle_pause(&mut self) -> bool {
        self.engine.toggle_pause()
    }

    /// Accepts "up"/"down"/"left"/"right" and arrow/WASD key names
    pub fn move_player(&mut self, direction: &str) -> bool {
        match direction.parse::<Direction>() {
            Ok(dir) => self.engine.move_player(dir),
            Err(e) => {
                log::debug!("{}", e);
                false
            }
        }
    }

    /// Feed a requestAnimationFrame timestamp
    pub fn frame(&mut self, timestamp_ms: f64) {
        let elapsed = self.clock.elapsed(timestamp_ms);
        self.engine.advance(elapsed);
    }

    pub fn snapshot_json(&self) -> String {
        serde_json::to_string(&self.engine.snapshot()).unwrap_or_default()
    }

    /// Events since the previous call, as a JSON array
    pub fn events_json(&mut self) -> String {
        serde_json::to_string(&self.engine.drain_events()).unwrap_or_default()
    }

    pub fn settings_json(&self) -> String {
        serde_json::to_string(&Settings::load(self.engine.store())).unwrap_or_default()
    }

    pub fn save_settings_json(&mut self, json: &str) -> Result<(), JsValue> {
        let settings: Settings =
            serde_json::from_str(json).map_err(|e| JsValue::from_str(&e.to_string()))?;
        settings.save(self.engine.store_mut());
        log::set_max_level(settings.log_level());
        Ok(())
    }

    pub fn reset_progress(&mut self) -> Result<(), JsValue> {
        reset_progress(self.engine.store_mut()).map_err(|e| JsValue::from_str(&e.to_string()))
    }
}

impl Default for WebGame {
    fn default() -> Self {
        Self::new()
    }
}
