//! Player settings and preferences
//!
//! Persisted separately from progress through the key-value store. Missing
//! fields in stored JSON fall back to their defaults so older saves keep
//! loading.

use serde::{Deserialize, Serialize};

use crate::persistence::{KeyValueStore, load_json, save_json};

/// Player preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Feedback ===
    /// Haptic pulse on pickups and game over
    pub vibration_enabled: bool,

    // === Visuals ===
    /// Skip decorative effects on slow devices
    pub high_performance_mode: bool,
    /// Show grid coordinates and tick timing
    pub debug_mode: bool,

    // === Audio ===
    /// Master volume (0.0 - 1.0)
    pub volume: f32,
    pub muted: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            vibration_enabled: true,
            high_performance_mode: false,
            debug_mode: false,
            volume: 0.7,
            muted: false,
        }
    }
}

impl Settings {
    const STORAGE_NAME: &'static str = "settings";

    /// Volume actually applied to playback (respects mute)
    pub fn effective_volume(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.volume.clamp(0.0, 1.0)
        }
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.volume = if volume.is_finite() {
            volume.clamp(0.0, 1.0)
        } else {
            0.0
        };
    }

    /// Log filter implied by the debug toggle
    pub fn log_level(&self) -> log::LevelFilter {
        if self.debug_mode {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        }
    }

    pub fn load<S: KeyValueStore + ?Sized>(store: &S) -> Self {
        match load_json::<Self, S>(store, Self::STORAGE_NAME) {
            Ok(Some(settings)) => {
                log::info!("Loaded settings");
                settings
            }
            Ok(None) => {
                log::info!("Using default settings");
                Self::default()
            }
            Err(e) => {
                log::warn!("Settings unreadable, using defaults: {}", e);
                Self::default()
            }
        }
    }

    pub fn save<S: KeyValueStore + ?Sized>(&self, store: &mut S) {
        match save_json(store, Self::STORAGE_NAME, self) {
            Ok(()) => log::info!("Settings saved"),
            Err(e) => log::warn!("Failed to save settings: {}", e),
        }
    }
}
