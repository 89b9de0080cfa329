//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Storage (LocalStorage on web, in-memory on native)
//! - The JavaScript-facing engine binding (web only)

#[cfg(target_arch = "wasm32")]
pub mod storage;
#[cfg(target_arch = "wasm32")]
pub mod web;

use crate::persistence::{KeyValueStore, MemoryStore};

/// Best durable store available on this platform
pub fn default_store() -> Box<dyn KeyValueStore> {
    #[cfg(target_arch = "wasm32")]
    {
        match storage::LocalStorage::open() {
            Ok(store) => return Box::new(store),
            Err(e) => log::warn!("LocalStorage unavailable, progress will not persist: {}", e),
        }
    }
    Box::new(MemoryStore::new())
}

/// Turns host frame timestamps into engine time.
///
/// Gaps are passed through whole, including background-tab stalls and
/// paused stretches, so the shield deadline tracks wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameClock {
    last_ms: Option<f64>,
}

impl FrameClock {
    /// Milliseconds since the previous frame (0 on the first one)
    pub fn elapsed(&mut self, timestamp_ms: f64) -> u64 {
        let Some(last) = self.last_ms.filter(|&last| timestamp_ms >= last) else {
            self.last_ms = Some(timestamp_ms);
            return 0;
        };
        let elapsed = (timestamp_ms - last) as u64;
        // Carry the fractional part into the next frame
        self.last_ms = Some(last + elapsed as f64);
        elapsed
    }

    /// Forget the previous frame, e.g. when a new session starts
    pub fn reset(&mut self) {
        self.last_ms = None;
    }
}
