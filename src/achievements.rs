//! Durable best-of statistics
//!
//! One record per install, persisted to LocalStorage. Every field is a
//! monotonic max on its own; `totalGames` counts every finished run.

use serde::{Deserialize, Serialize};

/// Best-of record across all runs
///
/// Field names stay camelCase on the wire for continuity with records
/// written by earlier revisions of the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Achievements {
    pub high_score: u64,
    pub best_wave: u32,
    /// Best run accuracy in whole percent
    pub best_accuracy: u32,
    pub total_games: u32,
}

impl Achievements {
    /// LocalStorage key (used only in wasm32)
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "asteroid_math_achievements";

    /// Create a zeroed record
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one finished run into the record
    ///
    /// Each best-of field improves independently; a low-accuracy
    /// high-score run still raises the high score alone. `totalGames`
    /// increments unconditionally.
    pub fn record_run(&mut self, score: u64, wave: u32, accuracy: u32) {
        self.high_score = self.high_score.max(score);
        self.best_wave = self.best_wave.max(wave);
        self.best_accuracy = self.best_accuracy.max(accuracy);
        self.total_games += 1;
    }

    /// Load the record from LocalStorage (WASM only)
    ///
    /// A missing or corrupt record initializes to zeroes.
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                if let Ok(record) = serde_json::from_str::<Achievements>(&json) {
                    log::info!("Loaded achievements ({} games played)", record.total_games);
                    return record;
                }
                log::warn!("Achievements record was corrupt, starting fresh");
            }
        }

        Self::new()
    }

    /// Save the record to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(json) = serde_json::to_string(self) {
                let _ = storage.set_item(Self::STORAGE_KEY, &json);
                log::info!("Achievements saved");
            }
        }
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::new()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {
        // No-op for native
    }
}
