//! Gameplay policies and preferences
//!
//! Persisted to LocalStorage, separately from achievements.

use serde::{Deserialize, Serialize};

/// How often a boss fight follows a cleared wave
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum BossCadence {
    /// After every wave
    #[default]
    EveryWave,
    /// Only after every third wave
    EveryThirdWave,
}

impl BossCadence {
    /// Does clearing `completed_wave` lead into a boss fight?
    pub fn triggers_after(self, completed_wave: u32) -> bool {
        match self {
            BossCadence::EveryWave => true,
            BossCadence::EveryThirdWave => completed_wave.is_multiple_of(3),
        }
    }
}

/// What an asteroid escaping off the bottom costs the player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum FallPolicy {
    /// Escaped asteroids are harmless; only wrong shots cost lives
    #[default]
    Harmless,
    /// Each escaped asteroid costs a life
    LoseLife,
}

/// Game settings/preferences
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Boss fight frequency
    pub boss_cadence: BossCadence,
    /// Fall-through penalty rule
    pub fall_policy: FallPolicy,

    // === Visual feedback ===
    /// Screen shake on wrong answers
    pub screen_shake: bool,

    // === Accessibility ===
    /// Reduced motion (disables shake regardless of the toggle above)
    pub reduced_motion: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            boss_cadence: BossCadence::default(),
            fall_policy: FallPolicy::default(),
            screen_shake: true,
            reduced_motion: false,
        }
    }
}

impl Settings {
    /// LocalStorage key (used only in wasm32)
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "asteroid_math_settings";

    /// Effective screen shake (respects reduced_motion)
    pub fn effective_screen_shake(&self) -> bool {
        self.screen_shake && !self.reduced_motion
    }

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                if let Ok(settings) = serde_json::from_str(&json) {
                    log::info!("Loaded settings from LocalStorage");
                    return settings;
                }
            }
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Save settings to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(json) = serde_json::to_string(self) {
                let _ = storage.set_item(Self::STORAGE_KEY, &json);
                log::info!("Settings saved");
            }
        }
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::default()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {
        // No-op for native
    }
}
