//! Asteroid Math - a space-themed arithmetic shooter
//!
//! Core modules:
//! - `sim`: Deterministic simulation (problems, asteroids, waves, boss fights)
//! - `achievements`: Durable best-of statistics
//! - `settings`: Gameplay policies and preferences
//! - `net`: Boss encounter generation client (browser fetch)
//! - `render`: Canvas2D painter

pub mod achievements;
#[cfg(target_arch = "wasm32")]
pub mod net;
#[cfg(target_arch = "wasm32")]
pub mod render;
pub mod settings;
pub mod sim;

pub use achievements::Achievements;
pub use settings::{BossCadence, FallPolicy, Settings};

/// Game configuration constants
pub mod consts {
    /// Playfield dimensions in CSS pixels
    pub const FIELD_WIDTH: f32 = 700.0;
    pub const FIELD_HEIGHT: f32 = 500.0;

    /// Ship geometry - a triangle on a horizontal rail near the bottom
    pub const SHIP_WIDTH: f32 = 40.0;
    pub const SHIP_HEIGHT: f32 = 30.0;
    pub const SHIP_Y: f32 = 450.0;
    /// Ship movement in px/tick
    pub const SHIP_SPEED: f32 = 5.0;

    /// Asteroids spawn above the field and are culled a margin below it
    pub const SPAWN_Y: f32 = -40.0;
    pub const CULL_MARGIN: f32 = 50.0;

    /// Questions per wave
    pub const QUESTIONS_PER_WAVE: u32 = 10;

    /// Lives at run start
    pub const STARTING_LIVES: u8 = 3;

    /// Score awarded for defeating a boss
    pub const BOSS_REWARD: u64 = 500;

    /// Score that ends the run in victory, regardless of lives
    pub const VICTORY_SCORE: u64 = 5000;

    /// Laser beam visual duration in ticks
    pub const LASER_TICKS: u32 = 10;

    /// Explosion particle count and lifetime
    pub const EXPLOSION_PARTICLES: usize = 10;
    pub const PARTICLE_LIFE_TICKS: u32 = 30;
}

/// Explicit per-session context, passed to whoever needs it
///
/// Replaces the ambient player globals of earlier revisions: the prompt
/// builder and the HUD take this by reference.
#[derive(Debug, Clone)]
pub struct SessionContext {
    /// Display name used in the HUD and generation prompts
    pub player_name: String,
}

impl Default for SessionContext {
    fn default() -> Self {
        Self {
            player_name: "Cadet".to_string(),
        }
    }
}
