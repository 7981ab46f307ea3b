//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - One tick per rendered frame; all speeds are px/tick
//! - Seeded RNG only
//! - Stable iteration order (spawn order)
//! - No rendering or platform dependencies

pub mod boss;
pub mod problem;
pub mod state;
pub mod tick;

pub use boss::{BossEncounter, BossError, BossRequest, RawBossResponse};
pub use problem::{Op, Problem, Tier};
pub use state::{Asteroid, GameEvent, GamePhase, GameState, RunSummary};
pub use tick::{TickInput, apply_boss_result, resolve_boss_choice, tick};
