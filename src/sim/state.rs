//! Game state and core simulation types

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::boss::{BossEncounter, BossRequest};
use super::problem::{Problem, Tier};
use crate::consts::*;

/// Current phase of gameplay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Title screen, waiting for start
    Menu,
    /// Active gameplay
    Playing,
    /// Boss fight; entity simulation and targeting are gated off
    Boss,
    /// Run ended (defeat or victory)
    GameOver,
}

/// A falling asteroid carrying one candidate answer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Asteroid {
    pub id: u32,
    pub pos: Vec2,
    /// Fall speed in px/tick (tier-dependent)
    pub speed: f32,
    /// Candidate answer painted on the rock
    pub value: i64,
    pub is_correct: bool,
    /// Score awarded when this is the correct target
    pub points: u64,
}

/// The player's ship, fixed to a horizontal rail near the bottom
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ship {
    pub x: f32,
}

impl Default for Ship {
    fn default() -> Self {
        Self {
            x: FIELD_WIDTH / 2.0,
        }
    }
}

impl Ship {
    /// Move one tick in `dir` (-1, 0, +1), clamped to the playfield
    pub fn step(&mut self, dir: f32) {
        let half = SHIP_WIDTH / 2.0;
        self.x = (self.x + dir * SHIP_SPEED).clamp(half, FIELD_WIDTH - half);
    }
}

/// An explosion fragment (cosmetic)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    /// Remaining ticks
    pub life: u32,
}

/// Laser beam to the last fire target (cosmetic)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Laser {
    pub target: Vec2,
    pub ticks: u32,
}

/// Serializable RNG state
///
/// Rather than carrying a generator, the state carries a seed and a draw
/// counter and derives a fresh stream per draw site. Keeps the whole
/// state `Serialize` and runs reproducible from a seed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RngState {
    pub seed: u64,
    draws: u64,
}

impl RngState {
    pub fn new(seed: u64) -> Self {
        Self { seed, draws: 0 }
    }

    /// Derive the next generator; each call advances the stream
    pub fn next_rng(&mut self) -> Pcg32 {
        self.draws = self.draws.wrapping_add(1);
        Pcg32::seed_from_u64(self.seed ^ self.draws.wrapping_mul(0x9E37_79B9_7F4A_7C15))
    }
}

/// Final stats for a finished run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub victory: bool,
    pub score: u64,
    /// Waves fully completed
    pub wave: u32,
    /// Whole-percent accuracy (0 when no attempts were made)
    pub accuracy: u32,
}

/// One-tick notifications for the UI layer (drained each frame)
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    QuestionSpawned,
    CorrectHit { points: u64 },
    WrongHit { value: i64 },
    LifeLost,
    WaveCleared { wave: u32 },
    /// Ask the orchestrating layer to fetch a boss encounter
    BossRequested(BossRequest),
    BossReady,
    BossResolved { correct: bool },
    RunEnded(RunSummary),
}

/// Complete game state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub rng: RngState,
    pub phase: GamePhase,
    /// Current wave (1-based)
    pub wave: u32,
    /// Questions answered correctly in the current wave
    pub questions_answered: u32,
    /// Question currently on screen (for the HUD)
    pub question: Option<Problem>,
    pub ship: Ship,
    /// Live asteroids in spawn order
    pub asteroids: Vec<Asteroid>,
    /// Visual particles (not gameplay-affecting)
    pub particles: Vec<Particle>,
    pub laser: Option<Laser>,
    /// Screen shake intensity, decays per tick
    pub screen_shake: f32,
    /// Simulation tick counter
    pub time_ticks: u64,

    // Run ledger
    pub score: u64,
    pub lives: u8,
    pub correct_count: u32,
    pub total_attempts: u32,
    pub victory: bool,

    // Boss fight
    /// Generation epoch; responses from older epochs are dropped
    pub boss_epoch: u64,
    /// Validated encounter, `None` while generation is pending
    pub boss: Option<BossEncounter>,

    /// Events emitted this tick
    #[serde(skip)]
    pub events: Vec<GameEvent>,
    next_id: u32,
}

impl GameState {
    /// Create a new run in the menu phase
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: RngState::new(seed),
            phase: GamePhase::Menu,
            wave: 1,
            questions_answered: 0,
            question: None,
            ship: Ship::default(),
            asteroids: Vec::new(),
            particles: Vec::new(),
            laser: None,
            screen_shake: 0.0,
            time_ticks: 0,
            score: 0,
            lives: STARTING_LIVES,
            correct_count: 0,
            total_attempts: 0,
            victory: false,
            boss_epoch: 0,
            boss: None,
            events: Vec::new(),
            next_id: 1,
        }
    }

    /// Leave the menu and begin play
    pub fn start(&mut self) {
        if self.phase == GamePhase::Menu {
            self.phase = GamePhase::Playing;
        }
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Difficulty tier for the current wave
    pub fn tier(&self) -> Tier {
        Tier::for_wave(self.wave)
    }

    /// Award points, ending the run in victory past the threshold
    pub fn add_score(&mut self, points: u64) {
        self.score += points;
        if self.score >= VICTORY_SCORE {
            self.end_run(true);
        }
    }

    /// Decrement lives; the run ends when they hit zero
    pub fn lose_life(&mut self) {
        self.lives = self.lives.saturating_sub(1);
        self.events.push(GameEvent::LifeLost);
        if self.lives == 0 {
            self.end_run(false);
        }
    }

    /// Whole-percent run accuracy; 0 when nothing was attempted
    pub fn accuracy_pct(&self) -> u32 {
        if self.total_attempts == 0 {
            return 0;
        }
        ((self.correct_count as f64 / self.total_attempts as f64) * 100.0).round() as u32
    }

    pub fn run_summary(&self) -> RunSummary {
        RunSummary {
            victory: self.victory,
            score: self.score,
            wave: self.wave.saturating_sub(1),
            accuracy: self.accuracy_pct(),
        }
    }

    fn end_run(&mut self, victory: bool) {
        if self.phase == GamePhase::GameOver {
            return;
        }
        self.victory = victory;
        self.phase = GamePhase::GameOver;
        let summary = self.run_summary();
        self.events.push(GameEvent::RunEnded(summary));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accuracy_is_zero_without_attempts() {
        let state = GameState::new(1);
        assert_eq!(state.accuracy_pct(), 0);
    }

    #[test]
    fn accuracy_rounds_to_whole_percent() {
        let mut state = GameState::new(1);
        state.correct_count = 2;
        state.total_attempts = 3;
        assert_eq!(state.accuracy_pct(), 67);
    }

    #[test]
    fn victory_threshold_ends_the_run() {
        let mut state = GameState::new(1);
        state.phase = GamePhase::Playing;
        state.add_score(VICTORY_SCORE - 10);
        assert_eq!(state.phase, GamePhase::Playing);
        state.add_score(10);
        assert_eq!(state.phase, GamePhase::GameOver);
        assert!(state.victory);
        assert!(matches!(
            state.events.last(),
            Some(GameEvent::RunEnded(RunSummary { victory: true, .. }))
        ));
    }

    #[test]
    fn lives_reach_zero_exactly_once() {
        let mut state = GameState::new(1);
        state.phase = GamePhase::Playing;
        state.lose_life();
        state.lose_life();
        assert_eq!(state.phase, GamePhase::Playing);
        state.lose_life();
        assert_eq!(state.lives, 0);
        assert_eq!(state.phase, GamePhase::GameOver);
        assert!(!state.victory);
        // Further decrements saturate instead of wrapping
        state.lose_life();
        assert_eq!(state.lives, 0);
    }

    #[test]
    fn ship_clamps_to_playfield() {
        let mut ship = Ship::default();
        for _ in 0..1000 {
            ship.step(-1.0);
        }
        assert_eq!(ship.x, SHIP_WIDTH / 2.0);
        for _ in 0..1000 {
            ship.step(1.0);
        }
        assert_eq!(ship.x, FIELD_WIDTH - SHIP_WIDTH / 2.0);
    }

    #[test]
    fn derived_rng_streams_differ() {
        let mut rng = RngState::new(42);
        use rand::Rng;
        let a: u64 = rng.next_rng().random();
        let b: u64 = rng.next_rng().random();
        assert_ne!(a, b);
    }
}
