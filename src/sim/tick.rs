//! Per-frame simulation tick
//!
//! One tick per rendered frame. All speeds are px/tick, so the reference
//! behavior is tick-count based rather than wall-clock based.

use glam::Vec2;
use rand::Rng;

use super::boss::{self, BossRequest};
use super::problem;
use super::state::{Asteroid, GameEvent, GamePhase, GameState, Laser, Particle};
use crate::consts::*;
use crate::settings::{FallPolicy, Settings};

/// Input sampled for a single tick
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Held directional keys
    pub left: bool,
    pub right: bool,
    /// Fire (edge-triggered; the caller clears it after the tick)
    pub fire: bool,
}

/// Advance the game by one frame
///
/// Everything outside the `Playing` phase is inert: menu, boss fights and
/// the game-over screen are driven by explicit calls, not by ticks.
pub fn tick(state: &mut GameState, input: &TickInput, settings: &Settings) {
    if state.phase != GamePhase::Playing {
        return;
    }

    state.time_ticks += 1;

    // Cosmetic timers
    state.screen_shake *= 0.9;
    if state.screen_shake < 0.01 {
        state.screen_shake = 0.0;
    }
    if let Some(laser) = state.laser.as_mut() {
        laser.ticks = laser.ticks.saturating_sub(1);
        if laser.ticks == 0 {
            state.laser = None;
        }
    }

    let dir = (input.right as i8 - input.left as i8) as f32;
    state.ship.step(dir);

    if input.fire {
        resolve_fire(state);
        // The shot may have ended the run (last life, victory threshold)
        if state.phase != GamePhase::Playing {
            return;
        }
    }

    update_asteroids(state, settings);
    if state.phase != GamePhase::Playing {
        return;
    }

    update_particles(state);
    check_wave_complete(state, settings);
}

/// Resolve a fire action against the nearest live asteroid
///
/// Nearest = minimum horizontal distance to the ship; the first minimum
/// encountered wins, so resolution is deterministic for a fixed spawn
/// order. A correct hit resolves the whole question; a wrong hit removes
/// only the target and costs a life.
fn resolve_fire(state: &mut GameState) {
    if state.asteroids.is_empty() {
        return;
    }

    let ship_x = state.ship.x;
    let mut target_idx = 0;
    let mut best = f32::INFINITY;
    for (idx, asteroid) in state.asteroids.iter().enumerate() {
        let dist = (asteroid.pos.x - ship_x).abs();
        if dist < best {
            best = dist;
            target_idx = idx;
        }
    }

    let target = state.asteroids[target_idx].clone();
    state.laser = Some(Laser {
        target: target.pos,
        ticks: LASER_TICKS,
    });
    spawn_explosion(state, target.pos);
    state.total_attempts += 1;

    if target.is_correct {
        state.correct_count += 1;
        state.questions_answered += 1;
        state.events.push(GameEvent::CorrectHit {
            points: target.points,
        });
        // Question resolved: the whole rank goes away
        state.asteroids.clear();
        state.question = None;
        state.add_score(target.points);
    } else {
        state.asteroids.remove(target_idx);
        state.screen_shake = 1.0;
        state.events.push(GameEvent::WrongHit {
            value: target.value,
        });
        state.lose_life();
    }
}

fn update_asteroids(state: &mut GameState, settings: &Settings) {
    for asteroid in &mut state.asteroids {
        asteroid.pos.y += asteroid.speed;
    }

    // Cull asteroids past the bottom margin
    let cull_y = FIELD_HEIGHT + CULL_MARGIN;
    let before = state.asteroids.len();
    state.asteroids.retain(|a| a.pos.y <= cull_y);
    let fallen = before - state.asteroids.len();

    if fallen > 0 && settings.fall_policy == FallPolicy::LoseLife {
        for _ in 0..fallen {
            state.lose_life();
            if state.phase != GamePhase::Playing {
                return;
            }
        }
    }

    // Fresh question once the field is clear and the wave has room
    if state.asteroids.is_empty() && state.questions_answered < QUESTIONS_PER_WAVE {
        spawn_question(state);
    }
}

/// Generate a new problem and spawn one asteroid per answer choice
fn spawn_question(state: &mut GameState) {
    let tier = state.tier();
    let mut rng = state.rng.next_rng();
    let problem = problem::generate(tier, &mut rng);
    let choices = problem::choice_set(problem.answer, tier.choice_count(), &mut rng);

    let spacing = FIELD_WIDTH / (choices.len() as f32 + 1.0);
    for (idx, value) in choices.into_iter().enumerate() {
        let id = state.next_entity_id();
        state.asteroids.push(Asteroid {
            id,
            pos: Vec2::new(spacing * (idx as f32 + 1.0), SPAWN_Y),
            speed: tier.fall_speed(),
            value,
            is_correct: value == problem.answer,
            points: tier.points(),
        });
    }

    log::debug!("wave {} question: {}", state.wave, problem.question());
    state.question = Some(problem);
    state.events.push(GameEvent::QuestionSpawned);
}

fn update_particles(state: &mut GameState) {
    for particle in &mut state.particles {
        particle.pos += particle.vel;
        particle.life = particle.life.saturating_sub(1);
    }
    state.particles.retain(|p| p.life > 0);
}

/// Burst of explosion fragments at `pos`
fn spawn_explosion(state: &mut GameState, pos: Vec2) {
    let mut rng = state.rng.next_rng();
    for _ in 0..EXPLOSION_PARTICLES {
        state.particles.push(Particle {
            pos,
            vel: Vec2::new(rng.random_range(-5.0..5.0), rng.random_range(-5.0..5.0)),
            life: PARTICLE_LIFE_TICKS,
        });
    }
}

fn check_wave_complete(state: &mut GameState, settings: &Settings) {
    if state.questions_answered < QUESTIONS_PER_WAVE || !state.asteroids.is_empty() {
        return;
    }

    let completed = state.wave;
    state.wave += 1;
    state.questions_answered = 0;
    state.events.push(GameEvent::WaveCleared { wave: completed });
    log::info!("wave {completed} cleared, next tier: {:?}", state.tier());

    if settings.boss_cadence.triggers_after(completed) {
        enter_boss(state);
    }
}

/// Gate the sim off and ask the orchestrating layer for an encounter
fn enter_boss(state: &mut GameState) {
    state.phase = GamePhase::Boss;
    state.boss = None;
    state.boss_epoch += 1;
    state.question = None;

    let request = BossRequest {
        wave: state.wave,
        score: state.score,
        correct_count: state.correct_count,
        total_attempts: state.total_attempts,
    };
    state.events.push(GameEvent::BossRequested(request));
}

/// Apply an encounter generation result to the current boss phase
///
/// Responses are keyed by generation epoch; a late response for an
/// earlier boss fight (or one arriving after the phase moved on) is
/// dropped on the floor.
pub fn apply_boss_result(
    state: &mut GameState,
    epoch: u64,
    result: Result<boss::RawBossResponse, boss::BossError>,
) {
    if state.phase != GamePhase::Boss || epoch != state.boss_epoch {
        log::info!("dropping stale boss response (epoch {epoch})");
        return;
    }

    let encounter = match result {
        Ok(raw) => {
            let mut rng = state.rng.next_rng();
            boss::validate(&raw, &mut rng)
        }
        Err(err) => {
            log::warn!("boss generation failed: {err}, using fallback");
            boss::fallback_encounter()
        }
    };

    state.boss = Some(encounter);
    state.events.push(GameEvent::BossReady);
}

/// Resolve the player's single boss answer
///
/// No-op unless a validated encounter is on display. Correct picks pay
/// the boss reward; wrong picks cost a life. Either way the attempt
/// counts, and the run ends here if it was the last life (or the reward
/// crossed the victory threshold).
pub fn resolve_boss_choice(state: &mut GameState, selected: i64) {
    if state.phase != GamePhase::Boss {
        return;
    }
    let Some(encounter) = state.boss.take() else {
        return;
    };

    let correct = selected == encounter.correct_answer;
    state.total_attempts += 1;
    state.events.push(GameEvent::BossResolved { correct });

    if correct {
        state.correct_count += 1;
        state.add_score(BOSS_REWARD);
    } else {
        state.lose_life();
    }

    if state.phase == GamePhase::Boss {
        state.phase = GamePhase::Playing;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::BossCadence;
    use crate::sim::boss::RawBossResponse;
    use crate::sim::problem::Tier;
    use serde_json::json;

    fn playing_state(seed: u64) -> GameState {
        let mut state = GameState::new(seed);
        state.start();
        state
    }

    /// Park the ship over an asteroid matching `pick` and fire
    fn fire_at(state: &mut GameState, settings: &Settings, pick: impl Fn(&Asteroid) -> bool) {
        let x = state
            .asteroids
            .iter()
            .find(|a| pick(a))
            .map(|a| a.pos.x)
            .expect("no matching asteroid");
        state.ship.x = x;
        let input = TickInput {
            fire: true,
            ..Default::default()
        };
        tick(state, &input, settings);
    }

    #[test]
    fn first_tick_spawns_an_easy_question() {
        let mut state = playing_state(1);
        let settings = Settings::default();
        tick(&mut state, &TickInput::default(), &settings);

        assert_eq!(state.asteroids.len(), 3);
        assert_eq!(state.asteroids.iter().filter(|a| a.is_correct).count(), 1);
        let problem = state.question.as_ref().expect("question set");
        let correct = state
            .asteroids
            .iter()
            .find(|a| a.is_correct)
            .expect("one correct");
        assert_eq!(correct.value, problem.answer);
        assert!(state.events.contains(&GameEvent::QuestionSpawned));
    }

    #[test]
    fn fire_with_no_asteroids_is_a_noop() {
        let mut state = playing_state(2);
        let settings = Settings::default();
        // Resolve happens before spawning, so the very first fire finds
        // an empty field
        let input = TickInput {
            fire: true,
            ..Default::default()
        };
        tick(&mut state, &input, &settings);
        assert_eq!(state.total_attempts, 0);
        assert_eq!(state.lives, STARTING_LIVES);
        assert_eq!(state.score, 0);
    }

    #[test]
    fn menu_and_game_over_ticks_are_inert() {
        let mut state = GameState::new(3);
        let settings = Settings::default();
        tick(&mut state, &TickInput::default(), &settings);
        assert_eq!(state.asteroids.len(), 0);
        assert_eq!(state.time_ticks, 0);

        state.phase = GamePhase::GameOver;
        tick(&mut state, &TickInput::default(), &settings);
        assert_eq!(state.time_ticks, 0);
    }

    #[test]
    fn correct_hit_resolves_the_whole_question() {
        let mut state = playing_state(4);
        let settings = Settings::default();
        tick(&mut state, &TickInput::default(), &settings);

        fire_at(&mut state, &settings, |a| a.is_correct);

        assert_eq!(state.correct_count, 1);
        assert_eq!(state.total_attempts, 1);
        assert_eq!(state.questions_answered, 1);
        assert_eq!(state.score, Tier::Easy.points());
        // All asteroids cleared, and a fresh rank spawned in their place
        assert!(state.asteroids.iter().all(|a| a.pos.y <= SPAWN_Y + 2.0));
        assert_eq!(state.asteroids.len(), 3);
    }

    #[test]
    fn wrong_hit_removes_only_the_target() {
        let mut state = playing_state(5);
        let settings = Settings::default();
        tick(&mut state, &TickInput::default(), &settings);

        fire_at(&mut state, &settings, |a| !a.is_correct);

        assert_eq!(state.lives, STARTING_LIVES - 1);
        assert_eq!(state.total_attempts, 1);
        assert_eq!(state.correct_count, 0);
        assert_eq!(state.questions_answered, 0);
        assert_eq!(state.asteroids.len(), 2);
        assert!(state.screen_shake > 0.0);
    }

    #[test]
    fn third_wrong_answer_ends_the_run_exactly_then() {
        let mut state = playing_state(6);
        let settings = Settings::default();
        tick(&mut state, &TickInput::default(), &settings);

        fire_at(&mut state, &settings, |a| !a.is_correct);
        assert_eq!(state.lives, 2);
        assert_eq!(state.phase, GamePhase::Playing);

        fire_at(&mut state, &settings, |a| !a.is_correct);
        assert_eq!(state.lives, 1);
        assert_eq!(state.phase, GamePhase::Playing);

        // Only the correct asteroid is left; force a fresh rank so a
        // third wrong target exists
        state.asteroids.clear();
        tick(&mut state, &TickInput::default(), &settings);
        fire_at(&mut state, &settings, |a| !a.is_correct);

        assert_eq!(state.lives, 0);
        assert_eq!(state.phase, GamePhase::GameOver);
        assert!(!state.victory);
    }

    #[test]
    fn fall_through_is_harmless_by_default() {
        let mut state = playing_state(7);
        let settings = Settings::default();
        tick(&mut state, &TickInput::default(), &settings);

        // Slowest tier needs (500 + 50 - (-40)) / 0.8 ticks to cross
        for _ in 0..800 {
            tick(&mut state, &TickInput::default(), &settings);
        }

        assert_eq!(state.lives, STARTING_LIVES);
        assert_eq!(state.questions_answered, 0);
        // A fresh rank replaced the one that escaped
        assert!(!state.asteroids.is_empty());
        assert!(state.asteroids.iter().all(|a| a.pos.y < FIELD_HEIGHT));
    }

    #[test]
    fn fall_through_can_cost_lives_by_policy() {
        let mut state = playing_state(8);
        let settings = Settings {
            fall_policy: FallPolicy::LoseLife,
            ..Default::default()
        };
        tick(&mut state, &TickInput::default(), &settings);

        for _ in 0..800 {
            tick(&mut state, &TickInput::default(), &settings);
            if state.phase != GamePhase::Playing {
                break;
            }
        }

        // Three escapes end the run under this policy
        assert_eq!(state.lives, 0);
        assert_eq!(state.phase, GamePhase::GameOver);
    }

    #[test]
    fn clearing_the_tenth_question_enters_a_boss_fight() {
        let mut state = playing_state(9);
        let settings = Settings::default();
        state.questions_answered = QUESTIONS_PER_WAVE - 1;
        tick(&mut state, &TickInput::default(), &settings);

        fire_at(&mut state, &settings, |a| a.is_correct);

        assert_eq!(state.phase, GamePhase::Boss);
        assert_eq!(state.wave, 2);
        assert_eq!(state.questions_answered, 0);
        assert_eq!(state.boss_epoch, 1);
        assert!(state.boss.is_none());
        let request = state
            .events
            .iter()
            .find_map(|e| match e {
                GameEvent::BossRequested(req) => Some(*req),
                _ => None,
            })
            .expect("boss requested");
        assert_eq!(request.wave, 2);
        assert_eq!(request.score, state.score);
    }

    #[test]
    fn every_third_wave_cadence_skips_early_bosses() {
        let mut state = playing_state(10);
        let settings = Settings {
            boss_cadence: BossCadence::EveryThirdWave,
            ..Default::default()
        };
        state.questions_answered = QUESTIONS_PER_WAVE - 1;
        tick(&mut state, &TickInput::default(), &settings);

        fire_at(&mut state, &settings, |a| a.is_correct);

        // Wave 1 cleared: no boss yet
        assert_eq!(state.phase, GamePhase::Playing);
        assert_eq!(state.wave, 2);
        assert_eq!(state.boss_epoch, 0);
    }

    #[test]
    fn boss_result_applies_only_to_the_current_epoch() {
        let mut state = playing_state(11);
        state.phase = GamePhase::Boss;
        state.boss_epoch = 3;

        apply_boss_result(&mut state, 2, Ok(RawBossResponse::default()));
        assert!(state.boss.is_none());

        apply_boss_result(&mut state, 3, Err(boss::BossError::Status(502)));
        assert_eq!(state.boss, Some(boss::fallback_encounter()));
        assert!(state.events.contains(&GameEvent::BossReady));
    }

    #[test]
    fn boss_result_is_ignored_outside_the_boss_phase() {
        let mut state = playing_state(12);
        state.boss_epoch = 1;
        apply_boss_result(&mut state, 1, Err(boss::BossError::Status(500)));
        assert!(state.boss.is_none());
    }

    #[test]
    fn valid_boss_response_is_validated_and_stored() {
        let mut state = playing_state(13);
        state.phase = GamePhase::Boss;
        state.boss_epoch = 1;

        let raw: RawBossResponse = serde_json::from_value(json!({
            "story": "A dreadnought warps in.",
            "problem": "9 × 9",
            "correctAnswer": 80,
            "choices": [80, 81, 79, 90],
            "successMessage": "It burns!",
            "failMessage": "Shields held.",
        }))
        .expect("raw");
        apply_boss_result(&mut state, 1, Ok(raw));

        let enc = state.boss.as_ref().expect("encounter stored");
        // Declared 80 was wrong; the text computes to 81
        assert_eq!(enc.correct_answer, 81);
        assert!(enc.choices.contains(&81));
    }

    #[test]
    fn correct_boss_answer_pays_the_reward() {
        let mut state = playing_state(14);
        state.phase = GamePhase::Boss;
        state.boss = Some(boss::fallback_encounter());

        resolve_boss_choice(&mut state, 42);

        assert_eq!(state.phase, GamePhase::Playing);
        assert_eq!(state.score, BOSS_REWARD);
        assert_eq!(state.correct_count, 1);
        assert_eq!(state.total_attempts, 1);
        assert!(state.boss.is_none());
    }

    #[test]
    fn wrong_boss_answer_costs_a_life() {
        let mut state = playing_state(15);
        state.phase = GamePhase::Boss;
        state.boss = Some(boss::fallback_encounter());

        resolve_boss_choice(&mut state, 35);

        assert_eq!(state.phase, GamePhase::Playing);
        assert_eq!(state.lives, STARTING_LIVES - 1);
        assert_eq!(state.correct_count, 0);
        assert_eq!(state.total_attempts, 1);
    }

    #[test]
    fn losing_the_last_life_to_a_boss_ends_the_run() {
        let mut state = playing_state(16);
        state.phase = GamePhase::Boss;
        state.lives = 1;
        state.boss = Some(boss::fallback_encounter());

        resolve_boss_choice(&mut state, 35);

        assert_eq!(state.phase, GamePhase::GameOver);
        assert!(!state.victory);
    }

    #[test]
    fn boss_reward_can_cross_the_victory_threshold() {
        let mut state = playing_state(17);
        state.phase = GamePhase::Boss;
        state.score = VICTORY_SCORE - BOSS_REWARD;
        state.boss = Some(boss::fallback_encounter());

        resolve_boss_choice(&mut state, 42);

        assert_eq!(state.phase, GamePhase::GameOver);
        assert!(state.victory);
        assert_eq!(state.score, VICTORY_SCORE);
    }

    #[test]
    fn choice_while_generation_pending_is_a_noop() {
        let mut state = playing_state(18);
        state.phase = GamePhase::Boss;
        state.boss = None;

        resolve_boss_choice(&mut state, 42);

        assert_eq!(state.phase, GamePhase::Boss);
        assert_eq!(state.total_attempts, 0);
    }

    #[test]
    fn same_seed_runs_are_identical() {
        let settings = Settings::default();
        let mut a = playing_state(99);
        let mut b = playing_state(99);

        let inputs = [
            TickInput {
                left: true,
                ..Default::default()
            },
            TickInput {
                fire: true,
                ..Default::default()
            },
            TickInput {
                right: true,
                ..Default::default()
            },
            TickInput::default(),
        ];

        for _ in 0..200 {
            for input in &inputs {
                tick(&mut a, input, &settings);
                tick(&mut b, input, &settings);
            }
        }

        assert_eq!(a.time_ticks, b.time_ticks);
        assert_eq!(a.score, b.score);
        assert_eq!(a.lives, b.lives);
        assert_eq!(a.asteroids.len(), b.asteroids.len());
        for (x, y) in a.asteroids.iter().zip(&b.asteroids) {
            assert_eq!(x.value, y.value);
            assert_eq!(x.pos, y.pos);
        }
    }
}
