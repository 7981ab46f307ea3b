//! Arithmetic problems and answer-choice generation
//!
//! Problems are constructed so the answer is always an exact non-negative
//! integer: subtraction bounds the second operand by the first, division
//! picks divisor and quotient first and multiplies.

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

/// Multiplication and division stay in times-table territory
const TIMES_TABLE_MAX: i64 = 12;

/// Random-proposal budget for distractor generation
const CHOICE_ATTEMPTS: u32 = 50;

/// The four operators the game teaches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Op {
    Add,
    Sub,
    Mul,
    Div,
}

impl Op {
    /// Display glyph (× and ÷ as kids see them in class)
    pub fn glyph(self) -> char {
        match self {
            Op::Add => '+',
            Op::Sub => '-',
            Op::Mul => '×',
            Op::Div => '÷',
        }
    }
}

/// Difficulty tier: operator set, operand range, scoring and fall speed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tier {
    Easy,
    Medium,
    Hard,
}

impl Tier {
    /// Tier for a 1-based wave number
    pub fn for_wave(wave: u32) -> Self {
        if wave <= 3 {
            Tier::Easy
        } else if wave <= 6 {
            Tier::Medium
        } else {
            Tier::Hard
        }
    }

    pub fn ops(self) -> &'static [Op] {
        match self {
            Tier::Easy => &[Op::Add, Op::Sub],
            Tier::Medium => &[Op::Add, Op::Sub, Op::Mul],
            Tier::Hard => &[Op::Mul, Op::Div],
        }
    }

    /// Upper operand bound for addition/subtraction
    pub fn operand_max(self) -> i64 {
        match self {
            Tier::Easy => 20,
            Tier::Medium => 50,
            Tier::Hard => 100,
        }
    }

    /// Number of falling answer choices
    pub fn choice_count(self) -> usize {
        match self {
            Tier::Easy => 3,
            Tier::Medium | Tier::Hard => 4,
        }
    }

    pub fn points(self) -> u64 {
        match self {
            Tier::Easy => 10,
            Tier::Medium => 25,
            Tier::Hard => 50,
        }
    }

    /// Asteroid fall speed in px/tick
    pub fn fall_speed(self) -> f32 {
        match self {
            Tier::Easy => 0.8,
            Tier::Medium => 1.0,
            Tier::Hard => 1.2,
        }
    }
}

/// One arithmetic question with its exact integer answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Problem {
    pub op: Op,
    pub lhs: i64,
    pub rhs: i64,
    pub answer: i64,
}

impl Problem {
    /// Question text as shown in the HUD, e.g. `"24 ÷ 4"`
    pub fn question(&self) -> String {
        format!("{} {} {}", self.lhs, self.op.glyph(), self.rhs)
    }
}

/// Generate a problem for the tier
pub fn generate(tier: Tier, rng: &mut impl Rng) -> Problem {
    let ops = tier.ops();
    let op = ops[rng.random_range(0..ops.len())];
    let max = tier.operand_max();

    let (lhs, rhs, answer) = match op {
        Op::Add => {
            let a = rng.random_range(1..=max);
            let b = rng.random_range(1..=max);
            (a, b, a + b)
        }
        Op::Sub => {
            // Second operand bounded by the first: result never negative
            let a = rng.random_range(1..=max);
            let b = rng.random_range(1..=a);
            (a, b, a - b)
        }
        Op::Mul => {
            let a = rng.random_range(1..=TIMES_TABLE_MAX);
            let b = rng.random_range(1..=TIMES_TABLE_MAX);
            (a, b, a * b)
        }
        Op::Div => {
            // Divisor and quotient first; the dividend is their product,
            // so the result is exact by construction
            let divisor = rng.random_range(1..=TIMES_TABLE_MAX);
            let quotient = rng.random_range(1..=TIMES_TABLE_MAX);
            (divisor * quotient, divisor, quotient)
        }
    };

    Problem {
        op,
        lhs,
        rhs,
        answer,
    }
}

/// Build a shuffled choice set guaranteed to contain `correct`
///
/// Distractors are proposed randomly (half near-misses, half wide) under
/// a fixed attempt budget; a deterministic fill path tops the set up if
/// the budget runs dry, so the size and membership invariants hold
/// unconditionally.
pub fn choice_set(correct: i64, count: usize, rng: &mut impl Rng) -> Vec<i64> {
    choice_set_with_budget(correct, count, CHOICE_ATTEMPTS, rng)
}

fn choice_set_with_budget(
    correct: i64,
    count: usize,
    budget: u32,
    rng: &mut impl Rng,
) -> Vec<i64> {
    let mut choices = vec![correct];

    let mut attempts = 0;
    while choices.len() < count && attempts < budget {
        attempts += 1;
        let candidate = if rng.random_bool(0.5) {
            // Near miss
            correct + rng.random_range(-10..=10)
        } else {
            // Wide, scaled to the answer's magnitude
            rng.random_range(1..=correct.saturating_mul(2).max(100))
        };
        if candidate > 0 && !choices.contains(&candidate) {
            choices.push(candidate);
        }
    }

    // Budget exhausted: monotonic fill keeps the set unique and positive
    let mut offset = 1;
    while choices.len() < count {
        let filler = correct + offset;
        if filler > 0 && !choices.contains(&filler) {
            choices.push(filler);
        }
        offset += 1;
    }

    if !choices.contains(&correct) {
        log::error!("correct answer {correct} missing from generated choices, repairing");
        choices[0] = correct;
    }

    choices.shuffle(rng);
    choices
}
