//! Boss encounters: AI-generated word problems
//!
//! Encounter content comes from an external generation service and is
//! untrusted: every response passes the validation/repair pipeline before
//! a player sees it, and arithmetic parsed out of the problem text always
//! beats the declared answer. Nothing in here fails hard - the worst case
//! is the deterministic fallback encounter.

use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::problem;

/// Number of answer buttons in a boss fight
pub const BOSS_CHOICE_COUNT: usize = 4;

/// System message for the generation service
pub const SYSTEM_PROMPT: &str =
    "You are a game master creating math boss encounters. Always respond with valid JSON only.";

/// Context snapshot sent to the generation service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BossRequest {
    pub wave: u32,
    pub score: u64,
    pub correct_count: u32,
    pub total_attempts: u32,
}

/// Wire shape of a generated encounter, before repair
///
/// Every field is optional: the service sometimes renames `correctAnswer`
/// to `answer`, drops `choices` entirely, or sends numbers as strings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawBossResponse {
    pub story: Option<String>,
    pub problem: Option<String>,
    #[serde(alias = "answer")]
    pub correct_answer: Option<Value>,
    pub choices: Option<Value>,
    pub success_message: Option<String>,
    pub fail_message: Option<String>,
}

/// A validated encounter, safe to present
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BossEncounter {
    pub story: String,
    pub problem: String,
    pub correct_answer: i64,
    pub choices: Vec<i64>,
    pub success_message: String,
    pub fail_message: String,
}

/// Failures while fetching or decoding a generated encounter
///
/// All variants resolve to the fallback encounter; none reach the player.
#[derive(Debug, thiserror::Error)]
pub enum BossError {
    #[error("request failed: {0}")]
    Request(String),
    #[error("proxy returned status {0}")]
    Status(u16),
    #[error("malformed response envelope: {0}")]
    Envelope(String),
    #[error("encounter payload was not JSON: {0}")]
    Payload(#[from] serde_json::Error),
}

/// User prompt embedding the player's progress
pub fn build_prompt(req: &BossRequest, session: &crate::SessionContext) -> String {
    let difficulty = if req.wave <= 3 {
        "- Simple addition/subtraction (1-50)"
    } else if req.wave <= 6 {
        "- Multiplication/division (single digits)"
    } else {
        "- Mixed operations or larger numbers"
    };

    format!(
        r#"You are creating a math boss encounter for a space-themed educational game.

WAVE: {wave}
PLAYER: {player}
PLAYER STATS: Score {score}, Accuracy {correct}/{total}

TASK: Create a JSON response with a math problem and 4 multiple choice answers.

REQUIRED JSON FORMAT (respond with ONLY this JSON, no other text):
{{
  "story": "Space battle story in 2-3 sentences",
  "problem": "Math word problem with numerical answer",
  "correctAnswer": 42,
  "choices": [42, 35, 48, 54],
  "successMessage": "Victory message",
  "failMessage": "Encouraging failure message"
}}

CRITICAL RULES:
1. "correctAnswer" must be a number
2. "choices" must be an array of exactly 4 numbers
3. The correctAnswer MUST be included in the choices array
4. Generate 3 plausible wrong answers for the other choices

DIFFICULTY FOR WAVE {wave}:
{difficulty}

Respond with ONLY the JSON, no explanations."#,
        wave = req.wave,
        player = session.player_name,
        score = req.score,
        correct = req.correct_count,
        total = req.total_attempts,
    )
}

#[derive(Debug, Deserialize)]
struct ChatEnvelope {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}

/// Extract the encounter JSON from an OpenAI-style chat completion body
pub fn parse_chat_content(body: &str) -> Result<RawBossResponse, BossError> {
    let envelope: ChatEnvelope =
        serde_json::from_str(body).map_err(|e| BossError::Envelope(e.to_string()))?;
    let content = envelope
        .choices
        .first()
        .map(|c| c.message.content.as_str())
        .ok_or_else(|| BossError::Envelope("no choices in response".to_string()))?;
    Ok(serde_json::from_str(strip_code_fence(content))?)
}

/// Models love wrapping JSON in markdown fences despite instructions
fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let without_open = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    without_open
        .strip_suffix("```")
        .unwrap_or(without_open)
        .trim()
}

/// Coerce a JSON value to an integer (accepts numbers and numeric strings)
fn coerce_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.round() as i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().map(|f| f.round() as i64))
        }
        _ => None,
    }
}

/// Validate and repair a raw response into a presentable encounter
///
/// Never rejects a repairable response: missing fields are synthesized,
/// the declared answer is forced into the choice set, and a result
/// recomputed from the problem text overrides the declared answer.
/// Only a response with no problem text and no recoverable answer falls
/// through to the fallback encounter. Idempotent on valid encounters.
pub fn validate(raw: &RawBossResponse, rng: &mut impl Rng) -> BossEncounter {
    let Some(problem) = raw
        .problem
        .clone()
        .filter(|p| !p.trim().is_empty())
    else {
        log::warn!("boss response missing problem text, using fallback encounter");
        return fallback_encounter();
    };

    let declared = raw.correct_answer.as_ref().and_then(coerce_int);
    let derived = derive_answer(&problem);

    let Some(mut correct) = declared.or(derived) else {
        log::warn!("boss response had no usable answer, using fallback encounter");
        return fallback_encounter();
    };

    let mut choices: Vec<i64> = match raw.choices.as_ref() {
        Some(Value::Array(items)) => items.iter().filter_map(coerce_int).collect(),
        _ => Vec::new(),
    };
    if choices.len() < 2 {
        log::warn!("boss response missing usable choices, synthesizing a set");
        choices = problem::choice_set(correct, BOSS_CHOICE_COUNT, rng);
    }

    // The declared answer must be selectable
    if !choices.contains(&correct) {
        log::warn!("declared answer {correct} absent from choices, repairing in place");
        choices[0] = correct;
    }

    // Numeric ground truth beats the declared answer
    if let Some(truth) = derived {
        if truth != correct {
            log::warn!("problem text computes to {truth}, overriding declared {correct}");
            if !choices.contains(&truth) {
                let slot = choices.iter().position(|&c| c == correct).unwrap_or(0);
                choices[slot] = truth;
            }
            correct = truth;
        }
    }

    BossEncounter {
        story: raw
            .story
            .clone()
            .unwrap_or_else(|| FALLBACK_STORY.to_string()),
        problem,
        correct_answer: correct,
        choices,
        success_message: raw
            .success_message
            .clone()
            .unwrap_or_else(|| FALLBACK_SUCCESS.to_string()),
        fail_message: raw
            .fail_message
            .clone()
            .unwrap_or_else(|| FALLBACK_FAIL.to_string()),
    }
}

/// Scan `text` for a binary integer expression and recompute its result
///
/// Operators are tried in turn, multiplication and division first: word
/// problems overwhelmingly use them, and `-` is too easy to confuse with
/// hyphens. The first operator with a full `<int> <op> <int>` match wins.
/// Division only counts when it is exact with a nonzero divisor.
pub fn derive_answer(text: &str) -> Option<i64> {
    const MUL_GLYPHS: &[char] = &['×', 'x', 'X', '*'];
    const DIV_GLYPHS: &[char] = &['÷', '/'];
    const ADD_GLYPHS: &[char] = &['+'];
    const SUB_GLYPHS: &[char] = &['-', '−'];

    for (glyphs, op) in [
        (MUL_GLYPHS, problem::Op::Mul),
        (DIV_GLYPHS, problem::Op::Div),
        (ADD_GLYPHS, problem::Op::Add),
        (SUB_GLYPHS, problem::Op::Sub),
    ] {
        if let Some(result) = scan_binary_expr(text, glyphs, op) {
            return Some(result);
        }
    }
    None
}

fn scan_binary_expr(text: &str, glyphs: &[char], op: problem::Op) -> Option<i64> {
    for (idx, ch) in text.char_indices() {
        if !glyphs.contains(&ch) {
            continue;
        }
        let lhs = number_before(&text[..idx]);
        let rhs = number_after(&text[idx + ch.len_utf8()..]);
        let (Some(lhs), Some(rhs)) = (lhs, rhs) else {
            continue;
        };
        match op {
            problem::Op::Add => return Some(lhs + rhs),
            problem::Op::Sub => return Some(lhs - rhs),
            problem::Op::Mul => return Some(lhs * rhs),
            problem::Op::Div => {
                if rhs != 0 && lhs % rhs == 0 {
                    return Some(lhs / rhs);
                }
            }
        }
    }
    None
}

/// Integer run ending at the tail of `text` (trailing whitespace allowed)
fn number_before(text: &str) -> Option<i64> {
    let mut digits: Vec<char> = text
        .trim_end()
        .chars()
        .rev()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    if digits.is_empty() {
        return None;
    }
    digits.reverse();
    digits.into_iter().collect::<String>().parse().ok()
}

/// Integer run at the head of `text` (leading whitespace allowed)
fn number_after(text: &str) -> Option<i64> {
    let digits: String = text
        .trim_start()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}

const FALLBACK_STORY: &str =
    "A rogue battle station jams your comms and powers up its main cannon!";
const FALLBACK_PROBLEM: &str = "Fallback mode: What is 6 × 7?";
const FALLBACK_SUCCESS: &str = "Direct hit! The station powers down.";
const FALLBACK_FAIL: &str = "The station slips away. You'll get it next time!";

/// Deterministic encounter used when generation fails outright
///
/// Fixed story, fixed arithmetic, fixed choices; cannot itself fail.
pub fn fallback_encounter() -> BossEncounter {
    BossEncounter {
        story: FALLBACK_STORY.to_string(),
        problem: FALLBACK_PROBLEM.to_string(),
        correct_answer: 42,
        choices: vec![42, 35, 48, 54],
        success_message: FALLBACK_SUCCESS.to_string(),
        fail_message: FALLBACK_FAIL.to_string(),
    }
}
