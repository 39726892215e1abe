//! Compatibility analysis — turns a finished dialogue plus both profiles into
//! a score and rationale.
//!
//! The model is instructed to return strict JSON but is not trusted to.
//! Recovery is an ordered chain of parser stages; whatever survives becomes
//! the result, and a response that defeats every stage degrades to a
//! score-absent result instead of an error.

use std::sync::OnceLock;

use regex::Regex;
use serde::Deserialize;
use tracing::warn;

use crate::llm_client::{strip_json_fences, ChatApi, ChatMessage};
use crate::models::conversation::{CompatibilityResult, ConversationTurn};
use crate::models::profile::Profile;
use crate::simulation::prompts;

/// Runs the analyst model call and parses whatever comes back. Never fails:
/// an upstream error degrades to a score-absent result with the diagnostic
/// as summary.
pub async fn analyze(
    llm: &dyn ChatApi,
    conversation: &[ConversationTurn],
    profile_a: &Profile,
    profile_b: &Profile,
) -> CompatibilityResult {
    let messages = [
        ChatMessage::system(prompts::analysis_system_prompt(profile_a, profile_b)),
        ChatMessage::user(format!(
            "Analyze the following conversation:\n\n{}",
            prompts::conversation_text(conversation)
        )),
    ];

    match llm.complete(&messages, true).await {
        Ok(raw) => parse_analysis(&raw),
        Err(e) => {
            warn!("Compatibility analysis call failed: {e}");
            CompatibilityResult {
                compatibility_score: None,
                summary: format!("Error: {e}"),
            }
        }
    }
}

/// Shape of a well-behaved analyst response. Both fields default so a
/// partially conforming object still parses.
#[derive(Debug, Deserialize)]
struct RawAnalysis {
    #[serde(default)]
    compatibility_score: Option<i64>,
    #[serde(default)]
    summary: Option<String>,
}

/// The parse chain, first success wins:
/// 1. structured parse of the fence-stripped response with a score present;
/// 2. pattern extraction of a number following the `compatibility_score` key
///    in the raw text;
/// 3. a pattern-recovered score merged back into the structured parse when
///    one exists, else synthesized with the raw text as summary;
/// 4. nothing recoverable: a score-absent result carrying the raw text.
pub fn parse_analysis(raw: &str) -> CompatibilityResult {
    let structured: Option<RawAnalysis> = serde_json::from_str(strip_json_fences(raw)).ok();

    if let Some(analysis) = &structured {
        if let Some(score) = analysis.compatibility_score {
            return CompatibilityResult {
                compatibility_score: Some(clamp_score(score)),
                summary: analysis
                    .summary
                    .clone()
                    .unwrap_or_else(|| raw.to_string()),
            };
        }
    }

    if let Some(score) = extract_score_pattern(raw) {
        let summary = structured
            .and_then(|analysis| analysis.summary)
            .unwrap_or_else(|| raw.to_string());
        return CompatibilityResult {
            compatibility_score: Some(score),
            summary,
        };
    }

    CompatibilityResult {
        compatibility_score: None,
        summary: raw.to_string(),
    }
}

fn clamp_score(score: i64) -> u8 {
    score.clamp(0, 100) as u8
}

static SCORE_PATTERN: OnceLock<Regex> = OnceLock::new();

/// Finds a numeric value directly following the literal key, quoted or not,
/// anywhere in the text.
fn extract_score_pattern(raw: &str) -> Option<u8> {
    let pattern = SCORE_PATTERN.get_or_init(|| {
        Regex::new(r#""compatibility_score"\s*:\s*(\d+)"#).expect("score pattern is valid")
    });

    pattern
        .captures(raw)
        .and_then(|captures| captures[1].parse::<i64>().ok())
        .map(clamp_score)
}
