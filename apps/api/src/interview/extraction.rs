//! Profile extraction — turns a completed interview transcript into a
//! structured `Profile` document via a JSON-mode model call.
//!
//! Unlike compatibility analysis there is no degraded form here: with no
//! parseable document there is nothing to store, so failures surface.

use tracing::{info, warn};

use crate::errors::AppError;
use crate::interview::prompts::{build_extraction_prompt, PROFILE_EXTRACTION_INSTRUCTION};
use crate::llm_client::{strip_json_fences, ChatApi, ChatMessage};
use crate::models::profile::Profile;

pub async fn extract_profile(
    llm: &dyn ChatApi,
    transcript: &[ChatMessage],
) -> Result<Profile, AppError> {
    let messages = [
        ChatMessage::system(build_extraction_prompt(transcript)),
        ChatMessage::user(PROFILE_EXTRACTION_INSTRUCTION),
    ];

    let raw = llm
        .complete(&messages, true)
        .await
        .map_err(|e| AppError::Llm(format!("Profile extraction call failed: {e}")))?;

    let profile: Profile = serde_json::from_str(strip_json_fences(&raw)).map_err(|e| {
        warn!("Profile extraction returned unparseable JSON: {e}");
        AppError::Llm(format!("Profile extraction returned unparseable JSON: {e}"))
    })?;

    info!("Extracted profile for '{}'", profile.display_name());
    Ok(profile)
}
