// All prompt constants and builders for the simulation module. Builders are
// pure functions over profiles, settings, and transcripts. No state.

use crate::llm_client::prompts::JSON_ONLY_SYSTEM;
use crate::models::conversation::{ConversationTurn, MeetingSetting};
use crate::models::profile::Profile;

/// How many trailing turns the speaker can "remember". Anything earlier is
/// deliberately invisible to keep prompt size bounded.
pub const HISTORY_WINDOW: usize = 5;

/// Context string used when nothing scripted happened after the last turn.
pub const CONTINUE_CONTEXT: &str =
    "Continue the conversation naturally, considering the setting and previous messages.";

/// Dialogue prompt template.
/// Replace: `{speaker_name}`, `{listener_name}`, `{place}`, `{profile_json}`,
///          `{context}`, `{history}`.
const DIALOGUE_PROMPT_TEMPLATE: &str = "\
You are {speaker_name}, on a date with {listener_name} at {place}.
Your profile:
{profile_json}

Remember:
1. Be yourself and speak naturally, as if in a real conversation.
2. Keep responses brief (1-3 sentences) unless the context demands more.
3. React to the setting, context, and previous messages.
4. Show interest in {listener_name} by asking questions occasionally.
5. Use contractions, casual language, and even light humor if it fits your personality.

Current context: {context}

Conversation history:
{history}
Respond as {speaker_name}:";

/// Compatibility analysis system prompt template.
/// Replace: `{json_only}`, `{name_a}`, `{name_b}`, `{profile_a}`, `{profile_b}`.
const ANALYSIS_SYSTEM_TEMPLATE: &str = r#"{json_only}

You are an AI relationship analyst. Analyze the conversation between {name_a} and {name_b}. Determine their compatibility based on their interaction, shared interests, personalities, and communication styles. Be very strict and look at this deeper than just the conversation: compare the profiles to judge whether they are long-term compatible and whether they should go on another date.

Profile 1:
{profile_a}

Profile 2:
{profile_b}

Output a confidence score between 0 and 100 for their compatibility, and a short summary of the pros and cons of the relationship.
Adhere to the following JSON structure and only return the JSON object:
{
    "compatibility_score": 0,
    "summary": "short summary of the pros and cons of the relationship"
}"#;

fn profile_json(profile: &Profile) -> String {
    serde_json::to_string_pretty(&profile.user).unwrap_or_else(|_| "{}".to_string())
}

/// Builds the single system-role prompt for one dialogue exchange. Only the
/// last `HISTORY_WINDOW` turns of the transcript are included.
pub fn dialogue_prompt(
    speaker: &Profile,
    listener: &Profile,
    setting: &MeetingSetting,
    context: &str,
    history: &[ConversationTurn],
) -> String {
    let window_start = history.len().saturating_sub(HISTORY_WINDOW);
    let history_text: String = history[window_start..]
        .iter()
        .map(|turn| format!("{}\n", turn.display_line()))
        .collect();

    DIALOGUE_PROMPT_TEMPLATE
        .replace("{speaker_name}", speaker.display_name())
        .replace("{listener_name}", listener.display_name())
        .replace("{place}", &setting.place)
        .replace("{profile_json}", &profile_json(speaker))
        .replace("{context}", context)
        .replace("{history}", &history_text)
}

/// Builds the analyst system prompt embedding both full profiles.
pub fn analysis_system_prompt(a: &Profile, b: &Profile) -> String {
    ANALYSIS_SYSTEM_TEMPLATE
        .replace("{json_only}", JSON_ONLY_SYSTEM)
        .replace("{name_a}", a.display_name())
        .replace("{name_b}", b.display_name())
        .replace("{profile_a}", &profile_json(a))
        .replace("{profile_b}", &profile_json(b))
}

/// Flattens a dialogue to `speaker: message` lines for the analyst.
/// Action and event turns carry no message and are excluded.
pub fn conversation_text(turns: &[ConversationTurn]) -> String {
    turns
        .iter()
        .filter_map(ConversationTurn::speech)
        .map(|(speaker, message)| format!("{speaker}: {message}"))
        .collect::<Vec<_>>()
        .join("\n")
}

// Rolling context lines, consumed by the exchange after an injection.

pub fn opening_context(place: &str, atmosphere: &str) -> String {
    format!("You've just arrived at {place}. The atmosphere is {atmosphere}.")
}

pub fn action_context(actor: &str, action: &str) -> String {
    format!("React to {actor}'s action: {action}")
}

pub fn event_context(event: &str) -> String {
    format!("React to this event: {event}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn named_profile(name: &str) -> Profile {
        serde_json::from_value(json!({
            "UserID": {"BasicInfo": {"Name": name}}
        }))
        .unwrap()
    }

    fn pier() -> MeetingSetting {
        MeetingSetting {
            place: "Santa Monica Pier".to_string(),
            actions: vec!["ride the Ferris wheel".to_string()],
        }
    }

    #[test]
    fn test_dialogue_prompt_embeds_names_setting_and_context() {
        let alice = named_profile("Alice");
        let bob = named_profile("Bob");

        let prompt = dialogue_prompt(&alice, &bob, &pier(), "Say hi.", &[]);
        assert!(prompt.starts_with("You are Alice, on a date with Bob at Santa Monica Pier."));
        assert!(prompt.contains("Current context: Say hi."));
        assert!(prompt.contains("\"Name\": \"Alice\""));
        assert!(prompt.ends_with("Respond as Alice:"));
    }

    #[test]
    fn test_dialogue_prompt_windows_history_to_last_five() {
        let alice = named_profile("Alice");
        let bob = named_profile("Bob");
        let history: Vec<ConversationTurn> = (0..8)
            .map(|i| ConversationTurn::Speech {
                speaker: "Alice".to_string(),
                message: format!("line {i}"),
            })
            .collect();

        let prompt = dialogue_prompt(&alice, &bob, &pier(), "ctx", &history);
        assert!(!prompt.contains("line 2"));
        assert!(prompt.contains("line 3"));
        assert!(prompt.contains("line 7"));
    }

    #[test]
    fn test_conversation_text_excludes_actions_and_events() {
        let turns = vec![
            ConversationTurn::Speech {
                speaker: "Alice".to_string(),
                message: "Hello!".to_string(),
            },
            ConversationTurn::Action {
                action: "Alice feeds the ducks.".to_string(),
            },
            ConversationTurn::Event {
                event: "A breeze picks up.".to_string(),
            },
            ConversationTurn::Speech {
                speaker: "Bob".to_string(),
                message: "Hi there.".to_string(),
            },
        ];
        assert_eq!(conversation_text(&turns), "Alice: Hello!\nBob: Hi there.");
    }

    #[test]
    fn test_analysis_prompt_embeds_both_profiles_and_json_rule() {
        let prompt = analysis_system_prompt(&named_profile("Alice"), &named_profile("Bob"));
        assert!(prompt.contains("valid JSON only"));
        assert!(prompt.contains("between Alice and Bob"));
        assert!(prompt.contains("compatibility_score"));
    }
}
