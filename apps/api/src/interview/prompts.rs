// All prompt constants and builders for the interview module.
// Reuses cross-cutting fragments from llm_client::prompts.

use crate::llm_client::prompts::JSON_ONLY_SYSTEM;
use crate::llm_client::ChatMessage;

/// Prompt for the very first question when no transcript exists yet.
pub const OPENING_QUESTION_PROMPT: &str = "\
You are an AI assistant designed to build a comprehensive user dating profile through conversation.
Ask an open-ended question to start the conversation and learn about the user.
Focus on their interests, personality, background, experiences, values, or goals.
Ensure the question is engaging, natural, and encourages a detailed response, yet is remarkably simple.

Ask your next question:";

/// Follow-up question prompt template.
/// Replace: `{remaining_topics}`, `{conversation}`.
pub const NEXT_QUESTION_TEMPLATE: &str = "\
You are an AI assistant designed to build a comprehensive user dating profile through conversation.
Based on the previous conversation, identify areas that haven't been discussed yet and ask an open-ended question about one of the following topics: {remaining_topics}.
Focus on their interests, personality, background, experiences, values, or goals.
Ensure the question is engaging, natural, and encourages detailed responses. Do not reiterate or respond to their question. Your questions should be short and to the point and emulate real human conversation.
Previous conversation:
{conversation}

Ask your next question:";

/// Profile extraction system prompt template.
/// Replace: `{json_only}`, `{conversation}`.
pub const PROFILE_EXTRACTION_TEMPLATE: &str = r#"{json_only}

You are building a structured dating profile from a completed interview.
Here is the conversation log:
{conversation}

Convert the conversation log into a JSON object describing the user. Abide by this EXACT structure (omit any field the conversation does not support):
{
  "UserID": {
    "BasicInfo": {
      "Gender": "Male",
      "Sexuality": "Heterosexual",
      "AgeGroup": "25-34",
      "RelationshipPreference": "Monogamous",
      "LocationPreference": "Urban",
      "Name": "their name",
      "Username": "put the name here too",
      "Bio": "a short paragraph about the user's life experience and self-description"
    },
    "ProfileInfo": {
      "Username": "put the name here too"
    },
    "Lifestyle": {
      "SmokingHabits": "Non-smoker",
      "DrinkingHabits": "Social drinker",
      "Diet": "Omnivore",
      "ActivityLevel": "Active",
      "Interests": ["Outdoor activities", "Music and concerts"]
    },
    "Personality": {
      "SocialStyle": "Ambivert",
      "EmotionalExpression": "Open",
      "ConflictResolution": "Compromising",
      "Spontaneity": "Flexible",
      "OpennessToExperience": "High"
    },
    "Values": {
      "FamilyOrientation": "Balanced",
      "ReligionSpirituality": "Spiritual but not religious",
      "EducationImportance": "Somewhat important",
      "CareerAmbition": "Moderately ambitious"
    },
    "RelationshipPreferences": {
      "PhysicalAffection": "Very affectionate",
      "CommunicationStyle": "Direct",
      "IndividualityInRelationship": "Keeps some independence"
    }
  }
}

Allowed values:
- AgeGroup: "18-24", "25-34", "35-44", "45-54", "55+"
- SmokingHabits: "Non-smoker", "Occasional smoker", "Smoker"
- DrinkingHabits: "Non-drinker", "Social drinker", "Regular drinker"
- Diet: "Omnivore", "Vegetarian", "Vegan"
- ActivityLevel: "Active", "Moderate", "Relaxed"
- SocialStyle: "Extroverted", "Introverted", "Ambivert"
- EmotionalExpression: "Open", "Reserved", "Selective"
- ConflictResolution: "Avoidant", "Direct", "Compromising"
- Spontaneity: "Spontaneous", "Planner", "Flexible"
- OpennessToExperience: "High", "Moderate", "Low"
- FamilyOrientation: "Family-oriented", "Independent", "Balanced"
- ReligionSpirituality: "Religious", "Spiritual but not religious", "Not religious"
- EducationImportance: "Very important", "Somewhat important", "Not important"
- CareerAmbition: "Highly ambitious", "Moderately ambitious", "Laid-back"
- PhysicalAffection: "Very affectionate", "Somewhat affectionate", "Not very affectionate"
- CommunicationStyle: "Direct", "Indirect", "Mixed"
- IndividualityInRelationship: "Shares most activities", "Keeps some independence", "Maintains strong individuality""#;

/// Fixed instruction sent as the user turn of the extraction call.
pub const PROFILE_EXTRACTION_INSTRUCTION: &str = "Generate a user profile based on the \
    conversation log. Infer as much information as possible from the conversation log.";

/// Template question for a required topic, asked directly with no model call.
pub fn required_topic_question(topic: &str) -> String {
    format!("What is your {}?", topic.to_lowercase())
}

/// Flattens a transcript into `Assistant:`/`User:` lines.
pub fn format_transcript(transcript: &[ChatMessage]) -> String {
    let mut formatted = String::new();
    for turn in transcript {
        match turn.role {
            "assistant" => {
                formatted.push_str("Assistant: ");
                formatted.push_str(&turn.content);
                formatted.push('\n');
            }
            "user" => {
                formatted.push_str("User: ");
                formatted.push_str(&turn.content);
                formatted.push('\n');
            }
            _ => {}
        }
    }
    formatted
}

/// Builds the prompt that asks the model to phrase the next open question.
pub fn build_question_prompt(transcript: &[ChatMessage], remaining: &[&str]) -> String {
    if transcript.is_empty() {
        return OPENING_QUESTION_PROMPT.to_string();
    }

    NEXT_QUESTION_TEMPLATE
        .replace("{remaining_topics}", &remaining.join(", "))
        .replace("{conversation}", &format_transcript(transcript))
}

/// Builds the extraction system prompt for a completed transcript.
pub fn build_extraction_prompt(transcript: &[ChatMessage]) -> String {
    PROFILE_EXTRACTION_TEMPLATE
        .replace("{json_only}", JSON_ONLY_SYSTEM)
        .replace("{conversation}", &format_transcript(transcript))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_topic_question_is_lowercased() {
        assert_eq!(required_topic_question("Age Group"), "What is your age group?");
    }

    #[test]
    fn test_format_transcript_labels_roles() {
        let transcript = [
            ChatMessage::assistant("What is your name?"),
            ChatMessage::user("Alice"),
        ];
        assert_eq!(
            format_transcript(&transcript),
            "Assistant: What is your name?\nUser: Alice\n"
        );
    }

    #[test]
    fn test_empty_transcript_uses_opening_prompt() {
        assert_eq!(build_question_prompt(&[], &["Diet"]), OPENING_QUESTION_PROMPT);
    }

    #[test]
    fn test_question_prompt_embeds_topics_and_conversation() {
        let transcript = [
            ChatMessage::assistant("What is your name?"),
            ChatMessage::user("Bob"),
        ];
        let prompt = build_question_prompt(&transcript, &["Playfulness", "Diet"]);
        assert!(prompt.contains("Playfulness, Diet"));
        assert!(prompt.contains("User: Bob"));
        assert!(prompt.ends_with("Ask your next question:"));
    }

    #[test]
    fn test_extraction_prompt_embeds_json_rule_and_log() {
        let transcript = [ChatMessage::user("I love hiking")];
        let prompt = build_extraction_prompt(&transcript);
        assert!(prompt.contains("valid JSON only"));
        assert!(prompt.contains("User: I love hiking"));
        assert!(!prompt.contains("{conversation}"));
    }
}
