//! Conversation and compatibility entities. Turns are append-only: once a
//! turn is pushed onto a transcript it is never mutated.

use serde::{Deserialize, Serialize};

/// One turn of a simulated dialogue. Serialized by shape, matching the stored
/// document format: `{speaker, message}` | `{action}` | `{event}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ConversationTurn {
    Speech { speaker: String, message: String },
    Action { action: String },
    Event { event: String },
}

impl ConversationTurn {
    /// The speaker/message pair for speech turns; `None` for scripted
    /// action/event turns.
    pub fn speech(&self) -> Option<(&str, &str)> {
        match self {
            ConversationTurn::Speech { speaker, message } => {
                Some((speaker.as_str(), message.as_str()))
            }
            _ => None,
        }
    }

    pub fn is_speech(&self) -> bool {
        self.speech().is_some()
    }

    /// Human-readable single line, used for stored conversation documents.
    pub fn display_line(&self) -> String {
        match self {
            ConversationTurn::Speech { speaker, message } => format!("{speaker}: {message}"),
            ConversationTurn::Action { action } => format!("Action: {action}"),
            ConversationTurn::Event { event } => format!("Event: {event}"),
        }
    }
}

/// An immutable meeting venue plus the scripted actions available there.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MeetingSetting {
    pub place: String,
    pub actions: Vec<String>,
}

/// The analyzed outcome of one simulated encounter. A `None` score marks a
/// degraded result (the model response yielded no recoverable score) and is
/// deliberately distinguishable from a real score all the way to ranking.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompatibilityResult {
    pub compatibility_score: Option<u8>,
    pub summary: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_turn_deserializes_by_shape() {
        let speech: ConversationTurn =
            serde_json::from_value(json!({"speaker": "Alice", "message": "Hi!"})).unwrap();
        assert_eq!(speech.speech(), Some(("Alice", "Hi!")));

        let action: ConversationTurn =
            serde_json::from_value(json!({"action": "Alice feeds the ducks."})).unwrap();
        assert!(!action.is_speech());

        let event: ConversationTurn =
            serde_json::from_value(json!({"event": "A gentle breeze picks up."})).unwrap();
        assert!(matches!(event, ConversationTurn::Event { .. }));
    }

    #[test]
    fn test_display_line_formats() {
        let speech = ConversationTurn::Speech {
            speaker: "Bob".to_string(),
            message: "Nice ferris wheel.".to_string(),
        };
        assert_eq!(speech.display_line(), "Bob: Nice ferris wheel.");

        let action = ConversationTurn::Action {
            action: "Bob plays arcade games.".to_string(),
        };
        assert_eq!(action.display_line(), "Action: Bob plays arcade games.");

        let event = ConversationTurn::Event {
            event: "Someone sneezes loudly.".to_string(),
        };
        assert_eq!(event.display_line(), "Event: Someone sneezes loudly.");
    }

    #[test]
    fn test_turn_serialization_round_trips() {
        let turns = vec![
            ConversationTurn::Speech {
                speaker: "A".to_string(),
                message: "m".to_string(),
            },
            ConversationTurn::Action {
                action: "a".to_string(),
            },
            ConversationTurn::Event {
                event: "e".to_string(),
            },
        ];
        let json = serde_json::to_string(&turns).unwrap();
        let recovered: Vec<ConversationTurn> = serde_json::from_str(&json).unwrap();
        assert_eq!(recovered, turns);
    }
}
