//! The two-party dialogue engine.
//!
//! Speakers alternate every exchange (even index → first profile). After each
//! speaker turn a scripted interruption may be injected: an action from the
//! setting or an ambient event, which the following exchange then reacts to.
//! All randomness flows through the caller-supplied `Rng`, so a seeded source
//! reproduces a run exactly (given identical model output).

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::warn;

use crate::llm_client::{ChatApi, ChatMessage};
use crate::models::conversation::{ConversationTurn, MeetingSetting};
use crate::models::profile::Profile;
use crate::simulation::prompts;
use crate::simulation::settings::{AMBIENT_EVENTS, ATMOSPHERES};

/// Chance that a scripted interruption follows a speaker turn.
pub const INJECTION_PROBABILITY: f64 = 0.15;
/// Of the injections, the share that are setting actions; the rest are
/// ambient events.
pub const ACTION_SHARE: f64 = 0.7;

pub struct DialogueSimulator<'a> {
    llm: &'a dyn ChatApi,
}

impl<'a> DialogueSimulator<'a> {
    pub fn new(llm: &'a dyn ChatApi) -> Self {
        Self { llm }
    }

    /// Produces exactly `exchanges` speaker turns, interleaved with zero or
    /// more action/event turns. A failed model call yields an error
    /// placeholder message for that exchange; the dialogue moves on rather
    /// than retrying.
    pub async fn simulate<R: Rng>(
        &self,
        profile_a: &Profile,
        profile_b: &Profile,
        setting: &MeetingSetting,
        exchanges: usize,
        rng: &mut R,
    ) -> Vec<ConversationTurn> {
        let mut conversation: Vec<ConversationTurn> = Vec::with_capacity(exchanges);
        let atmosphere = ATMOSPHERES.choose(rng).copied().unwrap_or("relaxed");
        let mut context = prompts::opening_context(&setting.place, atmosphere);

        for index in 0..exchanges {
            let (speaker, listener) = if index % 2 == 0 {
                (profile_a, profile_b)
            } else {
                (profile_b, profile_a)
            };

            let prompt =
                prompts::dialogue_prompt(speaker, listener, setting, &context, &conversation);
            let message = match self.llm.complete(&[ChatMessage::system(prompt)], false).await {
                Ok(text) => text,
                Err(e) => {
                    warn!("Dialogue exchange {index} at {} failed: {e}", setting.place);
                    format!("Error: {e}")
                }
            };

            let speaker_name = speaker.display_name().to_string();
            conversation.push(ConversationTurn::Speech {
                speaker: speaker_name.clone(),
                message,
            });

            context = inject_interruption(&mut conversation, setting, &speaker_name, rng);
        }

        conversation
    }
}

/// Rolls for a scripted interruption after a speaker turn. Returns the
/// context string the next exchange should react to.
fn inject_interruption<R: Rng>(
    conversation: &mut Vec<ConversationTurn>,
    setting: &MeetingSetting,
    speaker_name: &str,
    rng: &mut R,
) -> String {
    if rng.gen::<f64>() < INJECTION_PROBABILITY {
        if rng.gen::<f64>() < ACTION_SHARE {
            if let Some(action) = setting.actions.choose(rng) {
                conversation.push(ConversationTurn::Action {
                    action: format!("{speaker_name} {action}."),
                });
                return prompts::action_context(speaker_name, action);
            }
        } else if let Some(event) = AMBIENT_EVENTS.choose(rng) {
            conversation.push(ConversationTurn::Event {
                event: event.to_string(),
            });
            return prompts::event_context(event);
        }
    }
    prompts::CONTINUE_CONTEXT.to_string()
}
