//! The scripted scenery: meeting venues with their available actions, the
//! ambient events that can interrupt any conversation, and the atmosphere
//! words used to open one.

use crate::models::conversation::MeetingSetting;

/// The venues a simulated date can take place at. Every matching run plays
/// each venue once per candidate pair.
pub fn meeting_settings() -> Vec<MeetingSetting> {
    [
        (
            "Santa Monica Pier",
            &[
                "ride the Ferris wheel",
                "play arcade games",
                "watch the sunset",
            ][..],
        ),
        (
            "Echo Park Lake",
            &["rent a pedal boat", "have a picnic", "feed the ducks"][..],
        ),
        ("Malibu Beach", &["sunbathe", "surf", "celebrity-spot"][..]),
    ]
    .iter()
    .map(|(place, actions)| MeetingSetting {
        place: place.to_string(),
        actions: actions.iter().map(|a| a.to_string()).collect(),
    })
    .collect()
}

/// Environmental interruptions, drawn uniformly when an event is injected.
pub const AMBIENT_EVENTS: &[&str] = &[
    "A gentle breeze picks up.",
    "Someone's phone starts ringing.",
    "A child laughs loudly nearby.",
    "A delivery person walks by with a stack of packages.",
    "The sound of construction work can be heard faintly.",
    "Someone drops their keys and scrambles to pick them up.",
    "A leaf falls from a nearby tree.",
    "Someone sneezes loudly.",
    "A group of tourists asks for directions.",
    "The smell of food wafts from a nearby restaurant.",
    "A jogger runs past, breathing heavily.",
    "A street musician starts playing in the distance.",
    "The crosswalk signal changes, prompting people to cross.",
    "A car alarm goes off briefly before being silenced.",
    "A gust of wind blows a piece of paper down the street.",
    "A couple walks by holding hands.",
    "Someone takes a selfie nearby.",
    "A person checks their watch and hurries along.",
    "The sound of laughter comes from a nearby group.",
    "A bird chirps from a nearby tree or building.",
    "Someone's bag splits open, spilling contents on the ground.",
    "A person struggles with an umbrella on a windy day.",
    "The smell of coffee drifts from a nearby cafe.",
    "A street cleaner passes by.",
    "Someone stops to tie their shoelace.",
    "A person fumbles with their wallet at a nearby vendor.",
    "The sound of a camera shutter clicking is heard.",
    "A group of friends greet each other enthusiastically.",
];

/// Atmosphere words for the opening context line.
pub const ATMOSPHERES: &[&str] = &["lively", "relaxed", "romantic", "bustling"];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_setting_has_actions() {
        let settings = meeting_settings();
        assert!(!settings.is_empty());
        for setting in &settings {
            assert!(!setting.place.is_empty());
            assert!(!setting.actions.is_empty(), "{} has no actions", setting.place);
        }
    }

    #[test]
    fn test_ambient_lists_are_nonempty() {
        assert!(!AMBIENT_EVENTS.is_empty());
        assert!(!ATMOSPHERES.is_empty());
    }
}
