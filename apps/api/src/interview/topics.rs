//! Topic coverage — decides which facet of the user the interview asks about
//! next. Required topics are asked first, in fixed order; after that the
//! model chooses freely among whatever optional topics remain.

use std::collections::HashSet;

/// Topics that must all be covered, in this order, before anything else.
pub const REQUIRED_TOPICS: &[&str] = &["Name", "Gender", "Sexuality", "Age Group"];

/// The long tail of optional topics offered to the model once the required
/// ones are covered.
pub const OPTIONAL_TOPICS: &[&str] = &[
    "Emotional Dependency",
    "Imagination and Fantasy",
    "Sentimental Attachment",
    "Expectations Management",
    "Spontaneity vs Routine",
    "Self-Narrative",
    "Physical Affection",
    "Curiosity and Learning Style",
    "Playfulness",
    "Empathy and Boundaries",
    "Individuality in Relationships",
    "Comfort with Boredom",
    "Attitude Toward Authority",
    "Comfort Rituals",
    "Gift Preferences",
    "Food and Shared Meals",
    "Emotional Risk Taking",
    "Adaptability to Changes",
    "Detail Orientation vs Big Picture",
    "Openness to Sharing Thoughts",
    "Handling Criticism",
    "Creativity and Art",
    "Patience Level",
    "Attitude Towards Aging",
    "Repetition and Habits",
    "Kindness to Strangers",
    "Fantasy vs Reality",
    "Handling Awkward Situations",
    "Appreciation of Beauty",
    "Technology and Connectivity",
    "Conflict Resolution Style",
    "Handling Success and Failure",
    "Openness to Growth",
    "Location and Lifestyle Preferences",
    "Interests and Hobbies",
    "Education and Intellectual Compatibility",
    "Social Preferences",
    "Family Dynamics",
    "Past Relationships",
    "Religion and Spiritual Beliefs",
    "Relationship Preferences",
    "Activity Preferences",
    "Education Level",
    "Diet",
    "Smoking Habits",
    "Drinking Habits",
    "Spirituality and Religion",
];

/// Outcome of a topic selection pass.
#[derive(Debug, Clone, PartialEq)]
pub enum TopicChoice {
    /// The first required topic not yet covered. Asked with a fixed template
    /// question and tracked through the session's pending slot.
    Required(&'static str),
    /// All required topics are covered: the model may choose freely among the
    /// remaining optional topics (possibly none once everything is covered).
    Open(Vec<&'static str>),
}

/// Ordered required/optional topic lists with deterministic selection.
#[derive(Debug, Clone)]
pub struct TopicTracker {
    required: &'static [&'static str],
    optional: &'static [&'static str],
}

impl Default for TopicTracker {
    fn default() -> Self {
        Self {
            required: REQUIRED_TOPICS,
            optional: OPTIONAL_TOPICS,
        }
    }
}

impl TopicTracker {
    /// Selects the next topic for a given covered set. Identical covered sets
    /// always yield identical choices.
    pub fn next_topic(&self, covered: &HashSet<String>) -> TopicChoice {
        for topic in self.required {
            if !covered.contains(*topic) {
                return TopicChoice::Required(topic);
            }
        }

        TopicChoice::Open(
            self.optional
                .iter()
                .copied()
                .filter(|topic| !covered.contains(*topic))
                .collect(),
        )
    }
}
