//! The structured personal profile built from an interview and stored as a
//! JSONB document. Shape matches the extraction schema: a single `UserID`
//! object holding PascalCase sections, every leaf optional because the model
//! infers only what the conversation supports.

use serde::{Deserialize, Serialize};

/// Canonical fallback when no name field is present anywhere in the document.
pub const DEFAULT_DISPLAY_NAME: &str = "User";

/// A profile attribute that may be stored as a single value or a list.
/// Generated documents are inconsistent about this, so both shapes parse.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum TraitValue {
    One(String),
    Many(Vec<String>),
}

impl TraitValue {
    pub fn first(&self) -> Option<&str> {
        match self {
            TraitValue::One(value) => Some(value.as_str()),
            TraitValue::Many(values) => values.first().map(String::as_str),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Profile {
    #[serde(rename = "UserID", default)]
    pub user: UserSection,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct UserSection {
    #[serde(default)]
    pub basic_info: BasicInfo,
    #[serde(default)]
    pub profile_info: ProfileInfo,
    #[serde(default)]
    pub lifestyle: Lifestyle,
    #[serde(default)]
    pub personality: Personality,
    #[serde(default)]
    pub values: Values,
    #[serde(default)]
    pub relationship_preferences: RelationshipPreferences,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct BasicInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<TraitValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sexuality: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age_group: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relationship_preference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_preference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct ProfileInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct Lifestyle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub smoking_habits: Option<TraitValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drinking_habits: Option<TraitValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diet: Option<TraitValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activity_level: Option<TraitValue>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub interests: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct Personality {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub social_style: Option<TraitValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emotional_expression: Option<TraitValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conflict_resolution: Option<TraitValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spontaneity: Option<TraitValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openness_to_experience: Option<TraitValue>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct Values {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family_orientation: Option<TraitValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub religion_spirituality: Option<TraitValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub education_importance: Option<TraitValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub career_ambition: Option<TraitValue>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct RelationshipPreferences {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub physical_affection: Option<TraitValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub communication_style: Option<TraitValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub individuality_in_relationship: Option<TraitValue>,
}

impl Profile {
    /// Resolves the name a profile is addressed by, in fixed fallback order:
    /// profile-section username, then basic-info username, then basic-info
    /// name, then the literal default. Defined once here; callers must not
    /// re-derive the chain.
    pub fn display_name(&self) -> &str {
        self.user
            .profile_info
            .username
            .as_deref()
            .or(self.user.basic_info.username.as_deref())
            .or(self.user.basic_info.name.as_deref())
            .unwrap_or(DEFAULT_DISPLAY_NAME)
    }

    /// Normalized gender for match filtering: first value if a list,
    /// trimmed and lowercased. `None` when absent or blank.
    pub fn declared_gender(&self) -> Option<String> {
        self.user
            .basic_info
            .gender
            .as_ref()
            .and_then(TraitValue::first)
            .map(|g| g.trim().to_lowercase())
            .filter(|g| !g.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn profile_from(value: serde_json::Value) -> Profile {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_display_name_prefers_profile_section_username() {
        let profile = profile_from(json!({
            "UserID": {
                "ProfileInfo": {"Username": "sunny"},
                "BasicInfo": {"Username": "alice_b", "Name": "Alice"}
            }
        }));
        assert_eq!(profile.display_name(), "sunny");
    }

    #[test]
    fn test_display_name_falls_back_to_basic_info_username_then_name() {
        let profile = profile_from(json!({
            "UserID": {"BasicInfo": {"Username": "alice_b", "Name": "Alice"}}
        }));
        assert_eq!(profile.display_name(), "alice_b");

        let profile = profile_from(json!({
            "UserID": {"BasicInfo": {"Name": "Alice"}}
        }));
        assert_eq!(profile.display_name(), "Alice");
    }

    #[test]
    fn test_display_name_default_when_document_is_empty() {
        assert_eq!(Profile::default().display_name(), DEFAULT_DISPLAY_NAME);
    }

    #[test]
    fn test_declared_gender_accepts_scalar_and_list() {
        let scalar = profile_from(json!({
            "UserID": {"BasicInfo": {"Gender": "Male"}}
        }));
        assert_eq!(scalar.declared_gender().as_deref(), Some("male"));

        let list = profile_from(json!({
            "UserID": {"BasicInfo": {"Gender": ["Female", "Nonbinary"]}}
        }));
        assert_eq!(list.declared_gender().as_deref(), Some("female"));
    }

    #[test]
    fn test_declared_gender_none_when_missing_or_blank() {
        assert_eq!(Profile::default().declared_gender(), None);

        let blank = profile_from(json!({
            "UserID": {"BasicInfo": {"Gender": "  "}}
        }));
        assert_eq!(blank.declared_gender(), None);
    }

    #[test]
    fn test_full_document_round_trips() {
        let document = json!({
            "UserID": {
                "BasicInfo": {
                    "Gender": "Female",
                    "Sexuality": "Heterosexual",
                    "AgeGroup": "25-34",
                    "RelationshipPreference": "Monogamous",
                    "LocationPreference": "Urban",
                    "Name": "Maria",
                    "Username": "maria",
                    "Bio": "Yoga instructor who loves the outdoors."
                },
                "ProfileInfo": {"Username": "maria"},
                "Lifestyle": {
                    "SmokingHabits": "Non-smoker",
                    "DrinkingHabits": "Social drinker",
                    "Diet": "Vegan",
                    "ActivityLevel": "Active",
                    "Interests": ["Outdoor activities", "Cooking and food"]
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
        });

        let profile: Profile = serde_json::from_value(document.clone()).unwrap();
        assert_eq!(profile.display_name(), "maria");
        assert_eq!(profile.user.lifestyle.interests.len(), 2);
        assert_eq!(serde_json::to_value(&profile).unwrap(), document);
    }
}
