use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// What the engine knows about the user in one conversation.
///
/// Merge rules (see `UserProfile::merge`):
/// - skills: union, never shrinks
/// - location: first non-empty value wins
/// - preferences / education: last non-empty value wins
/// - experience: last detected value wins
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub skills: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferences: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experience: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub education: Option<String>,
}

/// Attributes extracted from a single message, not yet merged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileDelta {
    pub skills: BTreeSet<String>,
    pub location: Option<String>,
    pub preferences: Option<String>,
    pub experience: Option<String>,
    pub education: Option<String>,
}

impl ProfileDelta {
    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
            && self.location.is_none()
            && self.preferences.is_none()
            && self.experience.is_none()
            && self.education.is_none()
    }
}

impl From<UserProfile> for ProfileDelta {
    fn from(profile: UserProfile) -> Self {
        ProfileDelta {
            skills: profile
                .skills
                .into_iter()
                .map(|s| s.trim().to_lowercase())
                .filter(|s| !s.is_empty())
                .collect(),
            location: non_empty(profile.location),
            preferences: non_empty(profile.preferences),
            experience: non_empty(profile.experience),
            education: non_empty(profile.education),
        }
    }
}

impl UserProfile {
    pub fn has_skills(&self) -> bool {
        !self.skills.is_empty()
    }

    /// Applies a delta under the field-specific merge rules.
    /// Applying the same delta twice leaves the profile unchanged the second time.
    pub fn merge(&mut self, delta: ProfileDelta) {
        self.skills.extend(delta.skills);

        if self.location.as_deref().map_or(true, str::is_empty) {
            if let Some(location) = non_empty(delta.location) {
                self.location = Some(location);
            }
        }
        if let Some(preferences) = non_empty(delta.preferences) {
            self.preferences = Some(preferences);
        }
        if let Some(experience) = non_empty(delta.experience) {
            self.experience = Some(experience);
        }
        if let Some(education) = non_empty(delta.education) {
            self.education = Some(education);
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
