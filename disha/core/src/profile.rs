//! User Profile
//!
//! The four free-text answers collected during onboarding. A complete
//! [`UserProfile`] is immutable for the rest of the run; while onboarding is
//! in progress the answers live in a [`PartialProfile`].

use serde::{Deserialize, Serialize};

/// Student profile used to personalize the advisor
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// What the student wants to be called
    pub name: String,
    /// Topics and activities they are passionate about
    pub interests: String,
    /// Things they are good at
    pub skills: String,
    /// A few words about their personality
    pub personality: String,
}

impl UserProfile {
    /// Create a profile from its four answers
    pub fn new(
        name: impl Into<String>,
        interests: impl Into<String>,
        skills: impl Into<String>,
        personality: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            interests: interests.into(),
            skills: skills.into(),
            personality: personality.into(),
        }
    }

    /// Read one field by key
    #[must_use]
    pub fn get(&self, field: ProfileField) -> &str {
        match field {
            ProfileField::Name => &self.name,
            ProfileField::Interests => &self.interests,
            ProfileField::Skills => &self.skills,
            ProfileField::Personality => &self.personality,
        }
    }

    /// First field that is blank, if any
    #[must_use]
    pub fn first_missing(&self) -> Option<ProfileField> {
        ProfileField::ALL
            .into_iter()
            .find(|f| self.get(*f).trim().is_empty())
    }

    /// Whether every field has a non-blank answer
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.first_missing().is_none()
    }
}

/// Profile field keys, one per onboarding step
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileField {
    /// Display name
    Name,
    /// Interests
    Interests,
    /// Skills
    Skills,
    /// Personality
    Personality,
}

impl ProfileField {
    /// All fields in onboarding order
    pub const ALL: [ProfileField; 4] = [
        ProfileField::Name,
        ProfileField::Interests,
        ProfileField::Skills,
        ProfileField::Personality,
    ];

    /// Storage key of this field
    #[must_use]
    pub fn key(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Interests => "interests",
            Self::Skills => "skills",
            Self::Personality => "personality",
        }
    }
}

impl std::fmt::Display for ProfileField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// Answers gathered so far during onboarding
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PartialProfile {
    name: Option<String>,
    interests: Option<String>,
    skills: Option<String>,
    personality: Option<String>,
}

impl PartialProfile {
    /// Empty record
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, field: ProfileField) -> &Option<String> {
        match field {
            ProfileField::Name => &self.name,
            ProfileField::Interests => &self.interests,
            ProfileField::Skills => &self.skills,
            ProfileField::Personality => &self.personality,
        }
    }

    fn slot_mut(&mut self, field: ProfileField) -> &mut Option<String> {
        match field {
            ProfileField::Name => &mut self.name,
            ProfileField::Interests => &mut self.interests,
            ProfileField::Skills => &mut self.skills,
            ProfileField::Personality => &mut self.personality,
        }
    }

    /// Current answer for a field
    #[must_use]
    pub fn get(&self, field: ProfileField) -> Option<&str> {
        self.slot(field).as_deref()
    }

    /// Replace the answer for a field
    pub fn set(&mut self, field: ProfileField, value: impl Into<String>) {
        *self.slot_mut(field) = Some(value.into());
    }

    /// Whether a field holds a non-blank answer
    #[must_use]
    pub fn is_present(&self, field: ProfileField) -> bool {
        self.get(field).is_some_and(|v| !v.trim().is_empty())
    }

    /// Validate and build the final profile
    ///
    /// # Errors
    ///
    /// Returns the first field without a non-blank answer.
    pub fn into_profile(self) -> Result<UserProfile, ProfileField> {
        if let Some(missing) = ProfileField::ALL.into_iter().find(|f| !self.is_present(*f)) {
            return Err(missing);
        }
        Ok(UserProfile {
            name: self.name.unwrap_or_default(),
            interests: self.interests.unwrap_or_default(),
            skills: self.skills.unwrap_or_default(),
            personality: self.personality.unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_json_shape() {
        let profile = UserProfile::new("Priya", "biology", "math", "curious");
        let json = serde_json::to_value(&profile).unwrap();
        assert_eq!(json["name"], "Priya");
        assert_eq!(json["interests"], "biology");
        assert_eq!(json["skills"], "math");
        assert_eq!(json["personality"], "curious");
    }

    #[test]
    fn test_blank_field_is_missing() {
        let profile = UserProfile::new("Priya", "  ", "math", "curious");
        assert_eq!(profile.first_missing(), Some(ProfileField::Interests));
        assert!(!profile.is_complete());
    }

    #[test]
    fn test_partial_profile_builds_when_complete() {
        let mut partial = PartialProfile::new();
        partial.set(ProfileField::Name, "Priya");
        partial.set(ProfileField::Interests, "biology");
        partial.set(ProfileField::Skills, "math");
        assert_eq!(
            partial.clone().into_profile(),
            Err(ProfileField::Personality)
        );

        partial.set(ProfileField::Personality, "curious");
        let profile = partial.into_profile().unwrap();
        assert_eq!(profile, UserProfile::new("Priya", "biology", "math", "curious"));
    }

    #[test]
    fn test_partial_profile_keeps_answers_per_key() {
        let mut partial = PartialProfile::new();
        partial.set(ProfileField::Name, "Arjun");
        partial.set(ProfileField::Skills, "drawing");
        assert_eq!(partial.get(ProfileField::Name), Some("Arjun"));
        assert_eq!(partial.get(ProfileField::Skills), Some("drawing"));
        assert_eq!(partial.get(ProfileField::Interests), None);
    }
}
