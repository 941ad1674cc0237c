use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SlackUser {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub real_name: Option<String>,
    #[serde(default)]
    pub profile: SlackUserProfile,
    #[serde(default)]
    pub deleted: bool,
    #[serde(default)]
    pub is_bot: bool,
}

#[derive(Debug, Default, Deserialize, Serialize, Clone)]
pub struct SlackUserProfile {
    pub display_name: Option<String>,
    pub real_name: Option<String>,
}

impl SlackUser {
    /// Display name, falling back to the profile's real name when blank.
    pub fn preferred_name(&self) -> &str {
        match self.profile.display_name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => self
                .profile
                .real_name
                .as_deref()
                .or(self.real_name.as_deref())
                .unwrap_or(""),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UsersListResponse {
    #[serde(default)]
    pub members: Vec<SlackUser>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preferred_name_falls_back_to_real_name() {
        let user: SlackUser = serde_json::from_str(
            r#"{"id": "U1", "name": "jdoe", "profile": {"display_name": "", "real_name": "Jane Doe"}}"#,
        )
        .unwrap();
        assert_eq!(user.preferred_name(), "Jane Doe");

        let user: SlackUser = serde_json::from_str(
            r#"{"id": "U2", "name": "bob", "profile": {"display_name": "bobby", "real_name": "Bob"}}"#,
        )
        .unwrap();
        assert_eq!(user.preferred_name(), "bobby");
    }

    #[test]
    fn test_missing_profile_is_tolerated() {
        let user: SlackUser = serde_json::from_str(r#"{"id": "U3"}"#).unwrap();
        assert_eq!(user.preferred_name(), "");
        assert!(!user.deleted);
    }
}
