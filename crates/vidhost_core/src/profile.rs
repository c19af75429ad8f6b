use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const NAME_MAX_CHARS: usize = 50;
pub const BIO_MAX_CHARS: usize = 200;
pub const AVATAR_MAX_CHARS: usize = 2;

/// The persisted profile record. Fields missing from a stored blob take the
/// default profile's values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileData {
    pub name: String,
    pub bio: String,
    pub avatar: String,
}

impl Default for ProfileData {
    fn default() -> Self {
        Self {
            name: "My Profile".to_string(),
            bio: "User since 2024".to_string(),
            avatar: "MP".to_string(),
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProfileError {
    #[error("name cannot be empty")]
    EmptyName,
    #[error("name is longer than {} characters", NAME_MAX_CHARS)]
    NameTooLong,
    #[error("bio is longer than {} characters", BIO_MAX_CHARS)]
    BioTooLong,
}

/// Unvalidated input from the profile editor.
#[derive(Debug, Clone, Default)]
pub struct ProfileDraft {
    pub name: String,
    pub bio: String,
    pub avatar: String,
}

impl From<&ProfileData> for ProfileDraft {
    fn from(profile: &ProfileData) -> Self {
        Self {
            name: profile.name.clone(),
            bio: profile.bio.clone(),
            avatar: profile.avatar.clone(),
        }
    }
}

impl ProfileDraft {
    /// Checks the editor limits. The avatar is normalized rather than
    /// rejected: upper-cased and cut to its first two characters.
    pub fn validate(self) -> Result<ProfileData, ProfileError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(ProfileError::EmptyName);
        }
        if name.chars().count() > NAME_MAX_CHARS {
            return Err(ProfileError::NameTooLong);
        }
        if self.bio.chars().count() > BIO_MAX_CHARS {
            return Err(ProfileError::BioTooLong);
        }

        let avatar = self
            .avatar
            .trim()
            .to_uppercase()
            .chars()
            .take(AVATAR_MAX_CHARS)
            .collect();

        Ok(ProfileData {
            name: name.to_string(),
            bio: self.bio,
            avatar,
        })
    }
}
