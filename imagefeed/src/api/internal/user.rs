use serde::Deserialize;

use crate::models::{AvatarSize, Profile};

/// The `/me` record.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProfileInternal {
    pub username: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
}

impl From<ProfileInternal> for Profile {
    fn from(value: ProfileInternal) -> Self {
        Profile::new(value.username, value.first_name, value.last_name, value.bio)
    }
}

/// The `/users/{username}` record, reduced to what the avatar needs.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UserInternal {
    #[serde(default)]
    pub profile_image: Option<ProfileImageInternal>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProfileImageInternal {
    #[serde(default)]
    pub small: Option<String>,
    #[serde(default)]
    pub medium: Option<String>,
    #[serde(default)]
    pub large: Option<String>,
}

impl UserInternal {
    pub fn avatar_url(self, size: AvatarSize) -> Option<String> {
        let image = self.profile_image?;
        match size {
            AvatarSize::Small => image.small,
            AvatarSize::Medium => image.medium,
            AvatarSize::Large => image.large,
        }
    }
}
