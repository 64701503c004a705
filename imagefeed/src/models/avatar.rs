use serde::{Deserialize, Serialize};

/// Which `profile_image` variant of a user record becomes the avatar URL.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AvatarSize {
    Small,
    Medium,
    #[default]
    Large,
}

impl From<&str> for AvatarSize {
    fn from(value: &str) -> Self {
        match value {
            "small" => AvatarSize::Small,
            "medium" => AvatarSize::Medium,
            _ => AvatarSize::Large, // Default case
        }
    }
}

impl From<&AvatarSize> for &str {
    fn from(value: &AvatarSize) -> Self {
        match value {
            AvatarSize::Small => "small",
            AvatarSize::Medium => "medium",
            AvatarSize::Large => "large",
        }
    }
}
