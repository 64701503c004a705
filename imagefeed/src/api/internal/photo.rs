use chrono::{DateTime, FixedOffset};
use log::warn;
use serde::Deserialize;

use crate::error::NetworkError;
use crate::models::{Photo, PhotoSize};

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PhotoInternal {
    pub id: String,
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub urls: UrlsInternal,
    #[serde(default)]
    pub liked_by_user: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UrlsInternal {
    #[serde(default)]
    pub raw: Option<String>,
    #[serde(default)]
    pub full: Option<String>,
    #[serde(default)]
    pub regular: Option<String>,
    #[serde(default)]
    pub small: Option<String>,
    pub thumb: String,
}

/// Body of a like / unlike answer.
#[derive(Debug, Clone, Deserialize)]
pub struct LikeResponseInternal {
    pub photo: LikedPhotoInternal,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LikedPhotoInternal {
    pub id: String,
    pub liked_by_user: bool,
}

pub(crate) fn parse_created_at(id: &str, created_at: Option<&str>) -> Option<DateTime<FixedOffset>> {
    let raw = created_at?;
    match DateTime::parse_from_rfc3339(raw) {
        Ok(date) => Some(date),
        Err(e) => {
            warn!("photo {id} has unparseable created_at {raw:?}: {e}");
            None
        }
    }
}

impl TryFrom<PhotoInternal> for Photo {
    type Error = NetworkError;

    fn try_from(value: PhotoInternal) -> Result<Self, Self::Error> {
        let created_at = parse_created_at(&value.id, value.created_at.as_deref());
        let full_url = value
            .urls
            .full
            .or(value.urls.regular)
            .ok_or_else(|| {
                NetworkError::Decoding(format!("photo {} has no full or regular url", value.id))
            })?;
        Ok(Self {
            id: value.id,
            size: PhotoSize::new(value.width, value.height),
            created_at,
            description: value.description,
            thumb_url: value.urls.thumb,
            full_url,
            is_liked: value.liked_by_user,
        })
    }
}
