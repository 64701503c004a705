use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoSize {
    pub width: u32,
    pub height: u32,
}

impl PhotoSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Height divided by width, used to lay a photo out at a given width.
    /// Zero-width photos report 0.
    pub fn aspect_ratio(&self) -> f64 {
        if self.width == 0 {
            return 0.0;
        }
        f64::from(self.height) / f64::from(self.width)
    }
}

/// A photo of the feed.
///
/// `id` is assigned by the server and unique within a feed collection.
/// `is_liked` only changes through a like toggle answered by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Photo {
    pub id: String,
    pub size: PhotoSize,
    pub created_at: Option<DateTime<FixedOffset>>,
    pub description: Option<String>,
    pub thumb_url: String,
    pub full_url: String,
    pub is_liked: bool,
}
