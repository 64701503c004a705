use std::collections::HashSet;
use std::ops::Range;
use std::sync::Arc;

use log::{debug, warn};

use crate::message::FeedEvent;
use crate::models::Photo;

/// Collection size before and after a page was merged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedChange {
    pub old_count: usize,
    pub new_count: usize,
}

impl FeedChange {
    pub fn inserted(&self) -> Range<usize> {
        self.old_count..self.new_count
    }

    pub fn is_empty(&self) -> bool {
        self.old_count == self.new_count
    }
}

impl From<FeedChange> for FeedEvent {
    fn from(value: FeedChange) -> Self {
        FeedEvent::Changed {
            old_count: value.old_count,
            new_count: value.new_count,
        }
    }
}

/// Identifies one page fetch: the page asked for and the generation it was
/// issued in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageTicket {
    pub page: u32,
    pub generation: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageApplied {
    Appended { change: FeedChange, skipped: usize },
    Stale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeApplied {
    Updated,
    Unchanged,
    NotFound,
    Stale,
}

/// Read-only view of the feed at one point in time.
#[derive(Debug, Clone, Default)]
pub struct FeedSnapshot {
    photos: Arc<Vec<Photo>>,
    last_loaded_page: u32,
    reached_end: bool,
}

impl FeedSnapshot {
    pub fn photos(&self) -> &[Photo] {
        &self.photos
    }

    pub fn len(&self) -> usize {
        self.photos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.photos.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Photo> {
        self.photos.get(index)
    }

    pub fn find(&self, photo_id: &str) -> Option<&Photo> {
        self.photos.iter().find(|p| p.id == photo_id)
    }

    pub fn last_loaded_page(&self) -> u32 {
        self.last_loaded_page
    }

    /// The last page came back shorter than a full page. Only a hint; the
    /// server never signals the end of the feed.
    pub fn reached_end(&self) -> bool {
        self.reached_end
    }
}

/// The photo collection together with its pagination state.
///
/// At most one page fetch is in flight. Every fetch is tagged with the
/// generation current when it began; `clear` starts a new generation so
/// answers to older fetches are recognised and dropped.
#[derive(Debug)]
pub struct FeedState {
    photos: Arc<Vec<Photo>>,
    ids: HashSet<String>,
    last_loaded_page: u32,
    generation: u64,
    in_flight: Option<PageTicket>,
    reached_end: bool,
    per_page: u32,
}

impl FeedState {
    pub fn new(per_page: u32) -> Self {
        Self {
            photos: Arc::new(Vec::new()),
            ids: HashSet::new(),
            last_loaded_page: 0,
            generation: 0,
            in_flight: None,
            reached_end: false,
            per_page,
        }
    }

    pub fn per_page(&self) -> u32 {
        self.per_page
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn last_loaded_page(&self) -> u32 {
        self.last_loaded_page
    }

    pub fn is_fetching(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn len(&self) -> usize {
        self.photos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.photos.is_empty()
    }

    /// Starts fetching the page after the cursor, or returns `None` while
    /// another fetch is in flight.
    pub fn begin_fetch(&mut self) -> Option<PageTicket> {
        if self.in_flight.is_some() {
            return None;
        }
        let ticket = PageTicket {
            page: self.last_loaded_page + 1,
            generation: self.generation,
        };
        self.in_flight = Some(ticket);
        Some(ticket)
    }

    /// Appends a fetched page at the tail. Photos whose id is already in the
    /// collection are skipped.
    pub fn complete_fetch(&mut self, ticket: PageTicket, photos: Vec<Photo>) -> PageApplied {
        if self.in_flight != Some(ticket) {
            debug!("page {} of generation {} is stale", ticket.page, ticket.generation);
            return PageApplied::Stale;
        }
        self.in_flight = None;

        let received = photos.len();
        let old_count = self.photos.len();
        let list = Arc::make_mut(&mut self.photos);
        let mut skipped = 0;
        for photo in photos {
            if self.ids.insert(photo.id.clone()) {
                list.push(photo);
            } else {
                warn!("photo {} of page {} is already in the feed", photo.id, ticket.page);
                skipped += 1;
            }
        }
        self.last_loaded_page = ticket.page;
        self.reached_end = received < self.per_page as usize;

        PageApplied::Appended {
            change: FeedChange {
                old_count,
                new_count: self.photos.len(),
            },
            skipped,
        }
    }

    /// Ends a failed fetch. Returns `false` if the ticket was already stale.
    pub fn fail_fetch(&mut self, ticket: PageTicket) -> bool {
        if self.in_flight != Some(ticket) {
            return false;
        }
        self.in_flight = None;
        true
    }

    /// Applies the server's like flag to the photo with `photo_id`.
    pub fn apply_like(&mut self, generation: u64, photo_id: &str, liked: bool) -> LikeApplied {
        if generation != self.generation {
            return LikeApplied::Stale;
        }
        let Some(index) = self.photos.iter().position(|p| p.id == photo_id) else {
            return LikeApplied::NotFound;
        };
        if self.photos[index].is_liked == liked {
            return LikeApplied::Unchanged;
        }
        Arc::make_mut(&mut self.photos)[index].is_liked = liked;
        LikeApplied::Updated
    }

    pub fn clear(&mut self) {
        self.photos = Arc::new(Vec::new());
        self.ids.clear();
        self.last_loaded_page = 0;
        self.in_flight = None;
        self.reached_end = false;
        self.generation = self.generation.wrapping_add(1);
    }

    pub fn snapshot(&self) -> FeedSnapshot {
        FeedSnapshot {
            photos: self.photos.clone(),
            last_loaded_page: self.last_loaded_page,
            reached_end: self.reached_end,
        }
    }
}
