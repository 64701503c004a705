use std::ops::Range;

use log::{debug, info};

use crate::error::{Error, Result};
use crate::feed::{FeedSnapshot, FetchOutcome, PhotoFeedHandle};
use crate::message::{FeedEvent, Subscription};
use crate::models::Photo;

/// The display surface of the photo list. Rows are indices into the
/// presenter's cached photos.
pub trait ImagesListView {
    fn insert_rows(&mut self, rows: Range<usize>);
    fn reload_rows(&mut self);
    fn update_row(&mut self, row: usize);
}

/// Keeps a cached copy of the feed for a view and tells the view which rows
/// to insert or redraw.
pub struct ImagesListPresenter<V: ImagesListView> {
    feed: PhotoFeedHandle,
    view: V,
    photos: FeedSnapshot,
}

impl<V: ImagesListView> ImagesListPresenter<V> {
    pub fn new(feed: PhotoFeedHandle, view: V) -> Self {
        Self {
            feed,
            view,
            photos: FeedSnapshot::default(),
        }
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    pub fn photos(&self) -> &[Photo] {
        self.photos.photos()
    }

    pub fn photo(&self, row: usize) -> Option<&Photo> {
        self.photos.get(row)
    }

    pub fn rows(&self) -> usize {
        self.photos.len()
    }

    pub async fn fetch_photos(&self) -> Result<FetchOutcome> {
        self.feed.fetch_next_page().await
    }

    /// Brings the cache up to date with the feed. Growth becomes an
    /// insertion of exactly the new rows; a shrink can only follow a clear
    /// and reloads everything.
    pub async fn on_feed_changed(&mut self) -> Result<()> {
        let snapshot = self.feed.snapshot().await?;
        let old_count = self.photos.len();
        let new_count = snapshot.len();
        if old_count == new_count {
            return Ok(());
        }
        self.apply_snapshot(snapshot);
        Ok(())
    }

    fn apply_snapshot(&mut self, snapshot: FeedSnapshot) {
        let old_count = self.photos.len();
        let new_count = snapshot.len();
        self.photos = snapshot;
        if new_count > old_count {
            debug!("inserting rows {old_count}..{new_count}");
            self.view.insert_rows(old_count..new_count);
        } else if new_count < old_count {
            debug!("feed shrank from {old_count} to {new_count}, reloading");
            self.view.reload_rows();
        }
    }

    pub async fn handle_event(&mut self, event: FeedEvent) -> Result<()> {
        match event {
            FeedEvent::Changed { .. } => self.on_feed_changed().await,
            FeedEvent::Reset => {
                self.photos = FeedSnapshot::default();
                self.view.reload_rows();
                Ok(())
            }
        }
    }

    /// Applies events until the subscription ends.
    pub async fn run(&mut self, mut subscription: Subscription<FeedEvent>) -> Result<()> {
        while let Some(event) = subscription.recv().await {
            self.handle_event(event).await?;
        }
        info!("feed subscription {:?} closed", subscription.id);
        Ok(())
    }

    /// Called when `row` is about to be shown; displaying the last row asks
    /// for the next page.
    pub async fn will_display_row(&self, row: usize) -> Result<Option<FetchOutcome>> {
        if row + 1 != self.photos.len() {
            return Ok(None);
        }
        debug!("last row {row} displayed, fetching next page");
        Ok(Some(self.fetch_photos().await?))
    }

    pub async fn toggle_like(&mut self, row: usize) -> Result<bool> {
        let photo = self
            .photos
            .get(row)
            .ok_or_else(|| Error::Other(format!("no photo at row {row}")))?;
        let photo_id = photo.id.clone();
        let liked = self.feed.toggle_like(&photo_id, photo.is_liked).await?;

        // a page may have landed meanwhile; its rows go in before the update
        let snapshot = self.feed.snapshot().await?;
        let same_photo = snapshot.get(row).is_some_and(|p| p.id == photo_id);
        self.apply_snapshot(snapshot);
        if same_photo {
            self.view.update_row(row);
        }
        Ok(liked)
    }
}
