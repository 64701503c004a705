use std::ops::Range;

use imagefeed::models::Photo;
use imagefeed::presenter::ImagesListView;

/// Collects what the presenter asked for; the caller prints it afterwards
/// from the presenter's photos.
#[derive(Debug, Default)]
pub struct TerminalView {
    inserted: Vec<Range<usize>>,
    updated: Vec<usize>,
    reloaded: bool,
}

impl TerminalView {
    pub fn take_inserted(&mut self) -> Vec<Range<usize>> {
        std::mem::take(&mut self.inserted)
    }

    pub fn take_updated(&mut self) -> Vec<usize> {
        std::mem::take(&mut self.updated)
    }

    pub fn take_reloaded(&mut self) -> bool {
        std::mem::take(&mut self.reloaded)
    }
}

impl ImagesListView for TerminalView {
    fn insert_rows(&mut self, rows: Range<usize>) {
        self.inserted.push(rows);
    }

    fn reload_rows(&mut self) {
        self.inserted.clear();
        self.updated.clear();
        self.reloaded = true;
    }

    fn update_row(&mut self, row: usize) {
        self.updated.push(row);
    }
}

pub fn format_row(row: usize, photo: &Photo) -> String {
    let heart = if photo.is_liked { "♥" } else { " " };
    let date = photo
        .created_at
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "----------".to_string());
    format!(
        "{:>4} {heart} {} {} {}x{} {}",
        row + 1,
        photo.id,
        date,
        photo.size.width,
        photo.size.height,
        photo.description.as_deref().unwrap_or("")
    )
}
