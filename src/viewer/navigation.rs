//! Lightbox navigation over the filtered record list.
//!
//! The lightbox keeps its own copy of the last filtered view. Navigation wraps
//! in both directions and does nothing on an empty view. Deleting the shown
//! item closes the lightbox rather than remapping the index.

use tracing::debug;

use crate::models::{MediaFilter, MediaRecord, MediaStore, Result};

#[derive(Debug)]
pub struct Lightbox {
    filter: MediaFilter,
    items: Vec<MediaRecord>,
    index: usize,
    open: bool,
}

impl Lightbox {
    /// Creates a closed lightbox over `store` filtered by `filter`.
    pub fn new(store: &MediaStore, filter: MediaFilter) -> Self {
        Self {
            filter,
            items: store.list(filter),
            index: 0,
            open: false,
        }
    }

    /// Recomputes the filtered view from the store.
    pub fn refresh(&mut self, store: &MediaStore) {
        self.items = store.list(self.filter);
        if self.index >= self.items.len() {
            self.index = 0;
            self.open = false;
        }
    }

    /// Switches the active filter, recomputes, and closes the viewer.
    #[cfg(test)]
    pub fn set_filter(&mut self, store: &MediaStore, filter: MediaFilter) {
        self.filter = filter;
        self.index = 0;
        self.open = false;
        self.refresh(store);
    }

    pub fn items(&self) -> &[MediaRecord] {
        &self.items
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Shows the item at `index`. Out-of-range indexes are ignored.
    pub fn open(&mut self, index: usize) -> Option<&MediaRecord> {
        if index >= self.items.len() {
            return None;
        }
        self.index = index;
        self.open = true;
        self.items.get(index)
    }

    pub fn close(&mut self) {
        self.open = false;
    }

    /// The item on screen, if the viewer is open.
    pub fn current(&self) -> Option<&MediaRecord> {
        if self.open {
            self.items.get(self.index)
        } else {
            None
        }
    }

    pub fn next(&mut self) -> Option<&MediaRecord> {
        if self.items.is_empty() {
            return None;
        }
        let next = if self.index + 1 < self.items.len() {
            self.index + 1
        } else {
            0
        };
        self.open(next)
    }

    pub fn previous(&mut self) -> Option<&MediaRecord> {
        if self.items.is_empty() {
            return None;
        }
        let prev = if self.index > 0 {
            self.index - 1
        } else {
            self.items.len() - 1
        };
        self.open(prev)
    }

    /// Removes the item at the current index from the store and closes.
    ///
    /// The view is recomputed and the viewer closed even when persisting the
    /// removal fails; that error is still returned.
    pub fn delete_current(&mut self, store: &mut MediaStore) -> Result<Option<MediaRecord>> {
        let Some(item) = self.items.get(self.index).cloned() else {
            return Ok(None);
        };

        let removed = store.remove(&item.id);
        self.refresh(store);
        self.close();
        debug!(id = %item.id, "Deleted item from viewer");

        removed?;
        Ok(Some(item))
    }
}
