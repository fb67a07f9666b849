// Keybindings for the pgal lightbox
//
// Keybindings (only while the viewer is open):
// - Escape: Close viewer
// - ArrowLeft: Previous item
// - ArrowRight: Next item
// - Delete: Delete shown item (after confirmation)

use tracing::debug;

use crate::models::{MediaRecord, MediaStore, Result};

use super::Lightbox;

/// Action bound to a key in the viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Close,
    Previous,
    Next,
    Delete,
}

impl KeyAction {
    /// Maps a key name (DOM `KeyboardEvent.key` spelling) to an action.
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "Escape" => Some(Self::Close),
            "ArrowLeft" => Some(Self::Previous),
            "ArrowRight" => Some(Self::Next),
            "Delete" => Some(Self::Delete),
            _ => None,
        }
    }
}

/// Applies `action` to the lightbox.
///
/// `Delete` asks `confirm_delete` about the shown item first; a declined
/// delete leaves the store and the viewer as they were.
/// Returns `Ok(false)` when the key was ignored because the viewer is closed.
pub fn handle_key(
    lightbox: &mut Lightbox,
    store: &mut MediaStore,
    action: KeyAction,
    confirm_delete: impl FnOnce(&MediaRecord) -> bool,
) -> Result<bool> {
    if !lightbox.is_open() {
        return Ok(false);
    }

    match action {
        KeyAction::Close => lightbox.close(),
        KeyAction::Previous => {
            lightbox.previous();
        }
        KeyAction::Next => {
            lightbox.next();
        }
        KeyAction::Delete => {
            let Some(shown) = lightbox.current() else {
                return Ok(true);
            };
            if !confirm_delete(shown) {
                debug!(id = %shown.id, "Delete declined");
                return Ok(true);
            }
            lightbox.delete_current(store)?;
        }
    }
    Ok(true)
}
