pub mod keybindings;
pub mod navigation;

pub use keybindings::{handle_key, KeyAction};
pub use navigation::Lightbox;
