//! Headless editor plugins built on the session API

mod context_menu;
mod layer_manager;
mod preview;
mod shortcuts;

pub use context_menu::{ContextMenu, Menu, MenuItem, Viewport};
pub use layer_manager::{Layer, LayerManager};
pub use preview::{Preview, MAX_SCALE, MIN_SCALE, SCALE_STEP};
pub use shortcuts::{KeyChord, KeyEvent, ShortcutManager};
