#![warn(clippy::all, rust_2018_idioms)]

pub mod actions;
pub mod config;
pub mod error;
pub mod event;
pub mod history;
mod id_generator;
pub mod plugin;
pub mod plugins;
pub mod session;
pub mod surface;

pub use actions::{Alignment, EditAction};
pub use config::SessionConfig;
pub use error::{BoxError, ConfigError, HandlerResult, PluginError, RestoreError, SerializeError, SessionError, SessionResult};
pub use event::{EventBus, Notification, SessionEvent, SubscriptionId, Topic};
pub use history::{HistoryManager, HistoryOutcome, Snapshot};
pub use plugin::{Plugin, PluginRef, PluginRegistry};
pub use session::EditorSession;
pub use surface::{Canvas, DrawingSurface, ObjectId, SurfaceEvent, SurfaceObject};
