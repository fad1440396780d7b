mod registry;

pub use registry::{PluginRef, PluginRegistry};

use std::any::Any;

use crate::error::HandlerResult;
use crate::event::{Notification, Topic};
use crate::session::EditorSession;

/// A session-scoped behaviour attached to an editor.
///
/// A plugin declares which topics it handles through [`Plugin::topics`]; the
/// registry reads that table once, after a successful `init`, and only
/// dispatches matching notifications. Handling nothing is fine.
///
/// A plugin is never re-entered. While one of its hooks or methods runs,
/// notifications caused by its own calls back into the session (an edit, an
/// undo, a `notify`) are not delivered to it. Resync derived state from the
/// session after such a call instead of waiting for the notification, the way
/// [`crate::plugins::LayerManager`] does after editing a layer.
pub trait Plugin: 'static {
    /// Called once, synchronously, while the plugin is being registered.
    /// An error aborts the registration.
    fn init(&mut self, session: &EditorSession) -> HandlerResult;

    /// Called when the plugin is unregistered or the session is torn down
    fn destroy(&mut self, _session: &EditorSession) {
        // default: nothing to release
    }

    /// Topics this plugin wants [`Plugin::on_notification`] calls for
    fn topics(&self) -> Vec<Topic> {
        Vec::new()
    }

    /// Handle one notification whose topic is in [`Plugin::topics`]
    fn on_notification(&mut self, _session: &EditorSession, _notification: &Notification) -> HandlerResult {
        Ok(())
    }

    /// Convert to Any for downcasting
    fn as_any(&self) -> &dyn Any;

    /// Convert to mutable Any for downcasting
    fn as_any_mut(&mut self) -> &mut dyn Any;
}
