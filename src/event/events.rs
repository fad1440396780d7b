use std::borrow::Cow;
use std::fmt;

use crate::actions::EditAction;
use crate::plugins::Layer;
use crate::surface::ObjectId;

/// A named notification channel such as `object:modified`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Topic(Cow<'static, str>);

impl Topic {
    pub const OBJECT_SELECTED: Topic = Topic::from_static("object:selected");
    pub const SELECTION_CLEARED: Topic = Topic::from_static("selection:cleared");
    pub const OBJECT_MODIFIED: Topic = Topic::from_static("object:modified");
    pub const OBJECT_MOVING: Topic = Topic::from_static("object:moving");
    pub const OBJECT_SCALING: Topic = Topic::from_static("object:scaling");
    pub const OBJECT_ROTATING: Topic = Topic::from_static("object:rotating");
    pub const OBJECT_ADDED: Topic = Topic::from_static("object:added");
    pub const OBJECT_REMOVED: Topic = Topic::from_static("object:removed");
    pub const LAYER_UPDATED: Topic = Topic::from_static("layer:updated");
    pub const SURFACE_RESTORED: Topic = Topic::from_static("surface:restored");

    pub const HISTORY_COMMITTED: Topic = Topic::from_static("history:committed");
    pub const HISTORY_UNDO: Topic = Topic::from_static("history:undo");
    pub const HISTORY_REDO: Topic = Topic::from_static("history:redo");
    pub const SNAPSHOT_IMPORTED: Topic = Topic::from_static("snapshot:imported");

    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    /// A plugin-specific topic
    pub fn custom(name: impl Into<String>) -> Self {
        Self(Cow::Owned(name.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&'static str> for Topic {
    fn from(name: &'static str) -> Self {
        Self::from_static(name)
    }
}

impl From<String> for Topic {
    fn from(name: String) -> Self {
        Self::custom(name)
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which in-progress transform a surface is reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransformKind {
    Moving,
    Scaling,
    Rotating,
}

impl TransformKind {
    pub fn topic(self) -> Topic {
        match self {
            TransformKind::Moving => Topic::OBJECT_MOVING,
            TransformKind::Scaling => Topic::OBJECT_SCALING,
            TransformKind::Rotating => Topic::OBJECT_ROTATING,
        }
    }
}

/// A normalized notification fanned out to plugins.
///
/// Each variant belongs to exactly one topic, see [`Notification::topic`].
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    /// A selection was created or changed
    ObjectSelected(Vec<ObjectId>),
    SelectionCleared,
    /// A settled change; history has already recorded it
    ObjectModified(ObjectId),
    /// An in-progress drag, resize or rotation
    ObjectTransforming {
        kind: TransformKind,
        object: ObjectId,
    },
    ObjectAdded(ObjectId),
    ObjectRemoved(ObjectId),
    LayerUpdated(Vec<Layer>),
    /// The surface was replaced wholesale (undo, redo or import)
    SurfaceRestored,
    Custom {
        topic: Topic,
        payload: serde_json::Value,
    },
}

impl Notification {
    pub fn topic(&self) -> Topic {
        match self {
            Notification::ObjectSelected(_) => Topic::OBJECT_SELECTED,
            Notification::SelectionCleared => Topic::SELECTION_CLEARED,
            Notification::ObjectModified(_) => Topic::OBJECT_MODIFIED,
            Notification::ObjectTransforming { kind, .. } => kind.topic(),
            Notification::ObjectAdded(_) => Topic::OBJECT_ADDED,
            Notification::ObjectRemoved(_) => Topic::OBJECT_REMOVED,
            Notification::LayerUpdated(_) => Topic::LAYER_UPDATED,
            Notification::SurfaceRestored => Topic::SURFACE_RESTORED,
            Notification::Custom { topic, .. } => topic.clone(),
        }
    }
}

/// Payload of the session-level event bus
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// A new history entry was recorded
    HistoryCommitted { cursor: usize, len: usize },
    /// Undo or redo moved the history cursor
    HistoryMoved { cursor: usize, len: usize },
    SnapshotImported,
    /// An edit action changed the surface
    ActionPerformed {
        action: EditAction,
        objects: Vec<ObjectId>,
    },
}
