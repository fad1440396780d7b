use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Opaque serialized state of a whole drawing surface at one instant.
///
/// Only the surface produces and interprets snapshots; the session just stores
/// them and hands them back. Cloning is cheap (the data is shared).
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot(Arc<str>);

impl Snapshot {
    pub fn new(data: impl Into<Arc<str>>) -> Self {
        Self(data.into())
    }

    /// The raw serialized form
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<String> for Snapshot {
    fn from(data: String) -> Self {
        Self::new(data)
    }
}

impl From<&str> for Snapshot {
    fn from(data: &str) -> Self {
        Self::new(data)
    }
}

impl fmt::Debug for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Snapshots can be large; only show the size
        f.debug_tuple("Snapshot")
            .field(&format!("<{} bytes>", self.0.len()))
            .finish()
    }
}
