//! The contract between an editor session and the drawing surface it edits.
//!
//! The surface owns the object model and produces opaque [`Snapshot`]s of
//! itself. It reports changes by queueing [`SurfaceEvent`]s, which the session
//! drains with [`DrawingSurface::take_events`].

mod canvas;
mod object;

pub use canvas::{Canvas, SNAPSHOT_VERSION};
pub use object::{ObjectId, ObjectKind, SurfaceObject};

use crate::error::{RestoreError, SerializeError};
use crate::history::Snapshot;

/// Native change feed of a drawing surface
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceEvent {
    SelectionCreated(Vec<ObjectId>),
    SelectionUpdated(Vec<ObjectId>),
    SelectionCleared,
    /// A settled change: add, remove, restack, or the end of a drag/resize/rotate
    ObjectCommitted(ObjectId),
    ObjectMoving(ObjectId),
    ObjectScaling(ObjectId),
    ObjectRotating(ObjectId),
    ObjectAdded(ObjectId),
    ObjectRemoved(ObjectId),
}

/// Where to move an object in the stacking order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackMove {
    Backward,
    Forward,
    ToBack,
    ToFront,
}

/// A drawing surface the session can snapshot, restore and edit.
///
/// Mutating methods queue the matching [`SurfaceEvent`]s; structural changes
/// queue exactly one `ObjectCommitted` per logical edit.
pub trait DrawingSurface {
    /// Serialize the whole surface
    fn serialize(&self) -> Result<Snapshot, SerializeError>;

    /// Replace the whole surface with `snapshot`.
    ///
    /// Must not queue `ObjectCommitted`. On error the surface is left unchanged.
    fn restore(&mut self, snapshot: &Snapshot) -> Result<(), RestoreError>;

    /// Drain queued change events, oldest first
    fn take_events(&mut self) -> Vec<SurfaceEvent>;

    /// Width and height of the drawable area
    fn size(&self) -> (f32, f32);

    /// Top-level objects, bottom of the stack first
    fn objects(&self) -> Vec<ObjectId>;

    fn object(&self, id: ObjectId) -> Option<&SurfaceObject>;

    /// Direct property access. Call [`DrawingSurface::mark_committed`] once the edit settles.
    fn object_mut(&mut self, id: ObjectId) -> Option<&mut SurfaceObject>;

    fn add(&mut self, object: SurfaceObject) -> ObjectId;

    fn remove(&mut self, id: ObjectId) -> Option<SurfaceObject>;

    /// Active selection, in stacking order
    fn selection(&self) -> Vec<ObjectId>;

    /// Replace the selection. An empty list clears it.
    fn set_selection(&mut self, ids: Vec<ObjectId>);

    fn clear_selection(&mut self);

    /// Returns false if the object is unknown or already at the requested position
    fn restack(&mut self, id: ObjectId, to: StackMove) -> bool;

    /// Merge `ids` (at least two) into a new group and select it
    fn group(&mut self, ids: &[ObjectId]) -> Option<ObjectId>;

    /// Split a group back into its children and select them
    fn ungroup(&mut self, id: ObjectId) -> Vec<ObjectId>;

    /// Report a settled property change made through `object_mut`
    fn mark_committed(&mut self, id: ObjectId);
}
