use serde::{Deserialize, Serialize};

use super::{DrawingSurface, ObjectId, ObjectKind, StackMove, SurfaceEvent, SurfaceObject};
use crate::config::SessionConfig;
use crate::error::{RestoreError, SerializeError};
use crate::history::Snapshot;

/// Version written into every canvas snapshot
pub const SNAPSHOT_VERSION: u32 = 1;

/// Serialized form of a canvas
#[derive(Serialize)]
struct CanvasStateRef<'a> {
    version: u32,
    width: f32,
    height: f32,
    objects: &'a [SurfaceObject],
}

#[derive(Deserialize)]
struct CanvasState {
    version: u32,
    width: f32,
    height: f32,
    objects: Vec<SurfaceObject>,
}

/// In-memory drawing surface.
///
/// Keeps objects in stacking order and queues change events the way an
/// interactive canvas would: `translate`/`scale_by`/`rotate_by` report
/// in-progress transforms, `finish_transform` reports the settled result.
#[derive(Debug, Clone)]
pub struct Canvas {
    width: f32,
    height: f32,
    /// Bottom of the stack first
    objects: Vec<SurfaceObject>,
    selection: Vec<ObjectId>,
    pending: Vec<SurfaceEvent>,
}

impl Default for Canvas {
    fn default() -> Self {
        Self::from_config(&SessionConfig::default())
    }
}

impl Canvas {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            objects: Vec::new(),
            selection: Vec::new(),
            pending: Vec::new(),
        }
    }

    pub fn from_config(config: &SessionConfig) -> Self {
        Self::new(config.canvas_width, config.canvas_height)
    }

    /// Drag an object by a delta (in progress)
    pub fn translate(&mut self, id: ObjectId, dx: f32, dy: f32) -> bool {
        let Some(object) = self.find_mut(id) else {
            return false;
        };
        object.left += dx;
        object.top += dy;
        self.pending.push(SurfaceEvent::ObjectMoving(id));
        true
    }

    /// Resize an object by a factor (in progress)
    pub fn scale_by(&mut self, id: ObjectId, fx: f32, fy: f32) -> bool {
        let Some(object) = self.find_mut(id) else {
            return false;
        };
        object.scale_x *= fx;
        object.scale_y *= fy;
        self.pending.push(SurfaceEvent::ObjectScaling(id));
        true
    }

    /// Rotate an object by some degrees (in progress)
    pub fn rotate_by(&mut self, id: ObjectId, degrees: f32) -> bool {
        let Some(object) = self.find_mut(id) else {
            return false;
        };
        object.angle = (object.angle + degrees).rem_euclid(360.0);
        self.pending.push(SurfaceEvent::ObjectRotating(id));
        true
    }

    /// End of a drag/resize/rotate gesture
    pub fn finish_transform(&mut self, id: ObjectId) {
        self.mark_committed(id);
    }

    pub fn select(&mut self, id: ObjectId) {
        self.set_selection(vec![id]);
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    fn index_of(&self, id: ObjectId) -> Option<usize> {
        self.objects.iter().position(|object| object.id == id)
    }

    fn find_mut(&mut self, id: ObjectId) -> Option<&mut SurfaceObject> {
        self.objects.iter_mut().find(|object| object.id == id)
    }

    fn replace_selection(&mut self, ids: Vec<ObjectId>) {
        let ids: Vec<ObjectId> = self
            .objects
            .iter()
            .map(|object| object.id)
            .filter(|id| ids.contains(id))
            .collect();

        if ids.is_empty() {
            self.clear_selection();
            return;
        }
        let event = if self.selection.is_empty() {
            SurfaceEvent::SelectionCreated(ids.clone())
        } else {
            SurfaceEvent::SelectionUpdated(ids.clone())
        };
        self.selection = ids;
        self.pending.push(event);
    }
}

impl DrawingSurface for Canvas {
    fn serialize(&self) -> Result<Snapshot, SerializeError> {
        let state = CanvasStateRef {
            version: SNAPSHOT_VERSION,
            width: self.width,
            height: self.height,
            objects: &self.objects,
        };
        Ok(Snapshot::from(serde_json::to_string(&state)?))
    }

    fn restore(&mut self, snapshot: &Snapshot) -> Result<(), RestoreError> {
        let state: CanvasState = serde_json::from_str(snapshot.as_str())?;
        if state.version != SNAPSHOT_VERSION {
            return Err(RestoreError::Version {
                found: state.version,
                expected: SNAPSHOT_VERSION,
            });
        }

        self.width = state.width;
        self.height = state.height;
        self.objects = state.objects;
        if !self.selection.is_empty() {
            self.selection.clear();
            self.pending.push(SurfaceEvent::SelectionCleared);
        }
        Ok(())
    }

    fn take_events(&mut self) -> Vec<SurfaceEvent> {
        std::mem::take(&mut self.pending)
    }

    fn size(&self) -> (f32, f32) {
        (self.width, self.height)
    }

    fn objects(&self) -> Vec<ObjectId> {
        self.objects.iter().map(|object| object.id).collect()
    }

    fn object(&self, id: ObjectId) -> Option<&SurfaceObject> {
        self.objects.iter().find(|object| object.id == id)
    }

    fn object_mut(&mut self, id: ObjectId) -> Option<&mut SurfaceObject> {
        self.find_mut(id)
    }

    fn add(&mut self, object: SurfaceObject) -> ObjectId {
        let id = object.id;
        self.objects.push(object);
        self.pending.push(SurfaceEvent::ObjectAdded(id));
        self.pending.push(SurfaceEvent::ObjectCommitted(id));
        id
    }

    fn remove(&mut self, id: ObjectId) -> Option<SurfaceObject> {
        let index = self.index_of(id)?;
        let object = self.objects.remove(index);
        self.pending.push(SurfaceEvent::ObjectRemoved(id));
        self.pending.push(SurfaceEvent::ObjectCommitted(id));

        if self.selection.contains(&id) {
            let remaining: Vec<ObjectId> = self.selection.iter().copied().filter(|s| *s != id).collect();
            self.replace_selection(remaining);
        }
        Some(object)
    }

    fn selection(&self) -> Vec<ObjectId> {
        self.selection.clone()
    }

    fn set_selection(&mut self, ids: Vec<ObjectId>) {
        self.replace_selection(ids);
    }

    fn clear_selection(&mut self) {
        if !self.selection.is_empty() {
            self.selection.clear();
            self.pending.push(SurfaceEvent::SelectionCleared);
        }
    }

    fn restack(&mut self, id: ObjectId, to: StackMove) -> bool {
        let Some(index) = self.index_of(id) else {
            return false;
        };
        let last = self.objects.len() - 1;
        let target = match to {
            StackMove::Backward => index.saturating_sub(1),
            StackMove::Forward => (index + 1).min(last),
            StackMove::ToBack => 0,
            StackMove::ToFront => last,
        };
        if target == index {
            return false;
        }

        let object = self.objects.remove(index);
        self.objects.insert(target, object);
        self.pending.push(SurfaceEvent::ObjectCommitted(id));
        true
    }

    fn group(&mut self, ids: &[ObjectId]) -> Option<ObjectId> {
        let mut indices: Vec<usize> = ids.iter().filter_map(|id| self.index_of(*id)).collect();
        indices.sort_unstable();
        indices.dedup();
        if indices.len() < 2 {
            return None;
        }

        let insert_at = indices[0];
        let mut members = Vec::with_capacity(indices.len());
        for index in indices.into_iter().rev() {
            let member = self.objects.remove(index);
            self.pending.push(SurfaceEvent::ObjectRemoved(member.id));
            members.push(member);
        }
        members.reverse();

        let left = members.iter().map(|m| m.left).fold(f32::INFINITY, f32::min);
        let top = members.iter().map(|m| m.top).fold(f32::INFINITY, f32::min);
        let right = members.iter().map(|m| m.left + m.scaled_width()).fold(f32::NEG_INFINITY, f32::max);
        let bottom = members.iter().map(|m| m.top + m.scaled_height()).fold(f32::NEG_INFINITY, f32::max);
        for member in &mut members {
            member.left -= left;
            member.top -= top;
        }

        let group = SurfaceObject::new(ObjectKind::Group { children: members }, left, top, right - left, bottom - top);
        let group_id = group.id;
        self.objects.insert(insert_at, group);
        self.pending.push(SurfaceEvent::ObjectAdded(group_id));
        self.pending.push(SurfaceEvent::ObjectCommitted(group_id));

        self.selection.clear();
        self.replace_selection(vec![group_id]);
        Some(group_id)
    }

    fn ungroup(&mut self, id: ObjectId) -> Vec<ObjectId> {
        let Some(index) = self.index_of(id) else {
            return Vec::new();
        };
        if !self.objects[index].is_group() {
            return Vec::new();
        }

        let group = self.objects.remove(index);
        self.pending.push(SurfaceEvent::ObjectRemoved(id));
        let ObjectKind::Group { children } = group.kind else {
            return Vec::new();
        };

        let mut ids = Vec::with_capacity(children.len());
        for (offset, mut child) in children.into_iter().enumerate() {
            child.left = group.left + child.left * group.scale_x;
            child.top = group.top + child.top * group.scale_y;
            child.scale_x *= group.scale_x;
            child.scale_y *= group.scale_y;
            ids.push(child.id);
            self.pending.push(SurfaceEvent::ObjectAdded(child.id));
            self.objects.insert(index + offset, child);
        }
        self.pending.push(SurfaceEvent::ObjectCommitted(id));

        self.selection.clear();
        self.replace_selection(ids.clone());
        ids
    }

    fn mark_committed(&mut self, id: ObjectId) {
        if self.index_of(id).is_some() {
            self.pending.push(SurfaceEvent::ObjectCommitted(id));
        }
    }
}
