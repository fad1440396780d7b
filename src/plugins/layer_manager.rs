use std::any::Any;

use serde::{Deserialize, Serialize};

use crate::error::{HandlerResult, SessionResult};
use crate::event::{Notification, Topic};
use crate::plugin::Plugin;
use crate::session::EditorSession;
use crate::surface::{DrawingSurface, ObjectId, SurfaceObject};

/// One row of the layer list: a top-level surface object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    /// Same as the object's id
    pub id: ObjectId,
    pub name: String,
    pub visible: bool,
    pub locked: bool,
}

impl Layer {
    fn from_object(object: &SurfaceObject) -> Self {
        Self {
            id: object.id,
            name: object.name.clone().unwrap_or_else(|| "Layer".to_owned()),
            visible: object.visible,
            locked: !object.selectable,
        }
    }
}

/// Keeps a layer list in sync with the surface and edits layer properties.
///
/// Layer state lives on the surface objects themselves (`visible`,
/// `selectable`, `name`), so undo and redo restore it along with everything
/// else. Publishes `layer:updated` whenever the list changes.
#[derive(Debug, Default)]
pub struct LayerManager {
    /// Bottom of the stack first
    layers: Vec<Layer>,
    selected: Option<ObjectId>,
}

impl LayerManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn layer(&self, id: ObjectId) -> Option<&Layer> {
        self.layers.iter().find(|layer| layer.id == id)
    }

    pub fn selected_layer(&self) -> Option<&Layer> {
        self.selected.and_then(|id| self.layer(id))
    }

    /// Show or hide a layer. Returns false for unknown layers.
    pub fn set_visible(&mut self, session: &EditorSession, id: ObjectId, visible: bool) -> SessionResult<bool> {
        self.update_object(session, id, |object| object.visible = visible)
    }

    /// Lock or unlock a layer. Locked layers cannot be selected.
    pub fn set_locked(&mut self, session: &EditorSession, id: ObjectId, locked: bool) -> SessionResult<bool> {
        self.update_object(session, id, |object| object.selectable = !locked)
    }

    pub fn rename(&mut self, session: &EditorSession, id: ObjectId, name: impl Into<String>) -> SessionResult<bool> {
        let name = name.into();
        self.update_object(session, id, |object| object.name = Some(name))
    }

    /// Select a layer's object on the surface. Locked layers are ignored.
    pub fn select_layer(&mut self, session: &EditorSession, id: ObjectId) -> SessionResult<bool> {
        match self.layer(id) {
            Some(layer) if !layer.locked => {}
            _ => return Ok(false),
        }
        session.edit(|surface| surface.set_selection(vec![id]))?;
        self.selected = Some(id);
        Ok(true)
    }

    fn update_object(
        &mut self,
        session: &EditorSession,
        id: ObjectId,
        apply: impl FnOnce(&mut SurfaceObject),
    ) -> SessionResult<bool> {
        let found = session.edit(|surface| match surface.object_mut(id) {
            Some(object) => {
                apply(object);
                surface.mark_committed(id);
                true
            }
            None => false,
        })?;
        if found {
            self.sync(session)?;
        }
        Ok(found)
    }

    /// Rebuild the list from the surface and publish it if it changed
    fn sync(&mut self, session: &EditorSession) -> SessionResult<()> {
        let layers = session.with_surface(Self::collect_layers)?;
        if layers == self.layers {
            return Ok(());
        }

        self.layers = layers;
        if self.selected.is_some_and(|id| self.layer(id).is_none()) {
            self.selected = None;
        }
        log::debug!("Layer list updated: {} layer(s)", self.layers.len());
        session.notify(Notification::LayerUpdated(self.layers.clone()));
        Ok(())
    }

    fn collect_layers(surface: &dyn DrawingSurface) -> Vec<Layer> {
        surface
            .objects()
            .into_iter()
            .filter_map(|id| surface.object(id).map(Layer::from_object))
            .collect()
    }
}

impl Plugin for LayerManager {
    fn init(&mut self, session: &EditorSession) -> HandlerResult {
        self.layers = session.with_surface(Self::collect_layers)?;
        Ok(())
    }

    fn destroy(&mut self, _session: &EditorSession) {
        self.layers.clear();
        self.selected = None;
    }

    fn topics(&self) -> Vec<Topic> {
        vec![
            Topic::OBJECT_ADDED,
            Topic::OBJECT_REMOVED,
            Topic::OBJECT_MODIFIED,
            Topic::SURFACE_RESTORED,
            Topic::SELECTION_CLEARED,
        ]
    }

    fn on_notification(&mut self, session: &EditorSession, notification: &Notification) -> HandlerResult {
        if let Notification::SelectionCleared = notification {
            self.selected = None;
            return Ok(());
        }
        self.sync(session)?;
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
