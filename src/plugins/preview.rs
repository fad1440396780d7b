use std::any::Any;

use crate::error::{HandlerResult, SessionResult};
use crate::event::{Notification, Topic};
use crate::history::Snapshot;
use crate::plugin::Plugin;
use crate::session::EditorSession;

pub const MIN_SCALE: f32 = 0.2;
pub const MAX_SCALE: f32 = 2.0;
pub const SCALE_STEP: f32 = 0.1;

/// Live preview of the surface.
///
/// While shown and enabled, keeps a fresh snapshot of the surface for the
/// host to render, refreshed on every object change.
#[derive(Debug)]
pub struct Preview {
    visible: bool,
    enabled: bool,
    scale: f32,
    snapshot: Option<Snapshot>,
    refreshes: usize,
}

impl Default for Preview {
    fn default() -> Self {
        Self {
            visible: false,
            enabled: true,
            scale: 1.0,
            snapshot: None,
            refreshes: 0,
        }
    }
}

impl Preview {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn show(&mut self, session: &EditorSession) -> SessionResult<()> {
        self.visible = true;
        self.refresh(session)?;
        Ok(())
    }

    pub fn hide(&mut self) {
        self.visible = false;
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn enable(&mut self) {
        self.enabled = true;
    }

    pub fn disable(&mut self) {
        self.enabled = false;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Returns false at the maximum scale
    pub fn zoom_in(&mut self) -> bool {
        self.set_scale(self.scale + SCALE_STEP)
    }

    /// Returns false at the minimum scale
    pub fn zoom_out(&mut self) -> bool {
        self.set_scale(self.scale - SCALE_STEP)
    }

    /// Clamp `scale` into range and round it to one decimal. Returns whether it changed.
    pub fn set_scale(&mut self, scale: f32) -> bool {
        let scale = ((scale * 10.0).round() / 10.0).clamp(MIN_SCALE, MAX_SCALE);
        if (scale - self.scale).abs() < f32::EPSILON {
            return false;
        }
        self.scale = scale;
        true
    }

    /// Scale as a percentage, e.g. `"100%"`
    pub fn scale_label(&self) -> String {
        format!("{}%", (self.scale * 100.0).round() as i32)
    }

    /// Latest captured surface state
    pub fn snapshot(&self) -> Option<&Snapshot> {
        self.snapshot.as_ref()
    }

    pub fn refresh_count(&self) -> usize {
        self.refreshes
    }

    /// Capture the surface if the preview is shown and enabled. Returns whether it did.
    pub fn refresh(&mut self, session: &EditorSession) -> SessionResult<bool> {
        if !self.visible || !self.enabled {
            return Ok(false);
        }
        self.snapshot = Some(session.export_snapshot()?);
        self.refreshes += 1;
        Ok(true)
    }
}

impl Plugin for Preview {
    fn init(&mut self, _session: &EditorSession) -> HandlerResult {
        Ok(())
    }

    fn destroy(&mut self, _session: &EditorSession) {
        self.visible = false;
        self.snapshot = None;
    }

    fn topics(&self) -> Vec<Topic> {
        vec![
            Topic::OBJECT_MODIFIED,
            Topic::OBJECT_ADDED,
            Topic::OBJECT_REMOVED,
            Topic::OBJECT_MOVING,
            Topic::OBJECT_SCALING,
            Topic::OBJECT_ROTATING,
            Topic::SURFACE_RESTORED,
        ]
    }

    fn on_notification(&mut self, session: &EditorSession, _notification: &Notification) -> HandlerResult {
        self.refresh(session)?;
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
