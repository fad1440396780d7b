//! The editor session: the root object tying a drawing surface to history,
//! plugins and the session event bus.
//!
//! The surface reports changes as queued [`SurfaceEvent`]s. The session drains
//! them in batches, one batch per [`EditorSession::edit`] or flush:
//! - the first settled change (`ObjectCommitted`) in a batch serializes the
//!   surface and commits it to history; every committed object then gets its
//!   `object:modified` notification, always after the commit;
//! - anything transient (drag/resize/rotate in progress, selection,
//!   add/remove bookkeeping) is forwarded without touching history.
//!
//! A multi-object edit such as deleting a selection is therefore one history
//! entry, and one undo returns to the state before it.
//!
//! Undo, redo and import restore the surface from a snapshot. Events queued by
//! a restore are forwarded to plugins but never committed, so restoring cannot
//! grow the history.
//!
//! # Re-entrancy
//!
//! Everything runs synchronously on one thread. Plugins receive `&EditorSession`
//! and may call back into it (edit the surface, undo, notify). No `RefCell`
//! borrow is held across a plugin or listener callback.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::cell::RefCell;
//! use std::rc::Rc;
//! use canvas_session::{Canvas, DrawingSurface, EditorSession, SessionConfig, SurfaceObject};
//!
//! let canvas = Rc::new(RefCell::new(Canvas::default()));
//! let session = EditorSession::new(canvas.clone(), SessionConfig::default());
//!
//! session.edit(|surface| surface.add(SurfaceObject::rect(10.0, 10.0, 50.0, 50.0))).unwrap();
//! session.undo().unwrap();
//! ```
use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::config::SessionConfig;
use crate::error::{PluginError, SessionError, SessionResult};
use crate::event::{EventBus, Notification, SessionEvent, Topic, TransformKind};
use crate::history::{HistoryManager, HistoryOutcome, Snapshot};
use crate::plugin::{Plugin, PluginRef, PluginRegistry};
use crate::surface::{DrawingSurface, SurfaceEvent, SurfaceObject};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Undo,
    Redo,
}

/// The root object of one editing session
pub struct EditorSession {
    config: SessionConfig,
    /// Owned by the caller; the session only holds a shared reference
    surface: Rc<RefCell<dyn DrawingSurface>>,
    history: RefCell<HistoryManager>,
    plugins: PluginRegistry,
    events: EventBus<SessionEvent>,
    /// Last copied objects
    clipboard: RefCell<Vec<SurfaceObject>>,
    destroyed: Cell<bool>,
}

impl std::fmt::Debug for EditorSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorSession")
            .field("config", &self.config)
            .field("history_len", &self.history_len())
            .field("history_cursor", &self.history_cursor())
            .field("plugins", &self.plugins)
            .field("events", &self.events)
            .finish()
    }
}

impl EditorSession {
    /// Creates a session editing `surface`.
    ///
    /// Events the surface queued before the session existed are discarded.
    /// With `record_initial_state`, the current surface state becomes the first
    /// history entry.
    pub fn new(surface: Rc<RefCell<dyn DrawingSurface>>, config: SessionConfig) -> Self {
        let session = Self {
            history: RefCell::new(HistoryManager::with_capacity_limit(config.history_capacity)),
            config,
            surface,
            plugins: PluginRegistry::new(),
            events: EventBus::new(),
            clipboard: RefCell::new(Vec::new()),
            destroyed: Cell::new(false),
        };

        let (stale, initial) = {
            let mut surface = session.surface.borrow_mut();
            (surface.take_events(), surface.serialize())
        };
        if !stale.is_empty() {
            log::debug!("Discarding {} surface event(s) queued before the session started", stale.len());
        }
        if session.config.record_initial_state {
            match initial {
                Ok(snapshot) => session.history.borrow_mut().commit(snapshot),
                Err(err) => log::error!("Initial state not recorded: {}", err),
            }
        }
        session
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// The session-level event bus (`history:*`, `snapshot:imported`, `action:*`)
    pub fn events(&self) -> &EventBus<SessionEvent> {
        &self.events
    }

    // --- surface access ---

    /// Read the surface
    pub fn with_surface<R>(&self, f: impl FnOnce(&dyn DrawingSurface) -> R) -> SessionResult<R> {
        let surface = self.surface.try_borrow().map_err(|_| SessionError::SurfaceBusy)?;
        Ok(f(&*surface))
    }

    /// Mutate the surface, then process every change event the edit produced
    pub fn edit<R>(&self, f: impl FnOnce(&mut dyn DrawingSurface) -> R) -> SessionResult<R> {
        let output = {
            let mut surface = self.surface.try_borrow_mut().map_err(|_| SessionError::SurfaceBusy)?;
            f(&mut *surface)
        };
        self.flush_surface_events()?;
        Ok(output)
    }

    /// Drain the surface's queued change events and process them in order.
    ///
    /// Each drained batch records at most one history entry. Call this after
    /// mutating the surface directly rather than through [`EditorSession::edit`].
    pub fn flush_surface_events(&self) -> SessionResult<()> {
        loop {
            let events = self.take_surface_events()?;
            if events.is_empty() {
                return Ok(());
            }
            let mut committed = false;
            for event in events {
                if matches!(event, SurfaceEvent::ObjectCommitted(_)) && !committed {
                    // History first, so handlers of object:modified can undo this very change
                    self.record_snapshot()?;
                    committed = true;
                }
                self.dispatch_surface_event(event);
            }
        }
    }

    /// Process one native change event on its own.
    ///
    /// An `ObjectCommitted` records a history entry before it is forwarded.
    pub fn handle_surface_event(&self, event: SurfaceEvent) -> SessionResult<()> {
        if matches!(event, SurfaceEvent::ObjectCommitted(_)) {
            self.record_snapshot()?;
        }
        self.dispatch_surface_event(event);
        Ok(())
    }

    /// Forward one event to plugins. History is the caller's business.
    fn dispatch_surface_event(&self, event: SurfaceEvent) {
        log::debug!("surface event: {:?}", event);
        let notification = match event {
            SurfaceEvent::ObjectCommitted(id) => Notification::ObjectModified(id),
            SurfaceEvent::SelectionCreated(ids) | SurfaceEvent::SelectionUpdated(ids) => {
                Notification::ObjectSelected(ids)
            }
            SurfaceEvent::SelectionCleared => Notification::SelectionCleared,
            SurfaceEvent::ObjectMoving(object) => Notification::ObjectTransforming {
                kind: TransformKind::Moving,
                object,
            },
            SurfaceEvent::ObjectScaling(object) => Notification::ObjectTransforming {
                kind: TransformKind::Scaling,
                object,
            },
            SurfaceEvent::ObjectRotating(object) => Notification::ObjectTransforming {
                kind: TransformKind::Rotating,
                object,
            },
            SurfaceEvent::ObjectAdded(id) => Notification::ObjectAdded(id),
            SurfaceEvent::ObjectRemoved(id) => Notification::ObjectRemoved(id),
        };
        self.plugins.notify(self, &notification);
    }

    // --- history ---

    /// Commit the current surface state as a new history entry
    pub fn commit_current(&self) -> SessionResult<()> {
        self.record_snapshot()
    }

    /// Step back one history entry and restore the surface to it.
    ///
    /// At the oldest entry this is a [`HistoryOutcome::NoOp`]. If the surface
    /// rejects the snapshot, the cursor is left where it was.
    pub fn undo(&self) -> SessionResult<HistoryOutcome> {
        self.step(Direction::Undo)
    }

    /// Step forward one history entry and restore the surface to it
    pub fn redo(&self) -> SessionResult<HistoryOutcome> {
        self.step(Direction::Redo)
    }

    pub fn can_undo(&self) -> bool {
        self.history.borrow().can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.borrow().can_redo()
    }

    pub fn history_len(&self) -> usize {
        self.history.borrow().len()
    }

    pub fn history_cursor(&self) -> Option<usize> {
        self.history.borrow().cursor()
    }

    /// The snapshot at the history cursor
    pub fn current_snapshot(&self) -> Option<Snapshot> {
        self.history.borrow().current().cloned()
    }

    /// Change the history capacity limit at runtime
    pub fn set_history_capacity(&self, capacity: Option<usize>) {
        self.history.borrow_mut().set_capacity_limit(capacity);
    }

    fn step(&self, direction: Direction) -> SessionResult<HistoryOutcome> {
        let target = {
            let mut history = self.history.borrow_mut();
            match direction {
                Direction::Undo => history.undo(),
                Direction::Redo => history.redo(),
            }
        };
        let Some(snapshot) = target else {
            log::debug!("Nothing to {:?}", direction);
            return Ok(HistoryOutcome::NoOp);
        };

        if let Err(err) = self.restore_surface(&snapshot) {
            // Put the cursor back where it was
            let mut history = self.history.borrow_mut();
            match direction {
                Direction::Undo => history.redo(),
                Direction::Redo => history.undo(),
            };
            log::error!("{:?} failed, history cursor rolled back: {}", direction, err);
            return Err(err);
        }

        let (topic, event) = {
            let history = self.history.borrow();
            let event = SessionEvent::HistoryMoved {
                cursor: history.cursor().unwrap_or_default(),
                len: history.len(),
            };
            match direction {
                Direction::Undo => (Topic::HISTORY_UNDO, event),
                Direction::Redo => (Topic::HISTORY_REDO, event),
            }
        };
        self.events.emit(&topic, &event);
        Ok(HistoryOutcome::Moved(snapshot))
    }

    fn record_snapshot(&self) -> SessionResult<()> {
        let snapshot = self.with_surface(|surface| surface.serialize())??;
        let event = {
            let mut history = self.history.borrow_mut();
            history.commit(snapshot);
            SessionEvent::HistoryCommitted {
                cursor: history.cursor().unwrap_or_default(),
                len: history.len(),
            }
        };
        self.events.emit(&Topic::HISTORY_COMMITTED, &event);
        Ok(())
    }

    /// Restore the surface, forward what the restore reported minus any
    /// commits, then tell plugins the surface was replaced.
    fn restore_surface(&self, snapshot: &Snapshot) -> SessionResult<()> {
        let events = {
            let mut surface = self.surface.try_borrow_mut().map_err(|_| SessionError::SurfaceBusy)?;
            surface.restore(snapshot)?;
            surface.take_events()
        };

        for event in events {
            if let SurfaceEvent::ObjectCommitted(id) = event {
                log::warn!("Ignoring commit of {} reported while restoring", id);
                continue;
            }
            self.dispatch_surface_event(event);
        }
        self.plugins.notify(self, &Notification::SurfaceRestored);
        Ok(())
    }

    fn take_surface_events(&self) -> SessionResult<Vec<SurfaceEvent>> {
        let mut surface = self.surface.try_borrow_mut().map_err(|_| SessionError::SurfaceBusy)?;
        Ok(surface.take_events())
    }

    // --- snapshots ---

    /// Serialize the current surface state
    pub fn export_snapshot(&self) -> SessionResult<Snapshot> {
        Ok(self.with_surface(|surface| surface.serialize())??)
    }

    /// Replace the surface with `snapshot` and record it as a new history entry.
    ///
    /// On a restore failure the surface and history are left untouched.
    pub fn import_snapshot(&self, snapshot: &Snapshot) -> SessionResult<()> {
        self.restore_surface(snapshot)?;
        self.record_snapshot()?;
        log::info!("Imported snapshot ({} bytes)", snapshot.len());
        self.events.emit(&Topic::SNAPSHOT_IMPORTED, &SessionEvent::SnapshotImported);
        Ok(())
    }

    // --- plugins ---

    /// Register and initialize a plugin. See [`PluginRegistry::register`].
    pub fn register_plugin<P: Plugin>(&self, name: impl Into<String>, plugin: P) -> Result<PluginRef, PluginError> {
        self.plugins.register(self, name, plugin)
    }

    pub fn get_plugin(&self, name: &str) -> Option<PluginRef> {
        self.plugins.get(name)
    }

    /// Run `f` on the plugin registered as `name` if it is a `T`
    pub fn with_plugin<T: Plugin, R>(&self, name: &str, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        self.plugins.get(name)?.with(f)
    }

    pub fn unregister_plugin(&self, name: &str) -> bool {
        self.plugins.unregister(self, name)
    }

    pub fn plugins(&self) -> &PluginRegistry {
        &self.plugins
    }

    /// Fan a notification out to plugins. Returns how many received it.
    pub fn notify(&self, notification: Notification) -> usize {
        self.plugins.notify(self, &notification)
    }

    // --- clipboard ---

    pub fn set_clipboard(&self, objects: Vec<SurfaceObject>) {
        *self.clipboard.borrow_mut() = objects;
    }

    pub fn clipboard(&self) -> Vec<SurfaceObject> {
        self.clipboard.borrow().clone()
    }

    pub fn has_clipboard(&self) -> bool {
        !self.clipboard.borrow().is_empty()
    }

    // --- teardown ---

    /// Destroy every plugin and drop every bus subscription. Runs once; also called on drop.
    pub fn destroy(&self) {
        if self.destroyed.replace(true) {
            return;
        }
        self.plugins.unregister_all(self);
        self.events.unsubscribe_all(None);
        log::info!("Editor session destroyed");
    }
}

impl Drop for EditorSession {
    fn drop(&mut self) {
        self.destroy();
    }
}
