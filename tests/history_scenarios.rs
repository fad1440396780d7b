use std::cell::{Cell, RefCell};
use std::rc::Rc;

use canvas_session::surface::StackMove;
use canvas_session::{
    Canvas, DrawingSurface, EditorSession, HandlerResult, HistoryOutcome, ObjectId, RestoreError,
    SerializeError, SessionConfig, SessionError, SessionEvent, Snapshot, SurfaceEvent, SurfaceObject, Topic,
};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn create_session() -> (Rc<RefCell<Canvas>>, EditorSession) {
    init_logging();
    let canvas = Rc::new(RefCell::new(Canvas::new(800.0, 600.0)));
    let session = EditorSession::new(canvas.clone(), SessionConfig::default());
    (canvas, session)
}

fn moved(outcome: HistoryOutcome) -> Snapshot {
    match outcome {
        HistoryOutcome::Moved(snapshot) => snapshot,
        HistoryOutcome::NoOp => panic!("expected the history cursor to move"),
    }
}

#[test]
fn test_add_move_undo_redo_scenario() {
    let (canvas, session) = create_session();
    let s0 = session.current_snapshot().unwrap();

    // Add an object: one settled change
    let id = session
        .edit(|surface| surface.add(SurfaceObject::rect(10.0, 10.0, 50.0, 50.0)))
        .unwrap();
    let s1 = session.current_snapshot().unwrap();
    assert_eq!(session.history_len(), 2);

    // Drag it: transient events do not commit
    canvas.borrow_mut().translate(id, 5.0, 0.0);
    canvas.borrow_mut().translate(id, 5.0, 5.0);
    session.flush_surface_events().unwrap();
    assert_eq!(session.history_len(), 2);

    // Drag end commits
    canvas.borrow_mut().finish_transform(id);
    session.flush_surface_events().unwrap();
    let s2 = session.current_snapshot().unwrap();
    assert_eq!(session.history_len(), 3);
    assert_ne!(s1, s2);

    assert_eq!(moved(session.undo().unwrap()), s1);
    assert_eq!(canvas.borrow().object(id).unwrap().left, 10.0);
    assert_eq!(moved(session.undo().unwrap()), s0);
    assert!(canvas.borrow().is_empty());
    assert_eq!(moved(session.redo().unwrap()), s1);
    assert_eq!(canvas.borrow().len(), 1);
}

#[test]
fn test_undo_redo_are_no_ops_at_boundaries() {
    let (_canvas, session) = create_session();
    let initial = session.current_snapshot();

    assert!(session.undo().unwrap().is_no_op());
    assert!(session.redo().unwrap().is_no_op());
    assert_eq!(session.current_snapshot(), initial);
    assert_eq!(session.history_cursor(), Some(0));
}

#[test]
fn test_commit_after_undo_discards_redo_tail() {
    let (canvas, session) = create_session();
    let a = session.edit(|s| s.add(SurfaceObject::rect(0.0, 0.0, 10.0, 10.0))).unwrap();
    session.edit(|s| s.add(SurfaceObject::rect(20.0, 0.0, 10.0, 10.0))).unwrap();

    session.undo().unwrap();
    assert!(session.can_redo());

    canvas.borrow_mut().translate(a, 1.0, 1.0);
    canvas.borrow_mut().finish_transform(a);
    session.flush_surface_events().unwrap();

    assert!(!session.can_redo());
    assert!(session.redo().unwrap().is_no_op());
    assert_eq!(session.history_len(), 3);
    assert_eq!(canvas.borrow().len(), 1);
}

#[test]
fn test_restore_never_grows_history() {
    let (_canvas, session) = create_session();
    for i in 0..3 {
        session
            .edit(|s| s.add(SurfaceObject::rect(i as f32 * 20.0, 0.0, 10.0, 10.0)))
            .unwrap();
    }
    assert_eq!(session.history_len(), 4);

    session.undo().unwrap();
    session.undo().unwrap();
    session.redo().unwrap();
    assert_eq!(session.history_len(), 4);
    assert_eq!(session.history_cursor(), Some(2));
}

#[test]
fn test_capacity_limit_evicts_oldest() {
    init_logging();
    let canvas = Rc::new(RefCell::new(Canvas::default()));
    let config = SessionConfig::default().with_history_capacity(Some(3));
    let session = EditorSession::new(canvas.clone(), config);

    for i in 0..5 {
        session
            .edit(|s| s.add(SurfaceObject::rect(i as f32, 0.0, 1.0, 1.0)))
            .unwrap();
    }
    assert_eq!(session.history_len(), 3);

    // Only two steps back are left: 5 objects -> 4 -> 3
    assert!(!session.undo().unwrap().is_no_op());
    assert!(!session.undo().unwrap().is_no_op());
    assert!(session.undo().unwrap().is_no_op());
    assert_eq!(canvas.borrow().len(), 3);
}

#[test]
fn test_history_events_are_published() {
    let (_canvas, session) = create_session();
    let log = Rc::new(RefCell::new(Vec::new()));

    for topic in [Topic::HISTORY_COMMITTED, Topic::HISTORY_UNDO, Topic::HISTORY_REDO] {
        let log = Rc::clone(&log);
        let name = topic.to_string();
        session.events().subscribe(
            topic,
            Rc::new(move |event: &SessionEvent| -> HandlerResult {
                if let SessionEvent::HistoryCommitted { cursor, .. } | SessionEvent::HistoryMoved { cursor, .. } = event
                {
                    log.borrow_mut().push(format!("{}@{}", name, cursor));
                }
                Ok(())
            }),
        );
    }

    session.edit(|s| s.add(SurfaceObject::rect(0.0, 0.0, 10.0, 10.0))).unwrap();
    session.undo().unwrap();
    session.redo().unwrap();

    assert_eq!(
        *log.borrow(),
        vec!["history:committed@1", "history:undo@0", "history:redo@1"]
    );
}

#[test]
fn test_import_records_new_history_point() {
    let (canvas, session) = create_session();
    session.edit(|s| s.add(SurfaceObject::rect(0.0, 0.0, 10.0, 10.0))).unwrap();
    let exported = session.export_snapshot().unwrap();

    let other_canvas = Rc::new(RefCell::new(Canvas::new(800.0, 600.0)));
    let other = EditorSession::new(other_canvas.clone(), SessionConfig::default());
    let imported = Rc::new(Cell::new(false));
    let flag = Rc::clone(&imported);
    other.events().subscribe(
        Topic::SNAPSHOT_IMPORTED,
        Rc::new(move |_: &SessionEvent| -> HandlerResult {
            flag.set(true);
            Ok(())
        }),
    );

    other.import_snapshot(&exported).unwrap();
    assert!(imported.get());
    assert_eq!(other_canvas.borrow().len(), 1);
    assert_eq!(other.history_len(), 2);

    // The import itself is undoable
    other.undo().unwrap();
    assert!(other_canvas.borrow().is_empty());
    assert_eq!(canvas.borrow().len(), 1);
}

#[test]
fn test_malformed_import_leaves_state_untouched() {
    let (canvas, session) = create_session();
    session.edit(|s| s.add(SurfaceObject::rect(0.0, 0.0, 10.0, 10.0))).unwrap();

    let err = session.import_snapshot(&Snapshot::from("not json")).unwrap_err();
    assert!(matches!(err, SessionError::Restore(RestoreError::Malformed(_))));
    assert_eq!(canvas.borrow().len(), 1);
    assert_eq!(session.history_len(), 2);

    let err = session
        .import_snapshot(&Snapshot::from(r#"{"version":99,"width":1,"height":1,"objects":[]}"#))
        .unwrap_err();
    assert!(matches!(
        err,
        SessionError::Restore(RestoreError::Version { found: 99, .. })
    ));
}

/// Canvas wrapper whose restores and serializations can be made to fail on demand
struct FlakySurface {
    inner: Canvas,
    fail_restore: bool,
    fail_serialize: bool,
}

impl FlakySurface {
    fn new() -> Self {
        Self {
            inner: Canvas::default(),
            fail_restore: false,
            fail_serialize: false,
        }
    }
}

impl DrawingSurface for FlakySurface {
    fn serialize(&self) -> Result<Snapshot, SerializeError> {
        if self.fail_serialize {
            let err = serde_json::from_str::<u32>("not a number").unwrap_err();
            return Err(SerializeError::Json(err));
        }
        self.inner.serialize()
    }

    fn restore(&mut self, snapshot: &Snapshot) -> Result<(), RestoreError> {
        if self.fail_restore {
            return Err(RestoreError::Version { found: 0, expected: 1 });
        }
        self.inner.restore(snapshot)
    }

    fn take_events(&mut self) -> Vec<SurfaceEvent> {
        self.inner.take_events()
    }

    fn size(&self) -> (f32, f32) {
        self.inner.size()
    }

    fn objects(&self) -> Vec<ObjectId> {
        self.inner.objects()
    }

    fn object(&self, id: ObjectId) -> Option<&SurfaceObject> {
        self.inner.object(id)
    }

    fn object_mut(&mut self, id: ObjectId) -> Option<&mut SurfaceObject> {
        self.inner.object_mut(id)
    }

    fn add(&mut self, object: SurfaceObject) -> ObjectId {
        self.inner.add(object)
    }

    fn remove(&mut self, id: ObjectId) -> Option<SurfaceObject> {
        self.inner.remove(id)
    }

    fn selection(&self) -> Vec<ObjectId> {
        self.inner.selection()
    }

    fn set_selection(&mut self, ids: Vec<ObjectId>) {
        self.inner.set_selection(ids)
    }

    fn clear_selection(&mut self) {
        self.inner.clear_selection()
    }

    fn restack(&mut self, id: ObjectId, to: StackMove) -> bool {
        self.inner.restack(id, to)
    }

    fn group(&mut self, ids: &[ObjectId]) -> Option<ObjectId> {
        self.inner.group(ids)
    }

    fn ungroup(&mut self, id: ObjectId) -> Vec<ObjectId> {
        self.inner.ungroup(id)
    }

    fn mark_committed(&mut self, id: ObjectId) {
        self.inner.mark_committed(id)
    }
}

#[test]
fn test_failed_restore_rolls_back_cursor() {
    init_logging();
    let surface = Rc::new(RefCell::new(FlakySurface::new()));
    let session = EditorSession::new(surface.clone(), SessionConfig::default());
    session.edit(|s| s.add(SurfaceObject::rect(0.0, 0.0, 10.0, 10.0))).unwrap();
    assert_eq!(session.history_cursor(), Some(1));

    surface.borrow_mut().fail_restore = true;
    assert!(session.undo().is_err());
    assert_eq!(session.history_cursor(), Some(1));
    assert_eq!(surface.borrow().objects().len(), 1);

    surface.borrow_mut().fail_restore = false;
    assert!(!session.undo().unwrap().is_no_op());
    assert_eq!(session.history_cursor(), Some(0));
    assert!(surface.borrow().objects().is_empty());
}

#[test]
fn test_failed_serialize_is_reported_at_commit() {
    init_logging();
    let surface = Rc::new(RefCell::new(FlakySurface::new()));
    let session = EditorSession::new(surface.clone(), SessionConfig::default());

    surface.borrow_mut().fail_serialize = true;
    let err = session
        .edit(|s| s.add(SurfaceObject::rect(0.0, 0.0, 10.0, 10.0)))
        .unwrap_err();
    assert!(matches!(err, SessionError::Serialize(_)));
    assert_eq!(session.history_len(), 1);
    assert!(session.export_snapshot().is_err());

    // Nothing broken was recorded, so undo stays a no-op
    surface.borrow_mut().fail_serialize = false;
    assert!(session.undo().unwrap().is_no_op());
}

#[test]
fn test_one_history_entry_per_edit() {
    let (canvas, session) = create_session();
    let before = session.current_snapshot().unwrap();

    session
        .edit(|s| {
            s.add(SurfaceObject::rect(0.0, 0.0, 10.0, 10.0));
            s.add(SurfaceObject::rect(20.0, 0.0, 10.0, 10.0));
        })
        .unwrap();
    assert_eq!(session.history_len(), 2);
    assert_eq!(canvas.borrow().len(), 2);

    assert_eq!(moved(session.undo().unwrap()), before);
    assert!(canvas.borrow().is_empty());
}
