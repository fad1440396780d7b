use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

use canvas_session::actions::perform;
use canvas_session::plugins::{ContextMenu, KeyEvent, Layer, LayerManager, Preview, ShortcutManager, Viewport};
use canvas_session::{
    Alignment, Canvas, DrawingSurface, EditAction, EditorSession, HandlerResult, Notification, ObjectId, Plugin,
    SessionConfig, SessionEvent, SurfaceObject, Topic,
};

fn create_session() -> (Rc<RefCell<Canvas>>, EditorSession) {
    let _ = env_logger::builder().is_test(true).try_init();
    let canvas = Rc::new(RefCell::new(Canvas::new(800.0, 600.0)));
    let session = EditorSession::new(canvas.clone(), SessionConfig::default());
    (canvas, session)
}

fn add_rect(session: &EditorSession, left: f32, top: f32) -> ObjectId {
    session
        .edit(|surface| surface.add(SurfaceObject::rect(left, top, 100.0, 50.0)))
        .unwrap()
}

fn select(session: &EditorSession, ids: &[ObjectId]) {
    session.edit(|surface| surface.set_selection(ids.to_vec())).unwrap();
}

/// Keeps the last published layer list
#[derive(Default)]
struct LayerPanel {
    layers: Rc<RefCell<Vec<Layer>>>,
}

impl Plugin for LayerPanel {
    fn init(&mut self, _session: &EditorSession) -> HandlerResult {
        Ok(())
    }

    fn topics(&self) -> Vec<Topic> {
        vec![Topic::LAYER_UPDATED]
    }

    fn on_notification(&mut self, _session: &EditorSession, notification: &Notification) -> HandlerResult {
        if let Notification::LayerUpdated(layers) = notification {
            *self.layers.borrow_mut() = layers.clone();
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[test]
fn test_layer_updates_reach_other_plugins() {
    let (_canvas, session) = create_session();
    let panel = LayerPanel::default();
    let published = Rc::clone(&panel.layers);
    session.register_plugin("layers", LayerManager::new()).unwrap();
    session.register_plugin("panel", panel).unwrap();

    let a = add_rect(&session, 0.0, 0.0);
    let b = add_rect(&session, 10.0, 10.0);
    let ids: Vec<ObjectId> = published.borrow().iter().map(|layer| layer.id).collect();
    assert_eq!(ids, vec![a, b]);

    session.undo().unwrap();
    let ids: Vec<ObjectId> = published.borrow().iter().map(|layer| layer.id).collect();
    assert_eq!(ids, vec![a]);
}

#[test]
fn test_copy_paste_offsets_and_selects_duplicates() {
    let (canvas, session) = create_session();
    let id = add_rect(&session, 10.0, 20.0);

    assert!(!perform(&session, EditAction::Paste).unwrap());

    select(&session, &[id]);
    assert!(perform(&session, EditAction::Copy).unwrap());
    assert!(perform(&session, EditAction::Paste).unwrap());

    let canvas = canvas.borrow();
    assert_eq!(canvas.len(), 2);
    let pasted = canvas.selection();
    assert_eq!(pasted.len(), 1);
    assert_ne!(pasted[0], id);
    let copy = canvas.object(pasted[0]).unwrap();
    assert_eq!((copy.left, copy.top), (20.0, 30.0));
}

#[test]
fn test_align_commits_once() {
    let (canvas, session) = create_session();
    let a = add_rect(&session, 10.0, 20.0);
    let b = add_rect(&session, 300.0, 40.0);
    select(&session, &[a, b]);
    let before = session.history_len();

    assert!(perform(&session, EditAction::Align(Alignment::Right)).unwrap());
    assert_eq!(session.history_len(), before + 1);

    let canvas = canvas.borrow();
    for id in [a, b] {
        assert_eq!(canvas.object(id).unwrap().left, 700.0);
    }
}

#[test]
fn test_group_then_ungroup_is_undoable() {
    let (canvas, session) = create_session();
    let a = add_rect(&session, 0.0, 0.0);
    let b = add_rect(&session, 200.0, 100.0);
    select(&session, &[a, b]);

    assert!(perform(&session, EditAction::Group).unwrap());
    assert_eq!(canvas.borrow().len(), 1);

    assert!(perform(&session, EditAction::Ungroup).unwrap());
    assert_eq!(canvas.borrow().len(), 2);
    assert_eq!(canvas.borrow().object(b).unwrap().left, 200.0);

    session.undo().unwrap();
    assert_eq!(canvas.borrow().len(), 1);
    session.undo().unwrap();
    assert_eq!(canvas.borrow().objects(), vec![a, b]);
}

#[test]
fn test_restack_keeps_relative_order() {
    let (canvas, session) = create_session();
    let a = add_rect(&session, 0.0, 0.0);
    let b = add_rect(&session, 0.0, 0.0);
    let c = add_rect(&session, 0.0, 0.0);

    select(&session, &[b, c]);
    assert!(perform(&session, EditAction::SendToBack).unwrap());
    assert_eq!(canvas.borrow().objects(), vec![b, c, a]);

    assert!(!perform(&session, EditAction::SendToBack).unwrap());

    select(&session, &[a]);
    assert!(!perform(&session, EditAction::BringToFront).unwrap());
    assert!(perform(&session, EditAction::SendBackward).unwrap());
    assert_eq!(canvas.borrow().objects(), vec![b, a, c]);
}

#[test]
fn test_actions_are_published_on_the_session_bus() {
    let (_canvas, session) = create_session();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    session.events().subscribe(
        EditAction::Delete.topic(),
        Rc::new(move |event: &SessionEvent| -> HandlerResult {
            if let SessionEvent::ActionPerformed { objects, .. } = event {
                sink.borrow_mut().extend(objects.iter().copied());
            }
            Ok(())
        }),
    );

    let id = add_rect(&session, 0.0, 0.0);
    select(&session, &[id]);
    perform(&session, EditAction::Delete).unwrap();

    assert_eq!(*seen.borrow(), vec![id]);
}

#[test]
fn test_select_all_skips_locked_objects() {
    let (canvas, session) = create_session();
    session.register_plugin("layers", LayerManager::new()).unwrap();
    let a = add_rect(&session, 0.0, 0.0);
    let b = add_rect(&session, 10.0, 0.0);
    session
        .with_plugin::<LayerManager, _>("layers", |layers| layers.set_locked(&session, a, true))
        .unwrap()
        .unwrap();

    assert!(perform(&session, EditAction::SelectAll).unwrap());
    assert_eq!(canvas.borrow().selection(), vec![b]);
}

#[test]
fn test_registered_shortcuts_drive_history() {
    let (canvas, session) = create_session();
    session.register_plugin("shortcuts", ShortcutManager::new()).unwrap();
    add_rect(&session, 0.0, 0.0);

    let press = |event: KeyEvent| {
        session
            .with_plugin::<ShortcutManager, _>("shortcuts", |shortcuts| shortcuts.handle_key(&session, &event))
            .unwrap()
            .unwrap()
    };

    assert!(press(KeyEvent::new("z").ctrl()));
    assert!(canvas.borrow().is_empty());
    assert!(press(KeyEvent::new("Z").ctrl().shift()));
    assert_eq!(canvas.borrow().len(), 1);
    assert!(press(KeyEvent::new("a").ctrl()));
    assert!(press(KeyEvent::new("Delete")));
    assert!(canvas.borrow().is_empty());
}

#[test]
fn test_context_menu_closes_when_surface_is_restored() {
    let (_canvas, session) = create_session();
    session.register_plugin("menu", ContextMenu::new()).unwrap();
    let id = add_rect(&session, 0.0, 0.0);
    select(&session, &[id]);

    let opened = session
        .with_plugin::<ContextMenu, _>("menu", |menu| {
            menu.open(&session, 5.0, 5.0, Viewport::new(1024.0, 768.0))
                .map(|menu| menu.is_some())
        })
        .unwrap()
        .unwrap();
    assert!(opened);

    session.undo().unwrap();
    let open = session
        .with_plugin::<ContextMenu, _>("menu", |menu| menu.is_open())
        .unwrap();
    assert!(!open);
}

#[test]
fn test_preview_follows_transforms() {
    let (canvas, session) = create_session();
    session.register_plugin("preview", Preview::new()).unwrap();
    let id = add_rect(&session, 0.0, 0.0);
    session
        .with_plugin::<Preview, _>("preview", |preview| preview.show(&session))
        .unwrap()
        .unwrap();

    canvas.borrow_mut().rotate_by(id, 45.0);
    session.flush_surface_events().unwrap();

    let (count, snapshot) = session
        .with_plugin::<Preview, _>("preview", |preview| (preview.refresh_count(), preview.snapshot().cloned()))
        .unwrap();
    assert_eq!(count, 2);
    assert_eq!(snapshot, Some(session.export_snapshot().unwrap()));
}

#[test]
fn test_every_action_is_harmless_on_an_empty_canvas() {
    let (canvas, session) = create_session();
    let actions = [
        EditAction::Undo,
        EditAction::Redo,
        EditAction::Copy,
        EditAction::Paste,
        EditAction::Delete,
        EditAction::Group,
        EditAction::Ungroup,
        EditAction::SendBackward,
        EditAction::BringForward,
        EditAction::SendToBack,
        EditAction::BringToFront,
        EditAction::SelectAll,
    ];

    for action in actions.into_iter().chain(Alignment::ALL.map(EditAction::Align)) {
        assert!(!perform(&session, action).unwrap(), "{} changed an empty canvas", action.name());
    }
    assert!(canvas.borrow().is_empty());
    assert_eq!(session.history_len(), 1);
}

#[test]
fn test_actions_with_nothing_selected_do_nothing() {
    let (canvas, session) = create_session();
    let a = add_rect(&session, 0.0, 0.0);
    let b = add_rect(&session, 10.0, 0.0);
    let before = session.history_len();

    for action in [
        EditAction::Delete,
        EditAction::BringToFront,
        EditAction::SendToBack,
        EditAction::BringForward,
        EditAction::SendBackward,
        EditAction::Align(Alignment::Center),
    ] {
        assert!(!perform(&session, action).unwrap());
    }
    assert_eq!(canvas.borrow().objects(), vec![a, b]);
    assert_eq!(session.history_len(), before);
}

#[test]
fn test_one_undo_reverts_a_multi_object_delete() {
    let (canvas, session) = create_session();
    let a = add_rect(&session, 0.0, 0.0);
    let b = add_rect(&session, 10.0, 10.0);
    select(&session, &[a, b]);
    let before = session.export_snapshot().unwrap();
    let history_before = session.history_len();

    assert!(perform(&session, EditAction::Delete).unwrap());
    assert!(canvas.borrow().is_empty());
    assert_eq!(session.history_len(), history_before + 1);

    session.undo().unwrap();
    assert_eq!(canvas.borrow().objects(), vec![a, b]);
    assert_eq!(session.export_snapshot().unwrap(), before);
}

#[test]
fn test_one_undo_reverts_a_multi_object_paste() {
    let (canvas, session) = create_session();
    let a = add_rect(&session, 0.0, 0.0);
    let b = add_rect(&session, 10.0, 10.0);
    select(&session, &[a, b]);
    perform(&session, EditAction::Copy).unwrap();
    let before = session.export_snapshot().unwrap();
    let history_before = session.history_len();

    assert!(perform(&session, EditAction::Paste).unwrap());
    assert_eq!(canvas.borrow().len(), 4);
    assert_eq!(session.history_len(), history_before + 1);

    session.undo().unwrap();
    assert_eq!(canvas.borrow().objects(), vec![a, b]);
    assert_eq!(session.export_snapshot().unwrap(), before);
}

#[test]
fn test_one_undo_reverts_a_multi_object_restack() {
    let (canvas, session) = create_session();
    let a = add_rect(&session, 0.0, 0.0);
    let b = add_rect(&session, 0.0, 0.0);
    let c = add_rect(&session, 0.0, 0.0);
    select(&session, &[b, c]);
    let history_before = session.history_len();

    assert!(perform(&session, EditAction::SendToBack).unwrap());
    assert_eq!(canvas.borrow().objects(), vec![b, c, a]);
    assert_eq!(session.history_len(), history_before + 1);

    session.undo().unwrap();
    assert_eq!(canvas.borrow().objects(), vec![a, b, c]);
}

#[test]
fn test_multi_object_edit_still_reports_each_object() {
    let (_canvas, session) = create_session();
    let log = Rc::new(RefCell::new(Vec::new()));

    /// Records the history length seen by each `object:modified`
    struct ModifiedLog {
        seen: Rc<RefCell<Vec<(ObjectId, usize)>>>,
    }

    impl Plugin for ModifiedLog {
        fn init(&mut self, _session: &EditorSession) -> HandlerResult {
            Ok(())
        }

        fn topics(&self) -> Vec<Topic> {
            vec![Topic::OBJECT_MODIFIED]
        }

        fn on_notification(&mut self, session: &EditorSession, notification: &Notification) -> HandlerResult {
            if let Notification::ObjectModified(id) = notification {
                self.seen.borrow_mut().push((*id, session.history_len()));
            }
            Ok(())
        }

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    let a = add_rect(&session, 0.0, 0.0);
    let b = add_rect(&session, 10.0, 10.0);
    select(&session, &[a, b]);
    session
        .register_plugin("modified", ModifiedLog { seen: Rc::clone(&log) })
        .unwrap();
    let history_before = session.history_len();

    perform(&session, EditAction::Delete).unwrap();

    // Both objects are reported, each after the single commit
    assert_eq!(
        *log.borrow(),
        vec![(a, history_before + 1), (b, history_before + 1)]
    );
}
