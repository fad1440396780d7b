use std::any::Any;

use crate::actions::{self, Alignment, EditAction};
use crate::error::{HandlerResult, SessionResult};
use crate::event::{Notification, Topic};
use crate::plugin::Plugin;
use crate::session::EditorSession;
use crate::surface::ObjectId;

const MENU_WIDTH: f32 = 160.0;
const ITEM_HEIGHT: f32 = 28.0;
const SEPARATOR_HEIGHT: f32 = 9.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MenuItem {
    Action(EditAction),
    Separator,
}

impl MenuItem {
    pub fn label(&self) -> Option<&'static str> {
        match self {
            MenuItem::Action(action) => Some(action.label()),
            MenuItem::Separator => None,
        }
    }

    fn height(&self) -> f32 {
        match self {
            MenuItem::Action(_) => ITEM_HEIGHT,
            MenuItem::Separator => SEPARATOR_HEIGHT,
        }
    }
}

/// Area the menu must stay inside
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// An open menu: where it sits and what it offers
#[derive(Debug, Clone, PartialEq)]
pub struct Menu {
    pub x: f32,
    pub y: f32,
    pub items: Vec<MenuItem>,
}

impl Menu {
    pub fn width(&self) -> f32 {
        MENU_WIDTH
    }

    pub fn height(&self) -> f32 {
        self.items.iter().map(MenuItem::height).sum()
    }

    pub fn actions(&self) -> impl Iterator<Item = EditAction> + '_ {
        self.items.iter().filter_map(|item| match item {
            MenuItem::Action(action) => Some(*action),
            MenuItem::Separator => None,
        })
    }
}

/// Right-click menu whose entries depend on the current selection
#[derive(Debug)]
pub struct ContextMenu {
    menu: Option<Menu>,
    enabled: bool,
}

impl Default for ContextMenu {
    fn default() -> Self {
        Self {
            menu: None,
            enabled: true,
        }
    }
}

impl ContextMenu {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open the menu at `(x, y)`, shifted so it fits inside `viewport`.
    ///
    /// Returns `None` while the menu is disabled.
    pub fn open(&mut self, session: &EditorSession, x: f32, y: f32, viewport: Viewport) -> SessionResult<Option<&Menu>> {
        if !self.enabled {
            return Ok(None);
        }

        let (selection, single_group) = session.with_surface(|surface| {
            let selection = surface.selection();
            let single_group = match selection.as_slice() {
                [id] => surface.object(*id).is_some_and(|object| object.is_group()),
                _ => false,
            };
            (selection, single_group)
        })?;

        let items = Self::items_for(&selection, single_group);
        let mut menu = Menu { x, y, items };
        menu.x = x.min(viewport.width - menu.width()).max(0.0);
        menu.y = y.min(viewport.height - menu.height()).max(0.0);
        log::debug!("Context menu opened at ({}, {}) with {} item(s)", menu.x, menu.y, menu.items.len());

        let menu: &Menu = self.menu.insert(menu);
        Ok(Some(menu))
    }

    /// Run the item at `index` and close the menu.
    ///
    /// Separators and out-of-range indices only close it.
    pub fn activate(&mut self, session: &EditorSession, index: usize) -> SessionResult<bool> {
        let Some(menu) = self.menu.take() else {
            return Ok(false);
        };
        match menu.items.get(index) {
            Some(MenuItem::Action(action)) => actions::perform(session, *action),
            _ => Ok(false),
        }
    }

    pub fn close(&mut self) {
        self.menu = None;
    }

    pub fn menu(&self) -> Option<&Menu> {
        self.menu.as_ref()
    }

    pub fn is_open(&self) -> bool {
        self.menu.is_some()
    }

    pub fn enable(&mut self) {
        self.enabled = true;
    }

    /// Disable the menu, closing it if open
    pub fn disable(&mut self) {
        self.enabled = false;
        self.menu = None;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn items_for(selection: &[ObjectId], single_group: bool) -> Vec<MenuItem> {
        let mut items = vec![
            MenuItem::Action(EditAction::Copy),
            MenuItem::Action(EditAction::Paste),
            MenuItem::Action(EditAction::Delete),
        ];
        if selection.is_empty() {
            return items;
        }

        items.push(MenuItem::Separator);
        if selection.len() > 1 {
            items.push(MenuItem::Action(EditAction::Group));
        } else if single_group {
            items.push(MenuItem::Action(EditAction::Ungroup));
        }
        items.extend(Alignment::ALL.map(|alignment| MenuItem::Action(EditAction::Align(alignment))));
        items.push(MenuItem::Separator);
        items.extend([
            MenuItem::Action(EditAction::BringForward),
            MenuItem::Action(EditAction::SendBackward),
            MenuItem::Action(EditAction::BringToFront),
            MenuItem::Action(EditAction::SendToBack),
        ]);
        items
    }
}

impl Plugin for ContextMenu {
    fn init(&mut self, _session: &EditorSession) -> HandlerResult {
        Ok(())
    }

    fn destroy(&mut self, _session: &EditorSession) {
        self.menu = None;
    }

    fn topics(&self) -> Vec<Topic> {
        vec![Topic::SELECTION_CLEARED, Topic::SURFACE_RESTORED]
    }

    // Items were built for a selection that no longer exists
    fn on_notification(&mut self, _session: &EditorSession, _notification: &Notification) -> HandlerResult {
        self.close();
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SessionConfig;
    use crate::surface::{Canvas, SurfaceObject};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn setup() -> (Rc<RefCell<Canvas>>, EditorSession) {
        let canvas = Rc::new(RefCell::new(Canvas::new(800.0, 600.0)));
        let session = EditorSession::new(canvas.clone(), SessionConfig::default());
        (canvas, session)
    }

    fn viewport() -> Viewport {
        Viewport::new(1024.0, 768.0)
    }

    #[test]
    fn empty_selection_offers_clipboard_items_only() {
        let (_canvas, session) = setup();
        let mut menu = ContextMenu::new();

        let opened = menu.open(&session, 10.0, 10.0, viewport()).unwrap().unwrap();
        let actions: Vec<EditAction> = opened.actions().collect();
        assert_eq!(actions, vec![EditAction::Copy, EditAction::Paste, EditAction::Delete]);
    }

    #[test]
    fn items_depend_on_selection() {
        let (_canvas, session) = setup();
        let mut menu = ContextMenu::new();
        let a = session.edit(|s| s.add(SurfaceObject::rect(0.0, 0.0, 10.0, 10.0))).unwrap();
        let b = session.edit(|s| s.add(SurfaceObject::rect(20.0, 0.0, 10.0, 10.0))).unwrap();

        session.edit(|s| s.set_selection(vec![a])).unwrap();
        let single: Vec<EditAction> = menu.open(&session, 0.0, 0.0, viewport()).unwrap().unwrap().actions().collect();
        assert!(!single.contains(&EditAction::Group));
        assert!(!single.contains(&EditAction::Ungroup));
        assert!(single.contains(&EditAction::Align(Alignment::Bottom)));
        assert!(single.contains(&EditAction::SendToBack));

        session.edit(|s| s.set_selection(vec![a, b])).unwrap();
        let pair: Vec<EditAction> = menu.open(&session, 0.0, 0.0, viewport()).unwrap().unwrap().actions().collect();
        assert!(pair.contains(&EditAction::Group));

        actions::perform(&session, EditAction::Group).unwrap();
        let grouped: Vec<EditAction> = menu.open(&session, 0.0, 0.0, viewport()).unwrap().unwrap().actions().collect();
        assert!(grouped.contains(&EditAction::Ungroup));
        assert!(!grouped.contains(&EditAction::Group));
    }

    #[test]
    fn menu_is_clamped_into_viewport() {
        let (_canvas, session) = setup();
        let mut menu = ContextMenu::new();
        let small = Viewport::new(300.0, 200.0);

        let opened = menu.open(&session, 290.0, 190.0, small).unwrap().unwrap();
        assert_eq!(opened.x, 300.0 - MENU_WIDTH);
        assert_eq!(opened.y, 200.0 - 3.0 * ITEM_HEIGHT);

        let tiny = Viewport::new(50.0, 20.0);
        let opened = menu.open(&session, 40.0, 10.0, tiny).unwrap().unwrap();
        assert_eq!((opened.x, opened.y), (0.0, 0.0));
    }

    #[test]
    fn activate_runs_the_item_and_closes() {
        let (canvas, session) = setup();
        let mut menu = ContextMenu::new();
        let id = session.edit(|s| s.add(SurfaceObject::rect(0.0, 0.0, 10.0, 10.0))).unwrap();
        session.edit(|s| s.set_selection(vec![id])).unwrap();

        menu.open(&session, 0.0, 0.0, viewport()).unwrap();
        // Delete
        assert!(menu.activate(&session, 2).unwrap());
        assert!(!menu.is_open());
        assert!(canvas.borrow().is_empty());

        assert!(!menu.activate(&session, 0).unwrap());
    }

    #[test]
    fn disabled_menu_does_not_open() {
        let (_canvas, session) = setup();
        let mut menu = ContextMenu::new();
        menu.open(&session, 0.0, 0.0, viewport()).unwrap();

        menu.disable();
        assert!(!menu.is_open());
        assert!(menu.open(&session, 0.0, 0.0, viewport()).unwrap().is_none());
    }
}
