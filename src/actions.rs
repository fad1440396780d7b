use crate::error::SessionResult;
use crate::event::{SessionEvent, Topic};
use crate::session::EditorSession;
use crate::surface::{DrawingSurface, ObjectId, StackMove};

/// Edge or axis to align the selection to, relative to the surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Alignment {
    Left,
    Center,
    Right,
    Top,
    Middle,
    Bottom,
}

impl Alignment {
    pub const ALL: [Alignment; 6] = [
        Alignment::Left,
        Alignment::Center,
        Alignment::Right,
        Alignment::Top,
        Alignment::Middle,
        Alignment::Bottom,
    ];
}

/// Editing operations shared by the shortcut manager and the context menu
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditAction {
    Undo,
    Redo,
    Copy,
    Paste,
    Delete,
    Group,
    Ungroup,
    Align(Alignment),
    SendBackward,
    BringForward,
    SendToBack,
    BringToFront,
    SelectAll,
}

impl EditAction {
    /// Stable identifier, also used in `action:<name>` topics
    pub fn name(self) -> &'static str {
        match self {
            EditAction::Undo => "undo",
            EditAction::Redo => "redo",
            EditAction::Copy => "copy",
            EditAction::Paste => "paste",
            EditAction::Delete => "delete",
            EditAction::Group => "group",
            EditAction::Ungroup => "ungroup",
            EditAction::Align(Alignment::Left) => "align-left",
            EditAction::Align(Alignment::Center) => "align-center",
            EditAction::Align(Alignment::Right) => "align-right",
            EditAction::Align(Alignment::Top) => "align-top",
            EditAction::Align(Alignment::Middle) => "align-middle",
            EditAction::Align(Alignment::Bottom) => "align-bottom",
            EditAction::SendBackward => "send-backward",
            EditAction::BringForward => "bring-forward",
            EditAction::SendToBack => "send-to-back",
            EditAction::BringToFront => "bring-to-front",
            EditAction::SelectAll => "select-all",
        }
    }

    /// Human readable menu label
    pub fn label(self) -> &'static str {
        match self {
            EditAction::Undo => "Undo",
            EditAction::Redo => "Redo",
            EditAction::Copy => "Copy",
            EditAction::Paste => "Paste",
            EditAction::Delete => "Delete",
            EditAction::Group => "Group",
            EditAction::Ungroup => "Ungroup",
            EditAction::Align(Alignment::Left) => "Align left",
            EditAction::Align(Alignment::Center) => "Center horizontally",
            EditAction::Align(Alignment::Right) => "Align right",
            EditAction::Align(Alignment::Top) => "Align top",
            EditAction::Align(Alignment::Middle) => "Center vertically",
            EditAction::Align(Alignment::Bottom) => "Align bottom",
            EditAction::SendBackward => "Send backward",
            EditAction::BringForward => "Bring forward",
            EditAction::SendToBack => "Send to back",
            EditAction::BringToFront => "Bring to front",
            EditAction::SelectAll => "Select all",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        const ACTIONS: [EditAction; 18] = [
            EditAction::Undo,
            EditAction::Redo,
            EditAction::Copy,
            EditAction::Paste,
            EditAction::Delete,
            EditAction::Group,
            EditAction::Ungroup,
            EditAction::Align(Alignment::Left),
            EditAction::Align(Alignment::Center),
            EditAction::Align(Alignment::Right),
            EditAction::Align(Alignment::Top),
            EditAction::Align(Alignment::Middle),
            EditAction::Align(Alignment::Bottom),
            EditAction::SendBackward,
            EditAction::BringForward,
            EditAction::SendToBack,
            EditAction::BringToFront,
            EditAction::SelectAll,
        ];
        ACTIONS.into_iter().find(|action| action.name() == name)
    }

    /// Topic emitted on the session bus after the action changed something
    pub fn topic(self) -> Topic {
        Topic::custom(format!("action:{}", self.name()))
    }
}

/// Apply `action` to the session's current selection.
///
/// Returns whether anything changed. On success an [`SessionEvent::ActionPerformed`]
/// is emitted on the action's topic.
pub fn perform(session: &EditorSession, action: EditAction) -> SessionResult<bool> {
    let objects = match action {
        EditAction::Undo => return Ok(!session.undo()?.is_no_op()),
        EditAction::Redo => return Ok(!session.redo()?.is_no_op()),
        EditAction::Copy => copy(session)?,
        EditAction::Paste => paste(session)?,
        EditAction::Delete => session.edit(delete)?,
        EditAction::Group => session.edit(group)?,
        EditAction::Ungroup => session.edit(ungroup)?,
        EditAction::Align(alignment) => session.edit(|surface| align(surface, alignment))?,
        EditAction::SendBackward => session.edit(|surface| restack(surface, StackMove::Backward))?,
        EditAction::BringForward => session.edit(|surface| restack(surface, StackMove::Forward))?,
        EditAction::SendToBack => session.edit(|surface| restack(surface, StackMove::ToBack))?,
        EditAction::BringToFront => session.edit(|surface| restack(surface, StackMove::ToFront))?,
        EditAction::SelectAll => session.edit(select_all)?,
    };

    if objects.is_empty() {
        log::debug!("Action '{}' had nothing to do", action.name());
        return Ok(false);
    }
    log::debug!("Action '{}' applied to {} object(s)", action.name(), objects.len());
    session
        .events()
        .emit(&action.topic(), &SessionEvent::ActionPerformed { action, objects });
    Ok(true)
}

fn copy(session: &EditorSession) -> SessionResult<Vec<ObjectId>> {
    let copied = session.with_surface(|surface| {
        surface
            .selection()
            .into_iter()
            .filter_map(|id| surface.object(id).cloned())
            .collect::<Vec<_>>()
    })?;
    if copied.is_empty() {
        return Ok(Vec::new());
    }

    let ids = copied.iter().map(|object| object.id).collect();
    session.set_clipboard(copied);
    Ok(ids)
}

fn paste(session: &EditorSession) -> SessionResult<Vec<ObjectId>> {
    let clipboard = session.clipboard();
    if clipboard.is_empty() {
        return Ok(Vec::new());
    }

    let offset = session.config().paste_offset;
    session.edit(|surface| {
        let ids: Vec<ObjectId> = clipboard
            .iter()
            .map(|object| surface.add(object.duplicate(offset)))
            .collect();
        surface.set_selection(ids.clone());
        ids
    })
}

fn delete(surface: &mut dyn DrawingSurface) -> Vec<ObjectId> {
    surface
        .selection()
        .into_iter()
        .filter(|id| surface.remove(*id).is_some())
        .collect()
}

fn group(surface: &mut dyn DrawingSurface) -> Vec<ObjectId> {
    let selection = surface.selection();
    if selection.len() < 2 {
        return Vec::new();
    }
    surface.group(&selection).into_iter().collect()
}

fn ungroup(surface: &mut dyn DrawingSurface) -> Vec<ObjectId> {
    match surface.selection().as_slice() {
        [id] if surface.object(*id).is_some_and(|object| object.is_group()) => surface.ungroup(*id),
        _ => Vec::new(),
    }
}

fn align(surface: &mut dyn DrawingSurface, alignment: Alignment) -> Vec<ObjectId> {
    let (width, height) = surface.size();
    let selection = surface.selection();
    let mut aligned = Vec::with_capacity(selection.len());

    for id in selection {
        let Some(object) = surface.object_mut(id) else {
            continue;
        };
        match alignment {
            Alignment::Left => object.left = 0.0,
            Alignment::Center => object.left = (width - object.scaled_width()) / 2.0,
            Alignment::Right => object.left = width - object.scaled_width(),
            Alignment::Top => object.top = 0.0,
            Alignment::Middle => object.top = (height - object.scaled_height()) / 2.0,
            Alignment::Bottom => object.top = height - object.scaled_height(),
        }
        aligned.push(id);
    }

    for id in &aligned {
        surface.mark_committed(*id);
    }
    aligned
}

fn restack(surface: &mut dyn DrawingSurface, to: StackMove) -> Vec<ObjectId> {
    let order = surface.objects();
    let mut selection: Vec<(usize, ObjectId)> = surface
        .selection()
        .into_iter()
        .filter_map(|id| order.iter().position(|other| *other == id).map(|index| (index, id)))
        .collect();
    selection.sort_unstable_by_key(|(index, _)| *index);
    if selection.is_empty() {
        return Vec::new();
    }

    // The selection moves as a block: members already packed against the
    // destination stay put and relative order is preserved
    let targets: Vec<ObjectId> = match to {
        StackMove::ToBack => {
            if selection.iter().enumerate().all(|(slot, (index, _))| slot == *index) {
                return Vec::new();
            }
            selection.into_iter().rev().map(|(_, id)| id).collect()
        }
        StackMove::ToFront => {
            let top = order.len() - 1;
            if selection.iter().rev().enumerate().all(|(slot, (index, _))| top - slot == *index) {
                return Vec::new();
            }
            selection.into_iter().map(|(_, id)| id).collect()
        }
        StackMove::Forward => {
            let mut ceiling = order.len();
            selection
                .into_iter()
                .rev()
                .filter_map(|(index, id)| {
                    if index + 1 >= ceiling {
                        ceiling = index;
                        None
                    } else {
                        ceiling = index + 1;
                        Some(id)
                    }
                })
                .collect()
        }
        StackMove::Backward => {
            let mut floor = 0;
            selection
                .into_iter()
                .filter_map(|(index, id)| {
                    if index <= floor {
                        floor = index + 1;
                        None
                    } else {
                        floor = index;
                        Some(id)
                    }
                })
                .collect()
        }
    };

    targets.into_iter().filter(|id| surface.restack(*id, to)).collect()
}

fn select_all(surface: &mut dyn DrawingSurface) -> Vec<ObjectId> {
    let selectable: Vec<ObjectId> = surface
        .objects()
        .into_iter()
        .filter(|id| surface.object(*id).is_some_and(|object| object.selectable))
        .collect();
    if !selectable.is_empty() {
        surface.set_selection(selectable.clone());
    }
    selectable
}
