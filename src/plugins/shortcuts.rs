use std::any::Any;
use std::collections::HashMap;
use std::fmt;

use crate::actions::{self, Alignment, EditAction};
use crate::error::{HandlerResult, SessionResult};
use crate::plugin::Plugin;
use crate::session::EditorSession;

/// A key press as reported by the host
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: String,
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
    pub meta: bool,
}

impl KeyEvent {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Default::default()
        }
    }

    pub fn ctrl(mut self) -> Self {
        self.ctrl = true;
        self
    }

    pub fn shift(mut self) -> Self {
        self.shift = true;
        self
    }

    pub fn alt(mut self) -> Self {
        self.alt = true;
        self
    }

    pub fn meta(mut self) -> Self {
        self.meta = true;
        self
    }
}

/// A normalized key combination such as `ctrl+shift+z`.
///
/// Parsing ignores case, whitespace and modifier order, so `"Shift + Ctrl + Z"`
/// and `"ctrl+shift+z"` are the same chord.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyChord {
    ctrl: bool,
    shift: bool,
    alt: bool,
    meta: bool,
    key: String,
}

impl KeyChord {
    pub fn parse(text: &str) -> Self {
        let compact: String = text
            .chars()
            .filter(|c| !c.is_whitespace())
            .flat_map(char::to_lowercase)
            .collect();

        let (modifiers, key) = match compact.rsplit_once('+') {
            // "ctrl++" binds the plus key
            Some((modifiers, "")) => (modifiers.trim_end_matches('+'), "+"),
            Some((modifiers, key)) => (modifiers, key),
            None => ("", compact.as_str()),
        };

        let mut chord = Self {
            ctrl: false,
            shift: false,
            alt: false,
            meta: false,
            key: normalize_key(key),
        };
        for modifier in modifiers.split('+').filter(|m| !m.is_empty()) {
            match modifier {
                "ctrl" | "control" => chord.ctrl = true,
                "shift" => chord.shift = true,
                "alt" | "option" => chord.alt = true,
                "meta" | "cmd" | "command" | "super" => chord.meta = true,
                other => log::warn!("Unknown modifier '{}' in shortcut '{}'", other, text),
            }
        }
        chord
    }

    pub fn from_event(event: &KeyEvent) -> Self {
        Self {
            ctrl: event.ctrl,
            shift: event.shift,
            alt: event.alt,
            meta: event.meta,
            key: normalize_key(&event.key.to_lowercase()),
        }
    }
}

fn normalize_key(key: &str) -> String {
    match key {
        "del" => "delete".to_owned(),
        "esc" => "escape".to_owned(),
        other => other.to_owned(),
    }
}

impl fmt::Display for KeyChord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let modifiers = [
            (self.ctrl, "ctrl"),
            (self.shift, "shift"),
            (self.alt, "alt"),
            (self.meta, "meta"),
        ];
        for (_, name) in modifiers.iter().filter(|(held, _)| *held) {
            write!(f, "{}+", name)?;
        }
        f.write_str(&self.key)
    }
}

/// Maps key chords to edit actions
#[derive(Debug)]
pub struct ShortcutManager {
    bindings: HashMap<KeyChord, EditAction>,
    enabled: bool,
}

impl Default for ShortcutManager {
    fn default() -> Self {
        let mut manager = Self::empty();
        for (chord, action) in Self::DEFAULT_BINDINGS {
            manager.bind(chord, *action);
        }
        manager
    }
}

impl ShortcutManager {
    pub const DEFAULT_BINDINGS: &'static [(&'static str, EditAction)] = &[
        ("ctrl+z", EditAction::Undo),
        ("ctrl+shift+z", EditAction::Redo),
        ("ctrl+y", EditAction::Redo),
        ("ctrl+c", EditAction::Copy),
        ("ctrl+v", EditAction::Paste),
        ("delete", EditAction::Delete),
        ("backspace", EditAction::Delete),
        ("ctrl+g", EditAction::Group),
        ("ctrl+shift+g", EditAction::Ungroup),
        ("ctrl+shift+l", EditAction::Align(Alignment::Left)),
        ("ctrl+shift+c", EditAction::Align(Alignment::Center)),
        ("ctrl+shift+r", EditAction::Align(Alignment::Right)),
        ("ctrl+shift+t", EditAction::Align(Alignment::Top)),
        ("ctrl+shift+m", EditAction::Align(Alignment::Middle)),
        ("ctrl+shift+b", EditAction::Align(Alignment::Bottom)),
        ("ctrl+[", EditAction::SendBackward),
        ("ctrl+]", EditAction::BringForward),
        ("ctrl+shift+[", EditAction::SendToBack),
        ("ctrl+shift+]", EditAction::BringToFront),
        ("ctrl+a", EditAction::SelectAll),
    ];

    /// A manager with the default bindings
    pub fn new() -> Self {
        Self::default()
    }

    /// A manager with no bindings
    pub fn empty() -> Self {
        Self {
            bindings: HashMap::new(),
            enabled: true,
        }
    }

    /// Bind `chord` to `action`, replacing any previous binding. Returns the replaced action.
    pub fn bind(&mut self, chord: &str, action: EditAction) -> Option<EditAction> {
        self.bindings.insert(KeyChord::parse(chord), action)
    }

    pub fn unbind(&mut self, chord: &str) -> Option<EditAction> {
        self.bindings.remove(&KeyChord::parse(chord))
    }

    pub fn binding(&self, chord: &str) -> Option<EditAction> {
        self.bindings.get(&KeyChord::parse(chord)).copied()
    }

    /// All bindings as normalized chord strings, sorted
    pub fn bindings(&self) -> Vec<(String, EditAction)> {
        let mut bindings: Vec<(String, EditAction)> = self
            .bindings
            .iter()
            .map(|(chord, action)| (chord.to_string(), *action))
            .collect();
        bindings.sort_by(|a, b| a.0.cmp(&b.0));
        bindings
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

    /// Run the action bound to `event`, if any.
    ///
    /// Returns true when a binding matched, even if the action had nothing to
    /// do, so the host can swallow the key press.
    pub fn handle_key(&self, session: &EditorSession, event: &KeyEvent) -> SessionResult<bool> {
        if !self.enabled {
            return Ok(false);
        }
        let chord = KeyChord::from_event(event);
        let Some(action) = self.bindings.get(&chord).copied() else {
            return Ok(false);
        };

        log::debug!("Shortcut {} -> {}", chord, action.name());
        actions::perform(session, action)?;
        Ok(true)
    }
}

impl Plugin for ShortcutManager {
    fn init(&mut self, _session: &EditorSession) -> HandlerResult {
        log::debug!("Shortcut manager ready with {} binding(s)", self.bindings.len());
        Ok(())
    }

    fn destroy(&mut self, _session: &EditorSession) {
        self.bindings.clear();
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
