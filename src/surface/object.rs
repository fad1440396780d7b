use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Stable identity of an object on a drawing surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(Uuid);

impl ObjectId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What an object draws. Rendering is the surface's business; the session only
/// needs to tell groups apart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ObjectKind {
    Rect,
    Ellipse,
    Text { text: String },
    Image { source: String },
    Path { points: Vec<[f32; 2]> },
    /// Children are positioned relative to the group's top-left corner
    Group { children: Vec<SurfaceObject> },
}

/// One drawable object as seen through the surface contract
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurfaceObject {
    pub id: ObjectId,
    pub kind: ObjectKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
    pub scale_x: f32,
    pub scale_y: f32,
    /// Rotation in degrees
    pub angle: f32,
    pub visible: bool,
    pub selectable: bool,
}

impl SurfaceObject {
    pub fn new(kind: ObjectKind, left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            id: ObjectId::new(),
            kind,
            name: None,
            left,
            top,
            width,
            height,
            scale_x: 1.0,
            scale_y: 1.0,
            angle: 0.0,
            visible: true,
            selectable: true,
        }
    }

    pub fn rect(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self::new(ObjectKind::Rect, left, top, width, height)
    }

    pub fn ellipse(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self::new(ObjectKind::Ellipse, left, top, width, height)
    }

    pub fn text(text: impl Into<String>, left: f32, top: f32) -> Self {
        let text = text.into();
        // Rough metrics; the real surface measures glyphs
        let width = text.chars().count() as f32 * 8.0;
        Self::new(ObjectKind::Text { text }, left, top, width, 16.0)
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn scaled_width(&self) -> f32 {
        self.width * self.scale_x
    }

    pub fn scaled_height(&self) -> f32 {
        self.height * self.scale_y
    }

    pub fn is_group(&self) -> bool {
        matches!(self.kind, ObjectKind::Group { .. })
    }

    pub fn type_name(&self) -> &'static str {
        match self.kind {
            ObjectKind::Rect => "rect",
            ObjectKind::Ellipse => "ellipse",
            ObjectKind::Text { .. } => "text",
            ObjectKind::Image { .. } => "image",
            ObjectKind::Path { .. } => "path",
            ObjectKind::Group { .. } => "group",
        }
    }

    /// A copy with fresh ids (recursively) moved by `offset` on both axes
    pub fn duplicate(&self, offset: f32) -> Self {
        let mut copy = self.clone();
        copy.refresh_ids();
        copy.left += offset;
        copy.top += offset;
        copy
    }

    fn refresh_ids(&mut self) {
        self.id = ObjectId::new();
        if let ObjectKind::Group { children } = &mut self.kind {
            children.iter_mut().for_each(SurfaceObject::refresh_ids);
        }
    }
}
