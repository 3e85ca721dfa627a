//! Drawing primitives and batches.
//!
//! A [`Primitive`] is an immutable vector fragment: either a stroked line
//! segment captured from pointer input, or an opaque markup element returned
//! by the generative vector service. A [`Batch`] is the atomic unit of
//! transmission and of append to the canvas log.

use kurbo::Point;
use peniko::Color;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Serializable color representation (RGBA8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializableColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl SerializableColor {
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn black() -> Self {
        Self::new(0, 0, 0, 255)
    }

    pub fn red() -> Self {
        Self::new(255, 0, 0, 255)
    }
}

impl From<Color> for SerializableColor {
    fn from(color: Color) -> Self {
        let rgba = color.to_rgba8();
        Self {
            r: rgba.r,
            g: rgba.g,
            b: rgba.b,
            a: rgba.a,
        }
    }
}

impl From<SerializableColor> for Color {
    fn from(color: SerializableColor) -> Self {
        Color::from_rgba8(color.r, color.g, color.b, color.a)
    }
}

/// Compositing mode for a segment.
///
/// `Erase` removes existing coverage (destination-out) rather than painting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompositeMode {
    #[default]
    Paint,
    Erase,
}

/// A stroked line segment between two sampled pointer positions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub start: Point,
    pub end: Point,
    pub color: SerializableColor,
    pub width: f64,
    #[serde(default)]
    pub mode: CompositeMode,
}

impl Segment {
    pub fn length(&self) -> f64 {
        self.start.distance(self.end)
    }
}

/// The geometry variants a primitive can carry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrimitiveShape {
    Segment(Segment),
    /// Self-contained vector-fragment markup from the generative service.
    /// Never inspected by the engine; painted by vector-capable surfaces.
    Markup { svg: String },
}

/// An immutable drawing fragment. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Primitive {
    pub id: Uuid,
    pub shape: PrimitiveShape,
}

impl Primitive {
    /// Create a line-segment primitive.
    pub fn segment(
        start: Point,
        end: Point,
        color: SerializableColor,
        width: f64,
        mode: CompositeMode,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            shape: PrimitiveShape::Segment(Segment {
                start,
                end,
                color,
                width,
                mode,
            }),
        }
    }

    /// Create a markup primitive from a vector-fragment string.
    pub fn markup(svg: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            shape: PrimitiveShape::Markup { svg: svg.into() },
        }
    }

    pub fn as_segment(&self) -> Option<&Segment> {
        match &self.shape {
            PrimitiveShape::Segment(seg) => Some(seg),
            PrimitiveShape::Markup { .. } => None,
        }
    }
}

/// An ordered group of primitives transmitted and applied together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Batch {
    pub id: Uuid,
    /// Display name of the participant that produced the batch.
    pub author: String,
    pub primitives: Vec<Primitive>,
}

impl Batch {
    pub fn new(author: impl Into<String>, primitives: Vec<Primitive>) -> Self {
        Self {
            id: Uuid::new_v4(),
            author: author.into(),
            primitives,
        }
    }

    pub fn len(&self) -> usize {
        self.primitives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.primitives.is_empty()
    }
}
