//! Shape model: the drawable primitives persisted per board.
//!
//! DESIGN
//! ======
//! A `Shape` is an identifier plus kind-specific `Geometry`, a color, and a
//! stroke width. The serde layout is the flat JSON object the shape store
//! speaks: discriminated by `type`, with freehand paths tagged `squiggle`
//! and stroke width stored as `width`.
//!
//! `Gesture` turns a pointer drag into a committable shape. It is the only
//! place that applies eraser styling and drops degenerate freehand clicks;
//! history and sync never validate geometry themselves.

#[cfg(test)]
#[path = "shape_test.rs"]
mod tests;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ErrorCode;

pub const BACKGROUND_COLOR: &str = "white";
pub const DEFAULT_COLOR: &str = "#000000";
pub const DEFAULT_STROKE_WIDTH: u32 = 2;
pub const ERASER_WIDTH: u32 = 20;
/// Minimum number of points a freehand path needs to be committed.
pub const MIN_PATH_POINTS: usize = 2;

// =============================================================================
// ERRORS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ShapeError {
    #[error("freehand path has {points} point(s), need at least {MIN_PATH_POINTS}")]
    DegeneratePath { points: usize },
    #[error("stroke width must be positive")]
    ZeroStrokeWidth,
    #[error("unknown tool: {0}")]
    UnknownTool(String),
}

impl ErrorCode for ShapeError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::DegeneratePath { .. } => "E_DEGENERATE_PATH",
            Self::ZeroStrokeWidth => "E_ZERO_STROKE_WIDTH",
            Self::UnknownTool(_) => "E_UNKNOWN_TOOL",
        }
    }
}

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Opaque shape identifier, unique within a board.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShapeId(String);

impl ShapeId {
    /// Allocate a fresh identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ShapeId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for ShapeId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for ShapeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// GEOMETRY
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Two-point geometry shared by lines, rectangles, and circles.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl Segment {
    #[must_use]
    pub fn new(start: Point, end: Point) -> Self {
        Self { x1: start.x, y1: start.y, x2: end.x, y2: end.y }
    }

    #[must_use]
    pub fn length(&self) -> f64 {
        (self.x2 - self.x1).hypot(self.y2 - self.y1)
    }
}

/// What a freehand path paints with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FreeformTool {
    #[default]
    #[serde(rename = "squiggle")]
    Pen,
    #[serde(rename = "erase")]
    Eraser,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Path {
    pub path: Vec<Point>,
    #[serde(default)]
    pub tool: FreeformTool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Geometry {
    Line(Segment),
    Rect(Segment),
    /// Centre at `(x1, y1)`, radius reaching `(x2, y2)`.
    Circle(Segment),
    #[serde(rename = "squiggle", alias = "freeform")]
    Freeform(Path),
}

impl Geometry {
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Line(_) => "line",
            Self::Rect(_) => "rect",
            Self::Circle(_) => "circle",
            Self::Freeform(Path { tool: FreeformTool::Eraser, .. }) => "erase",
            Self::Freeform(_) => "squiggle",
        }
    }

    #[must_use]
    pub fn is_eraser(&self) -> bool {
        matches!(self, Self::Freeform(Path { tool: FreeformTool::Eraser, .. }))
    }
}

/// Axis-aligned extent of a shape, ignoring stroke width.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Point,
    pub max: Point,
}

// =============================================================================
// SHAPE
// =============================================================================

/// Color and stroke applied to newly drawn shapes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Style {
    pub color: String,
    pub stroke_width: u32,
}

impl Default for Style {
    fn default() -> Self {
        Self { color: DEFAULT_COLOR.to_owned(), stroke_width: DEFAULT_STROKE_WIDTH }
    }
}

fn default_color() -> String {
    DEFAULT_COLOR.to_owned()
}

fn default_stroke_width() -> u32 {
    DEFAULT_STROKE_WIDTH
}

/// One persisted drawing primitive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "WireShape")]
pub struct Shape {
    pub id: ShapeId,
    #[serde(flatten)]
    pub geometry: Geometry,
    pub color: String,
    #[serde(rename = "width")]
    pub stroke_width: u32,
}

/// Inbound shape as stores send it. Document stores echo `_id` next to
/// `id`; `id` wins when both are present.
#[derive(Deserialize)]
struct WireShape {
    id: Option<ShapeId>,
    #[serde(rename = "_id")]
    document_id: Option<ShapeId>,
    #[serde(flatten)]
    geometry: Geometry,
    #[serde(default = "default_color")]
    color: String,
    #[serde(rename = "width", default = "default_stroke_width")]
    stroke_width: u32,
}

impl From<WireShape> for Shape {
    fn from(wire: WireShape) -> Self {
        Self {
            id: wire.id.or(wire.document_id).unwrap_or_else(ShapeId::generate),
            geometry: wire.geometry,
            color: wire.color,
            stroke_width: wire.stroke_width,
        }
    }
}

impl Shape {
    /// Build a shape with a fresh identifier. Eraser paths always paint with
    /// the background color at eraser width, whatever the style says.
    #[must_use]
    pub fn new(geometry: Geometry, style: &Style) -> Self {
        let (color, stroke_width) = if geometry.is_eraser() {
            (BACKGROUND_COLOR.to_owned(), ERASER_WIDTH)
        } else {
            (style.color.clone(), style.stroke_width)
        };
        Self { id: ShapeId::generate(), geometry, color, stroke_width }
    }

    /// Same shape under a different identifier.
    #[must_use]
    pub fn with_id(mut self, id: ShapeId) -> Self {
        self.id = id;
        self
    }

    /// True when everything but the identifier matches.
    #[must_use]
    pub fn same_content(&self, other: &Shape) -> bool {
        self.geometry == other.geometry && self.color == other.color && self.stroke_width == other.stroke_width
    }

    /// Check the shape is fit to commit.
    ///
    /// # Errors
    ///
    /// Returns `DegeneratePath` for freehand paths shorter than
    /// [`MIN_PATH_POINTS`] and `ZeroStrokeWidth` for a zero stroke.
    pub fn validate(&self) -> Result<(), ShapeError> {
        if self.stroke_width == 0 {
            return Err(ShapeError::ZeroStrokeWidth);
        }
        if let Geometry::Freeform(path) = &self.geometry {
            if path.path.len() < MIN_PATH_POINTS {
                return Err(ShapeError::DegeneratePath { points: path.path.len() });
            }
        }
        Ok(())
    }

    /// Extent of the geometry, or `None` for an empty path.
    #[must_use]
    pub fn bounds(&self) -> Option<Bounds> {
        match &self.geometry {
            Geometry::Line(seg) | Geometry::Rect(seg) => Some(Bounds {
                min: Point::new(seg.x1.min(seg.x2), seg.y1.min(seg.y2)),
                max: Point::new(seg.x1.max(seg.x2), seg.y1.max(seg.y2)),
            }),
            Geometry::Circle(seg) => {
                let r = seg.length();
                Some(Bounds { min: Point::new(seg.x1 - r, seg.y1 - r), max: Point::new(seg.x1 + r, seg.y1 + r) })
            }
            Geometry::Freeform(path) => {
                let first = path.path.first()?;
                let init = Bounds { min: *first, max: *first };
                Some(path.path.iter().fold(init, |b, p| Bounds {
                    min: Point::new(b.min.x.min(p.x), b.min.y.min(p.y)),
                    max: Point::new(b.max.x.max(p.x), b.max.y.max(p.y)),
                }))
            }
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.geometry {
            Geometry::Line(s) | Geometry::Rect(s) | Geometry::Circle(s) => write!(
                f,
                "{} {} ({}, {}) -> ({}, {})",
                self.geometry.kind(),
                self.id,
                s.x1,
                s.y1,
                s.x2,
                s.y2
            )?,
            Geometry::Freeform(p) => write!(f, "{} {} [{} points]", self.geometry.kind(), self.id, p.path.len())?,
        }
        write!(f, " {} w{}", self.color, self.stroke_width)
    }
}

// =============================================================================
// GESTURE
// =============================================================================

/// Drawing tool selected in the toolbar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    Line,
    Rect,
    Circle,
    Squiggle,
    Erase,
}

impl Tool {
    #[must_use]
    pub fn is_freehand(self) -> bool {
        matches!(self, Self::Squiggle | Self::Erase)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Line => "line",
            Self::Rect => "rect",
            Self::Circle => "circle",
            Self::Squiggle => "squiggle",
            Self::Erase => "erase",
        }
    }
}

impl FromStr for Tool {
    type Err = ShapeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "line" => Ok(Self::Line),
            "rect" => Ok(Self::Rect),
            "circle" => Ok(Self::Circle),
            "squiggle" | "freeform" => Ok(Self::Squiggle),
            "erase" | "eraser" => Ok(Self::Erase),
            other => Err(ShapeError::UnknownTool(other.to_owned())),
        }
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A pointer drag in progress: press, optional moves, release.
#[derive(Debug, Clone)]
pub struct Gesture {
    tool: Tool,
    start: Point,
    path: Vec<Point>,
    style: Style,
}

impl Gesture {
    #[must_use]
    pub fn begin(tool: Tool, at: Point, style: Style) -> Self {
        Self { tool, start: at, path: vec![at], style }
    }

    /// Record pointer movement. Only freehand tools keep the trail.
    pub fn extend(&mut self, to: Point) {
        if self.tool.is_freehand() {
            self.path.push(to);
        }
    }

    /// Release the pointer. Returns `None` when the gesture produced nothing
    /// worth committing, e.g. a freehand click without movement.
    #[must_use]
    pub fn finish(self, at: Point) -> Option<Shape> {
        let segment = Segment::new(self.start, at);
        let geometry = match self.tool {
            Tool::Line => Geometry::Line(segment),
            Tool::Rect => Geometry::Rect(segment),
            Tool::Circle => Geometry::Circle(segment),
            Tool::Squiggle => Geometry::Freeform(Path { path: self.path, tool: FreeformTool::Pen }),
            Tool::Erase => Geometry::Freeform(Path { path: self.path, tool: FreeformTool::Eraser }),
        };
        let shape = Shape::new(geometry, &self.style);
        shape.validate().ok().map(|()| shape)
    }
}
