//! Stroke definitions for class boxes and relationship glyphs.
//!
//! - [`StrokeDefinition`]: color, width and line pattern of a stroke
//! - [`StrokeStyle`]: solid, the UML dashed pattern, or a custom dasharray
//! - [`apply_stroke!`](crate::apply_stroke!): writes a stroke onto an SVG element
//!
//! ```
//! use umlcanvas_core::draw::{StrokeDefinition, StrokeStyle};
//!
//! let stroke = StrokeDefinition::relation_dashed();
//! assert_eq!(*stroke.style(), StrokeStyle::Dashed);
//! assert_eq!(stroke.style().to_svg_value().as_deref(), Some("6,4"));
//! ```

use std::str::FromStr;

use crate::color::Color;

/// Width of every relationship line and glyph outline.
pub const RELATION_STROKE_WIDTH: f32 = 1.5;

/// Line pattern of a stroke.
///
/// Maps onto the SVG `stroke-dasharray` attribute:
/// - `Solid`: no dasharray
/// - `Dashed`: `"6,4"` (realization and dependency lines)
/// - `Custom(pattern)`: the pattern as given
#[derive(Debug, Default, Clone, PartialEq)]
pub enum StrokeStyle {
    #[default]
    Solid,
    /// 6 units on, 4 units off
    Dashed,
    Custom(String),
}

impl FromStr for StrokeStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "solid" => Ok(Self::Solid),
            "dashed" => Ok(Self::Dashed),
            "" => Err("empty stroke style".to_string()),
            pattern => Ok(Self::Custom(pattern.to_string())),
        }
    }
}

impl StrokeStyle {
    /// Returns the SVG dasharray value for this style, or None for solid lines
    pub fn to_svg_value(&self) -> Option<String> {
        match self {
            Self::Solid => None,
            Self::Dashed => Some("6,4".to_string()),
            Self::Custom(pattern) => Some(pattern.clone()),
        }
    }

    pub fn is_dashed(&self) -> bool {
        !matches!(self, Self::Solid)
    }
}

/// A stroke for rendering lines and borders.
#[derive(Debug, Clone, PartialEq)]
pub struct StrokeDefinition {
    color: Color,
    width: f32,
    style: StrokeStyle,
}

impl StrokeDefinition {
    /// Creates a solid stroke with the given color and width.
    pub fn new(color: Color, width: f32) -> Self {
        Self {
            color,
            width,
            style: StrokeStyle::Solid,
        }
    }

    /// Solid black stroke of width 1.5 used for relationship lines.
    pub fn relation_solid() -> Self {
        Self::new(Color::default(), RELATION_STROKE_WIDTH)
    }

    /// Dashed black stroke of width 1.5 used for realization and dependency.
    pub fn relation_dashed() -> Self {
        Self::relation_solid().with_style(StrokeStyle::Dashed)
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn style(&self) -> &StrokeStyle {
        &self.style
    }

    pub fn set_color(&mut self, color: Color) {
        self.color = color;
    }

    pub fn set_width(&mut self, width: f32) {
        self.width = width;
    }

    pub fn set_style(&mut self, style: StrokeStyle) {
        self.style = style;
    }

    /// Returns a copy with the given style.
    pub fn with_style(mut self, style: StrokeStyle) -> Self {
        self.style = style;
        self
    }

    /// Returns a copy with the given color.
    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }
}

impl Default for StrokeDefinition {
    fn default() -> Self {
        Self::new(Color::default(), 1.0)
    }
}

/// Apply all stroke attributes to an SVG element.
///
/// Sets color, opacity and width, and the dash pattern when the stroke is
/// not solid.
///
/// ```
/// use umlcanvas_core::draw::StrokeDefinition;
/// use svg::node::element as svg_element;
///
/// let stroke = StrokeDefinition::relation_dashed();
/// let line = svg_element::Line::new()
///     .set("x1", 0)
///     .set("y1", 0)
///     .set("x2", 100)
///     .set("y2", 0);
///
/// let line = umlcanvas_core::apply_stroke!(line, &stroke);
/// # let _ = line;
/// ```
#[macro_export]
macro_rules! apply_stroke {
    ($element:expr, $stroke:expr) => {{
        let mut elem = $element
            .set("stroke", $stroke.color().to_string())
            .set("stroke-opacity", $stroke.color().alpha())
            .set("stroke-width", $stroke.width());

        if let Some(dasharray) = $stroke.style().to_svg_value() {
            elem = elem.set("stroke-dasharray", dasharray);
        }

        elem
    }};
}
