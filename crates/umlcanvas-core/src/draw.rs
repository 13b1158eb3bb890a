//! Drawing primitives for class diagrams.
//!
//! - [`stroke`] - Stroke color, width and dash pattern
//! - [`layer`] - Z-ordered SVG output
//! - [`relation`] - UML relationship glyphs between two boundary points
//! - [`class_box`] - Class boxes with their name and member compartments

mod class_box;
mod layer;
mod relation;
mod stroke;

pub use class_box::{ClassBox, ClassBoxStyle};
pub use layer::{LayeredOutput, RenderLayer, SvgNode};
pub use relation::{Fill, Notation, Primitive, RelationGlyph, render_relation};
pub use stroke::{RELATION_STROKE_WIDTH, StrokeDefinition, StrokeStyle};
