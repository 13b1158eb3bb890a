//! UML relationship glyphs.
//!
//! [`render_relation`] turns two boundary points and a relationship kind into
//! the lines and polygons that draw it. All geometry is derived from the
//! approach angle `θ = atan2(Δy, Δx)` from start to end:
//!
//! ```text
//! association      start ───────────────────────────── end
//! aggregation      start ◇──────────────────────────── end
//! composition      start ◆──────────────────────────── end
//! generalization   start ──────────────────────────▷ end
//! realization      start ─ ─ ─ ─ ─ ─ ─ ─ ─ ─ ─ ─ ─ ▷ end
//! dependency       start ─ ─ ─ ─ ─ ─ ─ ─ ─ ─ ─ ─ ─ > end
//! ```
//!
//! Rendering is pure: the same input always yields the same glyph, and an
//! unrecognized kind draws as an association.

use std::f32::consts::{FRAC_PI_2, PI};

use svg::node::element as svg_element;

use crate::{
    apply_stroke,
    color::Color,
    draw::{LayeredOutput, RenderLayer, StrokeDefinition},
    geometry::Point,
    semantic::RelationKind,
};

const DIAMOND_LENGTH: f32 = 14.0;
const DIAMOND_HALF_WIDTH: f32 = 8.0;
const DIAMOND_OFFSET: f32 = 12.0;
const TRIANGLE_SIZE: f32 = 16.0;
const TRIANGLE_SPREAD: f32 = PI / 6.0;
const OPEN_ARROW_SIZE: f32 = 12.0;
const OPEN_ARROW_SPREAD: f32 = PI / 7.0;

/// The six notations a relationship can be drawn with.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Notation {
    #[default]
    Association,
    Aggregation,
    Composition,
    Generalization,
    Realization,
    Dependency,
}

impl Notation {
    /// Picks the notation for a kind name.
    ///
    /// Case-insensitive and trimmed. Only the six notation names are
    /// recognized; everything else, the multiplicity kinds included, draws as
    /// an association.
    pub fn from_kind_name(kind: &str) -> Self {
        match kind.trim().to_lowercase().as_str() {
            "aggregation" => Self::Aggregation,
            "composition" => Self::Composition,
            "generalization" => Self::Generalization,
            "realization" => Self::Realization,
            "dependency" => Self::Dependency,
            _ => Self::Association,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Association => "association",
            Self::Aggregation => "aggregation",
            Self::Composition => "composition",
            Self::Generalization => "generalization",
            Self::Realization => "realization",
            Self::Dependency => "dependency",
        }
    }
}

/// Interior of a closed glyph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fill {
    /// Painted with the background color
    Hollow,
    /// Painted with the stroke color
    Solid,
}

/// A single drawable piece of a relationship glyph.
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    Line {
        start: Point,
        end: Point,
        stroke: StrokeDefinition,
    },
    Polygon {
        points: Vec<Point>,
        fill: Fill,
        stroke: StrokeDefinition,
    },
}

impl Primitive {
    fn line(start: Point, end: Point, stroke: StrokeDefinition) -> Self {
        Self::Line { start, end, stroke }
    }

    fn polygon(points: Vec<Point>, fill: Fill) -> Self {
        Self::Polygon {
            points,
            fill,
            stroke: StrokeDefinition::relation_solid(),
        }
    }

    pub fn stroke(&self) -> &StrokeDefinition {
        match self {
            Self::Line { stroke, .. } | Self::Polygon { stroke, .. } => stroke,
        }
    }

    fn stroke_mut(&mut self) -> &mut StrokeDefinition {
        match self {
            Self::Line { stroke, .. } | Self::Polygon { stroke, .. } => stroke,
        }
    }

    fn render_to_svg(&self, background: Color) -> Box<dyn svg::Node> {
        match self {
            Self::Line { start, end, stroke } => {
                let line = svg_element::Line::new()
                    .set("x1", start.x())
                    .set("y1", start.y())
                    .set("x2", end.x())
                    .set("y2", end.y());
                Box::new(apply_stroke!(line, stroke))
            }
            Self::Polygon {
                points,
                fill,
                stroke,
            } => {
                let points = points
                    .iter()
                    .map(|p| format!("{},{}", p.x(), p.y()))
                    .collect::<Vec<_>>()
                    .join(" ");
                let fill_color = match fill {
                    Fill::Hollow => background,
                    Fill::Solid => stroke.color(),
                };
                let polygon = svg_element::Polygon::new()
                    .set("points", points)
                    .set("fill", &fill_color);
                Box::new(apply_stroke!(polygon, stroke))
            }
        }
    }
}

/// The drawable form of one relationship.
#[derive(Debug, Clone, PartialEq)]
pub struct RelationGlyph {
    notation: Notation,
    primitives: Vec<Primitive>,
}

impl RelationGlyph {
    /// Draws `kind` between two boundary points.
    pub fn for_kind(start: Point, end: Point, kind: RelationKind) -> Self {
        render_relation(start, end, kind.as_str())
    }

    pub fn notation(&self) -> Notation {
        self.notation
    }

    pub fn primitives(&self) -> &[Primitive] {
        &self.primitives
    }

    /// Recolors every stroke of the glyph.
    pub fn with_color(mut self, color: Color) -> Self {
        for primitive in &mut self.primitives {
            primitive.stroke_mut().set_color(color);
        }
        self
    }

    /// Renders the glyph as one `<g>` element.
    ///
    /// Hollow shapes are filled with `background` so that the line beneath
    /// them stays hidden.
    pub fn render_to_svg(&self, background: Color) -> svg_element::Group {
        self.primitives.iter().fold(
            svg_element::Group::new().set("data-relation", self.notation.name()),
            |group, primitive| group.add(primitive.render_to_svg(background)),
        )
    }

    /// Renders the glyph into the relation layer.
    pub fn render_to_layers(&self, background: Color) -> LayeredOutput {
        let mut output = LayeredOutput::new();
        output.add_to_layer(
            RenderLayer::Relation,
            Box::new(self.render_to_svg(background)),
        );
        output
    }
}

/// Produces the glyph for `kind` between `start` and `end`.
///
/// ```
/// # use umlcanvas_core::draw::{render_relation, Notation, Primitive};
/// # use umlcanvas_core::geometry::Point;
/// let glyph = render_relation(Point::new(0.0, 0.0), Point::new(100.0, 0.0), " Composition ");
/// assert_eq!(glyph.notation(), Notation::Composition);
/// assert_eq!(glyph.primitives().len(), 2);
///
/// let fallback = render_relation(Point::new(0.0, 0.0), Point::new(100.0, 0.0), "bogus");
/// assert_eq!(fallback.notation(), Notation::Association);
/// ```
pub fn render_relation(start: Point, end: Point, kind: &str) -> RelationGlyph {
    let notation = Notation::from_kind_name(kind);
    let theta = start.angle_to(end);

    let primitives = match notation {
        Notation::Association => vec![Primitive::line(
            start,
            end,
            StrokeDefinition::relation_solid(),
        )],
        Notation::Aggregation => diamond(start, end, theta, Fill::Hollow),
        Notation::Composition => diamond(start, end, theta, Fill::Solid),
        Notation::Generalization => triangle(start, end, theta, StrokeDefinition::relation_solid()),
        Notation::Realization => triangle(start, end, theta, StrokeDefinition::relation_dashed()),
        Notation::Dependency => open_arrow(start, end, theta),
    };

    RelationGlyph {
        notation,
        primitives,
    }
}

/// Diamond at the start, line from its far tip to the end.
fn diamond(start: Point, end: Point, theta: f32, fill: Fill) -> Vec<Primitive> {
    let center = start.offset_polar(theta, DIAMOND_OFFSET);
    let points = vec![
        center.offset_polar(theta, DIAMOND_LENGTH),
        center.offset_polar(theta + FRAC_PI_2, DIAMOND_HALF_WIDTH),
        center.offset_polar(theta, -DIAMOND_LENGTH),
        center.offset_polar(theta + FRAC_PI_2, -DIAMOND_HALF_WIDTH),
    ];
    let tip = points[0];

    vec![
        Primitive::line(tip, end, StrokeDefinition::relation_solid()),
        Primitive::polygon(points, fill),
    ]
}

/// Line stopping short of the end, capped by a hollow triangle touching it.
fn triangle(start: Point, end: Point, theta: f32, line_stroke: StrokeDefinition) -> Vec<Primitive> {
    let base = end.offset_polar(theta, -TRIANGLE_SIZE);
    let points = vec![
        end,
        base.offset_polar(theta - TRIANGLE_SPREAD, -TRIANGLE_SIZE),
        base.offset_polar(theta + TRIANGLE_SPREAD, -TRIANGLE_SIZE),
    ];

    vec![
        Primitive::line(start, base, line_stroke),
        Primitive::polygon(points, Fill::Hollow),
    ]
}

/// Dashed line with a two-stroke open arrowhead at the end.
fn open_arrow(start: Point, end: Point, theta: f32) -> Vec<Primitive> {
    let base = end.offset_polar(theta, -OPEN_ARROW_SIZE);
    let left = base.offset_polar(theta - OPEN_ARROW_SPREAD, -OPEN_ARROW_SIZE);
    let right = base.offset_polar(theta + OPEN_ARROW_SPREAD, -OPEN_ARROW_SIZE);

    vec![
        Primitive::line(start, base, StrokeDefinition::relation_dashed()),
        Primitive::line(left, end, StrokeDefinition::relation_solid()),
        Primitive::line(right, end, StrokeDefinition::relation_solid()),
    ]
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;

    use super::*;
    use crate::draw::StrokeStyle;

    fn horizontal() -> (Point, Point) {
        (Point::new(0.0, 0.0), Point::new(100.0, 0.0))
    }

    fn assert_point_eq(actual: Point, expected: Point) {
        assert_approx_eq!(f32, actual.x(), expected.x(), epsilon = 0.001);
        assert_approx_eq!(f32, actual.y(), expected.y(), epsilon = 0.001);
    }

    fn polygon_of(glyph: &RelationGlyph) -> (&[Point], Fill) {
        glyph
            .primitives()
            .iter()
            .find_map(|p| match p {
                Primitive::Polygon { points, fill, .. } => Some((points.as_slice(), *fill)),
                Primitive::Line { .. } => None,
            })
            .expect("glyph has a polygon")
    }

    #[test]
    fn test_association_is_single_solid_segment() {
        let (start, end) = horizontal();
        let glyph = render_relation(start, end, "association");
        assert_eq!(
            glyph.primitives(),
            &[Primitive::line(start, end, StrokeDefinition::relation_solid())]
        );
    }

    #[test]
    fn test_unknown_kind_renders_like_association() {
        let (start, end) = horizontal();
        let association = render_relation(start, end, "association");
        for kind in ["bogus", "", "oneToMany", "manyToMany", "oneToOne"] {
            assert_eq!(render_relation(start, end, kind), association, "kind {kind:?}");
        }
    }

    #[test]
    fn test_kind_is_case_insensitive_and_trimmed() {
        let (start, end) = horizontal();
        assert_eq!(
            render_relation(start, end, "  GENERALIZATION\n"),
            render_relation(start, end, "generalization")
        );
    }

    #[test]
    fn test_aggregation_diamond_geometry() {
        let (start, end) = horizontal();
        let glyph = render_relation(start, end, "aggregation");
        let (points, fill) = polygon_of(&glyph);

        assert_eq!(fill, Fill::Hollow);
        assert_point_eq(points[0], Point::new(26.0, 0.0));
        assert_point_eq(points[1], Point::new(12.0, 8.0));
        assert_point_eq(points[2], Point::new(-2.0, 0.0));
        assert_point_eq(points[3], Point::new(12.0, -8.0));

        match &glyph.primitives()[0] {
            Primitive::Line { start, end, .. } => {
                assert_point_eq(*start, Point::new(26.0, 0.0));
                assert_point_eq(*end, Point::new(100.0, 0.0));
            }
            other => panic!("expected line, got {other:?}"),
        }
    }

    #[test]
    fn test_composition_differs_only_in_fill() {
        let (start, end) = horizontal();
        let aggregation = render_relation(start, end, "aggregation");
        let composition = render_relation(start, end, "composition");

        let (agg_points, _) = polygon_of(&aggregation);
        let (comp_points, comp_fill) = polygon_of(&composition);
        assert_eq!(agg_points, comp_points);
        assert_eq!(comp_fill, Fill::Solid);
    }

    #[test]
    fn test_generalization_triangle_geometry() {
        let (start, end) = horizontal();
        let glyph = render_relation(start, end, "generalization");

        match &glyph.primitives()[0] {
            Primitive::Line { end: line_end, stroke, .. } => {
                assert_point_eq(*line_end, Point::new(84.0, 0.0));
                assert_eq!(*stroke.style(), StrokeStyle::Solid);
            }
            other => panic!("expected line, got {other:?}"),
        }

        let (points, fill) = polygon_of(&glyph);
        assert_eq!(fill, Fill::Hollow);
        assert_point_eq(points[0], end);
        let (sin, cos) = TRIANGLE_SPREAD.sin_cos();
        assert_point_eq(points[1], Point::new(84.0 - 16.0 * cos, 16.0 * sin));
        assert_point_eq(points[2], Point::new(84.0 - 16.0 * cos, -16.0 * sin));
    }

    #[test]
    fn test_realization_is_dashed_generalization() {
        let (start, end) = horizontal();
        let generalization = render_relation(start, end, "generalization");
        let realization = render_relation(start, end, "realization");

        assert_eq!(polygon_of(&generalization).0, polygon_of(&realization).0);
        assert_eq!(
            realization.primitives()[0].stroke().style().to_svg_value(),
            Some("6,4".to_string())
        );
    }

    #[test]
    fn test_dependency_open_arrow() {
        let start = Point::new(0.0, 0.0);
        let end = Point::new(0.0, 100.0);
        let glyph = render_relation(start, end, "dependency");
        let primitives = glyph.primitives();

        assert_eq!(primitives.len(), 3);
        assert!(primitives.iter().all(|p| matches!(p, Primitive::Line { .. })));
        assert!(primitives[0].stroke().style().is_dashed());
        assert!(!primitives[1].stroke().style().is_dashed());

        for head in &primitives[1..] {
            if let Primitive::Line { start, end: tip, .. } = head {
                assert_point_eq(*tip, end);
                let length = tip.sub_point(*start).hypot();
                assert!(length > 12.0 && length < 24.0, "head length {length}");
            }
        }
    }

    #[test]
    fn test_rendering_is_deterministic() {
        let start = Point::new(13.5, 42.0);
        let end = Point::new(-120.25, 300.0);
        for kind in RelationKind::ALL {
            assert_eq!(
                RelationGlyph::for_kind(start, end, kind),
                RelationGlyph::for_kind(start, end, kind)
            );
        }
    }

    #[test]
    fn test_coincident_points_stay_finite() {
        let point = Point::new(5.0, 5.0);
        for kind in RelationKind::ALL {
            let glyph = RelationGlyph::for_kind(point, point, kind);
            for primitive in glyph.primitives() {
                match primitive {
                    Primitive::Line { start, end, .. } => {
                        assert!(start.is_finite() && end.is_finite());
                    }
                    Primitive::Polygon { points, .. } => {
                        assert!(points.iter().all(|p| p.is_finite()));
                    }
                }
            }
        }
    }

    #[test]
    fn test_svg_output() {
        let (start, end) = horizontal();
        let svg = render_relation(start, end, "composition")
            .render_to_svg(Color::white())
            .to_string();
        assert!(svg.contains("data-relation=\"composition\""));
        assert!(svg.contains("<polygon"));
        assert!(svg.contains("fill=\"black\""));

        let dashed = render_relation(start, end, "realization")
            .render_to_svg(Color::white())
            .to_string();
        assert!(dashed.contains("stroke-dasharray=\"6,4\""));
    }

    #[test]
    fn test_with_color_recolors_all_strokes() {
        let (start, end) = horizontal();
        let navy = Color::new("navy").unwrap();
        let glyph = render_relation(start, end, "dependency").with_color(navy);
        assert!(glyph.primitives().iter().all(|p| p.stroke().color() == navy));
    }
}
