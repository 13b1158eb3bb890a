//! SVG export of whole class diagrams.
//!
//! Every connection is drawn between the two points where the line joining
//! the centers of its classes leaves each box (see
//! [`boundary_intersection`]), using the UML notation of its kind.
//! Connections with a missing endpoint are skipped.

use std::{fs::File, io::Write, path::Path};

use log::{debug, error, info, warn};
use svg::{self, node::element as svg_element};

use umlcanvas_core::{
    color::Color,
    draw::{ClassBox, ClassBoxStyle, LayeredOutput, RelationGlyph, RenderLayer, StrokeDefinition},
    geometry::{Bounds, Point, boundary_intersection},
    semantic::{ClassShape, Connection, Diagram},
};

use crate::{config::StyleConfig, export};

const LABEL_FONT_SIZE: f32 = 12.0;
/// Distance of a multiplicity label from the box edge along the connection.
const MULTIPLICITY_OFFSET: f32 = 18.0;

/// Builder for [`Svg`] exporters.
#[derive(Debug, Default)]
pub struct SvgBuilder<'a> {
    style: Option<&'a StyleConfig>,
    padding: Option<f32>,
}

impl<'a> SvgBuilder<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_style(mut self, style: &'a StyleConfig) -> Self {
        self.style = Some(style);
        self
    }

    /// Empty space around the diagram content.
    pub fn with_padding(mut self, padding: f32) -> Self {
        self.padding = Some(padding);
        self
    }

    /// # Errors
    ///
    /// [`export::Error::Render`] when a configured color cannot be parsed.
    pub fn build(self) -> Result<Svg, export::Error> {
        let (background, stroke) = match self.style {
            Some(style) => (
                style.background_color().map_err(export::Error::Render)?,
                style.stroke_color().map_err(export::Error::Render)?,
            ),
            None => (None, None),
        };
        let background = background.unwrap_or_else(Color::white);
        let stroke = stroke.unwrap_or_default();

        let box_style = ClassBoxStyle::new(StrokeDefinition::new(stroke, 1.5), Color::white());

        Ok(Svg {
            background,
            stroke,
            box_style,
            padding: self.padding.unwrap_or(40.0),
        })
    }
}

/// Renders diagrams to SVG documents.
#[derive(Debug)]
pub struct Svg {
    background: Color,
    stroke: Color,
    box_style: ClassBoxStyle,
    padding: f32,
}

impl Svg {
    /// Renders `diagram` to an SVG document sized to its content.
    pub fn render_diagram(&self, diagram: &Diagram) -> svg::Document {
        let content = self.content_bounds(diagram).expand(self.padding);

        let doc = svg::Document::new()
            .set(
                "viewBox",
                format!(
                    "{} {} {} {}",
                    content.min_x(),
                    content.min_y(),
                    content.width(),
                    content.height()
                ),
            )
            .set("width", content.width())
            .set("height", content.height());

        let mut output = LayeredOutput::new();
        output.add_to_layer(
            RenderLayer::Background,
            Box::new(
                svg_element::Rectangle::new()
                    .set("x", content.min_x())
                    .set("y", content.min_y())
                    .set("width", content.width())
                    .set("height", content.height())
                    .set("fill", &self.background),
            ),
        );

        for shape in &diagram.classes {
            output.merge(ClassBox::new(shape, &self.box_style).render_to_layers());
        }

        let mut skipped = 0usize;
        for connection in &diagram.connections {
            match (diagram.shape(&connection.from_id), diagram.shape(&connection.to_id)) {
                (Some(from), Some(to)) => output.merge(self.render_connection(connection, from, to)),
                _ => {
                    warn!(
                        connection_id = connection.id.as_str(),
                        from = connection.from_id.as_str(),
                        to = connection.to_id.as_str();
                        "Skipping connection with a missing endpoint"
                    );
                    skipped += 1;
                }
            }
        }

        debug!(nodes = output.len(), skipped; "Diagram rendered");
        output
            .render()
            .into_iter()
            .fold(doc, |doc, node| doc.add(node))
    }

    /// Renders `diagram` to SVG markup.
    pub fn render_to_string(&self, diagram: &Diagram) -> String {
        self.render_diagram(diagram).to_string()
    }

    /// Writes `diagram` as an SVG file.
    pub fn write_file(&self, diagram: &Diagram, path: &Path) -> Result<(), export::Error> {
        info!(path:? = path; "Creating SVG file");
        let doc = self.render_diagram(diagram);

        let mut file = File::create(path).map_err(|err| {
            error!(path:? = path, err:err; "Failed to create SVG file");
            export::Error::Io(err)
        })?;
        write!(file, "{doc}").map_err(|err| {
            error!(path:? = path, err:err; "Failed to write SVG content");
            export::Error::Io(err)
        })?;

        Ok(())
    }

    /// Bounds of all class boxes, or an empty box at the origin.
    fn content_bounds(&self, diagram: &Diagram) -> Bounds {
        let mut shapes = diagram.classes.iter().map(ClassShape::bounds);
        let Some(first) = shapes.next() else {
            return Bounds::default();
        };
        shapes.fold(first, |acc, bounds| acc.merge(&bounds))
    }

    fn render_connection(
        &self,
        connection: &Connection,
        from: &ClassShape,
        to: &ClassShape,
    ) -> LayeredOutput {
        let start = boundary_intersection(from.bounds(), to.center());
        let end = boundary_intersection(to.bounds(), from.center());

        let mut output = RelationGlyph::for_kind(start, end, connection.kind)
            .with_color(self.stroke)
            .render_to_layers(self.background);

        if !connection.label.is_empty() {
            let anchor = start.midpoint(end).add_point(Point::new(0.0, -8.0));
            output.add_to_layer(
                RenderLayer::Text,
                Box::new(self.label(anchor, &connection.label, "middle")),
            );
        }

        let angle = start.angle_to(end);
        let ends = [
            (connection.from_multiplicity.as_deref(), start, angle),
            (connection.to_multiplicity.as_deref(), end, angle + std::f32::consts::PI),
        ];
        for (multiplicity, point, direction) in ends {
            if let Some(text) = multiplicity.filter(|text| !text.is_empty()) {
                let anchor = point
                    .offset_polar(direction, MULTIPLICITY_OFFSET)
                    .add_point(Point::new(0.0, -8.0));
                output.add_to_layer(RenderLayer::Text, Box::new(self.label(anchor, text, "middle")));
            }
        }

        output
    }

    fn label(&self, position: Point, text: &str, anchor: &str) -> svg_element::Text {
        svg_element::Text::new(text)
            .set("x", position.x())
            .set("y", position.y())
            .set("text-anchor", anchor)
            .set("font-family", "Arial, sans-serif")
            .set("font-size", LABEL_FONT_SIZE)
            .set("fill", &self.stroke)
    }
}
