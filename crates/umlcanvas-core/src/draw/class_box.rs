//! Class box drawable.
//!
//! A box is drawn as three compartments: a header with the optional
//! stereotype and the class name, the fields, and the methods. Members are
//! laid out on fixed 25-unit rows, matching the height formula of
//! [`ClassShape::content_height`].

use svg::node::element as svg_element;

use crate::{
    apply_stroke,
    color::Color,
    draw::{LayeredOutput, RenderLayer, StrokeDefinition},
    geometry::Point,
    semantic::ClassShape,
};

const HEADER_HEIGHT: f32 = 50.0;
const ROW_HEIGHT: f32 = 25.0;
const TEXT_INSET: f32 = 10.0;

/// Visual settings shared by all class boxes of a diagram.
#[derive(Debug, Clone)]
pub struct ClassBoxStyle {
    stroke: StrokeDefinition,
    fill: Color,
    intermediate_fill: Color,
    text_color: Color,
    font_family: String,
    font_size: f32,
}

impl ClassBoxStyle {
    pub fn new(stroke: StrokeDefinition, fill: Color) -> Self {
        Self {
            stroke,
            fill,
            ..Self::default()
        }
    }

    pub fn stroke(&self) -> &StrokeDefinition {
        &self.stroke
    }

    pub fn fill(&self) -> Color {
        self.fill
    }

    pub fn set_text_color(&mut self, color: Color) {
        self.text_color = color;
    }

    pub fn set_font_size(&mut self, size: f32) {
        self.font_size = size;
    }

    /// Background of junction classes created for many-to-many links.
    pub fn set_intermediate_fill(&mut self, color: Color) {
        self.intermediate_fill = color;
    }
}

impl Default for ClassBoxStyle {
    fn default() -> Self {
        let intermediate_fill = Color::new("#f3f4f6").unwrap_or_else(|_| Color::white());
        Self {
            stroke: StrokeDefinition::new(Color::default(), 1.5),
            fill: Color::white(),
            intermediate_fill,
            text_color: Color::default(),
            font_family: "Arial, sans-serif".to_string(),
            font_size: 13.0,
        }
    }
}

/// A class shape ready to be rendered.
#[derive(Debug)]
pub struct ClassBox<'a> {
    shape: &'a ClassShape,
    style: &'a ClassBoxStyle,
}

impl<'a> ClassBox<'a> {
    pub fn new(shape: &'a ClassShape, style: &'a ClassBoxStyle) -> Self {
        Self { shape, style }
    }

    /// Text shown above the name, if any.
    ///
    /// Interfaces without an explicit stereotype show `«interface»`.
    pub fn stereotype_label(&self) -> Option<String> {
        match (&self.shape.stereotype, self.shape.is_interface) {
            (Some(stereotype), _) if !stereotype.trim().is_empty() => {
                Some(format!("«{}»", stereotype.trim()))
            }
            (_, true) => Some("«interface»".to_string()),
            _ => None,
        }
    }

    pub fn render_to_layers(&self) -> LayeredOutput {
        let mut output = LayeredOutput::new();
        let bounds = self.shape.bounds();
        let fill = if self.shape.is_intermediate {
            self.style.intermediate_fill
        } else {
            self.style.fill
        };

        let rect = svg_element::Rectangle::new()
            .set("x", bounds.min_x())
            .set("y", bounds.min_y())
            .set("width", bounds.width())
            .set("height", bounds.height())
            .set("fill", &fill)
            .set("data-class-id", self.shape.id.as_str());
        output.add_to_layer(
            RenderLayer::Shape,
            Box::new(apply_stroke!(rect, self.style.stroke())),
        );

        let center_x = bounds.center().x();
        match self.stereotype_label() {
            Some(stereotype) => {
                let top = bounds.min_y();
                self.add_text(&mut output, Point::new(center_x, top + 18.0), stereotype, "middle");
                self.add_name(&mut output, Point::new(center_x, top + 36.0));
            }
            None => {
                self.add_name(&mut output, Point::new(center_x, bounds.min_y() + HEADER_HEIGHT / 2.0));
            }
        }

        let mut cursor = bounds.min_y() + HEADER_HEIGHT;
        self.add_separator(&mut output, cursor);

        let left = bounds.min_x() + TEXT_INSET;
        for field in &self.shape.fields {
            let baseline = cursor + ROW_HEIGHT / 2.0;
            self.add_text(&mut output, Point::new(left, baseline), field.signature(), "start");
            cursor += ROW_HEIGHT;
        }

        if !self.shape.fields.is_empty() && !self.shape.methods.is_empty() {
            cursor += 2.0;
            self.add_separator(&mut output, cursor);
        }

        for method in &self.shape.methods {
            let baseline = cursor + ROW_HEIGHT / 2.0;
            let node = self.text_node(Point::new(left, baseline), method.signature(), "start");
            let node = if method.is_abstract {
                node.set("font-style", "italic")
            } else {
                node
            };
            output.add_to_layer(RenderLayer::Text, Box::new(node));
            cursor += ROW_HEIGHT;
        }

        output
    }

    fn add_name(&self, output: &mut LayeredOutput, position: Point) {
        let node = self
            .text_node(position, self.shape.name.clone(), "middle")
            .set("font-weight", "bold");
        let node = if self.shape.is_abstract {
            node.set("font-style", "italic")
        } else {
            node
        };
        output.add_to_layer(RenderLayer::Text, Box::new(node));
    }

    fn add_text(
        &self,
        output: &mut LayeredOutput,
        position: Point,
        content: String,
        anchor: &str,
    ) {
        output.add_to_layer(
            RenderLayer::Text,
            Box::new(self.text_node(position, content, anchor)),
        );
    }

    fn add_separator(&self, output: &mut LayeredOutput, y: f32) {
        let bounds = self.shape.bounds();
        let line = svg_element::Line::new()
            .set("x1", bounds.min_x())
            .set("y1", y)
            .set("x2", bounds.max_x())
            .set("y2", y);
        output.add_to_layer(
            RenderLayer::Shape,
            Box::new(apply_stroke!(line, self.style.stroke())),
        );
    }

    fn text_node(&self, position: Point, content: String, anchor: &str) -> svg_element::Text {
        svg_element::Text::new(content)
            .set("x", position.x())
            .set("y", position.y())
            .set("text-anchor", anchor)
            .set("dominant-baseline", "central")
            .set("font-family", self.style.font_family.as_str())
            .set("font-size", self.style.font_size)
            .set("fill", &self.style.text_color)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::semantic::{Field, Method, Visibility};

    fn render(shape: &ClassShape) -> String {
        let style = ClassBoxStyle::default();
        ClassBox::new(shape, &style)
            .render_to_layers()
            .render()
            .into_iter()
            .fold(svg::Document::new(), |doc, node| doc.add(node))
            .to_string()
    }

    #[test]
    fn test_stereotype_label() {
        let style = ClassBoxStyle::default();
        let mut shape = ClassShape::new("Shape", Point::new(0.0, 0.0));
        assert_eq!(ClassBox::new(&shape, &style).stereotype_label(), None);

        shape.is_interface = true;
        assert_eq!(
            ClassBox::new(&shape, &style).stereotype_label().as_deref(),
            Some("«interface»")
        );

        shape.stereotype = Some("entity".to_string());
        assert_eq!(
            ClassBox::new(&shape, &style).stereotype_label().as_deref(),
            Some("«entity»")
        );
    }

    #[test]
    fn test_render_contains_members() {
        let shape = ClassShape::new("Person", Point::new(10.0, 20.0))
            .with_id("class-1")
            .with_field(Field::new(Visibility::Private, "id", "int"))
            .with_method(Method::new(Visibility::Public, "greet", "void"));
        let svg = render(&shape);

        assert!(svg.contains("data-class-id=\"class-1\""));
        assert!(svg.contains("Person"));
        assert!(svg.contains("- id: int"));
        assert!(svg.contains("+ greet(): void"));
    }

    #[test]
    fn test_abstract_name_is_italic() {
        let mut shape = ClassShape::new("Animal", Point::new(0.0, 0.0));
        shape.is_abstract = true;
        assert!(render(&shape).contains("font-style=\"italic\""));
    }
}
