//! Diagram elements: class shapes, their members, and connections.
//!
//! All types serialize in the editor's JSON form (camelCase keys, member
//! types under `"type"`), so a saved diagram loads back unchanged.

use std::fmt;

use serde::{
    Deserialize, Deserializer, Serialize,
    de::{self, Visitor},
};

use crate::{
    geometry::{Bounds, Point, Size},
    semantic::{RelationKind, Visibility},
};

/// Identifier of a [`ClassShape`], `class-N` for store-assigned ids.
pub type ShapeId = String;
/// Identifier of a [`Connection`], `conn-N` for store-assigned ids.
pub type ConnectionId = String;

/// Prefix of synthetic shape ids.
pub const SHAPE_ID_PREFIX: &str = "class-";
/// Prefix of synthetic connection ids.
pub const CONNECTION_ID_PREFIX: &str = "conn-";

/// Width of a freshly created class box.
pub const DEFAULT_SHAPE_WIDTH: f32 = 200.0;
/// Height floor of a class box.
pub const MIN_SHAPE_HEIGHT: f32 = 120.0;

const HEADER_HEIGHT: f32 = 60.0;
const MEMBER_ROW_HEIGHT: f32 = 25.0;
const COMPARTMENT_SEPARATOR: f32 = 2.0;

/// An attribute of a class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default = "default_field_type")]
    pub type_name: String,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multiplicity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
}

impl Field {
    pub fn new(visibility: Visibility, name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            visibility,
            multiplicity: None,
            default_value: None,
        }
    }

    /// `"- id: int"`
    pub fn signature(&self) -> String {
        format!("{} {}: {}", self.visibility, self.name, self.type_name)
    }
}

/// A method parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default = "default_field_type")]
    pub type_name: String,
}

impl Parameter {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
        }
    }
}

/// An operation of a class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Method {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", alias = "returnType", default = "default_return_type")]
    pub return_type: String,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub is_abstract: bool,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
}

impl Method {
    pub fn new(
        visibility: Visibility,
        name: impl Into<String>,
        return_type: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            return_type: return_type.into(),
            visibility,
            is_abstract: false,
            parameters: Vec::new(),
        }
    }

    pub fn with_parameter(mut self, parameter: Parameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    /// `"+ find(id: int, name: String): Person"`
    pub fn signature(&self) -> String {
        let params = self
            .parameters
            .iter()
            .map(|p| format!("{}: {}", p.name, p.type_name))
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "{} {}({}): {}",
            self.visibility, self.name, params, self.return_type
        )
    }
}

/// A class (or interface) box on the canvas.
///
/// `x` and `y` locate the top-left corner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassShape {
    #[serde(default, deserialize_with = "deserialize_id")]
    pub id: ShapeId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub is_abstract: bool,
    #[serde(default)]
    pub is_interface: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stereotype: Option<String>,
    #[serde(default, alias = "attributes")]
    pub fields: Vec<Field>,
    #[serde(default)]
    pub methods: Vec<Method>,
    #[serde(default)]
    pub x: f32,
    #[serde(default)]
    pub y: f32,
    #[serde(default = "default_width")]
    pub width: f32,
    #[serde(default = "default_height")]
    pub height: f32,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_intermediate: bool,
}

impl ClassShape {
    /// An empty class named `name` at `position`.
    pub fn new(name: impl Into<String>, position: Point) -> Self {
        Self {
            id: ShapeId::new(),
            name: name.into(),
            is_abstract: false,
            is_interface: false,
            stereotype: None,
            fields: Vec::new(),
            methods: Vec::new(),
            x: position.x(),
            y: position.y(),
            width: DEFAULT_SHAPE_WIDTH,
            height: MIN_SHAPE_HEIGHT,
            is_intermediate: false,
        }
    }

    pub fn with_id(mut self, id: impl Into<ShapeId>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self.recompute_height();
        self
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.methods.push(method);
        self.recompute_height();
        self
    }

    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn set_position(&mut self, position: Point) {
        self.x = position.x();
        self.y = position.y();
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn bounds(&self) -> Bounds {
        Bounds::new_from_top_left(self.position(), self.size())
    }

    pub fn center(&self) -> Point {
        self.bounds().center()
    }

    /// Height derived from the member counts.
    ///
    /// ```
    /// # use umlcanvas_core::semantic::ClassShape;
    /// assert_eq!(ClassShape::content_height(0, 0), 120.0);
    /// assert_eq!(ClassShape::content_height(3, 2), 60.0 + 125.0 + 2.0);
    /// assert_eq!(ClassShape::content_height(4, 0), 160.0);
    /// ```
    pub fn content_height(field_count: usize, method_count: usize) -> f32 {
        let separator = if field_count > 0 && method_count > 0 {
            COMPARTMENT_SEPARATOR
        } else {
            0.0
        };
        let rows = (field_count + method_count) as f32;
        MIN_SHAPE_HEIGHT.max(rows.mul_add(MEMBER_ROW_HEIGHT, HEADER_HEIGHT) + separator)
    }

    pub fn recompute_height(&mut self) {
        self.height = Self::content_height(self.fields.len(), self.methods.len());
    }
}

/// A relationship between two class shapes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    #[serde(default, deserialize_with = "deserialize_id")]
    pub id: ConnectionId,
    #[serde(deserialize_with = "deserialize_id")]
    pub from_id: ShapeId,
    #[serde(deserialize_with = "deserialize_id")]
    pub to_id: ShapeId,
    #[serde(rename = "type", alias = "kind", default)]
    pub kind: RelationKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_multiplicity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_multiplicity: Option<String>,
    #[serde(default)]
    pub label: String,
}

impl Connection {
    /// A connection labelled with the kind's default label.
    pub fn new(from_id: impl Into<ShapeId>, to_id: impl Into<ShapeId>, kind: RelationKind) -> Self {
        Self {
            id: ConnectionId::new(),
            from_id: from_id.into(),
            to_id: to_id.into(),
            kind,
            from_multiplicity: None,
            to_multiplicity: None,
            label: kind.default_label().to_string(),
        }
    }

    pub fn with_id(mut self, id: impl Into<ConnectionId>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn touches(&self, shape_id: &str) -> bool {
        self.from_id == shape_id || self.to_id == shape_id
    }
}

/// A whole diagram as saved, loaded and exported.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagram {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub classes: Vec<ClassShape>,
    #[serde(default)]
    pub connections: Vec<Connection>,
}

impl Diagram {
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty() && self.connections.is_empty()
    }

    pub fn shape(&self, id: &str) -> Option<&ClassShape> {
        self.classes.iter().find(|shape| shape.id == id)
    }
}

/// Reads an id given as a string or as a number. Editors that key their
/// elements by timestamp send numbers; `null` reads as an empty id.
pub(crate) fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    struct IdVisitor;

    impl Visitor<'_> for IdVisitor {
        type Value = String;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a string or numeric id")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_string<E: de::Error>(self, v: String) -> Result<String, E> {
            Ok(v)
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<String, E> {
            if !v.is_finite() {
                return Err(E::invalid_value(de::Unexpected::Float(v), &self));
            }
            if v.fract() == 0.0 {
                Ok(format!("{v:.0}"))
            } else {
                Ok(v.to_string())
            }
        }

        fn visit_unit<E: de::Error>(self) -> Result<String, E> {
            Ok(String::new())
        }
    }

    deserializer.deserialize_any(IdVisitor)
}

fn default_field_type() -> String {
    "String".to_string()
}

fn default_return_type() -> String {
    "void".to_string()
}

fn default_width() -> f32 {
    DEFAULT_SHAPE_WIDTH
}

fn default_height() -> f32 {
    MIN_SHAPE_HEIGHT
}
