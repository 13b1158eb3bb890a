//! Mapping loosely shaped model JSON onto strict drafts.
//!
//! Models answer with many spellings of the same structure. Every accepted
//! spelling is listed in the tables below; lookups take the first key that
//! is present with a usable value.

use log::{debug, warn};
use serde_json::{Map, Value};
use umlcanvas_core::semantic::{
    DraftClass, DraftConnection, DraftDiagram, Field, Method, Parameter, RelationKind, Visibility,
};

use crate::error::ModelOutputError;

/// Paths, from the root object, of the class list.
const CLASS_LIST_PATHS: &[&[&str]] = &[
    &["classes"],
    &["types"],
    &["package", "classes"],
    &["classDiagram", "classes"],
];

/// Paths, from the root object, of the connection list.
const CONNECTION_LIST_PATHS: &[&[&str]] = &[
    &["connections"],
    &["relationships"],
    &["relaciones"],
    &["associations"],
    &["package", "associations"],
    &["package", "relationships"],
    &["classDiagram", "relationships"],
];

const FIELD_KEYS: &[&str] = &["fields", "attributes"];
const METHOD_KEYS: &[&str] = &["methods", "operations"];
const PARAMETER_KEYS: &[&str] = &["parameters", "params"];
const MEMBER_TYPE_KEYS: &[&str] = &["type", "dataType"];
const RETURN_TYPE_KEYS: &[&str] = &["type", "returnType"];
const ABSTRACT_KEYS: &[&str] = &["isAbstract", "abstract"];
const INTERFACE_KEYS: &[&str] = &["isInterface", "interface"];
const FROM_KEYS: &[&str] = &["fromId", "from", "source"];
const TO_KEYS: &[&str] = &["toId", "to", "target"];
const KIND_KEYS: &[&str] = &["type", "kind"];
const LABEL_KEYS: &[&str] = &["label", "multiplicity"];

const DEFAULT_CLASS_NAME: &str = "Class";
const DEFAULT_FIELD_TYPE: &str = "String";
const DEFAULT_RETURN_TYPE: &str = "void";

/// Normalizes a parsed model reply into a draft diagram.
///
/// # Errors
///
/// [`ModelOutputError::NoClasses`] when no class list is found or it is
/// empty.
///
/// ```
/// # use umlcanvas_parser::normalize;
/// # use umlcanvas_core::semantic::RelationKind;
/// let value = serde_json::json!({
///     "package": {
///         "classes": [{"name": "Order", "attributes": ["total: double"]}],
///         "associations": [{"source": "Order", "target": "Customer", "kind": "1:n"}]
///     }
/// });
/// let draft = normalize(&value).unwrap();
/// assert_eq!(draft.classes[0].fields[0].type_name, "double");
/// assert_eq!(draft.connections[0].kind, RelationKind::OneToMany);
/// ```
pub fn normalize(value: &Value) -> Result<DraftDiagram, ModelOutputError> {
    let classes: Vec<DraftClass> = find_list(value, CLASS_LIST_PATHS)
        .map(|items| items.iter().filter_map(normalize_class).collect())
        .unwrap_or_default();

    if classes.is_empty() {
        return Err(ModelOutputError::NoClasses);
    }

    let connections: Vec<DraftConnection> = find_list(value, CONNECTION_LIST_PATHS)
        .map(|items| items.iter().filter_map(normalize_connection).collect())
        .unwrap_or_default();

    debug!(
        classes = classes.len(),
        connections = connections.len();
        "Normalized model output"
    );

    Ok(DraftDiagram {
        classes,
        connections,
    })
}

fn find_list<'a>(root: &'a Value, paths: &[&[&str]]) -> Option<&'a Vec<Value>> {
    paths.iter().find_map(|path| {
        path.iter()
            .try_fold(root, |node, key| node.get(key))
            .and_then(Value::as_array)
            .filter(|items| !items.is_empty())
    })
}

fn first<'a>(object: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| object.get(*key))
        .find(|value| !value.is_null())
}

fn first_str<'a>(object: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .filter_map(|key| object.get(*key).and_then(Value::as_str))
        .map(str::trim)
        .find(|s| !s.is_empty())
}

/// Reads a flag that may be given as a boolean or as `"true"`.
fn first_flag(object: &Map<String, Value>, keys: &[&str]) -> bool {
    match first(object, keys) {
        Some(Value::Bool(flag)) => *flag,
        Some(Value::String(s)) => s.eq_ignore_ascii_case("true"),
        _ => false,
    }
}

fn first_list<'a>(object: &'a Map<String, Value>, keys: &[&str]) -> &'a [Value] {
    first(object, keys)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

fn visibility_of(object: &Map<String, Value>) -> Visibility {
    object
        .get("visibility")
        .and_then(Value::as_str)
        .and_then(|raw| raw.parse().ok())
        .unwrap_or_default()
}

fn normalize_class(value: &Value) -> Option<DraftClass> {
    let Some(object) = value.as_object() else {
        warn!(value:% = value; "Ignoring class entry that is not an object");
        return None;
    };

    let stereotype = first_str(object, &["stereotype"]).map(str::to_string);

    Some(DraftClass {
        name: first_str(object, &["name"])
            .unwrap_or(DEFAULT_CLASS_NAME)
            .to_string(),
        is_abstract: first_flag(object, ABSTRACT_KEYS),
        is_interface: first_flag(object, INTERFACE_KEYS),
        stereotype,
        fields: first_list(object, FIELD_KEYS)
            .iter()
            .filter_map(normalize_field)
            .collect(),
        methods: first_list(object, METHOD_KEYS)
            .iter()
            .filter_map(normalize_method)
            .collect(),
    })
}

/// A field is either an object or a `"name: type"` string.
fn normalize_field(value: &Value) -> Option<Field> {
    match value {
        Value::String(text) => {
            let (name, type_name) = match text.split_once(':') {
                Some((name, type_name)) => (name.trim(), type_name.trim()),
                None => (text.trim(), ""),
            };
            let (visibility, name) = split_visibility(name);
            let type_name = if type_name.is_empty() {
                DEFAULT_FIELD_TYPE
            } else {
                type_name
            };
            Some(Field::new(visibility, name, type_name))
        }
        Value::Object(object) => {
            let mut field = Field::new(
                visibility_of(object),
                first_str(object, &["name"]).unwrap_or_default(),
                first_str(object, MEMBER_TYPE_KEYS).unwrap_or(DEFAULT_FIELD_TYPE),
            );
            field.multiplicity = first_str(object, &["multiplicity"]).map(str::to_string);
            field.default_value = first(object, &["defaultValue", "default"]).map(scalar_text);
            Some(field)
        }
        _ => None,
    }
}

/// A method is either an object or a bare name string.
fn normalize_method(value: &Value) -> Option<Method> {
    match value {
        Value::String(text) => {
            let (visibility, name) = split_visibility(text.trim());
            let name = name.split('(').next().unwrap_or(name).trim();
            Some(Method::new(visibility, name, DEFAULT_RETURN_TYPE))
        }
        Value::Object(object) => {
            let mut method = Method::new(
                visibility_of(object),
                first_str(object, &["name"]).unwrap_or_default(),
                first_str(object, RETURN_TYPE_KEYS).unwrap_or(DEFAULT_RETURN_TYPE),
            );
            method.is_abstract = first_flag(object, ABSTRACT_KEYS);
            method.parameters = first_list(object, PARAMETER_KEYS)
                .iter()
                .filter_map(normalize_parameter)
                .collect();
            Some(method)
        }
        _ => None,
    }
}

fn normalize_parameter(value: &Value) -> Option<Parameter> {
    match value {
        Value::String(text) => {
            let (name, type_name) = text
                .split_once(':')
                .unwrap_or((text.as_str(), DEFAULT_FIELD_TYPE));
            Some(Parameter::new(name.trim(), type_name.trim()))
        }
        Value::Object(object) => Some(Parameter::new(
            first_str(object, &["name"]).unwrap_or_default(),
            first_str(object, MEMBER_TYPE_KEYS).unwrap_or(DEFAULT_FIELD_TYPE),
        )),
        _ => None,
    }
}

fn normalize_connection(value: &Value) -> Option<DraftConnection> {
    let object = value.as_object()?;
    let (Some(from), Some(to)) = (first_str(object, FROM_KEYS), first_str(object, TO_KEYS)) else {
        warn!(value:% = value; "Ignoring connection without both endpoints");
        return None;
    };

    let kind = first_str(object, KIND_KEYS)
        .map(RelationKind::parse_lenient)
        .unwrap_or_default();

    let mut connection = DraftConnection::new(from, to, kind);
    connection.label = first_str(object, LABEL_KEYS).map(str::to_string);
    connection.from_multiplicity = first_str(object, &["fromMultiplicity"]).map(str::to_string);
    connection.to_multiplicity = first_str(object, &["toMultiplicity"]).map(str::to_string);
    Some(connection)
}

/// Splits a leading UML visibility symbol off a member name.
fn split_visibility(text: &str) -> (Visibility, &str) {
    let mut chars = text.chars();
    match chars.next().and_then(Visibility::from_symbol) {
        Some(visibility) => (visibility, chars.as_str().trim_start()),
        None => (Visibility::Public, text),
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
