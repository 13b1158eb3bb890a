//! Partial diagrams produced outside the editor.
//!
//! A draft has no ids and no positions. Its connections name their
//! endpoints either by class name or by an existing shape id; the merge step
//! resolves them.

use serde::{Deserialize, Serialize};

use crate::semantic::{Field, Method, RelationKind};

/// A class as described by a model or a text listing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftClass {
    pub name: String,
    #[serde(default)]
    pub is_abstract: bool,
    #[serde(default)]
    pub is_interface: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stereotype: Option<String>,
    #[serde(default)]
    pub fields: Vec<Field>,
    #[serde(default)]
    pub methods: Vec<Method>,
}

impl DraftClass {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// A relationship whose endpoints are still names (or raw ids).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftConnection {
    #[serde(rename = "fromId")]
    pub from: String,
    #[serde(rename = "toId")]
    pub to: String,
    #[serde(rename = "type", default)]
    pub kind: RelationKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_multiplicity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_multiplicity: Option<String>,
}

impl DraftConnection {
    pub fn new(from: impl Into<String>, to: impl Into<String>, kind: RelationKind) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            kind,
            label: None,
            from_multiplicity: None,
            to_multiplicity: None,
        }
    }

    /// The explicit label, or the kind's default one.
    pub fn effective_label(&self) -> String {
        self.label
            .clone()
            .filter(|label| !label.is_empty())
            .unwrap_or_else(|| self.kind.default_label().to_string())
    }
}

/// Classes and connections to be merged into a diagram.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DraftDiagram {
    #[serde(default)]
    pub classes: Vec<DraftClass>,
    #[serde(default)]
    pub connections: Vec<DraftConnection>,
}

impl DraftDiagram {
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty() && self.connections.is_empty()
    }
}
