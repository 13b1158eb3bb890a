//! Diagrams described as database tables.
//!
//! Some clients send their classes as tables with typed columns instead of
//! class shapes. [`TableDiagram`] reads that form and converts into a
//! [`Diagram`] with one class per table, laid out on a three-column grid.

use serde::{Deserialize, Serialize};

use crate::{
    geometry::Point,
    semantic::{ClassShape, Diagram, Field, ShapeId, Visibility, element::deserialize_id},
};

const GRID_COLUMNS: usize = 3;
const GRID_MARGIN: f32 = 50.0;
const GRID_COLUMN_SPACING: f32 = 250.0;
const GRID_ROW_SPACING: f32 = 200.0;

/// A column of a [`Table`]. Types are usually SQL types such as
/// `VARCHAR(255)` or `DECIMAL(10,2)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default = "default_column_type")]
    pub type_name: String,
    #[serde(default)]
    pub pk: bool,
    #[serde(default = "default_nullable")]
    pub nullable: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    #[serde(default, deserialize_with = "deserialize_id")]
    pub id: ShapeId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub columns: Vec<Column>,
}

/// `{name, tables: [{id, name, columns}]}`. Relations between tables are
/// not read.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableDiagram {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub tables: Vec<Table>,
}

impl From<Table> for ClassShape {
    /// Each column becomes a private field of the column's type.
    fn from(table: Table) -> Self {
        table
            .columns
            .into_iter()
            .filter(|column| !column.name.trim().is_empty())
            .fold(
                ClassShape::new(table.name, Point::default()).with_id(table.id),
                |shape, column| {
                    shape.with_field(Field::new(Visibility::Private, column.name, column.type_name))
                },
            )
    }
}

impl From<TableDiagram> for Diagram {
    fn from(tables: TableDiagram) -> Self {
        let classes = tables
            .tables
            .into_iter()
            .enumerate()
            .map(|(index, table)| {
                let mut shape = ClassShape::from(table);
                shape.set_position(grid_position(index));
                shape
            })
            .collect();

        Self {
            name: tables.name,
            classes,
            connections: Vec::new(),
        }
    }
}

fn grid_position(index: usize) -> Point {
    let column = (index % GRID_COLUMNS) as f32;
    let row = (index / GRID_COLUMNS) as f32;
    Point::new(
        column.mul_add(GRID_COLUMN_SPACING, GRID_MARGIN),
        row.mul_add(GRID_ROW_SPACING, GRID_MARGIN),
    )
}

fn default_column_type() -> String {
    "VARCHAR(255)".to_string()
}

fn default_nullable() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tables_become_classes() {
        let json = r#"{
            "name": "Escuela",
            "tables": [
                {"id": 1700000000123, "name": "Persona", "columns": [
                    {"name": "id", "type": "INT", "pk": true, "nullable": false},
                    {"name": "nombre", "type": "VARCHAR(255)", "pk": false, "nullable": true}
                ]},
                {"id": "class-2", "name": "Curso", "columns": []},
                {"name": "Aula", "columns": [{"name": "  "}]},
                {"name": "Horario"}
            ],
            "relations": []
        }"#;
        let tables: TableDiagram = serde_json::from_str(json).unwrap();
        assert!(tables.tables[0].columns[0].pk);
        assert!(tables.tables[0].columns[1].nullable);

        let diagram = Diagram::from(tables);
        assert_eq!(diagram.name.as_deref(), Some("Escuela"));
        assert!(diagram.connections.is_empty());

        let persona = diagram.shape("1700000000123").unwrap();
        assert_eq!(persona.fields.len(), 2);
        assert_eq!(persona.fields[1].signature(), "- nombre: VARCHAR(255)");
        assert_eq!(persona.position(), Point::new(50.0, 50.0));

        assert_eq!(diagram.shape("class-2").unwrap().position(), Point::new(300.0, 50.0));
        assert!(diagram.classes[2].fields.is_empty());
        assert_eq!(diagram.classes[3].position(), Point::new(50.0, 250.0));
    }

    #[test]
    fn test_tables_key_is_required() {
        assert!(serde_json::from_str::<TableDiagram>(r#"{"classes": []}"#).is_err());
    }
}
