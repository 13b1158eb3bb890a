//! Integration tests for the Workbench API
//!
//! A scripted generator stands in for the language model.

use std::{
    cell::RefCell,
    io::{Cursor, Read},
};

use umlcanvas::{
    ImageTranscription, UmlCanvasError, Workbench,
    config::AppConfig,
    geometry::Point,
    llm::{DiagramGenerator, ImageInput},
    semantic::RelationKind,
    store::DiagramStore,
};

enum Reply {
    Text(&'static str),
    Upstream(u16),
}

struct ScriptedModel {
    reply: Reply,
    prompts: RefCell<Vec<String>>,
}

impl ScriptedModel {
    fn new(reply: Reply) -> Self {
        Self {
            reply,
            prompts: RefCell::new(Vec::new()),
        }
    }

    fn answer(&self) -> Result<String, UmlCanvasError> {
        match &self.reply {
            Reply::Text(text) => Ok(text.to_string()),
            Reply::Upstream(status) => Err(UmlCanvasError::Upstream {
                status: *status,
                details: "rate limited".to_string(),
            }),
        }
    }
}

impl DiagramGenerator for ScriptedModel {
    fn generate(&self, prompt: &str) -> Result<String, UmlCanvasError> {
        self.prompts.borrow_mut().push(prompt.to_string());
        self.answer()
    }

    fn describe_image(&self, _image: ImageInput<'_>) -> Result<String, UmlCanvasError> {
        self.answer()
    }
}

const ESTUDIANTE_REPLY: &str = r#"Sure! Here it is:
```json
{
  "classes": [
    {"name": "Estudiante", "attributes": [{"name": "matricula", "type": "String", "visibility": "-"}]}
  ],
  "relationships": [
    {"from": "Estudiante", "to": "Persona", "type": "inheritance"}
  ]
}
```"#;

fn persona_store() -> DiagramStore {
    let mut store = DiagramStore::new();
    store.create_shape("Persona", Point::new(50.0, 50.0));
    store.save_state();
    store
}

#[test]
fn test_generate_merges_into_existing_diagram() {
    let workbench = Workbench::default();
    let mut store = persona_store();
    let model = ScriptedModel::new(Reply::Text(ESTUDIANTE_REPLY));

    let report = workbench
        .generate(&mut store, "Add a class Estudiante that inherits from Persona", &model)
        .expect("Failed to generate");

    assert_eq!(report.added_shapes, ["class-2"]);
    assert_eq!(report.added_connections.len(), 1);
    assert!(report.dropped_connections.is_empty());

    let connection = &store.connections()[0];
    assert_eq!(connection.from_id, "class-2");
    assert_eq!(connection.to_id, "class-1");
    assert_eq!(connection.kind, RelationKind::Generalization);

    let prompts = model.prompts.borrow();
    assert!(prompts[0].contains("CURRENT DIAGRAM CONTEXT"));
    assert!(prompts[0].contains("Persona"));

    // The merge is one undoable step
    assert!(store.undo());
    assert_eq!(store.shapes().len(), 1);
}

#[test]
fn test_empty_store_sends_bare_request() {
    let workbench = Workbench::default();
    let mut store = DiagramStore::new();
    let model = ScriptedModel::new(Reply::Text(r#"{"classes": [{"name": "Curso"}]}"#));

    workbench
        .generate(&mut store, "A course", &model)
        .expect("Failed to generate");

    assert_eq!(model.prompts.borrow()[0], "A course");
    assert_eq!(store.shapes()[0].name, "Curso");
}

#[test]
fn test_generation_on_unsaved_store_can_be_undone() {
    let workbench = Workbench::default();
    let mut store = DiagramStore::new();
    store.create_shape("Persona", Point::new(50.0, 50.0));
    let model = ScriptedModel::new(Reply::Text(ESTUDIANTE_REPLY));

    workbench
        .generate(&mut store, "Add Estudiante", &model)
        .expect("Failed to generate");
    assert_eq!(store.shapes().len(), 2);
    assert!(store.can_undo());

    assert!(store.undo());
    let names: Vec<_> = store.shapes().iter().map(|shape| shape.name.as_str()).collect();
    assert_eq!(names, ["Persona"]);
    assert!(store.connections().is_empty());

    assert!(store.redo());
    assert_eq!(store.shapes().len(), 2);
}

#[test]
fn test_generation_on_empty_store_can_be_undone() {
    let workbench = Workbench::default();
    let mut store = DiagramStore::new();
    let model = ScriptedModel::new(Reply::Text(r#"{"classes": [{"name": "Curso"}]}"#));

    workbench
        .generate(&mut store, "A course", &model)
        .expect("Failed to generate");

    assert!(store.undo());
    assert!(store.shapes().is_empty());
}

#[test]
fn test_failed_generation_leaves_store_untouched() {
    let workbench = Workbench::default();

    for reply in [
        Reply::Text("I cannot draw diagrams."),
        Reply::Text(r#"{"classes": []}"#),
        Reply::Upstream(429),
    ] {
        let mut store = persona_store();
        let before = store.snapshot();
        let result = workbench.generate(&mut store, "anything", &ScriptedModel::new(reply));

        assert!(result.is_err());
        assert_eq!(store.snapshot(), before);
        assert!(!store.can_undo());
    }
}

#[test]
fn test_upstream_error_is_passed_through() {
    let workbench = Workbench::default();
    let store = DiagramStore::new();
    let err = workbench
        .generate_draft(&store, "anything", &ScriptedModel::new(Reply::Upstream(503)))
        .unwrap_err();
    assert!(matches!(err, UmlCanvasError::Upstream { status: 503, .. }));
}

#[test]
fn test_transcribe_image() {
    let workbench = Workbench::default();
    let image = ImageInput::new("image/png", b"\x89PNG");

    let parsed = workbench
        .transcribe_image(image, &ScriptedModel::new(Reply::Text(ESTUDIANTE_REPLY)))
        .unwrap();
    assert!(matches!(parsed, ImageTranscription::Parsed(draft) if draft.classes.len() == 1));

    let raw = workbench
        .transcribe_image(image, &ScriptedModel::new(Reply::Text("blurry photo")))
        .unwrap();
    assert_eq!(raw, ImageTranscription::Raw("blurry photo".to_string()));
}

#[test]
fn test_import_render_and_export() {
    let source = r#"
class Persona {
  - nombre: String
}

class Estudiante
- matricula: String

Estudiante -> Persona : generalization
"#;

    let workbench = Workbench::new(AppConfig::default());
    let diagram = workbench.import_listing(source).expect("Failed to import");
    assert_eq!(diagram.classes.len(), 2);
    assert_eq!(diagram.connections.len(), 1);

    let svg = workbench.render_svg(&diagram).expect("Failed to render");
    assert!(svg.contains("<svg"), "Output should contain SVG tag");
    assert!(svg.contains("</svg>"), "Output should be complete SVG");
    assert!(svg.contains("data-relation=\"generalization\""));

    let bytes = workbench
        .export_spring_boot(&diagram, "escuela")
        .expect("Failed to export");
    let archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    let names: Vec<_> = archive.file_names().collect();
    assert!(names.contains(&"pom.xml"));
    assert!(
        names
            .iter()
            .any(|name| name.ends_with("/controller/EstudianteController.java"))
    );
}

#[test]
fn test_invalid_listing_keeps_source() {
    let source = "- id: int\nclass A\n";
    let err = Workbench::default().import_listing(source).unwrap_err();
    match err {
        UmlCanvasError::Parse { src, .. } => assert_eq!(src, source),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_load_diagram_json() {
    let json = r#"{
        "classes": [
            {"id": "class-1", "name": "A", "x": 0, "y": 0},
            {"id": "class-1", "name": "B", "x": 300, "y": 0}
        ],
        "connections": [
            {"id": "conn-1", "fromId": "class-1", "toId": "class-9", "type": "dependency"}
        ]
    }"#;

    let workbench = Workbench::default();
    let diagram = workbench.load_diagram_json(json).unwrap();
    assert_eq!(diagram.classes[0].id, "class-1");
    assert_ne!(diagram.classes[1].id, "class-1");
    // Dangling connections survive loading
    assert_eq!(diagram.connections.len(), 1);

    let err = workbench.load_diagram_json("{").unwrap_err();
    assert!(err.is_user_error());
}

#[test]
fn test_load_editor_diagram_with_numeric_ids() {
    let json = r#"{
        "classes": [
            {"id": 1700000000123, "name": "Persona", "x": 0, "y": 0},
            {"id": 1700000000456, "name": "Curso", "x": 300, "y": 0}
        ],
        "connections": [
            {"id": 1700000000789, "fromId": 1700000000123, "toId": 1700000000456, "type": "association"}
        ]
    }"#;

    let workbench = Workbench::default();
    let diagram = workbench.load_diagram_json(json).unwrap();
    assert_eq!(diagram.classes[0].id, "1700000000123");
    assert_eq!(diagram.connections[0].to_id, "1700000000456");

    let svg = workbench.render_svg(&diagram).unwrap();
    assert_eq!(svg.matches("data-relation=").count(), 1);
}

#[test]
fn test_table_payload_exports_entities() {
    let json = r#"{
        "name": "tienda",
        "tables": [{
            "id": 1700000000123,
            "name": "Producto",
            "columns": [
                {"name": "id", "type": "INT", "pk": true, "nullable": false},
                {"name": "nombre", "type": "VARCHAR(255)", "pk": false, "nullable": true},
                {"name": "precio", "type": "DECIMAL(10,2)", "pk": false, "nullable": true}
            ]
        }],
        "relations": []
    }"#;

    let workbench = Workbench::default();
    let diagram = workbench.load_diagram_json(json).unwrap();
    assert_eq!(diagram.name.as_deref(), Some("tienda"));
    assert_eq!(diagram.classes[0].fields.len(), 3);

    let bytes = workbench.export_spring_boot(&diagram, "tienda").unwrap();
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    let entity_path = archive
        .file_names()
        .find(|name| name.ends_with("/model/Producto.java"))
        .map(str::to_string)
        .expect("entity should be generated");

    let mut entity = String::new();
    archive
        .by_name(&entity_path)
        .unwrap()
        .read_to_string(&mut entity)
        .unwrap();
    assert!(entity.contains("private String nombre;"));
    assert!(entity.contains("private BigDecimal precio;"));
    assert!(entity.contains("import java.math.BigDecimal;"));
}
