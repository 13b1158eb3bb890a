//! umlcanvas - A class-diagram editing engine.
//!
//! Editor state, AI-assisted generation, and export for UML class diagrams.
//! The [`Workbench`] ties the pieces together for callers that do not need
//! the individual modules.

pub mod config;
pub mod export;
pub mod llm;
pub mod merge;
pub mod store;

mod error;

pub use umlcanvas_core::{color, draw, geometry, semantic};

pub use error::UmlCanvasError;

use log::{debug, info, trace, warn};

use serde::Deserialize;
use serde_json::Value;

use umlcanvas_core::semantic::{Diagram, DraftDiagram, TableDiagram};

use config::AppConfig;
use export::{spring_boot::SpringBootExporter, svg::SvgBuilder};
use llm::{DiagramGenerator, ImageInput};
use merge::MergeReport;
use store::DiagramStore;

/// Outcome of transcribing a diagram image.
#[derive(Debug, Clone, PartialEq)]
pub enum ImageTranscription {
    /// The reply parsed into a diagram draft.
    Parsed(DraftDiagram),
    /// The reply could not be parsed; the model's text is kept.
    Raw(String),
}

/// Entry point for parsing, generating, rendering and exporting diagrams.
///
/// # Examples
///
/// ```rust
/// use umlcanvas::{Workbench, config::AppConfig};
///
/// let workbench = Workbench::new(AppConfig::default());
///
/// let diagram = workbench
///     .import_listing("class Person\n+ name: String\n")
///     .expect("Failed to import");
///
/// let svg = workbench.render_svg(&diagram).expect("Failed to render");
/// assert!(svg.contains("Person"));
/// ```
#[derive(Debug, Default)]
pub struct Workbench {
    config: AppConfig,
}

impl Workbench {
    /// Create a new workbench with the given configuration.
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Parse a plain-text class listing into a draft.
    ///
    /// # Errors
    ///
    /// Returns [`UmlCanvasError::Parse`] with the listing attached, so the
    /// diagnostics can be rendered against it.
    pub fn parse_listing(&self, source: &str) -> Result<DraftDiagram, UmlCanvasError> {
        info!("Parsing class listing");
        let draft = umlcanvas_parser::parse_listing(source)
            .map_err(|err| UmlCanvasError::new_parse_error(err, source))?;
        debug!(
            classes = draft.classes.len(),
            connections = draft.connections.len();
            "Class listing parsed"
        );
        trace!(draft:?; "Parsed draft");
        Ok(draft)
    }

    /// Parse a class listing and lay it out as a new diagram.
    ///
    /// Connections naming unknown classes are dropped with a warning.
    pub fn import_listing(&self, source: &str) -> Result<Diagram, UmlCanvasError> {
        let draft = self.parse_listing(source)?;
        let mut store = DiagramStore::new();
        let report = merge::merge_draft(&mut store, draft, &self.config.canvas().placement());
        for dropped in &report.dropped_connections {
            warn!(from = dropped.from.as_str(), to = dropped.to.as_str(); "Listing connection ignored");
        }
        Ok(store.snapshot())
    }

    /// Read a diagram from its JSON form.
    ///
    /// Missing or duplicate ids are replaced, as [`DiagramStore::load`] does.
    ///
    /// # Errors
    ///
    /// Returns [`UmlCanvasError::Json`] for malformed input.
    pub fn load_diagram_json(&self, json: &str) -> Result<Diagram, UmlCanvasError> {
        let value: Value = serde_json::from_str(json)?;
        self.load_diagram_value(value)
    }

    /// Read a diagram from parsed JSON.
    ///
    /// A value with a `tables` key is read as a [`TableDiagram`]; anything
    /// else as a [`Diagram`].
    ///
    /// # Errors
    ///
    /// Returns [`UmlCanvasError::Json`] when the value fits neither form.
    pub fn load_diagram_value(&self, value: Value) -> Result<Diagram, UmlCanvasError> {
        let diagram = if value.get("tables").is_some() {
            let tables = TableDiagram::deserialize(value)?;
            debug!(tables = tables.tables.len(); "Reading table-shaped diagram");
            Diagram::from(tables)
        } else {
            Diagram::deserialize(value)?
        };

        let mut store = DiagramStore::new();
        store.load(diagram);
        Ok(store.snapshot())
    }

    /// Ask `generator` for the classes described by `request`, in the context
    /// of what `store` already holds.
    ///
    /// The store is not modified.
    ///
    /// # Errors
    ///
    /// Returns the generator's error, or [`UmlCanvasError::ModelOutput`]
    /// when the reply is not a usable diagram.
    pub fn generate_draft(
        &self,
        store: &DiagramStore,
        request: &str,
        generator: &dyn DiagramGenerator,
    ) -> Result<DraftDiagram, UmlCanvasError> {
        let prompt = merge::build_context_prompt(store, request);
        debug!(existing = store.shapes().len(); "Requesting generated diagram");

        let reply = generator.generate(&prompt)?;
        trace!(reply = reply.as_str(); "Model reply");

        let draft = umlcanvas_parser::parse_model_output(&reply)?;
        info!(
            classes = draft.classes.len(),
            connections = draft.connections.len();
            "Generated draft parsed"
        );
        Ok(draft)
    }

    /// Generate classes for `request` and merge them into `store`.
    ///
    /// On success the state before the merge (when not yet recorded) and the
    /// merged state are both in the store history, so one undo takes the
    /// generation back. On any error the store and its history are left
    /// exactly as they were.
    pub fn generate(
        &self,
        store: &mut DiagramStore,
        request: &str,
        generator: &dyn DiagramGenerator,
    ) -> Result<MergeReport, UmlCanvasError> {
        let draft = self.generate_draft(store, request, generator)?;
        store.save_state_if_changed();
        let report = merge::merge_draft(store, draft, &self.config.canvas().placement());
        store.save_state();
        Ok(report)
    }

    /// Ask `generator` to transcribe a diagram image.
    ///
    /// A reply that does not parse is not an error; it is returned as
    /// [`ImageTranscription::Raw`].
    pub fn transcribe_image(
        &self,
        image: ImageInput<'_>,
        generator: &dyn DiagramGenerator,
    ) -> Result<ImageTranscription, UmlCanvasError> {
        info!(mime_type = image.mime_type, bytes = image.bytes.len(); "Transcribing diagram image");
        let reply = generator.describe_image(image)?;

        match umlcanvas_parser::parse_model_output(&reply) {
            Ok(draft) => Ok(ImageTranscription::Parsed(draft)),
            Err(err) => {
                warn!(err:err; "Image transcription is not a diagram");
                Ok(ImageTranscription::Raw(reply))
            }
        }
    }

    /// Render a diagram to an SVG string.
    pub fn render_svg(&self, diagram: &Diagram) -> Result<String, UmlCanvasError> {
        info!(classes = diagram.classes.len(); "Rendering diagram");
        let svg = SvgBuilder::new()
            .with_style(self.config.style())
            .build()?
            .render_to_string(diagram);
        info!("SVG rendered successfully");
        Ok(svg)
    }

    /// Generate a Spring Boot project for `diagram` as a zip archive.
    pub fn export_spring_boot(
        &self,
        diagram: &Diagram,
        project_name: &str,
    ) -> Result<Vec<u8>, UmlCanvasError> {
        let bytes = SpringBootExporter::new(self.config.export(), project_name).export_zip(diagram)?;
        info!(project_name, bytes = bytes.len(); "Spring Boot project exported");
        Ok(bytes)
    }
}
