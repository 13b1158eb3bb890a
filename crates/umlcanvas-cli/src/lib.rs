//! CLI logic for the umlcanvas class-diagram tool.
//!
//! [`run`] dispatches a parsed [`Args`] to the matching command. Every
//! command reads plain files and writes plain files; `serve` starts the
//! HTTP service from [`server`].

pub mod error_adapter;
pub mod server;

mod args;
mod config;

pub use args::{Args, Command};

use std::{fs, path::Path};

use log::{info, warn};

use umlcanvas::{
    UmlCanvasError, Workbench,
    config::AppConfig,
    llm::OpenRouterClient,
    semantic::Diagram,
    store::DiagramStore,
};

/// Run the umlcanvas CLI application
///
/// # Errors
///
/// Returns `UmlCanvasError` for:
/// - File I/O errors
/// - Configuration loading errors
/// - Class listing and diagram JSON errors
/// - Language model errors
/// - Export errors
pub fn run(args: &Args) -> Result<(), UmlCanvasError> {
    // Load configuration
    let mut app_config = config::load_config(args.config.as_ref())?;
    config::apply_env_overrides(&mut app_config);

    match &args.command {
        Command::Render { input, output } => render(app_config, input, output),
        Command::Import { input, output } => import(app_config, input, output),
        Command::Generate {
            prompt,
            diagram,
            output,
        } => generate(app_config, prompt, diagram.as_deref(), output),
        Command::Export {
            input,
            output,
            name,
        } => export(app_config, input, output, name.as_deref()),
        Command::Serve { port } => {
            if let Some(port) = port {
                app_config.server_mut().set_port(*port);
            }
            serve(app_config)
        }
    }
}

/// Reads `path` as diagram JSON, or as a class listing for any other
/// extension.
fn read_diagram(workbench: &Workbench, path: &str) -> Result<Diagram, UmlCanvasError> {
    let source = fs::read_to_string(path)?;
    let is_json = Path::new(path)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    if is_json {
        workbench.load_diagram_json(&source)
    } else {
        workbench.import_listing(&source)
    }
}

fn write_json(diagram: &Diagram, output: &str) -> Result<(), UmlCanvasError> {
    let json = serde_json::to_string_pretty(diagram)?;
    fs::write(output, json)?;
    Ok(())
}

fn render(config: AppConfig, input: &str, output: &str) -> Result<(), UmlCanvasError> {
    info!(input_path = input, output_path = output; "Rendering diagram");

    let workbench = Workbench::new(config);
    let diagram = read_diagram(&workbench, input)?;
    let svg = workbench.render_svg(&diagram)?;
    fs::write(output, svg)?;

    info!(output_file = output; "SVG exported successfully");
    Ok(())
}

fn import(config: AppConfig, input: &str, output: &str) -> Result<(), UmlCanvasError> {
    info!(input_path = input, output_path = output; "Importing class listing");

    let workbench = Workbench::new(config);
    let source = fs::read_to_string(input)?;
    let diagram = workbench.import_listing(&source)?;
    write_json(&diagram, output)?;

    info!(classes = diagram.classes.len(), output_file = output; "Diagram written");
    Ok(())
}

fn generate(
    config: AppConfig,
    prompt: &str,
    diagram: Option<&str>,
    output: &str,
) -> Result<(), UmlCanvasError> {
    let client = OpenRouterClient::new(config.llm().clone());
    let workbench = Workbench::new(config);

    let mut store = match diagram {
        Some(path) => DiagramStore::from_diagram(read_diagram(&workbench, path)?),
        None => DiagramStore::new(),
    };

    let report = workbench.generate(&mut store, prompt, &client)?;
    for dropped in &report.dropped_connections {
        warn!(
            from = dropped.from.as_str(),
            to = dropped.to.as_str(),
            reason:% = dropped.reason;
            "Generated connection skipped"
        );
    }

    write_json(&store.snapshot(), output)?;
    info!(
        added_classes = report.added_shapes.len(),
        added_connections = report.added_connections.len(),
        output_file = output;
        "Generated diagram written"
    );
    Ok(())
}

fn export(
    config: AppConfig,
    input: &str,
    output: &str,
    name: Option<&str>,
) -> Result<(), UmlCanvasError> {
    info!(input_path = input, output_path = output; "Exporting Spring Boot project");

    let workbench = Workbench::new(config);
    let diagram = read_diagram(&workbench, input)?;
    let project_name = name
        .map(str::to_string)
        .or_else(|| diagram.name.clone())
        .or_else(|| {
            Path::new(input)
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
        })
        .unwrap_or_else(|| "demo".to_string());

    let bytes = workbench.export_spring_boot(&diagram, &project_name)?;
    fs::write(output, bytes)?;

    info!(output_file = output; "Project exported successfully");
    Ok(())
}

fn serve(config: AppConfig) -> Result<(), UmlCanvasError> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(server::serve(config))
}
