//! Configuration types for umlcanvas.
//!
//! All types implement [`serde::Deserialize`] and fill every missing key
//! with its default, so a configuration file only needs the values it
//! changes.
//!
//! # Overview
//!
//! - [`AppConfig`] - Top-level configuration combining all sections.
//! - [`LlmConfig`] - Chat-completion endpoint, models and sampling.
//! - [`CanvasConfig`] - Canvas size and the placement grid for generated classes.
//! - [`StyleConfig`] - Colors used by the SVG exporter.
//! - [`ServerConfig`] - Address, uploads directory and error verbosity of the HTTP service.
//! - [`ExportConfig`] - Settings of the Spring Boot generator.
//!
//! The API key is never read from a file. The binary takes it from the
//! environment and hands it over with [`LlmConfig::set_api_key`].
//!
//! # Example
//!
//! ```
//! # use umlcanvas::config::AppConfig;
//! let config = AppConfig::default();
//! assert_eq!(config.server().port(), 5000);
//! assert!(config.style().background_color().is_ok());
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

use umlcanvas_core::{color::Color, geometry::Size};

use crate::merge::PlacementConfig;

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    llm: LlmConfig,

    #[serde(default)]
    canvas: CanvasConfig,

    #[serde(default)]
    style: StyleConfig,

    #[serde(default)]
    server: ServerConfig,

    #[serde(default)]
    export: ExportConfig,
}

impl AppConfig {
    pub fn llm(&self) -> &LlmConfig {
        &self.llm
    }

    pub fn llm_mut(&mut self) -> &mut LlmConfig {
        &mut self.llm
    }

    pub fn canvas(&self) -> &CanvasConfig {
        &self.canvas
    }

    pub fn style(&self) -> &StyleConfig {
        &self.style
    }

    pub fn server(&self) -> &ServerConfig {
        &self.server
    }

    pub fn server_mut(&mut self) -> &mut ServerConfig {
        &mut self.server
    }

    pub fn export(&self) -> &ExportConfig {
        &self.export
    }
}

/// Settings of the OpenRouter-compatible chat-completion endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    base_url: String,
    model: String,
    vision_model: String,
    temperature: f32,
    max_tokens: u32,

    #[serde(skip)]
    api_key: Option<String>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://openrouter.ai/api/v1".to_string(),
            model: "deepseek/deepseek-chat".to_string(),
            vision_model: "openai/gpt-4o-mini".to_string(),
            temperature: 0.7,
            max_tokens: 2000,
            api_key: None,
        }
    }
}

impl LlmConfig {
    /// Base URL without the trailing `/chat/completions`.
    pub fn base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Model used for diagram images.
    pub fn vision_model(&self) -> &str {
        &self.vision_model
    }

    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    pub fn max_tokens(&self) -> u32 {
        self.max_tokens
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    pub fn set_api_key(&mut self, api_key: impl Into<String>) {
        self.api_key = Some(api_key.into());
    }
}

/// Canvas dimensions and the grid that places generated classes.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    width: f32,
    columns: usize,
    margin: f32,
    column_spacing: f32,
    row_spacing: f32,
    overlap_width: f32,
    overlap_height: f32,
    max_attempts: usize,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        let placement = PlacementConfig::default();
        Self {
            width: placement.canvas_width,
            columns: placement.columns,
            margin: placement.margin,
            column_spacing: placement.column_spacing,
            row_spacing: placement.row_spacing,
            overlap_width: placement.overlap.width(),
            overlap_height: placement.overlap.height(),
            max_attempts: placement.max_attempts,
        }
    }
}

impl CanvasConfig {
    pub fn width(&self) -> f32 {
        self.width
    }

    /// The placement grid described by this section.
    pub fn placement(&self) -> PlacementConfig {
        PlacementConfig {
            canvas_width: self.width,
            columns: self.columns.max(1),
            margin: self.margin,
            column_spacing: self.column_spacing,
            row_spacing: self.row_spacing,
            overlap: Size::new(self.overlap_width, self.overlap_height),
            max_attempts: self.max_attempts,
        }
    }
}

/// Visual styling of exported diagrams.
///
/// Fields that are not set fall back to renderer defaults.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct StyleConfig {
    #[serde(default)]
    background_color: Option<String>,

    #[serde(default)]
    stroke_color: Option<String>,
}

impl StyleConfig {
    /// Returns the parsed background [`Color`], or `None` if no color is configured.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured color string cannot be parsed.
    pub fn background_color(&self) -> Result<Option<Color>, String> {
        parse_color(self.background_color.as_deref(), "background")
    }

    /// Returns the parsed stroke [`Color`] for boxes and relations.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured color string cannot be parsed.
    pub fn stroke_color(&self) -> Result<Option<Color>, String> {
        parse_color(self.stroke_color.as_deref(), "stroke")
    }
}

fn parse_color(value: Option<&str>, what: &str) -> Result<Option<Color>, String> {
    value
        .map(Color::new)
        .transpose()
        .map_err(|err| format!("Invalid {what} color in config: {err}"))
}

/// HTTP service settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    host: String,
    port: u16,
    uploads_dir: PathBuf,
    debug_errors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            uploads_dir: PathBuf::from("uploads"),
            debug_errors: false,
        }
    }
}

impl ServerConfig {
    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn set_port(&mut self, port: u16) {
        self.port = port;
    }

    pub fn uploads_dir(&self) -> &Path {
        &self.uploads_dir
    }

    pub fn set_uploads_dir(&mut self, dir: impl Into<PathBuf>) {
        self.uploads_dir = dir.into();
    }

    /// Whether 500 responses include the error chain.
    pub fn debug_errors(&self) -> bool {
        self.debug_errors
    }
}

/// Spring Boot generator settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    base_package: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            base_package: "com.example.demo".to_string(),
        }
    }
}

impl ExportConfig {
    pub fn new(base_package: impl Into<String>) -> Self {
        Self {
            base_package: base_package.into(),
        }
    }

    pub fn base_package(&self) -> &str {
        &self.base_package
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.llm().base_url(), "https://openrouter.ai/api/v1");
        assert_eq!(config.llm().model(), "deepseek/deepseek-chat");
        assert_eq!(config.llm().max_tokens(), 2000);
        assert!(config.llm().api_key().is_none());
        assert_eq!(config.canvas().width(), 1200.0);
        assert_eq!(config.export().base_package(), "com.example.demo");
        assert!(!config.server().debug_errors());
    }

    #[test]
    fn test_invalid_color_is_reported() {
        let style = StyleConfig {
            background_color: Some("not-a-color".to_string()),
            stroke_color: None,
        };
        let err = style.background_color().unwrap_err();
        assert!(err.contains("background"));
        assert_eq!(style.stroke_color(), Ok(None));
    }

    #[test]
    fn test_canvas_placement_never_has_zero_columns() {
        let canvas = CanvasConfig {
            columns: 0,
            ..CanvasConfig::default()
        };
        assert_eq!(canvas.placement().columns, 1);
    }

    #[test]
    fn test_trailing_slash_in_base_url() {
        let llm = LlmConfig {
            base_url: "http://localhost:8080/v1/".to_string(),
            ..LlmConfig::default()
        };
        assert_eq!(llm.base_url(), "http://localhost:8080/v1");
    }
}
