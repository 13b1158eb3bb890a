//! Error types for umlcanvas operations.
//!
//! This module provides the main error type [`UmlCanvasError`] which wraps
//! the failures of parsing, model calls, and export.

use std::io;

use thiserror::Error;

use umlcanvas_parser::error::{ModelOutputError, ParseError};

/// The main error type for umlcanvas operations.
///
/// # Diagnostic Variants
///
/// The `Parse` variant carries the diagnostics of a text listing together
/// with its source, so callers can render span labels.
///
/// `ModelOutput` keeps the raw model reply (see [`ModelOutputError::raw`])
/// so the caller can show what the model actually said.
#[derive(Debug, Error)]
pub enum UmlCanvasError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("{err}")]
    Parse { err: ParseError, src: String },

    #[error("Invalid model output: {0}")]
    ModelOutput(#[from] ModelOutputError),

    #[error("Upstream service returned status {status}")]
    Upstream { status: u16, details: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("The model returned no content")]
    EmptyCompletion { raw: String },

    #[error("Invalid diagram JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Export error: {0}")]
    Export(Box<dyn std::error::Error + Send + Sync>),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<crate::export::Error> for UmlCanvasError {
    fn from(error: crate::export::Error) -> Self {
        Self::Export(Box::new(error))
    }
}

impl UmlCanvasError {
    /// Create a new `Parse` error with the associated source code.
    pub fn new_parse_error(err: ParseError, src: impl Into<String>) -> Self {
        Self::Parse {
            err,
            src: src.into(),
        }
    }

    /// Whether the failure was caused by the caller's input rather than by
    /// this process or an upstream service.
    pub fn is_user_error(&self) -> bool {
        match self {
            Self::Parse { .. } | Self::Json(_) => true,
            Self::Export(err) => matches!(
                err.downcast_ref::<crate::export::Error>(),
                Some(crate::export::Error::Empty)
            ),
            _ => false,
        }
    }
}
