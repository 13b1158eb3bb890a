//! Diagram exporters.
//!
//! - [`svg`] draws a diagram as an SVG document.
//! - [`spring_boot`] generates a Spring Boot Maven project packaged as a zip
//!   archive.

pub mod spring_boot;
pub mod svg;

#[derive(Debug)]
pub enum Error {
    Render(String),
    Io(std::io::Error),
    Archive(zip::result::ZipError),
    /// Nothing in the diagram can be exported.
    Empty,
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Render(msg) => write!(f, "Render error: {msg}"),
            Self::Io(err) => write!(f, "I/O error: {err}"),
            Self::Archive(err) => write!(f, "Archive error: {err}"),
            Self::Empty => write!(f, "The diagram has no classes to export"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Render(_) | Self::Empty => None,
            Self::Io(err) => Some(err),
            Self::Archive(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        Self::Archive(err)
    }
}
