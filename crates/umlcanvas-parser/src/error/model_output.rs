use thiserror::Error;

/// Failure to turn a model's text reply into a diagram draft.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelOutputError {
    /// Neither the reply nor any `{...}` block inside it is valid JSON.
    #[error("model output is not valid JSON")]
    InvalidJson { raw: String },

    /// The reply is JSON but not an object.
    #[error("model output is not a JSON object")]
    NotAnObject { raw: String },

    /// The reply parsed but contains no classes under any accepted key.
    #[error("model output contains no classes")]
    NoClasses,
}

impl ModelOutputError {
    /// The offending text, when there is one.
    pub fn raw(&self) -> Option<&str> {
        match self {
            Self::InvalidJson { raw } | Self::NotAnObject { raw } => Some(raw),
            Self::NoClasses => None,
        }
    }
}
