//! Diagnostics for the class-listing parser and errors for model output.
//!
//! The listing parser reports problems as [`Diagnostic`]s: a message, an
//! optional [`ErrorCode`], any number of labeled source spans, and help text.
//! All diagnostics of one parse are returned together in a [`ParseError`].
//!
//! Model output (JSON produced by a language model) has no useful source
//! positions, so it fails with the flat [`ModelOutputError`] instead.
//!
//! # Example
//!
//! ```
//! # use umlcanvas_parser::error::{Diagnostic, ErrorCode};
//! # use umlcanvas_parser::Span;
//! let diag = Diagnostic::error("member outside of a class")
//!     .with_code(ErrorCode::E101)
//!     .with_label(Span::new(12..24), "this member has no class")
//!     .with_help("declare a class first, e.g. `class Person`");
//! assert_eq!(diag.labels().len(), 1);
//! ```

mod diagnostic;
mod error_code;
mod label;
mod model_output;
mod parse_error;
mod severity;

pub use diagnostic::Diagnostic;
pub use error_code::ErrorCode;
pub use label::Label;
pub use model_output::ModelOutputError;
pub use parse_error::ParseError;
pub use severity::Severity;
