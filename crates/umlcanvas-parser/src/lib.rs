//! Parsers that turn external text into umlcanvas diagram drafts.
//!
//! Two inputs are supported:
//!
//! - **Model output**: the text reply of a language model asked for a class
//!   diagram. [`parse_model_output`] strips markdown fences, finds the JSON
//!   object, and [`normalize`] maps the many field spellings models use onto
//!   a strict [`DraftDiagram`](umlcanvas_core::semantic::DraftDiagram).
//! - **Class listings**: a plain-text notation, parsed by [`parse_listing`]
//!   with span-accurate [`Diagnostic`](error::Diagnostic)s.
//!
//! ```text
//! class Person {
//!   fields:
//!   - id: int
//!   + name: String
//!   methods:
//!   + greet(other: Person): void
//! }
//!
//! class Student
//! + enrollment: String
//!
//! Student -> Person : generalization
//! ```

pub mod error;
mod listing;
mod model_output;
mod normalize;
mod span;

pub use listing::parse_listing;
pub use model_output::{extract_balanced_object, parse_model_json, parse_model_output, strip_code_fences};
pub use normalize::normalize;
pub use span::Span;
