//! Class-diagram model types.
//!
//! # Pipeline Position
//!
//! ```text
//! Editor actions / text listing / LLM output
//!     ↓ parse + normalize (umlcanvas-parser)
//! Drafts (draft) - classes without ids or positions, edges by name
//!     ↓ merge (placement + id resolution)
//! Diagram (element) - shapes with ids and positions, edges by id
//!     ↓ geometry + relationship renderer
//! SVG
//! ```
//!
//! # Organization
//!
//! - [`element`] - [`ClassShape`], [`Field`], [`Method`], [`Parameter`], [`Connection`], [`Diagram`]
//! - [`kind`] - [`RelationKind`] and [`Visibility`]
//! - [`draft`] - [`DraftDiagram`], [`DraftClass`], [`DraftConnection`]
//! - [`table`] - [`TableDiagram`], [`Table`], [`Column`]: table-shaped input

pub mod draft;
pub mod element;
pub mod kind;
pub mod table;

pub use draft::*;
pub use element::*;
pub use kind::*;
pub use table::*;
