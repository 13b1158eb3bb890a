//! umlcanvas Core Types and Definitions
//!
//! This crate provides the foundational types shared by every umlcanvas
//! crate. It includes:
//!
//! - **Colors**: Color handling with CSS color support ([`color::Color`])
//! - **Geometry**: Points, sizes, bounds and the shape-boundary resolver ([`geometry`] module)
//! - **Draw**: Strokes, render layers and UML relationship glyphs ([`draw`] module)
//! - **Semantic**: The class-diagram model and its draft form ([`semantic`] module)

pub mod color;
pub mod draw;
pub mod geometry;
pub mod semantic;
