//! Shipyard Engine - value-file templating
//!
//! This crate provides a MiniJinja-based renderer with:
//! - Custom `${{ ... }}` delimiters that leave Helm's `{{ ... }}` untouched
//! - Mustache-like leniency: missing keys render as empty strings
//! - Concurrent, all-or-nothing rendering of value files in place

pub mod engine;
pub mod error;
pub mod renderer;

pub use engine::{Delimiters, Engine, EngineBuilder};
pub use error::{EngineError, Result, TemplateError, TemplateErrorKind};
pub use renderer::ValueFileRenderer;
