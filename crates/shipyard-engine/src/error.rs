//! Engine error types

use miette::{Diagnostic, NamedSource, SourceSpan};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, EngineError>;

/// Main engine error type
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Failed to read value file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write value file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to render value file {path}: {source}")]
    Template {
        path: PathBuf,
        #[source]
        source: TemplateError,
    },

    #[error("Render of {path} did not complete: {message}")]
    Join { path: PathBuf, message: String },

    #[error("Invalid template syntax configuration: {0}")]
    Syntax(String),
}

impl EngineError {
    /// File the error belongs to, if any
    pub fn path(&self) -> Option<&Path> {
        match self {
            EngineError::Read { path, .. }
            | EngineError::Write { path, .. }
            | EngineError::Template { path, .. }
            | EngineError::Join { path, .. } => Some(path),
            EngineError::Syntax(_) => None,
        }
    }
}

/// Error kind for categorizing template errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum TemplateErrorKind {
    UndefinedVariable,
    SyntaxError,
    InvalidOperation,
    Other,
}

/// Template error with source information
#[derive(Error, Debug, Diagnostic, Clone)]
#[error("{message}")]
#[diagnostic(code(shipyard::template::render))]
pub struct TemplateError {
    pub message: String,

    pub kind: TemplateErrorKind,

    #[source_code]
    pub src: NamedSource<String>,

    #[label("error occurred here")]
    pub span: Option<SourceSpan>,
}

impl TemplateError {
    /// Create a template error from a MiniJinja error
    pub fn from_minijinja(err: minijinja::Error, template_name: &str, template_source: &str) -> Self {
        let kind = match err.kind() {
            minijinja::ErrorKind::UndefinedError => TemplateErrorKind::UndefinedVariable,
            minijinja::ErrorKind::SyntaxError => TemplateErrorKind::SyntaxError,
            minijinja::ErrorKind::InvalidOperation => TemplateErrorKind::InvalidOperation,
            _ => TemplateErrorKind::Other,
        };
        let span = err
            .line()
            .and_then(|line| calculate_span(template_source, line));

        Self {
            message: err.to_string(),
            kind,
            src: NamedSource::new(template_name, template_source.to_string()),
            span,
        }
    }
}

/// Span covering a whole (1-based) line
fn calculate_span(source: &str, line_num: usize) -> Option<SourceSpan> {
    let mut offset = 0;

    for (idx, line) in source.lines().enumerate() {
        if idx + 1 == line_num {
            return Some(SourceSpan::new(offset.into(), line.len()));
        }
        offset += line.len() + 1;
    }

    None
}
