//! Template engine based on MiniJinja

use minijinja::syntax::SyntaxConfig;
use minijinja::{AutoEscape, Environment, UndefinedBehavior, Value};
use shipyard_core::TemplateContext;

use crate::error::{EngineError, Result, TemplateError};

/// Delimiter pairs recognised by the engine
///
/// Substitutions use `${{ ... }}` so that `{{ ... }}` expressions meant for
/// Helm pass through untouched. Blocks and comments use `$[% %]` and
/// `$[# #]`, which do not occur in shell or YAML: `${#VAR}` and `${%...}`
/// are ordinary parameter expansions in embedded scripts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delimiters {
    pub variable: (String, String),
    pub block: (String, String),
    pub comment: (String, String),
}

impl Default for Delimiters {
    fn default() -> Self {
        Self {
            variable: ("${{".to_string(), "}}".to_string()),
            block: ("$[%".to_string(), "%]".to_string()),
            comment: ("$[#".to_string(), "#]".to_string()),
        }
    }
}

/// Template engine builder
pub struct EngineBuilder {
    strict_mode: bool,
    delimiters: Delimiters,
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self {
            strict_mode: false,
            delimiters: Delimiters::default(),
        }
    }

    /// Set strict mode (fail on undefined variables)
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict_mode = strict;
        self
    }

    /// Override the delimiter pairs
    pub fn delimiters(mut self, delimiters: Delimiters) -> Self {
        self.delimiters = delimiters;
        self
    }

    /// Build the engine
    pub fn build(self) -> Result<Engine> {
        let syntax = SyntaxConfig::builder()
            .variable_delimiters(
                self.delimiters.variable.0.clone(),
                self.delimiters.variable.1.clone(),
            )
            .block_delimiters(
                self.delimiters.block.0.clone(),
                self.delimiters.block.1.clone(),
            )
            .comment_delimiters(
                self.delimiters.comment.0.clone(),
                self.delimiters.comment.1.clone(),
            )
            .build()
            .map_err(|e| EngineError::Syntax(e.to_string()))?;

        let mut env = Environment::new();
        env.set_syntax(syntax);

        // Missing keys render as empty, like Mustache sections over absent data
        if self.strict_mode {
            env.set_undefined_behavior(UndefinedBehavior::Strict);
        } else {
            env.set_undefined_behavior(UndefinedBehavior::Chainable);
        }

        // Value files are YAML, never HTML
        env.set_auto_escape_callback(|_| AutoEscape::None);
        env.set_keep_trailing_newline(true);

        Ok(Engine { env })
    }
}

/// The template engine
pub struct Engine {
    env: Environment<'static>,
}

impl Engine {
    /// Create a builder
    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    /// Engine with default delimiters and lenient undefined handling
    pub fn lenient() -> Result<Self> {
        EngineBuilder::new().build()
    }

    /// Convert a template context into an engine value
    pub fn context_value(context: &TemplateContext) -> Value {
        Value::from_serialize(context)
    }

    /// Render a single template string
    pub fn render_string(
        &self,
        template: &str,
        context: &Value,
        template_name: &str,
    ) -> std::result::Result<String, TemplateError> {
        self.env
            .render_named_str(template_name, template, context)
            .map_err(|e| TemplateError::from_minijinja(e, template_name, template))
    }
}
