//! Error types for medidoc-renderer.

use thiserror::Error;

use medidoc_core::DocumentType;

/// All errors that can arise while compiling or invoking a layout.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The layout source is not a well-formed layout document.
    #[error("layout syntax error: {0}")]
    Syntax(#[from] serde_yaml::Error),

    /// The layout parsed but uses something the interpreter does not allow.
    #[error("invalid layout: {0}")]
    InvalidLayout(String),

    /// The layout declares a schema version newer than this interpreter.
    #[error("layout version {found} is not supported (max {supported})")]
    UnsupportedVersion { found: u32, supported: u32 },

    /// Layout or arguments disagree with the document's parameter contract.
    #[error("{document} contract mismatch: {reason}")]
    ContractMismatch {
        document: DocumentType,
        reason: String,
    },

    /// Tera snippet failed to parse or evaluate.
    #[error("template engine error: {0}")]
    Tera(#[from] tera::Error),

    /// A field marked `required` resolved to nothing.
    #[error("required field `{path}` has no value")]
    MissingField { path: String },

    /// `each`/`table` pointed at something that is not an array.
    #[error("`{path}` is not a list")]
    NotIterable { path: String },

    /// JSON serialization error (building template arguments).
    #[error("argument serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl RenderError {
    pub(crate) fn contract(document: DocumentType, reason: impl Into<String>) -> Self {
        RenderError::ContractMismatch {
            document,
            reason: reason.into(),
        }
    }

    /// The error and all of its sources, joined with `: `.
    ///
    /// Tera keeps the useful detail (line, missing variable) in the source
    /// chain, so log lines and placeholders use this form.
    pub fn chain(&self) -> String {
        let mut message = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(err) = source {
            let text = err.to_string();
            if !message.ends_with(&text) {
                message.push_str(": ");
                message.push_str(&text);
            }
            source = err.source();
        }
        message
    }
}
