//! Template invoker: compile, bind arguments, and contain failures.

use serde::Serialize;
use serde_json::{Map, Value};

use medidoc_core::DocumentType;

use crate::compiler::compile_with_options;
use crate::error::RenderError;
use crate::helpers::RenderOptions;
use crate::tree::RenderNode;

/// Named arguments for one invocation, plus the resolved hospital header.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TemplateArgs {
    values: Map<String, Value>,
    header: Option<RenderNode>,
}

impl TemplateArgs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a named argument.
    pub fn with_value(mut self, name: &str, value: Value) -> Self {
        self.values.insert(name.to_string(), value);
        self
    }

    /// Add a named argument from any serialisable value.
    pub fn insert<T: Serialize>(&mut self, name: &str, value: &T) -> Result<(), RenderError> {
        self.values.insert(name.to_string(), serde_json::to_value(value)?);
        Ok(())
    }

    /// Attach the hospital header tree used by `kind: header` nodes.
    pub fn with_header(mut self, header: RenderNode) -> Self {
        self.header = Some(header);
        self
    }

    pub fn values(&self) -> &Map<String, Value> {
        &self.values
    }

    pub fn header(&self) -> Option<&RenderNode> {
        self.header.as_ref()
    }
}

/// Outcome of rendering one document.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderResult {
    Rendered(RenderNode),
    /// The template failed; `placeholder` is what the user sees.
    Failed { placeholder: RenderNode, error: String },
}

impl RenderResult {
    /// The tree to display: the document or its placeholder.
    pub fn tree(&self) -> &RenderNode {
        match self {
            RenderResult::Rendered(tree) => tree,
            RenderResult::Failed { placeholder, .. } => placeholder,
        }
    }

    pub fn is_rendered(&self) -> bool {
        matches!(self, RenderResult::Rendered(_))
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            RenderResult::Rendered(_) => None,
            RenderResult::Failed { error, .. } => Some(error),
        }
    }
}

/// Compile `source` for `document` and invoke it with `args`.
pub fn invoke(
    source: &str,
    document: DocumentType,
    args: &TemplateArgs,
    options: &RenderOptions,
) -> Result<RenderNode, RenderError> {
    let compiled = compile_with_options(source, &document.contract(), options)?;
    compiled.invoke(args)
}

/// Like [`invoke`], but any failure becomes the document's error placeholder.
///
/// The failure is logged; it never propagates to the caller.
pub fn render_or_placeholder(
    source: &str,
    document: DocumentType,
    args: &TemplateArgs,
    options: &RenderOptions,
) -> RenderResult {
    match invoke(source, document, args, options) {
        Ok(tree) => RenderResult::Rendered(tree),
        Err(err) => {
            let error = err.chain();
            tracing::error!(document = %document, error = %error, "template render failed");
            RenderResult::Failed {
                placeholder: RenderNode::error_placeholder(document),
                error,
            }
        }
    }
}
