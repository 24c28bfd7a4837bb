//! # medidoc-renderer
//!
//! Layout interpreter that turns stored document templates into render trees.
//!
//! A template is a YAML [`layout`] document. It is compiled against the
//! document type's parameter contract ([`compiler`]), invoked with named
//! arguments ([`invoker`]), and any failure is replaced by an error
//! placeholder so one bad template never takes down a print view.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use medidoc_core::{DocumentType, TemplateSet};
//! use medidoc_renderer::{samples, DocumentRenderer, RenderOptions, TemplateSelection};
//!
//! let templates = TemplateSet::default();
//! let data = samples::sample(DocumentType::BillToken);
//!
//! let mut renderer = DocumentRenderer::new(DocumentType::BillToken, &templates, RenderOptions::default());
//! renderer.select(TemplateSelection::Auto).mount_at("token-print");
//! let result = renderer.render(&data);
//! println!("{}", result.tree().to_html());
//! ```

pub mod compiler;
pub mod defaults;
pub mod documents;
pub mod error;
pub mod helpers;
pub mod invoker;
pub mod layout;
pub mod renderer;
pub mod samples;
pub mod tree;

pub use compiler::{compile, compile_with_options, CompiledTemplate};
pub use defaults::{builtin_for, BuiltinTemplate, SYSTEM_DEFAULT};
pub use documents::{AnyDocument, DocumentData};
pub use error::RenderError;
pub use helpers::RenderOptions;
pub use invoker::{invoke, render_or_placeholder, RenderResult, TemplateArgs};
pub use layout::{LayoutDocument, LAYOUT_VERSION};
pub use renderer::{
    render_document, resolve_template, DocumentRenderer, RenderState, ResolvedTemplate,
    TemplateSelection,
};
pub use tree::RenderNode;
