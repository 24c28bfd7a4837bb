//! Document renderers: pick a template, assemble arguments, render.

use serde_json::Value;
use tracing::{debug, warn};

use medidoc_core::{DocumentType, Grant, TemplateSet, REF_PARAM};

use crate::defaults::{builtin_for, SYSTEM_DEFAULT};
use crate::documents::{DocumentData, HeaderDoc};
use crate::helpers::RenderOptions;
use crate::invoker::{render_or_placeholder, RenderResult};
use crate::tree::RenderNode;

/// Which template a print action uses.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TemplateSelection {
    /// First stored template, else the bundled default.
    #[default]
    Auto,
    /// The bundled default, ignoring stored templates.
    SystemDefault,
    /// A stored template by name; falls back like `Auto` when absent.
    Named(String),
}

impl TemplateSelection {
    /// `None` or `"System Default"` map to the obvious variants.
    pub fn from_name(name: Option<&str>) -> Self {
        match name {
            None => TemplateSelection::Auto,
            Some(n) if n == SYSTEM_DEFAULT => TemplateSelection::SystemDefault,
            Some(n) => TemplateSelection::Named(n.to_string()),
        }
    }
}

/// The template a render will use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTemplate {
    pub name: String,
    pub source: String,
    pub builtin: bool,
}

/// Resolve `selection` for `document` against a hospital's stored templates.
pub fn resolve_template(
    templates: &TemplateSet,
    document: DocumentType,
    selection: &TemplateSelection,
) -> ResolvedTemplate {
    let builtin = || {
        let b = builtin_for(document);
        ResolvedTemplate {
            name: b.name().to_string(),
            source: b.source.to_string(),
            builtin: true,
        }
    };
    let stored = |t: &medidoc_core::Template| ResolvedTemplate {
        name: t.name.clone(),
        source: t.value.clone(),
        builtin: false,
    };

    match selection {
        TemplateSelection::SystemDefault => builtin(),
        TemplateSelection::Named(name) => match templates.find(document, name) {
            Some(t) => stored(t),
            None => {
                warn!(document = %document, template = %name, "template not found; using first available");
                templates.templates(document).first().map(stored).unwrap_or_else(builtin)
            }
        },
        TemplateSelection::Auto => match templates.templates(document).first() {
            Some(t) => stored(t),
            None => {
                debug!(document = %document, "no stored template; using bundled default");
                builtin()
            }
        },
    }
}

/// Lifecycle of one renderer instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderState {
    Unselected,
    TemplateChosen,
    Rendering,
    Rendered,
    RenderFailed,
}

/// Renders one document type for one hospital.
///
/// Every call to [`render`](Self::render) recompiles the chosen template, so
/// edits to the store are picked up on the next render.
pub struct DocumentRenderer<'a> {
    document: DocumentType,
    templates: &'a TemplateSet,
    options: RenderOptions,
    selection: TemplateSelection,
    mount: Option<String>,
    state: RenderState,
    result: Option<RenderResult>,
}

impl<'a> DocumentRenderer<'a> {
    pub fn new(document: DocumentType, templates: &'a TemplateSet, options: RenderOptions) -> Self {
        DocumentRenderer {
            document,
            templates,
            options,
            selection: TemplateSelection::Auto,
            mount: None,
            state: RenderState::Unselected,
            result: None,
        }
    }

    pub fn document(&self) -> DocumentType {
        self.document
    }

    pub fn state(&self) -> RenderState {
        self.state
    }

    /// The last render outcome, if any.
    pub fn result(&self) -> Option<&RenderResult> {
        self.result.as_ref()
    }

    /// Choose the template for subsequent renders.
    pub fn select(&mut self, selection: TemplateSelection) -> &mut Self {
        self.selection = selection;
        self.state = RenderState::TemplateChosen;
        self
    }

    /// Id of the node the document mounts under (`ref`).
    pub fn mount_at(&mut self, handle: impl Into<String>) -> &mut Self {
        self.mount = Some(handle.into());
        self
    }

    /// The template the current selection resolves to.
    pub fn resolved(&self) -> ResolvedTemplate {
        resolve_template(self.templates, self.document, &self.selection)
    }

    /// Render `data`. Failures yield the placeholder; they never propagate.
    pub fn render(&mut self, data: &dyn DocumentData) -> &RenderResult {
        if self.state == RenderState::Unselected {
            self.select(TemplateSelection::Auto);
        }
        self.state = RenderState::Rendering;

        let result = self.render_inner(data);
        self.state = if result.is_rendered() {
            RenderState::Rendered
        } else {
            RenderState::RenderFailed
        };
        self.result.insert(result)
    }

    fn render_inner(&self, data: &dyn DocumentData) -> RenderResult {
        if data.document() != self.document {
            let error = format!(
                "{} renderer was given {} data",
                self.document,
                data.document()
            );
            tracing::error!(document = %self.document, error = %error, "template render failed");
            return RenderResult::Failed {
                placeholder: RenderNode::error_placeholder(self.document),
                error,
            };
        }

        let template = self.resolved();
        debug!(document = %self.document, template = %template.name, builtin = template.builtin, "rendering");

        let contract = self.document.contract();
        let mut args = match data.arguments() {
            Ok(args) => args,
            Err(err) => {
                let error = err.chain();
                tracing::error!(document = %self.document, error = %error, "template render failed");
                return RenderResult::Failed {
                    placeholder: RenderNode::error_placeholder(self.document),
                    error,
                };
            }
        };
        if contract.has_ref() {
            let handle = self
                .mount
                .clone()
                .unwrap_or_else(|| format!("{}-print", self.document.key()));
            args = args.with_value(REF_PARAM, Value::String(handle));
        }
        if contract.grants(Grant::HospitalHeader) {
            args = args.with_header(self.header(data).tree().clone());
        }

        render_or_placeholder(&template.source, self.document, &args, &self.options)
    }

    /// The hospital header, rendered from the same template set.
    fn header(&self, data: &dyn DocumentData) -> RenderResult {
        let header = HeaderDoc {
            hospital_info: data.hospital_info().clone(),
        };
        let mut renderer = DocumentRenderer::new(DocumentType::Header, self.templates, self.options.clone());
        renderer.render(&header).clone()
    }
}

/// One-shot render of `data` with `selection`.
pub fn render_document(
    data: &dyn DocumentData,
    templates: &TemplateSet,
    selection: TemplateSelection,
    options: &RenderOptions,
) -> RenderResult {
    let mut renderer = DocumentRenderer::new(data.document(), templates, options.clone());
    renderer.select(selection);
    renderer.render(data).clone()
}
