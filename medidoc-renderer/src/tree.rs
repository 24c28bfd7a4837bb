//! Render trees: the output of invoking a compiled layout.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use medidoc_core::DocumentType;

/// A node of a rendered document.
///
/// Maps are ordered so two renders of the same input compare equal and
/// serialise identically.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RenderNode {
    Element(Element),
    Text { text: String },
}

/// An element node.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Element {
    pub tag: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attrs: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub style: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<RenderNode>,
}

const VOID_TAGS: &[&str] = &["img", "hr", "br"];
const BLOCK_TAGS: &[&str] = &[
    "div", "p", "h1", "h2", "h3", "h4", "section", "header", "footer", "table", "tr", "li", "hr",
    "br",
];

impl RenderNode {
    pub fn text(text: impl Into<String>) -> Self {
        RenderNode::Text { text: text.into() }
    }

    pub fn element(tag: impl Into<String>, children: Vec<RenderNode>) -> Self {
        RenderNode::Element(Element {
            tag: tag.into(),
            children,
            ..Element::default()
        })
    }

    /// The fixed tree substituted for a document whose template failed.
    pub fn error_placeholder(document: DocumentType) -> Self {
        let mut element = Element {
            tag: "div".to_string(),
            children: vec![RenderNode::text(format!(
                "Error rendering {} template",
                document.label()
            ))],
            ..Element::default()
        };
        element
            .attrs
            .insert("data-error".to_string(), document.key().to_string());
        element.style.insert("color".to_string(), "#b00020".to_string());
        element.style.insert("padding".to_string(), "16px".to_string());
        RenderNode::Element(element)
    }

    /// Every text node, in document order.
    pub fn texts(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_texts(&mut out);
        out
    }

    fn collect_texts<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            RenderNode::Text { text } => out.push(text),
            RenderNode::Element(element) => {
                for child in &element.children {
                    child.collect_texts(out);
                }
            }
        }
    }

    /// Whether any text node contains `needle`.
    pub fn contains_text(&self, needle: &str) -> bool {
        self.texts().iter().any(|t| t.contains(needle))
    }

    /// Serialise as an HTML fragment.
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out);
        out
    }

    fn write_html(&self, out: &mut String) {
        match self {
            RenderNode::Text { text } => out.push_str(&tera::escape_html(text)),
            RenderNode::Element(element) => {
                out.push('<');
                out.push_str(&element.tag);
                for (name, value) in &element.attrs {
                    out.push_str(&format!(" {name}=\"{}\"", tera::escape_html(value)));
                }
                if !element.style.is_empty() {
                    let css: Vec<String> = element
                        .style
                        .iter()
                        .map(|(k, v)| format!("{k}: {v}"))
                        .collect();
                    out.push_str(&format!(" style=\"{}\"", tera::escape_html(&css.join("; "))));
                }
                if VOID_TAGS.contains(&element.tag.as_str()) {
                    out.push_str(" />");
                    return;
                }
                out.push('>');
                for child in &element.children {
                    child.write_html(out);
                }
                out.push_str(&format!("</{}>", element.tag));
            }
        }
    }

    /// Plain-text rendition: block elements start new lines, table cells are
    /// separated by ` | `.
    pub fn to_plain_text(&self) -> String {
        let mut out = String::new();
        self.write_plain(&mut out);
        let lines: Vec<&str> = out
            .lines()
            .map(str::trim_end)
            .filter(|l| !l.trim().is_empty())
            .collect();
        lines.join("\n")
    }

    fn write_plain(&self, out: &mut String) {
        match self {
            RenderNode::Text { text } => out.push_str(text),
            RenderNode::Element(element) => {
                let block = BLOCK_TAGS.contains(&element.tag.as_str());
                if block {
                    out.push('\n');
                }
                for (i, child) in element.children.iter().enumerate() {
                    let is_cell = matches!(
                        child,
                        RenderNode::Element(e) if e.tag == "td" || e.tag == "th"
                    );
                    if is_cell && i > 0 {
                        out.push_str(" | ");
                    }
                    child.write_plain(out);
                }
                if block {
                    out.push('\n');
                }
            }
        }
    }
}
