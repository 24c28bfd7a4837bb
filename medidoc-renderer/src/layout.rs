//! Layout documents: the stored form of a template.
//!
//! A layout is YAML describing a tree of tagged nodes. Text is written as
//! Tera snippets; data is reached through dotted paths rooted at a contract
//! parameter or a loop binding. The vocabulary is closed: unknown node kinds,
//! tags, and attributes are rejected when the layout is compiled.
//!
//! ```yaml
//! version: 1
//! styles:
//!   title: { font-weight: bold, text-align: center }
//! body:
//!   - kind: element
//!     tag: div
//!     class: title
//!     children:
//!       - kind: text
//!         text: "Invoice {{ patientData.bill.invoiceNumber }}"
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::RenderError;

/// Newest layout schema version this interpreter understands.
pub const LAYOUT_VERSION: u32 = 1;

/// CSS-like property map (`font-size: 12px`).
pub type Style = BTreeMap<String, String>;

/// Tags a layout may create.
pub const ALLOWED_TAGS: &[&str] = &[
    "div", "span", "p", "h1", "h2", "h3", "h4", "strong", "em", "small", "section", "header",
    "footer", "table", "thead", "tbody", "tfoot", "tr", "th", "td", "ul", "ol", "li", "img", "hr",
    "br",
];

/// Attributes a layout may set. Values are snippets.
pub const ALLOWED_ATTRS: &[&str] = &["id", "src", "alt", "colspan", "rowspan", "width", "height"];

/// Attributes whose value is a URL and must pass [`is_safe_url`].
pub const URL_ATTRS: &[&str] = &["src"];

/// Relative paths, `http(s):` and `data:image/...` URLs. Whitespace and
/// control characters are ignored when reading the scheme.
pub fn is_safe_url(url: &str) -> bool {
    let cleaned: String = url
        .chars()
        .filter(|c| !c.is_ascii_whitespace() && !c.is_ascii_control())
        .collect::<String>()
        .to_ascii_lowercase();
    let scheme_end = match cleaned.find(':') {
        Some(i) if !cleaned[..i].contains(['/', '?', '#']) => i,
        _ => return true,
    };
    match &cleaned[..scheme_end] {
        "http" | "https" => true,
        "data" => cleaned[scheme_end + 1..].starts_with("image/"),
        _ => false,
    }
}

/// A parsed layout document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LayoutDocument {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub styles: BTreeMap<String, Style>,
    #[serde(default)]
    pub body: Vec<Node>,
}

fn default_version() -> u32 {
    LAYOUT_VERSION
}

/// One node of a layout tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", deny_unknown_fields)]
pub enum Node {
    /// A primitive element with optional named class, inline style and children.
    Element {
        tag: String,
        #[serde(default)]
        class: Option<String>,
        #[serde(default)]
        style: Style,
        #[serde(default)]
        attrs: BTreeMap<String, String>,
        #[serde(default)]
        children: Vec<Node>,
    },
    /// A Tera snippet rendered to plain text.
    Text { text: String },
    /// A direct reference to a data field.
    Field {
        path: String,
        #[serde(default)]
        format: Option<FieldFormat>,
        #[serde(default)]
        fallback: String,
        #[serde(default)]
        required: bool,
    },
    /// Render `then` when `when` holds, `else` otherwise.
    ///
    /// `when` is either a dotted path (true when the value is present and
    /// non-empty) or a Tera expression.
    If {
        when: String,
        #[serde(default)]
        then: Vec<Node>,
        #[serde(default, rename = "else")]
        otherwise: Vec<Node>,
    },
    /// Repeat `children` for every item of the array at `over`.
    Each {
        over: String,
        #[serde(rename = "as")]
        binding: String,
        #[serde(default)]
        children: Vec<Node>,
    },
    /// A table with one body row per item of the array at `rows`.
    Table {
        rows: String,
        #[serde(rename = "as")]
        binding: String,
        columns: Vec<Column>,
        #[serde(default)]
        class: Option<String>,
        #[serde(default)]
        style: Style,
        #[serde(default)]
        footer: Vec<Node>,
    },
    /// The hospital header sub-component.
    Header,
}

/// A table column: header text plus the cell content for each row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Column {
    pub header: String,
    /// Shorthand for a single `field` cell.
    #[serde(default)]
    pub field: Option<String>,
    #[serde(default)]
    pub format: Option<FieldFormat>,
    #[serde(default)]
    pub cells: Vec<Node>,
    #[serde(default)]
    pub style: Style,
}

/// Display formats for `field` nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldFormat {
    Date,
    Datetime,
    Money,
    Age,
    Upper,
    Lower,
}

impl LayoutDocument {
    /// Parse layout source. Only syntax is checked here; the compiler checks
    /// tags, contracts and snippets.
    pub fn parse(source: &str) -> Result<Self, RenderError> {
        let document: LayoutDocument = serde_yaml::from_str(source)?;
        if document.version > LAYOUT_VERSION {
            return Err(RenderError::UnsupportedVersion {
                found: document.version,
                supported: LAYOUT_VERSION,
            });
        }
        Ok(document)
    }
}
