//! Template compiler: layout source + parameter contract → [`CompiledTemplate`].
//!
//! Compilation is the only place a layout is checked:
//!
//! 1. Parse the YAML layout ([`LayoutDocument::parse`]).
//! 2. Check tags, attributes and `class:` names against the fixed vocabulary.
//! 3. Check every data path is rooted at a contract parameter or an
//!    enclosing loop binding, and that `header`/`class:` are granted.
//! 4. Register every Tera snippet on a private Tera instance with the
//!    trusted helpers; snippet syntax errors surface here.
//!
//! A [`CompiledTemplate`] is built per render and dropped afterwards.

use std::borrow::Cow;
use std::collections::BTreeMap;

use serde_json::{Map, Value};
use tera::{Context, Tera};

use medidoc_core::{Grant, ParamKind, ParameterContract, REF_PARAM};

use crate::error::RenderError;
use crate::helpers::{self, RenderOptions};
use crate::invoker::TemplateArgs;
use crate::layout::{
    is_safe_url, Column, FieldFormat, LayoutDocument, Node, Style, ALLOWED_ATTRS, ALLOWED_TAGS,
    URL_ATTRS,
};
use crate::tree::{Element, RenderNode};

// ---------------------------------------------------------------------------
// Compiled form
// ---------------------------------------------------------------------------

/// A snippet registered on the template's Tera instance, with the dotted
/// data paths it reads unguarded.
#[derive(Debug, Clone)]
struct Registered {
    name: String,
    reads: Vec<Vec<String>>,
}

/// Text that is either fixed or a registered Tera snippet.
#[derive(Debug, Clone)]
enum Snippet {
    Literal(String),
    Template(Registered),
}

/// A validated dotted path.
#[derive(Debug, Clone)]
struct FieldPath {
    raw: String,
    root: String,
    rest: Vec<String>,
}

#[derive(Debug, Clone)]
enum Condition {
    /// True when the value at the path has a value.
    Path(FieldPath),
    /// Registered `{% if … %}true{% endif %}` snippet.
    Expr(Registered),
}

#[derive(Debug, Clone)]
struct CompiledColumn {
    header: Snippet,
    style: Style,
    cells: Vec<Op>,
}

#[derive(Debug, Clone)]
enum Op {
    Element {
        tag: String,
        style: Style,
        attrs: Vec<(String, Snippet)>,
        children: Vec<Op>,
    },
    Text(Snippet),
    Field {
        path: FieldPath,
        format: Option<FieldFormat>,
        fallback: String,
        required: bool,
    },
    If {
        condition: Condition,
        then: Vec<Op>,
        otherwise: Vec<Op>,
    },
    Each {
        over: FieldPath,
        binding: String,
        children: Vec<Op>,
    },
    Table {
        rows: FieldPath,
        binding: String,
        style: Style,
        columns: Vec<CompiledColumn>,
        footer: Vec<Op>,
    },
    Header,
}

/// A layout checked against its contract and ready to invoke.
pub struct CompiledTemplate {
    contract: ParameterContract,
    options: RenderOptions,
    tera: Tera,
    body: Vec<Op>,
}

// ---------------------------------------------------------------------------
// Compile
// ---------------------------------------------------------------------------

/// Compile `source` for `contract` with default [`RenderOptions`].
pub fn compile(source: &str, contract: &ParameterContract) -> Result<CompiledTemplate, RenderError> {
    compile_with_options(source, contract, &RenderOptions::default())
}

/// Compile `source` for `contract`.
pub fn compile_with_options(
    source: &str,
    contract: &ParameterContract,
    options: &RenderOptions,
) -> Result<CompiledTemplate, RenderError> {
    let layout = LayoutDocument::parse(source)?;

    let mut builder = Builder {
        contract,
        styles: &layout.styles,
        snippets: Vec::new(),
    };
    let mut scope = Vec::new();
    let body = builder.nodes(&layout.body, &mut scope)?;

    let mut tera = Tera::default();
    tera.autoescape_on(vec![]);
    helpers::register(&mut tera, options);
    tera.add_raw_templates(builder.snippets)?;

    Ok(CompiledTemplate {
        contract: *contract,
        options: options.clone(),
        tera,
        body,
    })
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn looks_like_path(s: &str) -> bool {
    let mut segments = s.trim().split('.');
    match segments.next() {
        Some(root) if is_identifier(root) => {}
        _ => return false,
    }
    segments.all(|seg| !seg.is_empty() && seg.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'))
}

fn has_tera_syntax(text: &str) -> bool {
    text.contains("{{") || text.contains("{%") || text.contains("{#")
}

/// Dotted paths read inside `{{ }}` and `{% %}` tags, skipping string
/// literals, function calls, and reads guarded by `default(...)` or an
/// `is defined` test.
fn snippet_reads(source: &str) -> Vec<Vec<String>> {
    let mut reads: Vec<Vec<String>> = Vec::new();
    let mut rest = source;
    while let Some(start) = rest.find("{{").into_iter().chain(rest.find("{%")).min() {
        let close = if rest[start..].starts_with("{{") { "}}" } else { "%}" };
        let body_start = start + 2;
        let Some(len) = rest[body_start..].find(close) else { break };
        collect_reads(&rest[body_start..body_start + len], &mut reads);
        rest = &rest[body_start + len + 2..];
    }
    reads
}

fn collect_reads(body: &str, reads: &mut Vec<Vec<String>>) {
    let bytes = body.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        let c = bytes[i];
        if c == b'"' || c == b'\'' || c == b'`' {
            i = body[i + 1..].find(c as char).map_or(bytes.len(), |end| i + end + 2);
            continue;
        }
        if !(c.is_ascii_alphabetic() || c == b'_') {
            i += 1;
            continue;
        }
        let start = i;
        while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_' || bytes[i] == b'.') {
            i += 1;
        }
        let token = body[start..i].trim_end_matches('.');
        if !token.contains('.') || is_guarded(body[i..].trim_start()) {
            continue;
        }
        let path: Vec<String> = token.split('.').map(str::to_string).collect();
        if path.iter().all(|seg| !seg.is_empty()) && !reads.contains(&path) {
            reads.push(path);
        }
    }
}

fn is_guarded(after: &str) -> bool {
    if after.starts_with('(') {
        return true;
    }
    if let Some(filter) = after.strip_prefix('|') {
        return filter.trim_start().starts_with("default");
    }
    match after.strip_prefix("is ") {
        Some(test) => {
            let test = test.trim_start();
            let test = test.strip_prefix("not ").map_or(test, str::trim_start);
            test.starts_with("defined") || test.starts_with("undefined")
        }
        None => false,
    }
}

struct Builder<'a> {
    contract: &'a ParameterContract,
    styles: &'a BTreeMap<String, Style>,
    snippets: Vec<(String, String)>,
}

impl Builder<'_> {
    fn invalid(&self, message: impl Into<String>) -> RenderError {
        RenderError::InvalidLayout(message.into())
    }

    fn nodes(&mut self, nodes: &[Node], scope: &mut Vec<String>) -> Result<Vec<Op>, RenderError> {
        nodes.iter().map(|n| self.node(n, scope)).collect()
    }

    fn node(&mut self, node: &Node, scope: &mut Vec<String>) -> Result<Op, RenderError> {
        match node {
            Node::Element { tag, class, style, attrs, children } => {
                if !ALLOWED_TAGS.contains(&tag.as_str()) {
                    return Err(self.invalid(format!("tag `{tag}` is not allowed")));
                }
                let style = self.style(class.as_deref(), style)?;
                let mut compiled_attrs = Vec::with_capacity(attrs.len());
                for (name, value) in attrs {
                    if !ALLOWED_ATTRS.contains(&name.as_str()) {
                        return Err(self.invalid(format!("attribute `{name}` is not allowed")));
                    }
                    let snippet = self.snippet(value);
                    if let Snippet::Literal(url) = &snippet {
                        if URL_ATTRS.contains(&name.as_str()) && !is_safe_url(url) {
                            return Err(self.invalid(format!(
                                "`{name}` URL `{url}` uses a disallowed scheme"
                            )));
                        }
                    }
                    compiled_attrs.push((name.clone(), snippet));
                }
                Ok(Op::Element {
                    tag: tag.clone(),
                    style,
                    attrs: compiled_attrs,
                    children: self.nodes(children, scope)?,
                })
            }
            Node::Text { text } => Ok(Op::Text(self.snippet(text))),
            Node::Field { path, format, fallback, required } => Ok(Op::Field {
                path: self.path(path, scope)?,
                format: *format,
                fallback: fallback.clone(),
                required: *required,
            }),
            Node::If { when, then, otherwise } => Ok(Op::If {
                condition: self.condition(when, scope)?,
                then: self.nodes(then, scope)?,
                otherwise: self.nodes(otherwise, scope)?,
            }),
            Node::Each { over, binding, children } => {
                let over = self.path(over, scope)?;
                let children = self.scoped(binding, scope, |b, scope| b.nodes(children, scope))?;
                Ok(Op::Each { over, binding: binding.clone(), children })
            }
            Node::Table { rows, binding, columns, class, style, footer } => {
                if columns.is_empty() {
                    return Err(self.invalid("table needs at least one column"));
                }
                let rows = self.path(rows, scope)?;
                let style = self.style(class.as_deref(), style)?;
                let mut compiled = Vec::with_capacity(columns.len());
                for column in columns {
                    let header = self.snippet(&column.header);
                    let cells = self.scoped(binding, scope, |b, scope| b.cells(column, scope))?;
                    compiled.push(CompiledColumn {
                        header,
                        style: column.style.clone(),
                        cells,
                    });
                }
                Ok(Op::Table {
                    rows,
                    binding: binding.clone(),
                    style,
                    columns: compiled,
                    footer: self.nodes(footer, scope)?,
                })
            }
            Node::Header => {
                if !self.contract.grants(Grant::HospitalHeader) {
                    return Err(RenderError::contract(
                        self.contract.document,
                        "`header` is not available to this document",
                    ));
                }
                Ok(Op::Header)
            }
        }
    }

    fn cells(&mut self, column: &Column, scope: &mut Vec<String>) -> Result<Vec<Op>, RenderError> {
        let mut ops = Vec::new();
        if let Some(field) = &column.field {
            ops.push(Op::Field {
                path: self.path(field, scope)?,
                format: column.format,
                fallback: String::new(),
                required: false,
            });
        }
        ops.extend(self.nodes(&column.cells, scope)?);
        Ok(ops)
    }

    /// Run `f` with `binding` (and `<binding>_index`) in scope.
    fn scoped<T>(
        &mut self,
        binding: &str,
        scope: &mut Vec<String>,
        f: impl FnOnce(&mut Self, &mut Vec<String>) -> Result<T, RenderError>,
    ) -> Result<T, RenderError> {
        if !is_identifier(binding) {
            return Err(self.invalid(format!("`{binding}` is not a valid loop name")));
        }
        if self.contract.param(binding).is_some() {
            return Err(self.invalid(format!("loop name `{binding}` shadows a parameter")));
        }
        scope.push(binding.to_string());
        scope.push(format!("{binding}_index"));
        let result = f(self, scope);
        scope.truncate(scope.len() - 2);
        result
    }

    fn path(&self, raw: &str, scope: &[String]) -> Result<FieldPath, RenderError> {
        if !looks_like_path(raw) {
            return Err(self.invalid(format!("`{raw}` is not a field path")));
        }
        let mut segments = raw.trim().split('.').map(str::to_string);
        let root = segments.next().unwrap_or_default();
        if self.contract.param(&root).is_none() && !scope.contains(&root) {
            return Err(RenderError::contract(
                self.contract.document,
                format!(
                    "`{raw}` refers to `{root}`, expected one of: {}",
                    self.contract.names().join(", ")
                ),
            ));
        }
        Ok(FieldPath {
            raw: raw.trim().to_string(),
            root,
            rest: segments.collect(),
        })
    }

    fn condition(&mut self, when: &str, scope: &[String]) -> Result<Condition, RenderError> {
        if looks_like_path(when) {
            return Ok(Condition::Path(self.path(when, scope)?));
        }
        Ok(Condition::Expr(self.register(format!("{{% if {when} %}}true{{% endif %}}"))))
    }

    fn snippet(&mut self, text: &str) -> Snippet {
        if has_tera_syntax(text) {
            Snippet::Template(self.register(text.to_string()))
        } else {
            Snippet::Literal(text.to_string())
        }
    }

    fn register(&mut self, source: String) -> Registered {
        let name = format!("snippet_{}", self.snippets.len());
        let reads = snippet_reads(&source);
        self.snippets.push((name.clone(), source));
        Registered { name, reads }
    }

    /// Named class first, inline properties override.
    fn style(&self, class: Option<&str>, inline: &Style) -> Result<Style, RenderError> {
        let mut style = Style::new();
        if let Some(class) = class {
            if !self.contract.grants(Grant::Styles) {
                return Err(RenderError::contract(
                    self.contract.document,
                    "`class` needs named styles, which this document does not use",
                ));
            }
            let named = self
                .styles
                .get(class)
                .ok_or_else(|| self.invalid(format!("style `{class}` is not defined")))?;
            style.extend(named.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        style.extend(inline.iter().map(|(k, v)| (k.clone(), v.clone())));
        Ok(style)
    }
}

// ---------------------------------------------------------------------------
// Invoke
// ---------------------------------------------------------------------------

/// Values visible to one level of the tree: the JSON scope used by field
/// paths and the equivalent Tera context used by snippets.
#[derive(Clone)]
struct Frame {
    values: Map<String, Value>,
    context: Context,
}

impl Frame {
    fn with_binding(&self, binding: &str, item: &Value, index: usize) -> Frame {
        let mut frame = self.clone();
        let index_key = format!("{binding}_index");
        frame.values.insert(binding.to_string(), item.clone());
        frame.values.insert(index_key.clone(), Value::from(index));
        frame.context.insert(binding, item);
        frame.context.insert(index_key, &index);
        frame
    }

    fn resolve(&self, path: &FieldPath) -> Option<&Value> {
        self.values
            .get(&path.root)
            .and_then(|root| helpers::lookup(root, &path.rest))
    }

    /// Context for `snippet`: paths it reads under a bound name that are
    /// absent from the data are present as null, so they render empty.
    /// Unbound names stay undefined and still fail.
    fn snippet_context<'a>(&self, snippet: &'a Registered) -> Cow<'_, Context> {
        let mut patched: BTreeMap<&'a str, Value> = BTreeMap::new();
        for path in &snippet.reads {
            let Some((root, rest)) = path.split_first() else { continue };
            let current = match patched.get(root.as_str()).or_else(|| self.values.get(root)) {
                Some(value) => value,
                None => continue,
            };
            if helpers::lookup(current, rest).is_some() {
                continue;
            }
            let mut value = current.clone();
            if fill_null(&mut value, rest) {
                patched.insert(root.as_str(), value);
            }
        }
        if patched.is_empty() {
            return Cow::Borrowed(&self.context);
        }
        let mut context = self.context.clone();
        for (root, value) in patched {
            context.insert(root, &value);
        }
        Cow::Owned(context)
    }
}

/// Create `rest` under `value` as nested objects ending in null. Returns
/// false when a step runs into a non-object.
fn fill_null(value: &mut Value, rest: &[String]) -> bool {
    let Some((head, tail)) = rest.split_first() else { return false };
    if value.is_null() {
        *value = Value::Object(Map::new());
    }
    let Value::Object(map) = value else { return false };
    let entry = map.entry(head.clone()).or_insert(Value::Null);
    tail.is_empty() || fill_null(entry, tail)
}

impl CompiledTemplate {
    /// The contract this template was compiled against.
    pub fn contract(&self) -> &ParameterContract {
        &self.contract
    }

    /// Evaluate the layout with `args`.
    ///
    /// Arguments are checked against the contract first; a mismatch is
    /// reported as [`RenderError::ContractMismatch`] before anything renders.
    pub fn invoke(&self, args: &TemplateArgs) -> Result<RenderNode, RenderError> {
        let values = self.bind(args)?;
        let context = Context::from_serialize(&values)?;
        let frame = Frame { values, context };

        let mut root = Element {
            tag: "div".to_string(),
            ..Element::default()
        };
        root.attrs
            .insert("data-document".to_string(), self.contract.document.key().to_string());
        if let Some(Value::String(handle)) = frame.values.get(REF_PARAM) {
            root.attrs.insert("id".to_string(), handle.clone());
        }
        root.children = self.eval_all(&self.body, &frame, args)?;
        Ok(RenderNode::Element(root))
    }

    fn bind(&self, args: &TemplateArgs) -> Result<Map<String, Value>, RenderError> {
        let document = self.contract.document;
        for name in args.values().keys() {
            if self.contract.param(name).is_none() {
                return Err(RenderError::contract(
                    document,
                    format!("unexpected argument `{name}`"),
                ));
            }
        }

        let mut values = Map::new();
        for param in self.contract.params {
            let supplied = args.values().get(param.name);
            let value = match (param.kind, supplied) {
                (ParamKind::OutputHandle, None) => {
                    Value::String(format!("{}-print", document.key()))
                }
                (ParamKind::OutputHandle, Some(v @ Value::String(_)))
                | (ParamKind::Object, Some(v @ Value::Object(_)))
                | (ParamKind::Array, Some(v @ Value::Array(_))) => v.clone(),
                (_, None) => {
                    return Err(RenderError::contract(
                        document,
                        format!("missing argument `{}`", param.name),
                    ))
                }
                (kind, Some(other)) => {
                    return Err(RenderError::contract(
                        document,
                        format!(
                            "`{}` must be {}, got {}",
                            param.name,
                            kind_name(kind),
                            json_type(other)
                        ),
                    ))
                }
            };
            values.insert(param.name.to_string(), value);
        }
        Ok(values)
    }

    fn eval_all(
        &self,
        ops: &[Op],
        frame: &Frame,
        args: &TemplateArgs,
    ) -> Result<Vec<RenderNode>, RenderError> {
        let mut out = Vec::new();
        for op in ops {
            self.eval(op, frame, args, &mut out)?;
        }
        Ok(out)
    }

    fn eval(
        &self,
        op: &Op,
        frame: &Frame,
        args: &TemplateArgs,
        out: &mut Vec<RenderNode>,
    ) -> Result<(), RenderError> {
        match op {
            Op::Element { tag, style, attrs, children } => {
                let mut element = Element {
                    tag: tag.clone(),
                    style: style.clone(),
                    ..Element::default()
                };
                for (name, value) in attrs {
                    let text = self.text(value, frame)?;
                    if URL_ATTRS.contains(&name.as_str()) && !is_safe_url(&text) {
                        tracing::warn!(
                            document = %self.contract.document,
                            attr = %name,
                            "dropping URL with a disallowed scheme"
                        );
                        continue;
                    }
                    element.attrs.insert(name.clone(), text);
                }
                element.children = self.eval_all(children, frame, args)?;
                out.push(RenderNode::Element(element));
            }
            Op::Text(snippet) => {
                let text = self.text(snippet, frame)?;
                if !text.is_empty() {
                    out.push(RenderNode::text(text));
                }
            }
            Op::Field { path, format, fallback, required } => {
                let text = match frame.resolve(path).filter(|v| helpers::has_value(v)) {
                    Some(value) => helpers::apply_format(value, *format, &self.options),
                    None if *required => {
                        return Err(RenderError::MissingField { path: path.raw.clone() })
                    }
                    None => fallback.clone(),
                };
                if !text.is_empty() {
                    out.push(RenderNode::text(text));
                }
            }
            Op::If { condition, then, otherwise } => {
                let branch = if self.holds(condition, frame)? { then } else { otherwise };
                out.extend(self.eval_all(branch, frame, args)?);
            }
            Op::Each { over, binding, children } => {
                for (i, item) in self.items(over, frame)?.iter().enumerate() {
                    let inner = frame.with_binding(binding, item, i + 1);
                    out.extend(self.eval_all(children, &inner, args)?);
                }
            }
            Op::Table { rows, binding, style, columns, footer } => {
                out.push(self.table(rows, binding, style, columns, footer, frame, args)?);
            }
            Op::Header => match args.header() {
                Some(header) => out.push(header.clone()),
                None => {
                    return Err(RenderError::contract(
                        self.contract.document,
                        "layout uses `header` but no hospital header was supplied",
                    ))
                }
            },
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn table(
        &self,
        rows: &FieldPath,
        binding: &str,
        style: &Style,
        columns: &[CompiledColumn],
        footer: &[Op],
        frame: &Frame,
        args: &TemplateArgs,
    ) -> Result<RenderNode, RenderError> {
        let mut header_cells = Vec::with_capacity(columns.len());
        for column in columns {
            let mut th = Element {
                tag: "th".to_string(),
                style: column.style.clone(),
                ..Element::default()
            };
            let text = self.text(&column.header, frame)?;
            if !text.is_empty() {
                th.children.push(RenderNode::text(text));
            }
            header_cells.push(RenderNode::Element(th));
        }

        let mut body_rows = Vec::new();
        for (i, item) in self.items(rows, frame)?.iter().enumerate() {
            let inner = frame.with_binding(binding, item, i + 1);
            let mut cells = Vec::with_capacity(columns.len());
            for column in columns {
                cells.push(RenderNode::Element(Element {
                    tag: "td".to_string(),
                    style: column.style.clone(),
                    children: self.eval_all(&column.cells, &inner, args)?,
                    ..Element::default()
                }));
            }
            body_rows.push(RenderNode::element("tr", cells));
        }

        let mut sections = vec![
            RenderNode::element("thead", vec![RenderNode::element("tr", header_cells)]),
            RenderNode::element("tbody", body_rows),
        ];
        let footer = self.eval_all(footer, frame, args)?;
        if !footer.is_empty() {
            sections.push(RenderNode::element("tfoot", footer));
        }

        Ok(RenderNode::Element(Element {
            tag: "table".to_string(),
            style: style.clone(),
            children: sections,
            ..Element::default()
        }))
    }

    fn text(&self, snippet: &Snippet, frame: &Frame) -> Result<String, RenderError> {
        match snippet {
            Snippet::Literal(text) => Ok(text.clone()),
            Snippet::Template(snippet) => {
                Ok(self.tera.render(&snippet.name, &frame.snippet_context(snippet))?)
            }
        }
    }

    fn holds(&self, condition: &Condition, frame: &Frame) -> Result<bool, RenderError> {
        match condition {
            Condition::Path(path) => Ok(frame.resolve(path).map(helpers::has_value).unwrap_or(false)),
            Condition::Expr(snippet) => {
                Ok(self.tera.render(&snippet.name, &frame.snippet_context(snippet))?.trim() == "true")
            }
        }
    }

    /// Items of the array at `path`. Absent or null means no items.
    fn items(&self, path: &FieldPath, frame: &Frame) -> Result<Vec<Value>, RenderError> {
        match frame.resolve(path) {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(Value::Array(items)) => Ok(items.clone()),
            Some(_) => Err(RenderError::NotIterable { path: path.raw.clone() }),
        }
    }
}

fn kind_name(kind: ParamKind) -> &'static str {
    match kind {
        ParamKind::Object => "an object",
        ParamKind::Array => "a list",
        ParamKind::OutputHandle => "a string",
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
