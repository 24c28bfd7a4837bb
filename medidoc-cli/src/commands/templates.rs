//! `medidoc templates list|add|edit|delete|check`

use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::{Args, Subcommand};
use tabled::{settings::Style, Table, Tabled};
use tracing::warn;

use medidoc_core::{
    store::{self, TemplateDelete, TemplateEdit},
    DocumentType, Template, TemplateSet,
};
use medidoc_renderer::{
    compile_with_options, render_document, samples, RenderOptions, TemplateSelection,
    SYSTEM_DEFAULT,
};

use super::{format_tree, home_dir, read_layout, resolve_hospital, settings};
use crate::{DocumentTypeArg, OutputFormat};

const CANDIDATE: &str = "candidate";

/// Manage a hospital's stored templates.
#[derive(Subcommand, Debug)]
pub enum TemplatesCommand {
    /// List stored templates per document type.
    List(ListArgs),

    /// Add a named template, or replace the one with the same name.
    Add(AddArgs),

    /// Replace the template at an index.
    Edit(EditArgs),

    /// Delete the template at an index.
    Delete(DeleteArgs),

    /// Compile a layout and render it with sample data, without storing it.
    Check(CheckArgs),
}

#[derive(Args, Debug)]
pub struct ListArgs {
    #[arg(long)]
    pub hospital: Option<String>,

    /// Only show one document type.
    #[arg(long = "type", short = 't', value_name = "TYPE")]
    pub document: Option<DocumentTypeArg>,
}

#[derive(Args, Debug)]
pub struct AddArgs {
    /// Document type (e.g. bill, lab-report, bill-token).
    pub document: DocumentTypeArg,

    /// Template name shown in the print dialog.
    pub name: String,

    /// Layout file (YAML).
    #[arg(long, short = 'f')]
    pub file: PathBuf,

    #[arg(long)]
    pub hospital: Option<String>,

    /// Store even if the layout does not compile.
    #[arg(long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct EditArgs {
    pub document: DocumentTypeArg,

    /// Position as shown by `medidoc templates list`.
    pub index: usize,

    #[arg(long, short = 'f')]
    pub file: PathBuf,

    /// New name. Defaults to the current name.
    #[arg(long)]
    pub name: Option<String>,

    #[arg(long)]
    pub hospital: Option<String>,

    #[arg(long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct DeleteArgs {
    pub document: DocumentTypeArg,

    pub index: usize,

    #[arg(long)]
    pub hospital: Option<String>,
}

#[derive(Args, Debug)]
pub struct CheckArgs {
    pub document: DocumentTypeArg,

    #[arg(long, short = 'f')]
    pub file: PathBuf,

    /// Print the sample render in this format.
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,
}

pub fn run(cmd: TemplatesCommand) -> Result<()> {
    match cmd {
        TemplatesCommand::List(args) => list(args),
        TemplatesCommand::Add(args) => add(args),
        TemplatesCommand::Edit(args) => edit(args),
        TemplatesCommand::Delete(args) => delete(args),
        TemplatesCommand::Check(args) => check(args),
    }
}

#[derive(Tabled)]
struct TemplateRow {
    #[tabled(rename = "type")]
    document: String,
    #[tabled(rename = "#")]
    index: String,
    #[tabled(rename = "name")]
    name: String,
    #[tabled(rename = "updated")]
    updated: String,
}

fn list(args: ListArgs) -> Result<()> {
    let home = home_dir()?;
    let hospital = resolve_hospital(&home, args.hospital)?;
    let set = store::fetch_templates_at(&home, &hospital)
        .with_context(|| format!("failed to load templates for '{hospital}'"))?;

    let documents: Vec<DocumentType> = match args.document {
        Some(d) => vec![d.into()],
        None => DocumentType::all().to_vec(),
    };

    let mut rows = Vec::new();
    for document in documents {
        let stored = set.templates(document);
        if stored.is_empty() {
            rows.push(TemplateRow {
                document: document.to_string(),
                index: "-".into(),
                name: format!("{SYSTEM_DEFAULT} (bundled)"),
                updated: String::new(),
            });
            continue;
        }
        for (i, template) in stored.iter().enumerate() {
            rows.push(TemplateRow {
                document: document.to_string(),
                index: i.to_string(),
                name: template.name.clone(),
                updated: template
                    .updated_at
                    .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_default(),
            });
        }
    }

    println!("Templates for '{hospital}'");
    println!("{}", Table::new(rows).with(Style::rounded()));
    Ok(())
}

/// Compile `source` for `document`, unless `force` is set.
fn validate(document: DocumentType, source: &str, options: &RenderOptions, force: bool) -> Result<()> {
    match compile_with_options(source, &document.contract(), options) {
        Ok(_) => Ok(()),
        Err(e) if force => {
            warn!(
                document = %document,
                error = %e.chain(),
                "layout does not compile; storing anyway"
            );
            Ok(())
        }
        Err(e) => Err(anyhow!("{}", e.chain())).context(format!(
            "layout does not compile as a {} template (use --force to store it anyway)",
            document.label()
        )),
    }
}

fn add(args: AddArgs) -> Result<()> {
    let home = home_dir()?;
    let hospital = resolve_hospital(&home, args.hospital)?;
    let document: DocumentType = args.document.into();
    let source = read_layout(&args.file)?;
    let options = RenderOptions::from(&settings(&home)?);
    validate(document, &source, &options, args.force)?;

    let index = store::upsert_template_at(&home, &hospital, document, Template::new(args.name.clone(), source))
        .with_context(|| format!("failed to save template for '{hospital}'"))?;
    println!("✓ Saved '{}' as {} template #{index} for '{hospital}'", args.name, document);
    Ok(())
}

fn edit(args: EditArgs) -> Result<()> {
    let home = home_dir()?;
    let hospital = resolve_hospital(&home, args.hospital)?;
    let document: DocumentType = args.document.into();
    let source = read_layout(&args.file)?;
    let options = RenderOptions::from(&settings(&home)?);
    validate(document, &source, &options, args.force)?;

    let name = match args.name {
        Some(name) => name,
        None => store::fetch_templates_at(&home, &hospital)?
            .templates(document)
            .get(args.index)
            .map(|t| t.name.clone())
            .with_context(|| format!("no {document} template at index {}", args.index))?,
    };

    store::edit_template_at(
        &home,
        &hospital,
        TemplateEdit {
            field: document,
            index: args.index,
            template: Template::new(name.clone(), source),
        },
    )
    .with_context(|| format!("failed to edit template for '{hospital}'"))?;
    println!("✓ Updated {document} template #{} ('{name}')", args.index);
    Ok(())
}

fn delete(args: DeleteArgs) -> Result<()> {
    let home = home_dir()?;
    let hospital = resolve_hospital(&home, args.hospital)?;
    let document: DocumentType = args.document.into();

    let set = store::delete_template_at(
        &home,
        &hospital,
        TemplateDelete {
            field: document,
            index: args.index,
        },
    )
    .with_context(|| format!("failed to delete template for '{hospital}'"))?;

    println!("✓ Deleted {document} template #{}", args.index);
    if set.templates(document).is_empty() {
        println!("  {document} now uses the bundled default");
    }
    Ok(())
}

fn check(args: CheckArgs) -> Result<()> {
    let home = home_dir()?;
    let document: DocumentType = args.document.into();
    let source = read_layout(&args.file)?;
    let options = RenderOptions::from(&settings(&home)?);

    validate(document, &source, &options, false)?;

    // Render through an in-memory store holding only the candidate.
    let mut candidate = TemplateSet::default();
    candidate
        .templates
        .insert(document, vec![Template::new(CANDIDATE, source)]);
    let result = render_document(
        &samples::sample(document),
        &candidate,
        TemplateSelection::Named(CANDIDATE.to_string()),
        &options,
    );
    if let Some(error) = result.error() {
        return Err(anyhow!("{error}")).context("layout compiles but fails with sample data");
    }

    println!("✓ {} layout is valid", document.label());
    if let Some(format) = args.format {
        println!("{}", format_tree(result.tree(), format)?);
    }
    Ok(())
}
