//! `medidoc render`: render a document from JSON data.

use std::io::Read;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use medidoc_core::{store, DocumentType};
use medidoc_renderer::{render_document, AnyDocument, RenderOptions, TemplateSelection};

use super::{format_tree, home_dir, resolve_hospital, settings, write_atomic};
use crate::{DocumentTypeArg, OutputFormat};

/// Arguments for `medidoc render`.
#[derive(Args, Debug)]
pub struct RenderArgs {
    /// Document type to render.
    #[arg(long = "type", short = 't', value_name = "TYPE")]
    pub document: DocumentTypeArg,

    /// JSON payload file, or `-` for stdin.
    #[arg(long, short = 'd')]
    pub data: PathBuf,

    #[arg(long)]
    pub hospital: Option<String>,

    /// Stored template name, or "System Default". Defaults to the first stored.
    #[arg(long)]
    pub template: Option<String>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Html)]
    pub format: OutputFormat,

    /// Write here instead of stdout.
    #[arg(long, short = 'o')]
    pub out: Option<PathBuf>,
}

impl RenderArgs {
    pub fn run(self) -> Result<()> {
        let home = home_dir()?;
        let hospital = resolve_hospital(&home, self.hospital)?;
        let options = RenderOptions::from(&settings(&home)?);
        let document: DocumentType = self.document.into();

        let raw = if self.data.as_os_str() == "-" {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read data from stdin")?;
            buf
        } else {
            std::fs::read_to_string(&self.data)
                .with_context(|| format!("failed to read {}", self.data.display()))?
        };
        let value: serde_json::Value = serde_json::from_str(&raw).context("data is not valid JSON")?;
        let data = AnyDocument::from_value(document, value)
            .with_context(|| format!("data does not match the {} payload", document.label()))?;

        let templates = store::fetch_templates_at(&home, &hospital)
            .with_context(|| format!("failed to load templates for '{hospital}'"))?;
        let selection = TemplateSelection::from_name(self.template.as_deref());
        let result = render_document(&data, &templates, selection, &options);

        if let Some(error) = result.error() {
            eprintln!("{} {}", "render failed:".red().bold(), error);
        }

        let output = format_tree(result.tree(), self.format)?;
        match &self.out {
            Some(path) => {
                write_atomic(path, &output)?;
                println!("✓ Wrote {} to {}", document.label(), path.display());
            }
            None => println!("{output}"),
        }
        Ok(())
    }
}
