//! medidoc: hospital document template CLI.
//!
//! # Usage
//!
//! ```text
//! medidoc templates list [--hospital <id>] [--type <doc>]
//! medidoc templates add <doc> <name> --file <layout.yaml> [--hospital <id>] [--force]
//! medidoc templates edit <doc> <index> --file <layout.yaml> [--name <name>] [--force]
//! medidoc templates delete <doc> <index>
//! medidoc templates check <doc> --file <layout.yaml> [--format text|html|json]
//! medidoc defaults [<doc>]
//! medidoc render --type <doc> --data <data.json> [--template <name>] [--format html|json|text] [--out <file>]
//! medidoc lab-tests list [--query <text>] [--show-inactive]
//! medidoc lab-tests add <name> [--department <dept>] [--param "name|unit|range"]... [--inactive]
//! ```
//!
//! Set `RUST_LOG=medidoc_renderer=debug` to see which template each render uses.

mod commands;

use std::fmt;
use std::str::FromStr;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};

use commands::{
    defaults::DefaultsArgs, lab_tests::LabTestsCommand, render::RenderArgs,
    templates::TemplatesCommand,
};
use medidoc_core::DocumentType;

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "medidoc",
    version,
    about = "Manage and render hospital document templates",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Manage a hospital's stored templates.
    Templates {
        #[command(subcommand)]
        command: TemplatesCommand,
    },

    /// Show the bundled default layouts.
    Defaults(DefaultsArgs),

    /// Render a document from JSON data.
    Render(RenderArgs),

    /// Manage the lab-test template catalogue.
    LabTests {
        #[command(subcommand)]
        command: LabTestsCommand,
    },
}

// ---------------------------------------------------------------------------
// Shared argument types
// ---------------------------------------------------------------------------

/// Thin wrapper so clap can parse `DocumentType` from CLI args.
#[derive(Debug, Clone, Copy)]
pub struct DocumentTypeArg(pub DocumentType);

impl FromStr for DocumentTypeArg {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        s.parse::<DocumentType>().map(Self)
    }
}

impl fmt::Display for DocumentTypeArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<DocumentTypeArg> for DocumentType {
    fn from(d: DocumentTypeArg) -> Self {
        d.0
    }
}

/// How a rendered document is written out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Html,
    Json,
    Text,
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    match cli.command {
        Commands::Templates { command } => commands::templates::run(command),
        Commands::Defaults(args) => args.run(),
        Commands::Render(args) => args.run(),
        Commands::LabTests { command } => commands::lab_tests::run(command),
    }
}
