//! `medidoc defaults [<type>]`: bundled default layouts.

use anyhow::Result;
use clap::Args;
use tabled::{settings::Style, Table, Tabled};

use medidoc_core::{DocumentType, Grant};
use medidoc_renderer::{builtin_for, defaults};

use crate::DocumentTypeArg;

#[derive(Args, Debug)]
pub struct DefaultsArgs {
    /// Print this document type's default layout. Omit to list all.
    pub document: Option<DocumentTypeArg>,
}

#[derive(Tabled)]
struct DefaultRow {
    #[tabled(rename = "type")]
    document: String,
    #[tabled(rename = "version")]
    version: u32,
    #[tabled(rename = "parameters")]
    parameters: String,
    #[tabled(rename = "header")]
    header: &'static str,
    #[tabled(rename = "styles")]
    styles: &'static str,
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}

impl DefaultsArgs {
    pub fn run(self) -> Result<()> {
        if let Some(document) = self.document {
            let document: DocumentType = document.into();
            print!("{}", builtin_for(document).source);
            return Ok(());
        }

        let rows: Vec<DefaultRow> = defaults::all()
            .into_iter()
            .map(|builtin| {
                let contract = builtin.document.contract();
                DefaultRow {
                    document: builtin.document.to_string(),
                    version: builtin.version,
                    parameters: contract.names().join(", "),
                    header: yes_no(contract.grants(Grant::HospitalHeader)),
                    styles: yes_no(contract.grants(Grant::Styles)),
                }
            })
            .collect();
        println!("{}", Table::new(rows).with(Style::rounded()));
        Ok(())
    }
}
