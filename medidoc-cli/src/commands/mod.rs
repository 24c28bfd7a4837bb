pub mod defaults;
pub mod render;
pub mod templates;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use medidoc_core::{config, store, HospitalId, Settings};
use medidoc_renderer::RenderNode;

use crate::OutputFormat;

pub(crate) fn home_dir() -> Result<PathBuf> {
    dirs::home_dir().context("could not determine home directory")
}

pub(crate) fn settings(home: &Path) -> Result<Settings> {
    config::load_settings_at(home).context("failed to load ~/.medidoc/config.yaml")
}

/// `--hospital`, else `default_hospital` from settings, else the only
/// hospital on disk.
pub(crate) fn resolve_hospital(home: &Path, explicit: Option<String>) -> Result<HospitalId> {
    if let Some(id) = explicit {
        return Ok(HospitalId::from(id));
    }
    if let Some(id) = settings(home)?.default_hospital {
        return Ok(HospitalId::from(id));
    }
    let mut hospitals = store::list_hospitals_at(home).context("failed to list hospitals")?;
    match hospitals.len() {
        1 => Ok(hospitals.remove(0)),
        0 => bail!(
            "no hospital given; pass --hospital <id> or set default_hospital in ~/.medidoc/config.yaml"
        ),
        _ => {
            let names: Vec<String> = hospitals.iter().map(ToString::to_string).collect();
            bail!(
                "multiple hospitals found ({}); pass --hospital <id>",
                names.join(", ")
            )
        }
    }
}

pub(crate) fn read_layout(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .with_context(|| format!("failed to read layout file {}", path.display()))
}

pub(crate) fn format_tree(tree: &RenderNode, format: OutputFormat) -> Result<String> {
    Ok(match format {
        OutputFormat::Html => tree.to_html(),
        OutputFormat::Text => tree.to_plain_text(),
        OutputFormat::Json => serde_json::to_string_pretty(tree).context("failed to serialise render tree")?,
    })
}

/// Write via a sibling temp file and rename, so readers never see a partial file.
pub(crate) fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let file_name = path
        .file_name()
        .with_context(|| format!("{} is not a file path", path.display()))?;
    let mut tmp_name = file_name.to_os_string();
    tmp_name.push(".tmp");
    let tmp = path.with_file_name(tmp_name);

    std::fs::write(&tmp, contents).with_context(|| format!("failed to write {}", tmp.display()))?;
    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(e).with_context(|| format!("failed to replace {}", path.display()));
    }
    Ok(())
}
