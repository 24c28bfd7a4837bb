//! Error types for medidoc-core.

use std::path::PathBuf;

use thiserror::Error;

use crate::types::DocumentType;

/// All errors that can arise from template store and settings operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying I/O failure (file not found, permission denied, etc.).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization error (write/save path).
    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// YAML parse error on load: includes file path and line context from serde_yaml.
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// `dirs::home_dir()` returned `None`: cannot locate `~/.medidoc/`.
    #[error("cannot determine home directory; set $HOME or equivalent")]
    HomeNotFound,

    /// Edit/delete addressed a slot that does not exist.
    #[error("no {document} template at index {index} (stored: {len})")]
    IndexOutOfRange {
        document: DocumentType,
        index: usize,
        len: usize,
    },

    /// Template names are the only version key, so they must be non-empty.
    #[error("template name must not be empty")]
    EmptyName,
}
