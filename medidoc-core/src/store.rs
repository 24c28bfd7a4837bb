//! Per-hospital YAML template store.
//!
//! # Storage layout
//!
//! ```text
//! ~/.medidoc/
//!   config.yaml                (optional settings)
//!   hospitals/
//!     <hospital>/
//!       templates.yaml         (one TemplateSet: mode 0600)
//! ```
//!
//! # API pattern
//!
//! Every function has two forms:
//! - `fn_at(home: &Path, …)`: explicit home; used in tests with `TempDir`
//! - `fn(…)`: derives home from `dirs::home_dir()`, delegates to `_at`
//!
//! Mutations always rewrite the whole record: readers see either the old or
//! the new file, never a partially edited array.

use std::path::{Path, PathBuf};

use chrono::Utc;

use crate::error::StoreError;
use crate::types::{DocumentType, HospitalId, LabTestTemplate, Template, TemplateSet};

// ---------------------------------------------------------------------------
// 1. Path helpers
// ---------------------------------------------------------------------------

/// `<home>/.medidoc/`
pub fn root_at(home: &Path) -> PathBuf {
    home.join(".medidoc")
}

/// `<home>/.medidoc/hospitals/<hospital>/`
///
/// Creates the directory (mode `0700`) if it does not yet exist.
pub fn hospital_dir_at(home: &Path, hospital: &HospitalId) -> Result<PathBuf, StoreError> {
    let dir = root_at(home).join("hospitals").join(&hospital.0);
    if !dir.exists() {
        std::fs::create_dir_all(&dir)?;
        set_dir_permissions(&dir)?;
    }
    Ok(dir)
}

/// `<home>/.medidoc/hospitals/<hospital>/templates.yaml`: pure, no I/O.
pub fn templates_path_at(home: &Path, hospital: &HospitalId) -> PathBuf {
    root_at(home)
        .join("hospitals")
        .join(&hospital.0)
        .join("templates.yaml")
}

/// Lists every hospital directory under `<home>/.medidoc/hospitals/`, sorted.
pub fn list_hospitals_at(home: &Path) -> Result<Vec<HospitalId>, StoreError> {
    let dir = root_at(home).join("hospitals");
    if !dir.exists() {
        return Ok(vec![]);
    }
    let mut names: Vec<HospitalId> = std::fs::read_dir(&dir)?
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().map(|t| t.is_dir()).unwrap_or(false))
        .map(|e| HospitalId::from(e.file_name().to_string_lossy().into_owned()))
        .collect();
    names.sort();
    Ok(names)
}

/// `list_hospitals_at` convenience wrapper.
pub fn list_hospitals() -> Result<Vec<HospitalId>, StoreError> {
    list_hospitals_at(&home()?)
}

// ---------------------------------------------------------------------------
// 2. Fetch
// ---------------------------------------------------------------------------

/// Load every stored template of `hospital`.
///
/// A hospital with no file yet has an empty set, which makes every document
/// render with its bundled default. Malformed YAML is `StoreError::Parse`.
pub fn fetch_templates_at(home: &Path, hospital: &HospitalId) -> Result<TemplateSet, StoreError> {
    let path = templates_path_at(home, hospital);
    if !path.exists() {
        return Ok(TemplateSet::default());
    }
    let contents = std::fs::read_to_string(&path)?;
    serde_yaml::from_str(&contents).map_err(|e| StoreError::Parse { path, source: e })
}

/// `fetch_templates_at` convenience wrapper.
pub fn fetch_templates(hospital: &HospitalId) -> Result<TemplateSet, StoreError> {
    fetch_templates_at(&home()?, hospital)
}

// ---------------------------------------------------------------------------
// 3. Save (atomic)
// ---------------------------------------------------------------------------

/// Atomically save the full template set of `hospital`.
///
/// Write flow: serialize → `.yaml.tmp` sibling → `chmod 0600` → `rename`.
pub fn save_templates_at(
    home: &Path,
    hospital: &HospitalId,
    set: &TemplateSet,
) -> Result<(), StoreError> {
    hospital_dir_at(home, hospital)?;
    let path = templates_path_at(home, hospital);
    let tmp_path = path.with_file_name("templates.yaml.tmp");

    let mut set = set.clone();
    set.updated_at = Some(Utc::now());
    let yaml = serde_yaml::to_string(&set)?;
    std::fs::write(&tmp_path, yaml)?;
    set_file_permissions(&tmp_path)?;
    std::fs::rename(&tmp_path, &path)?;
    Ok(())
}

/// `save_templates_at` convenience wrapper.
pub fn save_templates(hospital: &HospitalId, set: &TemplateSet) -> Result<(), StoreError> {
    save_templates_at(&home()?, hospital, set)
}

// ---------------------------------------------------------------------------
// 4. Mutations
// ---------------------------------------------------------------------------

/// Replace the whole template array of one document type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateUpdate {
    pub field: DocumentType,
    pub templates: Vec<Template>,
}

/// Overwrite the template at `index` of one document type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateEdit {
    pub field: DocumentType,
    pub index: usize,
    pub template: Template,
}

/// Remove the template at `index` of one document type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TemplateDelete {
    pub field: DocumentType,
    pub index: usize,
}

/// Replace one document type's array. An empty array removes the entry.
pub fn update_templates_at(
    home: &Path,
    hospital: &HospitalId,
    update: TemplateUpdate,
) -> Result<TemplateSet, StoreError> {
    if update.templates.iter().any(|t| t.name.trim().is_empty()) {
        return Err(StoreError::EmptyName);
    }
    let mut set = fetch_templates_at(home, hospital)?;
    if update.templates.is_empty() {
        set.templates.remove(&update.field);
    } else {
        set.templates.insert(update.field, update.templates);
    }
    save_templates_at(home, hospital, &set)?;
    Ok(set)
}

/// `update_templates_at` convenience wrapper.
pub fn update_templates(
    hospital: &HospitalId,
    update: TemplateUpdate,
) -> Result<TemplateSet, StoreError> {
    update_templates_at(&home()?, hospital, update)
}

/// Overwrite the stored template at `edit.index`.
pub fn edit_template_at(
    home: &Path,
    hospital: &HospitalId,
    edit: TemplateEdit,
) -> Result<TemplateSet, StoreError> {
    if edit.template.name.trim().is_empty() {
        return Err(StoreError::EmptyName);
    }
    let mut set = fetch_templates_at(home, hospital)?;
    let list = set.templates.entry(edit.field).or_default();
    let len = list.len();
    let slot = list.get_mut(edit.index).ok_or(StoreError::IndexOutOfRange {
        document: edit.field,
        index: edit.index,
        len,
    })?;
    *slot = stamped(edit.template);
    save_templates_at(home, hospital, &set)?;
    Ok(set)
}

/// `edit_template_at` convenience wrapper.
pub fn edit_template(hospital: &HospitalId, edit: TemplateEdit) -> Result<TemplateSet, StoreError> {
    edit_template_at(&home()?, hospital, edit)
}

/// Remove the stored template at `delete.index`.
pub fn delete_template_at(
    home: &Path,
    hospital: &HospitalId,
    delete: TemplateDelete,
) -> Result<TemplateSet, StoreError> {
    let mut set = fetch_templates_at(home, hospital)?;
    let len = set.templates(delete.field).len();
    if delete.index >= len {
        return Err(StoreError::IndexOutOfRange {
            document: delete.field,
            index: delete.index,
            len,
        });
    }
    if let Some(list) = set.templates.get_mut(&delete.field) {
        list.remove(delete.index);
    }
    if set.templates(delete.field).is_empty() {
        set.templates.remove(&delete.field);
    }
    save_templates_at(home, hospital, &set)?;
    Ok(set)
}

/// `delete_template_at` convenience wrapper.
pub fn delete_template(
    hospital: &HospitalId,
    delete: TemplateDelete,
) -> Result<TemplateSet, StoreError> {
    delete_template_at(&home()?, hospital, delete)
}

/// Add a named variant, or overwrite the existing variant of the same name
/// in place. Returns the index the template now occupies.
pub fn upsert_template_at(
    home: &Path,
    hospital: &HospitalId,
    field: DocumentType,
    template: Template,
) -> Result<usize, StoreError> {
    if template.name.trim().is_empty() {
        return Err(StoreError::EmptyName);
    }
    let mut set = fetch_templates_at(home, hospital)?;
    let list = set.templates.entry(field).or_default();
    let index = match list.iter().position(|t| t.name == template.name) {
        Some(i) => {
            list[i] = stamped(template);
            i
        }
        None => {
            list.push(stamped(template));
            list.len() - 1
        }
    };
    save_templates_at(home, hospital, &set)?;
    Ok(index)
}

/// `upsert_template_at` convenience wrapper.
pub fn upsert_template(
    hospital: &HospitalId,
    field: DocumentType,
    template: Template,
) -> Result<usize, StoreError> {
    upsert_template_at(&home()?, hospital, field, template)
}

/// Add a lab-test template, or replace the one with the same name
/// (case-insensitive). Returns its index in the catalogue.
pub fn upsert_lab_test_at(
    home: &Path,
    hospital: &HospitalId,
    lab_test: LabTestTemplate,
) -> Result<usize, StoreError> {
    if lab_test.name.trim().is_empty() {
        return Err(StoreError::EmptyName);
    }
    let mut set = fetch_templates_at(home, hospital)?;
    let existing = set
        .lab_tests
        .iter()
        .position(|t| t.name.eq_ignore_ascii_case(&lab_test.name));
    let index = match existing {
        Some(i) => {
            set.lab_tests[i] = lab_test;
            i
        }
        None => {
            set.lab_tests.push(lab_test);
            set.lab_tests.len() - 1
        }
    };
    save_templates_at(home, hospital, &set)?;
    Ok(index)
}

/// `upsert_lab_test_at` convenience wrapper.
pub fn upsert_lab_test(hospital: &HospitalId, lab_test: LabTestTemplate) -> Result<usize, StoreError> {
    upsert_lab_test_at(&home()?, hospital, lab_test)
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

fn stamped(mut template: Template) -> Template {
    template.updated_at = Some(Utc::now());
    template
}

pub(crate) fn home() -> Result<PathBuf, StoreError> {
    dirs::home_dir().ok_or(StoreError::HomeNotFound)
}

#[cfg(unix)]
fn set_dir_permissions(path: &Path) -> Result<(), StoreError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o700))?;
    Ok(())
}
#[cfg(not(unix))]
fn set_dir_permissions(_path: &Path) -> Result<(), StoreError> {
    Ok(())
}

#[cfg(unix)]
fn set_file_permissions(path: &Path) -> Result<(), StoreError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
    Ok(())
}
#[cfg(not(unix))]
fn set_file_permissions(_path: &Path) -> Result<(), StoreError> {
    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
