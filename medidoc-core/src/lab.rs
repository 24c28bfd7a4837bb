//! Lab-test template catalogue filtering, as shown by the lab-template manager.

use crate::types::{LabTestStatus, LabTestTemplate};

/// Search + visibility filter for the lab-template list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabTestFilter {
    /// Case-insensitive substring matched against name and department.
    pub query: String,
    /// When false, inactive templates are hidden.
    pub show_inactive: bool,
}

impl LabTestFilter {
    pub fn matches(&self, template: &LabTestTemplate) -> bool {
        if !self.show_inactive && template.status == LabTestStatus::Inactive {
            return false;
        }
        let query = self.query.trim().to_lowercase();
        if query.is_empty() {
            return true;
        }
        template.name.to_lowercase().contains(&query)
            || template
                .department
                .as_deref()
                .map(|d| d.to_lowercase().contains(&query))
                .unwrap_or(false)
    }

    /// Apply the filter, preserving catalogue order.
    pub fn apply<'a>(&self, templates: &'a [LabTestTemplate]) -> Vec<&'a LabTestTemplate> {
        templates.iter().filter(|t| self.matches(t)).collect()
    }
}
