//! Module selection and completeness checks.
//!
//! Selection is a map from section id to a selected flag. Completeness is
//! derived from the form data on every call and never stored: a required
//! string field must be non-empty after trimming, and scalar numbers and
//! booleans count as filled. Array sections are judged by element 0; an
//! empty array is incomplete.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::document::DocumentKind;
use crate::modules::definitions::{section_spec, sections_for, SectionSpec};

/// Section id -> selected. Unknown ids are rejected at parse time, so every
/// key in the map is a real section of the document type.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModuleSelection(BTreeMap<String, bool>);

impl ModuleSelection {
    /// Fresh selection with every section of the type switched on.
    pub fn default_for(kind: DocumentKind) -> Self {
        let map = sections_for(kind)
            .iter()
            .map(|s| (s.id.to_string(), true))
            .collect();
        Self(map)
    }

    /// Parses a stored or submitted selection map. Unknown section ids and
    /// deselected required sections are rejected; sections missing from the
    /// map default to selected.
    pub fn from_value(kind: DocumentKind, value: &Value) -> Result<Self, String> {
        let obj = value
            .as_object()
            .ok_or_else(|| "module_selection must be a JSON object".to_string())?;

        let mut map: BTreeMap<String, bool> = sections_for(kind)
            .iter()
            .map(|s| (s.id.to_string(), true))
            .collect();

        for (id, flag) in obj {
            let spec = section_spec(kind, id)
                .ok_or_else(|| format!("unknown section '{id}' for {}", kind.as_str()))?;
            let selected = flag
                .as_bool()
                .ok_or_else(|| format!("selection flag for '{id}' must be a boolean"))?;
            if spec.required_section && !selected {
                return Err(format!("section '{id}' is required and cannot be deselected"));
            }
            map.insert(id.clone(), selected);
        }

        Ok(Self(map))
    }

    /// Flips one section. Required sections cannot be switched off.
    pub fn toggle(&mut self, kind: DocumentKind, id: &str) -> Result<bool, String> {
        let spec = section_spec(kind, id)
            .ok_or_else(|| format!("unknown section '{id}' for {}", kind.as_str()))?;
        let entry = self.0.entry(id.to_string()).or_insert(true);
        if *entry && spec.required_section {
            return Err(format!("section '{id}' is required and cannot be deselected"));
        }
        *entry = !*entry;
        Ok(*entry)
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.0.get(id).copied().unwrap_or(true)
    }

    pub fn as_value(&self) -> Value {
        serde_json::to_value(&self.0).unwrap_or_else(|_| Value::Object(Default::default()))
    }
}

/// True when a required field carries usable content. Strings must be
/// non-empty after trimming; scalar numbers and booleans pass; an array
/// passes when it holds at least one non-blank scalar.
fn field_present(value: Option<&Value>) -> bool {
    match value {
        Some(Value::String(s)) => !s.trim().is_empty(),
        Some(Value::Number(_)) | Some(Value::Bool(_)) => true,
        Some(Value::Array(items)) => items.iter().any(|v| match v {
            Value::String(s) => !s.trim().is_empty(),
            Value::Number(_) | Value::Bool(_) => true,
            _ => false,
        }),
        _ => false,
    }
}

fn object_missing_fields(spec: &SectionSpec, obj: Option<&Value>) -> Vec<String> {
    let fields = obj.and_then(|v| v.as_object());
    spec.required_fields
        .iter()
        .filter(|field| !field_present(fields.and_then(|o| o.get(**field))))
        .map(|field| format!("{}.{}", spec.id, field))
        .collect()
}

/// Lists the required fields a section is still missing, prefixed with the
/// section id. Empty means complete.
pub fn missing_fields(spec: &SectionSpec, form_data: &Value) -> Vec<String> {
    let section_data = form_data.get(spec.id);

    if spec.array {
        match section_data.and_then(|v| v.as_array()) {
            Some(items) if !items.is_empty() => object_missing_fields(spec, items.first()),
            // Empty or absent array: every required field counts as missing.
            _ => spec
                .required_fields
                .iter()
                .map(|field| format!("{}.{}", spec.id, field))
                .collect(),
        }
    } else {
        object_missing_fields(spec, section_data)
    }
}

pub fn is_module_completed(spec: &SectionSpec, form_data: &Value) -> bool {
    missing_fields(spec, form_data).is_empty()
}

/// True iff at least one section is selected and no selected section is
/// incomplete. Deselected sections are ignored entirely.
pub fn can_generate(kind: DocumentKind, selection: &ModuleSelection, form_data: &Value) -> bool {
    let mut any_selected = false;
    for spec in sections_for(kind) {
        if !selection.is_selected(spec.id) {
            continue;
        }
        any_selected = true;
        if !is_module_completed(spec, form_data) {
            return false;
        }
    }
    any_selected
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionCompleteness {
    pub section: String,
    pub selected: bool,
    pub complete: bool,
    pub missing_fields: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletenessReport {
    pub can_generate: bool,
    pub sections: Vec<SectionCompleteness>,
}

/// One-line summary of everything still missing across selected sections,
/// for validation error messages.
pub fn missing_summary(report: &CompletenessReport) -> String {
    report
        .sections
        .iter()
        .filter(|s| s.selected && !s.complete)
        .flat_map(|s| s.missing_fields.iter().cloned())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Per-section completeness breakdown for the wizard sidebar.
pub fn completeness_report(
    kind: DocumentKind,
    selection: &ModuleSelection,
    form_data: &Value,
) -> CompletenessReport {
    let sections = sections_for(kind)
        .iter()
        .map(|spec| {
            let missing = missing_fields(spec, form_data);
            SectionCompleteness {
                section: spec.id.to_string(),
                selected: selection.is_selected(spec.id),
                complete: missing.is_empty(),
                missing_fields: missing,
            }
        })
        .collect();

    CompletenessReport {
        can_generate: can_generate(kind, selection, form_data),
        sections,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::definitions::section_spec;
    use serde_json::json;

    fn cover_letter_form() -> Value {
        json!({
            "basic_info": {
                "full_name": "Jane Doe",
                "email": "jane@example.com",
                "phone": "555-0100",
                "date": "2025-03-01",
                "company_name": "Acme Corp",
                "address": ""
            },
            "recipient": {
                "hiring_manager": "Ms. Lee",
                "company_address": "500 Market St, Springfield"
            },
            "job": {
                "job_title": "Staff Engineer",
                "job_source": "company website"
            },
            "experience": [
                {
                    "organization": "Widgets Inc",
                    "role": "Senior Engineer",
                    "highlights": "Led the platform rewrite"
                }
            ],
            "motivation": { "reason": "Mission alignment" },
            "skills": { "items": ["Rust", "Postgres"] }
        })
    }

    #[test]
    fn test_basic_info_complete_with_optional_field_blank() {
        // Five required fields filled, the optional address left blank.
        let spec = section_spec(DocumentKind::CoverLetter, "basic_info").unwrap();
        assert!(is_module_completed(spec, &cover_letter_form()));
    }

    #[test]
    fn test_whitespace_only_field_counts_as_missing() {
        let spec = section_spec(DocumentKind::CoverLetter, "basic_info").unwrap();
        let mut form = cover_letter_form();
        form["basic_info"]["email"] = json!("   ");
        assert!(!is_module_completed(spec, &form));
        assert_eq!(missing_fields(spec, &form), vec!["basic_info.email"]);
    }

    #[test]
    fn test_array_section_checks_first_element_only() {
        let spec = section_spec(DocumentKind::CoverLetter, "experience").unwrap();
        let mut form = cover_letter_form();
        // Second entry is blank; only element 0 is judged.
        form["experience"]
            .as_array_mut()
            .unwrap()
            .push(json!({ "organization": "", "role": "", "highlights": "" }));
        assert!(is_module_completed(spec, &form));

        form["experience"][0]["role"] = json!("");
        assert!(!is_module_completed(spec, &form));
    }

    #[test]
    fn test_empty_array_section_is_incomplete() {
        let spec = section_spec(DocumentKind::CoverLetter, "experience").unwrap();
        let form = json!({ "experience": [] });
        assert!(!is_module_completed(spec, &form));
        assert_eq!(missing_fields(spec, &form).len(), spec.required_fields.len());
    }

    #[test]
    fn test_can_generate_ignores_deselected_incomplete_sections() {
        let mut form = cover_letter_form();
        form["motivation"]["reason"] = json!("");

        let mut selection = ModuleSelection::default_for(DocumentKind::CoverLetter);
        assert!(!can_generate(DocumentKind::CoverLetter, &selection, &form));

        selection
            .toggle(DocumentKind::CoverLetter, "motivation")
            .unwrap();
        assert!(can_generate(DocumentKind::CoverLetter, &selection, &form));
    }

    #[test]
    fn test_required_section_cannot_be_deselected() {
        let mut selection = ModuleSelection::default_for(DocumentKind::CoverLetter);
        let err = selection
            .toggle(DocumentKind::CoverLetter, "basic_info")
            .unwrap_err();
        assert!(err.contains("required"));
        assert!(selection.is_selected("basic_info"));
    }

    #[test]
    fn test_toggle_round_trip_for_optional_section() {
        let mut selection = ModuleSelection::default_for(DocumentKind::CoverLetter);
        assert_eq!(
            selection.toggle(DocumentKind::CoverLetter, "skills").unwrap(),
            false
        );
        assert_eq!(
            selection.toggle(DocumentKind::CoverLetter, "skills").unwrap(),
            true
        );
    }

    #[test]
    fn test_from_value_rejects_unknown_section() {
        let err = ModuleSelection::from_value(
            DocumentKind::CoverLetter,
            &json!({ "publications": true }),
        )
        .unwrap_err();
        assert!(err.contains("unknown section"));
    }

    #[test]
    fn test_from_value_rejects_deselected_required_section() {
        let err = ModuleSelection::from_value(
            DocumentKind::CoverLetter,
            &json!({ "basic_info": false }),
        )
        .unwrap_err();
        assert!(err.contains("required"));
    }

    #[test]
    fn test_from_value_defaults_missing_sections_to_selected() {
        let selection =
            ModuleSelection::from_value(DocumentKind::CoverLetter, &json!({ "skills": false }))
                .unwrap();
        assert!(!selection.is_selected("skills"));
        assert!(selection.is_selected("motivation"));
    }

    #[test]
    fn test_completeness_report_flags_missing_fields() {
        let form = json!({
            "basic_info": { "full_name": "Jane Doe", "email": "jane@example.com" }
        });
        let selection = ModuleSelection::default_for(DocumentKind::Sop);
        let report = completeness_report(DocumentKind::Sop, &selection, &form);

        assert!(!report.can_generate);
        let basic = report
            .sections
            .iter()
            .find(|s| s.section == "basic_info")
            .unwrap();
        assert!(basic.complete);
        let target = report
            .sections
            .iter()
            .find(|s| s.section == "target_program")
            .unwrap();
        assert!(!target.complete);
        assert_eq!(target.missing_fields.len(), 3);
    }

    #[test]
    fn test_numeric_field_counts_as_present() {
        let spec = section_spec(DocumentKind::Sop, "background").unwrap();
        let form = json!({
            "background": { "major": "CS", "school": "MIT", "gpa": 3.9 }
        });
        assert!(is_module_completed(spec, &form));
    }
}
