//! Flattens selected section data into the key/value inputs the workflow
//! service expects. Only selected sections contribute; array sections are
//! indexed; list values are joined with a comma.

use std::collections::BTreeMap;

use serde_json::Value;
use uuid::Uuid;

use crate::models::document::DocumentKind;
use crate::modules::definitions::sections_for;
use crate::modules::selection::ModuleSelection;

/// Renders one form value as a workflow input string.
fn flatten_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Array(items) => items
            .iter()
            .map(flatten_value)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
        Value::Null | Value::Object(_) => String::new(),
    }
}

fn flatten_object(prefix: &str, obj: &Value, out: &mut BTreeMap<String, String>) {
    let Some(fields) = obj.as_object() else {
        return;
    };
    for (field, value) in fields {
        let rendered = flatten_value(value);
        if rendered.is_empty() {
            continue;
        }
        out.insert(format!("{prefix}.{field}"), rendered);
    }
}

/// Builds the workflow input map for a document: every selected section's
/// fields, plus the language preference and document identity.
pub fn flatten_inputs(
    kind: DocumentKind,
    document_id: Uuid,
    language: &str,
    selection: &ModuleSelection,
    form_data: &Value,
) -> BTreeMap<String, String> {
    let mut out = BTreeMap::new();

    for spec in sections_for(kind) {
        if !selection.is_selected(spec.id) {
            continue;
        }
        let Some(section_data) = form_data.get(spec.id) else {
            continue;
        };
        if spec.array {
            if let Some(items) = section_data.as_array() {
                for (i, item) in items.iter().enumerate() {
                    flatten_object(&format!("{}.{}", spec.id, i), item, &mut out);
                }
            }
        } else {
            flatten_object(spec.id, section_data, &mut out);
        }
    }

    out.insert("language".to_string(), language.to_string());
    out.insert("document_id".to_string(), document_id.to_string());
    out.insert("document_type".to_string(), kind.as_str().to_string());

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_form() -> Value {
        json!({
            "basic_info": {
                "full_name": "Jane Doe",
                "email": "jane@example.com",
                "phone": "555-0100",
                "date": "2025-03-01",
                "company_name": "Acme Corp"
            },
            "job": { "job_title": "Staff Engineer", "job_source": "referral" },
            "experience": [
                { "organization": "Widgets Inc", "role": "Engineer", "highlights": "Shipped v2" },
                { "organization": "Gadgets LLC", "role": "Intern", "highlights": "Prototyping" }
            ],
            "skills": { "items": ["Rust", "Postgres", ""] }
        })
    }

    #[test]
    fn test_flatten_keys_selected_sections_only() {
        let mut selection = ModuleSelection::default_for(DocumentKind::CoverLetter);
        selection
            .toggle(DocumentKind::CoverLetter, "experience")
            .unwrap();

        let inputs = flatten_inputs(
            DocumentKind::CoverLetter,
            Uuid::new_v4(),
            "en",
            &selection,
            &sample_form(),
        );

        assert_eq!(inputs.get("basic_info.full_name").unwrap(), "Jane Doe");
        assert_eq!(inputs.get("job.job_title").unwrap(), "Staff Engineer");
        assert!(!inputs.keys().any(|k| k.starts_with("experience.")));
    }

    #[test]
    fn test_array_sections_are_indexed() {
        let selection = ModuleSelection::default_for(DocumentKind::CoverLetter);
        let inputs = flatten_inputs(
            DocumentKind::CoverLetter,
            Uuid::new_v4(),
            "en",
            &selection,
            &sample_form(),
        );

        assert_eq!(inputs.get("experience.0.organization").unwrap(), "Widgets Inc");
        assert_eq!(inputs.get("experience.1.role").unwrap(), "Intern");
    }

    #[test]
    fn test_list_values_joined_and_blanks_dropped() {
        let selection = ModuleSelection::default_for(DocumentKind::CoverLetter);
        let inputs = flatten_inputs(
            DocumentKind::CoverLetter,
            Uuid::new_v4(),
            "en",
            &selection,
            &sample_form(),
        );

        assert_eq!(inputs.get("skills.items").unwrap(), "Rust, Postgres");
    }

    #[test]
    fn test_identity_keys_always_present() {
        let id = Uuid::new_v4();
        let selection = ModuleSelection::default_for(DocumentKind::Sop);
        let inputs = flatten_inputs(DocumentKind::Sop, id, "zh", &selection, &json!({}));

        assert_eq!(inputs.get("language").unwrap(), "zh");
        assert_eq!(inputs.get("document_id").unwrap(), &id.to_string());
        assert_eq!(inputs.get("document_type").unwrap(), "sop");
    }

    #[test]
    fn test_empty_fields_are_omitted() {
        let selection = ModuleSelection::default_for(DocumentKind::CoverLetter);
        let form = json!({ "basic_info": { "full_name": "Jane", "email": "  " } });
        let inputs = flatten_inputs(
            DocumentKind::CoverLetter,
            Uuid::new_v4(),
            "en",
            &selection,
            &form,
        );

        assert!(inputs.contains_key("basic_info.full_name"));
        assert!(!inputs.contains_key("basic_info.email"));
    }
}
