//! Deterministic local document assembly, used when the workflow service
//! fails during initial generation. Built purely from the raw form fields,
//! so the same input always yields the same text. Statements of purpose
//! have no fallback; their structure depends too heavily on the generated
//! narrative.

use serde_json::Value;

use crate::models::document::DocumentKind;
use crate::modules::selection::ModuleSelection;

fn field<'a>(form_data: &'a Value, section: &str, key: &str) -> Option<&'a str> {
    form_data
        .get(section)
        .and_then(|s| s.get(key))
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn entries<'a>(form_data: &'a Value, section: &str) -> Vec<&'a Value> {
    form_data
        .get(section)
        .and_then(|v| v.as_array())
        .map(|items| items.iter().collect())
        .unwrap_or_default()
}

fn entry_field<'a>(entry: &'a Value, key: &str) -> Option<&'a str> {
    entry
        .get(key)
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn list_field(form_data: &Value, section: &str, key: &str) -> Vec<String> {
    match form_data.get(section).and_then(|s| s.get(key)) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|v| v.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        Some(Value::String(s)) if !s.trim().is_empty() => {
            s.split(',').map(str::trim).map(str::to_string).collect()
        }
        _ => Vec::new(),
    }
}

/// Assembles a plain-text document from the form fields of the selected
/// sections. Returns `None` for document kinds without a fallback.
pub fn assemble_fallback(
    kind: DocumentKind,
    form_data: &Value,
    selection: &ModuleSelection,
) -> Option<String> {
    match kind {
        DocumentKind::CoverLetter => Some(assemble_cover_letter(form_data, selection)),
        DocumentKind::Resume => Some(assemble_resume(form_data, selection)),
        DocumentKind::Sop => None,
    }
}

fn assemble_cover_letter(form_data: &Value, selection: &ModuleSelection) -> String {
    let mut out = String::new();

    if let Some(date) = field(form_data, "basic_info", "date") {
        out.push_str(date);
        out.push_str("\n\n");
    }

    let greeting = selection
        .is_selected("recipient")
        .then(|| field(form_data, "recipient", "hiring_manager"))
        .flatten()
        .unwrap_or("Hiring Manager");
    out.push_str(&format!("Dear {greeting},\n\n"));

    let company = field(form_data, "basic_info", "company_name").unwrap_or("your company");
    match (
        field(form_data, "job", "job_title"),
        field(form_data, "job", "job_source"),
    ) {
        (Some(title), Some(source)) => out.push_str(&format!(
            "I am writing to apply for the {title} position at {company}, which I found through {source}.\n\n"
        )),
        (Some(title), None) => out.push_str(&format!(
            "I am writing to apply for the {title} position at {company}.\n\n"
        )),
        _ => out.push_str(&format!(
            "I am writing to express my interest in joining {company}.\n\n"
        )),
    }

    if selection.is_selected("experience") {
        for entry in entries(form_data, "experience") {
            if let (Some(role), Some(org)) =
                (entry_field(entry, "role"), entry_field(entry, "organization"))
            {
                match entry_field(entry, "highlights") {
                    Some(highlights) => out.push_str(&format!(
                        "As {role} at {org}, {highlights}.\n\n"
                    )),
                    None => out.push_str(&format!("I have worked as {role} at {org}.\n\n")),
                }
            }
        }
    }

    if selection.is_selected("motivation") {
        if let Some(reason) = field(form_data, "motivation", "reason") {
            out.push_str(&format!("{reason}\n\n"));
        }
    }

    if selection.is_selected("skills") {
        let skills = list_field(form_data, "skills", "items");
        if !skills.is_empty() {
            out.push_str(&format!(
                "I would bring hands-on experience with {}.\n\n",
                skills.join(", ")
            ));
        }
    }

    out.push_str(&format!(
        "Thank you for considering my application.\n\nSincerely,\n{}",
        field(form_data, "basic_info", "full_name").unwrap_or("")
    ));

    out.trim_end().to_string()
}

fn assemble_resume(form_data: &Value, selection: &ModuleSelection) -> String {
    let mut out = String::new();

    if let Some(name) = field(form_data, "basic_info", "full_name") {
        out.push_str(&format!("# {name}\n"));
    }
    let contact: Vec<&str> = ["email", "phone", "location"]
        .iter()
        .filter_map(|key| field(form_data, "basic_info", key))
        .collect();
    if !contact.is_empty() {
        out.push_str(&contact.join(" | "));
        out.push_str("\n\n");
    }

    if selection.is_selected("education") {
        let items = entries(form_data, "education");
        if !items.is_empty() {
            out.push_str("## Education\n");
            for entry in &items {
                let line: Vec<&str> = ["school", "degree", "major", "start_date"]
                    .iter()
                    .filter_map(|key| entry_field(entry, key))
                    .collect();
                out.push_str(&format!("- {}\n", line.join(", ")));
            }
            out.push('\n');
        }
    }

    if selection.is_selected("work_experience") {
        let items = entries(form_data, "work_experience");
        if !items.is_empty() {
            out.push_str("## Experience\n");
            for entry in &items {
                if let (Some(title), Some(company)) =
                    (entry_field(entry, "title"), entry_field(entry, "company"))
                {
                    out.push_str(&format!("- {title}, {company}"));
                    if let Some(summary) = entry_field(entry, "summary") {
                        out.push_str(&format!(": {summary}"));
                    }
                    out.push('\n');
                }
            }
            out.push('\n');
        }
    }

    if selection.is_selected("research") {
        let items = entries(form_data, "research");
        if !items.is_empty() {
            out.push_str("## Research\n");
            for entry in &items {
                let line: Vec<&str> = ["project", "role", "summary"]
                    .iter()
                    .filter_map(|key| entry_field(entry, key))
                    .collect();
                out.push_str(&format!("- {}\n", line.join(", ")));
            }
            out.push('\n');
        }
    }

    if selection.is_selected("skills") {
        let skills = list_field(form_data, "skills", "items");
        if !skills.is_empty() {
            out.push_str(&format!("## Skills\n{}\n\n", skills.join(", ")));
        }
    }

    if selection.is_selected("awards") {
        let items = entries(form_data, "awards");
        if !items.is_empty() {
            out.push_str("## Awards\n");
            for entry in &items {
                let line: Vec<&str> = ["title", "date"]
                    .iter()
                    .filter_map(|key| entry_field(entry, key))
                    .collect();
                out.push_str(&format!("- {}\n", line.join(", ")));
            }
        }
    }

    out.trim_end().to_string()
}
