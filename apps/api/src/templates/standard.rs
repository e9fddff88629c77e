//! Normalization of raw resume form data into the fixed shape that every
//! layout consumes. Layouts never read `form_data` directly.

use serde::Serialize;
use serde_json::Value;

use crate::modules::selection::ModuleSelection;

#[derive(Debug, Clone, Default, Serialize)]
pub struct BasicInfo {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub location: String,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EducationEntry {
    pub school: String,
    pub degree: String,
    pub major: String,
    pub start_date: String,
    pub end_date: Option<String>,
    pub gpa: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WorkEntry {
    pub company: String,
    pub title: String,
    pub start_date: String,
    pub end_date: Option<String>,
    pub summary: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResearchEntry {
    pub project: String,
    pub role: String,
    pub summary: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AwardEntry {
    pub title: String,
    pub date: String,
}

/// The normalized resume. Deselected sections come out empty so layouts
/// only ever have to ask "is this list empty".
#[derive(Debug, Clone, Default, Serialize)]
pub struct StandardResume {
    pub basic_info: BasicInfo,
    pub education: Vec<EducationEntry>,
    pub work_experience: Vec<WorkEntry>,
    pub research: Vec<ResearchEntry>,
    pub skills: Vec<String>,
    pub awards: Vec<AwardEntry>,
}

fn scalar_string(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => {
            let t = s.trim();
            (!t.is_empty()).then(|| t.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn text(form_data: &Value, section: &str, key: &str) -> String {
    form_data
        .get(section)
        .and_then(|s| s.get(key))
        .and_then(scalar_string)
        .unwrap_or_default()
}

fn optional(form_data: &Value, section: &str, key: &str) -> Option<String> {
    form_data
        .get(section)
        .and_then(|s| s.get(key))
        .and_then(scalar_string)
}

fn entry_text(entry: &Value, key: &str) -> String {
    entry.get(key).and_then(scalar_string).unwrap_or_default()
}

fn entry_optional(entry: &Value, key: &str) -> Option<String> {
    entry.get(key).and_then(scalar_string)
}

fn entries<'a>(form_data: &'a Value, section: &str) -> Vec<&'a Value> {
    form_data
        .get(section)
        .and_then(|v| v.as_array())
        .map(|items| items.iter().collect())
        .unwrap_or_default()
}

fn skill_items(form_data: &Value) -> Vec<String> {
    match form_data.get("skills").and_then(|s| s.get("items")) {
        Some(Value::Array(items)) => items.iter().filter_map(scalar_string).collect(),
        Some(Value::String(s)) if !s.trim().is_empty() => s
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

impl StandardResume {
    /// Builds the normalized shape from raw form data, honoring the module
    /// selection.
    pub fn from_form(form_data: &Value, selection: &ModuleSelection) -> Self {
        let basic_info = BasicInfo {
            full_name: text(form_data, "basic_info", "full_name"),
            email: text(form_data, "basic_info", "email"),
            phone: text(form_data, "basic_info", "phone"),
            location: text(form_data, "basic_info", "location"),
            avatar_url: optional(form_data, "basic_info", "avatar_url"),
        };

        let education = if selection.is_selected("education") {
            entries(form_data, "education")
                .into_iter()
                .map(|e| EducationEntry {
                    school: entry_text(e, "school"),
                    degree: entry_text(e, "degree"),
                    major: entry_text(e, "major"),
                    start_date: entry_text(e, "start_date"),
                    end_date: entry_optional(e, "end_date"),
                    gpa: entry_optional(e, "gpa"),
                })
                .collect()
        } else {
            Vec::new()
        };

        let work_experience = if selection.is_selected("work_experience") {
            entries(form_data, "work_experience")
                .into_iter()
                .map(|e| WorkEntry {
                    company: entry_text(e, "company"),
                    title: entry_text(e, "title"),
                    start_date: entry_text(e, "start_date"),
                    end_date: entry_optional(e, "end_date"),
                    summary: entry_text(e, "summary"),
                })
                .collect()
        } else {
            Vec::new()
        };

        let research = if selection.is_selected("research") {
            entries(form_data, "research")
                .into_iter()
                .map(|e| ResearchEntry {
                    project: entry_text(e, "project"),
                    role: entry_text(e, "role"),
                    summary: entry_text(e, "summary"),
                })
                .collect()
        } else {
            Vec::new()
        };

        let skills = if selection.is_selected("skills") {
            skill_items(form_data)
        } else {
            Vec::new()
        };

        let awards = if selection.is_selected("awards") {
            entries(form_data, "awards")
                .into_iter()
                .map(|e| AwardEntry {
                    title: entry_text(e, "title"),
                    date: entry_text(e, "date"),
                })
                .collect()
        } else {
            Vec::new()
        };

        StandardResume {
            basic_info,
            education,
            work_experience,
            research,
            skills,
            awards,
        }
    }

    /// Date span like "2019 – 2023" or "2019 – Present".
    pub fn date_span(start: &str, end: Option<&str>) -> String {
        match end {
            Some(e) if !e.is_empty() => format!("{start} – {e}"),
            _ => format!("{start} – Present"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::document::DocumentKind;
    use serde_json::json;

    fn resume_form() -> Value {
        json!({
            "basic_info": {
                "full_name": "  Jane Doe ",
                "email": "jane@example.com",
                "phone": "555-0100",
                "location": "Berlin",
                "avatar_url": "https://cdn.example.com/avatars/a.png"
            },
            "education": [
                {
                    "school": "TU Berlin",
                    "degree": "BSc",
                    "major": "CS",
                    "start_date": "2019",
                    "end_date": "2023",
                    "gpa": 3.8
                }
            ],
            "work_experience": [
                {
                    "company": "Acme",
                    "title": "Engineer",
                    "start_date": "2023",
                    "summary": "Built things."
                }
            ],
            "skills": { "items": ["Rust", " SQL ", ""] },
            "awards": [
                { "title": "Dean's List", "date": "2022" }
            ]
        })
    }

    #[test]
    fn test_normalization_trims_and_converts() {
        let selection = ModuleSelection::default_for(DocumentKind::Resume);
        let resume = StandardResume::from_form(&resume_form(), &selection);

        assert_eq!(resume.basic_info.full_name, "Jane Doe");
        assert_eq!(resume.education.len(), 1);
        assert_eq!(resume.education[0].gpa.as_deref(), Some("3.8"));
        assert_eq!(resume.work_experience[0].end_date, None);
        assert_eq!(resume.skills, vec!["Rust", "SQL"]);
        assert_eq!(resume.awards[0].title, "Dean's List");
    }

    #[test]
    fn test_deselected_sections_come_out_empty() {
        let mut selection = ModuleSelection::default_for(DocumentKind::Resume);
        selection.toggle(DocumentKind::Resume, "awards").unwrap();
        selection.toggle(DocumentKind::Resume, "skills").unwrap();

        let resume = StandardResume::from_form(&resume_form(), &selection);
        assert!(resume.awards.is_empty());
        assert!(resume.skills.is_empty());
        assert_eq!(resume.education.len(), 1);
    }

    #[test]
    fn test_missing_sections_come_out_empty() {
        let selection = ModuleSelection::default_for(DocumentKind::Resume);
        let resume = StandardResume::from_form(&json!({}), &selection);

        assert_eq!(resume.basic_info.full_name, "");
        assert!(resume.education.is_empty());
        assert!(resume.skills.is_empty());
    }

    #[test]
    fn test_skills_accept_comma_separated_string() {
        let selection = ModuleSelection::default_for(DocumentKind::Resume);
        let form = json!({ "skills": { "items": "Rust, SQL,  Redis" } });
        let resume = StandardResume::from_form(&form, &selection);
        assert_eq!(resume.skills, vec!["Rust", "SQL", "Redis"]);
    }

    #[test]
    fn test_date_span() {
        assert_eq!(StandardResume::date_span("2019", Some("2023")), "2019 – 2023");
        assert_eq!(StandardResume::date_span("2023", None), "2023 – Present");
    }
}
