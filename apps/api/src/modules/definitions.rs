//! Fixed section tables for the three wizard document types.
//!
//! Each document type carries a closed set of sections. A section lists the
//! field names that must be filled for it to count as complete; array
//! sections hold repeated entries and are judged by their first element.

use crate::models::document::DocumentKind;

#[derive(Debug, Clone, Copy)]
pub struct SectionSpec {
    pub id: &'static str,
    /// Required sections cannot be deselected in the wizard.
    pub required_section: bool,
    /// Array sections hold a list of entries instead of a single object.
    pub array: bool,
    pub required_fields: &'static [&'static str],
}

const COVER_LETTER_SECTIONS: &[SectionSpec] = &[
    SectionSpec {
        id: "basic_info",
        required_section: true,
        array: false,
        required_fields: &["full_name", "email", "phone", "date", "company_name"],
    },
    SectionSpec {
        id: "recipient",
        required_section: false,
        array: false,
        required_fields: &["hiring_manager", "company_address"],
    },
    SectionSpec {
        id: "job",
        required_section: true,
        array: false,
        required_fields: &["job_title", "job_source"],
    },
    SectionSpec {
        id: "experience",
        required_section: false,
        array: true,
        required_fields: &["organization", "role", "highlights"],
    },
    SectionSpec {
        id: "motivation",
        required_section: false,
        array: false,
        required_fields: &["reason"],
    },
    SectionSpec {
        id: "skills",
        required_section: false,
        array: false,
        required_fields: &["items"],
    },
];

const RESUME_SECTIONS: &[SectionSpec] = &[
    SectionSpec {
        id: "basic_info",
        required_section: true,
        array: false,
        required_fields: &["full_name", "email", "phone", "location"],
    },
    SectionSpec {
        id: "education",
        required_section: true,
        array: true,
        required_fields: &["school", "degree", "major", "start_date"],
    },
    SectionSpec {
        id: "work_experience",
        required_section: false,
        array: true,
        required_fields: &["company", "title", "start_date", "summary"],
    },
    SectionSpec {
        id: "research",
        required_section: false,
        array: true,
        required_fields: &["project", "role", "summary"],
    },
    SectionSpec {
        id: "skills",
        required_section: false,
        array: false,
        required_fields: &["items"],
    },
    SectionSpec {
        id: "awards",
        required_section: false,
        array: true,
        required_fields: &["title", "date"],
    },
];

const SOP_SECTIONS: &[SectionSpec] = &[
    SectionSpec {
        id: "basic_info",
        required_section: true,
        array: false,
        required_fields: &["full_name", "email"],
    },
    SectionSpec {
        id: "target_program",
        required_section: true,
        array: false,
        required_fields: &["school", "program", "degree_level"],
    },
    SectionSpec {
        id: "background",
        required_section: false,
        array: false,
        required_fields: &["major", "school", "gpa"],
    },
    SectionSpec {
        id: "research_interest",
        required_section: false,
        array: false,
        required_fields: &["topic", "summary"],
    },
    SectionSpec {
        id: "career_goal",
        required_section: false,
        array: false,
        required_fields: &["short_term", "long_term"],
    },
];

/// Returns the section table for a document type.
pub fn sections_for(kind: DocumentKind) -> &'static [SectionSpec] {
    match kind {
        DocumentKind::CoverLetter => COVER_LETTER_SECTIONS,
        DocumentKind::Resume => RESUME_SECTIONS,
        DocumentKind::Sop => SOP_SECTIONS,
    }
}

/// Looks up one section spec by id.
pub fn section_spec(kind: DocumentKind, id: &str) -> Option<&'static SectionSpec> {
    sections_for(kind).iter().find(|s| s.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cover_letter_basic_info_required_fields() {
        let spec = section_spec(DocumentKind::CoverLetter, "basic_info").unwrap();
        assert!(spec.required_section);
        assert_eq!(
            spec.required_fields,
            &["full_name", "email", "phone", "date", "company_name"]
        );
    }

    #[test]
    fn test_cover_letter_recipient_needs_manager_and_address() {
        let spec = section_spec(DocumentKind::CoverLetter, "recipient").unwrap();
        assert!(!spec.required_section);
        assert_eq!(spec.required_fields, &["hiring_manager", "company_address"]);
    }

    #[test]
    fn test_every_kind_has_a_required_basic_info() {
        for kind in [
            DocumentKind::CoverLetter,
            DocumentKind::Resume,
            DocumentKind::Sop,
        ] {
            let spec = section_spec(kind, "basic_info").unwrap();
            assert!(spec.required_section, "{} basic_info", kind.as_str());
            assert!(!spec.array);
        }
    }

    #[test]
    fn test_resume_education_is_required_array() {
        let spec = section_spec(DocumentKind::Resume, "education").unwrap();
        assert!(spec.required_section);
        assert!(spec.array);
    }

    #[test]
    fn test_unknown_section_id_is_none() {
        assert!(section_spec(DocumentKind::Sop, "experience").is_none());
        assert!(section_spec(DocumentKind::CoverLetter, "awards").is_none());
    }

    #[test]
    fn test_section_ids_unique_per_kind() {
        for kind in [
            DocumentKind::CoverLetter,
            DocumentKind::Resume,
            DocumentKind::Sop,
        ] {
            let sections = sections_for(kind);
            let mut ids: Vec<_> = sections.iter().map(|s| s.id).collect();
            ids.sort_unstable();
            ids.dedup();
            assert_eq!(ids.len(), sections.len());
        }
    }
}
