//! Section placement as data. Each layout takes an ordered list of section
//! ids per area; moving a section between areas or reordering within one is
//! a data change, never a layout change.

/// Sections a caller may place. `basic_info` is the header band and is not
/// orderable.
pub const ORDERABLE_SECTIONS: &[&str] = &[
    "education",
    "work_experience",
    "research",
    "skills",
    "awards",
];

#[derive(Debug, Clone, PartialEq)]
pub struct SectionOrder {
    pub main: Vec<String>,
    pub sidebar: Vec<String>,
}

impl SectionOrder {
    /// Default order for single-column layouts: everything in main.
    pub fn single_column() -> Self {
        SectionOrder {
            main: ORDERABLE_SECTIONS.iter().map(|s| s.to_string()).collect(),
            sidebar: Vec::new(),
        }
    }

    /// Default order for sidebar layouts: narrative sections in main,
    /// compact ones in the sidebar.
    pub fn with_sidebar() -> Self {
        SectionOrder {
            main: vec![
                "education".to_string(),
                "work_experience".to_string(),
                "research".to_string(),
            ],
            sidebar: vec!["skills".to_string(), "awards".to_string()],
        }
    }

    /// Builds an order from caller-supplied lists. Every id must be a known
    /// orderable section and no id may appear twice across both areas.
    pub fn from_lists(main: Vec<String>, sidebar: Vec<String>) -> Result<Self, String> {
        let mut seen: Vec<&str> = Vec::new();
        for id in main.iter().chain(sidebar.iter()) {
            if !ORDERABLE_SECTIONS.contains(&id.as_str()) {
                return Err(format!("unknown section id: {id}"));
            }
            if seen.contains(&id.as_str()) {
                return Err(format!("section id listed twice: {id}"));
            }
            seen.push(id);
        }
        Ok(SectionOrder { main, sidebar })
    }
}

/// Splits a comma-separated id list, dropping blanks.
pub fn parse_id_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_orders_are_valid() {
        let single = SectionOrder::single_column();
        assert_eq!(single.main.len(), ORDERABLE_SECTIONS.len());
        assert!(single.sidebar.is_empty());

        let split = SectionOrder::with_sidebar();
        SectionOrder::from_lists(split.main.clone(), split.sidebar.clone()).unwrap();
    }

    #[test]
    fn test_from_lists_rejects_unknown_id() {
        let err = SectionOrder::from_lists(vec!["hobbies".to_string()], vec![]).unwrap_err();
        assert!(err.contains("hobbies"));
    }

    #[test]
    fn test_from_lists_rejects_duplicate_across_areas() {
        let err = SectionOrder::from_lists(
            vec!["skills".to_string()],
            vec!["skills".to_string()],
        )
        .unwrap_err();
        assert!(err.contains("twice"));
    }

    #[test]
    fn test_reordering_is_preserved() {
        let order = SectionOrder::from_lists(
            vec!["awards".to_string(), "education".to_string()],
            vec![],
        )
        .unwrap();
        assert_eq!(order.main, vec!["awards", "education"]);
    }

    #[test]
    fn test_parse_id_list() {
        assert_eq!(
            parse_id_list("skills, awards ,,education"),
            vec!["skills", "awards", "education"]
        );
        assert!(parse_id_list("").is_empty());
    }
}
