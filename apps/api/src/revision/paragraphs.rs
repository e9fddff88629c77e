//! Paragraph addressing for paragraph-level revision.
//!
//! Paragraphs are the segments between blank lines. Splitting keeps every
//! segment, including empty ones from consecutive separators, so an index
//! handed out by `split_paragraphs` stays valid for `replace_paragraph`
//! on the same content.

/// Splits content on blank-line boundaries.
pub fn split_paragraphs(content: &str) -> Vec<String> {
    content.split("\n\n").map(str::to_string).collect()
}

/// Replaces the paragraph at `index`, leaving the rest of the content
/// byte-identical.
pub fn replace_paragraph(content: &str, index: usize, replacement: &str) -> Result<String, String> {
    let mut parts: Vec<&str> = content.split("\n\n").collect();
    if index >= parts.len() {
        return Err(format!(
            "paragraph index {index} out of range (document has {} paragraphs)",
            parts.len()
        ));
    }
    parts[index] = replacement;
    Ok(parts.join("\n\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const LETTER: &str = "Dear Hiring Manager,\n\nFirst paragraph.\n\nSecond paragraph.\n\nSincerely,\nJane";

    #[test]
    fn test_split_counts_blank_line_segments() {
        let paragraphs = split_paragraphs(LETTER);
        assert_eq!(paragraphs.len(), 4);
        assert_eq!(paragraphs[1], "First paragraph.");
        assert_eq!(paragraphs[3], "Sincerely,\nJane");
    }

    #[test]
    fn test_replace_middle_paragraph() {
        let replaced = replace_paragraph(LETTER, 1, "A better first paragraph.").unwrap();
        assert!(replaced.contains("A better first paragraph."));
        assert!(!replaced.contains("First paragraph."));
        assert!(replaced.contains("Second paragraph."));
    }

    #[test]
    fn test_replace_with_same_text_is_identity() {
        let paragraphs = split_paragraphs(LETTER);
        for (i, p) in paragraphs.iter().enumerate() {
            assert_eq!(replace_paragraph(LETTER, i, p).unwrap(), LETTER);
        }
    }

    #[test]
    fn test_out_of_range_index_rejected() {
        let err = replace_paragraph(LETTER, 4, "x").unwrap_err();
        assert!(err.contains("out of range"));
    }

    #[test]
    fn test_consecutive_separators_keep_indexes_stable() {
        let content = "a\n\n\n\nb";
        let paragraphs = split_paragraphs(content);
        assert_eq!(paragraphs, vec!["a", "", "b"]);
        assert_eq!(replace_paragraph(content, 2, "c").unwrap(), "a\n\n\n\nc");
    }

    #[test]
    fn test_single_paragraph_document() {
        assert_eq!(split_paragraphs("only one").len(), 1);
        assert_eq!(replace_paragraph("only one", 0, "new").unwrap(), "new");
    }
}
