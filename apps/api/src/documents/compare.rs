//! Positional line comparison between two document versions.
//!
//! Lines are paired by index: pair i of the output holds line i of each
//! text, padded with `None` where one text is shorter. A pair is changed
//! when its sides differ. An inserted line therefore shifts everything
//! after it out of alignment and marks those pairs changed; callers that
//! need alignment-aware diffs would swap this implementation behind the
//! same `compare` signature.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LineDiff {
    pub changed: bool,
    pub left: Option<String>,
    pub right: Option<String>,
}

pub fn compare(left: &str, right: &str) -> Vec<LineDiff> {
    let left_lines: Vec<&str> = left.lines().collect();
    let right_lines: Vec<&str> = right.lines().collect();
    let len = left_lines.len().max(right_lines.len());

    (0..len)
        .map(|i| {
            let l = left_lines.get(i).map(|s| s.to_string());
            let r = right_lines.get(i).map(|s| s.to_string());
            LineDiff {
                changed: l != r,
                left: l,
                right: r,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_texts_have_no_changes() {
        let text = "line one\nline two\nline three";
        let diff = compare(text, text);
        assert_eq!(diff.len(), 3);
        assert!(diff.iter().all(|d| !d.changed));
    }

    #[test]
    fn test_single_edited_line_flagged() {
        let diff = compare("alpha\nbeta\ngamma", "alpha\nBETA\ngamma");
        assert!(!diff[0].changed);
        assert!(diff[1].changed);
        assert_eq!(diff[1].left.as_deref(), Some("beta"));
        assert_eq!(diff[1].right.as_deref(), Some("BETA"));
        assert!(!diff[2].changed);
    }

    #[test]
    fn test_shorter_side_padded_with_none() {
        let diff = compare("one\ntwo\nthree", "one");
        assert_eq!(diff.len(), 3);
        assert!(!diff[0].changed);
        assert!(diff[1].changed);
        assert_eq!(diff[1].right, None);
        assert_eq!(diff[2].left.as_deref(), Some("three"));
    }

    #[test]
    fn test_insertion_shifts_alignment() {
        // Positional pairing: the inserted line misaligns everything below.
        let diff = compare("a\nb", "a\nNEW\nb");
        assert!(!diff[0].changed);
        assert!(diff[1].changed);
        assert!(diff[2].changed);
        assert_eq!(diff[2].left, None);
        assert_eq!(diff[2].right.as_deref(), Some("b"));
    }

    #[test]
    fn test_both_empty_is_empty_diff() {
        assert!(compare("", "").is_empty());
    }
}
