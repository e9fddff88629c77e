use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

/// The document kinds the wizards produce.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    CoverLetter,
    Resume,
    Sop,
}

impl DocumentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::CoverLetter => "cover_letter",
            DocumentKind::Resume => "resume",
            DocumentKind::Sop => "sop",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "cover_letter" => Some(DocumentKind::CoverLetter),
            "resume" => Some(DocumentKind::Resume),
            "sop" => Some(DocumentKind::Sop),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VersionType {
    Original,
    Revised,
}

impl VersionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            VersionType::Original => "original",
            VersionType::Revised => "revised",
        }
    }
}

/// Status reported by the external workflow runner for a run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    Running,
    Succeeded,
    Failed,
    Stopped,
}

impl WorkflowStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "running" => Some(WorkflowStatus::Running),
            "succeeded" => Some(WorkflowStatus::Succeeded),
            "failed" => Some(WorkflowStatus::Failed),
            "stopped" => Some(WorkflowStatus::Stopped),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DocumentRow {
    pub id: Uuid,
    pub document_type: String,
    pub title: String,
    /// Module-specific form data keyed by section id.
    pub form_data: Value,
    /// Section id -> selected flag.
    pub module_selection: Value,
    pub content: Option<String>,
    pub word_count: i32,
    /// Run id of the workflow that produced `content`. Null when content
    /// came from the local fallback assembly.
    pub ai_workflow_id: Option<String>,
    pub language: String,
    pub has_used_free_revision: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DocumentRow {
    pub fn kind(&self) -> Option<DocumentKind> {
        DocumentKind::parse(&self.document_type)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DocumentVersionRow {
    pub id: Uuid,
    pub document_id: Uuid,
    pub version: i32,
    pub version_type: String,
    pub content: String,
    pub word_count: i32,
    /// Settings that produced a revised version. Null for the original.
    pub revision_settings: Option<Value>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_kind_round_trip() {
        for kind in [
            DocumentKind::CoverLetter,
            DocumentKind::Resume,
            DocumentKind::Sop,
        ] {
            assert_eq!(DocumentKind::parse(kind.as_str()), Some(kind));
        }
    }

    #[test]
    fn test_document_kind_rejects_unknown() {
        assert_eq!(DocumentKind::parse("poem"), None);
        assert_eq!(DocumentKind::parse(""), None);
    }

    #[test]
    fn test_workflow_status_parse() {
        assert_eq!(WorkflowStatus::parse("running"), Some(WorkflowStatus::Running));
        assert_eq!(WorkflowStatus::parse("succeeded"), Some(WorkflowStatus::Succeeded));
        assert_eq!(WorkflowStatus::parse("failed"), Some(WorkflowStatus::Failed));
        assert_eq!(WorkflowStatus::parse("stopped"), Some(WorkflowStatus::Stopped));
        assert_eq!(WorkflowStatus::parse("paused"), None);
    }

    #[test]
    fn test_version_type_wire_strings() {
        assert_eq!(VersionType::Original.as_str(), "original");
        assert_eq!(VersionType::Revised.as_str(), "revised");
    }
}
