//! Resume template rendering.
//!
//! Rendering is a pure function of `(normalized resume, palette, section
//! order)`. Two layouts consume the same `StandardResume` shape; which one
//! runs, which palette colors it, and where each section sits are all data.

pub mod gazette;
pub mod handlers;
pub mod ledger;
pub mod order;
pub mod standard;
pub mod theme;

pub use order::SectionOrder;
pub use standard::StandardResume;
pub use theme::ThemePalette;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumeTemplate {
    /// Single column, ruled headings.
    Gazette,
    /// Two columns with a tinted sidebar.
    Ledger,
}

impl ResumeTemplate {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "gazette" => Some(ResumeTemplate::Gazette),
            "ledger" => Some(ResumeTemplate::Ledger),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ResumeTemplate::Gazette => "gazette",
            ResumeTemplate::Ledger => "ledger",
        }
    }

    /// The section placement a layout uses when the caller supplies none.
    pub fn default_order(self) -> SectionOrder {
        match self {
            ResumeTemplate::Gazette => SectionOrder::single_column(),
            ResumeTemplate::Ledger => SectionOrder::with_sidebar(),
        }
    }

    pub fn render(
        self,
        resume: &StandardResume,
        palette: &ThemePalette,
        order: &SectionOrder,
    ) -> String {
        match self {
            ResumeTemplate::Gazette => gazette::render(resume, palette, order),
            ResumeTemplate::Ledger => ledger::render(resume, palette, order),
        }
    }
}
