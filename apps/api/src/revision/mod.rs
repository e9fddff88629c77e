// Revision of generated documents: settings validation, the single-use
// free revision entitlement, paragraph slicing, and the route handlers.

pub mod entitlement;
pub mod handlers;
pub mod paragraphs;
pub mod settings;
