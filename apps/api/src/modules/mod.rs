// Module selection and validation for the wizard document types.
// Completeness is derived from form data on every call, never stored.

pub mod definitions;
pub mod payload;
pub mod selection;
