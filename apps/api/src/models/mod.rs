pub mod discount;
pub mod document;
