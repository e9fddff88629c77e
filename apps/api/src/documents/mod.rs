// Document store, version history and the positional comparison view.

pub mod compare;
pub mod handlers;
pub mod store;
