// Checkout sessions and discount codes. Payment processing itself lives
// with the hosted provider.

pub mod client;
pub mod discount;
pub mod handlers;
