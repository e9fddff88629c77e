// Avatar uploads to S3-compatible storage.

pub mod handlers;
