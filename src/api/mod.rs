/// Public API for the HTTP transport layer.
pub mod client;
pub mod errors;

pub use client::{Client, ClientConfig, Endpoint};
pub use errors::ApiError;
