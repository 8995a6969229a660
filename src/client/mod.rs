//! kintone client modules
//!
//! [`KintoneApi`] owns a [`ClientConfig`] and performs the HTTP calls;
//! the bulk operations live in [`bulk`] as further methods on it.

pub mod api;
pub mod bulk;
pub mod config;
pub mod error;

#[cfg(test)]
mod tests;

// Re-export main types for convenience
pub use api::KintoneApi;
pub use config::ClientConfig;
pub use error::{ClientError, Result};
