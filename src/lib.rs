//! Client for the kintone REST API.
//!
//! ```no_run
//! use kintone_client::{global as kintone, GetBulkParams};
//!
//! # async fn run() -> kintone_client::Result<()> {
//! kintone::set_subdomain("example");
//! kintone::set_api_token("token");
//!
//! let records = kintone::get_bulk_records(&GetBulkParams::new(1u64)).await?;
//! let plain = kintone_client::map_records_values(records);
//! # Ok(())
//! # }
//! ```
//!
//! Use [`KintoneApi`] directly when more than one environment is needed.

pub mod client;
pub mod domain;
pub mod global;
pub mod id;
pub mod logging;

pub use client::{ClientConfig, ClientError, KintoneApi, Result};
pub use domain::{
    map_records_values, map_values, FileUploadResponse, GetBulkParams, PutBulkParams, Record,
    RecordRevision,
};
pub use id::AppId;
pub use reqwest::Method;
