//! Process-wide client
//!
//! A single [`ClientConfig`] shared by the whole process, configured once at
//! startup through the setters below and used by the free-standing
//! operations. Every operation snapshots the configuration, so changing it
//! while requests are in flight only affects later calls.

use std::{
    path::Path,
    sync::{Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
    time::Duration,
};

use compact_str::CompactString;
use once_cell::sync::Lazy;
use reqwest::{Client, Method};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::{
    client::{api::http_client, ClientConfig, KintoneApi, Result},
    domain::{GetBulkParams, PutBulkParams, Record, RecordRevision},
};

static CONFIG: Lazy<RwLock<ClientConfig>> = Lazy::new(|| RwLock::new(ClientConfig::default()));
/// Shared connection pool, rebuilt whenever the configured timeout changes
static HTTP_CLIENT: Lazy<Mutex<Option<(Duration, Client)>>> = Lazy::new(|| Mutex::new(None));

fn read() -> RwLockReadGuard<'static, ClientConfig> {
    CONFIG.read().unwrap_or_else(PoisonError::into_inner)
}

fn write() -> RwLockWriteGuard<'static, ClientConfig> {
    CONFIG.write().unwrap_or_else(PoisonError::into_inner)
}

/// Snapshot of the current process-wide configuration
pub fn config() -> ClientConfig {
    read().clone()
}

/// Replace the process-wide configuration, e.g. with one from [`ClientConfig::builder`]
pub fn configure(config: ClientConfig) {
    *write() = config;
}

/// Client bound to the current configuration
pub fn client() -> Result<KintoneApi> {
    let config = config();
    config.validate()?;

    let timeout = config.request.timeout;
    let mut cached = HTTP_CLIENT.lock().unwrap_or_else(PoisonError::into_inner);
    let client = match cached.as_ref() {
        Some((cached_timeout, client)) if *cached_timeout == timeout => client.clone(),
        _ => {
            let client = http_client(&config)?;
            *cached = Some((timeout, client.clone()));
            client
        },
    };
    drop(cached);

    KintoneApi::with_client(client, config)
}

pub fn set_subdomain(subdomain: &str) {
    write().set_subdomain(subdomain);
}

pub fn set_domain(domain: &str) {
    write().set_domain(domain);
}

pub fn set_account(username: &str, password: &str) {
    write().set_account(username, password);
}

#[deprecated(note = "use `set_account`")]
#[allow(deprecated)]
pub fn set_authorization(username: &str, password: &str) {
    write().set_authorization(username, password);
}

pub fn set_api_token(token: &str) {
    write().set_api_token(token);
}

pub fn set_basic_authentication(username: &str, password: &str) {
    write().set_basic_authentication(username, password);
}

#[deprecated(note = "use `set_basic_authentication`")]
#[allow(deprecated)]
pub fn set_basic_authorization(username: &str, password: &str) {
    write().set_basic_authorization(username, password);
}

/// Forget host and credentials
pub fn reset() {
    write().reset();
}

pub fn url(path: &str) -> CompactString {
    read().url(path)
}

pub fn url_for_get(path: &str, params: &Value) -> CompactString {
    read().url_for_get(path, params)
}

/// See [`KintoneApi::api`]
pub async fn api<P, T>(path_or_url: &str, method: Method, params: &P) -> Result<T>
where
    P: Serialize + ?Sized,
    T: DeserializeOwned,
{
    client()?.api(path_or_url, method, params).await
}

/// See [`KintoneApi::upload_file`]
pub async fn upload_file<T>(file_path: impl AsRef<Path>) -> Result<T>
where
    T: DeserializeOwned,
{
    client()?.upload_file(file_path).await
}

/// See [`KintoneApi::get_bulk_records`]
pub async fn get_bulk_records(params: &GetBulkParams) -> Result<Vec<Record>> {
    client()?.get_bulk_records(params).await
}

/// See [`KintoneApi::put_bulk_records`]
pub async fn put_bulk_records(params: &PutBulkParams) -> Result<Vec<RecordRevision>> {
    client()?.put_bulk_records(params).await
}
