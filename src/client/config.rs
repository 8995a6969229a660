//! Configuration management for the kintone client

use std::{borrow::Cow, collections::BTreeMap, path::PathBuf, time::Duration};

use base64::{engine::general_purpose::STANDARD, Engine};
use compact_str::{format_compact, CompactString};
use serde_json::Value;
use tracing::warn;

use super::error::{ClientError, Result};

/// Domain appended to the name given to [`ClientConfig::set_subdomain`]
pub const PROVIDER_DOMAIN: &str = "cybozu.com";
/// Paths starting with this prefix are resolved against the configured host
pub const API_PREFIX: &str = "/k/v1/";

pub const AUTHORIZATION_HEADER: &str = "X-Cybozu-Authorization";
pub const API_TOKEN_HEADER: &str = "X-Cybozu-API-Token";
pub const BASIC_AUTHORIZATION_HEADER: &str = "Authorization";

/// Main configuration for the kintone client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// URL scheme, `https` unless a base URL says otherwise
    pub scheme: CompactString,
    /// Host of the kintone environment, e.g. `example.cybozu.com`
    pub host: Option<CompactString>,
    /// Authentication headers sent with every request
    pub headers: BTreeMap<&'static str, CompactString>,
    /// Request configuration
    pub request: RequestConfig,
    /// Debug configuration
    pub debug: DebugConfig,
}

/// HTTP request configuration
#[derive(Debug, Clone)]
pub struct RequestConfig {
    /// Request timeout
    pub timeout: Duration,
}

/// Debug and logging configuration
#[derive(Debug, Clone)]
pub struct DebugConfig {
    /// Write every response body to `log_directory`
    pub log_responses: bool,
    /// Directory for storing response dumps
    pub log_directory: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            scheme: "https".into(),
            host: None,
            headers: BTreeMap::new(),
            request: RequestConfig::default(),
            debug: DebugConfig::default(),
        }
    }
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self { timeout: Duration::from_secs(30) }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_responses: false,
            log_directory: Some(PathBuf::from("kintone-logs")),
        }
    }
}

impl ClientConfig {
    /// Create an empty configuration; no host and no credentials
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder for fluent configuration
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.request.timeout.is_zero() {
            return Err(ClientError::config("Timeout must be greater than zero"));
        }

        Ok(())
    }

    pub fn set_subdomain(&mut self, subdomain: &str) {
        self.host = Some(format_compact!("{subdomain}.{PROVIDER_DOMAIN}"));
    }

    /// Use a full host name, for environments outside of `cybozu.com`
    pub fn set_domain(&mut self, domain: &str) {
        self.host = Some(domain.into());
    }

    /// Password authentication via `X-Cybozu-Authorization`
    pub fn set_account(&mut self, username: &str, password: &str) {
        self.headers.insert(AUTHORIZATION_HEADER, encode_credentials(username, password));
    }

    #[deprecated(note = "use `set_account`")]
    pub fn set_authorization(&mut self, username: &str, password: &str) {
        warn!("set_authorization is deprecated, use set_account instead");
        self.set_account(username, password);
    }

    pub fn set_api_token(&mut self, token: &str) {
        self.headers.insert(API_TOKEN_HEADER, token.into());
    }

    /// HTTP basic authentication, for environments behind a basic auth gateway
    pub fn set_basic_authentication(&mut self, username: &str, password: &str) {
        self.headers.insert(
            BASIC_AUTHORIZATION_HEADER,
            format_compact!("Basic {}", encode_credentials(username, password)),
        );
    }

    #[deprecated(note = "use `set_basic_authentication`")]
    pub fn set_basic_authorization(&mut self, username: &str, password: &str) {
        warn!("set_basic_authorization is deprecated, use set_basic_authentication instead");
        self.set_basic_authentication(username, password);
    }

    /// Forget host and credentials; request and debug settings are kept
    pub fn reset(&mut self) {
        self.scheme = "https".into();
        self.host = None;
        self.headers.clear();
    }

    /// Full URL of an API path: `https://<host><path>.json`
    pub fn url(&self, path: &str) -> CompactString {
        format_compact!(
            "{}://{}{path}.json",
            self.scheme,
            self.host.as_deref().unwrap_or_default()
        )
    }

    /// [`url`](Self::url) followed by the form encoded `params`
    pub fn url_for_get(&self, path: &str, params: &Value) -> CompactString {
        format_compact!("{}?{}", self.url(path), form_encode(params))
    }

    /// Resolves API paths against the configured host; any other
    /// argument is taken to be a full URL already.
    pub fn resolve(&self, path_or_url: &str) -> Result<CompactString> {
        if !path_or_url.starts_with(API_PREFIX) {
            return Ok(path_or_url.into());
        }

        match self.host {
            Some(_) => Ok(self.url(path_or_url)),
            None => Err(ClientError::MissingDomain),
        }
    }
}

impl ClientConfig {
    /// Set the host by subdomain
    pub fn with_subdomain(mut self, subdomain: &str) -> Self {
        self.set_subdomain(subdomain);
        self
    }

    /// Point the client at a base URL such as `http://127.0.0.1:8080`
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        let base_url = base_url.trim_end_matches('/');
        match base_url.split_once("://") {
            Some((scheme, host)) => {
                self.scheme = scheme.into();
                self.host = Some(host.into());
            },
            None => self.host = Some(base_url.into()),
        }
        self
    }

    /// Set request configuration
    pub fn with_request(mut self, request: RequestConfig) -> Self {
        self.request = request;
        self
    }

    /// Set debug configuration
    pub fn with_debug(mut self, debug: DebugConfig) -> Self {
        self.debug = debug;
        self
    }

    /// Enable debug logging
    pub fn with_debug_logging(mut self, enabled: bool) -> Self {
        self.debug.log_responses = enabled;
        self
    }
}

/// Builder for ClientConfig
#[derive(Debug, Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    pub fn subdomain(mut self, subdomain: &str) -> Self {
        self.config.set_subdomain(subdomain);
        self
    }

    pub fn domain(mut self, domain: &str) -> Self {
        self.config.set_domain(domain);
        self
    }

    pub fn base_url(mut self, base_url: &str) -> Self {
        self.config = self.config.with_base_url(base_url);
        self
    }

    pub fn account(mut self, username: &str, password: &str) -> Self {
        self.config.set_account(username, password);
        self
    }

    pub fn api_token(mut self, token: &str) -> Self {
        self.config.set_api_token(token);
        self
    }

    pub fn basic_authentication(mut self, username: &str, password: &str) -> Self {
        self.config.set_basic_authentication(username, password);
        self
    }

    /// Set request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.request.timeout = timeout;
        self
    }

    /// Enable debug logging
    pub fn debug_logging(mut self, enabled: bool) -> Self {
        self.config.debug.log_responses = enabled;
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<ClientConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

fn encode_credentials(username: &str, password: &str) -> CompactString {
    STANDARD.encode(format!("{username}:{password}")).into()
}

/// Encodes a JSON object as `application/x-www-form-urlencoded`.
///
/// Arrays repeat their key once per element; `null` and nested objects
/// become empty values. Anything but an object encodes to `""`.
pub fn form_encode(params: &Value) -> String {
    let Some(params) = params.as_object() else {
        return String::new();
    };

    let mut pairs = Vec::with_capacity(params.len());
    for (key, value) in params {
        match value {
            Value::Array(items) => pairs.extend(items.iter().map(|item| encode_pair(key, item))),
            value => pairs.push(encode_pair(key, value)),
        }
    }

    pairs.join("&")
}

/// Encodes a JSON object as the query string of an API request.
///
/// Nested values use bracket notation, `fields[0]=$id&fields[1]=title`
/// for arrays and `a[b]=c` for objects, as kintone expects them.
pub fn query_encode(params: &Value) -> String {
    let Some(params) = params.as_object() else {
        return String::new();
    };

    let mut pairs = Vec::new();
    for (key, value) in params {
        push_nested(&mut pairs, key.clone(), value);
    }

    pairs.join("&")
}

fn push_nested(pairs: &mut Vec<String>, key: String, value: &Value) {
    match value {
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                push_nested(pairs, format!("{key}[{index}]"), item);
            }
        },
        Value::Object(fields) => {
            for (field, item) in fields {
                push_nested(pairs, format!("{key}[{field}]"), item);
            }
        },
        value => pairs.push(encode_pair(&key, value)),
    }
}

fn encode_pair(key: &str, value: &Value) -> String {
    let value: Cow<str> = match value {
        Value::String(s) => s.as_str().into(),
        Value::Number(n) => n.to_string().into(),
        Value::Bool(b) => b.to_string().into(),
        Value::Null | Value::Array(_) | Value::Object(_) => "".into(),
    };

    format!("{}={}", urlencoding::encode(key), urlencoding::encode(&value))
}

#[cfg(test)]
mod tests {
    use std::{
        io,
        sync::{Arc, Mutex},
    };

    use serde_json::json;

    use super::*;

    #[test]
    fn test_url() {
        let config = ClientConfig::new().with_subdomain("example");
        assert_eq!(config.url("/k/v1/records"), "https://example.cybozu.com/k/v1/records.json");
    }

    #[test]
    fn test_url_for_get() {
        let config = ClientConfig::new().with_subdomain("example");
        let url = config.url_for_get("/k/v1/records", &json!({ "param": 1, "param2": "abc/d" }));
        assert_eq!(url, "https://example.cybozu.com/k/v1/records.json?param=1&param2=abc%2Fd");
    }

    #[test]
    fn test_form_encode() {
        assert_eq!(
            form_encode(&json!({ "app": 1, "query": "limit 500 offset 0" })),
            "app=1&query=limit%20500%20offset%200"
        );
        assert_eq!(
            form_encode(&json!({ "fields": ["$id", "title"], "none": null, "ok": true })),
            "fields=%24id&fields=title&none=&ok=true"
        );
        assert_eq!(form_encode(&json!({})), "");
        assert_eq!(form_encode(&json!("not an object")), "");
    }

    #[test]
    fn test_query_encode() {
        assert_eq!(
            query_encode(&json!({ "app": 1, "fields": ["$id", "title"] })),
            "app=1&fields%5B0%5D=%24id&fields%5B1%5D=title"
        );
        assert_eq!(
            query_encode(&json!({ "a": { "b": "c/d" }, "empty": [], "none": null })),
            "a%5Bb%5D=c%2Fd&none="
        );
        assert_eq!(query_encode(&json!(null)), "");
    }

    #[test]
    fn test_resolve() {
        let config = ClientConfig::new();
        assert!(matches!(config.resolve("/k/v1/records"), Err(ClientError::MissingDomain)));
        assert_eq!(
            config.resolve("https://example.cybozu.com/").unwrap(),
            "https://example.cybozu.com/"
        );

        let config = config.with_subdomain("example");
        assert_eq!(
            config.resolve("/k/v1/records").unwrap(),
            "https://example.cybozu.com/k/v1/records.json"
        );
    }

    #[test]
    fn test_credential_headers() {
        let mut config = ClientConfig::new();
        config.set_account("Alice", "Password1");
        config.set_api_token("ThisIsToken");
        config.set_basic_authentication("Selka", "Password2");

        assert_eq!(config.headers[AUTHORIZATION_HEADER], "QWxpY2U6UGFzc3dvcmQx");
        assert_eq!(config.headers[API_TOKEN_HEADER], "ThisIsToken");
        assert_eq!(config.headers[BASIC_AUTHORIZATION_HEADER], "Basic U2Vsa2E6UGFzc3dvcmQy");
    }

    #[test]
    #[allow(deprecated)]
    fn test_deprecated_setters_match_current_ones() {
        let mut current = ClientConfig::new();
        current.set_account("Alice", "Password1");
        current.set_basic_authentication("Selka", "Password2");

        let mut deprecated = ClientConfig::new();
        deprecated.set_authorization("Alice", "Password1");
        deprecated.set_basic_authorization("Selka", "Password2");

        assert_eq!(current.headers, deprecated.headers);
    }

    #[derive(Clone, Default)]
    struct CaptureWriter(Arc<Mutex<Vec<u8>>>);

    impl io::Write for CaptureWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    #[allow(deprecated)]
    fn test_deprecated_setters_warn() {
        let output = CaptureWriter::default();
        let writer = output.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            let mut config = ClientConfig::new();
            config.set_authorization("Alice", "Password1");
            config.set_basic_authorization("Selka", "Password2");
        });

        let logs = String::from_utf8(output.0.lock().unwrap().clone()).unwrap();
        assert!(logs.contains("WARN"));
        assert!(logs.contains("set_authorization is deprecated, use set_account instead"));
        assert!(logs.contains(
            "set_basic_authorization is deprecated, use set_basic_authentication instead"
        ));
    }

    #[test]
    fn test_last_write_wins() {
        let mut config = ClientConfig::new();
        config.set_api_token("first");
        config.set_api_token("second");

        assert_eq!(config.headers.len(), 1);
        assert_eq!(config.headers[API_TOKEN_HEADER], "second");
    }

    #[test]
    fn test_reset() {
        let mut config = ClientConfig::new().with_base_url("http://127.0.0.1:8080");
        config.set_api_token("token");
        config.reset();

        assert_eq!(config.scheme, "https");
        assert!(config.host.is_none());
        assert!(config.headers.is_empty());
    }

    #[test]
    fn test_base_url() {
        let config = ClientConfig::new().with_base_url("http://127.0.0.1:8080/");
        assert_eq!(config.url("/k/v1/file"), "http://127.0.0.1:8080/k/v1/file.json");
    }

    #[test]
    fn test_config_builder() {
        let config = ClientConfig::builder()
            .domain("example.kintone.com")
            .api_token("token")
            .timeout(Duration::from_secs(5))
            .debug_logging(true)
            .build()
            .unwrap();

        assert_eq!(config.host.as_deref(), Some("example.kintone.com"));
        assert_eq!(config.headers[API_TOKEN_HEADER], "token");
        assert_eq!(config.request.timeout, Duration::from_secs(5));
        assert!(config.debug.log_responses);
    }

    #[test]
    fn test_config_validation() {
        assert!(ClientConfig::new().validate().is_ok());

        let result = ClientConfig::builder().timeout(Duration::ZERO).build();
        assert!(matches!(result, Err(ClientError::Config(_))));
    }
}
