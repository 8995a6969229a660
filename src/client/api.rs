//! Core HTTP client for the kintone REST API

use std::path::Path;

use chrono::Local;
use compact_str::CompactString;
use reqwest::{
    multipart::{Form, Part},
    Body, Client, Method, RequestBuilder, Response,
};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tokio::fs::File;
use tokio_util::io::ReaderStream;
use tracing::{debug, instrument, warn};

use super::{
    config::{query_encode, ClientConfig},
    error::{ClientError, Result},
};

pub const FILE_PATH: &str = "/k/v1/file";
pub const RECORDS_PATH: &str = "/k/v1/records";

/// HTTP client for the kintone REST API
#[derive(Debug, Clone)]
pub struct KintoneApi {
    client: Client,
    config: ClientConfig,
}

impl KintoneApi {
    /// Create a new kintone API client
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;
        let client = http_client(&config)?;

        Ok(Self { client, config })
    }

    /// Create a client sharing an existing connection pool
    pub fn with_client(client: Client, config: ClientConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { client, config })
    }

    /// Send a request and decode the JSON answer.
    ///
    /// `path_or_url` is either an API path such as `/k/v1/records`, resolved
    /// against the configured host, or a full URL. GET requests carry
    /// `params` in the query string, every other method as JSON body.
    #[instrument(skip(self, method, params), fields(method = %method))]
    pub async fn api<P, T>(&self, path_or_url: &str, method: Method, params: &P) -> Result<T>
    where
        P: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.config.resolve(path_or_url)?;

        let request = if method == Method::GET {
            let params = serde_json::to_value(params)
                .map_err(|e| ClientError::json_parse(url.as_str(), e))?;
            let url = append_query(url, &query_encode(&params));
            self.authenticated_request(Method::GET, &url)
        } else {
            self.authenticated_request(method, &url).json(params)
        };

        let response = request.send().await?;
        self.handle_response(response).await
    }

    /// Upload a file as multipart form data, returning the decoded answer
    /// (`{"fileKey": ..}` on success).
    ///
    /// The file is streamed; the handle is owned by the request body and
    /// closed once the request completes or fails.
    #[instrument(skip(self, file_path), fields(file = %file_path.as_ref().display()))]
    pub async fn upload_file<T>(&self, file_path: impl AsRef<Path>) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let file_path = file_path.as_ref();
        let url = self.config.resolve(FILE_PATH)?;

        let file = File::open(file_path)
            .await
            .map_err(|e| ClientError::io(file_path, e))?;
        let length = file
            .metadata()
            .await
            .map_err(|e| ClientError::io(file_path, e))?
            .len();

        let file_name = file_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        debug!(file_name = %file_name, length, "Uploading file");

        let part = Part::stream_with_length(Body::wrap_stream(ReaderStream::new(file)), length)
            .file_name(file_name);
        let form = Form::new().part("file", part);

        let response = self
            .authenticated_request(Method::POST, &url)
            .multipart(form)
            .send()
            .await?;
        self.handle_response(response).await
    }

    /// Update configuration
    pub fn update_config(&mut self, config: ClientConfig) -> Result<()> {
        config.validate()?;
        self.config = config;
        Ok(())
    }

    /// Get current configuration
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Full URL of an API path
    pub fn url(&self, path: &str) -> CompactString {
        self.config.url(path)
    }

    /// Full URL of an API path including `params` as query string
    pub fn url_for_get(&self, path: &str, params: &Value) -> CompactString {
        self.config.url_for_get(path, params)
    }

    // Private helper methods

    /// Create request builder carrying the configured authentication headers
    fn authenticated_request(&self, method: Method, url: &str) -> RequestBuilder {
        self.config
            .headers
            .iter()
            .fold(self.client.request(method, url), |request, (name, value)| {
                request.header(*name, value.as_str())
            })
    }

    /// Handle HTTP response and deserialize JSON
    async fn handle_response<T>(&self, response: Response) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let url_path = response.url().path().to_string();
        let status = response.status();
        let body = response.text().await?;

        // Log response if debug is enabled
        if self.config.debug.log_responses {
            self.log_response_to_file(&url_path, &body);
        }

        if !status.is_success() {
            debug!(status = %status, path = %url_path, "Request rejected");
            return Err(ClientError::status(status, body));
        }

        let body = if body.trim().is_empty() { "null" } else { body.as_str() };
        serde_json::from_str(body).map_err(|e| ClientError::json_parse(url_path, e))
    }

    /// Log HTTP response to file for debugging
    fn log_response_to_file(&self, path: &str, body: &str) {
        if let Some(log_dir) = &self.config.debug.log_directory {
            if !log_dir.exists() {
                if let Err(e) = std::fs::create_dir_all(log_dir) {
                    warn!("Failed to create log directory: {}", e);
                    return;
                }
            }

            let filename = format!(
                "{}_{}.json",
                Local::now().format("%Y-%m-%d_%H-%M-%S%.3f"),
                path.replace('/', "_")
            );

            let log_path = log_dir.join(filename);

            if let Err(e) = std::fs::write(&log_path, body) {
                warn!("Failed to write response log to {:?}: {}", log_path, e);
            } else {
                debug!("Response logged to {:?}", log_path);
            }
        }
    }
}

/// Build an HTTP client applying the request settings of `config`
pub fn http_client(config: &ClientConfig) -> Result<Client> {
    Client::builder()
        .timeout(config.request.timeout)
        .build()
        .map_err(ClientError::Http)
}

fn append_query(url: CompactString, query: &str) -> CompactString {
    if query.is_empty() {
        return url;
    }

    let separator = if url.contains('?') { '&' } else { '?' };
    let mut url = url;
    url.push(separator);
    url.push_str(query);
    url
}
