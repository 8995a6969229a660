//! Test utilities and common test fixtures for client modules

use std::sync::atomic::{AtomicUsize, Ordering};

use serde_json::{json, Value};
use wiremock::{Request, Respond, ResponseTemplate};

use crate::client::{api::KintoneApi, config::ClientConfig};


/// A stored record as kintone returns it
pub fn sample_record_json() -> Value {
    json!({ "$id": { "type": "__ID__", "value": "id" } })
}

/// One element of a bulk update payload
pub fn sample_update_json() -> Value {
    json!({ "id": "id", "record": { "title": { "value": "updated" } } })
}

/// kintone API error response
pub fn kintone_error_response(code: &str, message: &str) -> Value {
    json!({
        "code": code,
        "id": "1505999166-897850006",
        "message": message
    })
}

/// Serves `GET /k/v1/records` from a pool of `total` records, honouring the
/// `limit` in the query of every request.
pub struct RecordPool {
    remaining: AtomicUsize,
}

impl RecordPool {
    pub fn new(total: usize) -> Self {
        Self { remaining: AtomicUsize::new(total) }
    }
}

impl Respond for RecordPool {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let limit = request
            .url
            .query_pairs()
            .find(|(key, _)| key == "query")
            .and_then(|(_, query)| {
                query
                    .split_whitespace()
                    .skip_while(|word| *word != "limit")
                    .nth(1)
                    .and_then(|n| n.parse::<usize>().ok())
            })
            .unwrap_or(0);

        let remaining = self.remaining.load(Ordering::SeqCst);
        let count = remaining.min(limit);
        self.remaining.store(remaining - count, Ordering::SeqCst);

        ResponseTemplate::new(200)
            .set_body_json(json!({ "records": vec![sample_record_json(); count], "totalCount": null }))
    }
}

/// Answers `PUT /k/v1/records` with one revision per record in the request body
pub struct EchoRevisions;

impl Respond for EchoRevisions {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let body: Value = serde_json::from_slice(&request.body).unwrap_or_default();
        let count = body["records"].as_array().map_or(0, Vec::len);
        let revisions = vec![json!({ "id": "id", "revision": "revision" }); count];

        ResponseTemplate::new(200).set_body_json(json!({ "records": revisions }))
    }
}

/// Mock HTTP server for testing
pub struct MockServer {
    pub server: wiremock::MockServer,
}

impl MockServer {
    /// Start a new mock server
    pub async fn start() -> Self {
        let server = wiremock::MockServer::start().await;
        Self { server }
    }

    /// Get the base URL of the mock server
    pub fn base_url(&self) -> String {
        self.server.uri()
    }

    /// Create a test config pointing to this mock server
    pub fn test_config(&self) -> ClientConfig {
        ClientConfig::new().with_base_url(&self.base_url())
    }

    /// Create a client pointing to this mock server
    pub fn api(&self) -> KintoneApi {
        KintoneApi::new(self.test_config()).unwrap()
    }

    /// Number of requests received so far
    pub async fn request_count(&self) -> usize {
        self.server.received_requests().await.map_or(0, |r| r.len())
    }
}
