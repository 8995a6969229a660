// kintone REST API documentation: https://kintone.dev/en/docs/kintone/rest-api/
use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::id::AppId;

/// A kintone record: field code mapped to its field object,
/// e.g. `{"$id": {"type": "__ID__", "value": "1"}}`.
pub type Record = Map<String, Value>;

/// Parameters of [`get_bulk_records`](crate::client::KintoneApi::get_bulk_records).
#[derive(Debug, Clone, Serialize)]
pub struct GetBulkParams {
    pub app: AppId,
    /// Record query without `limit`/`offset`; those are appended per page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<CompactString>,
    /// Forwarded untouched to every page request (`fields`, `totalCount`, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl GetBulkParams {
    pub fn new(app: impl Into<AppId>) -> Self {
        Self { app: app.into(), query: None, extra: Map::new() }
    }

    pub fn with_query(mut self, query: impl Into<CompactString>) -> Self {
        self.query = Some(query.into());
        self
    }

    /// Extra request parameter. Keys named `app` or `query` are ignored by
    /// bulk retrieval, which always sends the struct fields.
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}

/// Parameters of [`put_bulk_records`](crate::client::KintoneApi::put_bulk_records).
///
/// Each entry of `records` is sent as is, normally `{"id": .., "record": {..}}`
/// or `{"updateKey": {..}, "record": {..}}`.
#[derive(Debug, Clone, Serialize)]
pub struct PutBulkParams {
    pub app: AppId,
    pub records: Vec<Value>,
}

impl PutBulkParams {
    pub fn new(app: impl Into<AppId>, records: Vec<Value>) -> Self {
        Self { app: app.into(), records }
    }
}

/// Response of `GET /k/v1/records`
#[derive(Debug, Clone, Deserialize)]
pub struct RecordsPage {
    pub records: Vec<Record>,
    #[serde(rename = "totalCount", default)]
    pub total_count: Option<CompactString>,
}

/// One updated record as reported by `PUT /k/v1/records`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RecordRevision {
    pub id: CompactString,
    pub revision: CompactString,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecordRevisions {
    pub records: Vec<RecordRevision>,
}

/// Response of `POST /k/v1/file`; the key is used to attach the file to a record.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FileUploadResponse {
    #[serde(rename = "fileKey")]
    pub file_key: CompactString,
}

/// Replaces every field object carrying a `value` key with that value.
/// Fields of any other shape are left as they are.
pub fn map_values(mut record: Record) -> Record {
    for field in record.values_mut() {
        if let Some(value) = field.as_object_mut().and_then(|obj| obj.remove("value")) {
            *field = value;
        }
    }
    record
}

pub fn map_records_values(records: Vec<Record>) -> Vec<Record> {
    records.into_iter().map(map_values).collect()
}
