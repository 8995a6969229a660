//! Bulk record operations on top of [`KintoneApi`]
//!
//! kintone caps `GET /k/v1/records` at 500 records and `PUT /k/v1/records`
//! at 100 records per request. The operations here page through those
//! limits with strictly sequential requests and return the concatenated
//! results in request order.

use reqwest::Method;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, instrument};

use super::{
    api::{KintoneApi, RECORDS_PATH},
    error::{ClientError, Result},
};
use crate::{
    domain::{GetBulkParams, PutBulkParams, Record, RecordRevision, RecordRevisions, RecordsPage},
    id::AppId,
};

/// Maximum number of records returned by one `GET /k/v1/records`
pub const GET_LIMIT: usize = 500;
/// Maximum number of records accepted by one `PUT /k/v1/records`
pub const EDIT_LIMIT: usize = 100;

#[derive(Serialize)]
struct PutChunk<'a> {
    app: &'a AppId,
    records: &'a [Value],
}

impl KintoneApi {
    /// Fetch every record matching `params.query`.
    ///
    /// Each page appends `limit 500 offset <n>` to the query and the loop
    /// stops at the first page holding fewer than 500 records. There is no
    /// other bound: a server that always answers with exactly 500 records
    /// keeps this loop going.
    #[instrument(skip(self, params), fields(app = %params.app))]
    pub async fn get_bulk_records(&self, params: &GetBulkParams) -> Result<Vec<Record>> {
        let base_query = params.query.as_deref().unwrap_or_default();
        let app = serde_json::to_value(&params.app)
            .map_err(|e| ClientError::json_parse(RECORDS_PATH, e))?;
        let mut records = Vec::new();
        let mut offset = 0;

        loop {
            // `app` and the paging query always win over extra params of the same name
            let mut page_params = params.extra.clone();
            page_params.insert("app".into(), app.clone());
            page_params.insert(
                "query".into(),
                Value::String(format!("{base_query} limit {GET_LIMIT} offset {offset}")),
            );

            let page: RecordsPage = self.api(RECORDS_PATH, Method::GET, &page_params).await?;
            let fetched = page.records.len();
            debug!(offset, fetched, "Fetched records page");
            records.extend(page.records);

            offset += GET_LIMIT;
            if fetched < GET_LIMIT {
                break;
            }
        }

        info!(record_count = records.len(), "Fetched records");
        Ok(records)
    }

    /// Update `params.records` in chunks of 100.
    ///
    /// At least one request is sent, so an empty `records` list still
    /// reaches the server as a single empty update.
    #[instrument(skip(self, params), fields(app = %params.app, record_count = params.records.len()))]
    pub async fn put_bulk_records(&self, params: &PutBulkParams) -> Result<Vec<RecordRevision>> {
        let total = params.records.len();
        let mut revisions = Vec::with_capacity(total);
        let mut offset = 0;

        loop {
            let end = (offset + EDIT_LIMIT).min(total);
            let chunk = PutChunk {
                app: &params.app,
                records: &params.records[offset..end],
            };

            let res: RecordRevisions = self.api(RECORDS_PATH, Method::PUT, &chunk).await?;
            debug!(offset, updated = res.records.len(), "Updated records chunk");
            revisions.extend(res.records);

            offset += EDIT_LIMIT;
            if offset >= total {
                break;
            }
        }

        info!(updated = revisions.len(), "Updated records");
        Ok(revisions)
    }
}
