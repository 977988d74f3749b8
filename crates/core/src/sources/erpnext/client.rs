use std::time::Duration;

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::ErpNextConfig;
use crate::error::{GirderError, Result};

use super::models::ResourceEnvelope;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Thin client for the ERPNext (Frappe) resource REST API.
///
/// Fetches `GET {base_url}/api/resource/{doctype}` with a JSON `fields`
/// projection, a JSON `filters` object, and `limit_page_length` /
/// `limit_start` paging. Requests carry a `token <key>:<secret>` header when
/// credentials are configured and go out unauthenticated otherwise.
pub struct ErpNextClient {
    base_url: String,
    api_key: String,
    api_secret: String,
    page_size: u64,
    http: reqwest::Client,
}

enum PageError {
    Transport(reqwest::Error),
    Status(StatusCode, String),
    Malformed(String),
}

impl PageError {
    /// Transport failures and server errors are worth one retry; client
    /// errors and bad payloads are not.
    fn retryable(&self) -> bool {
        match self {
            PageError::Transport(_) => true,
            PageError::Status(status, _) => status.is_server_error(),
            PageError::Malformed(_) => false,
        }
    }

    fn into_girder(self, doctype: &str) -> GirderError {
        match self {
            PageError::Transport(e) => GirderError::Http(e),
            PageError::Status(status, body) => GirderError::Fetch(format!(
                "{doctype} request failed with status {status}: {body}"
            )),
            PageError::Malformed(msg) => {
                GirderError::Fetch(format!("{doctype} returned a malformed payload: {msg}"))
            }
        }
    }
}

impl ErpNextClient {
    pub fn new(config: &ErpNextConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            api_secret: config.api_secret.clone(),
            page_size: config.page_size.max(1),
            http,
        }
    }

    /// Fetch every record of a doctype, paging until a short page.
    ///
    /// `fields` is the projection (empty means `["*"]`); `filters` defaults
    /// to the empty filter set, i.e. the full collection.
    pub async fn list_all<T: DeserializeOwned>(
        &self,
        doctype: &str,
        fields: &[&str],
        filters: Option<&Value>,
    ) -> Result<Vec<T>> {
        let mut results: Vec<T> = Vec::new();
        let mut start: u64 = 0;

        loop {
            let page = self.fetch_page(doctype, fields, filters, start).await?;
            let page_len = page.len() as u64;
            debug!(doctype, start, page_len, "Fetched page");
            results.extend(page);

            if page_len < self.page_size {
                break;
            }
            start += self.page_size;
        }

        Ok(results)
    }

    /// Verify the remote end is reachable by requesting a single project row.
    pub async fn ping(&self) -> Result<()> {
        let _: Vec<Value> = self.fetch_page("Project", &["name"], None, 0).await?;
        Ok(())
    }

    /// Fetch one page, retrying once on transport errors and 5xx responses.
    ///
    /// The retry budget is per page, not per record, so a flaky remote gets
    /// one more chance per request without unbounded stalls.
    async fn fetch_page<T: DeserializeOwned>(
        &self,
        doctype: &str,
        fields: &[&str],
        filters: Option<&Value>,
        start: u64,
    ) -> Result<Vec<T>> {
        match self.request_page(doctype, fields, filters, start).await {
            Ok(data) => Ok(data),
            Err(err) if err.retryable() => {
                warn!(doctype, start, "Page fetch failed, retrying once");
                self.request_page(doctype, fields, filters, start)
                    .await
                    .map_err(|e| e.into_girder(doctype))
            }
            Err(err) => Err(err.into_girder(doctype)),
        }
    }

    async fn request_page<T: DeserializeOwned>(
        &self,
        doctype: &str,
        fields: &[&str],
        filters: Option<&Value>,
        start: u64,
    ) -> std::result::Result<Vec<T>, PageError> {
        let fields_json = if fields.is_empty() {
            "[\"*\"]".to_string()
        } else {
            serde_json::to_string(fields).unwrap_or_else(|_| "[\"*\"]".to_string())
        };
        let filters_json = filters.map(|f| f.to_string()).unwrap_or_else(|| "{}".to_string());

        let url = format!("{}/api/resource/{}", self.base_url, doctype);
        let page_length = self.page_size.to_string();
        let start_param = start.to_string();
        let mut request = self.http.get(&url).query(&[
            ("fields", fields_json.as_str()),
            ("filters", filters_json.as_str()),
            ("limit_page_length", page_length.as_str()),
            ("limit_start", start_param.as_str()),
        ]);

        if !self.api_key.is_empty() && !self.api_secret.is_empty() {
            request = request.header(
                reqwest::header::AUTHORIZATION,
                format!("token {}:{}", self.api_key, self.api_secret),
            );
        }

        let response = request.send().await.map_err(PageError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PageError::Status(status, body));
        }

        let envelope: ResourceEnvelope<T> = response
            .json()
            .await
            .map_err(|e| PageError::Malformed(e.to_string()))?;
        Ok(envelope.data)
    }
}
