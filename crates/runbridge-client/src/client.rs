//! HTTP implementation of [`AppService`].

use crate::auth::AuthConfig;
use crate::retry::{RetryPolicy, status_error};
use crate::service::{AppService, RecordStream};
use crate::types::{ListResponse, SubmitRunRequest};
use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt};
use reqwest::header::ACCEPT;
use runbridge_core::{BridgeConfig, Error, Result, RunHandle, RunStatusReport};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::time::Duration;
use tokio_util::codec::{FramedRead, LinesCodec};
use tokio_util::io::StreamReader;
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Hard ceiling on listing pages, in case the service never stops paging
const MAX_PAGES: usize = 100;

/// Longest single stream record accepted
const MAX_RECORD_LEN: usize = 4 * 1024 * 1024;

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Client for the remote execution service.
///
/// Owns every outbound call the bridge makes. Listing and describing are
/// retried with backoff; submission and status reads are single attempts.
#[derive(Debug, Clone)]
pub struct RunClient {
    http: reqwest::Client,
    base_url: Url,
    auth: AuthConfig,
    retry: RetryPolicy,
    request_timeout: Duration,
}

impl RunClient {
    /// Create a client for `base_url`. A trailing slash is added if missing so
    /// relative endpoints resolve beneath it.
    pub fn new(base_url: &str, auth: AuthConfig) -> Result<Self> {
        let mut base_url = Url::parse(base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(Error::config_error(format!(
                "service base URL '{}' cannot hold endpoint paths",
                base_url
            )));
        }
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            http: reqwest::Client::new(),
            base_url,
            auth,
            retry: RetryPolicy::default(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        })
    }

    pub fn from_config(config: &BridgeConfig) -> Result<Self> {
        let auth = AuthConfig::from_config(config)?;
        Ok(Self::new(&config.service.base_url, auth)?
            .with_retry(RetryPolicy::from_config(&config.retry))
            .with_request_timeout(Duration::from_secs(config.service.request_timeout_secs)))
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Applies to every request except stream reads
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| Error::config_error("service base URL cannot hold endpoint paths"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// One authenticated GET, decoded as JSON
    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        debug!(url = %url, "GET");
        let request = self
            .auth
            .apply_to_request(self.http.get(url).timeout(self.request_timeout));
        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, body));
        }

        Ok(response.json::<T>().await?)
    }

    async fn list_page(&self, cursor: Option<&str>) -> Result<ListResponse> {
        let mut url = self.endpoint(&["tools"])?;
        if let Some(cursor) = cursor {
            url.query_pairs_mut().append_pair("cursor", cursor);
        }
        self.retry
            .retry("list_tools", move || self.get_json(url.clone()))
            .await
    }
}

#[async_trait]
impl AppService for RunClient {
    #[instrument(skip(self))]
    async fn list_tools(&self) -> Result<Vec<Value>> {
        let mut records = Vec::new();
        let mut seen_cursors = HashSet::new();
        let mut cursor: Option<String> = None;

        for page in 1..=MAX_PAGES {
            let (batch, next) = self.list_page(cursor.as_deref()).await?.into_parts();
            debug!(page, count = batch.len(), "Fetched tool page");
            records.extend(batch);

            match next {
                None => break,
                Some(next) if !seen_cursors.insert(next.clone()) => {
                    warn!(cursor = %next, "Listing repeated a cursor, stopping");
                    break;
                }
                Some(_) if page == MAX_PAGES => {
                    warn!(pages = MAX_PAGES, "Listing page limit reached, stopping");
                }
                Some(next) => cursor = Some(next),
            }
        }

        info!(count = records.len(), "Listed remote tools");
        Ok(records)
    }

    #[instrument(skip(self))]
    async fn describe_tool(&self, tool_id: &str) -> Result<Value> {
        let url = self.endpoint(&["tools", tool_id])?;
        self.retry
            .retry("describe_tool", move || self.get_json(url.clone()))
            .await
    }

    #[instrument(skip(self, inputs))]
    async fn submit_run(&self, tool_id: &str, inputs: &Map<String, Value>) -> Result<RunHandle> {
        let url = self.endpoint(&["runs"])?;
        let body = SubmitRunRequest {
            tool: tool_id,
            inputs,
        };
        let request = self.auth.apply_to_request(
            self.http
                .post(url)
                .timeout(self.request_timeout)
                .json(&body),
        );

        let response = request.send().await.map_err(|e| Error::Submission {
            status: None,
            body: e.to_string(),
        })?;
        let status = response.status();
        let text = response.text().await.map_err(|e| Error::Submission {
            status: Some(status.as_u16()),
            body: e.to_string(),
        })?;

        if !status.is_success() {
            return Err(Error::Submission {
                status: Some(status.as_u16()),
                body: text,
            });
        }

        let handle: RunHandle = serde_json::from_str(&text).map_err(|e| Error::Submission {
            status: Some(status.as_u16()),
            body: format!("unexpected submission response ({}): {}", e, text),
        })?;
        debug!(run_id = %handle.run_id, streaming = handle.stream_url.is_some(), "Run submitted");
        Ok(handle)
    }

    async fn run_status(&self, run_id: &str) -> Result<RunStatusReport> {
        let url = self.endpoint(&["runs", run_id])?;
        self.get_json(url).await
    }

    #[instrument(skip(self))]
    async fn open_stream(&self, stream_url: &str) -> Result<RecordStream> {
        let url = self.base_url.join(stream_url)?;
        let request = self.auth.apply_to_request(
            self.http
                .get(url)
                .header(ACCEPT, "application/x-ndjson, text/event-stream"),
        );
        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Stream(format!(
                "stream returned {}: {}",
                status.as_u16(),
                body
            )));
        }

        let reader = StreamReader::new(response.bytes_stream().map_err(std::io::Error::other));
        let lines = FramedRead::new(reader, LinesCodec::new_with_max_length(MAX_RECORD_LEN))
            .map_err(|e| Error::Stream(e.to_string()));
        Ok(lines.boxed())
    }
}
