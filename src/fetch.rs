//! # Conditional Schema Fetching
//!
//! One GET per document per cycle, with an `If-Modified-Since`
//! precondition taken from the freshness tracker. There is no retry inside
//! a cycle: the sync loop's sleep interval is the retry policy, which keeps
//! the worst-case staleness bounded by one interval.
//!
//! The [`SchemaSource`] trait is the seam tests replace. [`HttpSchemaSource`]
//! is the real implementation on top of `reqwest`'s blocking client, which
//! fits the single synchronous worker thread.

use std::time::SystemTime;

use chrono::{DateTime, Utc};
use log::{info, warn};
use reqwest::header::{IF_MODIFIED_SINCE, USER_AGENT};
use reqwest::StatusCode;

use crate::error::{Error, Result};

/// User agent sent with every request.
pub const USER_AGENT_VALUE: &str = "SchemaTracker";

const API_DOWN: &str = "Steam Web API is currently down";

/// Raw response of a single GET
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl FetchResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// How the sync loop should treat a response
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// 200: new content to process
    Modified(Vec<u8>),
    /// 304: nothing to do
    NotModified,
    /// 500 or 503, or the request never completed: retry next cycle
    Unavailable,
    /// Any other status: logged and skipped
    Unexpected(u16),
}

impl FetchOutcome {
    /// Classify a status code, logging the ones that are skipped.
    pub fn classify(response: FetchResponse, subject: &str) -> Self {
        let status = StatusCode::from_u16(response.status);
        match status {
            Ok(StatusCode::OK) => {
                info!("Update {}", subject);
                FetchOutcome::Modified(response.body)
            }
            Ok(StatusCode::NOT_MODIFIED) => FetchOutcome::NotModified,
            Ok(StatusCode::SERVICE_UNAVAILABLE) | Ok(StatusCode::INTERNAL_SERVER_ERROR) => {
                warn!("{} ({})", API_DOWN, subject);
                FetchOutcome::Unavailable
            }
            _ => {
                warn!("Unexpected status {} for {}", response.status, subject);
                FetchOutcome::Unexpected(response.status)
            }
        }
    }

    pub fn into_body(self) -> Option<Vec<u8>> {
        match self {
            FetchOutcome::Modified(body) => Some(body),
            _ => None,
        }
    }
}

/// Something that can GET a URL with an optional precondition
pub trait SchemaSource: Send + Sync {
    /// Issue a GET for `url`. `if_modified_since` is sent as the
    /// `If-Modified-Since` header when present.
    fn fetch(&self, url: &str, if_modified_since: Option<SystemTime>) -> Result<FetchResponse>;
}

/// Format a timestamp as an HTTP-date (RFC 7231 IMF-fixdate).
pub fn http_date(time: SystemTime) -> String {
    let datetime: DateTime<Utc> = time.into();
    datetime.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Fetch `url` and classify the result. Transport errors count as an
/// unavailable upstream.
pub fn fetch_outcome(
    source: &dyn SchemaSource,
    url: &str,
    if_modified_since: Option<SystemTime>,
    subject: &str,
) -> FetchOutcome {
    match source.fetch(url, if_modified_since) {
        Ok(response) => FetchOutcome::classify(response, subject),
        Err(e) => {
            warn!("Request for {} failed: {}", subject, e);
            FetchOutcome::Unavailable
        }
    }
}

/// [`SchemaSource`] backed by a blocking `reqwest` client
#[derive(Debug, Clone)]
pub struct HttpSchemaSource {
    client: reqwest::blocking::Client,
}

impl HttpSchemaSource {
    pub fn new() -> Result<Self> {
        let client = reqwest::blocking::Client::builder().build()?;
        Ok(Self { client })
    }
}

impl SchemaSource for HttpSchemaSource {
    fn fetch(&self, url: &str, if_modified_since: Option<SystemTime>) -> Result<FetchResponse> {
        let mut request = self.client.get(url).header(USER_AGENT, USER_AGENT_VALUE);
        // Never-fetched apps send the epoch so the server always answers 200
        let since = if_modified_since.unwrap_or(SystemTime::UNIX_EPOCH);
        request = request.header(IF_MODIFIED_SINCE, http_date(since));

        let response = request.send().map_err(|e| Error::Network {
            url: redact_key(url),
            message: e.to_string(),
        })?;
        let status = response.status().as_u16();
        let body = response.bytes().map_err(|e| Error::Network {
            url: redact_key(url),
            message: e.to_string(),
        })?;
        Ok(FetchResponse::new(status, body.to_vec()))
    }
}

/// Strip the API key from a URL before it goes into an error or log line.
pub fn redact_key(url: &str) -> String {
    match url::Url::parse(url) {
        Ok(mut parsed) => {
            let pairs: Vec<(String, String)> = parsed
                .query_pairs()
                .map(|(k, v)| {
                    let value = if k == "key" { "***".to_string() } else { v.into_owned() };
                    (k.into_owned(), value)
                })
                .collect();
            if pairs.is_empty() {
                return parsed.to_string();
            }
            parsed.query_pairs_mut().clear().extend_pairs(pairs);
            parsed.to_string()
        }
        Err(_) => url.to_string(),
    }
}
