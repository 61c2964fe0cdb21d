//! GraphQL client for the remote redirect API. Implements the `RuleApi` port.
//!
//! Failures are classified for the retry controller: structured GraphQL
//! errors and client-side HTTP rejections are permanent, everything else
//! (network, timeouts, 429, 5xx, undecodable bodies) is transient.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::application::ports::{IndexPage, RuleApi};
use crate::domain::{RedirectRecord, TransferError};

/// Per-request timeout.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Environment variable holding the API token.
pub const TOKEN_ENV: &str = "ROUTECTL_TOKEN";

const SAVE_MANY: &str = "mutation SaveMany($routes: [RouteInput!]!) { redirect { saveMany(routes: $routes) } }";
const DELETE_MANY: &str = "mutation DeleteMany($paths: [String!]!) { redirect { deleteMany(paths: $paths) } }";
const INDEX_FILES: &str = "query RoutesIndexFiles { redirect { routesIndexFiles { routeIndexFiles { fileName fileSize } } } }";
const INDEX_PAGE: &str = "query RoutesIndex($fileName: String!) { redirect { routesIndex(fileName: $fileName) { id } } }";

#[derive(Debug, Serialize)]
struct GraphqlRequest<'a> {
    query: &'a str,
    variables: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct GraphqlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphqlError>,
}

#[derive(Debug, Deserialize)]
struct GraphqlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct Redirect<T> {
    redirect: T,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IndexFilesData {
    routes_index_files: IndexFiles,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IndexFiles {
    #[serde(default)]
    route_index_files: Vec<IndexFile>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IndexFile {
    file_name: String,
    file_size: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IndexPageData {
    #[serde(default)]
    routes_index: Vec<RouteId>,
}

#[derive(Debug, Deserialize)]
struct RouteId {
    id: String,
}

/// HTTP client bound to one account/workspace endpoint.
pub struct GraphqlRuleClient {
    http: reqwest::Client,
    endpoint: String,
    token: Option<String>,
}

impl GraphqlRuleClient {
    /// Build a client for `endpoint`, reading the token from `ROUTECTL_TOKEN`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(endpoint: String) -> Result<Self> {
        let token = std::env::var(TOKEN_ENV).ok().filter(|t| !t.is_empty());
        Self::with_token(endpoint, token)
    }

    /// Build a client with an explicit token.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn with_token(endpoint: String, token: Option<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("routectl/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("building HTTP client")?;
        Ok(Self {
            http,
            endpoint,
            token,
        })
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: serde_json::Value,
    ) -> Result<T, TransferError> {
        let mut req = self
            .http
            .post(&self.endpoint)
            .json(&GraphqlRequest { query, variables });
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }
        let resp = req.send().await.map_err(transport_error)?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(classify_status(status, &body));
        }
        let body: GraphqlResponse<T> = resp.json().await.map_err(|e| {
            TransferError::RemoteTransient(format!("undecodable response: {e}"))
        })?;
        into_data(body)
    }
}

fn transport_error(err: reqwest::Error) -> TransferError {
    if err.is_timeout() {
        TransferError::RemoteTransient(format!("request timed out: {err}"))
    } else {
        TransferError::RemoteTransient(err.to_string())
    }
}

/// Classify a non-success HTTP status.
fn classify_status(status: StatusCode, body: &str) -> TransferError {
    let detail = body.trim();
    let message = if detail.is_empty() {
        format!("HTTP {status}")
    } else {
        format!("HTTP {status}: {}", truncate(detail, 200))
    };
    match status {
        StatusCode::BAD_REQUEST
        | StatusCode::UNAUTHORIZED
        | StatusCode::FORBIDDEN
        | StatusCode::NOT_FOUND
        | StatusCode::UNPROCESSABLE_ENTITY => TransferError::RemotePermanent(message),
        _ => TransferError::RemoteTransient(message),
    }
}

/// Unwrap GraphQL `data`, treating a structured `errors` payload as permanent.
fn into_data<T>(resp: GraphqlResponse<T>) -> Result<T, TransferError> {
    if !resp.errors.is_empty() {
        let messages: Vec<_> = resp.errors.into_iter().map(|e| e.message).collect();
        return Err(TransferError::RemotePermanent(messages.join("; ")));
    }
    resp.data
        .ok_or_else(|| TransferError::RemoteTransient("response carried no data".to_string()))
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

impl RuleApi for GraphqlRuleClient {
    async fn import_chunk(&self, records: &[RedirectRecord]) -> Result<(), TransferError> {
        self.execute::<serde_json::Value>(SAVE_MANY, json!({ "routes": records }))
            .await
            .map(drop)
    }

    async fn delete_chunk(&self, paths: &[String]) -> Result<(), TransferError> {
        self.execute::<serde_json::Value>(DELETE_MANY, json!({ "paths": paths }))
            .await
            .map(drop)
    }

    async fn list_index_pages(&self) -> Result<Vec<IndexPage>, TransferError> {
        let data: Redirect<IndexFilesData> = self.execute(INDEX_FILES, json!({})).await?;
        Ok(data
            .redirect
            .routes_index_files
            .route_index_files
            .into_iter()
            .map(|f| IndexPage {
                file_name: f.file_name,
                file_size: f.file_size,
            })
            .collect())
    }

    async fn list_index_page(&self, page: &IndexPage) -> Result<Vec<String>, TransferError> {
        let data: Redirect<IndexPageData> = self
            .execute(INDEX_PAGE, json!({ "fileName": page.file_name }))
            .await?;
        Ok(data
            .redirect
            .routes_index
            .into_iter()
            .map(|r| r.id)
            .collect())
    }
}
