//! Shared HTTP plumbing: the client, request execution and error mapping.

use reqwest::{RequestBuilder, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::error::{ProviderError, ProviderResult};

use super::config::GoogleConfig;

/// Longest body excerpt used as a fault reason.
const MAX_REASON_LEN: usize = 200;

/// Builds the client shared by the OAuth exchanges and both API handles.
pub fn build_client(config: &GoogleConfig) -> ProviderResult<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(config.timeout)
        .user_agent(&config.user_agent)
        .build()
        .map_err(|e| {
            ProviderError::configuration(format!("failed to create HTTP client: {}", e))
                .with_source(e)
        })
}

/// Maps a transport-level failure (nothing usable came back).
pub(crate) fn transport_error(err: reqwest::Error) -> ProviderError {
    let mapped = if err.is_timeout() {
        ProviderError::timeout(format!("request timed out: {}", err))
    } else if err.is_connect() {
        ProviderError::network(format!("connection failed: {}", err))
    } else if err.is_decode() {
        ProviderError::invalid_response(format!("failed to read response: {}", err))
    } else {
        ProviderError::network(format!("request failed: {}", err))
    };
    mapped.with_source(err)
}

/// Sends `request` and decodes a JSON body.
pub(crate) async fn send_json<T: DeserializeOwned>(request: RequestBuilder) -> ProviderResult<T> {
    let response = request.send().await.map_err(transport_error)?;
    let status = response.status();
    let body = response.text().await.map_err(transport_error)?;

    if !status.is_success() {
        return Err(remote_fault(status, &body));
    }

    serde_json::from_str(&body).map_err(|e| {
        ProviderError::invalid_response(format!("failed to parse response: {}", e)).with_source(e)
    })
}

/// Sends `request` and ignores the body (deletes answer `204 No Content`).
pub(crate) async fn send_empty(request: RequestBuilder) -> ProviderResult<()> {
    let response = request.send().await.map_err(transport_error)?;
    let status = response.status();

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(remote_fault(status, &body));
    }
    Ok(())
}

/// Turns a non-2xx answer into a remote fault.
pub(crate) fn remote_fault(status: StatusCode, body: &str) -> ProviderError {
    let reason = extract_reason(status, body);
    tracing::debug!(status = status.as_u16(), %reason, "remote fault");
    ProviderError::remote(status.as_u16(), reason)
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

/// `error.message` from a Google error body, else the reason phrase, else
/// the start of the body.
fn extract_reason(status: StatusCode, body: &str) -> String {
    serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .and_then(|envelope| envelope.error.message)
        .filter(|message| !message.is_empty())
        .or_else(|| status.canonical_reason().map(str::to_string))
        .unwrap_or_else(|| body.chars().take(MAX_REASON_LEN).collect())
}
