use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::config::HttpConfig;
use crate::utils::error::{AppError, Result};

const MAX_ERROR_BODY: usize = 300;

pub fn build_client(config: &HttpConfig) -> Result<Client> {
    let client = Client::builder()
        .timeout(Duration::from_secs(config.request_timeout))
        .user_agent(config.user_agent.clone())
        .build()?;
    Ok(client)
}

/// Maps non-success statuses onto `NotFound` (404) or `Transport` (anything else).
pub async fn ensure_success(service: &str, response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let mut message = status.to_string();
    let body = body.trim();
    if !body.is_empty() {
        message.push_str(": ");
        message.extend(body.chars().take(MAX_ERROR_BODY));
    }

    if status == StatusCode::NOT_FOUND {
        Err(AppError::not_found(format!("{} ({})", service, message)))
    } else {
        Err(AppError::transport(service, message))
    }
}

/// Reads the body as JSON; a shape mismatch is a `Schema` error, not a transport one.
pub async fn decode<T: DeserializeOwned>(service: &str, response: Response) -> Result<T> {
    let body = response.bytes().await?;
    serde_json::from_slice(&body)
        .map_err(|e| AppError::Schema(format!("{}: unexpected response body: {}", service, e)))
}
