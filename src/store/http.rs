//! REST client for the shapes API.
//!
//! Endpoint layout, relative to the configured base URL:
//! - `GET    {base}?boardId=B`      list
//! - `POST   {base}?boardId=B`      create (shape JSON body)
//! - `DELETE {base}/{id}?boardId=B` delete one
//! - `DELETE {base}?boardId=B`      delete all
//!
//! Response handling is kept in pure functions for testability.

use std::time::Duration;

use reqwest::StatusCode;
use tracing::debug;

use super::{ShapeStore, StoreError};
use crate::board::BoardId;
use crate::config::Config;
use crate::shape::{Shape, ShapeId};

const BOARD_QUERY_KEY: &str = "boardId";

// =============================================================================
// CLIENT
// =============================================================================

pub struct HttpShapeStore {
    http: reqwest::Client,
    base_url: String,
}

impl HttpShapeStore {
    /// # Errors
    ///
    /// Returns `Unavailable` if the HTTP client cannot be built.
    pub fn new(base_url: &str, request_timeout: Duration, connect_timeout: Duration) -> Result<Self, StoreError> {
        let http = reqwest::Client::builder()
            .timeout(request_timeout)
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|e| StoreError::Unavailable(format!("http client build failed: {e}")))?;
        Ok(Self { http, base_url: base_url.trim_end_matches('/').to_owned() })
    }

    /// # Errors
    ///
    /// Returns `Unavailable` if the HTTP client cannot be built.
    pub fn from_config(config: &Config) -> Result<Self, StoreError> {
        Self::new(&config.api_url, config.request_timeout, config.connect_timeout)
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn send(&self, request: reqwest::RequestBuilder, board: &BoardId) -> Result<(StatusCode, String), StoreError> {
        let response = request
            .query(&[(BOARD_QUERY_KEY, board.as_str())])
            .send()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        let status = response.status();
        let text = response.text().await.map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Ok((status, text))
    }
}

#[async_trait::async_trait]
impl ShapeStore for HttpShapeStore {
    async fn list(&self, board: &BoardId) -> Result<Vec<Shape>, StoreError> {
        let (status, text) = self.send(self.http.get(&self.base_url), board).await?;
        check_status(status, &text)?;
        parse_shapes(&text)
    }

    async fn create(&self, board: &BoardId, shape: &Shape) -> Result<Shape, StoreError> {
        let (status, text) = self.send(self.http.post(&self.base_url).json(shape), board).await?;
        check_status(status, &text)?;
        Ok(parse_created(&text, shape))
    }

    async fn delete(&self, board: &BoardId, id: &ShapeId) -> Result<(), StoreError> {
        let url = item_url(&self.base_url, id);
        let (status, text) = self.send(self.http.delete(url), board).await?;
        if status == StatusCode::NOT_FOUND {
            return Err(StoreError::NotFound(id.clone()));
        }
        check_status(status, &text)
    }

    async fn delete_all(&self, board: &BoardId) -> Result<(), StoreError> {
        let (status, text) = self.send(self.http.delete(&self.base_url), board).await?;
        check_status(status, &text)
    }
}

// =============================================================================
// RESPONSE HANDLING
// =============================================================================

fn item_url(base_url: &str, id: &ShapeId) -> String {
    format!("{base_url}/{id}")
}

fn check_status(status: StatusCode, body: &str) -> Result<(), StoreError> {
    if status.is_success() {
        return Ok(());
    }
    let snippet: String = body.chars().take(200).collect();
    Err(StoreError::Unavailable(format!("HTTP {}: {snippet}", status.as_u16())))
}

fn parse_shapes(text: &str) -> Result<Vec<Shape>, StoreError> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(text).map_err(|e| StoreError::Decode(e.to_string()))
}

/// The shape the server settled on, or the one we sent when the server
/// echoed nothing usable.
fn parse_created(text: &str, sent: &Shape) -> Shape {
    let mut value = match serde_json::from_str::<serde_json::Value>(text) {
        Ok(value) => value,
        Err(e) => {
            debug!(error = %e, shape_id = %sent.id, "create response is not JSON; keeping local copy");
            return sent.clone();
        }
    };
    // An echo without any identifier confirms ours.
    if let Some(obj) = value.as_object_mut() {
        if !obj.contains_key("id") && !obj.contains_key("_id") {
            obj.insert("id".into(), serde_json::Value::String(sent.id.to_string()));
        }
    }
    serde_json::from_value(value).unwrap_or_else(|e| {
        debug!(error = %e, shape_id = %sent.id, "create response carried no shape; keeping local copy");
        sent.clone()
    })
}

#[cfg(test)]
#[path = "http_test.rs"]
mod tests;
