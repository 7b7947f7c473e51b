/*
 *  httprpc.rs
 *
 *  KoMonS - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Kodi JSON-RPC 2.0 over HTTP POST
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use reqwest::{Client, StatusCode, header};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Errors from a single Kodi RPC exchange. Every variant is a
/// connectivity-class failure from the poll loop's point of view.
#[derive(Debug, Error)]
pub enum KodiRpcError {
    /// Error during HTTP request (e.g., network issues, timeout).
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("JSON serialization error: {0}")]
    Serialization(#[source] serde_json::Error),
    #[error("JSON deserialization error: {0}")]
    Deserialization(#[source] serde_json::Error),
    /// The response carried a JSON-RPC error object.
    #[error("Kodi error {}: {}", .0.code, .0.message)]
    Rpc(RpcError),
    #[error("Kodi response missing 'result' field")]
    MissingResult,
    #[error("Kodi ID mismatch: expected {expected}, received {received:?}")]
    IdMismatch { expected: u32, received: Option<u32> },
    /// A well-formed reply that is not what the method promises.
    #[error("unexpected reply to {method}: {reply}")]
    Unexpected { method: String, reply: String },
    #[error("HTTP status {0}")]
    Status(u16),
}

/// JSON-RPC 2.0 request payload
#[derive(Debug, Serialize)]
pub struct RpcRequest<'a> {
    pub jsonrpc: &'static str,
    pub id: u32,
    pub method: &'a str,
    #[serde(skip_serializing_if = "Value::is_null")]
    pub params: Value,
}

/// Standard JSON-RPC error object
#[derive(Debug, Clone, Deserialize)]
pub struct RpcError {
    pub code: i32,
    pub message: String,
    #[serde(default)]
    #[allow(dead_code)]
    pub data: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct JsonRpcResponse {
    pub id: Option<u32>,
    pub result: Option<Value>,
    pub error: Option<RpcError>,
}

/// Thin JSON-RPC client bound to one Kodi web server
#[derive(Debug)]
pub struct KodiRpcClient {
    id: AtomicU32,
    base_url: String,
    client: Client,
}

impl KodiRpcClient {
    /// Client with populated headers and a bounded request timeout.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, KodiRpcError> {
        const VERSION: &str = concat!("KoMonS ", env!("CARGO_PKG_NAME"), " v", env!("CARGO_PKG_VERSION"));

        let mut headers = header::HeaderMap::new();
        headers.insert("User-Agent", header::HeaderValue::from_static(VERSION));
        headers.insert("Accept", header::HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .connect_timeout(timeout.min(Duration::from_millis(1000)))
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            id: AtomicU32::new(1),
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// POST `method` with `params` to `<base>/jsonrpc` and return `result`.
    pub async fn call(&self, method: &str, params: Value) -> Result<Value, KodiRpcError> {
        let request_id = self.id.fetch_add(1, Ordering::Relaxed);
        let url = format!("{}/jsonrpc", self.base_url);

        let request = RpcRequest { jsonrpc: "2.0", id: request_id, method, params };
        let body = serde_json::to_string(&request).map_err(KodiRpcError::Serialization)?;

        let response = self
            .client
            .post(&url)
            .header(header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;

        if response.status() != StatusCode::OK {
            return Err(KodiRpcError::Status(response.status().as_u16()));
        }

        let text = response.text().await?;
        let rpc_response: JsonRpcResponse =
            serde_json::from_str(&text).map_err(KodiRpcError::Deserialization)?;

        if rpc_response.id != Some(request_id) {
            return Err(KodiRpcError::IdMismatch { expected: request_id, received: rpc_response.id });
        }
        if let Some(error) = rpc_response.error {
            return Err(KodiRpcError::Rpc(error));
        }
        rpc_response.result.ok_or(KodiRpcError::MissingResult)
    }

    /// Plain GET for image bytes; anything but 200 is a failure.
    pub async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, KodiRpcError> {
        let response = self.client.get(url).send().await?;
        if response.status() != StatusCode::OK {
            return Err(KodiRpcError::Status(response.status().as_u16()));
        }
        Ok(response.bytes().await?.to_vec())
    }
}
