//! Thin client for the Aptos node REST API.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use url::Url;

use client_blockchain_core::TransportError;

/// Error body returned by the node on 4xx/5xx.
#[derive(Debug, Deserialize)]
struct NodeError {
    message: String,
    #[serde(default)]
    error_code: Option<String>,
}

/// Outcome of a GET that may legitimately 404.
#[derive(Debug)]
pub enum Lookup {
    Found(Value),
    NotFound,
}

#[derive(Clone)]
pub struct RestClient {
    inner: Client,
    base: Url,
}

impl RestClient {
    /// `base` is the versioned API root, e.g. `https://fullnode.testnet.aptoslabs.com/v1`.
    pub fn new(base: &str, timeout: Duration) -> Result<Self, TransportError> {
        let mut base = Url::parse(base).map_err(|e| TransportError::Config(format!("{base}: {e}")))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let inner = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Config(e.to_string()))?;
        Ok(Self { inner, base })
    }

    fn url(&self, path: &str) -> Result<Url, TransportError> {
        self.base
            .join(path.trim_start_matches('/'))
            .map_err(|e| TransportError::Config(format!("{path}: {e}")))
    }

    pub async fn get(&self, path: &str) -> Result<Lookup, TransportError> {
        let url = self.url(path)?;
        tracing::debug!(%url, "aptos GET");
        let response = self.inner.get(url).send().await.map_err(network)?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(Lookup::NotFound);
        }
        decode(response).await.map(Lookup::Found)
    }

    pub async fn post(&self, path: &str, body: &Value) -> Result<Value, TransportError> {
        let url = self.url(path)?;
        tracing::debug!(%url, "aptos POST");
        let response = self.inner.post(url).json(body).send().await.map_err(network)?;
        decode(response).await
    }
}

fn network(err: reqwest::Error) -> TransportError {
    TransportError::Network(err.to_string())
}

async fn decode(response: reqwest::Response) -> Result<Value, TransportError> {
    let status = response.status();
    let body: Value = response
        .json()
        .await
        .map_err(|e| TransportError::Decode(e.to_string()))?;
    if status.is_success() {
        return Ok(body);
    }
    Err(TransportError::Backend(node_error_message(status, &body)))
}

/// Human-readable message from a node error body.
pub fn node_error_message(status: StatusCode, body: &Value) -> String {
    match serde_json::from_value::<NodeError>(body.clone()) {
        Ok(NodeError {
            message,
            error_code: Some(code),
        }) => format!("{message} ({code})"),
        Ok(NodeError { message, .. }) => message,
        Err(_) => format!("node returned HTTP {status}"),
    }
}
