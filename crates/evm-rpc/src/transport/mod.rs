//! Transport adapters.
//!
//! A transport moves one JSON-RPC envelope to the node and brings the reply
//! back. It knows nothing about methods, ids or result shapes; correlation
//! and decoding live in the client. Request/response transports (HTTP) and
//! callback-style transports are both normalised to `TransportInterface`.

use async_trait::async_trait;
use evm_config::{TransportConfig, TransportKind};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

pub mod implementations {
	pub mod callback;
	pub mod http;
	#[cfg(any(test, feature = "testing"))]
	pub mod mock;
}

/// Errors raised while moving an envelope, before any result is inspected.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
	#[error("Request failed: {0}")]
	Request(String),
	#[error("Node answered with HTTP {status}: {body}")]
	Status { status: u16, body: String },
	#[error("Malformed response envelope: {0}")]
	Decode(String),
	/// The reply channel closed without an answer.
	#[error("Transport closed: {0}")]
	Closed(String),
	#[error("Invalid transport configuration: {0}")]
	Config(String),
}

/// Outgoing JSON-RPC 2.0 envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcRequest {
	pub jsonrpc: String,
	pub method: String,
	pub params: Value,
	pub id: u64,
}

impl JsonRpcRequest {
	pub fn new(id: u64, method: impl Into<String>, params: Value) -> Self {
		Self {
			jsonrpc: "2.0".to_string(),
			method: method.into(),
			params,
			id,
		}
	}
}

/// Error object of a failed call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcError {
	#[serde(default)]
	pub code: i64,
	pub message: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub data: Option<Value>,
}

/// Incoming envelope. `id` is kept raw so the client can report what the
/// node actually echoed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcResponse {
	#[serde(default)]
	pub id: Value,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub result: Option<Value>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
	pub fn success(id: impl Into<Value>, result: Value) -> Self {
		Self {
			id: id.into(),
			result: Some(result),
			error: None,
		}
	}

	pub fn failure(id: impl Into<Value>, error: JsonRpcError) -> Self {
		Self {
			id: id.into(),
			result: None,
			error: Some(error),
		}
	}
}

/// Sends one envelope and returns the node's envelope.
///
/// Implementations must be shareable: every component of the client holds
/// the same transport and may have calls outstanding concurrently.
#[async_trait]
pub trait TransportInterface: Send + Sync {
	async fn send(&self, request: JsonRpcRequest) -> Result<JsonRpcResponse, TransportError>;
}

/// Builds the transport described by configuration.
///
/// Callback transports wrap host-provided functions and are constructed in
/// code, not from configuration.
pub fn create_transport(
	config: &TransportConfig,
) -> Result<Arc<dyn TransportInterface>, TransportError> {
	match config.kind {
		TransportKind::Http => {
			let transport = implementations::http::HttpTransport::new(
				&config.url,
				Duration::from_secs(config.timeout_seconds),
				&config.headers,
			)?;
			Ok(Arc::new(transport))
		},
	}
}
