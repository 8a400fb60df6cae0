//! JSON-RPC over HTTP POST.

use crate::transport::{JsonRpcRequest, JsonRpcResponse, TransportError, TransportInterface};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use std::collections::HashMap;
use std::time::Duration;

/// Posts each envelope to a fixed URL.
pub struct HttpTransport {
	client: reqwest::Client,
	url: String,
}

impl HttpTransport {
	/// Creates a transport with a per-request `timeout` and extra headers
	/// added to every request.
	pub fn new(
		url: &str,
		timeout: Duration,
		headers: &HashMap<String, String>,
	) -> Result<Self, TransportError> {
		let mut header_map = HeaderMap::new();
		for (name, value) in headers {
			let name = HeaderName::from_bytes(name.as_bytes())
				.map_err(|e| TransportError::Config(format!("header '{}': {}", name, e)))?;
			let value = HeaderValue::from_str(value)
				.map_err(|e| TransportError::Config(format!("header '{}': {}", name, e)))?;
			header_map.insert(name, value);
		}

		let client = reqwest::Client::builder()
			.timeout(timeout)
			.default_headers(header_map)
			.build()
			.map_err(|e| TransportError::Config(e.to_string()))?;

		Ok(Self {
			client,
			url: url.to_string(),
		})
	}
}

#[async_trait]
impl TransportInterface for HttpTransport {
	async fn send(&self, request: JsonRpcRequest) -> Result<JsonRpcResponse, TransportError> {
		let response = self
			.client
			.post(&self.url)
			.json(&request)
			.send()
			.await
			.map_err(|e| TransportError::Request(e.to_string()))?;

		let status = response.status();
		if !status.is_success() {
			let body = response.text().await.unwrap_or_default();
			return Err(TransportError::Status {
				status: status.as_u16(),
				body,
			});
		}

		response
			.json::<JsonRpcResponse>()
			.await
			.map_err(|e| TransportError::Decode(e.to_string()))
	}
}
