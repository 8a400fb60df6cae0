//! Adapter for callback-style transports.
//!
//! Some hosts expose the node as `fn(request, reply)` where `reply` is
//! invoked later, possibly from another thread. The adapter turns that into
//! an awaitable call through a oneshot channel.

use crate::transport::{JsonRpcRequest, JsonRpcResponse, TransportError, TransportInterface};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::oneshot;

/// Reply handle passed to the host function. Must be called at most once.
pub type ReplyCallback = Box<dyn FnOnce(Result<JsonRpcResponse, TransportError>) + Send>;

type Handler = dyn Fn(JsonRpcRequest, ReplyCallback) + Send + Sync;

pub struct CallbackTransport {
	handler: Arc<Handler>,
}

impl CallbackTransport {
	pub fn new<F>(handler: F) -> Self
	where
		F: Fn(JsonRpcRequest, ReplyCallback) + Send + Sync + 'static,
	{
		Self {
			handler: Arc::new(handler),
		}
	}
}

#[async_trait]
impl TransportInterface for CallbackTransport {
	async fn send(&self, request: JsonRpcRequest) -> Result<JsonRpcResponse, TransportError> {
		let (reply_tx, reply_rx) = oneshot::channel();
		let reply: ReplyCallback = Box::new(move |result| {
			// The caller may have given up on the request.
			let _ = reply_tx.send(result);
		});

		(self.handler)(request, reply);

		reply_rx.await.map_err(|_| {
			TransportError::Closed("callback dropped without replying".to_string())
		})?
	}
}
