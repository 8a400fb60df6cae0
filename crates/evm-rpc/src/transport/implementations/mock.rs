//! Scripted transport for tests.
//!
//! Replies are queued per method. Each request consumes the head of its
//! method's queue, except the last entry, which keeps answering. `eth_call`
//! replies can also be keyed by destination and selector so several
//! contracts can be scripted side by side. Every request is recorded.

use crate::transport::{
	JsonRpcError, JsonRpcRequest, JsonRpcResponse, TransportError, TransportInterface,
};
use alloy_primitives::Address;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

#[derive(Debug, Clone)]
enum MockReply {
	Result(Value),
	Error(JsonRpcError),
	/// Replies with `result` under a different id than the request's.
	WrongId(Value),
	Transport(TransportError),
}

#[derive(Default)]
struct MockState {
	replies: HashMap<String, VecDeque<MockReply>>,
	requests: Vec<JsonRpcRequest>,
}

#[derive(Default)]
pub struct MockTransport {
	state: Mutex<MockState>,
}

fn call_key(to: &Address, selector: [u8; 4]) -> String {
	format!(
		"eth_call:0x{}:0x{:02x}{:02x}{:02x}{:02x}",
		to.to_string().trim_start_matches("0x").to_lowercase(),
		selector[0],
		selector[1],
		selector[2],
		selector[3]
	)
}

/// Key of a recorded `eth_call` request, if it has `to` and calldata.
fn request_call_key(params: &Value) -> Option<String> {
	let call = params.get(0)?;
	let to = call.get("to")?.as_str()?.to_lowercase();
	let data = call
		.get("data")
		.or_else(|| call.get("input"))?
		.as_str()?
		.to_lowercase();
	let selector = data.get(..10)?;
	Some(format!("eth_call:{}:{}", to, selector))
}

impl MockTransport {
	pub fn new() -> Self {
		Self::default()
	}

	fn push(&self, key: String, reply: MockReply) {
		let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
		state.replies.entry(key).or_default().push_back(reply);
	}

	/// Queues a successful `result` for `method`.
	pub fn respond(&self, method: &str, result: Value) -> &Self {
		self.push(method.to_string(), MockReply::Result(result));
		self
	}

	/// Queues an error object for `method`.
	pub fn respond_error(&self, method: &str, code: i64, message: &str, data: Option<Value>) -> &Self {
		self.push(
			method.to_string(),
			MockReply::Error(JsonRpcError {
				code,
				message: message.to_string(),
				data,
			}),
		);
		self
	}

	/// Queues a reply whose id does not match the request.
	pub fn respond_wrong_id(&self, method: &str, result: Value) -> &Self {
		self.push(method.to_string(), MockReply::WrongId(result));
		self
	}

	/// Queues a transport failure for `method`.
	pub fn fail(&self, method: &str, error: TransportError) -> &Self {
		self.push(method.to_string(), MockReply::Transport(error));
		self
	}

	/// Queues an `eth_call` result for calls to `to` with `selector`.
	pub fn respond_call(&self, to: Address, selector: [u8; 4], result: Value) -> &Self {
		self.push(call_key(&to, selector), MockReply::Result(result));
		self
	}

	/// Queues an `eth_call` error for calls to `to` with `selector`.
	pub fn respond_call_error(&self, to: Address, selector: [u8; 4], message: &str) -> &Self {
		self.push(
			call_key(&to, selector),
			MockReply::Error(JsonRpcError {
				code: 3,
				message: message.to_string(),
				data: None,
			}),
		);
		self
	}

	/// All requests seen so far, in order.
	pub fn requests(&self) -> Vec<JsonRpcRequest> {
		self.state
			.lock()
			.unwrap_or_else(|e| e.into_inner())
			.requests
			.clone()
	}

	pub fn requests_for(&self, method: &str) -> Vec<JsonRpcRequest> {
		self.requests()
			.into_iter()
			.filter(|request| request.method == method)
			.collect()
	}

	pub fn call_count(&self, method: &str) -> usize {
		self.requests_for(method).len()
	}

	pub fn total_calls(&self) -> usize {
		self.requests().len()
	}

	fn next_reply(state: &mut MockState, key: &str) -> Option<MockReply> {
		let queue = state.replies.get_mut(key)?;
		if queue.len() > 1 {
			queue.pop_front()
		} else {
			queue.front().cloned()
		}
	}
}

#[async_trait]
impl TransportInterface for MockTransport {
	async fn send(&self, request: JsonRpcRequest) -> Result<JsonRpcResponse, TransportError> {
		let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
		state.requests.push(request.clone());

		let keyed = if request.method == "eth_call" {
			request_call_key(&request.params).and_then(|key| Self::next_reply(&mut state, &key))
		} else {
			None
		};
		let reply = keyed.or_else(|| Self::next_reply(&mut state, &request.method));

		match reply {
			Some(MockReply::Result(result)) => Ok(JsonRpcResponse::success(request.id, result)),
			Some(MockReply::Error(error)) => Ok(JsonRpcResponse::failure(request.id, error)),
			Some(MockReply::WrongId(result)) => {
				Ok(JsonRpcResponse::success(request.id.wrapping_add(1000), result))
			},
			Some(MockReply::Transport(error)) => Err(error),
			None => Ok(JsonRpcResponse::failure(
				request.id,
				JsonRpcError {
					code: -32601,
					message: format!("method {} is not scripted", request.method),
					data: None,
				},
			)),
		}
	}
}
