//! JSON-RPC access to an Ethereum-compatible node.
//!
//! Two layers: a transport that moves envelopes (HTTP, host callbacks, or a
//! scripted mock in tests) and a typed client that correlates replies,
//! extracts structured errors and decodes records.

pub mod client;
pub mod transport;

pub use client::{extract_revert_data, RpcClient, RpcError};
#[cfg(any(test, feature = "testing"))]
pub use transport::implementations::mock::MockTransport;
pub use transport::{
	create_transport,
	implementations::{callback::CallbackTransport, http::HttpTransport},
	JsonRpcError, JsonRpcRequest, JsonRpcResponse, TransportError, TransportInterface,
};
