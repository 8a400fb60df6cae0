//! Receipt polling and confirmation depth.

use crate::TxError;
use alloy_primitives::B256;
use evm_rpc::{RpcClient, RpcError};
use evm_types::{truncate_middle, TransactionReceipt};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::instrument;

/// Latest observation of a tracked transaction.
///
/// Written only by the polling task. Receipt and head come from the same
/// iteration, so the confirmation count is always consistent with the
/// receipt it refers to.
#[derive(Debug, Clone, Default)]
pub struct ConfirmationState {
	pub tx_hash: B256,
	pub receipt: Option<TransactionReceipt>,
	pub head: Option<u64>,
	/// Set when polling stopped on an RPC failure.
	pub failure: Option<RpcError>,
}

impl ConfirmationState {
	/// Blocks mined on top of the receipt's block; `None` until mined.
	pub fn confirmations(&self) -> Option<u64> {
		let receipt = self.receipt.as_ref()?;
		Some(self.head?.saturating_sub(receipt.block_number))
	}
}

/// Spawns one polling task per tracked transaction.
pub struct ConfirmationTracker {
	rpc: Arc<RpcClient>,
	poll_interval: Duration,
	max_confirmations: Option<u64>,
}

impl ConfirmationTracker {
	/// `max_confirmations` caps how deep a handle may wait; polling stops
	/// once the cap is reached.
	pub fn new(rpc: Arc<RpcClient>, poll_interval: Duration, max_confirmations: Option<u64>) -> Self {
		Self {
			rpc,
			poll_interval,
			max_confirmations,
		}
	}

	/// Starts tracking `hash`. Must be called within a tokio runtime.
	pub fn track(&self, hash: B256) -> PendingTransaction {
		let (state_tx, state_rx) = watch::channel(ConfirmationState {
			tx_hash: hash,
			..Default::default()
		});
		tokio::spawn(poll(
			self.rpc.clone(),
			hash,
			self.poll_interval,
			self.max_confirmations,
			state_tx,
		));
		PendingTransaction {
			hash,
			state: state_rx,
			max_confirmations: self.max_confirmations,
		}
	}
}

#[instrument(skip_all, fields(tx_hash = %truncate_middle(&hash.to_string(), 14)))]
async fn poll(
	rpc: Arc<RpcClient>,
	hash: B256,
	interval: Duration,
	max_confirmations: Option<u64>,
	state: watch::Sender<ConfirmationState>,
) {
	loop {
		if state.is_closed() {
			tracing::debug!("No observers left, stopping");
			return;
		}

		let (receipt, head) = tokio::join!(rpc.transaction_receipt(hash), rpc.block_number());
		let (receipt, head) = match (receipt, head) {
			(Ok(receipt), Ok(head)) => (receipt, head),
			(Err(e), _) | (_, Err(e)) => {
				tracing::warn!(error = %e, "Confirmation polling failed");
				state.send_modify(|current| current.failure = Some(e));
				return;
			},
		};

		let was_mined = state.borrow().receipt.is_some();
		let next = ConfirmationState {
			tx_hash: hash,
			receipt,
			head: Some(head),
			failure: None,
		};
		let confirmations = next.confirmations();
		match (&next.receipt, confirmations) {
			(Some(receipt), Some(confirmations)) => tracing::debug!(
				block = receipt.block_number,
				head,
				confirmations,
				"Transaction mined"
			),
			_ if was_mined => tracing::info!(head, "Receipt disappeared, waiting for the transaction again"),
			_ => tracing::trace!(head, "Not mined yet"),
		}
		state.send_replace(next);

		if let (Some(cap), Some(confirmations)) = (max_confirmations, confirmations) {
			if confirmations >= cap {
				tracing::debug!(cap, "Confirmation cap reached, stopping");
				return;
			}
		}

		tokio::time::sleep(interval).await;
	}
}

/// Handle on a submitted transaction.
///
/// Clones share the same polling task; the task stops once every clone is
/// dropped.
#[derive(Debug, Clone)]
pub struct PendingTransaction {
	hash: B256,
	state: watch::Receiver<ConfirmationState>,
	max_confirmations: Option<u64>,
}

impl PendingTransaction {
	/// Hash returned by the submission.
	pub fn hash(&self) -> B256 {
		self.hash
	}

	pub fn state(&self) -> ConfirmationState {
		self.state.borrow().clone()
	}

	/// Current confirmation count, `None` while not mined.
	pub fn confirmations(&self) -> Option<u64> {
		self.state.borrow().confirmations()
	}

	/// Waits until the transaction is mined.
	pub async fn receipt(&self) -> Result<TransactionReceipt, TxError> {
		self.confirmed(0).await
	}

	/// Waits until the transaction has `confirmations` blocks on top of it.
	///
	/// There is no deadline; see [`confirmed_within`](Self::confirmed_within).
	/// A reverted receipt fails with [`TxError::TransactionFailed`].
	pub async fn confirmed(&self, confirmations: u64) -> Result<TransactionReceipt, TxError> {
		if let Some(cap) = self.max_confirmations {
			if confirmations > cap {
				return Err(TxError::ConfirmationCap {
					requested: confirmations,
					cap,
				});
			}
		}

		let mut state = self.state.clone();
		loop {
			let outcome = evaluate(&state.borrow_and_update(), confirmations);
			if let Some(outcome) = outcome {
				return outcome;
			}
			if state.changed().await.is_err() {
				let outcome = evaluate(&state.borrow(), confirmations);
				return outcome.unwrap_or_else(|| {
					Err(TxError::Tracking("polling stopped before the target depth".to_string()))
				});
			}
		}
	}

	/// [`confirmed`](Self::confirmed) bounded by `timeout`.
	pub async fn confirmed_within(
		&self,
		confirmations: u64,
		timeout: Duration,
	) -> Result<TransactionReceipt, TxError> {
		tokio::time::timeout(timeout, self.confirmed(confirmations))
			.await
			.map_err(|_| TxError::Timeout {
				hash: self.hash,
				confirmations,
			})?
	}
}

fn evaluate(state: &ConfirmationState, wanted: u64) -> Option<Result<TransactionReceipt, TxError>> {
	if let Some(receipt) = &state.receipt {
		if !receipt.success() {
			return Some(Err(TxError::TransactionFailed {
				hash: state.tx_hash,
				receipt: Box::new(receipt.clone()),
			}));
		}
		if state.confirmations().is_some_and(|depth| depth >= wanted) {
			return Some(Ok(receipt.clone()));
		}
	}
	state.failure.clone().map(|e| Err(TxError::Rpc(e)))
}

#[cfg(test)]
mod tests {
	use super::*;
	use evm_rpc::{MockTransport, TransportError};
	use serde_json::{json, Value};

	const INTERVAL: Duration = Duration::from_secs(1);

	fn tx_hash() -> B256 {
		B256::repeat_byte(0xaa)
	}

	fn receipt_json(block: u64, status: u64) -> Value {
		json!({
			"transactionHash": tx_hash().to_string(),
			"blockNumber": format!("0x{:x}", block),
			"blockHash": B256::repeat_byte(block as u8).to_string(),
			"gasUsed": "0x5208",
			"logs": [],
			"status": format!("0x{:x}", status),
		})
	}

	fn setup(max_confirmations: Option<u64>) -> (Arc<MockTransport>, ConfirmationTracker) {
		let mock = Arc::new(MockTransport::new());
		let rpc = Arc::new(RpcClient::new(mock.clone()));
		(mock, ConfirmationTracker::new(rpc, INTERVAL, max_confirmations))
	}

	#[tokio::test(start_paused = true)]
	async fn test_confirmation_depth() {
		let (mock, tracker) = setup(None);
		mock.respond("eth_getTransactionReceipt", receipt_json(100, 1))
			.respond("eth_blockNumber", json!("0x67"));

		let pending = tracker.track(tx_hash());
		assert_eq!(pending.hash(), tx_hash());

		let receipt = pending.confirmed(3).await.unwrap();
		assert_eq!(receipt.block_number, 100);
		assert_eq!(pending.confirmations(), Some(3));

		let error = pending
			.confirmed_within(4, Duration::from_secs(30))
			.await
			.unwrap_err();
		assert!(matches!(error, TxError::Timeout { confirmations: 4, .. }));
	}

	#[tokio::test(start_paused = true)]
	async fn test_waits_until_mined() {
		let (mock, tracker) = setup(None);
		mock.respond("eth_getTransactionReceipt", Value::Null)
			.respond("eth_getTransactionReceipt", Value::Null)
			.respond("eth_getTransactionReceipt", receipt_json(5, 1))
			.respond("eth_blockNumber", json!("0x5"));

		let pending = tracker.track(tx_hash());
		assert_eq!(pending.confirmations(), None);

		let receipt = pending.receipt().await.unwrap();
		assert_eq!(receipt.block_number, 5);
		assert_eq!(mock.call_count("eth_getTransactionReceipt"), 3);
	}

	#[tokio::test(start_paused = true)]
	async fn test_reorg_recomputes_depth() {
		let (mock, tracker) = setup(None);
		mock.respond("eth_getTransactionReceipt", receipt_json(100, 1))
			.respond("eth_getTransactionReceipt", Value::Null)
			.respond("eth_getTransactionReceipt", receipt_json(105, 1))
			.respond("eth_blockNumber", json!("0x65"))
			.respond("eth_blockNumber", json!("0x66"))
			.respond("eth_blockNumber", json!("0x6a"))
			.respond("eth_blockNumber", json!("0x6b"));

		let pending = tracker.track(tx_hash());
		let receipt = pending.confirmed(2).await.unwrap();
		assert_eq!(receipt.block_number, 105);
		assert_eq!(mock.call_count("eth_getTransactionReceipt"), 4);
	}

	#[tokio::test(start_paused = true)]
	async fn test_reverted_receipt_fails() {
		let (mock, tracker) = setup(None);
		mock.respond("eth_getTransactionReceipt", receipt_json(7, 0))
			.respond("eth_blockNumber", json!("0x9"));

		let pending = tracker.track(tx_hash());
		let error = pending.receipt().await.unwrap_err();
		match error {
			TxError::TransactionFailed { hash, receipt } => {
				assert_eq!(hash, tx_hash());
				assert_eq!(receipt.status, Some(0));
			},
			other => panic!("unexpected error: {:?}", other),
		}
	}

	#[tokio::test(start_paused = true)]
	async fn test_rpc_failure_is_terminal() {
		let (mock, tracker) = setup(None);
		mock.respond_error("eth_getTransactionReceipt", -32000, "backend down", None)
			.respond("eth_blockNumber", json!("0x9"));

		let pending = tracker.track(tx_hash());
		let error = pending.confirmed(1).await.unwrap_err();
		assert!(matches!(error, TxError::Rpc(_)));
		let state = pending.state();
		assert_eq!(state.tx_hash, tx_hash());
		assert!(state.failure.is_some());
	}

	#[tokio::test(start_paused = true)]
	async fn test_transport_failure_reaches_waiters() {
		let (mock, tracker) = setup(None);
		mock.respond("eth_getTransactionReceipt", Value::Null)
			.fail(
				"eth_blockNumber",
				TransportError::Closed("socket closed".to_string()),
			);

		let pending = tracker.track(tx_hash());
		let error = pending.confirmed(1).await.unwrap_err();
		assert!(matches!(
			error,
			TxError::Rpc(RpcError::Transport(TransportError::Closed(_)))
		));
		assert_eq!(mock.call_count("eth_blockNumber"), 1);
	}

	#[tokio::test(start_paused = true)]
	async fn test_confirmation_cap() {
		let (mock, tracker) = setup(Some(2));
		mock.respond("eth_getTransactionReceipt", receipt_json(100, 1))
			.respond("eth_blockNumber", json!("0x6e"));

		let pending = tracker.track(tx_hash());
		assert!(matches!(
			pending.confirmed(3).await,
			Err(TxError::ConfirmationCap {
				requested: 3,
				cap: 2
			})
		));
		assert_eq!(pending.confirmed(2).await.unwrap().block_number, 100);

		tokio::time::sleep(INTERVAL * 10).await;
		assert_eq!(mock.call_count("eth_getTransactionReceipt"), 1);
	}

	#[tokio::test(start_paused = true)]
	async fn test_polling_stops_when_handles_dropped() {
		let (mock, tracker) = setup(None);
		mock.respond("eth_getTransactionReceipt", Value::Null)
			.respond("eth_blockNumber", json!("0x1"));

		let pending = tracker.track(tx_hash());
		let observer = pending.clone();
		tokio::time::sleep(INTERVAL * 3).await;
		drop(pending);
		tokio::time::sleep(INTERVAL * 3).await;
		assert!(mock.call_count("eth_getTransactionReceipt") >= 4);

		drop(observer);
		tokio::time::sleep(INTERVAL * 2).await;
		let calls = mock.call_count("eth_getTransactionReceipt");
		tokio::time::sleep(INTERVAL * 10).await;
		assert_eq!(mock.call_count("eth_getTransactionReceipt"), calls);
	}
}
