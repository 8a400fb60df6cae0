//! In-process signing with a raw private key.

use crate::{AccountError, SignerInterface, UnsignedTransaction};
use alloy_consensus::{SignableTransaction, TxEip1559, TxEip2930, TxEnvelope, TxLegacy};
use alloy_eips::eip2718::Encodable2718;
use alloy_eips::eip2930::AccessList;
use alloy_primitives::{Address, Bytes, TxKind, U256};
use alloy_signer::SignerSync;
use alloy_signer_local::PrivateKeySigner;
use async_trait::async_trait;
use evm_types::{SecretString, TxEncoding};

/// Signs with secp256k1 keys given as hex strings.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalSigner;

impl LocalSigner {
	pub fn new() -> Self {
		Self
	}

	fn signer(key: &SecretString) -> Result<PrivateKeySigner, AccountError> {
		key.with_exposed(|raw| raw.trim().parse::<PrivateKeySigner>())
			.map_err(|e| AccountError::InvalidKey(e.to_string()))
	}
}

fn fee(field: &str, value: Option<U256>) -> Result<u128, AccountError> {
	let value = value.ok_or_else(|| AccountError::InvalidTransaction(format!("{} is not set", field)))?;
	u128::try_from(value)
		.map_err(|_| AccountError::InvalidTransaction(format!("{} does not fit in 128 bits", field)))
}

fn typed_chain_id(tx: &UnsignedTransaction) -> Result<u64, AccountError> {
	tx.chain_id.ok_or_else(|| {
		AccountError::InvalidTransaction("typed transactions require a chain id".into())
	})
}

#[async_trait]
impl SignerInterface for LocalSigner {
	fn derive_address(&self, key: &SecretString) -> Result<Address, AccountError> {
		Ok(Self::signer(key)?.address())
	}

	async fn sign_transaction(
		&self,
		key: &SecretString,
		tx: &UnsignedTransaction,
		encoding: TxEncoding,
	) -> Result<Bytes, AccountError> {
		let signer = Self::signer(key)?;
		let to = TxKind::from(tx.to);
		let sign_err = |e: alloy_signer::Error| AccountError::SigningFailed(e.to_string());

		let envelope = match encoding {
			TxEncoding::Legacy => {
				let unsigned = TxLegacy {
					chain_id: tx.chain_id,
					nonce: tx.nonce,
					gas_price: fee("gas_price", tx.gas_price)?,
					gas_limit: tx.gas_limit,
					to,
					value: tx.value,
					input: tx.input.clone(),
				};
				let signature = signer
					.sign_hash_sync(&unsigned.signature_hash())
					.map_err(sign_err)?;
				TxEnvelope::from(unsigned.into_signed(signature))
			},
			TxEncoding::AccessList => {
				let unsigned = TxEip2930 {
					chain_id: typed_chain_id(tx)?,
					nonce: tx.nonce,
					gas_price: fee("gas_price", tx.gas_price)?,
					gas_limit: tx.gas_limit,
					to,
					value: tx.value,
					access_list: AccessList::default(),
					input: tx.input.clone(),
				};
				let signature = signer
					.sign_hash_sync(&unsigned.signature_hash())
					.map_err(sign_err)?;
				TxEnvelope::from(unsigned.into_signed(signature))
			},
			TxEncoding::FeeMarket => {
				let unsigned = TxEip1559 {
					chain_id: typed_chain_id(tx)?,
					nonce: tx.nonce,
					gas_limit: tx.gas_limit,
					max_fee_per_gas: fee("max_fee_per_gas", tx.max_fee_per_gas)?,
					max_priority_fee_per_gas: fee(
						"max_priority_fee_per_gas",
						tx.max_priority_fee_per_gas,
					)?,
					to,
					value: tx.value,
					access_list: AccessList::default(),
					input: tx.input.clone(),
				};
				let signature = signer
					.sign_hash_sync(&unsigned.signature_hash())
					.map_err(sign_err)?;
				TxEnvelope::from(unsigned.into_signed(signature))
			},
		};

		tracing::debug!(
			encoding = ?encoding,
			nonce = tx.nonce,
			hash = %envelope.tx_hash(),
			"Signed transaction"
		);
		Ok(Bytes::from(envelope.encoded_2718()))
	}
}
