// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::common::error::AppError;
use crate::common::retry::retry_async;
use crate::network::provider::HttpProvider;
use alloy::primitives::{Address, B256, Bytes, TxKind};
use alloy::providers::Provider;
use alloy::rpc::types::eth::{TransactionInput, TransactionReceipt, TransactionRequest};
use async_trait::async_trait;
use std::time::Duration;

const READ_ATTEMPTS: usize = 3;
const READ_BACKOFF: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSummary {
    pub address: Address,
    pub data: Bytes,
}

/// The parts of a mined receipt the publisher and monitor act on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiptSummary {
    pub transaction_hash: B256,
    pub success: bool,
    pub block_number: Option<u64>,
    pub contract_address: Option<Address>,
    pub logs: Vec<LogSummary>,
}

impl From<&TransactionReceipt> for ReceiptSummary {
    fn from(rcpt: &TransactionReceipt) -> Self {
        Self {
            transaction_hash: rcpt.transaction_hash,
            success: rcpt.status(),
            block_number: rcpt.block_number,
            contract_address: rcpt.contract_address,
            logs: rcpt
                .inner
                .logs()
                .iter()
                .map(|log| LogSummary {
                    address: log.inner.address,
                    data: log.inner.data.data.clone(),
                })
                .collect(),
        }
    }
}

/// The RPC surface this crate needs from a ledger node.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Pending transaction count of `address`.
    async fn transaction_count(&self, address: Address) -> Result<u64, AppError>;

    async fn gas_price(&self) -> Result<u128, AppError>;

    async fn chain_id(&self) -> Result<u64, AppError>;

    /// Broadcasts signed bytes exactly as given.
    async fn send_raw_transaction(&self, raw: &[u8]) -> Result<B256, AppError>;

    async fn transaction_receipt(&self, hash: B256) -> Result<Option<ReceiptSummary>, AppError>;

    /// Read-only `eth_call` against `to`.
    async fn call(&self, to: Address, input: Bytes) -> Result<Bytes, AppError>;
}

#[derive(Clone)]
pub struct RpcLedger {
    provider: HttpProvider,
}

impl RpcLedger {
    pub fn new(provider: HttpProvider) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &HttpProvider {
        &self.provider
    }
}

#[async_trait]
impl Ledger for RpcLedger {
    async fn transaction_count(&self, address: Address) -> Result<u64, AppError> {
        let provider = self.provider.clone();
        retry_async(
            move |_| {
                let provider = provider.clone();
                async move { provider.get_transaction_count(address).pending().await }
            },
            READ_ATTEMPTS,
            READ_BACKOFF,
        )
        .await
        .map_err(|e| AppError::Connection(format!("Failed to fetch nonce: {}", e)))
    }

    async fn gas_price(&self) -> Result<u128, AppError> {
        let provider = self.provider.clone();
        retry_async(
            move |_| {
                let provider = provider.clone();
                async move { provider.get_gas_price().await }
            },
            READ_ATTEMPTS,
            READ_BACKOFF,
        )
        .await
        .map_err(|e| AppError::Connection(format!("Failed to fetch gas price: {}", e)))
    }

    async fn chain_id(&self) -> Result<u64, AppError> {
        self.provider
            .get_chain_id()
            .await
            .map_err(|e| AppError::Connection(format!("chain_id detect failed: {e}")))
    }

    async fn send_raw_transaction(&self, raw: &[u8]) -> Result<B256, AppError> {
        // No retry here: a resend of the same bytes is the operator's call.
        let pending = self
            .provider
            .send_raw_transaction(raw)
            .await
            .map_err(|e| AppError::Connection(format!("eth_sendRawTransaction failed: {e}")))?;
        Ok(*pending.tx_hash())
    }

    async fn transaction_receipt(&self, hash: B256) -> Result<Option<ReceiptSummary>, AppError> {
        let receipt = self
            .provider
            .get_transaction_receipt(hash)
            .await
            .map_err(|e| AppError::Connection(format!("Receipt lookup failed: {e}")))?;
        Ok(receipt.as_ref().map(ReceiptSummary::from))
    }

    async fn call(&self, to: Address, input: Bytes) -> Result<Bytes, AppError> {
        let provider = self.provider.clone();
        retry_async(
            move |_| {
                let provider = provider.clone();
                let request = TransactionRequest {
                    to: Some(TxKind::Call(to)),
                    input: TransactionInput::new(input.clone()),
                    ..Default::default()
                };
                async move { provider.call(request).await }
            },
            READ_ATTEMPTS,
            READ_BACKOFF,
        )
        .await
        .map_err(|e| AppError::Connection(format!("eth_call to {to:#x} failed: {e}")))
    }
}
