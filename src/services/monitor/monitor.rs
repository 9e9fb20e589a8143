// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@on1.no>

use crate::common::error::AppError;
use crate::data::contracts::selectors;
use crate::domain::constants::{GAS_RESOLVE, MAX_MONITOR_GAP};
use crate::network::ledger::Ledger;
use crate::network::nonce::NonceManager;
use crate::network::receipts::{ReceiptPolicy, await_receipt};
use crate::services::monitor::transfers::{Decision, Finalizer, TransferRequest, TransferStatus};
use crate::services::staging::calldata::encode_call;
use crate::services::staging::signer::{LegacyRequest, sign_legacy};
use alloy::primitives::{Address, B256, TxKind, U256};
use alloy::signers::local::PrivateKeySigner;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

/// Drains a logic contract's transfer-request queue in index order.
pub struct TransferMonitor<L: Ledger + ?Sized> {
    ledger: Arc<L>,
    resolver: PrivateKeySigner,
    chain_id: u64,
    logic: Address,
    gas_limit: u64,
    nonces: NonceManager,
    policy: ReceiptPolicy,
    /// Resolutions broadcast but not yet seen mined, by request index.
    pending: HashMap<U256, B256>,
}

impl<L: Ledger + ?Sized> TransferMonitor<L> {
    pub fn new(
        ledger: Arc<L>,
        resolver: PrivateKeySigner,
        chain_id: u64,
        logic: Address,
        policy: ReceiptPolicy,
    ) -> Self {
        let nonces = NonceManager::new(resolver.address());
        Self {
            ledger,
            resolver,
            chain_id,
            logic,
            gas_limit: GAS_RESOLVE,
            nonces,
            policy,
            pending: HashMap::new(),
        }
    }

    pub fn with_gas_limit(mut self, gas_limit: u64) -> Self {
        self.gas_limit = gas_limit;
        self
    }

    pub fn logic(&self) -> Address {
        self.logic
    }

    pub async fn read_request(&self, index: U256) -> Result<TransferRequest, AppError> {
        let input = encode_call(selectors::TRANSFER_REQUESTS, &[index.into()])?;
        let data = self.ledger.call(self.logic, input).await?;
        TransferRequest::decode(index, &data)
    }

    async fn submit_resolution(&mut self, index: U256, code: u16) -> Result<B256, AppError> {
        let input = encode_call(selectors::RESOLVE, &[index.into(), code.into()])?;
        let nonce = self.nonces.get_next_nonce(self.ledger.as_ref()).await?;
        let gas_price = self.ledger.gas_price().await?;
        let (raw, _) = sign_legacy(
            &self.resolver,
            self.chain_id,
            LegacyRequest {
                to: TxKind::Call(self.logic),
                input,
                gas_limit: self.gas_limit,
                gas_price,
                nonce,
            },
        )?;
        let hash = self.ledger.send_raw_transaction(&raw).await?;
        self.nonces.mark_used(nonce);
        Ok(hash)
    }

    /// Resolve one Active request and wait for it to be mined.
    async fn resolve_one<D, F>(
        &mut self,
        request: &TransferRequest,
        decision: &D,
        finalizer: &F,
    ) -> Result<B256, AppError>
    where
        D: Decision,
        F: Finalizer<D::Extra>,
    {
        let (code, extra) = decision.decide(request).await?;
        let hash = match self.pending.get(&request.index) {
            Some(&hash) => {
                tracing::info!(
                    target: "monitor",
                    index = %request.index,
                    hash = %format!("{:#x}", hash),
                    "Awaiting earlier resolution instead of resubmitting"
                );
                hash
            }
            None => {
                let hash = self.submit_resolution(request.index, code).await?;
                self.pending.insert(request.index, hash);
                tracing::info!(
                    target: "monitor",
                    index = %request.index,
                    code,
                    hash = %format!("{:#x}", hash),
                    "Resolution submitted"
                );
                hash
            }
        };
        let receipt = match await_receipt(self.ledger.as_ref(), &[hash], &self.policy).await {
            Ok(receipt) => receipt,
            Err(e) => {
                self.nonces.resync();
                return Err(e);
            }
        };
        self.pending.remove(&request.index);
        if !receipt.success {
            tracing::error!(
                target: "monitor",
                index = %request.index,
                hash = %format!("{:#x}", hash),
                "Resolution failed"
            );
            return Err(AppError::ResolutionFailed {
                index: request.index,
                hash,
            });
        }
        finalizer.finalize(hash, extra).await?;
        Ok(hash)
    }

    /// Resolve the contiguous run of Active requests starting at
    /// `starting_index` and return the next index to examine.
    pub async fn resolve_range<D, F>(
        &mut self,
        starting_index: U256,
        decision: &D,
        finalizer: &F,
    ) -> Result<U256, AppError>
    where
        D: Decision,
        F: Finalizer<D::Extra>,
    {
        let mut cursor = starting_index;
        loop {
            let request = self.read_request(cursor).await?;
            if request.status != TransferStatus::Active {
                self.pending.remove(&cursor);
                tracing::debug!(
                    target: "monitor",
                    index = %cursor,
                    status = ?request.status,
                    "No active request"
                );
                return Ok(cursor);
            }
            self.resolve_one(&request, decision, finalizer).await?;
            cursor += U256::from(1u8);
        }
    }

    /// Scan forward from `start` and collect Active requests, giving up after
    /// more than `max_gap` consecutive Unused slots. `max_gap` is capped at
    /// `MAX_MONITOR_GAP`.
    pub async fn active_requests(
        &self,
        start: U256,
        max_gap: u64,
    ) -> Result<Vec<TransferRequest>, AppError> {
        if max_gap > MAX_MONITOR_GAP {
            tracing::warn!(target: "monitor", max_gap, cap = MAX_MONITOR_GAP, "Gap clamped");
        }
        let max_gap = max_gap.min(MAX_MONITOR_GAP);
        let mut active = Vec::new();
        let mut gap = 0u64;
        let mut cursor = start;
        while gap <= max_gap {
            let request = self.read_request(cursor).await?;
            match request.status {
                TransferStatus::Unused => gap += 1,
                TransferStatus::Active => {
                    gap = 0;
                    active.push(request);
                }
                TransferStatus::Resolved => gap = 0,
            }
            cursor += U256::from(1u8);
        }
        tracing::debug!(
            target: "monitor",
            start = %start,
            scanned_to = %cursor,
            found = active.len(),
            "Sparse scan finished"
        );
        Ok(active)
    }

    /// Sparse mode: resolve every Active request within the gap, in index
    /// order. Returns one past the last resolved index, or `start`.
    pub async fn resolve_active<D, F>(
        &mut self,
        start: U256,
        max_gap: u64,
        decision: &D,
        finalizer: &F,
    ) -> Result<U256, AppError>
    where
        D: Decision,
        F: Finalizer<D::Extra>,
    {
        let mut cursor = start;
        for request in self.active_requests(start, max_gap).await? {
            self.resolve_one(&request, decision, finalizer).await?;
            cursor = request.index + U256::from(1u8);
        }
        Ok(cursor)
    }

    /// Poll `resolve_range` until cancelled, sleeping `interval` between
    /// passes that make no progress. Cancellation is checked between passes.
    pub async fn run<D, F>(
        &mut self,
        start: U256,
        interval: Duration,
        decision: &D,
        finalizer: &F,
        shutdown: CancellationToken,
    ) -> Result<U256, AppError>
    where
        D: Decision,
        F: Finalizer<D::Extra>,
    {
        let mut cursor = start;
        tracing::info!(
            target: "monitor",
            logic = %self.logic,
            resolver = %self.resolver.address(),
            start = %start,
            "Monitor started"
        );
        loop {
            if shutdown.is_cancelled() {
                break;
            }
            // Not raced against shutdown: a resolution in flight is seen through.
            let next = self.resolve_range(cursor, decision, finalizer).await?;
            if next > cursor {
                tracing::info!(target: "monitor", from = %cursor, to = %next, "Cursor advanced");
                cursor = next;
                continue;
            }
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = sleep(interval) => {}
            }
        }
        tracing::info!(target: "monitor", cursor = %cursor, "Shutdown requested; monitor stopped");
        Ok(cursor)
    }
}
