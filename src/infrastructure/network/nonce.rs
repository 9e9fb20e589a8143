// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use crate::common::error::AppError;
use crate::network::ledger::Ledger;
use alloy::primitives::Address;

/// Nonce source for a hot wallet sending one transaction at a time.
///
/// The node's pending count can lag right after a receipt; the locally
/// recorded high-water mark keeps the nonce from going backwards.
#[derive(Debug, Clone)]
pub struct NonceManager {
    address: Address,
    next_local: Option<u64>,
}

impl NonceManager {
    pub fn new(address: Address) -> Self {
        Self {
            address,
            next_local: None,
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub async fn get_next_nonce<L: Ledger + ?Sized>(&self, ledger: &L) -> Result<u64, AppError> {
        let on_chain = ledger.transaction_count(self.address).await?;
        let nonce = match self.next_local {
            Some(local) if local > on_chain => {
                tracing::debug!(
                    target: "rpc",
                    on_chain,
                    local,
                    "Pending nonce behind local high-water mark"
                );
                local
            }
            _ => on_chain,
        };
        Ok(nonce)
    }

    pub fn mark_used(&mut self, nonce: u64) {
        self.next_local = Some(self.next_local.unwrap_or(0).max(nonce + 1));
    }

    pub fn resync(&mut self) {
        self.next_local = None;
        tracing::info!(target: "rpc", address = %self.address, "Nonce cache cleared");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::ledger::ReceiptSummary;
    use alloy::primitives::{B256, Bytes};
    use async_trait::async_trait;

    struct FixedCount(u64);

    #[async_trait]
    impl Ledger for FixedCount {
        async fn transaction_count(&self, _: Address) -> Result<u64, AppError> {
            Ok(self.0)
        }
        async fn gas_price(&self) -> Result<u128, AppError> {
            Ok(0)
        }
        async fn chain_id(&self) -> Result<u64, AppError> {
            Ok(1)
        }
        async fn send_raw_transaction(&self, _: &[u8]) -> Result<B256, AppError> {
            Ok(B256::ZERO)
        }
        async fn transaction_receipt(&self, _: B256) -> Result<Option<ReceiptSummary>, AppError> {
            Ok(None)
        }
        async fn call(&self, _: Address, _: Bytes) -> Result<Bytes, AppError> {
            Ok(Bytes::new())
        }
    }

    #[tokio::test]
    async fn never_hands_out_a_used_nonce() {
        let mut nonces = NonceManager::new(Address::ZERO);
        let lagging = FixedCount(4);
        assert_eq!(nonces.get_next_nonce(&lagging).await.unwrap(), 4);
        nonces.mark_used(4);
        assert_eq!(nonces.get_next_nonce(&lagging).await.unwrap(), 5);

        let ahead = FixedCount(9);
        assert_eq!(nonces.get_next_nonce(&ahead).await.unwrap(), 9);

        nonces.resync();
        assert_eq!(nonces.get_next_nonce(&lagging).await.unwrap(), 4);
    }
}
