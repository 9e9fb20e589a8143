// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::common::error::AppError;
use crate::common::retry::Backoff;
use crate::network::ledger::{Ledger, ReceiptSummary};
use alloy::primitives::B256;
use std::time::{Duration, Instant};

/// How long and how often to poll for a mined receipt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReceiptPolicy {
    pub initial_delay: Duration,
    pub max_delay: Duration,
    /// `None` polls until a receipt shows up.
    pub timeout: Option<Duration>,
}

impl Default for ReceiptPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(16),
            timeout: Some(Duration::from_secs(30 * 60)),
        }
    }
}

impl ReceiptPolicy {
    pub fn unbounded(poll: Duration) -> Self {
        Self {
            initial_delay: poll,
            max_delay: poll,
            timeout: None,
        }
    }
}

/// Wait until any of `hashes` is mined and return its receipt.
///
/// All hashes must share one nonce, so at most one of them can ever be mined.
/// Lookup errors are treated like a missing receipt and polled again.
pub async fn await_receipt<L: Ledger + ?Sized>(
    ledger: &L,
    hashes: &[B256],
    policy: &ReceiptPolicy,
) -> Result<ReceiptSummary, AppError> {
    let Some(last) = hashes.last().copied() else {
        return Err(AppError::Validation {
            field: "hashes".into(),
            message: "nothing to wait for".into(),
        });
    };
    let started = Instant::now();
    let mut backoff = Backoff::new(policy.initial_delay, policy.max_delay);

    loop {
        for hash in hashes.iter().rev() {
            match ledger.transaction_receipt(*hash).await {
                Ok(Some(receipt)) => {
                    tracing::debug!(
                        target: "rpc",
                        hash = %format!("{:#x}", hash),
                        block = ?receipt.block_number,
                        success = receipt.success,
                        "Receipt found"
                    );
                    return Ok(receipt);
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::debug!(
                        target: "rpc",
                        error = %e,
                        hash = %format!("{:#x}", hash),
                        "Receipt lookup error; retrying"
                    );
                }
            }
        }

        let delay = backoff.next_delay();
        if let Some(timeout) = policy.timeout
            && started.elapsed() + delay > timeout
        {
            return Err(AppError::ReceiptTimeout {
                hash: last,
                waited_ms: started.elapsed().as_millis() as u64,
            });
        }
        tokio::time::sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{Address, Bytes};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Receipt appears for `mined` after `misses` empty polls.
    struct SlowLedger {
        mined: B256,
        misses: Mutex<usize>,
        lookups: Mutex<Vec<B256>>,
    }

    #[async_trait]
    impl Ledger for SlowLedger {
        async fn transaction_count(&self, _: Address) -> Result<u64, AppError> {
            Ok(0)
        }
        async fn gas_price(&self) -> Result<u128, AppError> {
            Ok(1)
        }
        async fn chain_id(&self) -> Result<u64, AppError> {
            Ok(1)
        }
        async fn send_raw_transaction(&self, _: &[u8]) -> Result<B256, AppError> {
            Ok(B256::ZERO)
        }
        async fn transaction_receipt(
            &self,
            hash: B256,
        ) -> Result<Option<ReceiptSummary>, AppError> {
            self.lookups.lock().unwrap().push(hash);
            if hash != self.mined {
                return Ok(None);
            }
            let mut misses = self.misses.lock().unwrap();
            if *misses > 0 {
                *misses -= 1;
                return Err(AppError::Connection("flaky".into()));
            }
            Ok(Some(ReceiptSummary {
                transaction_hash: hash,
                success: true,
                block_number: Some(7),
                contract_address: None,
                logs: Vec::new(),
            }))
        }
        async fn call(&self, _: Address, _: Bytes) -> Result<Bytes, AppError> {
            Ok(Bytes::new())
        }
    }

    fn fast() -> ReceiptPolicy {
        ReceiptPolicy {
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2),
            timeout: Some(Duration::from_millis(500)),
        }
    }

    #[tokio::test]
    async fn returns_whichever_replacement_was_mined() {
        let first = B256::repeat_byte(1);
        let second = B256::repeat_byte(2);
        let ledger = SlowLedger {
            mined: first,
            misses: Mutex::new(2),
            lookups: Mutex::new(Vec::new()),
        };
        let receipt = await_receipt(&ledger, &[first, second], &fast()).await.unwrap();
        assert_eq!(receipt.transaction_hash, first);
        assert!(ledger.lookups.lock().unwrap().contains(&second));
    }

    #[tokio::test]
    async fn bounded_wait_times_out() {
        let ledger = SlowLedger {
            mined: B256::repeat_byte(9),
            misses: Mutex::new(0),
            lookups: Mutex::new(Vec::new()),
        };
        let policy = ReceiptPolicy {
            timeout: Some(Duration::from_millis(10)),
            ..fast()
        };
        let err = await_receipt(&ledger, &[B256::repeat_byte(3)], &policy)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ReceiptTimeout { .. }));
    }

    #[tokio::test]
    async fn empty_hash_list_is_rejected() {
        let ledger = SlowLedger {
            mined: B256::ZERO,
            misses: Mutex::new(0),
            lookups: Mutex::new(Vec::new()),
        };
        assert!(await_receipt(&ledger, &[], &fast()).await.is_err());
    }
}
