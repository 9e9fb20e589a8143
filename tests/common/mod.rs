// SPDX-License-Identifier: MIT
// In-memory ledger used by the integration tests. It decodes every raw
// transaction it is handed, mines it immediately (unless told otherwise) and
// keeps just enough contract state to answer `transferRequests` reads.
#![allow(dead_code)]

use alloy::primitives::{Address, B256, Bytes, TxKind, U256};
use alloy_sol_types::SolValue;
use async_trait::async_trait;
use s3_issuance::common::error::AppError;
use s3_issuance::data::contracts::selectors;
use s3_issuance::domain::transcript::Step;
use s3_issuance::network::ledger::{Ledger, LogSummary, ReceiptSummary};
use s3_issuance::network::receipts::ReceiptPolicy;
use s3_issuance::services::publish::{AfterSubmit, FeeChoice, Operator};
use s3_issuance::services::staging::signer::{DecodedLegacy, decode_legacy};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Slot {
    pub src: Address,
    pub dest: Address,
    pub amount: U256,
    pub spender: Address,
    pub status: u8,
}

#[derive(Default)]
pub struct ChainState {
    pub chain_id: u64,
    pub gas_price: u128,
    pub tx_count: u64,
    pub sent: Vec<DecodedLegacy>,
    pub receipts: HashMap<B256, ReceiptSummary>,
    /// Transactions priced below this are accepted but never mined.
    pub min_mined_gas_price: u128,
    pub revert_next: bool,
    /// Used to derive CREATE addresses; `None` leaves them unset.
    pub deployer: Option<Address>,
    pub deploy_address_override: Option<Address>,
    pub next_security_id: u64,
    pub slots: Vec<Slot>,
    pub balances: HashMap<Address, U256>,
    pub resolutions: Vec<(U256, u16)>,
    pub fail_resolution_of: Option<U256>,
    /// Nonces already consumed by a mined transaction.
    pub mined_nonces: HashSet<u64>,
    /// Rejects the next broadcast outright, as an unreachable node would.
    pub fail_next_send: bool,
}

fn slot_index(index: U256) -> Option<usize> {
    (index < U256::from(u32::MAX)).then(|| index.to::<usize>())
}

pub struct FakeLedger {
    pub state: Mutex<ChainState>,
}

impl FakeLedger {
    pub fn new(chain_id: u64) -> Self {
        Self {
            state: Mutex::new(ChainState {
                chain_id,
                gas_price: 1_000_000_000,
                ..ChainState::default()
            }),
        }
    }

    pub fn with<R>(&self, f: impl FnOnce(&mut ChainState) -> R) -> R {
        f(&mut self.state.lock().unwrap())
    }

    pub fn push_slot(&self, src: Address, dest: Address, amount: U256, status: u8) {
        self.with(|s| {
            s.slots.push(Slot {
                src,
                dest,
                amount,
                spender: src,
                status,
            })
        });
    }

    pub fn sent(&self) -> Vec<DecodedLegacy> {
        self.with(|s| s.sent.clone())
    }

    /// Mine every accepted transaction that is still waiting for a receipt.
    pub fn mine_pending(&self) {
        self.with(|s| {
            let pending: Vec<DecodedLegacy> = s
                .sent
                .iter()
                .filter(|tx| !s.receipts.contains_key(&tx.hash) && !s.mined_nonces.contains(&tx.nonce))
                .cloned()
                .collect();
            for tx in pending {
                Self::mine(s, &tx);
            }
        });
    }

    fn mine(s: &mut ChainState, tx: &DecodedLegacy) {
        s.tx_count += 1;
        s.mined_nonces.insert(tx.nonce);
        let (mut success, logs) = Self::apply(s, tx);
        if s.revert_next {
            s.revert_next = false;
            success = false;
        }
        let contract_address = match tx.to {
            TxKind::Create => s
                .deploy_address_override
                .or_else(|| s.deployer.map(|d| d.create(tx.nonce))),
            TxKind::Call(_) => None,
        };
        let block = s.receipts.len() as u64 + 1;
        s.receipts.insert(
            tx.hash,
            ReceiptSummary {
                transaction_hash: tx.hash,
                success,
                block_number: Some(block),
                contract_address,
                logs,
            },
        );
    }

    fn apply(state: &mut ChainState, tx: &DecodedLegacy) -> (bool, Vec<LogSummary>) {
        let input = tx.input.as_ref();
        if input.len() < 4 {
            return (true, Vec::new());
        }
        let selector: [u8; 4] = [input[0], input[1], input[2], input[3]];
        let word = |i: usize| U256::from_be_slice(&input[4 + 32 * i..4 + 32 * (i + 1)]);

        if selector == selectors::INITIALIZE {
            let id = state.next_security_id;
            state.next_security_id += 1;
            let to = match tx.to {
                TxKind::Call(to) => to,
                TxKind::Create => Address::ZERO,
            };
            let log = LogSummary {
                address: to,
                data: Bytes::from(U256::from(id).to_be_bytes::<32>().to_vec()),
            };
            return (true, vec![log]);
        }
        if selector == selectors::RESOLVE {
            let index = word(0);
            let code = word(1).to::<u16>();
            if state.fail_resolution_of == Some(index) {
                return (false, Vec::new());
            }
            let Some(slot) = slot_index(index).and_then(|i| state.slots.get_mut(i)) else {
                return (false, Vec::new());
            };
            if slot.status != 1 {
                return (false, Vec::new());
            }
            slot.status = 2;
            let slot = slot.clone();
            if code == 0 {
                let src = state.balances.entry(slot.src).or_default();
                *src = src.saturating_sub(slot.amount);
                *state.balances.entry(slot.dest).or_default() += slot.amount;
            }
            state.resolutions.push((index, code));
            return (true, Vec::new());
        }
        (true, Vec::new())
    }
}

#[async_trait]
impl Ledger for FakeLedger {
    async fn transaction_count(&self, _address: Address) -> Result<u64, AppError> {
        Ok(self.with(|s| s.tx_count))
    }

    async fn gas_price(&self) -> Result<u128, AppError> {
        Ok(self.with(|s| s.gas_price))
    }

    async fn chain_id(&self) -> Result<u64, AppError> {
        Ok(self.with(|s| s.chain_id))
    }

    async fn send_raw_transaction(&self, raw: &[u8]) -> Result<B256, AppError> {
        let tx = decode_legacy(raw)?;
        self.with(|s| {
            if tx.chain_id != Some(s.chain_id) {
                return Err(AppError::Connection("invalid chain id".into()));
            }
            if std::mem::take(&mut s.fail_next_send) {
                return Err(AppError::Connection("connection refused".into()));
            }
            if s.mined_nonces.contains(&tx.nonce) {
                return Err(AppError::Connection("nonce too low".into()));
            }
            s.sent.push(tx.clone());
            if tx.gas_price < s.min_mined_gas_price {
                return Ok(tx.hash);
            }
            Self::mine(s, &tx);
            Ok(tx.hash)
        })
    }

    async fn transaction_receipt(&self, hash: B256) -> Result<Option<ReceiptSummary>, AppError> {
        Ok(self.with(|s| s.receipts.get(&hash).cloned()))
    }

    async fn call(&self, _to: Address, input: Bytes) -> Result<Bytes, AppError> {
        if input.len() != 36 || input[..4] != selectors::TRANSFER_REQUESTS {
            return Err(AppError::Connection("unsupported call".into()));
        }
        let index = U256::from_be_slice(&input[4..36]);
        let slot = self.with(|s| slot_index(index).and_then(|i| s.slots.get(i).cloned()));
        let encoded = match slot {
            Some(slot) => (slot.src, slot.dest, slot.amount, slot.spender, U256::from(slot.status)),
            None => (Address::ZERO, Address::ZERO, U256::ZERO, Address::ZERO, U256::ZERO),
        }
        .abi_encode_params();
        Ok(Bytes::from(encoded))
    }
}

/// Replays a fixed script of operator answers and records what was asked.
#[derive(Default)]
pub struct ScriptedOperator {
    pub fees: VecDeque<FeeChoice>,
    pub after: VecDeque<AfterSubmit>,
    pub fee_prompts: usize,
    pub offered: Vec<Vec<u128>>,
}

impl ScriptedOperator {
    pub fn new(fees: Vec<FeeChoice>, after: Vec<AfterSubmit>) -> Self {
        Self {
            fees: fees.into(),
            after: after.into(),
            ..Self::default()
        }
    }
}

#[async_trait]
impl Operator for ScriptedOperator {
    async fn choose_fee(&mut self, _step: &Step, levels: &[u128]) -> Result<FeeChoice, AppError> {
        self.fee_prompts += 1;
        self.offered.push(levels.to_vec());
        Ok(self.fees.pop_front().unwrap_or(FeeChoice::Stop))
    }

    async fn after_submit(&mut self, _step: &Step, _hash: B256) -> Result<AfterSubmit, AppError> {
        Ok(self.after.pop_front().unwrap_or(AfterSubmit::Wait))
    }
}

pub fn fast_receipts() -> ReceiptPolicy {
    ReceiptPolicy {
        initial_delay: Duration::from_millis(1),
        max_delay: Duration::from_millis(4),
        timeout: Some(Duration::from_millis(200)),
    }
}
