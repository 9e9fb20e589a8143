// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@on1.no>

use crate::common::error::AppError;
use crate::data::contracts::SimplifiedTokenLogic;
use alloy::primitives::{Address, B256, U256};
use alloy_sol_types::SolCall;
use async_trait::async_trait;
use std::fmt::Debug;

/// Resolution code accepted by the logic contract for an approved transfer.
pub const CODE_APPROVE: u16 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferStatus {
    Unused,
    Active,
    Resolved,
}

impl TryFrom<u8> for TransferStatus {
    type Error = AppError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(TransferStatus::Unused),
            1 => Ok(TransferStatus::Active),
            2 => Ok(TransferStatus::Resolved),
            other => Err(AppError::Encoding(format!(
                "unknown transfer status {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    pub index: U256,
    pub src: Address,
    pub dest: Address,
    pub amount: U256,
    pub spender: Address,
    pub status: TransferStatus,
}

impl TransferRequest {
    /// Decode the return data of `transferRequests(index)`.
    pub fn decode(index: U256, data: &[u8]) -> Result<Self, AppError> {
        let ret = SimplifiedTokenLogic::transferRequestsCall::abi_decode_returns(data)
            .map_err(|e| AppError::Encoding(format!("transferRequests({index}): {e}")))?;
        Ok(Self {
            index,
            src: ret.src,
            dest: ret.dest,
            amount: ret.amount,
            spender: ret.spender,
            status: TransferStatus::try_from(ret.status)?,
        })
    }
}

/// Policy deciding how a pending transfer is resolved.
#[async_trait]
pub trait Decision: Send + Sync {
    /// Carried from the decision to the finalizer, untouched.
    type Extra: Send;

    async fn decide(&self, request: &TransferRequest) -> Result<(u16, Self::Extra), AppError>;
}

/// Runs after a resolution is confirmed.
#[async_trait]
pub trait Finalizer<E: Send>: Send + Sync {
    async fn finalize(&self, hash: B256, extra: E) -> Result<(), AppError>;
}

/// Same code for every request.
#[derive(Debug, Clone, Copy)]
pub struct StaticDecision {
    pub code: u16,
}

#[async_trait]
impl Decision for StaticDecision {
    type Extra = ();

    async fn decide(&self, request: &TransferRequest) -> Result<(u16, ()), AppError> {
        tracing::info!(
            target: "monitor",
            index = %request.index,
            src = %request.src,
            dest = %request.dest,
            amount = %request.amount,
            code = self.code,
            "Decision"
        );
        Ok((self.code, ()))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LogFinalizer;

#[async_trait]
impl<E: Debug + Send + 'static> Finalizer<E> for LogFinalizer {
    async fn finalize(&self, hash: B256, extra: E) -> Result<(), AppError> {
        tracing::info!(
            target: "monitor",
            hash = %format!("{:#x}", hash),
            extra = ?extra,
            "Resolution finalized"
        );
        Ok(())
    }
}
