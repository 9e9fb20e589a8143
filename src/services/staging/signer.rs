// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use crate::common::error::AppError;
use crate::common::parsing::{gwei_to_wei, strip_0x};
use crate::domain::constants::FEE_LADDER_SPAN;
use crate::domain::transcript::{SignedPayload, SignedVariant};
use alloy::consensus::{SignableTransaction, TxLegacy};
use alloy::eips::eip2718::{Decodable2718, Encodable2718};
use alloy::network::TxSignerSync;
use alloy::primitives::{Address, B256, Bytes, TxKind, U256};
use alloy::signers::local::PrivateKeySigner;
use alloy_consensus::TxEnvelope;

/// Gas prices (wei) from `start_gwei` upward in `step_gwei` increments,
/// stopping below ten times the start.
pub fn gas_price_ladder(start_gwei: u64, step_gwei: u64) -> Vec<u128> {
    if start_gwei == 0 {
        return vec![0];
    }
    let end = start_gwei.saturating_mul(FEE_LADDER_SPAN);
    let step = usize::try_from(step_gwei.max(1)).unwrap_or(usize::MAX);
    (start_gwei..end).step_by(step).map(gwei_to_wei).collect()
}

/// Hex private key, with or without `0x`.
pub fn parse_signing_key(raw: &str) -> Result<PrivateKeySigner, AppError> {
    let digits = strip_0x(raw.trim());
    let bytes = hex::decode(digits)
        .map_err(|e| AppError::Config(format!("private key is not hex: {e}")))?;
    if bytes.len() != 32 {
        return Err(AppError::Config(format!(
            "private key must be 32 bytes, got {}",
            bytes.len()
        )));
    }
    PrivateKeySigner::from_bytes(&B256::from_slice(&bytes))
        .map_err(|e| AppError::Config(format!("invalid private key: {e}")))
}

/// Hex encoding of a signer's secret, for handing an ephemeral key to the operator.
pub fn export_signing_key(signer: &PrivateKeySigner) -> String {
    format!("0x{}", hex::encode(signer.to_bytes()))
}

/// Signing identity and fee ladder for one staging run.
#[derive(Debug, Clone)]
pub struct StagingContext {
    signer: PrivateKeySigner,
    chain_id: u64,
    fee_levels: Vec<u128>,
}

impl StagingContext {
    pub fn new(
        signer: PrivateKeySigner,
        chain_id: u64,
        mut fee_levels: Vec<u128>,
    ) -> Result<Self, AppError> {
        if chain_id == 0 {
            return Err(AppError::Validation {
                field: "chain_id".into(),
                message: "must be non-zero".into(),
            });
        }
        fee_levels.sort_unstable();
        fee_levels.dedup();
        if fee_levels.is_empty() {
            return Err(AppError::Validation {
                field: "fee_levels".into(),
                message: "at least one fee level is required".into(),
            });
        }
        Ok(Self {
            signer,
            chain_id,
            fee_levels,
        })
    }

    pub fn address(&self) -> Address {
        self.signer.address()
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub fn fee_levels(&self) -> &[u128] {
        &self.fee_levels
    }

    /// One signature per fee level, all at `nonce`.
    pub fn sign_variants(
        &self,
        to: TxKind,
        input: &Bytes,
        gas_limit: u64,
        nonce: u64,
    ) -> Result<SignedPayload, AppError> {
        let variants = self
            .fee_levels
            .iter()
            .map(|&gas_price| {
                let tx = LegacyRequest {
                    to,
                    input: input.clone(),
                    gas_limit,
                    gas_price,
                    nonce,
                };
                sign_legacy(&self.signer, self.chain_id, tx).map(|(raw, _)| SignedVariant {
                    fee_level: gas_price,
                    raw,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(SignedPayload::Variants(variants))
    }
}

/// Fields of a legacy transaction that vary per call site.
#[derive(Debug, Clone)]
pub struct LegacyRequest {
    pub to: TxKind,
    pub input: Bytes,
    pub gas_limit: u64,
    pub gas_price: u128,
    pub nonce: u64,
}

/// EIP-155 legacy signing; RFC 6979 nonces keep the output deterministic.
pub fn sign_legacy(
    signer: &PrivateKeySigner,
    chain_id: u64,
    request: LegacyRequest,
) -> Result<(Bytes, B256), AppError> {
    let mut tx = TxLegacy {
        chain_id: Some(chain_id),
        nonce: request.nonce,
        gas_price: request.gas_price,
        gas_limit: request.gas_limit,
        to: request.to,
        value: U256::ZERO,
        input: request.input,
    };
    let sig = TxSignerSync::sign_transaction_sync(signer, &mut tx)
        .map_err(|e| AppError::Signing(format!("Sign tx failed: {}", e)))?;
    let signed: TxEnvelope = tx.into_signed(sig).into();
    let raw = signed.encoded_2718();
    Ok((Bytes::from(raw), *signed.tx_hash()))
}

/// What a staged legacy transaction commits to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedLegacy {
    pub hash: B256,
    pub chain_id: Option<u64>,
    pub nonce: u64,
    pub gas_price: u128,
    pub gas_limit: u64,
    pub to: TxKind,
    pub input: Bytes,
}

pub fn decode_legacy(raw: &[u8]) -> Result<DecodedLegacy, AppError> {
    let mut buf = raw;
    let envelope = TxEnvelope::decode_2718(&mut buf)
        .map_err(|e| AppError::Encoding(format!("signed transaction does not decode: {e}")))?;
    let signed = envelope
        .as_legacy()
        .ok_or_else(|| AppError::Encoding("signed transaction is not legacy".into()))?;
    let tx = signed.tx();
    Ok(DecodedLegacy {
        hash: *signed.hash(),
        chain_id: tx.chain_id,
        nonce: tx.nonce,
        gas_price: tx.gas_price,
        gas_limit: tx.gas_limit,
        to: tx.to,
        input: tx.input.clone(),
    })
}
