// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::common::error::AppError;
use crate::common::parsing::strip_0x;
use alloy::primitives::{Address, B256, U256, keccak256};
use alloy_rlp::{Encodable, Header};

pub const WORD_HEX_LEN: usize = 64;

/// Left-pad a hex value to one 32-byte word (64 hex digits, no prefix).
pub fn pad_to_word(hex: &str) -> Result<String, AppError> {
    let digits = strip_0x(hex.trim());
    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(AppError::Encoding(format!("{hex:?} is not hex")));
    }
    let significant = digits.trim_start_matches('0');
    if significant.len() > WORD_HEX_LEN {
        return Err(AppError::Encoding(format!(
            "value of {} hex digits does not fit a 32-byte word",
            significant.len()
        )));
    }
    Ok(format!("{:0>width$}", significant.to_ascii_lowercase(), width = WORD_HEX_LEN))
}

pub fn address_word(address: Address) -> B256 {
    address.into_word()
}

pub fn u256_word(value: U256) -> B256 {
    B256::from(value.to_be_bytes::<32>())
}

/// Address of the contract created by `sender`'s transaction at `nonce`:
/// the low 20 bytes of `keccak256(rlp([sender, nonce]))`.
pub fn predict_address(sender: Address, nonce: u64) -> Address {
    let payload_length = sender.length() + nonce.length();
    let mut out = Vec::with_capacity(payload_length + 1);
    Header {
        list: true,
        payload_length,
    }
    .encode(&mut out);
    sender.encode(&mut out);
    nonce.encode(&mut out);
    Address::from_word(keccak256(&out))
}
