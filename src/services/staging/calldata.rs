// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::common::error::AppError;
use crate::services::staging::codec::{address_word, pad_to_word, u256_word};
use alloy::primitives::{Address, B256, Bytes, U256};

/// A single static ABI parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbiWord {
    Address(Address),
    Uint(U256),
    /// Raw hex, left-padded to one word.
    Hex(String),
}

impl AbiWord {
    pub fn to_word(&self) -> Result<B256, AppError> {
        match self {
            AbiWord::Address(address) => Ok(address_word(*address)),
            AbiWord::Uint(value) => Ok(u256_word(*value)),
            AbiWord::Hex(raw) => {
                let padded = pad_to_word(raw)?;
                let bytes = hex::decode(&padded)
                    .map_err(|e| AppError::Encoding(format!("{raw:?}: {e}")))?;
                Ok(B256::from_slice(&bytes))
            }
        }
    }
}

impl From<Address> for AbiWord {
    fn from(value: Address) -> Self {
        AbiWord::Address(value)
    }
}

impl From<U256> for AbiWord {
    fn from(value: U256) -> Self {
        AbiWord::Uint(value)
    }
}

impl From<u16> for AbiWord {
    fn from(value: u16) -> Self {
        AbiWord::Uint(U256::from(value))
    }
}

fn append_words(out: &mut Vec<u8>, params: &[AbiWord]) -> Result<(), AppError> {
    for param in params {
        out.extend_from_slice(param.to_word()?.as_slice());
    }
    Ok(())
}

/// `selector ++ word(p0) ++ word(p1) ++ ...`
pub fn encode_call(selector: [u8; 4], params: &[AbiWord]) -> Result<Bytes, AppError> {
    let mut out = Vec::with_capacity(4 + 32 * params.len());
    out.extend_from_slice(&selector);
    append_words(&mut out, params)?;
    Ok(Bytes::from(out))
}

/// Creation code followed by the constructor words.
pub fn encode_deployment(init_code: &[u8], params: &[AbiWord]) -> Result<Bytes, AppError> {
    if init_code.is_empty() {
        return Err(AppError::Encoding("empty init code".into()));
    }
    let mut out = Vec::with_capacity(init_code.len() + 32 * params.len());
    out.extend_from_slice(init_code);
    append_words(&mut out, params)?;
    Ok(Bytes::from(out))
}
