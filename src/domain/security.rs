// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::common::parsing::parse_u256;
use crate::domain::error::AppError;
use alloy::primitives::{Address, U256};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fs;
use std::path::Path;

/// Handle assigned by the cap-table contract when a security is initialized.
pub type SecurityId = U256;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Investor {
    pub address: Address,
    #[serde(
        serialize_with = "serialize_amount",
        deserialize_with = "deserialize_amount"
    )]
    pub amount: U256,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityMetadata {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decimals: Option<u8>,
}

/// Immutable description of one token issuance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityDefinition {
    pub admin: Address,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolver: Option<Address>,
    pub investors: Vec<Investor>,
    pub metadata: SecurityMetadata,
}

impl SecurityDefinition {
    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    /// Sum of all investor amounts; overflow is an encoding failure, never a wrap.
    pub fn total_supply(&self) -> Result<U256, AppError> {
        self.investors
            .iter()
            .try_fold(U256::ZERO, |supply, investor| supply.checked_add(investor.amount))
            .ok_or_else(|| {
                AppError::Encoding(format!(
                    "total supply of {} exceeds 256 bits",
                    self.metadata.name
                ))
            })
    }

    pub fn load(path: &Path) -> Result<Self, AppError> {
        let body = fs::read_to_string(path)?;
        serde_json::from_str(&body).map_err(|e| AppError::Validation {
            field: path.display().to_string(),
            message: e.to_string(),
        })
    }
}

/// A security whose cap table has been initialized on-chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexedSecurity {
    #[serde(
        serialize_with = "serialize_amount",
        deserialize_with = "deserialize_amount"
    )]
    pub security_id: SecurityId,
    #[serde(flatten)]
    pub security: SecurityDefinition,
}

impl IndexedSecurity {
    pub fn load(path: &Path) -> Result<Self, AppError> {
        let body = fs::read_to_string(path)?;
        serde_json::from_str(&body).map_err(|e| AppError::Validation {
            field: path.display().to_string(),
            message: e.to_string(),
        })
    }
}

/// The issuer's declaration: which cap table, which resolver, which securities.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Declaration {
    pub cap_tables: Address,
    pub resolver: Address,
    pub security_paths: Vec<String>,
}

impl Declaration {
    pub fn load(path: &Path) -> Result<Self, AppError> {
        let body = fs::read_to_string(path)?;
        serde_json::from_str(&body).map_err(|e| AppError::Validation {
            field: path.display().to_string(),
            message: format!("invalid declaration: {e}"),
        })
    }

    /// Paths are resolved relative to the declaration file.
    pub fn resolved_paths(&self, declaration_path: &Path) -> Vec<std::path::PathBuf> {
        let base = declaration_path.parent().unwrap_or_else(|| Path::new("."));
        self.security_paths
            .iter()
            .map(|p| {
                let candidate = Path::new(p);
                if candidate.is_absolute() {
                    candidate.to_path_buf()
                } else {
                    base.join(candidate)
                }
            })
            .collect()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawAmount {
    Text(String),
    Number(u64),
}

pub(crate) fn deserialize_amount<'de, D>(deserializer: D) -> Result<U256, D::Error>
where
    D: Deserializer<'de>,
{
    match RawAmount::deserialize(deserializer)? {
        RawAmount::Number(n) => Ok(U256::from(n)),
        RawAmount::Text(s) => parse_u256(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid amount {s:?}"))),
    }
}

pub(crate) fn serialize_amount<S>(value: &U256, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&value.to_string())
}
