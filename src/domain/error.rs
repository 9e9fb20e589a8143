// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use alloy::primitives::{Address, B256, U256};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Initialization failed: {0}")]
    Initialization(String),

    #[error("Connection failed to endpoint: {0}")]
    Connection(String),

    #[error("Encoding error: {0}")]
    Encoding(String),

    #[error("Signing failed: {0}")]
    Signing(String),

    #[error("Contract deployed at {actual:#x}, predicted {predicted:#x}; nonce tracking is broken")]
    AddressPredictionMismatch { predicted: Address, actual: Address },

    #[error("Transaction failed: {hash:#x}")]
    TransactionRevert { hash: B256 },

    #[error("No receipt for {hash:#x} after {waited_ms}ms")]
    ReceiptTimeout { hash: B256, waited_ms: u64 },

    #[error("Invalid fee choice: {0}")]
    InvalidFeeChoice(String),

    #[error("Resolution of transfer request {index} failed in {hash:#x}")]
    ResolutionFailed { index: U256, hash: B256 },

    #[error("{0} already exists, refusing to overwrite output")]
    OutputExists(String),

    #[error("Validation failed for field {field}: {message}")]
    Validation { field: String, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Unknown(#[from] anyhow::Error),
}

impl AppError {
    /// Errors raised after something may already be committed on-chain.
    pub fn is_publishing_fatal(&self) -> bool {
        matches!(
            self,
            AppError::TransactionRevert { .. }
                | AppError::AddressPredictionMismatch { .. }
                | AppError::ResolutionFailed { .. }
                | AppError::ReceiptTimeout { .. }
        )
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}
