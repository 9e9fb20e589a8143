// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::common::error::AppError;
use crate::domain::security::SecurityId;
use crate::domain::transcript::{SignedPayload, Step};
use crate::network::ledger::{Ledger, ReceiptSummary};
use crate::network::receipts::{ReceiptPolicy, await_receipt};
use crate::services::publish::operator::{AfterSubmit, FeeChoice, Operator};
use crate::services::publish::state::{
    Broadcast, PublishEvent, PublishState, admit_fee, transition,
};
use crate::services::staging::signer::decode_legacy;
use alloy::primitives::{Address, Bytes, U256};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    Confirmed { receipt: ReceiptSummary },
    /// The operator stopped before anything was broadcast for the step.
    Stopped,
}

/// Fee alternatives of a staged step as `(gas price, signed bytes)`.
pub fn fee_options(payload: &SignedPayload) -> Result<Vec<(u128, Bytes)>, AppError> {
    match payload {
        SignedPayload::Variants(variants) => Ok(variants
            .iter()
            .map(|v| (v.fee_level, v.raw.clone()))
            .collect()),
        SignedPayload::Single(raw) => {
            let decoded = decode_legacy(raw)?;
            Ok(vec![(decoded.gas_price, raw.clone())])
        }
    }
}

/// The id assigned by `initialize`, carried in the first log's data word.
pub fn security_id_from_receipt(receipt: &ReceiptSummary) -> Result<SecurityId, AppError> {
    let data = receipt
        .logs
        .first()
        .map(|log| &log.data)
        .filter(|data| data.len() >= 32)
        .ok_or_else(|| AppError::Validation {
            field: "logs".into(),
            message: format!(
                "receipt {:#x} carries no NewSecurity event",
                receipt.transaction_hash
            ),
        })?;
    Ok(U256::from_be_slice(&data[..32]))
}

/// Publishes staged steps one at a time, each confirmed before the next.
pub struct Publisher<L: Ledger + ?Sized, O: Operator> {
    ledger: Arc<L>,
    operator: O,
    policy: ReceiptPolicy,
}

impl<L: Ledger + ?Sized, O: Operator> Publisher<L, O> {
    pub fn new(ledger: Arc<L>, operator: O, policy: ReceiptPolicy) -> Self {
        Self {
            ledger,
            operator,
            policy,
        }
    }

    pub fn operator(&self) -> &O {
        &self.operator
    }

    pub async fn publish(&mut self, step: &Step) -> Result<PublishOutcome, AppError> {
        let options = fee_options(&step.signed)?;
        let levels: Vec<u128> = options.iter().map(|(level, _)| *level).collect();
        let mut state = PublishState::initial();
        let mut mined: Option<ReceiptSummary> = None;

        tracing::info!(
            target: "publish",
            nonce = step.nonce(),
            variants = levels.len(),
            "{}",
            step.description
        );

        loop {
            let event = match &state {
                PublishState::Presenting { sent } => {
                    match self.operator.choose_fee(step, &levels).await? {
                        FeeChoice::Stop if sent.is_empty() => PublishEvent::Stop,
                        FeeChoice::Stop => {
                            // The nonce may already be spent; the step ends with its receipt.
                            tracing::warn!(
                                target: "publish",
                                in_flight = sent.len(),
                                "Cannot stop while a broadcast for this nonce is pending; waiting for it"
                            );
                            let receipt = self.confirm(step, sent).await?;
                            let hash = receipt.transaction_hash;
                            mined = Some(receipt);
                            PublishEvent::Mined { hash }
                        }
                        FeeChoice::Unparsed(answer) => {
                            tracing::error!(target: "publish", "bad choice: {}", answer);
                            continue;
                        }
                        FeeChoice::Level(fee_level) => {
                            if let Err(e) = admit_fee(&levels, sent, fee_level) {
                                tracing::error!(target: "publish", error = %e, "bad choice");
                                continue;
                            }
                            let raw = options
                                .iter()
                                .find(|(level, _)| *level == fee_level)
                                .map(|(_, raw)| raw)
                                .ok_or_else(|| {
                                    AppError::InvalidFeeChoice(fee_level.to_string())
                                })?;
                            match self.ledger.send_raw_transaction(raw).await {
                                Ok(hash) => {
                                    tracing::info!(
                                        target: "publish",
                                        hash = %format!("{:#x}", hash),
                                        fee_level,
                                        "sent"
                                    );
                                    PublishEvent::Broadcasted(Broadcast { fee_level, hash })
                                }
                                Err(e) if sent.is_empty() => {
                                    tracing::error!(target: "publish", error = %e, fee_level, "broadcast failed");
                                    continue;
                                }
                                Err(e) => {
                                    // Usually an earlier variant was mined and took the nonce.
                                    tracing::warn!(
                                        target: "publish",
                                        error = %e,
                                        fee_level,
                                        in_flight = sent.len(),
                                        "Broadcast rejected; waiting for the variants already sent"
                                    );
                                    let receipt = self.confirm(step, sent).await?;
                                    let hash = receipt.transaction_hash;
                                    mined = Some(receipt);
                                    PublishEvent::Mined { hash }
                                }
                            }
                        }
                    }
                }
                PublishState::Submitted { sent } => {
                    let Some(latest) = sent.last() else {
                        return Err(AppError::Validation {
                            field: "publish_state".into(),
                            message: "submitted without a broadcast".into(),
                        });
                    };
                    match self.operator.after_submit(step, latest.hash).await? {
                        AfterSubmit::Retry => PublishEvent::RetryRequested,
                        AfterSubmit::Wait => {
                            let receipt = self.confirm(step, sent).await?;
                            let hash = receipt.transaction_hash;
                            mined = Some(receipt);
                            PublishEvent::Mined { hash }
                        }
                    }
                }
                PublishState::RetryRequested { .. } => PublishEvent::Reprompt,
                PublishState::Confirmed { .. } | PublishState::Stopped => break,
            };
            state = transition(state, event)?;
        }

        match (state, mined) {
            (PublishState::Confirmed { .. }, Some(receipt)) => {
                tracing::info!(
                    target: "publish",
                    hash = %format!("{:#x}", receipt.transaction_hash),
                    block = ?receipt.block_number,
                    nonce = step.nonce(),
                    "Confirmed"
                );
                Ok(PublishOutcome::Confirmed { receipt })
            }
            (PublishState::Stopped, _) => {
                tracing::warn!(target: "publish", nonce = step.nonce(), "Stopped by operator");
                Ok(PublishOutcome::Stopped)
            }
            (state, _) => Err(AppError::Validation {
                field: "publish_state".into(),
                message: format!("publishing ended while {}", state.name()),
            }),
        }
    }

    /// Wait for whichever broadcast of the step is mined first and check it.
    async fn confirm(&self, step: &Step, sent: &[Broadcast]) -> Result<ReceiptSummary, AppError> {
        let hashes: Vec<_> = sent.iter().map(|b| b.hash).collect();
        let receipt = await_receipt(self.ledger.as_ref(), &hashes, &self.policy).await?;
        check_receipt(step, &receipt)?;
        Ok(receipt)
    }

    /// Publish in order; returns the receipts of the confirmed prefix.
    pub async fn publish_all(&mut self, steps: &[Step]) -> Result<Vec<ReceiptSummary>, AppError> {
        let mut receipts = Vec::with_capacity(steps.len());
        for step in steps {
            match self.publish(step).await? {
                PublishOutcome::Confirmed { receipt } => receipts.push(receipt),
                PublishOutcome::Stopped => break,
            }
        }
        if receipts.len() < steps.len() {
            tracing::warn!(
                target: "publish",
                confirmed = receipts.len(),
                remaining = steps.len() - receipts.len(),
                "Sequence stopped early"
            );
        }
        Ok(receipts)
    }

    /// Publish cap-table initializations and report the id each one was assigned.
    pub async fn publish_stage_one(
        &mut self,
        entries: &[(String, Step)],
    ) -> Result<Vec<(String, SecurityId)>, AppError> {
        let mut ids = Vec::with_capacity(entries.len());
        for (name, step) in entries {
            let receipt = match self.publish(step).await? {
                PublishOutcome::Confirmed { receipt } => receipt,
                PublishOutcome::Stopped => break,
            };
            let security_id = security_id_from_receipt(&receipt)?;
            tracing::info!(target: "publish", security = %name, %security_id, "Security initialized");
            ids.push((name.clone(), security_id));
        }
        Ok(ids)
    }
}

fn check_receipt(step: &Step, receipt: &ReceiptSummary) -> Result<(), AppError> {
    if !receipt.success {
        tracing::error!(
            target: "publish",
            hash = %format!("{:#x}", receipt.transaction_hash),
            nonce = step.nonce(),
            "{} reverted",
            step.description
        );
        return Err(AppError::TransactionRevert {
            hash: receipt.transaction_hash,
        });
    }
    if let Some(predicted) = step.params.predicted_contract() {
        let actual = receipt.contract_address.unwrap_or(Address::ZERO);
        if actual != predicted {
            return Err(AppError::AddressPredictionMismatch { predicted, actual });
        }
    }
    Ok(())
}
