// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::common::error::AppError;
use alloy::primitives::B256;

/// One broadcast made for the current step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Broadcast {
    pub fee_level: u128,
    pub hash: B256,
}

/// Per-step publishing state. Every broadcast made for the step is carried
/// along so receipts can be polled for all of them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishState {
    Presenting { sent: Vec<Broadcast> },
    Submitted { sent: Vec<Broadcast> },
    RetryRequested { sent: Vec<Broadcast> },
    Confirmed { hash: B256 },
    Stopped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishEvent {
    Broadcasted(Broadcast),
    RetryRequested,
    Reprompt,
    Mined { hash: B256 },
    Stop,
}

impl PublishState {
    pub fn initial() -> Self {
        PublishState::Presenting { sent: Vec::new() }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, PublishState::Confirmed { .. } | PublishState::Stopped)
    }

    pub fn sent(&self) -> &[Broadcast] {
        match self {
            PublishState::Presenting { sent }
            | PublishState::Submitted { sent }
            | PublishState::RetryRequested { sent } => sent,
            PublishState::Confirmed { .. } | PublishState::Stopped => &[],
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            PublishState::Presenting { .. } => "presenting",
            PublishState::Submitted { .. } => "submitted",
            PublishState::RetryRequested { .. } => "retry_requested",
            PublishState::Confirmed { .. } => "confirmed",
            PublishState::Stopped => "stopped",
        }
    }
}

/// Check a fee choice before anything is broadcast: the level must be staged,
/// and a retry must outbid every variant already sent at this nonce.
pub fn admit_fee(levels: &[u128], sent: &[Broadcast], fee_level: u128) -> Result<(), AppError> {
    if !levels.contains(&fee_level) {
        return Err(AppError::InvalidFeeChoice(format!(
            "{fee_level} is not one of the staged levels"
        )));
    }
    ensure_escalates(sent, fee_level)
}

fn ensure_escalates(sent: &[Broadcast], fee_level: u128) -> Result<(), AppError> {
    if let Some(highest) = sent.iter().map(|b| b.fee_level).max()
        && fee_level <= highest
    {
        return Err(AppError::InvalidFeeChoice(format!(
            "{fee_level} does not exceed {highest}, already broadcast for this nonce"
        )));
    }
    Ok(())
}

pub fn transition(state: PublishState, event: PublishEvent) -> Result<PublishState, AppError> {
    let from = state.name();
    match (state, event) {
        (PublishState::Presenting { mut sent }, PublishEvent::Broadcasted(broadcast)) => {
            ensure_escalates(&sent, broadcast.fee_level)?;
            sent.push(broadcast);
            Ok(PublishState::Submitted { sent })
        }
        (PublishState::Presenting { sent }, PublishEvent::Stop) if sent.is_empty() => {
            Ok(PublishState::Stopped)
        }
        (PublishState::Submitted { sent }, PublishEvent::RetryRequested) => {
            Ok(PublishState::RetryRequested { sent })
        }
        (PublishState::Submitted { sent }, PublishEvent::Mined { hash })
        | (PublishState::Presenting { sent }, PublishEvent::Mined { hash }) => {
            if sent.iter().any(|b| b.hash == hash) {
                Ok(PublishState::Confirmed { hash })
            } else {
                Err(AppError::Validation {
                    field: "hash".into(),
                    message: format!("{hash:#x} was never broadcast for this step"),
                })
            }
        }
        (PublishState::RetryRequested { sent }, PublishEvent::Reprompt) => {
            Ok(PublishState::Presenting { sent })
        }
        (_, event) => Err(AppError::Validation {
            field: "publish_state".into(),
            message: format!("{event:?} is not valid while {from}"),
        }),
    }
}
