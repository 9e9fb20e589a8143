// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@on1.no>

pub mod monitor;
pub mod transfers;

pub use monitor::TransferMonitor;
pub use transfers::{
    CODE_APPROVE, Decision, Finalizer, LogFinalizer, StaticDecision, TransferRequest,
    TransferStatus,
};
