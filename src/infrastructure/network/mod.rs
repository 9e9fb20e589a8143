// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

pub mod ledger;
pub mod nonce;
pub mod provider;
pub mod receipts;
