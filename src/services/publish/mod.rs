// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

pub mod operator;
pub mod publisher;
pub mod state;

pub use operator::{AfterSubmit, FeeChoice, Operator, StdioOperator};
pub use publisher::{PublishOutcome, Publisher};
pub use state::{PublishEvent, PublishState};
