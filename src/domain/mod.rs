// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

pub mod constants;
pub mod error;
pub mod security;
pub mod transcript;
