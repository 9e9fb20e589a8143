// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use crate::domain::constants::WEI_PER_GWEI;
use alloy::primitives::U256;

pub fn strip_0x(s: &str) -> &str {
    s.strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s)
}

pub fn parse_u128_hex(s: &str) -> Option<u128> {
    u128::from_str_radix(strip_0x(s.trim()), 16).ok()
}

pub fn parse_u256_hex(s: &str) -> Option<U256> {
    U256::from_str_radix(strip_0x(s.trim()), 16).ok()
}

/// Decimal unless prefixed with `0x`.
pub fn parse_u256(s: &str) -> Option<U256> {
    let trimmed = s.trim();
    if trimmed.starts_with("0x") || trimmed.starts_with("0X") {
        parse_u256_hex(trimmed)
    } else {
        U256::from_str_radix(trimmed, 10).ok()
    }
}

pub fn gwei_to_wei(gwei: u64) -> u128 {
    (gwei as u128).saturating_mul(WEI_PER_GWEI)
}
