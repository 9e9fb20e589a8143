// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

// =============================================================================
// NETWORK CONSTANTS
// =============================================================================

pub const CHAIN_ETHEREUM: u64 = 1;
pub const CHAIN_RINKEBY: u64 = 4;
pub const CHAIN_SEPOLIA: u64 = 11_155_111;

/// Offline issuance historically targeted Rinkeby unless told otherwise.
pub const DEFAULT_CHAIN_ID: u64 = CHAIN_RINKEBY;

pub const WEI_PER_GWEI: u128 = 1_000_000_000;

// =============================================================================
// GAS LIMITS PER STAGED STEP
// =============================================================================

pub const GAS_DEPLOY_CAP_TABLES: u64 = 1_000_000;
pub const GAS_INITIALIZE_CAP_TABLE: u64 = 500_000;
pub const GAS_DISTRIBUTE: u64 = 500_000;
pub const GAS_DEPLOY_LOGIC: u64 = 1_500_000;
pub const GAS_DEPLOY_FRONT: u64 = 1_000_000;
pub const GAS_MIGRATE: u64 = 500_000;
pub const GAS_SET_FRONT: u64 = 500_000;
pub const GAS_CHANGE_ADMIN: u64 = 100_000;
pub const GAS_SET_RESOLVER: u64 = 100_000;
pub const GAS_RESOLVE: u64 = 500_000;

/// Upper bound on consecutive unused slots a sparse scan will read past.
pub const MAX_MONITOR_GAP: u64 = 10_000;

/// deploy-logic, deploy-front, migrate, set-front, change-admin
pub const DEPLOY_AND_MIGRATE_TX_COUNT: u64 = 5;

// =============================================================================
// FEE LADDER
// =============================================================================

pub const DEFAULT_GAS_PRICE_GWEI: u64 = 5;
pub const DEFAULT_GAS_PRICE_STEP_GWEI: u64 = 2;
/// Ladder stops below `start * FEE_LADDER_SPAN`.
pub const FEE_LADDER_SPAN: u64 = 10;

// =============================================================================
// ARTIFACT NAMES
// =============================================================================

pub const ARTIFACT_CAP_TABLES: &str = "CapTables";
pub const ARTIFACT_TOKEN_LOGIC: &str = "SimplifiedTokenLogic";
pub const ARTIFACT_TOKEN_FRONT: &str = "TokenFront";
