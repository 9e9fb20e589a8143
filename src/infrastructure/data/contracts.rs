// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use alloy::sol;
use alloy_sol_types::SolCall;

sol! {
    interface CapTables {
        function initialize(uint256 supply, address manager) external returns (uint256);
        function transfer(uint256 securityId, address src, address dest, uint256 amount) external;
        function migrate(uint256 securityId, address newAddress) external;
    }

    interface SimplifiedTokenLogic {
        function setFront(address front) external;
        function setResolver(address resolver) external;
        function transferOwnership(address newOwner) external;
        function resolve(uint256 index, uint16 code) external;
        function transferRequests(uint256 index) external view returns (
            address src,
            address dest,
            uint256 amount,
            address spender,
            uint8 status
        );
    }
}

/// Function selectors, fixed at build time from the signatures above.
pub mod selectors {
    use super::*;

    pub const INITIALIZE: [u8; 4] = CapTables::initializeCall::SELECTOR;
    pub const TRANSFER: [u8; 4] = CapTables::transferCall::SELECTOR;
    pub const MIGRATE: [u8; 4] = CapTables::migrateCall::SELECTOR;
    pub const SET_FRONT: [u8; 4] = SimplifiedTokenLogic::setFrontCall::SELECTOR;
    pub const SET_RESOLVER: [u8; 4] = SimplifiedTokenLogic::setResolverCall::SELECTOR;
    pub const TRANSFER_OWNERSHIP: [u8; 4] = SimplifiedTokenLogic::transferOwnershipCall::SELECTOR;
    pub const RESOLVE: [u8; 4] = SimplifiedTokenLogic::resolveCall::SELECTOR;
    pub const TRANSFER_REQUESTS: [u8; 4] = SimplifiedTokenLogic::transferRequestsCall::SELECTOR;
}
