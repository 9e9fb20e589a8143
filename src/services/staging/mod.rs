// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

pub mod calldata;
pub mod codec;
pub mod resolver;
pub mod signer;
pub mod stages;

pub use resolver::{ResolverRotation, stage_new_resolver, stage_set_resolver};
pub use signer::{StagingContext, gas_price_ladder};
pub use stages::{
    stage_cap_tables, stage_deploy_and_migrate, stage_distribute, stage_init, stage_one, stage_two,
};
