// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@on1.no>

use crate::common::error::AppError;
use crate::data::contracts::selectors;
use crate::domain::constants::GAS_SET_RESOLVER;
use crate::domain::transcript::{Step, StepParams};
use crate::services::staging::calldata::encode_call;
use crate::services::staging::signer::StagingContext;
use alloy::primitives::{Address, TxKind};
use alloy::signers::local::PrivateKeySigner;

/// A freshly generated hot-wallet resolver and the owner-signed step installing it.
#[derive(Debug, Clone)]
pub struct ResolverRotation {
    pub resolver_key: PrivateKeySigner,
    pub resolver_address: Address,
    pub step: Step,
}

/// Stage `setResolver(new_resolver)` on `logic`, signed by the owner in `ctx`.
pub fn stage_set_resolver(
    logic: Address,
    new_resolver: Address,
    ctx: &StagingContext,
    nonce: u64,
) -> Result<(u64, Step), AppError> {
    let input = encode_call(selectors::SET_RESOLVER, &[new_resolver.into()])?;
    let signed = ctx.sign_variants(TxKind::Call(logic), &input, GAS_SET_RESOLVER, nonce)?;
    let step = Step {
        description: format!("Sets SimplifiedTokenLogic.resolver to {new_resolver}"),
        params: StepParams::SetResolver {
            owner_address: ctx.address(),
            new_resolver_address: new_resolver,
            simplified_token_logic_address: logic,
            nonce,
        },
        signed,
    };
    Ok((nonce + 1, step))
}

pub fn stage_new_resolver(
    logic: Address,
    ctx: &StagingContext,
    nonce: u64,
) -> Result<(u64, ResolverRotation), AppError> {
    let resolver_key = PrivateKeySigner::random();
    let resolver_address = resolver_key.address();
    let (next, step) = stage_set_resolver(logic, resolver_address, ctx, nonce)?;
    tracing::info!(
        target: "staging",
        logic = %logic,
        resolver = %resolver_address,
        nonce,
        "Staged resolver rotation"
    );
    Ok((
        next,
        ResolverRotation {
            resolver_key,
            resolver_address,
            step,
        },
    ))
}
