// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::common::error::AppError;
use crate::data::artifacts::DeploymentCode;
use crate::data::contracts::selectors;
use crate::domain::constants::{
    DEPLOY_AND_MIGRATE_TX_COUNT, GAS_CHANGE_ADMIN, GAS_DEPLOY_CAP_TABLES, GAS_DEPLOY_FRONT, GAS_DEPLOY_LOGIC,
    GAS_DISTRIBUTE, GAS_INITIALIZE_CAP_TABLE, GAS_MIGRATE, GAS_SET_FRONT,
};
use crate::domain::security::{IndexedSecurity, SecurityDefinition, SecurityId};
use crate::domain::transcript::{Step, StepParams, Transcript};
use crate::services::staging::calldata::{encode_call, encode_deployment};
use crate::services::staging::codec::predict_address;
use crate::services::staging::signer::StagingContext;
use alloy::primitives::{Address, TxKind};

/// Stage the CapTables deployment that every security is later registered
/// in. The address it will land at is predicted from the signer's nonce.
pub fn stage_cap_tables(
    code: &[u8],
    starting_nonce: u64,
    ctx: &StagingContext,
) -> Result<(u64, Address, Step), AppError> {
    let controller = ctx.address();
    let cap_tables = predict_address(controller, starting_nonce);
    let input = encode_deployment(code, &[])?;
    let signed = ctx.sign_variants(TxKind::Create, &input, GAS_DEPLOY_CAP_TABLES, starting_nonce)?;

    tracing::info!(
        target: "staging",
        %cap_tables,
        deployer = %controller,
        nonce = starting_nonce,
        "Staged cap table deployment"
    );

    let step = Step {
        description: "deploy the cap tables contract".to_string(),
        params: StepParams::DeployCapTables {
            cap_tables_address: cap_tables,
            controller_address: controller,
            nonce: starting_nonce,
        },
        signed,
    };
    Ok((starting_nonce + 1, cap_tables, step))
}

/// Stage `initialize(supply, signer)` on the cap table.
pub fn stage_init(
    security: &SecurityDefinition,
    cap_tables: Address,
    starting_nonce: u64,
    ctx: &StagingContext,
) -> Result<(u64, Step), AppError> {
    let supply = security.total_supply()?;
    let controller = ctx.address();
    let input = encode_call(selectors::INITIALIZE, &[supply.into(), controller.into()])?;
    let signed = ctx.sign_variants(
        TxKind::Call(cap_tables),
        &input,
        GAS_INITIALIZE_CAP_TABLE,
        starting_nonce,
    )?;

    tracing::debug!(
        target: "staging",
        security = security.name(),
        %supply,
        nonce = starting_nonce,
        "Staged cap table initialization"
    );

    let step = Step {
        description: "initialize the cap table".to_string(),
        params: StepParams::InitializeCapTable {
            cap_tables_address: cap_tables,
            supply,
            controller_address: controller,
            nonce: starting_nonce,
        },
        signed,
    };
    Ok((starting_nonce + 1, step))
}

/// Stage one `transfer` per investor, in list order.
pub fn stage_distribute(
    security: &SecurityDefinition,
    security_id: SecurityId,
    cap_tables: Address,
    starting_nonce: u64,
    ctx: &StagingContext,
) -> Result<(u64, Transcript), AppError> {
    let controller = ctx.address();
    let mut nonce = starting_nonce;
    let mut steps = Vec::with_capacity(security.investors.len());

    for investor in &security.investors {
        let input = encode_call(
            selectors::TRANSFER,
            &[
                security_id.into(),
                controller.into(),
                investor.address.into(),
                investor.amount.into(),
            ],
        )?;
        let signed = ctx.sign_variants(TxKind::Call(cap_tables), &input, GAS_DISTRIBUTE, nonce)?;
        steps.push(Step {
            description: "distribution to investor".to_string(),
            params: StepParams::Distribution {
                security_id,
                cap_tables_address: cap_tables,
                controller_address: controller,
                investor: investor.address,
                amount: investor.amount,
                nonce,
            },
            signed,
        });
        nonce += 1;
    }

    tracing::debug!(
        target: "staging",
        security = security.name(),
        investors = steps.len(),
        first_nonce = starting_nonce,
        next_nonce = nonce,
        "Staged distribution"
    );
    Ok((nonce, steps))
}

/// Stage the five-transaction deployment: logic, front, migrate, setFront,
/// ownership handoff. Both contract addresses are predicted before signing.
pub fn stage_deploy_and_migrate(
    security: &SecurityDefinition,
    security_id: SecurityId,
    cap_tables: Address,
    resolver: Address,
    code: &DeploymentCode,
    starting_nonce: u64,
    ctx: &StagingContext,
) -> Result<(u64, Transcript), AppError> {
    let controller = ctx.address();
    let logic_nonce = starting_nonce;
    let front_nonce = starting_nonce + 1;
    let migrate_nonce = starting_nonce + 2;
    let set_front_nonce = starting_nonce + 3;
    let change_admin_nonce = starting_nonce + 4;

    let logic = predict_address(controller, logic_nonce);
    let front = predict_address(controller, front_nonce);

    let deploy_logic = encode_deployment(
        &code.logic,
        &[
            security_id.into(),
            cap_tables.into(),
            controller.into(),
            resolver.into(),
        ],
    )?;
    let deploy_front = encode_deployment(&code.front, &[logic.into(), security.admin.into()])?;
    let migrate = encode_call(selectors::MIGRATE, &[security_id.into(), logic.into()])?;
    let set_front = encode_call(selectors::SET_FRONT, &[front.into()])?;
    let change_admin = encode_call(selectors::TRANSFER_OWNERSHIP, &[security.admin.into()])?;

    let steps = vec![
        Step {
            description: "deploys SimplifiedTokenLogic instance".to_string(),
            params: StepParams::DeployLogic {
                simplified_token_logic_address: logic,
                security_id,
                cap_tables_address: cap_tables,
                controller_address: controller,
                resolver_address: resolver,
                nonce: logic_nonce,
            },
            signed: ctx.sign_variants(TxKind::Create, &deploy_logic, GAS_DEPLOY_LOGIC, logic_nonce)?,
        },
        Step {
            description: "deploys TokenFront".to_string(),
            params: StepParams::DeployFront {
                token_front_address: front,
                simplified_token_logic_address: logic,
                admin: security.admin,
                controller_address: controller,
                nonce: front_nonce,
            },
            signed: ctx.sign_variants(TxKind::Create, &deploy_front, GAS_DEPLOY_FRONT, front_nonce)?,
        },
        Step {
            description: "migrates the cap table to the SimplifiedTokenLogic instance".to_string(),
            params: StepParams::MigrateCapTable {
                security_id,
                simplified_token_logic_address: logic,
                controller_address: controller,
                nonce: migrate_nonce,
            },
            signed: ctx.sign_variants(TxKind::Call(cap_tables), &migrate, GAS_MIGRATE, migrate_nonce)?,
        },
        Step {
            description: "sets SimplifiedTokenLogic.front".to_string(),
            params: StepParams::SetFront {
                token_front_address: front,
                simplified_token_logic_address: logic,
                controller_address: controller,
                nonce: set_front_nonce,
            },
            signed: ctx.sign_variants(TxKind::Call(logic), &set_front, GAS_SET_FRONT, set_front_nonce)?,
        },
        Step {
            description: "changes SimplifiedTokenLogic.admin".to_string(),
            params: StepParams::ChangeAdmin {
                admin: security.admin,
                simplified_token_logic_address: logic,
                nonce: change_admin_nonce,
            },
            signed: ctx.sign_variants(
                TxKind::Call(logic),
                &change_admin,
                GAS_CHANGE_ADMIN,
                change_admin_nonce,
            )?,
        },
    ];

    tracing::debug!(
        target: "staging",
        security = security.name(),
        logic = %logic,
        front = %front,
        nonce = starting_nonce,
        "Staged deployment and migration"
    );
    Ok((starting_nonce + DEPLOY_AND_MIGRATE_TX_COUNT, steps))
}

/// First offline pass: one cap-table initialization per security.
pub fn stage_one(
    securities: &[SecurityDefinition],
    cap_tables: Address,
    ctx: &StagingContext,
    starting_nonce: u64,
) -> Result<(u64, Vec<(String, Step)>), AppError> {
    let mut nonce = starting_nonce;
    let mut staged = Vec::with_capacity(securities.len());
    for security in securities {
        let (next, step) = stage_init(security, cap_tables, nonce, ctx)?;
        staged.push((security.name().to_string(), step));
        nonce = next;
    }
    tracing::info!(
        target: "staging",
        securities = staged.len(),
        next_nonce = nonce,
        controller = %ctx.address(),
        "Stage one signed"
    );
    Ok((nonce, staged))
}

/// Second offline pass: distribution then deployment for each security whose
/// id is now known. A security without its own resolver uses `resolver`.
pub fn stage_two(
    securities: &[IndexedSecurity],
    cap_tables: Address,
    resolver: Address,
    code: &DeploymentCode,
    ctx: &StagingContext,
    starting_nonce: u64,
) -> Result<(u64, Vec<(String, Transcript)>), AppError> {
    let mut nonce = starting_nonce;
    let mut staged = Vec::with_capacity(securities.len());
    for indexed in securities {
        let security = &indexed.security;
        let (next, mut steps) =
            stage_distribute(security, indexed.security_id, cap_tables, nonce, ctx)?;
        let (next, deploy) = stage_deploy_and_migrate(
            security,
            indexed.security_id,
            cap_tables,
            security.resolver.unwrap_or(resolver),
            code,
            next,
            ctx,
        )?;
        steps.extend(deploy);
        staged.push((security.name().to_string(), steps));
        nonce = next;
    }
    tracing::info!(
        target: "staging",
        securities = staged.len(),
        next_nonce = nonce,
        "Stage two signed"
    );
    Ok((nonce, staged))
}
