// SPDX-License-Identifier: MIT
// End-to-end offline staging for a two-investor security, then publishing the
// whole transcript against the in-memory ledger.

mod common;

use alloy::primitives::{Address, TxKind, U256, address};
use alloy_sol_types::SolCall;
use common::{FakeLedger, ScriptedOperator, fast_receipts};
use s3_issuance::common::error::AppError;
use s3_issuance::data::artifacts::DeploymentCode;
use s3_issuance::data::contracts::{CapTables, SimplifiedTokenLogic};
use s3_issuance::data::transcript;
use s3_issuance::domain::security::{IndexedSecurity, Investor, SecurityDefinition, SecurityMetadata};
use s3_issuance::domain::transcript::{OfflineReport, SignedPayload, Step, StepParams};
use s3_issuance::services::publish::{AfterSubmit, FeeChoice, Publisher};
use s3_issuance::services::staging::signer::{decode_legacy, parse_signing_key};
use s3_issuance::services::staging::{
    StagingContext, gas_price_ladder, stage_deploy_and_migrate, stage_distribute, stage_init,
    stage_one, stage_two,
};
use std::sync::Arc;

const CHAIN: u64 = 4;
const CAP_TABLES: Address = address!("00000000000000000000000000000000000ca97e");
const RESOLVER: Address = address!("0000000000000000000000000000000000005e50");
const INVESTOR_A: Address = address!("000000000000000000000000000000000000000a");
const INVESTOR_B: Address = address!("000000000000000000000000000000000000000b");
const ADMIN: Address = address!("00000000000000000000000000000000000ad814");

fn ctx() -> StagingContext {
    let signer =
        parse_signing_key("4646464646464646464646464646464646464646464646464646464646464646")
            .unwrap();
    StagingContext::new(signer, CHAIN, gas_price_ladder(5, 20)).unwrap()
}

fn security() -> SecurityDefinition {
    SecurityDefinition {
        admin: ADMIN,
        resolver: None,
        investors: vec![
            Investor {
                address: INVESTOR_A,
                amount: U256::from(100_000u64),
            },
            Investor {
                address: INVESTOR_B,
                amount: U256::from(10_000_000u64),
            },
        ],
        metadata: SecurityMetadata {
            name: "Acme Preferred".into(),
            symbol: Some("ACMEP".into()),
            decimals: Some(0),
        },
    }
}

fn code() -> DeploymentCode {
    DeploymentCode {
        logic: vec![0x60, 0x80, 0x60, 0x40, 0x01].into(),
        front: vec![0x60, 0x80, 0x60, 0x40, 0x02].into(),
    }
}

fn variants(step: &Step) -> Vec<(u128, alloy::primitives::Bytes)> {
    match &step.signed {
        SignedPayload::Variants(v) => v.iter().map(|v| (v.fee_level, v.raw.clone())).collect(),
        SignedPayload::Single(_) => panic!("staged steps carry variants"),
    }
}

#[test]
fn two_investor_issuance_threads_nonces() {
    let ctx = ctx();
    let security = security();
    let security_id = U256::from(0u64);

    let (nonce, init) = stage_init(&security, CAP_TABLES, 0, &ctx).unwrap();
    assert_eq!(nonce, 1);
    // 5 gwei start, 20 gwei step, below 50 gwei: 5, 25, 45.
    assert_eq!(variants(&init).len(), 3);
    for (fee, raw) in variants(&init) {
        let tx = decode_legacy(&raw).unwrap();
        assert_eq!(tx.nonce, 0);
        assert_eq!(tx.gas_price, fee);
        assert_eq!(tx.chain_id, Some(CHAIN));
        assert_eq!(tx.to, TxKind::Call(CAP_TABLES));
        let call = CapTables::initializeCall::abi_decode(&tx.input).unwrap();
        assert_eq!(call.supply, U256::from(10_100_000u64));
        assert_eq!(call.manager, ctx.address());
    }

    let (nonce, distribution) =
        stage_distribute(&security, security_id, CAP_TABLES, nonce, &ctx).unwrap();
    assert_eq!(nonce, 3);
    assert_eq!(distribution.len(), 2);
    for (step, (investor, amount, expected_nonce)) in distribution.iter().zip([
        (INVESTOR_A, 100_000u64, 1u64),
        (INVESTOR_B, 10_000_000, 2),
    ]) {
        let (_, raw) = &variants(step)[0];
        let tx = decode_legacy(raw).unwrap();
        assert_eq!(tx.nonce, expected_nonce);
        let call = CapTables::transferCall::abi_decode(&tx.input).unwrap();
        assert_eq!(call.securityId, security_id);
        assert_eq!(call.src, ctx.address());
        assert_eq!(call.dest, investor);
        assert_eq!(call.amount, U256::from(amount));
    }

    let (nonce, deploy) = stage_deploy_and_migrate(
        &security,
        security_id,
        CAP_TABLES,
        RESOLVER,
        &code(),
        nonce,
        &ctx,
    )
    .unwrap();
    assert_eq!(nonce, 8);
    assert_eq!(deploy.len(), 5);

    let logic = ctx.address().create(3);
    let front = ctx.address().create(4);
    assert_eq!(deploy[0].params.predicted_contract(), Some(logic));
    assert_eq!(deploy[1].params.predicted_contract(), Some(front));

    let decoded: Vec<_> = deploy
        .iter()
        .map(|step| decode_legacy(&variants(step)[0].1).unwrap())
        .collect();
    assert_eq!(
        decoded.iter().map(|tx| tx.nonce).collect::<Vec<_>>(),
        vec![3, 4, 5, 6, 7]
    );
    assert_eq!(decoded[0].to, TxKind::Create);
    assert!(decoded[0].input.starts_with(&code().logic));
    assert_eq!(decoded[1].to, TxKind::Create);
    assert!(decoded[1].input.starts_with(&code().front));
    assert_eq!(&decoded[1].input[code().front.len() + 12..code().front.len() + 32], logic.as_slice());

    assert_eq!(decoded[2].to, TxKind::Call(CAP_TABLES));
    let migrate = CapTables::migrateCall::abi_decode(&decoded[2].input).unwrap();
    assert_eq!(migrate.newAddress, logic);

    assert_eq!(decoded[3].to, TxKind::Call(logic));
    let set_front = SimplifiedTokenLogic::setFrontCall::abi_decode(&decoded[3].input).unwrap();
    assert_eq!(set_front.front, front);

    assert_eq!(decoded[4].to, TxKind::Call(logic));
    let handoff =
        SimplifiedTokenLogic::transferOwnershipCall::abi_decode(&decoded[4].input).unwrap();
    assert_eq!(handoff.newOwner, ADMIN);
}

#[test]
fn staging_is_byte_identical_across_runs() {
    let run = || {
        let ctx = ctx();
        let (n, init) = stage_init(&security(), CAP_TABLES, 0, &ctx).unwrap();
        let (n, dist) = stage_distribute(&security(), U256::ZERO, CAP_TABLES, n, &ctx).unwrap();
        let (_, deploy) = stage_deploy_and_migrate(
            &security(),
            U256::ZERO,
            CAP_TABLES,
            RESOLVER,
            &code(),
            n,
            &ctx,
        )
        .unwrap();
        serde_json::to_string(&(init, dist, deploy)).unwrap()
    };
    assert_eq!(run(), run());
}

#[test]
fn oversized_supply_aborts_staging() {
    let mut security = security();
    security.investors[1].amount = U256::MAX;
    let err = stage_init(&security, CAP_TABLES, 0, &ctx()).unwrap_err();
    assert!(matches!(err, AppError::Encoding(_)));
}

#[test]
fn report_round_trips_and_refuses_overwrite() {
    let ctx = ctx();
    let (nonce, stage1) = stage_one(&[security()], CAP_TABLES, &ctx, 0).unwrap();
    let indexed = IndexedSecurity {
        security_id: U256::from(0u64),
        security: security(),
    };
    let (nonce, stage2) = stage_two(&[indexed], CAP_TABLES, RESOLVER, &code(), &ctx, nonce).unwrap();
    assert_eq!(nonce, 1 + 2 + 5);
    let report = OfflineReport {
        nonce,
        stage1,
        stage2: Some(stage2),
    };

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("report.json");
    transcript::write_new(&path, &report).unwrap();
    assert!(matches!(
        transcript::write_new(&path, &report),
        Err(AppError::OutputExists(_))
    ));

    let raw: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(raw["nonce"], 8);
    assert_eq!(raw["stage1"][0][0], "Acme Preferred");
    assert_eq!(raw["stage1"][0][1]["params"]["action"], "initializeCapTable");
    assert_eq!(raw["stage1"][0][1]["signedTxes"][0][0], "0x12a05f200");
    assert_eq!(raw["stage2"][0][1].as_array().unwrap().len(), 7);

    let back: OfflineReport = transcript::read(&path).unwrap();
    assert_eq!(back, report);
}

#[tokio::test]
async fn staged_transcript_publishes_in_order() {
    let ctx = ctx();
    let security = security();
    let (n, init) = stage_init(&security, CAP_TABLES, 0, &ctx).unwrap();
    let (n, mut steps) = stage_distribute(&security, U256::ZERO, CAP_TABLES, n, &ctx).unwrap();
    let (_, deploy) =
        stage_deploy_and_migrate(&security, U256::ZERO, CAP_TABLES, RESOLVER, &code(), n, &ctx)
            .unwrap();
    steps.extend(deploy);

    let ledger = Arc::new(FakeLedger::new(CHAIN));
    ledger.with(|s| s.deployer = Some(ctx.address()));
    let cheapest = ctx.fee_levels()[0];
    let operator = ScriptedOperator::new(
        vec![FeeChoice::Level(cheapest); 1 + steps.len()],
        vec![AfterSubmit::Wait; 1 + steps.len()],
    );
    let mut publisher = Publisher::new(ledger.clone(), operator, fast_receipts());

    let ids = publisher
        .publish_stage_one(&[("Acme Preferred".to_string(), init)])
        .await
        .unwrap();
    assert_eq!(ids, vec![("Acme Preferred".to_string(), U256::ZERO)]);

    let receipts = publisher.publish_all(&steps).await.unwrap();
    assert_eq!(receipts.len(), 7);
    assert_eq!(receipts[0].contract_address, Some(ctx.address().create(3)));
    assert_eq!(receipts[1].contract_address, Some(ctx.address().create(4)));

    let nonces: Vec<u64> = ledger.sent().iter().map(|tx| tx.nonce).collect();
    assert_eq!(nonces, (0..8).collect::<Vec<_>>());
    assert!(ledger.sent().iter().all(|tx| tx.gas_price == cheapest));
    assert!(matches!(
        steps[4].params,
        StepParams::MigrateCapTable { .. }
    ));
}
