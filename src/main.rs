// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use alloy::primitives::{Address, U256};
use alloy::signers::local::PrivateKeySigner;
use clap::{Parser, Subcommand};
use s3_issuance::app::config::GlobalSettings;
use s3_issuance::app::logging::setup_logging;
use s3_issuance::data::artifacts::ArtifactRegistry;
use s3_issuance::data::transcript;
use s3_issuance::domain::error::AppError;
use s3_issuance::domain::security::{Declaration, IndexedSecurity, SecurityDefinition};
use s3_issuance::domain::transcript::{
    EcosystemInit, EntryTranscript, OfflineReport, Step, StepParams,
};
use s3_issuance::network::ledger::{Ledger, RpcLedger};
use s3_issuance::network::provider::ConnectionFactory;
use s3_issuance::services::monitor::{LogFinalizer, StaticDecision, TransferMonitor};
use s3_issuance::services::publish::publisher::fee_options;
use s3_issuance::services::publish::{PublishOutcome, Publisher, StdioOperator};
use s3_issuance::services::staging::signer::{
    decode_legacy, export_signing_key, parse_signing_key,
};
use s3_issuance::services::staging::{
    StagingContext, gas_price_ladder, stage_cap_tables, stage_new_resolver, stage_one, stage_two,
};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[derive(Parser, Debug)]
#[command(author, version, about = "S3 security issuance and transfer resolution")]
struct Cli {
    /// Path to config file (default: config.{toml,yaml,...})
    #[arg(long, global = true)]
    config: Option<String>,

    /// Emit JSON log lines
    #[arg(long, global = true, default_value_t = false)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Args, Debug)]
struct FeeArgs {
    /// Chain id baked into signatures (overrides config/env)
    #[arg(long)]
    chain_id: Option<u64>,

    /// Lowest gas price to sign, in gwei
    #[arg(long)]
    gas_price: Option<u64>,

    /// Gas price increment between signed variants, in gwei
    #[arg(long)]
    gas_step: Option<u64>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sign the CapTables deployment the later stages register securities in
    Init {
        #[arg(long)]
        output: PathBuf,
        /// Account nonce the deployment is signed at
        #[arg(long, default_value_t = 0)]
        nonce: u64,
        #[arg(long, env = "DEPLOYER_KEY", hide_env_values = true)]
        deployer_key: String,
        #[command(flatten)]
        fees: FeeArgs,
    },
    /// Sign cap-table initializations with a fresh controller key
    Stage1 {
        #[arg(long)]
        declaration: PathBuf,
        #[arg(long)]
        output: PathBuf,
        #[command(flatten)]
        fees: FeeArgs,
    },
    /// Sign distributions and deployments for securities with known ids
    Stage2 {
        #[arg(long)]
        declaration: PathBuf,
        #[arg(long)]
        report: PathBuf,
        #[arg(long, env = "CONTROLLER_KEY", hide_env_values = true)]
        controller_key: String,
        #[command(flatten)]
        fees: FeeArgs,
    },
    /// Interactively broadcast one stage of an offline report
    Publish {
        #[arg(long)]
        report: PathBuf,
        #[arg(long, value_parser = clap::value_parser!(u8).range(1..=2))]
        stage: u8,
    },
    /// Sign a setResolver call installing a freshly generated resolver key
    NewResolver {
        #[arg(long)]
        logic: Address,
        #[arg(long)]
        nonce: u64,
        #[arg(long)]
        output: PathBuf,
        #[arg(long, env = "ADMIN_KEY", hide_env_values = true)]
        admin_key: String,
        #[command(flatten)]
        fees: FeeArgs,
    },
    /// Interactively broadcast a single staged step
    PublishEntry {
        #[arg(long)]
        transcript: PathBuf,
    },
    /// Resolve pending transfer requests on a SimplifiedTokenLogic contract
    Monitor {
        #[arg(long)]
        logic: Address,
        #[arg(long, default_value_t = 0)]
        start_index: u64,
        /// Scan past unused slots instead of stopping at the first
        #[arg(long, default_value_t = false)]
        sparse: bool,
        /// Unused slots tolerated by --sparse (overrides config/env)
        #[arg(long)]
        gap: Option<u64>,
        /// Resolution code to submit for every request (0 approves)
        #[arg(long, default_value_t = 0)]
        code: u16,
        /// Make a single pass and exit
        #[arg(long, default_value_t = false)]
        once: bool,
    },
}

fn staging_context(
    settings: &GlobalSettings,
    fees: &FeeArgs,
    signer: PrivateKeySigner,
) -> Result<StagingContext, AppError> {
    let chain_id = fees.chain_id.unwrap_or(settings.chain_id);
    let ladder = gas_price_ladder(
        fees.gas_price.unwrap_or(settings.gas_price_gwei),
        fees.gas_step.unwrap_or(settings.gas_price_step_gwei),
    );
    StagingContext::new(signer, chain_id, ladder)
}

async fn connect(settings: &GlobalSettings) -> Result<Arc<RpcLedger>, AppError> {
    let url = settings.require_http_provider()?;
    let provider = ConnectionFactory::http(&url)?;
    Ok(Arc::new(RpcLedger::new(provider)))
}

/// Signed bytes only replay on the chain they were signed for.
async fn ensure_chain(ledger: &RpcLedger, steps: &[&Step]) -> Result<(), AppError> {
    let Some(first) = steps.first() else {
        return Ok(());
    };
    let options = fee_options(&first.signed)?;
    let Some((_, raw)) = options.first() else {
        return Ok(());
    };
    let signed_for = decode_legacy(raw)?.chain_id;
    let live = ledger.chain_id().await?;
    if signed_for.is_some_and(|id| id != live) {
        return Err(AppError::Config(format!(
            "transcript signed for chain {signed_for:?}, node reports {live}"
        )));
    }
    Ok(())
}

fn controller_of(report: &OfflineReport) -> Option<Address> {
    report.stage1.iter().find_map(|(_, step)| match step.params {
        StepParams::InitializeCapTable {
            controller_address, ..
        } => Some(controller_address),
        _ => None,
    })
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let cli = Cli::parse();

    let settings = GlobalSettings::load_with_path(cli.config.as_deref())?;
    setup_logging(settings.log_level(), cli.log_json || settings.log_json);

    match cli.command {
        Command::Init {
            output,
            nonce,
            deployer_key,
            fees,
        } => {
            if output.exists() {
                return Err(AppError::OutputExists(output.display().to_string()));
            }
            let deployer = parse_signing_key(&deployer_key)?;
            let ctx = staging_context(&settings, &fees, deployer)?;
            let mut artifacts = ArtifactRegistry::new();
            artifacts.load_from_directory(&settings.artifacts_dir)?;
            let code = artifacts.cap_tables_code()?;

            let (_, cap_tables, transcript) = stage_cap_tables(&code, nonce, &ctx)?;
            transcript::write_new(
                &output,
                &EcosystemInit {
                    cap_tables,
                    transcript,
                },
            )?;
            println!("CapTables instance @ {cap_tables} once published");
        }
        Command::Stage1 {
            declaration,
            output,
            fees,
        } => {
            if output.exists() {
                return Err(AppError::OutputExists(output.display().to_string()));
            }
            let decl = Declaration::load(&declaration)?;
            let securities = decl
                .resolved_paths(&declaration)
                .iter()
                .map(|p| SecurityDefinition::load(p))
                .collect::<Result<Vec<_>, _>>()?;

            let controller = PrivateKeySigner::random();
            let ctx = staging_context(&settings, &fees, controller.clone())?;
            let (nonce, stage1) = stage_one(&securities, decl.cap_tables, &ctx, 0)?;
            let report = OfflineReport {
                nonce,
                stage1,
                stage2: None,
            };
            transcript::write_new(&output, &report)?;

            println!("controller address: {}", ctx.address());
            println!("controller key (keep offline): {}", export_signing_key(&controller));
            tracing::info!(
                target: "staging",
                output = %output.display(),
                securities = securities.len(),
                chain_id = ctx.chain_id(),
                "Stage one written"
            );
        }
        Command::Stage2 {
            declaration,
            report,
            controller_key,
            fees,
        } => {
            let mut offline: OfflineReport = transcript::read(&report)?;
            if offline.stage2.is_some() {
                return Err(AppError::OutputExists(format!(
                    "stage2 of {}",
                    report.display()
                )));
            }
            let controller = parse_signing_key(&controller_key)?;
            let ctx = staging_context(&settings, &fees, controller)?;
            if let Some(expected) = controller_of(&offline)
                && expected != ctx.address()
            {
                return Err(AppError::Config(format!(
                    "CONTROLLER_KEY is for {}, stage one was signed by {}",
                    ctx.address(),
                    expected
                )));
            }

            let decl = Declaration::load(&declaration)?;
            let securities = decl
                .resolved_paths(&declaration)
                .iter()
                .map(|p| IndexedSecurity::load(p))
                .collect::<Result<Vec<_>, _>>()?;
            let mut artifacts = ArtifactRegistry::new();
            artifacts.load_from_directory(&settings.artifacts_dir)?;
            let code = artifacts.deployment_code()?;

            let (nonce, stage2) = stage_two(
                &securities,
                decl.cap_tables,
                decl.resolver,
                &code,
                &ctx,
                offline.nonce,
            )?;
            offline.nonce = nonce;
            offline.stage2 = Some(stage2);
            transcript::replace(&report, &offline)?;
            tracing::info!(target: "staging", report = %report.display(), nonce, "Stage two written");
        }
        Command::Publish { report, stage } => {
            let offline: OfflineReport = transcript::read(&report)?;
            let ledger = connect(&settings).await?;
            let mut publisher =
                Publisher::new(ledger.clone(), StdioOperator::new(), settings.receipt_policy());
            if stage == 1 {
                let steps: Vec<&Step> = offline.stage1.iter().map(|(_, s)| s).collect();
                ensure_chain(&ledger, &steps).await?;
                for (name, security_id) in publisher.publish_stage_one(&offline.stage1).await? {
                    println!("{name}: securityId {security_id}");
                }
            } else {
                let stage2 = offline.stage2.ok_or_else(|| AppError::Validation {
                    field: "stage2".into(),
                    message: format!("{} has no stage two; run stage2 first", report.display()),
                })?;
                let steps: Vec<&Step> = stage2.iter().flat_map(|(_, s)| s.iter()).collect();
                ensure_chain(&ledger, &steps).await?;
                for (name, steps) in &stage2 {
                    tracing::info!(target: "publish", security = %name, steps = steps.len(), "Publishing");
                    let confirmed = publisher.publish_all(steps).await?;
                    if confirmed.len() < steps.len() {
                        break;
                    }
                }
            }
        }
        Command::NewResolver {
            logic,
            nonce,
            output,
            admin_key,
            fees,
        } => {
            if output.exists() {
                return Err(AppError::OutputExists(output.display().to_string()));
            }
            let owner = parse_signing_key(&admin_key)?;
            let ctx = staging_context(&settings, &fees, owner)?;
            let (_, rotation) = stage_new_resolver(logic, &ctx, nonce)?;
            transcript::write_new(&output, &rotation.step)?;
            println!("resolver address: {}", rotation.resolver_address);
            println!(
                "resolver key (set RESOLVER_KEY): {}",
                export_signing_key(&rotation.resolver_key)
            );
        }
        Command::PublishEntry { transcript: path } => {
            let step = transcript::read::<EntryTranscript>(&path)?.into_step();
            let ledger = connect(&settings).await?;
            ensure_chain(&ledger, &[&step]).await?;
            let mut publisher =
                Publisher::new(ledger, StdioOperator::new(), settings.receipt_policy());
            if let PublishOutcome::Confirmed { receipt } = publisher.publish(&step).await?
                && let Some(created) = receipt.contract_address
            {
                println!("deployed at {created}");
            }
        }
        Command::Monitor {
            logic,
            start_index,
            sparse,
            gap,
            code,
            once,
        } => {
            let resolver = parse_signing_key(&settings.resolver_key_value()?)?;
            let ledger = connect(&settings).await?;
            let chain_id = ledger.chain_id().await?;
            let mut monitor =
                TransferMonitor::new(ledger, resolver, chain_id, logic, settings.receipt_policy());
            let decision = StaticDecision { code };
            let start = U256::from(start_index);

            let gap = gap.or(sparse.then_some(settings.monitor_gap));
            let next = match (gap, once) {
                (Some(gap), _) => {
                    monitor
                        .resolve_active(start, gap, &decision, &LogFinalizer)
                        .await?
                }
                (None, true) => {
                    monitor
                        .resolve_range(start, &decision, &LogFinalizer)
                        .await?
                }
                (None, false) => {
                    let shutdown = CancellationToken::new();
                    let trigger = shutdown.clone();
                    tokio::spawn(async move {
                        if tokio::signal::ctrl_c().await.is_ok() {
                            tracing::info!(target: "monitor", "Ctrl-C received; finishing current pass");
                            trigger.cancel();
                        }
                    });
                    monitor
                        .run(
                            start,
                            settings.monitor_interval(),
                            &decision,
                            &LogFinalizer,
                            shutdown,
                        )
                        .await?
                }
            };
            println!("next index: {next}");
        }
    }

    Ok(())
}
