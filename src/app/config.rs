// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use crate::domain::constants;
use crate::domain::error::AppError;
use crate::infrastructure::network::receipts::ReceiptPolicy;
use config::{Config, Environment, File};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;
use url::Url;

#[derive(Debug, Deserialize, Clone)]
pub struct GlobalSettings {
    // General
    #[serde(default = "default_false")]
    pub debug: bool,
    #[serde(default = "default_false")]
    pub log_json: bool,

    // Network
    pub http_provider: Option<String>,
    #[serde(default = "default_chain_id")]
    pub chain_id: u64,

    // Staging
    #[serde(default = "default_artifacts_dir")]
    pub artifacts_dir: String,
    #[serde(default = "default_gas_price_gwei")]
    pub gas_price_gwei: u64,
    #[serde(default = "default_gas_price_step_gwei")]
    pub gas_price_step_gwei: u64,

    // Receipts
    #[serde(default = "default_receipt_poll_ms")]
    pub receipt_poll_ms: u64,
    #[serde(default = "default_receipt_max_poll_ms")]
    pub receipt_max_poll_ms: u64,
    /// 0 waits forever.
    #[serde(default = "default_receipt_timeout_ms")]
    pub receipt_timeout_ms: u64,

    // Monitor
    pub resolver_key: Option<String>,
    #[serde(default = "default_monitor_interval_ms")]
    pub monitor_interval_ms: u64,
    #[serde(default = "default_monitor_gap")]
    pub monitor_gap: u64,
}

// Defaults
fn default_false() -> bool {
    false
}
fn default_chain_id() -> u64 {
    constants::DEFAULT_CHAIN_ID
}
fn default_artifacts_dir() -> String {
    "build".to_string()
}
fn default_gas_price_gwei() -> u64 {
    constants::DEFAULT_GAS_PRICE_GWEI
}
fn default_gas_price_step_gwei() -> u64 {
    constants::DEFAULT_GAS_PRICE_STEP_GWEI
}
fn default_receipt_poll_ms() -> u64 {
    1_000
}
fn default_receipt_max_poll_ms() -> u64 {
    16_000
}
fn default_receipt_timeout_ms() -> u64 {
    30 * 60 * 1_000
}
fn default_monitor_interval_ms() -> u64 {
    15_000
}
fn default_monitor_gap() -> u64 {
    10
}

impl Default for GlobalSettings {
    fn default() -> Self {
        Self {
            debug: default_false(),
            log_json: default_false(),
            http_provider: None,
            chain_id: default_chain_id(),
            artifacts_dir: default_artifacts_dir(),
            gas_price_gwei: default_gas_price_gwei(),
            gas_price_step_gwei: default_gas_price_step_gwei(),
            receipt_poll_ms: default_receipt_poll_ms(),
            receipt_max_poll_ms: default_receipt_max_poll_ms(),
            receipt_timeout_ms: default_receipt_timeout_ms(),
            resolver_key: None,
            monitor_interval_ms: default_monitor_interval_ms(),
            monitor_gap: default_monitor_gap(),
        }
    }
}

impl GlobalSettings {
    pub fn load_with_path(path: Option<&str>) -> Result<Self, AppError> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        let selected_config = resolve_config_path(path);
        let mut builder = Config::builder();

        if let Some(ref selected_path) = selected_config {
            builder = builder.add_source(File::from(Path::new(selected_path)).required(true));
        } else {
            builder = builder.add_source(File::with_name("config").required(false));
        }
        // CLI (in main) > env/.env > selected file.
        builder = builder.add_source(Environment::default());

        let settings: GlobalSettings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), AppError> {
        if let Some(url) = self.http_provider_value() {
            Url::parse(&url).map_err(|e| AppError::Validation {
                field: "http_provider".into(),
                message: e.to_string(),
            })?;
        }
        if self.chain_id == 0 {
            return Err(AppError::Validation {
                field: "chain_id".into(),
                message: "chain id must be non-zero for replay-protected signing".into(),
            });
        }
        Ok(())
    }

    pub fn http_provider_value(&self) -> Option<String> {
        self.http_provider
            .as_ref()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    pub fn require_http_provider(&self) -> Result<String, AppError> {
        self.http_provider_value()
            .ok_or_else(|| AppError::Config("HTTP_PROVIDER is missing".into()))
    }

    pub fn resolver_key_value(&self) -> Result<String, AppError> {
        self.resolver_key
            .as_ref()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AppError::Config("RESOLVER_KEY is missing".into()))
    }

    pub fn log_level(&self) -> &'static str {
        if self.debug { "debug" } else { "info" }
    }

    pub fn receipt_policy(&self) -> ReceiptPolicy {
        let initial = self.receipt_poll_ms.max(100);
        let max = self.receipt_max_poll_ms.max(initial);
        let timeout = if self.receipt_timeout_ms == 0 {
            None
        } else {
            Some(Duration::from_millis(self.receipt_timeout_ms.max(initial)))
        };
        ReceiptPolicy {
            initial_delay: Duration::from_millis(initial),
            max_delay: Duration::from_millis(max),
            timeout,
        }
    }

    pub fn monitor_interval(&self) -> Duration {
        Duration::from_millis(self.monitor_interval_ms.max(1_000))
    }
}

fn resolve_config_path(path: Option<&str>) -> Option<String> {
    if let Some(path) = path {
        return Some(path.to_string());
    }
    detect_active_config_file()
}

fn detect_active_config_file() -> Option<String> {
    let priority_files = [
        "config.prod.toml",
        "config.dev.toml",
        "config.testnet.toml",
        "config.toml",
    ];

    for file in priority_files.iter() {
        if let Some(true) = config_has_active_flag(file) {
            return Some((*file).to_string());
        }
    }

    // Fallback: scan current dir for config.*.toml with THIS_ACTIVE = true
    if let Ok(entries) = fs::read_dir(".") {
        for entry in entries.flatten() {
            let path = entry.path();
            if let Some(name) = path.file_name().and_then(|n| n.to_str())
                && name.starts_with("config.")
                && name.ends_with(".toml")
                && let Some(true) = config_has_active_flag(name)
            {
                return Some(name.to_string());
            }
        }
    }

    None
}

fn config_has_active_flag(path: &str) -> Option<bool> {
    let p = Path::new(path);
    if !p.exists() {
        return None;
    }

    Config::builder()
        .add_source(File::from(p))
        .build()
        .ok()?
        .get_bool("THIS_ACTIVE")
        .ok()
}
