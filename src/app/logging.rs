// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use std::str::FromStr;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const QUIET_TRANSPORT: &str =
    "hyper=info,hyper_util=info,reqwest=info,alloy_transport_http=info,alloy_rpc_client=info";

/// Build the filter directive for a bare level or pass custom directives through.
pub fn filter_spec(log_level: &str) -> String {
    let normalized = log_level.trim();
    if normalized.is_empty() {
        return format!("info,{QUIET_TRANSPORT}");
    }
    if normalized.contains(',') || normalized.contains('=') {
        normalized.to_string()
    } else {
        format!("{normalized},{QUIET_TRANSPORT}")
    }
}

pub fn setup_logging(log_level: &str, json_format: bool) {
    let spec = filter_spec(log_level);
    let filter = EnvFilter::from_str(&spec).unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::registry().with(filter);

    // Operator prompts share stdout, so log lines go to stderr.
    let installed = if json_format {
        let json_layer = fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_current_span(false);
        subscriber.with(json_layer).try_init().is_ok()
    } else {
        let fmt_layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .compact();
        subscriber.with(fmt_layer).try_init().is_ok()
    };

    if installed {
        tracing::debug!(
            target: "config",
            filter = %spec,
            format = if json_format { "json" } else { "compact" },
            "Logging initialized"
        );
    }
}
