// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@on1.no>

use crate::common::error::AppError;
use crate::domain::constants::{ARTIFACT_CAP_TABLES, ARTIFACT_TOKEN_FRONT, ARTIFACT_TOKEN_LOGIC};
use alloy::primitives::Bytes;
use alloy_json_abi::ContractObject;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Creation code for the two contracts deployed per security.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentCode {
    pub logic: Bytes,
    pub front: Bytes,
}

/// Compiled contract artifacts keyed by file stem.
#[derive(Default)]
pub struct ArtifactRegistry {
    artifacts: HashMap<String, ContractObject>,
}

impl ArtifactRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load_from_directory(&mut self, dir_path: &str) -> Result<(), AppError> {
        let path = Path::new(dir_path);

        if !path.exists() {
            return Err(AppError::Config(format!(
                "Artifact directory not found: {}",
                dir_path
            )));
        }

        for entry in fs::read_dir(path).map_err(|e| AppError::Initialization(e.to_string()))? {
            let entry = entry.map_err(|e| AppError::Initialization(e.to_string()))?;
            let path = entry.path();

            if path.extension().and_then(|s| s.to_str()) == Some("json") {
                let file_stem = path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .unwrap_or("unknown")
                    .to_string();

                let file_content = fs::read_to_string(&path).map_err(|e| {
                    AppError::Config(format!("Failed to read artifact {}: {}", file_stem, e))
                })?;

                let artifact: ContractObject =
                    serde_json::from_str(&file_content).map_err(|e| {
                        AppError::Config(format!("Failed to parse artifact {}: {}", file_stem, e))
                    })?;

                tracing::debug!(target: "config", artifact = %file_stem, "Loaded artifact");
                self.artifacts.insert(file_stem, artifact);
            }
        }
        Ok(())
    }

    pub fn insert(&mut self, name: &str, artifact: ContractObject) {
        self.artifacts.insert(name.to_string(), artifact);
    }

    pub fn get(&self, name: &str) -> Option<&ContractObject> {
        self.artifacts.get(name)
    }

    pub fn init_code(&self, name: &str) -> Result<Bytes, AppError> {
        let artifact = self
            .get(name)
            .ok_or_else(|| AppError::Config(format!("Missing contract artifact {name}")))?;
        artifact
            .bytecode
            .clone()
            .filter(|code| !code.is_empty())
            .ok_or_else(|| AppError::Config(format!("Artifact {name} carries no bytecode")))
    }

    pub fn cap_tables_code(&self) -> Result<Bytes, AppError> {
        self.init_code(ARTIFACT_CAP_TABLES)
    }

    pub fn deployment_code(&self) -> Result<DeploymentCode, AppError> {
        Ok(DeploymentCode {
            logic: self.init_code(ARTIFACT_TOKEN_LOGIC)?,
            front: self.init_code(ARTIFACT_TOKEN_FRONT)?,
        })
    }
}
