// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::common::error::AppError;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::Path;

/// Write `value` to a file that must not exist yet.
pub fn write_new<T: Serialize>(path: &Path, value: &T) -> Result<(), AppError> {
    let body = serde_json::to_vec_pretty(value)?;
    let mut file = match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::AlreadyExists => {
            return Err(AppError::OutputExists(path.display().to_string()));
        }
        Err(e) => return Err(e.into()),
    };
    file.write_all(&body)?;
    file.sync_all()?;
    tracing::debug!(target: "staging", path = %path.display(), bytes = body.len(), "Wrote transcript");
    Ok(())
}

/// Replace an existing file in place via a sibling temp file.
pub fn replace<T: Serialize>(path: &Path, value: &T) -> Result<(), AppError> {
    if !path.exists() {
        return Err(AppError::Validation {
            field: path.display().to_string(),
            message: "report to update does not exist".into(),
        });
    }
    let body = serde_json::to_vec_pretty(value)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, &body)?;
    fs::rename(&tmp, path)?;
    tracing::debug!(target: "staging", path = %path.display(), bytes = body.len(), "Updated transcript");
    Ok(())
}

pub fn read<T: DeserializeOwned>(path: &Path) -> Result<T, AppError> {
    let body = fs::read_to_string(path)?;
    serde_json::from_str(&body).map_err(|e| AppError::Validation {
        field: path.display().to_string(),
        message: format!("malformed transcript: {e}"),
    })
}
