// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Atomic JSON persistence: write to a sibling `.tmp` path, `fsync`, then
//! `rename` over the destination. Grounded on the credential broker's own
//! `load`/`save` pair; the only addition here is the explicit `fsync`
//! spec §4.1 calls for ahead of the rename.

use std::fs::File;
use std::io::Write as _;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{ErrorCategory, TramuntanaError};

pub fn load<T: DeserializeOwned + Default>(path: &Path) -> Result<T, TramuntanaError> {
    match std::fs::read_to_string(path) {
        Ok(contents) => serde_json::from_str(&contents).map_err(|e| {
            TramuntanaError::new(
                ErrorCategory::ParseError,
                format!("parsing {}: {e}", path.display()),
            )
        }),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(T::default()),
        Err(e) => Err(TramuntanaError::new(
            ErrorCategory::Filesystem,
            format!("reading {}: {e}", path.display()),
        )),
    }
}

pub fn save<T: Serialize>(path: &Path, value: &T) -> Result<(), TramuntanaError> {
    let to_fs_err = |e: std::io::Error| {
        TramuntanaError::new(
            ErrorCategory::Filesystem,
            format!("writing {}: {e}", path.display()),
        )
    };

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(to_fs_err)?;
    }

    let body = serde_json::to_string_pretty(value).map_err(|e| {
        TramuntanaError::new(ErrorCategory::ParseError, format!("encoding state: {e}"))
    })?;

    let tmp_path = path.with_extension("tmp");
    {
        let mut tmp = File::create(&tmp_path).map_err(to_fs_err)?;
        tmp.write_all(body.as_bytes()).map_err(to_fs_err)?;
        tmp.sync_all().map_err(to_fs_err)?;
    }
    std::fs::rename(&tmp_path, path).map_err(to_fs_err)?;
    Ok(())
}

#[cfg(test)]
#[path = "persist_tests.rs"]
mod tests;
