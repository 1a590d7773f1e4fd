// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The project catalog consumed by the picker (spec §4.6). The
//! directory/file-browser UI flows themselves are named out of scope
//! (spec §1); this is the narrow seam the picker consumes instead of
//! browsing the filesystem directly, in the same spirit as
//! `Multiplexer`/`ChatClient`.

use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{ErrorCategory, TramuntanaError};
use crate::ids::ProjectID;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectSummary {
    pub id: ProjectID,
    pub name: String,
    pub cwd: String,
}

#[async_trait]
pub trait ProjectCatalog: Send + Sync {
    async fn list(&self) -> Result<Vec<ProjectSummary>, TramuntanaError>;
    async fn resolve(&self, project: &ProjectID) -> Result<ProjectSummary, TramuntanaError>;
}

/// A catalog backed by a flat JSON array file, `projects.json` in
/// `DATA_DIR`. Reloaded on every call so edits to the file take effect
/// without a daemon restart.
pub struct JsonProjectCatalog {
    path: PathBuf,
}

impl JsonProjectCatalog {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn read(&self) -> Result<Vec<ProjectSummary>, TramuntanaError> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => serde_json::from_str(&contents)
                .map_err(|e| TramuntanaError::new(ErrorCategory::ParseError, format!("{}: {e}", self.path.display()))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(TramuntanaError::new(ErrorCategory::Filesystem, format!("{}: {e}", self.path.display()))),
        }
    }
}

#[async_trait]
impl ProjectCatalog for JsonProjectCatalog {
    async fn list(&self) -> Result<Vec<ProjectSummary>, TramuntanaError> {
        self.read()
    }

    async fn resolve(&self, project: &ProjectID) -> Result<ProjectSummary, TramuntanaError> {
        self.read()?
            .into_iter()
            .find(|p| &p.id == project)
            .ok_or_else(|| TramuntanaError::new(ErrorCategory::Configuration, format!("unknown project {project}")))
    }
}

#[cfg(test)]
#[path = "catalog_tests.rs"]
mod tests;
