// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Byte-offset JSONL tailer. Grounded directly on the driver's own
//! `LogWatcher`: detect truncation by comparing the file's current size to
//! the last-known offset, reset to 0 on shrink, otherwise seek-and-read.

use std::fs::File;
use std::io::{BufRead, BufReader, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use crate::error::{ErrorCategory, TramuntanaError};

pub struct LogWatcher {
    path: PathBuf,
    offset: u64,
}

impl LogWatcher {
    pub fn new(path: PathBuf) -> Self {
        Self { path, offset: 0 }
    }

    pub fn with_offset(path: PathBuf, offset: u64) -> Self {
        Self { path, offset }
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read any lines appended since the last call. On file truncation
    /// (spec I2: `offset > size(file)`), reset to 0 and read from the
    /// start, matching the "file shrinks" boundary behavior in spec §8.
    pub fn read_new_lines(&mut self) -> Result<Vec<String>, TramuntanaError> {
        let file = match File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(TramuntanaError::new(
                    ErrorCategory::Filesystem,
                    format!("opening {}: {e}", self.path.display()),
                ))
            }
        };

        let meta = file.metadata().map_err(|e| {
            TramuntanaError::new(
                ErrorCategory::Filesystem,
                format!("stat {}: {e}", self.path.display()),
            )
        })?;

        if meta.len() < self.offset {
            self.offset = 0;
        }

        let mut reader = BufReader::new(file);
        reader.seek(SeekFrom::Start(self.offset)).map_err(|e| {
            TramuntanaError::new(
                ErrorCategory::Filesystem,
                format!("seeking {}: {e}", self.path.display()),
            )
        })?;

        let mut lines = Vec::new();
        loop {
            let mut line = String::new();
            let bytes_read = reader.read_line(&mut line).map_err(|e| {
                TramuntanaError::new(
                    ErrorCategory::Filesystem,
                    format!("reading {}: {e}", self.path.display()),
                )
            })?;
            if bytes_read == 0 {
                break;
            }
            self.offset += bytes_read as u64;
            let trimmed = line.trim_end_matches(['\n', '\r']);
            if !trimmed.is_empty() {
                lines.push(trimmed.to_string());
            }
        }
        Ok(lines)
    }
}

#[cfg(test)]
#[path = "log_watch_tests.rs"]
mod tests;
