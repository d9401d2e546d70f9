//! Append-only replay journal of applied decisions.
//!
//! Each entry is one JSON line. Every line is also fed to a SHA-256 hasher so
//! two runs can be compared by digest without keeping both journals around.
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use sha2::{Digest, Sha256};

use kingdom_core::{AgentState, DecisionRecord, EntityId, Target};

use crate::api::{Result, RuntimeError};

/// One journaled decision.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct JournalEntry {
    pub tick: u64,
    pub agent: EntityId,
    pub state: AgentState,
    pub target: Option<Target>,
    #[serde(flatten)]
    pub record: DecisionRecord,
}

/// Decision journal with an optional file sink.
///
/// The in-memory copy is always kept; the file sink, when present, receives
/// the same bytes through a buffered writer.
pub struct DecisionJournal {
    entries: Vec<JournalEntry>,
    bytes: Vec<u8>,
    hasher: Sha256,
    sink: Option<(PathBuf, BufWriter<File>)>,
}

impl DecisionJournal {
    pub fn in_memory() -> Self {
        Self {
            entries: Vec::new(),
            bytes: Vec::new(),
            hasher: Sha256::new(),
            sink: None,
        }
    }

    /// Journal that also appends to `path`, creating the file if needed.
    pub fn to_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| RuntimeError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| RuntimeError::Io {
                path: path.clone(),
                source,
            })?;
        tracing::debug!(target: "kingdom::tick", path = %path.display(), "opened decision journal");

        let mut journal = Self::in_memory();
        journal.sink = Some((path, BufWriter::new(file)));
        Ok(journal)
    }

    /// Append an entry.
    pub fn append(&mut self, entry: JournalEntry) -> Result<()> {
        let mut line = serde_json::to_vec(&entry)?;
        line.push(b'\n');

        if let Some((_, writer)) = self.sink.as_mut() {
            writer.write_all(&line).map_err(RuntimeError::Journal)?;
        }
        self.hasher.update(&line);
        self.bytes.extend_from_slice(&line);
        self.entries.push(entry);
        Ok(())
    }

    pub fn entries(&self) -> &[JournalEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Everything journaled so far, as written.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Hex SHA-256 of [`Self::bytes`].
    pub fn digest(&self) -> String {
        hex::encode(self.hasher.clone().finalize())
    }

    pub fn path(&self) -> Option<&Path> {
        self.sink.as_ref().map(|(path, _)| path.as_path())
    }

    /// Flush the file sink, if any.
    pub fn flush(&mut self) -> Result<()> {
        if let Some((_, writer)) = self.sink.as_mut() {
            writer.flush().map_err(RuntimeError::Journal)?;
        }
        Ok(())
    }
}

impl Default for DecisionJournal {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl Drop for DecisionJournal {
    fn drop(&mut self) {
        if let Err(error) = self.flush() {
            tracing::warn!(target: "kingdom::tick", %error, "failed to flush decision journal");
        }
    }
}
