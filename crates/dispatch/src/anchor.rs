//! Anchoring credential hashes on an append-only ledger

use crate::error::{DispatchError, DispatchResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

pub const JOURNAL_NETWORK: &str = "local-journal";
const GENESIS_DIGEST: &str = "GENESIS";

/// Result of an anchoring attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnchorReceipt {
    pub success: bool,
    pub reference: Option<String>,
    pub network: String,
    pub error: Option<String>,
}

impl AnchorReceipt {
    pub fn anchored(reference: impl Into<String>, network: impl Into<String>) -> Self {
        Self {
            success: true,
            reference: Some(reference.into()),
            network: network.into(),
            error: None,
        }
    }

    pub fn failed(network: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            reference: None,
            network: network.into(),
            error: Some(error.into()),
        }
    }
}

/// External ledger that timestamps hashes
#[async_trait]
pub trait LedgerAnchor: Send + Sync {
    fn network(&self) -> &str;

    async fn anchor(&self, hash: &str, metadata: serde_json::Value) -> DispatchResult<AnchorReceipt>;
}

/// One line of the anchor journal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalLine {
    pub sequence: u64,
    pub hash: String,
    pub metadata: serde_json::Value,
    /// Digest of the previous line, `GENESIS` for the first
    pub prev_digest: String,
}

impl JournalLine {
    pub fn digest(json: &str) -> String {
        hex::encode(Sha256::digest(json.as_bytes()))
    }
}

struct JournalState {
    file: File,
    sequence: u64,
    last_digest: String,
}

impl JournalState {
    fn append(&mut self, hash: String, metadata: serde_json::Value) -> DispatchResult<String> {
        let line = JournalLine {
            sequence: self.sequence + 1,
            hash,
            metadata,
            prev_digest: self.last_digest.clone(),
        };
        let json = serde_json::to_string(&line)?;
        writeln!(self.file, "{}", json)?;
        self.file.flush()?;

        let digest = JournalLine::digest(&json);
        self.sequence = line.sequence;
        self.last_digest = digest.clone();
        Ok(digest)
    }
}

/// Append-only JSONL journal used as the bundled anchor.
///
/// Each line links to the digest of the one before it; the digest of the
/// new line is the anchor reference. Writes run on the blocking pool and
/// complete even if the caller stops waiting; such a line stays in the
/// chain without being recorded on its asset.
pub struct JournalAnchor {
    path: PathBuf,
    state: Arc<Mutex<JournalState>>,
}

impl JournalAnchor {
    /// Open or create the journal, restoring sequence and chain tip
    pub fn open(path: impl AsRef<Path>) -> DispatchResult<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut sequence = 0;
        let mut last_digest = GENESIS_DIGEST.to_string();
        if path.exists() {
            let reader = BufReader::new(File::open(&path)?);
            for line in reader.lines() {
                let line = line?;
                if line.trim().is_empty() {
                    continue;
                }
                let entry: JournalLine = serde_json::from_str(&line)?;
                sequence = entry.sequence;
                last_digest = JournalLine::digest(&line);
            }
        }

        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        Ok(Self {
            path,
            state: Arc::new(Mutex::new(JournalState {
                file,
                sequence,
                last_digest,
            })),
        })
    }

    /// Journal at `<dir>/anchors.jsonl`
    pub fn in_dir(dir: impl AsRef<Path>) -> DispatchResult<Self> {
        Self::open(dir.as_ref().join("anchors.jsonl"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All lines written so far
    pub fn read_all(&self) -> DispatchResult<Vec<JournalLine>> {
        let reader = BufReader::new(File::open(&self.path)?);
        let mut lines = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            lines.push(serde_json::from_str(&line)?);
        }
        Ok(lines)
    }
}

#[async_trait]
impl LedgerAnchor for JournalAnchor {
    fn network(&self) -> &str {
        JOURNAL_NETWORK
    }

    async fn anchor(&self, hash: &str, metadata: serde_json::Value) -> DispatchResult<AnchorReceipt> {
        let state = Arc::clone(&self.state);
        let hash = hash.to_string();
        let reference = tokio::task::spawn_blocking(move || {
            let mut state = state
                .lock()
                .map_err(|_| DispatchError::AnchorFailed("journal lock poisoned".into()))?;
            state.append(hash, metadata)
        })
        .await
        .map_err(|e| DispatchError::AnchorFailed(format!("journal writer stopped: {}", e)))??;
        Ok(AnchorReceipt::anchored(reference, JOURNAL_NETWORK))
    }
}
