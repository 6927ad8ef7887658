//! Key stores for delegate identities.
//!
//! Identities are keyed by user address and network, so switching networks
//! or users never reuses a delegate key.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use alloy::primitives::Address;
use parking_lot::RwLock;
use tracing::{debug, info};
use updown_core::Network;

use crate::error::{AgentError, AgentResult};
use crate::identity::AgentIdentity;

/// Composite storage key: `agent:{user}:{network}`, user lowercased.
pub fn storage_key(user: Address, network: Network) -> String {
    format!("agent:0x{}:{}", hex::encode(user.as_slice()), network)
}

/// Pluggable persistence for delegate identities.
pub trait KeyStore: Send + Sync {
    fn get(&self, key: &str) -> AgentResult<Option<AgentIdentity>>;
    fn put(&self, key: &str, identity: &AgentIdentity) -> AgentResult<()>;
    fn delete(&self, key: &str) -> AgentResult<()>;
}

impl KeyStore for Box<dyn KeyStore> {
    fn get(&self, key: &str) -> AgentResult<Option<AgentIdentity>> {
        (**self).get(key)
    }

    fn put(&self, key: &str, identity: &AgentIdentity) -> AgentResult<()> {
        (**self).put(key, identity)
    }

    fn delete(&self, key: &str) -> AgentResult<()> {
        (**self).delete(key)
    }
}

/// In-memory store for tests and single-process use.
#[derive(Default)]
pub struct InMemoryKeyStore {
    entries: RwLock<HashMap<String, AgentIdentity>>,
}

impl InMemoryKeyStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyStore for InMemoryKeyStore {
    fn get(&self, key: &str) -> AgentResult<Option<AgentIdentity>> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn put(&self, key: &str, identity: &AgentIdentity) -> AgentResult<()> {
        self.entries
            .write()
            .insert(key.to_string(), identity.clone());
        Ok(())
    }

    fn delete(&self, key: &str) -> AgentResult<()> {
        self.entries.write().remove(key);
        Ok(())
    }
}

/// File-backed store: one JSON map per file, rewritten atomically on change.
///
/// Writes go to a sibling temp file first so an interrupted write never
/// truncates existing keys.
pub struct FileKeyStore {
    path: PathBuf,
    entries: RwLock<HashMap<String, AgentIdentity>>,
}

impl FileKeyStore {
    pub fn open(path: impl AsRef<Path>) -> AgentResult<Self> {
        let path = path.as_ref().to_path_buf();

        let entries = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            if content.trim().is_empty() {
                HashMap::new()
            } else {
                serde_json::from_str(&content)?
            }
        } else {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            HashMap::new()
        };

        info!(path = %path.display(), keys = entries.len(), "Opened key store");
        Ok(Self {
            path,
            entries: RwLock::new(entries),
        })
    }

    fn persist(&self, entries: &HashMap<String, AgentIdentity>) -> AgentResult<()> {
        let json = serde_json::to_string_pretty(entries)?;

        let tmp_path = self.path.with_extension("tmp");
        std::fs::write(&tmp_path, json)?;
        std::fs::rename(&tmp_path, &self.path)?;

        debug!(path = %self.path.display(), keys = entries.len(), "Persisted key store");
        Ok(())
    }
}

impl KeyStore for FileKeyStore {
    fn get(&self, key: &str) -> AgentResult<Option<AgentIdentity>> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn put(&self, key: &str, identity: &AgentIdentity) -> AgentResult<()> {
        let mut entries = self.entries.write();
        entries.insert(key.to_string(), identity.clone());
        self.persist(&entries)
            .map_err(|e| AgentError::Store(format!("failed to persist {key}: {e}")))
    }

    fn delete(&self, key: &str) -> AgentResult<()> {
        let mut entries = self.entries.write();
        if entries.remove(key).is_some() {
            self.persist(&entries)
                .map_err(|e| AgentError::Store(format!("failed to persist after delete: {e}")))?;
        }
        Ok(())
    }
}
