//! Server configuration

use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use warroom_protocol::SessionId;

use crate::gateway::NewSession;
use crate::seed::InitialSeed;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind the server
    pub bind_address: SocketAddr,
    /// Maximum simultaneous connections across all sessions
    pub max_clients: usize,
    /// Transport tick in milliseconds
    pub tick_ms: u64,
    /// 64 hex characters shared with the login service. Unsecure when unset.
    pub private_key: Option<String>,
    /// Reject a second session for the same section and instructor
    pub unique_section_instructor: bool,
    /// Starting content for new and reset sessions
    pub seed: InitialSeed,
    /// Sessions created at start-up if missing
    pub sessions: Vec<BootstrapSession>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([0, 0, 0, 0], 7777)),
            max_clients: 64,
            tick_ms: 16,
            private_key: None,
            unique_section_instructor: true,
            seed: InitialSeed::default(),
            sessions: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BootstrapSession {
    #[serde(default)]
    pub id: Option<SessionId>,
    pub section: String,
    pub instructor: String,
    #[serde(default)]
    pub admin_password_hash: String,
    #[serde(default)]
    pub active: bool,
}

impl BootstrapSession {
    pub fn to_new_session(&self) -> NewSession {
        NewSession {
            id: self.id,
            section: self.section.clone(),
            instructor: self.instructor.clone(),
            admin_password_hash: self.admin_password_hash.clone(),
        }
    }
}

impl ServerConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;
        let config: Self = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))?;
        config
            .seed
            .validate()
            .with_context(|| format!("Invalid seed in {}", path.display()))?;
        Ok(config)
    }

    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms.max(1))
    }

    /// Decoded netcode private key, if one is configured.
    pub fn private_key_bytes(&self) -> Result<Option<[u8; 32]>> {
        let Some(hex) = self.private_key.as_deref() else {
            return Ok(None);
        };
        let hex = hex.trim();
        if hex.len() != 64 || !hex.is_ascii() {
            bail!("private_key must be 64 hex characters");
        }
        let mut key = [0u8; 32];
        for (i, byte) in key.iter_mut().enumerate() {
            let pair = &hex[i * 2..i * 2 + 2];
            *byte = u8::from_str_radix(pair, 16)
                .with_context(|| format!("private_key has a bad hex pair {pair:?}"))?;
        }
        Ok(Some(key))
    }
}
