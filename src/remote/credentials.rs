use std::env;
use std::path::PathBuf;

use log::{error, info};

use crate::config::Secrets;
use crate::error::{RescoreError, Result};

/// Environment variable holding the passphrase when this binary runs as `SSH_ASKPASS`
pub const ASKPASS_ENV: &str = "RERUNNER_ASKPASS_PASSPHRASE";

#[derive(Clone, PartialEq, Eq)]
pub enum SshCredentials {
    KeyFile {
        path: PathBuf,
        passphrase: Option<String>,
    },
    Agent,
}

impl std::fmt::Debug for SshCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            SshCredentials::KeyFile { path, .. } => write!(f, "KeyFile({})", path.display()),
            SshCredentials::Agent => write!(f, "Agent"),
        }
    }
}

impl SshCredentials {
    /// A configured key file wins, otherwise a running SSH agent is required
    pub fn resolve(secrets: &Secrets, agent_running: bool) -> Result<SshCredentials> {
        match (&secrets.ssh_key_filename, agent_running) {
            (Some(path), _) => {
                info!("Using SSH key {}", path.display());
                Ok(SshCredentials::KeyFile {
                    path: path.clone(),
                    passphrase: secrets.ssh_passphrase.clone(),
                })
            }
            (None, true) => {
                info!("No SSH key configured, using SSH agent");
                Ok(SshCredentials::Agent)
            }
            (None, false) => {
                error!("No SSH key specified and SSH_AGENT_PID is not set");
                Err(RescoreError::MissingCredentials)
            }
        }
    }
}

pub fn ssh_agent_running() -> bool {
    env::var_os("SSH_AGENT_PID").is_some()
}

/// Passphrase to print when ssh started us as its askpass helper
pub fn askpass_passphrase() -> Option<String> {
    env::var(ASKPASS_ENV).ok()
}
