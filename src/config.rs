use std::{env, fmt, fs};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use log::info;
use serde::Deserialize;

/// Service configuration
///
/// Everything except secrets is read from a TOML file. Secrets come from the environment (or a
/// `.env` file loaded at startup) so they don't end up in a config file.
#[derive(Debug, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub workflow: WorkflowConfig,
    #[serde(default)]
    pub api: ApiConfig,
    /// launch the pipeline in dry run mode
    #[serde(default)]
    pub diagnostic_mode: bool,
    #[serde(skip)]
    pub secrets: Secrets,
}

#[derive(Debug, Deserialize)]
pub struct DatabaseConfig {
    pub path: PathBuf,
    /// how long to wait for a locked database
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl DatabaseConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

fn default_timeout_ms() -> u64 {
    60
}

/// Where and how the rescore pipeline is launched
#[derive(Clone, Debug, Deserialize)]
pub struct WorkflowConfig {
    pub host: String,
    pub user: String,
    #[serde(default)]
    pub port: Option<u16>,
    /// remote directory that receives run data and pedigree files
    pub data_dir: PathBuf,
    /// remote script started with the run data path as its only argument
    pub exec_script: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ApiConfig {
    #[serde(default)]
    pub authorized_users: Vec<String>,
}

#[derive(Clone, Default)]
pub struct Secrets {
    pub ssh_key_filename: Option<PathBuf>,
    pub ssh_passphrase: Option<String>,
    pub api_secret_key: String,
}

impl fmt::Debug for Secrets {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Secrets")
            .field("ssh_key_filename", &self.ssh_key_filename)
            .field("ssh_passphrase", &self.ssh_passphrase.as_ref().map(|_| "***"))
            .field("api_secret_key", &"***")
            .finish()
    }
}

impl Secrets {
    /// Read `SSH_KEY_FILENAME`, `SSH_PASSPHRASE` and `API_SECRET_KEY`
    pub fn from_env() -> Secrets {
        Secrets {
            ssh_key_filename: non_empty_var("SSH_KEY_FILENAME").map(PathBuf::from),
            ssh_passphrase: non_empty_var("SSH_PASSPHRASE"),
            api_secret_key: non_empty_var("API_SECRET_KEY").unwrap_or_default(),
        }
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.is_empty())
}

impl Config {
    pub fn load(path: &Path) -> Result<Config> {
        info!("Load configurations from file: {}", path.display());
        let toml_string = fs::read_to_string(path)
            .with_context(|| format!("Can't read config file {}", path.display()))?;

        info!("Load secrets from environment variables");
        Config::from_toml(&toml_string, Secrets::from_env())
    }

    pub fn from_toml(toml_string: &str, secrets: Secrets) -> Result<Config> {
        let mut config: Config = toml::from_str(toml_string).context("Invalid config file")?;
        config.secrets = secrets;
        config.validate()?;

        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if !self.workflow.data_dir.is_absolute() {
            bail!("workflow.data_dir must be an absolute path, got {}", self.workflow.data_dir.display());
        }
        if self.workflow.exec_script.trim().is_empty() {
            bail!("workflow.exec_script can't be empty");
        }
        Ok(())
    }

    /// No request can authenticate against an empty secret, so the API refuses to start
    pub fn require_api_secret(&self) -> Result<()> {
        if self.secrets.api_secret_key.is_empty() {
            bail!("API_SECRET_KEY must be set to serve the API");
        }
        Ok(())
    }
}
