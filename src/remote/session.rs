use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use log::{debug, info, warn};

use crate::config::WorkflowConfig;
use crate::error::{RescoreError, Result};
use crate::remote::credentials::{ssh_agent_running, SshCredentials, ASKPASS_ENV};

/// Captured result of a remote command
///
/// A failed command is not an error at this level, callers look at `success` themselves.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

/// An open connection to the workflow host
///
/// Dropping a session closes the connection.
pub trait RemoteSession {
    fn host(&self) -> &str;

    /// Copy a local file into a remote directory, keeping its file name
    fn put(&mut self, local: &Path, remote_dir: &Path) -> Result<()>;

    fn run(&mut self, cmd: &str) -> Result<CommandOutput>;
}

/// Opens sessions to the workflow host
pub trait RemoteConnector: Send + Sync {
    /// `scratch` is a private directory that outlives the session, for sockets and logs
    fn connect(
        &self,
        target: &WorkflowConfig,
        credentials: &SshCredentials,
        scratch: &Path,
    ) -> Result<Box<dyn RemoteSession>>;

    fn agent_running(&self) -> bool {
        ssh_agent_running()
    }
}

/// Connector for the OpenSSH client binaries (`ssh` and `scp`)
#[derive(Debug, Default)]
pub struct OpenSsh;

impl RemoteConnector for OpenSsh {
    fn connect(
        &self,
        target: &WorkflowConfig,
        credentials: &SshCredentials,
        scratch: &Path,
    ) -> Result<Box<dyn RemoteSession>> {
        let session = SshSession::open(target, credentials, scratch)?;
        Ok(Box::new(session))
    }
}

/// An SSH control master, every transfer and command is multiplexed over its socket
pub struct SshSession {
    host: String,
    destination: String,
    port: Option<u16>,
    control_path: PathBuf,
}

impl SshSession {
    fn open(target: &WorkflowConfig, credentials: &SshCredentials, scratch: &Path) -> Result<SshSession> {
        let destination = format!("{}@{}", target.user, target.host);
        let control_path = scratch.join("ssh.ctl");
        let log_path = scratch.join("ssh.log");

        let mut ssh = Command::new("ssh");
        ssh.args(["-f", "-N", "-o", "ControlMaster=yes"])
            .arg("-o")
            .arg(control_option(&control_path))
            .arg("-E")
            .arg(&log_path);
        if let Some(port) = target.port {
            ssh.arg("-p").arg(port.to_string());
        }

        match credentials {
            SshCredentials::KeyFile { path, passphrase } => {
                ssh.args(["-o", "IdentitiesOnly=yes", "-i"]).arg(path);
                match passphrase {
                    Some(passphrase) => {
                        let askpass = std::env::current_exe().map_err(|err| {
                            RescoreError::RemoteConnection(format!("can't locate askpass helper: {err}"))
                        })?;
                        ssh.env("SSH_ASKPASS", askpass)
                            .env("SSH_ASKPASS_REQUIRE", "force")
                            .env(ASKPASS_ENV, passphrase);
                    }
                    None => {
                        ssh.args(["-o", "BatchMode=yes"]);
                    }
                }
            }
            SshCredentials::Agent => {
                ssh.args(["-o", "BatchMode=yes"]);
            }
        }
        ssh.arg(&destination);

        info!("Connecting to remote: {destination}");
        // the backgrounded master keeps any pipe open, so nothing is captured here
        let status = ssh
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|err| RescoreError::RemoteConnection(format!("can't start ssh: {err}")))?;

        if !status.success() {
            let log = fs::read_to_string(&log_path).unwrap_or_default();
            return Err(RescoreError::RemoteConnection(format!(
                "ssh to {destination} exited with {status}: {}",
                log.trim()
            )));
        }

        Ok(SshSession { host: target.host.clone(), destination, port: target.port, control_path })
    }

    fn ssh(&self) -> Command {
        control_command(&self.control_path, self.port)
    }
}

/// ssh over an existing control socket, ready for extra arguments
///
/// Never prompts: if the master is gone the command fails instead of authenticating again.
fn control_command(control_path: &Path, port: Option<u16>) -> Command {
    let mut ssh = Command::new("ssh");
    ssh.args(["-o", "BatchMode=yes", "-o"]).arg(control_option(control_path));
    if let Some(port) = port {
        ssh.arg("-p").arg(port.to_string());
    }
    ssh
}

fn control_option(control_path: &Path) -> OsString {
    let mut option = OsString::from("ControlPath=");
    option.push(control_path);
    option
}

impl RemoteSession for SshSession {
    fn host(&self) -> &str {
        &self.host
    }

    fn put(&mut self, local: &Path, remote_dir: &Path) -> Result<()> {
        let mut remote = OsString::from(format!("{}:", self.destination));
        remote.push(remote_dir);
        remote.push("/");

        let mut scp = Command::new("scp");
        scp.args(["-q", "-o", "BatchMode=yes", "-o"]).arg(control_option(&self.control_path));
        if let Some(port) = self.port {
            scp.arg("-P").arg(port.to_string());
        }
        scp.arg(local).arg(&remote).stdin(Stdio::null());

        debug!("SCP {} {}", local.display(), remote.to_string_lossy());
        let output = scp
            .output()
            .map_err(|err| RescoreError::RemoteTransfer(format!("can't start scp: {err}")))?;

        if !output.status.success() {
            return Err(RescoreError::RemoteTransfer(format!(
                "scp {} exited with {}: {}",
                local.display(),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(())
    }

    fn run(&mut self, cmd: &str) -> Result<CommandOutput> {
        let mut ssh = self.ssh();
        ssh.arg(&self.destination).arg(cmd).stdin(Stdio::null());

        let output = ssh
            .output()
            .map_err(|err| RescoreError::RemoteConnection(format!("can't start ssh: {err}")))?;

        Ok(CommandOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

impl Drop for SshSession {
    fn drop(&mut self) {
        let mut ssh = self.ssh();
        ssh.args(["-O", "exit"])
            .arg(&self.destination)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        match ssh.status() {
            Ok(status) if status.success() => info!("Closed connection to {}", &self.destination),
            Ok(status) => warn!("Closing connection to {} exited with {status}", &self.destination),
            Err(err) => warn!("Can't close connection to {}: {err}", &self.destination),
        }
    }
}
