use std::path::Path;

use log::{debug, error, info};

use crate::error::{RescoreError, Result};
use crate::remote::session::RemoteSession;

/// Start the rescore nextflow analysis for an uploaded run data file
///
/// The session reports a failed command instead of raising, so the exit status is checked here.
pub fn run_rescore(session: &mut dyn RemoteSession, exec_script: &str, run_data_path: &Path) -> Result<()> {
    let cmd = format!("{} {}", exec_script, run_data_path.display());
    info!("Executing cmd on {}: {cmd}", session.host());

    let resp = session.run(&cmd)?;
    let stdout = resp.stdout.trim().to_string();
    let stderr = resp.stderr.trim().to_string();
    debug!("Run output: {stdout}");

    if !resp.success {
        error!("Pipeline command failed on {}: {cmd}", session.host());
        return Err(RescoreError::PipelineExecution { cmd, stdout, stderr });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::remote::session::tests::{FakeSession, Recorded};
    use crate::remote::session::CommandOutput;

    #[test]
    fn test_runrescore() {
        let recorded = Arc::new(Mutex::new(Recorded::default()));
        let output = CommandOutput { success: true, stdout: "Mock result".to_string(), stderr: "Mock result".to_string() };
        let mut session = FakeSession::new(recorded.clone(), output);

        run_rescore(&mut session, "script_name.sh", Path::new("/some/path.csv")).unwrap();
        assert_eq!(recorded.lock().unwrap().commands, ["script_name.sh /some/path.csv"]);
    }

    #[test]
    fn test_failed_command() {
        let recorded = Arc::new(Mutex::new(Recorded::default()));
        let output = CommandOutput {
            success: false,
            stdout: "  partial output\n".to_string(),
            stderr: "disk full\n".to_string(),
        };
        let mut session = FakeSession::new(recorded, output);

        let err = run_rescore(&mut session, "script_name.sh", Path::new("/some/path.csv")).unwrap_err();
        match err {
            RescoreError::PipelineExecution { cmd, stdout, stderr } => {
                assert_eq!(cmd, "script_name.sh /some/path.csv");
                assert_eq!(stdout, "partial output");
                assert_eq!(stderr, "disk full");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }
}
