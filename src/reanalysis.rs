//! Set up and start a reanalysis of a case
//!
//! A reanalysis writes a run data CSV and a pedigree file to a temporary directory, uploads both
//! to the workflow host and starts the rescore pipeline there. Nothing is retried: a failed step
//! ends the request and the temporary directory and SSH session are cleaned up on the way out.

use std::fs::File;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use log::info;

use crate::config::Config;
use crate::db::case::CaseRepository;
use crate::error::{RescoreError, Result};
use crate::pedigree::build::{build_pedigree, SampleEdit};
use crate::remote::credentials::SshCredentials;
use crate::remote::rescore::run_rescore;
use crate::remote::session::RemoteConnector;
use crate::rundata::build::{build_run_data, write_run_data};

pub struct Reanalysis<'a> {
    pub config: &'a Config,
    pub cases: &'a dyn CaseRepository,
    pub connector: &'a dyn RemoteConnector,
}

impl Reanalysis<'_> {
    pub fn conduct(&self, case_id: &str, sample_ids: &[String], edits: &[SampleEdit]) -> Result<()> {
        info!("Received request; case id: {case_id}; sample ids: {}", sample_ids.join(", "));
        let run_data = build_run_data(self.cases, case_id, self.config.diagnostic_mode)?;
        let pedigree = build_pedigree(self.cases, case_id, sample_ids, edits)?;

        check_file_stem(case_id)?;
        let tmp_dir = tempfile::Builder::new().prefix("rerunner-").tempdir()?;
        let base_fname = base_file_name(case_id, Local::now());

        let run_data_path = tmp_dir.path().join(format!("{base_fname}.csv"));
        info!("Writing run data to {}", run_data_path.display());
        write_run_data(File::create(&run_data_path)?, &run_data)?;

        let ped_path = tmp_dir.path().join(format!("{base_fname}.ped"));
        info!("Writing pedigree to {}", ped_path.display());
        pedigree.to_ped(File::create(&ped_path)?, false)?;

        let credentials = SshCredentials::resolve(&self.config.secrets, self.connector.agent_running())?;

        let workflow = &self.config.workflow;
        let mut session = self.connector.connect(workflow, &credentials, tmp_dir.path())?;
        session.put(&run_data_path, &workflow.data_dir)?;
        session.put(&ped_path, &workflow.data_dir)?;

        let remote_run_data = remote_path(&workflow.data_dir, &run_data_path)?;
        run_rescore(&mut *session, &workflow.exec_script, &remote_run_data)
    }
}

/// `{case_id}_{YYMMDD_HHMMSS}_rescore`, shared by the run data and pedigree files
pub fn base_file_name(case_id: &str, time: DateTime<Local>) -> String {
    format!("{case_id}_{}_rescore", time.format("%y%m%d_%H%M%S"))
}

/// Case ids end up in file names on both hosts and in the remote command line
fn check_file_stem(case_id: &str) -> Result<()> {
    let allowed = |c: char| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-');
    if case_id.is_empty() || case_id.starts_with('.') || !case_id.chars().all(allowed) {
        return Err(RescoreError::Validation(format!("\"{case_id}\" can't be used in a file name")));
    }
    Ok(())
}

fn remote_path(remote_dir: &Path, local: &Path) -> Result<PathBuf> {
    let name = local
        .file_name()
        .ok_or_else(|| RescoreError::Validation(format!("{} has no file name", local.display())))?;
    Ok(remote_dir.join(name))
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::config::tests::example_config;
    use crate::config::Secrets;
    use crate::db::case::tests::{example_case, example_repository};
    use crate::db::case::MemoryCaseRepository;
    use crate::remote::session::tests::FakeConnector;
    use crate::remote::session::CommandOutput;

    fn samples() -> Vec<String> {
        vec!["9075-18".to_string(), "2112-19".to_string()]
    }

    #[test]
    fn test_base_file_name() {
        let time = Local.with_ymd_and_hms(2021, 3, 4, 5, 6, 7).unwrap();
        assert_eq!(base_file_name("9075-18", time), "9075-18_210304_050607_rescore");
    }

    #[test]
    fn test_check_file_stem() {
        assert!(check_file_stem("9075-18").is_ok());
        assert!(check_file_stem("../9075-18").is_err());
        assert!(check_file_stem("a/b").is_err());
        assert!(check_file_stem("").is_err());
        assert!(check_file_stem("9075 18").is_err());
        assert!(check_file_stem("9075-18;reboot").is_err());
        assert!(check_file_stem("$(id)").is_err());
    }

    #[test]
    fn test_unsafe_case_id_never_reaches_host() {
        let config = example_config();
        let mut case = example_case();
        case.id = "9075-18 && rm -rf ~".to_string();
        let cases = MemoryCaseRepository::new([case]);
        let connector = FakeConnector::succeeding();
        let reanalysis = Reanalysis { config: &config, cases: &cases, connector: &connector };

        let err = reanalysis.conduct("9075-18 && rm -rf ~", &samples(), &[]).unwrap_err();
        assert!(matches!(err, RescoreError::Validation(_)));
        assert!(connector.recorded.lock().unwrap().connects.is_empty());
    }

    #[test]
    fn test_toggle_rerun_success() {
        let config = example_config();
        let cases = example_repository();
        let connector = FakeConnector::succeeding();
        let reanalysis = Reanalysis { config: &config, cases: &cases, connector: &connector };

        reanalysis.conduct("9075-18", &samples(), &[]).unwrap();

        let recorded = connector.recorded.lock().unwrap();
        assert_eq!(recorded.connects, ["user@worker.remote KeyFile(/path/to/ssh-keys)"]);

        // run data first, then the pedigree, both to the data directory
        assert_eq!(recorded.uploads.len(), 2);
        let (csv_dir, csv_name, csv) = &recorded.uploads[0];
        let (ped_dir, ped_name, ped) = &recorded.uploads[1];
        assert_eq!(csv_dir, &PathBuf::from("/data/dir"));
        assert_eq!(ped_dir, &PathBuf::from("/data/dir"));
        assert!(csv_name.starts_with("9075-18_") && csv_name.ends_with("_rescore.csv"));
        assert_eq!(ped_name.replace(".ped", ".csv"), *csv_name);
        assert!(csv.contains("rescore-dry"));
        assert_eq!(ped.lines().count(), 2);
        assert!(!ped.starts_with('#'));

        assert_eq!(
            recorded.commands,
            [format!("/opt/rescore/start_rescore.sh /data/dir/{csv_name}")]
        );
        assert_eq!(recorded.closed, 1);
        assert!(!recorded.scratch[0].exists());
    }

    #[test]
    fn test_toggle_rerun_ssh_key() {
        let mut config = example_config();
        config.secrets = Secrets { ssh_key_filename: None, ..config.secrets.clone() };
        let cases = example_repository();
        let connector = FakeConnector::succeeding();
        let reanalysis = Reanalysis { config: &config, cases: &cases, connector: &connector };

        let err = reanalysis.conduct("9075-18", &samples(), &[]).unwrap_err();
        assert!(matches!(err, RescoreError::MissingCredentials));
        assert!(connector.recorded.lock().unwrap().connects.is_empty());
    }

    #[test]
    fn test_agent_used_without_key() {
        let mut config = example_config();
        config.secrets = Secrets { ssh_key_filename: None, ..config.secrets.clone() };
        let cases = example_repository();
        let connector = FakeConnector { agent: true, ..FakeConnector::succeeding() };
        let reanalysis = Reanalysis { config: &config, cases: &cases, connector: &connector };

        reanalysis.conduct("9075-18", &samples(), &[]).unwrap();
        assert_eq!(connector.recorded.lock().unwrap().connects, ["user@worker.remote Agent"]);
    }

    #[test]
    fn test_builder_errors_before_connecting() {
        let config = example_config();
        let cases = example_repository();
        let connector = FakeConnector::succeeding();
        let reanalysis = Reanalysis { config: &config, cases: &cases, connector: &connector };

        let err = reanalysis.conduct("missing", &samples(), &[]).unwrap_err();
        assert!(matches!(err, RescoreError::CaseNotFound(_)));

        let err = reanalysis.conduct("9075-18", &["1234-56".to_string()], &[]).unwrap_err();
        assert!(matches!(err, RescoreError::IndividualIdNotFound(_)));

        assert!(connector.recorded.lock().unwrap().connects.is_empty());
    }

    #[test]
    fn test_pipeline_failure_closes_session() {
        let config = example_config();
        let cases = example_repository();
        let connector = FakeConnector::new(CommandOutput {
            success: false,
            stdout: "partial output".to_string(),
            stderr: "disk full".to_string(),
        });
        let reanalysis = Reanalysis { config: &config, cases: &cases, connector: &connector };

        let err = reanalysis.conduct("9075-18", &samples(), &[]).unwrap_err();
        assert!(matches!(err, RescoreError::PipelineExecution { .. }));

        let recorded = connector.recorded.lock().unwrap();
        assert_eq!(recorded.closed, 1);
        assert!(!recorded.scratch[0].exists());
    }
}
