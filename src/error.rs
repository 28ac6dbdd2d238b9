use thiserror::Error;

/// Everything that can stop a reanalysis request
///
/// Builder and model errors travel unchanged up to the API layer, which decides what the caller
/// gets to see. Remote stdout/stderr and credential problems stay in the server log.
#[derive(Debug, Error)]
pub enum RescoreError {
    #[error("Case \"{0}\" not found in database")]
    CaseNotFound(String),
    #[error("Individual ids not found in case: {}", .0.join(", "))]
    IndividualIdNotFound(Vec<String>),
    #[error("No sample id was given, cannot be empty")]
    NoSampleIds,
    #[error("No SSH key specified and no SSH agent running")]
    MissingCredentials,
    #[error("Pipeline command failed: {cmd} (stdout: {stdout:?}, stderr: {stderr:?})")]
    PipelineExecution {
        cmd: String,
        stdout: String,
        stderr: String,
    },
    #[error("Invalid value: {0}")]
    Validation(String),
    #[error("Can't connect to remote host: {0}")]
    RemoteConnection(String),
    #[error("Can't transfer file to remote host: {0}")]
    RemoteTransfer(String),
    #[error("Case \"{case_id}\" has an unexpected document shape: {source}")]
    MalformedCase {
        case_id: String,
        source: serde_json::Error,
    },
    #[error(transparent)]
    Database(#[from] rusqlite::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
}

pub type Result<T, E = RescoreError> = std::result::Result<T, E>;
