use std::fmt;

use serde::Serialize;

/// Assay tag, selects the nextflow parameters used by the rescore pipeline
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub enum Assay {
    #[serde(rename = "rescore")]
    Rescore,
    #[serde(rename = "rescore-dry")]
    RescoreDry,
}

impl Assay {
    /// Diagnostic mode launches a dry run of the pipeline
    pub fn for_mode(diagnostic_mode: bool) -> Assay {
        match diagnostic_mode {
            true => Assay::RescoreDry,
            false => Assay::Rescore,
        }
    }
}

impl fmt::Display for Assay {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Assay::Rescore => write!(f, "rescore"),
            Assay::RescoreDry => write!(f, "rescore-dry"),
        }
    }
}
