use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use log::{error, info};
use rusqlite::{Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

use crate::error::{RescoreError, Result};

/// A case document as stored by the case database
///
/// Only the fields needed to build a pedigree and run data are typed, everything else in the
/// document is ignored.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CaseDocument {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub individuals: Vec<CaseIndividual>,
    pub vcf_files: VcfFiles,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CaseIndividual {
    pub individual_id: String,
    #[serde(default = "no_parent")]
    pub mother: String,
    #[serde(default = "no_parent")]
    pub father: String,
    /// raw label, e.g. "male" or "."
    #[serde(default)]
    pub sex: String,
    #[serde(default)]
    pub phenotype: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VcfFiles {
    pub vcf_snv: String,
    pub vcf_sv: String,
    pub vcf_str: String,
}

fn no_parent() -> String {
    "0".to_string()
}

/// Read-only access to case documents
pub trait CaseRepository: Send + Sync {
    /// Fetch a case document, `None` if no case has this id
    fn find_case(&self, case_id: &str) -> Result<Option<CaseDocument>>;
}

/// Fetch a case or fail with [`RescoreError::CaseNotFound`]
pub fn query_case(cases: &dyn CaseRepository, case_id: &str) -> Result<CaseDocument> {
    info!("Querying db for case: {case_id}");
    match cases.find_case(case_id)? {
        Some(case) => Ok(case),
        None => {
            let err = RescoreError::CaseNotFound(case_id.to_string());
            error!("{err}");
            Err(err)
        }
    }
}

/// Case documents stored as JSON text in the `case` table
pub struct SqliteCaseRepository {
    conn: Mutex<Connection>,
}

impl SqliteCaseRepository {
    pub fn new(conn: Connection) -> Self {
        SqliteCaseRepository { conn: Mutex::new(conn) }
    }
}

impl CaseRepository for SqliteCaseRepository {
    fn find_case(&self, case_id: &str) -> Result<Option<CaseDocument>> {
        let conn = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        let document: Option<String> = conn
            .query_row(
                "SELECT document FROM \"case\" WHERE id = (?1)",
                [case_id],
                |row| row.get(0),
            )
            .optional()?;

        document
            .map(|json| {
                serde_json::from_str::<CaseDocument>(&json).map_err(|source| {
                    RescoreError::MalformedCase { case_id: case_id.to_string(), source }
                })
            })
            .transpose()
    }
}

/// Cases held in a map, nothing touches disk
#[derive(Debug, Default)]
pub struct MemoryCaseRepository {
    cases: HashMap<String, CaseDocument>,
}

impl MemoryCaseRepository {
    pub fn new(cases: impl IntoIterator<Item = CaseDocument>) -> Self {
        MemoryCaseRepository {
            cases: cases.into_iter().map(|case| (case.id.clone(), case)).collect(),
        }
    }
}

impl CaseRepository for MemoryCaseRepository {
    fn find_case(&self, case_id: &str) -> Result<Option<CaseDocument>> {
        Ok(self.cases.get(case_id).cloned())
    }
}
