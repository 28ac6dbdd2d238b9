use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use log::info;
use rusqlite::Connection;

use crate::db::case::CaseDocument;

/// Load a case document from a JSON file into the database
///
/// The document is checked against the case shape before insertion and stored verbatim, keyed on
/// its `_id`. Loading the same case again replaces the stored document.
pub fn ingest_case(conn: &Connection, path: &Path) -> Result<String> {
    info!("Reading case document {}", path.display());
    let json = fs::read_to_string(path)
        .with_context(|| format!("Can't read case document {}", path.display()))?;
    let case: CaseDocument = serde_json::from_str(&json)
        .with_context(|| format!("{} is not a valid case document", path.display()))?;

    info!("Adding case {} to db", &case.id);
    conn.execute(
        "INSERT INTO \"case\" (id, document) VALUES (?1, ?2)
         ON CONFLICT(id) DO UPDATE SET document = excluded.document, loaded_at = CURRENT_TIMESTAMP",
        (&case.id, &json),
    )?;

    Ok(case.id)
}
