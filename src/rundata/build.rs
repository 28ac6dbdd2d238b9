use std::io::Write;

use log::info;
use serde::Serialize;

use crate::db::case::{query_case, CaseRepository};
use crate::error::Result;
use crate::rundata::assay::Assay;

/// One row of run data, column order is the CSV column order
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RunData {
    pub group: String,
    pub assay: Assay,
    pub vcf_snv: String,
    pub vcf_sv: String,
    pub vcf_str: String,
}

/// Describe the files of a case for the rescore pipeline
pub fn build_run_data(cases: &dyn CaseRepository, case_id: &str, diagnostic_mode: bool) -> Result<Vec<RunData>> {
    let case = query_case(cases, case_id)?;
    let vcf = case.vcf_files;

    Ok(vec![RunData {
        group: case_id.to_string(),
        assay: Assay::for_mode(diagnostic_mode),
        vcf_snv: vcf.vcf_snv,
        vcf_sv: vcf.vcf_sv,
        vcf_str: vcf.vcf_str,
    }])
}

/// Write run data as CSV with a header row
pub fn write_run_data<W: Write>(output: W, run_data: &[RunData]) -> Result<()> {
    info!("Writing {} run data rows", run_data.len());
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::CRLF)
        .from_writer(output);
    for row in run_data {
        writer.serialize(row)?;
    }
    writer.flush()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::case::tests::example_repository;
    use crate::error::RescoreError;

    #[test]
    fn test_create_rundata() {
        let cases = example_repository();
        let rows = build_run_data(&cases, "9075-18", true).unwrap();
        assert_eq!(rows.len(), 1);

        let row = &rows[0];
        assert_eq!(row.group, "9075-18");
        assert_eq!(row.vcf_snv, "/data/9075-18/9075-18.snv.vcf.gz");
        assert_eq!(row.vcf_sv, "/data/9075-18/9075-18.sv.vcf.gz");
        assert_eq!(row.vcf_str, "/data/9075-18/9075-18.str.vcf.gz");
    }

    #[test]
    fn test_assay_definition() {
        let cases = example_repository();
        assert_eq!(build_run_data(&cases, "9075-18", true).unwrap()[0].assay, Assay::RescoreDry);
        assert_eq!(build_run_data(&cases, "9075-18", false).unwrap()[0].assay, Assay::Rescore);
    }

    #[test]
    fn test_case_not_found() {
        let cases = example_repository();
        let err = build_run_data(&cases, "missing", false).unwrap_err();
        assert!(matches!(err, RescoreError::CaseNotFound(_)));
    }

    #[test]
    fn test_write_run_data() {
        let cases = example_repository();
        let rows = build_run_data(&cases, "9075-18", true).unwrap();
        let mut out: Vec<u8> = Vec::new();
        write_run_data(&mut out, &rows).unwrap();

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "group,assay,vcf_snv,vcf_sv,vcf_str");
        assert_eq!(
            lines[1],
            "9075-18,rescore-dry,/data/9075-18/9075-18.snv.vcf.gz,/data/9075-18/9075-18.sv.vcf.gz,/data/9075-18/9075-18.str.vcf.gz"
        );
        assert_eq!(lines.len(), 2);
        assert!(text.starts_with("group,assay,vcf_snv,vcf_sv,vcf_str\r\n"));
        assert!(text.ends_with(".str.vcf.gz\r\n"));
    }
}
