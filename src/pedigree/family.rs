use std::io::Write;

use serde_json::{json, Value};

use crate::error::{RescoreError, Result};
use crate::pedigree::individual::Individual;

/// Header of a pedigree file
pub static PED_HEADER: [&str; 6] = [
    "#FamilyID",
    "IndividualID",
    "PaternalID",
    "MaternalID",
    "Sex",
    "Phenotype",
];

/// Family container, individuals keep the order they were added in
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Family {
    family_id: String,
    individuals: Vec<Individual>,
}

impl Family {
    pub fn new(family_id: impl Into<String>) -> Family {
        Family { family_id: family_id.into(), individuals: Vec::new() }
    }

    pub fn family_id(&self) -> &str {
        &self.family_id
    }

    pub fn individuals(&self) -> &[Individual] {
        &self.individuals
    }

    pub fn len(&self) -> usize {
        self.individuals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.individuals.is_empty()
    }

    /// Append an individual, which must belong to this family
    pub fn add_individual(&mut self, individual: Individual) -> Result<()> {
        if individual.family_id() != self.family_id {
            return Err(RescoreError::Validation(format!(
                "individual {} belongs to family {}, not {}",
                individual.id(),
                individual.family_id(),
                self.family_id
            )));
        }
        self.individuals.push(individual);
        Ok(())
    }

    /// Write a tab delimited pedigree file
    ///
    /// The column order matches what the rescore pipeline reads today: sample id in the first
    /// column, family id in the second, then mother before father. This doesn't line up with the
    /// header labels, but changing it means changing the pipeline's reader too.
    pub fn to_ped<W: Write>(&self, output: W, write_header: bool) -> Result<()> {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .terminator(csv::Terminator::CRLF)
            .has_headers(false)
            .from_writer(output);

        if write_header {
            writer.write_record(PED_HEADER)?;
        }
        for ind in &self.individuals {
            let sex = ind.sex().to_string();
            let phenotype = ind.phenotype().to_string();
            writer.write_record([
                ind.id(),
                ind.family_id(),
                ind.mother(),
                ind.father(),
                sex.as_str(),
                phenotype.as_str(),
            ])?;
        }
        writer.flush()?;

        Ok(())
    }

    /// Individuals as a list of JSON records, in family order
    pub fn to_json(&self) -> Value {
        json!(self.individuals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pedigree::individual::{Phenotype, Sex, NO_PARENT};

    fn trio() -> Family {
        let mut family = Family::new("9075-18");
        family
            .add_individual(Individual::new("9075-18", "9075-18", "2113-19", "2112-19", Sex::Male, Phenotype::Affected))
            .unwrap();
        family
            .add_individual(Individual::new("2112-19", "9075-18", NO_PARENT, NO_PARENT, Sex::Male, Phenotype::Unaffected))
            .unwrap();
        family
            .add_individual(Individual::new("2113-19", "9075-18", NO_PARENT, NO_PARENT, Sex::Female, Phenotype::Unaffected))
            .unwrap();
        family
    }

    #[test]
    fn test_to_ped_with_header() {
        let mut out: Vec<u8> = Vec::new();
        trio().to_ped(&mut out, true).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "#FamilyID\tIndividualID\tPaternalID\tMaternalID\tSex\tPhenotype");
        assert_eq!(lines[1], "9075-18\t9075-18\t2113-19\t2112-19\t1\t2");
        assert_eq!(lines[3], "2113-19\t9075-18\t0\t0\t2\t1");
    }

    #[test]
    fn test_to_ped_crlf_rows() {
        let mut out: Vec<u8> = Vec::new();
        trio().to_ped(&mut out, true).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("#FamilyID\tIndividualID\tPaternalID\tMaternalID\tSex\tPhenotype\r\n"));
        assert!(text.ends_with("2113-19\t9075-18\t0\t0\t2\t1\r\n"));
        assert_eq!(text.matches("\r\n").count(), 4);
    }

    #[test]
    fn test_to_ped_without_header() {
        let mut out: Vec<u8> = Vec::new();
        trio().to_ped(&mut out, false).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert_eq!(text.lines().count(), 3);
        assert!(!text.starts_with('#'));
        assert!(text.lines().all(|line| line.split('\t').count() == 6));
    }

    #[test]
    fn test_empty_family_header_only() {
        let mut out: Vec<u8> = Vec::new();
        Family::new("1").to_ped(&mut out, true).unwrap();
        assert_eq!(String::from_utf8(out).unwrap().lines().count(), 1);
    }

    #[test]
    fn test_to_json_order() {
        let json = trio().to_json();
        let ids: Vec<&str> = json
            .as_array()
            .unwrap()
            .iter()
            .map(|record| record["id"].as_str().unwrap())
            .collect();
        assert_eq!(ids, ["9075-18", "2112-19", "2113-19"]);
        assert_eq!(json[1]["mother"], 0);
        assert_eq!(json[0]["family_id"], "9075-18");
    }

    #[test]
    fn test_reject_other_family() {
        let mut family = Family::new("9075-18");
        let stranger = Individual::new("1", "other", NO_PARENT, NO_PARENT, Sex::Unknown, Phenotype::Unknown);
        assert!(matches!(family.add_individual(stranger), Err(RescoreError::Validation(_))));
        assert!(family.is_empty());
    }
}
