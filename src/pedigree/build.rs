use std::collections::{BTreeSet, HashMap, HashSet};

use log::{error, info, warn};
use serde::{Deserialize, Serialize};

use crate::db::case::{query_case, CaseIndividual, CaseRepository};
use crate::error::{RescoreError, Result};
use crate::pedigree::family::Family;
use crate::pedigree::individual::{Individual, Phenotype, Sex, NO_PARENT};

/// Corrected sex or phenotype for one sample
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct SampleEdit {
    pub sample_id: String,
    #[serde(default)]
    pub sex: Option<Code>,
    #[serde(default)]
    pub phenotype: Option<Code>,
}

/// A pedigree code sent by a client, `2`, `2.0` or `"2"`
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(untagged)]
pub enum Code {
    Number(i64),
    Float(f64),
    Text(String),
}

impl Code {
    fn value(&self) -> Result<i64> {
        match self {
            Code::Number(n) => Ok(*n),
            Code::Float(f) if f.fract() == 0.0 => Ok(*f as i64),
            Code::Float(f) => Err(RescoreError::Validation(format!("{f} is not a pedigree code"))),
            Code::Text(s) => s
                .trim()
                .parse::<i64>()
                .map_err(|_| RescoreError::Validation(format!("\"{s}\" is not a pedigree code"))),
        }
    }
}

/// Build a new pedigree for a subset of the samples in a case
///
/// Parents are only kept if they're part of the requested samples, everyone else gets a 0. Edits
/// replace the sex and phenotype derived from the case database. Individuals are added in the
/// order they appear in the case document, not the order they were requested in. An id listed
/// more than once keeps its first position but takes the data of its last entry.
pub fn build_pedigree(
    cases: &dyn CaseRepository,
    case_id: &str,
    sample_ids: &[String],
    edits: &[SampleEdit],
) -> Result<Family> {
    let case = query_case(cases, case_id)?;

    if sample_ids.is_empty() {
        warn!("No sample id specified to be included for case: {case_id}");
        return Err(RescoreError::NoSampleIds);
    }

    let edits: HashMap<&str, &SampleEdit> = edits.iter().map(|edit| (edit.sample_id.as_str(), edit)).collect();
    let requested: HashSet<&str> = sample_ids.iter().map(String::as_str).collect();

    let mut order: Vec<&str> = Vec::new();
    let mut latest: HashMap<&str, &CaseIndividual> = HashMap::new();
    for ind in case.individuals.iter().filter(|ind| requested.contains(ind.individual_id.as_str())) {
        let id = ind.individual_id.as_str();
        if latest.insert(id, ind).is_none() {
            order.push(id);
        }
    }
    let individuals: Vec<&CaseIndividual> = order.iter().filter_map(|id| latest.get(id).copied()).collect();

    let missing: BTreeSet<&str> = requested.iter().copied().filter(|id| !latest.contains_key(id)).collect();
    if !missing.is_empty() {
        let missing: Vec<String> = missing.into_iter().map(String::from).collect();
        error!("Missing individual ids: {}", missing.join(", "));
        return Err(RescoreError::IndividualIdNotFound(missing));
    }

    info!("Building pedigree for case {case_id} with {} individuals", individuals.len());
    let mut family = Family::new(case_id);
    for ind in individuals {
        let id = ind.individual_id.as_str();
        let mother = if latest.contains_key(ind.mother.as_str()) { ind.mother.as_str() } else { NO_PARENT };
        let father = if latest.contains_key(ind.father.as_str()) { ind.father.as_str() } else { NO_PARENT };

        let mut sex = Sex::from_label(&ind.sex);
        let mut phenotype = Phenotype::from_label(&ind.phenotype);
        if let Some(edit) = edits.get(id) {
            if let Some(code) = &edit.sex {
                sex = Sex::try_from(code.value()?)?;
            }
            if let Some(code) = &edit.phenotype {
                phenotype = Phenotype::try_from(code.value()?)?;
            }
        }

        family.add_individual(Individual::new(id, case_id, mother, father, sex, phenotype))?;
    }

    Ok(family)
}
