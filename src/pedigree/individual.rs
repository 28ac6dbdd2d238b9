use std::fmt;

use serde::{Serialize, Serializer};

use crate::error::RescoreError;

/// Parent id written when a parent isn't part of the pedigree
pub const NO_PARENT: &str = "0";

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Sex {
    Unknown,
    Male,
    Female,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Phenotype {
    Unknown,
    Unaffected,
    Affected,
}

impl Sex {
    /// Translate a case database label, unrecognised labels are unknown
    pub fn from_label(label: &str) -> Sex {
        match label {
            "male" => Sex::Male,
            "female" => Sex::Female,
            _ => Sex::Unknown,
        }
    }

    pub fn code(&self) -> u8 {
        match self {
            Sex::Unknown => 0,
            Sex::Male => 1,
            Sex::Female => 2,
        }
    }
}

impl Phenotype {
    /// Translate a case database label, unrecognised labels are unknown
    pub fn from_label(label: &str) -> Phenotype {
        match label {
            "unaffected" => Phenotype::Unaffected,
            "affected" => Phenotype::Affected,
            _ => Phenotype::Unknown,
        }
    }

    pub fn code(&self) -> u8 {
        match self {
            Phenotype::Unknown => 0,
            Phenotype::Unaffected => 1,
            Phenotype::Affected => 2,
        }
    }
}

impl TryFrom<i64> for Sex {
    type Error = RescoreError;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Sex::Unknown),
            1 => Ok(Sex::Male),
            2 => Ok(Sex::Female),
            _ => Err(RescoreError::Validation(format!("sex must be either of 0, 1 and 2, got {code}"))),
        }
    }
}

impl TryFrom<i64> for Phenotype {
    type Error = RescoreError;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Phenotype::Unknown),
            1 => Ok(Phenotype::Unaffected),
            2 => Ok(Phenotype::Affected),
            _ => Err(RescoreError::Validation(format!("phenotype must be either of 0, 1 and 2, got {code}"))),
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl fmt::Display for Phenotype {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl Serialize for Sex {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.code())
    }
}

impl Serialize for Phenotype {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.code())
    }
}

/// One member of a pedigree
///
/// Fields are private so an individual can't change after it's been added to a family. Sex and
/// phenotype are typed, so out of range codes are rejected before an individual exists.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Individual {
    family_id: String,
    id: String,
    #[serde(serialize_with = "parent_id")]
    mother: String,
    #[serde(serialize_with = "parent_id")]
    father: String,
    sex: Sex,
    phenotype: Phenotype,
}

impl Individual {
    pub fn new(
        id: impl Into<String>,
        family_id: impl Into<String>,
        mother: impl Into<String>,
        father: impl Into<String>,
        sex: Sex,
        phenotype: Phenotype,
    ) -> Individual {
        Individual {
            id: id.into(),
            family_id: family_id.into(),
            mother: mother.into(),
            father: father.into(),
            sex,
            phenotype,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn family_id(&self) -> &str {
        &self.family_id
    }

    pub fn mother(&self) -> &str {
        &self.mother
    }

    pub fn father(&self) -> &str {
        &self.father
    }

    pub fn sex(&self) -> Sex {
        self.sex
    }

    pub fn phenotype(&self) -> Phenotype {
        self.phenotype
    }
}

/// A missing parent is the number 0 in JSON, known parents are their id
fn parent_id<S: Serializer>(parent: &str, serializer: S) -> Result<S::Ok, S::Error> {
    match parent {
        NO_PARENT => serializer.serialize_u8(0),
        id => serializer.serialize_str(id),
    }
}
