use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PrepError;

/// Record types produced by the synthetic data generator. One table per
/// variant, named after the variant (`Donor.csv`, `Donor.json`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EntityType {
    Program,
    Donor,
    PrimaryDiagnosis,
    Specimen,
    SampleRegistration,
    Treatment,
    Chemotherapy,
    HormoneTherapy,
    Immunotherapy,
    Radiation,
    Surgery,
    FollowUp,
    Biomarker,
    Comorbidity,
    Exposure,
}

impl EntityType {
    pub const ALL: [EntityType; 15] = [
        EntityType::Program,
        EntityType::Donor,
        EntityType::PrimaryDiagnosis,
        EntityType::Specimen,
        EntityType::SampleRegistration,
        EntityType::Treatment,
        EntityType::Chemotherapy,
        EntityType::HormoneTherapy,
        EntityType::Immunotherapy,
        EntityType::Radiation,
        EntityType::Surgery,
        EntityType::FollowUp,
        EntityType::Biomarker,
        EntityType::Comorbidity,
        EntityType::Exposure,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Program => "Program",
            EntityType::Donor => "Donor",
            EntityType::PrimaryDiagnosis => "PrimaryDiagnosis",
            EntityType::Specimen => "Specimen",
            EntityType::SampleRegistration => "SampleRegistration",
            EntityType::Treatment => "Treatment",
            EntityType::Chemotherapy => "Chemotherapy",
            EntityType::HormoneTherapy => "HormoneTherapy",
            EntityType::Immunotherapy => "Immunotherapy",
            EntityType::Radiation => "Radiation",
            EntityType::Surgery => "Surgery",
            EntityType::FollowUp => "FollowUp",
            EntityType::Biomarker => "Biomarker",
            EntityType::Comorbidity => "Comorbidity",
            EntityType::Exposure => "Exposure",
        }
    }

    /// Entity named by a file stem, e.g. `data/Treatment.csv`.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, PrepError> {
        let path = path.as_ref();
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| PrepError::UnknownEntity(path.display().to_string()))?;
        stem.parse()
    }

    pub fn file_name(&self, extension: &str) -> String {
        format!("{}.{}", self.as_str(), extension)
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityType {
    type Err = PrepError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EntityType::ALL
            .iter()
            .copied()
            .find(|e| e.as_str() == s)
            .ok_or_else(|| PrepError::UnknownEntity(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_path() {
        assert_eq!(EntityType::from_path("x/Donor.csv").unwrap(), EntityType::Donor);
        assert_eq!(
            EntityType::from_path("PrimaryDiagnosis.json").unwrap(),
            EntityType::PrimaryDiagnosis
        );
        assert!(EntityType::from_path("manifest.yml").is_err());
    }

    #[test]
    fn test_names_round_trip() {
        for entity in EntityType::ALL {
            assert_eq!(entity.as_str().parse::<EntityType>().unwrap(), entity);
        }
        assert_eq!(EntityType::FollowUp.file_name("csv"), "FollowUp.csv");
    }
}
