//! Date interval consistency across donors, diagnoses and treatments.

pub mod diagnosis;
pub mod treatment;

use std::fmt;

use tracing::info;

use crate::config::PrepConfig;
use crate::data::{Dataset, EntityType};
use crate::error::Result;

pub use diagnosis::{anchor_diagnoses, bound_diagnoses};
pub use treatment::{adjust_treatments, TreatmentAdjustment};

/// Cell counts touched by one [`adjust_dataset`] run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdjustSummary {
    pub anchored: usize,
    pub bounded_diagnoses: usize,
    pub bounded_treatments: usize,
    pub extended_deaths: usize,
}

impl AdjustSummary {
    pub fn is_noop(&self) -> bool {
        *self == AdjustSummary::default()
    }
}

impl fmt::Display for AdjustSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Interval adjustment:")?;
        writeln!(f, "  diagnoses anchored:  {}", self.anchored)?;
        writeln!(f, "  diagnoses bounded:   {}", self.bounded_diagnoses)?;
        writeln!(f, "  treatment cells:     {}", self.bounded_treatments)?;
        write!(f, "  death dates moved:   {}", self.extended_deaths)
    }
}

/// Anchor and bound diagnoses, then bound treatments and carry the implied
/// death date changes into the donor table. Donor and diagnosis tables are
/// required; a dataset without treatments stops after the diagnosis step.
pub fn adjust_dataset(dataset: &mut Dataset, config: &PrepConfig) -> Result<AdjustSummary> {
    let donors = dataset.require(EntityType::Donor)?.clone();
    dataset.require(EntityType::PrimaryDiagnosis)?;

    let mut summary = AdjustSummary::default();
    if let Some(diagnoses) = dataset.table_mut(EntityType::PrimaryDiagnosis) {
        summary.anchored = anchor_diagnoses(diagnoses, config);
        summary.bounded_diagnoses = bound_diagnoses(diagnoses, &donors, config);
    }

    let outcome = match (
        dataset.table(EntityType::Treatment),
        dataset.table(EntityType::PrimaryDiagnosis),
    ) {
        (Some(treatments), Some(diagnoses)) => Some(adjust_treatments(treatments, diagnoses, &donors, config)),
        _ => None,
    };

    if let Some(TreatmentAdjustment {
        treatments,
        donors,
        death_shifts,
        changed,
    }) = outcome
    {
        summary.bounded_treatments = changed;
        summary.extended_deaths = death_shifts.len();
        dataset.insert(EntityType::Treatment, treatments);
        dataset.insert(EntityType::Donor, donors);
    }

    info!(
        "adjusted intervals: {} anchored, {} diagnoses bounded, {} treatment cells, {} deaths moved",
        summary.anchored, summary.bounded_diagnoses, summary.bounded_treatments, summary.extended_deaths
    );
    Ok(summary)
}
