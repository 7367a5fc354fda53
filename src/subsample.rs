//! Cut a large dataset down to a random donor cohort.

use std::collections::HashSet;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::{info, warn};

use crate::adjust::diagnosis::SUBMITTER_DONOR_ID;
use crate::data::{Dataset, EntityType};
use crate::error::Result;

/// Which donors to keep.
#[derive(Debug, Clone)]
pub struct CohortRequest {
    pub donors: usize,
    pub seed: u64,
    /// Always kept, on top of the `donors` random picks.
    pub keep: Vec<String>,
}

/// Pick the cohort: every `keep` donor present plus up to `donors` more.
pub fn select_donors(dataset: &Dataset, request: &CohortRequest) -> Result<HashSet<String>> {
    let donors = dataset.require(EntityType::Donor)?;
    let ids: Vec<String> = donors
        .column_values(SUBMITTER_DONOR_ID)
        .unwrap_or_default()
        .into_iter()
        .filter(|id| !id.is_empty())
        .map(|id| id.to_string())
        .collect();

    let mut selected: HashSet<String> = request
        .keep
        .iter()
        .filter(|id| ids.contains(*id))
        .cloned()
        .collect();
    for id in &request.keep {
        if !selected.contains(id) {
            warn!("donor {} asked to be kept but not in the donor table", id);
        }
    }

    let mut candidates: Vec<&String> = ids.iter().filter(|id| !selected.contains(*id)).collect();
    let mut rng = StdRng::seed_from_u64(request.seed);
    candidates.shuffle(&mut rng);

    let wanted = request.donors.min(candidates.len());
    if wanted < request.donors {
        warn!("only {} donors available, asked for {}", candidates.len(), request.donors);
    }
    selected.extend(candidates.into_iter().take(wanted).cloned());
    Ok(selected)
}

/// Keep only rows that belong to the selected donors. Tables without a
/// donor column are copied whole.
pub fn subsample(dataset: &Dataset, request: &CohortRequest) -> Result<Dataset> {
    let cohort = select_donors(dataset, request)?;
    let mut out = Dataset::default();
    for (entity, table) in &dataset.tables {
        let mut table = table.clone();
        if let Some(col) = table.column(SUBMITTER_DONOR_ID) {
            let before = table.len();
            table.retain_rows(|row| cohort.contains(&row[col]));
            info!("{}: kept {} of {} rows", entity, table.len(), before);
        }
        out.insert(*entity, table);
    }
    Ok(out)
}
