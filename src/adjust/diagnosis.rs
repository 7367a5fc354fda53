use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::config::PrepConfig;
use crate::data::Table;
use crate::interval::{month_of, DateInterval, Resolution};
use crate::rules::donor::DATE_OF_DEATH;

pub const SUBMITTER_DONOR_ID: &str = "submitter_donor_id";
pub const SUBMITTER_PRIMARY_DIAGNOSIS_ID: &str = "submitter_primary_diagnosis_id";
pub const DATE_OF_DIAGNOSIS: &str = "date_of_diagnosis";

/// For every row, whether it is the first diagnosis seen for its donor.
fn anchor_rows(table: &Table, donor_col: usize) -> Vec<bool> {
    let mut seen: HashSet<&str> = HashSet::new();
    table
        .rows
        .iter()
        .map(|row| seen.insert(row[donor_col].as_str()))
        .collect()
}

/// Pin each donor's first diagnosis to the zero interval. The null
/// sentinel donor gets no diagnosis date at all, and later diagnoses that
/// also sit at zero move one month on so the anchor stays unique.
pub fn anchor_diagnoses(diagnoses: &mut Table, config: &PrepConfig) -> usize {
    let (Some(donor_col), Some(date_col)) = (
        diagnoses.column(SUBMITTER_DONOR_ID),
        diagnoses.column(DATE_OF_DIAGNOSIS),
    ) else {
        debug!("diagnosis table lacks donor or date column, not anchoring");
        return 0;
    };

    let anchors = anchor_rows(diagnoses, donor_col);
    let zero = DateInterval::ZERO.to_cell();
    let mut changed = 0;
    for (row, is_anchor) in anchors.into_iter().enumerate() {
        if diagnoses.get(row, donor_col) == config.null_sentinel_donor {
            changed += diagnoses.clear(row, date_col) as usize;
        } else if is_anchor {
            changed += diagnoses.set(row, date_col, zero.clone()) as usize;
        } else if let Some(date) = DateInterval::parse(diagnoses.get(row, date_col)) {
            if date.is_zero() {
                changed += diagnoses.set(row, date_col, date.shift(1, Resolution::Month).to_cell()) as usize;
            }
        }
    }
    changed
}

/// Month of death per donor, for donors with a readable death date.
pub fn death_months(donors: &Table) -> HashMap<String, i64> {
    let (Some(id_col), Some(death_col)) = (donors.column(SUBMITTER_DONOR_ID), donors.column(DATE_OF_DEATH))
    else {
        return HashMap::new();
    };
    donors
        .rows
        .iter()
        .filter_map(|row| month_of(&row[death_col]).map(|m| (row[id_col].clone(), m)))
        .collect()
}

/// Move diagnoses that fall after the donor's death back to
/// `diagnosis_death_margin` months before it.
pub fn bound_diagnoses(diagnoses: &mut Table, donors: &Table, config: &PrepConfig) -> usize {
    let (Some(donor_col), Some(date_col)) = (
        diagnoses.column(SUBMITTER_DONOR_ID),
        diagnoses.column(DATE_OF_DIAGNOSIS),
    ) else {
        return 0;
    };

    let deaths = death_months(donors);
    let anchors = anchor_rows(diagnoses, donor_col);
    let mut changed = 0;
    for (row, is_anchor) in anchors.into_iter().enumerate() {
        let Some(death) = deaths.get(diagnoses.get(row, donor_col)).copied() else {
            continue;
        };
        let Some(date) = DateInterval::parse(diagnoses.get(row, date_col)) else {
            continue;
        };
        let month_diff = death - date.month_interval;
        if month_diff >= 0 {
            continue;
        }
        let mut bounded = date.shift(month_diff - config.diagnosis_death_margin, Resolution::Month);
        if !is_anchor && bounded.is_zero() {
            bounded = bounded.shift(1, Resolution::Month);
        }
        debug!(
            "diagnosis of {} moved from month {} to {}",
            diagnoses.get(row, donor_col),
            date.month_interval,
            bounded.month_interval
        );
        changed += diagnoses.set(row, date_col, bounded.to_cell()) as usize;
    }
    changed
}
