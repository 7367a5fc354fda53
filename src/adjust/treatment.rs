use std::collections::{BTreeMap, HashMap};

use tracing::{debug, info};

use crate::adjust::diagnosis::{
    death_months, DATE_OF_DIAGNOSIS, SUBMITTER_DONOR_ID, SUBMITTER_PRIMARY_DIAGNOSIS_ID,
};
use crate::config::PrepConfig;
use crate::data::Table;
use crate::interval::{month_of, shift_cell, Resolution};
use crate::rules::donor::DATE_OF_DEATH;

pub const TREATMENT_START_DATE: &str = "treatment_start_date";
pub const TREATMENT_END_DATE: &str = "treatment_end_date";

/// Corrected treatments together with the donor snapshot they imply.
/// Nothing is written back by [`adjust_treatments`]; the caller persists
/// both tables together.
#[derive(Debug, Clone)]
pub struct TreatmentAdjustment {
    pub treatments: Table,
    pub donors: Table,
    /// Months each donor's death date moved forward.
    pub death_shifts: BTreeMap<String, i64>,
    /// Treatment cells rewritten.
    pub changed: usize,
}

/// Bound treatment dates by the diagnosis they belong to and by the donor's
/// death. The checks run in a fixed order, each on the month values left by
/// the previous one:
///
/// 1. start before diagnosis: start moves to one month after diagnosis
/// 2. start after death: start moves back by half the overshoot
/// 3. end before start: end moves to one month after start
/// 4. end before diagnosis: end moves to six months after diagnosis
/// 5. end (or start, when there is no end) after death: the treatment stays,
///    and the donor's death moves to `death_extension_margin` months past
///    the latest such date
pub fn adjust_treatments(
    treatments: &Table,
    diagnoses: &Table,
    donors: &Table,
    config: &PrepConfig,
) -> TreatmentAdjustment {
    let mut result = TreatmentAdjustment {
        treatments: treatments.clone(),
        donors: donors.clone(),
        death_shifts: BTreeMap::new(),
        changed: 0,
    };

    let table = &mut result.treatments;
    let (Some(donor_col), Some(start_col), Some(end_col)) = (
        table.column(SUBMITTER_DONOR_ID),
        table.column(TREATMENT_START_DATE),
        table.column(TREATMENT_END_DATE),
    ) else {
        debug!("treatment table lacks donor or date columns, nothing to bound");
        return result;
    };
    let pd_col = table.column(SUBMITTER_PRIMARY_DIAGNOSIS_ID);

    let diagnosis_months = diagnosis_months(diagnoses);
    let deaths = death_months(donors);
    let mut overshoot: HashMap<String, i64> = HashMap::new();

    for row in 0..table.len() {
        let donor = table.get(row, donor_col).to_string();
        let diagnosis = pd_col.and_then(|c| diagnosis_months.get(table.get(row, c)).copied());
        let death = deaths.get(&donor).copied();
        let mut start = month_of(table.get(row, start_col));
        let mut end = month_of(table.get(row, end_col));

        // 1
        if let (Some(d), Some(s)) = (diagnosis, start) {
            if d - s > 0 {
                start = shift_month(table, row, start_col, d - s + 1);
            }
        }
        // 2
        if let (Some(x), Some(s)) = (death, start) {
            if x - s < 0 {
                let half = (s - x + 1) / 2;
                start = shift_month(table, row, start_col, -half);
            }
        }
        // 3
        if let (Some(s), Some(e)) = (start, end) {
            if s - e > 0 {
                end = shift_month(table, row, end_col, s - e + 1);
            }
        }
        // 4
        if let (Some(d), Some(e)) = (diagnosis, end) {
            if d - e > 0 {
                end = shift_month(table, row, end_col, d - e + 6);
            }
        }
        // 5, a treatment without an end date is bounded by its start
        if let (Some(e), Some(x)) = (end.or(start), death) {
            if e - x > 0 {
                let worst = overshoot.entry(donor).or_insert(0);
                *worst = (*worst).max(e - x);
            }
        }
    }
    result.changed = count_changes(treatments, &result.treatments);

    if !overshoot.is_empty() {
        extend_deaths(&mut result, overshoot, config);
    }
    result
}

/// Shift one interval cell by `months` and return the new month value.
fn shift_month(table: &mut Table, row: usize, col: usize, months: i64) -> Option<i64> {
    let shifted = shift_cell(table.get(row, col), months, Resolution::Month);
    table.set(row, col, shifted);
    month_of(table.get(row, col))
}

fn diagnosis_months(diagnoses: &Table) -> HashMap<String, i64> {
    let (Some(id_col), Some(date_col)) = (
        diagnoses.column(SUBMITTER_PRIMARY_DIAGNOSIS_ID),
        diagnoses.column(DATE_OF_DIAGNOSIS),
    ) else {
        return HashMap::new();
    };
    diagnoses
        .rows
        .iter()
        .filter_map(|row| month_of(&row[date_col]).map(|m| (row[id_col].clone(), m)))
        .collect()
}

fn extend_deaths(result: &mut TreatmentAdjustment, overshoot: HashMap<String, i64>, config: &PrepConfig) {
    let donors = &mut result.donors;
    let (Some(id_col), Some(death_col)) = (donors.column(SUBMITTER_DONOR_ID), donors.column(DATE_OF_DEATH))
    else {
        return;
    };
    for row in 0..donors.len() {
        let Some(worst) = overshoot.get(donors.get(row, id_col)).copied() else {
            continue;
        };
        let months = worst + config.death_extension_margin;
        let shifted = shift_cell(donors.get(row, death_col), months, Resolution::Month);
        if donors.set(row, death_col, shifted) {
            info!(
                "death of {} moved {} months to cover its treatments",
                donors.get(row, id_col),
                months
            );
            result.death_shifts.insert(donors.get(row, id_col).to_string(), months);
        }
    }
}

fn count_changes(before: &Table, after: &Table) -> usize {
    before
        .rows
        .iter()
        .zip(after.rows.iter())
        .map(|(a, b)| a.iter().zip(b.iter()).filter(|(x, y)| x != y).count())
        .sum()
}
