use crate::config::PrepConfig;
use crate::data::Table;

pub const PRIOR_MALIGNANCY: &str = "prior_malignancy";
pub const LATERALITY_OF_PRIOR_MALIGNANCY: &str = "laterality_of_prior_malignancy";
pub const TOBACCO_SMOKING_STATUS: &str = "tobacco_smoking_status";
pub const TOBACCO_TYPE: &str = "tobacco_type";
pub const PACK_YEARS_SMOKED: &str = "pack_years_smoked";

/// Laterality of a prior malignancy only makes sense when there was one.
pub fn process_comorbidities(table: &mut Table) -> usize {
    let (Some(prior), Some(laterality)) = (
        table.column(PRIOR_MALIGNANCY),
        table.column(LATERALITY_OF_PRIOR_MALIGNANCY),
    ) else {
        return 0;
    };

    let mut changed = 0;
    for row in 0..table.len() {
        if table.get(row, prior) != "Yes" {
            changed += table.clear(row, laterality) as usize;
        }
    }
    changed
}

/// Non-smokers carry neither a tobacco type nor pack years.
pub fn process_exposures(table: &mut Table, config: &PrepConfig) -> usize {
    let (Some(status), Some(tobacco_type)) = (
        table.column(TOBACCO_SMOKING_STATUS),
        table.column(TOBACCO_TYPE),
    ) else {
        return 0;
    };
    let pack_years = table.column(PACK_YEARS_SMOKED);

    let mut changed = 0;
    for row in 0..table.len() {
        if config.is_non_smoker(table.get(row, status)) {
            changed += table.clear(row, tobacco_type) as usize;
            if let Some(col) = pack_years {
                changed += table.clear(row, col) as usize;
            }
        }
    }
    changed
}
