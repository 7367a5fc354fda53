//! Conditional field rules that make generated rows satisfy the schema's
//! "only if" constraints. Each rule touches a table only when the columns it
//! reads are present.

pub mod donor;
pub mod history;
pub mod follow_up;

use tracing::{debug, info};

use crate::config::PrepConfig;
use crate::data::{Dataset, EntityType, Table};

/// Apply the rules registered for `entity` and return how many cells changed.
pub fn apply(entity: EntityType, table: &mut Table, config: &PrepConfig) -> usize {
    let changed = match entity {
        EntityType::Donor => donor::process_donors(table, config),
        EntityType::Comorbidity => history::process_comorbidities(table),
        EntityType::Exposure => history::process_exposures(table, config),
        EntityType::FollowUp => follow_up::process_follow_ups(table, &config.follow_up),
        _ => {
            debug!("no field rules for {}", entity);
            0
        }
    };
    if changed > 0 {
        info!("{}: {} cells rewritten by field rules", entity, changed);
    }
    changed
}

/// Run [`apply`] over every table of a dataset.
pub fn apply_all(dataset: &mut Dataset, config: &PrepConfig) -> usize {
    dataset
        .tables
        .iter_mut()
        .map(|(entity, table)| apply(*entity, table, config))
        .sum()
}

/// Reads a boolean cell the way the generator writes it. Blank or
/// unrecognised values are unknown.
pub fn parse_flag(cell: &str) -> Option<bool> {
    match cell.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

/// Clears `col` in `row` if the column exists. Returns 1 for a changed cell.
pub(crate) fn clear_if_present(table: &mut Table, row: usize, col: Option<usize>) -> usize {
    match col {
        Some(col) => table.clear(row, col) as usize,
        None => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flag() {
        assert_eq!(parse_flag("True"), Some(true));
        assert_eq!(parse_flag("false"), Some(false));
        assert_eq!(parse_flag(""), None);
        assert_eq!(parse_flag("Unknown"), None);
    }

    #[test]
    fn test_apply_leaves_other_entities_alone() {
        let mut table = Table::new(vec!["submitter_specimen_id".to_string()]);
        table.push_record([("submitter_specimen_id", "SPECIMEN_1".to_string())]);
        let before = table.clone();

        assert_eq!(apply(EntityType::Specimen, &mut table, &PrepConfig::default()), 0);
        assert_eq!(table, before);
    }
}
