use crate::config::PrepConfig;
use crate::data::Table;
use crate::interval::{month_of, DateInterval, Resolution};
use crate::rules::{clear_if_present, parse_flag};

pub const IS_DECEASED: &str = "is_deceased";
pub const CAUSE_OF_DEATH: &str = "cause_of_death";
pub const DATE_OF_DEATH: &str = "date_of_death";
pub const DATE_OF_BIRTH: &str = "date_of_birth";
pub const DATE_RESOLUTION: &str = "date_resolution";
pub const LOST_TO_FOLLOWUP_REASON: &str = "lost_to_followup_reason";
pub const LOST_TO_FOLLOWUP_EVENT: &str = "lost_to_followup_after_clinical_event_identifier";
pub const DATE_ALIVE_AFTER_LOST: &str = "date_alive_after_lost_to_followup";

/// Donor consistency:
/// - death details only for deceased donors,
/// - lost-to-follow-up details only for living donors, and a reason only
///   when the triggering event is named,
/// - a `date_resolution` for every donor,
/// - death dates no earlier than `min_death_month`.
pub fn process_donors(table: &mut Table, config: &PrepConfig) -> usize {
    let is_deceased = table.column(IS_DECEASED);
    let cause = table.column(CAUSE_OF_DEATH);
    let death = table.column(DATE_OF_DEATH);
    let birth = table.column(DATE_OF_BIRTH);
    let resolution = table.column(DATE_RESOLUTION);
    let lost_reason = table.column(LOST_TO_FOLLOWUP_REASON);
    let lost_event = table.column(LOST_TO_FOLLOWUP_EVENT);
    let alive_after = table.column(DATE_ALIVE_AFTER_LOST);

    let mut changed = 0;
    for row in 0..table.len() {
        if let Some(flag_col) = is_deceased {
            match parse_flag(table.get(row, flag_col)) {
                Some(true) => {
                    changed += clear_if_present(table, row, lost_reason);
                    changed += clear_if_present(table, row, lost_event);
                    changed += clear_if_present(table, row, alive_after);
                }
                _ => {
                    changed += clear_if_present(table, row, cause);
                    changed += clear_if_present(table, row, death);
                }
            }
        }

        if let (Some(reason_col), Some(event_col)) = (lost_reason, lost_event) {
            if table.get(row, event_col).trim().is_empty() {
                changed += table.clear(row, reason_col) as usize;
            }
        }

        if let Some(res_col) = resolution {
            if table.get(row, res_col).trim().is_empty() {
                let has_day = birth
                    .and_then(|b| DateInterval::parse(table.get(row, b)))
                    .map(|i| i.has_day())
                    .unwrap_or(false);
                let value = if has_day { Resolution::Day } else { Resolution::Month };
                changed += table.set(row, res_col, value.as_str()) as usize;
            }
        }

        if let Some(death_col) = death {
            if let Some(month) = month_of(table.get(row, death_col)) {
                if month < config.min_death_month {
                    changed += table.set(row, death_col, config.default_death_date.to_cell()) as usize;
                }
            }
        }
    }
    changed
}
