use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::FollowUpPolicy;
use crate::data::Table;

pub const SUBMITTER_TREATMENT_ID: &str = "submitter_treatment_id";
pub const SUBMITTER_PRIMARY_DIAGNOSIS_ID: &str = "submitter_primary_diagnosis_id";

/// A follow-up hangs off either a treatment or a primary diagnosis, never
/// both. Among the rows still holding both links, those chosen by `policy`
/// drop the treatment link and the others drop the diagnosis link. Rows with
/// a single link are left as they are.
pub fn process_follow_ups(table: &mut Table, policy: &FollowUpPolicy) -> usize {
    let (Some(treatment), Some(diagnosis)) = (
        table.column(SUBMITTER_TREATMENT_ID),
        table.column(SUBMITTER_PRIMARY_DIAGNOSIS_ID),
    ) else {
        return 0;
    };

    let linked_twice: Vec<usize> = (0..table.len())
        .filter(|&row| !table.get(row, treatment).is_empty() && !table.get(row, diagnosis).is_empty())
        .collect();
    let keep_diagnosis = diagnosis_rows(linked_twice.len(), policy);

    let mut changed = 0;
    for (row, keep_diag) in linked_twice.into_iter().zip(keep_diagnosis) {
        let col = if keep_diag { treatment } else { diagnosis };
        changed += table.clear(row, col) as usize;
    }
    changed
}

/// Which of `n_rows` rows keep their diagnosis link.
fn diagnosis_rows(n_rows: usize, policy: &FollowUpPolicy) -> Vec<bool> {
    match policy {
        FollowUpPolicy::Alternate => (0..n_rows).map(|i| i % 2 == 0).collect(),
        FollowUpPolicy::Random { seed } => {
            let mut rng = StdRng::seed_from_u64(*seed);
            (0..n_rows).map(|_| rng.random_bool(0.5)).collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn follow_ups(n: usize) -> Table {
        let mut table = Table::new(vec![
            "submitter_follow_up_id".to_string(),
            SUBMITTER_TREATMENT_ID.to_string(),
            SUBMITTER_PRIMARY_DIAGNOSIS_ID.to_string(),
        ]);
        for i in 0..n {
            table.push_record([
                ("submitter_follow_up_id", format!("FOLLOW_UP_{i}")),
                (SUBMITTER_TREATMENT_ID, format!("TREATMENT_{i}")),
                (SUBMITTER_PRIMARY_DIAGNOSIS_ID, format!("PRIMARY_DIAGNOSIS_{i}")),
            ]);
        }
        table
    }

    fn links_kept(table: &Table) -> Vec<(bool, bool)> {
        table.rows.iter().map(|r| (!r[1].is_empty(), !r[2].is_empty())).collect()
    }

    #[test]
    fn test_alternate_odd_row_count() {
        let mut table = follow_ups(5);
        process_follow_ups(&mut table, &FollowUpPolicy::Alternate);
        assert_eq!(
            links_kept(&table),
            vec![(false, true), (true, false), (false, true), (true, false), (false, true)]
        );
    }

    #[test]
    fn test_random_is_seeded_and_exclusive() {
        let mut a = follow_ups(40);
        let mut b = follow_ups(40);
        process_follow_ups(&mut a, &FollowUpPolicy::Random { seed: 11 });
        process_follow_ups(&mut b, &FollowUpPolicy::Random { seed: 11 });
        assert_eq!(a, b);
        for (t, d) in links_kept(&a) {
            assert!(t != d, "exactly one link must survive");
        }
        assert_eq!(process_follow_ups(&mut a, &FollowUpPolicy::Random { seed: 11 }), 0);
    }

    #[test]
    fn test_rerun_after_dropping_rows_keeps_one_link() {
        let mut table = follow_ups(4);
        process_follow_ups(&mut table, &FollowUpPolicy::Alternate);
        table.retain_rows(|row| row[0] != "FOLLOW_UP_0");

        assert_eq!(process_follow_ups(&mut table, &FollowUpPolicy::Alternate), 0);
        assert_eq!(links_kept(&table), vec![(true, false), (false, true), (true, false)]);
    }

    #[test]
    fn test_single_link_rows_are_skipped() {
        let mut table = follow_ups(5);
        table.clear(0, 1);
        table.clear(2, 2);
        table.clear(4, 1);
        table.clear(4, 2);

        // rows 1 and 3 are the only ones left with both links
        assert_eq!(process_follow_ups(&mut table, &FollowUpPolicy::Alternate), 2);
        assert_eq!(
            links_kept(&table),
            vec![(false, true), (false, true), (true, false), (true, false), (false, false)]
        );
    }

    #[test]
    fn test_single_link_column_is_left_alone() {
        let mut table = Table::new(vec![SUBMITTER_TREATMENT_ID.to_string()]);
        table.push_record([(SUBMITTER_TREATMENT_ID, "TREATMENT_1".to_string())]);
        assert_eq!(process_follow_ups(&mut table, &FollowUpPolicy::Alternate), 0);
    }
}
