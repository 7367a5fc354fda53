use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{PrepError, Result};
use crate::interval::DateInterval;

/// How follow-up rows pick the link they keep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "policy")]
pub enum FollowUpPolicy {
    /// Even rows keep the diagnosis link, odd rows the treatment link.
    Alternate,
    /// A seeded coin per row.
    Random { seed: u64 },
}

/// Tunables for the field rules and the interval adjustment. Every field
/// has a default, so a config file only lists what it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrepConfig {
    /// Donor whose records exercise the "all fields empty" case.
    pub null_sentinel_donor: String,
    /// Death dates below this month are replaced by `default_death_date`.
    pub min_death_month: i64,
    pub default_death_date: DateInterval,
    /// `tobacco_smoking_status` values that rule out tobacco details.
    pub non_smoker_statuses: Vec<String>,
    pub follow_up: FollowUpPolicy,
    /// Months kept between a bounded diagnosis and the death date.
    pub diagnosis_death_margin: i64,
    /// Extra months added past the latest treatment end when moving a death.
    pub death_extension_margin: i64,
}

impl Default for PrepConfig {
    fn default() -> Self {
        PrepConfig {
            null_sentinel_donor: "DONOR_NULL".to_string(),
            min_death_month: 10,
            default_death_date: DateInterval::new(20, Some(600)),
            non_smoker_statuses: vec![
                "Smoking history not documented".to_string(),
                "Lifelong non-smoker (<100 cigarettes smoked in lifetime)".to_string(),
                "Not applicable".to_string(),
            ],
            follow_up: FollowUpPolicy::Alternate,
            diagnosis_death_margin: 5,
            death_extension_margin: 10,
        }
    }
}

impl PrepConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| PrepError::io(path, e))?;
        let reader = BufReader::new(file);
        serde_json::from_reader(reader).map_err(|e| PrepError::json(path, e))
    }

    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| PrepError::io(path, e))?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self).map_err(|e| PrepError::json(path, e))
    }

    /// Load `path` if it exists, otherwise write the defaults there so they
    /// can be tuned for the next run.
    pub fn load_or_init<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            return Self::from_file(path);
        }
        let config = PrepConfig::default();
        config.to_file(path)?;
        tracing::info!("wrote default configuration to {}", path.display());
        Ok(config)
    }

    pub fn is_non_smoker(&self, status: &str) -> bool {
        self.non_smoker_statuses.iter().any(|s| s == status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_partial_file_keeps_defaults() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let path = dir.path().join("prep.json");
        std::fs::write(
            &path,
            r#"{ "null_sentinel_donor": "DONOR_EMPTY", "follow_up": { "policy": "random", "seed": 7 } }"#,
        )?;

        let config = PrepConfig::from_file(&path)?;
        assert_eq!(config.null_sentinel_donor, "DONOR_EMPTY");
        assert_eq!(config.follow_up, FollowUpPolicy::Random { seed: 7 });
        assert_eq!(config.min_death_month, 10);
        assert!(config.is_non_smoker("Not applicable"));
        Ok(())
    }

    #[test]
    fn test_load_or_init_writes_defaults() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let path = dir.path().join("prep.json");

        let first = PrepConfig::load_or_init(&path)?;
        assert!(path.is_file());
        let second = PrepConfig::load_or_init(&path)?;
        assert_eq!(first, second);
        assert_eq!(second.default_death_date, DateInterval::new(20, Some(600)));
        Ok(())
    }
}
