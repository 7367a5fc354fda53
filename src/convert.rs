//! Generator JSON record files to CSV tables.

use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{info, warn};

use crate::config::PrepConfig;
use crate::data::{Dataset, EntityType, Table};
use crate::error::{PrepError, Result};
use crate::interval::DateInterval;
use crate::rules;

/// Separator for list-valued fields inside one cell.
pub const LIST_SEPARATOR: &str = "|";

/// Render one JSON field as a cell.
pub fn render_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(render_value)
            .collect::<Vec<_>>()
            .join(LIST_SEPARATOR),
        Value::Object(_) => {
            let json = value.to_string();
            match DateInterval::parse(&json) {
                Some(interval) => interval.to_cell(),
                None => json,
            }
        }
    }
}

/// Build a table from a JSON array of flat objects. Columns appear in the
/// order their keys are first seen.
pub fn records_to_table(records: &Value, path: &Path) -> Result<Table> {
    let items = records.as_array().ok_or_else(|| PrepError::RecordShape {
        path: path.to_path_buf(),
        reason: "top level is not an array".to_string(),
    })?;

    let mut table = Table::default();
    for (i, item) in items.iter().enumerate() {
        let obj = item.as_object().ok_or_else(|| PrepError::RecordShape {
            path: path.to_path_buf(),
            reason: format!("record {} is not an object", i),
        })?;
        table.push_record(obj.iter().map(|(k, v)| (k.as_str(), render_value(v))));
    }
    Ok(table)
}

pub fn read_records<P: AsRef<Path>>(path: P) -> Result<Table> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| PrepError::io(path, e))?;
    let records: Value =
        serde_json::from_reader(BufReader::new(file)).map_err(|e| PrepError::json(path, e))?;
    records_to_table(&records, path)
}

/// Convert every `<Entity>.json` in `input` (programs excluded) and apply
/// the field rules to each table.
pub fn convert_dir<P: AsRef<Path>>(input: P, config: &PrepConfig) -> Result<Dataset> {
    let input = input.as_ref();
    let entries = fs::read_dir(input).map_err(|e| PrepError::io(input, e))?;

    let mut paths: Vec<PathBuf> = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| PrepError::io(input, e))?.path();
        if path.extension().and_then(|e| e.to_str()) == Some("json") {
            paths.push(path);
        }
    }
    paths.sort();

    let mut dataset = Dataset::default();
    for path in paths {
        let entity = match EntityType::from_path(&path) {
            Ok(EntityType::Program) => continue,
            Ok(entity) => entity,
            Err(_) => {
                warn!("skipping {}: not a known record file", path.display());
                continue;
            }
        };
        let mut table = read_records(&path)?;
        if table.is_empty() {
            warn!("{} holds no records", path.display());
        } else {
            info!("{}: {} records", entity, table.len());
        }
        rules::apply(entity, &mut table, config);
        dataset.insert(entity, table);
    }
    Ok(dataset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn test_render_values() {
        assert_eq!(render_value(&json!(null)), "");
        assert_eq!(render_value(&json!(true)), "True");
        assert_eq!(render_value(&json!(72)), "72");
        assert_eq!(render_value(&json!(["Cigar", "Pipe"])), "Cigar|Pipe");
        assert_eq!(
            render_value(&json!({"month_interval": 90, "day_interval": 2700})),
            "{'month_interval': 90, 'day_interval': 2700}"
        );
        assert_eq!(render_value(&json!({"unit": "mg"})), r#"{"unit":"mg"}"#);
    }

    #[test]
    fn test_records_keep_first_seen_column_order() -> Result<(), Box<dyn std::error::Error>> {
        let records = json!([
            {"submitter_donor_id": "D1", "program_id": "SYNTHETIC-2"},
            {"program_id": "SYNTHETIC-2", "submitter_donor_id": "D2", "is_deceased": false}
        ]);
        let table = records_to_table(&records, Path::new("Donor.json"))?;
        assert_eq!(table.headers, vec!["submitter_donor_id", "program_id", "is_deceased"]);
        assert_eq!(table.rows[0], vec!["D1", "SYNTHETIC-2", ""]);
        assert_eq!(table.rows[1], vec!["D2", "SYNTHETIC-2", "False"]);
        Ok(())
    }

    #[test]
    fn test_bad_shape() {
        let err = records_to_table(&json!({"a": 1}), Path::new("Donor.json")).unwrap_err();
        assert!(matches!(err, PrepError::RecordShape { .. }));
        let err = records_to_table(&json!([1, 2]), Path::new("Donor.json")).unwrap_err();
        assert!(matches!(err, PrepError::RecordShape { .. }));
    }

    #[test]
    fn test_convert_dir_applies_rules() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        fs::write(
            dir.path().join("Exposure.json"),
            r#"[{"submitter_donor_id": "D1", "tobacco_smoking_status": "Not applicable", "tobacco_type": ["Cigar"]}]"#,
        )?;
        fs::write(dir.path().join("Program.json"), r#"[{"program_id": "SYNTHETIC-2"}]"#)?;
        fs::write(dir.path().join("readme.json"), "[]")?;
        fs::write(dir.path().join("Biomarker.json"), "[]")?;

        let dataset = convert_dir(dir.path(), &PrepConfig::default())?;
        assert_eq!(dataset.tables.len(), 2);
        assert!(dataset.require(EntityType::Biomarker)?.is_empty());
        let exposure = dataset.require(EntityType::Exposure)?;
        assert_eq!(exposure.get(0, exposure.column("tobacco_type").unwrap()), "");
        Ok(())
    }
}
