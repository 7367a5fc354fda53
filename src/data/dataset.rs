use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::data::{EntityType, Table};
use crate::error::{PrepError, Result};

const CSV_EXT: &str = "csv";
const STAGING_EXT: &str = "csv.tmp";

/// All entity tables of one dataset directory.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub tables: BTreeMap<EntityType, Table>,
}

impl Dataset {
    /// Load every `<Entity>.csv` in `dir`. Other files are ignored.
    pub fn load<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        let entries = fs::read_dir(dir).map_err(|e| PrepError::io(dir, e))?;

        let mut paths: Vec<PathBuf> = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| PrepError::io(dir, e))?.path();
            if path.extension().and_then(|e| e.to_str()) == Some(CSV_EXT) {
                paths.push(path);
            }
        }
        paths.sort();

        let mut tables = BTreeMap::new();
        for path in paths {
            let entity = match EntityType::from_path(&path) {
                Ok(entity) => entity,
                Err(_) => {
                    warn!("skipping {}: not a known record file", path.display());
                    continue;
                }
            };
            let table = Table::from_file(&path, b',')?;
            debug!("loaded {} rows from {}", table.len(), path.display());
            tables.insert(entity, table);
        }
        info!("loaded {} tables from {}", tables.len(), dir.display());
        Ok(Dataset { tables })
    }

    pub fn table(&self, entity: EntityType) -> Option<&Table> {
        self.tables.get(&entity)
    }

    pub fn table_mut(&mut self, entity: EntityType) -> Option<&mut Table> {
        self.tables.get_mut(&entity)
    }

    pub fn require(&self, entity: EntityType) -> Result<&Table> {
        self.table(entity).ok_or(PrepError::MissingTable(entity))
    }

    pub fn insert(&mut self, entity: EntityType, table: Table) -> Option<Table> {
        self.tables.insert(entity, table)
    }

    /// Write every table to `dir`. Tables are first staged next to their
    /// target and only renamed into place once all of them were written.
    pub fn save<P: AsRef<Path>>(&self, dir: P) -> Result<()> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir).map_err(|e| PrepError::io(dir, e))?;

        let mut staged: Vec<(PathBuf, PathBuf)> = Vec::with_capacity(self.tables.len());
        for (entity, table) in &self.tables {
            let target = dir.join(entity.file_name(CSV_EXT));
            let staging = dir.join(entity.file_name(STAGING_EXT));
            if let Err(e) = table.to_file(&staging, b',') {
                for (tmp, _) in &staged {
                    let _ = fs::remove_file(tmp);
                }
                let _ = fs::remove_file(&staging);
                return Err(e);
            }
            staged.push((staging, target));
        }

        for (staging, target) in staged {
            fs::rename(&staging, &target).map_err(|e| PrepError::io(&target, e))?;
        }
        info!("wrote {} tables to {}", self.tables.len(), dir.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_load_and_save() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        fs::write(dir.path().join("Donor.csv"), "submitter_donor_id,program_id\nD1,P\n")?;
        fs::write(dir.path().join("Exposure.csv"), "submitter_donor_id,tobacco_type\nD1,Cigar\n")?;
        fs::write(dir.path().join("manifest.yml"), "x: 1\n")?;
        fs::write(dir.path().join("Notes.csv"), "a\n1\n")?;

        let data = Dataset::load(dir.path())?;
        assert_eq!(data.tables.len(), 2);
        assert_eq!(data.require(EntityType::Donor)?.len(), 1);
        assert!(matches!(
            data.require(EntityType::Treatment),
            Err(PrepError::MissingTable(EntityType::Treatment))
        ));

        let out = dir.path().join("out");
        data.save(&out)?;
        assert!(out.join("Donor.csv").is_file());
        assert!(out.join("Exposure.csv").is_file());
        assert!(!out.join("Donor.csv.tmp").exists());

        let reloaded = Dataset::load(&out)?;
        assert_eq!(reloaded.tables, data.tables);
        Ok(())
    }
}
