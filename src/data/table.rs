use std::path::Path;

use csv::{ReaderBuilder, WriterBuilder};

use crate::error::{PrepError, Result};

/// One entity file held as string cells. Empty cells are the "null" value
/// throughout; nothing is parsed until a rule asks for it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: Vec<String>) -> Self {
        Table { headers, rows: Vec::new() }
    }

    /// Read a delimited file. Every record must have as many fields as the
    /// header.
    pub fn from_file<P: AsRef<Path>>(file_path: P, delimiter: u8) -> Result<Self> {
        let path = file_path.as_ref();
        let mut rdr = ReaderBuilder::new()
            .delimiter(delimiter)
            .flexible(true)
            .from_path(path)
            .map_err(|e| PrepError::csv(path, e))?;

        let headers: Vec<String> = rdr
            .headers()
            .map_err(|e| PrepError::csv(path, e))?
            .iter()
            .map(|h| h.trim_matches('\u{feff}').to_string())
            .collect();

        let mut rows = Vec::new();
        for (i, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| PrepError::csv(path, e))?;
            if record.len() != headers.len() {
                return Err(PrepError::RowLength {
                    path: path.to_path_buf(),
                    line: i + 2,
                    expected: headers.len(),
                    found: record.len(),
                });
            }
            rows.push(record.iter().map(|v| v.to_string()).collect());
        }

        Ok(Table { headers, rows })
    }

    /// Write header and rows to `file_path`.
    pub fn to_file<P: AsRef<Path>>(&self, file_path: P, delimiter: u8) -> Result<()> {
        let path = file_path.as_ref();
        let mut wtr = WriterBuilder::new()
            .delimiter(delimiter)
            .from_path(path)
            .map_err(|e| PrepError::csv(path, e))?;

        wtr.write_record(&self.headers)
            .map_err(|e| PrepError::csv(path, e))?;
        for row in &self.rows {
            wtr.write_record(row).map_err(|e| PrepError::csv(path, e))?;
        }
        wtr.flush().map_err(|e| PrepError::io(path, e))?;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Index of `name`, appending an empty column when it does not exist yet.
    pub fn ensure_column(&mut self, name: &str) -> usize {
        if let Some(idx) = self.column(name) {
            return idx;
        }
        self.headers.push(name.to_string());
        for row in self.rows.iter_mut() {
            row.push(String::new());
        }
        self.headers.len() - 1
    }

    pub fn get(&self, row: usize, col: usize) -> &str {
        self.rows[row][col].as_str()
    }

    /// Overwrite a cell; returns whether the value changed.
    pub fn set(&mut self, row: usize, col: usize, value: impl Into<String>) -> bool {
        let value = value.into();
        let cell = &mut self.rows[row][col];
        if *cell == value {
            return false;
        }
        *cell = value;
        true
    }

    pub fn clear(&mut self, row: usize, col: usize) -> bool {
        self.set(row, col, String::new())
    }

    /// Append a row given as `(column, value)` pairs; unknown columns are
    /// added on the fly and missing ones stay empty.
    pub fn push_record<'a, I>(&mut self, fields: I)
    where
        I: IntoIterator<Item = (&'a str, String)>,
    {
        let mut row = vec![String::new(); self.headers.len()];
        for (name, value) in fields {
            let idx = match self.column(name) {
                Some(idx) => idx,
                None => {
                    let idx = self.ensure_column(name);
                    row.push(String::new());
                    idx
                }
            };
            row[idx] = value;
        }
        self.rows.push(row);
    }

    /// All values of one column, `None` if the column is absent.
    pub fn column_values(&self, name: &str) -> Option<Vec<&str>> {
        let idx = self.column(name)?;
        Some(self.rows.iter().map(|r| r[idx].as_str()).collect())
    }

    pub fn retain_rows<F>(&mut self, mut keep: F)
    where
        F: FnMut(&[String]) -> bool,
    {
        self.rows.retain(|row| keep(row));
    }
}
