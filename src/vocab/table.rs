//! In-memory CSV table

use super::VocabError;
use crate::model::LookupKey;
use std::collections::HashSet;
use std::io::{Read, Write};
use std::path::Path;

/// A CSV file held in full: header row plus string cells, column order kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new<S: Into<String>>(headers: impl IntoIterator<Item = S>) -> Self {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn read(path: &Path) -> Result<Self, VocabError> {
        let file = std::fs::File::open(path).map_err(|source| VocabError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, VocabError> {
        let mut reader = csv::Reader::from_reader(reader);
        let headers = reader.headers()?.iter().map(str::to_string).collect();
        let mut rows = Vec::new();
        for record in reader.records() {
            rows.push(record?.iter().map(str::to_string).collect());
        }
        Ok(Self { headers, rows })
    }

    pub fn write(&self, path: &Path) -> Result<(), VocabError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| VocabError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let file = std::fs::File::create(path).map_err(|source| VocabError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.to_writer(file)
    }

    pub fn to_writer<W: Write>(&self, writer: W) -> Result<(), VocabError> {
        let mut writer = csv::Writer::from_writer(writer);
        writer.write_record(&self.headers)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer.flush().map_err(csv::Error::from)?;
        Ok(())
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.headers.iter().any(|h| h == name)
    }

    pub fn column_index(&self, name: &str) -> Result<usize, VocabError> {
        self.headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| VocabError::MissingColumn(name.to_string()))
    }

    /// Cell at `column` of `row`; short rows read as empty.
    pub fn cell<'a>(row: &'a [String], column: usize) -> &'a str {
        row.get(column).map(String::as_str).unwrap_or("")
    }

    pub fn push_row<S: Into<String>>(&mut self, row: impl IntoIterator<Item = S>) {
        self.rows.push(row.into_iter().map(Into::into).collect());
    }

    /// Distinct non-empty values of `column`, in first-appearance order.
    pub fn keys(&self, column: &str) -> Result<Vec<LookupKey>, VocabError> {
        let idx = self.column_index(column)?;
        let mut seen = HashSet::new();
        Ok(self
            .rows
            .iter()
            .map(|row| Self::cell(row, idx))
            .filter(|value| !value.is_empty() && seen.insert(*value))
            .map(LookupKey::from)
            .collect())
    }
}
