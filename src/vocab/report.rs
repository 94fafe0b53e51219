//! Joining checkpoint outcomes back onto the key table

use super::{Table, VocabError};
use crate::model::{Outcome, Snapshot};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;

/// Status cell for keys the snapshot has no entry for
pub const UNKNOWN_STATUS: &str = "UNKNOWN";

/// Which columns a report reads and writes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportOptions {
    /// Column whose values are the lookup keys
    pub key_column: String,
    /// Name of the appended outcome column
    pub status_column: String,
    /// Column to break missing counts down by
    pub category_column: Option<String>,
}

impl ReportOptions {
    /// Title existence report (`name` → `wikipedia_status`, by `topic`).
    pub fn existence() -> Self {
        Self {
            key_column: "name".to_string(),
            status_column: "wikipedia_status".to_string(),
            category_column: Some("topic".to_string()),
        }
    }

    /// Linked-id report (`uid` → `wikidata_id`).
    pub fn linked_id() -> Self {
        Self {
            key_column: "uid".to_string(),
            status_column: "wikidata_id".to_string(),
            category_column: None,
        }
    }

    /// Break down by `column` when no category is set and `table` has it.
    pub fn with_category_if_present(mut self, table: &Table, column: &str) -> Self {
        if self.category_column.is_none() && table.has_column(column) {
            self.category_column = Some(column.to_string());
        }
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryBreakdown {
    pub name: String,
    pub total: usize,
    pub missing: usize,
}

impl CategoryBreakdown {
    pub fn missing_percent(&self) -> f64 {
        percent(self.missing, self.total)
    }
}

/// Row-level tallies over a report
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub generated_at: DateTime<Utc>,
    pub total: usize,
    pub exists: usize,
    pub missing: usize,
    /// Rows with a linked id
    pub linked: usize,
    /// Rows checked with no linked id
    pub unlinked: usize,
    /// Rows left `ERROR`
    pub errors: usize,
    /// Rows the snapshot never saw
    pub unknown: usize,
    /// Sorted by descending missing count, then name
    pub categories: Vec<CategoryBreakdown>,
}

impl Summary {
    fn new() -> Self {
        Self {
            generated_at: Utc::now(),
            total: 0,
            exists: 0,
            missing: 0,
            linked: 0,
            unlinked: 0,
            errors: 0,
            unknown: 0,
            categories: Vec::new(),
        }
    }

    fn record(&mut self, outcome: Option<&Outcome>) {
        self.total += 1;
        match outcome {
            None => self.unknown += 1,
            Some(Outcome::Exists) => self.exists += 1,
            Some(Outcome::Missing) => self.missing += 1,
            Some(Outcome::Error) => self.errors += 1,
            Some(o) if o.linked_id().is_some() => self.linked += 1,
            Some(_) => self.unlinked += 1,
        }
    }

    /// Rows that are neither `EXISTS` nor `MISSING` nor linked-id results.
    pub fn unresolved(&self) -> usize {
        self.errors + self.unknown
    }
}

fn percent(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        100.0 * part as f64 / total as f64
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== SUMMARY ===")?;
        writeln!(f, "Generated: {}", self.generated_at.to_rfc3339())?;
        writeln!(f, "Total: {}", self.total)?;
        if self.exists + self.missing > 0 {
            writeln!(
                f,
                "EXISTS: {} ({:.1}%)",
                self.exists,
                percent(self.exists, self.total)
            )?;
            writeln!(
                f,
                "MISSING: {} ({:.1}%)",
                self.missing,
                percent(self.missing, self.total)
            )?;
        }
        if self.linked + self.unlinked > 0 {
            writeln!(
                f,
                "Linked: {}/{} ({:.1}%)",
                self.linked,
                self.linked + self.unlinked,
                percent(self.linked, self.linked + self.unlinked)
            )?;
        }
        writeln!(f, "Errors: {}", self.unresolved())?;

        if !self.categories.is_empty() {
            writeln!(f)?;
            writeln!(f, "=== MISSING BY CATEGORY ===")?;
            for c in &self.categories {
                writeln!(
                    f,
                    "  {}: {}/{} missing ({:.1}%)",
                    c.name,
                    c.missing,
                    c.total,
                    c.missing_percent()
                )?;
            }
        }
        Ok(())
    }
}

/// A key table with one outcome column appended, plus its summary.
#[derive(Debug, Clone)]
pub struct Report {
    table: Table,
    summary: Summary,
}

impl Report {
    /// Annotate every row of `source` with the snapshot outcome of its key.
    ///
    /// Rows whose key the snapshot lacks get [`UNKNOWN_STATUS`]; `ERROR`
    /// stays visible as `ERROR`.
    pub fn build(
        source: &Table,
        snapshot: &Snapshot,
        options: &ReportOptions,
    ) -> Result<Self, VocabError> {
        let key_idx = source.column_index(&options.key_column)?;
        let category_idx = options
            .category_column
            .as_deref()
            .map(|c| source.column_index(c))
            .transpose()?;

        let mut headers = source.headers().to_vec();
        headers.push(options.status_column.clone());
        let mut table = Table::new(headers);
        let mut summary = Summary::new();
        let mut by_category: HashMap<String, CategoryBreakdown> = HashMap::new();

        for row in source.rows() {
            let outcome = snapshot.get(Table::cell(row, key_idx));
            summary.record(outcome);

            if let Some(idx) = category_idx {
                let name = Table::cell(row, idx);
                let entry = by_category
                    .entry(name.to_string())
                    .or_insert_with(|| CategoryBreakdown {
                        name: name.to_string(),
                        total: 0,
                        missing: 0,
                    });
                entry.total += 1;
                if outcome == Some(&Outcome::Missing) {
                    entry.missing += 1;
                }
            }

            let status = outcome.map_or(UNKNOWN_STATUS, Outcome::as_str);
            let mut cells = row.clone();
            cells.push(status.to_string());
            table.push_row(cells);
        }

        let mut categories: Vec<CategoryBreakdown> = by_category.into_values().collect();
        categories.sort_by(|a, b| b.missing.cmp(&a.missing).then_with(|| a.name.cmp(&b.name)));
        summary.categories = categories;

        Ok(Self { table, summary })
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn summary(&self) -> &Summary {
        &self.summary
    }

    pub fn write(&self, path: &Path) -> Result<(), VocabError> {
        self.table.write(path)
    }
}
