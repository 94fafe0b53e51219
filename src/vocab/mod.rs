//! Vocabulary files: descriptor XML in, CSV tables through, CSV reports out

mod descriptor;
mod filter;
mod report;
mod table;

pub use descriptor::{descriptor_table, parse_descriptors, read_descriptors, Descriptor};
pub use filter::{filter_table, primary_topic, split_tree_numbers, TitleFilter, UNCATEGORIZED};
pub use report::{CategoryBreakdown, Report, ReportOptions, Summary, UNKNOWN_STATUS};
pub use table::Table;

use std::path::PathBuf;
use thiserror::Error;

/// Errors from reading or writing vocabulary files
#[derive(Debug, Error)]
pub enum VocabError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("column not found: {0}")]
    MissingColumn(String),

    #[error("malformed descriptor: {0}")]
    Malformed(String),

    #[error("invalid title pattern: {0}")]
    Pattern(#[from] regex::Error),
}
