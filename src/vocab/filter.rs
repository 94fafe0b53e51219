//! Title-quality heuristics and topic assignment
//!
//! Descriptor names that make poor encyclopedia titles (systematic chemical
//! names, "X as Topic" meta headings, NOS residual classes, publication
//! types) are dropped before any upstream lookup.

use super::{Table, VocabError};
use regex::Regex;

pub const UNCATEGORIZED: &str = "Uncategorized";

const TREE_CATEGORIES: &[(char, &str)] = &[
    ('A', "Anatomy"),
    ('B', "Organisms"),
    ('C', "Diseases"),
    ('D', "Chemicals and Drugs"),
    ('E', "Techniques and Equipment"),
    ('F', "Psychiatry and Psychology"),
    ('G', "Biological Phenomena and Processes"),
    ('H', "Disciplines and Occupations"),
    ('I', "Social Sciences"),
    ('J', "Technology and Agriculture"),
    ('K', "Humanities"),
    ('L', "Information Science"),
    ('M', "Named Groups"),
    ('N', "Health Care"),
    ('V', "Publication Characteristics"),
    ('Z', "Geographicals"),
];

const MAX_TITLE_CHARS: usize = 60;

fn category_name(letter: char) -> Option<&'static str> {
    TREE_CATEGORIES
        .iter()
        .find(|(l, _)| *l == letter)
        .map(|(_, name)| *name)
}

/// Split a `;`-joined tree number cell. Empty input yields no numbers.
pub fn split_tree_numbers(cell: &str) -> Vec<String> {
    if cell.is_empty() {
        return Vec::new();
    }
    cell.split(';').map(str::to_string).collect()
}

/// Category of the most frequent top-level tree letter.
///
/// Ties go to the letter seen first. Numbers with no known letter are
/// ignored; if none remain the result is [`UNCATEGORIZED`].
pub fn primary_topic(tree_numbers: &[String]) -> &'static str {
    let mut tally: Vec<(char, usize)> = Vec::new();
    for letter in tree_numbers.iter().filter_map(|t| t.chars().next()) {
        if category_name(letter).is_none() {
            continue;
        }
        match tally.iter_mut().find(|(l, _)| *l == letter) {
            Some((_, n)) => *n += 1,
            None => tally.push((letter, 1)),
        }
    }

    let mut best: Option<(char, usize)> = None;
    for (letter, n) in tally {
        if best.map_or(true, |(_, m)| n > m) {
            best = Some((letter, n));
        }
    }
    best.and_then(|(l, _)| category_name(l)).unwrap_or(UNCATEGORIZED)
}

/// Compiled heuristics deciding whether a name is worth a lookup.
#[derive(Debug, Clone)]
pub struct TitleFilter {
    systematic: Vec<Regex>,
    embedded_digits: Regex,
    named_series: Regex,
}

impl TitleFilter {
    pub fn new() -> Result<Self, regex::Error> {
        let systematic = [
            r"\d+,\d+,\d+",
            r"(?i)-(yl|oxy|oyl)-.*-(yl|oxy|oyl)",
            r"^\d.*-\d.*-\d",
            r"(?i)(alpha|beta|gamma|delta)-\d",
            r"\d+-\(.*\)-\d+",
        ]
        .into_iter()
        .map(Regex::new)
        .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            systematic,
            embedded_digits: Regex::new(r"(?i)[a-z]\d+[a-z]")?,
            named_series: Regex::new(r"Vitamin|Factor|Type|Class|Group|Phase|Grade")?,
        })
    }

    /// Looks like systematic chemical nomenclature.
    pub fn is_complex_chemical(&self, name: &str) -> bool {
        if name.matches('(').count() >= 3 || name.matches(',').count() >= 3 {
            return true;
        }
        if self.systematic.iter().any(|re| re.is_match(name)) {
            return true;
        }

        let parts: Vec<&str> = name.split('-').collect();
        parts.len() >= 4
            && parts.iter().take(3).any(|p| {
                let p = p.trim();
                p.chars().count() <= 2 || p.chars().all(|c| c.is_ascii_digit())
            })
    }

    pub fn is_meaningful(&self, name: &str, tree_numbers: &[String]) -> bool {
        let chars = name.chars().count();
        if chars <= 2 || chars > MAX_TITLE_CHARS {
            return false;
        }

        let alphabetic = name
            .chars()
            .filter(|c| c.is_ascii_alphabetic() || *c == ' ')
            .count();
        if alphabetic * 2 < chars {
            return false;
        }

        if name.ends_with(", NOS") || name.contains("as Topic") {
            return false;
        }

        let chemical = tree_numbers.iter().any(|t| t.starts_with('D'));
        if chemical {
            if self.is_complex_chemical(name) {
                return false;
            }
            if self.embedded_digits.is_match(name) && !self.named_series.is_match(name) {
                return false;
            }
        }

        let publication_only =
            !tree_numbers.is_empty() && tree_numbers.iter().all(|t| t.starts_with('V'));
        !publication_only
    }
}

/// Keep meaningful rows of a `uid,name,…,tree_numbers` table and assign each
/// a topic. Output columns: `uid,name,topic,tree_numbers`.
pub fn filter_table(table: &Table, filter: &TitleFilter) -> Result<Table, VocabError> {
    let uid = table.column_index("uid")?;
    let name = table.column_index("name")?;
    let trees = table.column_index("tree_numbers")?;

    let mut out = Table::new(["uid", "name", "topic", "tree_numbers"]);
    for row in table.rows() {
        let tree_cell = Table::cell(row, trees);
        let tree_numbers = split_tree_numbers(tree_cell);
        let title = Table::cell(row, name);
        if filter.is_meaningful(title, &tree_numbers) {
            out.push_row([
                Table::cell(row, uid),
                title,
                primary_topic(&tree_numbers),
                tree_cell,
            ]);
        }
    }
    Ok(out)
}
