//! Streaming reader for the MeSH descriptor XML release

use super::{Table, VocabError};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::io::BufRead;
use std::path::Path;
use tracing::debug;

const RECORD: &[u8] = b"DescriptorRecord";
// Record elements sit directly under the root, so the stack is
// [root, DescriptorRecord] while inside one.
const RECORD_DEPTH: usize = 2;

/// One descriptor record, reduced to the fields the pipeline uses.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Descriptor {
    pub uid: String,
    pub name: String,
    /// `DescriptorClass` attribute, empty when absent
    pub class: String,
    pub tree_numbers: Vec<String>,
}

impl Descriptor {
    pub fn tree_numbers_joined(&self) -> String {
        self.tree_numbers.join(";")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Uid,
    Name,
    TreeNumber,
}

/// Which field, if any, text at this record-relative path belongs to.
/// Only direct children count: nested `DescriptorUI`s under concepts or
/// qualifiers are ignored.
fn field_at(path: &[Vec<u8>]) -> Option<Field> {
    match path {
        [a] if a == b"DescriptorUI" => Some(Field::Uid),
        [a, b] if a == b"DescriptorName" && b == b"String" => Some(Field::Name),
        [a, b] if a == b"TreeNumberList" && b == b"TreeNumber" => Some(Field::TreeNumber),
        _ => None,
    }
}

pub fn read_descriptors(path: &Path) -> Result<Vec<Descriptor>, VocabError> {
    let file = std::fs::File::open(path).map_err(|source| VocabError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_descriptors(std::io::BufReader::new(file))
}

/// Parse every `DescriptorRecord` from a descriptor XML stream.
pub fn parse_descriptors<R: BufRead>(input: R) -> Result<Vec<Descriptor>, VocabError> {
    let mut reader = Reader::from_reader(input);
    reader.trim_text(true);

    let mut buf = Vec::new();
    let mut stack: Vec<Vec<u8>> = Vec::new();
    let mut current: Option<Descriptor> = None;
    let mut records = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => {
                stack.push(e.name().as_ref().to_vec());
                if stack.len() == RECORD_DEPTH && e.name().as_ref() == RECORD {
                    let class = match e
                        .try_get_attribute("DescriptorClass")
                        .map_err(quick_xml::Error::from)?
                    {
                        Some(attr) => attr.unescape_value()?.into_owned(),
                        None => String::new(),
                    };
                    current = Some(Descriptor {
                        class,
                        ..Descriptor::default()
                    });
                }
            }
            Event::Text(t) => {
                if let Some(record) = current.as_mut() {
                    let relative = stack.get(RECORD_DEPTH..).unwrap_or(&[]);
                    if let Some(field) = field_at(relative) {
                        let text = t.unescape()?;
                        match field {
                            Field::Uid => record.uid.push_str(&text),
                            Field::Name => record.name.push_str(&text),
                            Field::TreeNumber => record.tree_numbers.push(text.into_owned()),
                        }
                    }
                }
            }
            Event::End(e) => {
                if stack.len() == RECORD_DEPTH && e.name().as_ref() == RECORD {
                    if let Some(record) = current.take() {
                        records.push(finish(record)?);
                    }
                }
                stack.pop();
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    debug!(records = records.len(), "descriptor XML parsed");
    Ok(records)
}

fn finish(record: Descriptor) -> Result<Descriptor, VocabError> {
    if record.uid.is_empty() {
        return Err(VocabError::Malformed(format!(
            "record without DescriptorUI (name {:?})",
            record.name
        )));
    }
    if record.name.is_empty() {
        return Err(VocabError::Malformed(format!(
            "{} has no DescriptorName/String",
            record.uid
        )));
    }
    Ok(record)
}

/// Table with columns `uid,name,class,tree_numbers`.
pub fn descriptor_table(descriptors: &[Descriptor]) -> Table {
    let mut table = Table::new(["uid", "name", "class", "tree_numbers"]);
    for d in descriptors {
        table.push_row([
            d.uid.clone(),
            d.name.clone(),
            d.class.clone(),
            d.tree_numbers_joined(),
        ]);
    }
    table
}
