//! Tag-length-value records of an EMVCo merchant-presented payload.
//!
//! Each record is a 2-character tag, a 2-digit decimal length and a value of
//! exactly that many characters.

use serde::{Deserialize, Serialize};

/// Transaction currency (ISO 4217 numeric code).
pub const TAG_CURRENCY: &str = "53";
/// Transaction amount, two fractional digits.
pub const TAG_AMOUNT: &str = "54";
/// CRC16 checksum, always the last record.
pub const TAG_CHECKSUM: &str = "63";

const HEADER_LEN: usize = 4;

/// A single TLV record. The length field is derived from `value`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub tag: String,
    pub value: String,
}

impl Record {
    pub fn new(tag: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            value: value.into(),
        }
    }

    /// Length in characters, as written into the header.
    pub fn len(&self) -> usize {
        self.value.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }
}

/// Parses records left to right.
///
/// Parsing is best effort: it stops at the first length field that is not two
/// decimal digits, after a zero-length record, or when fewer than four
/// characters remain. A value running past the end is truncated.
pub fn parse(payload: &str) -> Vec<Record> {
    let chars: Vec<char> = payload.chars().collect();
    let mut records = Vec::new();
    let mut pos = 0;

    while pos + HEADER_LEN <= chars.len() {
        let len = match (chars[pos + 2].to_digit(10), chars[pos + 3].to_digit(10)) {
            (Some(tens), Some(units)) => (tens * 10 + units) as usize,
            _ => break,
        };
        let start = pos + HEADER_LEN;
        let end = (start + len).min(chars.len());

        records.push(Record {
            tag: chars[pos..pos + 2].iter().collect(),
            value: chars[start..end].iter().collect(),
        });

        if len == 0 {
            break;
        }
        pos = start + len;
    }

    records
}

/// Serializes records in order. Values longer than 99 characters are the
/// caller's problem.
pub fn build(records: &[Record]) -> String {
    records
        .iter()
        .map(|r| format!("{}{:02}{}", r.tag, r.len(), r.value))
        .collect()
}

/// Replaces the value of the first record tagged `tag`, or inserts a new record
/// right after the first `after_tag` record (appending when there is none).
pub fn set_or_insert(records: &mut Vec<Record>, tag: &str, value: &str, after_tag: Option<&str>) {
    if let Some(existing) = records.iter_mut().find(|r| r.tag == tag) {
        existing.value = value.to_string();
        return;
    }

    let record = Record::new(tag, value);
    match after_tag.and_then(|after| records.iter().position(|r| r.tag == after)) {
        Some(idx) => records.insert(idx + 1, record),
        None => records.push(record),
    }
}

/// Removes every record tagged `tag`.
pub fn remove_tag(records: &mut Vec<Record>, tag: &str) {
    for idx in (0..records.len()).rev() {
        if records[idx].tag == tag {
            records.remove(idx);
        }
    }
}
