//! Strict parser for the bulk mapping file.
//!
//! Shape: `;`-separated, first row is a header, then `real_phone;fake_phone[;...]`.
//! The first bad row aborts the whole file; nothing is deduplicated. An empty
//! line counts as a row with no columns.

use crate::errors::{ImportError, PhoneColumn};
use crate::phone;
use std::collections::HashSet;

/// Validated content of one mapping file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedMappings {
    pub pairs: Vec<(String, String)>,
    pub total_rows: usize,
}

pub fn parse_mapping_csv(content: &[u8]) -> Result<ParsedMappings, ImportError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b';')
        .has_headers(false)
        .flexible(true)
        .from_reader(content);

    let mut lines = LineCounter::new(content);
    let mut records = reader.records();

    // first physical line not yet accounted for by a record
    let mut next_line = match records.next() {
        None => return Err(ImportError::Empty),
        Some(Err(e)) => return Err(csv_error(e, 1)),
        Some(Ok(header)) => lines.record_line(&header, 1) + lines_spanned(&header),
    };

    let mut pairs = Vec::new();
    let mut seen_real = HashSet::new();
    let mut seen_fake = HashSet::new();

    for (idx, record) in records.enumerate() {
        let record = record.map_err(|e| csv_error(e, next_line))?;
        let line = lines.record_line(&record, idx + 2);

        // the reader skips empty lines; a gap before this record is one
        if line > next_line {
            return Err(ImportError::MissingColumns { line: next_line });
        }
        next_line = line + lines_spanned(&record);

        if record.len() < 2 {
            return Err(ImportError::MissingColumns { line });
        }

        let raw_real = record[0].trim();
        let raw_fake = record[1].trim();
        if raw_real.is_empty() || raw_fake.is_empty() {
            return Err(ImportError::BlankValue { line });
        }

        let real = phone::normalize(raw_real);
        let fake = phone::normalize(raw_fake);

        if !phone::validate(&real) {
            return Err(ImportError::InvalidPhone {
                column: PhoneColumn::Real,
                line,
                raw: raw_real.to_string(),
            });
        }
        if !phone::validate(&fake) {
            return Err(ImportError::InvalidPhone {
                column: PhoneColumn::Fake,
                line,
                raw: raw_fake.to_string(),
            });
        }

        if !seen_real.insert(real.clone()) {
            return Err(ImportError::DuplicatePhone {
                column: PhoneColumn::Real,
                line,
                phone: real,
            });
        }
        if !seen_fake.insert(fake.clone()) {
            return Err(ImportError::DuplicatePhone {
                column: PhoneColumn::Fake,
                line,
                phone: fake,
            });
        }

        pairs.push((real, fake));
    }

    if let Some(line) = trailing_blank_line(content) {
        return Err(ImportError::MissingColumns { line });
    }

    if pairs.is_empty() {
        return Err(ImportError::NoDataRows);
    }

    let total_rows = pairs.len();
    Ok(ParsedMappings { pairs, total_rows })
}

/// Byte offset to 1-based physical line, scanning forward only.
///
/// A record's reported position is where the reader resumed, which sits
/// before any line breaks it skipped, so the record's own first byte is
/// found by skipping those.
struct LineCounter<'a> {
    content: &'a [u8],
    offset: usize,
    line: usize,
}

impl<'a> LineCounter<'a> {
    fn new(content: &'a [u8]) -> Self {
        Self {
            content,
            offset: 0,
            line: 1,
        }
    }

    fn record_line(&mut self, record: &csv::StringRecord, fallback: usize) -> usize {
        let Some(pos) = record.position() else {
            return fallback;
        };
        let mut start = usize::try_from(pos.byte())
            .unwrap_or(usize::MAX)
            .min(self.content.len());
        while start < self.content.len() && matches!(self.content[start], b'\r' | b'\n') {
            start += 1;
        }
        if start > self.offset {
            self.line += self.content[self.offset..start]
                .iter()
                .filter(|b| **b == b'\n')
                .count();
            self.offset = start;
        }
        self.line
    }
}

/// Physical lines a record occupies; quoted fields may contain newlines.
fn lines_spanned(record: &csv::StringRecord) -> usize {
    1 + record
        .iter()
        .map(|field| field.matches('\n').count())
        .sum::<usize>()
}

/// First empty line after the last non-empty one, if the file ends with any.
fn trailing_blank_line(content: &[u8]) -> Option<usize> {
    let end = content
        .iter()
        .rposition(|b| *b != b'\n' && *b != b'\r')
        .map_or(0, |i| i + 1);
    let (body, tail) = content.split_at(end);
    let breaks = tail.iter().filter(|b| **b == b'\n').count();
    (breaks >= 2).then(|| body.iter().filter(|b| **b == b'\n').count() + 2)
}

fn csv_error(e: csv::Error, fallback_line: usize) -> ImportError {
    let line = e
        .position()
        .map(|p| p.line() as usize)
        .unwrap_or(fallback_line);
    ImportError::Csv {
        line,
        message: e.to_string(),
    }
}
