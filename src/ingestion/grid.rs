//! Rectangular cell grid shared by the spreadsheet parser and the header renaming helper.
//!
//! The grid mirrors how a worksheet is turned into keyed records: the first row supplies the
//! keys, empty cells are left out of each record, and rows without any value are skipped.

use std::collections::HashMap;

use crate::error::{IntakeError, IntakeResult};
use crate::types::{CellValue, Record};

/// Key used for a header cell that holds no value.
pub const EMPTY_KEY: &str = "__EMPTY";

/// Row-major cell storage. Rows may be ragged; missing cells read as empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Grid {
    rows: Vec<Vec<CellValue>>,
}

impl Grid {
    pub fn new(rows: Vec<Vec<CellValue>>) -> Self {
        Self { rows }
    }

    /// Lay records out as a sheet: a header row holding every key in first-seen order, then one
    /// row per record.
    pub fn from_records(records: &[Record]) -> Self {
        let mut header: Vec<String> = Vec::new();
        for record in records {
            for key in record.keys() {
                if !header.iter().any(|h| h == key) {
                    header.push(key.to_string());
                }
            }
        }

        let mut rows = Vec::with_capacity(records.len() + 1);
        rows.push(header.iter().map(|h| CellValue::Text(h.clone())).collect());
        for record in records {
            let row = header
                .iter()
                .map(|h| record.get(h).cloned().unwrap_or(CellValue::Empty))
                .collect();
            rows.push(row);
        }
        Self { rows }
    }

    /// Number of columns of the widest row.
    pub fn width(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// First row padded to the grid width, or `None` for an empty grid.
    pub fn header_row(&self) -> Option<Vec<CellValue>> {
        let first = self.rows.first()?;
        let mut header = first.clone();
        header.resize(self.width(), CellValue::Empty);
        Some(header)
    }

    /// Write `headings` over the first row, starting at the first column.
    pub fn overlay_header(&mut self, headings: &[String]) {
        if self.rows.is_empty() {
            self.rows.push(Vec::new());
        }
        let first = &mut self.rows[0];
        if first.len() < headings.len() {
            first.resize(headings.len(), CellValue::Empty);
        }
        for (cell, heading) in first.iter_mut().zip(headings) {
            *cell = CellValue::Text(heading.clone());
        }
    }

    /// Convert every row after the first into a record keyed by the first row.
    pub fn to_records(&self) -> Vec<Record> {
        let Some(header) = self.header_row() else {
            return Vec::new();
        };
        let keys = record_keys(&header);

        self.rows
            .iter()
            .skip(1)
            .filter_map(|row| {
                let record: Record = row
                    .iter()
                    .zip(&keys)
                    .filter(|(cell, _)| !matches!(cell, CellValue::Empty))
                    .map(|(cell, key)| (key.clone(), cell.clone()))
                    .collect();
                (!record.is_empty()).then_some(record)
            })
            .collect()
    }

    /// Render the grid as delimited text.
    ///
    /// Blank rows are dropped, trailing empty fields are stripped, fields are quoted only when
    /// needed and records are separated by `\n` without a trailing separator.
    pub fn to_delimited_text(&self, delimiter: u8) -> IntakeResult<String> {
        let mut wtr = csv::WriterBuilder::new()
            .delimiter(delimiter)
            .flexible(true)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(Vec::new());

        for row in &self.rows {
            let Some(last) = row.iter().rposition(|c| !c.is_blank()) else {
                continue;
            };
            wtr.write_record(row[..=last].iter().map(CellValue::to_text))?;
        }

        let bytes = wtr.into_inner().map_err(|e| IntakeError::Io(e.into_error()))?;
        let mut text = String::from_utf8(bytes).map_err(|e| IntakeError::InvalidFormat {
            message: e.to_string(),
        })?;
        if text.ends_with('\n') {
            text.pop();
        }
        Ok(text)
    }
}

/// Keys used for records: the header text, `__EMPTY` for empty header cells, and repeated keys
/// suffixed `_1`, `_2`, ... skipping names that are already taken.
pub fn record_keys(header: &[CellValue]) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut keys = Vec::with_capacity(header.len());

    for cell in header {
        let base = match cell {
            CellValue::Empty => EMPTY_KEY.to_string(),
            other => other.to_text(),
        };
        let key = match seen.get(&base).copied() {
            None => {
                seen.insert(base.clone(), 1);
                base
            }
            Some(mut counter) => {
                let mut candidate = format!("{base}_{counter}");
                counter += 1;
                while seen.contains_key(&candidate) {
                    candidate = format!("{base}_{counter}");
                    counter += 1;
                }
                seen.insert(base, counter);
                seen.insert(candidate.clone(), 1);
                candidate
            }
        };
        keys.push(key);
    }
    keys
}

#[cfg_attr(not(feature = "excel"), allow(dead_code))]
/// Replace each blank heading with `"<prefix> <n>"`, numbering blank headings from 1.
pub fn substitute_empty_headings(header: &[CellValue], prefix: &str) -> Vec<String> {
    let mut empty_count = 0;
    header
        .iter()
        .map(|cell| {
            if cell.is_blank() {
                empty_count += 1;
                format!("{prefix} {empty_count}")
            } else {
                cell.to_text()
            }
        })
        .collect()
}

/// Overlay new headings onto already-parsed records and re-key them.
///
/// Headings are written over the record keys in column order; columns beyond `headings` keep
/// their original key.
pub fn rename_headers(records: &[Record], headings: &[String]) -> Vec<Record> {
    let mut grid = Grid::from_records(records);
    grid.overlay_header(headings);
    grid.to_records()
}
