#![cfg(feature = "excel")]

//! Spreadsheet parsing (`.xlsx`, `.xls`, `.xlsm`, `.xlsb`, `.ods`) from in-memory uploads.

use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use chrono::{NaiveDateTime, NaiveTime};
use tracing::debug;

use crate::error::{IntakeError, IntakeResult};
use crate::types::{CellValue, FileInformation, Record};

use super::grid::{self, Grid};
use super::input::RawUpload;

/// Default prefix for substituted empty headings.
pub const EMPTY_HEADING_PREFIX: &str = "EmptyHeading";

/// Which sheet of a workbook to read.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SheetSelection {
    /// The first sheet in workbook order (default).
    #[default]
    First,
    /// A single named sheet.
    Named(String),
}

/// Options for [`SpreadsheetParser`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpreadsheetOptions {
    /// Prefix used when replacing empty headings (`"<prefix> <n>"`).
    pub empty_heading_prefix: String,
    /// Sheet to read.
    pub sheet: SheetSelection,
}

impl Default for SpreadsheetOptions {
    fn default() -> Self {
        Self {
            empty_heading_prefix: EMPTY_HEADING_PREFIX.to_string(),
            sheet: SheetSelection::default(),
        }
    }
}

/// Workbook parser. All operations are blocking and work on the fully buffered upload.
#[derive(Debug, Clone, Default)]
pub struct SpreadsheetParser {
    options: SpreadsheetOptions,
}

impl SpreadsheetParser {
    pub fn new(options: SpreadsheetOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &SpreadsheetOptions {
        &self.options
    }

    /// Parse the selected sheet into headings and keyed records.
    ///
    /// Behavior:
    /// - A workbook without sheets, a missing/empty first row, or a sheet without data rows fails
    ///   with [`IntakeError::EmptyFile`]
    /// - Empty headings are replaced with `"<prefix> <n>"`
    /// - Records are keyed by the original first-row values, so a substituted heading shows up as
    ///   `__EMPTY` in `data`
    pub fn extract_file_information(&self, upload: &RawUpload) -> IntakeResult<FileInformation> {
        let sheet = self.load_sheet(upload, |c| CellValue::from(c))?;
        file_information_from_sheet(sheet, &self.options.empty_heading_prefix)
    }

    /// Render the selected sheet as comma-separated text for the delimited-text parsers.
    ///
    /// Cells are written as displayed: date cells as `YYYY-MM-DD` (with `HH:MM:SS` when they
    /// carry a time of day) and numbers rounded to 15 significant digits.
    pub fn convert_to_delimited_text(&self, upload: &RawUpload) -> IntakeResult<String> {
        let grid = self
            .load_sheet(upload, displayed_cell)?
            .ok_or(IntakeError::EmptyFile)?;
        grid.to_delimited_text(b',')
    }

    /// Re-key already-parsed records under `headings`. See [`grid::rename_headers`].
    pub fn rename_headers(&self, records: &[Record], headings: &[String]) -> Vec<Record> {
        grid::rename_headers(records, headings)
    }

    /// Load the selected sheet, or `None` when the workbook has no sheets.
    fn load_sheet(&self, upload: &RawUpload, cell: fn(&Data) -> CellValue) -> IntakeResult<Option<Grid>> {
        // Spreadsheets are binary containers; the declared text encoding does not apply.
        let mut workbook = open_workbook_auto_from_rs(Cursor::new(upload.bytes.as_slice()))?;

        let name = match &self.options.sheet {
            SheetSelection::Named(name) => name.clone(),
            SheetSelection::First => match workbook.sheet_names().first() {
                Some(name) => name.clone(),
                None => return Ok(None),
            },
        };

        let range = workbook.worksheet_range(&name)?;
        debug!(sheet = %name, rows = range.height(), columns = range.width(), "sheet loaded");

        let rows = range
            .rows()
            .map(|row| row.iter().map(cell).collect())
            .collect();
        Ok(Some(Grid::new(rows)))
    }
}

fn file_information_from_sheet(sheet: Option<Grid>, empty_heading_prefix: &str) -> IntakeResult<FileInformation> {
    let sheet = sheet.ok_or(IntakeError::EmptyFile)?;

    let header = match sheet.header_row() {
        Some(header) if header.iter().any(|c| !c.is_blank()) => header,
        _ => return Err(IntakeError::EmptyFile),
    };
    let headings = grid::substitute_empty_headings(&header, empty_heading_prefix);

    let data = sheet.to_records();
    if data.is_empty() {
        return Err(IntakeError::EmptyFile);
    }

    Ok(FileInformation {
        total_records: data.len(),
        data,
        headings,
    })
}

impl From<&Data> for CellValue {
    fn from(c: &Data) -> Self {
        match c {
            Data::Int(i) => CellValue::Int(*i),
            Data::Float(f) => CellValue::Float(*f),
            Data::String(s) => CellValue::Text(s.clone()),
            Data::Bool(b) => CellValue::Bool(*b),
            // Raw date cells are kept as their serial number.
            Data::DateTime(dt) => CellValue::Float(dt.as_f64()),
            Data::DateTimeIso(s) => CellValue::Text(s.clone()),
            Data::DurationIso(s) => CellValue::Text(s.clone()),
            Data::Error(_) | Data::Empty => CellValue::Empty,
        }
    }
}

/// Cell as shown in the sheet. Date cells become text; everything else keeps its raw value.
fn displayed_cell(c: &Data) -> CellValue {
    match c {
        Data::DateTime(dt) if dt.is_datetime() => match dt.as_datetime() {
            Some(datetime) => CellValue::Text(format_datetime(datetime)),
            None => CellValue::from(c),
        },
        _ => CellValue::from(c),
    }
}

fn format_datetime(datetime: NaiveDateTime) -> String {
    if datetime.time() == NaiveTime::MIN {
        datetime.format("%Y-%m-%d").to_string()
    } else {
        datetime.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}
