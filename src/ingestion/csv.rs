//! Delimited-text (CSV) parsing in header-discovery mode.
//!
//! The parser walks the input as a stream of row events: one header event, then one event per
//! data row. Headings are de-duplicated and rows are counted; row data is only kept when
//! [`DelimitedTextOptions::materialize_records`] is set.

use std::io;

use futures::stream::{self, Stream, StreamExt};
use tracing::{debug, trace};

use crate::error::{IntakeError, IntakeResult};
use crate::types::{CellValue, FileInformation, Record};

use super::input::UploadInput;

/// Options for [`DelimitedTextParser`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelimitedTextOptions {
    /// Field delimiter.
    pub delimiter: u8,
    /// Quote character.
    pub quote: u8,
    /// Trim surrounding whitespace from headers and fields.
    pub trim: bool,
    /// Lines starting with this byte are ignored.
    pub comment: Option<u8>,
    /// Accept rows with more fields than the header row.
    ///
    /// Rows with fewer fields are always accepted. When `false`, a longer row fails with
    /// [`IntakeError::ColumnMismatch`].
    pub flexible: bool,
    /// Keep every row as a keyed [`Record`] instead of only counting rows.
    pub materialize_records: bool,
}

impl Default for DelimitedTextOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            quote: b'"',
            trim: false,
            comment: None,
            flexible: false,
            materialize_records: false,
        }
    }
}

impl DelimitedTextOptions {
    fn reader_builder(&self) -> csv::ReaderBuilder {
        let mut builder = csv::ReaderBuilder::new();
        builder
            .has_headers(true)
            .delimiter(self.delimiter)
            .quote(self.quote)
            .comment(self.comment)
            // Field counts are checked against the header in `extract_from_reader`.
            .flexible(true)
            .trim(if self.trim { csv::Trim::All } else { csv::Trim::None });
        builder
    }
}

/// Full delimited-text parser.
#[derive(Debug, Clone, Default)]
pub struct DelimitedTextParser {
    options: DelimitedTextOptions,
}

impl DelimitedTextParser {
    pub fn new(options: DelimitedTextOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &DelimitedTextOptions {
        &self.options
    }

    /// Parse an upload (or pre-decoded text) into a [`FileInformation`].
    ///
    /// Fails with [`IntakeError::EmptyFile`] when there are no data rows, and with
    /// [`IntakeError::InvalidFormat`] when the decoder reports a structural failure. Other decoder
    /// errors are returned unchanged.
    pub async fn extract_file_information<'a>(
        &self,
        input: impl Into<UploadInput<'a>>,
    ) -> IntakeResult<FileInformation> {
        let input: UploadInput<'a> = input.into();
        let text = input.text();
        self.extract_from_reader(text.as_bytes()).await
    }

    /// Same as [`Self::extract_file_information`], reading from any byte source.
    pub async fn extract_from_reader<R: io::Read>(&self, reader: R) -> IntakeResult<FileInformation> {
        let rdr = self.options.reader_builder().from_reader(reader);
        let mut events = Box::pin(row_events(rdr));
        let mut information = FileInformation::default();

        while let Some(event) = events.next().await {
            match event.map_err(IntakeError::from_decoder)? {
                RowEvent::Headers(headers) => {
                    information.headings = rename_duplicate_headers(headers);
                    debug!(columns = information.headings.len(), "delimited text headers read");
                }
                RowEvent::Row(row) => {
                    if !self.options.flexible && row.len() > information.headings.len() {
                        return Err(IntakeError::ColumnMismatch {
                            line: row.position().map_or(0, csv::Position::line),
                            expected: information.headings.len(),
                            found: row.len(),
                        });
                    }
                    information.total_records += 1;
                    if self.options.materialize_records {
                        information.data.push(keyed_record(&information.headings, &row));
                    }
                    trace!(row = information.total_records, "delimited text row");
                }
            }
        }

        if information.total_records == 0 {
            return Err(IntakeError::EmptyFile);
        }
        debug!(total_records = information.total_records, "delimited text parsed");
        Ok(information)
    }
}

/// Events produced while walking delimited text.
#[derive(Debug)]
enum RowEvent {
    Headers(Vec<String>),
    Row(csv::StringRecord),
}

/// Stream the header row followed by every data row. The stream ends after the first error.
fn row_events<R: io::Read>(rdr: csv::Reader<R>) -> impl Stream<Item = Result<RowEvent, csv::Error>> {
    stream::unfold(Some((rdr, false)), |state| async move {
        let Some((mut rdr, headers_sent)) = state else {
            return None;
        };

        if !headers_sent {
            let headers: Vec<String> = match rdr.headers() {
                Ok(h) => h.iter().map(str::to_owned).collect(),
                Err(e) => return Some((Err(e), None)),
            };
            if headers.is_empty() {
                return None;
            }
            return Some((Ok(RowEvent::Headers(headers)), Some((rdr, true))));
        }

        let mut record = csv::StringRecord::new();
        match rdr.read_record(&mut record) {
            Ok(true) => Some((Ok(RowEvent::Row(record)), Some((rdr, true)))),
            Ok(false) => None,
            Err(e) => Some((Err(e), None)),
        }
    })
}

/// Rename every header that is not the first occurrence of its value to `<value>_<index>`.
///
/// Renames are applied in place while walking the list, so later comparisons see earlier
/// renames.
pub fn rename_duplicate_headers(mut headers: Vec<String>) -> Vec<String> {
    for i in 0..headers.len() {
        let first = headers.iter().position(|h| *h == headers[i]);
        if first != Some(i) {
            headers[i] = format!("{}_{i}", headers[i]);
        }
    }
    headers
}

fn keyed_record(headings: &[String], row: &csv::StringRecord) -> Record {
    headings
        .iter()
        .zip(row.iter())
        .map(|(h, field)| (h.clone(), CellValue::from(field)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_headers_get_index_suffix() {
        let headers = vec!["Name", "Age", "Name", "Name"]
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(
            rename_duplicate_headers(headers),
            vec!["Name", "Age", "Name_2", "Name_3"]
        );
    }

    #[test]
    fn renamed_header_collisions_are_renamed_again() {
        let headers = vec!["a", "a", "a_1"].into_iter().map(String::from).collect();
        assert_eq!(rename_duplicate_headers(headers), vec!["a", "a_1", "a_1_2"]);
    }

    #[test]
    fn unique_headers_are_untouched() {
        let headers: Vec<String> = vec!["x".into(), "y".into()];
        assert_eq!(rename_duplicate_headers(headers.clone()), headers);
    }
}
