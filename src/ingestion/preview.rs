//! Header preview for delimited text: read the first row only.

use tracing::debug;

use crate::error::{IntakeError, IntakeResult};

use super::input::UploadInput;

/// Delimiters tried when none is configured, in preference order.
pub const CANDIDATE_DELIMITERS: [u8; 6] = [b',', b'\t', b'|', b';', 0x1E, 0x1F];

/// Number of rows inspected when guessing the delimiter.
const GUESS_PREVIEW_ROWS: usize = 10;

/// Options for [`HeaderPreviewParser`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderPreviewOptions {
    /// Field delimiter. `None` guesses one from the first rows.
    pub delimiter: Option<u8>,
    /// Quote character.
    pub quote: u8,
}

impl Default for HeaderPreviewOptions {
    fn default() -> Self {
        Self {
            delimiter: None,
            quote: b'"',
        }
    }
}

/// Returns the raw first row of delimited text, without de-duplication.
#[derive(Debug, Clone, Default)]
pub struct HeaderPreviewParser {
    options: HeaderPreviewOptions,
}

impl HeaderPreviewParser {
    pub fn new(options: HeaderPreviewOptions) -> Self {
        Self { options }
    }

    /// Read the header row.
    ///
    /// A missing first row, or one with a single field, fails with [`IntakeError::EmptyFile`].
    pub async fn preview_headers<'a>(&self, input: impl Into<UploadInput<'a>>) -> IntakeResult<Vec<String>> {
        let input: UploadInput<'a> = input.into();
        let text = input.text();
        let delimiter = match self.options.delimiter {
            Some(d) => d,
            None => guess_delimiter(&text, self.options.quote),
        };
        debug!(delimiter = %char::from(delimiter).escape_default(), "previewing headers");

        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .delimiter(delimiter)
            .quote(self.options.quote)
            .from_reader(text.as_bytes());

        let row = match rdr.records().next() {
            None => return Err(IntakeError::EmptyFile),
            Some(row) => row.map_err(IntakeError::from_decoder)?,
        };

        if row.len() <= 1 {
            return Err(IntakeError::EmptyFile);
        }
        Ok(row.iter().map(str::to_owned).collect())
    }
}

/// Pick the delimiter whose first rows split into a consistent number of fields, averaging at
/// least two per row. Falls back to `,`.
pub fn guess_delimiter(text: &str, quote: u8) -> u8 {
    let mut best: Option<(u8, usize, f64)> = None;

    for delimiter in CANDIDATE_DELIMITERS {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .delimiter(delimiter)
            .quote(quote)
            .from_reader(text.as_bytes());

        let counts: Vec<usize> = rdr
            .records()
            .take(GUESS_PREVIEW_ROWS)
            .map_while(Result::ok)
            .map(|r| r.len())
            .collect();
        if counts.is_empty() {
            continue;
        }

        let delta: usize = counts.windows(2).map(|w| w[0].abs_diff(w[1])).sum();
        let avg = counts.iter().sum::<usize>() as f64 / counts.len() as f64;
        if avg <= 1.99 {
            continue;
        }

        let better = match best {
            None => true,
            Some((_, best_delta, best_avg)) => delta <= best_delta && avg > best_avg,
        };
        if better {
            best = Some((delimiter, delta, avg));
        }
    }

    best.map(|(d, _, _)| d).unwrap_or(b',')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guesses_semicolon() {
        assert_eq!(guess_delimiter("a;b;c\n1;2;3\n", b'"'), b';');
    }

    #[test]
    fn guesses_tab_over_comma_inside_fields() {
        let text = "name\tnote\nAda\thello, world\nGrace\tbye\n";
        assert_eq!(guess_delimiter(text, b'"'), b'\t');
    }

    #[test]
    fn falls_back_to_comma_for_single_column() {
        assert_eq!(guess_delimiter("only\n1\n2\n", b'"'), b',');
    }
}
