use thiserror::Error;

/// Convenience result type for intake operations.
pub type IntakeResult<T> = Result<T, IntakeError>;

/// Error type returned by every parser in this crate.
///
/// Callers usually only need [`IntakeError::kind`] to decide how to answer the uploader; the
/// propagated variants keep the decoder's original error intact for logging.
#[derive(Debug, Error)]
pub enum IntakeError {
    /// The file yielded no usable rows, sheets or headings.
    #[error("empty file: no records found")]
    EmptyFile,

    /// The decoder could not tokenize the input as the expected format.
    #[error("invalid file format: {message}")]
    InvalidFormat { message: String },

    /// A data row holds more fields than the header row.
    #[error("row on line {line} has {found} fields, but the header has {expected}")]
    ColumnMismatch { line: u64, expected: usize, found: usize },

    /// Underlying I/O error while reading the upload.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Non-structural CSV decoder error, passed through unchanged.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[cfg(feature = "excel")]
    /// Workbook decoder error (feature-gated behind `excel`), passed through unchanged.
    #[error("spreadsheet error: {0}")]
    Spreadsheet(#[from] calamine::Error),

    /// The upload format could not be determined or is not enabled.
    #[error("unsupported format: {message}")]
    UnsupportedFormat { message: String },

    /// The declared text encoding label is unknown.
    #[error("unsupported text encoding '{label}'")]
    UnsupportedEncoding { label: String },
}

/// Coarse failure taxonomy exposed to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// See [`IntakeError::EmptyFile`].
    EmptyFile,
    /// See [`IntakeError::InvalidFormat`].
    InvalidFormat,
    /// Anything else; the original error is preserved.
    Unclassified,
}

impl IntakeError {
    /// Classify this error into the three-kind taxonomy.
    pub fn kind(&self) -> FailureKind {
        match self {
            IntakeError::EmptyFile => FailureKind::EmptyFile,
            IntakeError::InvalidFormat { .. } => FailureKind::InvalidFormat,
            _ => FailureKind::Unclassified,
        }
    }

    /// Convert a decoder error, turning structural failures into [`IntakeError::InvalidFormat`].
    pub fn from_decoder<E>(err: E) -> Self
    where
        E: DecodeFailure + Into<IntakeError>,
    {
        if err.is_structural() {
            IntakeError::InvalidFormat {
                message: err.to_string(),
            }
        } else {
            err.into()
        }
    }
}

/// Classification capability every pluggable decoder error exposes.
pub trait DecodeFailure: std::error::Error {
    /// `true` when the input could not be tokenized as the expected format.
    fn is_structural(&self) -> bool;
}

/// Only bytes that cannot be decoded as UTF-8 are structural. A field-count mismatch is not a
/// tokenizing failure and stays unclassified.
impl DecodeFailure for csv::Error {
    fn is_structural(&self) -> bool {
        matches!(self.kind(), csv::ErrorKind::Utf8 { .. })
    }
}

#[cfg(feature = "excel")]
impl DecodeFailure for calamine::Error {
    // Workbook failures are surfaced as-is.
    fn is_structural(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn csv_error(input: &str) -> csv::Error {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(input.as_bytes());
        rdr.records()
            .find_map(Result::err)
            .expect("input should fail to decode")
    }

    #[test]
    fn unequal_lengths_stay_unclassified() {
        let err = IntakeError::from_decoder(csv_error("a,b\n1,2,3\n"));
        assert_eq!(err.kind(), FailureKind::Unclassified);
        assert!(matches!(err, IntakeError::Csv(_)));
    }

    #[test]
    fn column_mismatch_is_unclassified() {
        let err = IntakeError::ColumnMismatch {
            line: 3,
            expected: 2,
            found: 3,
        };
        assert_eq!(err.kind(), FailureKind::Unclassified);
        assert_eq!(err.to_string(), "row on line 3 has 3 fields, but the header has 2");
    }

    #[test]
    fn invalid_utf8_is_structural() {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(false)
            .from_reader(&b"a,\xff\xfe\n"[..]);
        let err = rdr.records().find_map(Result::err).unwrap();
        assert!(err.is_structural());
    }

    #[test]
    fn io_errors_propagate_unchanged() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "upload stream closed");
        let err = IntakeError::from_decoder(csv::Error::from(io));
        assert_eq!(err.kind(), FailureKind::Unclassified);
        match err {
            IntakeError::Csv(inner) => match inner.kind() {
                csv::ErrorKind::Io(io) => assert_eq!(io.to_string(), "upload stream closed"),
                other => panic!("unexpected csv error kind: {other:?}"),
            },
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn kind_of_empty_file() {
        assert_eq!(IntakeError::EmptyFile.kind(), FailureKind::EmptyFile);
    }
}
