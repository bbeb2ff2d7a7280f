//! `upload-intake` turns user-uploaded tabular files (CSV and spreadsheets) into one normalized
//! in-memory shape, [`types::FileInformation`]: column headings, keyed row records and a record
//! count.
//!
//! The primary entrypoints are [`ingestion::extract_file_information`] and
//! [`ingestion::preview_headers`], which pick a parser from the upload's declared format, MIME
//! type or file extension.
//!
//! ## What you can ingest
//!
//! - **Delimited text**: `.csv`, `.txt`. Parsed as a stream of row events in header-discovery
//!   mode: headings are de-duplicated (`Name, Name` → `Name, Name_1`) and rows are counted.
//! - **Spreadsheets** (Cargo feature `excel`, on by default): `.xlsx`, `.xls`, `.xlsm`, `.xlsb`,
//!   `.ods`. The first sheet is parsed into headings and keyed records; empty headings are
//!   replaced with `EmptyHeading 1`, `EmptyHeading 2`, ...
//!
//! Failures are [`IntakeError`]s; [`IntakeError::kind`] folds them into
//! [`error::FailureKind::EmptyFile`], [`error::FailureKind::InvalidFormat`] or
//! [`error::FailureKind::Unclassified`] (the decoder's own error, untouched).
//!
//! ## Quick example: header discovery
//!
//! ```rust
//! use futures::executor::block_on;
//! use upload_intake::ingestion::csv::DelimitedTextParser;
//! use upload_intake::IntakeError;
//!
//! let parser = DelimitedTextParser::default();
//! let info = block_on(parser.extract_file_information("Name,Name,Age\nAda,Lovelace,36\n")).unwrap();
//! assert_eq!(info.headings, vec!["Name", "Name_1", "Age"]);
//! assert_eq!(info.total_records, 1);
//! // Rows are counted, not kept.
//! assert!(info.data.is_empty());
//!
//! let err = block_on(parser.extract_file_information("Name,Age\n")).unwrap_err();
//! assert!(matches!(err, IntakeError::EmptyFile));
//! ```
//!
//! ## Modules
//!
//! - [`ingestion`]: unified entrypoints and format-specific parsers
//! - [`types`]: cell, record and file information types
//! - [`error`]: error types and decoder failure classification

pub mod error;
pub mod ingestion;
pub mod types;

pub use error::{FailureKind, IntakeError, IntakeResult};
