//! Intake entrypoints and parser implementations.
//!
//! Most callers should use [`extract_file_information`] or [`preview_headers`] (from
//! [`unified`]) which:
//!
//! - pick a parser by explicit format, MIME type or file extension (see [`IntakeOptions`])
//! - parse the in-memory upload into a [`crate::types::FileInformation`] or a header list
//! - optionally report success/failure/alerts to an [`IntakeObserver`]
//!
//! Format-specific parsers are also available under:
//! - [`csv`]: full delimited-text parsing (header discovery + row counting)
//! - [`preview`]: first-row header preview
//! - [`excel`]: spreadsheet parsing and conversion (feature `excel`)

pub mod csv;
#[cfg(feature = "excel")]
pub mod excel;
mod grid;
pub mod input;
pub mod observability;
pub mod preview;
pub mod unified;

pub use grid::rename_headers;
pub use input::{RawUpload, UploadInput};
pub use observability::{
    CompositeObserver, FileObserver, IntakeContext, IntakeObserver, IntakeOperation, IntakeSeverity, IntakeStats,
    TracingObserver,
};
pub use unified::{extract_file_information, preview_headers, FileFormat, FileParser, IntakeOptions};
