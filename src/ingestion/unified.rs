//! Unified intake entrypoints.
//!
//! Most callers should use [`extract_file_information`] or [`preview_headers`], which:
//!
//! - pick the parser from [`IntakeOptions::format`], else the upload's MIME type, else its file
//!   name extension
//! - run it against the in-memory upload
//! - report success/failure/alerts to an optional [`IntakeObserver`]
//!
//! Callers that already know the format can build a [`FileParser`] directly.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use tracing::instrument;

use crate::error::{IntakeError, IntakeResult};
use crate::types::FileInformation;

use super::csv::{DelimitedTextOptions, DelimitedTextParser};
#[cfg(feature = "excel")]
use super::excel::{SpreadsheetOptions, SpreadsheetParser};
use super::input::RawUpload;
use super::observability::{IntakeContext, IntakeObserver, IntakeOperation, IntakeSeverity, IntakeStats};
use super::preview::{HeaderPreviewOptions, HeaderPreviewParser};

/// Supported upload formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    /// Comma-separated (or otherwise delimited) text.
    DelimitedText,
    /// Spreadsheet/workbook formats (feature-gated behind `excel`).
    Spreadsheet,
}

impl FileFormat {
    /// Parse a format from a file extension (case-insensitive).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "csv" | "txt" => Some(Self::DelimitedText),
            "xlsx" | "xls" | "xlsm" | "xlsb" | "ods" => Some(Self::Spreadsheet),
            _ => None,
        }
    }

    /// Parse a format from a MIME type, ignoring parameters such as `charset`.
    pub fn from_mime_type(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or_default().trim().to_ascii_lowercase();
        match essence.as_str() {
            "text/csv" | "application/csv" | "text/plain" => Some(Self::DelimitedText),
            "application/vnd.ms-excel"
            | "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            | "application/vnd.ms-excel.sheet.macroenabled.12"
            | "application/vnd.ms-excel.sheet.binary.macroenabled.12"
            | "application/vnd.oasis.opendocument.spreadsheet" => Some(Self::Spreadsheet),
            _ => None,
        }
    }
}

/// Options controlling unified intake behavior.
///
/// Use [`Default`] for common cases.
#[derive(Clone)]
pub struct IntakeOptions {
    /// If `None`, detect the format from the upload's MIME type or file name.
    pub format: Option<FileFormat>,
    /// Options for full delimited-text parsing.
    pub delimited_text: DelimitedTextOptions,
    /// Options for header previews.
    pub preview: HeaderPreviewOptions,
    #[cfg(feature = "excel")]
    /// Spreadsheet-specific options.
    pub spreadsheet: SpreadsheetOptions,
    /// Optional observer for logging/alerts.
    pub observer: Option<Arc<dyn IntakeObserver>>,
    /// Severity threshold at which `on_alert` is invoked.
    pub alert_at_or_above: IntakeSeverity,
}

impl fmt::Debug for IntakeOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("IntakeOptions");
        s.field("format", &self.format)
            .field("delimited_text", &self.delimited_text)
            .field("preview", &self.preview);
        #[cfg(feature = "excel")]
        s.field("spreadsheet", &self.spreadsheet);
        s.field("observer_set", &self.observer.is_some())
            .field("alert_at_or_above", &self.alert_at_or_above)
            .finish()
    }
}

impl Default for IntakeOptions {
    fn default() -> Self {
        Self {
            format: None,
            delimited_text: DelimitedTextOptions::default(),
            preview: HeaderPreviewOptions::default(),
            #[cfg(feature = "excel")]
            spreadsheet: SpreadsheetOptions::default(),
            observer: None,
            alert_at_or_above: IntakeSeverity::Critical,
        }
    }
}

/// A parser selected by format tag.
#[derive(Debug, Clone)]
pub enum FileParser {
    /// Streaming delimited-text parsing.
    DelimitedText {
        parser: DelimitedTextParser,
        preview: HeaderPreviewParser,
    },
    #[cfg(feature = "excel")]
    /// Blocking workbook parsing; previews go through a delimited-text conversion.
    Spreadsheet {
        parser: SpreadsheetParser,
        preview: HeaderPreviewParser,
    },
}

impl FileParser {
    /// Build the parser for `format`.
    ///
    /// Fails with [`IntakeError::UnsupportedFormat`] for spreadsheets when the `excel` feature is
    /// disabled.
    pub fn for_format(format: FileFormat, options: &IntakeOptions) -> IntakeResult<Self> {
        match format {
            FileFormat::DelimitedText => Ok(Self::DelimitedText {
                parser: DelimitedTextParser::new(options.delimited_text.clone()),
                preview: HeaderPreviewParser::new(options.preview.clone()),
            }),
            #[cfg(feature = "excel")]
            FileFormat::Spreadsheet => Ok(Self::Spreadsheet {
                parser: SpreadsheetParser::new(options.spreadsheet.clone()),
                // Conversion always emits comma-separated text.
                preview: HeaderPreviewParser::new(HeaderPreviewOptions {
                    delimiter: Some(b','),
                    ..options.preview.clone()
                }),
            }),
            #[cfg(not(feature = "excel"))]
            FileFormat::Spreadsheet => Err(IntakeError::UnsupportedFormat {
                message: "spreadsheet intake not enabled (enable cargo feature 'excel')".to_string(),
            }),
        }
    }

    /// Format handled by this parser.
    pub fn format(&self) -> FileFormat {
        match self {
            Self::DelimitedText { .. } => FileFormat::DelimitedText,
            #[cfg(feature = "excel")]
            Self::Spreadsheet { .. } => FileFormat::Spreadsheet,
        }
    }

    /// Parse the upload into a [`FileInformation`].
    pub async fn extract_file_information(&self, upload: &RawUpload) -> IntakeResult<FileInformation> {
        match self {
            Self::DelimitedText { parser, .. } => parser.extract_file_information(upload).await,
            #[cfg(feature = "excel")]
            Self::Spreadsheet { parser, .. } => parser.extract_file_information(upload),
        }
    }

    /// Read the raw header row of the upload.
    pub async fn preview_headers(&self, upload: &RawUpload) -> IntakeResult<Vec<String>> {
        match self {
            Self::DelimitedText { preview, .. } => preview.preview_headers(upload).await,
            #[cfg(feature = "excel")]
            Self::Spreadsheet { parser, preview } => {
                let text = parser.convert_to_delimited_text(upload)?;
                preview.preview_headers(&text).await
            }
        }
    }
}

/// Unified intake entry point: parse an upload into a [`FileInformation`].
///
/// When an observer is configured, this function reports:
///
/// - `on_success` on success, with heading/record counts
/// - `on_failure` on failure, with a computed severity
/// - `on_alert` on failure when the computed severity is >= `options.alert_at_or_above`
///
/// # Examples
///
/// ```no_run
/// use upload_intake::ingestion::{extract_file_information, IntakeOptions, RawUpload};
///
/// # fn main() -> Result<(), upload_intake::IntakeError> {
/// let upload = RawUpload::new(std::fs::read("people.csv")?).with_file_name("people.csv");
/// let info = futures::executor::block_on(extract_file_information(&upload, &IntakeOptions::default()))?;
/// println!("headings={:?} records={}", info.headings, info.total_records);
/// # Ok(())
/// # }
/// ```
#[instrument(skip_all, fields(file = ?upload.file_name))]
pub async fn extract_file_information(upload: &RawUpload, options: &IntakeOptions) -> IntakeResult<FileInformation> {
    let parser = FileParser::for_format(resolve_format(upload, options)?, options)?;
    let result = parser.extract_file_information(upload).await;

    let ctx = context(upload, parser.format(), IntakeOperation::ExtractFileInformation);
    report(options, &ctx, &result, |info| IntakeStats {
        headings: info.headings.len(),
        total_records: info.total_records,
    });
    result
}

/// Unified header preview: return the raw first row of an upload.
#[instrument(skip_all, fields(file = ?upload.file_name))]
pub async fn preview_headers(upload: &RawUpload, options: &IntakeOptions) -> IntakeResult<Vec<String>> {
    let parser = FileParser::for_format(resolve_format(upload, options)?, options)?;
    let result = parser.preview_headers(upload).await;

    let ctx = context(upload, parser.format(), IntakeOperation::PreviewHeaders);
    report(options, &ctx, &result, |headers| IntakeStats {
        headings: headers.len(),
        total_records: 0,
    });
    result
}

/// Resolve the format of an upload: explicit option, then MIME type, then file extension.
pub fn resolve_format(upload: &RawUpload, options: &IntakeOptions) -> IntakeResult<FileFormat> {
    if let Some(format) = options.format {
        return Ok(format);
    }
    if let Some(format) = upload.mime_type.as_deref().and_then(FileFormat::from_mime_type) {
        return Ok(format);
    }

    let name = upload.file_name.as_deref().ok_or_else(|| IntakeError::UnsupportedFormat {
        message: "cannot infer format: upload has no file name or known MIME type".to_string(),
    })?;
    let ext = Path::new(name)
        .extension()
        .and_then(|s| s.to_str())
        .ok_or_else(|| IntakeError::UnsupportedFormat {
            message: format!("cannot infer format: file name has no extension ({name})"),
        })?;

    FileFormat::from_extension(ext).ok_or_else(|| IntakeError::UnsupportedFormat {
        message: format!("cannot infer format from extension '{ext}' ({name})"),
    })
}

fn context(upload: &RawUpload, format: FileFormat, operation: IntakeOperation) -> IntakeContext {
    IntakeContext {
        file_name: upload.file_name.clone(),
        format,
        operation,
    }
}

fn report<T>(
    options: &IntakeOptions,
    ctx: &IntakeContext,
    result: &IntakeResult<T>,
    stats: impl FnOnce(&T) -> IntakeStats,
) {
    let Some(obs) = options.observer.as_ref() else {
        return;
    };
    match result {
        Ok(value) => obs.on_success(ctx, stats(value)),
        Err(e) => {
            let sev = severity_for_error(e);
            obs.on_failure(ctx, sev, e);
            if sev >= options.alert_at_or_above {
                obs.on_alert(ctx, sev, e);
            }
        }
    }
}

/// Severity used for observer callbacks.
pub fn severity_for_error(e: &IntakeError) -> IntakeSeverity {
    match e {
        IntakeError::EmptyFile | IntakeError::InvalidFormat { .. } | IntakeError::ColumnMismatch { .. } => {
            IntakeSeverity::Warning
        }
        IntakeError::Io(_) => IntakeSeverity::Critical,
        IntakeError::Csv(err) => match err.kind() {
            ::csv::ErrorKind::Io(_) => IntakeSeverity::Critical,
            _ => IntakeSeverity::Error,
        },
        #[cfg(feature = "excel")]
        IntakeError::Spreadsheet(calamine::Error::Io(_)) => IntakeSeverity::Critical,
        #[cfg(feature = "excel")]
        IntakeError::Spreadsheet(_) => IntakeSeverity::Error,
        IntakeError::UnsupportedFormat { .. } | IntakeError::UnsupportedEncoding { .. } => IntakeSeverity::Error,
    }
}
