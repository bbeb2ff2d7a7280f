use futures::executor::block_on;

use upload_intake::ingestion::{
    extract_file_information, preview_headers, FileFormat, FileParser, IntakeOptions, RawUpload,
};
use upload_intake::{FailureKind, IntakeError};

fn people_csv() -> RawUpload {
    RawUpload::new(std::fs::read("tests/fixtures/people.csv").unwrap()).with_file_name("people.csv")
}

#[test]
fn extract_dispatches_on_extension() {
    let info = block_on(extract_file_information(&people_csv(), &IntakeOptions::default())).unwrap();
    assert_eq!(info.headings, vec!["id", "name", "score", "active"]);
    assert_eq!(info.total_records, 2);
}

#[test]
fn extract_dispatches_on_mime_type() {
    let upload = RawUpload::new(b"a,b\n1,2\n".to_vec()).with_mime_type("text/csv");
    let info = block_on(extract_file_information(&upload, &IntakeOptions::default())).unwrap();
    assert_eq!(info.total_records, 1);
}

#[test]
fn forced_format_overrides_extension() {
    let upload = RawUpload::new(b"a,b\n1,2\n".to_vec()).with_file_name("export.dat");
    let opts = IntakeOptions {
        format: Some(FileFormat::DelimitedText),
        ..Default::default()
    };
    let info = block_on(extract_file_information(&upload, &opts)).unwrap();
    assert_eq!(info.headings, vec!["a", "b"]);
}

#[test]
fn missing_extension_is_unsupported() {
    let upload = RawUpload::new(b"a,b\n1,2\n".to_vec()).with_file_name("upload");
    let err = block_on(extract_file_information(&upload, &IntakeOptions::default())).unwrap_err();
    assert!(matches!(err, IntakeError::UnsupportedFormat { .. }));
    assert_eq!(err.kind(), FailureKind::Unclassified);
}

#[test]
fn preview_dispatches_to_header_preview() {
    let headers = block_on(preview_headers(&people_csv(), &IntakeOptions::default())).unwrap();
    assert_eq!(headers, vec!["id", "name", "score", "active"]);
}

#[test]
fn file_parser_reports_its_format() {
    let parser = FileParser::for_format(FileFormat::DelimitedText, &IntakeOptions::default()).unwrap();
    assert_eq!(parser.format(), FileFormat::DelimitedText);
    let info = block_on(parser.extract_file_information(&people_csv())).unwrap();
    assert_eq!(info.total_records, 2);
}

#[cfg(feature = "excel")]
mod spreadsheet {
    use super::*;

    fn people_xlsx() -> RawUpload {
        let mut wb = rust_xlsxwriter::Workbook::new();
        let ws = wb.add_worksheet();
        ws.write_string(0, 0, "id").unwrap();
        ws.write_string(0, 1, "").unwrap();
        ws.write_string(0, 2, "name").unwrap();
        ws.write_number(1, 0, 1).unwrap();
        ws.write_string(1, 2, "Ada").unwrap();
        ws.write_number(2, 0, 2).unwrap();
        ws.write_string(2, 2, "Grace").unwrap();
        RawUpload::new(wb.save_to_buffer().unwrap()).with_file_name("people.XLSX")
    }

    #[test]
    fn extract_dispatches_spreadsheets() {
        let info = block_on(extract_file_information(&people_xlsx(), &IntakeOptions::default())).unwrap();
        assert_eq!(info.headings, vec!["id", "EmptyHeading 1", "name"]);
        assert_eq!(info.total_records, 2);
    }

    #[test]
    fn spreadsheet_preview_goes_through_delimited_text() {
        let headers = block_on(preview_headers(&people_xlsx(), &IntakeOptions::default())).unwrap();
        // Raw headers: the empty cell stays empty, no substitution.
        assert_eq!(headers, vec!["id", "", "name"]);
    }
}
