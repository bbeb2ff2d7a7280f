use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use futures::executor::block_on;

use upload_intake::ingestion::{
    extract_file_information, preview_headers, CompositeObserver, FileFormat, FileObserver, IntakeContext,
    IntakeObserver, IntakeOperation, IntakeOptions, IntakeSeverity, IntakeStats, RawUpload, TracingObserver,
};
use upload_intake::IntakeError;

#[derive(Default)]
struct RecordingObserver {
    successes: Mutex<Vec<(IntakeOperation, IntakeStats)>>,
    failures: Mutex<Vec<IntakeSeverity>>,
    alerts: Mutex<Vec<IntakeSeverity>>,
}

impl IntakeObserver for RecordingObserver {
    fn on_success(&self, ctx: &IntakeContext, stats: IntakeStats) {
        self.successes.lock().unwrap().push((ctx.operation, stats));
    }

    fn on_failure(&self, _ctx: &IntakeContext, severity: IntakeSeverity, _error: &IntakeError) {
        self.failures.lock().unwrap().push(severity);
    }

    fn on_alert(&self, _ctx: &IntakeContext, severity: IntakeSeverity, _error: &IntakeError) {
        self.alerts.lock().unwrap().push(severity);
    }
}

fn csv_upload(body: &str) -> RawUpload {
    RawUpload::new(body.as_bytes().to_vec()).with_file_name("upload.csv")
}

#[test]
fn observer_receives_success_stats() {
    let obs = Arc::new(RecordingObserver::default());
    let opts = IntakeOptions {
        observer: Some(obs.clone()),
        ..Default::default()
    };

    block_on(extract_file_information(&csv_upload("a,b\n1,2\n3,4\n"), &opts)).unwrap();
    block_on(preview_headers(&csv_upload("a,b\n1,2\n"), &opts)).unwrap();

    let successes = obs.successes.lock().unwrap().clone();
    assert_eq!(
        successes,
        vec![
            (
                IntakeOperation::ExtractFileInformation,
                IntakeStats {
                    headings: 2,
                    total_records: 2
                }
            ),
            (
                IntakeOperation::PreviewHeaders,
                IntakeStats {
                    headings: 2,
                    total_records: 0
                }
            ),
        ]
    );
}

#[test]
fn empty_file_is_a_warning_without_alert() {
    let obs = Arc::new(RecordingObserver::default());
    let opts = IntakeOptions {
        observer: Some(obs.clone()),
        alert_at_or_above: IntakeSeverity::Critical,
        ..Default::default()
    };

    let _ = block_on(extract_file_information(&csv_upload("a,b\n"), &opts)).unwrap_err();

    assert_eq!(obs.failures.lock().unwrap().clone(), vec![IntakeSeverity::Warning]);
    assert!(obs.alerts.lock().unwrap().is_empty());
}

#[test]
fn alert_threshold_is_honored() {
    let obs = Arc::new(RecordingObserver::default());
    let opts = IntakeOptions {
        format: Some(FileFormat::DelimitedText),
        observer: Some(obs.clone()),
        alert_at_or_above: IntakeSeverity::Warning,
        ..Default::default()
    };

    let _ = block_on(extract_file_information(&csv_upload("a,b\n1,2,3\n"), &opts)).unwrap_err();

    assert_eq!(obs.failures.lock().unwrap().clone(), vec![IntakeSeverity::Warning]);
    assert_eq!(obs.alerts.lock().unwrap().clone(), vec![IntakeSeverity::Warning]);
}

#[test]
fn composite_and_file_observers_record_events() {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let log_path = std::env::temp_dir().join(format!("upload-intake-observer-{nanos}.log"));

    let recording = Arc::new(RecordingObserver::default());
    let observers: Vec<Arc<dyn IntakeObserver>> = vec![
        recording.clone(),
        Arc::new(FileObserver::new(&log_path)),
        Arc::new(TracingObserver),
    ];
    let composite = CompositeObserver::new(observers);
    let opts = IntakeOptions {
        observer: Some(Arc::new(composite)),
        ..Default::default()
    };

    block_on(extract_file_information(&csv_upload("a,b\n1,2\n"), &opts)).unwrap();
    let _ = block_on(extract_file_information(&csv_upload(""), &opts)).unwrap_err();

    assert_eq!(recording.successes.lock().unwrap().len(), 1);
    let log = std::fs::read_to_string(&log_path).unwrap();
    let lines: Vec<&str> = log.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].contains(" ok op=ExtractFileInformation format=DelimitedText file=upload.csv"));
    assert!(lines[1].contains("fail severity=Warning"));
    assert!(lines[1].contains("empty file"));

    let _ = std::fs::remove_file(&log_path);
}
