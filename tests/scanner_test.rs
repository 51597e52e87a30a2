//! Orchestrator tests: single-shot persistence, polling halt-on-success,
//! the in-flight guard, and deterministic cancellation.

use std::sync::Arc;
use std::time::Duration;

use platewatch::config::{PipelineConfig, ScannerConfig};
use platewatch::pipeline::RecognitionPipeline;
use platewatch::scanner::{PlateScanner, WatchEvent, MANUAL_CONFIDENCE};
use platewatch::store::MemoryScanStore;
use platewatch::testing::{
    synthetic_plate_frame, DisconnectedCamera, ScriptedDetector, ScriptedRecognizer,
    SyntheticCamera,
};
use platewatch::types::{DeviceType, PlateSource};
use tokio::time::timeout;

fn scanner_with(
    detector: ScriptedDetector,
    recognizer: ScriptedRecognizer,
    scans: Arc<MemoryScanStore>,
    poll_interval_ms: u64,
) -> PlateScanner {
    let pipeline = RecognitionPipeline::new(
        Arc::new(detector),
        Arc::new(recognizer),
        PipelineConfig::default(),
    );
    PlateScanner::new(
        Arc::new(pipeline),
        scans,
        ScannerConfig {
            poll_interval_ms,
            ..ScannerConfig::default()
        },
    )
}

#[tokio::test]
async fn test_single_shot_success_persists_scan() {
    let scans = Arc::new(MemoryScanStore::new());
    let scanner = scanner_with(
        ScriptedDetector::new(0.7, vec![0.9]),
        ScriptedRecognizer::reading("51f23891", 0.88, 1),
        scans.clone(),
        2000,
    );

    let frame = synthetic_plate_frame(0, 64, 64);
    let report = scanner
        .scan_frame(frame, PlateSource::Upload, Some("user-1"))
        .await;
    assert!(report.success);

    // Persistence is fire-and-forget; give the write a moment to land
    tokio::time::sleep(Duration::from_millis(100)).await;
    let stored = scans.scans();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].plate_number, "51F23891");
    assert_eq!(stored[0].user_id, "user-1");
    assert_eq!(stored[0].device_type, DeviceType::Upload);
    assert!((stored[0].confidence - 0.88).abs() < 1e-6);
}

#[tokio::test]
async fn test_single_shot_without_user_skips_persistence() {
    let scans = Arc::new(MemoryScanStore::new());
    let scanner = scanner_with(
        ScriptedDetector::new(0.7, vec![0.9]),
        ScriptedRecognizer::reading("51f23891", 0.88, 1),
        scans.clone(),
        2000,
    );

    let frame = synthetic_plate_frame(0, 64, 64);
    let report = scanner.scan_frame(frame, PlateSource::Upload, None).await;
    assert!(report.success);

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(scans.is_empty());
}

#[tokio::test]
async fn test_single_shot_failure_still_reports() {
    let scans = Arc::new(MemoryScanStore::new());
    let scanner = scanner_with(
        ScriptedDetector::new(0.7, vec![0.3]),
        ScriptedRecognizer::reading("51f23891", 0.88, 1),
        scans.clone(),
        2000,
    );

    let frame = synthetic_plate_frame(0, 64, 64);
    let report = scanner
        .scan_frame(frame, PlateSource::Upload, Some("user-1"))
        .await;
    assert!(!report.success);
    assert!(report.message.is_some());

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(scans.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_polling_emits_once_and_halts() {
    // Tick 1: 0.65 (below threshold), tick 2: 0.92 (above). Exactly one
    // emission, then the loop terminates on its own.
    let scans = Arc::new(MemoryScanStore::new());
    let detector = ScriptedDetector::new(0.7, vec![0.65, 0.92]);
    let scanner = scanner_with(
        detector,
        ScriptedRecognizer::reading("43a 123 45", 0.9, 4),
        scans.clone(),
        50,
    );

    let camera = Arc::new(SyntheticCamera::new(64, 64));
    let mut session = scanner.start_watch(camera.clone(), Some("user-1".to_string()));

    let event = timeout(Duration::from_secs(2), session.next_event())
        .await
        .expect("a detection must arrive within two seconds")
        .expect("channel open until first detection");

    let WatchEvent::Detected(candidate) = event else {
        panic!("expected a detection event");
    };
    // Cleanup strips the spaces before validation, so the compact form wins
    assert_eq!(candidate.text, "43A12345");
    assert_eq!(candidate.source, PlateSource::Camera);

    // Loop halts after the first success: channel closes, no more events
    let end = timeout(Duration::from_secs(1), session.next_event())
        .await
        .expect("channel must close after detection");
    assert!(end.is_none());

    // Polling stopped: frame count stays put
    let frames_at_halt = camera.captured();
    assert!(frames_at_halt >= 2, "both scripted ticks must have polled");
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(camera.captured(), frames_at_halt);

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(scans.len(), 1, "the successful detection is persisted");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_overlapping_ticks_are_skipped() {
    // Inference takes ~6 tick intervals; the guard must keep every
    // intermediate tick from starting a second inference.
    let scans = Arc::new(MemoryScanStore::new());
    let detector = Arc::new(ScriptedDetector::new(0.7, vec![0.95]));
    let recognizer = Arc::new(
        ScriptedRecognizer::reading("51F23891", 0.9, 1).with_delay(Duration::from_millis(300)),
    );

    let pipeline = RecognitionPipeline::new(
        detector.clone(),
        recognizer.clone(),
        PipelineConfig::default(),
    );
    let scanner = PlateScanner::new(
        Arc::new(pipeline),
        scans,
        ScannerConfig {
            poll_interval_ms: 50,
            ..ScannerConfig::default()
        },
    );

    let camera = Arc::new(SyntheticCamera::new(64, 64));
    let mut session = scanner.start_watch(camera.clone(), None);

    let event = timeout(Duration::from_secs(2), session.next_event())
        .await
        .expect("slow inference still completes")
        .expect("detection event");
    assert!(matches!(event, WatchEvent::Detected(_)));

    assert_eq!(
        detector.invocations(),
        1,
        "ticks during the in-flight inference must be skipped"
    );
    assert_eq!(recognizer.invocations(), 1);
    assert_eq!(camera.captured(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_stop_cancels_polling_deterministically() {
    let scans = Arc::new(MemoryScanStore::new());
    // Script never clears the threshold: the loop would poll forever
    let detector = Arc::new(ScriptedDetector::new(0.7, vec![0.1; 100]));
    let pipeline = RecognitionPipeline::new(
        detector.clone(),
        Arc::new(ScriptedRecognizer::new(Vec::new())),
        PipelineConfig::default(),
    );
    let scanner = PlateScanner::new(
        Arc::new(pipeline),
        scans,
        ScannerConfig {
            poll_interval_ms: 30,
            ..ScannerConfig::default()
        },
    );

    let camera = Arc::new(SyntheticCamera::new(64, 64));
    let session = scanner.start_watch(camera.clone(), None);

    tokio::time::sleep(Duration::from_millis(150)).await;
    assert!(!session.is_finished(), "no detection, loop keeps polling");
    let polled_before_stop = detector.invocations();
    assert!(polled_before_stop >= 2, "several ticks must have run");

    session.stop().await;

    // Timer is cleared: no further captures once any in-flight tick drains
    tokio::time::sleep(Duration::from_millis(30)).await;
    let frames_after_stop = camera.captured();
    tokio::time::sleep(Duration::from_millis(120)).await;
    assert_eq!(camera.captured(), frames_after_stop);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_capture_errors_surface_and_polling_continues() {
    let scans = Arc::new(MemoryScanStore::new());
    let scanner = scanner_with(
        ScriptedDetector::new(0.7, Vec::new()),
        ScriptedRecognizer::new(Vec::new()),
        scans,
        40,
    );

    let mut session = scanner.start_watch(Arc::new(DisconnectedCamera), None);

    let first = timeout(Duration::from_secs(1), session.next_event())
        .await
        .expect("capture error must surface")
        .expect("channel open");
    assert!(matches!(first, WatchEvent::Error(_)));

    // The loop retries rather than terminating on capture failure
    let second = timeout(Duration::from_secs(1), session.next_event())
        .await
        .expect("polling continues after a capture error")
        .expect("channel open");
    assert!(matches!(second, WatchEvent::Error(_)));

    session.stop().await;
}

#[tokio::test]
async fn test_manual_entry_bypasses_pipeline() {
    let scans = Arc::new(MemoryScanStore::new());
    let scanner = scanner_with(
        ScriptedDetector::new(0.7, Vec::new()),
        ScriptedRecognizer::new(Vec::new()),
        scans,
        2000,
    );

    let candidate = scanner.submit_manual("43a12345");
    assert_eq!(candidate.text, "43A-12345");
    assert_eq!(candidate.confidence, MANUAL_CONFIDENCE);
    assert_eq!(candidate.source, PlateSource::Manual);
}
