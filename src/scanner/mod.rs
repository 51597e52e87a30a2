//! Recognition orchestrator.
//!
//! Drives the pipeline in two modes: single-shot (uploads, manual entry)
//! and camera polling. The polling loop runs one inference at a time (an
//! explicit in-flight guard skips any tick whose predecessor is still
//! working) and terminates on the first successful detection. Stopping a
//! session deterministically cancels the timer; there is no detached
//! background work.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};

use crate::config::ScannerConfig;
use crate::errors::PlateWatchError;
use crate::pipeline::RecognitionPipeline;
use crate::store::{PlateScanRecord, ScanStore};
use crate::types::{ImageFrame, PlateCandidate, PlateSource, ProcessingStage, ScanReport};

/// Confidence assigned to manually entered plates.
pub const MANUAL_CONFIDENCE: f32 = 0.9;

/// Source of camera frames. The dashboard backs this with its video
/// element plumbing; tests and the CLI use synthetic cameras.
pub trait FrameSource: Send + Sync {
    fn capture_frame(&self) -> Result<ImageFrame, PlateWatchError>;
}

/// Event emitted by a polling session.
#[derive(Debug, Clone)]
pub enum WatchEvent {
    /// A plate was recognized; the session halts after emitting this.
    Detected(PlateCandidate),
    /// Frame capture failed this tick; polling continues.
    Error(String),
}

/// Handle to a running polling session.
///
/// Events arrive through [`WatchSession::next_event`]; the channel closes
/// when the loop halts (first detection or [`WatchSession::stop`]).
/// Dropping the session aborts the loop.
pub struct WatchSession {
    events: mpsc::UnboundedReceiver<WatchEvent>,
    stop: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl WatchSession {
    pub async fn next_event(&mut self) -> Option<WatchEvent> {
        self.events.recv().await
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Cancel the polling timer and wait for the loop to wind down.
    pub async fn stop(mut self) {
        let _ = self.stop.send(true);
        let _ = (&mut self.task).await;
    }
}

impl Drop for WatchSession {
    fn drop(&mut self) {
        if !self.task.is_finished() {
            self.task.abort();
        }
    }
}

enum TickOutcome {
    Report(ScanReport),
    CaptureFailed(String),
}

/// Orchestrates detection, recognition, validation, and persistence.
pub struct PlateScanner {
    pipeline: Arc<RecognitionPipeline>,
    scans: Arc<dyn ScanStore>,
    config: ScannerConfig,
    stage: Arc<Mutex<ProcessingStage>>,
}

impl PlateScanner {
    pub fn new(
        pipeline: Arc<RecognitionPipeline>,
        scans: Arc<dyn ScanStore>,
        config: ScannerConfig,
    ) -> Self {
        Self {
            pipeline,
            scans,
            config,
            stage: Arc::new(Mutex::new(ProcessingStage::Idle)),
        }
    }

    /// Current stage of the recognition cycle, for UI display.
    pub fn stage(&self) -> ProcessingStage {
        *self.stage.lock().expect("stage lock poisoned")
    }

    /// Run the full pipeline over one frame, exactly once.
    ///
    /// Always returns a report; on success the scan record is written
    /// fire-and-forget when a user is signed in.
    pub async fn scan_frame(
        &self,
        frame: ImageFrame,
        source: PlateSource,
        user_id: Option<&str>,
    ) -> ScanReport {
        let pipeline = self.pipeline.clone();
        let stage = self.stage.clone();
        let report = tokio::task::spawn_blocking(move || run_cycle(&pipeline, &frame, source, &stage))
            .await
            .unwrap_or_else(|e| {
                log::error!("Inference task failed: {}", e);
                ScanReport::failure(0.0, format!("inference task failed: {}", e))
            });

        if report.success {
            if let Some(candidate) = report.candidate.as_ref() {
                persist_scan(&self.scans, candidate, user_id);
            }
        }
        report
    }

    /// Decode-and-scan convenience for the upload path.
    pub async fn scan_image(
        &self,
        image: &image::DynamicImage,
        user_id: Option<&str>,
    ) -> ScanReport {
        let frame = ImageFrame::from_dynamic_image(image, "upload");
        self.scan_frame(frame, PlateSource::Upload, user_id).await
    }

    /// Accept a manually entered plate.
    ///
    /// Trims, uppercases, and inserts the dash separator when missing.
    /// Manual entries carry a fixed confidence and skip the grammar check,
    /// matching the dashboard behavior for typed input.
    pub fn submit_manual(&self, input: &str) -> PlateCandidate {
        let trimmed = input.trim().to_uppercase();

        let formatted = if !trimmed.contains('-') && trimmed.chars().count() >= 5 {
            let prefix: String = trimmed.chars().take(3).collect();
            let rest: String = trimmed.chars().skip(3).collect();
            format!("{}-{}", prefix, rest)
        } else {
            trimmed.clone()
        };

        log::info!("Manual plate entry: {}", formatted);
        PlateCandidate::new(input.trim().to_string(), formatted, MANUAL_CONFIDENCE, PlateSource::Manual)
    }

    /// Start a camera polling session.
    ///
    /// Every `poll_interval_ms` the source is asked for a frame and the
    /// pipeline runs over it; the first successful recognition is emitted,
    /// persisted, and ends the session.
    pub fn start_watch(
        &self,
        source: Arc<dyn FrameSource>,
        user_id: Option<String>,
    ) -> WatchSession {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (stop_tx, stop_rx) = watch::channel(false);

        let task = tokio::spawn(watch_loop(
            self.pipeline.clone(),
            self.scans.clone(),
            self.stage.clone(),
            source,
            user_id,
            Duration::from_millis(self.config.poll_interval_ms),
            event_tx,
            stop_rx,
        ));

        WatchSession {
            events: event_rx,
            stop: stop_tx,
            task,
        }
    }
}

/// One recognition cycle with stage bookkeeping:
/// idle -> detecting -> recognizing -> idle.
fn run_cycle(
    pipeline: &RecognitionPipeline,
    frame: &ImageFrame,
    source: PlateSource,
    stage: &Arc<Mutex<ProcessingStage>>,
) -> ScanReport {
    set_stage(stage, ProcessingStage::Detecting);
    let quality = pipeline.assess(frame);
    let detection = pipeline.detect(frame, quality);

    let report = if detection.detected {
        set_stage(stage, ProcessingStage::Recognizing);
        pipeline.recognize(frame, &detection, quality, source)
    } else {
        ScanReport::miss(
            quality,
            detection.confidence,
            "No plate region found in frame",
        )
    };

    set_stage(stage, ProcessingStage::Idle);
    report
}

fn set_stage(stage: &Arc<Mutex<ProcessingStage>>, value: ProcessingStage) {
    *stage.lock().expect("stage lock poisoned") = value;
}

/// Write a scan record without blocking the caller. Failures are logged;
/// a scan that cannot be persisted is still reported to the UI.
fn persist_scan(scans: &Arc<dyn ScanStore>, candidate: &PlateCandidate, user_id: Option<&str>) {
    let Some(user_id) = user_id else {
        log::debug!("No signed-in user, skipping scan persistence");
        return;
    };

    let record = PlateScanRecord {
        user_id: user_id.to_string(),
        plate_number: scan_safe_plate(&candidate.text),
        confidence: candidate.confidence,
        device_type: candidate.source.device_type(),
        scanned_at: Utc::now(),
    };

    let scans = scans.clone();
    tokio::task::spawn_blocking(move || {
        if let Err(e) = scans.insert_scan(record) {
            log::warn!("Failed to persist scan: {}", e);
        }
    });
}

/// Project a display plate onto the charset the scan store accepts
/// (uppercase alphanumerics and dashes; the dot separator is dropped).
fn scan_safe_plate(plate: &str) -> String {
    plate
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

#[allow(clippy::too_many_arguments)]
async fn watch_loop(
    pipeline: Arc<RecognitionPipeline>,
    scans: Arc<dyn ScanStore>,
    stage: Arc<Mutex<ProcessingStage>>,
    source: Arc<dyn FrameSource>,
    user_id: Option<String>,
    poll_interval: Duration,
    event_tx: mpsc::UnboundedSender<WatchEvent>,
    mut stop_rx: watch::Receiver<bool>,
) {
    let mut ticker = interval(poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let in_flight = Arc::new(AtomicBool::new(false));
    let (result_tx, mut result_rx) = mpsc::unbounded_channel::<TickOutcome>();

    log::info!("Watch session started, polling every {:?}", poll_interval);

    loop {
        tokio::select! {
            changed = stop_rx.changed() => {
                if changed.is_err() || *stop_rx.borrow() {
                    log::info!("Watch session stopped");
                    break;
                }
            }
            Some(outcome) = result_rx.recv() => {
                match outcome {
                    TickOutcome::Report(report) if report.success => {
                        if let Some(candidate) = report.candidate {
                            persist_scan(&scans, &candidate, user_id.as_deref());
                            let _ = event_tx.send(WatchEvent::Detected(candidate));
                        }
                        // One successful detection ends the session
                        log::info!("Plate detected, watch session complete");
                        break;
                    }
                    TickOutcome::Report(report) => {
                        log::debug!(
                            "No plate this tick (confidence {:.2}): {}",
                            report.confidence,
                            report.message.as_deref().unwrap_or("")
                        );
                    }
                    TickOutcome::CaptureFailed(message) => {
                        log::warn!("Frame capture failed: {}", message);
                        let _ = event_tx.send(WatchEvent::Error(message));
                    }
                }
            }
            _ = ticker.tick() => {
                if in_flight.swap(true, Ordering::SeqCst) {
                    // Previous tick's inference is still running
                    log::debug!("Inference in flight, skipping tick");
                    continue;
                }

                let pipeline = pipeline.clone();
                let source = source.clone();
                let stage = stage.clone();
                let guard = in_flight.clone();
                let tx = result_tx.clone();

                tokio::task::spawn_blocking(move || {
                    let outcome = match source.capture_frame() {
                        Ok(frame) => TickOutcome::Report(run_cycle(
                            &pipeline,
                            &frame,
                            PlateSource::Camera,
                            &stage,
                        )),
                        Err(e) => TickOutcome::CaptureFailed(e.to_string()),
                    };
                    guard.store(false, Ordering::SeqCst);
                    let _ = tx.send(outcome);
                });
            }
        }
    }
}
