//! Recorder front-end
//!
//! Owns the lifecycle state machine, the capture source, and the encoding
//! context, and mirrors the context's notifications onto a caller-held event
//! receiver. All commands are fire-and-forget except `stop`, which blocks
//! until the final data notification has been delivered.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread;
use std::time::Duration as StdDuration;

use crossbeam_channel::{unbounded, Receiver, Sender};
use thiserror::Error;

use crate::application::ports::{CaptureError, CaptureFormat, CaptureSource};
use crate::application::worker::{
    spawn_worker, CaptureSink, EncoderCommand, EncoderEvent, EncoderFactory, PipelineState,
    UpstreamEvent,
};
use crate::domain::config::RecorderConfig;
use crate::domain::error::InvalidStateTransition;
use crate::domain::mime::ContainerFormat;
use crate::domain::recording::{EncodedChunk, RecorderState, RecordingSession};

/// Errors returned synchronously by recorder operations
#[derive(Debug, Clone, Error)]
pub enum RecorderError {
    #[error(transparent)]
    InvalidState(#[from] InvalidStateTransition),

    #[error("invalid timeslice: {0} ms (must not be negative)")]
    InvalidTimeslice(i64),

    #[error("unsupported MIME type: \"{0}\"")]
    UnsupportedMime(String),

    #[error(transparent)]
    Capture(#[from] CaptureError),

    #[error("encoding failed: {name}: {detail}")]
    Encoding { name: String, detail: String },

    #[error("recording produced no data")]
    EmptyRecording,
}

/// Lifecycle and data notifications, delivered in order on the event receiver
#[derive(Debug, Clone)]
pub enum RecorderEvent {
    Start,
    Stop,
    Pause,
    Resume,
    DataAvailable(EncodedChunk),
    Error { name: String, detail: String },
}

struct WorkerLink {
    commands: Sender<EncoderCommand>,
    state: PipelineState,
}

/// How a context ended, snapshotted when its final notification goes out.
/// Consumed by the `stop` call waiting on it.
struct StopOutcome {
    failure: Option<(String, String)>,
    delivered_bytes: usize,
}

struct Shared {
    session: RecordingSession,
    worker: WorkerLink,
    capture: Box<dyn CaptureSource>,
    capture_format: Option<CaptureFormat>,
    upstream_tx: Sender<UpstreamEvent>,
    /// Gate for the capture sink; raised once `Init` is on the wire
    encoding: Arc<AtomicBool>,
    delivered_bytes: usize,
    outcome: Option<StopOutcome>,
    failure: Option<(String, String)>,
    /// Bumped whenever a watchdog must stand down (stop, error, restart)
    watchdog_gen: u64,
}

struct RecorderInner {
    shared: Mutex<Shared>,
    done: Condvar,
    events: Sender<RecorderEvent>,
    factory: Arc<dyn EncoderFactory>,
    format: ContainerFormat,
    config: RecorderConfig,
}

impl RecorderInner {
    fn emit(&self, event: RecorderEvent) {
        let _ = self.events.send(event);
    }

    /// Initialize the encoding context with the live capture format. Fires
    /// the `Start` notification, matching the moment recording actually
    /// begins feeding an encoder.
    fn send_init(&self, shared: &mut Shared) {
        let Some(format) = shared.capture_format else {
            return;
        };
        let _ = shared.worker.commands.send(EncoderCommand::Init {
            sample_rate: format.sample_rate,
            channels: format.channels,
            bitrate: self.config.bitrate,
        });
        shared.worker.state = PipelineState::Encoding;
        shared.encoding.store(true, Ordering::SeqCst);
        self.emit(RecorderEvent::Start);
    }
}

/// Audio recorder with a MediaRecorder-shaped lifecycle.
///
/// Construction picks the container backend from the configured MIME type and
/// spawns the encoding context. Notifications arrive on the receiver returned
/// by [`Recorder::new`]; the final artifact is the concatenation of every
/// `DataAvailable` payload in delivery order.
pub struct Recorder {
    inner: Arc<RecorderInner>,
}

impl Recorder {
    /// Build a recorder for `config`, reading audio from `capture`.
    ///
    /// Fails synchronously with `UnsupportedMime` when the MIME type is
    /// malformed, unsupported, or names a container this build cannot mux.
    pub fn new(
        capture: Box<dyn CaptureSource>,
        factory: Arc<dyn EncoderFactory>,
        config: RecorderConfig,
    ) -> Result<(Self, Receiver<RecorderEvent>), RecorderError> {
        let unsupported = || RecorderError::UnsupportedMime(config.mime_type.clone());
        let descriptor = config.descriptor().map_err(|_| unsupported())?;
        let format = descriptor.container_format().ok_or_else(unsupported)?;
        if format == ContainerFormat::Webm {
            // No WebM muxer in this build
            return Err(unsupported());
        }

        let (events_tx, events_rx) = unbounded();
        let (cmd_tx, cmd_rx) = unbounded();
        let (up_tx, up_rx) = unbounded();
        spawn_worker(Arc::clone(&factory), cmd_rx, up_tx.clone());
        let _ = cmd_tx.send(EncoderCommand::LoadEncoder { format });

        let inner = Arc::new(RecorderInner {
            shared: Mutex::new(Shared {
                session: RecordingSession::new(),
                worker: WorkerLink {
                    commands: cmd_tx,
                    state: PipelineState::Uninitialized,
                },
                capture,
                capture_format: None,
                upstream_tx: up_tx,
                encoding: Arc::new(AtomicBool::new(false)),
                delivered_bytes: 0,
                outcome: None,
                failure: None,
                watchdog_gen: 0,
            }),
            done: Condvar::new(),
            events: events_tx,
            factory,
            format,
            config,
        });

        spawn_pump(&inner, up_rx);
        Ok((Self { inner }, events_rx))
    }

    /// Begin recording. With a timeslice, encoded data is delivered roughly
    /// every `timeslice_ms` of captured audio; without one, only at stop.
    pub fn start(&self, timeslice_ms: Option<i64>) -> Result<(), RecorderError> {
        let inner = &self.inner;
        let mut shared = inner.shared.lock().unwrap();

        if shared.session.state() != RecorderState::Inactive {
            return Err(InvalidStateTransition {
                from: shared.session.state(),
                action: "start",
            }
            .into());
        }
        if let Some(ms) = timeslice_ms {
            if ms < 0 {
                return Err(RecorderError::InvalidTimeslice(ms));
            }
        }
        // A context torn down on another thread (a blocking stop, the
        // watchdog, a capture failure) is still `Encoding` until its final
        // notification goes out; wait for the close instead of binding the
        // new session to a worker that is already finalizing
        while shared.session.state() == RecorderState::Inactive
            && shared.worker.state == PipelineState::Encoding
        {
            shared = inner.done.wait(shared).unwrap();
        }
        shared.session.start()?;

        // A closed context never restarts; a new start gets a new one
        if shared.worker.state == PipelineState::Closed {
            respawn_context(inner, &mut shared);
        }
        shared.delivered_bytes = 0;
        shared.outcome = None;
        shared.failure = None;

        shared.encoding = Arc::new(AtomicBool::new(false));
        let sink = CaptureSink::new(
            shared.worker.commands.clone(),
            shared.upstream_tx.clone(),
            Arc::clone(&shared.encoding),
            timeslice_ms,
        );
        match shared.capture.open(sink) {
            Ok(format) => {
                log::info!(
                    "capture opened: {} Hz, {} ch",
                    format.sample_rate,
                    format.channels
                );
                shared.capture_format = Some(format);
            }
            Err(e) => {
                shared.session.abort();
                return Err(e.into());
            }
        }

        // The command channel is ordered, so Init queued here still arrives
        // after LoadEncoder even when the handshake is outstanding
        if matches!(
            shared.worker.state,
            PipelineState::Uninitialized | PipelineState::ReadyToInit
        ) {
            inner.send_init(&mut shared);
        }

        if let Some(limit_ms) = inner.config.auto_stop_ms {
            shared.watchdog_gen += 1;
            let generation = shared.watchdog_gen;
            let watchdog = Arc::clone(inner);
            let spawned = thread::Builder::new()
                .name("recorder-watchdog".to_string())
                .spawn(move || run_watchdog(watchdog, limit_ms, generation));
            if let Err(e) = spawned {
                log::warn!("failed to spawn auto-stop watchdog: {}", e);
            }
        }
        Ok(())
    }

    /// Detach capture without closing the session or the encoder.
    pub fn pause(&self) -> Result<(), RecorderError> {
        let mut shared = self.inner.shared.lock().unwrap();
        shared.session.pause()?;
        shared.capture.pause();
        self.inner.emit(RecorderEvent::Pause);
        Ok(())
    }

    /// Reattach capture after a pause.
    pub fn resume(&self) -> Result<(), RecorderError> {
        let mut shared = self.inner.shared.lock().unwrap();
        shared.session.resume()?;
        shared.capture.resume();
        self.inner.emit(RecorderEvent::Resume);
        Ok(())
    }

    /// Ask for everything encoded so far. The data arrives asynchronously as
    /// one `DataAvailable` notification, possibly empty.
    pub fn request_data(&self) -> Result<(), RecorderError> {
        let shared = self.inner.shared.lock().unwrap();
        shared.session.check_request_data()?;
        let _ = shared.worker.commands.send(EncoderCommand::GetEncodedData);
        Ok(())
    }

    /// Finish the recording. Blocks until the final `DataAvailable` and
    /// `Stop` notifications have been delivered, then reports how the
    /// session ended.
    pub fn stop(&self) -> Result<(), RecorderError> {
        perform_stop(&self.inner)
    }

    pub fn state(&self) -> RecorderState {
        self.inner.shared.lock().unwrap().session.state()
    }

    pub fn mime_type(&self) -> &str {
        &self.inner.config.mime_type
    }

    pub fn container_format(&self) -> ContainerFormat {
        self.inner.format
    }
}

impl Drop for Recorder {
    fn drop(&mut self) {
        let mut shared = self.inner.shared.lock().unwrap();
        if shared.session.is_active() {
            shared.session.abort();
            shared.watchdog_gen += 1;
            shared.encoding.store(false, Ordering::SeqCst);
            shared.capture.close();
        }
        // Let the context finalize and its thread exit
        let _ = shared.worker.commands.send(EncoderCommand::Done);
    }
}

fn perform_stop(inner: &Arc<RecorderInner>) -> Result<(), RecorderError> {
    let mut shared = inner.shared.lock().unwrap();
    shared.session.stop()?;
    shared.watchdog_gen += 1;
    shared.encoding.store(false, Ordering::SeqCst);
    shared.capture.close();
    shared.outcome = None;
    let _ = shared.worker.commands.send(EncoderCommand::Done);

    // The snapshot taken at close time survives a concurrent `start`
    // resetting the live counters
    let outcome = loop {
        if let Some(outcome) = shared.outcome.take() {
            break outcome;
        }
        shared = inner.done.wait(shared).unwrap();
    };
    if let Some((name, detail)) = outcome.failure {
        return Err(RecorderError::Encoding { name, detail });
    }
    if outcome.delivered_bytes == 0 {
        return Err(RecorderError::EmptyRecording);
    }
    Ok(())
}

fn respawn_context(inner: &Arc<RecorderInner>, shared: &mut Shared) {
    let (cmd_tx, cmd_rx) = unbounded();
    let (up_tx, up_rx) = unbounded();
    spawn_worker(Arc::clone(&inner.factory), cmd_rx, up_tx.clone());
    let _ = cmd_tx.send(EncoderCommand::LoadEncoder {
        format: inner.format,
    });
    shared.worker = WorkerLink {
        commands: cmd_tx,
        state: PipelineState::Uninitialized,
    };
    shared.upstream_tx = up_tx;
    spawn_pump(inner, up_rx);
}

fn spawn_pump(inner: &Arc<RecorderInner>, upstream: Receiver<UpstreamEvent>) {
    let pump = Arc::clone(inner);
    let spawned = thread::Builder::new()
        .name("recorder-pump".to_string())
        .spawn(move || run_pump(pump, upstream));
    if let Err(e) = spawned {
        log::warn!("failed to spawn recorder event pump: {}", e);
    }
}

/// Mirror context notifications onto the caller's event receiver. One pump
/// per encoding context; it returns when the context closes.
fn run_pump(inner: Arc<RecorderInner>, upstream: Receiver<UpstreamEvent>) {
    for event in upstream.iter() {
        match event {
            UpstreamEvent::Encoder(EncoderEvent::ReadyToInit) => {
                let mut shared = inner.shared.lock().unwrap();
                // A start that already queued Init has moved the mirror past
                // this state; only an idle context needs tracking here
                if shared.worker.state == PipelineState::Uninitialized {
                    shared.worker.state = PipelineState::ReadyToInit;
                    if shared.session.is_active() {
                        inner.send_init(&mut shared);
                    }
                }
            }
            UpstreamEvent::Encoder(EncoderEvent::EncodedData(chunk)) => {
                inner.shared.lock().unwrap().delivered_bytes += chunk.byte_len();
                inner.emit(RecorderEvent::DataAvailable(chunk));
            }
            UpstreamEvent::Encoder(EncoderEvent::LastEncodedData(chunk)) => {
                inner.shared.lock().unwrap().delivered_bytes += chunk.byte_len();
                inner.emit(RecorderEvent::DataAvailable(chunk));
                inner.emit(RecorderEvent::Stop);
                // Notifications are on the wire; now wake anyone waiting on
                // the close (a blocking stop, a start held at the gate)
                let mut shared = inner.shared.lock().unwrap();
                mark_final(&inner, &mut shared);
                return;
            }
            UpstreamEvent::Encoder(EncoderEvent::Error(e)) => {
                let name = e.name().to_string();
                let detail = e.to_string();
                {
                    let mut shared = inner.shared.lock().unwrap();
                    shared.failure = Some((name.clone(), detail.clone()));
                    shared.encoding.store(false, Ordering::SeqCst);
                    shared.capture.close();
                    shared.session.abort();
                    shared.watchdog_gen += 1;
                }
                inner.emit(RecorderEvent::Error { name, detail });
                inner.emit(RecorderEvent::Stop);
                let mut shared = inner.shared.lock().unwrap();
                mark_final(&inner, &mut shared);
                return;
            }
            UpstreamEvent::Capture(error) => {
                // Report first, then force stop; the context still finalizes
                // and the LastEncodedData path delivers the Stop notification
                log::error!("capture failed: {}", error);
                let was_active = {
                    let mut shared = inner.shared.lock().unwrap();
                    let active = shared.session.is_active();
                    if active {
                        shared.encoding.store(false, Ordering::SeqCst);
                        shared.capture.close();
                        shared.session.abort();
                        shared.watchdog_gen += 1;
                        let _ = shared.worker.commands.send(EncoderCommand::Done);
                    }
                    active
                };
                inner.emit(RecorderEvent::Error {
                    name: "CaptureError".to_string(),
                    detail: error.to_string(),
                });
                if !was_active {
                    log::debug!("capture failure after session close ignored");
                }
            }
        }
    }
}

fn mark_final(inner: &RecorderInner, shared: &mut MutexGuard<'_, Shared>) {
    shared.worker.state = PipelineState::Closed;
    shared.outcome = Some(StopOutcome {
        failure: shared.failure.take(),
        delivered_bytes: shared.delivered_bytes,
    });
    inner.done.notify_all();
}

/// Auto-stop watchdog: ticks once per second, counting only time spent in
/// `Recording`, and stops the session once the configured limit is reached.
/// Stands down when its generation is superseded or the session closes.
fn run_watchdog(inner: Arc<RecorderInner>, limit_ms: u64, generation: u64) {
    let mut recorded_ms: u64 = 0;
    loop {
        thread::sleep(StdDuration::from_secs(1));
        let expired = {
            let shared = inner.shared.lock().unwrap();
            if shared.watchdog_gen != generation || !shared.session.is_active() {
                return;
            }
            if shared.session.state() == RecorderState::Recording {
                recorded_ms += 1000;
            }
            recorded_ms >= limit_ms
        };
        if expired {
            log::info!("auto-stop after {} ms of recording", recorded_ms);
            match perform_stop(&inner) {
                Ok(()) => {}
                // Pipeline failures already reached the caller through the
                // pump; an empty artifact has no other messenger
                Err(e @ RecorderError::EmptyRecording) => {
                    log::warn!("auto-stop failed: {}", e);
                    inner.emit(RecorderEvent::Error {
                        name: "EmptyRecordingError".to_string(),
                        detail: e.to_string(),
                    });
                }
                Err(e) => log::warn!("auto-stop failed: {}", e),
            }
            return;
        }
    }
}
