//! Encoder worker thread and its message protocol
//!
//! The recorder front-end and the encoding context communicate exclusively
//! through ordered channels; no sample memory is shared. Commands are
//! processed one at a time on a dedicated thread, so observable state changes
//! are strictly ordered.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use crossbeam_channel::{Receiver, Sender};

use crate::application::pipeline::{EncodingPipeline, PipelineError};
use crate::application::ports::CaptureError;
use crate::domain::mime::ContainerFormat;
use crate::domain::recording::{EncodedChunk, FrameChunk};

/// Commands sent from the front-end into the encoding context
#[derive(Debug)]
pub enum EncoderCommand {
    /// Select the container backend; answered with `ReadyToInit`
    LoadEncoder { format: ContainerFormat },
    /// Construct the capability handles. Accepted at most once per context.
    Init {
        sample_rate: u32,
        channels: u16,
        bitrate: Option<u32>,
    },
    /// One capture chunk; ownership moves into the context
    PushInput(FrameChunk),
    /// Flush completed container bytes; always answered exactly once
    GetEncodedData,
    /// Finalize the stream and close the context; always answered exactly once
    Done,
}

/// Notifications sent from the encoding context back to the front-end
#[derive(Debug)]
pub enum EncoderEvent {
    /// Backend selected, context waiting for `Init`
    ReadyToInit,
    /// Incremental flush, possibly empty
    EncodedData(EncodedChunk),
    /// Final flush after `Done`; the context is closed
    LastEncodedData(EncodedChunk),
    /// Fatal pipeline failure; the context dropped its handles and closed
    Error(PipelineError),
}

/// Everything the front-end's event pump can receive
#[derive(Debug)]
pub enum UpstreamEvent {
    Encoder(EncoderEvent),
    Capture(CaptureError),
}

/// Context lifecycle. Strictly monotonic within one context; only a fresh
/// `start` after `Closed` spawns a replacement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Uninitialized,
    ReadyToInit,
    Encoding,
    Closed,
}

/// Builds the capability set for a container at init time.
pub trait EncoderFactory: Send + Sync + 'static {
    fn build(
        &self,
        format: ContainerFormat,
        sample_rate: u32,
        channels: u16,
        bitrate: Option<u32>,
    ) -> Result<EncodingPipeline, PipelineError>;
}

/// Capture-side handle feeding the encoding context.
///
/// Chunks are forwarded only while the context is initialized; audio that
/// arrives during the init handshake is dropped, as is anything racing a
/// stop. Besides forwarding, the sink drives timeslice flushes: it sums
/// chunk durations and emits a flush command every time the configured
/// interval elapses. With no timeslice, data is delivered only at stop.
pub struct CaptureSink {
    commands: Sender<EncoderCommand>,
    upstream: Sender<UpstreamEvent>,
    encoding: Arc<AtomicBool>,
    timeslice_secs: Option<f64>,
    elapsed_secs: f64,
}

impl CaptureSink {
    pub fn new(
        commands: Sender<EncoderCommand>,
        upstream: Sender<UpstreamEvent>,
        encoding: Arc<AtomicBool>,
        timeslice_ms: Option<i64>,
    ) -> Self {
        Self {
            commands,
            upstream,
            encoding,
            timeslice_secs: timeslice_ms.map(|ms| ms as f64 / 1000.0),
            elapsed_secs: 0.0,
        }
    }

    /// Hand one chunk to the context.
    pub fn push(&mut self, chunk: FrameChunk) {
        if !self.encoding.load(Ordering::SeqCst) {
            log::trace!("dropping capture chunk: context not encoding yet");
            return;
        }
        let duration = chunk.duration_secs();
        if self
            .commands
            .send(EncoderCommand::PushInput(chunk))
            .is_err()
        {
            log::debug!("dropping capture chunk: encoding context is closed");
            return;
        }
        if let Some(slice) = self.timeslice_secs {
            self.elapsed_secs += duration;
            if self.elapsed_secs >= slice {
                let _ = self.commands.send(EncoderCommand::GetEncodedData);
                self.elapsed_secs = 0.0;
            }
        }
    }

    /// Handle for reporting capture failures from a different callback.
    pub fn failure_handle(&self) -> CaptureFailureHandle {
        CaptureFailureHandle {
            upstream: self.upstream.clone(),
        }
    }
}

/// Clonable reporter for asynchronous capture failures
#[derive(Clone)]
pub struct CaptureFailureHandle {
    upstream: Sender<UpstreamEvent>,
}

impl CaptureFailureHandle {
    pub fn report(&self, error: CaptureError) {
        let _ = self.upstream.send(UpstreamEvent::Capture(error));
    }
}

/// Spawn the encoding context thread. It owns the pipeline for its whole
/// life and exits after answering `Done` or hitting a fatal error, releasing
/// every capability handle on the way out.
pub fn spawn_worker(
    factory: Arc<dyn EncoderFactory>,
    commands: Receiver<EncoderCommand>,
    upstream: Sender<UpstreamEvent>,
) {
    let spawned = thread::Builder::new()
        .name("encoder-worker".to_string())
        .spawn(move || run_worker(factory, commands, upstream));
    if let Err(e) = spawned {
        log::error!("failed to spawn encoder worker thread: {}", e);
    }
}

fn run_worker(
    factory: Arc<dyn EncoderFactory>,
    commands: Receiver<EncoderCommand>,
    upstream: Sender<UpstreamEvent>,
) {
    let mut state = PipelineState::Uninitialized;
    let mut format: Option<ContainerFormat> = None;
    let mut pipeline: Option<EncodingPipeline> = None;

    let emit = |event: EncoderEvent| {
        let _ = upstream.send(UpstreamEvent::Encoder(event));
    };

    for command in commands.iter() {
        match command {
            EncoderCommand::LoadEncoder { format: f } => {
                if state != PipelineState::Uninitialized {
                    log::warn!("ignoring LoadEncoder in state {:?}", state);
                    continue;
                }
                format = Some(f);
                state = PipelineState::ReadyToInit;
                emit(EncoderEvent::ReadyToInit);
            }
            EncoderCommand::Init {
                sample_rate,
                channels,
                bitrate,
            } => {
                if state != PipelineState::ReadyToInit {
                    log::warn!("ignoring Init in state {:?}", state);
                    continue;
                }
                let Some(f) = format else { continue };
                match factory.build(f, sample_rate, channels, bitrate) {
                    Ok(p) => {
                        log::info!(
                            "encoding context initialized: {} at {} Hz, {} ch",
                            f,
                            sample_rate,
                            channels
                        );
                        pipeline = Some(p);
                        state = PipelineState::Encoding;
                    }
                    Err(e) => {
                        log::error!("pipeline init failed: {}", e);
                        emit(EncoderEvent::Error(e));
                        return;
                    }
                }
            }
            EncoderCommand::PushInput(chunk) => {
                let Some(p) = pipeline.as_mut() else {
                    log::debug!("discarding input chunk in state {:?}", state);
                    continue;
                };
                if let Err(e) = p.push(chunk) {
                    log::error!("pipeline push failed: {}", e);
                    emit(EncoderEvent::Error(e));
                    return;
                }
            }
            EncoderCommand::GetEncodedData => {
                let buffers = pipeline.as_mut().map(|p| p.drain()).unwrap_or_default();
                emit(EncoderEvent::EncodedData(EncodedChunk::new(buffers)));
            }
            EncoderCommand::Done => {
                let result = match pipeline.take() {
                    Some(p) => p.finish(),
                    None => Ok(Vec::new()),
                };
                match result {
                    Ok(buffers) => {
                        emit(EncoderEvent::LastEncodedData(EncodedChunk::new(buffers)))
                    }
                    Err(e) => {
                        log::error!("pipeline finish failed: {}", e);
                        emit(EncoderEvent::Error(e));
                    }
                }
                return;
            }
        }
    }
    // Command channel dropped without Done: handles release on return
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use crossbeam_channel::unbounded;

    use crate::application::ports::{
        CodecError, ContainerMuxer, FrameCodec, MuxError, ResampleError, SampleResampler,
    };

    struct PassResampler;

    impl SampleResampler for PassResampler {
        fn process<'a>(&'a mut self, input: &'a [f32]) -> Result<&'a [f32], ResampleError> {
            Ok(input)
        }
    }

    struct FixedCodec {
        packet: Vec<u8>,
    }

    impl FrameCodec for FixedCodec {
        fn encode<'a>(&'a mut self, _frame: &[f32]) -> Result<&'a [u8], CodecError> {
            Ok(&self.packet)
        }
    }

    struct BufferMuxer {
        pending: Vec<Vec<u8>>,
    }

    impl ContainerMuxer for BufferMuxer {
        fn write_frame(&mut self, packet: &[u8], _samples: u32) -> Result<(), MuxError> {
            self.pending.push(packet.to_vec());
            Ok(())
        }

        fn drain(&mut self) -> Vec<Vec<u8>> {
            std::mem::take(&mut self.pending)
        }

        fn finish(&mut self) -> Result<Vec<Vec<u8>>, MuxError> {
            Ok(std::mem::take(&mut self.pending))
        }
    }

    struct TestFactory;

    impl EncoderFactory for TestFactory {
        fn build(
            &self,
            _format: ContainerFormat,
            sample_rate: u32,
            channels: u16,
            _bitrate: Option<u32>,
        ) -> Result<EncodingPipeline, PipelineError> {
            let frame = crate::application::pipeline::samples_per_frame(sample_rate)?;
            Ok(EncodingPipeline::new(
                Box::new(PassResampler),
                Box::new(FixedCodec { packet: vec![7; 4] }),
                Box::new(BufferMuxer { pending: Vec::new() }),
                channels,
                frame,
                frame,
            ))
        }
    }

    fn start_worker() -> (Sender<EncoderCommand>, Receiver<UpstreamEvent>) {
        let (cmd_tx, cmd_rx) = unbounded();
        let (evt_tx, evt_rx) = unbounded();
        spawn_worker(Arc::new(TestFactory), cmd_rx, evt_tx);
        (cmd_tx, evt_rx)
    }

    fn recv(events: &Receiver<UpstreamEvent>) -> EncoderEvent {
        match events.recv_timeout(Duration::from_secs(5)).unwrap() {
            UpstreamEvent::Encoder(e) => e,
            UpstreamEvent::Capture(e) => panic!("unexpected capture event: {}", e),
        }
    }

    fn mono_chunk(samples: usize) -> FrameChunk {
        FrameChunk::new(vec![vec![0.25; samples]], 48_000).unwrap()
    }

    #[test]
    fn load_encoder_answers_ready_to_init() {
        let (cmd, events) = start_worker();
        cmd.send(EncoderCommand::LoadEncoder {
            format: ContainerFormat::Ogg,
        })
        .unwrap();
        assert!(matches!(recv(&events), EncoderEvent::ReadyToInit));
    }

    #[test]
    fn duplicate_load_encoder_is_ignored() {
        let (cmd, events) = start_worker();
        for _ in 0..2 {
            cmd.send(EncoderCommand::LoadEncoder {
                format: ContainerFormat::Ogg,
            })
            .unwrap();
        }
        assert!(matches!(recv(&events), EncoderEvent::ReadyToInit));
        cmd.send(EncoderCommand::Done).unwrap();
        // One ReadyToInit only, then the final notification
        assert!(matches!(recv(&events), EncoderEvent::LastEncodedData(_)));
    }

    #[test]
    fn done_yields_exactly_one_final_notification() {
        let (cmd, events) = start_worker();
        cmd.send(EncoderCommand::LoadEncoder {
            format: ContainerFormat::Ogg,
        })
        .unwrap();
        assert!(matches!(recv(&events), EncoderEvent::ReadyToInit));
        cmd.send(EncoderCommand::Init {
            sample_rate: 48_000,
            channels: 1,
            bitrate: None,
        })
        .unwrap();
        cmd.send(EncoderCommand::PushInput(mono_chunk(960))).unwrap();
        cmd.send(EncoderCommand::Done).unwrap();

        let last = recv(&events);
        assert!(matches!(last, EncoderEvent::LastEncodedData(_)));
        // Worker exited; channel is disconnected with no extra events
        assert!(events.recv_timeout(Duration::from_millis(200)).is_err());
    }

    #[test]
    fn push_after_done_is_dropped_silently() {
        let (cmd, events) = start_worker();
        cmd.send(EncoderCommand::LoadEncoder {
            format: ContainerFormat::Ogg,
        })
        .unwrap();
        assert!(matches!(recv(&events), EncoderEvent::ReadyToInit));
        cmd.send(EncoderCommand::Done).unwrap();
        assert!(matches!(recv(&events), EncoderEvent::LastEncodedData(_)));
        // The worker has exited, so the send itself fails; nothing panics
        assert!(cmd.send(EncoderCommand::PushInput(mono_chunk(16))).is_err());
    }

    #[test]
    fn get_encoded_data_always_answers() {
        let (cmd, events) = start_worker();
        // No pipeline yet: flush still answers, with an empty chunk
        cmd.send(EncoderCommand::GetEncodedData).unwrap();
        match recv(&events) {
            EncoderEvent::EncodedData(chunk) => assert!(chunk.is_empty()),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn init_is_accepted_once() {
        let (cmd, events) = start_worker();
        cmd.send(EncoderCommand::LoadEncoder {
            format: ContainerFormat::Ogg,
        })
        .unwrap();
        assert!(matches!(recv(&events), EncoderEvent::ReadyToInit));
        for _ in 0..2 {
            cmd.send(EncoderCommand::Init {
                sample_rate: 48_000,
                channels: 1,
                bitrate: None,
            })
            .unwrap();
        }
        cmd.send(EncoderCommand::PushInput(mono_chunk(960))).unwrap();
        cmd.send(EncoderCommand::GetEncodedData).unwrap();
        match recv(&events) {
            EncoderEvent::EncodedData(chunk) => assert!(!chunk.is_empty()),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn misaligned_sample_rate_fails_init() {
        let (cmd, events) = start_worker();
        cmd.send(EncoderCommand::LoadEncoder {
            format: ContainerFormat::Ogg,
        })
        .unwrap();
        assert!(matches!(recv(&events), EncoderEvent::ReadyToInit));
        cmd.send(EncoderCommand::Init {
            sample_rate: 44_101,
            channels: 1,
            bitrate: None,
        })
        .unwrap();
        match recv(&events) {
            EncoderEvent::Error(e) => assert_eq!(e.name(), "FrameAlignmentError"),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn sink_flushes_on_timeslice_boundaries() {
        let (cmd_tx, cmd_rx) = unbounded();
        let (evt_tx, _evt_rx) = unbounded();
        // 100 ms timeslice; chunks of 2400 samples at 48 kHz are 50 ms each
        let mut sink = CaptureSink::new(cmd_tx, evt_tx, Arc::new(AtomicBool::new(true)), Some(100));
        for _ in 0..4 {
            sink.push(mono_chunk(2400));
        }
        let commands: Vec<EncoderCommand> = cmd_rx.try_iter().collect();
        let flushes = commands
            .iter()
            .filter(|c| matches!(c, EncoderCommand::GetEncodedData))
            .count();
        assert_eq!(flushes, 2);
        assert_eq!(commands.len(), 6);
    }

    #[test]
    fn sink_without_timeslice_never_flushes() {
        let (cmd_tx, cmd_rx) = unbounded();
        let (evt_tx, _evt_rx) = unbounded();
        let mut sink = CaptureSink::new(cmd_tx, evt_tx, Arc::new(AtomicBool::new(true)), None);
        for _ in 0..10 {
            sink.push(mono_chunk(4800));
        }
        assert!(cmd_rx
            .try_iter()
            .all(|c| matches!(c, EncoderCommand::PushInput(_))));
    }
}
