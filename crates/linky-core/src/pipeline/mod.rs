//! Reader loop: bytes from a source become frames handed to the worker pool.
//!
//! The reader thread only delimits and timestamps; decoding and fan-out run on
//! the pool so a slow consumer never stalls the serial line.

mod capture;
mod pool;

use std::sync::Arc;

use thiserror::Error;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use tracing::{debug, info, warn};

use crate::DEFAULT_GENERATED_AT;
use crate::config::Config;
use crate::dispatch::{ConsumerRegistry, Dispatcher};
use crate::frame::{DecodedFrame, FrameStatus};
use crate::protocols::tic::{FrameDelimiter, RawFrame, TicError, decode_frame};
use crate::source::{ByteSource, SourceError, SourceEvent};

pub use capture::{decode_capture_file, decode_source};
pub use pool::{FrameJob, FramePool, PoolError};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("source error: {0}")]
    Source(#[from] SourceError),
    #[error("worker pool error: {0}")]
    Pool(#[from] PoolError),
}

/// Counters for one `run_source` call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub connections: u64,
    pub frames_detected: u64,
    pub frames_submitted: u64,
    /// Frames dropped because the worker queue was full.
    pub frames_rejected: u64,
    pub discarded_bytes: u64,
}

/// Drive `source` until it is exhausted, dispatching every decoded frame.
///
/// Consumers are resolved from `config` on each connection. Returns once the
/// source ends and all queued frames have been processed.
pub fn run_source<S: ByteSource>(
    mut source: S,
    registry: &ConsumerRegistry,
    config: &Config,
) -> Result<RunSummary, PipelineError> {
    let pool = FramePool::new(config.workers, config.queue_capacity)?;
    let mut delimiter = FrameDelimiter::new();
    let mut dispatcher: Option<Arc<Dispatcher>> = None;
    let mut summary = RunSummary::default();

    while let Some(event) = source.next_event()? {
        match event {
            SourceEvent::Connected => {
                dispatcher = Some(connect(registry, config, &mut delimiter, &mut summary));
            }
            SourceEvent::Data(bytes) => {
                let current = match &dispatcher {
                    Some(current) => current.clone(),
                    None => {
                        debug!("data before connect, connecting implicitly");
                        let current = connect(registry, config, &mut delimiter, &mut summary);
                        dispatcher = Some(current.clone());
                        current
                    }
                };
                for frame in delimiter.feed(&bytes) {
                    summary.frames_detected += 1;
                    if frame.is_first() {
                        debug!("first frame after connect, likely truncated");
                    }
                    let job = FrameJob {
                        frame,
                        captured_at: capture_timestamp(),
                        dispatcher: current.clone(),
                    };
                    match pool.submit(job) {
                        Ok(()) => summary.frames_submitted += 1,
                        Err(PoolError::Saturated { sequence }) => {
                            summary.frames_rejected += 1;
                            warn!(sequence, "worker queue full, frame rejected");
                        }
                        Err(err) => return Err(err.into()),
                    }
                }
            }
            SourceEvent::Disconnected => {
                info!("source disconnected");
                dispatcher = None;
            }
        }
    }

    summary.discarded_bytes = delimiter.discarded_bytes();
    pool.shutdown();
    info!(
        connections = summary.connections,
        frames = summary.frames_detected,
        rejected = summary.frames_rejected,
        "source exhausted"
    );
    Ok(summary)
}

fn connect(
    registry: &ConsumerRegistry,
    config: &Config,
    delimiter: &mut FrameDelimiter,
    summary: &mut RunSummary,
) -> Arc<Dispatcher> {
    delimiter.reset();
    summary.connections += 1;
    let dispatcher = registry.resolve_all(&config.consumers);
    info!(consumers = dispatcher.len(), "source connected");
    Arc::new(dispatcher)
}

/// Decode one raw frame, log its outcome and dispatch it if it carries data.
pub fn process_frame(
    frame: RawFrame,
    captured_at: impl Into<String>,
    dispatcher: &Dispatcher,
) -> DecodedFrame {
    let decoded = decode_frame(frame, captured_at);
    log_outcome(&decoded);
    if decoded.is_dispatchable() {
        let report = dispatcher.dispatch(&decoded.measurements, &decoded.captured_at);
        debug!(
            sequence = decoded.sequence,
            delivered = report.delivered,
            failed = report.failures.len(),
            "frame dispatched"
        );
    }
    decoded
}

pub(crate) fn log_outcome(frame: &DecodedFrame) {
    let sequence = frame.sequence;
    match (&frame.status, &frame.error) {
        (FrameStatus::Empty, _) => debug!(sequence, "empty frame"),
        (FrameStatus::Complete, _) | (_, None) => {
            debug!(sequence, entries = frame.measurements.len(), "frame decoded")
        }
        (status, Some(err)) => {
            let kept = frame.measurements.len();
            match err {
                TicError::ChecksumMismatch {
                    label,
                    value,
                    expected,
                    received,
                } => warn!(
                    sequence,
                    ?status,
                    kept,
                    label = %label,
                    value = %value,
                    expected = %expected,
                    received = %received,
                    "checksum mismatch, frame truncated"
                ),
                TicError::MalformedLine { line, fields } => warn!(
                    sequence,
                    ?status,
                    kept,
                    line = %line,
                    fields,
                    "malformed line, frame truncated"
                ),
            }
        }
    }
}

/// Current UTC time as RFC 3339.
pub fn capture_timestamp() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| DEFAULT_GENERATED_AT.to_string())
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::sync::{Arc, Mutex};

    use super::{capture_timestamp, process_frame, run_source};
    use crate::config::{Config, ConsumerSpec};
    use crate::dispatch::{Consumer, ConsumerError, ConsumerRegistry, Dispatcher};
    use crate::frame::{FrameStatus, Measurements};
    use crate::protocols::tic::RawFrame;
    use crate::protocols::tic::layout::MAX_FRAME_LEN;
    use crate::source::{ByteSource, ReaderSource, SourceError, SourceEvent};

    #[derive(Default)]
    struct Sink(Mutex<Vec<Measurements>>);

    impl Consumer for Sink {
        fn name(&self) -> &str {
            "sink"
        }

        fn compute(&self, measurements: Measurements, _: &str) -> Result<(), ConsumerError> {
            self.0.lock().unwrap().push(measurements);
            Ok(())
        }
    }

    struct Scripted(std::vec::IntoIter<SourceEvent>);

    impl ByteSource for Scripted {
        fn next_event(&mut self) -> Result<Option<SourceEvent>, SourceError> {
            Ok(self.0.next())
        }
    }

    fn registry_with(sink: &Arc<Sink>) -> (ConsumerRegistry, Config) {
        let mut registry = ConsumerRegistry::new();
        let shared = sink.clone();
        registry.register("sink", move |_| Ok(shared.clone() as Arc<dyn Consumer>));
        let config = Config {
            consumers: vec![ConsumerSpec::new("sink")],
            ..Config::default()
        };
        (registry, config)
    }

    #[test]
    fn rejected_frame_is_not_dispatched() {
        let sink = Arc::new(Sink::default());
        let dispatcher = Dispatcher::new(vec![sink.clone() as Arc<dyn Consumer>]);

        let decoded = process_frame(RawFrame::new(1, b"\nPAPP 00750 X\r".to_vec()), "ts", &dispatcher);

        assert_eq!(decoded.status, FrameStatus::Rejected);
        assert!(sink.0.lock().unwrap().is_empty());
    }

    #[test]
    fn partial_frame_dispatches_prefix() {
        let sink = Arc::new(Sink::default());
        let dispatcher = Dispatcher::new(vec![sink.clone() as Arc<dyn Consumer>]);

        let decoded = process_frame(
            RawFrame::new(1, b"\nIINST 002 Y\r\nPAPP 00750 X\r\nIMAX 042 E\r".to_vec()),
            "ts",
            &dispatcher,
        );

        assert_eq!(decoded.status, FrameStatus::Partial);
        let calls = sink.0.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].labels().collect::<Vec<_>>(), vec!["IINST"]);
    }

    #[test]
    fn run_source_counts_frames_across_reconnects() {
        let sink = Arc::new(Sink::default());
        let (registry, config) = registry_with(&sink);
        let frame = b"\x02\nPAPP 00750 -\r\x03".to_vec();
        let events = vec![
            SourceEvent::Connected,
            SourceEvent::Data(frame.clone()),
            SourceEvent::Data(frame.clone()),
            SourceEvent::Disconnected,
            SourceEvent::Connected,
            SourceEvent::Data(frame.clone()),
            SourceEvent::Disconnected,
        ];

        let summary = run_source(Scripted(events.into_iter()), &registry, &config).unwrap();

        assert_eq!(summary.connections, 2);
        // The last connection never sees a terminator, so its bytes stay buffered.
        assert_eq!(summary.frames_detected, 1);
        assert_eq!(summary.frames_submitted, 1);
        assert_eq!(sink.0.lock().unwrap().len(), 1);
    }

    #[test]
    fn data_before_connect_connects_implicitly() {
        let sink = Arc::new(Sink::default());
        let (registry, config) = registry_with(&sink);
        let events = vec![SourceEvent::Data(
            b"\x03\x02\nPAPP 00750 -\r\x03\x02".to_vec(),
        )];

        let summary = run_source(Scripted(events.into_iter()), &registry, &config).unwrap();

        assert_eq!(summary.connections, 1);
        assert_eq!(summary.frames_detected, 2);
        assert_eq!(sink.0.lock().unwrap().len(), 1);
    }

    #[test]
    fn reader_source_feeds_whole_pipeline() {
        let sink = Arc::new(Sink::default());
        let (registry, config) = registry_with(&sink);
        let stream = b"junk\x03\x02\nIINST 002 Y\r\nPAPP 00750 -\r\x03\x02\nIMAX 042 E\r\x03\x02";
        let source = ReaderSource::with_chunk_size(Cursor::new(stream.to_vec()), 3);

        let summary = run_source(source, &registry, &config).unwrap();

        assert_eq!(summary.frames_detected, 3);
        assert_eq!(summary.frames_rejected, 0);
        assert_eq!(sink.0.lock().unwrap().len(), 2);
    }

    #[test]
    fn overflow_is_counted_once_across_reconnects() {
        let sink = Arc::new(Sink::default());
        let (registry, config) = registry_with(&sink);
        let events = vec![
            SourceEvent::Connected,
            SourceEvent::Data(vec![b'x'; MAX_FRAME_LEN + 1]),
            SourceEvent::Disconnected,
            SourceEvent::Connected,
            SourceEvent::Disconnected,
            SourceEvent::Connected,
            SourceEvent::Disconnected,
        ];

        let summary = run_source(Scripted(events.into_iter()), &registry, &config).unwrap();

        assert_eq!(summary.connections, 3);
        assert_eq!(summary.discarded_bytes, MAX_FRAME_LEN as u64 + 1);
    }

    #[test]
    fn capture_timestamp_is_rfc3339() {
        let stamp = capture_timestamp();
        assert!(
            time::OffsetDateTime::parse(&stamp, &time::format_description::well_known::Rfc3339)
                .is_ok()
        );
    }
}
