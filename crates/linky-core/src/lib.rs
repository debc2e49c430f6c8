//! Linky core library: decoding and dispatching French smart-meter
//! télé-information (TIC) frames.
//!
//! Bytes from a [`ByteSource`] are cut into frames by the delimiter, each frame
//! is timestamped and handed to a bounded worker pool, decoded line by line
//! with checksum validation, and fanned out to every configured consumer.
//! Protocol code under `protocols::tic` is pure; I/O stays in `source`,
//! consumers and the CLI.
//!
//! Invariants:
//! - A frame's measurements keep wire order; a repeated label keeps its first
//!   position with the last value.
//! - Decoding stops at the first bad line; earlier lines are still dispatched.
//! - One consumer's failure or panic never reaches another consumer or the
//!   reader.
//!
//! # Examples
//! ```
//! use linky_core::{FrameStatus, RawFrame, decode_frame};
//!
//! let raw = RawFrame::new(1, b"\nIINST 002 Y\r\nPAPP 00750 -\r".to_vec());
//! let frame = decode_frame(raw, "2024-01-01T00:00:00Z");
//! assert_eq!(frame.status, FrameStatus::Complete);
//! assert_eq!(frame.measurements.get("PAPP"), Some("00750"));
//! ```
//!
//! Offline decoding of a recorded stream:
//! ```no_run
//! use std::path::Path;
//!
//! use linky_core::decode_capture_file;
//!
//! let report = decode_capture_file(Path::new("capture.tic"))?;
//! println!("{} frames", report.summary.frames_total);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use serde::{Deserialize, Serialize};

mod config;
mod consumers;
mod dispatch;
mod frame;
mod pipeline;
pub mod protocols;
mod source;

pub use config::{
    CONFIG_FILE_NAME, Config, ConfigError, ConsumerSpec, DEFAULT_LOG_LEVEL, DEFAULT_QUEUE_CAPACITY,
    DEFAULT_WORKERS,
};
pub use consumers::{JsonLinesConsumer, JsonLinesOptions, LogConsumer, LogOptions};
pub use dispatch::{
    Consumer, ConsumerBuildError, ConsumerError, ConsumerFactory, ConsumerInvocationError,
    ConsumerRegistry, ConsumerResolutionError, DispatchReport, Dispatcher,
};
pub use frame::{DecodedFrame, FrameStatus, Measurements};
pub use pipeline::{
    FrameJob, FramePool, PipelineError, PoolError, RunSummary, capture_timestamp,
    decode_capture_file, decode_source, process_frame, run_source,
};
pub use protocols::tic::{
    DecodedLine, FrameDelimiter, RawFrame, TicError, compute_checksum, decode_frame, decode_line,
    split_line, validate_checksum,
};
pub use source::{ByteSource, DEFAULT_CHUNK_SIZE, ReaderSource, SourceError, SourceEvent};

/// Current report schema version.
pub const REPORT_VERSION: u32 = 1;
/// Default timestamp used when the clock cannot be formatted.
pub const DEFAULT_GENERATED_AT: &str = "1970-01-01T00:00:00Z";

/// Offline decoding report for a recorded byte stream.
///
/// # Examples
/// ```
/// use linky_core::make_stub_report;
///
/// let report = make_stub_report("capture.tic", 123);
/// assert_eq!(report.report_version, linky_core::REPORT_VERSION);
/// assert!(report.frames.is_empty());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureReport {
    /// Report schema version (not the binary version).
    pub report_version: u32,
    pub tool: ToolInfo,
    /// RFC3339 timestamp of report generation.
    pub generated_at: String,
    pub input: InputInfo,
    pub summary: FrameSummary,
    /// Frames in stream order.
    pub frames: Vec<FrameRecord>,
}

/// Tool metadata embedded in reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInfo {
    pub name: String,
    pub version: String,
}

/// Input metadata embedded in reports.
///
/// # Examples
/// ```
/// use linky_core::InputInfo;
///
/// let input = InputInfo {
///     path: "capture.tic".to_string(),
///     bytes: 1024,
/// };
/// assert_eq!(input.bytes, 1024);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputInfo {
    /// Input path as provided to the decoder.
    pub path: String,
    /// Bytes read from the input.
    pub bytes: u64,
}

/// Frame counts per outcome.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameSummary {
    pub frames_total: u64,
    pub complete: u64,
    pub partial: u64,
    pub rejected: u64,
    pub empty: u64,
    /// Bytes dropped because no terminator arrived in time.
    pub discarded_bytes: u64,
}

/// One decoded frame as it appears in a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameRecord {
    pub sequence: u64,
    /// RFC3339 time the frame boundary was detected.
    pub timestamp: String,
    pub status: FrameStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub measurements: Measurements,
}

/// Build an empty report for `input_path`.
pub fn make_stub_report(input_path: &str, input_bytes: u64) -> CaptureReport {
    CaptureReport {
        report_version: REPORT_VERSION,
        tool: ToolInfo {
            name: "linky".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
        generated_at: DEFAULT_GENERATED_AT.to_string(),
        input: InputInfo {
            path: input_path.to_string(),
            bytes: input_bytes,
        },
        summary: FrameSummary::default(),
        frames: vec![],
    }
}
