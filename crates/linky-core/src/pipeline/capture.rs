use std::fs::File;
use std::path::Path;

use super::{capture_timestamp, log_outcome};
use crate::frame::FrameStatus;
use crate::protocols::tic::{FrameDelimiter, decode_frame};
use crate::source::{ByteSource, ReaderSource, SourceEvent};
use crate::{CaptureReport, FrameRecord, PipelineError, make_stub_report};

/// Decode a recorded TIC byte stream into a report.
pub fn decode_capture_file(path: &Path) -> Result<CaptureReport, PipelineError> {
    let file = File::open(path)?;
    decode_source(path, ReaderSource::new(file))
}

/// Decode every frame `source` yields, in order, without dispatching.
pub fn decode_source<S: ByteSource>(
    path: &Path,
    mut source: S,
) -> Result<CaptureReport, PipelineError> {
    let mut delimiter = FrameDelimiter::new();
    let mut bytes_read = 0u64;
    let mut records = Vec::new();

    while let Some(event) = source.next_event()? {
        match event {
            SourceEvent::Connected => delimiter.reset(),
            SourceEvent::Data(bytes) => {
                bytes_read += bytes.len() as u64;
                for raw in delimiter.feed(&bytes) {
                    let decoded = decode_frame(raw, capture_timestamp());
                    log_outcome(&decoded);
                    records.push(FrameRecord {
                        sequence: decoded.sequence,
                        timestamp: decoded.captured_at,
                        status: decoded.status,
                        error: decoded.error.map(|err| err.to_string()),
                        measurements: decoded.measurements,
                    });
                }
            }
            SourceEvent::Disconnected => {}
        }
    }

    let mut report = make_stub_report(&path.display().to_string(), bytes_read);
    report.generated_at = capture_timestamp();
    let summary = &mut report.summary;
    summary.discarded_bytes = delimiter.discarded_bytes();
    for record in &records {
        summary.frames_total += 1;
        match record.status {
            FrameStatus::Complete => summary.complete += 1,
            FrameStatus::Partial => summary.partial += 1,
            FrameStatus::Rejected => summary.rejected += 1,
            FrameStatus::Empty => summary.empty += 1,
        }
    }
    report.frames = records;
    Ok(report)
}
