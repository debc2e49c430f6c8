use crate::frame::{DecodedFrame, FrameStatus, Measurements};

use super::checksum::compute_checksum;
use super::delimiter::RawFrame;
use super::error::TicError;
use super::reader::{self, DecodedLine};

/// Split a line and validate its checksum.
///
/// # Examples
/// ```
/// use linky_core::{TicError, decode_line};
///
/// let line = decode_line("ADCO 012345678901 E").unwrap();
/// assert_eq!((line.label.as_str(), line.value.as_str()), ("ADCO", "012345678901"));
///
/// let err = decode_line("ADCO 012345678901 0").unwrap_err();
/// assert!(matches!(err, TicError::ChecksumMismatch { expected: 'E', received: '0', .. }));
/// ```
///
/// # Errors
/// Returns `TicError::MalformedLine` for lines that do not split into three
/// fields and `TicError::ChecksumMismatch` when the checksum disagrees.
pub fn decode_line(line: &str) -> Result<DecodedLine, TicError> {
    let decoded = reader::split_line(line)?;
    let expected = compute_checksum(&decoded.label, &decoded.value);
    if expected != decoded.checksum {
        return Err(TicError::ChecksumMismatch {
            label: decoded.label,
            value: decoded.value,
            expected,
            received: decoded.checksum,
        });
    }
    Ok(decoded)
}

/// Decode every line of a raw frame, stopping at the first bad line.
///
/// Non-printable bytes are dropped before splitting into lines. Measurements
/// decoded before a failing line are kept; nothing after it is attempted.
///
/// # Examples
/// ```
/// use linky_core::{FrameStatus, RawFrame, decode_frame};
///
/// let raw = RawFrame::new(1, b"\nIINST 002 Y\r\nIMAX 090 0\r\nPAPP 00510 '\r".to_vec());
/// let frame = decode_frame(raw, "2024-01-01T00:00:00Z");
/// assert_eq!(frame.status, FrameStatus::Partial);
/// assert_eq!(frame.measurements.len(), 1);
/// ```
pub fn decode_frame(raw: RawFrame, captured_at: impl Into<String>) -> DecodedFrame {
    let text = reader::printable_text(&raw.bytes);
    let mut measurements = Measurements::new();
    let mut error = None;
    let mut saw_line = false;

    for line in reader::lines(&text) {
        saw_line = true;
        match decode_line(line) {
            Ok(decoded) => {
                measurements.insert(decoded.label, decoded.value);
            }
            Err(err) => {
                error = Some(err);
                break;
            }
        }
    }

    let status = match (&error, measurements.is_empty()) {
        (None, _) if !saw_line => FrameStatus::Empty,
        (None, _) => FrameStatus::Complete,
        (Some(_), false) => FrameStatus::Partial,
        (Some(_), true) => FrameStatus::Rejected,
    };

    DecodedFrame {
        sequence: raw.sequence,
        captured_at: captured_at.into(),
        measurements,
        status,
        error,
    }
}

#[cfg(test)]
mod tests {
    use super::{decode_frame, decode_line};
    use crate::frame::FrameStatus;
    use crate::protocols::tic::delimiter::RawFrame;
    use crate::protocols::tic::error::TicError;

    const HISTORIC_FRAME: &[u8] = b"ADCO 012345678901 E\r\nOPTARIF HC.. <\r\nISOUSC 45 ?\r\nHCHC 000835358 &\r\nHCHP 001262798 6\r\nPTEC HP..  \r\nIINST 002 Y\r\nIMAX 090 H\r\nPAPP 00510 '\r\nHHPHC A ,\r\nMOTDETAT 000000 B\r";

    fn raw(bytes: &[u8]) -> RawFrame {
        RawFrame::new(1, bytes.to_vec())
    }

    #[test]
    fn decode_line_valid() {
        let line = decode_line("ADCO 012345678901 E").unwrap();
        assert_eq!(line.label, "ADCO");
        assert_eq!(line.value, "012345678901");
    }

    #[test]
    fn decode_line_checksum_mismatch() {
        let err = decode_line("ADCO 012345678901 0").unwrap_err();
        assert_eq!(
            err,
            TicError::ChecksumMismatch {
                label: "ADCO".to_string(),
                value: "012345678901".to_string(),
                expected: 'E',
                received: '0',
            }
        );
    }

    #[test]
    fn decode_full_historic_frame() {
        let frame = decode_frame(raw(HISTORIC_FRAME), "2024-01-01T00:00:00Z");
        assert_eq!(frame.status, FrameStatus::Complete);
        assert!(frame.error.is_none());
        assert_eq!(frame.measurements.len(), 11);
        assert_eq!(frame.measurements.get("PTEC"), Some("HP.."));
        assert_eq!(frame.measurements.labels().next(), Some("ADCO"));
        assert_eq!(frame.measurements.labels().last(), Some("MOTDETAT"));
        assert_eq!(frame.captured_at, "2024-01-01T00:00:00Z");
    }

    #[test]
    fn decode_stops_at_first_bad_line() {
        let frame = decode_frame(
            raw(b"\nHCHC 000835358 &\r\nHCHP 001262798 7\r\nPAPP 00510 '\r"),
            "ts",
        );
        assert_eq!(frame.status, FrameStatus::Partial);
        assert_eq!(frame.measurements.labels().collect::<Vec<_>>(), vec!["HCHC"]);
        assert!(matches!(
            frame.error,
            Some(TicError::ChecksumMismatch { expected: '6', received: '7', .. })
        ));
        assert!(frame.is_dispatchable());
    }

    #[test]
    fn truncated_first_line_rejects_frame() {
        let frame = decode_frame(raw(b"0 000000 B\r\nADCO 012345678901 E\r"), "ts");
        assert_eq!(frame.status, FrameStatus::Rejected);
        assert!(frame.measurements.is_empty());
        assert!(!frame.is_dispatchable());
    }

    #[test]
    fn malformed_line_stops_decoding() {
        let frame = decode_frame(raw(b"\nISOUSC 45 ?\r\nBROKEN\r\nIMAX 090 H\r"), "ts");
        assert_eq!(frame.status, FrameStatus::Partial);
        assert_eq!(frame.measurements.len(), 1);
        assert!(matches!(
            frame.error,
            Some(TicError::MalformedLine { fields: 1, .. })
        ));
    }

    #[test]
    fn control_bytes_are_discarded() {
        let frame = decode_frame(raw(b"\x02\nIINST\x00 002 Y\r\x03"), "ts");
        assert_eq!(frame.status, FrameStatus::Complete);
        assert_eq!(frame.measurements.get("IINST"), Some("002"));
    }

    #[test]
    fn empty_frame() {
        let frame = decode_frame(raw(b"\r\n\r\n"), "ts");
        assert_eq!(frame.status, FrameStatus::Empty);
        assert!(frame.error.is_none());
    }

    #[test]
    fn repeated_label_keeps_last_value() {
        let frame = decode_frame(raw(b"\nIINST 002 Y\r\nIINST 003 Z\r"), "ts");
        assert_eq!(frame.status, FrameStatus::Complete);
        assert_eq!(frame.measurements.len(), 1);
        assert_eq!(frame.measurements.get("IINST"), Some("003"));
    }
}
