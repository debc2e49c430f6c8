use thiserror::Error;

/// Expected decode failures for a single TIC line.
///
/// These are protocol violations, not faults: the frame decoder stops at the
/// first one and keeps the measurements decoded before it.
///
/// # Examples
/// ```
/// use linky_core::TicError;
///
/// let err = TicError::ChecksumMismatch {
///     label: "ADCO".to_string(),
///     value: "012345678901".to_string(),
///     expected: 'E',
///     received: '0',
/// };
/// assert!(err.to_string().contains("expected 'E'"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TicError {
    #[error(
        "malformed line {line:?}: expected label, value and one checksum character, got {fields} fields"
    )]
    MalformedLine { line: String, fields: usize },
    #[error("checksum mismatch for {label}={value}: expected {expected:?}, received {received:?}")]
    ChecksumMismatch {
        label: String,
        value: String,
        expected: char,
        received: char,
    },
}
