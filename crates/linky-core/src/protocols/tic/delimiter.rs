use super::layout;

/// Bytes found between two terminators, owned until decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFrame {
    /// Frames emitted since the last reset; frame 0 usually starts mid-stream.
    pub sequence: u64,
    pub bytes: Vec<u8>,
}

impl RawFrame {
    pub fn new(sequence: u64, bytes: Vec<u8>) -> Self {
        Self { sequence, bytes }
    }

    /// The first frame after connecting rarely starts on a frame boundary.
    pub fn is_first(&self) -> bool {
        self.sequence == 0
    }
}

/// Splits an unbounded byte stream on the TIC terminator.
///
/// Chunk boundaries are irrelevant: a terminator split across two `feed`
/// calls is still recognized.
///
/// # Examples
/// ```
/// use linky_core::FrameDelimiter;
///
/// let mut delimiter = FrameDelimiter::new();
/// let mut frames = Vec::new();
/// for byte in b"A\x03\x02B\x03\x02" {
///     frames.extend(delimiter.feed(&[*byte]).map(|frame| frame.bytes));
/// }
/// assert_eq!(frames, vec![b"A".to_vec(), b"B".to_vec()]);
/// ```
#[derive(Debug, Default)]
pub struct FrameDelimiter {
    buffer: Vec<u8>,
    // Buffer prefix already known not to contain a terminator start.
    scanned: usize,
    next_sequence: u64,
    discarded_bytes: u64,
}

impl FrameDelimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffer `bytes` and lazily yield every frame they complete.
    pub fn feed(&mut self, bytes: &[u8]) -> Frames<'_> {
        self.buffer.extend_from_slice(bytes);
        Frames { delimiter: self }
    }

    /// Forget buffered bytes and restart sequence numbering.
    ///
    /// `discarded_bytes` keeps counting across resets.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.scanned = 0;
        self.next_sequence = 0;
    }

    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    /// Bytes dropped because no terminator arrived within `MAX_FRAME_LEN`.
    pub fn discarded_bytes(&self) -> u64 {
        self.discarded_bytes
    }

    fn next_frame(&mut self) -> Option<RawFrame> {
        match self.find_terminator() {
            Some(position) => {
                let bytes: Vec<u8> = self.buffer.drain(..position).collect();
                self.buffer.drain(..layout::TERMINATOR.len());
                self.scanned = 0;
                let sequence = self.next_sequence;
                self.next_sequence += 1;
                Some(RawFrame::new(sequence, bytes))
            }
            None => {
                self.scanned = self.buffer.len().saturating_sub(layout::TERMINATOR.len() - 1);
                if self.buffer.len() > layout::MAX_FRAME_LEN {
                    self.discarded_bytes += self.buffer.len() as u64;
                    self.buffer.clear();
                    self.scanned = 0;
                }
                None
            }
        }
    }

    fn find_terminator(&self) -> Option<usize> {
        self.buffer
            .get(self.scanned..)?
            .windows(layout::TERMINATOR.len())
            .position(|window| window == layout::TERMINATOR)
            .map(|offset| self.scanned + offset)
    }
}

/// Lazy iterator over the frames completed by one `feed` call.
pub struct Frames<'a> {
    delimiter: &'a mut FrameDelimiter,
}

impl Iterator for Frames<'_> {
    type Item = RawFrame;

    fn next(&mut self) -> Option<RawFrame> {
        self.delimiter.next_frame()
    }
}
