use std::io::{ErrorKind, Read};

use super::{ByteSource, SourceError, SourceEvent};

/// Read size used when none is given; a 1200 baud line fills it in ~2 s.
pub const DEFAULT_CHUNK_SIZE: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    Open,
    Closed,
    Finished,
}

/// `ByteSource` over any reader: a tty device node, a capture file, stdin.
///
/// Emits `Connected`, then one `Data` event per successful read, then
/// `Disconnected` at end of input.
///
/// # Examples
/// ```
/// use std::io::Cursor;
///
/// use linky_core::{ByteSource, ReaderSource, SourceEvent};
///
/// let mut source = ReaderSource::new(Cursor::new(b"AB".to_vec()));
/// assert_eq!(source.next_event()?, Some(SourceEvent::Connected));
/// assert_eq!(source.next_event()?, Some(SourceEvent::Data(b"AB".to_vec())));
/// assert_eq!(source.next_event()?, Some(SourceEvent::Disconnected));
/// assert_eq!(source.next_event()?, None);
/// # Ok::<(), linky_core::SourceError>(())
/// ```
pub struct ReaderSource<R> {
    reader: R,
    buffer: Vec<u8>,
    state: State,
}

impl<R: Read> ReaderSource<R> {
    pub fn new(reader: R) -> Self {
        Self::with_chunk_size(reader, DEFAULT_CHUNK_SIZE)
    }

    /// A chunk size of zero is bumped to one byte.
    pub fn with_chunk_size(reader: R, chunk_size: usize) -> Self {
        Self {
            reader,
            buffer: vec![0u8; chunk_size.max(1)],
            state: State::Idle,
        }
    }

    fn read_chunk(&mut self) -> Result<usize, SourceError> {
        loop {
            match self.reader.read(&mut self.buffer) {
                Ok(read) => return Ok(read),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(err.into()),
            }
        }
    }
}

impl<R: Read> ByteSource for ReaderSource<R> {
    fn next_event(&mut self) -> Result<Option<SourceEvent>, SourceError> {
        match self.state {
            State::Idle => {
                self.state = State::Open;
                Ok(Some(SourceEvent::Connected))
            }
            State::Open => match self.read_chunk() {
                Ok(0) => {
                    self.state = State::Closed;
                    Ok(Some(SourceEvent::Disconnected))
                }
                Ok(read) => Ok(Some(SourceEvent::Data(self.buffer[..read].to_vec()))),
                Err(err) => {
                    self.state = State::Closed;
                    Err(err)
                }
            },
            State::Closed => {
                self.state = State::Finished;
                Ok(None)
            }
            State::Finished => Ok(None),
        }
    }
}
