//! Linky TIC (télé-information client) decoding, historic mode.
//!
//! A frame is the text between two `ETX STX` terminators. Each line holds a
//! label, a value and a one-character checksum computed over
//! `label SP value`. Decoding stops at the first bad line and keeps what
//! was decoded before it.
//!
//! Constants live in `layout`, text conventions in `reader`, the integrity
//! check in `checksum`, and domain decoding in `parser`. Nothing here logs
//! or performs I/O.

pub mod checksum;
pub mod delimiter;
pub mod error;
pub mod layout;
pub mod parser;
pub mod reader;

pub use checksum::{compute_checksum, validate_checksum};
pub use delimiter::{FrameDelimiter, Frames, RawFrame};
pub use error::TicError;
pub use parser::{decode_frame, decode_line};
pub use reader::{DecodedLine, split_line};
