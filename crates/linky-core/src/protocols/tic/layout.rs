/// End-of-frame (ETX) followed by start-of-frame (STX).
pub const TERMINATOR: [u8; 2] = [0x03, 0x02];

/// Separator inserted between label and value before summing.
pub const FIELD_SEPARATOR: u8 = b' ';
/// Checksum substituted when the checksum field itself is a space.
pub const SPACE_CHECKSUM: char = ' ';

pub const CHECKSUM_MASK: u32 = 0x3F;
pub const CHECKSUM_OFFSET: u32 = 0x20;
pub const CHECKSUM_RANGE: std::ops::RangeInclusive<u8> = 0x20..=0x5F;

pub const PRINTABLE_RANGE: std::ops::RangeInclusive<u8> = 0x20..=0x7E;
pub const LINE_FEED: u8 = b'\n';
pub const CARRIAGE_RETURN: u8 = b'\r';
pub const HORIZONTAL_TAB: u8 = b'\t';

pub const FIELDS_PER_LINE: usize = 3;

/// Bytes buffered without a terminator before the delimiter gives up.
pub const MAX_FRAME_LEN: usize = 4096;
