use super::error::TicError;
use super::layout;

/// A line split into label, value and checksum character.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedLine {
    pub label: String,
    pub value: String,
    pub checksum: char,
}

impl DecodedLine {
    fn new(label: &str, value: &str, checksum: char) -> Self {
        Self {
            label: label.to_string(),
            value: value.to_string(),
            checksum,
        }
    }
}

/// Keep printable ASCII and line/field separators, drop every other byte.
pub fn printable_text(bytes: &[u8]) -> String {
    bytes
        .iter()
        .copied()
        .filter(|byte| is_kept(*byte))
        .map(char::from)
        .collect()
}

fn is_kept(byte: u8) -> bool {
    layout::PRINTABLE_RANGE.contains(&byte)
        || matches!(
            byte,
            layout::LINE_FEED | layout::CARRIAGE_RETURN | layout::HORIZONTAL_TAB
        )
}

/// Iterate over the non-blank lines of a frame's text.
pub fn lines(text: &str) -> impl Iterator<Item = &str> {
    text.split(['\n', '\r']).filter(|line| !line.trim().is_empty())
}

/// Split one line on runs of whitespace into label, value and checksum.
///
/// A checksum that is itself a space vanishes when splitting; a line with two
/// fields followed by the separator and that space gets `' '` as checksum.
///
/// # Examples
/// ```
/// use linky_core::split_line;
///
/// let line = split_line("PTEC HP..  ").unwrap();
/// assert_eq!(line.value, "HP..");
/// assert_eq!(line.checksum, ' ');
/// ```
///
/// # Errors
/// Returns `TicError::MalformedLine` when the line does not hold exactly a
/// label, a value and a single checksum character.
pub fn split_line(line: &str) -> Result<DecodedLine, TicError> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    match fields.as_slice() {
        [label, value, checksum] => match single_char(checksum) {
            Some(checksum) => Ok(DecodedLine::new(label, value, checksum)),
            None => Err(malformed(line, fields.len())),
        },
        [label, value] if ends_with_space_checksum(line) => {
            Ok(DecodedLine::new(label, value, layout::SPACE_CHECKSUM))
        }
        _ => Err(malformed(line, fields.len())),
    }
}

fn single_char(field: &str) -> Option<char> {
    let mut chars = field.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    }
}

// Separator plus the space checksum.
fn ends_with_space_checksum(line: &str) -> bool {
    let trailing = line.len() - line.trim_end_matches(char::from(layout::FIELD_SEPARATOR)).len();
    trailing >= 2
}

fn malformed(line: &str, fields: usize) -> TicError {
    TicError::MalformedLine {
        line: line.to_string(),
        fields,
    }
}
