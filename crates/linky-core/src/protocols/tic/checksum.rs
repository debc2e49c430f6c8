use super::layout;

/// Compute the checksum character of a `label`/`value` pair.
///
/// The low 6 bits of the byte sum of `label`, one space and `value`, shifted
/// into the printable range. The result is always within `0x20..=0x5F`.
///
/// # Examples
/// ```
/// use linky_core::compute_checksum;
///
/// assert_eq!(compute_checksum("ADCO", "012345678901"), 'E');
/// assert_eq!(compute_checksum("PTEC", "HP.."), ' ');
/// ```
pub fn compute_checksum(label: &str, value: &str) -> char {
    let sum = label
        .bytes()
        .chain(std::iter::once(layout::FIELD_SEPARATOR))
        .chain(value.bytes())
        .fold(0u32, |acc, byte| acc.wrapping_add(u32::from(byte)));
    let code = (sum & layout::CHECKSUM_MASK) + layout::CHECKSUM_OFFSET;
    // Masked to 6 bits then offset by 0x20: always a valid ASCII code point.
    char::from(code as u8)
}

/// Check a received checksum character against the computed one.
///
/// # Examples
/// ```
/// use linky_core::validate_checksum;
///
/// assert!(validate_checksum("ADCO", "012345678901", 'E'));
/// assert!(!validate_checksum("ADCO", "012345678901", '0'));
/// ```
pub fn validate_checksum(label: &str, value: &str, checksum: char) -> bool {
    compute_checksum(label, value) == checksum
}
