use linky_core::{FrameStatus, RawFrame, compute_checksum, decode_frame, decode_line, validate_checksum};
use proptest::prelude::*;

fn label() -> impl Strategy<Value = String> {
    "[A-Z0-9]{1,8}"
}

fn value() -> impl Strategy<Value = String> {
    "[A-Za-z0-9.:+-]{1,12}"
}

proptest! {
    #[test]
    fn checksum_is_printable(label in label(), value in value()) {
        let checksum = compute_checksum(&label, &value);
        prop_assert!((0x20..=0x5F).contains(&(checksum as u32)));
        prop_assert!(validate_checksum(&label, &value, checksum));
    }

    #[test]
    fn correctly_framed_line_decodes(label in label(), value in value()) {
        let checksum = compute_checksum(&label, &value);
        let line = format!("{label} {value} {checksum}");
        let decoded = decode_line(&line).unwrap();
        prop_assert_eq!(decoded.label, label);
        prop_assert_eq!(decoded.value, value);
    }

    #[test]
    fn wrong_checksum_is_rejected(label in label(), value in value(), shift in 1u32..64) {
        let checksum = compute_checksum(&label, &value);
        let wrong = char::from_u32((checksum as u32 - 0x20 + shift) % 64 + 0x20).unwrap();
        prop_assume!(wrong != ' ');
        prop_assert!(!validate_checksum(&label, &value, wrong));
        let line = format!("{label} {value} {wrong}");
        prop_assert!(decode_line(&line).is_err());
    }

    #[test]
    fn decoding_never_panics(bytes in proptest::collection::vec(any::<u8>(), 0..512)) {
        let frame = decode_frame(RawFrame::new(1, bytes), "ts");
        match frame.status {
            FrameStatus::Complete | FrameStatus::Empty => prop_assert!(frame.error.is_none()),
            FrameStatus::Partial => prop_assert!(!frame.measurements.is_empty()),
            FrameStatus::Rejected => prop_assert!(frame.measurements.is_empty()),
        }
    }
}
