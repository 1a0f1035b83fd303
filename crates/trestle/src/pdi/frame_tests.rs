// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use proptest::prelude::*;

use super::*;

#[test]
fn simple_payload_frames_cleanly() {
    let frame = encode(&[0x28]);
    assert_eq!(frame[0], PDI_SOP);
    assert_eq!(*frame.last().unwrap(), PDI_EOP);
    assert_eq!(decode(&frame).unwrap(), vec![0x28]);
}

#[test]
fn reserved_bytes_are_stuffed() {
    let payload = [0x12, PDI_SOP, 0x34, PDI_EOP, PDI_STF];
    let frame = encode(&payload);
    // no bare delimiters inside the span
    let span = &frame[1..frame.len() - 2];
    let mut escaped = false;
    for &b in span {
        if escaped {
            escaped = false;
            continue;
        }
        if b == PDI_STF {
            escaped = true;
            continue;
        }
        assert!(b != PDI_SOP && b != PDI_EOP, "bare delimiter inside span");
    }
    assert_eq!(decode(&frame).unwrap(), payload.to_vec());
}

#[test]
fn reserved_checksum_gets_the_extra_stuff_byte() {
    // sum 0x2E yields checksum 0xD2 (the stuff byte) before adjustment
    let frame = encode(&[0x2E]);
    assert_eq!(frame, vec![PDI_SOP, 0x2E, PDI_STF, 0x00, PDI_EOP]);
    assert_eq!(decode(&frame).unwrap(), vec![0x2E]);
}

#[test]
fn tampering_fails_the_checksum() {
    let mut frame = encode(&[0x26, 0xFE, 0x42, 0x9F]);
    for i in 1..frame.len() - 1 {
        let original = frame[i];
        frame[i] ^= 0x04;
        assert!(decode(&frame).is_err(), "tampered byte {i} accepted");
        frame[i] = original;
    }
    assert!(decode(&frame).is_ok());
}

#[test]
fn bad_delimiters_are_rejected() {
    assert!(decode(&[0xD0, 0x01, 0x00, PDI_EOP]).is_err());
    assert!(decode(&[PDI_SOP, 0x01, 0x00, 0xDE]).is_err());
    assert!(decode(&[PDI_SOP, PDI_EOP]).is_err());
}

#[test]
fn frame_end_skips_escaped_delimiters() {
    let frame = encode(&[0x11, PDI_EOP, 0x22]);
    let end = frame_end(frame.iter().copied()).unwrap();
    assert_eq!(end, frame.len() - 1);
}

proptest! {
    #[test]
    fn stuff_destuff_round_trips(payload in proptest::collection::vec(any::<u8>(), 1..128)) {
        let frame = encode(&payload);
        prop_assert_eq!(decode(&frame).unwrap(), payload);
    }

    #[test]
    fn framed_length_is_bounded(payload in proptest::collection::vec(any::<u8>(), 1..64)) {
        // worst case doubles the payload, plus delimiters, checksum, and
        // the possible checksum adjustment
        let frame = encode(&payload);
        prop_assert!(frame.len() <= payload.len() * 2 + 4);
    }
}
