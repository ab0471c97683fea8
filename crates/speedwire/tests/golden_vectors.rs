// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com
//
// Speedwire golden vectors: byte-exact wire-format checks for the frame
// envelope and the emeter record codec. Each test assembles a known
// deterministic value and verifies the exact on-wire bytes, then the
// decode -> re-encode roundtrip where one exists.

use speedwire::protocol::constants::{
    HEADER_SIZE, OBIS_RECORD_SIZE, PAYLOAD_OFFSET, PROTOCOL_ID_EMETER,
};
use speedwire::protocol::{emeter, Line, MeasurementType, ObisId, ObisRecord, SpeedwireHeader};

fn record(id: ObisId, measurement_type: MeasurementType, line: Line, value: f64) -> ObisRecord {
    let mut record = ObisRecord::new(id, measurement_type, line);
    record.set_value(0, value);
    record
}

#[test]
fn golden_frame_header() {
    let mut buf = [0u8; HEADER_SIZE];
    let mut header = SpeedwireHeader::new(&mut buf[..]);
    header.set_default_header_with(0x0000_0001, 0x0244, PROTOCOL_ID_EMETER);
    header.set_long_words(0);
    header.set_control(0);

    #[rustfmt::skip]
    let expected: [u8; HEADER_SIZE] = [
        0x53, 0x4D, 0x41, 0x00, // "SMA\0"
        0x00, 0x04, 0x02, 0xA0, // tag0
        0x00, 0x00, 0x00, 0x01, // group
        0x02, 0x44,             // length
        0x00, 0x10,             // SMA Net 2
        0x60, 0x69,             // emeter protocol id
        0x00,                   // long words
        0x00,                   // control
        0x00, 0x00, 0x00, 0x00, // reserved envelope fill
    ];
    assert_eq!(buf, expected, "frame header wire bytes");

    let view = SpeedwireHeader::new(&buf[..]);
    assert!(view.check_header());
    assert!(view.is_emeter_protocol_id());
    assert_eq!(view.group(), 1);
    assert_eq!(view.length(), 0x0244);
    assert_eq!(view.payload_offset(), PAYLOAD_OFFSET);
}

#[test]
fn golden_power_record() {
    let power = record(
        ObisId::new(0, 1, 4, 0),
        MeasurementType::positive_active_power(),
        Line::Total,
        123.45,
    );
    let bytes = power.to_bytes().expect("word4 record");

    #[rustfmt::skip]
    let expected: [u8; OBIS_RECORD_SIZE] = [
        0x00, 0x01, 0x04, 0x00,             // identifier 0.01.4.0
        0x00, 0x00, 0x04, 0xD2,             // 1234 (123.45 W * 10, truncated)
        0xFF, 0xFF, 0xFF, 0xFF,             // fill
    ];
    assert_eq!(bytes, expected, "word4 record wire bytes");
}

#[test]
fn golden_energy_record() {
    let energy = record(
        ObisId::new(0, 1, 8, 0),
        MeasurementType::positive_active_energy(),
        Line::Total,
        1.0,
    );
    let bytes = energy.to_bytes().expect("word8 record");

    #[rustfmt::skip]
    let expected: [u8; OBIS_RECORD_SIZE] = [
        0x00, 0x01, 0x08, 0x00,                         // identifier 0.01.8.0
        0x00, 0x00, 0x00, 0x00, 0x00, 0x36, 0xEE, 0x80, // 3_600_000 (1 kWh)
    ];
    assert_eq!(bytes, expected, "word8 record wire bytes");
}

#[test]
fn golden_software_version_record() {
    let mut version = ObisRecord::new(
        ObisId::SOFTWARE_VERSION,
        MeasurementType::software_version(),
        Line::NotApplicable,
    );
    version.set_text(0, "1.2.3.4".to_string());
    let bytes = version.to_bytes().expect("firmware record");

    #[rustfmt::skip]
    let expected: [u8; OBIS_RECORD_SIZE] = [
        0x90, 0x00, 0x00, 0x00, // identifier 144.00.0.0
        0x04, 0x03, 0x02, 0x01, // last parsed component in the highest byte
        0xFF, 0xFF, 0xFF, 0xFF, // fill
    ];
    assert_eq!(bytes, expected, "firmware record wire bytes");
}

#[test]
fn golden_full_emeter_datagram() {
    let records = vec![
        record(
            ObisId::new(0, 1, 4, 0),
            MeasurementType::positive_active_power(),
            Line::Total,
            123.4,
        ),
        record(
            ObisId::new(0, 32, 4, 0),
            MeasurementType::voltage(),
            Line::L1,
            230.0,
        ),
    ];
    let payload = emeter::encode_payload(&records).expect("payload");
    assert_eq!(payload.len(), 3 * OBIS_RECORD_SIZE, "2 records + sentinel");

    let mut datagram = vec![0u8; PAYLOAD_OFFSET + payload.len()];
    let length = (datagram.len() - 16) as u16;
    let mut header = SpeedwireHeader::new(&mut datagram[..]);
    header.set_default_header_with(1, length, PROTOCOL_ID_EMETER);
    header.payload_mut().copy_from_slice(&payload);

    // The receive path sees exactly what was assembled.
    let view = SpeedwireHeader::new(&datagram[..]);
    assert!(view.check_header(), "assembled datagram must validate");
    assert!(view.is_emeter_protocol_id());

    let decoded = emeter::decode_payload(view.payload(), 1234);
    assert_eq!(decoded.len(), 2, "sentinel terminates the walk");
    assert_eq!(decoded[0].id, ObisId::new(0, 1, 4, 0));
    assert!((decoded[0].value.value - 123.4).abs() < 1e-9);
    assert_eq!(decoded[1].id, ObisId::new(0, 32, 4, 0));
    assert!((decoded[1].value.value - 230.0).abs() < 1e-9);
    assert!(decoded.iter().all(|r| r.value.timer == 1234));
}

#[test]
fn golden_header_rejects_corruption() {
    let mut buf = [0u8; HEADER_SIZE];
    let mut header = SpeedwireHeader::new(&mut buf[..]);
    header.set_default_header();

    for offset in 0..8 {
        let mut corrupted = buf;
        corrupted[offset] = corrupted[offset].wrapping_add(1);
        let view = SpeedwireHeader::new(&corrupted[..]);
        assert!(
            !view.check_header(),
            "corrupted magic byte {} must invalidate",
            offset
        );
    }
}
