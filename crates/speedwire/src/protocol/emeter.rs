// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Emeter payload walk.
//!
//! An emeter payload is a sequence of fixed 12-byte record blocks: four
//! identifier bytes followed by eight bytes of value/fill. Decoding walks
//! the blocks, resolves each identifier against the predefined catalog, and
//! converts the trailing value bytes back to a physical value with the
//! matched record's divisor. Encoding is the mirror operation and appends
//! the end-of-data sentinel.

use crate::protocol::constants::{OBIS_RECORD_SIZE, OBIS_VALUE_OFFSET};
use crate::protocol::obis::{
    format_firmware_version, EncodeError, Line, MeasurementType, ObisCatalog, ObisId, ObisRecord,
    ValueEncoding,
};

/// Read the 32-bit big-endian value of a record block.
pub fn read_value4(block: &[u8]) -> u32 {
    u32::from_be_bytes([
        block[OBIS_VALUE_OFFSET],
        block[OBIS_VALUE_OFFSET + 1],
        block[OBIS_VALUE_OFFSET + 2],
        block[OBIS_VALUE_OFFSET + 3],
    ])
}

/// Read the 64-bit big-endian value of a record block.
pub fn read_value8(block: &[u8]) -> u64 {
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&block[OBIS_VALUE_OFFSET..OBIS_VALUE_OFFSET + 8]);
    u64::from_be_bytes(bytes)
}

/// Write a 32-bit value big-endian into a record block.
pub fn write_value4(block: &mut [u8], value: u32) {
    block[OBIS_VALUE_OFFSET..OBIS_VALUE_OFFSET + 4].copy_from_slice(&value.to_be_bytes());
}

/// Write a 64-bit value big-endian into a record block.
pub fn write_value8(block: &mut [u8], value: u64) {
    block[OBIS_VALUE_OFFSET..OBIS_VALUE_OFFSET + 8].copy_from_slice(&value.to_be_bytes());
}

/// Decode an emeter payload into measurement records.
///
/// Walks successive 12-byte blocks, looks each identifier up in the
/// predefined catalog by structural equality, and interprets the value bytes
/// per the matched record's width class and divisor. The walk stops at the
/// end-of-data sentinel (which is not part of the result). Unknown
/// identifiers and a trailing partial block are skipped with a debug log --
/// they never fail the walk.
///
/// `timer` tags every decoded value with the datagram's timestamp/sequence.
pub fn decode_payload(payload: &[u8], timer: u32) -> Vec<ObisRecord> {
    let catalog = ObisCatalog::global();
    let mut records = Vec::new();

    let mut chunks = payload.chunks_exact(OBIS_RECORD_SIZE);
    for block in &mut chunks {
        let id = match ObisId::from_bytes(block) {
            Some(id) => id,
            None => break,
        };

        let template = match catalog.find(id) {
            Some(template) => template,
            None => {
                log::debug!("[EMETER] unknown identifier {} skipped", id);
                continue;
            }
        };

        let mut record = template.clone();
        match record.measurement_type.encoding {
            ValueEncoding::EndOfData => break,
            ValueEncoding::Word4 => {
                let raw = read_value4(block);
                record.set_value(
                    timer,
                    f64::from(raw) / f64::from(record.measurement_type.divisor),
                );
            }
            ValueEncoding::Word8 => {
                let raw = read_value8(block);
                record.set_value(timer, raw as f64 / f64::from(record.measurement_type.divisor));
            }
            ValueEncoding::FirmwareVersion => {
                let raw = read_value4(block);
                record.set_text(timer, format_firmware_version(raw));
            }
        }
        records.push(record);
    }

    let trailing = chunks.remainder().len();
    if trailing != 0 {
        log::debug!("[EMETER] {} trailing payload bytes skipped", trailing);
    }

    records
}

/// Encode measurement records into an emeter payload.
///
/// Records are serialized in the given order and the payload is terminated
/// with the end-of-data sentinel (unless the caller already appended one).
pub fn encode_payload(records: &[ObisRecord]) -> Result<Vec<u8>, EncodeError> {
    let mut payload = Vec::with_capacity((records.len() + 1) * OBIS_RECORD_SIZE);
    for record in records {
        payload.extend_from_slice(&record.to_bytes()?);
    }

    let ends_with_sentinel = records
        .last()
        .is_some_and(|record| record.measurement_type.encoding == ValueEncoding::EndOfData);
    if !ends_with_sentinel {
        let sentinel = ObisRecord::new(
            ObisId::END_OF_DATA,
            MeasurementType::end_of_data(),
            Line::NotApplicable,
        );
        payload.extend_from_slice(&sentinel.to_bytes()?);
    }

    Ok(payload)
}
