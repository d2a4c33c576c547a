//! RTU frame encoding and validation

use crate::error::ModbusError;
use crate::function::{EXCEPTION_FLAG, READ_INPUT_REGISTERS};

/// Station id + function code + byte count
pub const RESPONSE_HEADER_LEN: usize = 3;

/// Length of an exception response (station, function, code, CRC)
pub const EXCEPTION_RESPONSE_LEN: usize = 5;

/// CRC-16/MODBUS (reflected poly 0xA001, init 0xFFFF)
pub fn crc16(bytes: &[u8]) -> u16 {
    let mut crc: u16 = 0xFFFF;
    for &byte in bytes {
        crc ^= byte as u16;
        for _ in 0..8 {
            if crc & 0x0001 != 0 {
                crc = (crc >> 1) ^ 0xA001;
            } else {
                crc >>= 1;
            }
        }
    }
    crc
}

/// Build a "read input registers" request frame. The CRC goes on the
/// wire low byte first.
pub fn encode_read_request(station: u8, address: u16, count: u16) -> [u8; 8] {
    let [addr_hi, addr_lo] = address.to_be_bytes();
    let [count_hi, count_lo] = count.to_be_bytes();
    let mut frame = [
        station,
        READ_INPUT_REGISTERS,
        addr_hi,
        addr_lo,
        count_hi,
        count_lo,
        0,
        0,
    ];
    let [crc_lo, crc_hi] = crc16(&frame[..6]).to_le_bytes();
    frame[6] = crc_lo;
    frame[7] = crc_hi;
    frame
}

/// Total frame length implied by a response header, so the reader knows
/// how many bytes are still owed.
pub fn expected_response_len(header: &[u8; RESPONSE_HEADER_LEN]) -> usize {
    if header[1] & EXCEPTION_FLAG != 0 {
        EXCEPTION_RESPONSE_LEN
    } else {
        RESPONSE_HEADER_LEN + header[2] as usize + 2
    }
}

/// Validate a complete response frame and extract its register values
pub fn decode_read_response(station: u8, frame: &[u8]) -> Result<Vec<u16>, ModbusError> {
    if frame.len() < EXCEPTION_RESPONSE_LEN {
        return Err(ModbusError::InvalidResponse(format!(
            "frame too short ({} bytes)",
            frame.len()
        )));
    }

    let (body, crc_bytes) = frame.split_at(frame.len() - 2);
    let actual = u16::from_le_bytes([crc_bytes[0], crc_bytes[1]]);
    let expected = crc16(body);
    if actual != expected {
        return Err(ModbusError::CrcMismatch { expected, actual });
    }

    if body[0] != station {
        return Err(ModbusError::InvalidResponse(format!(
            "reply from station {} while polling station {}",
            body[0], station
        )));
    }

    let function = body[1];
    if function == READ_INPUT_REGISTERS | EXCEPTION_FLAG {
        return Err(ModbusError::Exception {
            station,
            code: body[2],
        });
    }
    if function != READ_INPUT_REGISTERS {
        return Err(ModbusError::InvalidResponse(format!(
            "unexpected function code {:02X}",
            function
        )));
    }

    let byte_count = body[2] as usize;
    let data = &body[RESPONSE_HEADER_LEN..];
    if byte_count % 2 != 0 || data.len() != byte_count {
        return Err(ModbusError::InvalidResponse(format!(
            "byte count {} does not match {} data bytes",
            byte_count,
            data.len()
        )));
    }

    Ok(data
        .chunks_exact(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
        .collect())
}
