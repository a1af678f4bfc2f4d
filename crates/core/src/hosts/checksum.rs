//! CRC-16/ARC over the little-endian bytes of an id.
//!
//! Picks between the two equivalent feedback-list hosts.

/// Reflected polynomial 0x8005.
const POLY_REFLECTED: u16 = 0xA001;

/// CRC-16/ARC (init 0, reflected, no final xor) of the 8 little-endian bytes of `id`.
pub fn checksum16(id: u64) -> u16 {
    let mut crc: u16 = 0;
    for byte in id.to_le_bytes() {
        crc ^= u16::from(byte);
        for _ in 0..8 {
            if crc & 1 != 0 {
                crc = (crc >> 1) ^ POLY_REFLECTED;
            } else {
                crc >>= 1;
            }
        }
    }
    crc
}

/// Feedback-list bucket (1 or 2) for an item id.
pub fn feedback_bucket(id: u64) -> u8 {
    if checksum16(id) % 100 >= 50 {
        2
    } else {
        1
    }
}
