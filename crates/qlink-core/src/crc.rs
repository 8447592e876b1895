//! CRC-32 Engine
//!
//! Table-based CRC-32 with the ISO 3309 / ITU-T V.42 polynomial 0x04C11DB7
//! (reflected form 0xEDB88320), initial value 0xFFFFFFFF and final XOR
//! 0xFFFFFFFF. This is the same checksum zlib computes, which keeps frames
//! produced here byte-compatible with the original transceiver scripts.
//!
//! ## Example
//!
//! ```rust
//! use qlink_core::crc::Crc32;
//!
//! let mut crc = Crc32::new();
//! crc.update(b"Hello, world!");
//! assert_eq!(crc.finalize(), 0xEBE6C6E6);
//!
//! // One-shot form
//! assert_eq!(Crc32::compute(b"Hello, world!"), 0xEBE6C6E6);
//! ```

/// Reflected CRC-32 polynomial (0x04C11DB7 bit-reversed).
const POLY_REFLECTED: u32 = 0xEDB8_8320;

/// Byte-indexed lookup table, built once at compile time.
const TABLE: [u32; 256] = build_table();

const fn build_table() -> [u32; 256] {
    let mut table = [0u32; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = i as u32;
        let mut bit = 0;
        while bit < 8 {
            crc = if crc & 1 != 0 {
                (crc >> 1) ^ POLY_REFLECTED
            } else {
                crc >> 1
            };
            bit += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
}

/// Streaming CRC-32 computer.
#[derive(Debug, Clone)]
pub struct Crc32 {
    value: u32,
}

impl Crc32 {
    /// Create a new CRC-32 in its initial state.
    pub fn new() -> Self {
        Self { value: 0xFFFF_FFFF }
    }

    /// Update the running CRC with additional data.
    pub fn update(&mut self, data: &[u8]) {
        for &byte in data {
            let idx = ((self.value ^ byte as u32) & 0xFF) as usize;
            self.value = (self.value >> 8) ^ TABLE[idx];
        }
    }

    /// Finalize and return the CRC value. The computer can keep streaming
    /// afterwards; `finalize` does not consume state.
    pub fn finalize(&self) -> u32 {
        self.value ^ 0xFFFF_FFFF
    }

    /// Reset to the initial state.
    pub fn reset(&mut self) {
        self.value = 0xFFFF_FFFF;
    }

    /// Compute the CRC of an entire buffer in one call.
    pub fn compute(data: &[u8]) -> u32 {
        let mut crc = Self::new();
        crc.update(data);
        crc.finalize()
    }

    /// Verify that `data` matches an expected CRC.
    pub fn verify(data: &[u8], expected: u32) -> bool {
        Self::compute(data) == expected
    }
}

impl Default for Crc32 {
    fn default() -> Self {
        Self::new()
    }
}
