//! Intel HEX image loading for the monitor and expansion ROMs.
//!
//! Only type-00 data records carry ROM bytes; every other record type is
//! ignored, as are lines that do not start with a colon. Checksum
//! verification is off by default so existing ROM images (some of which
//! circulate with bad checksums) keep loading; strict mode turns
//! mismatches into errors.

use std::fmt;
use std::path::Path;

use log::{debug, warn};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum HexLoadError {
    /// Underlying I/O error (file not found, permission denied, etc.)
    Io(std::io::Error),

    /// A record line is truncated or contains non-hex characters.
    Malformed { line: usize },

    /// A record checksum does not match (strict mode only).
    Checksum {
        line: usize,
        expected: u8,
        actual: u8,
    },
}

impl fmt::Display for HexLoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::Malformed { line } => write!(f, "malformed HEX record on line {line}"),
            Self::Checksum {
                line,
                expected,
                actual,
            } => write!(
                f,
                "HEX checksum mismatch on line {line}: expected 0x{expected:02X}, got 0x{actual:02X}"
            ),
        }
    }
}

impl std::error::Error for HexLoadError {}

impl From<std::io::Error> for HexLoadError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Load an Intel HEX file into `rom`. Data outside the ROM is skipped with
/// a warning. `verify_checksums` selects strict mode.
pub fn load_hex_file(
    rom: &mut [u8],
    path: &Path,
    verify_checksums: bool,
) -> Result<(), HexLoadError> {
    let text = std::fs::read_to_string(path)?;
    load_hex_str(rom, &text, verify_checksums)
}

/// Load Intel HEX text into `rom`.
pub fn load_hex_str(rom: &mut [u8], text: &str, verify_checksums: bool) -> Result<(), HexLoadError> {
    let mut records = 0usize;

    for (index, raw_line) in text.lines().enumerate() {
        let line_no = index + 1;
        let line = raw_line.trim();
        let Some(body) = line.strip_prefix(':') else {
            continue; // not an Intel HEX record
        };

        let byte_count = hex_byte(body, 0, line_no)? as usize;
        let address = (hex_byte(body, 2, line_no)? as u16) << 8 | hex_byte(body, 4, line_no)? as u16;
        let record_type = hex_byte(body, 6, line_no)?;

        let mut data = Vec::with_capacity(byte_count);
        for i in 0..byte_count {
            data.push(hex_byte(body, 8 + 2 * i, line_no)?);
        }

        if verify_checksums {
            let stored = hex_byte(body, 8 + 2 * byte_count, line_no)?;
            let sum = (byte_count as u8)
                .wrapping_add((address >> 8) as u8)
                .wrapping_add(address as u8)
                .wrapping_add(record_type)
                .wrapping_add(data.iter().fold(0u8, |acc, &b| acc.wrapping_add(b)));
            let expected = sum.wrapping_neg();
            if stored != expected {
                return Err(HexLoadError::Checksum {
                    line: line_no,
                    expected,
                    actual: stored,
                });
            }
        }

        if record_type != 0 {
            continue; // only data records carry ROM bytes
        }

        for (i, &byte) in data.iter().enumerate() {
            let target = address as usize + i;
            if target >= rom.len() {
                warn!("HEX line {line_no}: data at 0x{target:04X} is outside ROM, skipped");
                break;
            }
            rom[target] = byte;
        }
        records += 1;
    }

    debug!("loaded {records} HEX data records");
    Ok(())
}

fn hex_byte(body: &str, pos: usize, line_no: usize) -> Result<u8, HexLoadError> {
    body.get(pos..pos + 2)
        .and_then(|pair| u8::from_str_radix(pair, 16).ok())
        .ok_or(HexLoadError::Malformed { line: line_no })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
