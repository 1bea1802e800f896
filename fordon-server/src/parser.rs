//! Fixed-width Fordonsfil line parser
//!
//! Decodes one record line into a [`ParsedVehicle`] or rejects it. Pure
//! function, no I/O. Field layout per the official specification:
//!
//! | Field                | Length | Start (1-indexed) |
//! |----------------------|--------|-------------------|
//! | Identitet            |   7    |   1               |
//! | Chassinummer         |  19    |   8               |
//! | Modellår             |   4    |  27               |
//! | Typgodkännande nr.   |  11    |  31               |
//! | Första registrering  |   8    |  42               |
//! | Privatimporterad     |   1    |  50               |
//! | Avregistrerad datum  |   8    |  51               |
//! | Färg                 |  20    |  59               |
//! | Senast besiktning    |   8    |  79               |
//! | Nästa besiktning     |   8    |  87               |
//! | Senast registrering  |   8    |  95               |
//! | Månadsregistrering   |   4    | 103               |
//!
//! Offsets are byte positions; undecodable bytes are replaced rather than
//! failing the line, matching how the registry files are produced.

use thiserror::Error;

use crate::validate::{is_valid_date, is_valid_vin};

/// Minimum line length: everything up to and including Färg
const MIN_LINE_LEN: usize = 79;

/// Reasons a line is rejected before it reaches the store
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    /// Line too short to carry the mandatory fields
    #[error("Line too short: {length} bytes (minimum {MIN_LINE_LEN})")]
    TooShort { length: usize },

    /// Chassinummer fails VIN shape validation
    #[error("Invalid chassinummer: '{0}'")]
    InvalidVin(String),

    /// A date field fails YYYYMMDD plausibility validation
    #[error("Invalid date in {field}: '{value}'")]
    InvalidDate {
        field: &'static str,
        value: String,
    },
}

/// One successfully parsed and validated registry line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedVehicle {
    pub identitet: String,
    pub chassinummer: String,
    /// Best-effort integer; non-numeric content coerces to 0
    pub modellar: i64,
    pub typgodkannande_nr: String,
    pub forsta_registrering: String,
    /// Best-effort integer flag; non-numeric content coerces to 0
    pub privatimporterad: i64,
    pub avregistrerad_datum: String,
    pub farg: String,
    pub senast_besiktning: String,
    pub nasta_besiktning: String,
    /// Empty when the line is shorter than 102 bytes
    pub senast_registrering: String,
    /// Empty when the line is shorter than 106 bytes
    pub manadsregistrering: String,
    /// The original line, untouched; used as change fingerprint
    pub raw_line: String,
}

/// Extract a fixed-width field as a trimmed string.
///
/// Slicing is byte-based so multi-byte characters in neighbouring fields
/// cannot shift offsets; replacement characters stand in for bytes that
/// are not valid UTF-8 on their own.
fn field(bytes: &[u8], start: usize, len: usize) -> String {
    let end = (start + len).min(bytes.len());
    if start >= end {
        return String::new();
    }
    String::from_utf8_lossy(&bytes[start..end]).trim().to_string()
}

/// Best-effort numeric field: whole-field integer or 0.
///
/// Legacy registry exports carry blanks and stray characters in numeric
/// columns; those coerce to 0 rather than rejecting the line.
fn numeric_field(bytes: &[u8], start: usize, len: usize) -> i64 {
    field(bytes, start, len).parse().unwrap_or(0)
}

/// Parse one Fordonsfil line.
///
/// Trailing whitespace is stripped before the length check. Lines shorter
/// than 79 bytes cannot carry the Färg field and are rejected outright.
/// VIN and all five date fields are validated here; any failure rejects
/// the whole line and nothing reaches the store.
pub fn parse_line(line: &str) -> Result<ParsedVehicle, ParseError> {
    let trimmed = line.trim_end();
    let bytes = trimmed.as_bytes();

    if bytes.len() < MIN_LINE_LEN {
        return Err(ParseError::TooShort { length: bytes.len() });
    }

    let chassinummer = field(bytes, 7, 19);
    if !is_valid_vin(&chassinummer) {
        return Err(ParseError::InvalidVin(chassinummer));
    }

    let forsta_registrering = field(bytes, 41, 8);
    let avregistrerad_datum = field(bytes, 50, 8);
    let senast_besiktning = field(bytes, 78, 8);
    let nasta_besiktning = field(bytes, 86, 8);
    let senast_registrering = if bytes.len() >= 102 {
        field(bytes, 94, 8)
    } else {
        String::new()
    };

    let date_fields = [
        ("forsta_registrering", &forsta_registrering),
        ("avregistrerad_datum", &avregistrerad_datum),
        ("senast_besiktning", &senast_besiktning),
        ("nasta_besiktning", &nasta_besiktning),
        ("senast_registrering", &senast_registrering),
    ];
    for (name, value) in date_fields {
        if !is_valid_date(value) {
            return Err(ParseError::InvalidDate {
                field: name,
                value: value.clone(),
            });
        }
    }

    Ok(ParsedVehicle {
        identitet: field(bytes, 0, 7),
        chassinummer,
        modellar: numeric_field(bytes, 26, 4),
        typgodkannande_nr: field(bytes, 30, 11),
        forsta_registrering,
        privatimporterad: numeric_field(bytes, 49, 1),
        avregistrerad_datum,
        farg: field(bytes, 58, 20),
        senast_besiktning,
        nasta_besiktning,
        senast_registrering,
        manadsregistrering: if bytes.len() >= 106 {
            field(bytes, 102, 4)
        } else {
            String::new()
        },
        raw_line: line.to_string(),
    })
}
