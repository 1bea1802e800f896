//! Domain validation predicates for Fordonsfil fields
//!
//! Pure functions, no I/O. These gate the authoritative insert path: a
//! line whose chassinummer or any date field fails validation is rejected
//! as a whole by the parser.

/// Validate a VIN (chassinummer).
///
/// Standard VIN: exactly 17 alphanumeric characters, with I, O and Q
/// excluded (case-insensitive). Checksum digits are not verified.
pub fn is_valid_vin(vin: &str) -> bool {
    let vin = vin.trim();

    if vin.len() != 17 {
        return false;
    }

    vin.bytes().all(|b| match b.to_ascii_uppercase() {
        b'I' | b'O' | b'Q' => false,
        b'A'..=b'Z' | b'0'..=b'9' => true,
        _ => false,
    })
}

/// Validate a date in YYYYMMDD format.
///
/// Empty string and the literal "00000000" are valid and mean "not set".
/// Anything else must be 8 ASCII digits forming a real calendar date with
/// year in [1900, 2100].
pub fn is_valid_date(date: &str) -> bool {
    let date = date.trim();

    if date.is_empty() || date == "00000000" {
        return true;
    }

    if date.len() != 8 || !date.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }

    // Unwraps cannot fire: all-digit substrings of fixed width
    let year: i32 = date[0..4].parse().unwrap_or(0);
    let month: u32 = date[4..6].parse().unwrap_or(0);
    let day: u32 = date[6..8].parse().unwrap_or(0);

    if !(1900..=2100).contains(&year) {
        return false;
    }
    if !(1..=12).contains(&month) {
        return false;
    }
    if !(1..=31).contains(&day) {
        return false;
    }

    day <= days_in_month(year, month)
}

fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 => {
            if is_leap_year(year) {
                29
            } else {
                28
            }
        }
        _ => 0,
    }
}
