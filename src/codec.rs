//! String codec
//!
//! Conversion between text and the native numeric representations used by
//! [`Registry::as_string`](crate::registry::Registry::as_string).
//!
//! Parsing accepts surrounding whitespace and nothing else: any leftover
//! character makes the text invalid. Integers follow the C base-0 rules
//! (`0x` prefix for hex, leading `0` for octal, optional sign). Rendering is
//! driven by the variable's [`Format`].

use crate::error::{AccessError, AccessResult};
use crate::types::Format;
use chrono::{DateTime, NaiveDate};
use std::fmt::{Display, LowerExp};
use std::str::FromStr;

/// Width of the integer being rendered, used to mask hex output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntWidth {
    Bits16,
    Bits32,
}

/// Parse an integer with C base-0 prefixes
pub fn parse_int(text: &str) -> Option<i64> {
    let s = text.trim();
    let (negative, digits) = match s.as_bytes().first()? {
        b'-' => (true, &s[1..]),
        b'+' => (false, &s[1..]),
        _ => (false, s),
    };

    let (radix, body) = if let Some(hex) = digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        (16, hex)
    } else if digits.len() > 1 && digits.starts_with('0') {
        (8, &digits[1..])
    } else {
        (10, digits)
    };

    if body.is_empty() || !body.chars().all(|c| c.is_digit(radix)) {
        return None;
    }
    let magnitude = i64::from_str_radix(body, radix).ok()?;
    Some(if negative { -magnitude } else { magnitude })
}

/// Parse an INT16; hex text up to `0xffff` wraps to the negative range
pub fn parse_i16(text: &str) -> AccessResult<i16> {
    let value = parse_int(text).ok_or(AccessError::InvalidValue)?;
    if let Ok(v) = i16::try_from(value) {
        return Ok(v);
    }
    match u16::try_from(value) {
        Ok(bits) if is_hex(text) => Ok(bits as i16),
        _ => Err(AccessError::InvalidValue),
    }
}

/// Parse an INT32; hex text up to `0xffffffff` wraps to the negative range
pub fn parse_i32(text: &str) -> AccessResult<i32> {
    let value = parse_int(text).ok_or(AccessError::InvalidValue)?;
    if let Ok(v) = i32::try_from(value) {
        return Ok(v);
    }
    match u32::try_from(value) {
        Ok(bits) if is_hex(text) => Ok(bits as i32),
        _ => Err(AccessError::InvalidValue),
    }
}

fn is_hex(text: &str) -> bool {
    let s = text.trim().trim_start_matches('+');
    s.starts_with("0x") || s.starts_with("0X")
}

/// Parse an INT32 written as a `YYYY-MM-DD` date or as plain seconds
pub fn parse_date(text: &str) -> AccessResult<i32> {
    let s = text.trim();
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        let seconds = date
            .and_hms_opt(0, 0, 0)
            .map(|dt| dt.and_utc().timestamp())
            .ok_or(AccessError::InvalidValue)?;
        return i32::try_from(seconds).map_err(|_| AccessError::InvalidValue);
    }
    parse_i32(s)
}

pub fn parse_f32(text: &str) -> AccessResult<f32> {
    parse_float(text)
}

pub fn parse_f64(text: &str) -> AccessResult<f64> {
    parse_float(text)
}

fn parse_float<F: FromStr + Into<f64> + Copy>(text: &str) -> AccessResult<F> {
    let s = text.trim();
    let value: F = s.parse().map_err(|_| AccessError::InvalidValue)?;
    // Out-of-range literals parse to infinity; only explicit "inf" may do that.
    if value.into().is_infinite() && !names_infinity(s) {
        return Err(AccessError::InvalidValue);
    }
    Ok(value)
}

fn names_infinity(s: &str) -> bool {
    let unsigned = s.trim_start_matches(['+', '-']);
    unsigned.eq_ignore_ascii_case("inf") || unsigned.eq_ignore_ascii_case("infinity")
}

/// Render an integer according to a format
pub fn render_int(value: i64, width: IntWidth, format: Format) -> String {
    match format {
        Format::Hex2 | Format::Hex4 | Format::Hex8 => {
            let bits = match width {
                IntWidth::Bits16 => u64::from(value as u16),
                IntWidth::Bits32 => u64::from(value as u32),
            };
            let digits = match format {
                Format::Hex2 => 2,
                Format::Hex4 => 4,
                _ => 8,
            };
            // Wide INT32 values switch to eight digits
            let digits = if width == IntWidth::Bits32 && bits > 0xFFFF {
                8
            } else {
                digits
            };
            format!("0x{:0width$x}", bits, width = digits)
        }
        Format::Date if width == IntWidth::Bits32 => DateTime::from_timestamp(value, 0)
            .map(|dt| dt.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| value.to_string()),
        _ => value.to_string(),
    }
}

/// Render a floating point value according to a format
///
/// Without a precision hint the shortest text that parses back to the same
/// value of `F` is used.
pub fn render_float<F: Display + LowerExp>(value: F, format: Format) -> String {
    match format.precision() {
        Some(places) => format!("{:.*}", places, value),
        None if format == Format::Sci => format!("{:e}", value),
        None => format!("{}", value),
    }
}

/// Longest prefix of `s` of at most `max` bytes ending on a char boundary
pub fn truncate_utf8(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
