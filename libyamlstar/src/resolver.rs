//! Core-schema tag resolution for plain scalars.
//!
//! Only plain (unquoted) scalars are resolved; every quoted or block scalar
//! is a string. Resolution is pure and case-sensitive: exactly the spellings
//! below are recognized.

use num_bigint::BigInt;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::node::ScalarTag;

static TIMESTAMP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?x)^(?:
            [0-9]{4}-[0-9]{2}-[0-9]{2}
        |
            [0-9]{4}-[0-9]{1,2}-[0-9]{1,2}
            (?:[Tt]|[\ \t]+)
            [0-9]{1,2}:[0-9]{2}:[0-9]{2}
            (?:\.[0-9]*)?
            (?:[\ \t]*(?:Z|[-+][0-9]{1,2}(?::[0-9]{2})?))?
        )$",
    )
    .expect("timestamp pattern compiles")
});

/// Determine the core-schema tag of a plain scalar.
pub fn resolve(text: &str) -> ScalarTag {
    if is_null(text) {
        ScalarTag::Null
    } else if is_bool(text) {
        ScalarTag::Bool
    } else if is_int(text) {
        ScalarTag::Int
    } else if is_float(text) {
        ScalarTag::Float
    } else if is_timestamp(text) {
        ScalarTag::Timestamp
    } else {
        ScalarTag::Str
    }
}

pub(crate) fn is_null(text: &str) -> bool {
    matches!(text, "" | "~" | "null" | "Null" | "NULL")
}

pub(crate) fn is_bool(text: &str) -> bool {
    parse_bool(text).is_some()
}

pub(crate) fn parse_bool(text: &str) -> Option<bool> {
    match text {
        "true" | "True" | "TRUE" => Some(true),
        "false" | "False" | "FALSE" => Some(false),
        _ => None,
    }
}

fn split_sign(text: &str) -> (bool, &str) {
    if let Some(rest) = text.strip_prefix('-') {
        (true, rest)
    } else if let Some(rest) = text.strip_prefix('+') {
        (false, rest)
    } else {
        (false, text)
    }
}

/// Split an integer literal into sign, digits and radix.
/// Octal and hex forms take no sign.
fn int_parts(text: &str) -> (bool, &str, u32) {
    if let Some(digits) = text.strip_prefix("0o") {
        return (false, digits, 8);
    }
    if let Some(digits) = text.strip_prefix("0x") {
        return (false, digits, 16);
    }
    let (negative, digits) = split_sign(text);
    (negative, digits, 10)
}

pub(crate) fn is_int(text: &str) -> bool {
    let (_, digits, radix) = int_parts(text);
    !digits.is_empty() && digits.chars().all(|c| c.is_digit(radix))
}

/// Parse an integer literal at arbitrary precision.
pub(crate) fn parse_int(text: &str) -> Option<BigInt> {
    if !is_int(text) {
        return None;
    }
    let (negative, digits, radix) = int_parts(text);
    let magnitude = BigInt::parse_bytes(digits.as_bytes(), radix)?;
    Some(if negative { -magnitude } else { magnitude })
}

/// Decimal float syntax: `[-+]? ( . digits | digits ( . digits? )? ) ( [eE] [-+]? digits )?`
fn is_decimal_float(text: &str) -> bool {
    let bytes = text.as_bytes();
    let mut i = 0;
    let digits = |i: &mut usize| {
        let begin = *i;
        while *i < bytes.len() && bytes[*i].is_ascii_digit() {
            *i += 1;
        }
        *i - begin
    };

    if i < bytes.len() && (bytes[i] == b'-' || bytes[i] == b'+') {
        i += 1;
    }
    let whole = digits(&mut i);
    if i < bytes.len() && bytes[i] == b'.' {
        i += 1;
        let fraction = digits(&mut i);
        if whole == 0 && fraction == 0 {
            return false;
        }
    } else if whole == 0 {
        return false;
    }
    if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
        i += 1;
        if i < bytes.len() && (bytes[i] == b'-' || bytes[i] == b'+') {
            i += 1;
        }
        if digits(&mut i) == 0 {
            return false;
        }
    }
    i == bytes.len()
}

pub(crate) fn is_float(text: &str) -> bool {
    parse_float(text).is_some()
}

/// Parse a float literal, including the special infinity and NaN spellings.
pub(crate) fn parse_float(text: &str) -> Option<f64> {
    match text {
        ".nan" | ".NaN" | ".NAN" => return Some(f64::NAN),
        _ => {}
    }
    let (negative, body) = split_sign(text);
    let magnitude = match body {
        ".inf" | ".Inf" | ".INF" => f64::INFINITY,
        _ if is_decimal_float(text) => body.parse::<f64>().ok()?,
        _ => return None,
    };
    Some(if negative { -magnitude } else { magnitude })
}

pub(crate) fn is_timestamp(text: &str) -> bool {
    TIMESTAMP.is_match(text)
}

/// Canonical text of a float: always float-looking, so it resolves back
/// to a float.
pub(crate) fn canonical_float(value: f64) -> String {
    if value.is_nan() {
        ".nan".to_string()
    } else if value.is_infinite() {
        if value > 0.0 {
            ".inf".to_string()
        } else {
            "-.inf".to_string()
        }
    } else {
        format!("{:?}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_spellings() {
        for text in ["", "~", "null", "Null", "NULL"] {
            assert_eq!(resolve(text), ScalarTag::Null, "{:?}", text);
        }
        assert_eq!(resolve("nULL"), ScalarTag::Str);
    }

    #[test]
    fn test_bool_spellings() {
        for text in ["true", "True", "TRUE", "false", "False", "FALSE"] {
            assert_eq!(resolve(text), ScalarTag::Bool, "{:?}", text);
        }
        for text in ["yes", "no", "on", "off", "tRUE"] {
            assert_eq!(resolve(text), ScalarTag::Str, "{:?}", text);
        }
    }

    #[test]
    fn test_integers() {
        for text in ["0", "42", "-17", "+3", "0o17", "0x1F", "0xff", "007"] {
            assert_eq!(resolve(text), ScalarTag::Int, "{:?}", text);
        }
        for text in ["0x", "0o8", "-0x1", "1_000", "0b101"] {
            assert_ne!(resolve(text), ScalarTag::Int, "{:?}", text);
        }
        assert_eq!(parse_int("0o17"), Some(BigInt::from(15)));
        assert_eq!(parse_int("0x1F"), Some(BigInt::from(31)));
        assert_eq!(parse_int("-17"), Some(BigInt::from(-17)));
        assert_eq!(parse_int("+3"), Some(BigInt::from(3)));
    }

    #[test]
    fn test_big_integer() {
        let text = "123456789012345678901234567890";
        assert_eq!(resolve(text), ScalarTag::Int);
        assert_eq!(parse_int(text).map(|n| n.to_string()), Some(text.to_string()));
    }

    #[test]
    fn test_floats() {
        for text in ["3.14", "-0.5", ".5", "1.", "1e10", "6.02E+23", "+1.5e-3"] {
            assert_eq!(resolve(text), ScalarTag::Float, "{:?}", text);
        }
        for text in [".", "e5", "1.2.3", "1e", "--1.0"] {
            assert_ne!(resolve(text), ScalarTag::Float, "{:?}", text);
        }
        assert_eq!(parse_float(".5"), Some(0.5));
        assert_eq!(parse_float("1."), Some(1.0));
    }

    #[test]
    fn test_special_floats() {
        assert_eq!(parse_float(".inf"), Some(f64::INFINITY));
        assert_eq!(parse_float("-.Inf"), Some(f64::NEG_INFINITY));
        assert_eq!(parse_float("+.INF"), Some(f64::INFINITY));
        assert!(parse_float(".NaN").map(f64::is_nan).unwrap_or(false));
        assert_eq!(parse_float("-.nan"), None);
        assert_eq!(resolve(".Nan"), ScalarTag::Str);
    }

    #[test]
    fn test_timestamps() {
        for text in [
            "2001-12-14",
            "2001-12-14t21:59:43.10-05:00",
            "2001-12-14 21:59:43.10 -5",
            "2001-12-15T02:59:43.1Z",
            "2002-12-14 21:59:43",
        ] {
            assert_eq!(resolve(text), ScalarTag::Timestamp, "{:?}", text);
        }
        assert_eq!(resolve("2001-1-1"), ScalarTag::Str);
        assert_eq!(resolve("2001-12-14x"), ScalarTag::Str);
    }

    #[test]
    fn test_strings() {
        for text in ["hello", "hello world", "1.2.3", "0.1.0", "-", "a:b"] {
            assert_eq!(resolve(text), ScalarTag::Str, "{:?}", text);
        }
    }

    #[test]
    fn test_canonical_float_resolves_back() {
        for value in [0.0, -0.0, 1.0, 0.1, 1e20, 1.5e-7, f64::MAX] {
            let text = canonical_float(value);
            assert_eq!(resolve(&text), ScalarTag::Float, "{:?}", text);
            assert_eq!(parse_float(&text), Some(value));
        }
        assert_eq!(canonical_float(f64::INFINITY), ".inf");
        assert_eq!(canonical_float(f64::NEG_INFINITY), "-.inf");
        assert_eq!(canonical_float(f64::NAN), ".nan");
    }
}
