//! CBOR output for loaded documents.
//!
//! Mapping from the JSON projection to CBOR:
//!   - null          -> simple value 22
//!   - bool          -> simple values 20/21
//!   - integer       -> major 0/1, smallest encoding that fits
//!   - float         -> float64 (always 9 bytes, never downgraded)
//!   - string        -> text string (determinate length)
//!   - array         -> array (determinate length)
//!   - object        -> map with text keys, in document order

use std::fmt::{self, Write as FmtWrite};

use ciborium::value::Value as CborValue;
use serde_json::{Number, Value};

/// Encode a projected document as CBOR bytes.
///
/// Written by hand rather than through ciborium, which shortens floats to
/// half or single precision whenever the value allows.
pub fn encode(value: &Value) -> Vec<u8> {
    let mut buf = Vec::new();
    write_value(&mut buf, value);
    buf
}

fn write_value(buf: &mut Vec<u8>, value: &Value) {
    match value {
        Value::Null => buf.push(0xf6),
        Value::Bool(b) => buf.push(if *b { 0xf5 } else { 0xf4 }),
        Value::Number(n) => write_number(buf, n),
        Value::String(s) => write_text(buf, s),
        Value::Array(items) => {
            write_type_and_length(buf, 4, items.len() as u64);
            for item in items {
                write_value(buf, item);
            }
        }
        Value::Object(map) => {
            write_type_and_length(buf, 5, map.len() as u64);
            for (key, item) in map {
                write_text(buf, key);
                write_value(buf, item);
            }
        }
    }
}

fn write_text(buf: &mut Vec<u8>, s: &str) {
    write_type_and_length(buf, 3, s.len() as u64);
    buf.extend_from_slice(s.as_bytes());
}

fn write_number(buf: &mut Vec<u8>, n: &Number) {
    if let Some(u) = n.as_u64() {
        write_type_and_length(buf, 0, u);
    } else if let Some(i) = n.as_i64() {
        // Major 1 encodes -1 - arg.
        write_type_and_length(buf, 1, !(i as u64));
    } else {
        let f = n.as_f64().unwrap_or(f64::NAN);
        buf.push(0xfb);
        buf.extend_from_slice(&f.to_be_bytes());
    }
}

/// Write a major type with its argument in the shortest form:
/// 0-23 inline, then 1, 2, 4 or 8 following bytes.
fn write_type_and_length(buf: &mut Vec<u8>, major: u8, val: u64) {
    let high = major << 5;
    match val {
        0..=23 => buf.push(high | val as u8),
        24..=0xff => {
            buf.push(high | 24);
            buf.push(val as u8);
        }
        0x100..=0xffff => {
            buf.push(high | 25);
            buf.extend_from_slice(&(val as u16).to_be_bytes());
        }
        0x10000..=0xffff_ffff => {
            buf.push(high | 26);
            buf.extend_from_slice(&(val as u32).to_be_bytes());
        }
        _ => {
            buf.push(high | 27);
            buf.extend_from_slice(&val.to_be_bytes());
        }
    }
}

/// Render CBOR bytes in diagnostic notation (RFC 8949 §8).
///
/// Rendered from the decoded wire bytes, so the output shows what was
/// actually encoded.
pub fn diagnostic(input: &[u8]) -> Result<String, String> {
    let cbor: CborValue =
        ciborium::de::from_reader(input).map_err(|e| format!("CBOR decode error: {}", e))?;
    let mut out = String::new();
    diag_value(&mut out, &cbor, 0).map_err(|e| e.to_string())?;
    out.push('\n');
    Ok(out)
}

fn diag_value(out: &mut String, val: &CborValue, indent: usize) -> fmt::Result {
    match val {
        CborValue::Null => out.push_str("null"),
        CborValue::Bool(b) => write!(out, "{}", b)?,
        CborValue::Integer(i) => write!(out, "{}", i128::from(*i))?,
        CborValue::Float(f) => diag_float(out, *f)?,
        CborValue::Text(s) => diag_text(out, s)?,
        CborValue::Bytes(bytes) => {
            out.push_str("h'");
            for byte in bytes {
                write!(out, "{:02x}", byte)?;
            }
            out.push('\'');
        }
        CborValue::Array(items) => diag_array(out, items, indent)?,
        CborValue::Map(pairs) => diag_map(out, pairs, indent)?,
        CborValue::Tag(tag, inner) => {
            write!(out, "{}(", tag)?;
            diag_value(out, inner, indent)?;
            out.push(')');
        }
        other => write!(out, "<?unknown {:?}>", other)?,
    }
    Ok(())
}

fn diag_float(out: &mut String, f: f64) -> fmt::Result {
    if f.is_nan() {
        out.push_str("NaN");
    } else if f.is_infinite() {
        out.push_str(if f > 0.0 { "Infinity" } else { "-Infinity" });
    } else if f.fract() == 0.0 && f.abs() < 1e18 {
        write!(out, "{:.1}", f)?;
    } else {
        write!(out, "{:?}", f)?;
    }
    Ok(())
}

fn diag_text(out: &mut String, s: &str) -> fmt::Result {
    out.push('"');
    for ch in s.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => write!(out, "\\u{:04x}", c as u32)?,
            c => out.push(c),
        }
    }
    out.push('"');
    Ok(())
}

fn pad(out: &mut String, indent: usize) {
    out.extend(std::iter::repeat(' ').take(indent));
}

fn diag_array(out: &mut String, items: &[CborValue], indent: usize) -> fmt::Result {
    if items.is_empty() {
        out.push_str("[]");
        return Ok(());
    }
    // Short runs of scalars stay on one line.
    if items.len() <= 5 && items.iter().all(is_simple_value) {
        out.push('[');
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            diag_value(out, item, indent)?;
        }
        out.push(']');
        return Ok(());
    }
    out.push_str("[\n");
    for (i, item) in items.iter().enumerate() {
        pad(out, indent + 2);
        diag_value(out, item, indent + 2)?;
        if i + 1 < items.len() {
            out.push(',');
        }
        out.push('\n');
    }
    pad(out, indent);
    out.push(']');
    Ok(())
}

fn diag_map(out: &mut String, pairs: &[(CborValue, CborValue)], indent: usize) -> fmt::Result {
    if pairs.is_empty() {
        out.push_str("{}");
        return Ok(());
    }
    out.push_str("{\n");
    for (i, (key, value)) in pairs.iter().enumerate() {
        pad(out, indent + 2);
        diag_value(out, key, indent + 2)?;
        out.push_str(": ");
        diag_value(out, value, indent + 2)?;
        if i + 1 < pairs.len() {
            out.push(',');
        }
        out.push('\n');
    }
    pad(out, indent);
    out.push('}');
    Ok(())
}

fn is_simple_value(val: &CborValue) -> bool {
    matches!(
        val,
        CborValue::Null
            | CborValue::Bool(_)
            | CborValue::Integer(_)
            | CborValue::Float(_)
            | CborValue::Text(_)
            | CborValue::Bytes(_)
    )
}
