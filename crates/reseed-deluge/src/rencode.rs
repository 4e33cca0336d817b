//! rencode, the compact serialization Deluge uses for RPC payloads.
//!
//! Small integers, short strings, short lists and small dictionaries are
//! packed into the type byte itself. Everything else carries an explicit
//! type byte followed by a big-endian payload or a terminated sequence.

use std::str;

use thiserror::Error;

const CHR_LIST: u8 = 59;
const CHR_DICT: u8 = 60;
const CHR_INT: u8 = 61;
const CHR_INT1: u8 = 62;
const CHR_INT2: u8 = 63;
const CHR_INT4: u8 = 64;
const CHR_INT8: u8 = 65;
const CHR_FLOAT32: u8 = 66;
const CHR_FLOAT64: u8 = 44;
const CHR_TRUE: u8 = 67;
const CHR_FALSE: u8 = 68;
const CHR_NONE: u8 = 69;
const CHR_TERM: u8 = 127;

const INT_POS_FIXED_START: u8 = 0;
const INT_POS_FIXED_COUNT: u8 = 44;
const INT_NEG_FIXED_START: u8 = 70;
const INT_NEG_FIXED_COUNT: u8 = 32;
const DICT_FIXED_START: u8 = 102;
const DICT_FIXED_COUNT: u8 = 25;
const STR_FIXED_START: u8 = 128;
const STR_FIXED_COUNT: u8 = 64;
const LIST_FIXED_START: u8 = STR_FIXED_START + STR_FIXED_COUNT;
const LIST_FIXED_COUNT: u8 = 64;

const MAX_DEPTH: usize = 128;

/// A decoded rencode value.
///
/// Dictionaries keep their wire order; lookups are linear, which suits the
/// handful of keys Deluge responses carry.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Python `None`.
    None,
    /// Boolean.
    Bool(bool),
    /// Signed integer.
    Int(i64),
    /// Floating point number.
    Float(f64),
    /// Byte string; Deluge sends text as UTF-8.
    Bytes(Vec<u8>),
    /// List or tuple.
    List(Vec<Self>),
    /// Dictionary as ordered key/value pairs.
    Dict(Vec<(Self, Self)>),
}

/// Reasons a byte sequence is not valid rencode.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    /// Input ended inside a value.
    #[error("rencode input is truncated")]
    Truncated,
    /// A type byte outside the known ranges.
    #[error("unknown rencode type code")]
    UnknownType {
        /// Offending byte.
        code: u8,
    },
    /// A length prefix or textual integer could not be parsed.
    #[error("malformed rencode number")]
    InvalidNumber,
    /// Nesting exceeded the supported depth.
    #[error("rencode value nested too deeply")]
    TooDeep,
    /// Bytes remained after the top-level value.
    #[error("trailing bytes after rencode value")]
    TrailingBytes {
        /// Count of unconsumed bytes.
        remaining: usize,
    },
}

impl Value {
    /// Build a dictionary with text keys.
    pub fn dict<K, I>(entries: I) -> Self
    where
        K: Into<Self>,
        I: IntoIterator<Item = (K, Self)>,
    {
        Self::Dict(
            entries
                .into_iter()
                .map(|(key, value)| (key.into(), value))
                .collect(),
        )
    }

    /// Text content, when this is valid UTF-8 bytes.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Bytes(bytes) => str::from_utf8(bytes).ok(),
            _ => None,
        }
    }

    /// Integer content.
    #[must_use]
    pub const fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(value) => Some(*value),
            _ => None,
        }
    }

    /// List content.
    #[must_use]
    pub fn as_list(&self) -> Option<&[Self]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Look up a text key in a dictionary.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Self> {
        match self {
            Self::Dict(entries) => entries
                .iter()
                .find(|(entry_key, _)| entry_key.as_str() == Some(key))
                .map(|(_, value)| value),
            _ => None,
        }
    }

    /// Serialize to rencode bytes.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut dest = Vec::new();
        write_value(self, &mut dest);
        dest
    }

    /// Parse exactly one value from `src`.
    ///
    /// # Errors
    ///
    /// Returns a [`DecodeError`] when `src` is not a single well-formed value.
    pub fn from_bytes(src: &[u8]) -> Result<Self, DecodeError> {
        let (value, rest) = read_value(src, 0)?;
        if rest.is_empty() {
            Ok(value)
        } else {
            Err(DecodeError::TrailingBytes {
                remaining: rest.len(),
            })
        }
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Self::Bytes(text.as_bytes().to_vec())
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Self::Bytes(text.into_bytes())
    }
}

fn write_value(value: &Value, dest: &mut Vec<u8>) {
    match value {
        Value::None => dest.push(CHR_NONE),
        Value::Bool(true) => dest.push(CHR_TRUE),
        Value::Bool(false) => dest.push(CHR_FALSE),
        Value::Int(number) => write_int(*number, dest),
        Value::Float(number) => {
            dest.push(CHR_FLOAT64);
            dest.extend_from_slice(&number.to_be_bytes());
        }
        Value::Bytes(data) => {
            match u8::try_from(data.len()) {
                Ok(len) if len < STR_FIXED_COUNT => dest.push(STR_FIXED_START + len),
                _ => {
                    dest.extend_from_slice(data.len().to_string().as_bytes());
                    dest.push(b':');
                }
            }
            dest.extend_from_slice(data);
        }
        Value::List(items) => match u8::try_from(items.len()) {
            Ok(len) if len < LIST_FIXED_COUNT => {
                dest.push(LIST_FIXED_START + len);
                for item in items {
                    write_value(item, dest);
                }
            }
            _ => {
                dest.push(CHR_LIST);
                for item in items {
                    write_value(item, dest);
                }
                dest.push(CHR_TERM);
            }
        },
        Value::Dict(entries) => {
            let fixed = u8::try_from(entries.len())
                .ok()
                .filter(|len| *len < DICT_FIXED_COUNT);
            dest.push(fixed.map_or(CHR_DICT, |len| DICT_FIXED_START + len));
            for (key, item) in entries {
                write_value(key, dest);
                write_value(item, dest);
            }
            if fixed.is_none() {
                dest.push(CHR_TERM);
            }
        }
    }
}

fn write_int(number: i64, dest: &mut Vec<u8>) {
    if let Ok(small) = u8::try_from(number)
        && small < INT_POS_FIXED_COUNT
    {
        dest.push(INT_POS_FIXED_START + small);
    } else if (-i64::from(INT_NEG_FIXED_COUNT)..0).contains(&number) {
        // -1 maps to 70, -32 to 101.
        let offset = u8::try_from(-1 - number).unwrap_or(0);
        dest.push(INT_NEG_FIXED_START + offset);
    } else if let Ok(narrow) = i8::try_from(number) {
        dest.push(CHR_INT1);
        dest.extend_from_slice(&narrow.to_be_bytes());
    } else if let Ok(narrow) = i16::try_from(number) {
        dest.push(CHR_INT2);
        dest.extend_from_slice(&narrow.to_be_bytes());
    } else if let Ok(narrow) = i32::try_from(number) {
        dest.push(CHR_INT4);
        dest.extend_from_slice(&narrow.to_be_bytes());
    } else {
        dest.push(CHR_INT8);
        dest.extend_from_slice(&number.to_be_bytes());
    }
}

fn take(src: &[u8], count: usize) -> Result<(&[u8], &[u8]), DecodeError> {
    if src.len() < count {
        return Err(DecodeError::Truncated);
    }
    Ok(src.split_at(count))
}

fn take_array<const N: usize>(src: &[u8]) -> Result<([u8; N], &[u8]), DecodeError> {
    let (head, rest) = take(src, N)?;
    let mut buf = [0_u8; N];
    buf.copy_from_slice(head);
    Ok((buf, rest))
}

fn read_value(src: &[u8], depth: usize) -> Result<(Value, &[u8]), DecodeError> {
    if depth > MAX_DEPTH {
        return Err(DecodeError::TooDeep);
    }
    let (&code, rest) = src.split_first().ok_or(DecodeError::Truncated)?;
    match code {
        INT_POS_FIXED_START..CHR_FLOAT64 => Ok((Value::Int(i64::from(code)), rest)),
        CHR_FLOAT64 => {
            let (buf, rest) = take_array::<8>(rest)?;
            Ok((Value::Float(f64::from_be_bytes(buf)), rest))
        }
        b'0'..=b'9' => read_prefixed_bytes(src),
        CHR_LIST => read_terminated_list(rest, depth),
        CHR_DICT => read_terminated_dict(rest, depth),
        CHR_INT => {
            let end = rest
                .iter()
                .position(|byte| *byte == CHR_TERM)
                .ok_or(DecodeError::Truncated)?;
            let number = str::from_utf8(&rest[..end])
                .ok()
                .and_then(|text| text.parse::<i64>().ok())
                .ok_or(DecodeError::InvalidNumber)?;
            Ok((Value::Int(number), &rest[end + 1..]))
        }
        CHR_INT1 => {
            let (buf, rest) = take_array::<1>(rest)?;
            Ok((Value::Int(i64::from(i8::from_be_bytes(buf))), rest))
        }
        CHR_INT2 => {
            let (buf, rest) = take_array::<2>(rest)?;
            Ok((Value::Int(i64::from(i16::from_be_bytes(buf))), rest))
        }
        CHR_INT4 => {
            let (buf, rest) = take_array::<4>(rest)?;
            Ok((Value::Int(i64::from(i32::from_be_bytes(buf))), rest))
        }
        CHR_INT8 => {
            let (buf, rest) = take_array::<8>(rest)?;
            Ok((Value::Int(i64::from_be_bytes(buf)), rest))
        }
        CHR_FLOAT32 => {
            let (buf, rest) = take_array::<4>(rest)?;
            Ok((Value::Float(f64::from(f32::from_be_bytes(buf))), rest))
        }
        CHR_TRUE => Ok((Value::Bool(true), rest)),
        CHR_FALSE => Ok((Value::Bool(false), rest)),
        CHR_NONE => Ok((Value::None, rest)),
        INT_NEG_FIXED_START..DICT_FIXED_START => {
            let offset = i64::from(code - INT_NEG_FIXED_START);
            Ok((Value::Int(-1 - offset), rest))
        }
        DICT_FIXED_START..CHR_TERM => {
            let len = usize::from(code - DICT_FIXED_START);
            let mut entries = Vec::with_capacity(len);
            let mut rest = rest;
            for _ in 0..len {
                let (key, after_key) = read_value(rest, depth + 1)?;
                let (value, after_value) = read_value(after_key, depth + 1)?;
                entries.push((key, value));
                rest = after_value;
            }
            Ok((Value::Dict(entries), rest))
        }
        STR_FIXED_START..LIST_FIXED_START => {
            let len = usize::from(code - STR_FIXED_START);
            let (data, rest) = take(rest, len)?;
            Ok((Value::Bytes(data.to_vec()), rest))
        }
        LIST_FIXED_START..=u8::MAX => {
            let len = usize::from(code - LIST_FIXED_START);
            let mut items = Vec::with_capacity(len);
            let mut rest = rest;
            for _ in 0..len {
                let (item, after) = read_value(rest, depth + 1)?;
                items.push(item);
                rest = after;
            }
            Ok((Value::List(items), rest))
        }
        _ => Err(DecodeError::UnknownType { code }),
    }
}

fn read_prefixed_bytes(src: &[u8]) -> Result<(Value, &[u8]), DecodeError> {
    let colon = src
        .iter()
        .position(|byte| *byte == b':')
        .ok_or(DecodeError::Truncated)?;
    let len = str::from_utf8(&src[..colon])
        .ok()
        .and_then(|text| text.parse::<usize>().ok())
        .ok_or(DecodeError::InvalidNumber)?;
    let (data, rest) = take(&src[colon + 1..], len)?;
    Ok((Value::Bytes(data.to_vec()), rest))
}

fn read_terminated_list(mut rest: &[u8], depth: usize) -> Result<(Value, &[u8]), DecodeError> {
    let mut items = Vec::new();
    loop {
        match rest.split_first() {
            None => return Err(DecodeError::Truncated),
            Some((&CHR_TERM, after)) => return Ok((Value::List(items), after)),
            Some(_) => {
                let (item, after) = read_value(rest, depth + 1)?;
                items.push(item);
                rest = after;
            }
        }
    }
}

fn read_terminated_dict(mut rest: &[u8], depth: usize) -> Result<(Value, &[u8]), DecodeError> {
    let mut entries = Vec::new();
    loop {
        match rest.split_first() {
            None => return Err(DecodeError::Truncated),
            Some((&CHR_TERM, after)) => return Ok((Value::Dict(entries), after)),
            Some(_) => {
                let (key, after_key) = read_value(rest, depth + 1)?;
                let (value, after_value) = read_value(after_key, depth + 1)?;
                entries.push((key, value));
                rest = after_value;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(value: &Value) -> Value {
        Value::from_bytes(&value.to_bytes()).expect("decodes")
    }

    #[test]
    fn integers_use_smallest_form() {
        assert_eq!(Value::Int(0).to_bytes(), vec![0]);
        assert_eq!(Value::Int(43).to_bytes(), vec![43]);
        assert_eq!(Value::Int(44).to_bytes(), vec![CHR_INT1, 44]);
        assert_eq!(Value::Int(-1).to_bytes(), vec![70]);
        assert_eq!(Value::Int(-32).to_bytes(), vec![101]);
        assert_eq!(Value::Int(-33).to_bytes(), vec![CHR_INT1, 0xdf]);
        assert_eq!(Value::Int(300).to_bytes(), vec![CHR_INT2, 0x01, 0x2c]);
        assert_eq!(
            Value::Int(70_000).to_bytes(),
            vec![CHR_INT4, 0x00, 0x01, 0x11, 0x70]
        );
        assert_eq!(Value::Int(1 << 40).to_bytes()[0], CHR_INT8);
    }

    #[test]
    fn integer_boundaries_survive() {
        for number in [
            0,
            43,
            44,
            -1,
            -32,
            -33,
            127,
            128,
            -128,
            -129,
            32_767,
            32_768,
            i64::from(i32::MAX) + 1,
            i64::MIN,
            i64::MAX,
        ] {
            assert_eq!(roundtrip(&Value::Int(number)), Value::Int(number));
        }
    }

    #[test]
    fn strings_switch_to_length_prefix_at_64() {
        let short = Value::from("abc");
        assert_eq!(short.to_bytes(), vec![STR_FIXED_START + 3, b'a', b'b', b'c']);

        let long = Value::from("x".repeat(64));
        let bytes = long.to_bytes();
        assert!(bytes.starts_with(b"64:"));
        assert_eq!(bytes.len(), 3 + 64);
        assert_eq!(roundtrip(&long), long);
    }

    #[test]
    fn request_envelope_matches_known_bytes() {
        let request = Value::List(vec![Value::List(vec![
            Value::Int(1),
            Value::from("daemon.info"),
            Value::List(Vec::new()),
            Value::Dict(Vec::new()),
        ])]);
        let mut expected = vec![LIST_FIXED_START + 1, LIST_FIXED_START + 4, 1];
        expected.push(STR_FIXED_START + 11);
        expected.extend_from_slice(b"daemon.info");
        expected.extend_from_slice(&[LIST_FIXED_START, DICT_FIXED_START]);
        assert_eq!(request.to_bytes(), expected);
    }

    #[test]
    fn large_containers_are_terminated() {
        let list = Value::List((0..70).map(Value::Int).collect());
        let bytes = list.to_bytes();
        assert_eq!(bytes[0], CHR_LIST);
        assert_eq!(bytes.last(), Some(&CHR_TERM));
        assert_eq!(roundtrip(&list), list);

        let dict = Value::dict((0..30).map(|n| (format!("k{n}"), Value::Int(n))));
        let bytes = dict.to_bytes();
        assert_eq!(bytes[0], CHR_DICT);
        assert_eq!(roundtrip(&dict), dict);
    }

    #[test]
    fn decodes_python_only_forms() {
        let textual = [CHR_INT, b'-', b'4', b'2', CHR_TERM];
        assert_eq!(Value::from_bytes(&textual), Ok(Value::Int(-42)));

        let mut float32 = vec![CHR_FLOAT32];
        float32.extend_from_slice(&1.5_f32.to_be_bytes());
        assert_eq!(Value::from_bytes(&float32), Ok(Value::Float(1.5)));
    }

    #[test]
    fn nested_dictionary_lookup() {
        let status = Value::dict([(
            "abc",
            Value::dict([
                ("name", Value::from("Album")),
                ("save_path", Value::from("/data")),
            ]),
        )]);
        let decoded = roundtrip(&status);
        let inner = decoded.get("abc").expect("key present");
        assert_eq!(inner.get("name").and_then(Value::as_str), Some("Album"));
        assert!(decoded.get("missing").is_none());
    }

    #[test]
    fn rejects_malformed_input() {
        assert_eq!(Value::from_bytes(&[]), Err(DecodeError::Truncated));
        assert_eq!(
            Value::from_bytes(&[STR_FIXED_START + 5, b'a']),
            Err(DecodeError::Truncated)
        );
        assert_eq!(Value::from_bytes(&[CHR_LIST, 1]), Err(DecodeError::Truncated));
        assert_eq!(
            Value::from_bytes(&[45]),
            Err(DecodeError::UnknownType { code: 45 })
        );
        assert_eq!(
            Value::from_bytes(&[1, 2]),
            Err(DecodeError::TrailingBytes { remaining: 1 })
        );
        assert_eq!(
            Value::from_bytes(b"1x:a"),
            Err(DecodeError::InvalidNumber)
        );
    }

    #[test]
    fn rejects_runaway_nesting() {
        let bytes = vec![LIST_FIXED_START + 1; MAX_DEPTH + 2];
        assert_eq!(Value::from_bytes(&bytes), Err(DecodeError::TooDeep));
    }
}
