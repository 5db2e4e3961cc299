//! Binary form of a sample.
//!
//! The sample mapping is written as a tagged value tree after a five-byte
//! preamble (`NLPA` + format version). All integers are little-endian.
//!
//! | Tag | Value | Payload |
//! |-----|-------|---------|
//! | 0 | null | (none) |
//! | 1 | false | (none) |
//! | 2 | true | (none) |
//! | 3 | signed integer | `i64` |
//! | 4 | unsigned integer | `u64` |
//! | 5 | float | IEEE-754 `f64` |
//! | 6 | string | `u32` length + UTF-8 |
//! | 7 | array | `u32` count + values |
//! | 8 | object | `u32` count + (`u32` key length + UTF-8 key + value) |

use std::io::{self, Cursor, Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use serde_json::{Map, Number, Value};

use crate::model::Sample;

/// File preamble.
pub const MAGIC: &[u8; 4] = b"NLPA";

/// Layout version written after the preamble.
pub const VERSION: u8 = 1;

const MAX_DEPTH: usize = 64;

const TAG_NULL: u8 = 0;
const TAG_FALSE: u8 = 1;
const TAG_TRUE: u8 = 2;
const TAG_I64: u8 = 3;
const TAG_U64: u8 = 4;
const TAG_F64: u8 = 5;
const TAG_STRING: u8 = 6;
const TAG_ARRAY: u8 = 7;
const TAG_OBJECT: u8 = 8;

/// Encodes `sample` as a binary value tree.
///
/// # Errors
///
/// Returns an error if the sample has no JSON-compatible representation or a
/// collection is longer than `u32::MAX`.
pub fn encode(sample: &Sample) -> io::Result<Vec<u8>> {
    let value = serde_json::to_value(sample)?;
    let mut out = Vec::with_capacity(1024);
    out.write_all(MAGIC)?;
    out.write_u8(VERSION)?;
    write_value(&mut out, &value)?;
    Ok(out)
}

/// Decodes a sample from a binary value tree.
///
/// # Errors
///
/// Returns [`io::ErrorKind::InvalidData`] for a wrong preamble, an unknown
/// tag, trailing bytes or a tree that is not a sample, and
/// [`io::ErrorKind::UnexpectedEof`] for truncated input.
pub fn decode(bytes: &[u8]) -> io::Result<Sample> {
    let mut cursor = Cursor::new(bytes);
    let mut magic = [0u8; 4];
    cursor.read_exact(&mut magic)?;
    if &magic != MAGIC {
        return Err(invalid("missing NLPA preamble"));
    }
    let version = cursor.read_u8()?;
    if version != VERSION {
        return Err(invalid(format!("unsupported layout version {version}")));
    }
    let value = read_value(&mut cursor, 0)?;
    if cursor.position() != bytes.len() as u64 {
        return Err(invalid("trailing bytes after value tree"));
    }
    Ok(serde_json::from_value(value)?)
}

fn invalid(message: impl Into<String>) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, message.into())
}

fn write_len<W: Write>(out: &mut W, len: usize) -> io::Result<()> {
    let len = u32::try_from(len).map_err(|_| invalid("collection longer than u32::MAX"))?;
    out.write_u32::<LittleEndian>(len)
}

fn write_str<W: Write>(out: &mut W, s: &str) -> io::Result<()> {
    write_len(out, s.len())?;
    out.write_all(s.as_bytes())
}

fn write_value<W: Write>(out: &mut W, value: &Value) -> io::Result<()> {
    match value {
        Value::Null => out.write_u8(TAG_NULL),
        Value::Bool(false) => out.write_u8(TAG_FALSE),
        Value::Bool(true) => out.write_u8(TAG_TRUE),
        Value::Number(n) => write_number(out, n),
        Value::String(s) => {
            out.write_u8(TAG_STRING)?;
            write_str(out, s)
        }
        Value::Array(items) => {
            out.write_u8(TAG_ARRAY)?;
            write_len(out, items.len())?;
            items.iter().try_for_each(|item| write_value(out, item))
        }
        Value::Object(map) => {
            out.write_u8(TAG_OBJECT)?;
            write_len(out, map.len())?;
            for (key, item) in map {
                write_str(out, key)?;
                write_value(out, item)?;
            }
            Ok(())
        }
    }
}

fn write_number<W: Write>(out: &mut W, n: &Number) -> io::Result<()> {
    if let Some(u) = n.as_u64() {
        out.write_u8(TAG_U64)?;
        out.write_u64::<LittleEndian>(u)
    } else if let Some(i) = n.as_i64() {
        out.write_u8(TAG_I64)?;
        out.write_i64::<LittleEndian>(i)
    } else if let Some(f) = n.as_f64() {
        out.write_u8(TAG_F64)?;
        out.write_f64::<LittleEndian>(f)
    } else {
        Err(invalid(format!("unrepresentable number {n}")))
    }
}

fn read_len<R: Read>(input: &mut R) -> io::Result<usize> {
    let len = input.read_u32::<LittleEndian>()?;
    usize::try_from(len).map_err(|_| invalid("length does not fit in memory"))
}

fn read_str(input: &mut Cursor<&[u8]>) -> io::Result<String> {
    let len = read_len(input)?;
    let remaining = input.get_ref().len() as u64 - input.position();
    if len as u64 > remaining {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "string runs past the end of input",
        ));
    }
    let mut buf = vec![0u8; len];
    input.read_exact(&mut buf)?;
    String::from_utf8(buf).map_err(|e| invalid(format!("invalid UTF-8 string: {e}")))
}

fn read_value(input: &mut Cursor<&[u8]>, depth: usize) -> io::Result<Value> {
    if depth > MAX_DEPTH {
        return Err(invalid("value tree nested too deeply"));
    }
    let tag = input.read_u8()?;
    let value = match tag {
        TAG_NULL => Value::Null,
        TAG_FALSE => Value::Bool(false),
        TAG_TRUE => Value::Bool(true),
        TAG_I64 => Value::from(input.read_i64::<LittleEndian>()?),
        TAG_U64 => Value::from(input.read_u64::<LittleEndian>()?),
        TAG_F64 => {
            let f = input.read_f64::<LittleEndian>()?;
            Value::Number(Number::from_f64(f).ok_or_else(|| invalid("non-finite float"))?)
        }
        TAG_STRING => Value::String(read_str(input)?),
        TAG_ARRAY => {
            let count = read_len(input)?;
            let mut items = Vec::with_capacity(count.min(1 << 16));
            for _ in 0..count {
                items.push(read_value(input, depth + 1)?);
            }
            Value::Array(items)
        }
        TAG_OBJECT => {
            let count = read_len(input)?;
            let mut map = Map::new();
            for _ in 0..count {
                let key = read_str(input)?;
                let item = read_value(input, depth + 1)?;
                map.insert(key, item);
            }
            Value::Object(map)
        }
        other => return Err(invalid(format!("unknown tag {other}"))),
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distributions::{Distribution, ParameterSets};
    use crate::serializer::json;

    fn sample() -> Sample {
        Distribution::from_name("dipoles", &ParameterSets::default())
            .unwrap()
            .draw(21)
    }

    #[test]
    fn starts_with_preamble() {
        let bytes = encode(&sample()).unwrap();
        assert_eq!(&bytes[..4], MAGIC);
        assert_eq!(bytes[4], VERSION);
    }

    #[test]
    fn decodes_to_the_same_sample_as_json() {
        let original = sample();
        let from_binary = decode(&encode(&original).unwrap()).unwrap();
        let from_json = json::decode(&json::encode(&original).unwrap()).unwrap();
        assert_eq!(from_binary, from_json);
        assert_eq!(from_binary, original);
    }

    #[test]
    fn preserves_every_number_kind() {
        let mut out = Vec::new();
        let value = serde_json::json!({"i": -1, "u": 18446744073709551615u64, "f": 2.5e-6, "s": "ρ"});
        write_value(&mut out, &value).unwrap();
        let back = read_value(&mut Cursor::new(out.as_slice()), 0).unwrap();
        assert_eq!(back, value);
    }

    #[test]
    fn rejects_truncated_and_foreign_input() {
        let bytes = encode(&sample()).unwrap();
        let truncated = decode(&bytes[..bytes.len() - 3]).unwrap_err();
        assert_eq!(truncated.kind(), io::ErrorKind::UnexpectedEof);
        let foreign = decode(b"PK\x03\x04\x01").unwrap_err();
        assert_eq!(foreign.kind(), io::ErrorKind::InvalidData);
        let mut trailing = bytes.clone();
        trailing.push(0);
        assert_eq!(decode(&trailing).unwrap_err().kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn rejects_unknown_tags() {
        let mut bytes = MAGIC.to_vec();
        bytes.push(VERSION);
        bytes.push(42);
        assert_eq!(decode(&bytes).unwrap_err().kind(), io::ErrorKind::InvalidData);
    }
}
