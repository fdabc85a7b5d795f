//! The on-disk row format (spec §4.G): column 0 (the primary key) is never
//! present here — it is the `sled` key. Columns 1..n are packed as a
//! positional, length-prefixed binary tuple: `[tag:u8][len:u32 LE][bytes]`
//! per cell, in declaration order.

use common::err::decode_error::EngineError;
use common::err::CResult;
use common::value::Value;

const TAG_NULL: u8 = 0;
const TAG_INT: u8 = 1;
const TAG_FLOAT: u8 = 2;
const TAG_BOOL: u8 = 3;
const TAG_BYTES: u8 = 4;
const TAG_TEXT: u8 = 5;
const TAG_TIMESTAMP: u8 = 6;

/// Packs the non-key cells of one row (spec §4.G row format).
pub fn encode_row(cells: &[Value]) -> Vec<u8> {
    let mut out = Vec::new();
    for cell in cells {
        encode_cell(cell, &mut out);
    }
    out
}

fn encode_cell(cell: &Value, out: &mut Vec<u8>) {
    match cell {
        Value::Null => out.push(TAG_NULL),
        Value::Int(n) => write_field(out, TAG_INT, &n.to_le_bytes()),
        Value::Float(n) => write_field(out, TAG_FLOAT, &n.to_le_bytes()),
        Value::Bool(b) => write_field(out, TAG_BOOL, &[if *b { 1 } else { 0 }]),
        Value::Bytes(b) => write_field(out, TAG_BYTES, b),
        Value::Text(s) => write_field(out, TAG_TEXT, s.as_bytes()),
        Value::Timestamp(t) => {
            write_field(out, TAG_TIMESTAMP, t.format("%Y-%m-%d %H:%M:%S%.f").to_string().as_bytes())
        }
    }
}

fn write_field(out: &mut Vec<u8>, tag: u8, bytes: &[u8]) {
    out.push(tag);
    out.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
    out.extend_from_slice(bytes);
}

/// Unpacks `expected` cells from `bytes` (the inverse of [`encode_row`]).
pub fn decode_row(bytes: &[u8], expected: usize) -> CResult<Vec<Value>> {
    let mut cells = Vec::with_capacity(expected);
    let mut pos = 0;
    while pos < bytes.len() {
        let tag = bytes[pos];
        pos += 1;
        let len = u32::from_le_bytes(
            bytes
                .get(pos..pos + 4)
                .ok_or_else(|| EngineError::Codec("truncated row: missing length prefix".to_string()))?
                .try_into()
                .unwrap(),
        ) as usize;
        pos += 4;
        let field = bytes
            .get(pos..pos + len)
            .ok_or_else(|| EngineError::Codec("truncated row: missing field bytes".to_string()))?;
        pos += len;
        cells.push(decode_cell(tag, field)?);
    }
    if cells.len() != expected {
        return Err(EngineError::Codec(format!(
            "row has {} cells, expected {}",
            cells.len(),
            expected
        )));
    }
    Ok(cells)
}

fn decode_cell(tag: u8, field: &[u8]) -> CResult<Value> {
    Ok(match tag {
        TAG_NULL => Value::Null,
        TAG_INT => Value::Int(i64::from_le_bytes(field.try_into().map_err(|_| {
            EngineError::Codec("malformed int field".to_string())
        })?)),
        TAG_FLOAT => Value::Float(f64::from_le_bytes(field.try_into().map_err(|_| {
            EngineError::Codec("malformed float field".to_string())
        })?)),
        TAG_BOOL => Value::Bool(field.first().copied().unwrap_or(0) != 0),
        TAG_BYTES => Value::Bytes(field.to_vec()),
        TAG_TEXT => Value::Text(String::from_utf8(field.to_vec())?),
        TAG_TIMESTAMP => {
            let s = std::str::from_utf8(field)?;
            Value::Timestamp(
                common::value::cast::parse_timestamp(s)
                    .map_err(EngineError::Codec)?,
            )
        }
        other => return Err(EngineError::Codec(format!("unknown row tag: {}", other))),
    })
}
