//! Typed telemetry arrays carried inside `Data` bodies
//!
//! An array travels under the key `6{name}{tag}` as base64 of its raw
//! little-endian element bytes:
//!
//! | Tag   | Element |
//! |-------|---------|
//! | `u8`  | `u8`    |
//! | `u16` | `u16`   |
//! | `u32` | `u32`   |
//! | `s16` | `i16`   |
//! | `s32` | `i32`   |
//! | `flt` | `f32`   |
//! | `chr` | text    |
//!
//! When decoded every element becomes its own body entry `name[i]`; a `chr`
//! array becomes a single text entry `name`.

use crate::commands::body::{Body, Value};
use crate::config::telemetry::ARRAY_PREFIX;
use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

/// Errors decoding a single array field
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TelemetryError {
    /// Key carries no known type tag
    #[error("unknown array type in key {0:?}")]
    UnknownType(String),

    /// Value is not valid base64 text
    #[error("invalid base64 in {0:?}")]
    Base64(String),

    /// Byte length is not a multiple of the element size
    #[error("{key:?} holds {len} bytes, not a multiple of {size}")]
    Length { key: String, len: usize, size: usize },
}

/// Element type of a telemetry array
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrayKind {
    U8,
    U16,
    U32,
    S16,
    S32,
    F32,
    Chr,
}

impl ArrayKind {
    const ALL: [ArrayKind; 7] = [
        ArrayKind::U8,
        ArrayKind::U16,
        ArrayKind::U32,
        ArrayKind::S16,
        ArrayKind::S32,
        ArrayKind::F32,
        ArrayKind::Chr,
    ];

    /// Key suffix naming this type
    pub fn tag(self) -> &'static str {
        match self {
            ArrayKind::U8 => "u8",
            ArrayKind::U16 => "u16",
            ArrayKind::U32 => "u32",
            ArrayKind::S16 => "s16",
            ArrayKind::S32 => "s32",
            ArrayKind::F32 => "flt",
            ArrayKind::Chr => "chr",
        }
    }

    /// Size of one element in bytes
    pub fn element_size(self) -> usize {
        match self {
            ArrayKind::U8 | ArrayKind::Chr => 1,
            ArrayKind::U16 | ArrayKind::S16 => 2,
            ArrayKind::U32 | ArrayKind::S32 | ArrayKind::F32 => 4,
        }
    }

    /// Split a body key into array name and type.
    ///
    /// Returns `None` for keys that are not arrays at all.
    pub fn parse_key(key: &str) -> Option<Result<(&str, ArrayKind), TelemetryError>> {
        let rest = key.strip_prefix(ARRAY_PREFIX)?;
        let found = Self::ALL.iter().find_map(|&kind| {
            rest.strip_suffix(kind.tag()).map(|name| (name, kind))
        });
        Some(found.ok_or_else(|| TelemetryError::UnknownType(key.into())))
    }
}

/// Array element storage
#[derive(Debug, Clone, PartialEq)]
pub enum ArrayValues {
    U8(Vec<u8>),
    U16(Vec<u16>),
    U32(Vec<u32>),
    S16(Vec<i16>),
    S32(Vec<i32>),
    F32(Vec<f32>),
    Chr(String),
}

impl ArrayValues {
    pub fn kind(&self) -> ArrayKind {
        match self {
            ArrayValues::U8(_) => ArrayKind::U8,
            ArrayValues::U16(_) => ArrayKind::U16,
            ArrayValues::U32(_) => ArrayKind::U32,
            ArrayValues::S16(_) => ArrayKind::S16,
            ArrayValues::S32(_) => ArrayKind::S32,
            ArrayValues::F32(_) => ArrayKind::F32,
            ArrayValues::Chr(_) => ArrayKind::Chr,
        }
    }

    fn from_bytes(kind: ArrayKind, bytes: &[u8]) -> Self {
        match kind {
            ArrayKind::U8 => ArrayValues::U8(bytes.to_vec()),
            ArrayKind::U16 => ArrayValues::U16(
                bytes.chunks_exact(2).map(|c| u16::from_le_bytes([c[0], c[1]])).collect(),
            ),
            ArrayKind::S16 => ArrayValues::S16(
                bytes.chunks_exact(2).map(|c| i16::from_le_bytes([c[0], c[1]])).collect(),
            ),
            ArrayKind::U32 => ArrayValues::U32(
                bytes
                    .chunks_exact(4)
                    .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
                    .collect(),
            ),
            ArrayKind::S32 => ArrayValues::S32(
                bytes
                    .chunks_exact(4)
                    .map(|c| i32::from_le_bytes([c[0], c[1], c[2], c[3]]))
                    .collect(),
            ),
            ArrayKind::F32 => ArrayValues::F32(
                bytes
                    .chunks_exact(4)
                    .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
                    .collect(),
            ),
            ArrayKind::Chr => {
                let text = bytes.split(|&b| b == 0).next().unwrap_or_default();
                ArrayValues::Chr(String::from_utf8_lossy(text).into_owned())
            }
        }
    }

    fn to_bytes(&self) -> Vec<u8> {
        match self {
            ArrayValues::U8(values) => values.clone(),
            ArrayValues::U16(values) => values.iter().flat_map(|v| v.to_le_bytes()).collect(),
            ArrayValues::U32(values) => values.iter().flat_map(|v| v.to_le_bytes()).collect(),
            ArrayValues::S16(values) => values.iter().flat_map(|v| v.to_le_bytes()).collect(),
            ArrayValues::S32(values) => values.iter().flat_map(|v| v.to_le_bytes()).collect(),
            ArrayValues::F32(values) => values.iter().flat_map(|v| v.to_le_bytes()).collect(),
            ArrayValues::Chr(text) => text.as_bytes().to_vec(),
        }
    }

    /// One body value per element
    fn scalars(&self) -> Vec<Value> {
        match self {
            ArrayValues::U8(values) => values.iter().map(|&v| Value::Int(v.into())).collect(),
            ArrayValues::U16(values) => values.iter().map(|&v| Value::Int(v.into())).collect(),
            ArrayValues::U32(values) => values.iter().map(|&v| Value::Int(v.into())).collect(),
            ArrayValues::S16(values) => values.iter().map(|&v| Value::Int(v.into())).collect(),
            ArrayValues::S32(values) => values.iter().map(|&v| Value::Int(v.into())).collect(),
            ArrayValues::F32(values) => values.iter().map(|&v| Value::Float(v.into())).collect(),
            ArrayValues::Chr(text) => alloc::vec![Value::Text(text.clone())],
        }
    }
}

/// A named typed array
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryArray {
    pub name: String,
    pub values: ArrayValues,
}

impl TelemetryArray {
    pub fn new(name: impl Into<String>, values: ArrayValues) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// Body key this array travels under
    pub fn key(&self) -> String {
        format!("{}{}{}", ARRAY_PREFIX, self.name, self.values.kind().tag())
    }

    /// Base64 text of the raw element bytes
    pub fn encode(&self) -> String {
        STANDARD.encode(self.values.to_bytes())
    }

    /// Decode one body field given its key and text value.
    pub fn decode(key: &str, text: &str) -> Option<Result<Self, TelemetryError>> {
        let (name, kind) = match ArrayKind::parse_key(key)? {
            Ok(parsed) => parsed,
            Err(e) => return Some(Err(e)),
        };

        let result = STANDARD
            .decode(text)
            .map_err(|_| TelemetryError::Base64(key.into()))
            .and_then(|bytes| {
                let size = kind.element_size();
                if bytes.len() % size != 0 {
                    return Err(TelemetryError::Length {
                        key: key.into(),
                        len: bytes.len(),
                        size,
                    });
                }
                Ok(TelemetryArray::new(name, ArrayValues::from_bytes(kind, &bytes)))
            });
        Some(result)
    }

    /// Body entries this array expands to
    pub fn expand(&self) -> Vec<(String, Value)> {
        let scalars = self.values.scalars();
        if let ArrayValues::Chr(_) = self.values {
            return scalars.into_iter().map(|v| (self.name.clone(), v)).collect();
        }
        scalars
            .into_iter()
            .enumerate()
            .map(|(i, v)| (format!("{}[{}]", self.name, i), v))
            .collect()
    }
}

/// Expand every array field of a `Data` body.
///
/// Returns the body with each array key replaced, in place, by its element
/// entries, plus the decoded arrays. A field that fails to decode is dropped
/// on its own; the rest of the body is still delivered.
pub fn decode_arrays(body: &Body) -> (Body, Vec<TelemetryArray>) {
    let mut scalars = Body::new();
    let mut arrays = Vec::new();

    for (key, value) in body.iter() {
        let decoded = match value {
            Value::Text(text) => TelemetryArray::decode(key, text),
            _ => ArrayKind::parse_key(key)
                .map(|parsed| parsed.and_then(|_| Err(TelemetryError::Base64(key.into())))),
        };

        match decoded {
            None => {
                scalars.insert(key, value.clone());
            }
            Some(Ok(array)) => {
                for (name, element) in array.expand() {
                    scalars.insert(name, element);
                }
                arrays.push(array);
            }
            Some(Err(e)) => log::warn!("dropping telemetry field: {}", e),
        }
    }

    (scalars, arrays)
}

/// Add arrays to a body in their wire form.
pub fn encode_arrays(body: &mut Body, arrays: &[TelemetryArray]) {
    for array in arrays {
        body.insert(array.key(), array.encode());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn test_u16_array_expands_in_order() {
        let mut body = Body::new();
        body.insert("tiltout", 1500);
        encode_arrays(
            &mut body,
            &[TelemetryArray::new("chout", ArrayValues::U16(vec![1000, 1500, 2000]))],
        );
        body.insert("panout", 1400);

        let (scalars, arrays) = decode_arrays(&body);

        let keys: Vec<&str> = scalars.keys().collect();
        assert_eq!(keys, ["tiltout", "chout[0]", "chout[1]", "chout[2]", "panout"]);
        assert_eq!(scalars.get("chout[0]"), Some(&Value::Int(1000)));
        assert_eq!(scalars.get("chout[1]"), Some(&Value::Int(1500)));
        assert_eq!(scalars.get("chout[2]"), Some(&Value::Int(2000)));
        assert_eq!(arrays.len(), 1);
        assert_eq!(arrays[0].values, ArrayValues::U16(vec![1000, 1500, 2000]));
    }

    #[test]
    fn test_corrupt_base64_drops_only_that_field() {
        let mut body = Body::new();
        body.insert("tiltout", 1500);
        body.insert("6choutu16", "not*base64!");
        body.insert("rollout", 1600);

        let (scalars, arrays) = decode_arrays(&body);

        assert!(arrays.is_empty());
        assert_eq!(scalars.len(), 2);
        assert_eq!(scalars.get("tiltout"), Some(&Value::Int(1500)));
        assert_eq!(scalars.get("rollout"), Some(&Value::Int(1600)));
    }

    #[test]
    fn test_length_not_multiple_of_element() {
        // Three bytes cannot hold u16 elements
        let body: Body = [("6choutu16", STANDARD.encode([1u8, 2, 3]))].into_iter().collect();
        let (scalars, arrays) = decode_arrays(&body);
        assert!(scalars.is_empty());
        assert!(arrays.is_empty());

        assert_eq!(
            TelemetryArray::decode("6choutu16", &STANDARD.encode([1u8, 2, 3])),
            Some(Err(TelemetryError::Length {
                key: "6choutu16".into(),
                len: 3,
                size: 2
            }))
        );
    }

    #[test]
    fn test_all_types() {
        let arrays = [
            TelemetryArray::new("a", ArrayValues::U8(vec![0, 255])),
            TelemetryArray::new("b", ArrayValues::U32(vec![70000])),
            TelemetryArray::new("c", ArrayValues::S16(vec![-2, 3])),
            TelemetryArray::new("d", ArrayValues::S32(vec![-70000])),
            TelemetryArray::new("e", ArrayValues::F32(vec![0.5, -1.25])),
        ];
        let mut body = Body::new();
        encode_arrays(&mut body, &arrays);

        let (scalars, decoded) = decode_arrays(&body);
        assert_eq!(decoded.as_slice(), &arrays);
        assert_eq!(scalars.get("a[1]"), Some(&Value::Int(255)));
        assert_eq!(scalars.get("b[0]"), Some(&Value::Int(70000)));
        assert_eq!(scalars.get("c[0]"), Some(&Value::Int(-2)));
        assert_eq!(scalars.get("d[0]"), Some(&Value::Int(-70000)));
        assert_eq!(scalars.get("e[1]"), Some(&Value::Float(-1.25)));
    }

    #[test]
    fn test_chr_array_is_single_text() {
        let body: Body = [("6btaddrchr", STANDARD.encode(b"00:11:22\0\0junk"))]
            .into_iter()
            .collect();
        let (scalars, _) = decode_arrays(&body);
        assert_eq!(scalars.get_str("btaddr"), Some("00:11:22"));
        assert_eq!(scalars.len(), 1);
    }

    #[test]
    fn test_wire_key_and_encoding() {
        let array = TelemetryArray::new("chout", ArrayValues::U16(vec![1, 2]));
        assert_eq!(array.key(), "6choutu16");
        assert_eq!(array.encode(), "AQACAA==");
    }

    #[test]
    fn test_unknown_type_dropped() {
        let body: Body = [("6chouti64", "AQACAA=="), ("ok", "yes")].into_iter().collect();
        let (scalars, arrays) = decode_arrays(&body);
        assert!(arrays.is_empty());
        assert_eq!(scalars.keys().collect::<Vec<_>>(), ["ok"]);
    }

    #[test]
    fn test_plain_keys_untouched() {
        assert!(ArrayKind::parse_key("tiltout").is_none());
        assert!(TelemetryArray::decode("tiltout", "AQACAA==").is_none());
    }
}
