//! Reader for NumPy `.npz` bundles: a zip archive holding one `.npy` member
//! per named array.

use std::io::{Read, Seek};

use thiserror::Error;
use tracing::debug;

const MAGIC: &[u8] = b"\x93NUMPY";

#[derive(Error, Debug)]
pub enum NpyError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("not a valid npz archive: {0}")]
    Archive(#[from] zip::result::ZipError),
    #[error("array '{0}' is missing from the archive")]
    MissingKey(String),
    #[error("array '{name}': {source}")]
    Entry {
        name: String,
        #[source]
        source: Box<NpyError>,
    },
    #[error("not an npy array (bad magic string)")]
    BadMagic,
    #[error("unsupported npy format version {0}.{1}")]
    Version(u8, u8),
    #[error("malformed npy header: {0}")]
    Header(String),
    #[error("pickled object arrays are not supported; save strings with a fixed-width dtype")]
    Pickled,
    #[error("unsupported dtype '{0}'")]
    UnsupportedDtype(String),
    #[error("expected {expected} bytes of array data, found {found}")]
    Truncated { expected: usize, found: usize },
    #[error("array holds text that is not valid unicode")]
    InvalidText,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ByteOrder {
    Little,
    Big,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Float,
    Int,
    UInt,
    Bool,
    Unicode,
    Bytes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Dtype {
    order: ByteOrder,
    kind: Kind,
    /// Bytes per element, except for `Unicode` where it is the character count.
    size: usize,
}

impl Dtype {
    fn parse(descr: &str) -> Result<Self, NpyError> {
        let unsupported = || NpyError::UnsupportedDtype(descr.to_string());
        let mut chars = descr.chars();
        let order = match chars.next().ok_or_else(unsupported)? {
            '<' | '|' | '=' => ByteOrder::Little,
            '>' => ByteOrder::Big,
            _ => return Err(unsupported()),
        };
        let kind = match chars.next().ok_or_else(unsupported)? {
            'f' => Kind::Float,
            'i' => Kind::Int,
            'u' => Kind::UInt,
            'b' => Kind::Bool,
            'U' => Kind::Unicode,
            'S' | 'a' => Kind::Bytes,
            'O' => return Err(NpyError::Pickled),
            _ => return Err(unsupported()),
        };
        let size: usize = chars.as_str().parse().map_err(|_| unsupported())?;
        let valid = match kind {
            Kind::Float => matches!(size, 4 | 8),
            Kind::Int | Kind::UInt => matches!(size, 1 | 2 | 4 | 8),
            Kind::Bool => size == 1,
            Kind::Unicode => size > 0 && size.checked_mul(4).is_some(),
            Kind::Bytes => size > 0,
        };
        if !valid {
            return Err(unsupported());
        }
        Ok(Dtype { order, kind, size })
    }

    fn item_bytes(&self) -> usize {
        match self.kind {
            Kind::Unicode => self.size * 4,
            _ => self.size,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NpyData {
    Float(Vec<f64>),
    Int(Vec<i64>),
    Bool(Vec<bool>),
    Text(Vec<String>),
}

impl NpyData {
    pub fn len(&self) -> usize {
        match self {
            NpyData::Float(v) => v.len(),
            NpyData::Int(v) => v.len(),
            NpyData::Bool(v) => v.len(),
            NpyData::Text(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            NpyData::Float(_) => "float",
            NpyData::Int(_) => "integer",
            NpyData::Bool(_) => "bool",
            NpyData::Text(_) => "string",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NpyArray {
    pub shape: Vec<usize>,
    pub fortran_order: bool,
    pub data: NpyData,
}

impl NpyArray {
    /// Number of entries along the first axis.
    pub fn len(&self) -> usize {
        self.shape.first().copied().unwrap_or(1)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Row-major view of a 2-D numeric array as `f64` rows.
    pub fn numeric_rows(&self) -> Option<Vec<Vec<f64>>> {
        let values: Vec<f64> = match &self.data {
            NpyData::Float(v) => v.clone(),
            NpyData::Int(v) => v.iter().map(|&i| i as f64).collect(),
            _ => return None,
        };
        let [n_rows, n_cols] = self.shape[..] else {
            return None;
        };
        if n_cols == 0 || n_rows.checked_mul(n_cols) != Some(values.len()) {
            return None;
        }
        let rows = (0..n_rows)
            .map(|r| {
                (0..n_cols)
                    .map(|c| {
                        if self.fortran_order {
                            values[c * n_rows + r]
                        } else {
                            values[r * n_cols + c]
                        }
                    })
                    .collect()
            })
            .collect();
        Some(rows)
    }
}

pub struct NpzArchive<R: Read + Seek> {
    archive: zip::ZipArchive<R>,
}

impl<R: Read + Seek> NpzArchive<R> {
    pub fn new(reader: R) -> Result<Self, NpyError> {
        let archive = zip::ZipArchive::new(reader)?;
        Ok(Self { archive })
    }

    /// Array names, without the `.npy` suffix numpy adds to each member.
    pub fn names(&self) -> Vec<String> {
        self.archive
            .file_names()
            .map(|n| n.strip_suffix(".npy").unwrap_or(n).to_string())
            .collect()
    }

    pub fn by_name(&mut self, name: &str) -> Result<NpyArray, NpyError> {
        let member = format!("{name}.npy");
        let index = self
            .archive
            .index_for_name(&member)
            .or_else(|| self.archive.index_for_name(name))
            .ok_or_else(|| NpyError::MissingKey(name.to_string()))?;
        let mut bytes = Vec::new();
        self.archive.by_index(index)?.read_to_end(&mut bytes)?;
        let array = decode_npy(&bytes).map_err(|e| NpyError::Entry {
            name: name.to_string(),
            source: Box::new(e),
        })?;
        debug!(name, shape = ?array.shape, kind = array.data.kind_name(), "decoded npz member");
        Ok(array)
    }
}

struct Header {
    dtype: Dtype,
    fortran_order: bool,
    shape: Vec<usize>,
}

/// Decodes one `.npy` payload (format versions 1.0 to 3.0).
pub fn decode_npy(bytes: &[u8]) -> Result<NpyArray, NpyError> {
    if bytes.len() < MAGIC.len() + 2 || &bytes[..MAGIC.len()] != MAGIC {
        return Err(NpyError::BadMagic);
    }
    let (major, minor) = (bytes[6], bytes[7]);
    let (header_len, header_start) = match major {
        1 => {
            let raw = bytes.get(8..10).ok_or(NpyError::Truncated {
                expected: 10,
                found: bytes.len(),
            })?;
            (u16::from_le_bytes([raw[0], raw[1]]) as usize, 10)
        }
        2 | 3 => {
            let raw = bytes.get(8..12).ok_or(NpyError::Truncated {
                expected: 12,
                found: bytes.len(),
            })?;
            (
                u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]) as usize,
                12,
            )
        }
        _ => return Err(NpyError::Version(major, minor)),
    };
    let header_end = header_start + header_len;
    let header_bytes = bytes.get(header_start..header_end).ok_or(NpyError::Truncated {
        expected: header_end,
        found: bytes.len(),
    })?;
    let header_text = std::str::from_utf8(header_bytes)
        .map_err(|_| NpyError::Header("header is not valid text".into()))?;
    let header = parse_header(header_text)?;

    let count = header
        .shape
        .iter()
        .try_fold(1usize, |acc, &dim| acc.checked_mul(dim))
        .ok_or_else(|| NpyError::Header(format!("shape {:?} is too large", header.shape)))?;
    let body = &bytes[header_end..];
    let expected = count
        .checked_mul(header.dtype.item_bytes())
        .ok_or_else(|| NpyError::Header(format!("shape {:?} is too large", header.shape)))?;
    if body.len() < expected {
        return Err(NpyError::Truncated {
            expected,
            found: body.len(),
        });
    }
    let data = decode_items(&body[..expected], header.dtype, count)?;
    Ok(NpyArray {
        shape: header.shape,
        fortran_order: header.fortran_order,
        data,
    })
}

fn parse_header(text: &str) -> Result<Header, NpyError> {
    let text = text.trim();
    let inner = text
        .strip_prefix('{')
        .and_then(|t| t.strip_suffix('}'))
        .ok_or_else(|| NpyError::Header(format!("expected a dict literal, got {text}")))?;

    let descr = dict_value(inner, "descr")?;
    let descr = unquote(descr)
        .ok_or_else(|| NpyError::UnsupportedDtype(format!("structured dtype {descr}")))?;
    let dtype = Dtype::parse(descr)?;

    let fortran_order = match dict_value(inner, "fortran_order")? {
        "True" => true,
        "False" => false,
        other => {
            return Err(NpyError::Header(format!(
                "fortran_order must be True or False, got {other}"
            )));
        }
    };

    let shape_text = dict_value(inner, "shape")?;
    let shape = shape_text
        .strip_prefix('(')
        .and_then(|s| s.strip_suffix(')'))
        .ok_or_else(|| NpyError::Header(format!("shape must be a tuple, got {shape_text}")))?
        .split(',')
        .map(str::trim)
        .filter(|dim| !dim.is_empty())
        .map(|dim| {
            dim.trim_end_matches('L')
                .parse::<usize>()
                .map_err(|_| NpyError::Header(format!("bad dimension '{dim}'")))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Header {
        dtype,
        fortran_order,
        shape,
    })
}

/// Slice of the value text for `key` inside a flat python dict literal.
fn dict_value<'a>(inner: &'a str, key: &str) -> Result<&'a str, NpyError> {
    let missing = || NpyError::Header(format!("missing '{key}' entry"));
    let quoted = [format!("'{key}'"), format!("\"{key}\"")];
    let key_pos = quoted
        .iter()
        .find_map(|k| inner.find(k.as_str()).map(|p| p + k.len()))
        .ok_or_else(missing)?;
    let rest = inner[key_pos..].trim_start();
    let rest = rest.strip_prefix(':').ok_or_else(missing)?.trim_start();

    let end = match rest.chars().next() {
        Some('(') => rest.find(')').map(|p| p + 1),
        Some('[') => rest.find(']').map(|p| p + 1),
        Some(q @ ('\'' | '"')) => rest[1..].find(q).map(|p| p + 2),
        Some(_) => Some(rest.find(',').unwrap_or(rest.len())),
        None => None,
    }
    .ok_or_else(|| NpyError::Header(format!("unterminated '{key}' entry")))?;
    Ok(rest[..end].trim())
}

fn unquote(value: &str) -> Option<&str> {
    value
        .strip_prefix('\'')
        .and_then(|v| v.strip_suffix('\''))
        .or_else(|| value.strip_prefix('"').and_then(|v| v.strip_suffix('"')))
}

fn decode_items(body: &[u8], dtype: Dtype, count: usize) -> Result<NpyData, NpyError> {
    let item = dtype.item_bytes();
    let chunks = body.chunks_exact(item).take(count);
    let word = |chunk: &[u8]| -> [u8; 8] {
        let mut buf = [0u8; 8];
        match dtype.order {
            ByteOrder::Little => buf[..chunk.len()].copy_from_slice(chunk),
            ByteOrder::Big => {
                for (dst, src) in buf.iter_mut().zip(chunk.iter().rev()) {
                    *dst = *src;
                }
            }
        }
        buf
    };

    let data = match dtype.kind {
        Kind::Float => NpyData::Float(
            chunks
                .map(|c| {
                    let w = word(c);
                    if dtype.size == 4 {
                        f32::from_le_bytes([w[0], w[1], w[2], w[3]]) as f64
                    } else {
                        f64::from_le_bytes(w)
                    }
                })
                .collect(),
        ),
        Kind::Int => NpyData::Int(
            chunks
                .map(|c| {
                    let raw = i64::from_le_bytes(word(c));
                    // sign-extend narrower integers
                    let shift = 64 - 8 * dtype.size as u32;
                    (raw << shift) >> shift
                })
                .collect(),
        ),
        Kind::UInt => NpyData::Int(
            chunks
                .map(|c| u64::from_le_bytes(word(c)) as i64)
                .collect(),
        ),
        Kind::Bool => NpyData::Bool(chunks.map(|c| c[0] != 0).collect()),
        Kind::Unicode => NpyData::Text(
            chunks
                .map(|c| {
                    c.chunks_exact(4)
                        .map(|cp| {
                            let cp = [cp[0], cp[1], cp[2], cp[3]];
                            match dtype.order {
                                ByteOrder::Little => u32::from_le_bytes(cp),
                                ByteOrder::Big => u32::from_be_bytes(cp),
                            }
                        })
                        .take_while(|&cp| cp != 0)
                        .map(|cp| char::from_u32(cp).ok_or(NpyError::InvalidText))
                        .collect::<Result<String, _>>()
                })
                .collect::<Result<Vec<_>, _>>()?,
        ),
        Kind::Bytes => NpyData::Text(
            chunks
                .map(|c| {
                    let end = c.iter().position(|&b| b == 0).unwrap_or(c.len());
                    String::from_utf8(c[..end].to_vec()).map_err(|_| NpyError::InvalidText)
                })
                .collect::<Result<Vec<_>, _>>()?,
        ),
    };
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn npy(descr: &str, shape: &str, body: &[u8]) -> Vec<u8> {
        let mut header =
            format!("{{'descr': '{descr}', 'fortran_order': False, 'shape': {shape}, }}");
        while (10 + header.len() + 1) % 64 != 0 {
            header.push(' ');
        }
        header.push('\n');
        let mut out = MAGIC.to_vec();
        out.extend_from_slice(&[1, 0]);
        out.extend_from_slice(&(header.len() as u16).to_le_bytes());
        out.extend_from_slice(header.as_bytes());
        out.extend_from_slice(body);
        out
    }

    #[test]
    fn decodes_little_endian_floats() {
        let body: Vec<u8> = [1.5f64, -2.0, 3.25]
            .iter()
            .flat_map(|v| v.to_le_bytes())
            .collect();
        let array = decode_npy(&npy("<f8", "(3,)", &body)).unwrap();
        assert_eq!(array.shape, vec![3]);
        assert_eq!(array.data, NpyData::Float(vec![1.5, -2.0, 3.25]));
    }

    #[test]
    fn decodes_big_endian_f4_and_narrow_ints() {
        let body: Vec<u8> = [0.5f32, 4.0].iter().flat_map(|v| v.to_be_bytes()).collect();
        let array = decode_npy(&npy(">f4", "(2,)", &body)).unwrap();
        assert_eq!(array.data, NpyData::Float(vec![0.5, 4.0]));

        let body: Vec<u8> = [-3i32, 7].iter().flat_map(|v| v.to_le_bytes()).collect();
        let array = decode_npy(&npy("<i4", "(2,)", &body)).unwrap();
        assert_eq!(array.data, NpyData::Int(vec![-3, 7]));
    }

    #[test]
    fn decodes_fixed_width_unicode() {
        let mut body = Vec::new();
        for label in ["t_cells", "nk"] {
            let mut chars: Vec<u32> = label.chars().map(|c| c as u32).collect();
            chars.resize(7, 0);
            body.extend(chars.iter().flat_map(|c| c.to_le_bytes()));
        }
        let array = decode_npy(&npy("<U7", "(2,)", &body)).unwrap();
        assert_eq!(
            array.data,
            NpyData::Text(vec!["t_cells".to_string(), "nk".to_string()])
        );
    }

    #[test]
    fn decodes_byte_strings() {
        let body = b"#e74c3c\0#fff\0\0\0\0".to_vec();
        let array = decode_npy(&npy("|S8", "(2,)", &body)).unwrap();
        assert_eq!(
            array.data,
            NpyData::Text(vec!["#e74c3c".to_string(), "#fff".to_string()])
        );
    }

    #[test]
    fn two_dimensional_rows() {
        let body: Vec<u8> = [1.0f64, 0.0, 0.0, 0.0, 1.0, 0.0]
            .iter()
            .flat_map(|v| v.to_le_bytes())
            .collect();
        let array = decode_npy(&npy("<f8", "(2, 3)", &body)).unwrap();
        assert_eq!(array.len(), 2);
        assert_eq!(
            array.numeric_rows().unwrap(),
            vec![vec![1.0, 0.0, 0.0], vec![0.0, 1.0, 0.0]]
        );
    }

    #[test]
    fn rejects_object_arrays() {
        let err = decode_npy(&npy("|O", "(2,)", &[0; 16])).unwrap_err();
        assert!(matches!(err, NpyError::Pickled));
    }

    #[test]
    fn rejects_short_bodies_and_bad_magic() {
        let err = decode_npy(&npy("<f8", "(4,)", &[0; 16])).unwrap_err();
        assert!(matches!(
            err,
            NpyError::Truncated {
                expected: 32,
                found: 16
            }
        ));
        assert!(matches!(
            decode_npy(b"PK\x03\x04 not numpy").unwrap_err(),
            NpyError::BadMagic
        ));
    }

    #[test]
    fn oversized_shapes_are_header_errors() {
        let err = decode_npy(&npy("<f8", "(18446744073709551615, 2)", &[])).unwrap_err();
        assert!(matches!(err, NpyError::Header(_)));

        let err = decode_npy(&npy("<f8", "(2305843009213693952, 8)", &[])).unwrap_err();
        assert!(matches!(err, NpyError::Header(_)));

        let err = decode_npy(&npy("<U4", "(4611686018427387904,)", &[])).unwrap_err();
        assert!(matches!(err, NpyError::Header(_)));

        let err = decode_npy(&npy("<U18446744073709551615", "(1,)", &[])).unwrap_err();
        assert!(matches!(err, NpyError::UnsupportedDtype(_)));
    }

    #[test]
    fn rows_must_cover_the_data_exactly() {
        let array = NpyArray {
            shape: vec![1 << 61, 8],
            fortran_order: false,
            data: NpyData::Float(Vec::new()),
        };
        assert_eq!(array.numeric_rows(), None);

        let array = NpyArray {
            shape: vec![1 << 40, 0],
            fortran_order: false,
            data: NpyData::Float(Vec::new()),
        };
        assert_eq!(array.numeric_rows(), None);

        let array = NpyArray {
            shape: vec![2, 3],
            fortran_order: false,
            data: NpyData::Int(vec![1, 2, 3]),
        };
        assert_eq!(array.numeric_rows(), None);
    }

    #[test]
    fn scalar_and_empty_shapes() {
        let array = decode_npy(&npy("<f8", "()", &2.0f64.to_le_bytes())).unwrap();
        assert!(array.shape.is_empty());
        assert_eq!(array.data, NpyData::Float(vec![2.0]));

        let array = decode_npy(&npy("<f8", "(0,)", &[])).unwrap();
        assert!(array.is_empty());
    }
}
