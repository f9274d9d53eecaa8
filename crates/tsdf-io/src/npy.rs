//! Reader for the subset of the NumPy `.npy` format used by depth frames:
//! format versions 1.0 to 3.0, 2-D, C order, little-endian `f4`/`f8` or
//! unsigned integer (`u1`, `u2`) dtypes.
//!
//! Float arrays hold metres. Integer arrays hold raw sensor units and are
//! divided by the caller's depth scale, as for 16-bit PNG frames.

use std::path::Path;

use anyhow::{bail, ensure, Context, Result};
use tsdf_core::{DepthMap, Scalar};

const MAGIC: &[u8] = b"\x93NUMPY";

/// Element types accepted for depth arrays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dtype {
    F4,
    F8,
    U1,
    U2,
}

impl Dtype {
    fn parse(descr: &str) -> Result<Self> {
        Ok(match descr {
            "<f4" => Self::F4,
            "<f8" => Self::F8,
            "|u1" | "<u1" => Self::U1,
            "<u2" => Self::U2,
            other => bail!("unsupported dtype {other:?} (expected little-endian f4, f8, u1 or u2)"),
        })
    }

    fn size(self) -> usize {
        match self {
            Self::F4 => 4,
            Self::F8 => 8,
            Self::U1 => 1,
            Self::U2 => 2,
        }
    }
}

#[derive(Debug)]
struct Header {
    dtype: Dtype,
    shape: (usize, usize),
}

/// Load a 2-D `.npy` array as a depth map (`shape = (height, width)`).
pub fn read_depth(path: &Path, depth_scale: Scalar) -> Result<DepthMap> {
    let bytes =
        std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    parse_depth(&bytes, depth_scale).with_context(|| format!("invalid npy file {}", path.display()))
}

/// Decode an in-memory `.npy` buffer. Integer samples are divided by
/// `depth_scale`.
pub fn parse_depth(bytes: &[u8], depth_scale: Scalar) -> Result<DepthMap> {
    ensure!(
        depth_scale.is_finite() && depth_scale > 0.0,
        "depth scale must be positive, got {depth_scale}"
    );
    ensure!(bytes.len() >= 10 && bytes.starts_with(MAGIC), "missing NUMPY magic");
    let major = bytes[6];
    let (header_len, offset) = match major {
        1 => (u16::from_le_bytes([bytes[8], bytes[9]]) as usize, 10),
        2 | 3 => {
            ensure!(bytes.len() >= 12, "truncated header");
            let len = u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]);
            (len as usize, 12)
        }
        v => bail!("unsupported npy format version {v}"),
    };
    let data_start = offset + header_len;
    ensure!(bytes.len() >= data_start, "truncated header");
    let header_text =
        std::str::from_utf8(&bytes[offset..data_start]).context("header is not valid text")?;
    let header = parse_header(header_text)?;

    let (height, width) = header.shape;
    let count = height
        .checked_mul(width)
        .context("array shape overflows")?;
    let payload = &bytes[data_start..];
    let expected = count
        .checked_mul(header.dtype.size())
        .context("array size overflows")?;
    ensure!(
        payload.len() >= expected,
        "payload holds {} bytes, shape {:?} needs {expected}",
        payload.len(),
        header.shape
    );
    let payload = &payload[..expected];

    let data: Vec<Scalar> = match header.dtype {
        Dtype::F4 => payload
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect(),
        Dtype::F8 => payload
            .chunks_exact(8)
            .map(|c| {
                let mut b = [0u8; 8];
                b.copy_from_slice(c);
                f64::from_le_bytes(b) as Scalar
            })
            .collect(),
        Dtype::U1 => payload.iter().map(|v| *v as Scalar / depth_scale).collect(),
        Dtype::U2 => payload
            .chunks_exact(2)
            .map(|c| u16::from_le_bytes([c[0], c[1]]) as Scalar / depth_scale)
            .collect(),
    };

    Ok(DepthMap::from_vec(width, height, data)?)
}

/// Parse the python-literal header dict, e.g.
/// `{'descr': '<f4', 'fortran_order': False, 'shape': (480, 640), }`.
fn parse_header(text: &str) -> Result<Header> {
    let descr = dict_value(text, "descr")?;
    let descr = descr.trim().trim_matches(|c| c == '\'' || c == '"');
    let dtype = Dtype::parse(descr)?;

    let fortran = dict_value(text, "fortran_order")?;
    ensure!(
        fortran.trim() == "False",
        "Fortran-ordered arrays are not supported"
    );

    let shape = dict_value(text, "shape")?;
    let dims: Vec<usize> = shape
        .trim()
        .trim_start_matches('(')
        .trim_end_matches(')')
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<usize>()
                .with_context(|| format!("invalid shape entry {s:?}"))
        })
        .collect::<Result<_>>()?;
    let [height, width] = dims[..] else {
        bail!("expected a 2-D array, got shape {dims:?}");
    };

    Ok(Header {
        dtype,
        shape: (height, width),
    })
}

/// Raw text of the value stored under `key`, up to the next top-level comma.
fn dict_value<'a>(text: &'a str, key: &str) -> Result<&'a str> {
    let needle_sq = format!("'{key}'");
    let needle_dq = format!("\"{key}\"");
    let start = text
        .find(&needle_sq)
        .map(|i| i + needle_sq.len())
        .or_else(|| text.find(&needle_dq).map(|i| i + needle_dq.len()))
        .with_context(|| format!("header is missing {key:?}"))?;
    let rest = text[start..]
        .trim_start()
        .strip_prefix(':')
        .with_context(|| format!("malformed entry for {key:?}"))?;

    let mut depth = 0usize;
    for (i, ch) in rest.char_indices() {
        match ch {
            '(' | '[' => depth += 1,
            ')' | ']' => depth = depth.saturating_sub(1),
            ',' | '}' if depth == 0 => return Ok(&rest[..i]),
            _ => {}
        }
    }
    bail!("unterminated entry for {key:?}")
}

/// Write `depth` as a `<f4` version 1.0 array of shape `(height, width)`.
pub fn write_depth(path: &Path, depth: &DepthMap) -> Result<()> {
    std::fs::write(path, encode_depth(depth))
        .with_context(|| format!("failed to write {}", path.display()))
}

/// Encode `depth` as an in-memory `.npy` buffer.
pub fn encode_depth(depth: &DepthMap) -> Vec<u8> {
    let payload: Vec<u8> = depth.as_slice().iter().flat_map(|v| v.to_le_bytes()).collect();
    encode(
        &format!(
            "{{'descr': '<f4', 'fortran_order': False, 'shape': ({}, {}), }}",
            depth.height(),
            depth.width()
        ),
        &payload,
    )
}

/// Version 1.0 file; the header is padded so the payload starts on a
/// 64-byte boundary.
fn encode(header: &str, payload: &[u8]) -> Vec<u8> {
    let mut header = header.to_string();
    let unpadded = MAGIC.len() + 2 + 2 + header.len() + 1;
    header.push_str(&" ".repeat((64 - unpadded % 64) % 64));
    header.push('\n');

    let mut out = Vec::with_capacity(MAGIC.len() + 4 + header.len() + payload.len());
    out.extend_from_slice(MAGIC);
    out.extend_from_slice(&[1, 0]);
    out.extend_from_slice(&(header.len() as u16).to_le_bytes());
    out.extend_from_slice(header.as_bytes());
    out.extend_from_slice(payload);
    out
}
