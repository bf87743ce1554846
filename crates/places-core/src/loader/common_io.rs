// crates/places-core/src/loader/common_io.rs
use crate::error::{PlacesError, Result};

#[cfg(feature = "compact")]
use std::io::Read;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

pub fn is_gzip(bytes: &[u8]) -> bool {
    bytes.starts_with(&GZIP_MAGIC)
}

/// Turns a fetched payload into text, inflating it first when it carries the
/// gzip magic bytes. A leading UTF-8 BOM is dropped.
pub fn decode_payload(bytes: Vec<u8>) -> Result<String> {
    let bytes = if is_gzip(&bytes) { inflate(&bytes)? } else { bytes };

    let mut text = String::from_utf8(bytes)
        .map_err(|e| PlacesError::InvalidData(format!("dataset is not UTF-8: {e}")))?;
    if text.starts_with('\u{feff}') {
        text.drain(..'\u{feff}'.len_utf8());
    }
    Ok(text)
}

#[cfg(feature = "compact")]
fn inflate(bytes: &[u8]) -> Result<Vec<u8>> {
    use flate2::read::GzDecoder;

    let mut out = Vec::with_capacity(bytes.len() * 4);
    GzDecoder::new(bytes).read_to_end(&mut out)?;
    Ok(out)
}

#[cfg(not(feature = "compact"))]
fn inflate(_bytes: &[u8]) -> Result<Vec<u8>> {
    Err(PlacesError::InvalidData(
        "gzip payload received but the `compact` feature is disabled".into(),
    ))
}
