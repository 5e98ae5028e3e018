//! zlib-format deflate over caller-sized buffers.

use flate2::{Compress, Compression, Decompress, FlushCompress, FlushDecompress, Status};
use tracing::debug;

use crate::error::{CodecError, Result};

const BACKEND: &str = "deflate";

/// Worst-case compressed size for `source_len` input bytes.
///
/// Same bound zlib's `compressBound` gives, so a destination this large
/// always fits a single-shot compression.
pub fn dest_len_bound(source_len: usize) -> usize {
    source_len + (source_len >> 12) + (source_len >> 14) + (source_len >> 25) + 13
}

fn failure(message: impl Into<String>) -> CodecError {
    CodecError::Backend {
        backend: BACKEND,
        message: message.into(),
    }
}

/// Compress `source` into `dest`, returning the bytes produced.
pub fn compress_into(dest: &mut [u8], source: &[u8], level: u32) -> Result<usize> {
    if level > 9 {
        return Err(failure(format!("compression level {level} out of range")));
    }
    let mut encoder = Compress::new(Compression::new(level), true);
    let status = encoder
        .compress(source, dest, FlushCompress::Finish)
        .map_err(|e| failure(e.to_string()))?;
    if status != Status::StreamEnd {
        return Err(failure(format!(
            "destination of {} bytes too small for {} input bytes",
            dest.len(),
            source.len()
        )));
    }
    let produced = encoder.total_out() as usize;
    debug!(input = source.len(), output = produced, "deflated buffer");
    Ok(produced)
}

/// Decompress `source` into `dest`, returning the bytes produced.
pub fn decompress_into(dest: &mut [u8], source: &[u8]) -> Result<usize> {
    let mut decoder = Decompress::new(true);
    let status = decoder
        .decompress(source, dest, FlushDecompress::Finish)
        .map_err(|e| failure(e.to_string()))?;
    if status != Status::StreamEnd {
        return Err(failure(format!(
            "stream did not end within {} output bytes",
            dest.len()
        )));
    }
    let produced = decoder.total_out() as usize;
    debug!(input = source.len(), output = produced, "inflated buffer");
    Ok(produced)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_through_bound() {
        let source: Vec<u8> = (0..4096u32).map(|i| (i % 17) as u8).collect();
        let mut packed = vec![0u8; dest_len_bound(source.len())];
        let n = compress_into(&mut packed, &source, 6).unwrap();
        assert!(n < source.len());

        let mut out = vec![0u8; source.len()];
        let m = decompress_into(&mut out, &packed[..n]).unwrap();
        assert_eq!(m, source.len());
        assert_eq!(out, source);
    }

    #[test]
    fn incompressible_input_fits_bound() {
        let source: Vec<u8> = (0..1000u32)
            .map(|i| (i.wrapping_mul(2654435761) >> 24) as u8)
            .collect();
        let mut packed = vec![0u8; dest_len_bound(source.len())];
        assert!(compress_into(&mut packed, &source, 9).is_ok());
    }

    #[test]
    fn short_destination_fails() {
        let source = vec![7u8; 512];
        let mut packed = vec![0u8; dest_len_bound(source.len())];
        let n = compress_into(&mut packed, &source, 6).unwrap();
        let mut out = vec![0u8; 100];
        assert!(matches!(
            decompress_into(&mut out, &packed[..n]),
            Err(CodecError::Backend { backend: "deflate", .. })
        ));
    }

    #[test]
    fn garbage_fails() {
        let mut out = vec![0u8; 64];
        assert!(decompress_into(&mut out, b"definitely not zlib").is_err());
    }
}
