//! Bit widths for packed segment ids.

use crate::error::{CodecError, Result};

/// Size in bits of one packed container.
pub const WORD_BITS: u32 = 32;

/// Returned by [`bit_width`] for zero segments.
pub const UNDEFINED_WIDTH: u32 = u32::MAX;

/// Number of bits needed to tell `n` values apart.
///
/// Zero yields [`UNDEFINED_WIDTH`], one yields `0` and anything larger
/// yields `floor(log2(n)) + 1`.
pub fn bit_width(n: u32) -> u32 {
    match n {
        0 => UNDEFINED_WIDTH,
        1 => 0,
        _ => WORD_BITS - n.leading_zeros(),
    }
}

/// Width of one packed field for `segments` distinct ids.
///
/// A single segment still takes one bit per vertex; otherwise this is
/// [`bit_width`] widened to 64-bit counts. Counts of `2^32` and above need
/// 33 bits or more and are rejected.
pub fn segment_width(segments: u64) -> Result<u32> {
    let width = match segments {
        0 => return Err(CodecError::UndefinedWidth { segments }),
        1 => 1,
        _ => u64::BITS - segments.leading_zeros(),
    };
    if width > WORD_BITS {
        return Err(CodecError::UnsupportedWidth { width, segments });
    }
    Ok(width)
}

/// Number of 32-bit words holding `vertices` fields of `width` bits.
pub fn packed_word_count(vertices: usize, width: u32) -> usize {
    let bits = vertices as u64 * width as u64;
    bits.div_ceil(WORD_BITS as u64) as usize
}
