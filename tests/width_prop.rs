use quickcheck::quickcheck;
use topocodec::{bit_width, packed_word_count, segment_width, CodecError};

quickcheck! {
    fn width_brackets_count(n: u32) -> bool {
        if n < 2 {
            return true;
        }
        let w = bit_width(n);
        (1u64 << (w - 1)) <= n as u64 && (n as u64) < (1u64 << w)
    }

    fn codec_width_follows_bit_width(n: u32) -> bool {
        match segment_width(u64::from(n)) {
            Ok(1) => n == 1,
            Ok(w) => n >= 2 && w == bit_width(n),
            Err(CodecError::UndefinedWidth { .. }) => n == 0,
            Err(_) => false,
        }
    }

    fn wide_counts_are_unsupported(n: u64) -> bool {
        let n = n | (1 << 32);
        matches!(
            segment_width(n),
            Err(CodecError::UnsupportedWidth { width, .. }) if width == 64 - n.leading_zeros()
        )
    }

    fn word_count_covers_bits(vertices: u16, width: u8) -> bool {
        let width = (width % 32) as u32 + 1;
        let words = packed_word_count(vertices as usize, width) as u64;
        let bits = vertices as u64 * width as u64;
        words * 32 >= bits && (words == 0 || (words - 1) * 32 < bits)
    }
}
