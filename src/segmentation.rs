//! Compact segmentation codec.
//!
//! A segmentation assigns every vertex a segment id in `[0, segments)`. Ids
//! are packed LSB-first into 32-bit containers with no padding between
//! fields: vertex `i` occupies bits `i * w .. (i + 1) * w` of the container
//! sequence, where `w` is [`segment_width`]. A field that does not fit the
//! tail of a container straddles into the next one, low bits first. Only
//! the final container carries zero padding.
//!
//! The packed words are not self-describing. Decoding needs the vertex and
//! segment counts, which travel in a [`SegmentationHeader`].

use std::io::{Read, Write};

use tracing::debug;

use crate::bit_width::{packed_word_count, segment_width, WORD_BITS};
use crate::error::{CodecError, Result, Stage};
use crate::stream::{WordCursor, WordReader, WordSink, WordSource, WordWriter};

/// Upper bound on entries reserved up front from a declared count.
pub const PREALLOC_LIMIT: usize = 1 << 20;

/// Encoded size of a [`SegmentationHeader`] in bytes.
pub const HEADER_SIZE: usize = 8;

/// Counts required to decode a packed segmentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentationHeader {
    pub vertices: u32,
    pub segments: u32,
}

impl SegmentationHeader {
    pub fn new(vertices: u32, segments: u32) -> Self {
        Self { vertices, segments }
    }

    /// Field width in bits for this header's segment count.
    pub fn width(&self) -> Result<u32> {
        segment_width(u64::from(self.segments))
    }

    /// Number of containers the packed ids occupy.
    pub fn word_count(&self) -> Result<usize> {
        Ok(packed_word_count(self.vertices as usize, self.width()?))
    }
}

/// Write `header` as two little-endian `u32`s.
pub fn write_segmentation_header<W: Write>(
    writer: &mut WordWriter<W>,
    header: &SegmentationHeader,
) -> Result<usize> {
    writer.write_u32(header.vertices)?;
    writer.write_u32(header.segments)?;
    Ok(HEADER_SIZE)
}

pub fn read_segmentation_header<R: Read>(
    reader: &mut WordReader<R>,
) -> Result<SegmentationHeader> {
    let vertices = reader.read_u32(Stage::SegmentationHeader)?;
    let segments = reader.read_u32(Stage::SegmentationHeader)?;
    Ok(SegmentationHeader { vertices, segments })
}

/// Accumulator for fields crossing container boundaries.
///
/// Holds at most 63 live bits: fewer than 32 carried over plus one field of
/// up to 32.
#[derive(Debug, Default)]
struct BitBuffer {
    bits: u64,
    len: u32,
}

impl BitBuffer {
    fn append(&mut self, value: u32, width: u32) {
        self.bits |= (value as u64) << self.len;
        self.len += width;
    }

    fn take_word(&mut self) -> Option<u32> {
        if self.len < WORD_BITS {
            return None;
        }
        let word = self.bits as u32;
        self.bits >>= WORD_BITS;
        self.len -= WORD_BITS;
        Some(word)
    }

    fn extract(&mut self, width: u32) -> u32 {
        let mask = (1u64 << width) - 1;
        let value = (self.bits & mask) as u32;
        self.bits >>= width;
        self.len -= width;
        value
    }
}

/// Pack `segmentation` into `sink`, returning the number of bytes written.
///
/// Every id is checked against `segments` before the first word is emitted.
pub fn encode_segmentation<S: WordSink>(
    sink: &mut S,
    segmentation: &[u32],
    segments: u64,
) -> Result<usize> {
    let width = segment_width(segments)?;
    if let Some(index) = segmentation
        .iter()
        .position(|&id| u64::from(id) >= segments)
    {
        return Err(CodecError::SegmentOutOfRange {
            index,
            id: segmentation[index],
            segments,
        });
    }

    let mut buffer = BitBuffer::default();
    let mut words = 0usize;
    for &id in segmentation {
        buffer.append(id, width);
        if let Some(word) = buffer.take_word() {
            sink.put_word(word)?;
            words += 1;
        }
    }
    if buffer.len > 0 {
        sink.put_word(buffer.bits as u32)?;
        words += 1;
    }

    debug!(
        vertices = segmentation.len(),
        segments, width, words, "encoded segmentation"
    );
    Ok(words * 4)
}

/// Unpack `vertices` ids from `source`, returning them with the bytes read.
///
/// Exactly [`packed_word_count`] words are consumed; padding in the last
/// word is ignored.
pub fn decode_segmentation<S: WordSource>(
    source: &mut S,
    vertices: usize,
    segments: u64,
) -> Result<(Vec<u32>, usize)> {
    let width = segment_width(segments)?;
    let mut out = Vec::with_capacity(vertices.min(PREALLOC_LIMIT));
    let mut buffer = BitBuffer::default();
    let mut words = 0usize;

    while out.len() < vertices {
        if buffer.len < width {
            let word = source.next_word(Stage::SegmentationWords)?;
            buffer.bits |= (word as u64) << buffer.len;
            buffer.len += WORD_BITS;
            words += 1;
        }
        out.push(buffer.extract(width));
    }

    debug!(vertices, segments, width, words, "decoded segmentation");
    Ok((out, words * 4))
}

/// Pack `segmentation` into a fresh word vector.
pub fn pack_segmentation(segmentation: &[u32], segments: u64) -> Result<Vec<u32>> {
    let width = segment_width(segments)?;
    let mut words: Vec<u32> = Vec::with_capacity(packed_word_count(segmentation.len(), width));
    encode_segmentation(&mut words, segmentation, segments)?;
    Ok(words)
}

/// Unpack `vertices` ids from an in-memory word slice.
pub fn unpack_segmentation(words: &[u32], vertices: usize, segments: u64) -> Result<Vec<u32>> {
    let mut cursor = WordCursor::new(words);
    decode_segmentation(&mut cursor, vertices, segments).map(|(ids, _)| ids)
}

/// Write a [`SegmentationHeader`] followed by the packed ids.
///
/// Any count `segment_width` accepts fits the header's `u32` field.
pub fn write_segmentation<W: Write>(
    writer: &mut WordWriter<W>,
    segmentation: &[u32],
    segments: u64,
) -> Result<usize> {
    let vertices =
        u32::try_from(segmentation.len()).map_err(|_| CodecError::CountOverflow {
            stage: Stage::SegmentationHeader,
            count: segmentation.len(),
        })?;
    // Validate the width before anything reaches the writer.
    segment_width(segments)?;
    let header = SegmentationHeader {
        vertices,
        segments: segments as u32,
    };
    let mut written = write_segmentation_header(writer, &header)?;
    written += encode_segmentation(writer, segmentation, segments)?;
    Ok(written)
}

/// Read a header and the ids it describes.
pub fn read_segmentation<R: Read>(
    reader: &mut WordReader<R>,
) -> Result<(SegmentationHeader, Vec<u32>, usize)> {
    read_segmentation_with_limit(reader, usize::MAX)
}

/// Like [`read_segmentation`], rejecting headers above `max_vertices`.
pub fn read_segmentation_with_limit<R: Read>(
    reader: &mut WordReader<R>,
    max_vertices: usize,
) -> Result<(SegmentationHeader, Vec<u32>, usize)> {
    let header = read_segmentation_header(reader)?;
    let declared = header.vertices as usize;
    if declared > max_vertices {
        return Err(CodecError::LimitExceeded {
            declared,
            limit: max_vertices,
        });
    }
    let (ids, read) = decode_segmentation(reader, declared, u64::from(header.segments))?;
    Ok((header, ids, HEADER_SIZE + read))
}
