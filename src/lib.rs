//! Segmentation and persistence-index codecs for topology-preserving
//! scalar-field compression.
//!
//! Two independent codecs produce the byte regions a compressed file is
//! built from:
//!
//! * [`segmentation`] packs per-vertex segment ids into 32-bit words at the
//!   narrowest width the segment count allows.
//! * [`persistence`] stores the value to vertex table and the constraint
//!   list that pin critical points exactly.
//!
//! Every routine returns the number of bytes it produced or consumed so the
//! caller can lay out its own container. All multi-byte fields are
//! little-endian.

pub mod backend;
pub mod bit_width;
pub mod config;
pub mod error;
pub mod io_utils;
pub mod logging;
pub mod persistence;
pub mod segmentation;
pub mod stream;

pub use bit_width::{bit_width, packed_word_count, segment_width, UNDEFINED_WIDTH, WORD_BITS};
pub use config::Config;
pub use error::{CodecError, Result, Stage};
pub use persistence::{
    decode_persistence_index, encode_persistence_index, Constraint, Constraints,
    DecodedPersistenceIndex, PersistenceIndex, PersistenceMapping, SortedMappings, ValueRange,
};
pub use segmentation::{
    decode_segmentation, encode_segmentation, pack_segmentation, read_segmentation,
    read_segmentation_header, read_segmentation_with_limit, unpack_segmentation,
    write_segmentation, write_segmentation_header, SegmentationHeader,
};
pub use stream::{WordCursor, WordReader, WordSink, WordSource, WordWriter};
