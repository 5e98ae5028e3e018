use std::fmt;

use thiserror::Error;

/// Point in a stream at which a read or count check failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    SegmentationHeader,
    SegmentationWords,
    MappingCount,
    MappingEntries,
    ConstraintCount,
    ConstraintEntries,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::SegmentationHeader => "segmentation header",
            Stage::SegmentationWords => "segmentation words",
            Stage::MappingCount => "mapping count",
            Stage::MappingEntries => "mapping entries",
            Stage::ConstraintCount => "constraint count",
            Stage::ConstraintEntries => "constraint entries",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum CodecError {
    /// Zero segments give no usable bit width.
    #[error("undefined bit width for {segments} segments")]
    UndefinedWidth { segments: u64 },

    /// Packed fields wider than one 32-bit container.
    #[error("bit width {width} for {segments} segments exceeds 32 bits")]
    UnsupportedWidth { width: u32, segments: u64 },

    /// Stream ended before the declared counts were satisfied.
    #[error("incomplete stream while reading {stage}: needed {needed} more bytes at offset {offset}")]
    IncompleteStream {
        stage: Stage,
        offset: usize,
        needed: usize,
    },

    /// Segment id does not fit the declared number of segments.
    #[error("segment id {id} at vertex {index} is out of range for {segments} segments")]
    SegmentOutOfRange { index: usize, id: u32, segments: u64 },

    /// The value to vertex mapping repeats a vertex id.
    #[error("vertex {vertex} appears more than once in the mapping")]
    DuplicateVertex { vertex: i32 },

    /// A list is too long for its 32-bit count prefix.
    #[error("{count} entries do not fit the {stage} field")]
    CountOverflow { stage: Stage, count: usize },

    /// Declared vertex count is above the caller's limit.
    #[error("declared {declared} vertices exceeds limit of {limit}")]
    LimitExceeded { declared: usize, limit: usize },

    /// Grid dimensions the transform backend cannot handle.
    #[error("unsupported grid shape {nx}x{ny}x{nz}")]
    UnsupportedShape { nx: usize, ny: usize, nz: usize },

    /// Failure reported by an optional compression backend.
    #[error("{backend} backend failure: {message}")]
    Backend {
        backend: &'static str,
        message: String,
    },

    /// Propagated I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, CodecError>;
