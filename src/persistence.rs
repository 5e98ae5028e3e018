//! Persistence index codec.
//!
//! Layout, all little-endian:
//!
//! ```text
//! [m: u32] m x [vertex: i32][value: f64]
//! [c: u32] c x [vertex: i32][value: f64][kind: i32]
//! ```
//!
//! Mapping entries are written in caller order. Decoding rebuilds the two
//! orderings downstream code needs (by vertex and by value) and the range of
//! constraint values.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::io::{Read, Write};

use tracing::debug;

use crate::error::{CodecError, Result, Stage};
use crate::segmentation::PREALLOC_LIMIT;
use crate::stream::{WordReader, WordWriter};

const MAPPING_ENTRY_SIZE: usize = 4 + 8;
const CONSTRAINT_ENTRY_SIZE: usize = 4 + 8 + 4;

/// A scalar value pinned to a vertex.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PersistenceMapping {
    pub value: f64,
    pub vertex: i32,
}

impl PersistenceMapping {
    pub fn new(value: f64, vertex: i32) -> Self {
        Self { value, vertex }
    }

    fn cmp_by_vertex(&self, other: &Self) -> Ordering {
        self.vertex
            .cmp(&other.vertex)
            .then_with(|| self.value.total_cmp(&other.value))
    }

    fn cmp_by_value(&self, other: &Self) -> Ordering {
        self.value
            .total_cmp(&other.value)
            .then_with(|| self.vertex.cmp(&other.vertex))
    }
}

/// A point that must survive compression exactly.
///
/// `kind` belongs to the persistence diagram (minimum, saddle, maximum...)
/// and is carried through untouched.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Constraint {
    pub vertex: i32,
    pub value: f64,
    pub kind: i32,
}

impl Constraint {
    pub fn new(vertex: i32, value: f64, kind: i32) -> Self {
        Self {
            vertex,
            value,
            kind,
        }
    }
}

/// Smallest and largest constraint value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
}

impl ValueRange {
    fn widen(range: Option<Self>, value: f64) -> Self {
        match range {
            None => Self {
                min: value,
                max: value,
            },
            Some(r) => Self {
                min: if value < r.min { value } else { r.min },
                max: if value > r.max { value } else { r.max },
            },
        }
    }
}

/// Constraint list together with its value range.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Constraints {
    entries: Vec<Constraint>,
    range: Option<ValueRange>,
}

impl Constraints {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, constraint: Constraint) {
        self.range = Some(ValueRange::widen(self.range, constraint.value));
        self.entries.push(constraint);
    }

    pub fn entries(&self) -> &[Constraint] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `None` for an empty list.
    pub fn range(&self) -> Option<ValueRange> {
        self.range
    }

    pub fn min(&self) -> Option<f64> {
        self.range.map(|r| r.min)
    }

    pub fn max(&self) -> Option<f64> {
        self.range.map(|r| r.max)
    }
}

impl FromIterator<Constraint> for Constraints {
    fn from_iter<I: IntoIterator<Item = Constraint>>(iter: I) -> Self {
        let mut out = Constraints::new();
        for c in iter {
            out.push(c);
        }
        out
    }
}

/// Decoded mapping, stored once in vertex order with a value-order index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SortedMappings {
    by_vertex: Vec<PersistenceMapping>,
    value_order: Vec<usize>,
}

impl SortedMappings {
    pub fn new(mut entries: Vec<PersistenceMapping>) -> Self {
        entries.sort_by(PersistenceMapping::cmp_by_vertex);
        let mut value_order: Vec<usize> = (0..entries.len()).collect();
        value_order.sort_by(|&a, &b| entries[a].cmp_by_value(&entries[b]));
        Self {
            by_vertex: entries,
            value_order,
        }
    }

    /// Entries ordered by vertex id ascending.
    pub fn by_vertex(&self) -> &[PersistenceMapping] {
        &self.by_vertex
    }

    /// Entries ordered by value ascending, ties by vertex id.
    pub fn by_value(&self) -> impl Iterator<Item = &PersistenceMapping> + Clone + '_ {
        self.value_order.iter().map(move |&i| &self.by_vertex[i])
    }

    pub fn to_value_sorted(&self) -> Vec<PersistenceMapping> {
        self.by_value().copied().collect()
    }

    /// Value recorded for `vertex`, if any.
    pub fn value_of(&self, vertex: i32) -> Option<f64> {
        self.by_vertex
            .binary_search_by(|m| m.vertex.cmp(&vertex))
            .ok()
            .map(|i| self.by_vertex[i].value)
    }

    pub fn len(&self) -> usize {
        self.by_vertex.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_vertex.is_empty()
    }
}

/// Everything read back by [`decode_persistence_index`].
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedPersistenceIndex {
    pub mappings: SortedMappings,
    pub constraints: Constraints,
    pub bytes_read: usize,
}

/// Mapping and constraints ready to be encoded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PersistenceIndex {
    pub mapping: Vec<PersistenceMapping>,
    pub constraints: Vec<Constraint>,
}

impl PersistenceIndex {
    pub fn new(mapping: Vec<PersistenceMapping>, constraints: Vec<Constraint>) -> Self {
        Self {
            mapping,
            constraints,
        }
    }

    pub fn encode<W: Write>(&self, writer: &mut WordWriter<W>) -> Result<usize> {
        encode_persistence_index(writer, &self.mapping, &self.constraints)
    }

    /// Bytes [`encode`](Self::encode) will produce.
    pub fn encoded_len(&self) -> usize {
        8 + self.mapping.len() * MAPPING_ENTRY_SIZE
            + self.constraints.len() * CONSTRAINT_ENTRY_SIZE
    }
}

fn count_field(len: usize, stage: Stage) -> Result<u32> {
    u32::try_from(len).map_err(|_| CodecError::CountOverflow { stage, count: len })
}

/// Write `mapping` then `constraints`, returning the bytes written.
///
/// Nothing is written if the mapping repeats a vertex or a list is too long
/// for its count.
pub fn encode_persistence_index<W: Write>(
    writer: &mut WordWriter<W>,
    mapping: &[PersistenceMapping],
    constraints: &[Constraint],
) -> Result<usize> {
    let mapping_count = count_field(mapping.len(), Stage::MappingCount)?;
    let constraint_count = count_field(constraints.len(), Stage::ConstraintCount)?;
    let mut seen = HashSet::with_capacity(mapping.len());
    if let Some(dup) = mapping.iter().find(|m| !seen.insert(m.vertex)) {
        return Err(CodecError::DuplicateVertex { vertex: dup.vertex });
    }

    let start = writer.bytes_written();
    writer.write_u32(mapping_count)?;
    for m in mapping {
        writer.write_i32(m.vertex)?;
        writer.write_f64(m.value)?;
    }

    writer.write_u32(constraint_count)?;
    for c in constraints {
        writer.write_i32(c.vertex)?;
        writer.write_f64(c.value)?;
        writer.write_i32(c.kind)?;
    }

    let written = writer.bytes_written() - start;
    debug!(
        mappings = mapping.len(),
        constraints = constraints.len(),
        bytes = written,
        "encoded persistence index"
    );
    Ok(written)
}

/// Read a persistence index written by [`encode_persistence_index`].
pub fn decode_persistence_index<R: Read>(
    reader: &mut WordReader<R>,
) -> Result<DecodedPersistenceIndex> {
    let start = reader.bytes_read();

    let m = reader.read_u32(Stage::MappingCount)? as usize;
    let mut entries = Vec::with_capacity(m.min(PREALLOC_LIMIT));
    for _ in 0..m {
        let vertex = reader.read_i32(Stage::MappingEntries)?;
        let value = reader.read_f64(Stage::MappingEntries)?;
        entries.push(PersistenceMapping { value, vertex });
    }
    let mappings = SortedMappings::new(entries);

    let c = reader.read_u32(Stage::ConstraintCount)? as usize;
    let mut constraints = Constraints {
        entries: Vec::with_capacity(c.min(PREALLOC_LIMIT)),
        range: None,
    };
    for _ in 0..c {
        let vertex = reader.read_i32(Stage::ConstraintEntries)?;
        let value = reader.read_f64(Stage::ConstraintEntries)?;
        let kind = reader.read_i32(Stage::ConstraintEntries)?;
        constraints.push(Constraint {
            vertex,
            value,
            kind,
        });
    }

    let bytes_read = reader.bytes_read() - start;
    debug!(
        mappings = m,
        constraints = c,
        bytes = bytes_read,
        "decoded persistence index"
    );
    Ok(DecodedPersistenceIndex {
        mappings,
        constraints,
        bytes_read,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> PersistenceIndex {
        PersistenceIndex::new(
            vec![
                PersistenceMapping::new(2.5, 7),
                PersistenceMapping::new(-1.0, 3),
                PersistenceMapping::new(2.5, 1),
            ],
            vec![
                Constraint::new(3, -1.0, 0),
                Constraint::new(7, 2.5, 2),
                Constraint::new(9, 0.25, 1),
            ],
        )
    }

    #[test]
    fn layout_size_matches() {
        let index = sample();
        let mut w = WordWriter::new(Vec::new());
        let written = index.encode(&mut w).unwrap();
        assert_eq!(written, index.encoded_len());
        assert_eq!(written, 8 + 3 * 12 + 3 * 16);
        assert_eq!(&w.into_inner()[..8], &[3, 0, 0, 0, 7, 0, 0, 0]);
    }

    #[test]
    fn decode_sorts_both_ways() {
        let index = sample();
        let mut w = WordWriter::new(Vec::new());
        index.encode(&mut w).unwrap();
        let bytes = w.into_inner();
        let decoded = decode_persistence_index(&mut WordReader::from_slice(&bytes)).unwrap();

        let vertices: Vec<i32> = decoded.mappings.by_vertex().iter().map(|m| m.vertex).collect();
        assert_eq!(vertices, vec![1, 3, 7]);
        let by_value: Vec<i32> = decoded.mappings.by_value().map(|m| m.vertex).collect();
        assert_eq!(by_value, vec![3, 1, 7]);
        assert_eq!(decoded.mappings.value_of(7), Some(2.5));
        assert_eq!(decoded.mappings.value_of(4), None);

        assert_eq!(decoded.constraints.entries(), &index.constraints[..]);
        assert_eq!(
            decoded.constraints.range(),
            Some(ValueRange { min: -1.0, max: 2.5 })
        );
        assert_eq!(decoded.bytes_read, bytes.len());
    }

    #[test]
    fn empty_constraints_have_no_range() {
        let index = PersistenceIndex::new(vec![PersistenceMapping::new(1.0, 0)], vec![]);
        let mut w = WordWriter::new(Vec::new());
        index.encode(&mut w).unwrap();
        let bytes = w.into_inner();
        let decoded = decode_persistence_index(&mut WordReader::from_slice(&bytes)).unwrap();
        assert!(decoded.constraints.is_empty());
        assert_eq!(decoded.constraints.min(), None);
        assert_eq!(decoded.constraints.max(), None);
    }

    #[test]
    fn duplicate_vertex_rejected() {
        let mapping = vec![
            PersistenceMapping::new(0.0, 4),
            PersistenceMapping::new(1.0, 4),
        ];
        let mut w = WordWriter::new(Vec::new());
        let err = encode_persistence_index(&mut w, &mapping, &[]).unwrap_err();
        assert!(matches!(err, CodecError::DuplicateVertex { vertex: 4 }));
        assert_eq!(w.bytes_written(), 0);
    }

    #[test]
    fn truncated_constraints_fail() {
        let index = sample();
        let mut w = WordWriter::new(Vec::new());
        index.encode(&mut w).unwrap();
        let mut bytes = w.into_inner();
        bytes.truncate(bytes.len() - 3);
        let err = decode_persistence_index(&mut WordReader::from_slice(&bytes)).unwrap_err();
        assert!(matches!(
            err,
            CodecError::IncompleteStream {
                stage: Stage::ConstraintEntries,
                ..
            }
        ));
    }

    #[test]
    fn constraints_collect_range() {
        let c: Constraints = [Constraint::new(0, 4.0, 0), Constraint::new(1, -2.0, 1)]
            .into_iter()
            .collect();
        assert_eq!(c.min(), Some(-2.0));
        assert_eq!(c.max(), Some(4.0));
    }
}
