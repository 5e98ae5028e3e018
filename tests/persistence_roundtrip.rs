use std::collections::BTreeMap;

use proptest::prelude::*;
use topocodec::{
    decode_persistence_index, encode_persistence_index, CodecError, Constraint,
    PersistenceIndex, PersistenceMapping, Stage, WordReader, WordWriter,
};

fn finite() -> impl Strategy<Value = f64> {
    -1.0e6f64..1.0e6
}

fn mapping() -> impl Strategy<Value = Vec<PersistenceMapping>> {
    proptest::collection::btree_map(any::<i32>(), finite(), 0..64).prop_flat_map(
        |m: BTreeMap<i32, f64>| {
            let entries: Vec<PersistenceMapping> = m
                .into_iter()
                .map(|(vertex, value)| PersistenceMapping::new(value, vertex))
                .collect();
            Just(entries).prop_shuffle()
        },
    )
}

fn constraints() -> impl Strategy<Value = Vec<Constraint>> {
    proptest::collection::vec(
        (any::<i32>(), finite(), 0i32..4).prop_map(|(v, x, k)| Constraint::new(v, x, k)),
        0..32,
    )
}

fn encode(index: &PersistenceIndex) -> Vec<u8> {
    let mut w = WordWriter::new(Vec::new());
    let n = index.encode(&mut w).unwrap();
    let bytes = w.into_inner();
    assert_eq!(n, bytes.len());
    bytes
}

proptest! {
    #[test]
    fn roundtrip_random(mapping in mapping(), constraints in constraints()) {
        let index = PersistenceIndex::new(mapping, constraints);
        let bytes = encode(&index);
        let decoded = decode_persistence_index(&mut WordReader::from_slice(&bytes)).unwrap();
        prop_assert_eq!(decoded.bytes_read, bytes.len());

        let mut expected = index.mapping.clone();
        expected.sort_by_key(|m| m.vertex);
        prop_assert_eq!(decoded.mappings.by_vertex(), &expected[..]);

        prop_assert_eq!(decoded.constraints.entries(), &index.constraints[..]);
        if index.constraints.is_empty() {
            prop_assert!(decoded.constraints.range().is_none());
        } else {
            let min = index.constraints.iter().map(|c| c.value).fold(f64::INFINITY, f64::min);
            let max = index.constraints.iter().map(|c| c.value).fold(f64::NEG_INFINITY, f64::max);
            prop_assert_eq!(decoded.constraints.min(), Some(min));
            prop_assert_eq!(decoded.constraints.max(), Some(max));
        }
    }

    #[test]
    fn views_are_sorted(mapping in mapping()) {
        let bytes = encode(&PersistenceIndex::new(mapping.clone(), vec![]));
        let decoded = decode_persistence_index(&mut WordReader::from_slice(&bytes)).unwrap();

        let by_vertex = decoded.mappings.by_vertex();
        prop_assert!(by_vertex.windows(2).all(|w| w[0].vertex <= w[1].vertex));

        let by_value = decoded.mappings.to_value_sorted();
        prop_assert_eq!(by_value.len(), mapping.len());
        prop_assert!(by_value.windows(2).all(|w| w[0].value <= w[1].value));

        // The lazy view can be walked more than once.
        let walk = decoded.mappings.by_value();
        prop_assert_eq!(walk.clone().count(), walk.count());
    }

    #[test]
    fn any_truncation_is_incomplete(mapping in mapping(), constraints in constraints(), cut in 1usize..16) {
        let bytes = encode(&PersistenceIndex::new(mapping, constraints));
        let keep = bytes.len().saturating_sub(cut);
        let result = decode_persistence_index(&mut WordReader::from_slice(&bytes[..keep]));
        let is_incomplete = matches!(result, Err(CodecError::IncompleteStream { .. }));
        prop_assert!(is_incomplete);
    }
}

#[test]
fn equal_values_order_by_vertex() {
    let mapping = vec![
        PersistenceMapping::new(1.0, 9),
        PersistenceMapping::new(1.0, 2),
        PersistenceMapping::new(0.5, 5),
    ];
    let bytes = encode(&PersistenceIndex::new(mapping, vec![]));
    let decoded = decode_persistence_index(&mut WordReader::from_slice(&bytes)).unwrap();
    let order: Vec<i32> = decoded.mappings.by_value().map(|m| m.vertex).collect();
    assert_eq!(order, vec![5, 2, 9]);
}

#[test]
fn empty_index() {
    let bytes = encode(&PersistenceIndex::default());
    assert_eq!(bytes, vec![0u8; 8]);
    let decoded = decode_persistence_index(&mut WordReader::from_slice(&bytes)).unwrap();
    assert!(decoded.mappings.is_empty());
    assert!(decoded.constraints.is_empty());
    assert_eq!(decoded.constraints.range(), None);
    assert_eq!(decoded.bytes_read, 8);
}

#[test]
fn kind_passes_through() {
    let constraints = vec![Constraint::new(1, 0.0, -1), Constraint::new(2, 0.0, 42)];
    let bytes = encode(&PersistenceIndex::new(vec![], constraints.clone()));
    let decoded = decode_persistence_index(&mut WordReader::from_slice(&bytes)).unwrap();
    assert_eq!(decoded.constraints.entries(), &constraints[..]);
}

#[test]
fn huge_declared_count_fails_cleanly() {
    let bytes = u32::MAX.to_le_bytes();
    assert!(matches!(
        decode_persistence_index(&mut WordReader::from_slice(&bytes)),
        Err(CodecError::IncompleteStream { stage: Stage::MappingEntries, offset: 4, .. })
    ));
}

#[test]
fn index_follows_segmentation_in_one_stream() {
    let mut w = WordWriter::new(Vec::new());
    let seg = topocodec::write_segmentation(&mut w, &[0, 1, 2, 1], 3).unwrap();
    let idx = encode_persistence_index(
        &mut w,
        &[PersistenceMapping::new(3.0, 1)],
        &[Constraint::new(1, 3.0, 0)],
    )
    .unwrap();
    let bytes = w.into_inner();
    assert_eq!(seg + idx, bytes.len());

    let mut r = WordReader::from_slice(&bytes);
    let (_, ids, read) = topocodec::read_segmentation(&mut r).unwrap();
    assert_eq!(ids, vec![0, 1, 2, 1]);
    assert_eq!(read, seg);
    let decoded = decode_persistence_index(&mut r).unwrap();
    assert_eq!(decoded.bytes_read, idx);
    assert_eq!(decoded.constraints.min(), Some(3.0));
}
