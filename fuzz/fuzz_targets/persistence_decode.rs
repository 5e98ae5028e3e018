use honggfuzz::fuzz;
use topocodec::{decode_persistence_index, WordReader};

fn main() {
    loop {
        fuzz!(|data: &[u8]| {
            if let Ok(decoded) = decode_persistence_index(&mut WordReader::from_slice(data)) {
                assert!(decoded.bytes_read <= data.len());
                assert_eq!(decoded.constraints.range().is_some(), !decoded.constraints.is_empty());
            }
        });
    }
}
