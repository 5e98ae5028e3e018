use honggfuzz::fuzz;
use topocodec::{pack_segmentation, read_segmentation_with_limit, WordReader};

fn main() {
    loop {
        fuzz!(|data: &[u8]| {
            let mut reader = WordReader::from_slice(data);
            if let Ok((header, ids, _)) = read_segmentation_with_limit(&mut reader, 1 << 16) {
                if ids.iter().all(|&id| id < header.segments) {
                    let words = pack_segmentation(&ids, u64::from(header.segments)).unwrap();
                    assert_eq!(words.len(), header.word_count().unwrap());
                }
            }
        });
    }
}
