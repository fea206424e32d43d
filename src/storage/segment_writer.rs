use std::io::Write;
use std::fs::File;
use crc32fast::Hasher;
use crate::compression::compress::{CompressedBlock, CompressionType};
use crate::core::error::Result;
use crate::storage::layout::StorageLayout;
use crate::storage::segment::{DocumentSegment, SegmentHeader, SegmentId};

pub struct SegmentWriter {
    pub segment_id: SegmentId,
    pub file: File,
    pub compression: CompressionType,
}

impl SegmentWriter {
    pub fn new(storage: &StorageLayout, segment_id: SegmentId, compression: CompressionType) -> Result<Self> {
        let path = storage.segment_path(&segment_id);
        let file = File::create(path)?;

        Ok(SegmentWriter {
            segment_id,
            file,
            compression,
        })
    }

    // [ HEADER (magic, version, lengths, checksum) ] <- byte 0
    // [ COMPRESSED PAYLOAD ]
    pub fn write(mut self, segment: &DocumentSegment) -> Result<u64> {
        let payload = segment.to_payload()?;
        let compressed = CompressedBlock::compress(&payload, self.compression)?;

        let mut hasher = Hasher::new();
        hasher.update(&compressed.data);

        let header = SegmentHeader {
            magic: SegmentHeader::MAGIC,
            version: SegmentHeader::VERSION,
            compression: self.compression.tag(),
            original_len: compressed.original_size as u64,
            payload_len: compressed.data.len() as u64,
            checksum: hasher.finalize(),
        };

        let header_data = bincode::serialize(&header)?;
        debug_assert_eq!(header_data.len(), SegmentHeader::SIZE);

        self.file.write_all(&header_data)?;
        self.file.write_all(&compressed.data)?;
        self.file.sync_all()?;

        Ok((header_data.len() + compressed.data.len()) as u64)
    }
}
