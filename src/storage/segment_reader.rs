use std::fs::File;
use std::io::Read;
use crc32fast::Hasher;
use crate::compression::compress::{CompressedBlock, CompressionType};
use crate::core::error::{Error, Result};
use crate::storage::layout::StorageLayout;
use crate::storage::segment::{DocumentSegment, SegmentHeader, SegmentId};

pub struct SegmentReader {
    pub segment_id: SegmentId,
    pub header: SegmentHeader,
    pub file: File,
}

impl SegmentReader {
    pub fn open(storage: &StorageLayout, segment_id: SegmentId) -> Result<Self> {
        let path = storage.segment_path(&segment_id);
        let mut file = File::open(path)?;

        // Read header
        let mut header_buf = vec![0u8; SegmentHeader::SIZE];
        file.read_exact(&mut header_buf)
            .map_err(|e| Error::corrupt(format!("segment {} header: {}", segment_id, e)))?;
        let header: SegmentHeader = bincode::deserialize(&header_buf)?;
        header.validate()?;

        Ok(SegmentReader {
            segment_id,
            header,
            file,
        })
    }

    /// Read, verify and decode the whole segment.
    pub fn read(mut self) -> Result<DocumentSegment> {
        let mut data = Vec::new();
        self.file.read_to_end(&mut data)?;

        if data.len() as u64 != self.header.payload_len {
            return Err(Error::corrupt(format!(
                "segment {} payload is {} bytes, header says {}",
                self.segment_id,
                data.len(),
                self.header.payload_len
            )));
        }

        let mut hasher = Hasher::new();
        hasher.update(&data);
        if hasher.finalize() != self.header.checksum {
            return Err(Error::corrupt(format!("segment {} checksum mismatch", self.segment_id)));
        }

        let block = CompressedBlock {
            data,
            original_size: self.header.original_len as usize,
            compression: CompressionType::from_tag(self.header.compression)?,
        };
        DocumentSegment::from_payload(&block.decompress()?)
    }
}
