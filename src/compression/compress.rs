use crate::core::error::{Error, Result};
use serde::{Serialize, Deserialize};

/// Compressed block storage for segment payloads
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompressedBlock {
    pub data: Vec<u8>,
    pub original_size: usize,
    pub compression: CompressionType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompressionType {
    None,
    LZ4,      // Fast compression, ratio 2-3x
    Zstd,     // Better ratio, slower
}

impl CompressionType {
    /// One-byte tag used in segment headers.
    pub fn tag(self) -> u8 {
        match self {
            CompressionType::None => 0,
            CompressionType::LZ4 => 1,
            CompressionType::Zstd => 2,
        }
    }

    pub fn from_tag(tag: u8) -> Result<Self> {
        match tag {
            0 => Ok(CompressionType::None),
            1 => Ok(CompressionType::LZ4),
            2 => Ok(CompressionType::Zstd),
            other => Err(Error::corrupt(format!("unknown compression tag {}", other))),
        }
    }
}

impl CompressedBlock {
    pub fn compress(data: &[u8], compression: CompressionType) -> Result<Self> {
        let compressed = match compression {
            CompressionType::None => data.to_vec(),

            CompressionType::LZ4 => {
                lz4::block::compress(data, None, false)?
            }

            CompressionType::Zstd => {
                zstd::encode_all(data, 3)?  // Level 3 is balanced
            }
        };

        Ok(CompressedBlock {
            data: compressed,
            original_size: data.len(),
            compression,
        })
    }

    pub fn decompress(&self) -> Result<Vec<u8>> {
        let data = match self.compression {
            CompressionType::None => self.data.clone(),

            CompressionType::LZ4 => {
                let size = i32::try_from(self.original_size)
                    .map_err(|_| Error::corrupt("LZ4 block too large"))?;
                lz4::block::decompress(&self.data, Some(size))
                    .map_err(|e| Error::corrupt(format!("LZ4: {}", e)))?
            }

            CompressionType::Zstd => {
                zstd::decode_all(&self.data[..])
                    .map_err(|e| Error::corrupt(format!("Zstd: {}", e)))?
            }
        };

        if data.len() != self.original_size {
            return Err(Error::corrupt(format!(
                "decompressed {} bytes, expected {}",
                data.len(),
                self.original_size
            )));
        }
        Ok(data)
    }
}
