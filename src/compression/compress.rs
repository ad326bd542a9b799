use serde::{Serialize, Deserialize};
use crate::core::error::{Error, ErrorKind, Result};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionType {
    #[default]
    Lz4,      // Fast compression (~500 MB/s), ratio 2-3x
    Zstd,     // Better ratio (3-5x), slower (~200 MB/s)
    Snappy,   // Balanced (2-3x ratio, ~300 MB/s)
}

impl CompressionType {
    fn tag(self) -> u8 {
        match self {
            CompressionType::Lz4 => 1,
            CompressionType::Zstd => 2,
            CompressionType::Snappy => 3,
        }
    }

    fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            1 => Some(CompressionType::Lz4),
            2 => Some(CompressionType::Zstd),
            3 => Some(CompressionType::Snappy),
            _ => None,
        }
    }
}

const HEADER_LEN: usize = 5;

/// Compressed stored value of a compressible column
///
/// Framed as `[codec tag][original size, u32 LE][payload]` so a block
/// can be decoded without knowing the relation's current codec.
#[derive(Debug, Clone, PartialEq)]
pub struct CompressedBlock {
    pub data: Vec<u8>,
    pub original_size: usize,
    pub compression: CompressionType,
}

impl CompressedBlock {
    pub fn compress(data: &[u8], compression: CompressionType) -> Result<Self> {
        if u32::try_from(data.len()).is_err() {
            return Err(Error::validation(format!(
                "value of {} bytes is too large to compress", data.len()
            )));
        }

        let compressed = match compression {
            CompressionType::Lz4 => lz4_flex::block::compress(data),

            CompressionType::Zstd => {
                zstd::encode_all(data, 3)?  // Level 3 is balanced
            }

            CompressionType::Snappy => {
                let mut encoder = snap::raw::Encoder::new();
                encoder.compress_vec(data)
                    .map_err(|e| Error::with_source(ErrorKind::IndexEngine, "snappy compression failed", e))?
            }
        };

        Ok(CompressedBlock {
            data: compressed,
            original_size: data.len(),
            compression,
        })
    }

    pub fn decompress(&self) -> Result<Vec<u8>> {
        match self.compression {
            CompressionType::Lz4 => {
                lz4_flex::block::decompress(&self.data, self.original_size)
                    .map_err(|e| Error::with_source(ErrorKind::IndexEngine, "lz4 decompression failed", e))
            }

            CompressionType::Zstd => Ok(zstd::decode_all(&self.data[..])?),

            CompressionType::Snappy => {
                let mut decoder = snap::raw::Decoder::new();
                decoder.decompress_vec(&self.data)
                    .map_err(|e| Error::with_source(ErrorKind::IndexEngine, "snappy decompression failed", e))
            }
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(HEADER_LEN + self.data.len());
        bytes.push(self.compression.tag());
        bytes.extend_from_slice(&(self.original_size as u32).to_le_bytes());
        bytes.extend_from_slice(&self.data);
        bytes
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_LEN {
            return Err(Error::engine("compressed block is truncated"));
        }
        let compression = CompressionType::from_tag(bytes[0])
            .ok_or_else(|| Error::engine(format!("unknown compression tag {}", bytes[0])))?;
        let original_size = u32::from_le_bytes([bytes[1], bytes[2], bytes[3], bytes[4]]) as usize;

        Ok(CompressedBlock {
            data: bytes[HEADER_LEN..].to_vec(),
            original_size,
            compression,
        })
    }

    /// Compress a text value straight into its stored form
    pub fn pack_text(text: &str, compression: CompressionType) -> Result<Vec<u8>> {
        Ok(Self::compress(text.as_bytes(), compression)?.to_bytes())
    }

    pub fn unpack_text(bytes: &[u8]) -> Result<String> {
        let raw = Self::from_bytes(bytes)?.decompress()?;
        String::from_utf8(raw)
            .map_err(|e| Error::with_source(ErrorKind::IndexEngine, "compressed value is not UTF-8", e))
    }
}
