//! Binary format for per-chunk files.
//!
//! Each chunk file is a small fixed header followed by an lz4-compressed
//! payload of little-endian tile ids:
//! - [`ChunkFileHeader`]: 12-byte header with magic, version and dimensions
//! - Payload: `lz4_flex` block compression with a size prefix

use std::io::{self, Read, Write};

use lz4_flex::{compress_prepend_size, decompress_size_prepended};

use crate::chunk::TileId;

/// Magic bytes identifying a tile world chunk file ("TWCK").
pub const MAGIC: u32 = 0x5457_434B;

/// Current format version.
pub const VERSION: u16 = 1;

/// Chunk file header (12 bytes, fixed size).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChunkFileHeader {
  /// Magic number (0x5457434B = "TWCK").
  pub magic: u32,
  /// Format version for migration.
  pub version: u16,
  /// Chunk width, in tiles.
  pub width: u16,
  /// Chunk height, in tiles.
  pub height: u16,
  /// Reserved for future use.
  pub _reserved: u16,
}

impl ChunkFileHeader {
  /// Header size in bytes.
  pub const SIZE: usize = 12;

  /// Creates a header for the given chunk dimensions.
  pub fn new(width: u32, height: u32) -> Self {
    Self {
      magic: MAGIC,
      version: VERSION,
      width: width as u16,
      height: height as u16,
      _reserved: 0,
    }
  }

  /// Validates the header against the reader's expected dimensions.
  pub fn validate(&self, width: u32, height: u32) -> Result<(), FormatError> {
    if self.magic != MAGIC {
      return Err(FormatError::InvalidMagic(self.magic));
    }
    if self.version > VERSION {
      return Err(FormatError::UnsupportedVersion(self.version));
    }
    if self.width as u32 != width || self.height as u32 != height {
      return Err(FormatError::DimensionMismatch {
        file: (self.width, self.height),
        expected: (width, height),
      });
    }
    Ok(())
  }

  /// Writes the header in little-endian layout.
  pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
    let mut buf = [0u8; Self::SIZE];
    buf[0..4].copy_from_slice(&self.magic.to_le_bytes());
    buf[4..6].copy_from_slice(&self.version.to_le_bytes());
    buf[6..8].copy_from_slice(&self.width.to_le_bytes());
    buf[8..10].copy_from_slice(&self.height.to_le_bytes());
    buf[10..12].copy_from_slice(&self._reserved.to_le_bytes());
    writer.write_all(&buf)
  }

  /// Reads a header in little-endian layout.
  pub fn read_from<R: Read>(reader: &mut R) -> io::Result<Self> {
    let mut buf = [0u8; Self::SIZE];
    reader.read_exact(&mut buf)?;

    Ok(Self {
      magic: u32::from_le_bytes(buf[0..4].try_into().unwrap()),
      version: u16::from_le_bytes(buf[4..6].try_into().unwrap()),
      width: u16::from_le_bytes(buf[6..8].try_into().unwrap()),
      height: u16::from_le_bytes(buf[8..10].try_into().unwrap()),
      _reserved: u16::from_le_bytes(buf[10..12].try_into().unwrap()),
    })
  }
}

/// Compresses tile data into the chunk file payload.
pub fn encode_tiles(tiles: &[TileId]) -> Vec<u8> {
  let mut bytes = Vec::with_capacity(tiles.len() * 2);
  for tile in tiles {
    bytes.extend_from_slice(&tile.to_le_bytes());
  }
  compress_prepend_size(&bytes)
}

/// Decompresses a chunk file payload into `dest`.
///
/// Fails if the payload does not hold exactly `dest.len()` tiles.
pub fn decode_tiles(payload: &[u8], dest: &mut [TileId]) -> Result<(), FormatError> {
  let bytes = decompress_size_prepended(payload).map_err(|_| FormatError::Decompression)?;
  if bytes.len() != dest.len() * 2 {
    return Err(FormatError::PayloadSizeMismatch {
      bytes: bytes.len(),
      expected: dest.len() * 2,
    });
  }

  for (tile, pair) in dest.iter_mut().zip(bytes.chunks_exact(2)) {
    *tile = u16::from_le_bytes([pair[0], pair[1]]);
  }
  Ok(())
}

/// Chunk file parsing failures.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FormatError {
  InvalidMagic(u32),
  UnsupportedVersion(u16),
  DimensionMismatch { file: (u16, u16), expected: (u32, u32) },
  PayloadSizeMismatch { bytes: usize, expected: usize },
  Decompression,
}

impl std::fmt::Display for FormatError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::InvalidMagic(m) => write!(f, "invalid magic number: 0x{:08X}", m),
      Self::UnsupportedVersion(v) => write!(f, "unsupported version: {}", v),
      Self::DimensionMismatch { file, expected } => write!(
        f,
        "chunk dimension mismatch: file={}x{}, expected={}x{}",
        file.0, file.1, expected.0, expected.1
      ),
      Self::PayloadSizeMismatch { bytes, expected } => {
        write!(f, "payload holds {} bytes, expected {}", bytes, expected)
      }
      Self::Decompression => write!(f, "payload decompression failed"),
    }
  }
}

impl std::error::Error for FormatError {}
