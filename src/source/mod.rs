//! Content sources - filling chunk buffers with tile data.
//!
//! The [`ChunkSource`] trait is the boundary between the streaming core and
//! whatever storage backs the world. Its contract is strict: given a
//! destination buffer of exactly one chunk, an implementation either fully
//! populates it or fully zero-fills it. Partial fills and propagated
//! failures are forbidden; the loader relies on "always fully written,
//! never fails".
//!
//! [`DirectorySource`] is the default implementation, reading one file per
//! chunk from a directory.

pub mod format;

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read};
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::warn;

use crate::chunk::TileId;
use crate::config::StreamConfig;
use crate::coords::ChunkPos;
use self::format::{ChunkFileHeader, FormatError};

/// Trait for populating chunk buffers with tile data.
///
/// Implementations may read persisted data from disk ([`DirectorySource`])
/// or generate procedural content. The `Send + Sync` bounds let the loader
/// call them from its worker thread.
pub trait ChunkSource: Send + Sync {
  /// Fills `dest` with the tiles for the chunk at `pos`.
  ///
  /// On missing or corrupt data the implementation must zero-fill `dest`
  /// and return normally. `dest` is always exactly one chunk long.
  fn fill_chunk(&self, pos: ChunkPos, dest: &mut [TileId]);
}

/// Content source backed by a directory of per-chunk files.
///
/// Chunks are stored as `{x},{y}.chunk` under the root directory, in the
/// format of [`format`]. Anything unreadable - missing file, foreign magic,
/// truncated payload - degrades to a zero-filled chunk with a logged
/// warning, never an error.
pub struct DirectorySource {
  root: PathBuf,
  width: u32,
  height: u32,
  /// Optional per-read sleep, simulating storage or network latency.
  latency: Option<Duration>,
}

impl DirectorySource {
  /// Creates a source reading chunk files under `root`.
  pub fn new(root: impl Into<PathBuf>, config: &StreamConfig) -> Self {
    Self {
      root: root.into(),
      width: config.chunk_width,
      height: config.chunk_height,
      latency: None,
    }
  }

  /// Adds a simulated per-read latency to every load.
  pub fn with_latency(mut self, latency: Duration) -> Self {
    self.latency = Some(latency);
    self
  }

  /// Returns the file path for the chunk at `pos`.
  pub fn chunk_path(&self, pos: ChunkPos) -> PathBuf {
    self.root.join(format!("{},{}.chunk", pos.x, pos.y))
  }

  /// Writes a chunk file for `pos`, creating the root directory if needed.
  ///
  /// # Panics
  ///
  /// Panics if `tiles` is not exactly one chunk long.
  pub fn save_chunk(&self, pos: ChunkPos, tiles: &[TileId]) -> io::Result<()> {
    assert_eq!(tiles.len(), (self.width * self.height) as usize);

    std::fs::create_dir_all(&self.root)?;
    let file = File::create(self.chunk_path(pos))?;
    let mut writer = BufWriter::new(file);
    ChunkFileHeader::new(self.width, self.height).write_to(&mut writer)?;

    let payload = format::encode_tiles(tiles);
    io::Write::write_all(&mut writer, &payload)?;
    io::Write::flush(&mut writer)
  }

  fn read_chunk(&self, path: &Path, dest: &mut [TileId]) -> Result<(), SourceError> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);

    let header = ChunkFileHeader::read_from(&mut reader)?;
    header.validate(self.width, self.height)?;

    let mut payload = Vec::new();
    reader.read_to_end(&mut payload)?;
    format::decode_tiles(&payload, dest)?;
    Ok(())
  }
}

impl ChunkSource for DirectorySource {
  fn fill_chunk(&self, pos: ChunkPos, dest: &mut [TileId]) {
    if let Some(latency) = self.latency {
      std::thread::sleep(latency);
    }

    let path = self.chunk_path(pos);
    if !path.exists() {
      // Unauthored chunks are a normal part of a sparse world.
      dest.fill(0);
      return;
    }

    if let Err(e) = self.read_chunk(&path, dest) {
      warn!("cannot load chunk {} from {}: {}", pos, path.display(), e);
      dest.fill(0);
    }
  }
}

/// Read failures recovered inside [`DirectorySource`].
#[derive(Debug)]
enum SourceError {
  Io(io::Error),
  Format(FormatError),
}

impl From<io::Error> for SourceError {
  fn from(e: io::Error) -> Self {
    Self::Io(e)
  }
}

impl From<FormatError> for SourceError {
  fn from(e: FormatError) -> Self {
    Self::Format(e)
  }
}

impl std::fmt::Display for SourceError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::Io(e) => write!(f, "i/o error: {}", e),
      Self::Format(e) => write!(f, "format error: {}", e),
    }
  }
}

#[cfg(test)]
mod tests {
  use tempfile::TempDir;

  use super::*;

  fn test_source(dir: &TempDir) -> DirectorySource {
    DirectorySource::new(dir.path(), &StreamConfig::default())
  }

  #[test]
  fn saved_chunk_round_trips() {
    let dir = TempDir::new().unwrap();
    let source = test_source(&dir);

    let tiles: Vec<TileId> = (0..81).map(|i| (i % 7) + 1).collect();
    let pos = ChunkPos::new(-3, 12);
    source.save_chunk(pos, &tiles).unwrap();

    let mut dest = vec![0u16; 81];
    source.fill_chunk(pos, &mut dest);
    assert_eq!(dest, tiles);
  }

  #[test]
  fn missing_file_zero_fills() {
    let dir = TempDir::new().unwrap();
    let source = test_source(&dir);

    let mut dest = vec![0xFFFFu16; 81];
    source.fill_chunk(ChunkPos::new(5, 5), &mut dest);
    assert!(dest.iter().all(|&t| t == 0));
  }

  #[test]
  fn corrupt_file_zero_fills() {
    let dir = TempDir::new().unwrap();
    let source = test_source(&dir);
    let pos = ChunkPos::new(0, 0);

    std::fs::write(source.chunk_path(pos), b"not a chunk file").unwrap();

    let mut dest = vec![0xFFFFu16; 81];
    source.fill_chunk(pos, &mut dest);
    assert!(dest.iter().all(|&t| t == 0));
  }

  #[test]
  fn truncated_file_zero_fills() {
    let dir = TempDir::new().unwrap();
    let source = test_source(&dir);
    let pos = ChunkPos::new(2, -2);

    let tiles = vec![5u16; 81];
    source.save_chunk(pos, &tiles).unwrap();

    // Chop off the tail of the payload.
    let path = source.chunk_path(pos);
    let bytes = std::fs::read(&path).unwrap();
    std::fs::write(&path, &bytes[..bytes.len() / 2]).unwrap();

    let mut dest = vec![0xFFFFu16; 81];
    source.fill_chunk(pos, &mut dest);
    assert!(dest.iter().all(|&t| t == 0));
  }

  #[test]
  fn dimension_mismatch_zero_fills() {
    let dir = TempDir::new().unwrap();
    let pos = ChunkPos::new(1, 1);

    let wide = DirectorySource::new(
      dir.path(),
      &StreamConfig {
        chunk_width: 16,
        chunk_height: 16,
        ..Default::default()
      },
    );
    wide.save_chunk(pos, &vec![3u16; 256]).unwrap();

    let source = test_source(&dir);
    let mut dest = vec![0xFFFFu16; 81];
    source.fill_chunk(pos, &mut dest);
    assert!(dest.iter().all(|&t| t == 0));
  }
}
