//! ChunkWorld - the active-chunk cache and streaming policy.
//!
//! This module owns everything the consumer thread touches:
//! - The fixed [`pool`] of preallocated chunks
//! - The coordinate → slot cache of currently-active chunks
//! - The precomputed [`streaming`] offset table walked on camera moves
//!
//! The intended per-tick call order from the single consumer thread is
//! [`ChunkWorld::set_camera_at`], then [`ChunkWorld::apply_all_pending_changes`],
//! then any number of [`ChunkWorld::chunk_data`] reads for that tick.

pub(crate) mod pool;
pub(crate) mod streaming;

use std::collections::HashMap;
use std::ops::Deref;
use std::sync::Arc;

use log::{debug, trace};

use crate::chunk::{TileGuard, TileId};
use crate::config::{ConfigError, StreamConfig};
use crate::coords::{ChunkPos, squared_distance};
use crate::loader::ChunkLoader;
use crate::source::ChunkSource;
use self::pool::{ChunkPool, SlotIndex};
use self::streaming::disc_offsets;

/// Read access to one chunk's tile data.
///
/// Derefs to a `[TileId]` slice of exactly chunk-width × chunk-height
/// tiles. For uncached coordinates this is a shared zero-filled buffer, the
/// same instance on every call; for cached chunks it holds the chunk-local
/// lock for the lifetime of the value, so it should not be kept across a
/// tick boundary.
pub enum ChunkData<'a> {
  /// The chunk is cached; the guard locks its front buffer.
  Loaded(TileGuard<'a>),
  /// The chunk is not cached; shared zero-filled fallback.
  Missing(&'a [TileId]),
}

impl Deref for ChunkData<'_> {
  type Target = [TileId];

  fn deref(&self) -> &Self::Target {
    match self {
      Self::Loaded(guard) => guard,
      Self::Missing(empty) => empty,
    }
  }
}

/// Manages the set of active chunks around the camera.
///
/// Owned and driven by a single consumer thread; only the background loader
/// ever touches chunk contents from elsewhere, and that crossing is guarded
/// inside [`Chunk`](crate::chunk::Chunk). The cache and pool themselves need
/// no synchronization.
pub struct ChunkWorld {
  config: StreamConfig,
  /// Last camera position handed to [`ChunkWorld::set_camera_at`].
  center: ChunkPos,
  pool: ChunkPool,
  /// Coordinate → slot for every chunk currently withdrawn from the pool.
  active: HashMap<ChunkPos, SlotIndex>,
  /// Precomputed nearest-first view-disc offsets.
  offsets: Vec<(i32, i32)>,
  /// Scratch list of chunks marked for eviction, reused across ticks.
  doomed: Vec<(ChunkPos, SlotIndex)>,
  /// Shared zero-filled buffer returned for uncached coordinates.
  empty: Box<[TileId]>,
  loader: ChunkLoader,
}

impl ChunkWorld {
  /// Creates a world streaming from `source`.
  ///
  /// Validates `config`, sizes the pool to the falloff disc area and
  /// precomputes the view-disc offset table. The loader's worker thread
  /// starts immediately.
  pub fn new(config: StreamConfig, source: Arc<dyn ChunkSource>) -> Result<Self, ConfigError> {
    config.validate()?;

    Ok(Self {
      center: ChunkPos::default(),
      pool: ChunkPool::new(config.pool_capacity(), config.chunk_len()),
      active: HashMap::with_capacity(config.pool_capacity()),
      offsets: disc_offsets(config.view_radius),
      doomed: Vec::new(),
      empty: vec![0; config.chunk_len()].into_boxed_slice(),
      loader: ChunkLoader::new(source, &config),
      config,
    })
  }

  /// Returns the sizing configuration.
  pub fn config(&self) -> &StreamConfig {
    &self.config
  }

  /// Returns the last camera position.
  pub fn center(&self) -> ChunkPos {
    self.center
  }

  /// Returns the number of currently-active chunks.
  pub fn active_count(&self) -> usize {
    self.active.len()
  }

  /// Number of chunk loads still awaiting or undergoing service.
  pub fn pending_loads(&self) -> usize {
    self.loader.pending_jobs()
  }

  /// Moves the camera to `pos` and updates the active set accordingly.
  ///
  /// Chunks farther than the falloff radius are recycled back to the pool;
  /// coordinates inside the view disc that are not yet cached get a chunk
  /// withdrawn, inserted and queued for loading, nearest-first. Call once
  /// per tick, before [`ChunkWorld::apply_all_pending_changes`].
  ///
  /// # Panics
  ///
  /// Panics if the pool is exhausted while admitting new chunks, or if the
  /// cache and pool bookkeeping disagree during eviction. Both mean the
  /// falloff/pool sizing or the caller's threading contract is broken, not
  /// a transient condition.
  pub fn set_camera_at(&mut self, pos: ChunkPos) {
    // Inform the loader first so queued jobs can self-cancel by distance.
    self.loader.set_origin(pos);
    self.center = pos;

    // Recycle the chunks that drifted past the falloff radius.
    let falloff_sq = self.config.falloff_radius_sq();
    for (&chunk_pos, &slot) in &self.active {
      if squared_distance(pos, chunk_pos) > falloff_sq {
        self.doomed.push((chunk_pos, slot));
      }
    }

    for &(chunk_pos, slot) in &self.doomed {
      // Removal from the cache must precede the return to the pool, so the
      // pool never reissues a chunk that a lookup could still resolve.
      let removed = self.active.remove(&chunk_pos);
      assert!(
        removed.is_some(),
        "evicted chunk {} was not in the cache",
        chunk_pos
      );

      self
        .pool
        .return_slot(slot)
        .unwrap_or_else(|e| panic!("recycling chunk {}: {}", chunk_pos, e));
      self.pool.chunk(slot).clear();
      trace!("recycled chunk {}", chunk_pos);
    }

    if !self.doomed.is_empty() {
      debug!("recycled {} chunks around {}", self.doomed.len(), pos);
      self.doomed.clear();
    }

    // Admit missing chunks inside the view disc, nearest-first.
    for &(dx, dy) in &self.offsets {
      let target = pos.offset(dx, dy);
      if self.active.contains_key(&target) {
        continue;
      }

      assert!(
        self.pool.can_withdraw(),
        "admitting chunk {}: pool exhausted; falloff radius and pool capacity disagree",
        target
      );
      let slot = self
        .pool
        .withdraw()
        .unwrap_or_else(|e| panic!("admitting chunk {}: {}", target, e));
      let chunk = self.pool.chunk(slot);
      chunk.assign(target);
      self.active.insert(target, slot);
      self.loader.enqueue(target, chunk);
      trace!("admitted chunk {}", target);
    }

    debug_assert!(self.active.len() <= self.pool.capacity());
  }

  /// Accepts any newly-arrived data on every active chunk.
  ///
  /// Must be called once per tick from the consumer thread, after any
  /// camera move for that tick and before chunk data is read for that
  /// tick.
  pub fn apply_all_pending_changes(&self) {
    for &slot in self.active.values() {
      self.pool.chunk(slot).apply_pending_changes();
    }
  }

  /// Returns the tile data for the chunk at `pos`.
  ///
  /// Uncached coordinates yield the shared zero-filled buffer - the same
  /// instance every call, with no allocation on miss.
  pub fn chunk_data(&self, pos: ChunkPos) -> ChunkData<'_> {
    match self.active.get(&pos) {
      Some(&slot) => ChunkData::Loaded(self.pool.chunk(slot).data()),
      None => ChunkData::Missing(&self.empty),
    }
  }

  /// Returns whether the chunk at `pos` is currently being managed.
  pub fn is_chunk_data_available(&self, pos: ChunkPos) -> bool {
    self.active.contains_key(&pos)
  }
}
