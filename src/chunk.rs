//! Double-buffered chunk storage.
//!
//! A [`Chunk`] is the unit of consistency between the loader thread and the
//! consumer thread. The loader publishes freshly loaded tiles into the back
//! buffer with [`Chunk::set_data`]; the consumer accepts them once per tick
//! with [`Chunk::apply_pending_changes`], which swaps the buffers under the
//! chunk-local lock. Readers therefore always observe a fully-written front
//! buffer, never a torn one.

use parking_lot::{Mutex, MutexGuard};

use crate::coords::ChunkPos;

/// Tile identifier stored in chunk buffers.
pub type TileId = u16;

/// Guarded read access to a chunk's front buffer.
pub type TileGuard<'a> = parking_lot::MappedMutexGuard<'a, [TileId]>;

struct ChunkState {
  /// Whether this chunk is currently active (withdrawn from the pool).
  in_use: bool,
  /// Assigned position, in chunk units. Only meaningful while in use.
  pos: ChunkPos,
  /// Buffer the consumer reads from.
  front: Box<[TileId]>,
  /// Buffer the loader writes into.
  back: Box<[TileId]>,
  /// Set when the back buffer holds a fully-written, not-yet-published
  /// update.
  pending: bool,
}

/// Double-buffered tile container for one chunk coordinate.
///
/// All state lives behind one chunk-local mutex. The lock is never held
/// across chunks or across the load queue, so lock ordering is trivial.
pub struct Chunk {
  state: Mutex<ChunkState>,
}

impl Chunk {
  /// Creates an inactive chunk with both buffers zeroed, `len` tiles each.
  pub fn new(len: usize) -> Self {
    Self {
      state: Mutex::new(ChunkState {
        in_use: false,
        pos: ChunkPos::default(),
        front: vec![0; len].into_boxed_slice(),
        back: vec![0; len].into_boxed_slice(),
        pending: false,
      }),
    }
  }

  /// Returns the assigned position.
  pub fn pos(&self) -> ChunkPos {
    self.state.lock().pos
  }

  /// Returns whether the chunk is currently active.
  pub fn is_in_use(&self) -> bool {
    self.state.lock().in_use
  }

  /// Marks the chunk active at `pos`. Called by the manager right after
  /// withdrawal, before the chunk becomes reachable through the cache.
  pub(crate) fn assign(&self, pos: ChunkPos) {
    let mut state = self.state.lock();
    state.in_use = true;
    state.pos = pos;
  }

  /// Resets the chunk for recycling: deactivates it, zeroes both buffers
  /// and drops any unpublished update. Called exactly once per eviction.
  ///
  /// Deactivation happens under the same lock as the buffer reset, so a
  /// loader publish racing with an eviction either lands entirely before
  /// the reset or is rejected by [`Chunk::set_data`]'s in-use check.
  pub(crate) fn clear(&self) {
    let mut state = self.state.lock();
    state.in_use = false;
    state.pos = ChunkPos::default();
    state.front.fill(0);
    state.back.fill(0);
    state.pending = false;
  }

  /// Loader-side publish: copies `data` into the back buffer and marks it
  /// pending.
  ///
  /// The write is silently discarded unless the chunk is still in use and
  /// still assigned to `pos`. This guards against loads issued for a chunk
  /// that was evicted, or evicted and reassigned, while the job was in the
  /// queue.
  ///
  /// # Panics
  ///
  /// Panics if `data` length differs from the chunk buffer length; every
  /// caller stages exactly one chunk's worth of tiles.
  pub(crate) fn set_data(&self, pos: ChunkPos, data: &[TileId]) {
    let mut state = self.state.lock();
    if !state.in_use || state.pos != pos {
      return;
    }

    state.back.copy_from_slice(data);
    state.pending = true;
  }

  /// Consumer-side publish acceptance: swaps the buffers if an update is
  /// pending, otherwise does nothing.
  ///
  /// Must be invoked from the single consumer context once per tick, before
  /// any read of the front buffer for that tick.
  pub(crate) fn apply_pending_changes(&self) {
    let mut state = self.state.lock();
    if !state.in_use {
      return;
    }

    // Reborrow past the guard so front and back can be borrowed disjointly.
    let state = &mut *state;
    if state.pending {
      std::mem::swap(&mut state.front, &mut state.back);
      state.pending = false;
    }
  }

  /// Returns guarded read access to the front buffer.
  ///
  /// The guard holds the chunk-local lock; callers should not keep it alive
  /// across a tick boundary.
  pub fn data(&self) -> TileGuard<'_> {
    MutexGuard::map(self.state.lock(), |state| &mut state.front[..])
  }
}

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use super::*;

  const LEN: usize = 81;

  #[test]
  fn set_data_is_rejected_while_inactive() {
    let chunk = Chunk::new(LEN);
    chunk.set_data(ChunkPos::new(0, 0), &[7; LEN]);
    chunk.apply_pending_changes();
    assert!(chunk.data().iter().all(|&t| t == 0));
  }

  #[test]
  fn set_data_is_rejected_on_position_mismatch() {
    let chunk = Chunk::new(LEN);
    chunk.assign(ChunkPos::new(3, -2));
    chunk.set_data(ChunkPos::new(3, 2), &[7; LEN]);
    chunk.apply_pending_changes();
    assert!(chunk.data().iter().all(|&t| t == 0));
  }

  #[test]
  fn published_data_appears_only_after_apply() {
    let chunk = Chunk::new(LEN);
    chunk.assign(ChunkPos::new(1, 1));
    chunk.set_data(ChunkPos::new(1, 1), &[42; LEN]);

    // Not visible until the consumer accepts it.
    assert!(chunk.data().iter().all(|&t| t == 0));

    chunk.apply_pending_changes();
    assert!(chunk.data().iter().all(|&t| t == 42));

    // A second apply with nothing pending is a no-op.
    chunk.apply_pending_changes();
    assert!(chunk.data().iter().all(|&t| t == 42));
  }

  #[test]
  fn successive_publishes_swap_buffers_both_ways() {
    let chunk = Chunk::new(LEN);
    chunk.assign(ChunkPos::new(0, 0));

    // Two full publish/accept cycles so the swap runs in both directions.
    for generation in [11u16, 22] {
      chunk.set_data(ChunkPos::new(0, 0), &[generation; LEN]);
      chunk.apply_pending_changes();
      assert!(chunk.data().iter().all(|&t| t == generation));
    }
  }

  #[test]
  fn clear_discards_pending_update() {
    let chunk = Chunk::new(LEN);
    chunk.assign(ChunkPos::new(5, 5));
    chunk.set_data(ChunkPos::new(5, 5), &[9; LEN]);

    chunk.clear();
    assert!(!chunk.is_in_use());
    assert_eq!(chunk.pos(), ChunkPos::default());

    // Reassigned to a new position: the old pending write must not leak in.
    chunk.assign(ChunkPos::new(-4, 0));
    chunk.apply_pending_changes();
    assert!(chunk.data().iter().all(|&t| t == 0));
  }

  #[test]
  fn stale_write_after_recycling_is_discarded() {
    let chunk = Chunk::new(LEN);
    chunk.assign(ChunkPos::new(2, 2));
    chunk.clear();
    chunk.assign(ChunkPos::new(8, 8));

    // A job issued against the old assignment completes late.
    chunk.set_data(ChunkPos::new(2, 2), &[13; LEN]);
    chunk.apply_pending_changes();
    assert!(chunk.data().iter().all(|&t| t == 0));
  }

  #[test]
  fn concurrent_writer_never_produces_torn_reads() {
    let chunk = Arc::new(Chunk::new(LEN));
    let pos = ChunkPos::new(0, 0);
    chunk.assign(pos);

    let writer = {
      let chunk = Arc::clone(&chunk);
      std::thread::spawn(move || {
        for generation in 1..=500u16 {
          chunk.set_data(pos, &[generation; LEN]);
        }
      })
    };

    // The reader interleaves publish acceptance with reads; every observed
    // buffer must hold a single generation.
    for _ in 0..500 {
      chunk.apply_pending_changes();
      let data = chunk.data();
      let first = data[0];
      assert!(data.iter().all(|&t| t == first), "torn buffer observed");
    }

    writer.join().unwrap();
  }
}
