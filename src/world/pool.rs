//! Fixed-capacity chunk pool.
//!
//! The pool preallocates every chunk the world will ever use and recycles
//! them between "free" and "borrowed" for the lifetime of the process. It is
//! the only hard cap on concurrently-active chunks: exhausting it means the
//! falloff radius and pool sizing disagree, which is a configuration bug,
//! not a transient condition.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use crate::chunk::Chunk;

/// Index into the pool's fixed slot array.
///
/// Provides stable identity for a chunk's storage location, independent of
/// whatever world position is currently assigned to it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct SlotIndex(pub(crate) usize);

/// Fixed arena of preallocated chunks plus free/borrowed bookkeeping.
///
/// Borrowed tracking is by slot index rather than object identity, so
/// double-returns and foreign indices are caught without relying on
/// reference equality. Free slots are reused FIFO.
pub(crate) struct ChunkPool {
  /// Fixed array of chunk slots (pre-allocated memory).
  slots: Vec<Arc<Chunk>>,
  /// Free slots, handed out front-to-back.
  free: VecDeque<SlotIndex>,
  /// Indices currently withdrawn. Disjoint from `free` at all times.
  borrowed: HashSet<usize>,
}

impl ChunkPool {
  /// Creates a pool of `capacity` chunks, each holding `chunk_len` tiles
  /// per buffer.
  ///
  /// # Panics
  ///
  /// Panics on zero capacity; a pool that can never lend a chunk is a
  /// configuration bug.
  pub fn new(capacity: usize, chunk_len: usize) -> Self {
    assert!(capacity > 0, "pool capacity must be greater than zero");

    Self {
      slots: (0..capacity).map(|_| Arc::new(Chunk::new(chunk_len))).collect(),
      free: (0..capacity).map(SlotIndex).collect(),
      borrowed: HashSet::with_capacity(capacity),
    }
  }

  /// Returns whether any free chunk remains.
  pub fn can_withdraw(&self) -> bool {
    !self.free.is_empty()
  }

  /// Total slot count, free plus borrowed.
  pub fn capacity(&self) -> usize {
    self.slots.len()
  }

  /// Pulls a free slot from the pool, moving it to borrowed.
  pub fn withdraw(&mut self) -> Result<SlotIndex, PoolError> {
    let index = self.free.pop_front().ok_or(PoolError::Exhausted)?;
    self.borrowed.insert(index.0);
    Ok(index)
  }

  /// Returns a borrowed slot to the free list.
  ///
  /// Fails if the slot is not currently tracked as borrowed, which guards
  /// against double-returns and indices from some other pool.
  pub fn return_slot(&mut self, index: SlotIndex) -> Result<(), PoolError> {
    if !self.borrowed.remove(&index.0) {
      return Err(PoolError::NotBorrowed(index.0));
    }
    self.free.push_back(index);
    Ok(())
  }

  /// Returns the chunk stored in the given slot.
  pub fn chunk(&self, index: SlotIndex) -> &Arc<Chunk> {
    &self.slots[index.0]
  }
}

/// Pool bookkeeping violations. Both variants indicate a sizing or
/// bookkeeping bug in the caller and are treated as fatal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PoolError {
  /// No free chunk remains.
  Exhausted,
  /// The returned slot was not borrowed from this pool.
  NotBorrowed(usize),
}

impl std::fmt::Display for PoolError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::Exhausted => write!(f, "chunk pool exhausted"),
      Self::NotBorrowed(index) => {
        write!(f, "slot {} is not borrowed from this pool", index)
      }
    }
  }
}

impl std::error::Error for PoolError {}
