//! Background chunk loading.
//!
//! [`ChunkLoader`] owns one dedicated worker thread fed by a bounded
//! channel. The consumer thread enqueues `(position, chunk)` jobs; the
//! worker fills a reusable staging buffer from the [`ChunkSource`] and
//! publishes it into the target chunk's back buffer.
//!
//! Cancellation is advisory and distance-based only: the worker re-checks
//! each job against the current camera origin when it dequeues it and drops
//! jobs that have drifted past the falloff radius. A job that is already
//! past that check when the origin moves again still completes; the chunk's
//! own position-match guard turns that late publish into a no-op.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::JoinHandle;

use async_channel::{Receiver, Sender};
use parking_lot::Mutex;

use crate::chunk::{Chunk, TileId};
use crate::config::StreamConfig;
use crate::coords::{ChunkPos, squared_distance};
use crate::source::ChunkSource;

/// A load request: fill `chunk` with the tiles at `pos`.
struct LoadJob {
  pos: ChunkPos,
  chunk: Arc<Chunk>,
}

/// Asynchronous chunk loading service with one worker thread.
///
/// Enqueuing onto a full queue blocks the caller. That backpressure is by
/// design: the caller is the consumer thread, so a saturated loader slows
/// camera-movement processing down instead of growing memory without bound.
pub(crate) struct ChunkLoader {
  job_tx: Sender<LoadJob>,
  /// Positions currently awaiting or undergoing a load. Prevents duplicate
  /// enqueues while a job for the same coordinate is outstanding.
  queued: Arc<Mutex<HashSet<ChunkPos>>>,
  /// Camera origin, packed x/y. Written by the consumer thread, read once
  /// per job by the worker.
  origin: Arc<AtomicU64>,
  worker: Option<JoinHandle<()>>,
}

impl ChunkLoader {
  /// Starts the worker thread immediately.
  pub fn new(source: Arc<dyn ChunkSource>, config: &StreamConfig) -> Self {
    let (job_tx, job_rx) = async_channel::bounded::<LoadJob>(config.queue_depth);
    let queued = Arc::new(Mutex::new(HashSet::new()));
    let origin = Arc::new(AtomicU64::new(pack_origin(ChunkPos::default())));

    let worker = {
      let queued = Arc::clone(&queued);
      let origin = Arc::clone(&origin);
      let chunk_len = config.chunk_len();
      let falloff_sq = config.falloff_radius_sq();
      std::thread::spawn(move || {
        worker_loop(source, job_rx, queued, origin, chunk_len, falloff_sq);
      })
    };

    Self {
      job_tx,
      queued,
      origin,
      worker: Some(worker),
    }
  }

  /// Places an order for the chunk at `pos` to be loaded and published into
  /// `chunk`. No-op if a job for `pos` is already outstanding.
  pub fn enqueue(&self, pos: ChunkPos, chunk: &Arc<Chunk>) {
    {
      let mut queued = self.queued.lock();
      if !queued.insert(pos) {
        // Already queued -> skip
        return;
      }
    }

    // The lock is released before sending: a full queue blocks here, and the
    // worker needs the queued set to make progress.
    let job = LoadJob {
      pos,
      chunk: Arc::clone(chunk),
    };
    if self.job_tx.send_blocking(job).is_err() {
      self.queued.lock().remove(&pos);
    }
  }

  /// Records the current camera chunk position for staleness checks.
  ///
  /// Takes effect for jobs not yet dequeued by the worker.
  pub fn set_origin(&self, pos: ChunkPos) {
    self.origin.store(pack_origin(pos), Ordering::Release);
  }

  /// Number of positions awaiting or undergoing a load.
  pub fn pending_jobs(&self) -> usize {
    self.queued.lock().len()
  }
}

impl Drop for ChunkLoader {
  fn drop(&mut self) {
    // Signal no-more-jobs and let the loop drain and exit.
    self.job_tx.close();
    if let Some(worker) = self.worker.take() {
      let _ = worker.join();
    }
  }
}

fn worker_loop(
  source: Arc<dyn ChunkSource>,
  job_rx: Receiver<LoadJob>,
  queued: Arc<Mutex<HashSet<ChunkPos>>>,
  origin: Arc<AtomicU64>,
  chunk_len: usize,
  falloff_sq: i64,
) {
  let mut staging: Box<[TileId]> = vec![0; chunk_len].into_boxed_slice();

  while let Ok(job) = job_rx.recv_blocking() {
    let origin = unpack_origin(origin.load(Ordering::Acquire));

    // The origin moved since enqueue: the chunk fell out of the managed
    // area, so loading it would be wasted work. Expected outcome of fast
    // camera movement, not an error.
    if squared_distance(job.pos, origin) > falloff_sq {
      queued.lock().remove(&job.pos);
      continue;
    }

    source.fill_chunk(job.pos, &mut staging);
    job.chunk.set_data(job.pos, &staging);
    queued.lock().remove(&job.pos);

    staging.fill(0);
  }
}

fn pack_origin(pos: ChunkPos) -> u64 {
  ((pos.x as u32 as u64) << 32) | (pos.y as u32 as u64)
}

fn unpack_origin(packed: u64) -> ChunkPos {
  ChunkPos::new((packed >> 32) as u32 as i32, packed as u32 as i32)
}
