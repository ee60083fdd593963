//! Tile World - bounded-memory chunk streaming for large tile worlds.
//!
//! The crate keeps only a moving neighborhood of fixed-size chunks resident
//! around the camera. A fixed pool recycles chunk memory, a background
//! worker loads missing chunks from a [`ChunkSource`], and per-chunk double
//! buffering hands freshly loaded data to the consumer thread without ever
//! exposing a partially-written buffer.
//!
//! Typical per-tick usage from a single consumer (render/update) thread:
//!
//! ```no_run
//! use std::sync::Arc;
//! use tile_world::{ChunkPos, ChunkWorld, DirectorySource, StreamConfig};
//!
//! let config = StreamConfig::default();
//! let source = Arc::new(DirectorySource::new("maps/overworld", &config));
//! let mut world = ChunkWorld::new(config, source)?;
//!
//! // Once per tick, in this order:
//! world.set_camera_at(ChunkPos::new(0, 0));
//! world.apply_all_pending_changes();
//! let tiles = world.chunk_data(ChunkPos::new(0, 0));
//! # let _ = tiles;
//! # Ok::<(), tile_world::ConfigError>(())
//! ```

pub mod chunk;
pub mod config;
pub mod coords;
mod loader;
pub mod source;
pub mod world;

pub use chunk::{Chunk, TileGuard, TileId};
pub use config::{ConfigError, StreamConfig};
pub use coords::{ChunkPos, div_floor, mod_floor, squared_distance};
pub use source::{ChunkSource, DirectorySource};
pub use world::{ChunkData, ChunkWorld};
