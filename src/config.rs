//! Streaming configuration.
//!
//! [`StreamConfig`] fixes the chunk dimensions and streaming radii at
//! construction time; nothing here is runtime-mutable once a world exists.
//! Configs can be built in code or parsed from TOML.

use serde::{Deserialize, Serialize};

/// Sizing configuration for a streamed world.
///
/// The two radii are intentionally distinct: chunks are loaded proactively
/// within `view_radius` of the camera, but only recycled once they drift
/// past `falloff_radius`. The gap is hysteresis that keeps chunks from
/// flickering in and out when the camera oscillates across a boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
  /// Chunk width, in tiles.
  pub chunk_width: u32,
  /// Chunk height, in tiles.
  pub chunk_height: u32,
  /// How far ahead chunks are preloaded, in chunk units.
  pub view_radius: u32,
  /// How far a chunk may drift from the camera before being recycled.
  /// Must exceed `view_radius`.
  pub falloff_radius: u32,
  /// Capacity of the background load queue. A full queue applies
  /// backpressure to `set_camera_at` instead of growing memory.
  pub queue_depth: usize,
}

impl Default for StreamConfig {
  fn default() -> Self {
    Self {
      chunk_width: 9,
      chunk_height: 9,
      view_radius: 2,
      falloff_radius: 4,
      queue_depth: 100,
    }
  }
}

impl StreamConfig {
  /// Parses a config from a TOML document.
  ///
  /// Missing fields fall back to their defaults, so a partial config like
  /// `view_radius = 6` is valid on its own.
  pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
    let config: Self = toml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()))?;
    config.validate()?;
    Ok(config)
  }

  /// Checks the invariants the streaming core relies on.
  pub fn validate(&self) -> Result<(), ConfigError> {
    if self.chunk_width == 0 || self.chunk_height == 0 {
      return Err(ConfigError::ZeroChunkDimension {
        width: self.chunk_width,
        height: self.chunk_height,
      });
    }
    if self.falloff_radius <= self.view_radius {
      return Err(ConfigError::FalloffNotBeyondView {
        view: self.view_radius,
        falloff: self.falloff_radius,
      });
    }
    if self.queue_depth == 0 {
      return Err(ConfigError::ZeroQueueDepth);
    }
    Ok(())
  }

  /// Number of tiles in one chunk buffer.
  pub const fn chunk_len(&self) -> usize {
    (self.chunk_width * self.chunk_height) as usize
  }

  /// Number of chunks the pool preallocates: the area of the falloff disc,
  /// rounded up. This is the hard cap on concurrently-active chunks.
  pub fn pool_capacity(&self) -> usize {
    let f = self.falloff_radius as f64;
    (std::f64::consts::PI * f * f).ceil() as usize
  }

  /// Squared view radius, for admission checks.
  pub const fn view_radius_sq(&self) -> i64 {
    let r = self.view_radius as i64;
    r * r
  }

  /// Squared falloff radius, for eviction and stale-job checks.
  pub const fn falloff_radius_sq(&self) -> i64 {
    let f = self.falloff_radius as i64;
    f * f
  }
}

/// Validation and parse failures for [`StreamConfig`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigError {
  Parse(String),
  ZeroChunkDimension { width: u32, height: u32 },
  FalloffNotBeyondView { view: u32, falloff: u32 },
  ZeroQueueDepth,
}

impl std::fmt::Display for ConfigError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::Parse(msg) => write!(f, "config parse error: {}", msg),
      Self::ZeroChunkDimension { width, height } => {
        write!(f, "chunk dimensions must be non-zero: {}x{}", width, height)
      }
      Self::FalloffNotBeyondView { view, falloff } => write!(
        f,
        "falloff_radius ({}) must exceed view_radius ({})",
        falloff, view
      ),
      Self::ZeroQueueDepth => write!(f, "queue_depth must be non-zero"),
    }
  }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn default_config_is_valid() {
    let config = StreamConfig::default();
    assert!(config.validate().is_ok());
    assert_eq!(config.chunk_len(), 81);
  }

  #[test]
  fn pool_capacity_covers_falloff_disc() {
    let config = StreamConfig::default();
    // ceil(pi * 16) = 51
    assert_eq!(config.pool_capacity(), 51);

    let wide = StreamConfig {
      falloff_radius: 8,
      ..Default::default()
    };
    assert_eq!(wide.pool_capacity(), 202);
  }

  #[test]
  fn toml_roundtrip_preserves_fields() {
    let config = StreamConfig {
      chunk_width: 16,
      chunk_height: 16,
      view_radius: 3,
      falloff_radius: 6,
      queue_depth: 64,
    };
    let text = toml::to_string_pretty(&config).unwrap();
    let parsed = StreamConfig::from_toml_str(&text).unwrap();
    assert_eq!(parsed, config);
  }

  #[test]
  fn partial_toml_falls_back_to_defaults() {
    let parsed = StreamConfig::from_toml_str("view_radius = 3\nfalloff_radius = 7\n").unwrap();
    assert_eq!(parsed.view_radius, 3);
    assert_eq!(parsed.falloff_radius, 7);
    assert_eq!(parsed.chunk_width, 9);
  }

  #[test]
  fn validation_rejects_collapsed_radii() {
    let config = StreamConfig {
      view_radius: 4,
      falloff_radius: 4,
      ..Default::default()
    };
    assert!(matches!(
      config.validate(),
      Err(ConfigError::FalloffNotBeyondView { view: 4, falloff: 4 })
    ));
  }

  #[test]
  fn validation_rejects_zero_dimensions() {
    let config = StreamConfig {
      chunk_width: 0,
      ..Default::default()
    };
    assert!(matches!(
      config.validate(),
      Err(ConfigError::ZeroChunkDimension { .. })
    ));
  }
}
