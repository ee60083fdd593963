//! Coordinate types and integer math helpers.
//!
//! Defines the coordinate system for the streamed world:
//! - [`ChunkPos`]: Chunk grid position (i32), the cache key
//! - [`div_floor`] / [`mod_floor`]: Floored integer division and modulo,
//!   used everywhere pixel or tile positions are bucketed into chunks
//! - [`squared_distance`]: Distance metric for view/falloff radius checks

/// Position in the chunk grid.
///
/// Coordinates are in chunk units, not pixels or tiles. Equality and hashing
/// are value-based so a `ChunkPos` can serve as a cache key.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ChunkPos {
  pub x: i32,
  pub y: i32,
}

impl ChunkPos {
  /// Creates a new chunk position.
  pub const fn new(x: i32, y: i32) -> Self {
    Self { x, y }
  }

  /// Returns the chunk containing the given world pixel position.
  ///
  /// `chunk_px` is the chunk edge length in pixels. Uses floor division so
  /// that negative world coordinates bucket correctly: pixel -1 lands in
  /// chunk -1, not chunk 0.
  pub fn from_world(world_x: i64, world_y: i64, chunk_px: i64) -> Self {
    Self {
      x: world_x.div_euclid(chunk_px) as i32,
      y: world_y.div_euclid(chunk_px) as i32,
    }
  }

  /// Offsets this position by `(dx, dy)` chunk units.
  pub const fn offset(self, dx: i32, dy: i32) -> Self {
    Self {
      x: self.x + dx,
      y: self.y + dy,
    }
  }
}

impl std::fmt::Display for ChunkPos {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "({}, {})", self.x, self.y)
  }
}

/// Divides two integers, rounding the result toward negative infinity.
///
/// Equivalent to `(a as f64 / b as f64).floor() as i32` without leaving
/// integer arithmetic.
pub const fn div_floor(a: i32, b: i32) -> i32 {
  a.div_euclid(b)
}

/// Remainder of [`div_floor`]; always in `0..b` for positive `b`.
///
/// For example `mod_floor(-1, 9) == 8`, matching the tile index of pixel -1
/// inside chunk -1.
pub const fn mod_floor(a: i32, b: i32) -> i32 {
  a.rem_euclid(b)
}

/// Squared Euclidean distance between two chunk positions.
///
/// Widened to i64 so radius comparisons cannot overflow near the edges of
/// the i32 coordinate space.
pub fn squared_distance(a: ChunkPos, b: ChunkPos) -> i64 {
  let dx = (b.x as i64) - (a.x as i64);
  let dy = (b.y as i64) - (a.y as i64);
  dx * dx + dy * dy
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn div_floor_rounds_toward_negative_infinity() {
    assert_eq!(div_floor(-1, 9), -1);
    assert_eq!(div_floor(0, 9), 0);
    assert_eq!(div_floor(8, 9), 0);
    assert_eq!(div_floor(9, 9), 1);
    assert_eq!(div_floor(-9, 9), -1);
    assert_eq!(div_floor(-10, 9), -2);
  }

  #[test]
  fn mod_floor_is_always_non_negative() {
    assert_eq!(mod_floor(-1, 9), 8);
    assert_eq!(mod_floor(0, 9), 0);
    assert_eq!(mod_floor(8, 9), 8);
    assert_eq!(mod_floor(9, 9), 0);
    assert_eq!(mod_floor(-9, 9), 0);
  }

  #[test]
  fn floored_division_identity_holds() {
    for a in -100..=100 {
      for b in 1..=12 {
        let q = div_floor(a, b);
        let r = mod_floor(a, b);
        assert_eq!(q * b + r, a, "identity failed for a={}, b={}", a, b);
        assert!((0..b).contains(&r), "remainder out of range for a={}, b={}", a, b);
      }
    }
  }

  #[test]
  fn squared_distance_is_symmetric() {
    let a = ChunkPos::new(-3, 4);
    let b = ChunkPos::new(2, -1);
    assert_eq!(squared_distance(a, b), 50);
    assert_eq!(squared_distance(b, a), 50);
    assert_eq!(squared_distance(a, a), 0);
  }

  #[test]
  fn from_world_handles_negative_coordinates() {
    // 9x9 chunks of 32px tiles -> 288px per chunk edge
    assert_eq!(ChunkPos::from_world(0, 0, 288), ChunkPos::new(0, 0));
    assert_eq!(ChunkPos::from_world(287, 287, 288), ChunkPos::new(0, 0));
    assert_eq!(ChunkPos::from_world(288, 0, 288), ChunkPos::new(1, 0));
    assert_eq!(ChunkPos::from_world(-1, -288, 288), ChunkPos::new(-1, -1));
    assert_eq!(ChunkPos::from_world(-289, 0, 288), ChunkPos::new(-2, 0));
  }
}
