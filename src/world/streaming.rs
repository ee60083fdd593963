//! Neighborhood offset table for the streaming window.
//!
//! The disc of offsets around the camera is computed once at world
//! construction and walked nearest-first on every camera move; it is never
//! recomputed per tick.

/// Returns every `(dx, dy)` offset whose squared distance from the origin is
/// at most `radius` squared, sorted ascending by squared distance.
///
/// The sort is stable over the row-major generation order (y ascending,
/// then x ascending), so offsets at equal distance are always visited in
/// that fixed order. Acquisition order matters when the pool runs close to
/// exhaustion: whichever coordinate is visited first gets a slot first.
pub(crate) fn disc_offsets(radius: u32) -> Vec<(i32, i32)> {
  let r = radius as i32;
  let max_sq = (r as i64) * (r as i64);

  let mut offsets = Vec::new();
  for dy in -r..=r {
    for dx in -r..=r {
      let sq = (dx as i64) * (dx as i64) + (dy as i64) * (dy as i64);
      if sq <= max_sq {
        offsets.push((dx, dy, sq));
      }
    }
  }

  offsets.sort_by_key(|&(_, _, sq)| sq);
  offsets.into_iter().map(|(dx, dy, _)| (dx, dy)).collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  fn sq(dx: i32, dy: i32) -> i64 {
    (dx as i64) * (dx as i64) + (dy as i64) * (dy as i64)
  }

  #[test]
  fn offsets_are_sorted_nearest_first() {
    let offsets = disc_offsets(4);
    let distances: Vec<_> = offsets.iter().map(|&(dx, dy)| sq(dx, dy)).collect();
    let mut sorted = distances.clone();
    sorted.sort();
    assert_eq!(distances, sorted);
    assert_eq!(offsets[0], (0, 0));
  }

  #[test]
  fn disc_contains_exactly_the_in_range_offsets() {
    let offsets = disc_offsets(2);
    assert!(offsets.iter().all(|&(dx, dy)| sq(dx, dy) <= 4));
    // r=2: 13 lattice points inside the closed disc.
    assert_eq!(offsets.len(), 13);
    assert!(offsets.contains(&(2, 0)));
    assert!(offsets.contains(&(0, -2)));
    assert!(!offsets.contains(&(2, 1)));
  }

  #[test]
  fn equal_distances_keep_row_major_order() {
    let offsets = disc_offsets(1);
    // Distance-1 offsets in row-major generation order.
    assert_eq!(offsets, vec![(0, 0), (0, -1), (-1, 0), (1, 0), (0, 1)]);
  }

  #[test]
  fn zero_radius_is_just_the_origin() {
    assert_eq!(disc_offsets(0), vec![(0, 0)]);
  }
}
