//! Tile traversal over the i/j/k index space.
//!
//! Tiles are index ranges only; nothing is copied. With three levels the
//! walk is the classic nine-deep loop nest
//!
//! ```text
//! i3 j3 k3 -> i2 j2 k2 -> i1 j1 k1
//! ```
//!
//! where each level steps by its own edge inside the current tile of the
//! level above, and every upper bound is clipped to the enclosing range.

use crate::config::{MAX_TILE_LEVELS, TileLevels};
use std::ops::Range;

const AXES: usize = 3;

/// Contiguous blocks of `size` covering `range`; the last block may be shorter.
#[derive(Debug, Clone)]
pub struct BlockIter {
    current: usize,
    end: usize,
    size: usize,
}

impl BlockIter {
    pub fn new(range: Range<usize>, size: usize) -> Self {
        assert!(size > 0, "block size must be positive");
        Self {
            current: range.start,
            end: range.end,
            size,
        }
    }
}

impl Iterator for BlockIter {
    type Item = Range<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current >= self.end {
            return None;
        }

        let start = self.current;
        let end = start.saturating_add(self.size).min(self.end);
        self.current = end;

        Some(start..end)
    }
}

/// One rectangular block of the (i, j, k) index space.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tile {
    pub i: Range<usize>,
    pub j: Range<usize>,
    pub k: Range<usize>,
}

impl Tile {
    pub fn new(i: Range<usize>, j: Range<usize>, k: Range<usize>) -> Self {
        Self { i, j, k }
    }

    /// The whole n×n×n product.
    pub fn full(n: usize) -> Self {
        Self::new(0..n, 0..n, 0..n)
    }

    /// A band of rows over the full j and k extent.
    pub fn rows(rows: Range<usize>, n: usize) -> Self {
        Self::new(rows, 0..n, 0..n)
    }

    pub fn is_empty(&self) -> bool {
        self.i.is_empty() || self.j.is_empty() || self.k.is_empty()
    }

    /// Number of (i, j, k) triples in the tile.
    pub fn volume(&self) -> usize {
        self.i.len() * self.j.len() * self.k.len()
    }

    fn axes(&self) -> [Range<usize>; AXES] {
        [self.i.clone(), self.j.clone(), self.k.clone()]
    }

    fn from_axes([i, j, k]: [Range<usize>; AXES]) -> Self {
        Self { i, j, k }
    }
}

/// Lazy walk over the innermost tiles of a multi-level tiling.
///
/// Order is i, then j, then k at every level, outer levels first. Every
/// triple inside `bounds` lands in exactly one yielded tile. The iterator
/// is deterministic and can be restarted by cloning it before use or by
/// building a new one.
#[derive(Debug, Clone)]
pub struct TileIter {
    bounds: Tile,
    levels: TileLevels,
    // Start of the current tile on each axis, per level.
    cursor: [[usize; AXES]; MAX_TILE_LEVELS],
    done: bool,
}

impl TileIter {
    pub fn new(bounds: Tile, levels: &TileLevels) -> Self {
        let done = bounds.is_empty();
        let mut iter = Self {
            bounds,
            levels: *levels,
            cursor: [[0; AXES]; MAX_TILE_LEVELS],
            done,
        };
        if !done {
            iter.reset_from(0);
        }
        iter
    }

    /// Range covered by the current tile of `level - 1`, which is the space
    /// `level` subdivides. Level 0 subdivides the full bounds.
    fn enclosing(&self, level: usize) -> [Range<usize>; AXES] {
        let mut ranges = self.bounds.axes();
        for l in 0..level {
            let size = self.levels.size(l);
            for (axis, range) in ranges.iter_mut().enumerate() {
                let start = self.cursor[l][axis];
                *range = start..start.saturating_add(size).min(range.end);
            }
        }
        ranges
    }

    /// Moves every level from `level` down to the first tile of its parent.
    fn reset_from(&mut self, level: usize) {
        for l in level..self.levels.depth() {
            let ranges = self.enclosing(l);
            for (axis, range) in ranges.iter().enumerate() {
                self.cursor[l][axis] = range.start;
            }
        }
    }

    fn advance(&mut self) {
        for level in (0..self.levels.depth()).rev() {
            let ranges = self.enclosing(level);
            let size = self.levels.size(level);

            // k is the fastest-moving axis, i the slowest.
            for axis in (0..AXES).rev() {
                self.cursor[level][axis] = self.cursor[level][axis].saturating_add(size);
                if self.cursor[level][axis] < ranges[axis].end {
                    self.reset_from(level + 1);
                    return;
                }
                self.cursor[level][axis] = ranges[axis].start;
            }
        }
        self.done = true;
    }
}

impl Iterator for TileIter {
    type Item = Tile;

    fn next(&mut self) -> Option<Tile> {
        if self.done {
            return None;
        }

        let tile = Tile::from_axes(self.enclosing(self.levels.depth()));
        self.advance();
        Some(tile)
    }
}
