//! Runtime configuration for a multiply call.
//!
//! Everything the kernels are tuned by (worker count, tile edges per cache
//! level, B layout, reduction width, scheduler, accumulation discipline) is
//! passed in here and checked by [`GemmConfig::validate`] before any work is
//! partitioned. Invalid values are rejected, never clamped.

use crate::error::{GemmError, Result};

/// Deepest supported tiling: L3, L2, L1.
pub const MAX_TILE_LEVELS: usize = 3;

/// Reduction widths accepted for the innermost sum.
pub const REDUCTION_WIDTHS: [usize; 5] = [1, 2, 4, 8, 16];

/// Square tile edges for one to three cache levels, outermost first.
///
/// Each level subdivides the tile of the level above it, so an inner edge
/// may not exceed the edge enclosing it. Edges need not divide n; boundary
/// tiles are clipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileLevels {
    sizes: [usize; MAX_TILE_LEVELS],
    depth: usize,
}

impl TileLevels {
    /// One 64-wide tile level.
    pub const SINGLE: Self = Self {
        sizes: [64, 0, 0],
        depth: 1,
    };

    /// One 128-wide tile level.
    pub const OMP: Self = Self {
        sizes: [128, 0, 0],
        depth: 1,
    };

    /// 512 (L3) / 128 (L2) / 64 (L1).
    pub const THREE_LEVEL: Self = Self {
        sizes: [512, 128, 64],
        depth: 3,
    };

    /// Builds a tiling from edges listed outermost first.
    pub fn new(sizes: &[usize]) -> Result<Self> {
        if sizes.is_empty() || sizes.len() > MAX_TILE_LEVELS {
            return Err(GemmError::TileLevelCount(sizes.len()));
        }

        let mut levels = Self {
            sizes: [0; MAX_TILE_LEVELS],
            depth: sizes.len(),
        };
        levels.sizes[..sizes.len()].copy_from_slice(sizes);
        levels.validate()?;
        Ok(levels)
    }

    /// Single-level tiling with edge `size`.
    pub fn single(size: usize) -> Result<Self> {
        Self::new(&[size])
    }

    /// Edges in use, outermost first.
    pub fn as_slice(&self) -> &[usize] {
        &self.sizes[..self.depth]
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn outermost(&self) -> usize {
        self.sizes[0]
    }

    pub fn innermost(&self) -> usize {
        self.sizes[self.depth - 1]
    }

    /// Edge of `level`, where 0 is the outermost level. `level` must be
    /// below `depth()`.
    pub(crate) fn size(&self, level: usize) -> usize {
        self.as_slice()[level]
    }

    /// Only the outermost level of this tiling.
    pub fn outer_only(&self) -> Self {
        Self {
            sizes: [self.sizes[0], 0, 0],
            depth: 1,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.depth == 0 || self.depth > MAX_TILE_LEVELS {
            return Err(GemmError::TileLevelCount(self.depth));
        }

        for (level, &size) in self.as_slice().iter().enumerate() {
            if size == 0 {
                return Err(GemmError::InvalidTileSize { level, size });
            }
        }

        for (level, pair) in self.as_slice().windows(2).enumerate() {
            if pair[1] > pair[0] {
                return Err(GemmError::TileOrder {
                    level: level + 1,
                    outer: pair[0],
                    inner: pair[1],
                });
            }
        }

        Ok(())
    }
}

impl Default for TileLevels {
    fn default() -> Self {
        Self::THREE_LEVEL
    }
}

/// How the work is scheduled across threads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Executor {
    /// One scoped OS thread per work chunk, joined before returning.
    #[default]
    Threads,
    /// Outer tiles fanned out over a rayon pool with dynamic scheduling.
    Rayon,
}

/// How partial sums are merged into C.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Accumulation {
    /// Each worker owns a disjoint band of rows of C and updates it with
    /// plain read-modify-write.
    #[default]
    RowOwned,
    /// Workers may share output cells (the k axis is split across them), so
    /// every merge is an atomic add.
    Atomic,
}

/// Configuration for one multiply call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GemmConfig {
    /// Number of worker threads. Defaults to the hardware concurrency.
    pub workers: usize,
    /// Tile edges per cache level.
    pub tiles: TileLevels,
    /// Transpose B once up front so the inner kernel reads it row-wise.
    pub transpose_b: bool,
    /// Number of independent partial sums in the innermost reduction.
    /// 1 keeps the plain left-to-right order.
    pub reduction_width: usize,
    pub executor: Executor,
    pub accumulation: Accumulation,
}

impl Default for GemmConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            tiles: TileLevels::default(),
            transpose_b: false,
            reduction_width: 1,
            executor: Executor::default(),
            accumulation: Accumulation::default(),
        }
    }
}

impl GemmConfig {
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_tiles(mut self, tiles: TileLevels) -> Self {
        self.tiles = tiles;
        self
    }

    pub fn with_transpose_b(mut self, transpose_b: bool) -> Self {
        self.transpose_b = transpose_b;
        self
    }

    pub fn with_reduction_width(mut self, width: usize) -> Self {
        self.reduction_width = width;
        self
    }

    pub fn with_executor(mut self, executor: Executor) -> Self {
        self.executor = executor;
        self
    }

    pub fn with_accumulation(mut self, accumulation: Accumulation) -> Self {
        self.accumulation = accumulation;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(GemmError::InvalidWorkers(self.workers));
        }
        self.tiles.validate()?;
        if !REDUCTION_WIDTHS.contains(&self.reduction_width) {
            return Err(GemmError::InvalidReductionWidth(self.reduction_width));
        }
        Ok(())
    }
}

/// Hardware concurrency, or 1 when it cannot be queried.
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_validate() {
        assert!(TileLevels::SINGLE.validate().is_ok());
        assert!(TileLevels::OMP.validate().is_ok());
        assert!(TileLevels::THREE_LEVEL.validate().is_ok());
        assert_eq!(TileLevels::THREE_LEVEL.as_slice(), &[512, 128, 64]);
    }

    #[test]
    fn test_tile_levels_rejects_bad_shapes() {
        assert_eq!(TileLevels::new(&[]), Err(GemmError::TileLevelCount(0)));
        assert_eq!(
            TileLevels::new(&[8, 4, 2, 1]),
            Err(GemmError::TileLevelCount(4))
        );
        assert_eq!(
            TileLevels::new(&[64, 0]),
            Err(GemmError::InvalidTileSize { level: 1, size: 0 })
        );
        assert_eq!(
            TileLevels::new(&[64, 128]),
            Err(GemmError::TileOrder {
                level: 1,
                outer: 64,
                inner: 128
            })
        );
    }

    #[test]
    fn test_tile_levels_accessors() {
        let levels = TileLevels::new(&[32, 8]).unwrap();
        assert_eq!(levels.depth(), 2);
        assert_eq!(levels.outermost(), 32);
        assert_eq!(levels.innermost(), 8);
        assert_eq!(levels.size(1), 8);
        assert_eq!(levels.outer_only().as_slice(), &[32]);
        // Equal edges at consecutive levels are allowed.
        assert!(TileLevels::new(&[16, 16, 4]).is_ok());
    }

    #[test]
    fn test_config_validation() {
        let config = GemmConfig::default();
        assert!(config.workers >= 1);
        assert!(config.validate().is_ok());

        assert_eq!(
            config.with_workers(0).validate(),
            Err(GemmError::InvalidWorkers(0))
        );
        assert_eq!(
            config.with_reduction_width(3).validate(),
            Err(GemmError::InvalidReductionWidth(3))
        );
        assert!(config.with_reduction_width(16).validate().is_ok());
    }
}
