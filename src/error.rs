//! Error types for the multiply entry points.

use thiserror::Error;

/// Everything that can make a multiply call fail.
///
/// All configuration and buffer checks run before any worker is launched,
/// so those variants never leave C partially written.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GemmError {
    #[error("matrix dimension must be positive, got {0}")]
    InvalidDimension(usize),

    #[error("worker count must be positive, got {0}")]
    InvalidWorkers(usize),

    #[error("tile edge at level {level} must be positive, got {size}")]
    InvalidTileSize { level: usize, size: usize },

    #[error("tile edge {inner} at level {level} exceeds enclosing tile edge {outer}")]
    TileOrder {
        level: usize,
        outer: usize,
        inner: usize,
    },

    #[error("expected 1 to 3 tile levels, got {0}")]
    TileLevelCount(usize),

    #[error("unsupported reduction width {0} (expected 1, 2, 4, 8 or 16)")]
    InvalidReductionWidth(usize),

    #[error("{name}: expected {n}x{n}={expected} elements, got {got}")]
    BufferSize {
        name: &'static str,
        n: usize,
        expected: usize,
        got: usize,
    },

    #[error("failed to allocate {elements} elements for {what}")]
    Allocation { what: &'static str, elements: usize },

    #[error("output buffer is not aligned for atomic access")]
    MisalignedOutput,

    #[error("failed to build worker pool: {0}")]
    ThreadPool(String),

    #[error("failed to spawn worker {worker}: {reason}")]
    WorkerSpawn { worker: usize, reason: String },

    #[error("worker {0} panicked")]
    WorkerPanicked(usize),
}

pub type Result<T> = std::result::Result<T, GemmError>;
