//! Cache-blocked traversal of the product.
//!
//! These pieces break C += A·B into tiles sized for one to three cache
//! levels, run the inner kernel on every innermost tile, and merge the
//! partial sums into C through an accumulation sink.
//!
//! - `tiles`: tile-start generation and the multi-level walk
//! - `accumulate`: row-owned and atomic merge disciplines
//! - `worker`: the loop that ties a tile walk, a kernel and a sink together

pub mod accumulate;
pub mod tiles;
pub mod worker;

pub use accumulate::{AtomicCells, OutputSink, RowBand};
pub use tiles::{BlockIter, Tile, TileIter};
pub use worker::Operands;
