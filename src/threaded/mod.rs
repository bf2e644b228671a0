//! Multi-threaded execution of the blocked product.
//!
//! A [`GemmPlan`] validates the configuration and, for the thread pool,
//! partitions the parallel axis into one static chunk per worker. Execution
//! then runs either on scoped OS threads joined before returning, or as a
//! rayon fan-out over outer tiles.
//!
//! - `partition`: static split of an index range into per-worker chunks
//! - `pool`: scoped threads over row bands or k bands
//! - `fanout`: rayon tasks over row bands or outer tiles
//! - `plan`: validation, dispatch and the final join

pub mod fanout;
pub mod partition;
pub mod plan;
pub mod pool;

pub use partition::{WorkChunk, partition};
pub use plan::{GemmPlan, ParallelAxis};
