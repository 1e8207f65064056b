//! Engine S: partition per-sample fragment files by cell type (S1), then
//! k-way merge the per-sample shards back into one sorted file per cell
//! type (S2), dispatched over a worker pool (P).

pub mod driver;
pub mod merger;
pub mod splitter;
pub mod writer;

pub use driver::{run_split_merge, sanitize_cell_type, SampleInput};
pub use merger::{merge_cell_type, ShardSource};
pub use splitter::{shard_path, split_sample};
pub use writer::FragmentWriter;
