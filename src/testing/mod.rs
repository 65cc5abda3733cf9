/// Test support shared by unit tests and benchmarks
///
/// - `memory`: in-process implementations of the repository traits

pub mod memory;

pub use memory::{FailingStore, MemoryStore};
