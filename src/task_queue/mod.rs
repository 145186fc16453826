//! Task queues for shared-memory and distributed execution

pub mod dist;
pub mod queue;
mod tests;

pub use self::dist::{DistCivec, DistQueue, DistTask, Request};
pub use self::queue::{build_pool, Task, TaskQueue};
