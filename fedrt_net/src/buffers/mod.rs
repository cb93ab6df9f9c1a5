//! Bounded buffer primitives (spec.md §4.2) and the blocking priority queue built on
//! top of them (spec.md §4.3).

pub mod circular;
pub mod priority_queue;
pub mod stack_queue;

pub use circular::{BufferError, CircularBufferRaw};
pub use priority_queue::BlockingPriorityQueue;
pub use stack_queue::{StackQueueError, StackQueueRaw};
