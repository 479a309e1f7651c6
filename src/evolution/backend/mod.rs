//! Concurrency back-ends: how the per-index work of initialization and
//! iteration is spread over threads.
//!
//! | Back-end | Pool lock | Scheduling |
//! |----------|-----------|------------|
//! | [`serial`] | `NoOpPoolLock` | plain loop on the calling thread |
//! | [`executor`] | `ReadWritePoolLock` | one task per index on a thread pool, latch barrier |
//! | [`fork_join`] | `ReadWritePoolLock` | recursive range splitting with work stealing |

pub mod executor;
pub mod fork_join;
pub mod serial;

pub use executor::{CountDownLatch, ExecutorInitialization, ExecutorIteration};
pub use fork_join::{
    ForkJoinConfiguration, ForkJoinInitialization, ForkJoinIteration, ParallelChildGeneration,
};
pub use serial::{SerialInitialization, SerialIteration};
