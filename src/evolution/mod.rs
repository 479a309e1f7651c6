pub mod backend;
pub mod engine;
pub mod launcher;
pub mod options;
pub mod state;
pub mod step;
pub mod termination;

pub use engine::{Engine, RunContext};
pub use launcher::{
    EvolutionResult, ExecutorOptimizer, ForkJoinOptimizer, Optimizer, SerialOptimizer,
};
pub use options::{
    EvolutionSettings, EvolutionSettingsBuilder, ExceptionBehavior, LockFairness, LogLevel,
    PoolReplacement,
};
pub use state::{EvolutionState, StateSnapshot};
pub use step::{ChildGeneration, DirectChildGeneration, Initialization, Iteration};
pub use termination::{FitnessAchieved, MaximumTime, TerminationCriterion, TerminationReason};
