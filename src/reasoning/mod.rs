//! Inference over a rule store
//!
//! Two resolvers share one data model and run one after the other in a session:
//!
//! - `BackwardChaining`: goal-directed, depth-first; asks a [`ValueOracle`] for the
//!   primitive variables it needs and remembers every answer
//! - `ForwardChaining`: data-driven, breadth-first; starts from what backward chaining
//!   learned and fires every rule whose premises are now bound
//!
//! # Usage
//!
//! ```ignore
//! use autodiag::{BackwardChaining, ForwardChaining, ForwardConfig, ScriptedOracle};
//!
//! let oracle = ScriptedOracle::from_pairs([("fuel", "yes"), ("spark", "no")]);
//! let mut bc = BackwardChaining::new(&store, registry, oracle);
//! let outcome = bc.solve_top_goal("issue")?;
//!
//! let mut fc = ForwardChaining::from_backward(&bc, ForwardConfig::default());
//! let forward = fc.propagate()?;
//! ```

mod strategy;
mod forward;
mod backward;
pub mod oracle;

pub use strategy::{
    DesiredValue, ForwardConfig, GoalOutcome, InferenceStats, ResolverConfig,
    DEFAULT_ROOT_VARIABLE,
};
pub use forward::{ForwardChaining, ForwardOutcome};
pub use backward::BackwardChaining;
pub use oracle::{FnOracle, OracleError, PromptOracle, ScriptedOracle, ValueOracle};
