//! Tabular reinforcement learning
//!
//! Provides:
//! - Value tables and eligibility traces
//! - Replay memory with uniform minibatch sampling
//! - Random, greedy, epsilon-greedy and softmax policies
//! - Q-learning updates (one-step, Q(λ) and batched replay)
//! - The agent, its configuration and persistence
//! - The agent-environment interaction loop

pub mod agent;
pub mod buffer;
pub mod config;
pub mod interact;
pub mod learner;
pub mod persistence;
pub mod policy;
pub mod value;

pub use crate::error::Result;
pub use agent::Agent;
pub use buffer::{ReplayBuffer, Transition};
pub use config::{AgentConfig, ReplayConfig};
pub use interact::{InteractConfig, InteractionSummary, interact};
pub use learner::QLearning;
pub use persistence::{AgentMetadata, load_agent, load_value_table, save_agent};
pub use policy::Policy;
pub use value::{EligibilityTrace, TraceKind, ValueTable};
