//! reinforcelearn - tabular reinforcement learning building blocks
//!
//! This library provides:
//! - Toy environments: gridworld (windy, cliff walking), explicit MDPs, mountain car (env module)
//! - Value tables, eligibility traces, replay memory, policies and Q-learning (rl module)
//! - The agent-environment interaction loop (rl::interact)
//! - Training statistics and a training mode with checkpoints (metrics, modes modules)

pub mod env;
pub mod error;
pub mod metrics;
pub mod modes;
pub mod rl;

pub use error::{Result, RlError};
