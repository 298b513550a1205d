//! Environments and the contract the interaction loop drives
//!
//! Any type implementing [`Environment`] can be used with
//! [`crate::rl::interact`]. Tabular agents additionally need the state space
//! size from [`FiniteStates`].

pub mod discretize;
pub mod gridworld;
pub mod mdp;
pub mod mountain_car;

pub use discretize::{Discretized, Discretizer};
pub use gridworld::{Gridworld, GridworldConfig};
pub use mdp::MdpEnvironment;
pub use mountain_car::MountainCar;

use crate::error::{Result, RlError};

/// Outcome of one environment step
#[derive(Debug, Clone, PartialEq)]
pub struct Step<S> {
    pub state: S,
    pub reward: f64,
    pub done: bool,
}

/// Episodic environment with a discrete action space
pub trait Environment {
    type State: Clone;

    /// Number of actions; valid actions are `0..n_actions()`
    fn n_actions(&self) -> usize;

    /// Start a new episode and return its initial state
    fn reset(&mut self) -> Self::State;

    /// Apply `action` and return the next state, reward and termination flag
    ///
    /// Fails with `InvalidArgument` if the action is outside the action space.
    fn step(&mut self, action: usize) -> Result<Step<Self::State>>;
}

/// Environment whose states are the indices `0..n_states()`
pub trait FiniteStates {
    fn n_states(&self) -> usize;
}

/// Environment whose observations are real vectors of a fixed length
pub trait ContinuousStates {
    fn observation_dim(&self) -> usize;
}

/// Shared action-space check for `Environment::step` implementations
pub(crate) fn check_action(action: usize, n_actions: usize) -> Result<()> {
    if action >= n_actions {
        return Err(RlError::invalid(format!(
            "action {} outside action space of size {}",
            action, n_actions
        )));
    }
    Ok(())
}
