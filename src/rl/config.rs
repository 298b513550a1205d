//! Agent hyperparameter configuration

use super::policy::Policy;
use super::value::TraceKind;
use crate::error::{Result, RlError};
use serde::{Deserialize, Serialize};

/// Experience replay settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReplayConfig {
    /// Maximum number of stored transitions
    pub capacity: usize,

    /// Transitions sampled per learning update
    pub batch_size: usize,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            capacity: 10_000,
            batch_size: 32,
        }
    }
}

/// Configuration for a tabular Q-learning agent
///
/// Loadable from JSON; missing fields fall back to the defaults.
///
/// # Example
///
/// ```rust
/// use reinforcelearn::rl::{AgentConfig, Policy};
///
/// let config: AgentConfig = serde_json::from_str(
///     r#"{"alpha": 0.5, "lambda": 0.8, "policy": {"type": "softmax", "temperature": 1.0}}"#,
/// ).unwrap();
///
/// assert_eq!(config.alpha, 0.5);
/// assert_eq!(config.gamma, 0.99);
/// assert_eq!(config.policy, Policy::Softmax { temperature: 1.0 });
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Behaviour policy used by `Agent::act`
    ///
    /// Default: epsilon-greedy with epsilon 0.1
    pub policy: Policy,

    /// Learning rate α
    ///
    /// Default: 0.1
    pub alpha: f64,

    /// Discount factor γ
    ///
    /// Default: 0.99
    pub gamma: f64,

    /// Eligibility trace decay λ; 0 disables traces
    ///
    /// Default: 0.0
    pub lambda: f64,

    /// Accumulating or replacing traces
    pub trace_kind: TraceKind,

    /// Value every table entry starts at
    ///
    /// Default: 0.0
    pub initial_value: f64,

    /// Learn from sampled minibatches instead of each transition
    pub replay: Option<ReplayConfig>,

    /// Seed for the agent's action-selection and sampling RNG
    pub seed: Option<u64>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            policy: Policy::default(),
            alpha: 0.1,
            gamma: 0.99,
            lambda: 0.0,
            trace_kind: TraceKind::Accumulating,
            initial_value: 0.0,
            replay: None,
            seed: None,
        }
    }
}

impl AgentConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether updates go through an eligibility trace
    pub fn uses_traces(&self) -> bool {
        self.lambda > 0.0 && self.replay.is_none()
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("alpha", self.alpha),
            ("gamma", self.gamma),
            ("lambda", self.lambda),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(RlError::invalid(format!(
                    "{} must be in [0, 1], got {}",
                    name, value
                )));
            }
        }

        if !self.initial_value.is_finite() {
            return Err(RlError::invalid("initial_value must be finite"));
        }

        self.policy.validate()?;

        if let Some(replay) = &self.replay {
            if replay.capacity == 0 {
                return Err(RlError::invalid("replay capacity must be at least 1"));
            }
            if replay.batch_size == 0 {
                return Err(RlError::invalid("replay batch_size must be at least 1"));
            }
            if replay.batch_size > replay.capacity {
                return Err(RlError::invalid(format!(
                    "replay batch_size ({}) cannot exceed capacity ({})",
                    replay.batch_size, replay.capacity
                )));
            }
            if self.lambda > 0.0 {
                return Err(RlError::invalid(
                    "eligibility traces (lambda > 0) cannot be combined with experience replay",
                ));
            }
        }

        Ok(())
    }
}
