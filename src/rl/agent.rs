//! Tabular Q-learning agent
//!
//! The agent owns the value table, the optional eligibility trace and replay
//! memory, the behaviour policy and its random number generator. It exposes
//! the two calls the interaction loop needs: `act` to pick an action and
//! `observe` to learn from the resulting transition.

use super::buffer::{ReplayBuffer, Transition};
use super::config::AgentConfig;
use super::learner::QLearning;
use super::policy::Policy;
use super::value::{EligibilityTrace, ValueTable};
use crate::env::{Environment, FiniteStates};
use crate::error::{Result, RlError};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::debug;

/// Q-learning agent over a finite state and action space
///
/// # Example
///
/// ```rust
/// use reinforcelearn::rl::{Agent, AgentConfig, Policy, Transition};
///
/// let config = AgentConfig {
///     policy: Policy::Greedy,
///     alpha: 0.5,
///     ..Default::default()
/// };
/// let mut agent = Agent::new(config, 2, 2).unwrap();
///
/// agent.observe(&Transition::new(0, 1, 1.0, 1, true)).unwrap();
/// assert_eq!(agent.act(0).unwrap(), 1);
/// ```
pub struct Agent {
    config: AgentConfig,
    learner: QLearning,
    table: ValueTable,
    trace: Option<EligibilityTrace>,
    replay: Option<ReplayBuffer>,
    rng: StdRng,
    steps_trained: usize,
    episodes_trained: usize,
}

impl Agent {
    /// Create an agent with a fresh table of `n_states × n_actions` entries
    pub fn new(config: AgentConfig, n_states: usize, n_actions: usize) -> Result<Self> {
        if n_states == 0 || n_actions == 0 {
            return Err(RlError::invalid(format!(
                "agent needs at least one state and one action, got {}x{}",
                n_states, n_actions
            )));
        }
        let table = ValueTable::new(n_states, n_actions, config.initial_value);
        Self::from_parts(config, table)
    }

    /// Create an agent sized to an environment's state and action spaces
    pub fn for_env<E>(config: AgentConfig, env: &E) -> Result<Self>
    where
        E: Environment<State = usize> + FiniteStates,
    {
        Self::new(config, env.n_states(), env.n_actions())
    }

    /// Create an agent around an existing value table, e.g. one loaded from disk
    pub fn from_parts(config: AgentConfig, table: ValueTable) -> Result<Self> {
        config.validate()?;

        let trace = config
            .uses_traces()
            .then(|| EligibilityTrace::new(table.n_states(), table.n_actions()));
        let replay = config
            .replay
            .map(|r| ReplayBuffer::new(r.capacity))
            .transpose()?;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let learner = QLearning::new(config.alpha, config.gamma, config.lambda, config.trace_kind);

        Ok(Self {
            config,
            learner,
            table,
            trace,
            replay,
            rng,
            steps_trained: 0,
            episodes_trained: 0,
        })
    }

    /// Choose an action in `state` according to the current policy
    pub fn act(&mut self, state: usize) -> Result<usize> {
        let values = self.table.action_values(state)?;
        self.config.policy.select_action(values, &mut self.rng)
    }

    /// Learn from one transition
    ///
    /// Returns the TD error of the update (mean absolute error for replay
    /// batches), or `None` when the replay memory is still smaller than one
    /// batch.
    pub fn observe(&mut self, transition: &Transition) -> Result<Option<f64>> {
        // Reject bad indices before they reach the replay memory
        self.learner.td_error(transition, &self.table)?;
        self.steps_trained += 1;

        if let Some(replay) = self.replay.as_mut() {
            replay.push(transition.clone());
            let batch_size = self.config.replay.map_or(1, |r| r.batch_size);
            if replay.len() < batch_size {
                return Ok(None);
            }
            let batch = replay.sample(batch_size, &mut self.rng)?;
            return self.learner.update_batch(&batch, &mut self.table).map(Some);
        }

        let delta = match self.trace.as_mut() {
            Some(trace) => self.learner.update(transition, &mut self.table, trace)?,
            None => self.learner.update_step(transition, &mut self.table)?,
        };
        Ok(Some(delta))
    }

    /// Prepare for a new episode: clears the eligibility trace
    pub fn begin_episode(&mut self) {
        if let Some(trace) = self.trace.as_mut() {
            trace.reset();
        }
    }

    /// Count a finished training episode
    pub fn end_episode(&mut self) {
        self.episodes_trained += 1;
        debug!(episodes = self.episodes_trained, "episode finished");
    }

    pub fn value_table(&self) -> &ValueTable {
        &self.table
    }

    pub fn value_table_mut(&mut self) -> &mut ValueTable {
        &mut self.table
    }

    pub fn eligibility_trace(&self) -> Option<&EligibilityTrace> {
        self.trace.as_ref()
    }

    pub fn replay_memory(&self) -> Option<&ReplayBuffer> {
        self.replay.as_ref()
    }

    pub fn policy(&self) -> Policy {
        self.config.policy
    }

    /// Swap the behaviour policy, e.g. to `Policy::Greedy` for evaluation
    pub fn set_policy(&mut self, policy: Policy) -> Result<()> {
        policy.validate()?;
        self.config.policy = policy;
        Ok(())
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Transitions passed to `observe`
    pub fn steps_trained(&self) -> usize {
        self.steps_trained
    }

    pub fn episodes_trained(&self) -> usize {
        self.episodes_trained
    }

    /// Restore training counters, e.g. after loading from disk
    pub fn set_progress(&mut self, steps_trained: usize, episodes_trained: usize) {
        self.steps_trained = steps_trained;
        self.episodes_trained = episodes_trained;
    }
}
