//! Finite Markov decision process given by explicit transition and reward arrays

use super::{Environment, FiniteStates, Step, check_action};
use crate::error::{Result, RlError};
use crate::rl::ValueTable;
use rand::SeedableRng;
use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

/// Row sums may deviate from 1 by at most this much
const PROBABILITY_TOLERANCE: f64 = 1e-6;

/// Environment over an explicit MDP
///
/// `transitions[a][s][s']` is the probability of moving from `s` to `s'` under
/// action `a`; `rewards[s][a]` is the expected reward for taking `a` in `s`.
///
/// # Example
///
/// ```rust
/// use reinforcelearn::env::{Environment, MdpEnvironment};
///
/// // Action 0 stays, action 1 moves to the absorbing state 1
/// let transitions = vec![
///     vec![vec![1.0, 0.0], vec![0.0, 1.0]],
///     vec![vec![0.0, 1.0], vec![0.0, 1.0]],
/// ];
/// let rewards = vec![vec![0.0, 1.0], vec![0.0, 0.0]];
///
/// let mut env = MdpEnvironment::new(transitions, rewards).unwrap().with_seed(1);
/// assert_eq!(env.reset(), 0);
/// let step = env.step(1).unwrap();
/// assert_eq!((step.state, step.reward, step.done), (1, 1.0, true));
/// ```
pub struct MdpEnvironment {
    transitions: Vec<Vec<Vec<f64>>>,
    rewards: Vec<Vec<f64>>,
    terminal_states: Vec<usize>,
    initial_state: Option<usize>,
    /// One sampler per `(action, state)`, indexed `action * n_states + state`
    samplers: Vec<WeightedIndex<f64>>,
    n_states: usize,
    n_actions: usize,
    state: usize,
    rng: StdRng,
}

impl MdpEnvironment {
    /// Build an MDP, validating shapes and probabilities
    ///
    /// Terminal states default to the absorbing states, those that return to
    /// themselves with probability 1 under every action.
    pub fn new(transitions: Vec<Vec<Vec<f64>>>, rewards: Vec<Vec<f64>>) -> Result<Self> {
        let n_actions = transitions.len();
        if n_actions == 0 {
            return Err(RlError::invalid("MDP needs at least one action"));
        }
        let n_states = transitions[0].len();
        if n_states == 0 {
            return Err(RlError::invalid("MDP needs at least one state"));
        }

        let mut samplers = Vec::with_capacity(n_actions * n_states);
        for (a, matrix) in transitions.iter().enumerate() {
            if matrix.len() != n_states {
                return Err(RlError::invalid(format!(
                    "transition matrix for action {} has {} rows, expected {}",
                    a,
                    matrix.len(),
                    n_states
                )));
            }
            for (s, row) in matrix.iter().enumerate() {
                check_row(a, s, row, n_states)?;
                let sampler = WeightedIndex::new(row).map_err(|e| {
                    RlError::invalid(format!("transition row ({}, {}): {}", a, s, e))
                })?;
                samplers.push(sampler);
            }
        }

        if rewards.len() != n_states || rewards.iter().any(|r| r.len() != n_actions) {
            return Err(RlError::invalid(format!(
                "rewards must have shape [{}][{}]",
                n_states, n_actions
            )));
        }

        let terminal_states = (0..n_states)
            .filter(|&s| (0..n_actions).all(|a| transitions[a][s][s] == 1.0))
            .collect();

        Ok(Self {
            transitions,
            rewards,
            terminal_states,
            initial_state: None,
            samplers,
            n_states,
            n_actions,
            state: 0,
            rng: StdRng::from_entropy(),
        })
    }

    /// Override the default absorbing-state detection
    pub fn with_terminal_states(mut self, terminal_states: Vec<usize>) -> Result<Self> {
        if let Some(&s) = terminal_states.iter().find(|&&s| s >= self.n_states) {
            return Err(RlError::invalid(format!(
                "terminal state {} out of range (n_states = {})",
                s, self.n_states
            )));
        }
        self.terminal_states = terminal_states;
        Ok(self)
    }

    /// Start every episode in `state` instead of a random non-terminal state
    pub fn with_initial_state(mut self, state: usize) -> Result<Self> {
        if state >= self.n_states {
            return Err(RlError::invalid(format!(
                "initial state {} out of range (n_states = {})",
                state, self.n_states
            )));
        }
        self.initial_state = Some(state);
        self.state = state;
        Ok(self)
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn terminal_states(&self) -> &[usize] {
        &self.terminal_states
    }

    pub fn is_terminal(&self, state: usize) -> bool {
        self.terminal_states.contains(&state)
    }

    /// Optimal action values by value iteration
    ///
    /// Iterates the Bellman optimality backup until the largest change drops
    /// below `tolerance` or `max_iterations` sweeps have run. Terminal states
    /// keep a value of zero.
    pub fn optimal_action_values(
        &self,
        gamma: f64,
        tolerance: f64,
        max_iterations: usize,
    ) -> ValueTable {
        let mut q = ValueTable::new(self.n_states, self.n_actions, 0.0);

        for _ in 0..max_iterations {
            let v: Vec<f64> = q
                .state_values()
                .into_iter()
                .enumerate()
                .map(|(s, v)| if self.is_terminal(s) { 0.0 } else { v })
                .collect();

            let mut max_change: f64 = 0.0;
            for (i, old) in q.values_mut().iter_mut().enumerate() {
                let (s, a) = (i / self.n_actions, i % self.n_actions);
                let value = if self.is_terminal(s) {
                    0.0
                } else {
                    let expected: f64 = self.transitions[a][s]
                        .iter()
                        .zip(&v)
                        .map(|(p, v)| p * v)
                        .sum();
                    self.rewards[s][a] + gamma * expected
                };
                max_change = max_change.max((value - *old).abs());
                *old = value;
            }

            if max_change < tolerance {
                break;
            }
        }

        q
    }

    fn start_state(&mut self) -> usize {
        if let Some(s) = self.initial_state {
            return s;
        }
        let candidates: Vec<usize> = (0..self.n_states)
            .filter(|s| !self.terminal_states.contains(s))
            .collect();
        candidates.choose(&mut self.rng).copied().unwrap_or(0)
    }
}

fn check_row(action: usize, state: usize, row: &[f64], n_states: usize) -> Result<()> {
    if row.len() != n_states {
        return Err(RlError::invalid(format!(
            "transition row ({}, {}) has {} entries, expected {}",
            action,
            state,
            row.len(),
            n_states
        )));
    }
    if row.iter().any(|p| !p.is_finite() || *p < 0.0) {
        return Err(RlError::invalid(format!(
            "transition row ({}, {}) has a negative or non-finite probability",
            action, state
        )));
    }
    let sum: f64 = row.iter().sum();
    if (sum - 1.0).abs() > PROBABILITY_TOLERANCE {
        return Err(RlError::invalid(format!(
            "transition row ({}, {}) sums to {}, expected 1",
            action, state, sum
        )));
    }
    Ok(())
}

impl Environment for MdpEnvironment {
    type State = usize;

    fn n_actions(&self) -> usize {
        self.n_actions
    }

    fn reset(&mut self) -> usize {
        self.state = self.start_state();
        self.state
    }

    fn step(&mut self, action: usize) -> Result<Step<usize>> {
        check_action(action, self.n_actions)?;

        if self.is_terminal(self.state) {
            return Ok(Step {
                state: self.state,
                reward: 0.0,
                done: true,
            });
        }

        let reward = self.rewards[self.state][action];
        let next = self.samplers[action * self.n_states + self.state].sample(&mut self.rng);
        self.state = next;

        Ok(Step {
            state: next,
            reward,
            done: self.is_terminal(next),
        })
    }
}

impl FiniteStates for MdpEnvironment {
    fn n_states(&self) -> usize {
        self.n_states
    }
}
