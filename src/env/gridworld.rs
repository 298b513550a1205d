//! Gridworld environment with optional wind, cliffs and stochastic moves
//!
//! States are cell indices numbered row-major from the top-left corner.

use super::{Environment, FiniteStates, Step, check_action};
use crate::error::{Result, RlError};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Grid moves as `(row delta, column delta)`, indexed by action
///
/// - 0: left, 1: right, 2: up, 3: down
/// - 4: left-up, 5: left-down, 6: right-up, 7: right-down (diagonal moves only)
const MOVES: [(i64, i64); 8] = [
    (0, -1),
    (0, 1),
    (-1, 0),
    (1, 0),
    (-1, -1),
    (1, -1),
    (-1, 1),
    (1, 1),
];

/// Layout and rewards of a gridworld
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridworldConfig {
    pub rows: usize,
    pub cols: usize,

    /// Terminal states
    pub goal_states: Vec<usize>,

    /// States that send the agent back with `reward_cliff`
    pub cliff_states: Vec<usize>,

    /// Where the agent lands after entering a cliff; empty means the start state
    pub cliff_transition_states: Vec<usize>,

    /// Reward for an ordinary step
    pub reward_step: f64,

    /// Reward for stepping into a cliff
    pub reward_cliff: f64,

    /// Enable the four diagonal moves
    pub diagonal_moves: bool,

    /// Upward push per column; empty for no wind
    pub wind: Vec<usize>,

    /// Probability that the chosen action is replaced by a random one
    pub stochasticity: f64,

    /// Fixed start state; `None` picks a random non-goal, non-cliff state on reset
    pub initial_state: Option<usize>,
}

impl Default for GridworldConfig {
    /// 4x4 grid with goals in two opposite corners (Sutton & Barto example 4.1)
    fn default() -> Self {
        Self {
            rows: 4,
            cols: 4,
            goal_states: vec![0, 15],
            cliff_states: Vec::new(),
            cliff_transition_states: Vec::new(),
            reward_step: -1.0,
            reward_cliff: -100.0,
            diagonal_moves: false,
            wind: Vec::new(),
            stochasticity: 0.0,
            initial_state: None,
        }
    }
}

impl GridworldConfig {
    /// Create an empty grid with a single goal in the bottom-right corner
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            goal_states: vec![(rows * cols).saturating_sub(1)],
            initial_state: Some(0),
            ..Default::default()
        }
    }

    /// Windy gridworld (Sutton & Barto example 6.5)
    pub fn windy() -> Self {
        Self {
            rows: 7,
            cols: 10,
            goal_states: vec![37],
            wind: vec![0, 0, 0, 1, 1, 1, 2, 2, 1, 0],
            initial_state: Some(30),
            ..Default::default()
        }
    }

    /// Cliff walking (Sutton & Barto example 6.6)
    pub fn cliff_walking() -> Self {
        Self {
            rows: 4,
            cols: 12,
            goal_states: vec![47],
            cliff_states: (37..=46).collect(),
            cliff_transition_states: vec![36],
            initial_state: Some(36),
            ..Default::default()
        }
    }

    pub fn n_states(&self) -> usize {
        self.rows * self.cols
    }

    pub fn n_actions(&self) -> usize {
        if self.diagonal_moves { 8 } else { 4 }
    }

    pub fn validate(&self) -> Result<()> {
        let n = self.n_states();
        if n < 2 {
            return Err(RlError::invalid(format!(
                "gridworld needs at least 2 cells, got {}x{}",
                self.rows, self.cols
            )));
        }
        if self.goal_states.is_empty() {
            return Err(RlError::invalid("gridworld needs at least one goal state"));
        }

        let listed = self
            .goal_states
            .iter()
            .chain(&self.cliff_states)
            .chain(&self.cliff_transition_states)
            .chain(self.initial_state.iter());
        for &s in listed {
            if s >= n {
                return Err(RlError::invalid(format!(
                    "state {} outside a grid of {} cells",
                    s, n
                )));
            }
        }

        if !self.wind.is_empty() && self.wind.len() != self.cols {
            return Err(RlError::invalid(format!(
                "wind has {} entries but the grid has {} columns",
                self.wind.len(),
                self.cols
            )));
        }
        if !(0.0..=1.0).contains(&self.stochasticity) {
            return Err(RlError::invalid(format!(
                "stochasticity must be in [0, 1], got {}",
                self.stochasticity
            )));
        }
        if self.initial_state.is_none() && self.start_candidates().is_empty() {
            return Err(RlError::invalid(
                "no state is available to start from: every cell is a goal or cliff",
            ));
        }

        Ok(())
    }

    fn start_candidates(&self) -> Vec<usize> {
        (0..self.n_states())
            .filter(|s| !self.goal_states.contains(s) && !self.cliff_states.contains(s))
            .collect()
    }
}

/// Gridworld environment
pub struct Gridworld {
    config: GridworldConfig,
    state: usize,
    rng: StdRng,
}

impl Gridworld {
    /// Build a gridworld; `seed` makes starts, slips and cliff landings reproducible
    pub fn new(config: GridworldConfig, seed: Option<u64>) -> Result<Self> {
        config.validate()?;
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mut env = Self {
            config,
            state: 0,
            rng,
        };
        env.state = env.start_state();
        Ok(env)
    }

    pub fn config(&self) -> &GridworldConfig {
        &self.config
    }

    /// Current state index
    pub fn state(&self) -> usize {
        self.state
    }

    /// Cell `(row, col)` of a state index
    pub fn coordinates(&self, state: usize) -> (usize, usize) {
        (state / self.config.cols, state % self.config.cols)
    }

    fn start_state(&mut self) -> usize {
        match self.config.initial_state {
            Some(s) => s,
            None => {
                let candidates = self.config.start_candidates();
                // validate() guarantees at least one candidate
                candidates.choose(&mut self.rng).copied().unwrap_or(0)
            }
        }
    }

    /// Deterministic destination of `action` from `state`, including wind
    fn destination(&self, state: usize, action: usize) -> usize {
        let (row, col) = self.coordinates(state);
        let (dr, dc) = MOVES[action];

        let max_row = self.config.rows as i64 - 1;
        let max_col = self.config.cols as i64 - 1;
        let mut new_row = (row as i64 + dr).clamp(0, max_row);
        let new_col = (col as i64 + dc).clamp(0, max_col);

        if let Some(&push) = self.config.wind.get(col) {
            new_row = (new_row - push as i64).max(0);
        }

        new_row as usize * self.config.cols + new_col as usize
    }

    fn cliff_landing(&mut self) -> usize {
        if self.config.cliff_transition_states.is_empty() {
            return self.start_state();
        }
        let landings = &self.config.cliff_transition_states;
        landings[self.rng.gen_range(0..landings.len())]
    }
}

impl Environment for Gridworld {
    type State = usize;

    fn n_actions(&self) -> usize {
        self.config.n_actions()
    }

    fn reset(&mut self) -> usize {
        self.state = self.start_state();
        self.state
    }

    fn step(&mut self, action: usize) -> Result<Step<usize>> {
        let n_actions = self.n_actions();
        check_action(action, n_actions)?;

        if self.config.goal_states.contains(&self.state) {
            return Ok(Step {
                state: self.state,
                reward: 0.0,
                done: true,
            });
        }

        let stochasticity = self.config.stochasticity;
        let action = if stochasticity > 0.0 && self.rng.gen_bool(stochasticity) {
            self.rng.gen_range(0..n_actions)
        } else {
            action
        };

        let next = self.destination(self.state, action);

        let (next, reward) = if self.config.cliff_states.contains(&next) {
            (self.cliff_landing(), self.config.reward_cliff)
        } else {
            (next, self.config.reward_step)
        };

        self.state = next;
        Ok(Step {
            state: next,
            reward,
            done: self.config.goal_states.contains(&next),
        })
    }
}

impl FiniteStates for Gridworld {
    fn n_states(&self) -> usize {
        self.config.n_states()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(config: GridworldConfig) -> Gridworld {
        Gridworld::new(config, Some(0)).unwrap()
    }

    #[test]
    fn test_default_config() {
        let config = GridworldConfig::default();
        assert_eq!(config.n_states(), 16);
        assert_eq!(config.n_actions(), 4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_random_start_avoids_goals() {
        let mut env = grid(GridworldConfig::default());
        for _ in 0..100 {
            let s = env.reset();
            assert!(s != 0 && s != 15);
        }
    }

    #[test]
    fn test_basic_moves() {
        let mut config = GridworldConfig::new(3, 3);
        config.initial_state = Some(4);
        let mut env = grid(config);

        let expected = [3, 5, 1, 7];
        for (action, &target) in expected.iter().enumerate() {
            env.reset();
            let step = env.step(action).unwrap();
            assert_eq!(step.state, target);
            assert_eq!(step.reward, -1.0);
        }
    }

    #[test]
    fn test_walls_keep_agent_in_place() {
        let mut env = grid(GridworldConfig::new(3, 3));
        env.reset();
        assert_eq!(env.step(0).unwrap().state, 0); // left at column 0
        assert_eq!(env.step(2).unwrap().state, 0); // up at row 0
    }

    #[test]
    fn test_diagonal_moves() {
        let mut config = GridworldConfig::new(3, 3);
        config.diagonal_moves = true;
        config.initial_state = Some(4);
        let mut env = grid(config);

        assert_eq!(env.n_actions(), 8);
        let expected = [0, 6, 2, 8];
        for (i, &target) in expected.iter().enumerate() {
            env.reset();
            assert_eq!(env.step(4 + i).unwrap().state, target);
        }
    }

    #[test]
    fn test_goal_terminates() {
        let mut config = GridworldConfig::new(1, 2);
        config.initial_state = Some(0);
        let mut env = grid(config);

        let step = env.step(1).unwrap();
        assert_eq!(step.state, 1);
        assert!(step.done);

        // Stepping from a terminal state changes nothing
        let again = env.step(0).unwrap();
        assert!(again.done);
        assert_eq!(again.state, 1);
        assert_eq!(again.reward, 0.0);
    }

    #[test]
    fn test_invalid_action_rejected() {
        let mut env = grid(GridworldConfig::default());
        assert!(matches!(env.step(4), Err(RlError::InvalidArgument(_))));
    }

    #[test]
    fn test_windy_pushes_up() {
        let mut env = grid(GridworldConfig::windy());
        env.reset();

        // Start at (3, 0); move right three times into the windy column 3
        env.step(1).unwrap();
        env.step(1).unwrap();
        let step = env.step(1).unwrap();
        assert_eq!(env.coordinates(step.state), (3, 3));

        // Leaving column 3 rightwards gets pushed up one row
        let step = env.step(1).unwrap();
        assert_eq!(env.coordinates(step.state), (2, 4));
    }

    #[test]
    fn test_wind_clamped_at_top() {
        let config = GridworldConfig {
            rows: 2,
            cols: 2,
            goal_states: vec![3],
            wind: vec![5, 0],
            initial_state: Some(2),
            ..Default::default()
        };
        let mut env = grid(config);
        let step = env.step(2).unwrap();
        assert_eq!(step.state, 0);
    }

    #[test]
    fn test_cliff_sends_back_to_start() {
        let mut env = grid(GridworldConfig::cliff_walking());
        env.reset();

        let step = env.step(1).unwrap();
        assert_eq!(step.state, 36);
        assert_eq!(step.reward, -100.0);
        assert!(!step.done);
    }

    #[test]
    fn test_cliff_walking_safe_path() {
        let mut env = grid(GridworldConfig::cliff_walking());
        env.reset();

        let mut total = 0.0;
        let mut path = vec![2];
        path.extend(std::iter::repeat(1).take(11));
        path.push(3);

        let mut done = false;
        for action in path {
            let step = env.step(action).unwrap();
            total += step.reward;
            done = step.done;
        }

        assert!(done);
        assert_eq!(total, -13.0);
    }

    #[test]
    fn test_full_stochasticity_still_valid() {
        let mut config = GridworldConfig::new(4, 4);
        config.stochasticity = 1.0;
        let mut env = grid(config);
        env.reset();
        for _ in 0..50 {
            let step = env.step(0).unwrap();
            assert!(step.state < 16);
            if step.done {
                env.reset();
            }
        }
    }

    #[test]
    fn test_validation_errors() {
        let mut config = GridworldConfig::default();
        config.goal_states = vec![16];
        assert!(Gridworld::new(config, None).is_err());

        let mut config = GridworldConfig::default();
        config.wind = vec![1, 2];
        assert!(config.validate().is_err());

        let mut config = GridworldConfig::default();
        config.goal_states.clear();
        assert!(config.validate().is_err());

        let config = GridworldConfig {
            rows: 1,
            cols: 1,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let mut config = GridworldConfig::default();
        config.stochasticity = 1.2;
        assert!(config.validate().is_err());
    }
}
