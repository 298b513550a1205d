//! State aggregation for continuous observations
//!
//! Tabular agents index their value table by state, so continuous
//! environments are wrapped in [`Discretized`], which maps every observation
//! to one cell of a uniform grid.

use super::{ContinuousStates, Environment, FiniteStates, Step};
use crate::error::{Result, RlError};

/// Uniform grid over a box of observations
///
/// # Example
///
/// ```rust
/// use reinforcelearn::env::Discretizer;
///
/// let grid = Discretizer::new(vec![0.0, 0.0], vec![1.0, 1.0], vec![2, 4]).unwrap();
/// assert_eq!(grid.n_states(), 8);
/// assert_eq!(grid.index(&[0.1, 0.1]).unwrap(), 0);
/// assert_eq!(grid.index(&[0.9, 0.9]).unwrap(), 7);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Discretizer {
    lows: Vec<f64>,
    highs: Vec<f64>,
    bins: Vec<usize>,
}

impl Discretizer {
    pub fn new(lows: Vec<f64>, highs: Vec<f64>, bins: Vec<usize>) -> Result<Self> {
        if lows.is_empty() || lows.len() != highs.len() || lows.len() != bins.len() {
            return Err(RlError::invalid(format!(
                "lows, highs and bins must have the same non-zero length, got {}, {}, {}",
                lows.len(),
                highs.len(),
                bins.len()
            )));
        }
        if bins.contains(&0) {
            return Err(RlError::invalid("every dimension needs at least one bin"));
        }
        if lows.iter().zip(&highs).any(|(lo, hi)| !(lo < hi)) {
            return Err(RlError::invalid("every low bound must be below its high bound"));
        }
        Ok(Self { lows, highs, bins })
    }

    /// Number of grid cells
    pub fn n_states(&self) -> usize {
        self.bins.iter().product()
    }

    /// Observation dimensions the grid covers
    pub fn dimensions(&self) -> usize {
        self.bins.len()
    }

    /// Cell index of `observation`; values outside the box land in the edge cells
    ///
    /// The first dimension varies slowest.
    pub fn index(&self, observation: &[f64]) -> Result<usize> {
        if observation.len() != self.bins.len() {
            return Err(RlError::invalid(format!(
                "observation has {} dimensions, expected {}",
                observation.len(),
                self.bins.len()
            )));
        }
        Ok(self.cell(observation))
    }

    /// `index` for an observation already known to have `dimensions()` entries
    fn cell(&self, observation: &[f64]) -> usize {
        debug_assert_eq!(observation.len(), self.bins.len());
        let mut index = 0;
        for (i, &x) in observation.iter().enumerate() {
            let bins = self.bins[i];
            let fraction = (x - self.lows[i]) / (self.highs[i] - self.lows[i]);
            let cell = ((fraction * bins as f64).floor().max(0.0) as usize).min(bins - 1);
            index = index * bins + cell;
        }
        index
    }
}

/// Environment adaptor that exposes a continuous environment through grid cells
pub struct Discretized<E> {
    env: E,
    grid: Discretizer,
}

impl<E> Discretized<E>
where
    E: Environment<State = Vec<f64>> + ContinuousStates,
{
    /// Wrap `env`; fails if the grid and the observations differ in dimension
    pub fn new(env: E, grid: Discretizer) -> Result<Self> {
        if env.observation_dim() != grid.dimensions() {
            return Err(RlError::invalid(format!(
                "grid covers {} dimensions but observations have {}",
                grid.dimensions(),
                env.observation_dim()
            )));
        }
        Ok(Self { env, grid })
    }

    pub fn inner(&self) -> &E {
        &self.env
    }

    pub fn grid(&self) -> &Discretizer {
        &self.grid
    }
}

impl<E> Environment for Discretized<E>
where
    E: Environment<State = Vec<f64>> + ContinuousStates,
{
    type State = usize;

    fn n_actions(&self) -> usize {
        self.env.n_actions()
    }

    fn reset(&mut self) -> usize {
        // Dimension checked against `observation_dim` in `new`
        self.grid.cell(&self.env.reset())
    }

    fn step(&mut self, action: usize) -> Result<Step<usize>> {
        let step = self.env.step(action)?;
        Ok(Step {
            state: self.grid.cell(&step.state),
            reward: step.reward,
            done: step.done,
        })
    }
}

impl<E> FiniteStates for Discretized<E>
where
    E: Environment<State = Vec<f64>> + ContinuousStates,
{
    fn n_states(&self) -> usize {
        self.grid.n_states()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::MountainCar;

    #[test]
    fn test_index_layout() {
        let grid = Discretizer::new(vec![0.0, 0.0], vec![1.0, 1.0], vec![2, 3]).unwrap();
        assert_eq!(grid.index(&[0.0, 0.0]).unwrap(), 0);
        assert_eq!(grid.index(&[0.0, 0.5]).unwrap(), 1);
        assert_eq!(grid.index(&[0.6, 0.0]).unwrap(), 3);
        assert_eq!(grid.index(&[1.0, 1.0]).unwrap(), 5);
    }

    #[test]
    fn test_out_of_box_values_clamp() {
        let grid = Discretizer::new(vec![-1.0], vec![1.0], vec![4]).unwrap();
        assert_eq!(grid.index(&[-5.0]).unwrap(), 0);
        assert_eq!(grid.index(&[5.0]).unwrap(), 3);
    }

    #[test]
    fn test_wrong_dimension_rejected() {
        let grid = Discretizer::new(vec![0.0, 0.0], vec![1.0, 1.0], vec![2, 2]).unwrap();
        assert!(grid.index(&[0.5]).is_err());
    }

    #[test]
    fn test_invalid_grids_rejected() {
        assert!(Discretizer::new(vec![0.0], vec![1.0], vec![0]).is_err());
        assert!(Discretizer::new(vec![1.0], vec![0.0], vec![2]).is_err());
        assert!(Discretizer::new(vec![0.0, 0.0], vec![1.0], vec![2]).is_err());
        assert!(Discretizer::new(vec![], vec![], vec![]).is_err());
    }

    #[test]
    fn test_discretized_mountain_car() {
        let grid = Discretizer::new(MountainCar::low(), MountainCar::high(), vec![8, 8]).unwrap();
        let mut env = Discretized::new(MountainCar::new(Some(8)), grid).unwrap();
        assert_eq!(env.inner().observation_dim(), 2);

        assert_eq!(env.n_states(), 64);
        assert_eq!(env.n_actions(), 3);

        let s = env.reset();
        assert!(s < 64);
        for _ in 0..20 {
            let step = env.step(2).unwrap();
            assert!(step.state < 64);
        }
        assert!(env.step(3).is_err());
    }

    #[test]
    fn test_grid_dimension_must_match_observations() {
        let grid = Discretizer::new(vec![0.0], vec![1.0], vec![4]).unwrap();
        let result = Discretized::new(MountainCar::new(Some(1)), grid);
        assert!(matches!(result, Err(RlError::InvalidArgument(_))));
    }
}
