//! Mountain car (Sutton & Barto example 10.1)
//!
//! An underpowered car in a valley has to rock back and forth to reach the
//! goal on the right hill. Observations are `[position, velocity]`.

use super::{ContinuousStates, Environment, Step, check_action};
use crate::error::Result;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub const MIN_POSITION: f64 = -1.2;
pub const MAX_POSITION: f64 = 0.5;
pub const MAX_SPEED: f64 = 0.07;
pub const GOAL_POSITION: f64 = 0.5;

const FORCE: f64 = 0.001;
const GRAVITY: f64 = 0.0025;

/// Mountain car with three actions: 0 reverse, 1 neutral, 2 forward
pub struct MountainCar {
    position: f64,
    velocity: f64,
    rng: StdRng,
}

impl MountainCar {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mut env = Self {
            position: -0.5,
            velocity: 0.0,
            rng,
        };
        env.reset();
        env
    }

    /// Lower observation bounds `[position, velocity]`
    pub fn low() -> Vec<f64> {
        vec![MIN_POSITION, -MAX_SPEED]
    }

    /// Upper observation bounds `[position, velocity]`
    pub fn high() -> Vec<f64> {
        vec![MAX_POSITION, MAX_SPEED]
    }

    /// Place the car at an arbitrary point, e.g. for tests
    pub fn set_state(&mut self, position: f64, velocity: f64) {
        self.position = position.clamp(MIN_POSITION, MAX_POSITION);
        self.velocity = velocity.clamp(-MAX_SPEED, MAX_SPEED);
    }

    fn observation(&self) -> Vec<f64> {
        vec![self.position, self.velocity]
    }
}

impl ContinuousStates for MountainCar {
    fn observation_dim(&self) -> usize {
        2
    }
}

impl Environment for MountainCar {
    type State = Vec<f64>;

    fn n_actions(&self) -> usize {
        3
    }

    fn reset(&mut self) -> Vec<f64> {
        self.position = self.rng.gen_range(-0.6..-0.4);
        self.velocity = 0.0;
        self.observation()
    }

    fn step(&mut self, action: usize) -> Result<Step<Vec<f64>>> {
        check_action(action, 3)?;

        let thrust = action as f64 - 1.0;
        self.velocity += thrust * FORCE - GRAVITY * (3.0 * self.position).cos();
        self.velocity = self.velocity.clamp(-MAX_SPEED, MAX_SPEED);
        self.position += self.velocity;
        self.position = self.position.clamp(MIN_POSITION, MAX_POSITION);

        if self.position <= MIN_POSITION && self.velocity < 0.0 {
            self.velocity = 0.0;
        }

        Ok(Step {
            state: self.observation(),
            reward: -1.0,
            done: self.position >= GOAL_POSITION,
        })
    }
}
