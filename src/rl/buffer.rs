//! Experience replay memory
//!
//! This module implements a fixed-capacity replay buffer for storing transitions
//! during environment interaction and drawing uniform random minibatches from
//! them for batched learning updates.

use crate::error::{Result, RlError};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// One step of experience
///
/// Immutable once recorded: the buffer only ever hands out clones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    pub state: usize,
    pub action: usize,
    pub reward: f64,
    pub next_state: usize,
    pub done: bool,
}

impl Transition {
    pub fn new(state: usize, action: usize, reward: f64, next_state: usize, done: bool) -> Self {
        Self {
            state,
            action,
            reward,
            next_state,
            done,
        }
    }
}

/// Fixed-capacity ring buffer of transitions with uniform batch sampling
///
/// When full, pushing a transition evicts the oldest one.
///
/// # Example
///
/// ```rust
/// use reinforcelearn::rl::{ReplayBuffer, Transition};
/// use rand::{SeedableRng, rngs::StdRng};
///
/// let mut buffer = ReplayBuffer::new(2).unwrap();
/// buffer.push(Transition::new(0, 0, 1.0, 1, false));
/// buffer.push(Transition::new(1, 1, 0.0, 2, false));
/// buffer.push(Transition::new(2, 0, -1.0, 3, true));
///
/// assert_eq!(buffer.len(), 2);
///
/// let mut rng = StdRng::seed_from_u64(7);
/// let batch = buffer.sample(2, &mut rng).unwrap();
/// assert_eq!(batch.len(), 2);
/// assert!(buffer.sample(3, &mut rng).is_err());
/// ```
#[derive(Debug, Clone)]
pub struct ReplayBuffer {
    /// Stored transitions, oldest at the front
    transitions: VecDeque<Transition>,

    /// Maximum number of stored transitions
    capacity: usize,
}

impl ReplayBuffer {
    /// Create an empty buffer holding at most `capacity` transitions
    ///
    /// Fails if `capacity` is zero.
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(RlError::invalid("replay buffer capacity must be at least 1"));
        }
        Ok(Self {
            transitions: VecDeque::with_capacity(capacity),
            capacity,
        })
    }

    /// Append a transition, dropping the oldest one if the buffer is full
    pub fn push(&mut self, transition: Transition) {
        if self.transitions.len() == self.capacity {
            self.transitions.pop_front();
        }
        self.transitions.push_back(transition);
    }

    /// Draw `batch_size` distinct transitions uniformly at random
    ///
    /// The returned order is arbitrary. Fails if `batch_size` exceeds the
    /// number of stored transitions.
    pub fn sample<R: Rng + ?Sized>(&self, batch_size: usize, rng: &mut R) -> Result<Vec<Transition>> {
        let n = self.len();
        if batch_size > n {
            return Err(RlError::invalid(format!(
                "cannot sample {} transitions from a buffer holding {}",
                batch_size, n
            )));
        }

        let indices = rand::seq::index::sample(rng, n, batch_size);
        Ok(indices
            .iter()
            .map(|i| self.transitions[i].clone())
            .collect())
    }

    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.transitions.len() >= self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Iterate over stored transitions, oldest first
    pub fn iter(&self) -> impl Iterator<Item = &Transition> {
        self.transitions.iter()
    }

    pub fn clear(&mut self) {
        self.transitions.clear();
    }
}
