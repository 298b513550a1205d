//! Training statistics tracking
//!
//! This module tracks training progress with rolling windows over episode
//! returns, episode lengths and TD errors.

use std::collections::VecDeque;

/// Training statistics tracker with rolling averages
///
/// # Example
///
/// ```rust
/// use reinforcelearn::metrics::TrainingStats;
///
/// let mut stats = TrainingStats::new(100);
///
/// stats.record_episode(-15.0, 15);
/// stats.record_update(0.3);
///
/// assert_eq!(stats.total_episodes(), 1);
/// println!("{}", stats.format_summary());
/// ```
#[derive(Debug, Clone)]
pub struct TrainingStats {
    /// Episode returns (rolling window)
    episode_returns: VecDeque<f64>,

    /// Episode lengths in steps (rolling window)
    episode_lengths: VecDeque<usize>,

    /// Mean absolute TD errors (rolling window)
    td_errors: VecDeque<f64>,

    /// Best episode return seen so far
    best_return: Option<f64>,

    total_episodes: usize,

    total_steps: usize,

    /// Window size for rolling averages
    window_size: usize,
}

impl TrainingStats {
    /// Create a tracker averaging over the last `window_size` values
    pub fn new(window_size: usize) -> Self {
        let window_size = window_size.max(1);
        Self {
            episode_returns: VecDeque::with_capacity(window_size),
            episode_lengths: VecDeque::with_capacity(window_size),
            td_errors: VecDeque::with_capacity(window_size),
            best_return: None,
            total_episodes: 0,
            total_steps: 0,
            window_size,
        }
    }

    /// Record the completion of an episode
    pub fn record_episode(&mut self, episode_return: f64, length: usize) {
        Self::push_deque(&mut self.episode_returns, episode_return, self.window_size);
        Self::push_deque(&mut self.episode_lengths, length, self.window_size);
        self.best_return = Some(match self.best_return {
            Some(best) => best.max(episode_return),
            None => episode_return,
        });
        self.total_episodes += 1;
        self.total_steps += length;
    }

    /// Record the TD error of a learning update (or a batch of them)
    pub fn record_update(&mut self, td_error: f64) {
        Self::push_deque(&mut self.td_errors, td_error.abs(), self.window_size);
    }

    pub fn mean_episode_return(&self) -> f64 {
        Self::mean(&self.episode_returns)
    }

    pub fn mean_episode_length(&self) -> f64 {
        if self.episode_lengths.is_empty() {
            0.0
        } else {
            self.episode_lengths.iter().sum::<usize>() as f64 / self.episode_lengths.len() as f64
        }
    }

    pub fn mean_td_error(&self) -> f64 {
        Self::mean(&self.td_errors)
    }

    pub fn best_return(&self) -> Option<f64> {
        self.best_return
    }

    pub fn total_episodes(&self) -> usize {
        self.total_episodes
    }

    pub fn total_steps(&self) -> usize {
        self.total_steps
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// One-line summary of the current statistics
    pub fn format_summary(&self) -> String {
        format!(
            "Episodes: {} | Steps: {} | Return: {:.2} | Best: {:.2} | Len: {:.1} | TD: {:.4}",
            self.total_episodes,
            self.total_steps,
            self.mean_episode_return(),
            self.best_return.unwrap_or(0.0),
            self.mean_episode_length(),
            self.mean_td_error(),
        )
    }

    fn mean(deque: &VecDeque<f64>) -> f64 {
        if deque.is_empty() {
            0.0
        } else {
            deque.iter().sum::<f64>() / deque.len() as f64
        }
    }

    fn push_deque<T>(deque: &mut VecDeque<T>, value: T, window_size: usize) {
        if deque.len() >= window_size {
            deque.pop_front();
        }
        deque.push_back(value);
    }
}
