//! Training mode for tabular Q-learning agents
//!
//! Runs episodes through the interaction loop, tracks statistics, logs
//! progress and periodically saves checkpoints.
//!
//! # Example
//!
//! ```rust,ignore
//! use reinforcelearn::env::{Gridworld, GridworldConfig};
//! use reinforcelearn::modes::{TrainConfig, TrainMode};
//! use std::path::PathBuf;
//!
//! let env = Gridworld::new(GridworldConfig::windy(), None)?;
//! let config = TrainConfig::new(500, PathBuf::from("models/windy.json"));
//!
//! let mut train_mode = TrainMode::new(env, config)?;
//! train_mode.run()?;
//! ```

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::env::{Environment, FiniteStates};
use crate::metrics::TrainingStats;
use crate::rl::{Agent, AgentConfig, InteractConfig, InteractionSummary, Policy, interact, save_agent};

/// Configuration for training mode
#[derive(Debug, Clone)]
pub struct TrainConfig {
    /// Number of episodes to train
    pub num_episodes: usize,

    /// Path to save the final agent
    pub save_path: PathBuf,

    /// Save a checkpoint every N episodes; 0 disables checkpoints
    pub checkpoint_frequency: usize,

    /// Log training progress every N episodes
    pub log_frequency: usize,

    /// Truncate episodes that run longer than this
    pub max_steps_per_episode: Option<usize>,

    /// Agent hyperparameters
    pub agent: AgentConfig,
}

impl TrainConfig {
    /// Create a training configuration with defaults
    pub fn new(num_episodes: usize, save_path: PathBuf) -> Self {
        Self {
            num_episodes,
            save_path,
            checkpoint_frequency: 1000,
            log_frequency: 100,
            max_steps_per_episode: Some(10_000),
            agent: AgentConfig::default(),
        }
    }
}

/// Training session for one agent in one environment
pub struct TrainMode<E> {
    agent: Agent,
    env: E,
    stats: TrainingStats,
    config: TrainConfig,
    current_episode: usize,
}

impl<E> TrainMode<E>
where
    E: Environment<State = usize> + FiniteStates,
{
    pub fn new(env: E, config: TrainConfig) -> Result<Self> {
        let agent =
            Agent::for_env(config.agent.clone(), &env).context("Failed to create agent")?;

        // 100-episode rolling window
        let stats = TrainingStats::new(100);

        Ok(Self {
            agent,
            env,
            stats,
            config,
            current_episode: 0,
        })
    }

    /// Continue training an already trained agent
    pub fn with_agent(env: E, agent: Agent, config: TrainConfig) -> Self {
        Self {
            agent,
            env,
            stats: TrainingStats::new(100),
            config,
            current_episode: 0,
        }
    }

    /// Train for the configured number of episodes, then save the agent
    pub fn run(&mut self) -> Result<()> {
        self.log_header();

        for episode in 0..self.config.num_episodes {
            self.current_episode = episode;

            let summary = self.run_episode()?;
            for (&ret, &len) in summary.episode_returns.iter().zip(&summary.episode_lengths) {
                self.stats.record_episode(ret, len);
            }
            if let Some(td) = summary.mean_td_error {
                self.stats.record_update(td);
            }

            if self.config.log_frequency > 0 && (episode + 1) % self.config.log_frequency == 0 {
                info!(
                    "[Episode {}/{}] {}",
                    episode + 1,
                    self.config.num_episodes,
                    self.stats.format_summary()
                );
            }

            if self.config.checkpoint_frequency > 0
                && (episode + 1) % self.config.checkpoint_frequency == 0
            {
                self.save_checkpoint()?;
            }
        }

        save_agent(&self.agent, &self.config.save_path).with_context(|| {
            format!("Failed to save final agent to {:?}", self.config.save_path)
        })?;

        info!("Training complete, agent saved to {:?}", self.config.save_path);
        info!("Final statistics: {}", self.stats.format_summary());

        Ok(())
    }

    /// Run greedy episodes without learning
    pub fn evaluate(&mut self, n_episodes: usize) -> Result<InteractionSummary> {
        let behaviour = self.agent.policy();
        self.agent.set_policy(Policy::Greedy)?;

        let mut config = InteractConfig::episodes(n_episodes).without_learning();
        config.max_steps_per_episode = self.config.max_steps_per_episode;
        let result = interact(&mut self.env, &mut self.agent, &config);

        self.agent.set_policy(behaviour)?;
        Ok(result?)
    }

    pub fn agent(&self) -> &Agent {
        &self.agent
    }

    pub fn stats(&self) -> &TrainingStats {
        &self.stats
    }

    fn run_episode(&mut self) -> Result<InteractionSummary> {
        let mut config = InteractConfig::episodes(1);
        config.max_steps_per_episode = self.config.max_steps_per_episode;
        interact(&mut self.env, &mut self.agent, &config)
            .with_context(|| format!("Episode {} failed", self.current_episode + 1))
    }

    fn save_checkpoint(&self) -> Result<()> {
        let checkpoint_path = self
            .config
            .save_path
            .parent()
            .unwrap_or(Path::new("."))
            .join(format!("checkpoint_ep{}.json", self.current_episode + 1));

        save_agent(&self.agent, &checkpoint_path)
            .with_context(|| format!("Failed to save checkpoint to {:?}", checkpoint_path))?;

        info!("Checkpoint saved: {:?}", checkpoint_path);
        Ok(())
    }

    fn log_header(&self) {
        let agent = &self.config.agent;
        info!(
            episodes = self.config.num_episodes,
            states = self.env.n_states(),
            actions = self.env.n_actions(),
            "Q-learning training"
        );
        info!(
            alpha = agent.alpha,
            gamma = agent.gamma,
            lambda = agent.lambda,
            policy = ?agent.policy,
            replay = ?agent.replay,
            "Agent config"
        );
    }
}
