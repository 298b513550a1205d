use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use reinforcelearn::env::{Discretized, Discretizer, Gridworld, GridworldConfig, MountainCar};
use reinforcelearn::modes::{TrainConfig, TrainMode};
use reinforcelearn::rl::{AgentConfig, Policy, ReplayConfig, TraceKind};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "reinforcelearn")]
#[command(version, about = "Tabular Q-learning on toy environments")]
struct Cli {
    /// Environment to train on
    #[arg(long, value_enum, default_value = "gridworld")]
    env: EnvKind,

    /// Number of training episodes
    #[arg(long, default_value = "500")]
    episodes: usize,

    /// Behaviour policy
    #[arg(long, value_enum, default_value = "epsilon-greedy")]
    policy: PolicyKind,

    /// Exploration rate for epsilon-greedy
    #[arg(long, default_value = "0.1")]
    epsilon: f64,

    /// Temperature for softmax
    #[arg(long, default_value = "1.0")]
    temperature: f64,

    /// Learning rate
    #[arg(long, default_value = "0.1")]
    alpha: f64,

    /// Discount factor
    #[arg(long, default_value = "0.99")]
    gamma: f64,

    /// Eligibility trace decay (0 disables traces)
    #[arg(long, default_value = "0.0")]
    lambda: f64,

    /// Use replacing instead of accumulating traces
    #[arg(long)]
    replacing_traces: bool,

    /// Enable experience replay with this memory size
    #[arg(long)]
    replay_capacity: Option<usize>,

    /// Minibatch size for experience replay
    #[arg(long, default_value = "32")]
    batch_size: usize,

    /// Truncate episodes after this many steps
    #[arg(long, default_value = "10000")]
    max_steps: usize,

    /// Grid cells per dimension when discretizing mountain car
    #[arg(long, default_value = "20")]
    bins: usize,

    /// Seed for the agent and environment
    #[arg(long)]
    seed: Option<u64>,

    /// Where to save the trained agent
    #[arg(long, default_value = "models/agent.json")]
    save: PathBuf,

    /// Agent configuration as JSON; overrides the agent flags
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log progress every N episodes
    #[arg(long, default_value = "50")]
    log_frequency: usize,

    /// Save a checkpoint every N episodes (0 disables)
    #[arg(long, default_value = "0")]
    checkpoint_frequency: usize,

    /// Greedy evaluation episodes to run after training
    #[arg(long, default_value = "1")]
    eval_episodes: usize,
}

#[derive(Clone, Copy, ValueEnum)]
enum EnvKind {
    /// 4x4 gridworld with two terminal corners
    Gridworld,
    /// 7x10 windy gridworld
    WindyGridworld,
    /// 4x12 cliff walking
    CliffWalking,
    /// Mountain car on a uniform state grid
    MountainCar,
}

#[derive(Clone, Copy, ValueEnum)]
enum PolicyKind {
    Random,
    Greedy,
    EpsilonGreedy,
    Softmax,
}

impl Cli {
    fn agent_config(&self) -> Result<AgentConfig> {
        if let Some(path) = &self.config {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read agent config {:?}", path))?;
            let mut config: AgentConfig =
                serde_json::from_str(&json).context("Failed to parse agent config")?;
            if config.seed.is_none() {
                config.seed = self.seed;
            }
            return Ok(config);
        }

        let policy = match self.policy {
            PolicyKind::Random => Policy::Random,
            PolicyKind::Greedy => Policy::Greedy,
            PolicyKind::EpsilonGreedy => Policy::EpsilonGreedy {
                epsilon: self.epsilon,
            },
            PolicyKind::Softmax => Policy::Softmax {
                temperature: self.temperature,
            },
        };

        Ok(AgentConfig {
            policy,
            alpha: self.alpha,
            gamma: self.gamma,
            lambda: self.lambda,
            trace_kind: if self.replacing_traces {
                TraceKind::Replacing
            } else {
                TraceKind::Accumulating
            },
            replay: self.replay_capacity.map(|capacity| ReplayConfig {
                capacity,
                batch_size: self.batch_size,
            }),
            seed: self.seed,
            ..Default::default()
        })
    }

    fn train_config(&self) -> Result<TrainConfig> {
        let mut config = TrainConfig::new(self.episodes, self.save.clone());
        config.agent = self.agent_config()?;
        config.agent.validate().context("Invalid agent configuration")?;
        config.log_frequency = self.log_frequency;
        config.checkpoint_frequency = self.checkpoint_frequency;
        config.max_steps_per_episode = Some(self.max_steps);
        Ok(config)
    }
}

fn train<E>(env: E, config: TrainConfig, eval_episodes: usize) -> Result<()>
where
    E: reinforcelearn::env::Environment<State = usize> + reinforcelearn::env::FiniteStates,
{
    let mut train_mode = TrainMode::new(env, config)?;
    train_mode.run()?;

    if eval_episodes > 0 {
        let summary = train_mode.evaluate(eval_episodes)?;
        info!(
            episodes = summary.episodes(),
            mean_return = summary.mean_return(),
            lengths = ?summary.episode_lengths,
            "Greedy evaluation"
        );
    }
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = cli.train_config()?;

    match cli.env {
        EnvKind::Gridworld => {
            let env = Gridworld::new(GridworldConfig::default(), cli.seed)?;
            train(env, config, cli.eval_episodes)
        }
        EnvKind::WindyGridworld => {
            let env = Gridworld::new(GridworldConfig::windy(), cli.seed)?;
            train(env, config, cli.eval_episodes)
        }
        EnvKind::CliffWalking => {
            let env = Gridworld::new(GridworldConfig::cliff_walking(), cli.seed)?;
            train(env, config, cli.eval_episodes)
        }
        EnvKind::MountainCar => {
            let grid = Discretizer::new(
                MountainCar::low(),
                MountainCar::high(),
                vec![cli.bins, cli.bins],
            )?;
            let env = Discretized::new(MountainCar::new(cli.seed), grid)?;
            train(env, config, cli.eval_episodes)
        }
    }
}
