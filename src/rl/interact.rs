//! Agent-environment interaction loop
//!
//! Drives `reset`/`step` on an environment, asks the agent for actions and,
//! when learning is enabled, forwards every transition to `Agent::observe`.

use super::agent::Agent;
use super::buffer::Transition;
use crate::env::Environment;
use crate::error::{Result, RlError};
use tracing::debug;

/// How long to interact and whether to learn
#[derive(Debug, Clone, PartialEq)]
pub struct InteractConfig {
    /// Stop after this many environment steps in total
    pub n_steps: Option<usize>,

    /// Stop after this many finished episodes
    pub n_episodes: Option<usize>,

    /// Cut an episode off after this many steps without marking it terminal
    pub max_steps_per_episode: Option<usize>,

    /// Forward transitions to the agent's learner
    pub learn: bool,
}

impl InteractConfig {
    /// Run `n` full episodes with learning enabled
    pub fn episodes(n: usize) -> Self {
        Self {
            n_steps: None,
            n_episodes: Some(n),
            max_steps_per_episode: None,
            learn: true,
        }
    }

    /// Run `n` environment steps with learning enabled
    pub fn steps(n: usize) -> Self {
        Self {
            n_steps: Some(n),
            n_episodes: None,
            max_steps_per_episode: None,
            learn: true,
        }
    }

    pub fn with_max_steps_per_episode(mut self, max_steps: usize) -> Self {
        self.max_steps_per_episode = Some(max_steps);
        self
    }

    pub fn without_learning(mut self) -> Self {
        self.learn = false;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.n_steps.is_none() && self.n_episodes.is_none() {
            return Err(RlError::invalid(
                "interaction needs a step budget or an episode budget",
            ));
        }
        if self.max_steps_per_episode == Some(0) {
            return Err(RlError::invalid("max_steps_per_episode must be at least 1"));
        }
        Ok(())
    }
}

/// What happened during one call to [`interact`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InteractionSummary {
    /// Undiscounted return of every finished episode
    pub episode_returns: Vec<f64>,

    /// Length of every finished episode
    pub episode_lengths: Vec<usize>,

    /// Environment steps taken, including those of an unfinished episode
    pub steps: usize,

    /// Mean absolute TD error over all learning updates, if any ran
    pub mean_td_error: Option<f64>,
}

impl InteractionSummary {
    pub fn episodes(&self) -> usize {
        self.episode_returns.len()
    }

    pub fn mean_return(&self) -> f64 {
        if self.episode_returns.is_empty() {
            0.0
        } else {
            self.episode_returns.iter().sum::<f64>() / self.episode_returns.len() as f64
        }
    }
}

/// Run the agent in the environment until a budget in `config` is used up
///
/// Every call starts a fresh episode. An episode finishes when the
/// environment reports `done` or when it reaches `max_steps_per_episode`.
/// The loop stops after `n_steps` steps or `n_episodes` finished episodes,
/// whichever comes first.
///
/// # Example
///
/// ```rust
/// use reinforcelearn::env::{Gridworld, GridworldConfig};
/// use reinforcelearn::rl::{interact, Agent, AgentConfig, InteractConfig};
///
/// let mut env = Gridworld::new(GridworldConfig::default(), Some(1)).unwrap();
/// let config = AgentConfig { seed: Some(1), ..Default::default() };
/// let mut agent = Agent::for_env(config, &env).unwrap();
///
/// let summary = interact(&mut env, &mut agent, &InteractConfig::episodes(5)).unwrap();
/// assert_eq!(summary.episodes(), 5);
/// ```
pub fn interact<E>(env: &mut E, agent: &mut Agent, config: &InteractConfig) -> Result<InteractionSummary>
where
    E: Environment<State = usize>,
{
    config.validate()?;

    let mut summary = InteractionSummary::default();
    let mut td_sum = 0.0;
    let mut td_count = 0usize;

    let mut state = env.reset();
    agent.begin_episode();
    let mut episode_return = 0.0;
    let mut episode_steps = 0usize;

    let budget_spent = |summary: &InteractionSummary| {
        config.n_steps.is_some_and(|n| summary.steps >= n)
            || config.n_episodes.is_some_and(|n| summary.episodes() >= n)
    };

    loop {
        if budget_spent(&summary) {
            break;
        }

        let action = agent.act(state)?;
        let step = env.step(action)?;

        if config.learn {
            let transition = Transition::new(state, action, step.reward, step.state, step.done);
            if let Some(td) = agent.observe(&transition)? {
                td_sum += td.abs();
                td_count += 1;
            }
        }

        summary.steps += 1;
        episode_return += step.reward;
        episode_steps += 1;
        state = step.state;

        let truncated = config
            .max_steps_per_episode
            .is_some_and(|max| episode_steps >= max);

        if step.done || truncated {
            debug!(
                episode = summary.episodes() + 1,
                steps = episode_steps,
                episode_return,
                truncated = !step.done,
                "episode finished"
            );
            summary.episode_returns.push(episode_return);
            summary.episode_lengths.push(episode_steps);
            if config.learn {
                agent.end_episode();
            }
            if budget_spent(&summary) {
                break;
            }

            episode_return = 0.0;
            episode_steps = 0;
            state = env.reset();
            agent.begin_episode();
        }
    }

    if td_count > 0 {
        summary.mean_td_error = Some(td_sum / td_count as f64);
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::{Gridworld, GridworldConfig};
    use crate::rl::{AgentConfig, Policy};

    fn corridor() -> Gridworld {
        // 1x5 corridor, start on the left, goal on the right
        Gridworld::new(GridworldConfig::new(1, 5), Some(3)).unwrap()
    }

    fn agent_for(env: &Gridworld, policy: Policy) -> Agent {
        let config = AgentConfig {
            policy,
            alpha: 0.5,
            gamma: 0.9,
            seed: Some(21),
            ..Default::default()
        };
        Agent::for_env(config, env).unwrap()
    }

    #[test]
    fn test_budget_required() {
        let mut env = corridor();
        let mut agent = agent_for(&env, Policy::Random);
        let config = InteractConfig {
            n_steps: None,
            n_episodes: None,
            max_steps_per_episode: None,
            learn: true,
        };
        assert!(matches!(
            interact(&mut env, &mut agent, &config),
            Err(RlError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_step_budget() {
        let mut env = corridor();
        let mut agent = agent_for(&env, Policy::Random);

        let summary = interact(&mut env, &mut agent, &InteractConfig::steps(37)).unwrap();

        assert_eq!(summary.steps, 37);
        assert!(summary.episode_lengths.iter().sum::<usize>() <= 37);
        assert_eq!(agent.steps_trained(), 37);
    }

    #[test]
    fn test_episode_budget() {
        let mut env = corridor();
        let mut agent = agent_for(&env, Policy::Random);

        let summary = interact(&mut env, &mut agent, &InteractConfig::episodes(4)).unwrap();

        assert_eq!(summary.episodes(), 4);
        assert_eq!(summary.steps, summary.episode_lengths.iter().sum::<usize>());
        assert_eq!(agent.episodes_trained(), 4);
        for (&ret, &len) in summary.episode_returns.iter().zip(&summary.episode_lengths) {
            assert_eq!(ret, -(len as f64));
        }
    }

    #[test]
    fn test_max_steps_truncates_episodes() {
        let mut env = corridor();
        // Greedy on an all-zero table always moves left, never reaching the goal
        let mut agent = agent_for(&env, Policy::Greedy);

        let config = InteractConfig::episodes(3)
            .with_max_steps_per_episode(6)
            .without_learning();
        let summary = interact(&mut env, &mut agent, &config).unwrap();

        assert_eq!(summary.episode_lengths, vec![6, 6, 6]);
        assert_eq!(summary.steps, 18);
    }

    #[test]
    fn test_without_learning_leaves_table() {
        let mut env = corridor();
        let mut agent = agent_for(&env, Policy::Random);
        let before = agent.value_table().clone();

        let config = InteractConfig::episodes(3).without_learning();
        let summary = interact(&mut env, &mut agent, &config).unwrap();

        assert_eq!(agent.value_table(), &before);
        assert_eq!(summary.mean_td_error, None);
        assert_eq!(agent.steps_trained(), 0);
    }

    #[test]
    fn test_learning_finds_corridor_goal() {
        let mut env = corridor();
        let mut agent = agent_for(&env, Policy::EpsilonGreedy { epsilon: 0.2 });

        interact(&mut env, &mut agent, &InteractConfig::episodes(200)).unwrap();

        agent.set_policy(Policy::Greedy).unwrap();
        let config = InteractConfig::episodes(1)
            .with_max_steps_per_episode(20)
            .without_learning();
        let summary = interact(&mut env, &mut agent, &config).unwrap();

        assert_eq!(summary.episode_lengths, vec![4]);
    }

    /// Gridworld that counts its resets
    struct CountingResets {
        inner: Gridworld,
        resets: usize,
    }

    impl Environment for CountingResets {
        type State = usize;

        fn n_actions(&self) -> usize {
            self.inner.n_actions()
        }

        fn reset(&mut self) -> usize {
            self.resets += 1;
            self.inner.reset()
        }

        fn step(&mut self, action: usize) -> Result<crate::env::Step<usize>> {
            self.inner.step(action)
        }
    }

    #[test]
    fn test_no_reset_after_budget_is_spent() {
        let mut env = CountingResets {
            inner: corridor(),
            resets: 0,
        };
        let mut agent = agent_for(&env.inner, Policy::Random);

        let summary = interact(&mut env, &mut agent, &InteractConfig::episodes(3)).unwrap();
        assert_eq!(summary.episodes(), 3);
        assert_eq!(env.resets, 3);
    }

    #[test]
    fn test_split_runs_match_one_long_run() {
        let run = |chunks: &[usize]| {
            let mut env = Gridworld::new(GridworldConfig::default(), Some(21)).unwrap();
            let config = AgentConfig {
                policy: Policy::Random,
                seed: Some(21),
                ..Default::default()
            };
            let mut agent = Agent::for_env(config, &env).unwrap();
            let mut lengths = Vec::new();
            for &n in chunks {
                let summary =
                    interact(&mut env, &mut agent, &InteractConfig::episodes(n).without_learning())
                        .unwrap();
                lengths.extend(summary.episode_lengths);
            }
            lengths
        };

        assert_eq!(run(&[2, 2]), run(&[4]));
    }
}
