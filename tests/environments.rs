use reinforcelearn::env::{
    Discretized, Discretizer, Environment, FiniteStates, Gridworld, GridworldConfig, MountainCar,
};
use reinforcelearn::rl::{
    Agent, AgentConfig, InteractConfig, Policy, TraceKind, interact, load_agent, save_agent,
};
use tempfile::TempDir;

fn greedy_episode<E>(env: &mut E, agent: &mut Agent, max_steps: usize) -> (f64, usize)
where
    E: Environment<State = usize>,
{
    agent.set_policy(Policy::Greedy).unwrap();
    let run = InteractConfig::episodes(1)
        .with_max_steps_per_episode(max_steps)
        .without_learning();
    let summary = interact(env, agent, &run).unwrap();
    (summary.episode_returns[0], summary.episode_lengths[0])
}

#[test]
fn q_learning_walks_around_the_cliff() {
    let mut env = Gridworld::new(GridworldConfig::cliff_walking(), Some(7)).unwrap();
    let config = AgentConfig {
        policy: Policy::EpsilonGreedy { epsilon: 0.1 },
        alpha: 0.5,
        gamma: 1.0,
        seed: Some(7),
        ..Default::default()
    };
    let mut agent = Agent::for_env(config, &env).unwrap();

    let run = InteractConfig::episodes(500).with_max_steps_per_episode(1_000);
    let summary = interact(&mut env, &mut agent, &run).unwrap();
    assert_eq!(summary.episodes(), 500);

    let (ret, len) = greedy_episode(&mut env, &mut agent, 100);
    assert!(len < 100, "greedy episode did not reach the goal");
    assert!(ret > -100.0, "greedy episode fell off the cliff: {}", ret);
}

#[test]
fn windy_gridworld_with_replacing_traces_reaches_goal() {
    let mut env = Gridworld::new(GridworldConfig::windy(), Some(3)).unwrap();
    let config = AgentConfig {
        alpha: 0.5,
        gamma: 1.0,
        lambda: 0.5,
        trace_kind: TraceKind::Replacing,
        seed: Some(3),
        ..Default::default()
    };
    let mut agent = Agent::for_env(config, &env).unwrap();

    let run = InteractConfig::episodes(300).with_max_steps_per_episode(5_000);
    interact(&mut env, &mut agent, &run).unwrap();

    let (_, len) = greedy_episode(&mut env, &mut agent, 200);
    assert!(len < 200, "greedy episode did not reach the goal");
}

#[test]
fn discretized_mountain_car_trains_and_persists() {
    let grid = Discretizer::new(MountainCar::low(), MountainCar::high(), vec![10, 10]).unwrap();
    let mut env = Discretized::new(MountainCar::new(Some(5)), grid).unwrap();
    assert_eq!(env.n_states(), 100);
    assert_eq!(env.n_actions(), 3);

    let config = AgentConfig {
        alpha: 0.2,
        gamma: 0.99,
        lambda: 0.9,
        seed: Some(5),
        ..Default::default()
    };
    let mut agent = Agent::for_env(config, &env).unwrap();

    let run = InteractConfig::episodes(5).with_max_steps_per_episode(300);
    let summary = interact(&mut env, &mut agent, &run).unwrap();
    assert_eq!(summary.episodes(), 5);
    assert!(summary.episode_lengths.iter().all(|&len| len <= 300));
    assert!(agent.value_table().as_slice().iter().any(|&v| v != 0.0));

    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("car.json");
    save_agent(&agent, &path).unwrap();

    let restored = load_agent(&path).unwrap();
    assert_eq!(restored.value_table(), agent.value_table());
    assert_eq!(restored.steps_trained(), agent.steps_trained());
    assert_eq!(restored.episodes_trained(), 5);
}
