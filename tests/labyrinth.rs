use std::{sync::mpsc, thread};

use labyrinth::{
    algo::{Mode, Outcome, START},
    config::{AgentConfig, Hyperparameters},
    decay::Linear,
    ds::QTable,
    env::{Cell, Environment, Labyrinth},
    exploration::PolicyKind,
    model::Model,
    observer::{ChannelObserver, Update},
    Error, QTableAgent,
};

const MAP: &str = "1,0,1,1,1\n1,1,1,0,1\n2,0,2,1,-1\n";
const GOAL: (usize, usize) = (2, 4);

fn config(episodes: u32) -> AgentConfig {
    AgentConfig {
        hyperparameters: Hyperparameters {
            policy: PolicyKind::EpsilonGreedy,
            exploration_rate: Some(0.5),
            temperature: None,
            discount_rate: 0.5,
            learning_rate: 0.5,
        },
        episodes,
        max_steps: Some(10_000),
        seed: Some(2024),
    }
}

fn trained_agent() -> QTableAgent {
    let env: Labyrinth = MAP.parse().unwrap();
    let mut agent = QTableAgent::new(env, config(500))
        .unwrap()
        .with_exploration_schedule(Linear::spanning(0.5, 0.05, 500).unwrap());
    let summaries = agent.train().unwrap();
    assert_eq!(summaries.len(), 500);
    assert!(summaries.iter().all(|s| s.outcome == Outcome::Reached));
    agent
}

#[test]
fn greedy_policy_reaches_goal_after_training() {
    let mut agent = trained_agent();

    let (tx, rx) = mpsc::channel();
    agent.add_observer(ChannelObserver::new(tx));
    let summary = agent.evaluate_episode().unwrap();

    assert_eq!(summary.outcome, Outcome::Reached);
    assert!(summary.steps <= 15, "took {} steps", summary.steps);
    assert_eq!(agent.position(), GOAL);

    let path = rx.try_iter().collect::<Vec<Update>>();
    assert_eq!(path.len() as u64, summary.steps);
    assert_eq!(path[0].position, START);
    assert_eq!(path.last().unwrap().next_position, GOAL);
    for update in &path {
        assert_eq!(update.mode, Mode::Evaluating);
        assert_eq!(
            Some(update.value),
            agent.q_table().get(update.position, update.action)
        );
        let code = agent.environment().get(update.next_position).unwrap();
        assert_ne!(code, Cell::Wall.code(), "walked into a wall at {update:?}");
    }
}

#[test]
fn fresh_table_matches_legal_actions() {
    let env: Labyrinth = MAP.parse().unwrap();
    let table = QTable::new(&env).unwrap();
    for pos in env.positions() {
        let legal = env.legal_actions(pos).unwrap();
        let cell = table.actions(pos).unwrap();
        assert!(cell.keys().copied().eq(legal.iter().copied()));
        assert!(cell.values().all(|&v| v == 0.0));
        if env.get(pos) == Some(Cell::Wall.code()) {
            assert!(legal.is_empty());
        }
    }
}

#[test]
fn exported_model_survives_round_trip() {
    let agent = trained_agent();
    let model = agent.export_model();

    let mut buf = Vec::new();
    model.to_writer(&mut buf).unwrap();
    let parsed = Model::from_reader(buf.as_slice()).unwrap();

    let mut fresh = QTableAgent::new("1,-1".parse().unwrap(), config(10)).unwrap();
    fresh.import_model(parsed).unwrap();
    assert_eq!(fresh.environment(), agent.environment());
    assert_eq!(fresh.q_table(), agent.q_table());

    fresh.controls().set_learning(false);
    let summaries = fresh.play().unwrap();
    assert!(summaries.iter().all(|s| s.outcome == Outcome::Reached));
}

#[test]
fn mismatched_import_is_rejected() {
    let mut agent = trained_agent();
    let before = agent.export_model();

    let mut model = before.clone();
    model.q_table.insert(5, model.q_table[&0].clone());
    assert!(matches!(
        agent.import_model(model),
        Err(Error::ModelMismatch { .. })
    ));
    assert_eq!(agent.export_model(), before);
}

#[test]
fn controller_on_another_thread() {
    let env: Labyrinth = MAP.parse().unwrap();
    let mut agent = QTableAgent::new(env, config(100_000)).unwrap();
    let controls = agent.controls();

    let (tx, rx) = mpsc::channel();
    agent.add_observer(ChannelObserver::new(tx));
    let worker = thread::spawn(move || {
        let summaries = agent.train();
        (agent, summaries)
    });

    for update in rx.iter() {
        if update.episode == 1 {
            controls.set_discount_rate(0.8).unwrap();
        }
        if update.episode >= 5 {
            controls.stop();
            break;
        }
    }

    let (agent, summaries) = worker.join().unwrap();
    let summaries = summaries.unwrap();
    assert_eq!(agent.mode(), Mode::Stopped);
    assert!(summaries.len() >= 4 && summaries.len() < 100_000);
    assert_eq!(agent.controls().hyperparameters().discount_rate, 0.8);
}

#[test]
fn channel_carries_updated_values() {
    let env: Labyrinth = "1,-1".parse().unwrap();
    let mut agent = QTableAgent::new(env, config(3)).unwrap();
    let (tx, rx) = mpsc::channel();
    agent.add_observer(ChannelObserver::new(tx));
    agent.train().unwrap();

    let values = rx.try_iter().map(|u| u.value).collect::<Vec<_>>();
    assert_eq!(values, [5.0, 7.5, 8.75]);
}

#[test]
fn grid_reimport_resets_learning() {
    let mut agent = trained_agent();
    let env: Labyrinth = "1,1\n0,-1".parse().unwrap();
    agent.load_grid(env.clone()).unwrap();

    assert_eq!(agent.q_table(), &QTable::new(&env).unwrap());
    let summary = agent.train_episode().unwrap();
    assert_eq!(summary.outcome, Outcome::Reached);
    assert!(summary.steps >= 2);
    assert_eq!(agent.position(), (1, 1));
}
