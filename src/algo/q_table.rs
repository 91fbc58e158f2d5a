use std::collections::BTreeMap;

use log::{debug, info, trace, warn};
use rand::{rngs::StdRng, SeedableRng};

use crate::{
    config::{AgentConfig, Controls, Hyperparameters},
    decay::Decay,
    ds::QTable,
    env::{Action, Environment, Labyrinth, Position},
    exploration::Policy,
    memory::Exp,
    model::Model,
    observer::{FnObserver, Observer, Snapshot},
    report::Report,
    Result,
};

/// Every episode starts from this cell
pub const START: Position = (0, 0);

/// What the agent is currently doing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Mode {
    #[default]
    Idle,
    /// Following the training policy and updating the Q-table
    Training,
    /// Following the greedy policy without updating the Q-table
    Evaluating,
    /// The last run was cancelled
    Stopped,
}

/// How an episode ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The goal was reached
    Reached,
    /// The step cap was hit first
    Truncated,
    /// Cancellation was requested
    Cancelled,
}

/// Totals for one finished episode
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpisodeSummary {
    pub episode: u32,
    pub steps: u64,
    pub reward: f64,
    pub outcome: Outcome,
}

/// A Q-learning agent that learns to cross a [`Labyrinth`] with a Q-table
///
/// Every episode starts at [`START`] and runs until the goal is reached, the step cap is hit,
/// or [`Controls::stop`] is called. A step selects an action with the active policy, observes
/// the reward and destination, applies the one-step Q-learning update (training only), notifies
/// the observers, and only then moves the agent.
///
/// Hyperparameters live in the shared [`Controls`] and are re-read at the start of every step.
pub struct QTableAgent {
    env: Labyrinth,
    q_table: QTable,
    controls: Controls,
    episodes: u32,
    max_steps: Option<u32>,
    mode: Mode,
    episode: u32,
    position: Position,
    actions: Vec<Action>,
    last: Option<Exp<Labyrinth>>,
    report: Report,
    selected: BTreeMap<Action, u64>,
    observers: Vec<Box<dyn Observer>>,
    exploration_schedule: Option<Box<dyn Decay + Send>>,
    learning_rate_schedule: Option<Box<dyn Decay + Send>>,
    rng: StdRng,
}

impl QTableAgent {
    /// Initialize a new agent in `env`
    ///
    /// Fails with a configuration error, before anything is learned, if a parameter is out of
    /// range or the parameter its policy needs is missing.
    pub fn new(env: Labyrinth, config: AgentConfig) -> Result<Self> {
        config.validate()?;
        let q_table = QTable::new(&env)?;
        let actions = env.legal_actions(START)?;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(Self {
            env,
            q_table,
            controls: Controls::new(config.hyperparameters),
            episodes: config.episodes,
            max_steps: config.max_steps,
            mode: Mode::Idle,
            episode: 0,
            position: START,
            actions,
            last: None,
            report: Report::new(vec!["reward", "steps"]),
            selected: BTreeMap::new(),
            observers: Vec::new(),
            exploration_schedule: None,
            learning_rate_schedule: None,
            rng,
        })
    }

    /// Set the exploration rate from `schedule`, evaluated at the start of each training episode
    pub fn with_exploration_schedule(mut self, schedule: impl Decay + Send + 'static) -> Self {
        self.exploration_schedule = Some(Box::new(schedule));
        self
    }

    /// Set the learning rate from `schedule`, evaluated at the start of each training episode
    pub fn with_learning_rate_schedule(mut self, schedule: impl Decay + Send + 'static) -> Self {
        self.learning_rate_schedule = Some(Box::new(schedule));
        self
    }

    /// A handle to the agent's shared parameters and flags
    pub fn controls(&self) -> Controls {
        self.controls.clone()
    }

    pub fn add_observer(&mut self, observer: impl Observer + 'static) {
        self.observers.push(Box::new(observer));
    }

    /// Register a closure to be called after every step
    pub fn on_step<F>(&mut self, f: F)
    where
        F: FnMut(&Snapshot<'_>) + Send + 'static,
    {
        self.add_observer(FnObserver(f));
    }

    pub fn environment(&self) -> &Labyrinth {
        &self.env
    }

    pub fn q_table(&self) -> &QTable {
        &self.q_table
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Number of episodes started so far
    pub fn episode(&self) -> u32 {
        self.episode
    }

    pub fn position(&self) -> Position {
        self.position
    }

    /// Legal actions from the current position
    pub fn legal_actions(&self) -> &[Action] {
        &self.actions
    }

    /// The most recent step
    pub fn last_transition(&self) -> Option<&Exp<Labyrinth>> {
        self.last.as_ref()
    }

    /// Totals of the current or last episode
    pub fn report(&self) -> &Report {
        &self.report
    }

    /// How often each action has been taken over the agent's lifetime
    pub fn selected_actions(&self) -> &BTreeMap<Action, u64> {
        &self.selected
    }

    /// The greedy action from the current position
    pub fn best_action(&mut self) -> Result<Action> {
        Policy::Greedy.select(&self.q_table, self.position, &self.actions, &mut self.rng)
    }

    /// Select an action from the current position with the configured training policy
    pub fn select_action(&mut self) -> Result<Action> {
        let policy = self.controls.hyperparameters().policy()?;
        policy.select(&self.q_table, self.position, &self.actions, &mut self.rng)
    }

    /// Replace the labyrinth and start over with a fresh Q-table
    pub fn load_grid(&mut self, env: Labyrinth) -> Result<()> {
        let q_table = QTable::new(&env)?;
        let actions = env.legal_actions(START)?;
        info!("loaded a {}-row labyrinth, q-table reset", env.height());
        self.install(env, q_table, actions);
        Ok(())
    }

    /// Snapshot of the labyrinth and the learned values
    pub fn export_model(&self) -> Model {
        Model::new(&self.env, &self.q_table)
    }

    /// Replace the labyrinth and Q-table with a previously exported pair
    ///
    /// Fails with [`ModelMismatch`](crate::Error::ModelMismatch) if the pair is inconsistent,
    /// leaving the current model untouched.
    pub fn import_model(&mut self, model: Model) -> Result<()> {
        let (env, q_table) = model.into_parts()?;
        let actions = env.legal_actions(START)?;
        info!("imported a {}-row model", env.height());
        self.install(env, q_table, actions);
        Ok(())
    }

    fn install(&mut self, env: Labyrinth, q_table: QTable, actions: Vec<Action>) {
        self.env = env;
        self.q_table = q_table;
        self.position = START;
        self.actions = actions;
        self.last = None;
        self.report.take();
        self.mode = Mode::Idle;
    }

    /// Train if learning is enabled in the [`Controls`], evaluate otherwise
    pub fn play(&mut self) -> Result<Vec<EpisodeSummary>> {
        if self.controls.is_learning() {
            self.train()
        } else {
            self.evaluate()
        }
    }

    /// Run the configured number of training episodes
    pub fn train(&mut self) -> Result<Vec<EpisodeSummary>> {
        self.run(Mode::Training)
    }

    /// Run the configured number of greedy episodes without learning
    pub fn evaluate(&mut self) -> Result<Vec<EpisodeSummary>> {
        self.run(Mode::Evaluating)
    }

    fn run(&mut self, mode: Mode) -> Result<Vec<EpisodeSummary>> {
        info!("{mode:?} for {} episodes", self.episodes);
        self.mode = mode;

        let mut summaries = Vec::new();
        let result = self.run_episodes(mode, &mut summaries);

        self.mode = if self.controls.is_stopped() {
            warn!("{mode:?} cancelled after {} episodes", summaries.len());
            Mode::Stopped
        } else {
            Mode::Idle
        };
        result?;

        info!("finished {} episodes", summaries.len());
        Ok(summaries)
    }

    fn run_episodes(&mut self, mode: Mode, summaries: &mut Vec<EpisodeSummary>) -> Result<()> {
        for _ in 0..self.episodes {
            if self.controls.is_stopped() {
                break;
            }
            let summary = self.run_episode(mode)?;
            summaries.push(summary);
            if summary.outcome == Outcome::Cancelled {
                break;
            }
        }
        Ok(())
    }

    /// Run one training episode from the start cell
    pub fn train_episode(&mut self) -> Result<EpisodeSummary> {
        self.mode = Mode::Training;
        let summary = self.run_episode(Mode::Training);
        self.settle();
        summary
    }

    /// Run one greedy episode from the start cell without learning
    pub fn evaluate_episode(&mut self) -> Result<EpisodeSummary> {
        self.mode = Mode::Evaluating;
        let summary = self.run_episode(Mode::Evaluating);
        self.settle();
        summary
    }

    fn settle(&mut self) {
        self.mode = if self.controls.is_stopped() {
            Mode::Stopped
        } else {
            Mode::Idle
        };
    }

    fn run_episode(&mut self, mode: Mode) -> Result<EpisodeSummary> {
        if self.controls.is_stopped() {
            return Ok(EpisodeSummary {
                episode: self.episode,
                steps: 0,
                reward: 0.0,
                outcome: Outcome::Cancelled,
            });
        }
        if mode == Mode::Training {
            self.apply_schedules()?;
        }

        self.episode += 1;
        self.position = START;
        self.actions = self.env.legal_actions(START)?;
        self.report.take();

        let mut steps: u64 = 0;
        let outcome = loop {
            if self.controls.is_stopped() {
                break Outcome::Cancelled;
            }
            if self.env.is_terminal(self.position) {
                break Outcome::Reached;
            }
            if self.max_steps.is_some_and(|max| steps >= u64::from(max)) {
                break Outcome::Truncated;
            }
            self.step(mode)?;
            steps += 1;
        };

        let summary = EpisodeSummary {
            episode: self.episode,
            steps,
            reward: self.report["reward"],
            outcome,
        };
        debug!(
            "episode {}: {:?} after {} steps, reward {}",
            summary.episode, summary.outcome, summary.steps, summary.reward
        );
        Ok(summary)
    }

    fn apply_schedules(&mut self) -> Result<()> {
        let t = f64::from(self.episode);
        if let Some(schedule) = &self.exploration_schedule {
            let epsilon = schedule.evaluate(t);
            self.controls.set_exploration_rate(epsilon)?;
        }
        if let Some(schedule) = &self.learning_rate_schedule {
            let alpha = schedule.evaluate(t);
            self.controls.set_learning_rate(alpha)?;
        }
        Ok(())
    }

    fn step(&mut self, mode: Mode) -> Result<()> {
        let params = self.controls.hyperparameters();
        let policy = match mode {
            Mode::Training => params.policy()?,
            _ => Policy::Greedy,
        };

        let state = self.position;
        let action = policy.select(&self.q_table, state, &self.actions, &mut self.rng)?;
        let exp = Exp::observe(&self.env, state, action)?;
        let next_actions = self.env.legal_actions(exp.next_state)?;

        if mode == Mode::Training {
            let bootstrap: &[Action] = if self.env.is_terminal(exp.next_state) {
                &[]
            } else {
                &next_actions
            };
            self.q_table.update(
                &exp,
                bootstrap,
                params.learning_rate,
                params.discount_rate,
            )?;
        }

        trace!(
            "{:?} --{}--> {:?} ({})",
            state,
            action,
            exp.next_state,
            exp.reward
        );
        *self.selected.entry(action).or_default() += 1;
        self.report.add("steps", 1.0);
        self.report.add("reward", exp.reward);

        let next_state = exp.next_state;
        self.last = Some(exp);
        self.notify(params);

        self.position = next_state;
        self.actions = next_actions;
        Ok(())
    }

    fn notify(&mut self, hyperparameters: Hyperparameters) {
        let Some(transition) = self.last.as_ref() else {
            return;
        };
        let snapshot = Snapshot {
            mode: self.mode,
            episode: self.episode,
            position: self.position,
            transition,
            q_table: &self.q_table,
            report: &self.report,
            hyperparameters,
        };
        for observer in self.observers.iter_mut() {
            observer.notify(&snapshot);
        }
    }
}
