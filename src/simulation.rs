//! The epidemic engine: node state, the daily SIR-D transition and the run controller.
//!
//! A [`Simulation`] owns its network, its node records, its statistics and its random
//! streams. It moves through three stages:
//! 1. *built*: the network exists and every node is susceptible;
//! 2. *initialized*: [`Simulation::initialize_infection`] has seeded the first infections
//!    and recorded day 0;
//! 3. *running*: each call to [`Simulation::advance_one_day`] applies one day.
//!
//! [`Simulation::reset`] returns a simulation to the built stage.
use indexmap::IndexSet;
use rand::seq::index;
use rustc_hash::FxBuildHasher;
use serde::{Deserialize, Serialize};

use crate::error::EpinetError;
use crate::network::{Neighbor, Network, NodeAttributes, NodeId};
use crate::parameters::Parameters;
use crate::random::{define_rng, RandomSource};
use crate::state::{Day, NodeRecord, NodeState};
use crate::statistics::{DailyCounts, StatisticsSeries};
use crate::{debug, info, trace};

define_rng!(NetworkRng);
define_rng!(SeedingRng);
define_rng!(RecoveryRng);
define_rng!(ResolutionRng);
define_rng!(TransmissionRng);

/// One row of the node table: a node's current state next to its fixed properties.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeView {
    pub id: NodeId,
    pub state: NodeState,
    pub attributes: NodeAttributes,
    pub degree: usize,
}

/// The state of every node at the end of one day, as recorded by [`Simulation::replay`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayFrame {
    pub day: Day,
    pub states: Vec<NodeState>,
    pub counts: DailyCounts,
}

#[derive(Clone, Debug)]
pub struct Simulation {
    pub(crate) parameters: Parameters,
    pub(crate) network: Network,
    pub(crate) records: Vec<NodeRecord>,
    pub(crate) statistics: StatisticsSeries,
    pub(crate) current_day: Day,
    pub(crate) initialized: bool,
    pub(crate) last_infection_day: Day,
    pub(crate) random: RandomSource,
}

impl Simulation {
    /// Validates `parameters` and generates the network they describe.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if a parameter is out of range, the model is unknown,
    /// or the network parameter does not fit the network size.
    pub fn new(parameters: Parameters) -> Result<Self, EpinetError> {
        parameters.validate()?;
        let network_params = parameters.network_params()?;
        let mut random = RandomSource::new(parameters.seed);
        let network = network_params.generate(random.get_rng(NetworkRng))?;
        Ok(Self::assemble(parameters, network, random))
    }

    /// Validates `parameters` and runs on `network` instead of generating one.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if a parameter is out of range or the model is unknown.
    pub fn with_network(parameters: Parameters, network: Network) -> Result<Self, EpinetError> {
        parameters.validate()?;
        let random = RandomSource::new(parameters.seed);
        Ok(Self::assemble(parameters, network, random))
    }

    fn assemble(parameters: Parameters, network: Network, random: RandomSource) -> Self {
        Simulation {
            records: vec![NodeRecord::default(); network.node_count()],
            parameters,
            network,
            statistics: StatisticsSeries::new(),
            current_day: 0,
            initialized: false,
            last_infection_day: 0,
            random,
        }
    }

    fn draw_recovery_day(&mut self, day: Day) -> Day {
        let (min, max) = self.parameters.recovery_days;
        // Saturates: an illness that outlasts the calendar never resolves.
        day.saturating_add(self.random.sample_range(RecoveryRng, min..=max))
    }

    fn record_day(&mut self) {
        let counts = DailyCounts::tally(self.current_day, &self.records);
        debug!(
            "day {}: S={} I={} R={} D={}",
            counts.day, counts.susceptible, counts.infected, counts.recovered, counts.deceased
        );
        self.statistics.push(counts);
    }

    /// Makes every node susceptible, infects a uniformly chosen
    /// `floor(initial_infected_percent * node_count)` of them and records day 0.
    ///
    /// # Errors
    ///
    /// Returns `EpinetError::InvalidState` if the simulation is already initialized.
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn initialize_infection(&mut self) -> Result<(), EpinetError> {
        if self.initialized {
            return Err(EpinetError::InvalidState(
                "infection already initialized; reset the simulation first".to_string(),
            ));
        }
        let node_count = self.network.node_count();
        let initial = (self.parameters.initial_infected_percent * node_count as f64).floor() as usize;
        if initial > node_count {
            return Err(EpinetError::InvalidState(format!(
                "cannot infect {initial} of {node_count} nodes"
            )));
        }

        self.random.reseed_for_day(0);
        self.records.fill(NodeRecord::default());
        let chosen = self
            .random
            .sample(SeedingRng, |rng| index::sample(rng, node_count, initial));
        for node in chosen {
            let recovery_day = self.draw_recovery_day(0);
            self.records[node].infect(0, recovery_day);
        }

        self.current_day = 0;
        self.last_infection_day = 0;
        self.statistics.clear();
        self.initialized = true;
        info!("Initialized {initial} infections among {node_count} nodes");
        self.record_day();
        Ok(())
    }

    /// Simulates one day and returns whether anyone was newly infected.
    ///
    /// Infected nodes whose illness has run its course die or recover first, and nodes whose
    /// immunity lapsed revert to susceptibility. Only then does the disease spread. Infections
    /// drawn today take effect after every contact has been tried, so a node infected today
    /// cannot pass it on until tomorrow.
    ///
    /// # Errors
    ///
    /// Returns `EpinetError::InvalidState` if the infection was never initialized.
    pub fn advance_one_day(&mut self) -> Result<bool, EpinetError> {
        if !self.initialized {
            return Err(EpinetError::InvalidState(
                "initialize_infection must be called before advancing".to_string(),
            ));
        }
        let day = self.current_day.checked_add(1).ok_or_else(|| {
            EpinetError::InvalidState(format!("cannot advance past day {}", Day::MAX))
        })?;
        self.current_day = day;
        self.random.reseed_for_day(day);

        trace!("day {day}: resolving infections and waning immunity");
        self.resolve_infections(day);
        trace!("day {day}: transmission");
        let candidates = self.transmission_candidates();
        let mut infected_today = 0;
        for node in candidates {
            if self.records[node.0].state == NodeState::Susceptible {
                let recovery_day = self.draw_recovery_day(day);
                self.records[node.0].infect(day, recovery_day);
                infected_today += 1;
            }
        }
        if infected_today > 0 {
            self.last_infection_day = day;
        }

        self.record_day();
        Ok(infected_today > 0)
    }

    // A node that recovers today keeps its immunity at least until tomorrow, even with an
    // immunity period of 0.
    fn resolve_infections(&mut self, day: Day) {
        let mortality_rate = self.parameters.mortality_rate;
        let immunity_period = self.parameters.immunity_period;
        for record in &mut self.records {
            if record.resolves_by(day) {
                if self.random.sample_unit(ResolutionRng) < mortality_rate {
                    record.die();
                } else {
                    record.recover(day.saturating_add(immunity_period));
                }
            } else if record.immunity_lapsed_by(day) {
                record.lose_immunity();
            }
        }
    }

    // Every susceptible neighbor of an infected node gets one trial per infected contact.
    // Successes are collected, not applied.
    fn transmission_candidates(&mut self) -> IndexSet<NodeId, FxBuildHasher> {
        let policy = self.parameters.transmission_policy;
        let base = self.parameters.infection_probability;
        let nodes = self.network.nodes();
        let mut candidates = IndexSet::default();
        for (source, record) in self.records.iter().enumerate() {
            if record.state != NodeState::Infected {
                continue;
            }
            for &Neighbor { node, weight } in self.network.neighbors(NodeId(source)) {
                if self.records[node.0].state != NodeState::Susceptible {
                    continue;
                }
                let probability = policy.probability(base, &nodes[source], &nodes[node.0], weight);
                if self.random.sample_unit(TransmissionRng) < probability {
                    candidates.insert(node);
                }
            }
        }
        candidates
    }

    fn stalled(&self, infected_today: bool) -> bool {
        let max_recovery = self.parameters.max_recovery_days();
        !infected_today
            && self.current_day > max_recovery
            && self.current_day - self.last_infection_day > max_recovery
    }

    fn infected_now(&self) -> usize {
        self.statistics.latest().map_or(0, |counts| counts.infected)
    }

    /// Initializes if needed, then advances up to `max_days` days. Stops early once nobody
    /// is infected, or once no infection has happened for longer than the longest illness.
    ///
    /// # Errors
    ///
    /// Propagates errors from initialization.
    pub fn run(&mut self, max_days: Day) -> Result<&StatisticsSeries, EpinetError> {
        if !self.initialized {
            self.initialize_infection()?;
        }
        for _ in 0..max_days {
            if self.infected_now() == 0 {
                info!("No infections left on day {}", self.current_day);
                break;
            }
            let infected_today = self.advance_one_day()?;
            if self.stalled(infected_today) {
                info!(
                    "No new infections since day {}; stopping on day {}",
                    self.last_infection_day, self.current_day
                );
                break;
            }
        }
        info!("Run finished on day {}", self.current_day);
        Ok(&self.statistics)
    }

    /// Advances up to `days` days, initializing first if needed, and stops as soon as nobody
    /// is infected. Returns the summary of the last simulated day.
    ///
    /// # Errors
    ///
    /// Propagates errors from initialization.
    pub fn advance_days(&mut self, days: Day) -> Result<DailyCounts, EpinetError> {
        if !self.initialized {
            self.initialize_infection()?;
        }
        for _ in 0..days {
            if self.infected_now() == 0 {
                break;
            }
            self.advance_one_day()?;
        }
        Ok(self.summary())
    }

    /// Returns the simulation to its freshly built state. The network is kept.
    pub fn reset(&mut self) {
        self.records.fill(NodeRecord::default());
        self.statistics.clear();
        self.current_day = 0;
        self.last_infection_day = 0;
        self.initialized = false;
        self.random.reseed_for_day(0);
    }

    /// Reruns this simulation from scratch on a clone and records `days` frames, frame 0
    /// being the initial infection. `self` is not modified.
    ///
    /// # Errors
    ///
    /// Propagates errors from initialization.
    pub fn replay(&self, days: Day) -> Result<Vec<DayFrame>, EpinetError> {
        let mut replay = self.clone();
        replay.reset();
        let mut frames = Vec::new();
        if days == 0 {
            return Ok(frames);
        }
        replay.initialize_infection()?;
        frames.push(replay.frame());
        for _ in 1..days {
            replay.advance_one_day()?;
            frames.push(replay.frame());
        }
        Ok(frames)
    }

    fn frame(&self) -> DayFrame {
        DayFrame {
            day: self.current_day,
            states: self.records.iter().map(|record| record.state).collect(),
            counts: self.summary(),
        }
    }

    /// The counts of the current day.
    #[must_use]
    pub fn summary(&self) -> DailyCounts {
        DailyCounts::tally(self.current_day, &self.records)
    }

    #[must_use]
    pub fn current_day(&self) -> Day {
        self.current_day
    }

    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// The day of the most recent infection; 0 if nobody has been infected since day 0.
    #[must_use]
    pub fn last_infection_day(&self) -> Day {
        self.last_infection_day
    }

    #[must_use]
    pub fn node_state(&self, node: NodeId) -> Option<NodeState> {
        self.records.get(node.0).map(|record| record.state)
    }

    /// The state and timers of `node`.
    #[must_use]
    pub fn node_record(&self, node: NodeId) -> Option<&NodeRecord> {
        self.records.get(node.0)
    }

    #[must_use]
    pub fn records(&self) -> &[NodeRecord] {
        &self.records
    }

    #[must_use]
    pub fn degree(&self, node: NodeId) -> Option<usize> {
        self.network.degree(node)
    }

    #[must_use]
    pub fn neighbors(&self, node: NodeId) -> &[Neighbor] {
        self.network.neighbors(node)
    }

    #[must_use]
    pub fn statistics(&self) -> &StatisticsSeries {
        &self.statistics
    }

    #[must_use]
    pub fn network(&self) -> &Network {
        &self.network
    }

    #[must_use]
    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    /// One row per node, in id order.
    #[must_use]
    pub fn node_views(&self) -> Vec<NodeView> {
        self.network
            .node_ids()
            .zip(&self.records)
            .map(|(id, record)| NodeView {
                id,
                state: record.state,
                attributes: self.network.nodes()[id.0],
                degree: self.network.degree(id).unwrap_or(0),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::{Edge, NetworkModel};
    use crate::parameters::SimulationBuilder;
    use crate::transmission::TransmissionPolicy;

    fn line(n: usize, weight: f64) -> Network {
        let edges = (1..n).map(|i| Edge {
            source: NodeId(i - 1),
            target: NodeId(i),
            weight,
        });
        Network::from_parts(vec![NodeAttributes::default(); n], edges).unwrap()
    }

    fn small() -> SimulationBuilder {
        SimulationBuilder::default()
            .network_size(200)
            .network_param(3)
            .initial_infected_percent(0.05)
            .seed(11)
    }

    #[test]
    fn built_simulation_is_all_susceptible() {
        let simulation = small().build().unwrap();
        assert!(!simulation.is_initialized());
        assert_eq!(simulation.current_day(), 0);
        assert!(simulation.statistics().is_empty());
        assert_eq!(simulation.summary().susceptible, 200);
        assert_eq!(simulation.node_state(NodeId(0)), Some(NodeState::Susceptible));
        assert_eq!(simulation.node_state(NodeId(200)), None);
    }

    #[test]
    fn initialize_infects_floor_of_fraction() {
        let mut simulation = small().initial_infected_percent(0.033).build().unwrap();
        simulation.initialize_infection().unwrap();
        let counts = simulation.statistics().latest().unwrap();
        assert_eq!(counts.day, 0);
        assert_eq!(counts.infected, 6);
        assert_eq!(counts.susceptible, 194);
        for record in simulation.records() {
            if record.state == NodeState::Infected {
                assert_eq!(record.infection_day, Some(0));
                let recovery_day = record.recovery_day.unwrap();
                assert!((7..=14).contains(&recovery_day));
            }
        }
    }

    #[test]
    fn initialize_twice_fails() {
        let mut simulation = small().build().unwrap();
        simulation.initialize_infection().unwrap();
        let err = simulation.initialize_infection().unwrap_err();
        assert!(err.is_state_error());
        assert_eq!(simulation.statistics().len(), 1);
    }

    #[test]
    fn advance_before_initialize_fails() {
        let mut simulation = small().build().unwrap();
        assert!(matches!(
            simulation.advance_one_day(),
            Err(EpinetError::InvalidState(_))
        ));
        assert_eq!(simulation.current_day(), 0);
    }

    #[test]
    fn new_infections_wait_a_day() {
        // A certain transmission along a line: the infection front moves one hop per day.
        let mut simulation = SimulationBuilder::default()
            .infection_probability(1.0)
            .initial_infected_percent(0.0)
            .recovery_days((20, 20))
            .build_with_network(line(5, 0.5))
            .unwrap();
        simulation.initialize_infection().unwrap();
        simulation.records[0].infect(0, 20);

        assert!(simulation.advance_one_day().unwrap());
        assert_eq!(simulation.node_state(NodeId(1)), Some(NodeState::Infected));
        assert_eq!(simulation.node_state(NodeId(2)), Some(NodeState::Susceptible));
        assert_eq!(simulation.node_record(NodeId(1)).unwrap().infection_day, Some(1));

        assert!(simulation.advance_one_day().unwrap());
        assert_eq!(simulation.node_state(NodeId(2)), Some(NodeState::Infected));
        assert_eq!(simulation.node_state(NodeId(3)), Some(NodeState::Susceptible));
        assert_eq!(simulation.last_infection_day(), 2);
    }

    #[test]
    fn resolution_happens_before_transmission() {
        let mut simulation = SimulationBuilder::default()
            .infection_probability(1.0)
            .initial_infected_percent(0.0)
            .mortality_rate(0.0)
            .recovery_days((1, 1))
            .build_with_network(line(2, 0.5))
            .unwrap();
        simulation.initialize_infection().unwrap();
        simulation.records[0].infect(0, 1);

        // Node 0 recovers on day 1 before it gets a chance to infect node 1.
        assert!(!simulation.advance_one_day().unwrap());
        assert_eq!(simulation.node_state(NodeId(0)), Some(NodeState::Recovered));
        assert_eq!(simulation.node_state(NodeId(1)), Some(NodeState::Susceptible));
        assert_eq!(simulation.node_record(NodeId(0)).unwrap().immunity_until, Some(61));
    }

    #[test]
    fn immunity_period_at_day_limit_never_wanes() {
        let mut simulation = SimulationBuilder::default()
            .infection_probability(0.0)
            .initial_infected_percent(0.0)
            .mortality_rate(0.0)
            .recovery_days((1, 1))
            .immunity_period(Day::MAX)
            .build_with_network(line(3, 0.5))
            .unwrap();
        simulation.initialize_infection().unwrap();
        simulation.records[0].infect(0, 1);

        simulation.advance_one_day().unwrap();
        let record = simulation.node_record(NodeId(0)).unwrap();
        assert_eq!(record.state, NodeState::Recovered);
        assert_eq!(record.immunity_until, Some(Day::MAX));
        for _ in 0..5 {
            simulation.advance_one_day().unwrap();
        }
        assert_eq!(simulation.node_state(NodeId(0)), Some(NodeState::Recovered));
    }

    #[test]
    fn recovery_days_at_day_limit_never_resolve() {
        let mut simulation = SimulationBuilder::default()
            .infection_probability(1.0)
            .initial_infected_percent(0.5)
            .recovery_days((Day::MAX - 1, Day::MAX))
            .build_with_network(line(4, 0.5))
            .unwrap();
        simulation.initialize_infection().unwrap();
        for _ in 0..3 {
            simulation.advance_one_day().unwrap();
        }
        assert_eq!(simulation.summary().infected, 4);
        for record in simulation.records() {
            let recovery_day = record.recovery_day.unwrap();
            assert!(recovery_day >= Day::MAX - 1);
        }
        let infected_on_day_1 = simulation
            .records()
            .iter()
            .find(|record| record.infection_day == Some(1))
            .unwrap();
        assert_eq!(infected_on_day_1.recovery_day, Some(Day::MAX));
    }

    #[test]
    fn advancing_past_last_day_fails() {
        let mut simulation = small().build().unwrap();
        simulation.initialize_infection().unwrap();
        simulation.current_day = Day::MAX;
        assert!(matches!(
            simulation.advance_one_day(),
            Err(EpinetError::InvalidState(_))
        ));
        assert_eq!(simulation.current_day(), Day::MAX);
    }

    #[test]
    fn demographic_policy_spreads() {
        let mut simulation = small()
            .infection_probability(0.9)
            .transmission_policy(TransmissionPolicy::Demographic)
            .build()
            .unwrap();
        simulation.run(30).unwrap();
        let peak = simulation.statistics().infected().iter().max().copied();
        assert!(peak.unwrap() > 10);
    }

    #[test]
    fn run_stops_when_infection_dies_out() {
        let mut simulation = small().mortality_rate(1.0).infection_probability(0.0).build().unwrap();
        let series = simulation.run(100).unwrap();
        let last = series.latest().unwrap();
        assert_eq!(last.infected, 0);
        assert_eq!(last.deceased, 10);
        assert!(last.day <= 14);
        assert_eq!(series.len(), last.day as usize + 1);
    }

    #[test]
    fn advance_days_initializes_and_summarizes() {
        let mut simulation = small().build().unwrap();
        let summary = simulation.advance_days(3).unwrap();
        assert!(simulation.is_initialized());
        assert_eq!(summary.day, 3);
        assert_eq!(summary.total(), 200);
        assert_eq!(simulation.statistics().len(), 4);
    }

    #[test]
    fn reset_returns_to_built() {
        let mut simulation = small().build().unwrap();
        simulation.run(10).unwrap();
        simulation.reset();
        assert!(!simulation.is_initialized());
        assert_eq!(simulation.current_day(), 0);
        assert!(simulation.statistics().is_empty());
        assert_eq!(simulation.summary().susceptible, 200);
        simulation.initialize_infection().unwrap();
    }

    #[test]
    fn replay_leaves_original_untouched() {
        let mut simulation = small().build().unwrap();
        simulation.advance_days(5).unwrap();
        let before = simulation.statistics().clone();

        let frames = simulation.replay(8).unwrap();
        assert_eq!(frames.len(), 8);
        assert_eq!(frames[0].day, 0);
        assert_eq!(frames[7].day, 7);
        assert_eq!(frames[0].states.len(), 200);
        // A replay retraces the same days as the original run.
        for (frame, counts) in frames.iter().zip(before.iter()) {
            assert_eq!(frame.counts, counts);
        }

        assert_eq!(simulation.statistics(), &before);
        assert_eq!(simulation.current_day(), 5);
        assert!(simulation.replay(0).unwrap().is_empty());
    }

    #[test]
    fn node_views_follow_node_order() {
        let simulation = SimulationBuilder::default()
            .network_model(NetworkModel::SmallWorld.to_string())
            .network_size(10)
            .network_param(2)
            .build()
            .unwrap();
        let views = simulation.node_views();
        assert_eq!(views.len(), 10);
        for (i, view) in views.iter().enumerate() {
            assert_eq!(view.id, NodeId(i));
            assert_eq!(view.state, NodeState::Susceptible);
            assert_eq!(Some(view.degree), simulation.degree(view.id));
            assert_eq!(&view.attributes, simulation.network().attributes(view.id).unwrap());
        }
    }
}
