//! Per-node epidemiological state.
use serde::{Deserialize, Serialize};
use strum::Display;

/// The discrete simulation time unit.
pub type Day = u32;

/// The health status of a node. `Deceased` is terminal.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
pub enum NodeState {
    #[default]
    Susceptible,
    Infected,
    Recovered,
    Deceased,
}

impl NodeState {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        self == NodeState::Deceased
    }
}

/// The mutable record of one node: its state plus the timers that drive its transitions.
///
/// Timers are only meaningful while the node is in the state that set them. They are not
/// cleared on leaving that state.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub state: NodeState,
    /// Day the node last became infected.
    pub infection_day: Option<Day>,
    /// Day on or after which an infected node resolves.
    pub recovery_day: Option<Day>,
    /// Day on or after which a recovered node becomes susceptible again.
    pub immunity_until: Option<Day>,
}

impl NodeRecord {
    pub(crate) fn infect(&mut self, day: Day, recovery_day: Day) {
        self.state = NodeState::Infected;
        self.infection_day = Some(day);
        self.recovery_day = Some(recovery_day);
    }

    pub(crate) fn recover(&mut self, immunity_until: Day) {
        self.state = NodeState::Recovered;
        self.immunity_until = Some(immunity_until);
    }

    pub(crate) fn die(&mut self) {
        self.state = NodeState::Deceased;
    }

    pub(crate) fn lose_immunity(&mut self) {
        self.state = NodeState::Susceptible;
    }

    /// True when an infected node is due to resolve on `day`.
    #[must_use]
    pub fn resolves_by(&self, day: Day) -> bool {
        self.state == NodeState::Infected && self.recovery_day.is_some_and(|d| d <= day)
    }

    /// True when a recovered node's immunity has run out on `day`.
    #[must_use]
    pub fn immunity_lapsed_by(&self, day: Day) -> bool {
        self.state == NodeState::Recovered && self.immunity_until.is_some_and(|d| d <= day)
    }
}
