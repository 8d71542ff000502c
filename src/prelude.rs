pub use crate::error::EpinetError;
pub use crate::log::{debug, error, info, trace, warn};
pub use crate::network::{Edge, Network, NetworkModel, NodeAttributes, NodeId};
pub use crate::parameters::{Parameters, SimulationBuilder};
pub use crate::simulation::{DayFrame, NodeView, Simulation};
pub use crate::snapshot::SimulationSnapshot;
pub use crate::state::{Day, NodeRecord, NodeState};
pub use crate::statistics::{DailyCounts, StatisticsSeries};
pub use crate::transmission::TransmissionPolicy;
pub use crate::define_rng;
