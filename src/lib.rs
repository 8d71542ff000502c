//! Epidemic spread on synthetic social-contact networks.
//!
//! Epinet simulates an SIR-D (susceptible, infected, recovered, deceased) disease over a
//! network of individuals in discrete days. A run has three parts:
//! * A contact [`network`] is generated once (scale-free, small-world or random) and
//!   frozen. Nodes carry fixed demographic attributes and edges carry a social distance.
//! * A [`Simulation`] owns the network, the per-node epidemic state and a seeded random
//!   source. Each day resolves infections that have run their course, lets immunity wane
//!   and then spreads the disease, committing new infections only after every contact has
//!   been tried.
//! * A [`StatisticsSeries`](statistics::StatisticsSeries) records the population counts of
//!   every day, which can be exported with [`report`] or captured with [`snapshot`].
//!
//! ```
//! use epinet::prelude::*;
//!
//! let mut simulation = SimulationBuilder::default()
//!     .network_size(300)
//!     .network_param(3)
//!     .seed(7)
//!     .build()
//!     .unwrap();
//! let recorded_days = simulation.run(50).unwrap().len();
//! assert_eq!(recorded_days, simulation.current_day() as usize + 1);
//! ```
//!
//! Runs are deterministic: the same parameters and seed give the same network and the same
//! epidemic.
pub mod error;
pub mod hashing;
pub mod log;
pub mod network;
pub mod parameters;
pub mod prelude;
pub mod random;
pub mod report;
pub mod runner;
pub mod simulation;
pub mod snapshot;
pub mod state;
pub mod statistics;
pub mod transmission;

pub use error::EpinetError;
pub use crate::log::{debug, error, info, trace, warn};
pub use network::{Network, NodeId};
pub use parameters::{Parameters, SimulationBuilder};
pub use simulation::Simulation;
// Re-exported for `define_rng!`.
pub use rand;
pub use runner::run_with_args;
