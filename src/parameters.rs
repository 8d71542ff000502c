//! Simulation parameters and the builder that turns them into a [`Simulation`].
//!
//! ```
//! use epinet::prelude::*;
//!
//! let simulation = SimulationBuilder::default()
//!     .network_model("small_world")
//!     .network_size(200)
//!     .network_param(4)
//!     .infection_probability(0.2)
//!     .build()
//!     .unwrap();
//! assert_eq!(simulation.network().node_count(), 200);
//! ```
use std::fs;
use std::path::Path;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::error::EpinetError;
use crate::network::{Network, NetworkModel, NetworkParams};
use crate::simulation::Simulation;
use crate::state::Day;
use crate::transmission::TransmissionPolicy;

/// The epidemiological and network-generation parameters of a run.
///
/// Setters on [`SimulationBuilder`] take `&self` and return a new builder, so a partially
/// configured builder can be reused as a template.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Builder)]
#[builder(
    name = "SimulationBuilder",
    pattern = "immutable",
    build_fn(name = "build_parameters", error = "EpinetError"),
    derive(Debug)
)]
#[serde(default, deny_unknown_fields)]
pub struct Parameters {
    /// Base probability of transmission per contact per day, in `[0, 1]`.
    #[builder(default = "0.3")]
    pub infection_probability: f64,

    /// Inclusive range of days from infection to resolution.
    #[builder(default = "(7, 14)")]
    pub recovery_days: (Day, Day),

    /// Fraction of nodes infected on day 0, in `[0, 1]`.
    #[builder(default = "0.01")]
    pub initial_infected_percent: f64,

    /// Probability that a resolving infection is fatal, in `[0, 1]`.
    #[builder(default = "0.02")]
    pub mortality_rate: f64,

    /// Days a recovered node stays immune.
    #[builder(default = "60")]
    pub immunity_period: Day,

    /// Name of the network model; see [`NetworkModel`].
    #[builder(setter(into), default = "NetworkModel::ScaleFree.to_string()")]
    pub network_model: String,

    #[builder(default = "1000")]
    pub network_size: usize,

    #[builder(default = "5")]
    pub network_param: usize,

    #[builder(default = "1.0")]
    pub social_distance_factor: f64,

    #[builder(default)]
    pub transmission_policy: TransmissionPolicy,

    /// Base seed for every random stream of the run.
    #[builder(default = "0")]
    pub seed: u64,
}

impl Default for Parameters {
    fn default() -> Self {
        Parameters {
            infection_probability: 0.3,
            recovery_days: (7, 14),
            initial_infected_percent: 0.01,
            mortality_rate: 0.02,
            immunity_period: 60,
            network_model: NetworkModel::ScaleFree.to_string(),
            network_size: 1000,
            network_param: 5,
            social_distance_factor: 1.0,
            transmission_policy: TransmissionPolicy::default(),
            seed: 0,
        }
    }
}

fn check_probability(name: &str, value: f64) -> Result<(), EpinetError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(EpinetError::InvalidConfiguration(format!(
            "{name} must be in [0, 1], got {value}"
        )))
    }
}

impl Parameters {
    /// Checks every epidemiological constraint and that the network model is known.
    ///
    /// # Errors
    ///
    /// Returns `EpinetError::InvalidConfiguration` for an out-of-range value and
    /// `EpinetError::UnknownModel` for an unrecognized network model.
    pub fn validate(&self) -> Result<(), EpinetError> {
        check_probability("infection_probability", self.infection_probability)?;
        check_probability("initial_infected_percent", self.initial_infected_percent)?;
        check_probability("mortality_rate", self.mortality_rate)?;

        let (min, max) = self.recovery_days;
        if min == 0 || min > max {
            return Err(EpinetError::InvalidConfiguration(format!(
                "recovery_days must satisfy 1 <= min <= max, got ({min}, {max})"
            )));
        }
        if !(self.social_distance_factor.is_finite() && self.social_distance_factor > 0.0) {
            return Err(EpinetError::InvalidConfiguration(format!(
                "social_distance_factor must be positive, got {}",
                self.social_distance_factor
            )));
        }
        NetworkModel::parse(&self.network_model)?;
        Ok(())
    }

    /// The network-generation part of the parameters, validated against each other.
    ///
    /// # Errors
    ///
    /// Returns `EpinetError::UnknownModel` or `EpinetError::InvalidConfiguration` if the
    /// model is unknown or its parameter does not fit the network size.
    pub fn network_params(&self) -> Result<NetworkParams, EpinetError> {
        let model = NetworkModel::parse(&self.network_model)?;
        model.check_param(self.network_size, self.network_param)?;
        Ok(NetworkParams {
            model,
            node_count: self.network_size,
            param: self.network_param,
            social_distance_factor: self.social_distance_factor,
        })
    }

    #[must_use]
    pub fn max_recovery_days(&self) -> Day {
        self.recovery_days.1
    }

    /// Loads parameters from a JSON file. Missing fields take their default values.
    ///
    /// # Errors
    ///
    /// Returns an `EpinetError` if the file cannot be read or parsed. The values are not
    /// validated here.
    pub fn load_from_json(file_path: &Path) -> Result<Self, EpinetError> {
        let contents = fs::read_to_string(file_path)?;
        let parameters = serde_json::from_str(&contents)?;
        Ok(parameters)
    }
}

impl SimulationBuilder {
    /// Starts from an existing set of parameters.
    #[must_use]
    pub fn from_parameters(parameters: &Parameters) -> Self {
        SimulationBuilder::default()
            .infection_probability(parameters.infection_probability)
            .recovery_days(parameters.recovery_days)
            .initial_infected_percent(parameters.initial_infected_percent)
            .mortality_rate(parameters.mortality_rate)
            .immunity_period(parameters.immunity_period)
            .network_model(parameters.network_model.clone())
            .network_size(parameters.network_size)
            .network_param(parameters.network_param)
            .social_distance_factor(parameters.social_distance_factor)
            .transmission_policy(parameters.transmission_policy)
            .seed(parameters.seed)
    }

    /// Validates the parameters, generates a network and returns an uninitialized simulation.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if any parameter is out of range or the network
    /// parameters are incompatible.
    pub fn build(&self) -> Result<Simulation, EpinetError> {
        Simulation::new(self.build_parameters()?)
    }

    /// Like [`build`](Self::build), but runs on `network` instead of generating one. The
    /// network-size parameters are ignored.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if any parameter is out of range.
    pub fn build_with_network(&self, network: Network) -> Result<Simulation, EpinetError> {
        Simulation::with_network(self.build_parameters()?, network)
    }
}
