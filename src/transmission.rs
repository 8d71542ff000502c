//! Per-contact transmission probability.
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::network::NodeAttributes;

/// Cap on the per-contact probability under [`TransmissionPolicy::Demographic`].
pub const MAX_DEMOGRAPHIC_PROBABILITY: f64 = 0.95;

/// How the daily probability that an infected node infects a susceptible neighbor is
/// computed.
#[derive(
    Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TransmissionPolicy {
    /// `0.5 * p / weight²`. Closer contacts transmit more; values above 1 always transmit.
    #[default]
    WeightOnly,
    /// Scales `p` by the susceptible node's frailty and age and by the pair's mean
    /// mobility, capped at [`MAX_DEMOGRAPHIC_PROBABILITY`]. Ignores the edge weight.
    Demographic,
}

impl TransmissionPolicy {
    /// The probability that `infected` infects `susceptible` across an edge of `weight`
    /// today, given the base `infection_probability`.
    #[must_use]
    pub fn probability(
        self,
        infection_probability: f64,
        infected: &NodeAttributes,
        susceptible: &NodeAttributes,
        weight: f64,
    ) -> f64 {
        match self {
            TransmissionPolicy::WeightOnly => 0.5 * infection_probability / (weight * weight),
            TransmissionPolicy::Demographic => {
                let frailty = 1.0 - susceptible.health;
                let age_factor = 1.0 + ((susceptible.age - 50.0) / 100.0).max(0.0);
                let mobility_factor = (infected.mobility + susceptible.mobility) / 2.0;
                (infection_probability * frailty * age_factor * mobility_factor)
                    .min(MAX_DEMOGRAPHIC_PROBABILITY)
            }
        }
    }
}
