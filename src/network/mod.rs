//! The contact network: who can infect whom, and how closely they interact.
//!
//! A [`Network`] is built once, either by [`generate`] or from caller-supplied parts with
//! [`Network::from_parts`], and is never rewired afterwards.
mod generator;
mod network;

pub use generator::{
    generate, NetworkModel, NetworkParams, MIN_SOCIAL_DISTANCE, REWIRING_PROBABILITY,
};
pub use network::{Edge, Neighbor, Network, NodeAttributes, NodeId};
