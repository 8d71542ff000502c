//! Synthetic contact networks.
//!
//! Generation happens in two passes: the topology is built first, then every node and edge
//! draws its attributes independently. All randomness comes from the caller's generator.
use std::str::FromStr;

use indexmap::IndexSet;
use rand::Rng;
use rand_distr::{Distribution, Gamma, Normal};
use rustc_hash::FxBuildHasher;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::EpinetError;
use crate::info;
use crate::network::{Edge, Network, NodeAttributes, NodeId};

/// Probability that a ring edge of a small-world network is rewired.
pub const REWIRING_PROBABILITY: f64 = 0.1;

const MEAN_AGE: f64 = 40.0;
const AGE_STD_DEV: f64 = 15.0;
const MOBILITY_SHAPE: f64 = 2.0;
const MOBILITY_SCALE: f64 = 1.0;
const SOCIAL_DISTANCE_SHAPE: f64 = 2.0;
/// Smallest social distance an edge can carry.
pub const MIN_SOCIAL_DISTANCE: f64 = 0.5;

/// The supported network topologies. Each also parses from the name of the classic
/// algorithm it implements.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
pub enum NetworkModel {
    /// Preferential attachment; heavy-tailed degree distribution.
    #[strum(to_string = "scale_free", serialize = "barabasi_albert")]
    ScaleFree,
    /// Ring lattice with random rewiring.
    #[strum(to_string = "small_world", serialize = "watts_strogatz")]
    SmallWorld,
    /// Independent edges with equal probability.
    #[strum(to_string = "random", serialize = "erdos_renyi")]
    Random,
}

impl NetworkModel {
    /// Parses a model name.
    ///
    /// # Errors
    ///
    /// Returns `EpinetError::UnknownModel` if `name` is not a supported model.
    pub fn parse(name: &str) -> Result<Self, EpinetError> {
        NetworkModel::from_str(name).map_err(|_| EpinetError::UnknownModel(name.to_string()))
    }

    /// Checks that `param` makes sense for a network of `node_count` nodes.
    ///
    /// # Errors
    ///
    /// Returns `EpinetError::InvalidConfiguration` describing the mismatch.
    pub fn check_param(self, node_count: usize, param: usize) -> Result<(), EpinetError> {
        let compatible = match self {
            NetworkModel::ScaleFree => param >= 1 && param < node_count,
            NetworkModel::SmallWorld => param < node_count,
            NetworkModel::Random => param <= node_count,
        };
        if compatible {
            Ok(())
        } else {
            Err(EpinetError::InvalidConfiguration(format!(
                "network parameter {param} is incompatible with a {self} network of {node_count} nodes"
            )))
        }
    }
}

/// Everything needed to generate a network.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct NetworkParams {
    pub model: NetworkModel,
    pub node_count: usize,
    /// Attachments per new node (scale-free), ring neighbors (small-world) or expected
    /// degree (random).
    pub param: usize,
    /// Scales edge weights; the largest social distance is three times this factor.
    pub social_distance_factor: f64,
}

impl NetworkParams {
    #[must_use]
    pub fn new(model: NetworkModel, node_count: usize, param: usize) -> Self {
        NetworkParams {
            model,
            node_count,
            param,
            social_distance_factor: 1.0,
        }
    }

    /// Generates a network with these parameters.
    ///
    /// # Errors
    ///
    /// Returns `EpinetError::InvalidConfiguration` if the parameters are incompatible.
    pub fn generate<R: Rng>(&self, rng: &mut R) -> Result<Network, EpinetError> {
        self.model.check_param(self.node_count, self.param)?;
        if !(self.social_distance_factor.is_finite() && self.social_distance_factor > 0.0) {
            return Err(EpinetError::InvalidConfiguration(format!(
                "social distance factor must be positive, got {}",
                self.social_distance_factor
            )));
        }

        let n = self.node_count;
        let topology = match self.model {
            NetworkModel::ScaleFree => scale_free(n, self.param, rng),
            NetworkModel::SmallWorld => small_world(n, self.param, rng),
            NetworkModel::Random => random(n, self.param, rng),
        };

        let nodes = draw_node_attributes(n, rng)?;
        let max_distance = 3.0 * self.social_distance_factor;
        let distance = Gamma::new(SOCIAL_DISTANCE_SHAPE, max_distance / 5.0)
            .map_err(|e| EpinetError::InvalidConfiguration(e.to_string()))?;
        let edges: Vec<Edge> = topology
            .into_pairs()
            .into_iter()
            .map(|(source, target)| Edge {
                source: NodeId(source),
                target: NodeId(target),
                weight: distance
                    .sample(rng)
                    .min(max_distance)
                    .max(MIN_SOCIAL_DISTANCE),
            })
            .collect();

        let network = Network::from_parts(nodes, edges)?;
        info!(
            "Generated {} network with {} nodes and {} edges",
            self.model,
            network.node_count(),
            network.edge_count()
        );
        Ok(network)
    }
}

/// Generates a network of `node_count` nodes with the default social distance scale.
///
/// # Errors
///
/// Returns `EpinetError::InvalidConfiguration` if `param` is incompatible with `node_count`.
pub fn generate<R: Rng>(
    model: NetworkModel,
    node_count: usize,
    param: usize,
    rng: &mut R,
) -> Result<Network, EpinetError> {
    NetworkParams::new(model, node_count, param).generate(rng)
}

fn draw_node_attributes<R: Rng>(n: usize, rng: &mut R) -> Result<Vec<NodeAttributes>, EpinetError> {
    let age = Normal::new(MEAN_AGE, AGE_STD_DEV)
        .map_err(|e| EpinetError::InvalidConfiguration(e.to_string()))?;
    let mobility = Gamma::new(MOBILITY_SHAPE, MOBILITY_SCALE)
        .map_err(|e| EpinetError::InvalidConfiguration(e.to_string()))?;

    Ok((0..n)
        .map(|_| NodeAttributes {
            age: age.sample(rng),
            health: rng.random::<f64>(),
            mobility: mobility.sample(rng),
        })
        .collect())
}

type NodeSet = IndexSet<usize, FxBuildHasher>;

// Undirected simple graph under construction. Neighbor sets keep insertion order so the
// resulting edge list only depends on the random draws.
struct Topology {
    adjacency: Vec<NodeSet>,
}

impl Topology {
    fn new(n: usize) -> Self {
        Topology {
            adjacency: (0..n).map(|_| NodeSet::default()).collect(),
        }
    }

    fn add_edge(&mut self, u: usize, v: usize) -> bool {
        if u == v || self.has_edge(u, v) {
            return false;
        }
        self.adjacency[u].insert(v);
        self.adjacency[v].insert(u);
        true
    }

    fn remove_edge(&mut self, u: usize, v: usize) {
        self.adjacency[u].shift_remove(&v);
        self.adjacency[v].shift_remove(&u);
    }

    fn has_edge(&self, u: usize, v: usize) -> bool {
        self.adjacency[u].contains(&v)
    }

    fn degree(&self, u: usize) -> usize {
        self.adjacency[u].len()
    }

    fn into_pairs(self) -> Vec<(usize, usize)> {
        self.adjacency
            .iter()
            .enumerate()
            .flat_map(|(u, neighbors)| {
                neighbors
                    .iter()
                    .filter(move |&&v| u < v)
                    .map(move |&v| (u, v))
            })
            .collect()
    }
}

// Seed clique of m + 1 nodes, then each new node picks m distinct targets from a list in
// which every node appears once per unit of degree.
fn scale_free<R: Rng>(n: usize, m: usize, rng: &mut R) -> Topology {
    let mut topology = Topology::new(n);
    for u in 0..=m {
        for v in (u + 1)..=m {
            topology.add_edge(u, v);
        }
    }

    let mut repeated: Vec<usize> = (0..=m).flat_map(|u| std::iter::repeat_n(u, m)).collect();
    for source in (m + 1)..n {
        let mut targets = NodeSet::default();
        while targets.len() < m {
            targets.insert(repeated[rng.random_range(0..repeated.len())]);
        }
        for &target in &targets {
            topology.add_edge(source, target);
        }
        repeated.extend(targets.iter().copied());
        repeated.extend(std::iter::repeat_n(source, m));
    }
    topology
}

fn small_world<R: Rng>(n: usize, k: usize, rng: &mut R) -> Topology {
    let mut topology = Topology::new(n);
    let half = k / 2;
    for j in 1..=half {
        for u in 0..n {
            topology.add_edge(u, (u + j) % n);
        }
    }

    for j in 1..=half {
        for u in 0..n {
            if rng.random::<f64>() >= REWIRING_PROBABILITY {
                continue;
            }
            // Already adjacent to everyone.
            if topology.degree(u) >= n - 1 {
                continue;
            }
            let mut w = rng.random_range(0..n);
            while w == u || topology.has_edge(u, w) {
                w = rng.random_range(0..n);
            }
            topology.remove_edge(u, (u + j) % n);
            topology.add_edge(u, w);
        }
    }
    topology
}

fn random<R: Rng>(n: usize, param: usize, rng: &mut R) -> Topology {
    let mut topology = Topology::new(n);
    if n == 0 {
        return topology;
    }
    #[allow(clippy::cast_precision_loss)]
    let p = param as f64 / n as f64;
    for u in 0..n {
        for v in (u + 1)..n {
            if rng.random::<f64>() < p {
                topology.add_edge(u, v);
            }
        }
    }
    topology
}

#[cfg(test)]
mod tests {
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    use super::*;

    fn rng(seed: u64) -> SmallRng {
        SmallRng::seed_from_u64(seed)
    }

    #[test]
    fn parse_model_names() {
        assert_eq!(NetworkModel::parse("scale_free").unwrap(), NetworkModel::ScaleFree);
        assert_eq!(NetworkModel::parse("barabasi_albert").unwrap(), NetworkModel::ScaleFree);
        assert_eq!(NetworkModel::parse("watts_strogatz").unwrap(), NetworkModel::SmallWorld);
        assert_eq!(NetworkModel::parse("erdos_renyi").unwrap(), NetworkModel::Random);
        assert_eq!(NetworkModel::SmallWorld.to_string(), "small_world");
        assert!(matches!(
            NetworkModel::parse("lattice"),
            Err(EpinetError::UnknownModel(name)) if name == "lattice"
        ));
    }

    #[test]
    fn scale_free_edge_count() {
        let network = generate(NetworkModel::ScaleFree, 100, 3, &mut rng(42)).unwrap();
        assert_eq!(network.node_count(), 100);
        // Seed clique of 4 nodes plus 3 edges for each of the remaining 96 nodes.
        assert_eq!(network.edge_count(), 6 + 96 * 3);
        for node in network.node_ids() {
            assert!(network.degree(node).unwrap() >= 3);
        }
    }

    #[test]
    fn scale_free_has_hubs() {
        let network = generate(NetworkModel::ScaleFree, 1000, 2, &mut rng(1)).unwrap();
        let max_degree = network.node_ids().filter_map(|n| network.degree(n)).max().unwrap();
        // Mean degree is about 4; preferential attachment grows hubs far above it.
        assert!(max_degree > 15, "max degree {max_degree}");
    }

    #[test]
    fn small_world_preserves_edge_count() {
        let network = generate(NetworkModel::SmallWorld, 50, 4, &mut rng(7)).unwrap();
        assert_eq!(network.edge_count(), 50 * 2);
    }

    #[test]
    fn small_world_without_rewiring_is_a_ring() {
        let mut topology = Topology::new(6);
        for u in 0..6 {
            topology.add_edge(u, (u + 1) % 6);
        }
        assert!(topology.has_edge(5, 0));
        assert_eq!(topology.into_pairs().len(), 6);
    }

    #[test]
    fn random_extremes() {
        let empty = generate(NetworkModel::Random, 30, 0, &mut rng(3)).unwrap();
        assert_eq!(empty.edge_count(), 0);

        let complete = generate(NetworkModel::Random, 30, 30, &mut rng(3)).unwrap();
        assert_eq!(complete.edge_count(), 30 * 29 / 2);
    }

    #[test]
    fn empty_random_network() {
        let network = generate(NetworkModel::Random, 0, 0, &mut rng(3)).unwrap();
        assert_eq!(network.node_count(), 0);
        assert_eq!(network.edge_count(), 0);
    }

    #[test]
    fn incompatible_params() {
        for (model, n, param) in [
            (NetworkModel::ScaleFree, 10, 10),
            (NetworkModel::ScaleFree, 10, 0),
            (NetworkModel::SmallWorld, 10, 12),
            (NetworkModel::Random, 10, 11),
        ] {
            let result = generate(model, n, param, &mut rng(0));
            assert!(
                matches!(result, Err(EpinetError::InvalidConfiguration(_))),
                "{model} n={n} param={param}"
            );
        }
    }

    #[test]
    fn bad_social_distance_factor() {
        let params = NetworkParams {
            social_distance_factor: 0.0,
            ..NetworkParams::new(NetworkModel::Random, 10, 2)
        };
        assert!(params.generate(&mut rng(0)).is_err());
    }

    #[test]
    fn attributes_in_range() {
        let network = generate(NetworkModel::SmallWorld, 200, 6, &mut rng(11)).unwrap();
        for attributes in network.nodes() {
            assert!((0.0..1.0).contains(&attributes.health));
            assert!(attributes.mobility >= 0.0);
            assert!(attributes.age.is_finite());
        }
        for edge in network.edges() {
            assert!((MIN_SOCIAL_DISTANCE..=3.0).contains(&edge.weight));
            assert_ne!(edge.source, edge.target);
        }
    }

    #[test]
    fn same_seed_same_network() {
        let a = generate(NetworkModel::ScaleFree, 300, 4, &mut rng(99)).unwrap();
        let b = generate(NetworkModel::ScaleFree, 300, 4, &mut rng(99)).unwrap();
        let c = generate(NetworkModel::ScaleFree, 300, 4, &mut rng(100)).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
