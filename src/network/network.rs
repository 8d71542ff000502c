use serde::{Deserialize, Serialize};

use crate::error::EpinetError;
use crate::hashing::HashSet;

/// A stable handle for a node: its index in the network.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub usize);

impl NodeId {
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Static attributes of an individual, fixed when the network is generated.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeAttributes {
    pub age: f64,
    /// 0 is poor health, 1 is excellent.
    pub health: f64,
    pub mobility: f64,
}

impl Default for NodeAttributes {
    fn default() -> Self {
        NodeAttributes {
            age: 40.0,
            health: 0.5,
            mobility: 2.0,
        }
    }
}

/// An undirected contact between `source` and `target`. `weight` is the social distance:
/// larger means less contact.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub source: NodeId,
    pub target: NodeId,
    pub weight: f64,
}

/// One entry of a node's adjacency list.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Neighbor {
    pub node: NodeId,
    pub weight: f64,
}

/// The contact network. Its topology is frozen once constructed.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "NetworkData", into = "NetworkData")]
pub struct Network {
    nodes: Vec<NodeAttributes>,
    edges: Vec<Edge>,
    adjacency: Vec<Vec<Neighbor>>,
}

impl Network {
    /// A network with no nodes.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds a network from node attributes and weighted edges.
    ///
    /// # Errors
    ///
    /// Returns `EpinetError::InvalidConfiguration` if an edge is a self-loop, repeats a pair,
    /// references a node that does not exist, or has a negative or non-finite weight.
    pub fn from_parts(
        nodes: Vec<NodeAttributes>,
        edges: impl IntoIterator<Item = Edge>,
    ) -> Result<Self, EpinetError> {
        let mut network = Network {
            adjacency: vec![Vec::new(); nodes.len()],
            nodes,
            edges: Vec::new(),
        };
        let mut seen = HashSet::default();
        for edge in edges {
            network.add_edge(edge, &mut seen)?;
        }
        Ok(network)
    }

    fn add_edge(&mut self, edge: Edge, seen: &mut HashSet<(NodeId, NodeId)>) -> Result<(), EpinetError> {
        let Edge {
            source,
            target,
            weight,
        } = edge;
        if source == target {
            return Err(EpinetError::InvalidConfiguration(format!(
                "cannot make edge from node {source} to itself"
            )));
        }
        if source.0 >= self.nodes.len() || target.0 >= self.nodes.len() {
            return Err(EpinetError::InvalidConfiguration(format!(
                "edge {source}-{target} references a node outside the network"
            )));
        }
        if !weight.is_finite() || weight.is_sign_negative() {
            return Err(EpinetError::InvalidConfiguration(format!(
                "invalid weight {weight} on edge {source}-{target}"
            )));
        }
        if !seen.insert((source.min(target), source.max(target))) {
            return Err(EpinetError::InvalidConfiguration(format!(
                "edge {source}-{target} already exists"
            )));
        }

        self.adjacency[source.0].push(Neighbor {
            node: target,
            weight,
        });
        self.adjacency[target.0].push(Neighbor {
            node: source,
            weight,
        });
        self.edges.push(edge);
        Ok(())
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn node_ids(&self) -> impl ExactSizeIterator<Item = NodeId> {
        (0..self.nodes.len()).map(NodeId)
    }

    #[must_use]
    pub fn contains(&self, node: NodeId) -> bool {
        node.0 < self.nodes.len()
    }

    #[must_use]
    pub fn attributes(&self, node: NodeId) -> Option<&NodeAttributes> {
        self.nodes.get(node.0)
    }

    #[must_use]
    pub fn nodes(&self) -> &[NodeAttributes] {
        &self.nodes
    }

    #[must_use]
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// The neighbors of `node` in the order their edges were added. Empty for an unknown node.
    #[must_use]
    pub fn neighbors(&self, node: NodeId) -> &[Neighbor] {
        self.adjacency.get(node.0).map_or(&[][..], Vec::as_slice)
    }

    #[must_use]
    pub fn degree(&self, node: NodeId) -> Option<usize> {
        self.adjacency.get(node.0).map(Vec::len)
    }

    /// The weight of the edge between `a` and `b`, if they are adjacent.
    #[must_use]
    pub fn edge_weight(&self, a: NodeId, b: NodeId) -> Option<f64> {
        self.neighbors(a)
            .iter()
            .find(|neighbor| neighbor.node == b)
            .map(|neighbor| neighbor.weight)
    }
}

// Wire form of the network. The adjacency lists are rebuilt, and validated, on the way in.
#[derive(Serialize, Deserialize)]
struct NetworkData {
    nodes: Vec<NodeAttributes>,
    edges: Vec<Edge>,
}

impl From<Network> for NetworkData {
    fn from(network: Network) -> Self {
        NetworkData {
            nodes: network.nodes,
            edges: network.edges,
        }
    }
}

impl TryFrom<NetworkData> for Network {
    type Error = EpinetError;

    fn try_from(data: NetworkData) -> Result<Self, Self::Error> {
        Network::from_parts(data.nodes, data.edges)
    }
}
