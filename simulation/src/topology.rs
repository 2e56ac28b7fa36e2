//! Topology generators for the initial edge set
//!
//! Provides the topology families a network can start from:
//! - Empty: no edges
//! - Complete: every pair connected
//! - Cycle: each node connected to the next, wrapping around
//! - Random: Erdős–Rényi G(n, p)
//! - Scale free: Bollobás preferential attachment
//! - Small world: Watts–Strogatz ring lattice with rewiring
//! - Star: node 0 connected to every other node
//!
//! Generators return plain edge lists; [`build_graph`] loads them into a
//! [`Graph`] and applies mirroring for symmetric networks.

use std::collections::BTreeSet;

use rand::Rng;
use tracing::{debug, info, warn};

use murmur_core::{ConfigError, NetworkConfig, NodeIndex, Topology};

use crate::graph::Graph;

/// Scale-free growth: probability of a new source node attaching to an existing target
const SCALE_FREE_ALPHA: f64 = 0.41;
/// Scale-free growth: probability of a new edge between existing nodes
const SCALE_FREE_BETA: f64 = 0.54;
/// In-degree bias for choosing scale-free targets (out-degree bias is zero)
const SCALE_FREE_DELTA_IN: f64 = 0.2;

/// Family-specific parameters for edge generation
#[derive(Debug, Clone, Copy)]
pub struct TopologyParams {
    pub n: usize,
    pub directed: bool,
    /// Edge probability (random) or neighbourhood fraction (small world)
    pub saturation: f64,
    /// Rewiring probability (small world)
    pub rewire: f64,
}

impl From<&NetworkConfig> for TopologyParams {
    fn from(config: &NetworkConfig) -> Self {
        Self {
            n: config.n,
            directed: config.directed,
            saturation: config.saturation,
            rewire: config.rewire,
        }
    }
}

/// Generate the edge list for a topology family
///
/// The result never contains self-loops or repeated pairs.
pub fn generate<R: Rng + ?Sized>(
    topology: Topology,
    params: &TopologyParams,
    rng: &mut R,
) -> Result<Vec<(NodeIndex, NodeIndex)>, ConfigError> {
    let n = params.n;
    let edges = match topology {
        Topology::Empty => Vec::new(),
        Topology::Complete => complete(n),
        Topology::Cycle => cycle(n),
        Topology::Star => (1..n).map(|i| (0, i)).collect(),
        Topology::Random => erdos_renyi(n, params.saturation, params.directed, rng),
        Topology::ScaleFree => scale_free(n, rng),
        Topology::SmallWorld => {
            // Truncated, so small networks may get K = 0
            let k = (params.saturation * n as f64) as usize;
            watts_strogatz(n, k, params.rewire, rng)?
        }
    };
    Ok(edges)
}

/// Build the initial graph for a configuration
///
/// An unknown topology tag or invalid family parameters are logged and leave
/// the graph edgeless.
pub fn build_graph<R: Rng + ?Sized>(config: &NetworkConfig, rng: &mut R) -> Graph {
    let mut graph = Graph::new(config.n, config.directed);
    info!(topology = %config.topology, n = config.n, directed = config.directed, "Generating edges");

    let edges = config
        .topology()
        .and_then(|topology| generate(topology, &TopologyParams::from(config), rng));

    match edges {
        Ok(edges) => {
            for (a, b) in edges {
                graph.add_edge(a, b);
                if config.symmetric {
                    graph.add_edge(b, a);
                }
            }
        }
        Err(e) => {
            warn!(error = %e, "An error occurred generating edges; leaving graph edgeless");
        }
    }

    debug!(edges = graph.edge_count(), density = graph.density(), "Generated edges");
    graph
}

fn complete(n: usize) -> Vec<(NodeIndex, NodeIndex)> {
    (0..n)
        .flat_map(|a| ((a + 1)..n).map(move |b| (a, b)))
        .collect()
}

fn cycle(n: usize) -> Vec<(NodeIndex, NodeIndex)> {
    match n {
        0 | 1 => Vec::new(),
        2 => vec![(0, 1)],
        _ => (0..n).map(|i| (i, (i + 1) % n)).collect(),
    }
}

fn erdos_renyi<R: Rng + ?Sized>(
    n: usize,
    p: f64,
    directed: bool,
    rng: &mut R,
) -> Vec<(NodeIndex, NodeIndex)> {
    let pairs: Vec<(NodeIndex, NodeIndex)> = if directed {
        (0..n)
            .flat_map(|a| (0..n).filter(move |&b| b != a).map(move |b| (a, b)))
            .collect()
    } else {
        complete(n)
    };

    if p <= 0.0 {
        return Vec::new();
    }
    if p >= 1.0 {
        return pairs;
    }
    pairs
        .into_iter()
        .filter(|_| rng.random::<f64>() < p)
        .collect()
}

/// Bollobás et al. directed scale-free growth, seeded with the 3-cycle
fn scale_free<R: Rng + ?Sized>(n: usize, rng: &mut R) -> Vec<(NodeIndex, NodeIndex)> {
    if n < 3 {
        return cycle(n);
    }

    let mut arcs: Vec<(NodeIndex, NodeIndex)> = vec![(0, 1), (1, 2), (2, 0)];
    // One entry per unit of out-degree / in-degree
    let mut sources: Vec<NodeIndex> = vec![0, 1, 2];
    let mut targets: Vec<NodeIndex> = vec![1, 2, 0];
    let mut node_count = 3;

    while node_count < n {
        let r = rng.random::<f64>();
        let (v, w) = if r < SCALE_FREE_ALPHA {
            let v = node_count;
            node_count += 1;
            let w = choose_node(&targets, node_count, SCALE_FREE_DELTA_IN, rng);
            (v, w)
        } else if r < SCALE_FREE_ALPHA + SCALE_FREE_BETA {
            let v = choose_node(&sources, node_count, 0.0, rng);
            let w = choose_node(&targets, node_count, SCALE_FREE_DELTA_IN, rng);
            (v, w)
        } else {
            let v = choose_node(&sources, node_count, 0.0, rng);
            let w = node_count;
            node_count += 1;
            (v, w)
        };
        arcs.push((v, w));
        sources.push(v);
        targets.push(w);
    }

    let mut seen = BTreeSet::new();
    arcs.into_iter()
        .filter(|&(v, w)| v != w && seen.insert((v, w)))
        .collect()
}

/// Pick proportionally to degree, with a uniform bias of `delta` per node
fn choose_node<R: Rng + ?Sized>(
    candidates: &[NodeIndex],
    node_count: usize,
    delta: f64,
    rng: &mut R,
) -> NodeIndex {
    if delta > 0.0 {
        let bias_sum = node_count as f64 * delta;
        let p_delta = bias_sum / (bias_sum + candidates.len() as f64);
        if rng.random::<f64>() < p_delta {
            return rng.random_range(0..node_count);
        }
    }
    candidates[rng.random_range(0..candidates.len())]
}

/// Ring lattice of `k` nearest neighbours, each lattice edge rewired with probability `p`
fn watts_strogatz<R: Rng + ?Sized>(
    n: usize,
    k: usize,
    p: f64,
    rng: &mut R,
) -> Result<Vec<(NodeIndex, NodeIndex)>, ConfigError> {
    if k > n {
        return Err(ConfigError::NeighbourhoodTooLarge { k, n });
    }
    if k == n {
        return Ok(complete(n));
    }

    let mut adjacency: Vec<BTreeSet<NodeIndex>> = vec![BTreeSet::new(); n];
    let link = |adj: &mut Vec<BTreeSet<NodeIndex>>, a: NodeIndex, b: NodeIndex| {
        adj[a].insert(b);
        adj[b].insert(a);
    };

    for j in 1..=(k / 2) {
        for u in 0..n {
            link(&mut adjacency, u, (u + j) % n);
        }
    }

    for j in 1..=(k / 2) {
        for u in 0..n {
            let v = (u + j) % n;
            if rng.random::<f64>() >= p {
                continue;
            }
            let mut w = rng.random_range(0..n);
            let mut saturated = false;
            while w == u || adjacency[u].contains(&w) {
                w = rng.random_range(0..n);
                if adjacency[u].len() >= n - 1 {
                    saturated = true;
                    break;
                }
            }
            if !saturated {
                adjacency[u].remove(&v);
                adjacency[v].remove(&u);
                link(&mut adjacency, u, w);
            }
        }
    }

    Ok(adjacency
        .iter()
        .enumerate()
        .flat_map(|(a, nbrs)| nbrs.iter().copied().filter(move |&b| a < b).map(move |b| (a, b)))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn params(n: usize) -> TopologyParams {
        TopologyParams {
            n,
            directed: false,
            saturation: 0.5,
            rewire: 0.2,
        }
    }

    fn no_self_loops(edges: &[(NodeIndex, NodeIndex)]) -> bool {
        edges.iter().all(|(a, b)| a != b)
    }

    #[test]
    fn test_complete_topology() {
        let mut rng = StdRng::seed_from_u64(1);
        let edges = generate(Topology::Complete, &params(5), &mut rng).unwrap();
        assert_eq!(edges.len(), 10); // C(5,2)
        assert!(no_self_loops(&edges));
    }

    #[test]
    fn test_cycle_topology() {
        let mut rng = StdRng::seed_from_u64(1);
        let edges = generate(Topology::Cycle, &params(4), &mut rng).unwrap();
        assert_eq!(edges, vec![(0, 1), (1, 2), (2, 3), (3, 0)]);

        assert_eq!(generate(Topology::Cycle, &params(2), &mut rng).unwrap(), vec![(0, 1)]);
        assert!(generate(Topology::Cycle, &params(1), &mut rng).unwrap().is_empty());
    }

    #[test]
    fn test_star_topology() {
        let mut rng = StdRng::seed_from_u64(1);
        let edges = generate(Topology::Star, &params(4), &mut rng).unwrap();
        assert_eq!(edges, vec![(0, 1), (0, 2), (0, 3)]);
    }

    #[test]
    fn test_random_topology_extremes() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut p = params(6);
        p.saturation = 0.0;
        assert!(generate(Topology::Random, &p, &mut rng).unwrap().is_empty());

        p.saturation = 1.0;
        p.directed = true;
        let edges = generate(Topology::Random, &p, &mut rng).unwrap();
        assert_eq!(edges.len(), 30); // n(n-1) ordered pairs
        assert!(no_self_loops(&edges));
    }

    #[test]
    fn test_scale_free_topology() {
        let mut rng = StdRng::seed_from_u64(42);
        let edges = generate(Topology::ScaleFree, &params(50), &mut rng).unwrap();
        assert!(no_self_loops(&edges));
        assert!(edges.iter().all(|&(a, b)| a < 50 && b < 50));
        let distinct: BTreeSet<_> = edges.iter().collect();
        assert_eq!(distinct.len(), edges.len());
        // Every node joined through at least one edge
        let touched: BTreeSet<NodeIndex> = edges.iter().flat_map(|&(a, b)| [a, b]).collect();
        assert_eq!(touched.len(), 50);
    }

    #[test]
    fn test_small_world_without_rewiring_is_ring_lattice() {
        let mut rng = StdRng::seed_from_u64(7);
        let p = TopologyParams {
            n: 10,
            directed: false,
            saturation: 0.4, // K = 4
            rewire: 0.0,
        };
        let edges = generate(Topology::SmallWorld, &p, &mut rng).unwrap();
        assert_eq!(edges.len(), 20); // n * K / 2
        assert!(edges.contains(&(0, 1)));
        assert!(edges.contains(&(0, 2)));
        assert!(edges.contains(&(0, 9)));
        assert!(!edges.contains(&(0, 3)));
    }

    #[test]
    fn test_small_world_rewiring_keeps_edge_count() {
        let mut rng = StdRng::seed_from_u64(7);
        let p = TopologyParams {
            n: 30,
            directed: false,
            saturation: 0.2,
            rewire: 0.5,
        };
        let edges = generate(Topology::SmallWorld, &p, &mut rng).unwrap();
        assert_eq!(edges.len(), 30 * 6 / 2);
        assert!(no_self_loops(&edges));
    }

    #[test]
    fn test_small_world_degenerate_cases() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut p = params(5);
        p.saturation = 0.1; // K = 0
        assert!(generate(Topology::SmallWorld, &p, &mut rng).unwrap().is_empty());

        p.saturation = 1.0; // K = n
        assert_eq!(generate(Topology::SmallWorld, &p, &mut rng).unwrap().len(), 10);
    }

    #[test]
    fn test_build_graph_symmetric_mirrors_edges() {
        let mut rng = StdRng::seed_from_u64(3);
        let config = NetworkConfig {
            n: 4,
            directed: true,
            symmetric: true,
            topology: "cycle".into(),
            ..Default::default()
        };
        let graph = build_graph(&config, &mut rng);
        assert_eq!(graph.edge_count(), 8);
        for (a, b) in graph.edges() {
            assert!(graph.has_edge(b, a));
        }
    }

    #[test]
    fn test_build_graph_unknown_topology_is_edgeless() {
        let mut rng = StdRng::seed_from_u64(3);
        let config = NetworkConfig {
            n: 4,
            topology: "hypercube".into(),
            ..Default::default()
        };
        let graph = build_graph(&config, &mut rng);
        assert_eq!(graph.node_count(), 4);
        assert_eq!(graph.edge_count(), 0);
    }
}
