//! Graph statistics and time series
//!
//! Centralities follow the usual normalised definitions:
//! - Degree: total degree over `n - 1`
//! - Closeness: Wasserman–Faust scaled, over incoming distances for directed graphs
//! - Betweenness: Brandes, normalised by the number of ordered pairs
//! - Eigenvector: power iteration on `A + I`

use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;

use tracing::{debug, warn};

use murmur_core::NodeIndex;

use crate::graph::Graph;
use crate::simulation::Simulation;

const EIGENVECTOR_MAX_ITER: usize = 100;
const EIGENVECTOR_TOLERANCE: f64 = 1e-6;

/// A per-step quantity that can be tracked over a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Statistic {
    /// Global average opinion, one series per coordinate
    Attributes,
    Degree,
    Closeness,
    Betweenness,
    Eigenvector,
}

impl fmt::Display for Statistic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Statistic::Attributes => "attributes",
            Statistic::Degree => "degree",
            Statistic::Closeness => "closeness",
            Statistic::Betweenness => "betweenness",
            Statistic::Eigenvector => "eigenvector",
        })
    }
}

impl FromStr for Statistic {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "attributes" | "attribute" => Ok(Statistic::Attributes),
            "degree" => Ok(Statistic::Degree),
            "closeness" => Ok(Statistic::Closeness),
            "betweenness" => Ok(Statistic::Betweenness),
            "eigenvector" => Ok(Statistic::Eigenvector),
            other => Err(format!("unknown statistic '{other}'")),
        }
    }
}

pub fn degree_centrality(graph: &Graph) -> Vec<f64> {
    let n = graph.node_count();
    if n <= 1 {
        return vec![1.0; n];
    }
    let scale = 1.0 / (n - 1) as f64;
    (0..n).map(|node| graph.degree(node) as f64 * scale).collect()
}

/// Hop distances from every node to `target`, walking edges backwards
fn distances_to(graph: &Graph, target: NodeIndex) -> Vec<Option<usize>> {
    let mut dist = vec![None; graph.node_count()];
    dist[target] = Some(0);
    let mut queue = VecDeque::from([(target, 0usize)]);
    while let Some((node, d)) = queue.pop_front() {
        for &other in graph.neighbors(node) {
            if dist[other].is_none() {
                dist[other] = Some(d + 1);
                queue.push_back((other, d + 1));
            }
        }
    }
    dist
}

pub fn closeness_centrality(graph: &Graph) -> Vec<f64> {
    let n = graph.node_count();
    (0..n)
        .map(|node| {
            let dist = distances_to(graph, node);
            let reached: Vec<usize> = dist.iter().flatten().copied().collect();
            let total: usize = reached.iter().sum();
            if total == 0 || n <= 1 {
                return 0.0;
            }
            let others = (reached.len() - 1) as f64;
            (others / total as f64) * (others / (n - 1) as f64)
        })
        .collect()
}

pub fn betweenness_centrality(graph: &Graph) -> Vec<f64> {
    let n = graph.node_count();
    let mut centrality = vec![0.0; n];

    for source in 0..n {
        let mut stack = Vec::with_capacity(n);
        let mut preds: Vec<Vec<NodeIndex>> = vec![Vec::new(); n];
        let mut sigma = vec![0.0f64; n];
        let mut dist: Vec<Option<usize>> = vec![None; n];
        sigma[source] = 1.0;
        dist[source] = Some(0);

        let mut queue = VecDeque::from([source]);
        while let Some(v) = queue.pop_front() {
            stack.push(v);
            let dv = dist[v].unwrap_or(0);
            for &w in graph.successors(v) {
                if dist[w].is_none() {
                    dist[w] = Some(dv + 1);
                    queue.push_back(w);
                }
                if dist[w] == Some(dv + 1) {
                    sigma[w] += sigma[v];
                    preds[w].push(v);
                }
            }
        }

        let mut delta = vec![0.0f64; n];
        while let Some(w) = stack.pop() {
            for &v in &preds[w] {
                delta[v] += sigma[v] / sigma[w] * (1.0 + delta[w]);
            }
            if w != source {
                centrality[w] += delta[w];
            }
        }
    }

    if n > 2 {
        let scale = 1.0 / ((n - 1) * (n - 2)) as f64;
        for value in &mut centrality {
            *value *= scale;
        }
    }
    centrality
}

/// Eigenvector centrality, or `None` if power iteration does not converge
pub fn eigenvector_centrality(graph: &Graph) -> Option<Vec<f64>> {
    let n = graph.node_count();
    if n == 0 {
        return None;
    }

    let mut x = vec![1.0 / n as f64; n];
    for _ in 0..EIGENVECTOR_MAX_ITER {
        let last = x.clone();
        for (node, &value) in last.iter().enumerate() {
            for &target in graph.successors(node) {
                x[target] += value;
            }
        }
        let norm = x.iter().map(|v| v * v).sum::<f64>().sqrt();
        let norm = if norm == 0.0 { 1.0 } else { norm };
        for value in &mut x {
            *value /= norm;
        }
        let change: f64 = x.iter().zip(&last).map(|(a, b)| (a - b).abs()).sum();
        if change < n as f64 * EIGENVECTOR_TOLERANCE {
            return Some(x);
        }
    }
    None
}

/// Current value of a statistic: one entry per coordinate or per node
pub fn sample(sim: &Simulation, stat: Statistic) -> Vec<f64> {
    let graph = sim.graph();
    match stat {
        Statistic::Attributes => sim.global_average(),
        Statistic::Degree => degree_centrality(graph),
        Statistic::Closeness => closeness_centrality(graph),
        Statistic::Betweenness => betweenness_centrality(graph),
        Statistic::Eigenvector => eigenvector_centrality(graph).unwrap_or_else(|| {
            warn!(tick = sim.tick, "eigenvector centrality did not converge");
            vec![0.0; graph.node_count()]
        }),
    }
}

/// Step the simulation, recording a statistic before the first step and after each one
///
/// Returns one series per coordinate or node, each `steps + 1` samples long.
pub fn track(sim: &mut Simulation, stat: Statistic, steps: usize) -> Vec<Vec<f64>> {
    let first = sample(sim, stat);
    let mut series: Vec<Vec<f64>> = first
        .into_iter()
        .map(|value| {
            let mut s = Vec::with_capacity(steps + 1);
            s.push(value);
            s
        })
        .collect();

    for _ in 0..steps {
        sim.step();
        debug!(tick = sim.tick, density = sim.graph().density(), stat = %stat, "Tracking");
        for (s, value) in series.iter_mut().zip(sample(sim, stat)) {
            s.push(value);
        }
    }
    series
}
