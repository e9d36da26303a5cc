//! Graph metrics for centrality badges.
//!
//! Metrics are computed over the diagram's node/edge graph and returned as a
//! separate map keyed by node id; the AST is never touched. Only nodes that
//! request a metric (through `NodeAst::metrics`) get one, unless
//! [`MetricsOptions::all_nodes`] is set.
//!
//! All values are deterministic for a given node and edge order and are `0`
//! rather than NaN for degenerate graphs.

use std::collections::{HashMap, HashSet, VecDeque};

use indexmap::IndexMap;
use log::{debug, warn};
use petgraph::{
    Directed, EdgeType, Graph, Undirected,
    algo::dijkstra,
    graph::NodeIndex,
    visit::EdgeRef,
};
use serde::Serialize;

use cartograph_core::ast::{DiagramAst, MetricKind};

use crate::budget::{Budget, Meter};

#[derive(Debug, Clone, Default)]
pub struct MetricsOptions {
    /// Compute every metric for every node, ignoring per-node requests.
    pub all_nodes: bool,
    /// Use edge weights as distances for closeness.
    pub weighted: bool,
    pub budget: Budget,
}

/// Metrics of one node. Absent values were not requested (or could not be
/// finished within the budget).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NodeMetrics {
    /// Incident edges regardless of direction. A self-loop counts twice.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub degree: Option<usize>,
    /// Incoming edges, for directed diagrams.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub in_degree: Option<usize>,
    /// Outgoing edges, for directed diagrams.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub out_degree: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub betweenness: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub closeness: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clustering: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MetricsOutcome {
    pub metrics: IndexMap<String, NodeMetrics>,
    /// `false` when the budget ran out before the path sweeps finished.
    pub complete: bool,
}

/// The diagram as an index graph: one vertex per distinct node id.
struct MetricGraph<'a, Ty: EdgeType> {
    ids: Vec<&'a str>,
    graph: Graph<(), f64, Ty>,
    /// Distinct neighbours (outgoing for directed graphs), self excluded.
    neighbors: Vec<Vec<usize>>,
}

impl<'a, Ty: EdgeType> MetricGraph<'a, Ty> {
    fn new(diagram: &'a DiagramAst) -> Self {
        let mut index: HashMap<&str, usize> = HashMap::new();
        let mut ids = Vec::new();
        let mut graph = Graph::<(), f64, Ty>::default();
        for node in &diagram.nodes {
            if !index.contains_key(node.id.as_str()) {
                index.insert(node.id.as_str(), ids.len());
                ids.push(node.id.as_str());
                graph.add_node(());
            }
        }

        for edge in &diagram.edges {
            let (Some(&from), Some(&to)) = (index.get(edge.from.as_str()), index.get(edge.to.as_str()))
            else {
                debug!(edge = edge.edge_id().as_str(); "Skipping edge with unknown endpoint");
                continue;
            };
            graph.add_edge(
                NodeIndex::new(from),
                NodeIndex::new(to),
                f64::from(edge.effective_weight()),
            );
        }

        let neighbors = (0..ids.len())
            .map(|v| {
                let mut list: Vec<usize> = graph
                    .neighbors(NodeIndex::new(v))
                    .map(NodeIndex::index)
                    .filter(|&w| w != v)
                    .collect();
                list.sort_unstable();
                list.dedup();
                list
            })
            .collect();

        Self {
            ids,
            graph,
            neighbors,
        }
    }

    fn len(&self) -> usize {
        self.ids.len()
    }

    /// Brandes' algorithm, normalised per node by the number of ordered
    /// reachable pairs that do not involve it.
    fn betweenness(&self, meter: &mut Meter<'_>) -> Option<Vec<f64>> {
        let n = self.len();
        let mut centrality = vec![0.0; n];
        if n < 3 {
            return Some(centrality);
        }

        let mut reaches = vec![0usize; n];
        let mut reached_by = vec![0usize; n];

        for source in 0..n {
            if !meter.tick() {
                return None;
            }

            let mut stack = Vec::with_capacity(n);
            let mut predecessors: Vec<Vec<usize>> = vec![Vec::new(); n];
            let mut sigma = vec![0.0_f64; n];
            let mut distance: Vec<Option<usize>> = vec![None; n];
            sigma[source] = 1.0;
            distance[source] = Some(0);

            let mut queue = VecDeque::from([source]);
            while let Some(v) = queue.pop_front() {
                stack.push(v);
                let next = distance[v].map_or(0, |d| d + 1);
                for &w in &self.neighbors[v] {
                    if distance[w].is_none() {
                        distance[w] = Some(next);
                        queue.push_back(w);
                    }
                    if distance[w] == Some(next) {
                        sigma[w] += sigma[v];
                        predecessors[w].push(v);
                    }
                }
            }

            for &w in &stack {
                if w != source {
                    reaches[source] += 1;
                    reached_by[w] += 1;
                }
            }

            let mut delta = vec![0.0_f64; n];
            while let Some(w) = stack.pop() {
                for &v in &predecessors[w] {
                    delta[v] += sigma[v] / sigma[w] * (1.0 + delta[w]);
                }
                if w != source {
                    centrality[w] += delta[w];
                }
            }
        }

        let total: usize = reaches.iter().sum();
        for v in 0..n {
            let pairs = total - reaches[v] - reached_by[v];
            centrality[v] = if pairs > 0 {
                centrality[v] / pairs as f64
            } else {
                0.0
            };
        }
        Some(centrality)
    }

    /// Reachable count divided by the sum of distances to the reachable set.
    fn closeness(&self, weighted: bool, meter: &mut Meter<'_>) -> Option<Vec<f64>> {
        let n = self.len();
        let mut closeness = vec![0.0; n];
        for source in 0..n {
            if !meter.tick() {
                return None;
            }
            let mut distances: Vec<(usize, f64)> = if weighted {
                dijkstra(&self.graph, NodeIndex::new(source), None, |edge| {
                    let weight = *edge.weight();
                    if weight.is_finite() && weight > 0.0 {
                        weight
                    } else {
                        1.0
                    }
                })
                .into_iter()
                .map(|(node, d)| (node.index(), d))
                .collect()
            } else {
                self.hops(source)
            };
            distances.sort_by_key(|&(node, _)| node);

            let (reachable, sum) = distances
                .iter()
                .filter(|&&(node, _)| node != source)
                .fold((0usize, 0.0_f64), |(count, sum), &(_, d)| (count + 1, sum + d));
            if reachable > 0 && sum > 0.0 {
                closeness[source] = reachable as f64 / sum;
            }
        }
        Some(closeness)
    }

    /// Breadth-first hop counts from `source`.
    fn hops(&self, source: usize) -> Vec<(usize, f64)> {
        let mut distance: Vec<Option<usize>> = vec![None; self.len()];
        distance[source] = Some(0);
        let mut queue = VecDeque::from([source]);
        while let Some(v) = queue.pop_front() {
            let next = distance[v].map_or(0, |d| d + 1);
            for &w in &self.neighbors[v] {
                if distance[w].is_none() {
                    distance[w] = Some(next);
                    queue.push_back(w);
                }
            }
        }
        distance
            .into_iter()
            .enumerate()
            .filter_map(|(node, d)| d.map(|d| (node, d as f64)))
            .collect()
    }
}

/// Undirected adjacency used for clustering regardless of edge direction.
fn undirected_neighbors(diagram: &DiagramAst, ids: &[&str]) -> Vec<HashSet<usize>> {
    let index: HashMap<&str, usize> = ids.iter().enumerate().map(|(i, id)| (*id, i)).collect();
    let mut neighbors = vec![HashSet::new(); ids.len()];
    for edge in &diagram.edges {
        if let (Some(&a), Some(&b)) = (index.get(edge.from.as_str()), index.get(edge.to.as_str())) {
            if a != b {
                neighbors[a].insert(b);
                neighbors[b].insert(a);
            }
        }
    }
    neighbors
}

fn clustering(neighbors: &[HashSet<usize>], v: usize) -> f64 {
    let mut around: Vec<usize> = neighbors[v].iter().copied().collect();
    around.sort_unstable();
    let k = around.len();
    if k < 2 {
        return 0.0;
    }
    let mut links = 0usize;
    for (i, &a) in around.iter().enumerate() {
        for &b in &around[i + 1..] {
            if neighbors[a].contains(&b) {
                links += 1;
            }
        }
    }
    2.0 * links as f64 / (k * (k - 1)) as f64
}

/// Computes the requested metrics for `diagram`.
pub fn compute_metrics(diagram: &DiagramAst, options: &MetricsOptions) -> MetricsOutcome {
    if diagram.directed {
        compute::<Directed>(diagram, options)
    } else {
        compute::<Undirected>(diagram, options)
    }
}

fn compute<Ty: EdgeType>(diagram: &DiagramAst, options: &MetricsOptions) -> MetricsOutcome {
    let graph = MetricGraph::<Ty>::new(diagram);

    // Requested kinds per distinct node, first declaration wins.
    let mut requests: IndexMap<&str, Vec<MetricKind>> = IndexMap::new();
    for node in &diagram.nodes {
        if requests.contains_key(node.id.as_str()) {
            continue;
        }
        let kinds = if options.all_nodes {
            MetricKind::ALL.to_vec()
        } else {
            node.metrics.clone()
        };
        if !kinds.is_empty() {
            requests.insert(node.id.as_str(), kinds);
        }
    }
    let wants = |kind: MetricKind| requests.values().any(|kinds| kinds.contains(&kind));

    let mut meter = options.budget.meter();
    let mut complete = true;
    let betweenness = if wants(MetricKind::Betweenness) {
        let result = graph.betweenness(&mut meter);
        complete &= result.is_some();
        result
    } else {
        None
    };
    let closeness = if wants(MetricKind::Closeness) && complete {
        let result = graph.closeness(options.weighted, &mut meter);
        complete &= result.is_some();
        result
    } else {
        None
    };
    if !complete {
        warn!(nodes = graph.len(); "Metrics budget exhausted, path-based metrics omitted");
    }

    let undirected = undirected_neighbors(diagram, &graph.ids);
    let mut out_degree = vec![0usize; graph.len()];
    let mut in_degree = vec![0usize; graph.len()];
    for edge in graph.graph.edge_references() {
        out_degree[edge.source().index()] += 1;
        in_degree[edge.target().index()] += 1;
    }

    let mut metrics = IndexMap::with_capacity(requests.len());
    for (v, id) in graph.ids.iter().enumerate() {
        let Some(kinds) = requests.get(id) else {
            continue;
        };
        let mut entry = NodeMetrics::default();
        for kind in kinds {
            match kind {
                MetricKind::Degree => {
                    entry.degree = Some(out_degree[v] + in_degree[v]);
                    if diagram.directed {
                        entry.in_degree = Some(in_degree[v]);
                        entry.out_degree = Some(out_degree[v]);
                    }
                }
                MetricKind::Betweenness => {
                    entry.betweenness = betweenness.as_ref().map(|values| values[v]);
                }
                MetricKind::Closeness => {
                    entry.closeness = closeness.as_ref().map(|values| values[v]);
                }
                MetricKind::Clustering => entry.clustering = Some(clustering(&undirected, v)),
            }
        }
        metrics.insert((*id).to_string(), entry);
    }

    debug!(nodes = metrics.len(), complete = complete; "Metrics computed");
    MetricsOutcome { metrics, complete }
}
