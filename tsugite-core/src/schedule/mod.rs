//! # Scheduler
//!
//! Fourth stage of the pipeline: fixes the emission order of a resolved
//! graph.
//!
//! With no async node reachable the schedule is a single stage holding a
//! deterministic topological sort (ties broken by node id, which follows
//! source order). With async nodes the reachable graph is grouped by
//! *async depth* — the number of async predecessors on the longest path
//! from a leaf — and each depth becomes a [`Stage`]: its synchronous nodes
//! run inline first, then its async nodes launch together and the next
//! stage begins only after all of them complete. The root always closes
//! the schedule in a terminal stage of its own.
//!
//! Both passes are O(V+E): one memoized depth walk plus one Kahn sort.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use tracing::debug;

use crate::graph::{Graph, NodeId};

/// Nodes between two barriers. `sync` runs inline in order; `concurrent`
/// nodes are launched together and joined before the next stage.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Stage {
    pub sync: Vec<NodeId>,
    pub concurrent: Vec<NodeId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schedule {
    pub stages: Vec<Stage>,
}

impl Schedule {
    /// Stage index of a node, for invariant checks.
    pub fn stage_of(&self, id: NodeId) -> Option<usize> {
        self.stages.iter().position(|stage| {
            stage.sync.contains(&id) || stage.concurrent.contains(&id)
        })
    }
}

/// Computes the emission schedule for a resolved graph.
pub fn schedule(graph: &Graph) -> Schedule {
    let order = topo_order(graph);
    let has_async = graph
        .reachable_ids()
        .any(|id| graph.node(id).is_async);

    if !has_async {
        debug!(injector = %graph.fn_name, nodes = order.len(), "sequential schedule");
        return Schedule {
            stages: vec![Stage {
                sync: order,
                concurrent: Vec::new(),
            }],
        };
    }

    let depths = async_depths(graph);
    let max_depth = order.iter().map(|id| depths[*id]).max().unwrap_or(0);

    // Position in the global topological order; restricting a topological
    // order to any subset keeps it valid for that subset.
    let mut topo_index = vec![0usize; graph.nodes.len()];
    for (position, id) in order.iter().enumerate() {
        topo_index[*id] = position;
    }

    let mut stages: Vec<Stage> = vec![Stage::default(); max_depth + 1];
    for id in &order {
        if *id == graph.root {
            continue;
        }
        let stage = &mut stages[depths[*id]];
        if graph.node(*id).is_async {
            stage.concurrent.push(*id);
        } else {
            stage.sync.push(*id);
        }
    }
    for stage in &mut stages {
        stage.sync.sort_by_key(|id| topo_index[*id]);
        stage.concurrent.sort();
    }
    stages.retain(|stage| !stage.sync.is_empty() || !stage.concurrent.is_empty());

    let root_stage = if graph.node(graph.root).is_async {
        Stage {
            sync: Vec::new(),
            concurrent: vec![graph.root],
        }
    } else {
        Stage {
            sync: vec![graph.root],
            concurrent: Vec::new(),
        }
    };
    stages.push(root_stage);

    debug!(
        injector = %graph.fn_name,
        stages = stages.len(),
        "staged schedule"
    );
    Schedule { stages }
}

/// Deterministic topological sort of the reachable nodes (Kahn, min-id
/// first among the ready set).
fn topo_order(graph: &Graph) -> Vec<NodeId> {
    let node_count = graph.nodes.len();
    let mut indegree = vec![0usize; node_count];
    let mut consumers: Vec<Vec<NodeId>> = vec![Vec::new(); node_count];
    for consumer in graph.reachable_ids() {
        for producer in &graph.edges[consumer] {
            indegree[consumer] += 1;
            consumers[*producer].push(consumer);
        }
    }

    let mut ready: BinaryHeap<Reverse<NodeId>> = graph
        .reachable_ids()
        .filter(|id| indegree[*id] == 0)
        .map(Reverse)
        .collect();
    let mut order = Vec::with_capacity(node_count);
    while let Some(Reverse(id)) = ready.pop() {
        order.push(id);
        for consumer in &consumers[id] {
            indegree[*consumer] -= 1;
            if indegree[*consumer] == 0 {
                ready.push(Reverse(*consumer));
            }
        }
    }
    order
}

/// Longest-path count of async predecessors per reachable node.
fn async_depths(graph: &Graph) -> Vec<usize> {
    let mut depths: Vec<Option<usize>> = vec![None; graph.nodes.len()];
    for id in graph.reachable_ids() {
        depth_of(graph, id, &mut depths);
    }
    depths.into_iter().map(|d| d.unwrap_or(0)).collect()
}

fn depth_of(graph: &Graph, id: NodeId, depths: &mut Vec<Option<usize>>) -> usize {
    if let Some(depth) = depths[id] {
        return depth;
    }
    let depth = graph.edges[id]
        .iter()
        .map(|producer| {
            let step = usize::from(graph.node(*producer).is_async);
            depth_of(graph, *producer, depths) + step
        })
        .max()
        .unwrap_or(0);
    depths[id] = Some(depth);
    depth
}
