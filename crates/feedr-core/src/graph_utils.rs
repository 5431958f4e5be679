use crate::arena::ObjectArena;
use crate::model::Element;
use crate::ObjectId;
use petgraph::graph::{NodeIndex, UnGraph};
use std::collections::{HashMap, HashSet, VecDeque};

/// One electrically connected island of the model.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentSummary {
    pub component_id: usize,
    pub members: Vec<ObjectId>,
    pub sources: Vec<ObjectId>,
}

impl ComponentSummary {
    /// Voltage is only well defined when exactly one source feeds the island.
    pub fn has_single_source(&self) -> bool {
        self.sources.len() == 1
    }
}

/// Build an undirected graph over live objects using from/to/parent relations.
pub fn topology_graph(arena: &ObjectArena) -> (UnGraph<ObjectId, ()>, HashMap<ObjectId, NodeIndex>) {
    let mut graph = UnGraph::new_undirected();
    let mut index = HashMap::with_capacity(arena.live_count());
    for (id, _) in arena.iter() {
        index.insert(id, graph.add_node(id));
    }
    for (id, obj) in arena.iter() {
        let here = index[&id];
        for other in obj.references() {
            if let Some(&there) = index.get(&other) {
                graph.add_edge(here, there, ());
            }
        }
    }
    (graph, index)
}

/// Labels connected components (breadth-first search) and lists each one's sources.
///
/// Components are numbered in order of their lowest object id, so the result
/// is stable for a given arena.
pub fn source_components(arena: &ObjectArena) -> Vec<ComponentSummary> {
    let (graph, index) = topology_graph(arena);
    let mut visited = HashSet::new();
    let mut components = Vec::new();

    for start in arena.ids() {
        let start_idx = index[&start];
        if visited.contains(&start_idx) {
            continue;
        }
        let mut queue = VecDeque::new();
        queue.push_back(start_idx);
        let mut members = Vec::new();
        while let Some(node) = queue.pop_front() {
            if !visited.insert(node) {
                continue;
            }
            members.push(graph[node]);
            for neighbor in graph.neighbors(node) {
                if !visited.contains(&neighbor) {
                    queue.push_back(neighbor);
                }
            }
        }
        members.sort();
        let sources = members
            .iter()
            .copied()
            .filter(|id| matches!(arena.get(*id).map(|o| &o.element), Some(Element::Source)))
            .collect();
        components.push(ComponentSummary {
            component_id: components.len(),
            members,
            sources,
        });
    }
    components
}
