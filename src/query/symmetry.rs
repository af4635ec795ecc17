//! Detection of pattern symmetries that make the database enumerate the same
//! subgraph under several variable bindings.
//!
//! Two nodes are *interchangeable* when they carry identical label and
//! property constraints and swapping them maps the relation multiset onto
//! itself. Interchangeability is an equivalence relation (conjugating one
//! swap by another yields the third), so nodes partition into classes.
//! Parallel relations with identical endpoints and constraints form relation
//! classes. Ordering the ids bound inside every class keeps at least one
//! embedding per matched subgraph.
//!
//! Node pairs that merely resemble each other while hanging off a common
//! neighbor are reported as flagged; they can still produce duplicate
//! subgraphs but swapping them is not an automorphism, so nothing is pruned.

use std::cmp::Ordering;

use serde::Serialize;

use crate::graph::drawing::compare_properties;
use crate::graph::Graph;
use crate::model::{Identified, Node, Properties, Relation, Resembling};
use crate::types::{NodeId, RelationId};

/// Symmetries found in a query graph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SymmetryReport {
    /// Classes of two or more interchangeable nodes, members in id order.
    pub node_classes: Vec<Vec<NodeId>>,
    /// Classes of two or more interchangeable parallel relations.
    pub relation_classes: Vec<Vec<RelationId>>,
    /// Resembling sibling pairs that are not interchangeable.
    pub flagged: Vec<(NodeId, NodeId)>,
}

/// Analyzes `graph` for interchangeable nodes and relations.
pub fn analyze(graph: &Graph) -> SymmetryReport {
    let node_classes = node_classes(graph);
    let relation_classes = relation_classes(graph);
    let flagged = flagged_pairs(graph, &node_classes);
    SymmetryReport {
        node_classes,
        relation_classes,
        flagged,
    }
}

#[derive(Clone, Copy)]
struct Signature<'a> {
    start: NodeId,
    end: NodeId,
    directed: bool,
    label: Option<&'a str>,
    properties: &'a Properties,
}

impl<'a> Signature<'a> {
    fn of(relation: &'a Relation, map: impl Fn(NodeId) -> NodeId) -> Self {
        let mut start = map(relation.start());
        let mut end = map(relation.end());
        if !relation.is_directed() && start > end {
            std::mem::swap(&mut start, &mut end);
        }
        Signature {
            start,
            end,
            directed: relation.is_directed(),
            label: relation.label(),
            properties: relation.properties(),
        }
    }

    fn cmp(&self, other: &Signature<'_>) -> Ordering {
        self.start
            .cmp(&other.start)
            .then(self.end.cmp(&other.end))
            .then(self.directed.cmp(&other.directed))
            .then_with(|| self.label.cmp(&other.label))
            .then_with(|| compare_properties(self.properties, other.properties))
    }
}

fn same_constraints<T: Identified>(a: &T, b: &T) -> bool {
    a.label() == b.label() && a.properties() == b.properties()
}

/// Whether swapping `a` and `b` maps the relation multiset onto itself.
fn swap_is_automorphism(graph: &Graph, a: NodeId, b: NodeId) -> bool {
    let swap = |id: NodeId| {
        if id == a {
            b
        } else if id == b {
            a
        } else {
            id
        }
    };
    let mut before: Vec<Signature<'_>> = graph
        .relations()
        .filter(|rel| rel.touches(a) || rel.touches(b))
        .map(|rel| Signature::of(rel, |id| id))
        .collect();
    let mut after: Vec<Signature<'_>> = graph
        .relations()
        .filter(|rel| rel.touches(a) || rel.touches(b))
        .map(|rel| Signature::of(rel, swap))
        .collect();
    before.sort_by(|x, y| x.cmp(y));
    after.sort_by(|x, y| x.cmp(y));
    before
        .iter()
        .zip(after.iter())
        .all(|(x, y)| x.cmp(y) == Ordering::Equal)
}

fn interchangeable(graph: &Graph, a: &Node, b: &Node) -> bool {
    same_constraints(a, b) && swap_is_automorphism(graph, a.id(), b.id())
}

fn node_classes(graph: &Graph) -> Vec<Vec<NodeId>> {
    let mut classes: Vec<Vec<NodeId>> = Vec::new();
    for node in graph.nodes() {
        let joined = classes.iter_mut().find(|class| {
            graph
                .node(class[0])
                .is_some_and(|rep| interchangeable(graph, rep, node))
        });
        match joined {
            Some(class) => class.push(node.id()),
            None => classes.push(vec![node.id()]),
        }
    }
    classes.retain(|class| class.len() > 1);
    classes
}

fn relation_classes(graph: &Graph) -> Vec<Vec<RelationId>> {
    let mut classes: Vec<Vec<RelationId>> = Vec::new();
    for relation in graph.relations() {
        let sig = Signature::of(relation, |id| id);
        let joined = classes.iter_mut().find(|class| {
            graph.relation(class[0]).is_some_and(|rep| {
                Signature::of(rep, |id| id).cmp(&sig) == Ordering::Equal
            })
        });
        match joined {
            Some(class) => class.push(relation.id()),
            None => classes.push(vec![relation.id()]),
        }
    }
    classes.retain(|class| class.len() > 1);
    classes
}

fn flagged_pairs(graph: &Graph, classes: &[Vec<NodeId>]) -> Vec<(NodeId, NodeId)> {
    let same_class = |a: NodeId, b: NodeId| {
        classes
            .iter()
            .any(|class| class.contains(&a) && class.contains(&b))
    };
    let mut flagged = Vec::new();
    for node in graph.nodes() {
        let siblings: Vec<&Node> = graph
            .neighbors(node.id())
            .into_iter()
            .filter_map(|id| graph.node(id))
            .collect();
        for (idx, a) in siblings.iter().enumerate() {
            for b in &siblings[idx + 1..] {
                let pair = (a.id(), b.id());
                if a.resembles(b) && !same_class(pair.0, pair.1) && !flagged.contains(&pair) {
                    flagged.push(pair);
                }
            }
        }
    }
    flagged.sort();
    flagged
}
