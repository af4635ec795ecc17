#![forbid(unsafe_code)]

//! Decoding of compiled-query rows into result graphs.

use std::fmt;

use rustc_hash::FxHashSet;
use serde::Serialize;
use tracing::debug;

use crate::db::{Record, RecordValue};
use crate::error::{DecodeError, Result};
use crate::graph::records::graph_from_record;
use crate::graph::{Graph, RecordMode};
use crate::printer::Tree;
use crate::query::{CompiledQuery, RowShape, SymmetryPolicy, RESULT_IDS_FIELD};
use crate::types::{NodeId, RelationId};

/// Database ids bound by one embedding, ordered like the pattern variables.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct IdPair {
    /// Node ids, one per query node.
    pub nodes: Vec<NodeId>,
    /// Relation ids, one per query relation.
    pub relations: Vec<RelationId>,
}

impl IdPair {
    /// Ids sorted within each list; equal keys describe the same subgraph.
    fn subgraph_key(&self) -> (Vec<NodeId>, Vec<RelationId>) {
        let mut nodes = self.nodes.clone();
        let mut relations = self.relations.clone();
        nodes.sort_unstable();
        relations.sort_unstable();
        (nodes, relations)
    }
}

/// Outcome of an exact search.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Results {
    /// Union of every matched node and relation; `None` when nothing matched.
    pub graph: Option<Graph>,
    /// One entry per reported embedding, in database order.
    pub ids: Vec<IdPair>,
}

impl Results {
    /// Number of reported embeddings.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// True when nothing matched.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    fn tree(&self) -> Tree {
        let graph = match &self.graph {
            Some(graph) => graph.tree("Graph"),
            None => Tree::new("Graph: (no matches)"),
        };
        let ids = self
            .ids
            .iter()
            .enumerate()
            .map(|(idx, pair)| {
                let join = |ids: Vec<String>| format!("[{}]", ids.join(", "));
                Tree::with_children(
                    idx.to_string(),
                    vec![
                        Tree::new(format!(
                            "Nodes: {}",
                            join(pair.nodes.iter().map(ToString::to_string).collect())
                        )),
                        Tree::new(format!(
                            "Relations: {}",
                            join(pair.relations.iter().map(ToString::to_string).collect())
                        )),
                    ],
                )
            })
            .collect();
        Tree::with_children(
            "Query Results",
            vec![graph, Tree::with_children("Node & Relation IDs", ids)],
        )
    }
}

impl fmt::Display for Results {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.tree(), f)
    }
}

/// Turns the single row of a compiled query into [`Results`].
#[derive(Debug, Clone, Default)]
pub struct ResultAssembler {
    policy: SymmetryPolicy,
    shape: Option<RowShape>,
}

impl ResultAssembler {
    /// Assembler that accepts id pairs of any length.
    pub fn new(policy: SymmetryPolicy) -> Self {
        Self {
            policy,
            shape: None,
        }
    }

    /// Assembler that also checks every id pair against the variables bound
    /// by `query`.
    pub fn for_query(query: &CompiledQuery) -> Self {
        Self {
            policy: query.policy(),
            shape: Some(query.shape().clone()),
        }
    }

    /// Decodes `record`.
    ///
    /// Fails with a decode error when a field is missing or mistyped, when
    /// an id list has the wrong length, or when an id pair names an element
    /// that is not in the returned lists; fails with a lookup error when a
    /// relationship endpoint is missing from the node list.
    pub fn assemble(&self, record: &Record) -> Result<Results> {
        let graph = graph_from_record(record, RecordMode::Result)?;
        let raw = record.get(RESULT_IDS_FIELD)?.as_list(RESULT_IDS_FIELD)?;

        let mut ids = Vec::with_capacity(raw.len());
        for value in raw {
            let pair = self.decode_pair(value)?;
            check_known(&pair, graph.as_ref())?;
            ids.push(pair);
        }
        let reported = ids.len();

        if self.policy == SymmetryPolicy::Dedup {
            let mut seen = FxHashSet::default();
            ids.retain(|pair| seen.insert(pair.subgraph_key()));
        }

        debug!(
            reported,
            kept = ids.len(),
            nodes = graph.as_ref().map_or(0, Graph::node_count),
            relations = graph.as_ref().map_or(0, Graph::relation_count),
            "results.assemble.done"
        );
        Ok(Results { graph, ids })
    }

    fn decode_pair(&self, value: &RecordValue) -> std::result::Result<IdPair, DecodeError> {
        let (nodes, relations) = match value.as_list(RESULT_IDS_FIELD)? {
            [nodes, relations] => (
                nodes.as_int_list(RESULT_IDS_FIELD)?,
                relations.as_int_list(RESULT_IDS_FIELD)?,
            ),
            other => {
                return Err(DecodeError::Arity {
                    context: RESULT_IDS_FIELD.to_owned(),
                    expected: 2,
                    found: other.len(),
                })
            }
        };
        if let Some(shape) = &self.shape {
            check_arity("resultIds nodes", shape.node_arity(), nodes.len())?;
            check_arity("resultIds relations", shape.relation_arity(), relations.len())?;
        }
        Ok(IdPair {
            nodes: nodes.into_iter().map(NodeId).collect(),
            relations: relations.into_iter().map(RelationId).collect(),
        })
    }
}

fn check_arity(context: &str, expected: usize, found: usize) -> std::result::Result<(), DecodeError> {
    if expected == found {
        Ok(())
    } else {
        Err(DecodeError::Arity {
            context: context.to_owned(),
            expected,
            found,
        })
    }
}

fn check_known(pair: &IdPair, graph: Option<&Graph>) -> std::result::Result<(), DecodeError> {
    let dangling = |context: &str, id: i64| DecodeError::DanglingId {
        context: context.to_owned(),
        id,
    };
    for id in &pair.nodes {
        if graph.and_then(|g| g.node(*id)).is_none() {
            return Err(dangling("resultIds nodes", id.0));
        }
    }
    for id in &pair.relations {
        if graph.and_then(|g| g.relation(*id)).is_none() {
            return Err(dangling("resultIds relations", id.0));
        }
    }
    Ok(())
}
