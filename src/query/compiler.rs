//! Query graph to Cypher translation.
//!
//! The emitted query has a fixed shape. One `MATCH` binds a variable per node
//! (`n<id>`) and per relation (`r<id>`), an optional `WHERE` carries null
//! checks and symmetry-breaking predicates, and a single aggregated row is
//! returned:
//!
//! * `nodes`: distinct matched nodes,
//! * `relationships`: distinct matched relationships,
//! * `resultIds`: one `[[node ids], [relation ids]]` pair per embedding,
//!   ordered like the pattern variables.
//!
//! The text only depends on the canonical graph, the options, and the
//! metadata snapshot, so the same drawing always compiles to the same query.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::cypher::{identifier, property_map};
use super::symmetry::{self, SymmetryReport};
use crate::graph::Graph;
use crate::metadata::DbMetadata;
use crate::model::{Identified, Node, Relation};
use crate::types::{NodeId, RelationId};

/// Field holding the distinct matched nodes.
pub const NODES_FIELD: &str = "nodes";
/// Field holding the distinct matched relationships.
pub const RELATIONSHIPS_FIELD: &str = "relationships";
/// Field holding the per-embedding id pairs.
pub const RESULT_IDS_FIELD: &str = "resultIds";

const DISTINCT_NODES: &str =
    "reduce(acc = [], x IN nodeList | CASE WHEN x IN acc THEN acc ELSE acc + x END)";
const DISTINCT_RELATIONS: &str =
    "reduce(acc = [], x IN relationList | CASE WHEN x IN acc THEN acc ELSE acc + x END)";

/// How the compiler treats automorphic parts of a pattern.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymmetryPolicy {
    /// Order the ids bound to interchangeable variables so each matched
    /// subgraph is reported once per symmetry orbit.
    #[default]
    Break,
    /// Report every embedding.
    Preserve,
    /// Report every embedding from the database and collapse identical id
    /// sets during assembly.
    Dedup,
}

impl SymmetryPolicy {
    /// Lowercase name, as used in configuration files.
    pub fn as_str(&self) -> &'static str {
        match self {
            SymmetryPolicy::Break => "break",
            SymmetryPolicy::Preserve => "preserve",
            SymmetryPolicy::Dedup => "dedup",
        }
    }
}

impl fmt::Display for SymmetryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SymmetryPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "break" => Ok(SymmetryPolicy::Break),
            "preserve" => Ok(SymmetryPolicy::Preserve),
            "dedup" => Ok(SymmetryPolicy::Dedup),
            other => Err(format!(
                "unknown symmetry policy '{other}' (expected break, preserve, or dedup)"
            )),
        }
    }
}

/// Knobs for [`QueryCompiler`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerOptions {
    /// Symmetry handling.
    pub symmetry: SymmetryPolicy,
    /// Drop label filters that every element in the database satisfies.
    /// Only takes effect when metadata is attached.
    pub prune_redundant_labels: bool,
    /// Prefix of node variables.
    pub node_prefix: String,
    /// Prefix of relation variables.
    pub relation_prefix: String,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            symmetry: SymmetryPolicy::default(),
            prune_redundant_labels: true,
            node_prefix: "n".to_owned(),
            relation_prefix: "r".to_owned(),
        }
    }
}

/// Variables bound by a compiled query, in the order their ids appear in
/// each `resultIds` pair.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RowShape {
    /// Node variables by query node id.
    pub nodes: Vec<(NodeId, String)>,
    /// Relation variables by query relation id.
    pub relations: Vec<(RelationId, String)>,
}

impl RowShape {
    /// Node ids expected per embedding.
    pub fn node_arity(&self) -> usize {
        self.nodes.len()
    }

    /// Relation ids expected per embedding.
    pub fn relation_arity(&self) -> usize {
        self.relations.len()
    }
}

/// Output of [`QueryCompiler::translate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompiledQuery {
    text: String,
    shape: RowShape,
    policy: SymmetryPolicy,
    symmetry: SymmetryReport,
}

impl CompiledQuery {
    /// Cypher text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Variables and id-pair arity of the result row.
    pub fn shape(&self) -> &RowShape {
        &self.shape
    }

    /// Policy the query was compiled with.
    pub fn policy(&self) -> SymmetryPolicy {
        self.policy
    }

    /// Symmetries found in the query graph.
    pub fn symmetry(&self) -> &SymmetryReport {
        &self.symmetry
    }
}

impl fmt::Display for CompiledQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Translates validated query graphs into Cypher.
#[derive(Debug, Clone, Default)]
pub struct QueryCompiler {
    options: CompilerOptions,
    metadata: Option<Arc<DbMetadata>>,
}

impl QueryCompiler {
    /// Creates a compiler without metadata.
    pub fn new(options: CompilerOptions) -> Self {
        Self {
            options,
            metadata: None,
        }
    }

    /// Attaches a metadata snapshot used to prune non-discriminating labels.
    pub fn with_metadata(mut self, metadata: Arc<DbMetadata>) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Compiles `graph`. Never fails for a constructed graph.
    pub fn translate(&self, graph: &Graph) -> CompiledQuery {
        let report = symmetry::analyze(graph);
        for (a, b) in &report.flagged {
            warn!(
                first = %a,
                second = %b,
                "compiler.symmetry.flagged"
            );
        }

        let shape = RowShape {
            nodes: graph
                .node_ids()
                .map(|id| (id, self.node_var(id)))
                .collect(),
            relations: graph
                .relation_ids()
                .map(|id| (id, self.relation_var(id)))
                .collect(),
        };

        let pattern = self.pattern(graph);
        let predicates = self.predicates(graph, &report);

        let mut text = format!("MATCH {pattern}\n");
        if let Some((first, rest)) = predicates.split_first() {
            text.push_str("WHERE ");
            text.push_str(first);
            text.push('\n');
            for predicate in rest {
                text.push_str("  AND ");
                text.push_str(predicate);
                text.push('\n');
            }
        }
        text.push_str(&projection(&shape));

        debug!(
            nodes = graph.node_count(),
            relations = graph.relation_count(),
            predicates = predicates.len(),
            policy = %self.options.symmetry,
            "compiler.translate.done"
        );

        CompiledQuery {
            text,
            shape,
            policy: self.options.symmetry,
            symmetry: report,
        }
    }

    fn node_var(&self, id: NodeId) -> String {
        variable(&self.options.node_prefix, id.0)
    }

    fn relation_var(&self, id: RelationId) -> String {
        variable(&self.options.relation_prefix, id.0)
    }

    fn keeps_node_label(&self, label: &str) -> bool {
        match (&self.metadata, self.options.prune_redundant_labels) {
            (Some(meta), true) => !meta.is_redundant_node_label(label),
            _ => true,
        }
    }

    fn keeps_relation_label(&self, label: &str) -> bool {
        match (&self.metadata, self.options.prune_redundant_labels) {
            (Some(meta), true) => !meta.is_redundant_relation_label(label),
            _ => true,
        }
    }

    fn node_declaration(&self, node: &Node) -> String {
        let mut out = self.node_var(node.id());
        if let Some(label) = node.label().filter(|l| self.keeps_node_label(l)) {
            out.push(':');
            out.push_str(&identifier(label));
        }
        if let Some(map) = property_map(node.properties()) {
            out.push(' ');
            out.push_str(&map);
        }
        format!("({out})")
    }

    fn relation_pattern(&self, relation: &Relation, from: NodeId) -> String {
        let mut body = self.relation_var(relation.id());
        if let Some(label) = relation.label().filter(|l| self.keeps_relation_label(l)) {
            body.push(':');
            body.push_str(&identifier(label));
        }
        if let Some(map) = property_map(relation.properties()) {
            body.push(' ');
            body.push_str(&map);
        }
        if !relation.is_directed() {
            format!("-[{body}]-")
        } else if relation.start() == from {
            format!("-[{body}]->")
        } else {
            format!("<-[{body}]-")
        }
    }

    /// Comma-separated chains covering every node and relation. Each chain
    /// starts from the lowest already-bound node that still has an unused
    /// relation and always follows the lowest unused incident relation.
    fn pattern(&self, graph: &Graph) -> String {
        let mut declared: BTreeSet<NodeId> = BTreeSet::new();
        let mut used: BTreeSet<RelationId> = BTreeSet::new();
        let mut chains = Vec::new();

        let render_node = |id: NodeId, declared: &mut BTreeSet<NodeId>| -> String {
            match graph.node(id) {
                Some(node) if declared.insert(id) => self.node_declaration(node),
                _ => format!("({})", self.node_var(id)),
            }
        };

        let Some(first) = graph.node_ids().next() else {
            return String::new();
        };

        loop {
            let start = if chains.is_empty() {
                Some(first)
            } else {
                declared
                    .iter()
                    .copied()
                    .find(|id| graph.incident(*id).any(|rel| !used.contains(&rel.id())))
            };
            let Some(mut current) = start else {
                break;
            };

            let mut chain = render_node(current, &mut declared);
            while let Some(rel) = graph
                .incident(current)
                .find(|rel| !used.contains(&rel.id()))
            {
                used.insert(rel.id());
                chain.push_str(&self.relation_pattern(rel, current));
                current = rel.other(current).unwrap_or(current);
                chain.push_str(&render_node(current, &mut declared));
            }
            chains.push(chain);
        }

        chains.join(", ")
    }

    fn predicates(&self, graph: &Graph, report: &SymmetryReport) -> Vec<String> {
        let mut predicates = Vec::new();
        for node in graph.nodes() {
            let var = self.node_var(node.id());
            for (key, value) in node.properties() {
                if value.is_null() {
                    predicates.push(format!("{var}.{} IS NULL", identifier(key)));
                }
            }
        }
        for relation in graph.relations() {
            let var = self.relation_var(relation.id());
            for (key, value) in relation.properties() {
                if value.is_null() {
                    predicates.push(format!("{var}.{} IS NULL", identifier(key)));
                }
            }
        }

        if self.options.symmetry == SymmetryPolicy::Break {
            for class in &report.node_classes {
                for pair in class.windows(2) {
                    predicates.push(format!(
                        "id({}) <= id({})",
                        self.node_var(pair[0]),
                        self.node_var(pair[1])
                    ));
                }
            }
            for class in &report.relation_classes {
                for pair in class.windows(2) {
                    predicates.push(format!(
                        "id({}) < id({})",
                        self.relation_var(pair[0]),
                        self.relation_var(pair[1])
                    ));
                }
            }
        }
        predicates
    }
}

fn variable(prefix: &str, id: i64) -> String {
    if id < 0 {
        format!("{prefix}_{}", id.unsigned_abs())
    } else {
        format!("{prefix}{id}")
    }
}

fn projection(shape: &RowShape) -> String {
    let node_ids: Vec<String> = shape.nodes.iter().map(|(_, v)| format!("id({v})")).collect();
    let rel_ids: Vec<String> = shape
        .relations
        .iter()
        .map(|(_, v)| format!("id({v})"))
        .collect();
    let node_list = shape
        .nodes
        .iter()
        .map(|(_, v)| format!("collect({v})"))
        .collect::<Vec<_>>()
        .join(" + ");
    let relation_list = if shape.relations.is_empty() {
        "[]".to_owned()
    } else {
        shape
            .relations
            .iter()
            .map(|(_, v)| format!("collect({v})"))
            .collect::<Vec<_>>()
            .join(" + ")
    };

    format!(
        "WITH collect([[{}], [{}]]) AS {RESULT_IDS_FIELD},\n     \
         {node_list} AS nodeList,\n     \
         {relation_list} AS relationList\n\
         RETURN {DISTINCT_NODES} AS {NODES_FIELD},\n       \
         {DISTINCT_RELATIONS} AS {RELATIONSHIPS_FIELD},\n       \
         {RESULT_IDS_FIELD}",
        node_ids.join(", "),
        rel_ids.join(", "),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{SketchEdge, SketchVertex};

    fn compile(vertices: Vec<SketchVertex>, edges: Vec<SketchEdge>) -> CompiledQuery {
        let graph = Graph::from_drawing(&vertices, &edges).expect("graph");
        QueryCompiler::new(CompilerOptions::default()).translate(&graph)
    }

    #[test]
    fn single_node_has_empty_relation_list() {
        let query = compile(vec![SketchVertex::new("a", Some("Person"))], vec![]);
        assert_eq!(
            query.text(),
            "MATCH (n0:Person)\n\
             WITH collect([[id(n0)], []]) AS resultIds,\n     \
             collect(n0) AS nodeList,\n     \
             [] AS relationList\n\
             RETURN reduce(acc = [], x IN nodeList | CASE WHEN x IN acc THEN acc ELSE acc + x END) AS nodes,\n       \
             reduce(acc = [], x IN relationList | CASE WHEN x IN acc THEN acc ELSE acc + x END) AS relationships,\n       \
             resultIds"
        );
        assert_eq!(query.shape().node_arity(), 1);
        assert_eq!(query.shape().relation_arity(), 0);
    }

    #[test]
    fn directed_edges_follow_traversal_orientation() {
        let query = compile(
            vec![
                SketchVertex::new("a", Some("Person")),
                SketchVertex::new("b", Some("Company")),
                SketchVertex::new("c", Some("City")),
            ],
            vec![
                SketchEdge::new("a", "b", true, Some("WORKS_AT")),
                SketchEdge::new("c", "b", true, Some("HOSTS")),
            ],
        );
        assert!(query
            .text()
            .starts_with("MATCH (n0:Person)-[r0:WORKS_AT]->(n1:Company)<-[r1:HOSTS]-(n2:City)\n"));
        assert!(!query.text().contains("WHERE"));
    }

    #[test]
    fn branches_become_separate_chains() {
        let query = compile(
            vec![
                SketchVertex::new("hub", Some("Company")),
                SketchVertex::new("x", Some("Person")),
                SketchVertex::new("y", Some("City")),
            ],
            vec![
                SketchEdge::new("x", "hub", true, Some("WORKS_AT")),
                SketchEdge::new("hub", "y", true, Some("LOCATED_IN")),
            ],
        );
        // r0 = hub->y (start 0), r1 = x->hub (start 1)
        assert!(query.text().starts_with(
            "MATCH (n0:Company)-[r0:LOCATED_IN]->(n2:City), (n0)<-[r1:WORKS_AT]-(n1:Person)\n"
        ));
    }

    #[test]
    fn properties_and_nulls_become_filters() {
        let query = compile(
            vec![
                SketchVertex::new("a", Some("Person"))
                    .with_property("age", 30_i64)
                    .with_property("nickname", crate::Value::Null),
                SketchVertex::new("b", Some("first name")),
            ],
            vec![SketchEdge::new("a", "b", true, None).with_property("since", 2020_i64)],
        );
        assert!(query.text().starts_with(
            "MATCH (n0:Person {age: 30})-[r0 {since: 2020}]->(n1:`first name`)\n\
             WHERE n0.nickname IS NULL\n"
        ));
    }

    #[test]
    fn self_loops_close_on_the_same_variable() {
        let query = compile(
            vec![SketchVertex::new("a", None)],
            vec![SketchEdge::new("a", "a", true, Some("LIKES"))],
        );
        assert!(query.text().starts_with("MATCH (n0)-[r0:LIKES]->(n0)\n"));
    }

    #[test]
    fn policies_control_symmetry_predicates() {
        let vertices = vec![
            SketchVertex::new("a", Some("Person")),
            SketchVertex::new("b", Some("Person")),
        ];
        let edges = vec![SketchEdge::new("a", "b", false, Some("KNOWS"))];
        let graph = Graph::from_drawing(&vertices, &edges).expect("graph");

        let broken = QueryCompiler::default().translate(&graph);
        assert!(broken.text().contains("WHERE id(n0) <= id(n1)\n"));

        for policy in [SymmetryPolicy::Preserve, SymmetryPolicy::Dedup] {
            let options = CompilerOptions {
                symmetry: policy,
                ..CompilerOptions::default()
            };
            let query = QueryCompiler::new(options).translate(&graph);
            assert!(!query.text().contains("WHERE"));
            assert_eq!(query.policy(), policy);
            assert_eq!(query.symmetry().node_classes.len(), 1);
        }
    }

    #[test]
    fn parallel_relations_are_ordered_strictly() {
        let query = compile(
            vec![
                SketchVertex::new("a", Some("Person")),
                SketchVertex::new("b", Some("City")),
            ],
            vec![
                SketchEdge::new("a", "b", true, Some("VISITED")),
                SketchEdge::new("a", "b", true, Some("VISITED")),
            ],
        );
        assert!(query.text().starts_with(
            "MATCH (n0:Person)-[r0:VISITED]->(n1:City)<-[r1:VISITED]-(n0)\n\
             WHERE id(r0) < id(r1)\n"
        ));
    }

    #[test]
    fn custom_prefixes_are_used_everywhere() {
        let graph = Graph::from_drawing(
            &[SketchVertex::new("a", None), SketchVertex::new("b", None)],
            &[SketchEdge::new("a", "b", true, None)],
        )
        .expect("graph");
        let options = CompilerOptions {
            node_prefix: "v".into(),
            relation_prefix: "e".into(),
            ..CompilerOptions::default()
        };
        let query = QueryCompiler::new(options).translate(&graph);
        assert!(query.text().starts_with("MATCH (v0)-[e0]->(v1)\n"));
        assert!(query.text().contains("collect([[id(v0), id(v1)], [id(e0)]])"));
    }

    #[test]
    fn policy_parses_case_insensitively() {
        assert_eq!("Dedup".parse::<SymmetryPolicy>(), Ok(SymmetryPolicy::Dedup));
        assert!("sometimes".parse::<SymmetryPolicy>().is_err());
        assert_eq!(SymmetryPolicy::Preserve.to_string(), "preserve");
    }
}
