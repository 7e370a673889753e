//! Compilation of a query graph into the store's staged query program.
//!
//! The linked [`NodeQuery`] graph is flattened into a petgraph plan whose
//! edges all carry their forward orientation. Emission then produces one
//! `var` stage per pattern node (scanning from that node's best entry
//! function and binding a variable at every occurrence of the root), a
//! coalesce stage that unions the root bindings, and a final projection
//! over the coalesced uids. Each stage walks every pattern edge exactly
//! once, so cycles terminate.

use std::collections::{HashMap, HashSet};

use petgraph::stable_graph::{EdgeIndex, NodeIndex, StableDiGraph};

use grapl_core::cmp::escape_string;
use grapl_core::filter::render_node_filter;
use grapl_core::{Cmp, NODE_KEY, TYPE_TAG, UID};

use crate::node_query::NodeQuery;

/// Knobs for one compilation.
#[derive(Debug, Clone)]
pub struct QueryOptions {
    /// Page size of the final projection.
    pub first: u64,
    /// Project a match count instead of the matching nodes.
    pub count: bool,
    /// Pin the root scan to one node key and a single result.
    pub contains_node_key: Option<String>,
}

impl Default for QueryOptions {
    fn default() -> Self {
        QueryOptions {
            first: 1000,
            count: false,
            contains_node_key: None,
        }
    }
}

struct PlanEdge {
    /// The forward name of the pattern edge; reverse traversal prefixes `~`.
    name: String,
}

struct Plan {
    graph: StableDiGraph<NodeQuery, PlanEdge>,
    /// Pattern edges in insertion order, so emission is deterministic.
    edge_order: Vec<EdgeIndex>,
    /// DFS discovery order; the root is first.
    node_order: Vec<NodeIndex>,
    root: NodeIndex,
}

/// Compiles the pattern rooted at `root` into one executable query text.
pub fn compile(root: &NodeQuery, options: &QueryOptions) -> String {
    let plan = flatten(root);
    let mut out = String::from("{\n");
    let mut all_bindings: Vec<String> = Vec::new();

    for (stage, &start) in plan.node_order.iter().enumerate() {
        let query = &plan.graph[start];
        let contains = if start == plan.root {
            options.contains_node_key.as_deref()
        } else {
            None
        };
        let entry = entry_function(query, contains);
        let filter = render_node_filter(&query.property_filters());

        let mut bindings = Vec::new();
        out.push_str("  ");
        if start == plan.root {
            let binding = format!("RootBinding{stage}_0");
            out.push_str(&binding);
            out.push_str(" as ");
            bindings.push(binding);
        }
        out.push_str(&format!("var(func: {entry})"));
        if let Some(f) = &filter {
            out.push_str(&format!(" @filter({f})"));
        }
        out.push_str(" @cascade {\n");

        let mut emitter = Emitter {
            plan: &plan,
            visited: HashSet::new(),
            stage,
            bindings,
            bind_roots: true,
            out: &mut out,
        };
        emitter.walk(start, 2);
        all_bindings.extend(emitter.bindings);
        out.push_str("  }\n");
    }

    // Coalesce the per-stage root bindings into one variable.
    out.push_str(&format!(
        "  CoalesceRoot as var(func: uid({})) @cascade {{\n",
        all_bindings.join(", ")
    ));
    let mut emitter = Emitter {
        plan: &plan,
        visited: HashSet::new(),
        stage: 0,
        bindings: Vec::new(),
        bind_roots: false,
        out: &mut out,
    };
    emitter.walk(plan.root, 2);
    out.push_str("  }\n");

    if options.count {
        out.push_str("  res(func: uid(CoalesceRoot)) {\n    count(uid)\n  }\n");
    } else {
        let first = if options.contains_node_key.is_some() {
            1
        } else {
            options.first
        };
        out.push_str(&format!(
            "  res(func: uid(CoalesceRoot), first: {first}) {{\n"
        ));
        let mut emitter = Emitter {
            plan: &plan,
            visited: HashSet::new(),
            stage: 0,
            bindings: Vec::new(),
            bind_roots: false,
            out: &mut out,
        };
        emitter.project(plan.root, 2);
        out.push_str("  }\n");
    }

    out.push('}');
    out
}

// ---------------------------------------------------------------------------
// Flattening
// ---------------------------------------------------------------------------

fn flatten(root: &NodeQuery) -> Plan {
    let mut graph = StableDiGraph::new();
    let mut index_of: HashMap<usize, NodeIndex> = HashMap::new();
    let mut node_order = Vec::new();

    discover(root, &mut graph, &mut index_of, &mut node_order);

    // Attachment is symmetric, so forward maps alone cover every pattern
    // edge; the seen set drops the mirrored rediscoveries.
    let mut edge_order = Vec::new();
    let mut seen: HashSet<(usize, String, usize)> = HashSet::new();
    for &idx in &node_order {
        let query = graph[idx].clone();
        for (name, neighbors) in query.forward_edges() {
            for neighbor in neighbors {
                let key = (query.ptr_id(), name.clone(), neighbor.ptr_id());
                if seen.insert(key) {
                    let edge = graph.add_edge(
                        idx,
                        index_of[&neighbor.ptr_id()],
                        PlanEdge { name: name.clone() },
                    );
                    edge_order.push(edge);
                }
            }
        }
    }

    let root_idx = node_order[0];
    Plan {
        graph,
        edge_order,
        node_order,
        root: root_idx,
    }
}

fn discover(
    query: &NodeQuery,
    graph: &mut StableDiGraph<NodeQuery, PlanEdge>,
    index_of: &mut HashMap<usize, NodeIndex>,
    node_order: &mut Vec<NodeIndex>,
) {
    if index_of.contains_key(&query.ptr_id()) {
        return;
    }
    let idx = graph.add_node(query.clone());
    index_of.insert(query.ptr_id(), idx);
    node_order.push(idx);
    for (_, neighbors) in query.forward_edges() {
        for neighbor in neighbors {
            discover(&neighbor, graph, index_of, node_order);
        }
    }
    for (_, neighbors) in query.reverse_edges() {
        for (neighbor, _) in neighbors {
            discover(&neighbor, graph, index_of, node_order);
        }
    }
}

// ---------------------------------------------------------------------------
// Entry function selection
// ---------------------------------------------------------------------------

/// Picks the scan function for a stage root, preferring the cheapest
/// available indexed lookup.
fn entry_function(query: &NodeQuery, contains_node_key: Option<&str>) -> String {
    if let Some(key) = contains_node_key {
        return format!("eq({NODE_KEY}, \"{}\")", escape_string(key));
    }
    let filters = query.property_filters();
    for special in [NODE_KEY, UID] {
        if let Some(cmp) = single_eq(filters.get(special).map(Vec::as_slice)) {
            return cmp.render();
        }
    }
    for (name, filter) in filters.iter() {
        if name.as_str() == NODE_KEY || name.as_str() == UID || name.as_str() == TYPE_TAG {
            continue;
        }
        if let Some(cmp) = single_eq(Some(filter.as_slice())) {
            return cmp.render();
        }
    }
    if let Some(cmp) = filters
        .get(TYPE_TAG)
        .and_then(|f| f.first())
        .and_then(|clause| clause.first())
    {
        return cmp.render();
    }
    if let Some(pred) = query.unique_predicate() {
        return format!("has({pred})");
    }
    format!("has({NODE_KEY})")
}

/// A filter usable as an `eq` entry: exactly one clause holding exactly one
/// non-negated equality.
fn single_eq(filter: Option<&[Vec<Cmp>]>) -> Option<&Cmp> {
    match filter {
        Some([clause]) => match clause.as_slice() {
            [cmp @ Cmp::Eq { negated: false, .. }] => Some(cmp),
            _ => None,
        },
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Emission
// ---------------------------------------------------------------------------

struct Emitter<'a> {
    plan: &'a Plan,
    visited: HashSet<EdgeIndex>,
    stage: usize,
    bindings: Vec<String>,
    bind_roots: bool,
    out: &'a mut String,
}

impl Emitter<'_> {
    fn line(&mut self, depth: usize, text: &str) {
        for _ in 0..depth {
            self.out.push_str("  ");
        }
        self.out.push_str(text);
        self.out.push('\n');
    }

    /// Incident pattern edges not yet traversed this stage, in insertion
    /// order, each with the node on the far side and its orientation.
    fn pending_edges(&self, at: NodeIndex) -> Vec<(EdgeIndex, NodeIndex, bool)> {
        self.plan
            .edge_order
            .iter()
            .copied()
            .filter(|edge| !self.visited.contains(edge))
            .filter_map(|edge| {
                let (src, dst) = self.plan.graph.edge_endpoints(edge)?;
                if src == at {
                    Some((edge, dst, false))
                } else if dst == at {
                    Some((edge, src, true))
                } else {
                    None
                }
            })
            .collect()
    }

    /// The walk body of a var stage: `uid` plus every untraversed incident
    /// edge, binding a variable at each root occurrence.
    fn walk(&mut self, at: NodeIndex, depth: usize) {
        self.line(depth, "uid");
        for (edge, other, reverse) in self.pending_edges(at) {
            // A deeper recursion may have consumed it since collection.
            if !self.visited.insert(edge) {
                continue;
            }
            let name = &self.plan.graph[edge].name;
            let label = if reverse {
                format!("~{name}")
            } else {
                name.clone()
            };
            let mut head = String::new();
            if self.bind_roots && other == self.plan.root {
                let binding = format!("RootBinding{}_{}", self.stage, self.bindings.len());
                head.push_str(&binding);
                head.push_str(" as ");
                self.bindings.push(binding);
            }
            head.push_str(&label);
            if let Some(f) = render_node_filter(&self.plan.graph[other].property_filters()) {
                head.push_str(&format!(" @filter({f})"));
            }
            head.push_str(" {");
            self.line(depth, &head);
            self.walk(other, depth + 1);
            self.line(depth, "}");
        }
    }

    /// The projection body: identity predicates, the filtered properties,
    /// then the pattern edges with their filters.
    fn project(&mut self, at: NodeIndex, depth: usize) {
        self.line(depth, UID);
        self.line(depth, NODE_KEY);
        self.line(depth, TYPE_TAG);

        let query = self.plan.graph[at].clone();
        let unique = query.unique_predicate();
        if let Some(pred) = &unique {
            self.line(depth, pred);
        }
        for (name, _) in query.property_filters() {
            if name == NODE_KEY || name == UID || name == TYPE_TAG {
                continue;
            }
            if Some(&name) == unique.as_ref() {
                continue;
            }
            self.line(depth, &name);
        }

        for (edge, other, reverse) in self.pending_edges(at) {
            if !self.visited.insert(edge) {
                continue;
            }
            let name = &self.plan.graph[edge].name;
            let label = if reverse {
                format!("~{name}")
            } else {
                name.clone()
            };
            let mut head = label;
            if let Some(f) = render_node_filter(&self.plan.graph[other].property_filters()) {
                head.push_str(&format!(" @filter({f})"));
            }
            head.push_str(" {");
            self.line(depth, &head);
            self.project(other, depth + 1);
            self.line(depth, "}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grapl_core::cmp::{IntCmp, StrCmp};
    use grapl_core::{EdgeRelation, EdgeT, NodeSchema, PropertyType, SchemaRegistry};

    fn registry() -> SchemaRegistry {
        let mut registry = SchemaRegistry::new();
        registry.register(
            NodeSchema::new("Process")
                .with_property("process_id", PropertyType::int_prop())
                .with_property("process_name", PropertyType::str_prop())
                .with_forward_edge(
                    "children",
                    EdgeT::new("Process", "Process", EdgeRelation::OneToMany),
                    "parent",
                )
                .with_forward_edge(
                    "bin_file",
                    EdgeT::new("Process", "File", EdgeRelation::ManyToOne),
                    "spawned_from",
                )
                .with_unique_predicate("process_id"),
        );
        registry.register(
            NodeSchema::new("File")
                .with_property("file_path", PropertyType::str_prop())
                .with_unique_predicate("file_path"),
        );
        registry.materialize_reverses().unwrap();
        registry
    }

    fn process() -> NodeQuery {
        NodeQuery::for_schema(registry().schema("Process").unwrap().clone())
    }

    fn file() -> NodeQuery {
        NodeQuery::for_schema(registry().schema("File").unwrap().clone())
    }

    #[test]
    fn single_node_program_shape() {
        let query = process().with_node_key_eq("p1");
        let text = compile(&query, &QueryOptions::default());
        let expected = "{\n\
            \x20 RootBinding0_0 as var(func: eq(node_key, \"p1\")) \
            @filter((eq(node_key, \"p1\")) AND (type(Process))) @cascade {\n\
            \x20   uid\n\
            \x20 }\n\
            \x20 CoalesceRoot as var(func: uid(RootBinding0_0)) @cascade {\n\
            \x20   uid\n\
            \x20 }\n\
            \x20 res(func: uid(CoalesceRoot), first: 1000) {\n\
            \x20   uid\n\
            \x20   node_key\n\
            \x20   dgraph.type\n\
            \x20   process_id\n\
            \x20 }\n\
            }";
        assert_eq!(text, expected);
    }

    #[test]
    fn entry_prefers_node_key_then_property_then_type() {
        let by_key = process().with_node_key_eq("p1");
        assert!(compile(&by_key, &QueryOptions::default())
            .contains("var(func: eq(node_key, \"p1\"))"));

        let by_prop = process()
            .with_str_filter("process_name", &[StrCmp::eq("word.exe")])
            .unwrap();
        assert!(compile(&by_prop, &QueryOptions::default())
            .contains("var(func: eq(process_name, \"word.exe\"))"));

        let by_type = process();
        assert!(compile(&by_type, &QueryOptions::default()).contains("var(func: type(Process))"));
    }

    #[test]
    fn or_filters_do_not_become_entry_functions() {
        // A multi-clause filter cannot seed the scan; the type tag does.
        let query = process()
            .with_str_filter("process_name", &[StrCmp::eq(vec!["a.exe", "b.exe"])])
            .unwrap();
        let text = compile(&query, &QueryOptions::default());
        assert!(text.contains("var(func: type(Process))"));
        assert!(text
            .contains("(eq(process_name, \"a.exe\")) OR (eq(process_name, \"b.exe\"))"));
    }

    #[test]
    fn uid_entry_function() {
        let query = process().with_uid_eq("0x1f");
        assert!(compile(&query, &QueryOptions::default()).contains("var(func: uid(0x1f))"));
    }

    #[test]
    fn each_pattern_node_gets_a_stage_and_a_binding() {
        let child = process();
        let parent = process()
            .with_node_key_eq("p1")
            .with_edge("children", child)
            .unwrap();
        let text = compile(&parent, &QueryOptions::default());

        // Stage 0 scans the root and walks forward.
        assert!(text.contains("RootBinding0_0 as var(func: eq(node_key, \"p1\"))"));
        assert!(text.contains("children @filter("));
        // Stage 1 scans the child and reaches the root over the reverse edge.
        assert!(text.contains("RootBinding1_0 as ~children @filter("));
        // Both bindings are coalesced.
        assert!(text.contains("CoalesceRoot as var(func: uid(RootBinding0_0, RootBinding1_0))"));
    }

    #[test]
    fn reverse_declared_edges_emit_tilde() {
        let parent = process();
        let child = process()
            .with_node_key_eq("c1")
            .with_edge("parent", parent)
            .unwrap();
        let text = compile(&child, &QueryOptions::default());
        // The pattern edge is stored forward (parent -> children -> child),
        // so from the child it renders reversed.
        assert!(text.contains("~children"));
    }

    #[test]
    fn cyclic_pattern_terminates() {
        let query = process().with_node_key_eq("p1");
        let query = query.clone().with_edge("children", query).unwrap();
        let text = compile(&query, &QueryOptions::default());
        // The self-loop occurrence of the root binds a second variable.
        assert!(text.contains("RootBinding0_1 as children"));
        assert!(text.contains("uid(RootBinding0_0, RootBinding0_1)"));
    }

    #[test]
    fn count_projection() {
        let query = process().with_node_key_eq("p1");
        let text = compile(
            &query,
            &QueryOptions {
                count: true,
                ..QueryOptions::default()
            },
        );
        assert!(text.contains("res(func: uid(CoalesceRoot)) {\n    count(uid)\n  }"));
        assert!(!text.contains("first:"));
    }

    #[test]
    fn contains_node_key_pins_entry_and_first() {
        let query = process();
        let text = compile(
            &query,
            &QueryOptions {
                contains_node_key: Some("p9".to_string()),
                ..QueryOptions::default()
            },
        );
        assert!(text.contains("RootBinding0_0 as var(func: eq(node_key, \"p9\"))"));
        assert!(text.contains("first: 1)"));
    }

    #[test]
    fn projection_includes_filtered_properties_and_edges() {
        let bin = file()
            .with_str_filter("file_path", &[StrCmp::eq("/usr/bin/true")])
            .unwrap();
        let query = process()
            .with_int_filter("process_id", &[IntCmp::gt(100)])
            .unwrap()
            .with_edge("bin_file", bin)
            .unwrap();
        let text = compile(&query, &QueryOptions::default());
        let projection = text
            .split("res(func: uid(CoalesceRoot)")
            .nth(1)
            .expect("projection block");
        assert!(projection.contains("process_id"));
        assert!(projection.contains("bin_file @filter("));
        assert!(projection.contains("file_path"));
    }

    #[test]
    fn stage_walks_traverse_each_pattern_edge_once() {
        let child = process();
        let parent = process().with_edge("children", child).unwrap();
        let text = compile(&parent, &QueryOptions::default());
        // Two var stages plus coalesce each traverse the single pattern
        // edge once, then the projection once more.
        let forward = text.matches("children").count() - text.matches("~children").count();
        assert_eq!(forward + text.matches("~children").count(), 4);
    }
}
