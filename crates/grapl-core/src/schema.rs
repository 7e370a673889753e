//! Per-node-type schemas: typed properties, forward/reverse edge entries,
//! and the optional unique predicate used for fallback root scans.
//!
//! A schema starts in the `Declared` state with only its own property and
//! forward-edge declarations; the registry materializes reverse entries on
//! destination schemas once all schemas are registered (see
//! [`crate::registry::SchemaRegistry::materialize_reverses`]). Additive
//! extension after that point materializes its inverse immediately.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::edge::{EdgeDeclaration, EdgeDirection, EdgeT};
use crate::property::PropertyType;

/// What a schema lookup by name resolves to.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaEntry {
    Property(PropertyType),
    Edge(EdgeDeclaration),
}

/// The declared shape of one node type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeSchema {
    self_type: String,
    properties: IndexMap<String, PropertyType>,
    edges: IndexMap<String, EdgeDeclaration>,
    unique_predicate: Option<String>,
    /// Set once the registry has derived this schema's reverse entries.
    reverses_materialized: bool,
}

impl NodeSchema {
    pub fn new(self_type: &str) -> Self {
        NodeSchema {
            self_type: self_type.to_string(),
            properties: IndexMap::new(),
            edges: IndexMap::new(),
            unique_predicate: None,
            reverses_materialized: false,
        }
    }

    /// Declares a typed property. Builder-style; later declarations of the
    /// same name win.
    pub fn with_property(mut self, name: &str, ty: PropertyType) -> Self {
        self.properties.insert(name.to_string(), ty);
        self
    }

    /// Declares a forward edge from this type. `relation`'s source must be
    /// this type; the paired reverse entry lands on the destination schema
    /// when reverses are materialized.
    pub fn with_forward_edge(mut self, name: &str, edge: EdgeT, reverse_name: &str) -> Self {
        debug_assert_eq!(edge.source_type, self.self_type);
        self.edges
            .insert(name.to_string(), EdgeDeclaration::forward(edge, reverse_name));
        self
    }

    /// Declares the indexed property used as a fallback scan root.
    pub fn with_unique_predicate(mut self, name: &str) -> Self {
        self.unique_predicate = Some(name.to_string());
        self
    }

    pub fn self_type(&self) -> &str {
        &self.self_type
    }

    pub fn properties(&self) -> &IndexMap<String, PropertyType> {
        &self.properties
    }

    pub fn edges(&self) -> &IndexMap<String, EdgeDeclaration> {
        &self.edges
    }

    pub fn unique_predicate(&self) -> Option<&str> {
        self.unique_predicate.as_deref()
    }

    pub fn reverses_materialized(&self) -> bool {
        self.reverses_materialized
    }

    /// Resolves a name to either a property type or an edge declaration.
    pub fn lookup(&self, name: &str) -> Option<SchemaEntry> {
        if let Some(ty) = self.properties.get(name) {
            return Some(SchemaEntry::Property(*ty));
        }
        self.edges.get(name).cloned().map(SchemaEntry::Edge)
    }

    /// All forward edge entries, as `(name, declaration)` pairs.
    pub fn forward_edges(&self) -> impl Iterator<Item = (&String, &EdgeDeclaration)> {
        self.edges
            .iter()
            .filter(|(_, decl)| decl.direction == EdgeDirection::Forward)
    }

    pub(crate) fn insert_property(&mut self, name: &str, ty: PropertyType) {
        self.properties.insert(name.to_string(), ty);
    }

    pub(crate) fn insert_edge(&mut self, name: &str, decl: EdgeDeclaration) {
        self.edges.insert(name.to_string(), decl);
    }

    pub(crate) fn mark_reverses_materialized(&mut self) {
        self.reverses_materialized = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edge::EdgeRelation;

    fn process_schema() -> NodeSchema {
        NodeSchema::new("Process")
            .with_property("process_id", PropertyType::int_prop())
            .with_property("process_name", PropertyType::str_prop())
            .with_forward_edge(
                "children",
                EdgeT::new("Process", "Process", EdgeRelation::OneToMany),
                "parent",
            )
            .with_unique_predicate("process_id")
    }

    #[test]
    fn lookup_resolves_properties_and_edges() {
        let schema = process_schema();
        assert_eq!(
            schema.lookup("process_id"),
            Some(SchemaEntry::Property(PropertyType::int_prop()))
        );
        match schema.lookup("children") {
            Some(SchemaEntry::Edge(decl)) => {
                assert_eq!(decl.paired_name, "parent");
                assert_eq!(decl.direction, EdgeDirection::Forward);
            }
            other => panic!("expected edge entry, got {:?}", other),
        }
        assert_eq!(schema.lookup("missing"), None);
    }

    #[test]
    fn unique_predicate_is_declared() {
        assert_eq!(process_schema().unique_predicate(), Some("process_id"));
    }

    #[test]
    fn starts_unmaterialized() {
        assert!(!process_schema().reverses_materialized());
    }
}
