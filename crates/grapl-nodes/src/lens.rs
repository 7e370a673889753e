//! The Lens entity: a named scope that groups related entities for
//! triage.

use grapl_core::cmp::{IntCmp, StrCmp};
use grapl_core::{CoreError, NodeSchema, PropertyType};
use grapl_query::{NodeQuery, NodeView, QueryError};

use crate::macros::entity_wrappers;

pub const NODE_TYPE: &str = "Lens";

pub fn schema() -> NodeSchema {
    NodeSchema::new(NODE_TYPE)
        .with_property("lens", PropertyType::str_prop())
        .with_property("score", PropertyType::int_prop())
        .with_unique_predicate("lens")
}

entity_wrappers!(LensQuery, LensView, NODE_TYPE);

impl LensQuery {
    pub fn with_lens_name(self, cmps: &[StrCmp]) -> Result<Self, CoreError> {
        self.with_str_property("lens", cmps)
    }

    pub fn with_score(self, cmps: &[IntCmp]) -> Result<Self, CoreError> {
        self.with_int_property("score", cmps)
    }

    /// Constrain to lenses whose scope contains the given node pattern.
    pub fn with_scope(self, node: NodeQuery) -> Result<Self, CoreError> {
        self.with_neighbor("scope", node)
    }
}

impl LensView {
    pub fn get_lens_name(&self, cached: bool) -> Result<Option<String>, QueryError> {
        self.get_str_property("lens", cached)
    }

    pub fn get_score(&self, cached: bool) -> Result<Option<i64>, QueryError> {
        self.get_int_property("score", cached)
    }

    pub fn get_scope(&self, cached: bool) -> Result<Vec<NodeView>, QueryError> {
        self.get_neighbors("scope", cached)
    }
}
