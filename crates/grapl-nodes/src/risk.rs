//! The Risk entity: an analyzer finding attached to the nodes it
//! implicates.

use grapl_core::cmp::{IntCmp, StrCmp};
use grapl_core::{CoreError, NodeSchema, PropertyType};
use grapl_query::{NodeQuery, NodeView, QueryError};

use crate::macros::entity_wrappers;

pub const NODE_TYPE: &str = "Risk";

pub fn schema() -> NodeSchema {
    NodeSchema::new(NODE_TYPE)
        .with_property("analyzer_name", PropertyType::str_prop())
        .with_property("risk_score", PropertyType::int_prop())
        .with_unique_predicate("analyzer_name")
}

entity_wrappers!(RiskQuery, RiskView, NODE_TYPE);

impl RiskQuery {
    pub fn with_analyzer_name(self, cmps: &[StrCmp]) -> Result<Self, CoreError> {
        self.with_str_property("analyzer_name", cmps)
    }

    pub fn with_risk_score(self, cmps: &[IntCmp]) -> Result<Self, CoreError> {
        self.with_int_property("risk_score", cmps)
    }

    /// Constrain to risks attached to the given node pattern. Any entity
    /// query can be passed here since every entity carries a `risks`
    /// edge.
    pub fn with_risky_nodes(self, node: NodeQuery) -> Result<Self, CoreError> {
        self.with_neighbor("risky_nodes", node)
    }
}

impl RiskView {
    pub fn get_analyzer_name(&self, cached: bool) -> Result<Option<String>, QueryError> {
        self.get_str_property("analyzer_name", cached)
    }

    pub fn get_risk_score(&self, cached: bool) -> Result<Option<i64>, QueryError> {
        self.get_int_property("risk_score", cached)
    }

    pub fn get_risky_nodes(&self, cached: bool) -> Result<Vec<NodeView>, QueryError> {
        self.get_neighbors("risky_nodes", cached)
    }
}
