//! The ProcessInboundConnection entity: a process listening on a port.

use grapl_core::cmp::{IntCmp, StrCmp};
use grapl_core::{CoreError, EdgeRelation, EdgeT, NodeSchema, PropertyType};
use grapl_query::QueryError;

use crate::ip_port;
use crate::macros::entity_wrappers;

pub const NODE_TYPE: &str = "ProcessInboundConnection";

pub fn schema() -> NodeSchema {
    let schema = NodeSchema::new(NODE_TYPE)
        .with_property("ip_address", PropertyType::str_prop())
        .with_property("protocol", PropertyType::str_prop())
        .with_property("port", PropertyType::int_prop())
        .with_property("created_timestamp", PropertyType::int_prop())
        .with_property("terminated_timestamp", PropertyType::int_prop())
        .with_property("last_seen_timestamp", PropertyType::int_prop())
        .with_forward_edge(
            "bound_port",
            EdgeT::new(NODE_TYPE, ip_port::NODE_TYPE, EdgeRelation::ManyToOne),
            "bound_connections",
        )
        .with_unique_predicate("created_timestamp");
    crate::with_entity_edges(schema)
}

entity_wrappers!(
    ProcessInboundConnectionQuery,
    ProcessInboundConnectionView,
    NODE_TYPE
);

impl ProcessInboundConnectionQuery {
    pub fn with_ip_address(self, cmps: &[StrCmp]) -> Result<Self, CoreError> {
        self.with_str_property("ip_address", cmps)
    }

    pub fn with_protocol(self, cmps: &[StrCmp]) -> Result<Self, CoreError> {
        self.with_str_property("protocol", cmps)
    }

    pub fn with_port(self, cmps: &[IntCmp]) -> Result<Self, CoreError> {
        self.with_int_property("port", cmps)
    }

    pub fn with_bound_port(self, port: ip_port::IpPortQuery) -> Result<Self, CoreError> {
        self.with_neighbor("bound_port", port.into_inner())
    }
}

impl ProcessInboundConnectionView {
    pub fn get_ip_address(&self, cached: bool) -> Result<Option<String>, QueryError> {
        self.get_str_property("ip_address", cached)
    }

    pub fn get_protocol(&self, cached: bool) -> Result<Option<String>, QueryError> {
        self.get_str_property("protocol", cached)
    }

    pub fn get_port(&self, cached: bool) -> Result<Option<i64>, QueryError> {
        self.get_int_property("port", cached)
    }

    pub fn get_bound_port(&self, cached: bool) -> Result<Option<ip_port::IpPortView>, QueryError> {
        Ok(self
            .inner()
            .get_edge("bound_port", cached)?
            .map(ip_port::IpPortView::from_view))
    }
}
