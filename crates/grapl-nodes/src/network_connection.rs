//! The NetworkConnection entity: an observed flow between two
//! address/port endpoints.

use grapl_core::cmp::{IntCmp, StrCmp};
use grapl_core::{CoreError, EdgeRelation, EdgeT, NodeSchema, PropertyType};
use grapl_query::QueryError;

use crate::ip_port;
use crate::macros::entity_wrappers;

pub const NODE_TYPE: &str = "NetworkConnection";

pub fn schema() -> NodeSchema {
    let schema = NodeSchema::new(NODE_TYPE)
        .with_property("src_ip_address", PropertyType::str_prop())
        .with_property("src_port", PropertyType::int_prop())
        .with_property("dst_ip_address", PropertyType::str_prop())
        .with_property("dst_port", PropertyType::int_prop())
        .with_property("protocol", PropertyType::str_prop())
        .with_property("created_timestamp", PropertyType::int_prop())
        .with_property("terminated_timestamp", PropertyType::int_prop())
        .with_property("last_seen_timestamp", PropertyType::int_prop())
        .with_forward_edge(
            "inbound_network_connection_to",
            EdgeT::new(NODE_TYPE, ip_port::NODE_TYPE, EdgeRelation::ManyToOne),
            "network_connections_from",
        )
        .with_unique_predicate("created_timestamp");
    crate::with_entity_edges(schema)
}

entity_wrappers!(NetworkConnectionQuery, NetworkConnectionView, NODE_TYPE);

impl NetworkConnectionQuery {
    pub fn with_src_ip_address(self, cmps: &[StrCmp]) -> Result<Self, CoreError> {
        self.with_str_property("src_ip_address", cmps)
    }

    pub fn with_src_port(self, cmps: &[IntCmp]) -> Result<Self, CoreError> {
        self.with_int_property("src_port", cmps)
    }

    pub fn with_dst_ip_address(self, cmps: &[StrCmp]) -> Result<Self, CoreError> {
        self.with_str_property("dst_ip_address", cmps)
    }

    pub fn with_dst_port(self, cmps: &[IntCmp]) -> Result<Self, CoreError> {
        self.with_int_property("dst_port", cmps)
    }

    pub fn with_created_timestamp(self, cmps: &[IntCmp]) -> Result<Self, CoreError> {
        self.with_int_property("created_timestamp", cmps)
    }

    pub fn with_inbound_network_connection_to(
        self,
        port: ip_port::IpPortQuery,
    ) -> Result<Self, CoreError> {
        self.with_neighbor("inbound_network_connection_to", port.into_inner())
    }
}

impl NetworkConnectionView {
    pub fn get_src_ip_address(&self, cached: bool) -> Result<Option<String>, QueryError> {
        self.get_str_property("src_ip_address", cached)
    }

    pub fn get_src_port(&self, cached: bool) -> Result<Option<i64>, QueryError> {
        self.get_int_property("src_port", cached)
    }

    pub fn get_dst_ip_address(&self, cached: bool) -> Result<Option<String>, QueryError> {
        self.get_str_property("dst_ip_address", cached)
    }

    pub fn get_dst_port(&self, cached: bool) -> Result<Option<i64>, QueryError> {
        self.get_int_property("dst_port", cached)
    }

    pub fn get_inbound_network_connection_to(
        &self,
        cached: bool,
    ) -> Result<Option<ip_port::IpPortView>, QueryError> {
        Ok(self
            .inner()
            .get_edge("inbound_network_connection_to", cached)?
            .map(ip_port::IpPortView::from_view))
    }
}
