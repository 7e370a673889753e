//! The IpConnection entity: an observed flow between two addresses.

use grapl_core::cmp::{IntCmp, StrCmp};
use grapl_core::{CoreError, EdgeRelation, EdgeT, NodeSchema, PropertyType};
use grapl_query::QueryError;

use crate::ip_address;
use crate::macros::entity_wrappers;

pub const NODE_TYPE: &str = "IpConnection";

pub fn schema() -> NodeSchema {
    let schema = NodeSchema::new(NODE_TYPE)
        .with_property("src_ip_address", PropertyType::str_prop())
        .with_property("dst_ip_address", PropertyType::str_prop())
        .with_property("protocol", PropertyType::str_prop())
        .with_property("created_timestamp", PropertyType::int_prop())
        .with_property("terminated_timestamp", PropertyType::int_prop())
        .with_property("last_seen_timestamp", PropertyType::int_prop())
        .with_forward_edge(
            "inbound_ip_connection_to",
            EdgeT::new(NODE_TYPE, ip_address::NODE_TYPE, EdgeRelation::ManyToOne),
            "ip_connections_from",
        )
        .with_unique_predicate("created_timestamp");
    crate::with_entity_edges(schema)
}

entity_wrappers!(IpConnectionQuery, IpConnectionView, NODE_TYPE);

impl IpConnectionQuery {
    pub fn with_src_ip_address(self, cmps: &[StrCmp]) -> Result<Self, CoreError> {
        self.with_str_property("src_ip_address", cmps)
    }

    pub fn with_dst_ip_address(self, cmps: &[StrCmp]) -> Result<Self, CoreError> {
        self.with_str_property("dst_ip_address", cmps)
    }

    pub fn with_protocol(self, cmps: &[StrCmp]) -> Result<Self, CoreError> {
        self.with_str_property("protocol", cmps)
    }

    pub fn with_created_timestamp(self, cmps: &[IntCmp]) -> Result<Self, CoreError> {
        self.with_int_property("created_timestamp", cmps)
    }

    pub fn with_inbound_ip_connection_to(
        self,
        addr: ip_address::IpAddressQuery,
    ) -> Result<Self, CoreError> {
        self.with_neighbor("inbound_ip_connection_to", addr.into_inner())
    }
}

impl IpConnectionView {
    pub fn get_src_ip_address(&self, cached: bool) -> Result<Option<String>, QueryError> {
        self.get_str_property("src_ip_address", cached)
    }

    pub fn get_dst_ip_address(&self, cached: bool) -> Result<Option<String>, QueryError> {
        self.get_str_property("dst_ip_address", cached)
    }

    pub fn get_protocol(&self, cached: bool) -> Result<Option<String>, QueryError> {
        self.get_str_property("protocol", cached)
    }

    pub fn get_created_timestamp(&self, cached: bool) -> Result<Option<i64>, QueryError> {
        self.get_int_property("created_timestamp", cached)
    }

    pub fn get_inbound_ip_connection_to(
        &self,
        cached: bool,
    ) -> Result<Option<ip_address::IpAddressView>, QueryError> {
        Ok(self
            .inner()
            .get_edge("inbound_ip_connection_to", cached)?
            .map(ip_address::IpAddressView::from_view))
    }
}
