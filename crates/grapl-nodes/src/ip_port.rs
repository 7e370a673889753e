//! The IpPort entity: an address/port pair that connections bind or
//! target.

use grapl_core::cmp::{IntCmp, StrCmp};
use grapl_core::{CoreError, NodeSchema, PropertyType};
use grapl_query::QueryError;

use crate::macros::entity_wrappers;
use crate::network_connection;

pub const NODE_TYPE: &str = "IpPort";

pub fn schema() -> NodeSchema {
    let schema = NodeSchema::new(NODE_TYPE)
        .with_property("ip_address", PropertyType::str_prop())
        .with_property("port", PropertyType::int_prop())
        .with_property("protocol", PropertyType::str_prop())
        .with_property("first_seen_timestamp", PropertyType::int_prop())
        .with_property("last_seen_timestamp", PropertyType::int_prop())
        .with_unique_predicate("port");
    crate::with_entity_edges(schema)
}

entity_wrappers!(IpPortQuery, IpPortView, NODE_TYPE);

impl IpPortQuery {
    pub fn with_ip_address(self, cmps: &[StrCmp]) -> Result<Self, CoreError> {
        self.with_str_property("ip_address", cmps)
    }

    pub fn with_port(self, cmps: &[IntCmp]) -> Result<Self, CoreError> {
        self.with_int_property("port", cmps)
    }

    pub fn with_protocol(self, cmps: &[StrCmp]) -> Result<Self, CoreError> {
        self.with_str_property("protocol", cmps)
    }

    /// Network connections arriving at this port (reverse of
    /// `inbound_network_connection_to`).
    pub fn with_network_connections_from(
        self,
        connections: network_connection::NetworkConnectionQuery,
    ) -> Result<Self, CoreError> {
        self.with_neighbor("network_connections_from", connections.into_inner())
    }
}

impl IpPortView {
    pub fn get_ip_address(&self, cached: bool) -> Result<Option<String>, QueryError> {
        self.get_str_property("ip_address", cached)
    }

    pub fn get_port(&self, cached: bool) -> Result<Option<i64>, QueryError> {
        self.get_int_property("port", cached)
    }

    pub fn get_protocol(&self, cached: bool) -> Result<Option<String>, QueryError> {
        self.get_str_property("protocol", cached)
    }

    pub fn get_network_connections_from(
        &self,
        cached: bool,
    ) -> Result<Vec<network_connection::NetworkConnectionView>, QueryError> {
        Ok(self
            .get_neighbors("network_connections_from", cached)?
            .into_iter()
            .map(network_connection::NetworkConnectionView::from_view)
            .collect())
    }
}
