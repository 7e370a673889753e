//! The IpAddress entity: an address observed in network telemetry.

use grapl_core::cmp::{IntCmp, StrCmp};
use grapl_core::{CoreError, NodeSchema, PropertyType};
use grapl_query::QueryError;

use crate::ip_connection;
use crate::macros::entity_wrappers;

pub const NODE_TYPE: &str = "IpAddress";

pub fn schema() -> NodeSchema {
    let schema = NodeSchema::new(NODE_TYPE)
        .with_property("ip_address", PropertyType::str_prop())
        .with_property("first_seen_timestamp", PropertyType::int_prop())
        .with_property("last_seen_timestamp", PropertyType::int_prop())
        .with_unique_predicate("ip_address");
    crate::with_entity_edges(schema)
}

entity_wrappers!(IpAddressQuery, IpAddressView, NODE_TYPE);

impl IpAddressQuery {
    pub fn with_ip_address(self, cmps: &[StrCmp]) -> Result<Self, CoreError> {
        self.with_str_property("ip_address", cmps)
    }

    pub fn with_first_seen_timestamp(self, cmps: &[IntCmp]) -> Result<Self, CoreError> {
        self.with_int_property("first_seen_timestamp", cmps)
    }

    pub fn with_last_seen_timestamp(self, cmps: &[IntCmp]) -> Result<Self, CoreError> {
        self.with_int_property("last_seen_timestamp", cmps)
    }

    /// Connections arriving at this address (reverse of
    /// `inbound_ip_connection_to`).
    pub fn with_ip_connections_from(
        self,
        connections: ip_connection::IpConnectionQuery,
    ) -> Result<Self, CoreError> {
        self.with_neighbor("ip_connections_from", connections.into_inner())
    }
}

impl IpAddressView {
    pub fn get_ip_address(&self, cached: bool) -> Result<Option<String>, QueryError> {
        self.get_str_property("ip_address", cached)
    }

    pub fn get_first_seen_timestamp(&self, cached: bool) -> Result<Option<i64>, QueryError> {
        self.get_int_property("first_seen_timestamp", cached)
    }

    pub fn get_last_seen_timestamp(&self, cached: bool) -> Result<Option<i64>, QueryError> {
        self.get_int_property("last_seen_timestamp", cached)
    }

    pub fn get_ip_connections_from(
        &self,
        cached: bool,
    ) -> Result<Vec<ip_connection::IpConnectionView>, QueryError> {
        Ok(self
            .get_neighbors("ip_connections_from", cached)?
            .into_iter()
            .map(ip_connection::IpConnectionView::from_view)
            .collect())
    }
}
