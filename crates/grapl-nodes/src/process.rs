//! The Process entity: an executing program observed on an asset.

use grapl_core::cmp::{IntCmp, StrCmp};
use grapl_core::{CoreError, EdgeRelation, EdgeT, NodeSchema, PropertyType};
use grapl_query::QueryError;

use crate::macros::entity_wrappers;
use crate::{asset, file, process_inbound_connection, process_outbound_connection, risk};

pub const NODE_TYPE: &str = "Process";

pub fn schema() -> NodeSchema {
    let schema = NodeSchema::new(NODE_TYPE)
        .with_property("process_id", PropertyType::int_prop())
        .with_property("process_name", PropertyType::str_prop())
        .with_property("image_name", PropertyType::str_prop())
        .with_property("arguments", PropertyType::str_prop())
        .with_property("created_timestamp", PropertyType::int_prop())
        .with_property("terminate_time", PropertyType::int_prop())
        .with_forward_edge(
            "children",
            EdgeT::new(NODE_TYPE, NODE_TYPE, EdgeRelation::OneToMany),
            "parent",
        )
        .with_forward_edge(
            "bin_file",
            EdgeT::new(NODE_TYPE, file::NODE_TYPE, EdgeRelation::ManyToOne),
            "spawned_from",
        )
        .with_forward_edge(
            "created_files",
            EdgeT::new(NODE_TYPE, file::NODE_TYPE, EdgeRelation::OneToMany),
            "creator",
        )
        .with_forward_edge(
            "wrote_files",
            EdgeT::new(NODE_TYPE, file::NODE_TYPE, EdgeRelation::ManyToMany),
            "writers",
        )
        .with_forward_edge(
            "read_files",
            EdgeT::new(NODE_TYPE, file::NODE_TYPE, EdgeRelation::ManyToMany),
            "readers",
        )
        .with_forward_edge(
            "deleted_files",
            EdgeT::new(NODE_TYPE, file::NODE_TYPE, EdgeRelation::OneToMany),
            "deleter",
        )
        .with_forward_edge(
            "created_connections",
            EdgeT::new(
                NODE_TYPE,
                process_outbound_connection::NODE_TYPE,
                EdgeRelation::OneToMany,
            ),
            "connections_from",
        )
        .with_forward_edge(
            "inbound_connections",
            EdgeT::new(
                NODE_TYPE,
                process_inbound_connection::NODE_TYPE,
                EdgeRelation::OneToMany,
            ),
            "bound_by",
        )
        .with_forward_edge(
            "process_asset",
            EdgeT::new(NODE_TYPE, asset::NODE_TYPE, EdgeRelation::ManyToOne),
            "asset_processes",
        )
        .with_unique_predicate("process_id");
    crate::with_entity_edges(schema)
}

entity_wrappers!(ProcessQuery, ProcessView, NODE_TYPE);

impl ProcessQuery {
    pub fn with_process_id(self, cmps: &[IntCmp]) -> Result<Self, CoreError> {
        self.with_int_property("process_id", cmps)
    }

    pub fn with_process_name(self, cmps: &[StrCmp]) -> Result<Self, CoreError> {
        self.with_str_property("process_name", cmps)
    }

    pub fn with_image_name(self, cmps: &[StrCmp]) -> Result<Self, CoreError> {
        self.with_str_property("image_name", cmps)
    }

    pub fn with_arguments(self, cmps: &[StrCmp]) -> Result<Self, CoreError> {
        self.with_str_property("arguments", cmps)
    }

    pub fn with_created_timestamp(self, cmps: &[IntCmp]) -> Result<Self, CoreError> {
        self.with_int_property("created_timestamp", cmps)
    }

    pub fn with_terminate_time(self, cmps: &[IntCmp]) -> Result<Self, CoreError> {
        self.with_int_property("terminate_time", cmps)
    }

    pub fn with_children(self, child: ProcessQuery) -> Result<Self, CoreError> {
        self.with_neighbor("children", child.into_inner())
    }

    pub fn with_parent(self, parent: ProcessQuery) -> Result<Self, CoreError> {
        self.with_neighbor("parent", parent.into_inner())
    }

    pub fn with_bin_file(self, bin: file::FileQuery) -> Result<Self, CoreError> {
        self.with_neighbor("bin_file", bin.into_inner())
    }

    pub fn with_created_files(self, files: file::FileQuery) -> Result<Self, CoreError> {
        self.with_neighbor("created_files", files.into_inner())
    }

    pub fn with_wrote_files(self, files: file::FileQuery) -> Result<Self, CoreError> {
        self.with_neighbor("wrote_files", files.into_inner())
    }

    pub fn with_read_files(self, files: file::FileQuery) -> Result<Self, CoreError> {
        self.with_neighbor("read_files", files.into_inner())
    }

    pub fn with_deleted_files(self, files: file::FileQuery) -> Result<Self, CoreError> {
        self.with_neighbor("deleted_files", files.into_inner())
    }

    pub fn with_created_connections(
        self,
        connections: process_outbound_connection::ProcessOutboundConnectionQuery,
    ) -> Result<Self, CoreError> {
        self.with_neighbor("created_connections", connections.into_inner())
    }

    pub fn with_inbound_connections(
        self,
        connections: process_inbound_connection::ProcessInboundConnectionQuery,
    ) -> Result<Self, CoreError> {
        self.with_neighbor("inbound_connections", connections.into_inner())
    }

    pub fn with_process_asset(self, asset: asset::AssetQuery) -> Result<Self, CoreError> {
        self.with_neighbor("process_asset", asset.into_inner())
    }

    pub fn with_risks(self, risks: risk::RiskQuery) -> Result<Self, CoreError> {
        self.with_neighbor("risks", risks.into_inner())
    }
}

impl ProcessView {
    pub fn get_process_id(&self, cached: bool) -> Result<Option<i64>, QueryError> {
        self.get_int_property("process_id", cached)
    }

    pub fn get_process_name(&self, cached: bool) -> Result<Option<String>, QueryError> {
        self.get_str_property("process_name", cached)
    }

    pub fn get_image_name(&self, cached: bool) -> Result<Option<String>, QueryError> {
        self.get_str_property("image_name", cached)
    }

    pub fn get_arguments(&self, cached: bool) -> Result<Option<String>, QueryError> {
        self.get_str_property("arguments", cached)
    }

    pub fn get_created_timestamp(&self, cached: bool) -> Result<Option<i64>, QueryError> {
        self.get_int_property("created_timestamp", cached)
    }

    pub fn get_terminate_time(&self, cached: bool) -> Result<Option<i64>, QueryError> {
        self.get_int_property("terminate_time", cached)
    }

    pub fn get_children(&self, cached: bool) -> Result<Vec<ProcessView>, QueryError> {
        Ok(self
            .get_neighbors("children", cached)?
            .into_iter()
            .map(ProcessView::from_view)
            .collect())
    }

    pub fn get_parent(&self, cached: bool) -> Result<Option<ProcessView>, QueryError> {
        Ok(self
            .inner()
            .get_edge("parent", cached)?
            .map(ProcessView::from_view))
    }

    pub fn get_bin_file(&self, cached: bool) -> Result<Option<file::FileView>, QueryError> {
        Ok(self
            .inner()
            .get_edge("bin_file", cached)?
            .map(file::FileView::from_view))
    }

    pub fn get_created_files(&self, cached: bool) -> Result<Vec<file::FileView>, QueryError> {
        Ok(self
            .get_neighbors("created_files", cached)?
            .into_iter()
            .map(file::FileView::from_view)
            .collect())
    }

    pub fn get_created_connections(
        &self,
        cached: bool,
    ) -> Result<Vec<process_outbound_connection::ProcessOutboundConnectionView>, QueryError> {
        Ok(self
            .get_neighbors("created_connections", cached)?
            .into_iter()
            .map(process_outbound_connection::ProcessOutboundConnectionView::from_view)
            .collect())
    }

    pub fn get_inbound_connections(
        &self,
        cached: bool,
    ) -> Result<Vec<process_inbound_connection::ProcessInboundConnectionView>, QueryError> {
        Ok(self
            .get_neighbors("inbound_connections", cached)?
            .into_iter()
            .map(process_inbound_connection::ProcessInboundConnectionView::from_view)
            .collect())
    }

    pub fn get_process_asset(&self, cached: bool) -> Result<Option<asset::AssetView>, QueryError> {
        Ok(self
            .inner()
            .get_edge("process_asset", cached)?
            .map(asset::AssetView::from_view))
    }

    pub fn get_risks(&self, cached: bool) -> Result<Vec<risk::RiskView>, QueryError> {
        Ok(self
            .get_neighbors("risks", cached)?
            .into_iter()
            .map(risk::RiskView::from_view)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grapl_query::{compile, QueryOptions};

    #[test]
    fn typed_filters_validate_against_the_schema() {
        let err = ProcessQuery::new().with_str_property("process_id", &[StrCmp::eq("x")]);
        assert!(matches!(err, Err(CoreError::InvalidOperand { .. })));
        assert!(ProcessQuery::new()
            .with_process_name(&[StrCmp::eq("word.exe")])
            .is_ok());
    }

    #[test]
    fn typed_edges_attach_symmetrically() {
        let child = ProcessQuery::new();
        let child_inner = child.inner().clone();
        let parent = ProcessQuery::new().with_children(child).unwrap();
        let rev = child_inner.reverse_edges();
        assert!(rev["parent"][0].0.ptr_eq(parent.inner()));
    }

    #[test]
    fn compiled_query_uses_the_process_type_tag() {
        let query = ProcessQuery::new();
        let text = compile(query.inner(), &QueryOptions::default());
        assert!(text.contains("type(Process)"));
        assert!(text.contains("process_id"));
    }
}
