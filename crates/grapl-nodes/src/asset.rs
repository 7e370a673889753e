//! The Asset entity: a host machine that processes and files live on.

use grapl_core::cmp::StrCmp;
use grapl_core::{CoreError, EdgeRelation, EdgeT, NodeSchema, PropertyType};
use grapl_query::QueryError;

use crate::macros::entity_wrappers;
use crate::{file, process};

pub const NODE_TYPE: &str = "Asset";

pub fn schema() -> NodeSchema {
    let schema = NodeSchema::new(NODE_TYPE)
        .with_property("hostname", PropertyType::str_prop())
        .with_forward_edge(
            "asset_files",
            EdgeT::new(NODE_TYPE, file::NODE_TYPE, EdgeRelation::OneToMany),
            "files_on_asset",
        )
        .with_unique_predicate("hostname");
    crate::with_entity_edges(schema)
}

entity_wrappers!(AssetQuery, AssetView, NODE_TYPE);

impl AssetQuery {
    pub fn with_hostname(self, cmps: &[StrCmp]) -> Result<Self, CoreError> {
        self.with_str_property("hostname", cmps)
    }

    pub fn with_asset_files(self, files: file::FileQuery) -> Result<Self, CoreError> {
        self.with_neighbor("asset_files", files.into_inner())
    }

    /// Processes running on this asset (reverse of `process_asset`).
    pub fn with_asset_processes(self, procs: process::ProcessQuery) -> Result<Self, CoreError> {
        self.with_neighbor("asset_processes", procs.into_inner())
    }
}

impl AssetView {
    pub fn get_hostname(&self, cached: bool) -> Result<Option<String>, QueryError> {
        self.get_str_property("hostname", cached)
    }

    pub fn get_asset_files(&self, cached: bool) -> Result<Vec<file::FileView>, QueryError> {
        Ok(self
            .get_neighbors("asset_files", cached)?
            .into_iter()
            .map(file::FileView::from_view)
            .collect())
    }

    pub fn get_asset_processes(
        &self,
        cached: bool,
    ) -> Result<Vec<process::ProcessView>, QueryError> {
        Ok(self
            .get_neighbors("asset_processes", cached)?
            .into_iter()
            .map(process::ProcessView::from_view)
            .collect())
    }
}
