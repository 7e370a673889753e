//! The File entity: a filesystem object observed on an asset.

use grapl_core::cmp::{IntCmp, StrCmp};
use grapl_core::{CoreError, NodeSchema, PropertyType};
use grapl_query::QueryError;

use crate::macros::entity_wrappers;
use crate::process;

pub const NODE_TYPE: &str = "File";

pub fn schema() -> NodeSchema {
    let schema = NodeSchema::new(NODE_TYPE)
        .with_property("file_path", PropertyType::str_prop())
        .with_property("file_extension", PropertyType::str_prop())
        .with_property("file_mime_type", PropertyType::str_prop())
        .with_property("file_size", PropertyType::int_prop())
        .with_property("file_description", PropertyType::str_prop())
        .with_property("file_product", PropertyType::str_prop())
        .with_property("file_company", PropertyType::str_prop())
        .with_property("file_directory", PropertyType::str_prop())
        .with_property("file_inode", PropertyType::int_prop())
        .with_property("file_hard_links", PropertyType::int_prop())
        .with_property("md5_hash", PropertyType::str_prop())
        .with_property("sha1_hash", PropertyType::str_prop())
        .with_property("sha256_hash", PropertyType::str_prop())
        .with_unique_predicate("file_path");
    crate::with_entity_edges(schema)
}

entity_wrappers!(FileQuery, FileView, NODE_TYPE);

impl FileQuery {
    pub fn with_file_path(self, cmps: &[StrCmp]) -> Result<Self, CoreError> {
        self.with_str_property("file_path", cmps)
    }

    pub fn with_file_extension(self, cmps: &[StrCmp]) -> Result<Self, CoreError> {
        self.with_str_property("file_extension", cmps)
    }

    pub fn with_file_mime_type(self, cmps: &[StrCmp]) -> Result<Self, CoreError> {
        self.with_str_property("file_mime_type", cmps)
    }

    pub fn with_file_size(self, cmps: &[IntCmp]) -> Result<Self, CoreError> {
        self.with_int_property("file_size", cmps)
    }

    pub fn with_file_directory(self, cmps: &[StrCmp]) -> Result<Self, CoreError> {
        self.with_str_property("file_directory", cmps)
    }

    pub fn with_md5_hash(self, cmps: &[StrCmp]) -> Result<Self, CoreError> {
        self.with_str_property("md5_hash", cmps)
    }

    pub fn with_sha1_hash(self, cmps: &[StrCmp]) -> Result<Self, CoreError> {
        self.with_str_property("sha1_hash", cmps)
    }

    pub fn with_sha256_hash(self, cmps: &[StrCmp]) -> Result<Self, CoreError> {
        self.with_str_property("sha256_hash", cmps)
    }

    /// The process that created this file (reverse of `created_files`).
    pub fn with_creator(self, creator: process::ProcessQuery) -> Result<Self, CoreError> {
        self.with_neighbor("creator", creator.into_inner())
    }

    /// Processes spawned from this file (reverse of `bin_file`).
    pub fn with_spawned_from(self, spawned: process::ProcessQuery) -> Result<Self, CoreError> {
        self.with_neighbor("spawned_from", spawned.into_inner())
    }

    pub fn with_writers(self, writers: process::ProcessQuery) -> Result<Self, CoreError> {
        self.with_neighbor("writers", writers.into_inner())
    }

    pub fn with_readers(self, readers: process::ProcessQuery) -> Result<Self, CoreError> {
        self.with_neighbor("readers", readers.into_inner())
    }
}

impl FileView {
    pub fn get_file_path(&self, cached: bool) -> Result<Option<String>, QueryError> {
        self.get_str_property("file_path", cached)
    }

    pub fn get_file_extension(&self, cached: bool) -> Result<Option<String>, QueryError> {
        self.get_str_property("file_extension", cached)
    }

    pub fn get_file_size(&self, cached: bool) -> Result<Option<i64>, QueryError> {
        self.get_int_property("file_size", cached)
    }

    pub fn get_md5_hash(&self, cached: bool) -> Result<Option<String>, QueryError> {
        self.get_str_property("md5_hash", cached)
    }

    pub fn get_sha1_hash(&self, cached: bool) -> Result<Option<String>, QueryError> {
        self.get_str_property("sha1_hash", cached)
    }

    pub fn get_sha256_hash(&self, cached: bool) -> Result<Option<String>, QueryError> {
        self.get_str_property("sha256_hash", cached)
    }

    pub fn get_creator(&self, cached: bool) -> Result<Option<process::ProcessView>, QueryError> {
        Ok(self
            .inner()
            .get_edge("creator", cached)?
            .map(process::ProcessView::from_view))
    }

    pub fn get_spawned_from(&self, cached: bool) -> Result<Vec<process::ProcessView>, QueryError> {
        Ok(self
            .get_neighbors("spawned_from", cached)?
            .into_iter()
            .map(process::ProcessView::from_view)
            .collect())
    }

    pub fn get_writers(&self, cached: bool) -> Result<Vec<process::ProcessView>, QueryError> {
        Ok(self
            .get_neighbors("writers", cached)?
            .into_iter()
            .map(process::ProcessView::from_view)
            .collect())
    }
}
