//! Runtime schema extension for plugin node models.
//!
//! Plugins call [`extend_property`] and [`extend_edge`] during process
//! startup to graft extra predicates onto the built-in schemas. Queries
//! snapshot their schema at construction, so anything built before the
//! extension ran will not see the new predicates; extend first, then
//! construct.
//!
//! Typed access to an extended predicate is an extension trait over the
//! wrapper's by-name seams:
//!
//! ```ignore
//! trait WithAuid: Sized {
//!     fn with_auid(self, cmps: &[IntCmp]) -> Result<Self, CoreError>;
//! }
//!
//! impl WithAuid for ProcessQuery {
//!     fn with_auid(self, cmps: &[IntCmp]) -> Result<Self, CoreError> {
//!         self.with_int_property("auid", cmps)
//!     }
//! }
//! ```

use grapl_core::{registry, CoreError, EdgeT, PropertyType};

/// Declares an extra property on a built-in node type.
pub fn extend_property(node_type: &str, name: &str, ty: PropertyType) -> Result<(), CoreError> {
    crate::init();
    registry::global_write().add_property(node_type, name, ty)
}

/// Declares an extra forward edge on a built-in node type. The inverse is
/// materialized on the destination schema immediately.
pub fn extend_edge(
    node_type: &str,
    forward_name: &str,
    edge: EdgeT,
    reverse_name: &str,
) -> Result<(), CoreError> {
    crate::init();
    registry::global_write().add_edge(node_type, forward_name, edge, reverse_name)
}
