//! Third-party schema extension: extra predicates graft onto the
//! built-ins at startup, and typed access arrives as an extension trait
//! over the by-name seams.

use grapl_core::cmp::IntCmp;
use grapl_core::{CoreError, EdgeRelation, EdgeT, PropertyType};
use grapl_nodes::extensions::{extend_edge, extend_property};
use grapl_nodes::file::FileQuery;
use grapl_nodes::process::{ProcessQuery, NODE_TYPE};
use grapl_query::{compile, QueryOptions};

trait WithAuid: Sized {
    fn with_auid(self, cmps: &[IntCmp]) -> Result<Self, CoreError>;
}

impl WithAuid for ProcessQuery {
    fn with_auid(self, cmps: &[IntCmp]) -> Result<Self, CoreError> {
        self.with_int_property("auid", cmps)
    }
}

#[test]
fn extended_property_is_visible_to_new_queries_only() {
    // Queries snapshot their schema at construction.
    let stale = ProcessQuery::new();

    extend_property(NODE_TYPE, "auid", PropertyType::int_prop()).unwrap();

    let err = stale.with_auid(&[IntCmp::eq(1000)]);
    assert!(matches!(err, Err(CoreError::UnknownProperty { .. })));

    let query = ProcessQuery::new().with_auid(&[IntCmp::eq(1000)]).unwrap();
    let text = compile(query.inner(), &QueryOptions::default());
    assert!(text.contains("eq(auid, 1000)"));
}

#[test]
fn extended_edge_gets_an_immediate_inverse() {
    extend_edge(
        NODE_TYPE,
        "launched_scripts",
        EdgeT::new(NODE_TYPE, grapl_nodes::file::NODE_TYPE, EdgeRelation::ManyToMany),
        "launched_by",
    )
    .unwrap();

    let query = ProcessQuery::new()
        .with_neighbor("launched_scripts", FileQuery::new().into_inner())
        .unwrap();
    let text = compile(query.inner(), &QueryOptions::default());
    assert!(text.contains("launched_scripts"));

    // The inverse is usable from the destination side without a separate
    // materialization pass.
    let back = FileQuery::new().with_neighbor("launched_by", ProcessQuery::new().into_inner());
    assert!(back.is_ok());
}

#[test]
fn extending_an_unregistered_type_errors() {
    let err = extend_property("NotAType", "x", PropertyType::str_prop());
    assert!(matches!(err, Err(CoreError::SchemaNotRegistered { .. })));
}
