pub mod cmp;
pub mod edge;
pub mod error;
pub mod filter;
pub mod property;
pub mod registry;
pub mod schema;

// Re-export commonly used types
pub use cmp::{int_cmps, str_cmps, Cmp, CmpValue, IntArg, IntCmp, StrArg, StrCmp};
pub use edge::{EdgeDeclaration, EdgeDirection, EdgeRelation, EdgeT};
pub use error::CoreError;
pub use filter::{and_combine, render_filter, render_node_filter, PropertyFilter};
pub use property::{Primitive, PropertyType, PropertyValue};
pub use registry::SchemaRegistry;
pub use schema::NodeSchema;

/// The property every node carries as its stable, user-assigned identity.
pub const NODE_KEY: &str = "node_key";

/// The store-assigned identity property.
pub const UID: &str = "uid";

/// The backing store's type tag predicate.
pub const TYPE_TAG: &str = "dgraph.type";
