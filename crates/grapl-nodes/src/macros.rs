//! The common surface shared by every typed entity wrapper.
//!
//! Each entity module invokes [`entity_wrappers!`] to declare its query
//! and view newtypes with the generic plumbing (construction against the
//! registered schema, identity filters, execution, and the by-name
//! property/neighbor seams that extension traits build on). The typed
//! per-property and per-edge methods stay hand-written in each module.

macro_rules! entity_wrappers {
    ($query:ident, $view:ident, $node_type:expr) => {
        /// Typed builder over the generic query graph.
        #[derive(Debug, Clone)]
        pub struct $query(grapl_query::NodeQuery);

        impl $query {
            /// Builds a query bound to this type's registered schema.
            pub fn new() -> Self {
                crate::init();
                // init() registers every built-in; the fallback covers a
                // caller that cleared the global registry out from under us.
                let inner = grapl_query::NodeQuery::for_type($node_type)
                    .unwrap_or_else(|_| grapl_query::NodeQuery::for_schema(schema()));
                $query(inner)
            }

            pub fn with_node_key_eq(self, node_key: &str) -> Self {
                $query(self.0.with_node_key_eq(node_key))
            }

            pub fn with_uid_eq(self, uid: &str) -> Self {
                $query(self.0.with_uid_eq(uid))
            }

            /// By-name string filter; the seam extension traits delegate to.
            pub fn with_str_property(
                self,
                name: &str,
                cmps: &[grapl_core::cmp::StrCmp],
            ) -> Result<Self, grapl_core::CoreError> {
                Ok($query(self.0.with_str_filter(name, cmps)?))
            }

            /// By-name integer filter; the seam extension traits delegate to.
            pub fn with_int_property(
                self,
                name: &str,
                cmps: &[grapl_core::cmp::IntCmp],
            ) -> Result<Self, grapl_core::CoreError> {
                Ok($query(self.0.with_int_filter(name, cmps)?))
            }

            /// By-name neighbor attachment on any declared edge.
            pub fn with_neighbor(
                self,
                edge: &str,
                neighbor: grapl_query::NodeQuery,
            ) -> Result<Self, grapl_core::CoreError> {
                Ok($query(self.0.with_edge(edge, neighbor)?))
            }

            pub fn query(
                &self,
                client: &grapl_dgraph::ClientHandle,
                first: u64,
            ) -> Result<Vec<$view>, grapl_query::QueryError> {
                Ok(self
                    .0
                    .query(client, first)?
                    .into_iter()
                    .map($view)
                    .collect())
            }

            pub fn query_first(
                &self,
                client: &grapl_dgraph::ClientHandle,
                contains_node_key: Option<&str>,
            ) -> Result<Option<$view>, grapl_query::QueryError> {
                Ok(self.0.query_first(client, contains_node_key)?.map($view))
            }

            pub fn get_count(
                &self,
                client: &grapl_dgraph::ClientHandle,
            ) -> Result<u64, grapl_query::QueryError> {
                self.0.get_count(client)
            }

            pub fn inner(&self) -> &grapl_query::NodeQuery {
                &self.0
            }

            pub fn into_inner(self) -> grapl_query::NodeQuery {
                self.0
            }
        }

        impl Default for $query {
            fn default() -> Self {
                Self::new()
            }
        }

        impl From<$query> for grapl_query::NodeQuery {
            fn from(query: $query) -> Self {
                query.0
            }
        }

        /// Typed view over a materialized node of this type.
        #[derive(Debug, Clone)]
        pub struct $view(grapl_query::NodeView);

        impl $view {
            pub fn from_view(view: grapl_query::NodeView) -> Self {
                $view(view)
            }

            pub fn uid(&self) -> String {
                self.0.uid()
            }

            pub fn node_key(&self) -> String {
                self.0.node_key()
            }

            /// By-name string accessor; the seam extension traits delegate to.
            pub fn get_str_property(
                &self,
                name: &str,
                cached: bool,
            ) -> Result<Option<String>, grapl_query::QueryError> {
                Ok(self
                    .0
                    .get_property(name, cached)?
                    .and_then(|v| v.as_str().map(str::to_string)))
            }

            /// By-name integer accessor.
            pub fn get_int_property(
                &self,
                name: &str,
                cached: bool,
            ) -> Result<Option<i64>, grapl_query::QueryError> {
                Ok(self.0.get_property(name, cached)?.and_then(|v| v.as_int()))
            }

            /// By-name neighbor accessor.
            pub fn get_neighbors(
                &self,
                edge: &str,
                cached: bool,
            ) -> Result<Vec<grapl_query::NodeView>, grapl_query::QueryError> {
                self.0.get_edges(edge, cached)
            }

            pub fn inner(&self) -> &grapl_query::NodeView {
                &self.0
            }

            pub fn into_inner(self) -> grapl_query::NodeView {
                self.0
            }
        }

        impl From<grapl_query::NodeView> for $view {
            fn from(view: grapl_query::NodeView) -> Self {
                $view(view)
            }
        }
    };
}

pub(crate) use entity_wrappers;
