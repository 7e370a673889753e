//! Query execution: compile the pattern, run it read-only through the
//! client with bounded retry, and hydrate the projected rows into views.
//!
//! Every attempt runs in a fresh scoped transaction; the guard discards
//! it whether the query succeeded or not.

use std::collections::HashMap;

use grapl_dgraph::{with_retries, ClientHandle, RetryPolicy, TxnGuard};

use crate::compile::{compile, QueryOptions};
use crate::error::QueryError;
use crate::materialize::Materializer;
use crate::node_query::NodeQuery;
use crate::node_view::NodeView;

impl NodeQuery {
    /// Runs the pattern and returns up to `first` root matches.
    pub fn query(&self, client: &ClientHandle, first: u64) -> Result<Vec<NodeView>, QueryError> {
        let options = QueryOptions {
            first,
            ..QueryOptions::default()
        };
        self.run(client, &options)
    }

    /// Runs the pattern pinned to a single result, optionally to one root
    /// node key.
    pub fn query_first(
        &self,
        client: &ClientHandle,
        contains_node_key: Option<&str>,
    ) -> Result<Option<NodeView>, QueryError> {
        let options = QueryOptions {
            first: 1,
            contains_node_key: contains_node_key.map(str::to_string),
            ..QueryOptions::default()
        };
        Ok(self.run(client, &options)?.into_iter().next())
    }

    /// Counts root matches without materializing them.
    pub fn get_count(&self, client: &ClientHandle) -> Result<u64, QueryError> {
        let options = QueryOptions {
            count: true,
            ..QueryOptions::default()
        };
        let rows = self.fetch(client, &options)?;
        Ok(rows
            .first()
            .and_then(|row| row["count"].as_u64())
            .unwrap_or(0))
    }

    fn run(
        &self,
        client: &ClientHandle,
        options: &QueryOptions,
    ) -> Result<Vec<NodeView>, QueryError> {
        let rows = self.fetch(client, options)?;
        // One materializer across rows, so shared nodes dedupe by uid.
        let mut materializer = Materializer::new(client.clone());
        rows.iter()
            .map(|row| materializer.materialize(row))
            .collect()
    }

    fn fetch(
        &self,
        client: &ClientHandle,
        options: &QueryOptions,
    ) -> Result<Vec<serde_json::Value>, QueryError> {
        let text = compile(self, options);
        tracing::debug!(root = %self.node_type_name(), "executing query");
        let response = with_retries(RetryPolicy::default(), || {
            let mut txn = TxnGuard::begin(client.as_ref(), true, true)?;
            txn.query(&text, &HashMap::new())
        })?;
        let parsed: serde_json::Value = serde_json::from_str(&response.json)
            .map_err(|err| QueryError::parse(format!("result tree is not JSON: {err}")))?;
        match parsed.get("res") {
            None | Some(serde_json::Value::Null) => Ok(Vec::new()),
            Some(serde_json::Value::Array(rows)) => Ok(rows.clone()),
            Some(other) => Err(QueryError::parse(format!(
                "expected a result array, got {other}"
            ))),
        }
    }
}
