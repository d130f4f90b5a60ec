//! JSON-pointer query engine.
//!
//! The stand-in external evaluator for the driver: each query is an RFC 6901
//! JSON pointer applied to the step's input data, or to the run context when
//! prefixed with `@`. An empty query passes the input through unchanged.

use anyhow::bail;
use scry_pipeline::QueryEngine;
use serde_json::Value;

/// Evaluates JSON-pointer expressions against `(data, context)` pairs.
#[derive(Debug, Default, Clone, Copy)]
pub struct PointerEngine;

impl QueryEngine for PointerEngine {
    type Value = Value;

    fn evaluate(&self, query: &str, data: &Value, context: &Value) -> anyhow::Result<Value> {
        let (root, pointer) = match query.strip_prefix('@') {
            Some(rest) => (context, rest),
            None => (data, query),
        };
        if pointer.is_empty() {
            return Ok(root.clone());
        }
        match root.pointer(pointer) {
            Some(value) => Ok(value.clone()),
            None => bail!("no value at pointer {pointer:?}"),
        }
    }
}
