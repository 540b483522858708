#![deny(missing_docs)]

//! # Path Parameters
//!
//! Collects the names of `in: path` parameters declared on Path Items and
//! Operations.
//!
//! `$ref` parameters are not resolved. They carry no literal `in` field and
//! are skipped like any other entry that is not a path parameter object.

use serde_yaml::{Mapping, Value};
use std::collections::BTreeSet;

/// Deduplicated, name-ordered set of path parameter names.
pub type PathParameterSet = BTreeSet<String>;

/// How path parameters flow between the operations of a single Path Item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ParameterScope {
    /// Parameters found on earlier operations of the same path stay in the
    /// set for every later operation.
    #[default]
    Accumulate,
    /// Every operation sees the Path Item parameters plus its own only.
    PerOperation,
}

/// Returns the names of the path parameters declared in `node`'s
/// `parameters` list, in declaration order.
///
/// `node` is either a Path Item or an Operation mapping.
pub fn declared_path_parameters(node: &Mapping) -> Vec<String> {
    let Some(parameters) = node.get("parameters").and_then(Value::as_sequence) else {
        return Vec::new();
    };

    parameters
        .iter()
        .filter_map(Value::as_mapping)
        .filter(|param| param.get("in").and_then(Value::as_str) == Some("path"))
        .filter_map(|param| param.get("name").and_then(Value::as_str))
        .map(str::to_string)
        .collect()
}
