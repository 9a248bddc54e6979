//! Raw formula tree as supplied by the caller.

use std::collections::BTreeMap;
use std::fmt;

use serde_json::{Number, Value};

use crate::domain::error::{DomainError, DomainResult};

/// One node of the declarative tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Numeric literal, rendered with its source spelling.
    Number(Number),
    /// Variable name or opaque notation fragment.
    Text(String),
    /// Boolean literal, only accepted by flag parameters.
    Flag(bool),
    /// Operation name with its named parameters.
    Operation(OperationNode),
}

#[derive(Debug, Clone, PartialEq)]
pub struct OperationNode {
    pub name: String,
    pub params: BTreeMap<String, Node>,
}

impl Node {
    /// Build an operation node from `(parameter, value)` pairs.
    pub fn op<'a>(name: &str, params: impl IntoIterator<Item = (&'a str, Node)>) -> Self {
        Node::Operation(OperationNode {
            name: name.to_string(),
            params: params
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        })
    }

    pub fn text(value: impl Into<String>) -> Self {
        Node::Text(value.into())
    }

    /// Short label of the node shape, used in diagnostics.
    pub fn shape(&self) -> &'static str {
        match self {
            Node::Number(_) => "number",
            Node::Text(_) => "string",
            Node::Flag(_) => "boolean",
            Node::Operation(_) => "nested operation",
        }
    }

    /// Convert a parsed JSON value into a node tree.
    ///
    /// Objects must hold exactly one entry (the operation name) whose value is
    /// the parameter object. Arrays and nulls are rejected.
    pub fn from_value(value: &Value) -> DomainResult<Self> {
        Self::from_value_at(value, &NodePath::root())
    }

    fn from_value_at(value: &Value, path: &NodePath) -> DomainResult<Self> {
        match value {
            Value::Number(n) => Ok(Node::Number(n.clone())),
            Value::String(s) => Ok(Node::Text(s.clone())),
            Value::Bool(b) => Ok(Node::Flag(*b)),
            Value::Object(map) => {
                let mut entries = map.iter();
                let (Some((name, params)), None) = (entries.next(), entries.next()) else {
                    return Err(DomainError::MalformedNode {
                        path: path.clone(),
                        reason: format!(
                            "operation node must have exactly one entry, found {}",
                            map.len()
                        ),
                    });
                };
                let Value::Object(params) = params else {
                    return Err(DomainError::MalformedNode {
                        path: path.clone(),
                        reason: format!("parameters of `{name}` must be an object"),
                    });
                };
                let mut converted = BTreeMap::new();
                for (key, param) in params {
                    let child = Self::from_value_at(param, &path.child(name, key))?;
                    converted.insert(key.clone(), child);
                }
                Ok(Node::Operation(OperationNode {
                    name: name.clone(),
                    params: converted,
                }))
            }
            Value::Array(_) => Err(DomainError::MalformedNode {
                path: path.clone(),
                reason: "arrays are not valid nodes".to_string(),
            }),
            Value::Null => Err(DomainError::MalformedNode {
                path: path.clone(),
                reason: "null is not a valid node".to_string(),
            }),
        }
    }
}

impl From<i64> for Node {
    fn from(value: i64) -> Self {
        Node::Number(Number::from(value))
    }
}

impl From<&str> for Node {
    fn from(value: &str) -> Self {
        Node::Text(value.to_string())
    }
}

impl From<bool> for Node {
    fn from(value: bool) -> Self {
        Node::Flag(value)
    }
}

impl TryFrom<&Value> for Node {
    type Error = DomainError;

    fn try_from(value: &Value) -> DomainResult<Self> {
        Node::from_value(value)
    }
}

/// Location of a node: the chain of `(operation, parameter)` hops from the root.
///
/// Displayed as `$` for the root and `$.compose.b.and.a` for nested nodes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodePath {
    hops: Vec<(String, String)>,
}

impl NodePath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn child(&self, operation: &str, parameter: &str) -> Self {
        let mut hops = self.hops.clone();
        hops.push((operation.to_string(), parameter.to_string()));
        Self { hops }
    }

    pub fn is_root(&self) -> bool {
        self.hops.is_empty()
    }

    pub fn depth(&self) -> usize {
        self.hops.len()
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "$")?;
        for (operation, parameter) in &self.hops {
            write!(f, ".{operation}.{parameter}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn given_nested_json_when_converting_then_builds_operation_tree() {
        let node = Node::from_value(&json!({"not": {"a": {"eq": {"a": 1, "b": "x"}}}})).unwrap();
        let expected = Node::op(
            "not",
            [("a", Node::op("eq", [("a", Node::from(1)), ("b", Node::from("x"))]))],
        );
        assert_eq!(node, expected);
    }

    #[test]
    fn given_two_keys_when_converting_then_reports_malformed_root() {
        let err = Node::from_value(&json!({"not": {}, "and": {}})).unwrap_err();
        assert!(matches!(err, DomainError::MalformedNode { ref path, .. } if path.is_root()));
    }

    #[test]
    fn given_array_parameter_when_converting_then_reports_its_path() {
        let err = Node::from_value(&json!({"and": {"a": [1, 2], "b": 1}})).unwrap_err();
        assert_eq!(err.path().to_string(), "$.and.a");
    }

    #[test]
    fn test_path_display() {
        let path = NodePath::root().child("compose", "b").child("and", "a");
        assert_eq!(NodePath::root().to_string(), "$");
        assert_eq!(path.to_string(), "$.compose.b.and.a");
        assert_eq!(path.depth(), 2);
    }
}
