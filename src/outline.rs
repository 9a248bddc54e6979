//! Text outline of a formula tree for the `tree` command.

use termtree::Tree;
use tracing::instrument;

use crate::domain::Node;

pub trait NodeOutline {
    fn to_outline(&self) -> Tree<String>;
}

impl NodeOutline for Node {
    #[instrument(level = "debug", skip_all)]
    fn to_outline(&self) -> Tree<String> {
        outline(self, None)
    }
}

/// Operations are labeled by name, literals by their text; parameter names prefix children.
fn outline(node: &Node, param: Option<&str>) -> Tree<String> {
    let label = match node {
        Node::Operation(op) => op.name.clone(),
        Node::Text(text) => text.clone(),
        Node::Number(n) => n.to_string(),
        Node::Flag(b) => b.to_string(),
    };
    let label = match param {
        Some(param) => format!("{param}: {label}"),
        None => label,
    };

    let leaves: Vec<_> = match node {
        Node::Operation(op) => op
            .params
            .iter()
            .map(|(key, child)| outline(child, Some(key)))
            .collect(),
        _ => Vec::new(),
    };
    Tree::new(label).with_leaves(leaves)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_nested_tree_when_outlining_then_lists_params_under_operations() {
        let node = Node::op(
            "compose",
            [
                ("a", Node::from("p_n=")),
                ("b", Node::op("is_integer", [("x", Node::from("n"))])),
            ],
        );

        let text = node.to_outline().to_string();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "compose");
        assert!(lines[1].ends_with("a: p_n="));
        assert!(lines[2].ends_with("b: is_integer"));
        assert!(lines[3].ends_with("x: n"));
        assert_eq!(lines.len(), 4);
    }
}
