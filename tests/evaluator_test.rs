//! Evaluator behavior: scoping, validation errors, root rules and the depth cap.

use std::collections::BTreeSet;

use serde_json::{json, Value};

use prog2math::domain::{
    DomainError, EvalOptions, Evaluator, Expr, Node, NodePath, OpKind, ParamKind,
};
use prog2math::util::testing;

fn node(value: Value) -> Node {
    Node::from_value(&value).expect("valid node")
}

fn strict(external: &[&str]) -> Evaluator {
    Evaluator::new(EvalOptions {
        strict: true,
        external_symbols: external.iter().map(|s| s.to_string()).collect(),
        ..EvalOptions::default()
    })
}

fn not_chain(depth: usize) -> Node {
    let mut node = Node::from("x");
    for _ in 0..depth {
        node = Node::op("not", [("a", node)]);
    }
    node
}

// ============================================================
// Scoping
// ============================================================

#[test]
fn given_index_used_in_body_when_rendering_strict_then_is_bound() {
    // Arrange
    testing::init_test_setup();
    let tree = node(json!({"sum_range": {"lo": 1, "hi": "n", "term": "k"}}));

    // Act
    let rendering = strict(&["n"]).render(&tree).unwrap();

    // Assert
    assert_eq!(rendering.latex, r"\sum_{k=1}^{n}\left(k\right)");
    assert!(rendering.free_symbols.is_empty());
}

#[test]
fn given_index_used_in_bound_when_rendering_strict_then_sibling_does_not_see_it() {
    // Arrange
    let tree = node(json!({"sum_range": {"lo": 1, "hi": "k", "term": "k"}}));

    // Act
    let err = strict(&[]).render(&tree).unwrap_err();

    // Assert
    assert_eq!(
        err,
        DomainError::UnboundVariableReference {
            name: "k".to_string(),
            path: NodePath::root().child("sum_range", "hi"),
        }
    );
}

#[test]
fn given_nested_binder_with_same_index_when_rendering_then_inner_shadows_outer() {
    // Arrange: the inner upper bound refers to the outer k, the inner body to the inner k
    let tree = node(json!({"sum_range": {
        "lo": 1,
        "hi": "n",
        "term": {"product_range": {"lo": 1, "hi": "k", "term": "k"}}
    }}));

    // Act
    let rendering = strict(&["n"]).render(&tree).unwrap();

    // Assert
    assert_eq!(
        rendering.latex,
        r"\sum_{k=1}^{n}\left(\prod_{k=1}^{k}\left(k\right)\right)"
    );
}

#[test]
fn given_same_index_sum_inside_sum_when_rendering_then_inner_j_shadows_outer_j() {
    // Arrange: the inner upper bound is the outer j, the inner term the inner j
    let tree = node(json!({"sum_range": {
        "lo": 1,
        "hi": "n",
        "index_letter": "j",
        "term": {"sum_range": {"lo": 1, "hi": "j", "index_letter": "j", "term": "j"}}
    }}));

    // Act
    let rendering = strict(&["n"]).render(&tree).unwrap();

    // Assert
    assert_eq!(
        rendering.latex,
        r"\sum_{j=1}^{n}\left(\sum_{j=1}^{j}\left(j\right)\right)"
    );
    assert!(rendering.free_symbols.is_empty());
}

#[test]
fn given_binder_inside_and_when_rendering_strict_then_other_operand_is_outside_scope() {
    let tree = node(json!({"and": {
        "a": {"count_in_range": {"lo": 1, "hi": 5, "index_letter": "j", "indicator": "j"}},
        "b": "j"
    }}));

    let err = strict(&[]).render(&tree).unwrap_err();

    assert_eq!(err.path(), &NodePath::root().child("and", "b"));
}

#[test]
fn given_divisor_index_when_operand_uses_it_then_is_unbound() {
    let tree = node(json!({"is_prime_divisors": {"a": "i"}}));

    let err = strict(&[]).render(&tree).unwrap_err();

    assert!(matches!(err, DomainError::UnboundVariableReference { ref name, .. } if name == "i"));
}

#[test]
fn given_operand_mentioning_default_divisor_index_when_rendering_then_uses_next_letter() {
    // Act
    let latex = Evaluator::default()
        .render(&node(json!({"is_prime_divisors": {"a": "i"}})))
        .unwrap()
        .latex;

    // Assert
    assert!(latex.contains(r"\prod_{j=2}^{i-1}"), "{latex}");
    assert!(latex.contains(r"\frac{i}{j}"), "{latex}");
    assert!(!latex.contains(r"\frac{i}{i}"), "{latex}");
}

#[test]
fn given_divisor_operand_bound_by_enclosing_sum_when_rendering_then_index_is_not_captured() {
    // Arrange
    let tree = node(json!({"sum_range": {
        "lo": 1,
        "hi": "n",
        "index_letter": "i",
        "term": {"is_prime_divisors": {"a": "i"}}
    }}));

    // Act
    let rendering = strict(&["n"]).render(&tree).unwrap();

    // Assert
    let expected_term = Evaluator::default()
        .render(&node(json!({"is_prime_divisors": {"a": "i", "index_letter": "j"}})))
        .unwrap()
        .latex;
    assert_eq!(
        rendering.latex,
        [r"\sum_{i=1}^{n}\left(", expected_term.as_str(), r"\right)"].concat()
    );
}

#[test]
fn given_operand_fragment_mentioning_index_when_rendering_then_skips_that_letter() {
    let latex = Evaluator::default()
        .render(&node(json!({"is_prime_divisors": {"a": "2i+j"}})))
        .unwrap()
        .latex;
    assert!(latex.contains(r"\prod_{k=2}^{2i+j-1}"), "{latex}");
}

#[test]
fn given_explicit_divisor_index_clashing_with_operand_when_rendering_then_invalid_index_letter() {
    let err = Evaluator::default()
        .render(&node(json!({"is_prime_divisors": {"a": "m+1", "index_letter": "m"}})))
        .unwrap_err();
    assert_eq!(
        err,
        DomainError::InvalidIndexLetter {
            operation: "is_prime_divisors",
            letter: "m".to_string(),
            path: NodePath::root(),
        }
    );
}

#[test]
fn given_free_variables_when_rendering_lenient_then_collects_them() {
    // Arrange
    let tree = node(json!({"compose": {
        "a": "f=",
        "b": {"and": {
            "a": {"lt": {"a": "x", "b": "y"}},
            "b": {"sum_range": {"lo": 1, "hi": "x", "term": {"mod": {"a": "k", "b": r"\pi"}}}}
        }}
    }}));

    // Act
    let rendering = Evaluator::default().render(&tree).unwrap();

    // Assert
    let expected: BTreeSet<String> = ["x", "y"].iter().map(|s| s.to_string()).collect();
    assert_eq!(rendering.free_symbols, expected);
}

// ============================================================
// Node validation
// ============================================================

#[test]
fn given_undeclared_key_when_rendering_then_unknown_parameter() {
    let err = Evaluator::default()
        .render(&node(json!({"not": {"a": 1, "c": 2}})))
        .unwrap_err();
    assert!(matches!(
        err,
        DomainError::UnknownParameter { operation: "not", ref parameter, .. } if parameter == "c"
    ));
}

#[test]
fn given_name_and_alias_when_rendering_then_duplicate_parameter() {
    let err = Evaluator::default()
        .render(&node(json!({"not": {"a": 1, "indicator": 2}})))
        .unwrap_err();
    assert!(matches!(
        err,
        DomainError::DuplicateParameter { operation: "not", parameter: "a", .. }
    ));
}

#[test]
fn given_nested_operation_as_declarator_when_rendering_then_bad_parameter_kind() {
    let tree = node(json!({"sum_range": {
        "lo": 1, "hi": 2, "index_letter": {"not": {"a": 1}}, "term": "k"
    }}));

    let err = Evaluator::default().render(&tree).unwrap_err();

    assert_eq!(
        err,
        DomainError::BadParameterKind {
            operation: "sum_range",
            parameter: "index_letter",
            expected: ParamKind::Declarator,
            found: "nested operation",
            path: NodePath::root(),
        }
    );
}

#[test]
fn given_boolean_as_expression_when_rendering_then_bad_parameter_kind() {
    let err = Evaluator::default()
        .render(&node(json!({"not": {"a": true}})))
        .unwrap_err();
    assert!(matches!(
        err,
        DomainError::BadParameterKind { expected: ParamKind::Expr, found: "boolean", .. }
    ));
}

#[test]
fn given_nested_prefix_when_rendering_compose_then_bad_parameter_kind() {
    let err = Evaluator::default()
        .render(&node(json!({"compose": {"a": {"not": {"a": 1}}, "b": 1}})))
        .unwrap_err();
    assert!(matches!(
        err,
        DomainError::BadParameterKind { expected: ParamKind::Prefix, .. }
    ));
}

#[test]
fn given_string_flag_when_rendering_is_natural_then_bad_parameter_kind() {
    let err = Evaluator::default()
        .render(&node(json!({"is_natural": {"x": "n", "allow_zero": "yes"}})))
        .unwrap_err();
    assert!(matches!(
        err,
        DomainError::BadParameterKind { expected: ParamKind::Flag, .. }
    ));
}

#[test]
fn given_invalid_declarators_when_rendering_then_invalid_index_letter() {
    let evaluator = Evaluator::default();
    for tree in [
        json!({"is_prime_divisors": {"a": "n", "index_letter": "ij"}}),
        json!({"is_prime_divisors": {"a": "n", "index_letter": "I"}}),
        json!({"sum_range": {"lo": 1, "hi": 2, "index_letter": "2k", "term": 1}}),
    ] {
        let err = evaluator.render(&node(tree)).unwrap_err();
        assert!(
            matches!(err, DomainError::InvalidIndexLetter { .. }),
            "unexpected {err:?}"
        );
    }
}

#[test]
fn given_multi_letter_range_index_when_rendering_then_is_accepted() {
    let latex = Evaluator::default()
        .render(&node(json!({"sum_range": {"lo": 1, "hi": 3, "index_letter": "idx", "term": "idx"}})))
        .unwrap()
        .latex;
    assert_eq!(latex, r"\sum_{idx=1}^{3}\left(idx\right)");
}

#[test]
fn given_unknown_nested_operation_when_rendering_then_reports_path() {
    let err = Evaluator::default()
        .render(&node(json!({"and": {"a": 1, "b": {"not": {"a": {"frobnicate": {}}}}}})))
        .unwrap_err();
    assert_eq!(err.to_string(), "unknown operation `frobnicate` at $.and.b.not.a");
}

#[test]
fn given_alias_when_lowering_then_builds_canonical_variant() {
    let expr = Evaluator::default()
        .lower(&node(json!({"get_post_decimal_point_digit": {"a": "x", "b": 2}})))
        .unwrap();
    match expr {
        Expr::Apply(op) => assert_eq!(op.kind(), OpKind::Digit),
        other => panic!("expected an operation, got {other:?}"),
    }
}

// ============================================================
// Root rules
// ============================================================

#[test]
fn given_compose_below_root_when_rendering_then_invalid_root_operation() {
    let err = Evaluator::default()
        .render(&node(json!({"not": {"a": {"compose": {"a": "f=", "b": 1}}}})))
        .unwrap_err();
    assert!(matches!(
        err,
        DomainError::InvalidRootOperation { ref path, .. } if *path == NodePath::root().child("not", "a")
    ));
}

#[test]
fn given_labeled_root_required_when_root_is_not_compose_then_invalid_root_operation() {
    let evaluator = Evaluator::new(EvalOptions {
        require_labeled_root: true,
        ..EvalOptions::default()
    });

    let err = evaluator
        .render(&node(json!({"not": {"a": 1}})))
        .unwrap_err();
    let ok = evaluator.render(&node(json!({"compose": {"a": "f=", "b": 1}})));

    assert!(matches!(err, DomainError::InvalidRootOperation { ref path, .. } if path.is_root()));
    assert_eq!(ok.unwrap().latex, r"f=\left(1\right)");
}

// ============================================================
// Depth cap
// ============================================================

#[test]
fn given_tree_deeper_than_limit_when_rendering_then_recursion_limit_exceeded() {
    let evaluator = Evaluator::new(EvalOptions {
        max_depth: Some(2),
        ..EvalOptions::default()
    });

    let err = evaluator.render(&not_chain(3)).unwrap_err();

    assert_eq!(
        err,
        DomainError::RecursionLimitExceeded {
            limit: 2,
            path: NodePath::root().child("not", "a").child("not", "a"),
        }
    );
    assert!(evaluator.render(&not_chain(2)).is_ok());
}

#[test]
fn given_default_limit_when_tree_is_very_deep_then_fails_instead_of_recursing() {
    let err = Evaluator::default().render(&not_chain(300)).unwrap_err();
    assert!(matches!(err, DomainError::RecursionLimitExceeded { limit: 256, .. }));
}

#[test]
fn given_disabled_limit_when_tree_is_deep_then_renders() {
    let evaluator = Evaluator::new(EvalOptions {
        max_depth: None,
        ..EvalOptions::default()
    });
    let latex = evaluator.render(&not_chain(300)).unwrap().latex;
    assert!(latex.starts_with(r"1-\left(1-\left("));
    assert!(latex.ends_with(r"x\right)\right)"));
}

#[test]
fn given_evaluator_then_is_shareable_across_threads() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Evaluator>();
}
