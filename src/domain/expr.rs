//! Typed formula tree produced by lowering a validated [`Node`](crate::domain::Node).

use std::collections::BTreeSet;

use crate::domain::catalog::OpKind;
use crate::domain::node::NodePath;

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Number in its source spelling.
    Number(String),
    /// Text leaf; `path` locates it for unbound-variable diagnostics.
    Symbol { name: String, path: NodePath },
    Apply(Box<Operation>),
}

impl Expr {
    /// Variable-like names mentioned anywhere in this tree, including those
    /// inside notation fragments such as `n+1` or `\frac{a}{b}`.
    pub fn mentioned_names(&self) -> BTreeSet<String> {
        let mut names = BTreeSet::new();
        self.collect_names(&mut names);
        names
    }

    fn collect_names(&self, names: &mut BTreeSet<String>) {
        match self {
            Expr::Number(_) => {}
            Expr::Symbol { name, .. } => {
                names.extend(fragment_names(name).into_iter().map(str::to_string))
            }
            Expr::Apply(op) => {
                for operand in op.operands() {
                    operand.collect_names(names);
                }
            }
        }
    }
}

/// A bounded range over a freshly bound index.
#[derive(Debug, Clone, PartialEq)]
pub struct Binder {
    pub index: String,
    pub lo: Expr,
    pub hi: Expr,
    /// Rendered with `index` bound.
    pub body: Expr,
}

/// One variant per catalog entry, each with its own parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    Not { a: Expr },
    And { a: Expr, b: Expr },
    Or { a: Expr, b: Expr },
    Neq { a: Expr, b: Expr },
    Eq { a: Expr, b: Expr },
    NonNegative { x: Expr },
    Lte { a: Expr, b: Expr },
    Lt { a: Expr, b: Expr },
    Gt { a: Expr, b: Expr },
    Gte { a: Expr, b: Expr },
    IsInteger { x: Expr },
    IsNatural { x: Expr, allow_zero: bool },
    Divides { a: Expr, b: Expr },
    DoesNotDivide { a: Expr, b: Expr },
    Mod { a: Expr, b: Expr },
    IsPrimeWilson { n: Expr },
    IsPrimeDivisors { a: Expr, index: String },
    Digit { x: Expr, n: Expr },
    SumRange(Binder),
    ProductRange(Binder),
    CountInRange(Binder),
    AllInRange(Binder),
    CountAtLeast { range: Binder, n: Expr },
    Compose { prefix: String, body: Expr },
}

impl Operation {
    pub fn kind(&self) -> OpKind {
        match self {
            Operation::Not { .. } => OpKind::Not,
            Operation::And { .. } => OpKind::And,
            Operation::Or { .. } => OpKind::Or,
            Operation::Neq { .. } => OpKind::Neq,
            Operation::Eq { .. } => OpKind::Eq,
            Operation::NonNegative { .. } => OpKind::NonNegative,
            Operation::Lte { .. } => OpKind::Lte,
            Operation::Lt { .. } => OpKind::Lt,
            Operation::Gt { .. } => OpKind::Gt,
            Operation::Gte { .. } => OpKind::Gte,
            Operation::IsInteger { .. } => OpKind::IsInteger,
            Operation::IsNatural { .. } => OpKind::IsNatural,
            Operation::Divides { .. } => OpKind::Divides,
            Operation::DoesNotDivide { .. } => OpKind::DoesNotDivide,
            Operation::Mod { .. } => OpKind::Mod,
            Operation::IsPrimeWilson { .. } => OpKind::IsPrimeWilson,
            Operation::IsPrimeDivisors { .. } => OpKind::IsPrimeDivisors,
            Operation::Digit { .. } => OpKind::Digit,
            Operation::SumRange(_) => OpKind::SumRange,
            Operation::ProductRange(_) => OpKind::ProductRange,
            Operation::CountInRange(_) => OpKind::CountInRange,
            Operation::AllInRange(_) => OpKind::AllInRange,
            Operation::CountAtLeast { .. } => OpKind::CountAtLeast,
            Operation::Compose { .. } => OpKind::Compose,
        }
    }

    /// Child expressions in parameter order.
    pub fn operands(&self) -> Vec<&Expr> {
        match self {
            Operation::Not { a }
            | Operation::IsPrimeDivisors { a, .. }
            | Operation::NonNegative { x: a }
            | Operation::IsInteger { x: a }
            | Operation::IsNatural { x: a, .. }
            | Operation::IsPrimeWilson { n: a }
            | Operation::Compose { body: a, .. } => vec![a],
            Operation::And { a, b }
            | Operation::Or { a, b }
            | Operation::Neq { a, b }
            | Operation::Eq { a, b }
            | Operation::Lte { a, b }
            | Operation::Lt { a, b }
            | Operation::Gt { a, b }
            | Operation::Gte { a, b }
            | Operation::Divides { a, b }
            | Operation::DoesNotDivide { a, b }
            | Operation::Mod { a, b }
            | Operation::Digit { x: a, n: b } => vec![a, b],
            Operation::SumRange(range)
            | Operation::ProductRange(range)
            | Operation::CountInRange(range)
            | Operation::AllInRange(range) => vec![&range.lo, &range.hi, &range.body],
            Operation::CountAtLeast { range, n } => vec![&range.lo, &range.hi, &range.body, n],
        }
    }
}

/// Whether `text` looks like a variable name rather than a notation fragment.
///
/// Only such leaves take part in scope resolution; fragments like `\pi` or
/// `n+1` are emitted as they are.
pub fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

/// Names in a notation fragment: runs of letters, digits and `_` with any
/// leading digits dropped (`2i` mentions `i`). LaTeX commands such as `\pi`
/// are skipped.
pub fn fragment_names(text: &str) -> Vec<&str> {
    let mut names = Vec::new();
    let mut start = None;
    let mut command = false;
    for (pos, c) in text.char_indices().chain([(text.len(), ' ')]) {
        if c.is_ascii_alphanumeric() || c == '_' {
            start.get_or_insert(pos);
            continue;
        }
        if let Some(begin) = start.take() {
            let name = text[begin..pos].trim_start_matches(|d: char| d.is_ascii_digit());
            if !command && !name.is_empty() {
                names.push(name);
            }
        }
        command = c == '\\';
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("n", true)]
    #[case("x_1", true)]
    #[case("k2", true)]
    #[case(r"\pi", false)]
    #[case("n+1", false)]
    #[case("2n", false)]
    #[case("", false)]
    fn test_is_identifier(#[case] text: &str, #[case] expected: bool) {
        assert_eq!(is_identifier(text), expected);
    }

    #[rstest]
    #[case("i", &["i"])]
    #[case("n+1", &["n"])]
    #[case("2i", &["i"])]
    #[case(r"\pi", &[])]
    #[case(r"\frac{a}{b_2}", &["a", "b_2"])]
    #[case("10", &[])]
    fn test_fragment_names(#[case] text: &str, #[case] expected: &[&str]) {
        assert_eq!(fragment_names(text), expected);
    }

    #[test]
    fn given_nested_tree_when_collecting_names_then_includes_fragments_and_bodies() {
        let path = NodePath::root();
        let symbol = |name: &str| Expr::Symbol {
            name: name.to_string(),
            path: path.clone(),
        };
        let tree = Expr::Apply(Box::new(Operation::SumRange(Binder {
            index: "k".to_string(),
            lo: Expr::Number("1".to_string()),
            hi: symbol("n+m"),
            body: Expr::Apply(Box::new(Operation::Not { a: symbol(r"\pi k") })),
        })));

        let names: Vec<String> = tree.mentioned_names().into_iter().collect();

        assert_eq!(names, ["k", "m", "n"]);
    }
}
