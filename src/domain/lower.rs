//! Lowering: raw [`Node`] trees into typed [`Expr`] trees.
//!
//! All catalog validation happens here: unknown operations and parameters,
//! missing or duplicated parameters, wrong parameter shapes, misplaced
//! `compose` nodes and the depth cap.

use std::collections::BTreeMap;

use tracing::trace;

use crate::domain::catalog::{
    CatalogEntry, OpKind, ParamKind, DEFAULT_DIVISOR_INDEX, DEFAULT_RANGE_INDEX,
};
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::evaluator::EvalOptions;
use crate::domain::expr::{is_identifier, Binder, Expr, Operation};
use crate::domain::node::{Node, NodePath, OperationNode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Position {
    Root,
    Nested,
}

pub(crate) struct Lowerer<'o> {
    options: &'o EvalOptions,
}

impl<'o> Lowerer<'o> {
    pub(crate) fn new(options: &'o EvalOptions) -> Self {
        Self { options }
    }

    pub(crate) fn lower_root(&self, root: &Node) -> DomainResult<Expr> {
        let path = NodePath::root();
        if self.options.require_labeled_root {
            let is_compose = match root {
                Node::Operation(op) => {
                    OpKind::lookup(&op.name).map(|e| e.kind) == Some(OpKind::Compose)
                }
                _ => false,
            };
            if !is_compose {
                let operation = match root {
                    Node::Operation(op) => op.name.clone(),
                    other => other.shape().to_string(),
                };
                return Err(DomainError::InvalidRootOperation {
                    operation,
                    path,
                    reason: "a labeled formula must start with `compose`",
                });
            }
        }
        self.lower(root, &path, Position::Root)
    }

    fn lower(&self, node: &Node, path: &NodePath, position: Position) -> DomainResult<Expr> {
        match node {
            Node::Number(n) => Ok(Expr::Number(n.to_string())),
            Node::Text(t) => Ok(Expr::Symbol {
                name: t.clone(),
                path: path.clone(),
            }),
            Node::Flag(_) => Err(DomainError::MalformedNode {
                path: path.clone(),
                reason: "a boolean is only valid as a flag parameter".to_string(),
            }),
            Node::Operation(op) => {
                let operation = self.lower_operation(op, path, position)?;
                Ok(Expr::Apply(Box::new(operation)))
            }
        }
    }

    fn lower_operation(
        &self,
        op: &OperationNode,
        path: &NodePath,
        position: Position,
    ) -> DomainResult<Operation> {
        let entry = OpKind::lookup(&op.name).ok_or_else(|| DomainError::UnknownOperation {
            name: op.name.clone(),
            path: path.clone(),
        })?;
        if entry.kind == OpKind::Compose && position == Position::Nested {
            return Err(DomainError::InvalidRootOperation {
                operation: op.name.clone(),
                path: path.clone(),
                reason: "`compose` is only valid as the root node",
            });
        }
        if let Some(limit) = self.options.max_depth {
            if path.depth() >= limit {
                return Err(DomainError::RecursionLimitExceeded {
                    limit,
                    path: path.clone(),
                });
            }
        }
        trace!("lower: {} at {}", entry.name, path);

        let args = Args::new(self, entry, op, path)?;
        let operation = match entry.kind {
            OpKind::Not => Operation::Not { a: args.expr("a")? },
            OpKind::And => Operation::And {
                a: args.expr("a")?,
                b: args.expr("b")?,
            },
            OpKind::Or => Operation::Or {
                a: args.expr("a")?,
                b: args.expr("b")?,
            },
            OpKind::Neq => Operation::Neq {
                a: args.expr("a")?,
                b: args.expr("b")?,
            },
            OpKind::Eq => Operation::Eq {
                a: args.expr("a")?,
                b: args.expr("b")?,
            },
            OpKind::NonNegative => Operation::NonNegative { x: args.expr("x")? },
            OpKind::Lte => Operation::Lte {
                a: args.expr("a")?,
                b: args.expr("b")?,
            },
            OpKind::Lt => Operation::Lt {
                a: args.expr("a")?,
                b: args.expr("b")?,
            },
            OpKind::Gt => Operation::Gt {
                a: args.expr("a")?,
                b: args.expr("b")?,
            },
            OpKind::Gte => Operation::Gte {
                a: args.expr("a")?,
                b: args.expr("b")?,
            },
            OpKind::IsInteger => Operation::IsInteger { x: args.expr("x")? },
            OpKind::IsNatural => Operation::IsNatural {
                x: args.expr("x")?,
                allow_zero: args.flag("allow_zero")?,
            },
            OpKind::Divides => Operation::Divides {
                a: args.expr("a")?,
                b: args.expr("b")?,
            },
            OpKind::DoesNotDivide => Operation::DoesNotDivide {
                a: args.expr("a")?,
                b: args.expr("b")?,
            },
            OpKind::Mod => Operation::Mod {
                a: args.expr("a")?,
                b: args.expr("b")?,
            },
            OpKind::IsPrimeWilson => Operation::IsPrimeWilson { n: args.expr("n")? },
            OpKind::IsPrimeDivisors => {
                let a = args.expr("a")?;
                let index = args.divisor_index(&a)?;
                Operation::IsPrimeDivisors { a, index }
            }
            OpKind::Digit => Operation::Digit {
                x: args.expr("x")?,
                n: args.expr("n")?,
            },
            OpKind::SumRange => Operation::SumRange(args.binder("term")?),
            OpKind::ProductRange => Operation::ProductRange(args.binder("term")?),
            OpKind::CountInRange => Operation::CountInRange(args.binder("indicator")?),
            OpKind::AllInRange => Operation::AllInRange(args.binder("indicator")?),
            OpKind::CountAtLeast => Operation::CountAtLeast {
                range: args.binder("indicator")?,
                n: args.expr("n")?,
            },
            OpKind::Compose => Operation::Compose {
                prefix: args.prefix("a")?,
                body: args.expr("b")?,
            },
        };
        Ok(operation)
    }
}

/// Parameter accessor for one operation node, checked against its catalog entry.
struct Args<'a> {
    lowerer: &'a Lowerer<'a>,
    entry: &'static CatalogEntry,
    op: &'a OperationNode,
    path: &'a NodePath,
}

impl<'a> Args<'a> {
    fn new(
        lowerer: &'a Lowerer<'a>,
        entry: &'static CatalogEntry,
        op: &'a OperationNode,
        path: &'a NodePath,
    ) -> DomainResult<Self> {
        if let Some(key) = op
            .params
            .keys()
            .find(|key| !entry.params.iter().any(|p| p.accepts(key)))
        {
            return Err(DomainError::UnknownParameter {
                operation: entry.name,
                parameter: key.clone(),
                path: path.clone(),
            });
        }
        Ok(Self {
            lowerer,
            entry,
            op,
            path,
        })
    }

    fn params(&self) -> &'a BTreeMap<String, Node> {
        &self.op.params
    }

    /// Value given for `name` under its own name or an alias, with the key used.
    fn get(&self, name: &'static str) -> DomainResult<Option<(&'a str, &'a Node)>> {
        let aliases = self.entry.param(name).map_or(&[][..], |p| p.aliases);
        let mut found = self
            .params()
            .iter()
            .filter(|(key, _)| key.as_str() == name || aliases.contains(&key.as_str()));
        match (found.next(), found.next()) {
            (None, _) => Ok(None),
            (Some((key, node)), None) => Ok(Some((key.as_str(), node))),
            (Some(_), Some(_)) => Err(DomainError::DuplicateParameter {
                operation: self.entry.name,
                parameter: name,
                path: self.path.clone(),
            }),
        }
    }

    fn required(&self, name: &'static str) -> DomainResult<(&'a str, &'a Node)> {
        self.get(name)?.ok_or_else(|| DomainError::MissingParameter {
            operation: self.entry.name,
            parameter: name,
            path: self.path.clone(),
        })
    }

    fn bad_kind(&self, name: &'static str, expected: ParamKind, found: &Node) -> DomainError {
        DomainError::BadParameterKind {
            operation: self.entry.name,
            parameter: name,
            expected,
            found: found.shape(),
            path: self.path.clone(),
        }
    }

    fn nested(&self, name: &'static str, expected: ParamKind) -> DomainResult<Expr> {
        let (key, node) = self.required(name)?;
        if let Node::Flag(_) = node {
            return Err(self.bad_kind(name, expected, node));
        }
        let child = self.path.child(&self.op.name, key);
        self.lowerer.lower(node, &child, Position::Nested)
    }

    fn expr(&self, name: &'static str) -> DomainResult<Expr> {
        self.nested(name, ParamKind::Expr)
    }

    fn bound(&self, name: &'static str) -> DomainResult<Expr> {
        self.nested(name, ParamKind::Bound)
    }

    fn declarator(&self, name: &'static str, default: &str) -> DomainResult<String> {
        match self.get(name)? {
            None => Ok(default.to_string()),
            Some((_, Node::Text(letter))) if is_identifier(letter) => Ok(letter.clone()),
            Some((_, Node::Text(letter))) => Err(DomainError::InvalidIndexLetter {
                operation: self.entry.name,
                letter: letter.clone(),
                path: self.path.clone(),
            }),
            Some((_, other)) => Err(self.bad_kind(name, ParamKind::Declarator, other)),
        }
    }

    /// The divisor index must be a single lowercase letter the operand does
    /// not mention. Without an explicit letter the first free one from
    /// [`DEFAULT_DIVISOR_INDEX`] on is taken.
    fn divisor_index(&self, operand: &Expr) -> DomainResult<String> {
        let mentioned = operand.mentioned_names();
        let invalid = |letter: String| DomainError::InvalidIndexLetter {
            operation: self.entry.name,
            letter,
            path: self.path.clone(),
        };

        if self.get("index_letter")?.is_none() {
            return ('i'..='z')
                .chain('a'..'i')
                .map(String::from)
                .find(|letter| !mentioned.contains(letter))
                .ok_or_else(|| invalid(DEFAULT_DIVISOR_INDEX.to_string()));
        }

        let index = self.declarator("index_letter", DEFAULT_DIVISOR_INDEX)?;
        let mut chars = index.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) if c.is_ascii_lowercase() && !mentioned.contains(&index) => Ok(index),
            _ => Err(invalid(index)),
        }
    }

    fn flag(&self, name: &'static str) -> DomainResult<bool> {
        match self.get(name)? {
            None => Ok(false),
            Some((_, Node::Flag(value))) => Ok(*value),
            Some((_, other)) => Err(self.bad_kind(name, ParamKind::Flag, other)),
        }
    }

    fn prefix(&self, name: &'static str) -> DomainResult<String> {
        match self.required(name)? {
            (_, Node::Text(text)) => Ok(text.clone()),
            (_, Node::Number(n)) => Ok(n.to_string()),
            (_, other) => Err(self.bad_kind(name, ParamKind::Prefix, other)),
        }
    }

    fn binder(&self, body: &'static str) -> DomainResult<Binder> {
        Ok(Binder {
            lo: self.expr("lo")?,
            hi: self.expr("hi")?,
            index: self.declarator("index_letter", DEFAULT_RANGE_INDEX)?,
            body: self.bound(body)?,
        })
    }
}
