//! Renders formula trees to LaTeX.
//!
//! Evaluation runs in two passes: [`Lowerer`] validates the raw tree against
//! the catalog, then the renderer walks the typed tree post-order, threading
//! an immutable [`Scope`] so each binder's variable is visible only inside
//! its body parameter.

use std::collections::BTreeSet;

use tracing::{debug, instrument, trace};

use crate::domain::error::{DomainError, DomainResult};
use crate::domain::expr::{is_identifier, Binder, Expr, Operation};
use crate::domain::lower::Lowerer;
use crate::domain::node::{Node, NodePath};
use crate::domain::notation;
use crate::domain::scope::Scope;

/// Default nesting limit for operation nodes.
pub const DEFAULT_MAX_DEPTH: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvalOptions {
    /// Maximum nesting of operation nodes; `None` disables the check.
    pub max_depth: Option<usize>,
    /// Reject identifier leaves that are neither bound nor external.
    pub strict: bool,
    /// Identifiers treated as bound at the root (formula parameters).
    pub external_symbols: BTreeSet<String>,
    /// Require the root to be a `compose` node.
    pub require_labeled_root: bool,
}

impl Default for EvalOptions {
    fn default() -> Self {
        Self {
            max_depth: Some(DEFAULT_MAX_DEPTH),
            strict: false,
            external_symbols: BTreeSet::new(),
            require_labeled_root: false,
        }
    }
}

/// Result of rendering one tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendering {
    pub latex: String,
    /// Identifier leaves that were neither bound nor external.
    pub free_symbols: BTreeSet<String>,
}

#[derive(Debug, Clone, Default)]
pub struct Evaluator {
    options: EvalOptions,
}

impl Evaluator {
    pub fn new(options: EvalOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &EvalOptions {
        &self.options
    }

    /// Validate `root` and build its typed tree without rendering it.
    pub fn lower(&self, root: &Node) -> DomainResult<Expr> {
        Lowerer::new(&self.options).lower_root(root)
    }

    #[instrument(level = "debug", skip_all)]
    pub fn render(&self, root: &Node) -> DomainResult<Rendering> {
        let expr = self.lower(root)?;
        self.render_expr(&expr)
    }

    pub fn render_expr(&self, expr: &Expr) -> DomainResult<Rendering> {
        let mut renderer = Renderer {
            options: &self.options,
            free_symbols: BTreeSet::new(),
        };
        let latex = renderer.expr(expr, &Scope::new())?;
        debug!(
            "rendered {} bytes, {} free symbol(s)",
            latex.len(),
            renderer.free_symbols.len()
        );
        Ok(Rendering {
            latex,
            free_symbols: renderer.free_symbols,
        })
    }
}

/// Render `root` with default options.
pub fn render(root: &Node) -> DomainResult<String> {
    Evaluator::default().render(root).map(|r| r.latex)
}

struct Renderer<'o> {
    options: &'o EvalOptions,
    free_symbols: BTreeSet<String>,
}

impl Renderer<'_> {
    fn expr(&mut self, expr: &Expr, scope: &Scope) -> DomainResult<String> {
        match expr {
            Expr::Number(n) => Ok(n.clone()),
            Expr::Symbol { name, path } => self.symbol(name, path, scope),
            Expr::Apply(op) => self.operation(op, scope),
        }
    }

    fn symbol(&mut self, name: &str, path: &NodePath, scope: &Scope) -> DomainResult<String> {
        if is_identifier(name)
            && !scope.is_bound(name)
            && !self.options.external_symbols.contains(name)
        {
            if self.options.strict {
                return Err(DomainError::UnboundVariableReference {
                    name: name.to_string(),
                    path: path.clone(),
                });
            }
            trace!("free symbol `{}` at {}", name, path);
            self.free_symbols.insert(name.to_string());
        }
        Ok(name.to_string())
    }

    /// Bounds in the enclosing scope, body with the index bound.
    fn binder(&mut self, binder: &Binder, scope: &Scope) -> DomainResult<[String; 3]> {
        let lo = self.expr(&binder.lo, scope)?;
        let hi = self.expr(&binder.hi, scope)?;
        let body = self.expr(&binder.body, &scope.bind(&binder.index))?;
        Ok([lo, hi, body])
    }

    fn operation(&mut self, op: &Operation, scope: &Scope) -> DomainResult<String> {
        let rendered = match op {
            Operation::Not { a } => notation::not(&self.expr(a, scope)?),
            Operation::And { a, b } => {
                let (a, b) = self.pair(a, b, scope)?;
                notation::and(&a, &b)
            }
            Operation::Or { a, b } => {
                let (a, b) = self.pair(a, b, scope)?;
                notation::or(&a, &b)
            }
            Operation::Neq { a, b } => {
                let (a, b) = self.pair(a, b, scope)?;
                notation::neq(&a, &b)
            }
            Operation::Eq { a, b } => {
                let (a, b) = self.pair(a, b, scope)?;
                notation::eq(&a, &b)
            }
            Operation::NonNegative { x } => notation::nonneg(&self.expr(x, scope)?),
            Operation::Lte { a, b } => {
                let (a, b) = self.pair(a, b, scope)?;
                notation::lte(&a, &b)
            }
            Operation::Lt { a, b } => {
                let (a, b) = self.pair(a, b, scope)?;
                notation::lt(&a, &b)
            }
            Operation::Gt { a, b } => {
                let (a, b) = self.pair(a, b, scope)?;
                notation::gt(&a, &b)
            }
            Operation::Gte { a, b } => {
                let (a, b) = self.pair(a, b, scope)?;
                notation::gte(&a, &b)
            }
            Operation::IsInteger { x } => notation::is_integer(&self.expr(x, scope)?),
            Operation::IsNatural { x, allow_zero } => {
                notation::is_natural(&self.expr(x, scope)?, *allow_zero)
            }
            Operation::Divides { a, b } => {
                let (a, b) = self.pair(a, b, scope)?;
                notation::divides(&a, &b)
            }
            Operation::DoesNotDivide { a, b } => {
                let (a, b) = self.pair(a, b, scope)?;
                notation::does_not_divide(&a, &b)
            }
            Operation::Mod { a, b } => {
                let (a, b) = self.pair(a, b, scope)?;
                notation::modulo(&a, &b)
            }
            Operation::IsPrimeWilson { n } => notation::is_prime_wilson(&self.expr(n, scope)?),
            Operation::IsPrimeDivisors { a, index } => {
                notation::is_prime_divisors(&self.expr(a, scope)?, index)
            }
            Operation::Digit { x, n } => {
                let (x, n) = self.pair(x, n, scope)?;
                notation::digit(&x, &n)
            }
            Operation::SumRange(binder) | Operation::CountInRange(binder) => {
                let [lo, hi, body] = self.binder(binder, scope)?;
                notation::sum_range(&binder.index, &lo, &hi, &body)
            }
            Operation::ProductRange(binder) | Operation::AllInRange(binder) => {
                let [lo, hi, body] = self.binder(binder, scope)?;
                notation::product_range(&binder.index, &lo, &hi, &body)
            }
            Operation::CountAtLeast { range, n } => {
                let [lo, hi, body] = self.binder(range, scope)?;
                let n = self.expr(n, scope)?;
                notation::count_at_least(&range.index, &lo, &hi, &n, &body)
            }
            Operation::Compose { prefix, body } => {
                notation::compose(prefix, &self.expr(body, scope)?)
            }
        };
        trace!("render: {} -> {} bytes", op.kind().name(), rendered.len());
        Ok(rendered)
    }

    fn pair(&mut self, a: &Expr, b: &Expr, scope: &Scope) -> DomainResult<(String, String)> {
        let a = self.expr(a, scope)?;
        let b = self.expr(b, scope)?;
        Ok((a, b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sum_over_k(term: Node) -> Node {
        Node::op(
            "sum_range",
            [
                ("lo", Node::from(1)),
                ("hi", Node::from("n")),
                ("term", term),
            ],
        )
    }

    #[test]
    fn given_literal_root_when_rendering_then_emits_verbatim() {
        assert_eq!(render(&Node::from(r"\pi")).unwrap(), r"\pi");
        assert_eq!(render(&Node::from(42)).unwrap(), "42");
    }

    #[test]
    fn given_binder_when_rendering_then_index_is_not_free() {
        let evaluator = Evaluator::default();
        let rendering = evaluator.render(&sum_over_k(Node::from("k"))).unwrap();

        assert_eq!(rendering.latex, r"\sum_{k=1}^{n}\left(k\right)");
        assert_eq!(
            rendering.free_symbols.into_iter().collect::<Vec<_>>(),
            vec!["n".to_string()]
        );
    }

    #[test]
    fn given_strict_mode_when_symbol_is_external_then_renders() {
        let evaluator = Evaluator::new(EvalOptions {
            strict: true,
            external_symbols: BTreeSet::from(["n".to_string()]),
            ..EvalOptions::default()
        });
        let rendering = evaluator.render(&sum_over_k(Node::from("k"))).unwrap();
        assert!(rendering.free_symbols.is_empty());
    }

    #[test]
    fn given_strict_mode_when_symbol_is_unbound_then_reports_its_path() {
        let evaluator = Evaluator::new(EvalOptions {
            strict: true,
            ..EvalOptions::default()
        });
        let err = evaluator.render(&sum_over_k(Node::from("k"))).unwrap_err();
        assert_eq!(
            err,
            DomainError::UnboundVariableReference {
                name: "n".to_string(),
                path: NodePath::root().child("sum_range", "hi"),
            }
        );
    }

    #[test]
    fn given_default_options_then_depth_is_capped() {
        assert_eq!(EvalOptions::default().max_depth, Some(DEFAULT_MAX_DEPTH));
    }
}
