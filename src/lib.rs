//! prog2math: compile declarative indicator formulas into LaTeX.
//!
//! A formula is a tree of named operations (logic, comparisons,
//! number-theoretic predicates, bounded sums and products) whose leaves are
//! literals or variable names. [`domain::Evaluator`] validates the tree and
//! renders it into a single LaTeX expression.
//!
//! ```
//! use prog2math::domain::{render, Node};
//!
//! let node = Node::op("neq", [("a", Node::from(3)), ("b", Node::from(3))]);
//! let latex = render(&node).unwrap();
//! assert_eq!(latex, r"\left\lceil\frac{4\arctan^2{\left(3-3\right)}}{\pi^2}\right\rceil");
//! ```

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod outline;
pub mod util;
