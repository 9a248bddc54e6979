//! Domain layer: formula trees, the operation catalog and the evaluator
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod catalog;
pub mod error;
pub mod evaluator;
pub mod expr;
mod lower;
pub mod node;
pub mod notation;
pub mod scope;

pub use catalog::{CatalogEntry, OpKind, ParamKind, ParamSpec, CATALOG};
pub use error::{DomainError, DomainResult};
pub use evaluator::{render, EvalOptions, Evaluator, Rendering, DEFAULT_MAX_DEPTH};
pub use expr::{Binder, Expr, Operation};
pub use node::{Node, NodePath, OperationNode};
pub use scope::Scope;
