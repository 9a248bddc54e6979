//! Lexical scope of bound variable names.

/// Ordered set of names bound by enclosing binders, innermost last.
///
/// Binding never mutates an existing scope: [`Scope::bind`] returns an
/// extended copy, so the parent scope is intact for sibling parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scope {
    bound: Vec<String>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of this scope with `name` bound innermost.
    pub fn bind(&self, name: &str) -> Self {
        let mut bound = self.bound.clone();
        bound.push(name.to_string());
        Self { bound }
    }

    pub fn is_bound(&self, name: &str) -> bool {
        self.bound.iter().any(|b| b == name)
    }
}
