//! The operation catalog: names, aliases and parameter specs.
//!
//! The table is a `static` and never changes at runtime. Legacy operation
//! names are accepted as aliases so existing input files still load.

use std::fmt;

/// Every operation the compiler knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpKind {
    Not,
    And,
    Or,
    Neq,
    Eq,
    NonNegative,
    Lte,
    Lt,
    Gt,
    Gte,
    IsInteger,
    IsNatural,
    Divides,
    DoesNotDivide,
    Mod,
    IsPrimeWilson,
    IsPrimeDivisors,
    Digit,
    SumRange,
    ProductRange,
    CountInRange,
    AllInRange,
    CountAtLeast,
    Compose,
}

/// Semantic kind of a parameter value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// Literal or nested operation, rendered in the enclosing scope.
    Expr,
    /// Literal or nested operation, rendered inside the operation's binder.
    Bound,
    /// Name of the variable the operation binds.
    Declarator,
    /// Boolean literal.
    Flag,
    /// Literal notation string, never a nested operation.
    Prefix,
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ParamKind::Expr => "expression",
            ParamKind::Bound => "bound expression",
            ParamKind::Declarator => "bound-variable declarator",
            ParamKind::Flag => "boolean flag",
            ParamKind::Prefix => "literal notation prefix",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub kind: ParamKind,
    pub required: bool,
}

impl ParamSpec {
    /// Whether `key` names this parameter, directly or by alias.
    pub fn accepts(&self, key: &str) -> bool {
        self.name == key || self.aliases.contains(&key)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogEntry {
    pub kind: OpKind,
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub params: &'static [ParamSpec],
    pub summary: &'static str,
}

impl CatalogEntry {
    pub fn param(&self, name: &str) -> Option<&'static ParamSpec> {
        self.params.iter().find(|p| p.name == name)
    }
}

const fn expr(name: &'static str) -> ParamSpec {
    ParamSpec {
        name,
        aliases: &[],
        kind: ParamKind::Expr,
        required: true,
    }
}

const fn expr_or(name: &'static str, aliases: &'static [&'static str]) -> ParamSpec {
    ParamSpec {
        name,
        aliases,
        kind: ParamKind::Expr,
        required: true,
    }
}

const fn bound(name: &'static str) -> ParamSpec {
    ParamSpec {
        name,
        aliases: &[],
        kind: ParamKind::Bound,
        required: true,
    }
}

const INDEX_LETTER: ParamSpec = ParamSpec {
    name: "index_letter",
    aliases: &[],
    kind: ParamKind::Declarator,
    required: false,
};

const BINARY: &[ParamSpec] = &[expr("a"), expr("b")];
const UNARY_X: &[ParamSpec] = &[expr_or("x", &["a"])];
const RANGE_TERM: &[ParamSpec] = &[expr("lo"), expr("hi"), INDEX_LETTER, bound("term")];
const RANGE_INDICATOR: &[ParamSpec] = &[expr("lo"), expr("hi"), INDEX_LETTER, bound("indicator")];

/// Default declarator of range binders.
pub const DEFAULT_RANGE_INDEX: &str = "k";
/// Default declarator of the divisor product in `is_prime_divisors`.
pub const DEFAULT_DIVISOR_INDEX: &str = "i";

pub static CATALOG: &[CatalogEntry] = &[
    CatalogEntry {
        kind: OpKind::Not,
        name: "not",
        aliases: &["logical_not"],
        params: &[expr_or("a", &["indicator"])],
        summary: "negation of an indicator: 1 - a",
    },
    CatalogEntry {
        kind: OpKind::And,
        name: "and",
        aliases: &["logical_and"],
        params: BINARY,
        summary: "conjunction of two indicators: a * b",
    },
    CatalogEntry {
        kind: OpKind::Or,
        name: "or",
        aliases: &["logical_or"],
        params: BINARY,
        summary: "disjunction by De Morgan: 1 - (1-a)(1-b)",
    },
    CatalogEntry {
        kind: OpKind::Neq,
        name: "neq",
        aliases: &["are_not_equal"],
        params: BINARY,
        summary: "a != b via the normalized squared arctangent",
    },
    CatalogEntry {
        kind: OpKind::Eq,
        name: "eq",
        aliases: &["are_equal"],
        params: BINARY,
        summary: "a = b as the negation of neq",
    },
    CatalogEntry {
        kind: OpKind::NonNegative,
        name: "nonneg",
        aliases: &["is_non_negative"],
        params: UNARY_X,
        summary: "x >= 0 as sqrt(x^2) = x",
    },
    CatalogEntry {
        kind: OpKind::Lte,
        name: "lte",
        aliases: &["less_than_or_equal"],
        params: BINARY,
        summary: "a <= b as nonneg(b - a)",
    },
    CatalogEntry {
        kind: OpKind::Lt,
        name: "lt",
        aliases: &["less_than"],
        params: BINARY,
        summary: "a < b as not(b <= a)",
    },
    CatalogEntry {
        kind: OpKind::Gt,
        name: "gt",
        aliases: &["bigger_than"],
        params: BINARY,
        summary: "a > b as b < a",
    },
    CatalogEntry {
        kind: OpKind::Gte,
        name: "gte",
        aliases: &["bigger_than_or_equal"],
        params: BINARY,
        summary: "a >= b as b <= a",
    },
    CatalogEntry {
        kind: OpKind::IsInteger,
        name: "is_integer",
        aliases: &[],
        params: UNARY_X,
        summary: "x is an integer via floor(cos^2(pi x))",
    },
    CatalogEntry {
        kind: OpKind::IsNatural,
        name: "is_natural",
        aliases: &[],
        params: &[
            expr_or("x", &["a"]),
            ParamSpec {
                name: "allow_zero",
                aliases: &["include_zero"],
                kind: ParamKind::Flag,
                required: false,
            },
        ],
        summary: "x is a natural number, starting at 0 when allow_zero is set",
    },
    CatalogEntry {
        kind: OpKind::Divides,
        name: "divides",
        aliases: &[],
        params: BINARY,
        summary: "a divides b: a != 0 and b/a is an integer",
    },
    CatalogEntry {
        kind: OpKind::DoesNotDivide,
        name: "does_not_divide",
        aliases: &[],
        params: BINARY,
        summary: "negation of divides",
    },
    CatalogEntry {
        kind: OpKind::Mod,
        name: "mod",
        aliases: &["get_mod"],
        params: BINARY,
        summary: "a mod b as a - b floor(a/b), not an indicator",
    },
    CatalogEntry {
        kind: OpKind::IsPrimeWilson,
        name: "is_prime_wilson",
        aliases: &[],
        params: &[expr_or("n", &["a"])],
        summary: "n is prime by Wilson's theorem",
    },
    CatalogEntry {
        kind: OpKind::IsPrimeDivisors,
        name: "is_prime_divisors",
        aliases: &[],
        params: &[expr("a"), INDEX_LETTER],
        summary: "a is prime when no i in [2, a-1] divides it",
    },
    CatalogEntry {
        kind: OpKind::Digit,
        name: "digit",
        aliases: &["get_post_decimal_point_digit"],
        params: &[expr_or("x", &["a"]), expr_or("n", &["b"])],
        summary: "n-th digit of x after the decimal point",
    },
    CatalogEntry {
        kind: OpKind::SumRange,
        name: "sum_range",
        aliases: &[],
        params: RANGE_TERM,
        summary: "sum of term for index_letter from lo to hi",
    },
    CatalogEntry {
        kind: OpKind::ProductRange,
        name: "product_range",
        aliases: &[],
        params: RANGE_TERM,
        summary: "product of term for index_letter from lo to hi",
    },
    CatalogEntry {
        kind: OpKind::CountInRange,
        name: "count_in_range",
        aliases: &[],
        params: RANGE_INDICATOR,
        summary: "number of integers in [lo, hi] satisfying indicator",
    },
    CatalogEntry {
        kind: OpKind::AllInRange,
        name: "all_in_range",
        aliases: &[],
        params: RANGE_INDICATOR,
        summary: "every integer in [lo, hi] satisfies indicator",
    },
    CatalogEntry {
        kind: OpKind::CountAtLeast,
        name: "count_at_least",
        aliases: &["is_range_at_least_exp"],
        params: &[
            expr("lo"),
            expr("hi"),
            expr("n"),
            INDEX_LETTER,
            bound("indicator"),
        ],
        summary: "at least n integers in [lo, hi] satisfy indicator (n-th root form)",
    },
    CatalogEntry {
        kind: OpKind::Compose,
        name: "compose",
        aliases: &[],
        params: &[
            ParamSpec {
                name: "a",
                aliases: &[],
                kind: ParamKind::Prefix,
                required: true,
            },
            expr("b"),
        ],
        summary: "labels the whole formula: a(b); only valid at the root",
    },
];

impl OpKind {
    /// Find the operation named by `name` or one of its aliases.
    pub fn lookup(name: &str) -> Option<&'static CatalogEntry> {
        CATALOG
            .iter()
            .find(|e| e.name == name || e.aliases.contains(&name))
    }

    /// Catalog entries are laid out in declaration order of `OpKind`.
    pub fn entry(self) -> &'static CatalogEntry {
        &CATALOG[self as usize]
    }

    pub fn name(self) -> &'static str {
        self.entry().name
    }
}
