//! LaTeX templates for every catalog operation.
//!
//! Each function receives already-rendered operands and returns the rendered
//! notation. Composite templates are built from the primitive ones, never
//! simplified, so the output is byte-compatible with existing formulas.

// Logic

pub fn not(a: &str) -> String {
    [r"1-\left(", a, r"\right)"].concat()
}

pub fn and(a: &str, b: &str) -> String {
    [r"\left(", a, r"\right)\left(", b, r"\right)"].concat()
}

/// De Morgan: `not(and(not a, not b))`.
pub fn or(a: &str, b: &str) -> String {
    not(&and(&not(a), &not(b)))
}

// Comparisons

/// `ceil(4 arctan^2(a-b) / pi^2)`: 0 only when `a = b`.
pub fn neq(a: &str, b: &str) -> String {
    [
        r"\left\lceil\frac{4\arctan^2{\left(",
        a,
        "-",
        b,
        r"\right)}}{\pi^2}\right\rceil",
    ]
    .concat()
}

pub fn eq(a: &str, b: &str) -> String {
    not(&neq(a, b))
}

/// `x` equals its absolute value `sqrt(x^2)`.
pub fn nonneg(x: &str) -> String {
    let abs = [r"\sqrt{\left(", x, r"\right)^2}"].concat();
    eq(&abs, x)
}

pub fn lte(a: &str, b: &str) -> String {
    nonneg(&[b, "-", a].concat())
}

pub fn lt(a: &str, b: &str) -> String {
    not(&lte(b, a))
}

pub fn gt(a: &str, b: &str) -> String {
    lt(b, a)
}

pub fn gte(a: &str, b: &str) -> String {
    lte(b, a)
}

// Number theory

/// `floor(cos^2(pi x))`: 1 only for integers.
pub fn is_integer(x: &str) -> String {
    [
        r"\left\lfloor\left(\cos\left(\pi ",
        x,
        r"\right)\right)^2\right\rfloor",
    ]
    .concat()
}

pub fn is_natural(x: &str, allow_zero: bool) -> String {
    let sign = if allow_zero { nonneg(x) } else { gt(x, "0") };
    and(&is_integer(x), &sign)
}

pub fn frac(numerator: &str, denominator: &str) -> String {
    [r"\frac{", numerator, "}{", denominator, "}"].concat()
}

pub fn divides(a: &str, b: &str) -> String {
    and(&neq(a, "0"), &is_integer(&frac(b, a)))
}

pub fn does_not_divide(a: &str, b: &str) -> String {
    not(&divides(a, b))
}

pub fn modulo(a: &str, b: &str) -> String {
    [a, " - ", b, r"\left\lfloor", frac(a, b).as_str(), r"\right\rfloor"].concat()
}

/// Wilson's theorem: `n > 1` and `n | (n-1)! + 1`.
pub fn is_prime_wilson(n: &str) -> String {
    let quotient = frac(&[r"\left(", n, r"-1\right)!+1"].concat(), n);
    and(&gt(n, "1"), &is_integer(&quotient))
}

/// `a` is natural and no `index` in `[2, a-1]` divides it.
///
/// The product term tests integrality of `a / index` directly since the
/// index never reaches zero.
pub fn is_prime_divisors(a: &str, index: &str) -> String {
    let term = not(&is_integer(&frac(a, index)));
    let product = product_range(index, "2", &[a, "-1"].concat(), &term);
    and(&is_natural(a, false), &is_natural(&product, false))
}

/// The `n`-th digit of `x` after the decimal point.
///
/// A single-character `n` is written as a bare exponent (`10^3`), longer ones
/// are braced.
pub fn digit(x: &str, n: &str) -> String {
    let exponent = if n.chars().count() == 1 {
        n.to_string()
    } else {
        ["{", n, "}"].concat()
    };
    [
        r"\left\lfloor10^",
        exponent.as_str(),
        " ",
        x,
        r"\right\rfloor - 10\left\lfloor10^{",
        n,
        "-1} ",
        x,
        r"\right\rfloor",
    ]
    .concat()
}

// Bounded ranges

fn big_operator(symbol: &str, index: &str, lo: &str, hi: &str, term: &str) -> String {
    [symbol, "_{", index, "=", lo, "}^{", hi, r"}\left(", term, r"\right)"].concat()
}

pub fn sum_range(index: &str, lo: &str, hi: &str, term: &str) -> String {
    big_operator(r"\sum", index, lo, hi, term)
}

pub fn product_range(index: &str, lo: &str, hi: &str, term: &str) -> String {
    big_operator(r"\prod", index, lo, hi, term)
}

/// `floor(nth-root(n / count))` over the indicator count.
pub fn count_at_least(index: &str, lo: &str, hi: &str, n: &str, indicator: &str) -> String {
    let count = sum_range(index, lo, hi, indicator);
    [
        r"\left\lfloor\sqrt[{",
        n,
        "}]{",
        frac(n, &count).as_str(),
        r"}\right\rfloor",
    ]
    .concat()
}

pub fn compose(prefix: &str, body: &str) -> String {
    [prefix, r"\left(", body, r"\right)"].concat()
}
