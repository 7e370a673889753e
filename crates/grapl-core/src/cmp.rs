//! The comparator algebra: the closed set of per-predicate tests, the
//! argument shapes accepted by the `str_cmps`/`int_cmps` helpers, and the
//! rendering of each comparator into the backing store's filter dialect.
//!
//! A comparator holds its predicate name, its operand, and its polarity.
//! Helpers produce filters in disjunctive normal form (see
//! [`crate::filter::PropertyFilter`]): a list argument means OR, a list of
//! negations means AND-of-negations, and an absent argument set collapses
//! to a bare existence test.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::filter::{and_combine, PropertyFilter};
use crate::{TYPE_TAG, UID};

/// An equality operand: strings and ints compare with `eq`, everything
/// else has a dedicated comparator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CmpValue {
    Str(String),
    Int(i64),
}

/// A single per-predicate test.
///
/// Negation is carried inline (`negated`) rather than as a wrapper so the
/// renderer stays total: every variant renders to exactly one well-formed
/// filter expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cmp {
    /// The predicate exists on the node.
    Has { pred: String },
    /// Exact equality.
    Eq {
        pred: String,
        value: CmpValue,
        negated: bool,
    },
    Gt { pred: String, value: i64, negated: bool },
    Ge { pred: String, value: i64, negated: bool },
    Lt { pred: String, value: i64, negated: bool },
    Le { pred: String, value: i64, negated: bool },
    /// Substring match.
    Contains {
        pred: String,
        value: String,
        negated: bool,
    },
    /// Suffix match.
    EndsWith { pred: String, value: String },
    /// Raw regular expression, store syntax.
    Regexp { pred: String, pattern: String },
    /// Levenshtein-style fuzzy match within `threshold` edits.
    Distance {
        pred: String,
        value: String,
        threshold: u32,
    },
}

impl Cmp {
    pub fn has(pred: &str) -> Self {
        Cmp::Has {
            pred: pred.to_string(),
        }
    }

    pub fn eq_str(pred: &str, value: &str) -> Self {
        Cmp::Eq {
            pred: pred.to_string(),
            value: CmpValue::Str(value.to_string()),
            negated: false,
        }
    }

    pub fn eq_int(pred: &str, value: i64) -> Self {
        Cmp::Eq {
            pred: pred.to_string(),
            value: CmpValue::Int(value),
            negated: false,
        }
    }

    /// The predicate this comparator tests.
    pub fn pred(&self) -> &str {
        match self {
            Cmp::Has { pred }
            | Cmp::Eq { pred, .. }
            | Cmp::Gt { pred, .. }
            | Cmp::Ge { pred, .. }
            | Cmp::Lt { pred, .. }
            | Cmp::Le { pred, .. }
            | Cmp::Contains { pred, .. }
            | Cmp::EndsWith { pred, .. }
            | Cmp::Regexp { pred, .. }
            | Cmp::Distance { pred, .. } => pred,
        }
    }

    pub fn is_has(&self) -> bool {
        matches!(self, Cmp::Has { .. })
    }

    /// Renders this comparator to one filter expression in the store's
    /// query dialect. Rendering is total.
    pub fn render(&self) -> String {
        match self {
            Cmp::Has { pred } => format!("has({pred})"),
            Cmp::Eq {
                pred,
                value,
                negated,
            } => {
                // The type tag and uid filter through their dedicated functions.
                let expr = match value {
                    CmpValue::Str(s) if pred == TYPE_TAG => format!("type({s})"),
                    CmpValue::Str(s) if pred == UID => format!("uid({s})"),
                    CmpValue::Str(s) => format!("eq({pred}, \"{}\")", escape_string(s)),
                    CmpValue::Int(i) => format!("eq({pred}, {i})"),
                };
                negate(expr, *negated)
            }
            Cmp::Gt {
                pred,
                value,
                negated,
            } => negate(format!("gt({pred}, {value})"), *negated),
            Cmp::Ge {
                pred,
                value,
                negated,
            } => negate(format!("ge({pred}, {value})"), *negated),
            Cmp::Lt {
                pred,
                value,
                negated,
            } => negate(format!("lt({pred}, {value})"), *negated),
            Cmp::Le {
                pred,
                value,
                negated,
            } => negate(format!("le({pred}, {value})"), *negated),
            Cmp::Contains {
                pred,
                value,
                negated,
            } => negate(
                format!("regexp({pred}, /.*{}.*/)", escape_regex(value)),
                *negated,
            ),
            Cmp::EndsWith { pred, value } => {
                format!("regexp({pred}, /.*{}$/)", escape_regex(value))
            }
            Cmp::Regexp { pred, pattern } => {
                format!("regexp({pred}, /{}/)", pattern.replace('/', "\\/"))
            }
            Cmp::Distance {
                pred,
                value,
                threshold,
            } => format!("match({pred}, \"{}\", {threshold})", escape_string(value)),
        }
    }
}

fn negate(expr: String, negated: bool) -> String {
    if negated {
        format!("NOT {expr}")
    } else {
        expr
    }
}

/// Escapes a string operand for embedding in a double-quoted literal.
pub fn escape_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            other => out.push(other),
        }
    }
    out
}

/// Escapes a literal string for embedding inside a /regex/ literal.
pub fn escape_regex(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(
            c,
            '.' | '^' | '$' | '*' | '+' | '?' | '(' | ')' | '[' | ']' | '{' | '}' | '|' | '\\' | '/'
        ) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

// ---------------------------------------------------------------------------
// Helper argument shapes
// ---------------------------------------------------------------------------

/// A string comparator argument: a scalar, a negated scalar, an OR over a
/// list, or an AND over a list of negations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StrArg {
    One(String),
    Not(String),
    AnyOf(Vec<String>),
    NoneOf(Vec<String>),
}

impl StrArg {
    pub fn not(value: &str) -> Self {
        StrArg::Not(value.to_string())
    }

    pub fn any_of<I: IntoIterator<Item = S>, S: Into<String>>(values: I) -> Self {
        StrArg::AnyOf(values.into_iter().map(Into::into).collect())
    }

    pub fn none_of<I: IntoIterator<Item = S>, S: Into<String>>(values: I) -> Self {
        StrArg::NoneOf(values.into_iter().map(Into::into).collect())
    }
}

impl From<&str> for StrArg {
    fn from(value: &str) -> Self {
        StrArg::One(value.to_string())
    }
}

impl From<String> for StrArg {
    fn from(value: String) -> Self {
        StrArg::One(value)
    }
}

impl From<Vec<&str>> for StrArg {
    fn from(values: Vec<&str>) -> Self {
        StrArg::any_of(values)
    }
}

impl From<Vec<String>> for StrArg {
    fn from(values: Vec<String>) -> Self {
        StrArg::AnyOf(values)
    }
}

/// An integer comparator argument, mirroring [`StrArg`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntArg {
    One(i64),
    Not(i64),
    AnyOf(Vec<i64>),
    NoneOf(Vec<i64>),
}

impl IntArg {
    pub fn not(value: i64) -> Self {
        IntArg::Not(value)
    }
}

impl From<i64> for IntArg {
    fn from(value: i64) -> Self {
        IntArg::One(value)
    }
}

impl From<Vec<i64>> for IntArg {
    fn from(values: Vec<i64>) -> Self {
        IntArg::AnyOf(values)
    }
}

/// One keyword of the string helper: which test to apply, with its argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StrCmp {
    Eq(StrArg),
    Contains(StrArg),
    EndsWith(StrArg),
    StartsWith(StrArg),
    Regexp(StrArg),
    Distance(StrArg, u32),
}

impl StrCmp {
    pub fn eq(value: impl Into<StrArg>) -> Self {
        StrCmp::Eq(value.into())
    }

    pub fn contains(value: impl Into<StrArg>) -> Self {
        StrCmp::Contains(value.into())
    }

    pub fn ends_with(value: impl Into<StrArg>) -> Self {
        StrCmp::EndsWith(value.into())
    }

    pub fn starts_with(value: impl Into<StrArg>) -> Self {
        StrCmp::StartsWith(value.into())
    }

    pub fn regexp(value: impl Into<StrArg>) -> Self {
        StrCmp::Regexp(value.into())
    }

    pub fn distance(value: impl Into<StrArg>, threshold: u32) -> Self {
        StrCmp::Distance(value.into(), threshold)
    }
}

/// One keyword of the integer helper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntCmp {
    Eq(IntArg),
    Gt(IntArg),
    Ge(IntArg),
    Lt(IntArg),
    Le(IntArg),
}

impl IntCmp {
    pub fn eq(value: impl Into<IntArg>) -> Self {
        IntCmp::Eq(value.into())
    }

    pub fn gt(value: impl Into<IntArg>) -> Self {
        IntCmp::Gt(value.into())
    }

    pub fn ge(value: impl Into<IntArg>) -> Self {
        IntCmp::Ge(value.into())
    }

    pub fn lt(value: impl Into<IntArg>) -> Self {
        IntCmp::Lt(value.into())
    }

    pub fn le(value: impl Into<IntArg>) -> Self {
        IntCmp::Le(value.into())
    }
}

// ---------------------------------------------------------------------------
// DNF helpers
// ---------------------------------------------------------------------------

/// Builds a DNF filter for a string predicate from the given keywords.
///
/// Each keyword contributes one disjunction; keywords are ANDed together.
/// No keywords at all collapse to `[[Has(pred)]]` so the root-scan always
/// has at least an existence predicate.
///
/// Negated arguments (`Not`/`NoneOf`) are refused for suffix, prefix,
/// regex, and distance tests: the store dialect has no negated form for
/// them.
pub fn str_cmps(pred: &str, cmps: &[StrCmp]) -> Result<PropertyFilter, CoreError> {
    if cmps.is_empty() {
        return Ok(vec![vec![Cmp::has(pred)]]);
    }
    let mut filter: PropertyFilter = Vec::new();
    for cmp in cmps {
        let dnf = match cmp {
            StrCmp::Eq(arg) => str_arg_dnf(arg, |v, negated| Cmp::Eq {
                pred: pred.to_string(),
                value: CmpValue::Str(v),
                negated,
            }),
            StrCmp::Contains(arg) => str_arg_dnf(arg, |v, negated| Cmp::Contains {
                pred: pred.to_string(),
                value: v,
                negated,
            }),
            StrCmp::EndsWith(arg) => positive_str_arg_dnf(pred, "ends_with", arg, |v| {
                Cmp::EndsWith {
                    pred: pred.to_string(),
                    value: v,
                }
            })?,
            StrCmp::StartsWith(arg) => positive_str_arg_dnf(pred, "starts_with", arg, |v| {
                // Prefix match is an anchored regex over the escaped literal.
                Cmp::Regexp {
                    pred: pred.to_string(),
                    pattern: format!("^{}.*", escape_regex(&v)),
                }
            })?,
            StrCmp::Regexp(arg) => positive_str_arg_dnf(pred, "regexp", arg, |v| Cmp::Regexp {
                pred: pred.to_string(),
                pattern: v,
            })?,
            StrCmp::Distance(arg, threshold) => {
                let k = *threshold;
                positive_str_arg_dnf(pred, "distance", arg, |v| Cmp::Distance {
                    pred: pred.to_string(),
                    value: v,
                    threshold: k,
                })?
            }
        };
        filter = and_combine(filter, dnf);
    }
    Ok(filter)
}

/// Builds a DNF filter for an integer predicate from the given keywords.
///
/// Same combination rules as [`str_cmps`]; every integer test has a negated
/// form, so construction cannot fail.
pub fn int_cmps(pred: &str, cmps: &[IntCmp]) -> PropertyFilter {
    if cmps.is_empty() {
        return vec![vec![Cmp::has(pred)]];
    }
    let mut filter: PropertyFilter = Vec::new();
    for cmp in cmps {
        let dnf = match cmp {
            IntCmp::Eq(arg) => int_arg_dnf(arg, |v, negated| Cmp::Eq {
                pred: pred.to_string(),
                value: CmpValue::Int(v),
                negated,
            }),
            IntCmp::Gt(arg) => int_arg_dnf(arg, |v, negated| Cmp::Gt {
                pred: pred.to_string(),
                value: v,
                negated,
            }),
            IntCmp::Ge(arg) => int_arg_dnf(arg, |v, negated| Cmp::Ge {
                pred: pred.to_string(),
                value: v,
                negated,
            }),
            IntCmp::Lt(arg) => int_arg_dnf(arg, |v, negated| Cmp::Lt {
                pred: pred.to_string(),
                value: v,
                negated,
            }),
            IntCmp::Le(arg) => int_arg_dnf(arg, |v, negated| Cmp::Le {
                pred: pred.to_string(),
                value: v,
                negated,
            }),
        };
        filter = and_combine(filter, dnf);
    }
    filter
}

fn str_arg_dnf(arg: &StrArg, make: impl Fn(String, bool) -> Cmp) -> PropertyFilter {
    match arg {
        StrArg::One(v) => vec![vec![make(v.clone(), false)]],
        StrArg::Not(v) => vec![vec![make(v.clone(), true)]],
        StrArg::AnyOf(vs) => vs.iter().map(|v| vec![make(v.clone(), false)]).collect(),
        StrArg::NoneOf(vs) => vec![vs.iter().map(|v| make(v.clone(), true)).collect()],
    }
}

fn positive_str_arg_dnf(
    pred: &str,
    comparator: &str,
    arg: &StrArg,
    make: impl Fn(String) -> Cmp,
) -> Result<PropertyFilter, CoreError> {
    match arg {
        StrArg::One(v) => Ok(vec![vec![make(v.clone())]]),
        StrArg::AnyOf(vs) => Ok(vs.iter().map(|v| vec![make(v.clone())]).collect()),
        StrArg::Not(_) | StrArg::NoneOf(_) => Err(CoreError::InvalidOperand {
            predicate: pred.to_string(),
            expected: format!("non-negated argument for {comparator}"),
            got: "Not".to_string(),
        }),
    }
}

fn int_arg_dnf(arg: &IntArg, make: impl Fn(i64, bool) -> Cmp) -> PropertyFilter {
    match arg {
        IntArg::One(v) => vec![vec![make(*v, false)]],
        IntArg::Not(v) => vec![vec![make(*v, true)]],
        IntArg::AnyOf(vs) => vs.iter().map(|v| vec![make(*v, false)]).collect(),
        IntArg::NoneOf(vs) => vec![vs.iter().map(|v| make(*v, true)).collect()],
    }
}
