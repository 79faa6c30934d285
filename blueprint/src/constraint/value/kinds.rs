//! Scalar kind sets and bound constraints.

use std::cmp::Ordering;
use std::fmt;

use regex::Regex;

/// Set of scalar kinds admitted by a constraint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Kinds(u8);

impl Kinds {
    /// No kind at all.
    pub const NONE: Self = Self(0);
    /// The `null` kind.
    pub const NULL: Self = Self(1);
    /// The `bool` kind.
    pub const BOOL: Self = Self(1 << 1);
    /// The `int` kind.
    pub const INT: Self = Self(1 << 2);
    /// The `float` kind.
    pub const FLOAT: Self = Self(1 << 3);
    /// The `string` kind.
    pub const STRING: Self = Self(1 << 4);
    /// `int` or `float`.
    pub const NUMBER: Self = Self(Self::INT.0 | Self::FLOAT.0);
    /// Every scalar kind.
    pub const SCALAR: Self =
        Self(Self::NULL.0 | Self::BOOL.0 | Self::NUMBER.0 | Self::STRING.0);

    /// Kinds present in either set.
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Kinds present in both sets.
    #[must_use]
    pub const fn intersect(self, other: Self) -> Self {
        Self(self.0 & other.0)
    }

    /// Whether every kind in `other` is also in `self`.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Whether the set is empty.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Kinds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("_|_");
        }
        if *self == Self::SCALAR {
            return f.write_str("scalar");
        }
        let names = [
            (Self::NULL, "null"),
            (Self::BOOL, "bool"),
            (Self::NUMBER, "number"),
            (Self::INT, "int"),
            (Self::FLOAT, "float"),
            (Self::STRING, "string"),
        ];
        let mut remaining = *self;
        let mut first = true;
        for (kind, name) in names {
            if remaining.contains(kind) {
                if !first {
                    f.write_str(" | ")?;
                }
                f.write_str(name)?;
                first = false;
                remaining = Self(remaining.0 & !kind.0);
            }
        }
        Ok(())
    }
}

/// A concrete atom.
#[derive(Clone, Debug, PartialEq)]
pub enum Scalar {
    /// `null`.
    Null,
    /// `true` or `false`.
    Bool(bool),
    /// A 64-bit signed integer.
    Int(i64),
    /// A finite floating point number.
    Float(f64),
    /// A UTF-8 string.
    String(String),
}

impl Scalar {
    /// The kind of this atom.
    #[must_use]
    pub const fn kind(&self) -> Kinds {
        match self {
            Self::Null => Kinds::NULL,
            Self::Bool(_) => Kinds::BOOL,
            Self::Int(_) => Kinds::INT,
            Self::Float(_) => Kinds::FLOAT,
            Self::String(_) => Kinds::STRING,
        }
    }

    fn compare(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => Some(a.cmp(b)),
            (Self::Float(a), Self::Float(b)) => a.partial_cmp(b),
            (Self::Int(a), Self::Float(b)) => int_to_float(*a).partial_cmp(b),
            (Self::Float(a), Self::Int(b)) => a.partial_cmp(&int_to_float(*b)),
            (Self::String(a), Self::String(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

#[expect(
    clippy::cast_precision_loss,
    reason = "mixed int/float comparisons follow float semantics"
)]
const fn int_to_float(value: i64) -> f64 {
    value as f64
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(value) => write!(f, "{value}"),
            Self::Int(value) => write!(f, "{value}"),
            Self::Float(value) => write!(f, "{value:?}"),
            Self::String(value) => write!(f, "{value:?}"),
        }
    }
}

/// Comparison operator of a [`Bound`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BoundOp {
    /// `>`
    Greater,
    /// `>=`
    GreaterEqual,
    /// `<`
    Less,
    /// `<=`
    LessEqual,
    /// `!=`
    NotEqual,
    /// `=~`
    Matches,
    /// `!~`
    NotMatches,
}

impl BoundOp {
    /// Source spelling of the operator.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Greater => ">",
            Self::GreaterEqual => ">=",
            Self::Less => "<",
            Self::LessEqual => "<=",
            Self::NotEqual => "!=",
            Self::Matches => "=~",
            Self::NotMatches => "!~",
        }
    }
}

/// A unary bound such as `>=0` or `=~"^v"`.
#[derive(Clone, Debug)]
pub struct Bound {
    op: BoundOp,
    operand: Scalar,
    pattern: Option<Regex>,
}

impl Bound {
    /// Builds a comparison or inequality bound.
    ///
    /// Returns `None` for the regular expression operators; use
    /// [`Bound::regex`] for those.
    #[must_use]
    pub fn compare(op: BoundOp, operand: Scalar) -> Option<Self> {
        (!matches!(op, BoundOp::Matches | BoundOp::NotMatches)).then_some(Self {
            op,
            operand,
            pattern: None,
        })
    }

    /// Builds a `=~` or `!~` bound.
    ///
    /// # Errors
    ///
    /// Returns the regex compilation error when `pattern` is not a valid
    /// regular expression.
    pub fn regex(negated: bool, pattern: &str) -> Result<Self, regex::Error> {
        let compiled = Regex::new(pattern)?;
        Ok(Self {
            op: if negated {
                BoundOp::NotMatches
            } else {
                BoundOp::Matches
            },
            operand: Scalar::String(pattern.to_owned()),
            pattern: Some(compiled),
        })
    }

    /// Operator of this bound.
    #[must_use]
    pub const fn op(&self) -> BoundOp {
        self.op
    }

    /// Operand of this bound.
    #[must_use]
    pub const fn operand(&self) -> &Scalar {
        &self.operand
    }

    /// Kinds of atom this bound can ever admit.
    #[must_use]
    pub const fn kinds(&self) -> Kinds {
        match (self.op, &self.operand) {
            (BoundOp::NotEqual, _) => Kinds::SCALAR,
            (BoundOp::Matches | BoundOp::NotMatches, _) | (_, Scalar::String(_)) => {
                Kinds::STRING
            }
            (_, Scalar::Int(_) | Scalar::Float(_)) => Kinds::NUMBER,
            _ => Kinds::NONE,
        }
    }

    /// Whether the atom satisfies this bound.
    #[must_use]
    pub fn admits(&self, value: &Scalar) -> bool {
        match self.op {
            BoundOp::NotEqual => value.compare(&self.operand).map_or_else(
                || value != &self.operand,
                |ordering| ordering != Ordering::Equal,
            ),
            BoundOp::Matches | BoundOp::NotMatches => {
                let matched = match (value, &self.pattern) {
                    (Scalar::String(text), Some(pattern)) => pattern.is_match(text),
                    _ => return false,
                };
                matched == (self.op == BoundOp::Matches)
            }
            BoundOp::Greater => value.compare(&self.operand) == Some(Ordering::Greater),
            BoundOp::GreaterEqual => matches!(
                value.compare(&self.operand),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            BoundOp::Less => value.compare(&self.operand) == Some(Ordering::Less),
            BoundOp::LessEqual => matches!(
                value.compare(&self.operand),
                Some(Ordering::Less | Ordering::Equal)
            ),
        }
    }
}

impl PartialEq for Bound {
    fn eq(&self, other: &Self) -> bool {
        self.op == other.op && self.operand == other.operand
    }
}

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.op.symbol(), self.operand)
    }
}

/// A non-concrete scalar constraint: a kind set narrowed by bounds.
#[derive(Clone, Debug, PartialEq)]
pub struct Constraint {
    kinds: Kinds,
    bounds: Vec<Bound>,
}

impl Constraint {
    /// Constraint admitting every atom of the given kinds.
    #[must_use]
    pub const fn of_kinds(kinds: Kinds) -> Self {
        Self {
            kinds,
            bounds: Vec::new(),
        }
    }

    /// Constraint admitting atoms that satisfy a single bound.
    #[must_use]
    pub fn from_bound(bound: Bound) -> Self {
        Self {
            kinds: bound.kinds(),
            bounds: vec![bound],
        }
    }

    /// Admitted kinds.
    #[must_use]
    pub const fn kinds(&self) -> Kinds {
        self.kinds
    }

    /// Attached bounds.
    #[must_use]
    pub fn bounds(&self) -> &[Bound] {
        &self.bounds
    }

    /// Whether the atom satisfies the kind set and every bound.
    #[must_use]
    pub fn admits(&self, value: &Scalar) -> bool {
        self.kinds.contains(value.kind()) && self.bounds.iter().all(|bound| bound.admits(value))
    }

    /// Conjunction of two constraints, or `None` when no kind survives.
    #[must_use]
    pub fn meet(&self, other: &Self) -> Option<Self> {
        let kinds = self.kinds.intersect(other.kinds);
        if kinds.is_empty() {
            return None;
        }
        let mut bounds = self.bounds.clone();
        for bound in &other.bounds {
            if !bounds.contains(bound) {
                bounds.push(bound.clone());
            }
        }
        Some(Self { kinds, bounds })
    }

    pub(crate) fn same_as(&self, other: &Self) -> bool {
        self.kinds == other.kinds
            && self.bounds.len() == other.bounds.len()
            && self.bounds.iter().all(|bound| other.bounds.contains(bound))
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let implied = self
            .bounds
            .iter()
            .fold(Kinds::SCALAR, |acc, bound| acc.intersect(bound.kinds()));
        let mut first = true;
        if self.bounds.is_empty() || implied != self.kinds {
            write!(f, "{}", self.kinds)?;
            first = false;
        }
        for bound in &self.bounds {
            if !first {
                f.write_str(" & ")?;
            }
            write!(f, "{bound}")?;
            first = false;
        }
        Ok(())
    }
}
