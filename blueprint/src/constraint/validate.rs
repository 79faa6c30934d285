//! Concreteness checks over evaluated trees.

use std::fmt;

use super::{BottomKind, Path, Value};

/// Category of a [`Violation`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ViolationKind {
    /// Incompatible values were unified.
    Conflict,
    /// A closed struct received a field it does not declare.
    NotAllowed,
    /// A required field has no concrete value.
    Incomplete,
    /// An explicit `_|_`.
    Explicit,
    /// An environment value could not be parsed.
    EnvParse,
    /// An `@env` attribute names an unsupported type.
    EnvType,
    /// An `@env` attribute is missing arguments.
    EnvAttribute,
}

impl From<BottomKind> for ViolationKind {
    fn from(kind: BottomKind) -> Self {
        match kind {
            BottomKind::Conflict => Self::Conflict,
            BottomKind::NotAllowed => Self::NotAllowed,
            BottomKind::Explicit => Self::Explicit,
            BottomKind::EnvParse => Self::EnvParse,
            BottomKind::EnvType => Self::EnvType,
            BottomKind::EnvAttribute => Self::EnvAttribute,
        }
    }
}

/// A location in the tree that is not concrete.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Violation {
    path: Path,
    kind: ViolationKind,
    message: String,
}

impl Violation {
    /// Creates a violation.
    #[must_use]
    pub fn new(path: Path, kind: ViolationKind, message: impl Into<String>) -> Self {
        Self {
            path,
            kind,
            message: message.into(),
        }
    }

    /// Where the violation occurs.
    #[must_use]
    pub const fn path(&self) -> &Path {
        &self.path
    }

    /// Category.
    #[must_use]
    pub const fn kind(&self) -> ViolationKind {
        self.kind
    }

    /// Description.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_root() {
            f.write_str(&self.message)
        } else {
            write!(f, "{}: {}", self.path, self.message)
        }
    }
}

/// Every violation found in one validation pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Violations(Vec<Violation>);

impl Violations {
    /// Number of violations.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no violations.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over the violations in tree order.
    pub fn iter(&self) -> std::slice::Iter<'_, Violation> {
        self.0.iter()
    }

    /// Whether any violation has the given kind.
    #[must_use]
    pub fn contains_kind(&self, kind: ViolationKind) -> bool {
        self.0.iter().any(|violation| violation.kind == kind)
    }
}

impl fmt::Display for Violations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (position, violation) in self.0.iter().enumerate() {
            if position > 0 {
                writeln!(f)?;
            }
            write!(f, "{}: {violation}", position + 1)?;
        }
        Ok(())
    }
}

impl std::error::Error for Violations {}

impl<'a> IntoIterator for &'a Violations {
    type Item = &'a Violation;
    type IntoIter = std::slice::Iter<'a, Violation>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl FromIterator<Violation> for Violations {
    fn from_iter<I: IntoIterator<Item = Violation>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Value {
    /// Checks that every regular field and list element is concrete.
    ///
    /// Optional fields and definitions are skipped; disjunctions must
    /// resolve through a single default.
    ///
    /// # Errors
    ///
    /// Returns all [`Violations`] found, in tree order.
    pub fn validate_concrete(&self) -> Result<(), Violations> {
        let mut found = Vec::new();
        collect(self, &Path::root(), &mut found);
        if found.is_empty() {
            Ok(())
        } else {
            Err(Violations(found))
        }
    }
}

fn collect(value: &Value, path: &Path, found: &mut Vec<Violation>) {
    match value {
        Value::Scalar(_) => {}
        Value::Top => found.push(Violation::new(
            path.clone(),
            ViolationKind::Incomplete,
            "incomplete value _",
        )),
        Value::Bottom(bottom) => found.push(Violation::new(
            path.clone(),
            bottom.kind().into(),
            bottom.message(),
        )),
        Value::Constraint(constraint) => found.push(Violation::new(
            path.clone(),
            ViolationKind::Incomplete,
            format!("incomplete value {constraint}"),
        )),
        Value::Disjunction(disjunction) => match disjunction.default_value() {
            Some(default) => collect(default, path, found),
            None => found.push(Violation::new(
                path.clone(),
                ViolationKind::Incomplete,
                format!("incomplete value {value} (unresolved disjunction)"),
            )),
        },
        Value::Struct(st) => {
            for (label, field) in st.fields() {
                if !field.is_optional() {
                    collect(field.value(), &path.child(label), found);
                }
            }
        }
        Value::List(list) => {
            for (index, item) in list.items().iter().enumerate() {
                collect(item, &path.index(index), found);
            }
        }
    }
}
