//! Source-like rendering of values for diagnostics.

use std::fmt;

use super::{Struct, Value};

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Top => f.write_str("_"),
            Self::Bottom(bottom) => write!(f, "_|_ // {}", bottom.message()),
            Self::Scalar(scalar) => write!(f, "{scalar}"),
            Self::Constraint(constraint) => write!(f, "{constraint}"),
            Self::Disjunction(disjunction) => {
                for (position, arm) in disjunction.arms().iter().enumerate() {
                    if position > 0 {
                        f.write_str(" | ")?;
                    }
                    if arm.is_default() {
                        f.write_str("*")?;
                    }
                    write!(f, "{}", arm.value())?;
                }
                Ok(())
            }
            Self::Struct(st) => write_struct(f, st),
            Self::List(list) => {
                f.write_str("[")?;
                for (position, item) in list.items().iter().enumerate() {
                    if position > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                if let Some(tail) = list.tail() {
                    if !list.items().is_empty() {
                        f.write_str(", ")?;
                    }
                    match tail {
                        Self::Top => f.write_str("...")?,
                        other => write!(f, "...{other}")?,
                    }
                }
                f.write_str("]")
            }
        }
    }
}

fn write_struct(f: &mut fmt::Formatter<'_>, st: &Struct) -> fmt::Result {
    f.write_str("{")?;
    let mut first = true;
    let mut separator = |f: &mut fmt::Formatter<'_>| -> fmt::Result {
        if !first {
            f.write_str(", ")?;
        }
        first = false;
        Ok(())
    };
    for (label, value) in st.definitions() {
        separator(f)?;
        write!(f, "{label}: {value}")?;
    }
    for (label, field) in st.fields() {
        separator(f)?;
        let marker = if field.is_optional() { "?" } else { "" };
        write!(f, "{label:?}{marker}: {}", field.value())?;
    }
    for pattern in st.patterns() {
        separator(f)?;
        write!(f, "[{}]: {}", pattern.key, pattern.value())?;
    }
    if st.has_ellipsis() {
        separator(f)?;
        f.write_str("...")?;
    }
    f.write_str("}")
}
