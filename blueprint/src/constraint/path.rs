//! Addressing fields and list elements inside a value tree.
//!
//! Paths use dotted selectors with optional quoting and list indices, for
//! example `project.ci.targets."docker-build".retries` or `items[0].name`.
//! The empty string addresses the root.

use std::fmt;
use std::str::FromStr;

use super::PathError;

/// A single step within a [`Path`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Selector {
    /// Select a struct field by label.
    Field(String),
    /// Select a list element by position.
    Index(usize),
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field(label) if is_plain_label(label) => f.write_str(label),
            Self::Field(label) => write!(f, "{label:?}"),
            Self::Index(index) => write!(f, "[{index}]"),
        }
    }
}

/// Sequence of selectors from the root of a value.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Path(Vec<Selector>);

impl Path {
    /// The empty path, addressing the root value.
    #[must_use]
    pub const fn root() -> Self {
        Self(Vec::new())
    }

    /// Parses a textual path.
    ///
    /// # Errors
    ///
    /// Returns [`PathError::Invalid`] when the text is not a well-formed path.
    ///
    /// # Examples
    ///
    /// ```
    /// use forge_blueprint::constraint::{Path, Selector};
    ///
    /// let path = Path::parse("targets.\"docker-build\".args[1]")?;
    /// assert_eq!(path.selectors().len(), 4);
    /// assert_eq!(path.selectors().last(), Some(&Selector::Index(1)));
    /// # Ok::<(), forge_blueprint::constraint::PathError>(())
    /// ```
    pub fn parse(text: &str) -> Result<Self, PathError> {
        text.parse()
    }

    /// Selectors making up the path.
    #[must_use]
    pub fn selectors(&self) -> &[Selector] {
        &self.0
    }

    /// Whether this path addresses the root.
    #[must_use]
    pub const fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns a new path extended with a field selector.
    #[must_use]
    pub fn child(&self, label: &str) -> Self {
        let mut selectors = self.0.clone();
        selectors.push(Selector::Field(label.to_owned()));
        Self(selectors)
    }

    /// Returns a new path extended with an index selector.
    #[must_use]
    pub fn index(&self, index: usize) -> Self {
        let mut selectors = self.0.clone();
        selectors.push(Selector::Index(index));
        Self(selectors)
    }
}

impl From<Vec<Selector>> for Path {
    fn from(selectors: Vec<Selector>) -> Self {
        Self(selectors)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (position, selector) in self.0.iter().enumerate() {
            if position > 0 && matches!(selector, Selector::Field(_)) {
                f.write_str(".")?;
            }
            write!(f, "{selector}")?;
        }
        Ok(())
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum ParseState {
    Start,
    AfterDot,
    AfterSelector,
}

impl FromStr for Path {
    type Err = PathError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| PathError::Invalid {
            path: text.to_owned(),
            reason: reason.to_owned(),
        };
        let mut selectors = Vec::new();
        let mut chars = text.chars().peekable();
        let mut state = ParseState::Start;
        while let Some(&next) = chars.peek() {
            match (state, next) {
                (ParseState::Start | ParseState::AfterSelector, '[') => {
                    chars.next();
                    let mut digits = String::new();
                    while let Some(digit) = chars.next_if(char::is_ascii_digit) {
                        digits.push(digit);
                    }
                    if digits.is_empty() || chars.next() != Some(']') {
                        return Err(invalid("expected a list index such as [0]"));
                    }
                    let index = digits
                        .parse()
                        .map_err(|_| invalid("list index is out of range"))?;
                    selectors.push(Selector::Index(index));
                    state = ParseState::AfterSelector;
                }
                (ParseState::AfterSelector, '.') => {
                    chars.next();
                    state = ParseState::AfterDot;
                }
                (ParseState::Start | ParseState::AfterDot, '"') => {
                    chars.next();
                    let mut label = String::new();
                    loop {
                        match chars.next() {
                            Some('"') => break,
                            Some('\\') => match chars.next() {
                                Some(escaped) => label.push(escaped),
                                None => return Err(invalid("unterminated escape sequence")),
                            },
                            Some(other) => label.push(other),
                            None => return Err(invalid("unterminated quoted label")),
                        }
                    }
                    selectors.push(Selector::Field(label));
                    state = ParseState::AfterSelector;
                }
                (ParseState::Start | ParseState::AfterDot, first) if is_label_start(first) => {
                    let mut label = String::new();
                    while let Some(part) = chars.next_if(|c| is_label_part(*c)) {
                        label.push(part);
                    }
                    selectors.push(Selector::Field(label));
                    state = ParseState::AfterSelector;
                }
                _ => return Err(invalid(&format!("unexpected character '{next}'"))),
            }
        }
        if state == ParseState::AfterDot {
            return Err(invalid("path ends with a separator"));
        }
        Ok(Self(selectors))
    }
}

const fn is_label_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '$'
}

const fn is_label_part(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '$' | '-')
}

fn is_plain_label(label: &str) -> bool {
    let mut chars = label.chars();
    chars.next().is_some_and(is_label_start) && chars.all(is_label_part)
}
