//! Path-based navigation and functional updates.

use super::{BottomKind, Field, Struct, Value};
use crate::constraint::{Path, PathError, Selector};

impl Value {
    /// Looks up the value at `path`.
    ///
    /// Disjunctions with a single default are traversed through that
    /// default. Optional fields are treated as absent.
    #[must_use]
    pub fn lookup(&self, path: &Path) -> Option<&Self> {
        path.selectors()
            .iter()
            .try_fold(self, |current, selector| match (current.resolved(), selector) {
                (Self::Struct(st), Selector::Field(label)) => st
                    .field(label)
                    .filter(|field| !field.optional)
                    .map(|field| &field.value),
                (Self::List(list), Selector::Index(index)) => list.items.get(*index),
                _ => None,
            })
    }

    /// Returns a new tree in which the value at `path` is unified with `value`.
    ///
    /// Missing intermediate fields are created. Filling an optional field
    /// makes it regular. Conflicts surface as bottom at the filled location.
    ///
    /// # Examples
    ///
    /// ```
    /// use forge_blueprint::constraint::{Path, Value};
    ///
    /// let path = Path::parse("project.name")?;
    /// let filled = Value::empty_struct().fill(&path, &Value::string("forge"));
    /// assert_eq!(filled.lookup(&path).and_then(Value::as_str), Some("forge"));
    /// # Ok::<(), forge_blueprint::constraint::PathError>(())
    /// ```
    #[must_use]
    pub fn fill(&self, path: &Path, value: &Self) -> Self {
        self.fill_at(path.selectors(), value)
    }

    fn fill_at(&self, selectors: &[Selector], value: &Self) -> Self {
        let Some((first, rest)) = selectors.split_first() else {
            return self.unify(value);
        };
        match (self, first) {
            (Self::Bottom(_), _) => self.clone(),
            (Self::Top, Selector::Field(_)) => Self::empty_struct().fill_at(selectors, value),
            (Self::Struct(st), Selector::Field(label)) => {
                let mut filled = st.clone();
                fill_field(&mut filled, label, rest, value);
                Self::Struct(filled)
            }
            (Self::List(list), Selector::Index(index)) => {
                let mut filled = list.clone();
                match filled.items.get_mut(*index) {
                    Some(slot) => {
                        *slot = slot.fill_at(rest, value);
                        Self::List(filled)
                    }
                    None => Self::bottom(
                        BottomKind::Conflict,
                        format!(
                            "index {index} out of range for list of length {}",
                            list.items.len()
                        ),
                    ),
                }
            }
            (Self::Disjunction(disjunction), _) => Self::disjoin(
                disjunction
                    .arms
                    .iter()
                    .map(|arm| (arm.value.fill_at(selectors, value), arm.default))
                    .collect(),
            ),
            _ => Self::bottom(
                BottomKind::Conflict,
                format!("cannot select {first} from {}", self.kind_name()),
            ),
        }
    }

    /// Returns a new tree without the field or list element at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`PathError::NotFound`] when nothing exists at `path`.
    pub fn delete(&self, path: &Path) -> Result<Self, PathError> {
        self.delete_at(path.selectors())
            .ok_or_else(|| PathError::NotFound {
                path: path.to_string(),
            })
    }

    fn delete_at(&self, selectors: &[Selector]) -> Option<Self> {
        let (first, rest) = selectors.split_first()?;
        match (self, first) {
            (Self::Struct(st), Selector::Field(label)) => {
                let mut pruned = st.clone();
                if rest.is_empty() {
                    pruned.remove(label)?;
                } else {
                    let field = pruned.field_mut(label)?;
                    field.value = field.value.delete_at(rest)?;
                }
                Some(Self::Struct(pruned))
            }
            (Self::List(list), Selector::Index(index)) => {
                let mut pruned = list.clone();
                if rest.is_empty() {
                    if *index >= pruned.items.len() {
                        return None;
                    }
                    pruned.items.remove(*index);
                } else {
                    let item = pruned.items.get_mut(*index)?;
                    *item = item.delete_at(rest)?;
                }
                Some(Self::List(pruned))
            }
            _ => None,
        }
    }

    /// Visits every field of the tree in pre-order, yielding its path.
    ///
    /// Both regular and optional fields are visited; definitions are not.
    /// Disjunctions are only entered through a single default.
    #[must_use]
    pub fn walk_fields(&self) -> FieldWalk<'_> {
        let mut walk = FieldWalk { stack: Vec::new() };
        walk.expand(&Path::root(), self);
        walk
    }
}

fn fill_field(st: &mut Struct, label: &str, rest: &[Selector], value: &Value) {
    if let Some(field) = st.field_mut(label) {
        field.value = field.value.fill_at(rest, value);
        field.optional = false;
        return;
    }
    if !st.allows(label) {
        st.fields.push((
            label.to_owned(),
            Field::regular(Value::bottom(
                BottomKind::NotAllowed,
                format!("field not allowed: {label}"),
            )),
        ));
        return;
    }
    let mut filled = Value::Top.fill_at(rest, value);
    for pattern in &st.patterns {
        if pattern.matches(label) {
            filled = filled.unify(&pattern.value);
        }
    }
    st.fields.push((label.to_owned(), Field::regular(filled)));
}

enum WalkNode<'a> {
    Field(Path, &'a Field),
    Value(Path, &'a Value),
}

/// Pre-order iterator over `(path, field)` pairs; see [`Value::walk_fields`].
pub struct FieldWalk<'a> {
    stack: Vec<WalkNode<'a>>,
}

impl<'a> FieldWalk<'a> {
    fn expand(&mut self, path: &Path, value: &'a Value) {
        match value.resolved() {
            Value::Struct(st) => {
                for (label, field) in st.fields.iter().rev() {
                    self.stack.push(WalkNode::Field(path.child(label), field));
                }
            }
            Value::List(list) => {
                for (index, item) in list.items.iter().enumerate().rev() {
                    self.stack.push(WalkNode::Value(path.index(index), item));
                }
            }
            _ => {}
        }
    }
}

impl<'a> Iterator for FieldWalk<'a> {
    type Item = (Path, &'a Field);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(node) = self.stack.pop() {
            match node {
                WalkNode::Field(path, field) => {
                    self.stack.push(WalkNode::Value(path.clone(), &field.value));
                    return Some((path, field));
                }
                WalkNode::Value(path, value) => self.expand(&path, value),
            }
        }
        None
    }
}
