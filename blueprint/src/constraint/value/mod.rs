//! The evaluated value lattice.
//!
//! A [`Value`] is either top (`_`), bottom (an error), a concrete scalar, a
//! scalar [`Constraint`], a [`Disjunction`], a [`Struct`] or a [`List`].
//! Values are immutable: every operation returns a new tree.

mod display;
mod kinds;
mod ops;
mod unify;

pub use kinds::{Bound, BoundOp, Constraint, Kinds, Scalar};
pub use ops::FieldWalk;

use super::Attribute;

/// Why a value became bottom.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum BottomKind {
    /// Two incompatible values met during unification.
    Conflict,
    /// A closed struct rejected a regular field.
    NotAllowed,
    /// The `_|_` literal.
    Explicit,
    /// An environment value could not be parsed as the declared type.
    EnvParse,
    /// An `@env` attribute declared an unknown type.
    EnvType,
    /// An `@env` attribute was missing its `name` or `type` argument.
    EnvAttribute,
}

/// An error embedded in a value tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Bottom {
    kind: BottomKind,
    message: String,
}

impl Bottom {
    /// Creates a bottom of the given kind.
    #[must_use]
    pub fn new(kind: BottomKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Reason category.
    #[must_use]
    pub const fn kind(&self) -> BottomKind {
        self.kind
    }

    /// Human-readable reason.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// One alternative of a [`Disjunction`].
#[derive(Clone, Debug, PartialEq)]
pub struct Arm {
    value: Value,
    default: bool,
}

impl Arm {
    /// The alternative value.
    #[must_use]
    pub const fn value(&self) -> &Value {
        &self.value
    }

    /// Whether the arm is marked as a default with `*`.
    #[must_use]
    pub const fn is_default(&self) -> bool {
        self.default
    }
}

/// Alternatives of which the final value must be exactly one.
///
/// A disjunction without marked arms treats every arm as a default.
#[derive(Clone, Debug, PartialEq)]
pub struct Disjunction {
    arms: Vec<Arm>,
}

impl Disjunction {
    /// Alternatives in declaration order.
    #[must_use]
    pub fn arms(&self) -> &[Arm] {
        &self.arms
    }

    /// Whether any arm carries a `*` marker.
    #[must_use]
    pub fn has_marked_default(&self) -> bool {
        self.arms.iter().any(Arm::is_default)
    }

    /// The single marked default, if exactly one exists.
    #[must_use]
    pub fn default_value(&self) -> Option<&Value> {
        let mut defaults = self.arms.iter().filter(|arm| arm.default);
        match (defaults.next(), defaults.next()) {
            (Some(arm), None) => Some(&arm.value),
            _ => None,
        }
    }
}

/// A labelled member of a [`Struct`].
#[derive(Clone, Debug, PartialEq)]
pub struct Field {
    value: Value,
    optional: bool,
    attributes: Vec<Attribute>,
}

impl Field {
    /// A regular field.
    #[must_use]
    pub const fn regular(value: Value) -> Self {
        Self {
            value,
            optional: false,
            attributes: Vec::new(),
        }
    }

    /// An optional (`label?:`) field.
    #[must_use]
    pub const fn optional(value: Value) -> Self {
        Self {
            value,
            optional: true,
            attributes: Vec::new(),
        }
    }

    /// Returns the field with the given attributes attached.
    #[must_use]
    pub fn with_attributes(mut self, attributes: Vec<Attribute>) -> Self {
        self.attributes = attributes;
        self
    }

    /// The field value.
    #[must_use]
    pub const fn value(&self) -> &Value {
        &self.value
    }

    /// Whether the field is optional.
    #[must_use]
    pub const fn is_optional(&self) -> bool {
        self.optional
    }

    /// Attributes attached to the field.
    #[must_use]
    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    /// First attribute with the given name.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|attr| attr.name() == name)
    }
}

/// A `[key]: value` constraint applied to every matching field label.
#[derive(Clone, Debug, PartialEq)]
pub struct Pattern {
    key: Value,
    value: Value,
}

impl Pattern {
    /// Creates a pattern constraint.
    #[must_use]
    pub const fn new(key: Value, value: Value) -> Self {
        Self { key, value }
    }

    /// Whether `label` is matched by the key constraint.
    #[must_use]
    pub fn matches(&self, label: &str) -> bool {
        !self
            .key
            .unify(&Value::string(label))
            .is_bottom()
    }

    /// Constraint applied to matching fields.
    #[must_use]
    pub const fn value(&self) -> &Value {
        &self.value
    }
}

/// An ordered set of labelled fields.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Struct {
    fields: Vec<(String, Field)>,
    definitions: Vec<(String, Value)>,
    patterns: Vec<Pattern>,
    closed: bool,
    ellipsis: bool,
}

impl Struct {
    /// An empty open struct.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            fields: Vec::new(),
            definitions: Vec::new(),
            patterns: Vec::new(),
            closed: false,
            ellipsis: false,
        }
    }

    /// Fields in declaration order.
    #[must_use]
    pub fn fields(&self) -> &[(String, Field)] {
        &self.fields
    }

    /// Field with the given label, regular or optional.
    #[must_use]
    pub fn field(&self, label: &str) -> Option<&Field> {
        self.fields
            .iter()
            .find(|(name, _)| name == label)
            .map(|(_, field)| field)
    }

    pub(crate) fn field_mut(&mut self, label: &str) -> Option<&mut Field> {
        self.fields
            .iter_mut()
            .find(|(name, _)| name == label)
            .map(|(_, field)| field)
    }

    /// Definition (`#Name`) with the given label.
    #[must_use]
    pub fn definition(&self, label: &str) -> Option<&Value> {
        self.definitions
            .iter()
            .find(|(name, _)| name == label)
            .map(|(_, value)| value)
    }

    /// Definitions in declaration order.
    #[must_use]
    pub fn definitions(&self) -> &[(String, Value)] {
        &self.definitions
    }

    /// Pattern constraints.
    #[must_use]
    pub fn patterns(&self) -> &[Pattern] {
        &self.patterns
    }

    /// Whether the struct rejects labels it does not declare.
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        self.closed
    }

    /// Whether the struct literal carried a `...` marker.
    #[must_use]
    pub const fn has_ellipsis(&self) -> bool {
        self.ellipsis
    }

    /// Whether a field with this label may be added.
    #[must_use]
    pub fn allows(&self, label: &str) -> bool {
        !self.closed
            || self.field(label).is_some()
            || self.patterns.iter().any(|pattern| pattern.matches(label))
    }

    /// Appends or merges a field, unifying with an existing one of the same label.
    pub fn insert(&mut self, label: impl Into<String>, field: Field) {
        let key: String = label.into();
        match self.field_mut(&key) {
            Some(existing) => *existing = existing.unify(&field),
            None => self.fields.push((key, field)),
        }
    }

    pub(crate) fn insert_definition(&mut self, label: impl Into<String>, value: Value) {
        let key: String = label.into();
        match self.definitions.iter_mut().find(|(name, _)| *name == key) {
            Some((_, existing)) => *existing = existing.unify(&value),
            None => self.definitions.push((key, value)),
        }
    }

    pub(crate) fn push_pattern(&mut self, pattern: Pattern) {
        if !self.patterns.contains(&pattern) {
            self.patterns.push(pattern);
        }
    }

    pub(crate) const fn set_ellipsis(&mut self, ellipsis: bool) {
        self.ellipsis = ellipsis;
    }

    pub(crate) fn remove(&mut self, label: &str) -> Option<Field> {
        let position = self.fields.iter().position(|(name, _)| name == label)?;
        Some(self.fields.remove(position).1)
    }

    /// Applies every pattern to each field whose label it matches.
    pub(crate) fn apply_patterns(&mut self) {
        if self.patterns.is_empty() {
            return;
        }
        for (label, field) in &mut self.fields {
            for pattern in &self.patterns {
                if pattern.matches(label) {
                    field.value = field.value.unify(&pattern.value);
                }
            }
        }
    }
}

/// An ordered sequence of values, optionally open with a `...T` tail.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct List {
    items: Vec<Value>,
    tail: Option<Box<Value>>,
}

impl List {
    /// A closed list of the given items.
    #[must_use]
    pub const fn closed(items: Vec<Value>) -> Self {
        Self { items, tail: None }
    }

    /// An open list whose additional elements must satisfy `tail`.
    #[must_use]
    pub fn open(items: Vec<Value>, tail: Value) -> Self {
        Self {
            items,
            tail: Some(Box::new(tail)),
        }
    }

    /// Declared elements.
    #[must_use]
    pub fn items(&self) -> &[Value] {
        &self.items
    }

    /// Constraint on additional elements of an open list.
    #[must_use]
    pub fn tail(&self) -> Option<&Value> {
        self.tail.as_deref()
    }
}

/// A node of the value lattice.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// `_`, admitting everything.
    Top,
    /// An error; absorbs everything it is unified with.
    Bottom(Bottom),
    /// A concrete atom.
    Scalar(Scalar),
    /// A non-concrete scalar constraint such as `int & >=0`.
    Constraint(Constraint),
    /// A set of alternatives.
    Disjunction(Disjunction),
    /// A struct.
    Struct(Struct),
    /// A list.
    List(List),
}

impl Default for Value {
    fn default() -> Self {
        Self::Struct(Struct::new())
    }
}

impl Value {
    /// A concrete string.
    #[must_use]
    pub fn string(value: impl Into<String>) -> Self {
        Self::Scalar(Scalar::String(value.into()))
    }

    /// A concrete integer.
    #[must_use]
    pub const fn int(value: i64) -> Self {
        Self::Scalar(Scalar::Int(value))
    }

    /// A concrete float.
    #[must_use]
    pub const fn float(value: f64) -> Self {
        Self::Scalar(Scalar::Float(value))
    }

    /// A concrete boolean.
    #[must_use]
    pub const fn bool(value: bool) -> Self {
        Self::Scalar(Scalar::Bool(value))
    }

    /// `null`.
    #[must_use]
    pub const fn null() -> Self {
        Self::Scalar(Scalar::Null)
    }

    /// A bottom value of the given kind.
    #[must_use]
    pub fn bottom(kind: BottomKind, message: impl Into<String>) -> Self {
        Self::Bottom(Bottom::new(kind, message))
    }

    /// A constraint admitting every atom of the given kinds.
    #[must_use]
    pub const fn kind(kinds: Kinds) -> Self {
        Self::Constraint(Constraint::of_kinds(kinds))
    }

    /// An empty open struct.
    #[must_use]
    pub const fn empty_struct() -> Self {
        Self::Struct(Struct::new())
    }

    /// Whether the value is bottom.
    #[must_use]
    pub const fn is_bottom(&self) -> bool {
        matches!(self, Self::Bottom(_))
    }

    /// Builds a normalised disjunction from `(value, marked default)` pairs.
    ///
    /// Nested disjunctions are flattened, bottom arms removed and equivalent
    /// arms merged. A single surviving arm is returned as-is and no surviving
    /// arm yields bottom.
    #[must_use]
    pub fn disjoin(arms: Vec<(Self, bool)>) -> Self {
        let any_marked = arms.iter().any(|(_, marked)| *marked);
        let mut flattened: Vec<(Self, bool)> = Vec::new();
        let mut first_error = None;
        for (value, marked) in arms {
            let outer = marked || !any_marked;
            match value {
                Self::Disjunction(inner) => {
                    let inner_marked = inner.has_marked_default();
                    for arm in inner.arms {
                        flattened.push((arm.value, outer && (arm.default || !inner_marked)));
                    }
                }
                Self::Bottom(bottom) => {
                    first_error.get_or_insert(bottom);
                }
                other => flattened.push((other, outer)),
            }
        }
        let mut merged: Vec<(Self, bool)> = Vec::new();
        for (value, default) in flattened {
            if value.is_bottom() {
                continue;
            }
            match merged.iter_mut().find(|(seen, _)| seen.equivalent(&value)) {
                Some((_, seen_default)) => *seen_default |= default,
                None => merged.push((value, default)),
            }
        }
        let all_same = merged.iter().all(|(_, default)| *default)
            || merged.iter().all(|(_, default)| !*default);
        let mut arms_out: Vec<Arm> = merged
            .into_iter()
            .map(|(value, default)| Arm {
                value,
                default: default && !all_same,
            })
            .collect();
        match arms_out.len() {
            0 => Self::Bottom(first_error.unwrap_or_else(|| {
                Bottom::new(BottomKind::Conflict, "empty disjunction")
            })),
            1 => arms_out.pop().map_or_else(Self::empty_struct, |arm| arm.value),
            _ => Self::Disjunction(Disjunction { arms: arms_out }),
        }
    }

    /// Name of the value's kind as used in diagnostics.
    #[must_use]
    pub fn kind_name(&self) -> String {
        match self {
            Self::Top => "_".to_owned(),
            Self::Bottom(_) => "_|_".to_owned(),
            Self::Scalar(scalar) => scalar.kind().to_string(),
            Self::Constraint(constraint) => constraint.kinds().to_string(),
            Self::Disjunction(_) => "disjunction".to_owned(),
            Self::Struct(_) => "struct".to_owned(),
            Self::List(_) => "list".to_owned(),
        }
    }

    /// Resolves a disjunction with a single default to that default.
    ///
    /// Other values are returned unchanged.
    #[must_use]
    pub fn resolved(&self) -> &Self {
        match self {
            Self::Disjunction(disjunction) => disjunction
                .default_value()
                .map_or(self, Self::resolved),
            _ => self,
        }
    }

    /// Borrows the string if the resolved value is a concrete string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self.resolved() {
            Self::Scalar(Scalar::String(value)) => Some(value),
            _ => None,
        }
    }

    /// The integer if the resolved value is a concrete int.
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self.resolved() {
            Self::Scalar(Scalar::Int(value)) => Some(*value),
            _ => None,
        }
    }

    /// The boolean if the resolved value is a concrete bool.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self.resolved() {
            Self::Scalar(Scalar::Bool(value)) => Some(*value),
            _ => None,
        }
    }

    /// The struct if the resolved value is one.
    #[must_use]
    pub fn as_struct(&self) -> Option<&Struct> {
        match self.resolved() {
            Self::Struct(value) => Some(value),
            _ => None,
        }
    }

    /// The list if the resolved value is one.
    #[must_use]
    pub fn as_list(&self) -> Option<&List> {
        match self.resolved() {
            Self::List(value) => Some(value),
            _ => None,
        }
    }

    /// Definition `label` of a struct value.
    #[must_use]
    pub fn definition(&self, label: &str) -> Option<&Self> {
        self.as_struct()?.definition(label)
    }

    /// Marks this value and every nested struct as closed.
    ///
    /// Structs whose literal carried `...` stay open at their own level.
    #[must_use]
    pub fn close(&self) -> Self {
        match self {
            Self::Struct(st) => {
                let mut closed = st.clone();
                closed.closed = !st.ellipsis;
                for (_, field) in &mut closed.fields {
                    field.value = field.value.close();
                }
                for pattern in &mut closed.patterns {
                    pattern.value = pattern.value.close();
                }
                Self::Struct(closed)
            }
            Self::List(list) => Self::List(List {
                items: list.items.iter().map(Self::close).collect(),
                tail: list.tail.as_ref().map(|tail| Box::new(tail.close())),
            }),
            Self::Disjunction(disjunction) => Self::Disjunction(Disjunction {
                arms: disjunction
                    .arms
                    .iter()
                    .map(|arm| Arm {
                        value: arm.value.close(),
                        default: arm.default,
                    })
                    .collect(),
            }),
            other => other.clone(),
        }
    }

    /// Structural equivalence, insensitive to field and bound order.
    #[must_use]
    pub fn equivalent(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Top, Self::Top) | (Self::Bottom(_), Self::Bottom(_)) => true,
            (Self::Scalar(a), Self::Scalar(b)) => a == b,
            (Self::Constraint(a), Self::Constraint(b)) => a.same_as(b),
            (Self::Disjunction(a), Self::Disjunction(b)) => {
                a.arms.len() == b.arms.len()
                    && a.arms.iter().all(|arm| {
                        b.arms.iter().any(|candidate| {
                            candidate.default == arm.default
                                && candidate.value.equivalent(&arm.value)
                        })
                    })
            }
            (Self::Struct(a), Self::Struct(b)) => structs_equivalent(a, b),
            (Self::List(a), Self::List(b)) => {
                a.items.len() == b.items.len()
                    && a.items
                        .iter()
                        .zip(&b.items)
                        .all(|(left, right)| left.equivalent(right))
                    && match (&a.tail, &b.tail) {
                        (None, None) => true,
                        (Some(left), Some(right)) => left.equivalent(right),
                        _ => false,
                    }
            }
            _ => false,
        }
    }
}

fn structs_equivalent(a: &Struct, b: &Struct) -> bool {
    a.closed == b.closed
        && a.fields.len() == b.fields.len()
        && a.fields.iter().all(|(label, field)| {
            b.field(label).is_some_and(|other| {
                other.optional == field.optional && other.value.equivalent(&field.value)
            })
        })
        && a.definitions.len() == b.definitions.len()
        && a.definitions.iter().all(|(label, value)| {
            b.definition(label)
                .is_some_and(|other| other.equivalent(value))
        })
        && a.patterns.len() == b.patterns.len()
        && a.patterns.iter().all(|pattern| {
            b.patterns.iter().any(|other| {
                other.key.equivalent(&pattern.key) && other.value.equivalent(&pattern.value)
            })
        })
}
