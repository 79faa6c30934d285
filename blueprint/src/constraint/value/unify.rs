//! Unification: the greatest lower bound of two values.

use super::{Arm, BottomKind, Field, List, Struct, Value};

impl Value {
    /// Unifies two values.
    ///
    /// The operation is commutative, associative and idempotent up to
    /// [`Value::equivalent`]. Incompatible inputs produce
    /// [`Value::Bottom`] rather than an error so that failures can be
    /// reported with their location during validation.
    ///
    /// # Examples
    ///
    /// ```
    /// use forge_blueprint::constraint::{Kinds, Value};
    ///
    /// let int = Value::kind(Kinds::INT);
    /// assert_eq!(int.unify(&Value::int(3)), Value::int(3));
    /// assert!(int.unify(&Value::string("3")).is_bottom());
    /// ```
    #[must_use]
    pub fn unify(&self, other: &Self) -> Self {
        match (self, other) {
            (Self::Bottom(_), _) | (_, Self::Top) => self.clone(),
            (_, Self::Bottom(_)) | (Self::Top, _) => other.clone(),
            (Self::Disjunction(left), Self::Disjunction(right)) => {
                let left_marked = left.has_marked_default();
                let right_marked = right.has_marked_default();
                let mut arms = Vec::with_capacity(left.arms.len() * right.arms.len());
                for a in &left.arms {
                    for b in &right.arms {
                        arms.push((
                            a.value.unify(&b.value),
                            effective(a, left_marked) && effective(b, right_marked),
                        ));
                    }
                }
                Self::disjoin(arms)
            }
            (Self::Disjunction(disjunction), value) | (value, Self::Disjunction(disjunction)) => {
                let marked = disjunction.has_marked_default();
                Self::disjoin(
                    disjunction
                        .arms
                        .iter()
                        .map(|arm| (arm.value.unify(value), effective(arm, marked)))
                        .collect(),
                )
            }
            (Self::Scalar(a), Self::Scalar(b)) => {
                if a == b {
                    self.clone()
                } else {
                    conflict(self, other)
                }
            }
            (Self::Scalar(scalar), Self::Constraint(constraint))
            | (Self::Constraint(constraint), Self::Scalar(scalar)) => {
                if !constraint.kinds().contains(scalar.kind()) {
                    Self::bottom(
                        BottomKind::Conflict,
                        format!(
                            "conflicting values {scalar} and {constraint} (mismatched types {} and {})",
                            scalar.kind(),
                            constraint.kinds()
                        ),
                    )
                } else if constraint.admits(scalar) {
                    Self::Scalar(scalar.clone())
                } else {
                    Self::bottom(
                        BottomKind::Conflict,
                        format!("invalid value {scalar} (does not satisfy {constraint})"),
                    )
                }
            }
            (Self::Constraint(a), Self::Constraint(b)) => a.meet(b).map_or_else(
                || conflict(self, other),
                Self::Constraint,
            ),
            (Self::Struct(a), Self::Struct(b)) => Self::Struct(unify_structs(a, b)),
            (Self::List(a), Self::List(b)) => unify_lists(a, b),
            _ => conflict(self, other),
        }
    }
}

impl Field {
    /// Unifies two declarations of the same label.
    ///
    /// The result is optional only when both sides are, and carries the
    /// attributes of both.
    #[must_use]
    pub fn unify(&self, other: &Self) -> Self {
        let mut attributes = self.attributes.clone();
        for attr in &other.attributes {
            if !attributes.contains(attr) {
                attributes.push(attr.clone());
            }
        }
        Self {
            value: self.value.unify(&other.value),
            optional: self.optional && other.optional,
            attributes,
        }
    }
}

const fn effective(arm: &Arm, any_marked: bool) -> bool {
    arm.default || !any_marked
}

fn conflict(a: &Value, b: &Value) -> Value {
    let (left, right) = (a.kind_name(), b.kind_name());
    if left == right {
        Value::bottom(
            BottomKind::Conflict,
            format!("conflicting values {a} and {b}"),
        )
    } else {
        Value::bottom(
            BottomKind::Conflict,
            format!("conflicting values {a} and {b} (mismatched types {left} and {right})"),
        )
    }
}

fn not_allowed(label: &str) -> Field {
    Field::regular(Value::bottom(
        BottomKind::NotAllowed,
        format!("field not allowed: {label}"),
    ))
}

/// Carries a field from one side into the result, honouring the other
/// side's closedness. Optional fields the other side forbids are dropped.
fn carry_over(label: &str, field: &Field, other: &Struct) -> Option<Field> {
    if other.allows(label) {
        Some(field.clone())
    } else if field.optional {
        None
    } else {
        Some(not_allowed(label))
    }
}

fn unify_structs(a: &Struct, b: &Struct) -> Struct {
    let mut result = Struct::new();
    for (label, field) in &a.fields {
        let merged = match b.field(label) {
            Some(other) => Some(field.unify(other)),
            None => carry_over(label, field, b),
        };
        if let Some(merged_field) = merged {
            result.fields.push((label.clone(), merged_field));
        }
    }
    for (label, field) in &b.fields {
        if a.field(label).is_none() {
            if let Some(carried) = carry_over(label, field, a) {
                result.fields.push((label.clone(), carried));
            }
        }
    }
    for (label, value) in a.definitions.iter().chain(&b.definitions) {
        result.insert_definition(label.clone(), value.clone());
    }
    for pattern in a.patterns.iter().chain(&b.patterns) {
        result.push_pattern(pattern.clone());
    }
    result.closed = a.closed || b.closed;
    result.ellipsis = a.ellipsis || b.ellipsis;
    result.apply_patterns();
    result
}

fn unify_lists(a: &List, b: &List) -> Value {
    let (a_len, b_len) = (a.items.len(), b.items.len());
    match (&a.tail, &b.tail) {
        (None, None) if a_len != b_len => Value::bottom(
            BottomKind::Conflict,
            format!("incompatible list lengths ({a_len} and {b_len})"),
        ),
        (None, Some(_)) if a_len < b_len => Value::bottom(
            BottomKind::Conflict,
            format!("incompatible list lengths ({a_len} and at least {b_len})"),
        ),
        (Some(_), None) if b_len < a_len => Value::bottom(
            BottomKind::Conflict,
            format!("incompatible list lengths (at least {a_len} and {b_len})"),
        ),
        _ => {
            let length = a_len.max(b_len);
            let items = (0..length)
                .map(|position| {
                    let left = a.items.get(position).or(a.tail.as_deref());
                    let right = b.items.get(position).or(b.tail.as_deref());
                    match (left, right) {
                        (Some(x), Some(y)) => x.unify(y),
                        (Some(x), None) | (None, Some(x)) => x.clone(),
                        (None, None) => Value::Top,
                    }
                })
                .collect();
            let tail = match (&a.tail, &b.tail) {
                (Some(x), Some(y)) => Some(Box::new(x.unify(y))),
                _ => None,
            };
            Value::List(List { items, tail })
        }
    }
}
