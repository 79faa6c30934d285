//! Lexically scoped evaluation of a parsed source into a [`Value`].
//!
//! Fields are evaluated on demand and memoised per `(scope, label)`. A
//! reference that re-enters a field under evaluation is a cycle, except for
//! selections such as `a.b` from inside `a`, which are resolved statically
//! through the struct literal that declares `b`.

use std::collections::{HashMap, HashSet};

use super::ast::{Decl, Expr, FieldDecl, LabelKind, ScopeId, StructLit, UnaryOp};
use super::{
    Bound, BoundOp, BottomKind, CompileError, Constraint, Field, Kinds, List, Pattern, Position,
    Scalar, Struct, Value,
};

pub(crate) fn evaluate(root: &StructLit) -> Result<Value, CompileError> {
    Evaluator::default().eval_struct(root, &[])
}

#[derive(Default)]
struct Evaluator {
    memo: HashMap<(ScopeId, String), Field>,
    active: HashSet<(ScopeId, String)>,
}

impl Evaluator {
    fn eval_struct<'a>(
        &mut self,
        lit: &'a StructLit,
        env: &[&'a StructLit],
    ) -> Result<Value, CompileError> {
        let mut scope = env.to_vec();
        scope.push(lit);
        let mut result = Struct::new();
        result.set_ellipsis(lit.ellipsis);
        let mut seen: HashSet<&str> = HashSet::new();
        let mut embedded = Vec::new();
        for decl in &lit.decls {
            match decl {
                Decl::Field(field) => {
                    if !seen.insert(field.label.as_str()) {
                        continue;
                    }
                    let evaluated = self.eval_field(&scope, lit, field)?;
                    if field.kind == LabelKind::Definition {
                        result.insert_definition(field.label.clone(), evaluated.value().clone());
                    } else {
                        result.insert(field.label.clone(), evaluated);
                    }
                }
                Decl::Pattern { key, value } => {
                    let key_value = self.eval_expr(key, &scope)?;
                    let constraint = self.eval_expr(value, &scope)?;
                    result.push_pattern(Pattern::new(key_value, constraint));
                }
                Decl::Embed(expr) => embedded.push(self.eval_expr(expr, &scope)?),
            }
        }
        result.apply_patterns();
        Ok(embedded
            .iter()
            .fold(Value::Struct(result), |acc, value| acc.unify(value)))
    }

    /// Evaluates every declaration of `first.label` in `lit`; `scope` must end with `lit`.
    fn eval_field<'a>(
        &mut self,
        scope: &[&'a StructLit],
        lit: &'a StructLit,
        first: &'a FieldDecl,
    ) -> Result<Field, CompileError> {
        let key = (lit.id, first.label.clone());
        if let Some(done) = self.memo.get(&key) {
            return Ok(done.clone());
        }
        if !self.active.insert(key.clone()) {
            return Err(CompileError::Cycle {
                position: first.position,
                label: first.label.clone(),
            });
        }
        let outcome = self.combine_declarations(scope, lit, first);
        self.active.remove(&key);
        let field = outcome?;
        self.memo.insert(key, field.clone());
        Ok(field)
    }

    fn combine_declarations<'a>(
        &mut self,
        scope: &[&'a StructLit],
        lit: &'a StructLit,
        first: &'a FieldDecl,
    ) -> Result<Field, CompileError> {
        let mut value = Value::Top;
        let mut optional = true;
        let mut attributes = Vec::new();
        for decl in lit.fields_named(&first.label) {
            let declared = self.eval_expr(&decl.value, scope)?;
            value = value.unify(&declared);
            optional &= decl.optional;
            for attr in &decl.attributes {
                if !attributes.contains(attr) {
                    attributes.push(attr.clone());
                }
            }
        }
        if first.kind == LabelKind::Definition {
            value = value.close();
        }
        let field = if optional {
            Field::optional(value)
        } else {
            Field::regular(value)
        };
        Ok(field.with_attributes(attributes))
    }

    fn eval_expr<'a>(
        &mut self,
        expr: &'a Expr,
        scope: &[&'a StructLit],
    ) -> Result<Value, CompileError> {
        match expr {
            Expr::Null => Ok(Value::null()),
            Expr::Bool(flag) => Ok(Value::bool(*flag)),
            Expr::Int(number) => Ok(Value::int(*number)),
            Expr::Float(number) => Ok(Value::float(*number)),
            Expr::String(text) => Ok(Value::string(text.clone())),
            Expr::Bottom => Ok(Value::bottom(
                BottomKind::Explicit,
                "explicit error (_|_ literal) in source",
            )),
            Expr::Ident { name, position } => self.resolve(name, *position, scope),
            Expr::Select {
                base,
                label,
                position,
            } => self.select(expr, base, label, *position, scope),
            Expr::Unary {
                op,
                operand,
                position,
            } => {
                let value = self.eval_expr(operand, scope)?;
                apply_unary(*op, &value, *position)
            }
            Expr::Default(inner) => Ok(Value::disjoin(vec![(self.eval_expr(inner, scope)?, true)])),
            Expr::Conjunction(terms) => terms.iter().try_fold(Value::Top, |acc, term| {
                Ok(acc.unify(&self.eval_expr(term, scope)?))
            }),
            Expr::Disjunction(arms) => {
                let evaluated = arms
                    .iter()
                    .map(|arm| match arm {
                        Expr::Default(inner) => Ok((self.eval_expr(inner, scope)?, true)),
                        other => Ok((self.eval_expr(other, scope)?, false)),
                    })
                    .collect::<Result<Vec<_>, CompileError>>()?;
                Ok(Value::disjoin(evaluated))
            }
            Expr::Struct(lit) => self.eval_struct(lit, scope),
            Expr::List { items, tail } => {
                let values = items
                    .iter()
                    .map(|item| self.eval_expr(item, scope))
                    .collect::<Result<Vec<_>, CompileError>>()?;
                match tail {
                    Some(element) => Ok(Value::List(List::open(
                        values,
                        self.eval_expr(element, scope)?,
                    ))),
                    None => Ok(Value::List(List::closed(values))),
                }
            }
        }
    }

    fn resolve<'a>(
        &mut self,
        name: &str,
        position: Position,
        scope: &[&'a StructLit],
    ) -> Result<Value, CompileError> {
        for (depth, &lit) in scope.iter().enumerate().rev() {
            let declaration = lit.decls.iter().find_map(|decl| match decl {
                Decl::Field(field) if field.referable_as(name) => Some(field),
                _ => None,
            });
            if let Some(first) = declaration {
                let visible = scope.get(..=depth).unwrap_or(scope);
                return self
                    .eval_field(visible, lit, first)
                    .map(|field| field.value().clone())
                    .map_err(|err| match err {
                        CompileError::Cycle { .. } => CompileError::Cycle {
                            position,
                            label: name.to_owned(),
                        },
                        other => other,
                    });
            }
        }
        predeclared(name, position)
    }

    fn select<'a>(
        &mut self,
        expr: &'a Expr,
        base: &'a Expr,
        label: &str,
        position: Position,
        scope: &[&'a StructLit],
    ) -> Result<Value, CompileError> {
        let base_value = match self.eval_expr(base, scope) {
            Ok(value) => value,
            Err(err @ CompileError::Cycle { .. }) => {
                return match self.select_static(expr, scope)? {
                    Some(value) => Ok(value),
                    None => Err(err),
                };
            }
            Err(err) => return Err(err),
        };
        let resolved = base_value.resolved();
        let selected = match resolved {
            Value::Struct(st) if label.starts_with('#') => st.definition(label).cloned(),
            Value::Struct(st) => st.field(label).map(|field| field.value().clone()),
            _ => None,
        };
        selected.ok_or_else(|| CompileError::UndefinedField {
            position,
            label: label.to_owned(),
        })
    }

    /// Resolves `a.b.c` by following struct literals instead of evaluated values.
    fn select_static<'a>(
        &mut self,
        expr: &'a Expr,
        scope: &[&'a StructLit],
    ) -> Result<Option<Value>, CompileError> {
        let mut labels = Vec::new();
        let mut cursor = expr;
        let root = loop {
            match cursor {
                Expr::Select { base, label, .. } => {
                    labels.push(label.as_str());
                    cursor = base;
                }
                Expr::Ident { name, .. } => break name.as_str(),
                _ => return Ok(None),
            }
        };
        labels.reverse();
        let Some(depth) = scope.iter().rposition(|lit| lit.declares(root)) else {
            return Ok(None);
        };
        let mut env: Vec<&'a StructLit> = scope.get(..=depth).map(<[_]>::to_vec).unwrap_or_default();
        let Some(mut current) = env.last().copied() else {
            return Ok(None);
        };
        let mut current_label = root;
        for label in labels {
            let mut declarations = current.fields_named(current_label);
            let (Some(declaration), None) = (declarations.next(), declarations.next()) else {
                return Ok(None);
            };
            let Expr::Struct(inner) = &declaration.value else {
                return Ok(None);
            };
            if inner.fields_named(label).next().is_none() {
                return Ok(None);
            }
            env.push(inner);
            current = inner;
            current_label = label;
        }
        let Some(first) = current.fields_named(current_label).next() else {
            return Ok(None);
        };
        let field = self.eval_field(&env, current, first)?;
        Ok(Some(field.value().clone()))
    }
}

fn predeclared(name: &str, position: Position) -> Result<Value, CompileError> {
    match name {
        "_" => Ok(Value::Top),
        "string" => Ok(Value::kind(Kinds::STRING)),
        "int" => Ok(Value::kind(Kinds::INT)),
        "float" => Ok(Value::kind(Kinds::FLOAT)),
        "number" => Ok(Value::kind(Kinds::NUMBER)),
        "bool" => Ok(Value::kind(Kinds::BOOL)),
        "bytes" => Err(CompileError::Unsupported {
            position,
            construct: "the bytes type".to_owned(),
        }),
        _ => Err(CompileError::UnresolvedReference {
            position,
            name: name.to_owned(),
        }),
    }
}

fn apply_unary(op: UnaryOp, value: &Value, position: Position) -> Result<Value, CompileError> {
    let operator = match op {
        UnaryOp::Negate => "-",
        UnaryOp::Bound(bound_op) => bound_op.symbol(),
    };
    let invalid = |message: String| CompileError::InvalidOperand {
        position,
        operator: operator.to_owned(),
        message,
    };
    let Value::Scalar(scalar) = value.resolved() else {
        return Err(invalid(format!("{value} is not a concrete value")));
    };
    match (op, scalar) {
        (UnaryOp::Negate, Scalar::Int(number)) => number
            .checked_neg()
            .map(Value::int)
            .ok_or_else(|| invalid(format!("negating {number} overflows"))),
        (UnaryOp::Negate, Scalar::Float(number)) => Ok(Value::float(negate(*number))),
        (UnaryOp::Bound(bound_op @ (BoundOp::Matches | BoundOp::NotMatches)), Scalar::String(pattern)) => {
            Bound::regex(bound_op == BoundOp::NotMatches, pattern)
                .map(|bound| Value::Constraint(Constraint::from_bound(bound)))
                .map_err(|err| CompileError::InvalidRegex {
                    position,
                    message: err.to_string(),
                })
        }
        (UnaryOp::Bound(bound_op @ BoundOp::NotEqual), _)
        | (
            UnaryOp::Bound(
                bound_op @ (BoundOp::Greater
                | BoundOp::GreaterEqual
                | BoundOp::Less
                | BoundOp::LessEqual),
            ),
            Scalar::Int(_) | Scalar::Float(_) | Scalar::String(_),
        ) => Bound::compare(bound_op, scalar.clone())
            .map(|bound| Value::Constraint(Constraint::from_bound(bound)))
            .ok_or_else(|| invalid(format!("{scalar} cannot be used as a bound"))),
        _ => Err(invalid(format!("{scalar} is not a valid operand"))),
    }
}

#[expect(clippy::float_arithmetic, reason = "unary minus on a float literal")]
const fn negate(number: f64) -> f64 {
    -number
}
