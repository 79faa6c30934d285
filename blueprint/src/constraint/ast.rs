//! Syntax tree produced by the parser.

use super::{Attribute, BoundOp, Position};

pub(crate) type ScopeId = usize;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum LabelKind {
    Ident,
    Quoted,
    Definition,
}

#[derive(Clone, Debug)]
pub(crate) struct FieldDecl {
    pub(crate) label: String,
    pub(crate) kind: LabelKind,
    pub(crate) optional: bool,
    pub(crate) value: Expr,
    pub(crate) attributes: Vec<Attribute>,
    pub(crate) position: Position,
}

impl FieldDecl {
    pub(crate) fn referable_as(&self, name: &str) -> bool {
        self.kind != LabelKind::Quoted && self.label == name
    }
}

#[derive(Clone, Debug)]
pub(crate) enum Decl {
    Field(FieldDecl),
    Pattern { key: Expr, value: Expr },
    Embed(Expr),
}

#[derive(Clone, Debug)]
pub(crate) struct StructLit {
    pub(crate) id: ScopeId,
    pub(crate) decls: Vec<Decl>,
    pub(crate) ellipsis: bool,
}

impl StructLit {
    pub(crate) fn fields_named<'a>(&'a self, label: &'a str) -> impl Iterator<Item = &'a FieldDecl> {
        self.decls.iter().filter_map(move |decl| match decl {
            Decl::Field(field) if field.label == label => Some(field),
            _ => None,
        })
    }

    pub(crate) fn declares(&self, name: &str) -> bool {
        self.decls
            .iter()
            .any(|decl| matches!(decl, Decl::Field(field) if field.referable_as(name)))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum UnaryOp {
    Negate,
    Bound(BoundOp),
}

#[derive(Clone, Debug)]
pub(crate) enum Expr {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Bottom,
    Ident {
        name: String,
        position: Position,
    },
    Select {
        base: Box<Expr>,
        label: String,
        position: Position,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
        position: Position,
    },
    Default(Box<Expr>),
    Conjunction(Vec<Expr>),
    Disjunction(Vec<Expr>),
    Struct(StructLit),
    List {
        items: Vec<Expr>,
        tail: Option<Box<Expr>>,
    },
}
