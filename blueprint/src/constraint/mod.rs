//! A small constraint language for blueprint files.
//!
//! Sources are a subset of CUE: struct and list literals, scalar literals,
//! the predeclared kinds (`string`, `int`, `float`, `number`, `bool`, `_`),
//! conjunction `&`, disjunction `|` with `*` defaults, unary bounds
//! (`>`, `>=`, `<`, `<=`, `!=`, `=~`, `!~`), optional fields, definitions
//! (`#Name`, closed on reference), pattern constraints (`[string]: T`), open
//! markers (`...`), references, selectors and field attributes.
//!
//! [`compile`] turns source bytes into a [`Value`]. Values then support
//! [`Value::unify`], [`Value::lookup`], [`Value::fill`], [`Value::delete`],
//! [`Value::validate_concrete`], [`Value::walk_fields`] and
//! [`Value::to_json`].
//!
//! # Examples
//!
//! ```
//! use forge_blueprint::constraint::{Path, Value, compile};
//!
//! let schema = compile(b"#Port: int & >0 & <65536\nport: #Port")?;
//! let config = compile(b"port: 8080")?;
//! let merged = schema.unify(&config);
//! assert!(merged.validate_concrete().is_ok());
//! assert_eq!(merged.lookup(&Path::parse("port")?).and_then(Value::as_int), Some(8080));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod ast;
mod attribute;
mod error;
mod eval;
mod export;
mod lexer;
mod parser;
mod path;
mod validate;
mod value;

pub use attribute::{Attribute, AttributeArg};
pub use error::{CompileError, PathError, Position};
pub use path::{Path, Selector};
pub use validate::{Violation, ViolationKind, Violations};
pub use value::{
    Arm, Bottom, BottomKind, Bound, BoundOp, Constraint, Disjunction, Field, FieldWalk, Kinds,
    List, Pattern, Scalar, Struct, Value,
};

/// Compiles constraint source text into a value.
///
/// # Errors
///
/// Returns a [`CompileError`] for invalid UTF-8, syntax errors, unsupported
/// constructs, unresolved references, reference cycles and invalid
/// operands. Conflicting values do not fail compilation; they become
/// bottom inside the returned tree.
pub fn compile(source: &[u8]) -> Result<Value, CompileError> {
    let text = std::str::from_utf8(source)?;
    let root = parser::parse(text)?;
    eval::evaluate(&root)
}
