//! Static evaluation of Runik expressions
//!
//! Everything that reaches a command list has to be a value the compiler
//! can compute ahead of time. Evaluation is best-effort and pure: it
//! returns `None` rather than report, and callers decide whether a missing
//! value is an error at their site. A depth guard bounds recursion because
//! field initializers are chased before the cycle check has run.

use std::fmt;

use crate::ast::Expr;
use crate::name::{QualifiedName, BOOL, INT, STRING};
use crate::semantic::frame::Frame;
use crate::semantic::index::Index;

/// Maximum initializer chain depth chased during evaluation. Cyclic
/// references are caught later by the call graph; this only keeps the
/// chase finite until then.
const MAX_DEPTH: usize = 64;

/// A compile-time value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Str(String),
}

impl fmt::Display for Value {
    /// Renders the value the way it appears inside a command: booleans as
    /// `true`/`false`, strings without quotes.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(value) => write!(f, "{}", value),
            Value::Int(value) => write!(f, "{}", value),
            Value::Str(value) => write!(f, "{}", value),
        }
    }
}

/// Evaluates an expression in the given frame, if it has a value the
/// compiler can see.
pub fn static_evaluate<'a>(expr: &Expr, index: &Index<'a>, frame: &Frame<'a>) -> Option<Value> {
    eval_expr(expr, index, frame, 0)
}

fn eval_expr<'a>(expr: &Expr, index: &Index<'a>, frame: &Frame<'a>, depth: usize) -> Option<Value> {
    if depth > MAX_DEPTH {
        return None;
    }
    match expr {
        Expr::Bool { value, .. } => Some(Value::Bool(*value)),
        Expr::Int { value, .. } => Some(Value::Int(*value)),
        Expr::Str { value, .. } => Some(Value::Str(value.clone())),
        Expr::VarAccess { name, .. } => evaluate_variable(name, index, frame, depth),
        // Calls return void in the current subset, so they never
        // produce a value.
        Expr::Call { .. } => None,
    }
}

/// Evaluates a variable reference: locals carry their value in the frame,
/// fields fall back to their cached constant or their initializer chased
/// in the namespace they were declared in.
pub(crate) fn evaluate_variable<'a>(
    name: &QualifiedName,
    index: &Index<'a>,
    frame: &Frame<'a>,
    depth: usize,
) -> Option<Value> {
    if depth > MAX_DEPTH {
        return None;
    }
    if name.is_unqualified() {
        if let Some(local) = frame.lookup_local(name.name()) {
            return local.const_value.clone();
        }
    }
    let canonical = frame.resolve_field(index, name)?;
    let decl = index.field_def(&canonical)?;
    if !decl.modifiers.is_const {
        return None;
    }
    if let Some(value) = index.const_value(decl.id) {
        return Some(value.clone());
    }
    let initializer = decl.initializer.as_ref()?;
    let home = Frame::with_namespaces(index.namespace_of(decl.id).to_vec());
    eval_expr(initializer, index, &home, depth + 1)
}

/// The canonical type of an expression, if it can be determined. Literal
/// types are the built-ins; references take the declared type of their
/// target, resolved in the namespace the target was declared in.
pub fn expression_type<'a>(
    expr: &Expr,
    index: &Index<'a>,
    frame: &Frame<'a>,
) -> Option<QualifiedName> {
    match expr {
        Expr::Bool { .. } => Some(BOOL.clone()),
        Expr::Int { .. } => Some(INT.clone()),
        Expr::Str { .. } => Some(STRING.clone()),
        Expr::VarAccess { name, .. } => {
            let decl = frame.resolve_variable(index, name)?;
            if index.is_field(decl.id) {
                let home = Frame::with_namespaces(index.namespace_of(decl.id).to_vec());
                home.resolve_type(index, &decl.var_type)
            } else {
                frame.resolve_type(index, &decl.var_type)
            }
        }
        Expr::Call { name, args, .. } => {
            let mut param_types = Vec::with_capacity(args.len());
            for arg in args {
                param_types.push(expression_type(arg, index, frame)?);
            }
            let key = frame.resolve_function(index, name, &param_types)?;
            let func = index.function(&key)?;
            let home = Frame::with_namespaces(key.name.namespaces().to_vec());
            home.resolve_type(index, &func.return_type)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Modifiers, NodeId, Span, VarDecl};
    use crate::error::Diagnostics;
    use crate::semantic::ids::IdGen;

    fn int_lit(value: i64) -> Expr {
        Expr::Int {
            value,
            span: Span::default(),
        }
    }

    fn const_field(gen: &mut IdGen, name: &str, init: Option<Expr>) -> VarDecl {
        VarDecl {
            id: gen.next_id(),
            modifiers: Modifiers::constant(),
            var_type: QualifiedName::short("int"),
            type_span: Span::default(),
            name: name.into(),
            initializer: init,
            span: Span::default(),
        }
    }

    #[test]
    fn test_literals() {
        let index = Index::new(&mut IdGen::new());
        let frame = Frame::new();
        assert_eq!(
            static_evaluate(&int_lit(42), &index, &frame),
            Some(Value::Int(42))
        );
        let s = Expr::Str {
            value: "hi".into(),
            span: Span::default(),
        };
        assert_eq!(static_evaluate(&s, &index, &frame), Some(Value::Str("hi".into())));
    }

    #[test]
    fn test_field_initializer_chain() {
        let mut gen = IdGen::new();
        let a = const_field(&mut gen, "a", Some(int_lit(7)));
        let b = const_field(
            &mut gen,
            "b",
            Some(Expr::VarAccess {
                id: NodeId::UNSET,
                name: QualifiedName::short("a"),
                span: Span::default(),
            }),
        );
        let mut index = Index::new(&mut gen);
        let mut diags = Diagnostics::new();
        index.declare_field(&[], &a, &mut diags);
        index.declare_field(&[], &b, &mut diags);

        let frame = Frame::new();
        let access = Expr::VarAccess {
            id: NodeId::UNSET,
            name: QualifiedName::short("b"),
            span: Span::default(),
        };
        assert_eq!(static_evaluate(&access, &index, &frame), Some(Value::Int(7)));
    }

    #[test]
    fn test_cyclic_initializers_bottom_out() {
        let mut gen = IdGen::new();
        let a = const_field(
            &mut gen,
            "a",
            Some(Expr::VarAccess {
                id: NodeId::UNSET,
                name: QualifiedName::short("b"),
                span: Span::default(),
            }),
        );
        let b = const_field(
            &mut gen,
            "b",
            Some(Expr::VarAccess {
                id: NodeId::UNSET,
                name: QualifiedName::short("a"),
                span: Span::default(),
            }),
        );
        let mut index = Index::new(&mut gen);
        let mut diags = Diagnostics::new();
        index.declare_field(&[], &a, &mut diags);
        index.declare_field(&[], &b, &mut diags);

        let frame = Frame::new();
        let access = Expr::VarAccess {
            id: NodeId::UNSET,
            name: QualifiedName::short("a"),
            span: Span::default(),
        };
        assert_eq!(static_evaluate(&access, &index, &frame), None);
    }

    #[test]
    fn test_literal_types() {
        let index = Index::new(&mut IdGen::new());
        let frame = Frame::new();
        assert_eq!(
            expression_type(&int_lit(0), &index, &frame),
            Some(QualifiedName::short("int"))
        );
        let b = Expr::Bool {
            value: true,
            span: Span::default(),
        };
        assert_eq!(
            expression_type(&b, &index, &frame),
            Some(QualifiedName::short("bool"))
        );
    }
}
