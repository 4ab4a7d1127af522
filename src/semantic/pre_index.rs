//! Early structural checks for Runik
//!
//! Rejects constructs the current language subset does not support yet,
//! before any names are indexed. Everything here is local to a single
//! declaration or statement, so the walk needs no symbol tables.

use crate::ast::{Block, Decl, Expr, Modifiers, Stmt, Unit, VarDecl};
use crate::error::{DiagnosticKind, Diagnostics};

/// Walks one unit and reports every unsupported construct in it.
pub fn check_unit(unit: &Unit, diags: &mut Diagnostics) {
    for decl in &unit.decls {
        check_decl(decl, diags);
    }
}

fn check_decl(decl: &Decl, diags: &mut Diagnostics) {
    match decl {
        Decl::Namespace(ns) => {
            for inner in &ns.decls {
                check_decl(inner, diags);
            }
        }
        Decl::Type(type_decl) => {
            if type_decl.modifiers != Modifiers::NONE {
                diags.report(DiagnosticKind::InvalidModifier("type definition"), type_decl.span);
            }
        }
        Decl::Field(field) => check_var_decl(field, diags),
        Decl::Function(func) => {
            if func.modifiers.is_const {
                diags.report(DiagnosticKind::InvalidModifier("function"), func.span);
            }
            if !func.modifiers.inline && !func.params.is_empty() {
                diags.report(
                    DiagnosticKind::UnsupportedConstruct(
                        "non-inline functions with parameters are not supported yet",
                    ),
                    func.span,
                );
            }
            if !func.return_type.is_void() {
                diags.report(
                    DiagnosticKind::UnsupportedConstruct(
                        "non-void functions are not supported yet",
                    ),
                    func.return_type_span,
                );
            }
            for param in &func.params {
                check_var_decl(param, diags);
            }
            check_block(&func.body, diags);
        }
    }
}

fn check_var_decl(decl: &VarDecl, diags: &mut Diagnostics) {
    if !decl.modifiers.is_const {
        diags.report(
            DiagnosticKind::UnsupportedConstruct("non-const variables are not supported yet"),
            decl.span,
        );
    }
    if decl.modifiers.inline {
        diags.report(DiagnosticKind::InvalidModifier("variable"), decl.span);
    }
    if let Some(init) = &decl.initializer {
        check_expr(init, diags);
    }
}

fn check_block(block: &Block, diags: &mut Diagnostics) {
    for stmt in &block.stmts {
        check_stmt(stmt, diags);
    }
}

fn check_stmt(stmt: &Stmt, diags: &mut Diagnostics) {
    match stmt {
        Stmt::Block(block) => check_block(block, diags),
        Stmt::Command(cmd) => {
            // Commands are raw lines, not statements with terminators.
            if cmd.text.ends_with(';') {
                diags.report(
                    DiagnosticKind::UnsupportedConstruct(
                        "command statements should not end with a semicolon",
                    ),
                    cmd.span,
                );
            }
        }
        Stmt::Expr(expr_stmt) => {
            if !matches!(expr_stmt.expr, Expr::Call { .. }) {
                diags.report(
                    DiagnosticKind::UnsupportedConstruct(
                        "only function calls can be used as statements",
                    ),
                    expr_stmt.span,
                );
            }
            check_expr(&expr_stmt.expr, diags);
        }
        Stmt::VarDecl(decl) => check_var_decl(decl, diags),
    }
}

fn check_expr(expr: &Expr, diags: &mut Diagnostics) {
    if let Expr::Call { args, .. } = expr {
        for arg in args {
            check_expr(arg, diags);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{CommandStmt, ExprStmt, NodeId, Span};
    use crate::name::QualifiedName;

    fn unit(decls: Vec<Decl>) -> Unit {
        Unit {
            name: "test.rk".into(),
            decls,
        }
    }

    #[test]
    fn test_mutable_field_rejected() {
        let field = Decl::Field(VarDecl {
            id: NodeId::UNSET,
            modifiers: Modifiers::NONE,
            var_type: QualifiedName::short("int"),
            type_span: Span::default(),
            name: "x".into(),
            initializer: None,
            span: Span::default(),
        });
        let mut diags = Diagnostics::new();
        check_unit(&unit(vec![field]), &mut diags);
        assert_eq!(diags.len(), 1);
        assert!(matches!(
            diags.iter().next().unwrap().kind(),
            Some(DiagnosticKind::UnsupportedConstruct(_))
        ));
    }

    #[test]
    fn test_command_with_terminator_rejected() {
        let func = Decl::Function(crate::ast::FunctionDecl {
            id: NodeId::UNSET,
            modifiers: Modifiers::inline(),
            return_type: QualifiedName::short("void"),
            return_type_span: Span::default(),
            name: "f".into(),
            params: Vec::new(),
            body: Block {
                stmts: vec![Stmt::Command(CommandStmt {
                    text: "say hello;".into(),
                    span: Span::default(),
                })],
                span: Span::default(),
            },
            span: Span::default(),
        });
        let mut diags = Diagnostics::new();
        check_unit(&unit(vec![func]), &mut diags);
        assert_eq!(diags.len(), 1);
    }

    #[test]
    fn test_non_call_statement_rejected() {
        let func = Decl::Function(crate::ast::FunctionDecl {
            id: NodeId::UNSET,
            modifiers: Modifiers::inline(),
            return_type: QualifiedName::short("void"),
            return_type_span: Span::default(),
            name: "f".into(),
            params: Vec::new(),
            body: Block {
                stmts: vec![Stmt::Expr(ExprStmt {
                    expr: Expr::Int {
                        value: 1,
                        span: Span::default(),
                    },
                    span: Span::default(),
                })],
                span: Span::default(),
            },
            span: Span::default(),
        });
        let mut diags = Diagnostics::new();
        check_unit(&unit(vec![func]), &mut diags);
        assert_eq!(diags.len(), 1);
    }
}
