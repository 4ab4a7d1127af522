//! Reference resolution for Runik
//!
//! Runs after every unit has been indexed and pending functions promoted,
//! so forward references across units resolve here. The walk resolves
//! every written type reference, variable access and call to its canonical
//! target, caches the result in the [`Index`] side tables, and reports
//! what cannot be resolved. Wildcards inside commands are checked too.

use crate::ast::{Block, Decl, Expr, Stmt, Unit, VarDecl};
use crate::compiler::command;
use crate::error::{DiagnosticKind, Diagnostics};
use crate::semantic::eval;
use crate::semantic::frame::Frame;
use crate::semantic::index::Index;

/// Resolves every reference in a unit.
pub fn check_unit<'a>(unit: &'a Unit, index: &mut Index<'a>, diags: &mut Diagnostics) {
    let mut walker = PostIndexWalker {
        index,
        frame: Frame::new(),
        diags,
    };
    for decl in &unit.decls {
        walker.check_decl(decl);
    }
}

struct PostIndexWalker<'a, 'x> {
    index: &'x mut Index<'a>,
    frame: Frame<'a>,
    diags: &'x mut Diagnostics,
}

impl<'a> PostIndexWalker<'a, '_> {
    fn check_decl(&mut self, decl: &'a Decl) {
        match decl {
            Decl::Namespace(ns) => {
                self.frame.push_namespace(&ns.name);
                for inner in &ns.decls {
                    self.check_decl(inner);
                }
                self.frame.pop_namespace();
            }
            Decl::Type(_) => {}
            Decl::Field(field) => self.check_var_decl(field),
            Decl::Function(func) => {
                match self.frame.resolve_type(self.index, &func.return_type) {
                    Some(canonical) => {
                        let type_id = self
                            .index
                            .type_def(&canonical)
                            .map(|entry| entry.id())
                            .expect("resolved type missing from table");
                        self.index.set_resolved_type(func.id, type_id);
                    }
                    None => self.diags.report(
                        DiagnosticKind::UnknownType(func.return_type.to_string()),
                        func.return_type_span,
                    ),
                }
                self.frame.push_block();
                for param in &func.params {
                    self.check_var_decl(param);
                }
                self.check_block(&func.body);
                self.frame.pop_block();
            }
        }
    }

    fn check_var_decl(&mut self, decl: &'a VarDecl) {
        match self.frame.resolve_type(self.index, &decl.var_type) {
            Some(canonical) => {
                let type_id = self
                    .index
                    .type_def(&canonical)
                    .map(|entry| entry.id())
                    .expect("resolved type missing from table");
                self.index.set_resolved_type(decl.id, type_id);
            }
            None => self.diags.report(
                DiagnosticKind::UnknownType(decl.var_type.to_string()),
                decl.type_span,
            ),
        }
        if self.frame.in_block() {
            self.frame.declare_local(self.index, decl, self.diags);
        }
        if let Some(init) = &decl.initializer {
            self.check_expr(init);
        }
    }

    fn check_block(&mut self, block: &'a Block) {
        self.frame.push_block();
        for stmt in &block.stmts {
            match stmt {
                Stmt::Block(inner) => self.check_block(inner),
                Stmt::Command(cmd) => {
                    command::check_wildcards(cmd, self.index, &self.frame, self.diags);
                }
                Stmt::Expr(expr_stmt) => self.check_expr(&expr_stmt.expr),
                Stmt::VarDecl(decl) => self.check_var_decl(decl),
            }
        }
        self.frame.pop_block();
    }

    fn check_expr(&mut self, expr: &'a Expr) {
        match expr {
            Expr::Bool { .. } | Expr::Int { .. } | Expr::Str { .. } => {}
            Expr::VarAccess { id, name, span } => {
                match self.frame.resolve_variable(self.index, name) {
                    Some(decl) => {
                        self.index.set_resolved_target(*id, decl.id);
                        self.index.mark_referenced(decl.id);
                    }
                    None => self
                        .diags
                        .report(DiagnosticKind::UndefinedVariable(name.to_string()), *span),
                }
            }
            Expr::Call {
                id,
                name,
                args,
                span,
            } => {
                for arg in args {
                    self.check_expr(arg);
                }
                let mut param_types = Vec::with_capacity(args.len());
                for arg in args {
                    let Some(arg_type) = eval::expression_type(arg, self.index, &self.frame)
                    else {
                        // The argument's own resolution failure was
                        // already reported above.
                        return;
                    };
                    if arg_type.is_void() {
                        self.diags.report(DiagnosticKind::VoidArgument, arg.span());
                        return;
                    }
                    param_types.push(arg_type);
                }
                match self.frame.resolve_function(self.index, name, &param_types) {
                    Some(key) => {
                        let func = self
                            .index
                            .function(&key)
                            .expect("resolved function missing from table");
                        self.index.set_resolved_target(*id, func.id);
                        self.index.mark_referenced(func.id);
                    }
                    None => {
                        let key =
                            crate::semantic::index::FunctionKey::new(name.clone(), param_types);
                        self.diags
                            .report(DiagnosticKind::UndefinedFunction(key.to_string()), *span);
                    }
                }
            }
        }
    }
}
