//! Command list generation for Runik
//!
//! Final pass: walks every unit, expands inline calls, substitutes
//! wildcards and collects one list of raw command lines per non-inline
//! function. The lists land in an ordered map keyed by the function's
//! emission id.

pub mod command;

use std::collections::BTreeMap;

use crate::ast::{Block, Decl, Expr, FunctionDecl, Stmt, Unit};
use crate::error::Diagnostics;
use crate::semantic::eval;
use crate::semantic::frame::Frame;
use crate::semantic::index::Index;

/// Generates the command lists for one unit's non-inline functions.
pub fn generate_unit<'a>(
    unit: &'a Unit,
    index: &mut Index<'a>,
    command_lists: &mut BTreeMap<String, Vec<String>>,
    diags: &mut Diagnostics,
) {
    let mut compiler = CommandCompiler {
        index,
        frame: Frame::new(),
        saved: Vec::new(),
        diags,
    };
    for decl in &unit.decls {
        compiler.compile_decl(decl, command_lists);
    }
}

struct CommandCompiler<'a, 'x> {
    index: &'x mut Index<'a>,
    frame: Frame<'a>,
    /// Frames of enclosing expansion sites, innermost last. Inline
    /// expansion swaps in a frame rooted at the callee's namespace and
    /// restores the caller's on exit.
    saved: Vec<Frame<'a>>,
    diags: &'x mut Diagnostics,
}

impl<'a> CommandCompiler<'a, '_> {
    fn compile_decl(&mut self, decl: &'a Decl, command_lists: &mut BTreeMap<String, Vec<String>>) {
        match decl {
            Decl::Namespace(ns) => {
                self.frame.push_namespace(&ns.name);
                for inner in &ns.decls {
                    self.compile_decl(inner, command_lists);
                }
                self.frame.pop_namespace();
            }
            Decl::Type(_) | Decl::Field(_) => {}
            Decl::Function(func) => {
                if func.modifiers.inline {
                    return;
                }
                let id = self.index.emission_id(func);
                let mut commands = Vec::new();
                self.compile_block(&func.body, &mut commands);
                command_lists.insert(id, commands);
            }
        }
    }

    fn compile_block(&mut self, block: &'a Block, commands: &mut Vec<String>) {
        self.frame.push_block();
        for stmt in &block.stmts {
            self.compile_stmt(stmt, commands);
        }
        self.frame.pop_block();
    }

    fn compile_stmt(&mut self, stmt: &'a Stmt, commands: &mut Vec<String>) {
        match stmt {
            Stmt::Block(inner) => self.compile_block(inner, commands),
            Stmt::Command(cmd) => {
                match command::make_raw_command(cmd, self.index, &self.frame) {
                    Ok(line) => commands.push(line),
                    Err((kind, span)) => self.diags.report(kind, span),
                }
            }
            Stmt::Expr(expr_stmt) => self.compile_expr(&expr_stmt.expr, commands),
            Stmt::VarDecl(decl) => self.frame.declare_local(self.index, decl, self.diags),
        }
    }

    fn compile_expr(&mut self, expr: &'a Expr, commands: &mut Vec<String>) {
        let Expr::Call { id, args, .. } = expr else {
            return;
        };
        let target = self
            .index
            .resolved_target(*id)
            .and_then(|target| self.index.function_by_id(target))
            .expect("call target unresolved after checking");
        if target.modifiers.inline {
            self.expand_inline(target, args, commands);
        } else {
            let id = self.index.emission_id(target);
            commands.push(format!("function {}", id));
        }
    }

    /// Splices the callee's body in place of the call. Arguments are
    /// evaluated in the caller's frame, then the body is compiled in a
    /// fresh frame rooted at the callee's namespace with the parameters
    /// bound as locals.
    fn expand_inline(
        &mut self,
        func: &'a FunctionDecl,
        args: &'a [Expr],
        commands: &mut Vec<String>,
    ) {
        let values: Vec<_> = args
            .iter()
            .map(|arg| eval::static_evaluate(arg, self.index, &self.frame))
            .collect();

        let callee_frame = Frame::with_namespaces(self.index.namespace_of(func.id).to_vec());
        let caller_frame = std::mem::replace(&mut self.frame, callee_frame);
        self.saved.push(caller_frame);

        self.frame.push_block();
        for (param, value) in func.params.iter().zip(values) {
            self.frame.declare_local(self.index, param, self.diags);
            if let Some(value) = value {
                self.frame.set_const_local(&param.name, value);
            }
        }
        self.compile_block(&func.body, commands);
        self.frame.pop_block();

        self.frame = self
            .saved
            .pop()
            .expect("inline expansion frame stack underflow");
    }
}
