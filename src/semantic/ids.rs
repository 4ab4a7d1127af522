//! Node id assignment
//!
//! Runs once, before any analysis phase. Every declaration and reference
//! node gets a fresh [`NodeId`]; all later passes key their side tables by
//! these ids instead of node identity. Built-in type definitions draw ids
//! from the same generator when the index is created.

use crate::ast::{Block, Decl, Expr, FunctionDecl, NodeId, Stmt, Unit, VarDecl};

/// Monotonic id generator. Id 0 is reserved for [`NodeId::UNSET`].
#[derive(Debug)]
pub struct IdGen {
    next: u32,
}

impl IdGen {
    pub fn new() -> Self {
        Self { next: 1 }
    }

    pub fn next_id(&mut self) -> NodeId {
        let id = NodeId(self.next);
        self.next += 1;
        id
    }
}

impl Default for IdGen {
    fn default() -> Self {
        Self::new()
    }
}

/// Stamps ids into every declaration and reference node of every unit.
pub fn assign_ids(units: &mut [Unit], gen: &mut IdGen) {
    for unit in units {
        for decl in &mut unit.decls {
            assign_decl(decl, gen);
        }
    }
}

fn assign_decl(decl: &mut Decl, gen: &mut IdGen) {
    match decl {
        Decl::Namespace(ns) => {
            for decl in &mut ns.decls {
                assign_decl(decl, gen);
            }
        }
        Decl::Type(type_decl) => {
            type_decl.id = gen.next_id();
        }
        Decl::Field(var_decl) => assign_var_decl(var_decl, gen),
        Decl::Function(func) => assign_function(func, gen),
    }
}

fn assign_var_decl(decl: &mut VarDecl, gen: &mut IdGen) {
    decl.id = gen.next_id();
    if let Some(init) = &mut decl.initializer {
        assign_expr(init, gen);
    }
}

fn assign_function(func: &mut FunctionDecl, gen: &mut IdGen) {
    func.id = gen.next_id();
    for param in &mut func.params {
        assign_var_decl(param, gen);
    }
    assign_block(&mut func.body, gen);
}

fn assign_block(block: &mut Block, gen: &mut IdGen) {
    for stmt in &mut block.stmts {
        assign_stmt(stmt, gen);
    }
}

fn assign_stmt(stmt: &mut Stmt, gen: &mut IdGen) {
    match stmt {
        Stmt::Block(block) => assign_block(block, gen),
        Stmt::Command(_) => {}
        Stmt::Expr(stmt) => assign_expr(&mut stmt.expr, gen),
        Stmt::VarDecl(decl) => assign_var_decl(decl, gen),
    }
}

fn assign_expr(expr: &mut Expr, gen: &mut IdGen) {
    match expr {
        Expr::Bool { .. } | Expr::Int { .. } | Expr::Str { .. } => {}
        Expr::VarAccess { id, .. } => *id = gen.next_id(),
        Expr::Call { id, args, .. } => {
            *id = gen.next_id();
            for arg in args {
                assign_expr(arg, gen);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Modifiers, Span};
    use crate::name::QualifiedName;

    #[test]
    fn test_ids_are_unique_and_set() {
        let mut units = vec![Unit {
            name: "test.rk".into(),
            decls: vec![
                Decl::Field(VarDecl {
                    id: NodeId::UNSET,
                    modifiers: Modifiers::constant(),
                    var_type: QualifiedName::short("int"),
                    type_span: Span::default(),
                    name: "x".into(),
                    initializer: Some(Expr::Int {
                        value: 1,
                        span: Span::default(),
                    }),
                    span: Span::default(),
                }),
                Decl::Field(VarDecl {
                    id: NodeId::UNSET,
                    modifiers: Modifiers::constant(),
                    var_type: QualifiedName::short("int"),
                    type_span: Span::default(),
                    name: "y".into(),
                    initializer: Some(Expr::VarAccess {
                        id: NodeId::UNSET,
                        name: QualifiedName::short("x"),
                        span: Span::default(),
                    }),
                    span: Span::default(),
                }),
            ],
        }];

        let mut gen = IdGen::new();
        assign_ids(&mut units, &mut gen);

        let mut seen = std::collections::HashSet::new();
        for decl in &units[0].decls {
            let Decl::Field(field) = decl else {
                unreachable!()
            };
            assert_ne!(field.id, NodeId::UNSET);
            assert!(seen.insert(field.id));
            if let Some(Expr::VarAccess { id, .. }) = &field.initializer {
                assert_ne!(*id, NodeId::UNSET);
                assert!(seen.insert(*id));
            }
        }
    }
}
