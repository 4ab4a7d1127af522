//! Declaration indexing for Runik
//!
//! First real pass over a unit: walks its declaration tree, registers
//! types, fields and functions in the [`Index`], and declares locals along
//! the way so duplicate locals are caught here too. Function registrations
//! land in the pending table; promotion happens once all units are in.

use crate::ast::{Block, Decl, Stmt, Unit};
use crate::error::Diagnostics;
use crate::semantic::frame::Frame;
use crate::semantic::index::Index;

/// Indexes every declaration in a unit.
pub fn index_unit<'a>(unit: &'a Unit, index: &mut Index<'a>, diags: &mut Diagnostics) {
    let mut frame = Frame::new();
    for decl in &unit.decls {
        index_decl(decl, index, &mut frame, diags);
    }
}

fn index_decl<'a>(
    decl: &'a Decl,
    index: &mut Index<'a>,
    frame: &mut Frame<'a>,
    diags: &mut Diagnostics,
) {
    match decl {
        Decl::Namespace(ns) => {
            frame.push_namespace(&ns.name);
            for inner in &ns.decls {
                index_decl(inner, index, frame, diags);
            }
            frame.pop_namespace();
        }
        Decl::Type(type_decl) => {
            index.declare_type(frame.namespaces(), type_decl, diags);
        }
        Decl::Field(field) => {
            index.declare_field(frame.namespaces(), field, diags);
        }
        Decl::Function(func) => {
            index.declare_function(frame.namespaces(), func, diags);
            frame.push_block();
            for param in &func.params {
                frame.declare_local(index, param, diags);
            }
            index_block(&func.body, index, frame, diags);
            frame.pop_block();
        }
    }
}

fn index_block<'a>(
    block: &'a Block,
    index: &mut Index<'a>,
    frame: &mut Frame<'a>,
    diags: &mut Diagnostics,
) {
    frame.push_block();
    for stmt in &block.stmts {
        match stmt {
            Stmt::Block(inner) => index_block(inner, index, frame, diags),
            Stmt::VarDecl(decl) => frame.declare_local(index, decl, diags),
            Stmt::Command(_) | Stmt::Expr(_) => {}
        }
    }
    frame.pop_block();
}
