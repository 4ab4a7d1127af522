//! Runik compiler core
//!
//! Compiles Runik source units into per-function command lists. The crate
//! takes already-parsed units, runs the semantic passes over all of them
//! together so cross-unit references work, and generates one list of raw
//! command lines per non-inline function.
//!
//! The pipeline is gated: indexing, resolution, cycle detection and
//! generation each run over every unit, and any diagnostics reported in a
//! phase stop the phases after it. A failed compilation yields the
//! collected diagnostics and no command lists.

pub mod ast;
pub mod compiler;
pub mod error;
pub mod name;
pub mod semantic;

use std::collections::BTreeMap;

use tracing::debug;

use crate::ast::Unit;
pub use crate::error::{Diagnostic, DiagnosticKind};
pub use crate::name::QualifiedName;
pub use crate::semantic::{Frame, Index, Value};

use crate::error::Diagnostics;
use crate::semantic::ids::{self, IdGen};
use crate::semantic::{callgraph, indexer, post_index, pre_index};

/// The outcome of compiling a set of units: either the command lists, or
/// the diagnostics explaining why there are none.
#[derive(Debug)]
pub struct Compilation {
    /// Raw command lines per emission id, in deterministic order. Empty
    /// when compilation failed.
    pub command_lists: BTreeMap<String, Vec<String>>,
    pub diagnostics: Vec<Diagnostic>,
}

impl Compilation {
    pub fn succeeded(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

/// Compiles all units together. Declarations in one unit are visible from
/// every other, regardless of order.
pub fn compile_units(units: &mut [Unit]) -> Compilation {
    let mut gen = IdGen::new();
    ids::assign_ids(units, &mut gen);

    let mut diags = Diagnostics::new();
    let failed = |diags: Diagnostics| Compilation {
        command_lists: BTreeMap::new(),
        diagnostics: diags.into_vec(),
    };

    debug!(units = units.len(), "checking structure");
    for unit in units.iter() {
        diags.set_unit(&unit.name);
        pre_index::check_unit(unit, &mut diags);
    }
    if !diags.is_empty() {
        return failed(diags);
    }

    debug!("indexing declarations");
    let mut index = Index::new(&mut gen);
    for unit in units.iter() {
        diags.set_unit(&unit.name);
        indexer::index_unit(unit, &mut index, &mut diags);
    }
    index.resolve_pending_functions(&mut diags);
    if !diags.is_empty() {
        return failed(diags);
    }

    debug!("resolving references");
    for unit in units.iter() {
        diags.set_unit(&unit.name);
        post_index::check_unit(unit, &mut index, &mut diags);
    }
    if !diags.is_empty() {
        return failed(diags);
    }

    debug!("detecting reference cycles");
    let mut graph = callgraph::CallGraph::new();
    for unit in units.iter() {
        callgraph::add_unit_to_graph(unit, &index, &mut graph);
    }
    let sccs = callgraph::find_sccs(&graph);
    for unit in units.iter() {
        diags.set_unit(&unit.name);
        callgraph::report_cycles(unit, &graph, &sccs, &mut diags);
    }
    if !diags.is_empty() {
        return failed(diags);
    }
    callgraph::fold_constants(&mut index, &sccs);

    debug!("generating command lists");
    let mut command_lists = BTreeMap::new();
    for unit in units.iter() {
        diags.set_unit(&unit.name);
        compiler::generate_unit(unit, &mut index, &mut command_lists, &mut diags);
    }
    if !diags.is_empty() {
        return failed(diags);
    }

    Compilation {
        command_lists,
        diagnostics: Vec::new(),
    }
}
