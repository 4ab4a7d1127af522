//! Reference cycle detection for Runik
//!
//! Builds a directed graph over every variable declaration and function,
//! with an edge wherever one declaration's body or initializer refers to
//! another. Tarjan's algorithm then finds the strongly connected
//! components; any component with more than one member is a reference
//! cycle the compiler cannot fold or expand, and each of its variable and
//! inline-function members gets a diagnostic. A const that reads itself
//! is not a cycle (it just never folds), but an inline function that
//! calls itself is, since splicing its body would never terminate.

use std::collections::HashMap;

use crate::ast::{Block, Decl, Expr, NodeId, Stmt, Unit, VarDecl};
use crate::error::{DiagnosticKind, Diagnostics};
use crate::semantic::eval;
use crate::semantic::frame::Frame;
use crate::semantic::index::Index;
use crate::compiler::command;

use indexmap::{IndexMap, IndexSet};

/// A declaration participating in the reference graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Variable,
    Function,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallGraphNode {
    pub kind: NodeKind,
    pub id: NodeId,
}

impl CallGraphNode {
    pub fn variable(id: NodeId) -> Self {
        Self {
            kind: NodeKind::Variable,
            id,
        }
    }

    pub fn function(id: NodeId) -> Self {
        Self {
            kind: NodeKind::Function,
            id,
        }
    }
}

/// Adjacency lists in insertion order, for deterministic traversal.
pub type CallGraph = IndexMap<CallGraphNode, IndexSet<CallGraphNode>>;

/// Adds one unit's declarations and reference edges to the graph.
pub fn add_unit_to_graph<'a>(unit: &'a Unit, index: &Index<'a>, graph: &mut CallGraph) {
    let mut walker = GraphWalker {
        index,
        frame: Frame::new(),
        graph,
        current: Vec::new(),
    };
    for decl in &unit.decls {
        walker.add_decl(decl);
    }
}

struct GraphWalker<'a, 'x> {
    index: &'x Index<'a>,
    frame: Frame<'a>,
    graph: &'x mut CallGraph,
    /// Stack of declarations whose body or initializer is being walked;
    /// edges leave from the top.
    current: Vec<CallGraphNode>,
}

impl<'a> GraphWalker<'a, '_> {
    fn add_node(&mut self, node: CallGraphNode) {
        self.graph.entry(node).or_default();
    }

    fn add_edge(&mut self, to: CallGraphNode) {
        let from = *self
            .current
            .last()
            .expect("reference outside of any declaration");
        self.add_node(to);
        self.graph.entry(from).or_default().insert(to);
    }

    fn add_decl(&mut self, decl: &'a Decl) {
        match decl {
            Decl::Namespace(ns) => {
                self.frame.push_namespace(&ns.name);
                for inner in &ns.decls {
                    self.add_decl(inner);
                }
                self.frame.pop_namespace();
            }
            Decl::Type(_) => {}
            Decl::Field(field) => self.add_var_decl(field),
            Decl::Function(func) => {
                let node = CallGraphNode::function(func.id);
                self.add_node(node);
                self.current.push(node);
                self.frame.push_block();
                for param in &func.params {
                    self.add_var_decl(param);
                }
                self.add_block(&func.body);
                self.frame.pop_block();
                self.current.pop();
            }
        }
    }

    fn add_var_decl(&mut self, decl: &'a VarDecl) {
        let node = CallGraphNode::variable(decl.id);
        self.add_node(node);
        if self.frame.in_block() {
            // Declared quietly here; duplicates were reported earlier.
            let mut scratch = Diagnostics::new();
            self.frame.declare_local(self.index, decl, &mut scratch);
        }
        if let Some(init) = &decl.initializer {
            self.current.push(node);
            self.add_expr(init);
            self.current.pop();
        }
    }

    fn add_block(&mut self, block: &'a Block) {
        self.frame.push_block();
        for stmt in &block.stmts {
            match stmt {
                Stmt::Block(inner) => self.add_block(inner),
                Stmt::Command(cmd) => {
                    // Wildcard targets count as references too.
                    for name in command::wildcard_names(cmd) {
                        if let Some(target) = self.frame.resolve_variable(self.index, &name) {
                            self.add_edge(CallGraphNode::variable(target.id));
                        }
                    }
                }
                Stmt::Expr(expr_stmt) => self.add_expr(&expr_stmt.expr),
                Stmt::VarDecl(decl) => self.add_var_decl(decl),
            }
        }
        self.frame.pop_block();
    }

    fn add_expr(&mut self, expr: &'a Expr) {
        match expr {
            Expr::Bool { .. } | Expr::Int { .. } | Expr::Str { .. } => {}
            Expr::VarAccess { id, .. } => {
                if let Some(target) = self.index.resolved_target(*id) {
                    self.add_edge(CallGraphNode::variable(target));
                }
            }
            Expr::Call { id, args, .. } => {
                if let Some(target) = self.index.resolved_target(*id) {
                    self.add_edge(CallGraphNode::function(target));
                }
                for arg in args {
                    self.add_expr(arg);
                }
            }
        }
    }
}

/// Tarjan component assignment: every node maps to a component, and a
/// component with more than one member is a cycle.
#[derive(Debug)]
pub struct StronglyConnectedComponents {
    group_of: HashMap<CallGraphNode, usize>,
    group_sizes: Vec<usize>,
}

impl StronglyConnectedComponents {
    /// Whether the node sits in a component with other nodes.
    pub fn in_cycle(&self, node: CallGraphNode) -> bool {
        self.group_of
            .get(&node)
            .map(|group| self.group_sizes[*group] > 1)
            .unwrap_or(false)
    }
}

/// Runs Tarjan's strongly-connected-components algorithm over the graph.
pub fn find_sccs(graph: &CallGraph) -> StronglyConnectedComponents {
    let mut state = TarjanState {
        graph,
        next_index: 0,
        indexes: HashMap::new(),
        lowlinks: HashMap::new(),
        on_stack: IndexSet::new(),
        stack: Vec::new(),
        group_of: HashMap::new(),
        group_sizes: Vec::new(),
    };
    for node in graph.keys() {
        if !state.indexes.contains_key(node) {
            state.connect(*node);
        }
    }
    StronglyConnectedComponents {
        group_of: state.group_of,
        group_sizes: state.group_sizes,
    }
}

struct TarjanState<'g> {
    graph: &'g CallGraph,
    next_index: usize,
    indexes: HashMap<CallGraphNode, usize>,
    lowlinks: HashMap<CallGraphNode, usize>,
    on_stack: IndexSet<CallGraphNode>,
    stack: Vec<CallGraphNode>,
    group_of: HashMap<CallGraphNode, usize>,
    group_sizes: Vec<usize>,
}

impl TarjanState<'_> {
    fn connect(&mut self, node: CallGraphNode) {
        self.indexes.insert(node, self.next_index);
        self.lowlinks.insert(node, self.next_index);
        self.next_index += 1;
        self.stack.push(node);
        self.on_stack.insert(node);

        let successors: Vec<CallGraphNode> = self
            .graph
            .get(&node)
            .into_iter()
            .flatten()
            .copied()
            .collect();
        for next in successors {
            if !self.indexes.contains_key(&next) {
                self.connect(next);
                let low = self.lowlinks[&node].min(self.lowlinks[&next]);
                self.lowlinks.insert(node, low);
            } else if self.on_stack.contains(&next) {
                let low = self.lowlinks[&node].min(self.indexes[&next]);
                self.lowlinks.insert(node, low);
            }
        }

        if self.lowlinks[&node] == self.indexes[&node] {
            let group = self.group_sizes.len();
            let mut size = 0;
            loop {
                let member = self.stack.pop().expect("component stack underflow");
                self.on_stack.swap_remove(&member);
                self.group_of.insert(member, group);
                size += 1;
                if member == node {
                    break;
                }
            }
            self.group_sizes.push(size);
        }
    }
}

/// Reports a diagnostic for every variable and inline function of the
/// unit that sits in a cycle. Non-inline functions may recurse; inline
/// ones may not, even directly into themselves.
pub fn report_cycles(
    unit: &Unit,
    graph: &CallGraph,
    sccs: &StronglyConnectedComponents,
    diags: &mut Diagnostics,
) {
    for decl in &unit.decls {
        report_decl(decl, graph, sccs, diags);
    }
}

fn has_self_edge(graph: &CallGraph, node: CallGraphNode) -> bool {
    graph
        .get(&node)
        .map(|successors| successors.contains(&node))
        .unwrap_or(false)
}

fn report_decl(
    decl: &Decl,
    graph: &CallGraph,
    sccs: &StronglyConnectedComponents,
    diags: &mut Diagnostics,
) {
    match decl {
        Decl::Namespace(ns) => {
            for inner in &ns.decls {
                report_decl(inner, graph, sccs, diags);
            }
        }
        Decl::Type(_) => {}
        Decl::Field(field) => report_var_decl(field, sccs, diags),
        Decl::Function(func) => {
            let node = CallGraphNode::function(func.id);
            if func.modifiers.inline && (sccs.in_cycle(node) || has_self_edge(graph, node)) {
                diags.report(DiagnosticKind::CyclicReference(func.name.clone()), func.span);
            }
            for param in &func.params {
                report_var_decl(param, sccs, diags);
            }
            report_block(&func.body, graph, sccs, diags);
        }
    }
}

fn report_var_decl(decl: &VarDecl, sccs: &StronglyConnectedComponents, diags: &mut Diagnostics) {
    if sccs.in_cycle(CallGraphNode::variable(decl.id)) {
        diags.report(DiagnosticKind::CyclicReference(decl.name.clone()), decl.span);
    }
}

fn report_block(
    block: &Block,
    graph: &CallGraph,
    sccs: &StronglyConnectedComponents,
    diags: &mut Diagnostics,
) {
    for stmt in &block.stmts {
        match stmt {
            Stmt::Block(inner) => report_block(inner, graph, sccs, diags),
            Stmt::VarDecl(decl) => report_var_decl(decl, sccs, diags),
            Stmt::Command(_) | Stmt::Expr(_) => {}
        }
    }
}

/// Folds the value of every acyclic const field into the index, so later
/// command substitution does not have to chase initializer chains.
pub fn fold_constants(index: &mut Index<'_>, sccs: &StronglyConnectedComponents) {
    let mut folded = Vec::new();
    for (_, decl) in index.fields() {
        if !decl.modifiers.is_const {
            continue;
        }
        if sccs.in_cycle(CallGraphNode::variable(decl.id)) {
            continue;
        }
        if index.const_value(decl.id).is_some() {
            continue;
        }
        let Some(init) = &decl.initializer else {
            continue;
        };
        let home = Frame::with_namespaces(index.namespace_of(decl.id).to_vec());
        if let Some(value) = eval::static_evaluate(init, index, &home) {
            folded.push((decl.id, value));
        }
    }
    for (id, value) in folded {
        index.set_const_value(id, value);
    }
}
