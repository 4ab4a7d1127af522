//! The global declaration index for Runik
//!
//! The [`Index`] holds every type, field and function declared across all
//! compilation units, keyed by canonical qualified name. Functions go
//! through a two-phase registration: declarations land in a pending table
//! keyed by the parameter type references as written, and a one-shot
//! promotion pass resolves those references to canonical names and moves
//! the entries into the live table. All derived per-node facts (resolved
//! targets, resolved types, folded constants, emission ids) live here as
//! side tables keyed by [`NodeId`].

use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::ast::{FunctionDecl, NodeId, TypeDecl, VarDecl};
use crate::error::{DiagnosticKind, Diagnostics};
use crate::name::{QualifiedName, BOOL, INT, STRING, VOID};
use crate::semantic::frame::Frame;
use crate::semantic::eval::Value;
use crate::semantic::ids::IdGen;

use indexmap::IndexMap;

/// Identity of a function in the live table: canonical name plus the
/// canonical parameter type sequence. Overloads differ only in the latter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FunctionKey {
    pub name: QualifiedName,
    pub params: Vec<QualifiedName>,
}

impl FunctionKey {
    pub fn new(name: QualifiedName, params: Vec<QualifiedName>) -> Self {
        Self { name, params }
    }
}

impl fmt::Display for FunctionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", param)?;
        }
        write!(f, ")")
    }
}

/// A type table entry. Built-ins have no declaration but still carry a
/// node id so side tables can refer to them uniformly.
#[derive(Debug, Clone, Copy)]
pub enum TypeEntry<'a> {
    Builtin { id: NodeId },
    User(&'a TypeDecl),
}

impl<'a> TypeEntry<'a> {
    pub fn id(&self) -> NodeId {
        match self {
            TypeEntry::Builtin { id } => *id,
            TypeEntry::User(decl) => decl.id,
        }
    }
}

/// A function awaiting parameter type resolution, remembered together
/// with the unit it was declared in for diagnostic attribution.
#[derive(Debug)]
struct Pending<'a> {
    func: &'a FunctionDecl,
    unit: String,
}

/// Cross-unit symbol tables plus per-node side data.
#[derive(Debug)]
pub struct Index<'a> {
    types: IndexMap<QualifiedName, TypeEntry<'a>>,
    fields: IndexMap<QualifiedName, &'a VarDecl>,
    functions: IndexMap<FunctionKey, &'a FunctionDecl>,
    /// Functions declared but not yet promoted, keyed by name and the
    /// parameter types exactly as written.
    pending: IndexMap<FunctionKey, Pending<'a>>,
    functions_by_id: HashMap<NodeId, &'a FunctionDecl>,
    /// Namespace path each declaration lives in, for re-entering its
    /// context during evaluation and type resolution.
    namespaces_of: HashMap<NodeId, Vec<String>>,
    /// Folded constant values of fields and of nothing else.
    const_values: HashMap<NodeId, Value>,
    referenced: HashSet<NodeId>,
    /// Resolution results cached per reference node: the id of the
    /// declaration a variable access or call landed on.
    resolved_targets: HashMap<NodeId, NodeId>,
    /// Canonical type entry id per declaration whose written type
    /// reference has been resolved.
    resolved_types: HashMap<NodeId, NodeId>,
    emission_ids: HashMap<NodeId, String>,
    field_ids: HashSet<NodeId>,
    next_synthetic: u32,
}

impl<'a> Index<'a> {
    /// An index pre-populated with the built-in types.
    pub fn new(gen: &mut IdGen) -> Self {
        let mut index = Self {
            types: IndexMap::new(),
            fields: IndexMap::new(),
            functions: IndexMap::new(),
            pending: IndexMap::new(),
            functions_by_id: HashMap::new(),
            namespaces_of: HashMap::new(),
            const_values: HashMap::new(),
            referenced: HashSet::new(),
            resolved_targets: HashMap::new(),
            resolved_types: HashMap::new(),
            emission_ids: HashMap::new(),
            field_ids: HashSet::new(),
            next_synthetic: 0,
        };
        for builtin in [&*BOOL, &*INT, &*STRING, &*VOID] {
            index
                .types
                .insert(builtin.clone(), TypeEntry::Builtin { id: gen.next_id() });
        }
        index
    }

    /// Registers a type under its canonical name. The first declaration
    /// wins; later ones are reported and dropped.
    pub fn declare_type(
        &mut self,
        namespaces: &[String],
        decl: &'a TypeDecl,
        diags: &mut Diagnostics,
    ) {
        let name = QualifiedName::new(namespaces.to_vec(), &decl.name);
        if self.types.contains_key(&name) {
            diags.report(DiagnosticKind::DuplicateDeclaration(name.to_string()), decl.span);
            return;
        }
        self.namespaces_of.insert(decl.id, namespaces.to_vec());
        self.types.insert(name, TypeEntry::User(decl));
    }

    /// Registers a namespace-level variable. First declaration wins.
    pub fn declare_field(
        &mut self,
        namespaces: &[String],
        decl: &'a VarDecl,
        diags: &mut Diagnostics,
    ) {
        let name = QualifiedName::new(namespaces.to_vec(), &decl.name);
        if self.fields.contains_key(&name) {
            diags.report(DiagnosticKind::DuplicateDeclaration(name.to_string()), decl.span);
            return;
        }
        self.namespaces_of.insert(decl.id, namespaces.to_vec());
        self.field_ids.insert(decl.id);
        self.fields.insert(name, decl);
    }

    /// Registers a function in the pending table, keyed by its parameter
    /// types as written. Duplicates are rejected here, before resolution.
    pub fn declare_function(
        &mut self,
        namespaces: &[String],
        decl: &'a FunctionDecl,
        diags: &mut Diagnostics,
    ) {
        let name = QualifiedName::new(namespaces.to_vec(), &decl.name);
        let raw_params = decl.params.iter().map(|p| p.var_type.clone()).collect();
        let key = FunctionKey::new(name, raw_params);
        if self.pending.contains_key(&key) {
            diags.report(DiagnosticKind::DuplicateDeclaration(key.to_string()), decl.span);
            return;
        }
        self.namespaces_of.insert(decl.id, namespaces.to_vec());
        self.pending.insert(
            key,
            Pending {
                func: decl,
                unit: diags.unit().to_string(),
            },
        );
    }

    /// Promotes every pending function into the live table by resolving
    /// its parameter type references under the function's own namespace.
    /// A function with an unresolvable parameter type is reported and
    /// dropped. Runs once, after all units have been indexed.
    pub fn resolve_pending_functions(&mut self, diags: &mut Diagnostics) {
        let pending = std::mem::take(&mut self.pending);
        for (key, entry) in pending {
            diags.set_unit(&entry.unit);
            let frame = Frame::with_namespaces(key.name.namespaces().to_vec());
            let mut resolved = Vec::with_capacity(entry.func.params.len());
            let mut ok = true;
            for param in &entry.func.params {
                match frame.resolve_type(self, &param.var_type) {
                    Some(canonical) => resolved.push(canonical),
                    None => {
                        diags.report(
                            DiagnosticKind::UnknownType(param.var_type.to_string()),
                            param.type_span,
                        );
                        ok = false;
                        break;
                    }
                }
            }
            if !ok {
                continue;
            }
            self.functions_by_id.insert(entry.func.id, entry.func);
            self.functions
                .insert(FunctionKey::new(key.name, resolved), entry.func);
        }
    }

    pub fn type_def(&self, name: &QualifiedName) -> Option<&TypeEntry<'a>> {
        self.types.get(name)
    }

    pub fn field_def(&self, name: &QualifiedName) -> Option<&'a VarDecl> {
        self.fields.get(name).copied()
    }

    pub fn function(&self, key: &FunctionKey) -> Option<&'a FunctionDecl> {
        self.functions.get(key).copied()
    }

    pub fn function_by_id(&self, id: NodeId) -> Option<&'a FunctionDecl> {
        self.functions_by_id.get(&id).copied()
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = (&QualifiedName, &'a VarDecl)> {
        self.fields.iter().map(|(name, decl)| (name, *decl))
    }

    pub fn namespace_of(&self, id: NodeId) -> &[String] {
        self.namespaces_of.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_field(&self, id: NodeId) -> bool {
        self.field_ids.contains(&id)
    }

    pub fn mark_referenced(&mut self, id: NodeId) {
        self.referenced.insert(id);
    }

    /// Whether any resolved reference landed on this declaration.
    pub fn is_referenced(&self, id: NodeId) -> bool {
        self.referenced.contains(&id)
    }

    pub fn set_resolved_target(&mut self, reference: NodeId, target: NodeId) {
        self.resolved_targets.insert(reference, target);
    }

    pub fn resolved_target(&self, reference: NodeId) -> Option<NodeId> {
        self.resolved_targets.get(&reference).copied()
    }

    pub fn set_resolved_type(&mut self, decl: NodeId, type_id: NodeId) {
        self.resolved_types.insert(decl, type_id);
    }

    pub fn resolved_type(&self, decl: NodeId) -> Option<NodeId> {
        self.resolved_types.get(&decl).copied()
    }

    pub fn set_const_value(&mut self, decl: NodeId, value: Value) {
        self.const_values.insert(decl, value);
    }

    pub fn const_value(&self, decl: NodeId) -> Option<&Value> {
        self.const_values.get(&decl)
    }

    /// The stable identifier a function's command list is emitted under.
    /// Zero-parameter functions use their namespace path joined with `/`;
    /// parameterized ones get a synthetic counter-suffixed id since one
    /// declaration can expand to many bodies.
    pub fn emission_id(&mut self, func: &'a FunctionDecl) -> String {
        if let Some(existing) = self.emission_ids.get(&func.id) {
            return existing.clone();
        }
        let id = if func.params.is_empty() {
            let namespaces = self.namespace_of(func.id);
            if namespaces.is_empty() {
                func.name.clone()
            } else {
                format!("{}/{}", namespaces.join("/"), func.name)
            }
        } else {
            let id = format!("{}${}", func.name, self.next_synthetic);
            self.next_synthetic += 1;
            id
        };
        self.emission_ids.insert(func.id, id.clone());
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Block, Modifiers, Span};

    fn field(name: &str) -> VarDecl {
        VarDecl {
            id: NodeId::UNSET,
            modifiers: Modifiers::constant(),
            var_type: QualifiedName::short("int"),
            type_span: Span::default(),
            name: name.into(),
            initializer: None,
            span: Span::default(),
        }
    }

    fn function(name: &str, params: Vec<VarDecl>) -> FunctionDecl {
        FunctionDecl {
            id: NodeId::UNSET,
            modifiers: Modifiers::inline(),
            return_type: QualifiedName::short("void"),
            return_type_span: Span::default(),
            name: name.into(),
            params,
            body: Block {
                stmts: Vec::new(),
                span: Span::default(),
            },
            span: Span::default(),
        }
    }

    #[test]
    fn test_builtins_resolve_unqualified() {
        let index = Index::new(&mut IdGen::new());
        assert!(index.type_def(&QualifiedName::short("int")).is_some());
        assert!(index.type_def(&QualifiedName::short("void")).is_some());
        assert!(index.type_def(&QualifiedName::short("float")).is_none());
    }

    #[test]
    fn test_duplicate_field_keeps_first() {
        let mut gen = IdGen::new();
        let mut first = field("x");
        first.id = gen.next_id();
        let mut second = field("x");
        second.id = gen.next_id();
        let mut index = Index::new(&mut gen);
        let mut diags = Diagnostics::new();

        index.declare_field(&["a".into()], &first, &mut diags);
        index.declare_field(&["a".into()], &second, &mut diags);

        assert_eq!(diags.len(), 1);
        let kept = index
            .field_def(&QualifiedName::new(vec!["a".into()], "x"))
            .unwrap();
        assert_eq!(kept.id, first.id);
    }

    #[test]
    fn test_pending_promotion_resolves_param_types() {
        let mut gen = IdGen::new();
        let mut func = function("f", vec![field("p")]);
        func.id = gen.next_id();
        let mut index = Index::new(&mut gen);
        let mut diags = Diagnostics::new();

        index.declare_function(&[], &func, &mut diags);
        // Not callable until promotion runs
        let key = FunctionKey::new(
            QualifiedName::short("f"),
            vec![QualifiedName::short("int")],
        );
        assert!(index.function(&key).is_none());

        index.resolve_pending_functions(&mut diags);
        assert!(diags.is_empty());
        assert!(index.function(&key).is_some());
        assert!(index.function_by_id(func.id).is_some());
    }

    #[test]
    fn test_unknown_param_type_drops_function() {
        let mut gen = IdGen::new();
        let mut param = field("p");
        param.var_type = QualifiedName::short("mystery");
        let mut func = function("f", vec![param]);
        func.id = gen.next_id();
        let mut index = Index::new(&mut gen);
        let mut diags = Diagnostics::new();

        index.declare_function(&[], &func, &mut diags);
        index.resolve_pending_functions(&mut diags);

        assert_eq!(diags.len(), 1);
        assert!(index.function_by_id(func.id).is_none());
    }

    #[test]
    fn test_emission_ids() {
        let mut gen = IdGen::new();
        let mut plain = function("g", Vec::new());
        plain.id = gen.next_id();
        let mut with_params = function("h", vec![field("p")]);
        with_params.id = gen.next_id();
        let mut index = Index::new(&mut gen);
        let mut diags = Diagnostics::new();

        index.declare_function(&["n".into()], &plain, &mut diags);
        index.declare_function(&[], &with_params, &mut diags);

        assert_eq!(index.emission_id(&plain), "n/g");
        assert_eq!(index.emission_id(&plain), "n/g");
        assert_eq!(index.emission_id(&with_params), "h$0");
    }
}
