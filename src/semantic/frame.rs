//! Resolution frames for Runik
//!
//! A [`Frame`] pairs the namespace-prefix stack of the current traversal
//! position with a lexical block stack holding local variables. It performs
//! the fallback name search: a relative name is tried with the full current
//! prefix first, then with the innermost prefix segment dropped, and so on
//! down to the bare name, so the innermost enclosing namespace wins.
//! Segments the reference itself spells are never dropped.

use crate::ast::VarDecl;
use crate::error::{DiagnosticKind, Diagnostics};
use crate::name::QualifiedName;
use crate::semantic::eval::{self, Value};
use crate::semantic::index::{FunctionKey, Index};

use indexmap::IndexMap;

/// A local variable bound in a block, with its folded constant if it has
/// one. The constant is seeded from the initializer at declaration time and
/// may be overwritten when the local is an inline-expanded parameter.
#[derive(Debug, Clone)]
pub struct Local<'a> {
    pub decl: &'a VarDecl,
    pub const_value: Option<Value>,
}

/// Namespace stack plus block stack; pushed and popped in lockstep with
/// namespace, function and block entry/exit during every walk.
#[derive(Debug, Default)]
pub struct Frame<'a> {
    /// Current namespace path, outermost first.
    namespaces: Vec<String>,
    /// Lexical blocks, innermost last.
    blocks: Vec<IndexMap<String, Local<'a>>>,
}

impl<'a> Frame<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// A frame positioned inside the given namespace path, with no open
    /// blocks. Used to re-enter a declaration's own context.
    pub fn with_namespaces(namespaces: Vec<String>) -> Self {
        Self {
            namespaces,
            blocks: Vec::new(),
        }
    }

    pub fn namespaces(&self) -> &[String] {
        &self.namespaces
    }

    pub fn push_namespace(&mut self, name: &str) {
        self.namespaces.push(name.to_string());
    }

    pub fn pop_namespace(&mut self) {
        self.namespaces.pop();
    }

    pub fn push_block(&mut self) {
        self.blocks.push(IndexMap::new());
    }

    pub fn pop_block(&mut self) {
        self.blocks.pop();
    }

    pub fn in_block(&self) -> bool {
        !self.blocks.is_empty()
    }

    /// Declares a local in the innermost block. Shadowing across nested
    /// blocks is legal; redeclaring within the same block is not. A const
    /// local's initializer is folded immediately, best-effort.
    pub fn declare_local(
        &mut self,
        index: &Index<'a>,
        decl: &'a VarDecl,
        diags: &mut Diagnostics,
    ) {
        let block = self
            .blocks
            .last_mut()
            .expect("local declared outside of any block");
        if block.contains_key(&decl.name) {
            diags.report(DiagnosticKind::DuplicateLocal(decl.name.clone()), decl.span);
            return;
        }
        block.insert(
            decl.name.clone(),
            Local {
                decl,
                const_value: None,
            },
        );
        if decl.modifiers.is_const {
            if let Some(init) = &decl.initializer {
                if let Some(value) = eval::static_evaluate(init, index, self) {
                    self.set_const_local(&decl.name, value);
                }
            }
        }
    }

    /// Overwrites the folded constant of a bound local; used when binding
    /// inline-expanded parameters to evaluated arguments.
    pub fn set_const_local(&mut self, name: &str, value: Value) {
        for block in self.blocks.iter_mut().rev() {
            if let Some(local) = block.get_mut(name) {
                local.const_value = Some(value);
                return;
            }
        }
    }

    /// Looks a name up in the local blocks, innermost first.
    pub fn lookup_local(&self, name: &str) -> Option<&Local<'a>> {
        self.blocks.iter().rev().find_map(|block| block.get(name))
    }

    /// Fallback search: candidate = current prefix ++ relative path ++
    /// name; on failure drop the innermost prefix segment and retry, down
    /// to the bare relative name. The innermost enclosing namespace wins.
    pub fn resolve(
        &self,
        relative: &QualifiedName,
        exists: impl Fn(&QualifiedName) -> bool,
    ) -> Option<QualifiedName> {
        let mut prefix = self.namespaces.clone();
        loop {
            let mut segments = prefix.clone();
            segments.extend(relative.namespaces().iter().cloned());
            let candidate = QualifiedName::new(segments, relative.name());
            if exists(&candidate) {
                return Some(candidate);
            }
            prefix.pop()?;
        }
    }

    /// Type lookup. An unqualified name is tried verbatim against the
    /// table first, so built-ins bypass the namespace search. Fields and
    /// functions get no such shortcut.
    pub fn resolve_type(&self, index: &Index<'a>, relative: &QualifiedName) -> Option<QualifiedName> {
        if relative.is_unqualified() && index.type_def(relative).is_some() {
            return Some(relative.clone());
        }
        self.resolve(relative, |candidate| index.type_def(candidate).is_some())
    }

    pub fn resolve_field(
        &self,
        index: &Index<'a>,
        relative: &QualifiedName,
    ) -> Option<QualifiedName> {
        self.resolve(relative, |candidate| index.field_def(candidate).is_some())
    }

    /// Resolves a call target by name and already-canonical parameter
    /// types, returning the key of the live function table entry.
    pub fn resolve_function(
        &self,
        index: &Index<'a>,
        name: &QualifiedName,
        params: &[QualifiedName],
    ) -> Option<FunctionKey> {
        let resolved = self.resolve(name, |candidate| {
            index
                .function(&FunctionKey::new(candidate.clone(), params.to_vec()))
                .is_some()
        })?;
        Some(FunctionKey::new(resolved, params.to_vec()))
    }

    /// Resolves a variable reference: an unqualified name searches the
    /// local blocks innermost-first before falling back to fields.
    pub fn resolve_variable(
        &self,
        index: &Index<'a>,
        relative: &QualifiedName,
    ) -> Option<&'a VarDecl> {
        if relative.is_unqualified() {
            if let Some(local) = self.lookup_local(relative.name()) {
                return Some(local.decl);
            }
        }
        let resolved = self.resolve_field(index, relative)?;
        index.field_def(&resolved)
    }

    /// The folded constant of the referenced variable, if it has one.
    pub fn static_evaluate_variable(
        &self,
        index: &Index<'a>,
        relative: &QualifiedName,
    ) -> Option<Value> {
        eval::evaluate_variable(relative, index, self, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Modifiers, Span};

    fn local(name: &str) -> VarDecl {
        VarDecl {
            id: Default::default(),
            modifiers: Modifiers::constant(),
            var_type: QualifiedName::short("int"),
            type_span: Span::default(),
            name: name.into(),
            initializer: None,
            span: Span::default(),
        }
    }

    #[test]
    fn test_duplicate_local_innermost_block_only() {
        let index = Index::new(&mut crate::semantic::ids::IdGen::new());
        let outer = local("x");
        let inner = local("x");

        let mut frame = Frame::new();
        let mut diags = Diagnostics::new();
        frame.push_block();
        frame.declare_local(&index, &outer, &mut diags);
        assert!(diags.is_empty());

        // Shadowing in a nested block is legal
        frame.push_block();
        frame.declare_local(&index, &inner, &mut diags);
        assert!(diags.is_empty());

        // Redeclaring in the same block is not
        frame.declare_local(&index, &inner, &mut diags);
        assert_eq!(diags.len(), 1);
    }

    #[test]
    fn test_lookup_local_innermost_first() {
        let index = Index::new(&mut crate::semantic::ids::IdGen::new());
        let mut outer = local("x");
        outer.initializer = Some(crate::ast::Expr::Int {
            value: 1,
            span: Span::default(),
        });
        let mut inner = local("x");
        inner.initializer = Some(crate::ast::Expr::Int {
            value: 2,
            span: Span::default(),
        });

        let mut frame = Frame::new();
        let mut diags = Diagnostics::new();
        frame.push_block();
        frame.declare_local(&index, &outer, &mut diags);
        frame.push_block();
        frame.declare_local(&index, &inner, &mut diags);

        let found = frame.lookup_local("x").unwrap();
        assert_eq!(found.const_value, Some(Value::Int(2)));

        frame.pop_block();
        let found = frame.lookup_local("x").unwrap();
        assert_eq!(found.const_value, Some(Value::Int(1)));
    }

    #[test]
    fn test_resolve_determinism() {
        let frame = Frame::with_namespaces(vec!["a".into(), "b".into()]);
        let exists = |candidate: &QualifiedName| {
            *candidate == QualifiedName::new(vec!["a".into()], "x")
        };
        let first = frame.resolve(&QualifiedName::short("x"), exists);
        let second = frame.resolve(&QualifiedName::short("x"), exists);
        assert_eq!(first, second);
        assert_eq!(first, Some(QualifiedName::new(vec!["a".into()], "x")));
    }

    #[test]
    fn test_resolve_prefers_enclosing_namespace_over_root() {
        // x exists both at root and in a; from inside a, a::x wins.
        let frame = Frame::with_namespaces(vec!["a".into()]);
        let inner = QualifiedName::new(vec!["a".into()], "x");
        let exists =
            |candidate: &QualifiedName| *candidate == inner || *candidate == QualifiedName::short("x");
        assert_eq!(frame.resolve(&QualifiedName::short("x"), exists), Some(inner.clone()));
    }

    #[test]
    fn test_resolve_never_drops_spelled_segments() {
        let frame = Frame::with_namespaces(vec!["a".into()]);
        // Reference is `c::x`; `x` alone exists but must not be found.
        let exists = |candidate: &QualifiedName| *candidate == QualifiedName::short("x");
        assert_eq!(
            frame.resolve(&QualifiedName::new(vec!["c".into()], "x"), exists),
            None
        );
    }
}
