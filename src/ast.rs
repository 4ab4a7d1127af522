//! Abstract Syntax Tree definitions for Runik
//!
//! The parser (an external collaborator) builds these nodes; everything in
//! this crate consumes them. Declaration and reference nodes carry a
//! `NodeId` slot which starts out [`NodeId::UNSET`] and is stamped by the
//! id-assignment pass before any analysis runs.

use crate::name::QualifiedName;

/// Stable numeric identity for a declaration or reference node.
///
/// Side tables on the index are keyed by this id, never by node identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct NodeId(pub u32);

impl NodeId {
    /// The id of a node the id-assignment pass has not visited.
    pub const UNSET: NodeId = NodeId(0);
}

/// Source range of a node, 1-based lines and columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start_line: u32,
    pub start_col: u32,
    pub end_line: u32,
    pub end_col: u32,
}

impl Span {
    pub fn new(start_line: u32, start_col: u32, end_line: u32, end_col: u32) -> Self {
        Self {
            start_line,
            start_col,
            end_line,
            end_col,
        }
    }
}

/// Declaration modifiers. Which ones are legal depends on the declaration
/// kind; the pre-index check enforces that.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    /// `inline` - the function body is spliced into each call site instead
    /// of being emitted as a target of its own.
    pub inline: bool,
    /// `const` - the variable must have an initializer and never changes,
    /// making it usable in wildcard substitution.
    pub is_const: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        inline: false,
        is_const: false,
    };

    pub fn inline() -> Self {
        Modifiers {
            inline: true,
            is_const: false,
        }
    }

    pub fn constant() -> Self {
        Modifiers {
            inline: false,
            is_const: true,
        }
    }
}

/// One source unit (file). The pipeline walks every unit's declarations.
#[derive(Debug, Clone)]
pub struct Unit {
    /// Display name of the unit, used to attribute diagnostics.
    pub name: String,
    pub decls: Vec<Decl>,
}

/// Top-level and namespace-level declarations.
#[derive(Debug, Clone)]
pub enum Decl {
    Namespace(NamespaceDecl),
    Type(TypeDecl),
    Field(VarDecl),
    Function(FunctionDecl),
}

impl Decl {
    pub fn span(&self) -> Span {
        match self {
            Decl::Namespace(decl) => decl.span,
            Decl::Type(decl) => decl.span,
            Decl::Field(decl) => decl.span,
            Decl::Function(decl) => decl.span,
        }
    }
}

/// `namespace name { ... }` - contributes a segment to the namespace path
/// of everything declared inside it.
#[derive(Debug, Clone)]
pub struct NamespaceDecl {
    pub name: String,
    pub decls: Vec<Decl>,
    pub span: Span,
}

/// A nominal type definition. Name only; types have no structure yet.
#[derive(Debug, Clone)]
pub struct TypeDecl {
    pub id: NodeId,
    pub modifiers: Modifiers,
    pub name: String,
    pub span: Span,
}

/// A variable declaration: a global field when it appears at namespace
/// level, a local (or parameter) when it appears inside a block.
#[derive(Debug, Clone)]
pub struct VarDecl {
    pub id: NodeId,
    pub modifiers: Modifiers,
    /// Possibly-relative reference to the declared type.
    pub var_type: QualifiedName,
    pub type_span: Span,
    pub name: String,
    pub initializer: Option<Expr>,
    pub span: Span,
}

/// A function declaration.
#[derive(Debug, Clone)]
pub struct FunctionDecl {
    pub id: NodeId,
    pub modifiers: Modifiers,
    /// Possibly-relative reference to the return type.
    pub return_type: QualifiedName,
    pub return_type_span: Span,
    pub name: String,
    pub params: Vec<VarDecl>,
    pub body: Block,
    pub span: Span,
}

/// A `{ ... }` block; opens a lexical scope.
#[derive(Debug, Clone)]
pub struct Block {
    pub stmts: Vec<Stmt>,
    pub span: Span,
}

/// Statement types
#[derive(Debug, Clone)]
pub enum Stmt {
    Block(Block),
    Command(CommandStmt),
    Expr(ExprStmt),
    VarDecl(VarDecl),
}

impl Stmt {
    pub fn span(&self) -> Span {
        match self {
            Stmt::Block(block) => block.span,
            Stmt::Command(stmt) => stmt.span,
            Stmt::Expr(stmt) => stmt.span,
            Stmt::VarDecl(decl) => decl.span,
        }
    }
}

/// A raw command: `/say hello %ns::x%`. The text is everything after the
/// slash; wildcards inside it are resolved at emission time.
#[derive(Debug, Clone)]
pub struct CommandStmt {
    pub text: String,
    pub span: Span,
}

/// An expression used as a statement. Only function calls are legal here;
/// the pre-index check rejects the rest.
#[derive(Debug, Clone)]
pub struct ExprStmt {
    pub expr: Expr,
    pub span: Span,
}

/// Expression types
#[derive(Debug, Clone)]
pub enum Expr {
    /// Boolean literal
    Bool { value: bool, span: Span },

    /// Integer literal
    Int { value: i64, span: Span },

    /// String literal
    Str { value: String, span: Span },

    /// Variable read: `x` or `ns::x`
    VarAccess {
        id: NodeId,
        name: QualifiedName,
        span: Span,
    },

    /// Function call: `f(args)` or `ns::f(args)`
    Call {
        id: NodeId,
        name: QualifiedName,
        args: Vec<Expr>,
        span: Span,
    },
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::Bool { span, .. } => *span,
            Expr::Int { span, .. } => *span,
            Expr::Str { span, .. } => *span,
            Expr::VarAccess { span, .. } => *span,
            Expr::Call { span, .. } => *span,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unset_id_is_default() {
        assert_eq!(NodeId::default(), NodeId::UNSET);
    }

    #[test]
    fn test_modifier_helpers() {
        assert!(Modifiers::inline().inline);
        assert!(!Modifiers::inline().is_const);
        assert!(Modifiers::constant().is_const);
        assert_eq!(Modifiers::default(), Modifiers::NONE);
    }
}
