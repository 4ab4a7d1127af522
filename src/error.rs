//! Runik diagnostics
//!
//! Diagnostics are data: every analysis phase appends to a [`Diagnostics`]
//! sink and keeps walking, so a phase reports all the violations it can
//! find, not just the first. Pretty-printing is an external collaborator;
//! the `Display` impls here are plain one-liners.

use std::fmt;

use thiserror::Error;

use crate::ast::Span;

/// The category and message of a semantic diagnostic.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DiagnosticKind {
    #[error("duplicate declaration: {0}")]
    DuplicateDeclaration(String),
    #[error("duplicate local variable: {0}")]
    DuplicateLocal(String),
    #[error("invalid modifiers on {0}")]
    InvalidModifier(&'static str),
    #[error("{0}")]
    UnsupportedConstruct(&'static str),
    #[error("unknown type: {0}")]
    UnknownType(String),
    #[error("undefined function: {0}")]
    UndefinedFunction(String),
    #[error("undefined variable: {0}")]
    UndefinedVariable(String),
    #[error("cannot pass void to a function")]
    VoidArgument,
    #[error("unclosed variable reference in command")]
    UnclosedWildcard,
    #[error("invalid variable reference in command")]
    InvalidWildcard,
    #[error("unrecognized variable: {0}")]
    UnrecognizedVariable(String),
    #[error("cannot statically evaluate that expression")]
    CannotStaticallyEvaluate,
    #[error("cyclic variable/inline function references: {0}")]
    CyclicReference(String),
}

/// One compiler diagnostic.
///
/// Syntax records come from the external parser (expected token-sequence
/// alternatives at a span); everything this crate produces is a semantic
/// record.
#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    Semantic {
        unit: String,
        kind: DiagnosticKind,
        span: Span,
    },
    Syntax {
        unit: String,
        found: String,
        /// Each alternative is one expected token sequence.
        expected: Vec<Vec<String>>,
        span: Span,
    },
}

impl Diagnostic {
    pub fn unit(&self) -> &str {
        match self {
            Diagnostic::Semantic { unit, .. } => unit,
            Diagnostic::Syntax { unit, .. } => unit,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Diagnostic::Semantic { span, .. } => *span,
            Diagnostic::Syntax { span, .. } => *span,
        }
    }

    /// The semantic category, if this is a semantic record.
    pub fn kind(&self) -> Option<&DiagnosticKind> {
        match self {
            Diagnostic::Semantic { kind, .. } => Some(kind),
            Diagnostic::Syntax { .. } => None,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::Semantic { unit, kind, span } => {
                write!(
                    f,
                    "{}:{}:{}: {}",
                    unit, span.start_line, span.start_col, kind
                )
            }
            Diagnostic::Syntax {
                unit, found, span, ..
            } => {
                write!(
                    f,
                    "{}:{}:{}: unexpected token \"{}\"",
                    unit, span.start_line, span.start_col, found
                )
            }
        }
    }
}

/// Accumulator the phases append to.
///
/// The pipeline sets the current unit name before walking each root, so
/// callers of [`Diagnostics::report`] never carry it around themselves.
#[derive(Debug, Default)]
pub struct Diagnostics {
    unit: String,
    diags: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the unit that subsequent reports are attributed to.
    pub fn set_unit(&mut self, unit: &str) {
        self.unit = unit.to_string();
    }

    /// The unit reports are currently attributed to.
    pub fn unit(&self) -> &str {
        &self.unit
    }

    pub fn report(&mut self, kind: DiagnosticKind, span: Span) {
        self.diags.push(Diagnostic::Semantic {
            unit: self.unit.clone(),
            kind,
            span,
        });
    }

    pub fn push(&mut self, diag: Diagnostic) {
        self.diags.push(diag);
    }

    pub fn len(&self) -> usize {
        self.diags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diags.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diags.iter()
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.diags
    }
}
