use std::sync::Arc;

use miette::SourceSpan;

use crate::registry::{Function, Operator};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Smallest span covering both.
    pub fn union(self, other: Span) -> Self {
        Self {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

impl From<Span> for SourceSpan {
    fn from(span: Span) -> Self {
        (span.start..span.end).into()
    }
}

#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum TokenKind {
    Constant(f64),
    Variable(usize), // NOTE: Index into the owning expression's slot array.
    Operator(Arc<Operator>),
    Function(Arc<Function>),
    Left,
    Right,
    Separator,
}

/// Grammar class of a token. Variables are constants as far as the grammar
/// is concerned.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TokenClass {
    Constant,
    Operator,
    Function,
    Left,
    Right,
    Separator,
}

impl TokenKind {
    pub fn class(&self) -> TokenClass {
        match self {
            TokenKind::Constant(_) | TokenKind::Variable(_) => TokenClass::Constant,
            TokenKind::Operator(_) => TokenClass::Operator,
            TokenKind::Function(_) => TokenClass::Function,
            TokenKind::Left => TokenClass::Left,
            TokenKind::Right => TokenClass::Right,
            TokenKind::Separator => TokenClass::Separator,
        }
    }

    pub fn is(&self, class: TokenClass) -> bool {
        self.class() == class
    }
}

impl Token {
    pub fn class(&self) -> TokenClass {
        self.kind.class()
    }

    /// The text this token was read from.
    pub fn text<'source>(&self, source: &'source str) -> &'source str {
        &source[self.span.start..self.span.end]
    }
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenKind::Constant(value) => write!(f, "Constant({value})"),
            TokenKind::Variable(index) => write!(f, "Variable(#{index})"),
            TokenKind::Operator(op) => write!(f, "Operator({})", op.symbol),
            TokenKind::Function(function) => {
                write!(f, "Function({}/{})", function.name, function.arity)
            }
            TokenKind::Left => write!(f, "Left"),
            TokenKind::Right => write!(f, "Right"),
            TokenKind::Separator => write!(f, "Separator"),
        }
    }
}
