//! Syntax tree model and the parser collaborator seam.
//!
//! The engine never parses source text itself. A [`Parser`] collaborator
//! produces a [`SyntaxTree`] over a closed set of node kinds; the walker only
//! needs source-order child iteration and absolute byte offsets, so any
//! concrete grammar maps onto this model.

use crate::span::Span;

/// The closed set of node kinds the walker dispatches on.
///
/// Rules register per-kind callbacks; kinds a rule does not care about fall
/// through to a no-op default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Root of a parsed buffer.
    SourceFile,
    /// A single statement.
    Statement,
    /// A braced block of statements.
    Block,
    /// A function declaration.
    Function,
    /// A call expression.
    Call,
    /// A binary expression.
    BinaryExpr,
    /// An identifier token.
    Identifier,
    /// A numeric literal token.
    NumberLiteral,
    /// A string literal token.
    StringLiteral,
    /// A comment token.
    Comment,
}

/// One node of a syntax tree.
///
/// Children are stored in syntactic left-to-right order; a node with no
/// children is a leaf token. Node text is not stored: the span slices it out
/// of the buffer the tree was parsed from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    kind: NodeKind,
    span: Span,
    children: Vec<Node>,
}

impl Node {
    /// Creates an interior node with children in source order.
    #[must_use]
    pub fn new(kind: NodeKind, span: Span, children: Vec<Node>) -> Self {
        Self {
            kind,
            span,
            children,
        }
    }

    /// Creates a leaf token node.
    #[must_use]
    pub fn leaf(kind: NodeKind, span: Span) -> Self {
        Self::new(kind, span, Vec::new())
    }

    /// The kind of this node.
    #[must_use]
    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// The byte range this node covers in its buffer.
    #[must_use]
    pub fn span(&self) -> Span {
        self.span
    }

    /// Child nodes in syntactic left-to-right order.
    #[must_use]
    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// Returns true if this node is a leaf token.
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Slices this node's text out of the buffer it was parsed from.
    ///
    /// # Panics
    ///
    /// Panics if the span does not lie within `source`; spans are only valid
    /// against the buffer version the tree was parsed from.
    #[must_use]
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.span.start..self.span.end]
    }
}

/// A parsed syntax tree over one buffer version.
#[derive(Debug, Clone)]
pub struct SyntaxTree {
    root: Node,
}

impl SyntaxTree {
    /// Wraps a root node as a tree.
    #[must_use]
    pub fn new(root: Node) -> Self {
        Self { root }
    }

    /// The root node.
    #[must_use]
    pub fn root(&self) -> &Node {
        &self.root
    }
}

/// Error produced by the parser collaborator.
#[derive(Debug, Clone, thiserror::Error)]
#[error("parse error at offset {offset}: {message}")]
pub struct ParseError {
    /// Byte offset where parsing failed.
    pub offset: usize,
    /// Parser-specific description.
    pub message: String,
}

impl ParseError {
    /// Creates a new parse error.
    #[must_use]
    pub fn new(offset: usize, message: impl Into<String>) -> Self {
        Self {
            offset,
            message: message.into(),
        }
    }
}

/// The external parser collaborator.
///
/// A parse is an opaque synchronous call; the session treats a parse failure
/// as fatal for the affected source and never retries it.
pub trait Parser {
    /// Parses one buffer into a syntax tree.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError`] if the text is not syntactically valid.
    fn parse(&self, text: &str) -> Result<SyntaxTree, ParseError>;
}
