//! Error types for document construction, templating, and rendering

use std::fmt;

use thiserror::Error;

use crate::node::NodeId;

/// Structural mutation and symbol registration failures.
///
/// These are raised eagerly, before any rendering takes place.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    /// Attempted to attach a node that already has a parent
    #[error("node {node} is already attached to a parent")]
    AlreadyAttached {
        /// The node that could not be attached
        node: NodeId,
    },

    /// Attempted to attach a node inside its own subtree
    #[error("attaching node {node} here would create a cycle")]
    WouldCycle {
        /// The node that could not be attached
        node: NodeId,
    },

    /// Attempted to remove a node that is not a direct child
    #[error("node {node} is not a child of {list}")]
    NotAChild {
        /// The node that was not found
        node: NodeId,
        /// The list it was expected in
        list: NodeId,
    },

    /// A list operation targeted a node with no children
    #[error("node {node} is not a list-like node")]
    NotAList {
        /// The offending node
        node: NodeId,
    },

    /// A symbol registration targeted a node that is not a scope
    #[error("node {node} is not a symbol scope")]
    NotAScope {
        /// The offending node
        node: NodeId,
    },

    /// Two symbols with the same name were registered in one scope
    #[error("symbol '{name}' is already registered in this scope")]
    DuplicateSymbol {
        /// The conflicting name
        name: String,
    },

    /// A symbol was registered into a second scope
    #[error("symbol '{name}' already belongs to a scope")]
    SymbolAlreadyRegistered {
        /// The symbol's name
        name: String,
    },
}

/// Placeholder-syntax failures in template text.
///
/// Template text is parsed at render time, so these surface through the
/// renderer with a populated caller trace.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    /// `${` with no closing `}`
    #[error("unterminated placeholder starting at byte {at}")]
    UnterminatedPlaceholder {
        /// Byte offset of the opening `$`
        at: usize,
    },

    /// `${}`
    #[error("empty placeholder at byte {at}")]
    EmptyPlaceholder {
        /// Byte offset of the opening `$`
        at: usize,
    },

    /// A placeholder name that is not an identifier
    #[error("invalid placeholder name '{name}' at byte {at}")]
    InvalidPlaceholderName {
        /// The offending name
        name: String,
        /// Byte offset of the opening `$`
        at: usize,
    },
}

/// Render-time failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// A `${name}` reference with no declaring scope in reach
    #[error("unresolved symbol '{name}'")]
    UnresolvedSymbol {
        /// The unresolved name
        name: String,
    },

    /// A symbol's definition transitively depends on itself
    #[error("cyclic symbol dependency: {}", .path.join(" -> "))]
    CyclicDependency {
        /// Symbol names along the cycle, first occurrence to the repeat
        path: Vec<String>,
    },

    /// The render recursion exceeded the configured limit
    #[error("render depth {depth} exceeds the configured maximum {max}")]
    DepthExceeded {
        /// Depth reached
        depth: usize,
        /// Configured limit
        max: usize,
    },

    /// A template parse error inside a text node
    #[error(transparent)]
    Template(#[from] TemplateError),

    /// A structural error raised during materialization
    #[error(transparent)]
    Tree(#[from] TreeError),
}

/// A node that was being rendered when an error occurred.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    /// The node's id
    pub node: NodeId,

    /// Human-readable node variant name
    pub kind: &'static str,
}

/// A failed render: the underlying error plus the chain of nodes that were
/// being rendered when it occurred, in root-to-failure order.
///
/// The caller chain is diagnostic state only; it is never used for control
/// flow. A render that fails produces no output; a partially rendered
/// document is never valid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderFailure {
    error: RenderError,
    callers: Vec<Caller>,
}

impl RenderFailure {
    pub(crate) fn new(error: RenderError, callers: Vec<Caller>) -> Self {
        Self { error, callers }
    }

    /// The underlying render error.
    pub fn error(&self) -> &RenderError {
        &self.error
    }

    /// Consume the failure, keeping only the error.
    pub fn into_error(self) -> RenderError {
        self.error
    }

    /// Nodes that were being rendered, root first, failure point last.
    pub fn callers(&self) -> &[Caller] {
        &self.callers
    }

    /// The deepest node being rendered when the error occurred.
    pub fn last_caller(&self) -> Option<&Caller> {
        self.callers.last()
    }
}

impl fmt::Display for RenderFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;
        if !self.callers.is_empty() {
            let chain: Vec<&str> = self.callers.iter().map(|c| c.kind).collect();
            write!(f, " (while rendering {})", chain.join(" > "))?;
        }
        Ok(())
    }
}

impl std::error::Error for RenderFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

/// Result type alias for render operations.
pub type Result<T> = std::result::Result<T, RenderFailure>;
