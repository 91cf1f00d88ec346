//! Lazily-defined symbols and their lifecycle state machine

use std::fmt;

use crate::document::Document;
use crate::node::NodeId;

/// Index of a symbol within its owning [`Document`](crate::Document).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SymbolId(pub(crate) usize);

impl SymbolId {
    /// Raw arena index, for diagnostics.
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for SymbolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}", self.0)
    }
}

/// Builds the node whose rendered text defines a symbol.
///
/// Invoked at most once, on the symbol's first textual reference. The
/// returned node must be detached; it is wrapped in a definition marker and
/// spliced into the declaring scope by the renderer.
pub type DefineFn = Box<dyn FnOnce(&mut Document, SymbolId) -> NodeId>;

/// Lifecycle of a symbol.
///
/// ```text
/// Unregistered → Registered → Resolving → Resolved
/// ```
///
/// `Resolving` doubles as the cycle-detection marker: a reference to a
/// symbol in this state from anywhere but its own definition text is a
/// dependency cycle. `Resolved` is permanent: the cached definition node
/// survives across render passes, which keeps repeated rendering idempotent
/// and the definition constructor at-most-once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SymbolState {
    /// Created, not yet owned by any scope
    Unregistered,

    /// Owned by a scope, definition not yet requested
    Registered,

    /// Definition currently being rendered
    Resolving,

    /// Definition spliced; `def` is the marker node in the scope
    Resolved { def: NodeId },
}

/// A symbol stored in the document arena.
pub(crate) struct SymbolData {
    /// Name used by `${name}` references and substituted at use sites
    pub name: String,

    /// The scope that owns this symbol, set once at registration
    pub scope: Option<NodeId>,

    /// Definition constructor; `take()`n on first materialization
    pub define: Option<DefineFn>,

    pub state: SymbolState,
}
