//! Node identifiers and the document node variants

use std::fmt;

use indexmap::IndexMap;

use crate::symbol::SymbolId;

/// Index of a node within its owning [`Document`](crate::Document).
///
/// Node ids are cheap copyable handles. They are only meaningful for the
/// document that created them; passing an id to a different document is a
/// logic error and may panic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// Raw arena index, for diagnostics.
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Ordered children plus join separators, shared by `List` and `Scope`.
#[derive(Debug, Clone)]
pub(crate) struct ListData {
    /// Direct children, in document order
    pub children: Vec<NodeId>,

    /// Joined between every adjacent pair of children
    pub separator: Option<String>,

    /// Appended after the final child, if set
    pub separator_last: Option<String>,
}

impl ListData {
    pub fn new() -> Self {
        Self {
            children: Vec::new(),
            separator: Some("\n".to_string()),
            separator_last: None,
        }
    }
}

/// One document node.
///
/// Every variant renders to text; `Scope` additionally owns a symbol table
/// and receives the spliced definitions of symbols resolved within it.
pub(crate) enum NodeKind {
    /// Verbatim text; placeholder syntax is not processed
    Literal(String),

    /// Template text; `${name}` placeholders resolve symbols at render time
    Text(String),

    /// Ordered children joined with separators
    List(ListData),

    /// Marker wrapper: `body` is the one-time defining code for `symbol`
    SymbolDef { symbol: SymbolId, body: NodeId },

    /// A list that owns a symbol table and anchors definition splicing
    Scope {
        list: ListData,
        table: IndexMap<String, SymbolId>,
    },
}

/// A node stored in the document arena.
pub(crate) struct NodeData {
    pub kind: NodeKind,
    pub parent: Option<NodeId>,
}

/// Get a human-readable name for a node variant.
pub(crate) fn kind_name(kind: &NodeKind) -> &'static str {
    match kind {
        NodeKind::Literal(_) => "literal",
        NodeKind::Text(_) => "text",
        NodeKind::List(_) => "list",
        NodeKind::SymbolDef { .. } => "symbol definition",
        NodeKind::Scope { .. } => "scope",
    }
}
