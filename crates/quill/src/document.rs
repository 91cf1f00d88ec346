//! The document arena: node construction, structural mutation, and symbol
//! registration
//!
//! All nodes and symbols live in one arena owned by [`Document`]. Handles
//! ([`NodeId`], [`SymbolId`]) are plain indices; the parent back-reference
//! is an index too, so upward traversal never keeps a node alive and the
//! tree stays single-owner by construction.

use indexmap::IndexMap;

use crate::error::TreeError;
use crate::node::{kind_name, ListData, NodeData, NodeId, NodeKind};
use crate::symbol::{SymbolData, SymbolId, SymbolState};

/// An output document under construction.
///
/// A document is a tree of literal, text, list, and scope nodes plus a set
/// of lazily-defined symbols. Build the tree, register symbols on scopes,
/// then hand the document to a [`Renderer`](crate::Renderer) to produce the
/// final text.
///
/// # Example
///
/// ```
/// use quill::{render_to_string, Document};
///
/// let mut doc = Document::new();
/// let root = doc.new_scope();
/// let buf = doc.new_symbol_text("buf", "std::string ${buf};");
/// doc.register_symbols(root, [buf]).unwrap();
///
/// let use_site = doc.new_text("return ${buf};");
/// doc.append(root, use_site).unwrap();
///
/// let out = render_to_string(&mut doc, root).unwrap();
/// assert_eq!(out, "std::string buf;\nreturn buf;");
/// ```
#[derive(Default)]
pub struct Document {
    nodes: Vec<NodeData>,
    symbols: Vec<SymbolData>,
}

impl Document {
    /// Create an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    // ═══════════════════════════════════════════════════════════════════
    // Node Construction
    // ═══════════════════════════════════════════════════════════════════

    fn alloc(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeData { kind, parent: None });
        id
    }

    /// Create a detached literal node. Renders verbatim; placeholder
    /// syntax is not processed.
    pub fn new_literal(&mut self, text: impl Into<String>) -> NodeId {
        self.alloc(NodeKind::Literal(text.into()))
    }

    /// Create a detached text node. `${name}` placeholders resolve
    /// symbols at render time.
    pub fn new_text(&mut self, template: impl Into<String>) -> NodeId {
        self.alloc(NodeKind::Text(template.into()))
    }

    /// Create a detached, empty list node.
    ///
    /// The separator defaults to `"\n"`; see [`Document::set_separator`].
    pub fn new_list(&mut self) -> NodeId {
        self.alloc(NodeKind::List(ListData::new()))
    }

    /// Create a detached, empty scope node.
    ///
    /// A scope is a list that also owns a symbol table and receives the
    /// spliced definitions of symbols resolved within it.
    pub fn new_scope(&mut self) -> NodeId {
        self.alloc(NodeKind::Scope {
            list: ListData::new(),
            table: IndexMap::new(),
        })
    }

    /// Set the string joined between adjacent children of a list-like node.
    pub fn set_separator(
        &mut self,
        list: NodeId,
        separator: Option<&str>,
    ) -> Result<(), TreeError> {
        let data = self
            .list_data_mut(list)
            .ok_or(TreeError::NotAList { node: list })?;
        data.separator = separator.map(str::to_string);
        Ok(())
    }

    /// Set the string appended after the final child of a list-like node.
    pub fn set_separator_last(
        &mut self,
        list: NodeId,
        separator: Option<&str>,
    ) -> Result<(), TreeError> {
        let data = self
            .list_data_mut(list)
            .ok_or(TreeError::NotAList { node: list })?;
        data.separator_last = separator.map(str::to_string);
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════
    // Structural Mutation
    // ═══════════════════════════════════════════════════════════════════

    /// Append `node` to the end of `list`.
    ///
    /// # Errors
    ///
    /// `NotAList` if `list` has no children; `AlreadyAttached` if `node`
    /// already has a parent.
    pub fn append(&mut self, list: NodeId, node: NodeId) -> Result<(), TreeError> {
        let len = self.children(list).len();
        self.insert(list, len, node)
    }

    /// Insert `node` into `list` at `index`.
    ///
    /// An index past the end clamps to the end, matching the permissive
    /// insert of a plain vector-backed sequence.
    pub fn insert(&mut self, list: NodeId, index: usize, node: NodeId) -> Result<(), TreeError> {
        if self.list_data(list).is_none() {
            return Err(TreeError::NotAList { node: list });
        }
        self.claim(node, list)?;
        // list_data_mut cannot fail after the check above
        if let Some(data) = self.list_data_mut(list) {
            let index = index.min(data.children.len());
            data.children.insert(index, node);
        }
        Ok(())
    }

    /// Append every node from `nodes`, in order.
    pub fn extend(
        &mut self,
        list: NodeId,
        nodes: impl IntoIterator<Item = NodeId>,
    ) -> Result<(), TreeError> {
        for node in nodes {
            self.append(list, node)?;
        }
        Ok(())
    }

    /// Remove `node` from `list` and detach it.
    ///
    /// The removed node loses its parent and may be attached elsewhere.
    ///
    /// # Errors
    ///
    /// `NotAChild` if `node` is not a direct child of `list`.
    pub fn remove(&mut self, list: NodeId, node: NodeId) -> Result<(), TreeError> {
        let data = self
            .list_data_mut(list)
            .ok_or(TreeError::NotAList { node: list })?;
        let position = data
            .children
            .iter()
            .position(|&c| c == node)
            .ok_or(TreeError::NotAChild { node, list })?;
        data.children.remove(position);
        self.nodes[node.0].parent = None;
        Ok(())
    }

    /// Insert `node` immediately before `anchor` among `list`'s children.
    pub(crate) fn insert_before(
        &mut self,
        list: NodeId,
        anchor: NodeId,
        node: NodeId,
    ) -> Result<(), TreeError> {
        let position = self
            .list_data(list)
            .ok_or(TreeError::NotAList { node: list })?
            .children
            .iter()
            .position(|&c| c == anchor)
            .ok_or(TreeError::NotAChild { node: anchor, list })?;
        self.insert(list, position, node)
    }

    /// Reject attaching an already-owned node or an ancestor of the target,
    /// then set the node's parent.
    fn claim(&mut self, node: NodeId, parent: NodeId) -> Result<(), TreeError> {
        if self.nodes[node.0].parent.is_some() {
            return Err(TreeError::AlreadyAttached { node });
        }
        let mut cursor = Some(parent);
        while let Some(current) = cursor {
            if current == node {
                return Err(TreeError::WouldCycle { node });
            }
            cursor = self.nodes[current.0].parent;
        }
        self.nodes[node.0].parent = Some(parent);
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════
    // Inspection
    // ═══════════════════════════════════════════════════════════════════

    /// The parent of `node`, if attached.
    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node.0].parent
    }

    /// Direct children of a list-like node, in document order.
    ///
    /// Returns an empty slice for nodes without children.
    pub fn children(&self, list: NodeId) -> &[NodeId] {
        self.list_data(list).map_or(&[], |d| &d.children)
    }

    /// The child of `list` at `index`, if present.
    pub fn child(&self, list: NodeId, index: usize) -> Option<NodeId> {
        self.children(list).get(index).copied()
    }

    /// Human-readable variant name of `node` ("literal", "scope", ...).
    pub fn kind_name(&self, node: NodeId) -> &'static str {
        kind_name(&self.nodes[node.0].kind)
    }

    /// Total number of nodes in the arena, attached or not.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    // ═══════════════════════════════════════════════════════════════════
    // Symbols
    // ═══════════════════════════════════════════════════════════════════

    /// Create a detached symbol whose defining node is built by `define`
    /// on first reference.
    ///
    /// `define` is invoked at most once, ever. It receives the document and
    /// the symbol's own id, and must return a detached node.
    pub fn new_symbol<F>(&mut self, name: impl Into<String>, define: F) -> SymbolId
    where
        F: FnOnce(&mut Document, SymbolId) -> NodeId + 'static,
    {
        let id = SymbolId(self.symbols.len());
        self.symbols.push(SymbolData {
            name: name.into(),
            scope: None,
            define: Some(Box::new(define)),
            state: SymbolState::Unregistered,
        });
        id
    }

    /// Create a detached symbol defined by a single text node.
    ///
    /// The definition template conventionally mentions the symbol's own
    /// name, e.g. `"int ${var1} = ${var2};"` for a symbol named `var1`.
    pub fn new_symbol_text(
        &mut self,
        name: impl Into<String>,
        template: impl Into<String>,
    ) -> SymbolId {
        let template = template.into();
        self.new_symbol(name, move |doc, _| doc.new_text(template))
    }

    /// Register symbols into `scope`, making them resolvable from any node
    /// in the scope's subtree.
    ///
    /// # Errors
    ///
    /// `NotAScope` if `scope` is not a scope node; `DuplicateSymbol` if a
    /// name is already present in this scope; `SymbolAlreadyRegistered` if
    /// a symbol already belongs to a scope. Fails eagerly: nothing is
    /// registered past the first error.
    pub fn register_symbols(
        &mut self,
        scope: NodeId,
        symbols: impl IntoIterator<Item = SymbolId>,
    ) -> Result<(), TreeError> {
        for symbol in symbols {
            if self.symbols[symbol.0].scope.is_some() {
                return Err(TreeError::SymbolAlreadyRegistered {
                    name: self.symbols[symbol.0].name.clone(),
                });
            }
            let name = self.symbols[symbol.0].name.clone();
            let table = match &mut self.nodes[scope.0].kind {
                NodeKind::Scope { table, .. } => table,
                _ => return Err(TreeError::NotAScope { node: scope }),
            };
            if table.contains_key(&name) {
                return Err(TreeError::DuplicateSymbol { name });
            }
            table.insert(name, symbol);
            self.symbols[symbol.0].scope = Some(scope);
            self.symbols[symbol.0].state = SymbolState::Registered;
        }
        Ok(())
    }

    /// The name of `symbol`.
    pub fn symbol_name(&self, symbol: SymbolId) -> &str {
        &self.symbols[symbol.0].name
    }

    // ═══════════════════════════════════════════════════════════════════
    // Renderer Internals
    // ═══════════════════════════════════════════════════════════════════

    pub(crate) fn node(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.0]
    }

    pub(crate) fn symbol(&self, id: SymbolId) -> &SymbolData {
        &self.symbols[id.0]
    }

    pub(crate) fn symbol_mut(&mut self, id: SymbolId) -> &mut SymbolData {
        &mut self.symbols[id.0]
    }

    pub(crate) fn list_data(&self, id: NodeId) -> Option<&ListData> {
        match &self.nodes[id.0].kind {
            NodeKind::List(data) | NodeKind::Scope { list: data, .. } => Some(data),
            _ => None,
        }
    }

    pub(crate) fn list_data_mut(&mut self, id: NodeId) -> Option<&mut ListData> {
        match &mut self.nodes[id.0].kind {
            NodeKind::List(data) | NodeKind::Scope { list: data, .. } => Some(data),
            _ => None,
        }
    }

    /// Wrap a freshly built definition body in a marker node.
    pub(crate) fn wrap_symbol_def(
        &mut self,
        symbol: SymbolId,
        body: NodeId,
    ) -> Result<NodeId, TreeError> {
        let def = self.alloc(NodeKind::SymbolDef { symbol, body });
        self.claim(body, def)?;
        Ok(def)
    }
}
