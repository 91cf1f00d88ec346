//! Depth-first renderer with lazy, dependency-ordered symbol
//! materialization
//!
//! Rendering walks the tree once, resolving `${name}` references against
//! the nearest enclosing scope. The first reference to a symbol builds its
//! defining node, splices it into the declaring scope immediately before
//! the scope-level child that triggered it, and renders it in place,
//! recursively resolving the definition's own references first. The net
//! effect is an on-demand topological order: every definition precedes all
//! of its dependents, each appears exactly once, and symbols nobody
//! references never materialize at all.
//!
//! A render pass takes `&mut Document` because materialization splices the
//! tree. That also makes two concurrent passes over one document
//! unrepresentable; independent documents render independently.

use crate::document::Document;
use crate::error::{Caller, RenderError, RenderFailure, Result};
use crate::node::{NodeId, NodeKind};
use crate::symbol::{SymbolId, SymbolState};
use crate::template::{self, Segment};

/// Renders a document tree to text.
///
/// Stateless apart from configuration; per-pass state lives in an internal
/// context created for each [`Renderer::render`] call.
#[derive(Debug, Clone)]
pub struct Renderer {
    max_depth: usize,
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer {
    /// Create a renderer with the default depth limit of 1000.
    pub fn new() -> Self {
        Self { max_depth: 1000 }
    }

    /// Create a renderer with a custom depth limit.
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self { max_depth }
    }

    /// Render the subtree rooted at `root` to a single string.
    ///
    /// On failure the returned [`RenderFailure`] carries the chain of
    /// nodes that were being rendered, root first.
    pub fn render(&self, doc: &mut Document, root: NodeId) -> Result<String> {
        let mut ctx = RenderContext::new(self.max_depth);
        match render_node(doc, &mut ctx, root) {
            Ok(text) => Ok(text),
            Err(error) => Err(RenderFailure::new(error, ctx.trace.unwrap_or_default())),
        }
    }
}

/// Render `root` with a default [`Renderer`].
pub fn render_to_string(doc: &mut Document, root: NodeId) -> Result<String> {
    Renderer::new().render(doc, root)
}

// ═══════════════════════════════════════════════════════════════════════
// Per-Pass State
// ═══════════════════════════════════════════════════════════════════════

/// One pending piece of a scope's output.
struct Chunk {
    uid: usize,
    text: String,
}

/// Output assembly for one scope currently being rendered.
///
/// Chunks hold the rendered text of the scope's direct children plus any
/// definitions spliced during the pass. `open` tracks the chunks whose
/// rendering is in progress, innermost last; a definition triggered from
/// inside an open chunk is inserted immediately before it.
struct ScopeFrame {
    scope: NodeId,
    chunks: Vec<Chunk>,
    open: Vec<usize>,
    next_uid: usize,
}

impl ScopeFrame {
    fn new(scope: NodeId) -> Self {
        Self {
            scope,
            chunks: Vec::new(),
            open: Vec::new(),
            next_uid: 0,
        }
    }

    /// Start a chunk at the end of the frame (a direct child of the scope).
    fn open_at_end(&mut self) {
        let uid = self.next_uid;
        self.next_uid += 1;
        self.chunks.push(Chunk {
            uid,
            text: String::new(),
        });
        self.open.push(uid);
    }

    /// Start a chunk immediately before the innermost open chunk (a
    /// definition triggered by it).
    fn open_before_innermost(&mut self) {
        let uid = self.next_uid;
        self.next_uid += 1;
        let position = self
            .open
            .last()
            .and_then(|&open_uid| self.chunks.iter().position(|c| c.uid == open_uid))
            .unwrap_or(self.chunks.len());
        self.chunks.insert(
            position,
            Chunk {
                uid,
                text: String::new(),
            },
        );
        self.open.push(uid);
    }

    /// Finish the innermost open chunk, storing its text on success.
    fn close(&mut self, text: Option<String>) {
        if let Some(uid) = self.open.pop() {
            if let Some(text) = text {
                if let Some(chunk) = self.chunks.iter_mut().find(|c| c.uid == uid) {
                    chunk.text = text;
                }
            }
        }
    }

    fn into_texts(self) -> Vec<String> {
        self.chunks.into_iter().map(|c| c.text).collect()
    }
}

/// State for one render pass: the caller stack for diagnostics, the
/// cycle-detection stack, and the active scope frames.
struct RenderContext {
    max_depth: usize,
    stack: Vec<NodeId>,
    trace: Option<Vec<Caller>>,
    resolving: Vec<SymbolId>,
    frames: Vec<ScopeFrame>,
}

impl RenderContext {
    fn new(max_depth: usize) -> Self {
        Self {
            max_depth,
            stack: Vec::new(),
            trace: None,
            resolving: Vec::new(),
            frames: Vec::new(),
        }
    }

    fn frame_mut(&mut self, scope: NodeId) -> Option<&mut ScopeFrame> {
        self.frames.iter_mut().rev().find(|f| f.scope == scope)
    }

    fn has_frame(&self, scope: NodeId) -> bool {
        self.frames.iter().any(|f| f.scope == scope)
    }

    fn capture_trace(&mut self, doc: &Document) {
        if self.trace.is_none() {
            self.trace = Some(
                self.stack
                    .iter()
                    .map(|&node| Caller {
                        node,
                        kind: doc.kind_name(node),
                    })
                    .collect(),
            );
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Tree Walk
// ═══════════════════════════════════════════════════════════════════════

fn render_node(
    doc: &mut Document,
    ctx: &mut RenderContext,
    node: NodeId,
) -> std::result::Result<String, RenderError> {
    ctx.stack.push(node);
    let result = if ctx.stack.len() > ctx.max_depth {
        Err(RenderError::DepthExceeded {
            depth: ctx.stack.len(),
            max: ctx.max_depth,
        })
    } else {
        render_kind(doc, ctx, node)
    };
    // The trace snapshot happens at the deepest failure point, before the
    // stack unwinds.
    if result.is_err() {
        ctx.capture_trace(doc);
    }
    ctx.stack.pop();
    result
}

/// What a node needs from the arena before rendering can recurse.
enum Step {
    Emit(String),
    Text(String),
    Body(NodeId),
    List,
    Scope,
}

fn render_kind(
    doc: &mut Document,
    ctx: &mut RenderContext,
    node: NodeId,
) -> std::result::Result<String, RenderError> {
    let step = match &doc.node(node).kind {
        NodeKind::Literal(text) => Step::Emit(text.clone()),
        NodeKind::Text(raw) => Step::Text(raw.clone()),
        NodeKind::SymbolDef { body, .. } => Step::Body(*body),
        NodeKind::List(_) => Step::List,
        NodeKind::Scope { .. } => Step::Scope,
    };
    match step {
        Step::Emit(text) => Ok(text),
        Step::Text(raw) => render_text(doc, ctx, node, &raw),
        Step::Body(body) => render_node(doc, ctx, body),
        Step::List => render_list(doc, ctx, node),
        Step::Scope => render_scope(doc, ctx, node),
    }
}

fn render_text(
    doc: &mut Document,
    ctx: &mut RenderContext,
    node: NodeId,
    raw: &str,
) -> std::result::Result<String, RenderError> {
    let mut out = String::new();
    for segment in template::parse(raw)? {
        match segment {
            Segment::Literal(text) => out.push_str(&text),
            Segment::Reference(name) => out.push_str(&resolve(doc, ctx, node, &name)?),
        }
    }
    Ok(out)
}

fn render_list(
    doc: &mut Document,
    ctx: &mut RenderContext,
    list: NodeId,
) -> std::result::Result<String, RenderError> {
    let (children, separator, separator_last) = list_parts(doc, list);
    let mut parts = Vec::with_capacity(children.len());
    for child in children {
        parts.push(render_node(doc, ctx, child)?);
    }
    Ok(join(&parts, separator.as_deref(), separator_last.as_deref()))
}

fn render_scope(
    doc: &mut Document,
    ctx: &mut RenderContext,
    scope: NodeId,
) -> std::result::Result<String, RenderError> {
    // Children are snapshotted at entry: definitions spliced during the
    // pass render through the chunk mechanism, not this loop.
    let (children, separator, separator_last) = list_parts(doc, scope);
    ctx.frames.push(ScopeFrame::new(scope));

    let mut outcome = Ok(());
    for child in children {
        if let Some(frame) = ctx.frame_mut(scope) {
            frame.open_at_end();
        }
        match render_node(doc, ctx, child) {
            Ok(text) => {
                if let Some(frame) = ctx.frame_mut(scope) {
                    frame.close(Some(text));
                }
            }
            Err(error) => {
                if let Some(frame) = ctx.frame_mut(scope) {
                    frame.close(None);
                }
                outcome = Err(error);
                break;
            }
        }
    }

    let frame = ctx.frames.pop();
    outcome?;
    let parts = frame.map_or_else(Vec::new, ScopeFrame::into_texts);
    Ok(join(&parts, separator.as_deref(), separator_last.as_deref()))
}

fn list_parts(doc: &Document, node: NodeId) -> (Vec<NodeId>, Option<String>, Option<String>) {
    match doc.list_data(node) {
        Some(data) => (
            data.children.clone(),
            data.separator.clone(),
            data.separator_last.clone(),
        ),
        None => (Vec::new(), None, None),
    }
}

fn join(parts: &[String], separator: Option<&str>, separator_last: Option<&str>) -> String {
    let mut out = parts.join(separator.unwrap_or(""));
    if let Some(last) = separator_last {
        if !parts.is_empty() {
            out.push_str(last);
        }
    }
    out
}

// ═══════════════════════════════════════════════════════════════════════
// Symbol Resolution & Materialization
// ═══════════════════════════════════════════════════════════════════════

/// Resolve a `${name}` reference encountered while rendering `from`.
fn resolve(
    doc: &mut Document,
    ctx: &mut RenderContext,
    from: NodeId,
    name: &str,
) -> std::result::Result<String, RenderError> {
    let (scope, symbol) = find_declaring_scope(doc, ctx, from, name).ok_or_else(|| {
        RenderError::UnresolvedSymbol {
            name: name.to_string(),
        }
    })?;

    let state = doc.symbol(symbol).state;
    match state {
        SymbolState::Resolved { .. } => Ok(doc.symbol_name(symbol).to_string()),
        SymbolState::Resolving => {
            // The declaring mention inside the symbol's own definition text
            // ("int ${var1} = ..." while defining var1) is not a cycle; any
            // deeper re-entry is.
            if ctx.resolving.last() == Some(&symbol) {
                Ok(doc.symbol_name(symbol).to_string())
            } else {
                Err(RenderError::CyclicDependency {
                    path: cycle_path(doc, &ctx.resolving, symbol),
                })
            }
        }
        SymbolState::Registered => materialize(doc, ctx, scope, symbol, from),
        SymbolState::Unregistered => Err(RenderError::UnresolvedSymbol {
            name: name.to_string(),
        }),
    }
}

/// Walk parent links from `from` to the nearest scope declaring `name`.
///
/// The scope must also have an active frame in this pass: a scope above
/// the render root cannot receive spliced definitions, so its symbols are
/// out of reach.
fn find_declaring_scope(
    doc: &Document,
    ctx: &RenderContext,
    from: NodeId,
    name: &str,
) -> Option<(NodeId, SymbolId)> {
    let mut current = Some(from);
    while let Some(node) = current {
        if let NodeKind::Scope { table, .. } = &doc.node(node).kind {
            if let Some(&symbol) = table.get(name) {
                return ctx.has_frame(node).then_some((node, symbol));
            }
        }
        current = doc.node(node).parent;
    }
    None
}

/// Build, splice, and render the definition of `symbol`, then substitute
/// its name at the use site.
fn materialize(
    doc: &mut Document,
    ctx: &mut RenderContext,
    scope: NodeId,
    symbol: SymbolId,
    from: NodeId,
) -> std::result::Result<String, RenderError> {
    doc.symbol_mut(symbol).state = SymbolState::Resolving;
    ctx.resolving.push(symbol);
    let outcome = materialize_definition(doc, ctx, scope, symbol, from);
    ctx.resolving.pop();

    match outcome {
        Ok(def) => {
            doc.symbol_mut(symbol).state = SymbolState::Resolved { def };
            Ok(doc.symbol_name(symbol).to_string())
        }
        Err(error) => {
            doc.symbol_mut(symbol).state = SymbolState::Registered;
            Err(error)
        }
    }
}

fn materialize_definition(
    doc: &mut Document,
    ctx: &mut RenderContext,
    scope: NodeId,
    symbol: SymbolId,
    from: NodeId,
) -> std::result::Result<NodeId, RenderError> {
    let Some(define) = doc.symbol_mut(symbol).define.take() else {
        // The constructor was consumed by a pass that later failed; the
        // symbol can no longer be defined.
        return Err(RenderError::UnresolvedSymbol {
            name: doc.symbol_name(symbol).to_string(),
        });
    };
    let body = define(doc, symbol);
    let def = doc.wrap_symbol_def(symbol, body)?;

    // Splice immediately before the scope-level child whose subtree
    // triggered this materialization. Dependencies discovered while the
    // definition renders land before it in turn, which yields the
    // topological order.
    let anchor = scope_level_ancestor(doc, scope, from)?;
    doc.insert_before(scope, anchor, def)?;

    if let Some(frame) = ctx.frame_mut(scope) {
        frame.open_before_innermost();
    }
    match render_node(doc, ctx, def) {
        Ok(text) => {
            if let Some(frame) = ctx.frame_mut(scope) {
                frame.close(Some(text));
            }
            Ok(def)
        }
        Err(error) => {
            if let Some(frame) = ctx.frame_mut(scope) {
                frame.close(None);
            }
            Err(error)
        }
    }
}

/// The direct child of `scope` whose subtree contains `from`.
fn scope_level_ancestor(
    doc: &Document,
    scope: NodeId,
    from: NodeId,
) -> std::result::Result<NodeId, RenderError> {
    let mut node = from;
    loop {
        match doc.node(node).parent {
            Some(parent) if parent == scope => return Ok(node),
            Some(parent) => node = parent,
            None => {
                return Err(RenderError::Tree(crate::error::TreeError::NotAChild {
                    node: from,
                    list: scope,
                }))
            }
        }
    }
}

fn cycle_path(doc: &Document, resolving: &[SymbolId], symbol: SymbolId) -> Vec<String> {
    let start = resolving
        .iter()
        .position(|&s| s == symbol)
        .unwrap_or_default();
    let mut path: Vec<String> = resolving[start..]
        .iter()
        .map(|&s| doc.symbol_name(s).to_string())
        .collect();
    path.push(doc.symbol_name(symbol).to_string());
    path
}
