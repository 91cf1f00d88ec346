//! # Quill
//!
//! A document-tree renderer for generated source code, with lazy,
//! dependency-ordered symbol materialization.
//!
//! Quill is the output side of a code generator: callers build a tree of
//! literal, text, list, and scope nodes, register named symbols whose
//! defining code is produced on demand, and render the tree to a single
//! string. A symbol's definition is inserted exactly once, positioned so
//! that every definition precedes all of its dependents; symbols nobody
//! references produce no output at all.
//!
//! ## Architecture
//!
//! - **Document**: an arena-backed tree of nodes plus a set of symbols
//! - **Template**: minimal `${name}` placeholder syntax inside text nodes
//! - **Renderer**: depth-first walk with on-demand, topologically ordered
//!   definition splicing and caller-trace capture on failure
//!
//! ## Example
//!
//! ```
//! use quill::{render_to_string, Document};
//!
//! let mut doc = Document::new();
//! let root = doc.new_scope();
//! doc.set_separator_last(root, Some("\n")).unwrap();
//!
//! let isolate = doc.new_symbol_text("isolate", "v8::Isolate* ${isolate} = GetIsolate();");
//! let context = doc.new_symbol_text("context", "v8::Context ${context} = ${isolate}->ctx();");
//! doc.register_symbols(root, [isolate, context]).unwrap();
//!
//! let body = doc.new_text("Run(${context});");
//! doc.append(root, body).unwrap();
//!
//! let out = render_to_string(&mut doc, root).unwrap();
//! assert_eq!(
//!     out,
//!     "v8::Isolate* isolate = GetIsolate();\n\
//!      v8::Context context = isolate->ctx();\n\
//!      Run(context);\n"
//! );
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod document;
pub mod error;
pub mod node;
pub mod render;
pub mod symbol;
pub mod template;

// Re-export main types
pub use document::Document;
pub use error::{Caller, RenderError, RenderFailure, Result, TemplateError, TreeError};
pub use node::NodeId;
pub use render::{render_to_string, Renderer};
pub use symbol::{DefineFn, SymbolId};
pub use template::Segment;

/// Quill version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
