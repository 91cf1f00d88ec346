//! Symbol materialization tests: dependency ordering, laziness, scoping,
//! and cycle detection

use std::cell::Cell;
use std::rc::Rc;

use pretty_assertions::assert_eq;
use quill::*;

// ═══════════════════════════════════════════════════════════════════════
// Dependency Ordering
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_symbol_definition_chains() {
    let mut doc = Document::new();
    let root = doc.new_scope();
    doc.set_separator_last(root, Some("\n")).unwrap();

    let symbols = [
        ("var1", "int ${var1} = ${var2} + ${var3};"),
        ("var2", "int ${var2} = ${var5};"),
        ("var3", "int ${var3} = ${var4};"),
        ("var4", "int ${var4} = 1;"),
        ("var5", "int ${var5} = 2;"),
    ];
    let ids: Vec<SymbolId> = symbols
        .iter()
        .map(|(name, template)| doc.new_symbol_text(*name, *template))
        .collect();
    doc.register_symbols(root, ids).unwrap();

    let use_site = doc.new_text("(void)${var1};");
    doc.append(root, use_site).unwrap();

    assert_eq!(
        render_to_string(&mut doc, root).unwrap(),
        "int var5 = 2;\n\
         int var2 = var5;\n\
         int var4 = 1;\n\
         int var3 = var4;\n\
         int var1 = var2 + var3;\n\
         (void)var1;\n"
    );
}

#[test]
fn test_diamond_dependency_defines_shared_symbol_once() {
    let mut doc = Document::new();
    let root = doc.new_scope();
    doc.set_separator_last(root, Some("\n")).unwrap();

    let a = doc.new_symbol_text("a", "int ${a} = ${b} + ${c};");
    let b = doc.new_symbol_text("b", "int ${b} = ${d};");
    let c = doc.new_symbol_text("c", "int ${c} = ${d};");
    let d = doc.new_symbol_text("d", "int ${d} = 1;");
    doc.register_symbols(root, [a, b, c, d]).unwrap();

    let use_site = doc.new_text("return ${a};");
    doc.append(root, use_site).unwrap();

    // The shared dependency is defined once, before both of its users, at
    // the position of whichever user resolved first.
    assert_eq!(
        render_to_string(&mut doc, root).unwrap(),
        "int d = 1;\n\
         int b = d;\n\
         int c = d;\n\
         int a = b + c;\n\
         return a;\n"
    );
}

#[test]
fn test_definition_spliced_before_triggering_child() {
    let mut doc = Document::new();
    let root = doc.new_scope();
    let header = doc.new_literal("// prologue");
    doc.append(root, header).unwrap();
    let symbol = doc.new_symbol_text("x", "int ${x} = 0;");
    doc.register_symbols(root, [symbol]).unwrap();
    let use_site = doc.new_text("use(${x});");
    doc.append(root, use_site).unwrap();

    assert_eq!(
        render_to_string(&mut doc, root).unwrap(),
        "// prologue\nint x = 0;\nuse(x);"
    );
}

#[test]
fn test_reference_inside_nested_list_splices_at_scope_level() {
    let mut doc = Document::new();
    let root = doc.new_scope();
    let header = doc.new_literal("// prologue");
    doc.append(root, header).unwrap();
    let symbol = doc.new_symbol_text("x", "int ${x} = 0;");
    doc.register_symbols(root, [symbol]).unwrap();

    let block = doc.new_list();
    let use_site = doc.new_text("use(${x});");
    doc.append(block, use_site).unwrap();
    doc.append(root, block).unwrap();

    // The definition lands before the scope-level child containing the
    // reference, not inside the nested list.
    assert_eq!(
        render_to_string(&mut doc, root).unwrap(),
        "// prologue\nint x = 0;\nuse(x);"
    );
    assert_eq!(doc.children(root).len(), 3);
    assert_eq!(doc.kind_name(doc.child(root, 1).unwrap()), "symbol definition");
}

// ═══════════════════════════════════════════════════════════════════════
// Laziness
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_unreferenced_symbol_produces_no_output() {
    let mut doc = Document::new();
    let root = doc.new_scope();

    let invoked = Rc::new(Cell::new(false));
    let flag = Rc::clone(&invoked);
    let symbol = doc.new_symbol("unused", move |d, _| {
        flag.set(true);
        d.new_text("int ${unused} = 0;")
    });
    doc.register_symbols(root, [symbol]).unwrap();

    let body = doc.new_literal("return;");
    doc.append(root, body).unwrap();

    assert_eq!(render_to_string(&mut doc, root).unwrap(), "return;");
    assert!(!invoked.get());
}

#[test]
fn test_definition_constructor_runs_at_most_once() {
    let mut doc = Document::new();
    let root = doc.new_scope();
    doc.set_separator_last(root, Some("\n")).unwrap();

    let count = Rc::new(Cell::new(0u32));
    let counter = Rc::clone(&count);
    let symbol = doc.new_symbol("tmp", move |d, _| {
        counter.set(counter.get() + 1);
        d.new_text("int ${tmp} = 0;")
    });
    doc.register_symbols(root, [symbol]).unwrap();

    let first = doc.new_text("f(${tmp});");
    let second = doc.new_text("g(${tmp});");
    doc.extend(root, [first, second]).unwrap();

    let out = render_to_string(&mut doc, root).unwrap();
    assert_eq!(out, "int tmp = 0;\nf(tmp);\ng(tmp);\n");
    assert_eq!(count.get(), 1);

    // Still once after a second pass
    render_to_string(&mut doc, root).unwrap();
    assert_eq!(count.get(), 1);
}

// ═══════════════════════════════════════════════════════════════════════
// Scope Chains and Shadowing
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_inner_scope_shadows_outer_symbol() {
    let mut doc = Document::new();
    let outer = doc.new_scope();
    let inner = doc.new_scope();
    doc.append(outer, inner).unwrap();

    let outer_v = doc.new_symbol_text("v", "outer ${v};");
    doc.register_symbols(outer, [outer_v]).unwrap();
    let inner_v = doc.new_symbol_text("v", "inner ${v};");
    doc.register_symbols(inner, [inner_v]).unwrap();

    let use_site = doc.new_text("use(${v});");
    doc.append(inner, use_site).unwrap();

    let out = render_to_string(&mut doc, outer).unwrap();
    assert_eq!(out, "inner v;\nuse(v);");
    assert!(!out.contains("outer"));
}

#[test]
fn test_reference_materializes_into_outer_scope() {
    let mut doc = Document::new();
    let outer = doc.new_scope();
    let header = doc.new_literal("// setup");
    doc.append(outer, header).unwrap();
    let symbol = doc.new_symbol_text("g", "int ${g} = 7;");
    doc.register_symbols(outer, [symbol]).unwrap();

    let inner = doc.new_scope();
    let use_site = doc.new_text("use(${g});");
    doc.append(inner, use_site).unwrap();
    doc.append(outer, inner).unwrap();

    assert_eq!(
        render_to_string(&mut doc, outer).unwrap(),
        "// setup\nint g = 7;\nuse(g);"
    );
    // Spliced into the declaring (outer) scope, not the inner one
    assert_eq!(doc.children(outer).len(), 3);
    assert_eq!(doc.children(inner).len(), 1);
}

#[test]
fn test_symbol_above_render_root_is_unreachable() {
    let mut doc = Document::new();
    let outer = doc.new_scope();
    let symbol = doc.new_symbol_text("x", "int ${x} = 0;");
    doc.register_symbols(outer, [symbol]).unwrap();

    let inner = doc.new_scope();
    let use_site = doc.new_text("use(${x});");
    doc.append(inner, use_site).unwrap();
    doc.append(outer, inner).unwrap();

    // Rendering below the declaring scope cannot splice into it
    let failure = render_to_string(&mut doc, inner).unwrap_err();
    assert_eq!(
        failure.error(),
        &RenderError::UnresolvedSymbol {
            name: "x".to_string()
        }
    );
}

// ═══════════════════════════════════════════════════════════════════════
// Cycle Detection
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_own_name_in_definition_is_not_a_cycle() {
    let mut doc = Document::new();
    let root = doc.new_scope();
    let symbol = doc.new_symbol_text("self_ref", "int ${self_ref} = sizeof(${self_ref});");
    doc.register_symbols(root, [symbol]).unwrap();
    let use_site = doc.new_text("${self_ref};");
    doc.append(root, use_site).unwrap();

    assert_eq!(
        render_to_string(&mut doc, root).unwrap(),
        "int self_ref = sizeof(self_ref);\nself_ref;"
    );
}

#[test]
fn test_mutual_cycle_fails() {
    let mut doc = Document::new();
    let root = doc.new_scope();
    let a = doc.new_symbol_text("a", "int ${a} = ${b};");
    let b = doc.new_symbol_text("b", "int ${b} = ${a};");
    doc.register_symbols(root, [a, b]).unwrap();
    let use_site = doc.new_text("${a};");
    doc.append(root, use_site).unwrap();

    let failure = render_to_string(&mut doc, root).unwrap_err();
    assert_eq!(
        failure.error(),
        &RenderError::CyclicDependency {
            path: vec!["a".to_string(), "b".to_string(), "a".to_string()]
        }
    );
}

#[test]
fn test_transitive_cycle_reports_full_path() {
    let mut doc = Document::new();
    let root = doc.new_scope();
    let a = doc.new_symbol_text("a", "int ${a} = ${b};");
    let b = doc.new_symbol_text("b", "int ${b} = ${c};");
    let c = doc.new_symbol_text("c", "int ${c} = ${a};");
    doc.register_symbols(root, [a, b, c]).unwrap();
    let use_site = doc.new_text("${a};");
    doc.append(root, use_site).unwrap();

    let failure = render_to_string(&mut doc, root).unwrap_err();
    assert_eq!(
        failure.error(),
        &RenderError::CyclicDependency {
            path: vec![
                "a".to_string(),
                "b".to_string(),
                "c".to_string(),
                "a".to_string(),
            ]
        }
    );
}

// ═══════════════════════════════════════════════════════════════════════
// Constructor Misbehavior
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_constructor_returning_attached_node_fails() {
    let mut doc = Document::new();
    let root = doc.new_scope();
    let elsewhere = doc.new_list();
    let body = doc.new_literal("int x = 0;");
    doc.append(elsewhere, body).unwrap();

    let symbol = doc.new_symbol("x", move |_, _| body);
    doc.register_symbols(root, [symbol]).unwrap();
    let use_site = doc.new_text("${x};");
    doc.append(root, use_site).unwrap();

    let failure = render_to_string(&mut doc, root).unwrap_err();
    assert_eq!(
        failure.error(),
        &RenderError::Tree(TreeError::AlreadyAttached { node: body })
    );
}
