//! Template Engine Integration Tests
//!
//! Tests for:
//! - PropertyTable: set/get round trip, defaults, merging
//! - @foreach: literal counts, property counts, nesting
//! - @property: left-fold evaluation, unbalanced blocks
//! - @piece / @insertpiece: duplicate rejection, transitive insertion
//! - Counters and arithmetic across a full template
//! - #include resolution

use sigil::core::SyntaxErrorKind;
use sigil::prelude::*;
use sigil::resolve_includes;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn run_template(source: &str, properties: &mut PropertyTable) -> (String, Diagnostics) {
    init_logger();
    let engine = TemplateEngine::new();
    let mut pieces = Pieces::new();
    let mut diag = Diagnostics::new();
    let out = engine.process_template(source, properties, &mut pieces, &mut diag);
    (out, diag)
}

// ============================================================================
// Property Table
// ============================================================================

#[test]
fn property_set_get_round_trip() {
    let mut props = PropertyTable::new();
    for (key, value) in [("a", 0), ("b", -7), ("c", i32::MAX), ("d", i32::MIN), ("a", 42)] {
        props.set(key, value);
        assert_eq!(props.get(key), value);
    }
    assert_eq!(props.len(), 4);
}

#[test]
fn property_missing_key_defaults() {
    let props = PropertyTable::new();
    assert_eq!(props.get("never_set"), 0);
    assert_eq!(props.get_or("never_set", -1), -1);
    assert!(!props.is_enabled("never_set"));
}

#[test]
fn property_merge_prefers_other() {
    let base = PropertyTable::from([("shared", 1), ("base_only", 2)]);
    let over = PropertyTable::from([("shared", 9), ("over_only", 3)]);
    let merged = base.merged_with(&over);
    assert_eq!(merged.get("shared"), 9);
    assert_eq!(merged.get("base_only"), 2);
    assert_eq!(merged.get("over_only"), 3);
}

#[test]
fn property_table_equality_ignores_insertion_order() {
    let a = PropertyTable::from([("x", 1), ("y", 2)]);
    let b = PropertyTable::from([("y", 2), ("x", 1)]);
    assert_eq!(a, b);
}

// ============================================================================
// @foreach
// ============================================================================

#[test]
fn foreach_literal_count() {
    let mut props = PropertyTable::new();
    let (out, diag) = run_template("@foreach(3, i)idx=@i; @end", &mut props);
    assert!(diag.is_empty());
    assert_eq!(out, "idx=0; idx=1; idx=2; ");
}

#[test]
fn foreach_property_count_and_start() {
    let mut props = PropertyTable::from([("lights", 3), ("first", 1)]);
    let (out, diag) = run_template("@foreach(lights, n, first)L@n @end", &mut props);
    assert!(diag.is_empty());
    assert_eq!(out, "L1 L2 ");
}

#[test]
fn foreach_nested_loops_expand_fully() {
    let mut props = PropertyTable::new();
    let (out, diag) = run_template("@foreach(2, i)@foreach(2, j)[@i@j]@end@end", &mut props);
    assert!(diag.is_empty(), "{:?}", diag.errors());
    assert_eq!(out, "[00][01][10][11]");
}

#[test]
fn foreach_unknown_count_is_reported() {
    let mut props = PropertyTable::new();
    let (out, diag) = run_template("a@foreach(missing, i)x@end b", &mut props);
    assert_eq!(out, "a b");
    assert!(matches!(
        diag.first().map(|e| &e.kind),
        Some(SyntaxErrorKind::InvalidForeachParameter(_))
    ));
}

// ============================================================================
// @property
// ============================================================================

#[test]
fn property_block_uses_left_fold() {
    let mut props = PropertyTable::from([("a", 1), ("b", 0), ("c", 1)]);
    let (out, _) = run_template("@property(a && b || c)kept@end", &mut props);
    assert_eq!(out, "kept");
}

#[test]
fn property_block_left_fold_differs_from_precedence() {
    // Precedence would read a || (b && c) == true.
    let mut props = PropertyTable::from([("a", 1), ("b", 0), ("c", 0)]);
    let (out, diag) = run_template("@property(a || b && c)kept@end", &mut props);
    assert!(diag.is_empty());
    assert_eq!(out, "");
}

#[test]
fn property_block_unbalanced_is_reported() {
    let mut props = PropertyTable::from([("x", 1)]);
    let (out, diag) = run_template("head @property(x) never closed", &mut props);
    assert_eq!(out, "head ");
    assert_eq!(
        diag.first().map(|e| &e.kind),
        Some(&SyntaxErrorKind::UnmatchedBlock)
    );
}

#[test]
fn property_block_bad_expression_keeps_going() {
    let mut props = PropertyTable::from([("x", 1)]);
    let (out, diag) = run_template("@property(x &&)a@end@property(x)b@end", &mut props);
    assert_eq!(out, "b");
    assert_eq!(diag.len(), 1);
}

// ============================================================================
// Pieces
// ============================================================================

#[test]
fn piece_duplicate_name_rejected() {
    init_logger();
    let engine = TemplateEngine::new();
    let mut props = PropertyTable::new();
    let mut pieces = Pieces::new();
    let mut diag = Diagnostics::new();

    engine.process_piece_file(
        "@piece(foo)first@end@piece(foo)second@end",
        &mut props,
        &mut pieces,
        &mut diag,
    );

    assert_eq!(pieces.get("foo"), Some("first"));
    assert_eq!(
        diag.first().map(|e| &e.kind),
        Some(&SyntaxErrorKind::PieceRedefined("foo".to_string()))
    );
}

#[test]
fn insertpiece_is_transitive() {
    let mut props = PropertyTable::new();
    let (out, diag) = run_template(
        "@piece(B)X@end@piece(A)<@insertpiece(B)>@end@insertpiece(A)",
        &mut props,
    );
    assert!(diag.is_empty());
    assert_eq!(out, "<X>");
}

#[test]
fn pieces_from_piece_files_reach_the_template() {
    init_logger();
    let engine = TemplateEngine::new();
    let mut props = PropertyTable::from([("hlms_normal", 1)]);
    let mut pieces = Pieces::new();
    let mut diag = Diagnostics::new();

    engine.process_piece_file(
        "@property(hlms_normal)@piece(Attrs)in vec3 normal;@end@end",
        &mut props,
        &mut pieces,
        &mut diag,
    );
    let out = engine.process_template("@insertpiece(Attrs)\nvoid main() {}", &mut props, &mut pieces, &mut diag);

    assert!(diag.is_empty());
    assert_eq!(out, "in vec3 normal;\nvoid main() {}");
}

// ============================================================================
// Counters and arithmetic
// ============================================================================

#[test]
fn counters_number_bindings() {
    let mut props = PropertyTable::new();
    let (out, diag) = run_template(
        "@foreach(3, i)layout(location = @counter(loc)) in vec4 a@i;\n@end",
        &mut props,
    );
    assert!(diag.is_empty());
    assert_eq!(
        out,
        "layout(location = 0) in vec4 a0;\nlayout(location = 1) in vec4 a1;\nlayout(location = 2) in vec4 a2;\n"
    );
    assert_eq!(props.get("loc"), 3);
}

#[test]
fn math_directives_update_properties() {
    let mut props = PropertyTable::from([("base", 4)]);
    let (out, diag) = run_template(
        "@pset(x, base)@pmul(x, 3)@psub(x, 2)@pdiv(x, 0)@property(x)@value(x)@end",
        &mut props,
    );
    assert_eq!(out, "10");
    assert_eq!(
        diag.first().map(|e| &e.kind),
        Some(&SyntaxErrorKind::DivisionByZero("pdiv"))
    );
}

// ============================================================================
// Includes
// ============================================================================

#[test]
fn include_inserts_line_directives() {
    let loader = |name: &str| (name == "common.glsl").then(|| "float pi;".to_string());
    let out = resolve_includes("#version 330\n#include \"common.glsl\"\nvoid main() {}", "vs", &loader)
        .unwrap();
    assert_eq!(out, "#version 330\n#line 1\nfloat pi;\n#line 3\nvoid main() {}");
}

#[test]
fn include_missing_file_is_fatal() {
    let loader = |_: &str| None::<String>;
    assert!(matches!(
        resolve_includes("#include <nope.glsl>\n", "vs", &loader),
        Err(SigilError::Include { .. })
    ));
}
