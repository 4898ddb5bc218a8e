use super::semantic_common::setup_semantic;
use crate::StringId;
use crate::semantic::{Control, SemanticOptions};
use crate::translation_unit::TranslationUnit;

#[test]
fn test_reopened_namespace_binds_once() {
    let mut checked = setup_semantic("namespace N { int x; }\nnamespace N { int y; }\n");
    let global = checked.global_members();
    // every namespace block is its own symbol
    assert_eq!(checked.summary(global), ["Namespace N", "Namespace N"]);

    let bindings = checked.unit.bind(&checked.control, checked.global);
    let root = bindings.root();
    assert_eq!(bindings[root].children.len(), 1);
    let n = bindings[root].children[0];
    assert_eq!(bindings.qualified_id(&checked.control, n), "N");
    assert_eq!(bindings[n].symbols.len(), 2);

    let names: Vec<String> = bindings[n]
        .symbols
        .iter()
        .flat_map(|&namespace| checked.summary(checked.members(namespace)))
        .collect();
    assert_eq!(names, ["Declaration x", "Declaration y"]);
    assert!(checked.unit.diagnostics().is_empty());
}

#[test]
fn test_using_directives_resolve_through_bindings() {
    let mut checked = setup_semantic(
        "namespace A { namespace B { int b; } }\n\
         namespace C { using namespace A; using namespace B; }\n\
         using namespace A::B;\n\
         namespace { int hidden; }\n",
    );
    let bindings = checked.unit.bind(&checked.control, checked.global);
    assert!(checked.unit.diagnostics().is_empty(), "{:?}", checked.unit.diagnostics());

    insta::assert_snapshot!(bindings.dump(&checked.control).trim_end(), @r"
    namespace <global> (1 symbols) using A::B
      namespace A (1 symbols)
        namespace A::B (1 symbols)
      namespace C (1 symbols) using A using A::B
      namespace <anonymous> (1 symbols)
    ");
}

#[test]
fn test_unknown_namespace_reports_error() {
    let mut checked = setup_semantic("namespace A {}\nusing namespace Missing;\n");
    let bindings = checked.unit.bind(&checked.control, checked.global);
    assert!(bindings[bindings.root()].usings.is_empty());
    let diagnostics: Vec<String> = checked
        .unit
        .diagnostics()
        .diagnostics
        .iter()
        .map(|d| d.to_string())
        .collect();
    assert_eq!(diagnostics.len(), 1);
    assert!(diagnostics[0].starts_with("test.cpp:2:"));
    assert!(diagnostics[0].ends_with("error: expected namespace-name"));
}

#[test]
fn test_units_share_one_symbol_forest() {
    let _ = env_logger::try_init();
    let mut control = Control::new();
    let mut first = TranslationUnit::new("a.cpp", "namespace N { int x; }\n");
    let global = first.check(&mut control, None, SemanticOptions::default());
    let mut second = TranslationUnit::new("b.cpp", "namespace N { int y; }\nint z;\n");
    let shared = second.check(&mut control, Some(global), SemanticOptions::default());
    assert_eq!(shared, global);

    let Some(members) = control.symbol(global).members() else {
        panic!("global namespace has no members");
    };
    assert_eq!(control.scope(members).symbol_count(), 3);
    assert_eq!(control.lookat(members, StringId::new("N")).len(), 2);

    let files: Vec<&str> = control
        .scope(members)
        .symbols()
        .iter()
        .map(|&symbol| control.symbol(symbol).location.file_name.as_str())
        .collect();
    assert_eq!(files, ["a.cpp", "b.cpp", "b.cpp"]);

    let bindings = second.bind(&control, global);
    let root = bindings.root();
    assert_eq!(bindings[root].children.len(), 1);
    assert_eq!(bindings[bindings[root].children[0]].symbols.len(), 2);
}
