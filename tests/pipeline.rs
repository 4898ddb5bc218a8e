//! Preprocess files on disk, then parse, check and bind the result.
mod common;

use common::Project;
use cxxfront::StringId;
use cxxfront::semantic::{Control, Overview, SemanticOptions};
use cxxfront::translation_unit::TranslationUnit;

#[test]
fn test_preprocessed_source_checks_and_binds() {
    let project = Project::new();
    project.write(
        "include/decl.h",
        "#ifndef DECL_H\n#define DECL_H\n#define DECLARE(type, name) type name;\n#endif\n",
    );
    let main = project.write(
        "src/main.cpp",
        "#include \"decl.h\"\n\
         namespace app {\n\
         DECLARE(int, count)\n\
         DECLARE(const char *, label)\n\
         int next() { return count + 1; }\n\
         }\n\
         using namespace app;\n",
    );

    let mut pp = project.driver();
    let source = pp.preprocess(&main);
    assert!(!source.contains("DECLARE"));

    let mut unit = TranslationUnit::new(&main, source);
    let mut control = Control::new();
    let global = unit.check(&mut control, None, SemanticOptions::default());
    assert!(unit.diagnostics().is_empty(), "{:?}", unit.diagnostics().diagnostics);

    let Some(members) = control.symbol(global).members() else {
        panic!("no global scope");
    };
    // the namespace and the using-directive share the name
    let app = control.lookat(members, StringId::new("app"));
    assert_eq!(app.len(), 2);
    let directives = app
        .iter()
        .filter(|&&symbol| control.symbol(symbol).is_using_namespace_directive())
        .count();
    assert_eq!(directives, 1);
    let Some(&namespace) = app.iter().find(|&&symbol| control.symbol(symbol).is_namespace()) else {
        panic!("no namespace app");
    };
    let Some(app_members) = control.symbol(namespace).members() else {
        panic!("namespace without scope");
    };

    let overview = Overview::new();
    let declared: Vec<String> = control
        .scope(app_members)
        .symbols()
        .iter()
        .map(|&symbol| {
            let symbol = control.symbol(symbol);
            overview.pretty_type(&control, symbol.ty(), symbol.name)
        })
        .collect();
    assert_eq!(declared, ["int count", "const char *label", "int next()"]);

    // lines of the preprocessed text match the original file
    let count = control.lookat(app_members, StringId::new("count"))[0];
    assert_eq!(control.symbol(count).location.line, 3);
    assert_eq!(control.symbol(count).location.file_name.as_str(), main);

    let bindings = unit.bind(&control, global);
    assert!(unit.diagnostics().is_empty(), "{:?}", unit.diagnostics().diagnostics);
    let root = bindings.root();
    assert_eq!(bindings[root].children.len(), 1);
    assert_eq!(bindings[root].usings, [bindings[root].children[0]]);
    assert_eq!(bindings.qualified_id(&control, bindings[root].children[0]), "app");
}
