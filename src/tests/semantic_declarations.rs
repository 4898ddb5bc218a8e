use super::semantic_common::{setup_semantic, setup_semantic_with};
use crate::semantic::{ClassKey, MethodKey, SemanticOptions, Storage, SymbolKind, Visibility};

#[test]
fn test_redeclared_function_types_are_equal() {
    let checked = setup_semantic("int f(int);\nint f(int);\n");
    assert!(checked.diagnostics().is_empty());

    let declarations = checked.lookup(checked.global_members(), "f");
    assert_eq!(declarations.len(), 2);
    let first = checked.control.symbol(declarations[0]).ty();
    let second = checked.control.symbol(declarations[1]).ty();

    // two distinct function symbols
    assert_ne!(first.ty, second.ty);
    assert!(first.is_equal_to(&second, &checked.control));
    assert_eq!(checked.declared(declarations[0]), "int f(int)");
}

#[test]
fn test_different_signatures_are_not_equal() {
    let checked = setup_semantic("int f(int);\nint f(char);\nint f(int) const;\n");
    let declarations = checked.lookup(checked.global_members(), "f");
    assert_eq!(declarations.len(), 3);
    let types: Vec<_> = declarations
        .iter()
        .map(|&symbol| checked.control.symbol(symbol).ty())
        .collect();
    assert!(!types[0].is_equal_to(&types[1], &checked.control));
    assert!(!types[0].is_equal_to(&types[2], &checked.control));
}

#[test]
fn test_declarator_types() {
    let checked = setup_semantic(
        "int a, *b, c[4];\n\
         const char *name;\n\
         unsigned u;\n\
         int (*callback)(char);\n\
         typedef long size_type;\n\
         long long big;\n\
         int &r = a;\n",
    );
    assert!(checked.diagnostics().is_empty(), "{:?}", checked.diagnostics());

    let global = checked.global_members();
    let declared: Vec<String> = checked
        .control
        .scope(global)
        .symbols()
        .iter()
        .map(|&symbol| checked.declared(symbol))
        .collect();
    assert_eq!(
        declared,
        [
            "int a",
            "int *b",
            "int c[4]",
            "const char *name",
            "unsigned int u",
            "int (*callback)(char)",
            "long size_type",
            "long long big",
            "int &r",
        ]
    );

    let size_type = checked.find(global, "size_type");
    assert_eq!(checked.control.symbol(size_type).storage, Storage::Typedef);
    assert!(checked.control.symbol(size_type).is_typedef());
}

#[test]
fn test_class_members_and_visibility() {
    let checked = setup_semantic(
        "class Widget : public Base, virtual Mixin {\n\
           int value;\n\
         public:\n\
           Widget(int);\n\
           virtual ~Widget();\n\
           int get() const;\n\
         protected:\n\
           static int count;\n\
         };\n",
    );
    assert!(checked.diagnostics().is_empty(), "{:?}", checked.diagnostics());

    let global = checked.global_members();
    assert_eq!(checked.summary(global), ["Class Widget"]);
    let widget = checked.find(global, "Widget");
    let Some(class) = checked.control.symbol(widget).as_class() else {
        panic!("Widget is not a class");
    };
    assert_eq!(class.key, ClassKey::Class);

    let bases: Vec<_> = class
        .base_classes
        .iter()
        .map(|&base| {
            let symbol = checked.control.symbol(base);
            let is_virtual = matches!(symbol.kind, SymbolKind::BaseClass { is_virtual: true });
            (checked.control.symbol_identifier(base).map(|id| id.as_str()), symbol.visibility, is_virtual)
        })
        .collect();
    assert_eq!(
        bases,
        [
            (Some("Base"), Visibility::Public, false),
            (Some("Mixin"), Visibility::Private, true),
        ]
    );

    let members = checked.members(widget);
    assert_eq!(
        checked.summary(members),
        [
            "Declaration value",
            "Declaration Widget",
            "Declaration ~Widget",
            "Declaration get",
            "Declaration count",
        ]
    );
    let visibility = |name: &str| checked.control.symbol(checked.find(members, name)).visibility;
    assert_eq!(visibility("value"), Visibility::Private);
    assert_eq!(visibility("get"), Visibility::Public);
    assert_eq!(visibility("count"), Visibility::Protected);
    assert_eq!(checked.control.symbol(checked.find(members, "count")).storage, Storage::Static);
    assert_eq!(checked.declared(checked.find(members, "get")), "int get() const");
}

#[test]
fn test_struct_members_default_to_public() {
    let checked = setup_semantic("struct Point { int x, y; };");
    let point = checked.find(checked.global_members(), "Point");
    let members = checked.members(point);
    assert_eq!(checked.summary(members), ["Declaration x", "Declaration y"]);
    assert!(
        checked
            .control
            .scope(members)
            .symbols()
            .iter()
            .all(|&member| checked.control.symbol(member).is_public())
    );
}

#[test]
fn test_enum_declares_enumerators() {
    let checked = setup_semantic("enum Color { Red, Green = 2, Blue };\nColor c;\n");
    let global = checked.global_members();
    assert_eq!(checked.summary(global), ["Enum Color", "Declaration c"]);

    let color = checked.find(global, "Color");
    let members = checked.members(color);
    assert_eq!(
        checked.summary(members),
        ["Declaration Red", "Declaration Green", "Declaration Blue"]
    );
    let red = checked.control.symbol(checked.find(members, "Red")).ty();
    assert!(red.is_const());
    assert_eq!(red.ty, checked.control.symbol(color).ty().ty);
    assert_eq!(checked.declared(checked.find(global, "c")), "Color c");
}

#[test]
fn test_forward_class_declaration() {
    let checked = setup_semantic("class Later;\nstruct Later *next;\n");
    let global = checked.global_members();
    assert_eq!(
        checked.summary(global),
        ["ForwardClassDeclaration Later", "Declaration next"]
    );
}

#[test]
fn test_function_definition_scopes() {
    let checked = setup_semantic("int add(int a, int b = 1) { return a + b; }\n");
    assert!(checked.diagnostics().is_empty());

    let global = checked.global_members();
    assert_eq!(checked.summary(global), ["Function add"]);
    let add = checked.find(global, "add");
    let Some(function) = checked.control.symbol(add).as_function() else {
        panic!("add is not a function");
    };
    assert_eq!(checked.summary(function.arguments), ["Argument a", "Argument b"]);
    let has_initializer = |name: &str| {
        matches!(
            checked.control.symbol(checked.find(function.arguments, name)).kind,
            SymbolKind::Argument { has_initializer: true }
        )
    };
    assert!(!has_initializer("a"));
    assert!(has_initializer("b"));

    // the body block lives in the member scope
    assert_eq!(checked.summary(function.members), ["Block"]);
    assert_eq!(checked.declared(add), "int add(int, int)");

    let symbol = checked.control.symbol(add);
    assert_eq!(symbol.start_offset, 0);
    assert_eq!(symbol.end_offset as usize, checked.unit.source().trim_end().len());
}

#[test]
fn test_skipped_bodies_leave_member_scope_empty() {
    let options = SemanticOptions {
        skip_function_bodies: true,
        ..Default::default()
    };
    let checked = setup_semantic_with("void f() { int local; }", options);
    let f = checked.find(checked.global_members(), "f");
    assert!(checked.control.scope(checked.members(f)).is_empty());
}

#[test]
fn test_definition_needs_function_declarator() {
    let checked = setup_semantic("int x { }\n");
    assert_eq!(checked.diagnostics(), ["test.cpp:1:1: error: expected a function prototype"]);
    assert!(checked.control.scope(checked.global_members()).is_empty());
}

#[test]
fn test_base_initializers_need_constructor() {
    let checked = setup_semantic("int f() : x(1) { return 0; }\n");
    let diagnostics = checked.diagnostics();
    assert_eq!(diagnostics.len(), 1);
    assert!(diagnostics[0].ends_with("error: only constructors take base initializers"));
}

#[test]
fn test_qt_method_keys() {
    let checked = setup_semantic(
        "class W {\n\
         public slots:\n\
           void refresh();\n\
         signals:\n\
           void changed(int);\n\
           int count;\n\
         };\n",
    );
    let w = checked.find(checked.global_members(), "W");
    let members = checked.members(w);
    let method = |name: &str| {
        let declaration = checked.control.symbol(checked.find(members, name));
        let function = checked.control.type_symbol(declaration.ty());
        let key = function
            .and_then(|f| checked.control.symbol(f).as_function())
            .map(|f| f.method_key);
        (key, declaration.visibility)
    };
    assert_eq!(method("refresh"), (Some(MethodKey::Slot), Visibility::Public));
    assert_eq!(method("changed"), (Some(MethodKey::Signal), Visibility::Protected));

    let diagnostics = checked.diagnostics();
    assert_eq!(diagnostics.len(), 1);
    assert!(diagnostics[0].starts_with("test.cpp:6:"));
    assert!(diagnostics[0].ends_with("warning: expected a function declaration"));
}

#[test]
fn test_anonymous_arguments_of_public_methods() {
    let source = "class C { public: void set(int) {} private: void hidden(int) {} };";
    let quiet = setup_semantic(source);
    assert!(quiet.diagnostics().is_empty());

    let options = SemanticOptions {
        check_anonymous_arguments: true,
        ..Default::default()
    };
    let checked = setup_semantic_with(
        "struct C { void set(int) {} void get(int value) {} };\nvoid free(int) {}\n",
        options,
    );
    let diagnostics = checked.diagnostics();
    assert_eq!(diagnostics.len(), 1);
    assert!(diagnostics[0].ends_with("warning: anonymous argument"));
}

#[test]
fn test_template_parameters_attach_to_class() {
    let checked = setup_semantic("template <typename T, int N> class Array { T items[N]; };");
    let array = checked.find(checked.global_members(), "Array");
    let Some(parameters) = checked.control.symbol(array).template_parameters() else {
        panic!("Array has no template parameters");
    };
    assert!(checked.control.scope(parameters).is_template_parameter_scope());
    assert_eq!(checked.summary(parameters), ["Argument T", "Argument N"]);
}

#[test]
fn test_using_directive_in_class_is_an_error() {
    let checked = setup_semantic("namespace N {}\nstruct S { using namespace N; };\n");
    let diagnostics = checked.diagnostics();
    assert_eq!(diagnostics.len(), 1, "{:?}", diagnostics);
    assert!(diagnostics[0].ends_with("error: using-directive not within namespace or block scope"));
}
