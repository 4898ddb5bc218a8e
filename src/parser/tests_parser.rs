#![cfg(test)]
use crate::ast::{Ast, NodeKind, NodeRef, Visitor, accept};
use crate::lang_options::LanguageFeatures;
use crate::parser::ParserOptions;
use crate::translation_unit::{ParseMode, TranslationUnit};

fn parse_with(source: &str, features: LanguageFeatures, options: ParserOptions) -> TranslationUnit {
    let _ = env_logger::try_init();
    let mut unit = TranslationUnit::new("test.cpp", source)
        .with_features(features)
        .with_options(options);
    unit.parse(ParseMode::TranslationUnit);
    unit
}

fn parse(source: &str) -> TranslationUnit {
    parse_with(source, LanguageFeatures::default(), ParserOptions::default())
}

/// Parse and require a clean result
fn parse_clean(source: &str) -> TranslationUnit {
    let unit = parse(source);
    let messages: Vec<String> = unit.diagnostics().diagnostics.iter().map(|d| d.to_string()).collect();
    assert!(messages.is_empty(), "unexpected diagnostics: {messages:?}");
    unit
}

fn parse_expression(source: &str) -> (TranslationUnit, NodeRef) {
    let _ = env_logger::try_init();
    let mut unit = TranslationUnit::new("test.cpp", source);
    let expression = unit.parse(ParseMode::Expression).expect("expected an expression");
    assert!(unit.diagnostics().is_empty());
    (unit, expression)
}

fn declarations(unit: &TranslationUnit) -> Vec<NodeRef> {
    match &unit.ast()[unit.root().unwrap()] {
        NodeKind::TranslationUnitDecl(root) => root.declarations.to_vec(),
        other => panic!("unexpected root {}", other.kind_name()),
    }
}

fn kind_names(unit: &TranslationUnit, nodes: &[NodeRef]) -> Vec<&'static str> {
    nodes.iter().map(|&node| unit.ast()[node].kind_name()).collect()
}

/// Every node of a kind reachable from `root`, in walk order
struct Collect {
    kind: &'static str,
    found: Vec<NodeRef>,
}

impl Visitor for Collect {
    fn pre_visit(&mut self, ast: &Ast, node: NodeRef) -> bool {
        if self.kind.is_empty() || ast[node].kind_name() == self.kind {
            self.found.push(node);
        }
        true
    }
}

fn find_all(unit: &TranslationUnit, kind: &'static str) -> Vec<NodeRef> {
    let mut collect = Collect {
        kind,
        found: Vec::new(),
    };
    accept(unit.ast(), unit.root().unwrap(), &mut collect);
    collect.found
}

fn find(unit: &TranslationUnit, kind: &'static str) -> NodeRef {
    find_all(unit, kind)
        .first()
        .copied()
        .unwrap_or_else(|| panic!("no {kind} in tree"))
}

#[test]
fn test_simple_declaration() {
    let unit = parse_clean("int x = 1;");
    insta::assert_snapshot!(unit.dump(unit.root().unwrap()).trim_end(), @r"
    TranslationUnitDecl
      SimpleDeclaration `;`
        SimpleSpecifier `int`
        Declarator `=`
          DeclaratorId
            SimpleName `x`
          NumericLiteral `1`
    ");
}

#[test]
fn test_binary_precedence() {
    let (unit, expression) = parse_expression("a = b + c * d");
    insta::assert_snapshot!(unit.dump(expression).trim_end(), @r"
    BinaryExpression `=`
      SimpleName `a`
      BinaryExpression `+`
        SimpleName `b`
        BinaryExpression `*`
          SimpleName `c`
          SimpleName `d`
    ");
}

#[test]
fn test_assignment_is_right_associative() {
    let (unit, expression) = parse_expression("a = b = c ? d : e");
    let NodeKind::BinaryExpression(outer) = &unit.ast()[expression] else {
        panic!("expected a binary expression");
    };
    let NodeKind::BinaryExpression(inner) = &unit.ast()[outer.right.unwrap()] else {
        panic!("expected a nested assignment");
    };
    assert_eq!(unit.ast()[inner.right.unwrap()].kind_name(), "ConditionalExpression");
}

#[test]
fn test_cast_and_parenthesized_expressions() {
    let (unit, expression) = parse_expression("(int) x");
    assert_eq!(unit.ast()[expression].kind_name(), "CastExpression");

    let (unit, expression) = parse_expression("(a + b) * c");
    let NodeKind::BinaryExpression(product) = &unit.ast()[expression] else {
        panic!("expected a binary expression");
    };
    assert_eq!(unit.ast()[product.left.unwrap()].kind_name(), "NestedExpression");
}

#[test]
fn test_postfix_chain() {
    let (unit, expression) = parse_expression("p->items[i].size()++");
    let NodeKind::PostfixExpression(postfix) = &unit.ast()[expression] else {
        panic!("expected a postfix expression");
    };
    assert_eq!(
        kind_names(&unit, &postfix.postfix_expressions),
        ["MemberAccess", "ArrayAccess", "MemberAccess", "Call", "PostIncrDecr"]
    );
}

#[test]
fn test_template_id_call() {
    let (unit, expression) = parse_expression("make<int, 2>(1)");
    let NodeKind::PostfixExpression(postfix) = &unit.ast()[expression] else {
        panic!("expected a postfix expression");
    };
    let NodeKind::TemplateId(template_id) = &unit.ast()[postfix.base_expression.unwrap()] else {
        panic!("expected a template-id");
    };
    assert_eq!(template_id.template_arguments.len(), 2);
    assert_eq!(kind_names(&unit, &postfix.postfix_expressions), ["Call"]);
}

#[test]
fn test_new_sizeof_and_compound_literal() {
    let (unit, expression) = parse_expression("new (buffer) int[10]");
    let NodeKind::NewExpression(new) = &unit.ast()[expression] else {
        panic!("expected a new expression");
    };
    assert!(new.new_placement.is_some());
    let NodeKind::NewTypeId(type_id) = &unit.ast()[new.new_type_id.unwrap()] else {
        panic!("expected a new type-id");
    };
    assert_eq!(type_id.new_array_declarators.len(), 1);

    let (unit, expression) = parse_expression("sizeof(unsigned long)");
    let NodeKind::SizeofExpression(sizeof) = &unit.ast()[expression] else {
        panic!("expected sizeof");
    };
    assert_eq!(unit.ast()[sizeof.expression.unwrap()].kind_name(), "TypeId");

    let (unit, expression) = parse_expression("(struct P){1, 2}");
    let NodeKind::CompoundLiteral(literal) = &unit.ast()[expression] else {
        panic!("expected a compound literal");
    };
    let NodeKind::ArrayInitializer(initializer) = &unit.ast()[literal.initializer.unwrap()] else {
        panic!("expected a brace initializer");
    };
    assert_eq!(initializer.expressions.len(), 2);
}

#[test]
fn test_cpp_casts_and_string_chain() {
    let (unit, expression) = parse_expression("static_cast<const char *>(\"a\" \"b\")");
    let NodeKind::CppCastExpression(cast) = &unit.ast()[expression] else {
        panic!("expected a C++ cast");
    };
    let NodeKind::StringLiteral(first) = &unit.ast()[cast.expression.unwrap()] else {
        panic!("expected a string literal");
    };
    let NodeKind::StringLiteral(second) = &unit.ast()[first.next.unwrap()] else {
        panic!("expected a chained literal");
    };
    assert!(second.next.is_none());
}

#[test]
fn test_qt_signal_and_slot_arguments() {
    let (unit, expression) = parse_expression("connect(a, SIGNAL(clicked(int)), b, SLOT(go()))");
    let NodeKind::PostfixExpression(postfix) = &unit.ast()[expression] else {
        panic!("expected a call");
    };
    let NodeKind::Call(call) = &unit.ast()[postfix.postfix_expressions[0]] else {
        panic!("expected a call");
    };
    assert_eq!(
        kind_names(&unit, &call.expressions),
        ["SimpleName", "QtMethod", "SimpleName", "QtMethod"]
    );
}

#[test]
fn test_function_definition() {
    let unit = parse_clean("int add(int a, int b) { return a + b; }");
    let decls = declarations(&unit);
    assert_eq!(kind_names(&unit, &decls), ["FunctionDefinition"]);
    let NodeKind::CompoundStatement(body) = &unit.ast()[find(&unit, "CompoundStatement")] else {
        unreachable!();
    };
    assert_eq!(kind_names(&unit, &body.statements), ["ReturnStatement"]);
    assert_eq!(find_all(&unit, "ParameterDeclaration").len(), 2);
}

#[test]
fn test_skip_function_bodies() {
    let options = ParserOptions {
        skip_function_bodies: true,
        ..Default::default()
    };
    let unit = parse_with(
        "void f() { if (x) { g(); } else { h(; } }\nint y;",
        LanguageFeatures::default(),
        options,
    );
    assert!(unit.diagnostics().is_empty());
    let decls = declarations(&unit);
    assert_eq!(kind_names(&unit, &decls), ["FunctionDefinition", "SimpleDeclaration"]);
    let NodeKind::CompoundStatement(body) = &unit.ast()[find(&unit, "CompoundStatement")] else {
        unreachable!();
    };
    assert!(body.statements.is_empty());
    assert_ne!(body.rbrace, 0);
}

#[test]
fn test_constructor_declaration_drops_type_specifier() {
    let unit = parse_clean("struct S { S(int); int value; };");
    let NodeKind::ClassSpecifier(class) = &unit.ast()[find(&unit, "ClassSpecifier")] else {
        unreachable!();
    };
    let NodeKind::SimpleDeclaration(ctor) = &unit.ast()[class.member_specifiers[0]] else {
        panic!("expected a member declaration");
    };
    assert!(ctor.decl_specifiers.is_empty());
    assert_eq!(ctor.declarators.len(), 1);
    let NodeKind::SimpleDeclaration(member) = &unit.ast()[class.member_specifiers[1]] else {
        panic!("expected a member declaration");
    };
    assert_eq!(member.decl_specifiers.len(), 1);
}

#[test]
fn test_class_with_bases_and_qt_sections() {
    let unit = parse_clean(
        "class W : public virtual Base, private Other {\n\
         public slots:\n  void f();\n\
         signals:\n  void g(int);\n\
         private:\n  int n : 3;\n};",
    );
    let NodeKind::ClassSpecifier(class) = &unit.ast()[find(&unit, "ClassSpecifier")] else {
        unreachable!();
    };
    assert_eq!(class.base_clause.len(), 2);
    assert_eq!(
        kind_names(&unit, &class.member_specifiers),
        [
            "AccessDeclaration",
            "SimpleDeclaration",
            "AccessDeclaration",
            "SimpleDeclaration",
            "AccessDeclaration",
            "SimpleDeclaration"
        ]
    );
    let NodeKind::AccessDeclaration(slots) = &unit.ast()[class.member_specifiers[0]] else {
        unreachable!();
    };
    assert_ne!(slots.slots_kw, 0);
}

#[test]
fn test_namespaces_templates_and_linkage() {
    let unit = parse_clean(
        "namespace N { int x; }\n\
         namespace M = N;\n\
         using namespace N;\n\
         using N::x;\n\
         template <typename T, int Size> class Box { T items[Size]; };\n\
         extern \"C\" { void f(); }",
    );
    let decls = declarations(&unit);
    assert_eq!(
        kind_names(&unit, &decls),
        [
            "Namespace",
            "NamespaceAliasDefinition",
            "UsingDirective",
            "UsingDeclaration",
            "TemplateDeclaration",
            "LinkageSpecification"
        ]
    );
    let NodeKind::TemplateDeclaration(template) = &unit.ast()[decls[4]] else {
        unreachable!();
    };
    assert_eq!(
        kind_names(&unit, &template.template_parameters),
        ["TypenameTypeParameter", "ParameterDeclaration"]
    );
}

#[test]
fn test_enum_specifier() {
    let unit = parse_clean("enum Color { Red, Green = 2, Blue, };");
    let NodeKind::EnumSpecifier(specifier) = &unit.ast()[find(&unit, "EnumSpecifier")] else {
        unreachable!();
    };
    assert_eq!(specifier.enumerators.len(), 3);
}

#[test]
fn test_expression_or_declaration_statement() {
    let unit = parse_clean("void f() { a * b; g(x); T y(z); }");
    let NodeKind::CompoundStatement(body) = &unit.ast()[find(&unit, "CompoundStatement")] else {
        unreachable!();
    };
    assert_eq!(
        kind_names(&unit, &body.statements),
        ["ExpressionOrDeclarationStatement", "ExpressionStatement", "DeclarationStatement"]
    );

    // `T y(z);` also reads as a function declaration
    let NodeKind::FunctionDeclarator(function) = &unit.ast()[find(&unit, "FunctionDeclarator")] else {
        unreachable!();
    };
    assert!(function.as_cpp_initializer.is_none());
    let ambiguous = find_all(&unit, "FunctionDeclarator")
        .into_iter()
        .filter(|&node| matches!(&unit.ast()[node], NodeKind::FunctionDeclarator(d) if d.as_cpp_initializer.is_some()))
        .count();
    assert_eq!(ambiguous, 1);
}

#[test]
fn test_control_statements() {
    let unit = parse_clean(
        "void f() {\n\
           for (int i = 0; i < n; ++i) continue;\n\
           while (int k = next()) break;\n\
           do { x--; } while (x);\n\
           switch (x) { case 1: break; default: ; }\n\
           if (a) b(); else c();\n\
           try { g(); } catch (const E &e) { throw; } catch (...) {}\n\
           foreach (int v, values) use(v);\n\
           done: return;\n\
         }",
    );
    let NodeKind::CompoundStatement(body) = &unit.ast()[find(&unit, "CompoundStatement")] else {
        unreachable!();
    };
    assert_eq!(
        kind_names(&unit, &body.statements),
        [
            "ForStatement",
            "WhileStatement",
            "DoStatement",
            "SwitchStatement",
            "IfStatement",
            "TryBlockStatement",
            "ForeachStatement",
            "LabeledStatement"
        ]
    );
    assert_eq!(find_all(&unit, "CatchClause").len(), 2);
    assert_eq!(find_all(&unit, "Condition").len(), 1);
}

#[test]
fn test_objc_message_and_interface() {
    let unit = parse_clean(
        "@interface Foo : NSObject <Proto>\n\
         - (int)add:(int)a to:(int)b;\n\
         @end\n\
         void f() { [obj add:1 to:2]; }",
    );
    let decls = declarations(&unit);
    assert_eq!(kind_names(&unit, &decls), ["ObjCClassDeclaration", "FunctionDefinition"]);
    let NodeKind::ObjCMessageExpression(message) = &unit.ast()[find(&unit, "ObjCMessageExpression")] else {
        unreachable!();
    };
    assert_eq!(message.arguments.len(), 2);
    assert_eq!(unit.ast()[message.selector.unwrap()].kind_name(), "ObjCSelectorWithArguments");
}

#[test]
fn test_recovery_keeps_following_declarations() {
    let unit = parse(") int a; int b; int c;");
    assert!(unit.diagnostics().has_errors());
    let decls = declarations(&unit);
    assert_eq!(kind_names(&unit, &decls), ["SimpleDeclaration"; 3]);
}

#[test]
fn test_missing_semicolon_after_class() {
    let unit = parse("struct S { int a; }");
    let diagnostics = &unit.diagnostics().diagnostics;
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].text, "expected token `;' got `<eof>'");
    assert_eq!(diagnostics[0].line, 1);
    assert_eq!(declarations(&unit).len(), 1);
}

#[test]
fn test_depth_limit_reported_once() {
    let options = ParserOptions {
        max_depth: 16,
        ..Default::default()
    };
    let source = format!("int x = {}1{};\nint y;", "(".repeat(40), ")".repeat(40));
    let unit = parse_with(&source, LanguageFeatures::default(), options);
    let too_deep = unit
        .diagnostics()
        .diagnostics
        .iter()
        .filter(|d| d.text == "too deeply nested")
        .count();
    assert_eq!(too_deep, 1);
}

#[test]
fn test_token_spans_nest() {
    let unit = parse_clean(
        "namespace N { template <class T> struct A : B<T> { int f(int x = 1) const { return x * 2; } }; }\n\
         int g() { int a[3] = {1, 2, 3}; return a[0] ? sizeof a : -1; }\n\
         class D : public virtual B {};",
    );
    let ast = unit.ast();
    for node in find_all(&unit, "") {
        let (first, last) = (ast.first_token(node), ast.last_token(node));
        if first == 0 {
            continue;
        }
        assert!(first < last, "{} spans {first}..{last}", ast[node].kind_name());
        for child in ast[node].children() {
            let child_first = ast.first_token(child);
            if child_first == 0 {
                continue;
            }
            assert!(first <= child_first && ast.last_token(child) <= last);
        }
    }
}

#[test]
fn test_base_specifier_spans_both_keywords() {
    let unit = parse_clean("class D : public virtual B, virtual protected C {};");
    let ast = unit.ast();
    let spans: Vec<(&str, &str)> = find_all(&unit, "BaseSpecifier")
        .into_iter()
        .map(|base| {
            let first = unit.token(ast.first_token(base)).text.as_str();
            let last = unit.token(ast.last_token(base) - 1).text.as_str();
            (first, last)
        })
        .collect();
    assert_eq!(spans, [("public", "B"), ("virtual", "C")]);
}

#[test]
fn test_operator_function_ids() {
    let unit = parse_clean("struct S { S &operator=(const S &); void *operator new[](unsigned long); bool operator()() const; };");
    let ast = unit.ast();
    let spellings: Vec<String> = find_all(&unit, "Operator")
        .into_iter()
        .map(|op| {
            let (first, last) = (ast.first_token(op), ast.last_token(op));
            (first..last).map(|t| unit.token(t).text.as_str()).collect()
        })
        .collect();
    assert_eq!(spellings, ["=", "new[]", "()"]);
}
