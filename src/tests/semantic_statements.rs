use super::semantic_common::setup_semantic;
use crate::ast::NodeKind;

#[test]
fn test_statement_blocks() {
    let checked = setup_semantic(
        "int main(int argc) {\n\
           int total = 0;\n\
           for (int i = 0; i < argc; ++i) { total += i; }\n\
           if (int *p = 0) { }\n\
           while (total) { --total; }\n\
           try { } catch (int e) { }\n\
           return total;\n\
         }\n",
    );
    assert!(checked.diagnostics().is_empty(), "{:?}", checked.diagnostics());

    let main = checked.find(checked.global_members(), "main");
    let Some(function) = checked.control.symbol(main).as_function() else {
        panic!("main is not a function");
    };
    assert_eq!(checked.summary(function.arguments), ["Argument argc"]);

    let body = checked.control.scope(function.members).symbols()[0];
    let body = checked.members(body);
    assert_eq!(
        checked.summary(body),
        ["Declaration total", "Block", "Block", "Block", "Block", "Block"]
    );

    let blocks = &checked.control.scope(body).symbols()[1..];
    let for_block = checked.members(blocks[0]);
    assert_eq!(checked.summary(for_block), ["Declaration i", "Block"]);
    let if_block = checked.members(blocks[1]);
    assert_eq!(checked.summary(if_block), ["Declaration p", "Block"]);
    assert_eq!(checked.declared(checked.find(if_block, "p")), "int *p");
    let while_block = checked.members(blocks[2]);
    assert_eq!(checked.summary(while_block), ["Block"]);
    // the try body, then the catch clause with its handler
    assert!(checked.control.scope(checked.members(blocks[3])).is_empty());
    let catch_block = checked.members(blocks[4]);
    assert_eq!(checked.summary(catch_block), ["Declaration e", "Block"]);
}

#[test]
fn test_blocks_are_recorded_on_the_ast() {
    let checked = setup_semantic("void f() { { int inner; } }");
    let ast = checked.unit.ast();
    let blocks: Vec<_> = ast
        .iter()
        .filter_map(|(_, node)| match node {
            NodeKind::CompoundStatement(compound) => compound.symbol.get(),
            _ => None,
        })
        .collect();
    assert_eq!(blocks.len(), 2);
    assert!(blocks.iter().all(|&block| checked.control.symbol(block).is_block()));

    let f = checked.find(checked.global_members(), "f");
    let outer = checked.control.scope(checked.members(f)).symbols()[0];
    assert!(blocks.contains(&outer));
}

#[test]
fn test_local_declarations_and_classes() {
    let checked = setup_semantic(
        "void f() {\n\
           struct Local { int x; } value;\n\
           using namespace std;\n\
           int a = 1, b = a;\n\
         }\n",
    );
    assert!(checked.diagnostics().is_empty(), "{:?}", checked.diagnostics());
    let f = checked.find(checked.global_members(), "f");
    let body = checked.control.scope(checked.members(f)).symbols()[0];
    assert_eq!(
        checked.summary(checked.members(body)),
        [
            "Class Local",
            "Declaration value",
            "UsingNamespaceDirective std",
            "Declaration a",
            "Declaration b",
        ]
    );
}
