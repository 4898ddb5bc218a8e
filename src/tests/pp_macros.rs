use super::pp_common::{Event, Recording, preprocess, record, record_with_headers};
use crate::StringId;
use crate::pp::{Environment, MacroArgumentReference, Preprocessor};

#[test]
fn test_output_has_nothing_left_to_expand() {
    let output = preprocess("#define A 1\nA");
    assert_eq!(output, "\n1");
    assert_eq!(preprocess(&output), output);
}

#[test]
fn test_expansion_hooks_report_invocation_and_arguments() {
    let (output, client) = record("#define ADD(a, b) a + b\nint x = ADD(1, (2, 3));\n");
    assert_eq!(output, "\nint x = 1 + (2, 3);\n");
    assert_eq!(
        client.events,
        [
            Event::MacroAdded("ADD(a, b) a + b".into()),
            Event::StartExpanding {
                offset: 32,
                name: "ADD".into(),
                text: "ADD(1, (2, 3))".into(),
                actuals: vec![MacroArgumentReference::new(36, 1), MacroArgumentReference::new(39, 6)],
            },
            Event::StopExpanding(32, "ADD".into()),
        ]
    );
}

#[test]
fn test_nested_expansions_report_only_the_outer_macro() {
    let (output, client) = record("#define ONE 1\n#define TWO ONE + ONE\nTWO\n");
    assert_eq!(output, "\n\n1 + 1\n");
    let expanded: Vec<&Event> = client
        .events
        .iter()
        .filter(|event| matches!(event, Event::StartExpanding { .. }))
        .collect();
    assert_eq!(
        expanded,
        [&Event::StartExpanding {
            offset: 36,
            name: "TWO".into(),
            text: "TWO".into(),
            actuals: vec![],
        }]
    );
}

#[test]
fn test_undef_removes_macro() {
    assert_eq!(preprocess("#define A 1\n#undef A\nA\n"), "\n\nA\n");
}

#[test]
fn test_if_expressions() {
    let source = "#if 0x10 == 16 && 'A' == 65 && (1 ? 2 : 0) == 2\nok\n#endif\n";
    assert_eq!(preprocess(source), "\nok\n\n");
    let source = "#define V 3\n#if V > 2 && defined V && !defined(W)\nok\n#endif\n";
    assert_eq!(preprocess(source), "\n\nok\n\n");
}

#[test]
fn test_division_by_zero_takes_false_branch() {
    let (output, client) = record("#if 1 / 0\nyes\n#else\nno\n#endif\n");
    assert_eq!(output, "\n\n\nno\n\n");
    assert_eq!(
        client.messages(),
        ["test.cpp:1:0: error: division by zero in preprocessor expression"]
    );
}

#[test]
fn test_unmatched_and_unterminated_conditionals() {
    let (output, client) = record("#endif\nint x;\n");
    assert_eq!(output, "\nint x;\n");
    assert_eq!(client.messages(), ["test.cpp:1:0: error: #endif without #if"]);

    let (_, client) = record("#else\n#elif 1\n");
    assert_eq!(
        client.messages(),
        [
            "test.cpp:1:0: error: #else without #if",
            "test.cpp:2:0: error: #elif without #if",
        ]
    );

    let (output, client) = record("#if 1\nint x;\n");
    assert_eq!(output, "\nint x;\n");
    assert_eq!(client.diagnostics.len(), 1);
    assert!(client.diagnostics[0].is_error());
    assert_eq!(client.diagnostics[0].text, "unterminated conditional directive");
}

#[test]
fn test_wrong_argument_count_warns() {
    let (output, client) = record("#define F(a, b) a\nF(1)\n");
    assert_eq!(output, "\n1\n");
    assert_eq!(
        client.messages(),
        ["test.cpp:2:0: warning: macro `F' used with the wrong number of arguments"]
    );
}

#[test]
fn test_skipped_blocks_span_excluded_lines() {
    let (output, client) = record("#if 0\nint a;\n#endif\nint b;\n");
    assert_eq!(output, "\n\n\nint b;\n");
    assert_eq!(client.skipped(), [(6, 13)]);

    let (_, client) = record("#if 1\na\n#else\nb\n#endif\n");
    assert_eq!(client.skipped(), [(14, 16)]);
}

#[test]
fn test_elif_chain_skips_every_branch_but_one() {
    let (output, client) = record("#if 0\na\n#elif 1\nb\n#else\nc\n#endif\n");
    assert_eq!(output, "\n\n\nb\n\n\n\n");
    assert_eq!(client.skipped(), [(6, 8), (24, 26)]);
}

#[test]
fn test_directives_after_else_are_errors() {
    let (output, client) = record("#if 1\na\n#else\nb\n#else\nc\n#elif 1\nd\n#endif\n");
    assert_eq!(output, format!("\na\n{}", "\n".repeat(7)));
    assert_eq!(client.skipped(), [(14, 34)]);
    assert_eq!(
        client.messages(),
        [
            "test.cpp:5:0: error: #else after #else",
            "test.cpp:7:0: error: #elif after #else",
        ]
    );
}

#[test]
fn test_nested_skipped_groups_report_once() {
    let (output, client) = record("#if 0\n#if 1\n#endif\n#endif\nx\n");
    assert_eq!(output, "\n\n\n\nx\n");
    assert_eq!(client.skipped(), [(6, 19)]);
}

#[test]
fn test_included_macros_are_visible_after_include() {
    let (output, client) = record_with_headers(
        "#include \"a.h\"\nint v = V;\n#include <missing.h>\n",
        &[("a.h", "#define V 7\n")],
    );
    assert_eq!(output, "\nint v = 7;\n\n");
    assert_eq!(
        client.events,
        [
            Event::Include("a.h".into()),
            Event::MacroAdded("V 7".into()),
            Event::Processed("a.h".into()),
            Event::StartExpanding {
                offset: 23,
                name: "V".into(),
                text: "V".into(),
                actuals: vec![],
            },
            Event::StopExpanding(23, "V".into()),
            Event::Include("missing.h".into()),
        ]
    );
}

#[test]
fn test_include_depth_abandons_inner_file() {
    let _ = env_logger::try_init();
    let mut client = Recording {
        headers: vec![
            ("a.h".into(), "#include \"b.h\"\n#define A 1\n".into()),
            ("b.h".into(), "int b;\n".into()),
        ],
        ..Default::default()
    };
    let mut env = Environment::new();
    let output = Preprocessor::new(&mut client, &mut env)
        .with_max_include_depth(1)
        .run("test.cpp", "#include \"a.h\"\nA\n");
    assert_eq!(output, Ok("\nA\n".to_string()));
    assert_eq!(client.messages(), ["a.h:0:0: fatal: #include nested too deeply"]);
    assert!(client.events.contains(&Event::Processed("a.h".into())));
    assert!(!client.events.contains(&Event::Processed("b.h".into())));
    assert!(!env.is_defined(StringId::new("A")));
}

#[test]
fn test_builtin_file_expands_at_the_use_site() {
    let mut client = Recording {
        headers: vec![("dir/inc.h".into(), "#define WHERE __FILE__\n".into())],
        ..Default::default()
    };
    let mut env = Environment::new();
    let output = Preprocessor::new(&mut client, &mut env).run("main.cpp", "#include \"dir/inc.h\"\nWHERE __FILE__\n");
    assert_eq!(output, Ok("\n\"main.cpp\" \"main.cpp\"\n".to_string()));

    // macros keep the file they were defined in
    let defined_in = env
        .resolve(StringId::new("WHERE"))
        .map(|m| m.file_name.clone());
    assert_eq!(defined_in, Some("dir/inc.h".to_string()));
}
