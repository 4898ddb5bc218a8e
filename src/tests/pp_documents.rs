use super::pp_common::setup_driver;
use crate::pp::{CharBlock, CppPreprocessor, DocumentTree, IncludeType, MemoryProvider, PPConfig};

fn root_source(tree: &DocumentTree) -> String {
    match tree.root_document() {
        Some(doc) => doc.source.clone(),
        None => panic!("no document for {}", tree.root),
    }
}

#[test]
fn test_document_summary() {
    let mut pp = setup_driver(&[
        ("/src/main.cpp", "#include \"a.h\"\nint v = V;\n"),
        ("/src/a.h", "#define V 1\n"),
    ]);
    let tree = pp.run("/src/main.cpp");
    assert_eq!(root_source(&tree), "\nint v = 1;\n");

    insta::assert_yaml_snapshot!(tree.summary(), @r"
    - file_name: /src/main.cpp
      includes:
        - file_name: /src/a.h
          include_type: Local
          line: 1
      macros: []
      macro_uses:
        - - V
          - begin: 23
            end: 24
      skipped_blocks: []
      diagnostics: []
    - file_name: /src/a.h
      includes: []
      macros:
        - name: V
          file_name: /src/a.h
          line: 1
          text: V 1
      macro_uses: []
      skipped_blocks: []
      diagnostics: []
    ");
}

#[test]
fn test_search_order() {
    let mut pp = setup_driver(&[
        (
            "/src/main.cpp",
            "#include \"lib.h\"\n#include \"sys.h\"\n#include <sys.h>\n",
        ),
        ("/src/include/lib.h", ""),
        ("/usr/include/sys.h", ""),
        ("/opt/include/sys.h", ""),
    ]);
    let tree = pp.run("/src/main.cpp");
    let Some(root) = tree.root_document() else {
        panic!("no root document");
    };
    let includes: Vec<(&str, IncludeType)> = root
        .includes
        .iter()
        .map(|include| (include.file_name.as_str(), include.include_type))
        .collect();
    assert_eq!(
        includes,
        [
            ("/src/include/lib.h", IncludeType::Local),
            ("/usr/include/sys.h", IncludeType::Local),
            ("/usr/include/sys.h", IncludeType::Global),
        ]
    );
    assert!(!tree.contains("/opt/include/sys.h"));

    // the quoted include only reached the global paths
    let warnings: Vec<String> = root.diagnostics.iter().map(|d| d.to_string()).collect();
    assert_eq!(
        warnings,
        ["/src/main.cpp:2:0: warning: /usr/include/sys.h: is included as a local include but was only found in the global include path."]
    );
}

#[test]
fn test_include_next_continues_after_current_path() {
    let mut pp = setup_driver(&[
        ("/src/main.cpp", "#include <limits.h>\nint m = MAX;\n"),
        ("/usr/include/limits.h", "#include_next <limits.h>\n#define MAX INNER + 1\n"),
        ("/opt/include/limits.h", "#define INNER 41\n"),
    ]);
    let tree = pp.run("/src/main.cpp");
    assert_eq!(root_source(&tree), "\nint m = 41 + 1;\n");

    let chain: Vec<&str> = tree
        .included_documents("/usr/include/limits.h")
        .map(|doc| doc.file_name.as_str())
        .collect();
    assert_eq!(chain, ["/opt/include/limits.h"]);

    let visible: Vec<&str> = tree
        .macros_visible_from("/src/main.cpp")
        .into_iter()
        .map(|m| m.name.as_str())
        .collect();
    assert_eq!(visible, ["INNER", "MAX"]);
}

#[test]
fn test_headers_are_entered_once() {
    let mut pp = setup_driver(&[
        (
            "/src/main.cpp",
            "#import \"once.h\"\n#import \"once.h\"\n#include \"once.h\"\nint n = COUNT;\n",
        ),
        ("/src/once.h", "#define COUNT 1\n"),
    ]);
    let tree = pp.run("/src/main.cpp");
    assert_eq!(root_source(&tree), "\n\n\nint n = 1;\n");
    assert_eq!(tree.root_document().map(|doc| doc.includes.len()), Some(3));
    assert_eq!(tree.document("/src/once.h").map(|doc| doc.defined_macros.len()), Some(1));
    assert_eq!(tree.len(), 2);
}

#[test]
fn test_snapshot_macros_are_merged() {
    let mut pp = setup_driver(&[
        ("/src/main.cpp", "#include \"a.h\"\n"),
        ("/src/other.cpp", "#include \"a.h\"\nint w = V + W;\n"),
        ("/src/a.h", "#include \"b.h\"\n#define V 1\n"),
        ("/src/b.h", "#define W 2\n"),
    ]);
    let first = pp.run("/src/main.cpp");
    pp.set_snapshot(first);
    // the reused documents win over newer contents
    pp.add_working_copy_file("/src/a.h", "#define V 100\n");

    let tree = pp.run("/src/other.cpp");
    assert_eq!(root_source(&tree), "\nint w = 1 + 2;\n");
    assert!(tree.contains("/src/a.h"));
    assert!(tree.contains("/src/b.h"));
    let header = tree.document("/src/a.h").map(|doc| doc.defined_macros[0].definition.clone());
    assert_eq!(header, Some("1".to_string()));
}

#[test]
fn test_working_copy_shadows_provider() {
    let mut pp = setup_driver(&[("/src/main.cpp", "int x = N;\n")]);
    pp.add_working_copy_file("/src/main.cpp", "#define N 3\nint x = N;\n");
    assert_eq!(pp.preprocess("/src/main.cpp"), "\nint x = 3;\n");
}

#[test]
fn test_skipped_blocks_and_macro_uses_are_recorded() {
    let source = "#define F(x) x\n#ifdef MISSING\nint a;\n#endif\nint b = F(2);\n";
    let mut pp = setup_driver(&[("/src/main.cpp", source)]);
    let tree = pp.run("/src/main.cpp");
    let Some(doc) = tree.root_document() else {
        panic!("no root document");
    };
    assert_eq!(doc.skipped_blocks, [CharBlock::new(30, 37)]);
    assert!(doc.is_skipped(32));
    assert!(!doc.is_skipped(37));

    let invocation = source.find("F(2)").map(|offset| offset as u32);
    let Some(offset) = invocation else {
        panic!("no invocation in source");
    };
    let Some(macro_use) = doc.macro_use_at(offset + 1) else {
        panic!("no macro use recorded");
    };
    assert_eq!(macro_use.block, CharBlock::new(offset, offset + 4));
    assert_eq!(macro_use.arguments, [CharBlock::new(offset + 2, offset + 3)]);
    assert_eq!(macro_use.macro_def.signature(), "F(x) x");
}

#[test]
fn test_include_depth_is_a_fatal_error_in_the_includer() {
    let _ = env_logger::try_init();
    let mut provider = MemoryProvider::new();
    provider
        .add_file("/src/main.cpp", "#include \"a.h\"\nint m;\n")
        .add_file("/src/a.h", "#include \"b.h\"\n")
        .add_file("/src/b.h", "#include \"c.h\"\n")
        .add_file("/src/c.h", "int c;\n");
    let config = PPConfig {
        max_include_depth: 2,
        ..Default::default()
    };
    let mut pp = CppPreprocessor::with_provider(config, provider);
    let tree = pp.run("/src/main.cpp");
    assert_eq!(root_source(&tree), "\nint m;\n");

    let fatal: Vec<String> = tree
        .document("/src/b.h")
        .map(|doc| doc.diagnostics.iter().map(|d| d.to_string()).collect())
        .unwrap_or_default();
    assert_eq!(fatal, ["/src/b.h:0:0: fatal: #include nested too deeply"]);
    assert!(!tree.contains("/src/c.h"));
}
