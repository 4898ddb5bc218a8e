mod common;

use common::Project;
use cxxfront::pp::IncludeType;

#[test]
fn test_includes_resolve_on_disk() {
    let project = Project::new();
    let main = project.write(
        "src/main.cpp",
        "#include \"util.h\"\n#include \"config.h\"\n#include <vector.h>\nint n = UTIL + CONFIG + VECTOR;\n",
    );
    let util = project.write("src/util.h", "#define UTIL 1\n");
    let config = project.write("include/config.h", "#define CONFIG 2\n");
    let vector = project.write("sys/vector.h", "#define VECTOR 3\n");

    let mut pp = project.driver();
    let tree = pp.run(&main);
    let Some(root) = tree.root_document() else {
        panic!("no document for {}", main);
    };
    assert_eq!(root.source, "\n\n\nint n = 1 + 2 + 3;\n");
    assert!(root.diagnostics.is_empty(), "{:?}", root.diagnostics);

    let includes: Vec<(&str, IncludeType)> = root
        .includes
        .iter()
        .map(|include| (include.file_name.as_str(), include.include_type))
        .collect();
    assert_eq!(
        includes,
        [
            (util.as_str(), IncludeType::Local),
            (config.as_str(), IncludeType::Local),
            (vector.as_str(), IncludeType::Global),
        ]
    );
    assert_eq!(tree.len(), 4);
}

#[test]
fn test_relative_includes_are_normalized() {
    let project = Project::new();
    let main = project.write("src/app/main.cpp", "#include \"../shared/./common.h\"\nSHARED\n");
    let shared = project.write("src/shared/common.h", "#define SHARED ok\n");

    let mut pp = project.driver();
    let tree = pp.run(&main);
    assert!(tree.contains(&shared));
    assert_eq!(tree.root_document().map(|doc| doc.source.as_str()), Some("\nok\n"));
}

#[test]
fn test_missing_files_are_warnings() {
    let project = Project::new();
    let main = project.write("src/main.cpp", "#include \"nowhere.h\"\nint x;\n");

    let mut pp = project.driver();
    let tree = pp.run(&main);
    let messages: Vec<String> = tree
        .root_document()
        .map(|doc| doc.diagnostics.iter().map(|d| d.to_string()).collect())
        .unwrap_or_default();
    assert_eq!(
        messages,
        [format!("{}:1:0: warning: nowhere.h: No such file or directory", main)]
    );

    let absent = project.name("src/absent.cpp");
    let tree = pp.run(&absent);
    let Some(root) = tree.root_document() else {
        panic!("the root document is recorded even when unreadable");
    };
    assert!(root.source.is_empty());
    assert_eq!(root.diagnostics.len(), 1);
    assert!(root.diagnostics[0].is_warning());
}

#[test]
fn test_working_copy_overrides_disk() {
    let project = Project::new();
    let main = project.write("src/main.cpp", "#include \"value.h\"\nint v = VALUE;\n");
    let header = project.write("src/value.h", "#define VALUE 1\n");

    let mut pp = project.driver();
    pp.add_working_copy_file(header, "#define VALUE 2\n");
    assert_eq!(pp.preprocess(&main), "\nint v = 2;\n");
}
