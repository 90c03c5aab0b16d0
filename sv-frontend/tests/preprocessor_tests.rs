use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use sv_frontend::preprocessor::Preprocessor;
use sv_frontend::{Session, VObjectType};
use tempfile::TempDir;

mod common;
use common::{element_names, TestHarness};

fn create_temp_file(dir: &TempDir, filename: &str, content: &str) -> PathBuf {
    let file_path = dir.path().join(filename);
    fs::write(&file_path, content).unwrap();
    file_path
}

fn preprocess(session: &Session, content: &str) -> String {
    let mut preprocessor = Preprocessor::new(vec![], IndexMap::new());
    preprocessor
        .preprocess_content(session, content, Path::new("pp.sv"))
        .unwrap()
        .stripped_text()
}

#[test]
fn test_ifdef_keeps_the_taken_branch() {
    let mut harness = TestHarness::new();
    let parsed = harness.parse(
        "`define A 1\n`ifdef A\nmodule m; endmodule\n`else\nmodule n; endmodule\n`endif\n",
    );
    assert_eq!(element_names(&parsed.file_content), vec!["work@m"]);
    assert!(!harness.session().errors().has_errors());
}

#[test]
fn test_ifndef_and_elsif_chain() {
    let session = Session::default();
    let text = preprocess(
        &session,
        "`define B\n`ifndef B\nwire a;\n`elsif B\nwire b;\n`else\nwire c;\n`endif\n",
    );
    assert!(!text.contains("wire a;"));
    assert!(text.contains("wire b;"));
    assert!(!text.contains("wire c;"));
}

#[test]
fn test_nested_conditionals_inside_inactive_branch() {
    let session = Session::default();
    let text = preprocess(
        &session,
        "`ifdef NOPE\n`ifdef ALSO\nwire a;\n`else\nwire b;\n`endif\n`endif\nwire c;\n",
    );
    assert!(!text.contains("wire a;"));
    assert!(!text.contains("wire b;"));
    assert!(text.contains("wire c;"));
}

#[test]
fn test_output_keeps_one_line_per_source_line() {
    let session = Session::default();
    let source = "`define W 8\n`ifdef W\nwire [`W-1:0] a;\n`endif\nwire b;\n";
    let text = preprocess(&session, source);
    assert_eq!(text.lines().count(), source.lines().count());
    assert!(text.contains("wire [8-1:0] a;"));
}

#[test]
fn test_macro_with_arguments_and_defaults() {
    let session = Session::default();
    let text = preprocess(
        &session,
        "`define ADD(x, y=2) (x+y)\nassign a = `ADD(1,3);\nassign b = `ADD(4);\n",
    );
    assert!(text.contains("(1+3)"));
    assert!(text.contains("(4+2)"));
}

#[test]
fn test_undef_removes_the_binding() {
    let session = Session::default();
    let text = preprocess(
        &session,
        "`define X\n`undef X\n`ifdef X\nwire a;\n`endif\n`undef NEVER\n",
    );
    assert!(!text.contains("wire a;"));
    assert!(session.errors().contains("PP0106"));
    assert!(!session.errors().has_errors());
}

#[test]
fn test_structural_errors_are_reported() {
    let session = Session::default();
    preprocess(&session, "`else\nwire a;\n`endif\n");
    assert!(session.errors().contains("PP0101"));
    assert!(session.errors().contains("PP0103"));

    let session = Session::default();
    preprocess(&session, "`ifdef A\nwire a;\n");
    assert!(session.errors().contains("PP0104"));
}

#[test]
fn test_macro_arity_mismatch() {
    let session = Session::default();
    preprocess(&session, "`define F(a, b) a+b\nassign x = `F(1);\n");
    assert!(session.errors().contains("PP0108"));
}

#[test]
fn test_unknown_macro_is_an_error() {
    let session = Session::default();
    preprocess(&session, "assign x = `MISSING;\n");
    assert!(session.errors().contains("PP0105"));
}

#[test]
fn test_include_relative_to_including_file() {
    let temp_dir = TempDir::new().unwrap();
    create_temp_file(&temp_dir, "defs.svh", "`define WIDTH 4\nwire w;\n");
    let main = create_temp_file(
        &temp_dir,
        "top.sv",
        "`include \"defs.svh\"\nwire [`WIDTH-1:0] v;\n",
    );

    let session = Session::default();
    let mut preprocessor = Preprocessor::new(vec![], IndexMap::new());
    let result = preprocessor.preprocess_file(&session, &main).unwrap();

    assert_eq!(result.includes.len(), 1);
    assert_eq!(result.includes[0].name, "defs.svh");
    assert!(result.includes[0].resolved.is_some());
    let text = result.stripped_text();
    assert!(text.contains("wire w;"));
    assert!(text.contains("wire [4-1:0] v;"));
    assert!(result.macros.contains("WIDTH"));
}

#[test]
fn test_include_through_incdir() {
    let temp_dir = TempDir::new().unwrap();
    let inc = temp_dir.path().join("inc");
    fs::create_dir(&inc).unwrap();
    fs::write(inc.join("pkg.svh"), "wire from_inc;\n").unwrap();
    let src = temp_dir.path().join("src");
    fs::create_dir(&src).unwrap();
    let main = src.join("top.sv");
    fs::write(&main, "`include \"pkg.svh\"\n").unwrap();

    let session = Session::default();
    let mut preprocessor = Preprocessor::new(vec![inc], IndexMap::new());
    let result = preprocessor.preprocess_file(&session, &main).unwrap();
    assert!(result.stripped_text().contains("wire from_inc;"));
}

#[test]
fn test_missing_include_is_reported() {
    let temp_dir = TempDir::new().unwrap();
    let main = create_temp_file(&temp_dir, "top.sv", "`include \"nowhere.svh\"\nwire a;\n");

    let session = Session::default();
    let mut preprocessor = Preprocessor::new(vec![], IndexMap::new());
    let result = preprocessor.preprocess_file(&session, &main).unwrap();
    assert!(session.errors().contains("PP0111"));
    assert_eq!(result.includes[0].resolved, None);
    assert!(result.stripped_text().contains("wire a;"));
}

#[test]
fn test_include_cycle_is_reported() {
    let temp_dir = TempDir::new().unwrap();
    create_temp_file(&temp_dir, "a.svh", "`include \"b.svh\"\n");
    create_temp_file(&temp_dir, "b.svh", "`include \"a.svh\"\n");
    let main = create_temp_file(&temp_dir, "top.sv", "`include \"a.svh\"\n");

    let session = Session::default();
    let mut preprocessor = Preprocessor::new(vec![], IndexMap::new());
    preprocessor.preprocess_file(&session, &main).unwrap();
    assert!(session.errors().contains("PP0112"));
}

#[test]
fn test_initial_defines_from_the_command_line() {
    let session = Session::default();
    let mut defines = IndexMap::new();
    defines.insert("DEBUG".to_string(), "1".to_string());
    let mut preprocessor = Preprocessor::new(vec![], defines);
    let text = preprocessor
        .preprocess_content(&session, "`ifdef DEBUG\nwire dbg;\n`endif\n", Path::new("d.sv"))
        .unwrap()
        .stripped_text();
    assert!(text.contains("wire dbg;"));
}

#[test]
fn test_directive_nodes_are_recorded() {
    let session = Session::default();
    let mut preprocessor = Preprocessor::new(vec![], IndexMap::new());
    let result = preprocessor
        .preprocess_content(
            &session,
            "`define A 1\n`ifdef A\nwire a;\n`endif\n",
            Path::new("nodes.sv"),
        )
        .unwrap();
    let fc = &result.file_content;
    let root = fc.root();
    assert_eq!(fc.vtype(root), VObjectType::PpTopLevelRule);
    assert!(fc.sl_collect(root, VObjectType::PpIfdefDirective).is_valid());
    assert!(fc.sl_collect(root, VObjectType::PpEndifDirective).is_valid());
    assert!(fc.validate().is_empty());
}

#[test]
fn test_timescale_is_attached_to_design_elements() {
    let mut harness = TestHarness::new();
    let parsed = harness.parse("`timescale 1ns/1ps\nmodule m; endmodule\n");
    let element = &parsed.file_content.design_elements()[0];
    assert_ne!(element.time_info, Default::default());
}
