use sv_frontend::{Config, FileContent, NodeId, VObjectType};

mod common;
use common::{element_names, nodes_of, TestHarness};

fn identifier(fc: &FileContent, name: &str) -> NodeId {
    nodes_of(fc, VObjectType::SlStringConst)
        .into_iter()
        .find(|id| fc.sym_name(*id) == name)
        .unwrap_or_else(|| panic!("no identifier {name}"))
}

#[test]
fn test_macro_use_is_bracketed_by_markers() {
    let mut harness = TestHarness::new();
    let parsed = harness.parse(
        "`define ADD(x,y) (x+y)\nmodule m; initial $display(`ADD(1,2)); endmodule\n",
    );
    let fc = &parsed.file_content;

    let calls = nodes_of(fc, VObjectType::PaSystemTfCall);
    assert_eq!(calls.len(), 1);
    let call = calls[0];
    assert!(fc.sl_collect(call, VObjectType::SlStringConst).is_valid());
    assert_eq!(
        fc.sym_name(fc.sl_collect(call, VObjectType::SlStringConst)),
        "$display"
    );

    let begins = fc.sl_collect_all(call, VObjectType::SlPreprocBegin);
    let ends = fc.sl_collect_all(call, VObjectType::SlPreprocEnd);
    assert_eq!(begins.len(), 1);
    assert_eq!(ends.len(), 1);
    assert!(fc.sl_collect(call, VObjectType::PaBinOpPlus).is_valid());

    // `ADD(1,2) spans columns 28..37 of line 2.
    let one = fc
        .sl_collect_all(call, VObjectType::SlIntConst)
        .into_iter()
        .find(|id| fc.sym_name(*id) == "1")
        .unwrap();
    assert_eq!(fc.line(one), 2);
    assert!((28..=37).contains(&fc.column(one)), "column {}", fc.column(one));
    assert!(!harness.session().errors().has_errors());
}

#[test]
fn test_begin_marker_names_the_macro_definition() {
    let mut harness = TestHarness::new();
    let parsed = harness.parse("`define W 4\nmodule m; wire [`W-1:0] a; endmodule\n");
    let fc = &parsed.file_content;
    let begins = nodes_of(fc, VObjectType::SlPreprocBegin);
    assert!(!begins.is_empty());
    // The pp subtree of the macro use is merged under its begin marker.
    let begin = begins
        .iter()
        .copied()
        .find(|b| fc.child(*b).is_valid())
        .expect("merged pp subtree");
    assert!(fc.vtype(fc.child(begin)).is_preproc());
}

#[test]
fn test_columns_follow_the_original_source() {
    let mut harness = TestHarness::new();
    let parsed = harness.parse("module m;\n  wire a;\nendmodule\n");
    let fc = &parsed.file_content;
    let a = identifier(fc, "a");
    assert_eq!((fc.line(a), fc.column(a)), (2, 8));
}

#[test]
fn test_columns_after_a_macro_use_are_restored() {
    let mut harness = TestHarness::new();
    let parsed = harness.parse("`define W 16\nmodule m; wire [`W-1:0] a; endmodule\n");
    let fc = &parsed.file_content;
    let a = identifier(fc, "a");
    assert_eq!((fc.line(a), fc.column(a)), (2, 25));
}

#[test]
fn test_pp_output_locations_skip_remapping() {
    let config = Config {
        use_pp_output_location: true,
        ..Config::default()
    };
    let mut harness = TestHarness::with_config(config);
    let parsed = harness.parse("`define W 16\nmodule m; wire [`W-1:0] a; endmodule\n");
    let fc = &parsed.file_content;
    let a = identifier(fc, "a");
    // The markers around the expansion push the column to the right.
    assert_eq!(fc.line(a), 2);
    assert!(fc.column(a) > 25, "column {}", fc.column(a));
}

#[test]
fn test_design_elements_and_nesting() {
    let mut harness = TestHarness::new();
    let parsed = harness.parse(
        "module top; class c; endclass endmodule\n\
         interface bus; endinterface\n\
         package p; endpackage\n\
         program prg; endprogram\n",
    );
    let fc = &parsed.file_content;
    assert_eq!(
        element_names(fc),
        vec!["work@top", "work@top.c", "work@bus", "work@p", "work@prg"]
    );
    let class = fc.design_element("work@top.c").unwrap();
    assert_eq!(class.parent, Some(0));
    for element in fc.design_elements() {
        assert!(
            (element.end_line, element.end_column) >= (element.line, element.column),
            "{}",
            fc.design_element_name(element)
        );
    }
}

#[test]
fn test_every_description_in_a_file_is_kept() {
    let mut harness = TestHarness::new();
    let parsed = harness.parse("module a; endmodule\nmodule b; endmodule\n");
    assert_eq!(element_names(&parsed.file_content), vec!["work@a", "work@b"]);
    assert!(!harness.session().errors().has_errors());

    let mut harness = TestHarness::new();
    let parsed = harness.parse(
        "`ifdef A\nmodule m; endmodule\n`else\nmodule n; endmodule\n`endif\nmodule z; endmodule\n",
    );
    assert_eq!(element_names(&parsed.file_content), vec!["work@n", "work@z"]);
    assert!(!harness.session().errors().has_errors());
}

#[test]
fn test_broken_item_keeps_following_descriptions() {
    let mut harness = TestHarness::new();
    let parsed = harness.parse("module a;\n  wire w\nendmodule\nmodule b; wire v; endmodule\n");
    assert_eq!(element_names(&parsed.file_content), vec!["work@a", "work@b"]);
    assert!(harness.session().errors().has_errors());
}

#[test]
fn test_library_prefixes_element_names() {
    let config = Config {
        library: "mylib".to_string(),
        ..Config::default()
    };
    let mut harness = TestHarness::with_config(config);
    let parsed = harness.parse("module m; endmodule\n");
    assert_eq!(element_names(&parsed.file_content), vec!["mylib@m"]);
}

#[test]
fn test_tree_links_are_consistent() {
    let mut harness = TestHarness::new();
    let parsed = harness.parse(
        "// header\n\
         `define N 2\n\
         module m(input logic [`N-1:0] a, output b);\n\
           /* block */ assign b = &a;\n\
           generate if (`N > 1) begin : g wire w; end endgenerate\n\
         endmodule\n",
    );
    let fc = &parsed.file_content;
    assert_eq!(fc.validate(), Vec::<String>::new());

    let root = fc.root();
    for id in fc.preorder(root) {
        let mut child = fc.child(id);
        while child.is_valid() {
            assert_eq!(fc.parent(child), id);
            child = fc.sibling(child);
        }
    }
}

#[test]
fn test_comments_become_orphan_nodes() {
    let mut harness = TestHarness::new();
    let parsed = harness.parse("// lead\nmodule m; /* inner */ wire a; endmodule\n");
    let fc = &parsed.file_content;
    assert_eq!(nodes_of(fc, VObjectType::PaOneLineComment).len(), 1);
    assert_eq!(nodes_of(fc, VObjectType::PaBlockComment).len(), 1);
    assert!(nodes_of(fc, VObjectType::PaWhiteSpace).is_empty());
}

#[test]
fn test_whitespace_is_kept_on_request() {
    let config = Config {
        keep_whitespace: true,
        ..Config::default()
    };
    let mut harness = TestHarness::with_config(config);
    let parsed = harness.parse("module m; wire a; endmodule\n");
    assert!(!nodes_of(&parsed.file_content, VObjectType::PaWhiteSpace).is_empty());
}

#[test]
fn test_string_literals_are_normalized() {
    let mut harness = TestHarness::new();
    let parsed = harness.parse("module m; initial $display(\"a\\tb\"); endmodule\n");
    let fc = &parsed.file_content;
    let literals = nodes_of(fc, VObjectType::SlStringLiteral);
    assert_eq!(literals.len(), 1);
    assert_eq!(fc.sym_name(literals[0]), "a\tb");
}

#[test]
fn test_unary_and_binary_minus() {
    let mut harness = TestHarness::new();
    let parsed = harness.parse("module m; assign x = -a - b; endmodule\n");
    let fc = &parsed.file_content;
    assert_eq!(nodes_of(fc, VObjectType::PaUnaryMinus).len(), 1);
    assert_eq!(nodes_of(fc, VObjectType::PaBinOpMinus).len(), 1);
}

#[test]
fn test_syntax_errors_are_reported_with_locations() {
    let mut harness = TestHarness::new();
    let parsed = harness.parse("module m;\n  wire a\nendmodule\n");
    let errors = harness.session().errors().diagnostics();
    assert!(!errors.is_empty());
    assert!(errors.iter().all(|e| e.location.is_some()));
    assert!(harness.session().errors().contains("PA0203"));
    assert_eq!(parsed.file_content.file_id(), parsed.file);
}

#[test]
fn test_reparsing_yields_identical_nodes() {
    let source = "`define A(x) x*2\nmodule m; assign y = `A(3); endmodule\n";
    let mut first = TestHarness::new();
    let mut second = TestHarness::new();
    let a = first.parse(source);
    let b = second.parse(source);
    assert_eq!(a.file_content.print_tree(), b.file_content.print_tree());
}
