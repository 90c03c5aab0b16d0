use design_ir::{ObjectKind, Serializer};
use sv_frontend::design::{ModuleKind, PortNetHolder};
use sv_frontend::{compile_design, VObjectType};

mod common;
use common::{ir_objects, nodes_of, TestHarness};

#[test]
fn test_definition_kinds() {
    let mut harness = TestHarness::new();
    let files = vec![harness.parse(
        "module m; endmodule\n\
         interface bus; endinterface\n\
         primitive u(o, a); output o; input a; table 0 : 1; endtable endprimitive\n",
    )];
    let mut s = Serializer::new();
    let design = compile_design(harness.session(), &files, &mut s).unwrap();

    let module = design.definition("work@m").unwrap();
    assert_eq!(module.kind(), ModuleKind::Module);
    assert!(module.is_instance());
    assert_eq!(s.kind(module.ir()), ObjectKind::ModuleInst);
    assert_eq!(s.object(module.ir()).name.as_deref(), Some("work@m"));

    let bus = design.definition("work@bus").unwrap();
    assert_eq!(bus.kind(), ModuleKind::Interface);
    assert!(!bus.is_instance());
    assert_eq!(s.kind(bus.ir()), ObjectKind::InterfaceInst);

    let udp = design.definition("work@u").unwrap();
    assert_eq!(udp.kind(), ModuleKind::Udp);
    assert!(udp.is_instance());
    assert_eq!(s.object(udp.ir()).def_name.as_deref(), Some("work@u"));

    assert_eq!(design.definitions().count(), 3);
    assert!(module.size() > 0);
}

#[test]
fn test_ansi_ports() {
    let mut harness = TestHarness::new();
    let files = vec![harness.parse(
        "module m(input logic signed [3:0] a, b, output wire c, bus.mp p); endmodule\n",
    )];
    let mut s = Serializer::new();
    let design = compile_design(harness.session(), &files, &mut s).unwrap();
    let m = design.definition("work@m").unwrap();

    let names: Vec<_> = m.ports().iter().map(|p| p.name()).collect();
    assert_eq!(names, vec!["a", "b", "c", "p"]);

    let a = m.port("a").unwrap();
    assert_eq!(a.direction(), VObjectType::PaPortDirInp);
    assert_eq!(a.subnet_type(), VObjectType::PaIntVecTypeLogic);
    assert!(a.is_signed());
    assert!(a.packed_dimension().is_valid());

    // A port without a direction keeps the previous one.
    assert_eq!(m.port("b").unwrap().direction(), VObjectType::PaPortDirInp);

    let c = m.port("c").unwrap();
    assert_eq!(c.direction(), VObjectType::PaPortDirOut);
    assert_eq!(c.subnet_type(), VObjectType::PaNetTypeWire);

    let p = m.port("p").unwrap();
    assert!(p.is_interface());
    assert_eq!(p.interface_type_name(), "bus.mp");
}

#[test]
fn test_non_ansi_ports_take_body_declarations() {
    let mut harness = TestHarness::new();
    let files = vec![harness.parse(
        "module m(a, b);\n  input a;\n  output reg [3:0] b;\nendmodule\n",
    )];
    let mut s = Serializer::new();
    let design = compile_design(harness.session(), &files, &mut s).unwrap();
    let m = design.definition("work@m").unwrap();

    assert_eq!(m.ports().len(), 2);
    let a = m.port("a").unwrap();
    assert_eq!(a.direction(), VObjectType::PaPortDirInp);
    let b = m.port("b").unwrap();
    assert_eq!(b.direction(), VObjectType::PaPortDirOut);
    assert_eq!(b.subnet_type(), VObjectType::PaIntVecTypeReg);
    // The port keeps its header node; the net points at the declaration.
    assert_ne!(b.node(), b.net_node());
    assert_eq!(b.net_name(), "b");
}

#[test]
fn test_nets_and_variables() {
    let mut harness = TestHarness::new();
    let files = vec![harness.parse(
        "module m; wire [7:0] w; logic v [4]; pkg::t scoped; endmodule\n",
    )];
    let mut s = Serializer::new();
    let design = compile_design(harness.session(), &files, &mut s).unwrap();
    let m = design.definition("work@m").unwrap();

    let w = m.signal("w").unwrap();
    assert_eq!(w.subnet_type(), VObjectType::PaNetTypeWire);
    assert!(w.packed_dimension().is_valid());
    assert_eq!(w.direction(), VObjectType::SlNoType);

    let v = m.signal("v").unwrap();
    assert_eq!(v.subnet_type(), VObjectType::PaIntVecTypeLogic);
    assert!(v.unpacked_dimension().is_valid());
    assert!(!v.packed_dimension().is_valid());

    let scoped = m.signal("scoped").unwrap();
    assert!(scoped.is_interface());
    assert_eq!(scoped.interface_type_name(), "pkg::t");
}

#[test]
fn test_signals_can_be_removed_by_instance_id() {
    let mut harness = TestHarness::new();
    let files = vec![harness.parse("module m; wire a, b, c; endmodule\n")];
    let mut s = Serializer::new();
    let design = compile_design(harness.session(), &files, &mut s).unwrap();
    let mut m = design.definition("work@m").unwrap().clone();

    let id = m.signal("b").unwrap().inst_id();
    let removed = m.remove_signal(id).unwrap();
    assert_eq!(removed.name(), "b");
    let names: Vec<_> = m.signals().iter().map(|s| s.name()).collect();
    assert_eq!(names, vec!["a", "c"]);
    assert!(m.remove_signal(id).is_none());
}

#[test]
fn test_modports_group_by_direction() {
    let mut harness = TestHarness::new();
    let files = vec![harness.parse(
        "interface bus;\n\
           logic a, b, c;\n\
           modport mp(input a, b, output c, clocking cb);\n\
           modport other(inout a);\n\
         endinterface\n",
    )];
    let fc = &files[0].file_content;
    let mut s = Serializer::new();
    let design = compile_design(harness.session(), &files, &mut s).unwrap();
    let bus = design.definition("work@bus").unwrap();

    let names: Vec<_> = bus.mod_ports().map(|m| m.name()).collect();
    assert_eq!(names, vec!["mp", "other"]);

    let mp = bus.mod_port("mp").unwrap();
    let directions: Vec<_> = mp.ports().iter().map(|p| (p.name(), p.direction())).collect();
    assert_eq!(
        directions,
        vec![
            ("a", VObjectType::PaPortDirInp),
            ("b", VObjectType::PaPortDirInp),
            ("c", VObjectType::PaPortDirOut),
        ]
    );

    let simple_ports = nodes_of(fc, VObjectType::PaModportSimplePort);
    let c = bus.mod_port_signal("mp", simple_ports[2]).unwrap();
    assert_eq!(c.name(), "c");
    assert!(bus.mod_port_signal("other", simple_ports[2]).is_none());
    assert!(bus.mod_port_signal("missing", simple_ports[0]).is_none());

    let blocks = bus.mod_port_clocking_blocks("mp");
    assert_eq!(blocks.len(), 1);
    assert_eq!(blocks[0].name, "cb");
    assert!(bus.mod_port_clocking_block("mp", blocks[0].node).is_some());
    assert!(bus.mod_port_clocking_blocks("other").is_empty());

    let modports = ir_objects(&s, ObjectKind::Modport);
    assert_eq!(modports.len(), 2);
    assert_eq!(s.object(modports[0]).parent, Some(bus.ir()));
    assert_eq!(mp.ir(), Some(modports[0]));
}

#[test]
fn test_continuous_assigns_are_attached() {
    let mut harness = TestHarness::new();
    let files = vec![harness.parse("module m; assign a = b, c = d + 1; endmodule\n")];
    let mut s = Serializer::new();
    let design = compile_design(harness.session(), &files, &mut s).unwrap();
    let m = design.definition("work@m").unwrap();

    let assigns = s.vec(m.cont_assigns().expect("cont assigns"));
    assert_eq!(assigns.len(), 2);
    for assign in assigns {
        assert_eq!(s.kind(*assign), ObjectKind::ContAssign);
        assert_eq!(s.object(*assign).parent, Some(m.ir()));
    }
    let second = s.object(assigns[1]);
    assert_eq!(s.object(second.lhs.unwrap()).name.as_deref(), Some("c"));
    assert_eq!(s.kind(second.rhs.unwrap()), ObjectKind::Operation);
    assert!(m.processes().is_none());
}

#[test]
fn test_duplicate_definition_keeps_the_first() {
    let mut harness = TestHarness::new();
    let files = vec![
        harness.parse_named("module m; wire a; endmodule\n", "a.sv"),
        harness.parse_named("module m; wire b; endmodule\n", "b.sv"),
    ];
    let mut s = Serializer::new();
    let design = compile_design(harness.session(), &files, &mut s).unwrap();

    assert!(harness.has_diagnostic("CP0305"));
    assert!(!harness.session().errors().has_errors());
    let m = design.definition("work@m").unwrap();
    assert!(m.signal("a").is_some());
    assert!(m.signal("b").is_none());
    assert_eq!(ir_objects(&s, ObjectKind::ModuleInst).len(), 1);
}

#[test]
fn test_gate_primitives_get_builtin_definitions() {
    let mut harness = TestHarness::new();
    let files = vec![harness.parse("module m; and g1(o, a, b); endmodule\n")];
    let mut s = Serializer::new();
    let design = compile_design(harness.session(), &files, &mut s).unwrap();

    let gate = design.definition("and").unwrap();
    assert_eq!(gate.kind(), ModuleKind::Unknown);
    assert!(gate.is_instance());
    assert!(gate.file_contents().is_empty());
    assert_eq!(gate.size(), 0);
    assert_eq!(s.object(gate.ir()).def_name.as_deref(), Some("and"));
}

#[test]
fn test_packages_programs_and_classes() {
    let mut harness = TestHarness::new();
    let files = vec![harness.parse(
        "package p; endpackage\n\
         program prg; endprogram\n\
         module top; class c; endclass endmodule\n",
    )];
    let mut s = Serializer::new();
    let design = compile_design(harness.session(), &files, &mut s).unwrap();

    assert!(design.package("work@p").is_some());
    assert_eq!(design.packages().collect::<Vec<_>>(), vec!["work@p"]);
    assert!(design.program("work@prg").is_some());
    assert!(design.class("work@top.c").is_some());

    let top = design.definition("work@top").unwrap();
    assert!(top.class_definition("c").is_some());
    assert_eq!(top.class_definitions().count(), 1);
}

#[test]
fn test_precompiled_packages_are_flagged() {
    let mut harness = TestHarness::new();
    let files = vec![
        harness.parse_named("package uvm_pkg; endpackage\n", "lib/uvm_pkg.sv"),
        harness.parse_named("package my_pkg; endpackage\n", "my_pkg.sv"),
    ];
    let mut s = Serializer::new();
    let design = compile_design(harness.session(), &files, &mut s).unwrap();
    assert!(design.is_precompiled("work@uvm_pkg"));
    assert!(!design.is_precompiled("work@my_pkg"));
}
