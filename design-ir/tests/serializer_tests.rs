use design_ir::{Location, ObjectKind, OpType, Serializer};

#[test]
fn test_factories_assign_dense_ids() {
    let mut s = Serializer::new();
    let region = s.make_gen_region();
    let begin = s.make_begin();
    assert_eq!(region.index(), 0);
    assert_eq!(begin.index(), 1);
    assert_eq!(s.kind(region), ObjectKind::GenRegion);
    assert_eq!(s.kind(begin), ObjectKind::Begin);
    assert_eq!(s.len(), 2);
}

#[test]
fn test_vectors_keep_insertion_order() {
    let mut s = Serializer::new();
    let items = s.make_any_vec();
    let a = s.make_case_item();
    let b = s.make_case_item();
    s.push(items, a);
    s.push(items, b);
    assert_eq!(s.vec(items), &[a, b]);
}

#[test]
fn test_setters_and_json_dump() {
    let mut s = Serializer::new();
    let assign = s.make_assignment();
    let lhs = s.make_variable();
    s.set_vpi_name(lhs, "i");
    s.set_lhs(assign, lhs);
    s.set_vpi_parent(lhs, assign);
    s.set_vpi_op_type(assign, OpType::Add);

    let obj = s.object(assign);
    assert_eq!(obj.lhs, Some(lhs));
    assert_eq!(obj.op_type.map(OpType::code), Some(24));
    assert_eq!(s.object(lhs).parent, Some(assign));

    let json = s.to_json().expect("serializable");
    assert!(json.contains("\"assignment\""));
    assert!(json.contains("\"i\""));
}

#[test]
fn test_selects_and_calls() {
    let mut s = Serializer::new();
    let select = s.make_part_select();
    let left = s.make_constant();
    let right = s.make_constant();
    s.set_value(left, "UINT:7");
    s.set_value(right, "UINT:0");
    s.set_left_range(select, left);
    s.set_right_range(select, right);
    assert_eq!(s.object(select).left_range, Some(left));
    assert_eq!(s.object(select).right_range, Some(right));

    let bit = s.make_bit_select();
    s.set_index(bit, left);
    assert_eq!(s.object(bit).index, Some(left));

    let call = s.make_sys_func_call();
    s.set_vpi_name(call, "$clog2");
    let args = s.make_any_vec();
    s.push(args, bit);
    s.set_tf_call_args(call, args);
    assert_eq!(s.vec(s.object(call).tf_call_args.unwrap()), &[bit]);
    assert_eq!(s.kind(call), ObjectKind::SysFuncCall);
    assert_eq!(ObjectKind::PartSelect.name(), "part_select");
}

#[test]
fn test_locations_are_dumped() {
    let mut s = Serializer::new();
    let module = s.make_module_inst();
    s.set_vpi_name(module, "work@top");
    s.set_location(
        module,
        Location {
            file: "top.sv".to_string(),
            line: 3,
            column: 1,
            end_line: 9,
            end_column: 10,
        },
    );
    let location = s.object(module).location.as_ref().unwrap();
    assert_eq!((location.line, location.end_line), (3, 9));

    let json = s.to_json().unwrap();
    assert!(json.contains("\"top.sv\""));
    assert!(json.contains("\"work@top\""));
    // Unset fields are left out.
    assert!(!json.contains("else_stmt"));
}
