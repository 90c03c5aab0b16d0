//! Design object model produced by the SystemVerilog front end.
//!
//! Every object lives in a [`Serializer`] arena and is addressed by an
//! [`AnyId`]. Ordered collections of objects are arena-owned vectors addressed
//! by an [`AnyVecId`]; holders keep only the handle.

mod object;

pub use object::{Location, Object, ObjectKind, OpType};

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct AnyId(u32);

impl AnyId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct AnyVecId(u32);

impl AnyVecId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Owner of all design objects.
#[derive(Debug, Default, Serialize)]
pub struct Serializer {
    objects: Vec<Object>,
    vectors: Vec<Vec<AnyId>>,
}

impl Serializer {
    pub fn new() -> Self {
        Self::default()
    }

    fn make(&mut self, kind: ObjectKind) -> AnyId {
        let id = AnyId(self.objects.len() as u32);
        self.objects.push(Object::new(kind));
        id
    }

    pub fn make_udp_defn(&mut self) -> AnyId {
        self.make(ObjectKind::UdpDefn)
    }

    pub fn make_interface_inst(&mut self) -> AnyId {
        self.make(ObjectKind::InterfaceInst)
    }

    pub fn make_module_inst(&mut self) -> AnyId {
        self.make(ObjectKind::ModuleInst)
    }

    pub fn make_modport(&mut self) -> AnyId {
        self.make(ObjectKind::Modport)
    }

    pub fn make_gen_region(&mut self) -> AnyId {
        self.make(ObjectKind::GenRegion)
    }

    pub fn make_gen_if(&mut self) -> AnyId {
        self.make(ObjectKind::GenIf)
    }

    pub fn make_gen_if_else(&mut self) -> AnyId {
        self.make(ObjectKind::GenIfElse)
    }

    pub fn make_gen_case(&mut self) -> AnyId {
        self.make(ObjectKind::GenCase)
    }

    pub fn make_gen_for(&mut self) -> AnyId {
        self.make(ObjectKind::GenFor)
    }

    pub fn make_begin(&mut self) -> AnyId {
        self.make(ObjectKind::Begin)
    }

    pub fn make_case_item(&mut self) -> AnyId {
        self.make(ObjectKind::CaseItem)
    }

    pub fn make_assignment(&mut self) -> AnyId {
        self.make(ObjectKind::Assignment)
    }

    pub fn make_operation(&mut self) -> AnyId {
        self.make(ObjectKind::Operation)
    }

    pub fn make_constant(&mut self) -> AnyId {
        self.make(ObjectKind::Constant)
    }

    pub fn make_ref_obj(&mut self) -> AnyId {
        self.make(ObjectKind::RefObj)
    }

    pub fn make_variable(&mut self) -> AnyId {
        self.make(ObjectKind::Variable)
    }

    pub fn make_ref_module(&mut self) -> AnyId {
        self.make(ObjectKind::RefModule)
    }

    pub fn make_cont_assign(&mut self) -> AnyId {
        self.make(ObjectKind::ContAssign)
    }

    pub fn make_range(&mut self) -> AnyId {
        self.make(ObjectKind::Range)
    }

    pub fn make_func_call(&mut self) -> AnyId {
        self.make(ObjectKind::FuncCall)
    }

    pub fn make_sys_func_call(&mut self) -> AnyId {
        self.make(ObjectKind::SysFuncCall)
    }

    pub fn make_bit_select(&mut self) -> AnyId {
        self.make(ObjectKind::BitSelect)
    }

    pub fn make_part_select(&mut self) -> AnyId {
        self.make(ObjectKind::PartSelect)
    }

    pub fn make_any_vec(&mut self) -> AnyVecId {
        let id = AnyVecId(self.vectors.len() as u32);
        self.vectors.push(Vec::new());
        id
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn object(&self, id: AnyId) -> &Object {
        &self.objects[id.index()]
    }

    pub fn objects(&self) -> impl Iterator<Item = (AnyId, &Object)> {
        self.objects
            .iter()
            .enumerate()
            .map(|(i, obj)| (AnyId(i as u32), obj))
    }

    pub fn kind(&self, id: AnyId) -> ObjectKind {
        self.object(id).kind
    }

    pub fn vec(&self, id: AnyVecId) -> &[AnyId] {
        &self.vectors[id.index()]
    }

    pub fn push(&mut self, vec: AnyVecId, item: AnyId) {
        self.vectors[vec.index()].push(item);
    }

    fn object_mut(&mut self, id: AnyId) -> &mut Object {
        &mut self.objects[id.index()]
    }

    pub fn set_vpi_name(&mut self, id: AnyId, name: &str) {
        self.object_mut(id).name = Some(name.to_string());
    }

    pub fn set_vpi_def_name(&mut self, id: AnyId, name: &str) {
        self.object_mut(id).def_name = Some(name.to_string());
    }

    pub fn set_vpi_parent(&mut self, id: AnyId, parent: AnyId) {
        self.object_mut(id).parent = Some(parent);
    }

    pub fn set_location(&mut self, id: AnyId, location: Location) {
        self.object_mut(id).location = Some(location);
    }

    pub fn set_vpi_stmt(&mut self, id: AnyId, stmt: AnyId) {
        self.object_mut(id).stmt = Some(stmt);
    }

    pub fn set_vpi_else_stmt(&mut self, id: AnyId, stmt: AnyId) {
        self.object_mut(id).else_stmt = Some(stmt);
    }

    pub fn set_vpi_condition(&mut self, id: AnyId, cond: AnyId) {
        self.object_mut(id).condition = Some(cond);
    }

    pub fn set_vpi_for_inc_stmt(&mut self, id: AnyId, stmt: AnyId) {
        self.object_mut(id).for_inc_stmt = Some(stmt);
    }

    pub fn set_lhs(&mut self, id: AnyId, lhs: AnyId) {
        self.object_mut(id).lhs = Some(lhs);
    }

    pub fn set_rhs(&mut self, id: AnyId, rhs: AnyId) {
        self.object_mut(id).rhs = Some(rhs);
    }

    pub fn set_left_range(&mut self, id: AnyId, expr: AnyId) {
        self.object_mut(id).left_range = Some(expr);
    }

    pub fn set_right_range(&mut self, id: AnyId, expr: AnyId) {
        self.object_mut(id).right_range = Some(expr);
    }

    pub fn set_index(&mut self, id: AnyId, expr: AnyId) {
        self.object_mut(id).index = Some(expr);
    }

    pub fn set_stmts(&mut self, id: AnyId, stmts: AnyVecId) {
        self.object_mut(id).stmts = Some(stmts);
    }

    pub fn set_vpi_exprs(&mut self, id: AnyId, exprs: AnyVecId) {
        self.object_mut(id).exprs = Some(exprs);
    }

    pub fn set_vpi_for_init_stmts(&mut self, id: AnyId, stmts: AnyVecId) {
        self.object_mut(id).for_init_stmts = Some(stmts);
    }

    pub fn set_case_items(&mut self, id: AnyId, items: AnyVecId) {
        self.object_mut(id).case_items = Some(items);
    }

    pub fn set_operands(&mut self, id: AnyId, operands: AnyVecId) {
        self.object_mut(id).operands = Some(operands);
    }

    pub fn set_gen_stmts(&mut self, id: AnyId, stmts: AnyVecId) {
        self.object_mut(id).gen_stmts = Some(stmts);
    }

    pub fn set_tf_call_args(&mut self, id: AnyId, args: AnyVecId) {
        self.object_mut(id).tf_call_args = Some(args);
    }

    pub fn set_vpi_op_type(&mut self, id: AnyId, op: OpType) {
        self.object_mut(id).op_type = Some(op);
    }

    pub fn set_value(&mut self, id: AnyId, value: &str) {
        self.object_mut(id).value = Some(value.to_string());
    }

    /// Pretty JSON dump of the whole arena.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
