use serde::Serialize;

use crate::{AnyId, AnyVecId};

/// Kind of a design object. Mirrors the subset of the VPI object model the
/// front end produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    ModuleInst,
    InterfaceInst,
    UdpDefn,
    Modport,
    GenRegion,
    GenIf,
    GenIfElse,
    GenCase,
    GenFor,
    Begin,
    CaseItem,
    Assignment,
    Operation,
    Constant,
    RefObj,
    Variable,
    RefModule,
    ContAssign,
    Range,
    FuncCall,
    SysFuncCall,
    BitSelect,
    PartSelect,
}

impl ObjectKind {
    pub fn name(self) -> &'static str {
        match self {
            ObjectKind::ModuleInst => "module_inst",
            ObjectKind::InterfaceInst => "interface_inst",
            ObjectKind::UdpDefn => "udp_defn",
            ObjectKind::Modport => "modport",
            ObjectKind::GenRegion => "gen_region",
            ObjectKind::GenIf => "gen_if",
            ObjectKind::GenIfElse => "gen_if_else",
            ObjectKind::GenCase => "gen_case",
            ObjectKind::GenFor => "gen_for",
            ObjectKind::Begin => "begin",
            ObjectKind::CaseItem => "case_item",
            ObjectKind::Assignment => "assignment",
            ObjectKind::Operation => "operation",
            ObjectKind::Constant => "constant",
            ObjectKind::RefObj => "ref_obj",
            ObjectKind::Variable => "variable",
            ObjectKind::RefModule => "ref_module",
            ObjectKind::ContAssign => "cont_assign",
            ObjectKind::Range => "range",
            ObjectKind::FuncCall => "func_call",
            ObjectKind::SysFuncCall => "sys_func_call",
            ObjectKind::BitSelect => "bit_select",
            ObjectKind::PartSelect => "part_select",
        }
    }
}

/// Operation codes, numbered as in the VPI headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[repr(i32)]
pub enum OpType {
    Minus = 1,
    Plus = 2,
    Not = 3,
    BitNeg = 4,
    UnaryAnd = 5,
    UnaryNand = 6,
    UnaryOr = 7,
    UnaryNor = 8,
    UnaryXor = 9,
    UnaryXNor = 10,
    Sub = 11,
    Div = 12,
    Mod = 13,
    Eq = 14,
    Neq = 15,
    CaseEq = 16,
    CaseNeq = 17,
    Gt = 18,
    Ge = 19,
    Lt = 20,
    Le = 21,
    LShift = 22,
    RShift = 23,
    Add = 24,
    Mult = 25,
    LogAnd = 26,
    LogOr = 27,
    BitAnd = 28,
    BitOr = 29,
    BitXor = 30,
    BitXNor = 31,
    Condition = 32,
    Concat = 33,
    MultiConcat = 34,
    ArithLShift = 41,
    ArithRShift = 42,
    Power = 43,
    PostInc = 62,
    PostDec = 63,
    PreInc = 64,
    PreDec = 65,
    Assignment = 82,
}

impl OpType {
    pub fn code(self) -> i32 {
        self as i32
    }
}

/// Source range attached to an object by the front end.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Location {
    pub file: String,
    pub line: u32,
    pub column: u16,
    pub end_line: u32,
    pub end_column: u16,
}

#[derive(Debug, Clone, Serialize)]
pub struct Object {
    pub kind: ObjectKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub def_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<AnyId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stmt: Option<AnyId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub else_stmt: Option<AnyId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<AnyId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lhs: Option<AnyId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rhs: Option<AnyId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub for_inc_stmt: Option<AnyId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub left_range: Option<AnyId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub right_range: Option<AnyId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<AnyId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stmts: Option<AnyVecId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exprs: Option<AnyVecId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub for_init_stmts: Option<AnyVecId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub case_items: Option<AnyVecId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operands: Option<AnyVecId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gen_stmts: Option<AnyVecId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tf_call_args: Option<AnyVecId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub op_type: Option<OpType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl Object {
    pub(crate) fn new(kind: ObjectKind) -> Self {
        Self {
            kind,
            name: None,
            def_name: None,
            parent: None,
            location: None,
            stmt: None,
            else_stmt: None,
            condition: None,
            lhs: None,
            rhs: None,
            for_inc_stmt: None,
            left_range: None,
            right_range: None,
            index: None,
            stmts: None,
            exprs: None,
            for_init_stmts: None,
            case_items: None,
            operands: None,
            gen_stmts: None,
            tf_call_args: None,
            op_type: None,
            value: None,
        }
    }
}
