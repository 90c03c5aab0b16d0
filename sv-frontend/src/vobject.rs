//! Flat tree nodes shared by the preprocessor and the parser.

use std::fmt;

use crate::symbols::{PathId, SymbolId, SymbolTable};

/// Index of a [`VObject`] inside one `FileContent`. Id 0 is never a real
/// node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub const INVALID: NodeId = NodeId(0);

    pub fn new(index: usize) -> Self {
        NodeId(index as u32)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub fn is_valid(self) -> bool {
        self.0 != 0
    }

    pub fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

macro_rules! vobject_types {
    ($($variant:ident => $name:literal,)*) => {
        /// Grammar productions of both grammars plus synthetic node kinds.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum VObjectType {
            $($variant,)*
        }

        impl VObjectType {
            pub const ALL: &'static [VObjectType] = &[$(VObjectType::$variant,)*];

            pub fn name(self) -> &'static str {
                match self {
                    $(VObjectType::$variant => $name,)*
                }
            }
        }
    };
}

vobject_types! {
    SlNoType => "slNoType",
    SlStringConst => "slStringConst",
    SlIntConst => "slIntConst",
    SlRealConst => "slRealConst",
    SlStringLiteral => "slStringLiteral",
    SlUnparsableText => "slUnparsable_Text",
    SlPreprocBegin => "slPreprocBegin",
    SlPreprocEnd => "slPreprocEnd",

    PpTopLevelRule => "ppTop_level_rule",
    PpSourceText => "ppSource_text",
    PpTextBlob => "ppText_blob",
    PpComment => "ppComment",
    PpString => "ppString",
    PpNumber => "ppNumber",
    PpPsIdentifier => "ppPs_identifier",
    PpEscapedIdentifier => "ppEscaped_identifier",
    PpIncludeDirective => "ppInclude_directive",
    PpLineDirective => "ppLine_directive",
    PpTimescaleDirective => "ppTimescale_directive",
    PpResetallDirective => "ppResetall_directive",
    PpDefaultNettypeDirective => "ppDefault_nettype_directive",
    PpUndefDirective => "ppUndef_directive",
    PpUndefineallDirective => "ppUndefineall_directive",
    PpIfdefDirective => "ppIfdef_directive",
    PpIfndefDirective => "ppIfndef_directive",
    PpElsifDirective => "ppElsif_directive",
    PpElseDirective => "ppElse_directive",
    PpEndifDirective => "ppEndif_directive",
    PpCelldefineDirective => "ppCelldefine_directive",
    PpEndcelldefineDirective => "ppEndcelldefine_directive",
    PpSvFileDirective => "ppSv_file_directive",
    PpSvLineDirective => "ppSv_line_directive",
    PpSimpleNoArgsMacroDefinition => "ppSimple_no_args_macro_definition",
    PpSimpleArgsMacroDefinition => "ppSimple_args_macro_definition",
    PpMultilineNoArgsMacroDefinition => "ppMultiline_no_args_macro_definition",
    PpMultilineArgsMacroDefinition => "ppMultiline_args_macro_definition",
    PpFormalArgList => "ppFormal_arg_list",
    PpFormalArg => "ppFormal_arg",
    PpDefaultValue => "ppDefault_value",
    PpSimpleMacroDefinitionBody => "ppSimple_macro_definition_body",
    PpEscapedMacroDefinitionBody => "ppEscaped_macro_definition_body",
    PpMacroInstanceWithArgs => "ppMacroInstanceWithArgs",
    PpMacroInstanceNoArgs => "ppMacroInstanceNoArgs",
    PpMacroActualArgs => "ppMacro_actual_args",
    PpMacroArg => "ppMacro_arg",

    PaTopLevelRule => "paTop_level_rule",
    PaSourceText => "paSource_text",
    PaModuleDeclaration => "paModule_declaration",
    PaModuleKeyword => "paModule_keyword",
    PaInterfaceDeclaration => "paInterface_declaration",
    PaInterface => "paINTERFACE",
    PaUdpDeclaration => "paUdp_declaration",
    PaPrimitive => "paPRIMITIVE",
    PaUdpBody => "paUdp_body",
    PaPackageDeclaration => "paPackage_declaration",
    PaProgramDeclaration => "paProgram_declaration",
    PaClassDeclaration => "paClass_declaration",
    PaConfigDeclaration => "paConfig_declaration",
    PaCheckerDeclaration => "paChecker_declaration",
    PaOpaqueBody => "paOpaque_body",
    PaEndLabel => "paEnd_label",
    PaParameterPortList => "paParameter_port_list",
    PaListOfPorts => "paList_of_ports",
    PaPort => "paPort",
    PaListOfPortDeclarations => "paList_of_port_declarations",
    PaAnsiPortDeclaration => "paAnsi_port_declaration",
    PaPortDeclaration => "paPort_declaration",
    PaInputDeclaration => "paInput_declaration",
    PaOutputDeclaration => "paOutput_declaration",
    PaInoutDeclaration => "paInout_declaration",
    PaListOfPortIdentifiers => "paList_of_port_identifiers",
    PaPortDirInp => "paPortDir_Inp",
    PaPortDirOut => "paPortDir_Out",
    PaPortDirInout => "paPortDir_Inout",
    PaPortDirRef => "paPortDir_Ref",
    PaNetTypeWire => "paNetType_Wire",
    PaNetTypeUwire => "paNetType_Uwire",
    PaNetTypeTri => "paNetType_Tri",
    PaNetTypeWand => "paNetType_Wand",
    PaNetTypeWor => "paNetType_Wor",
    PaNetTypeSupply0 => "paNetType_Supply0",
    PaNetTypeSupply1 => "paNetType_Supply1",
    PaDataType => "paData_type",
    PaIntVecTypeLogic => "paIntVec_TypeLogic",
    PaIntVecTypeReg => "paIntVec_TypeReg",
    PaIntVecTypeBit => "paIntVec_TypeBit",
    PaIntegerAtomTypeInt => "paIntegerAtomType_Int",
    PaIntegerAtomTypeInteger => "paIntegerAtomType_Integer",
    PaIntegerAtomTypeByte => "paIntegerAtomType_Byte",
    PaIntegerAtomTypeShortint => "paIntegerAtomType_Shortint",
    PaIntegerAtomTypeLongInt => "paIntegerAtomType_LongInt",
    PaNonIntTypeReal => "paNonIntType_Real",
    PaStringType => "paString_type",
    PaSigningSigned => "paSigning_Signed",
    PaSigningUnsigned => "paSigning_Unsigned",
    PaPackedDimension => "paPacked_dimension",
    PaUnpackedDimension => "paUnpacked_dimension",
    PaConstantRange => "paConstant_range",
    PaInterfacePortHeader => "paInterface_port_header",
    PaClassScope => "paClass_scope",
    PaClassType => "paClass_type",
    PaParameterDeclaration => "paParameter_declaration",
    PaLocalParameterDeclaration => "paLocal_parameter_declaration",
    PaParamAssignment => "paParam_assignment",
    PaTypeDeclaration => "paType_declaration",
    PaNetDeclaration => "paNet_declaration",
    PaDataDeclaration => "paData_declaration",
    PaNetDeclAssignment => "paNet_decl_assignment",
    PaVariableDeclAssignment => "paVariable_decl_assignment",
    PaContinuousAssign => "paContinuous_assign",
    PaNetAssignment => "paNet_assignment",
    PaNetLvalue => "paNet_lvalue",
    PaVariableLvalue => "paVariable_lvalue",
    PaInitialConstruct => "paInitial_construct",
    PaAlwaysConstruct => "paAlways_construct",
    PaAlwaysKeyword => "paAlways_keyword",
    PaAlways => "paALWAYS",
    PaAlwaysComb => "paALWAYS_COMB",
    PaAlwaysFf => "paALWAYS_FF",
    PaAlwaysLatch => "paALWAYS_LATCH",
    PaEventControl => "paEvent_control",
    PaEventExpression => "paEvent_expression",
    PaEdgePosedge => "paEdge_Posedge",
    PaEdgeNegedge => "paEdge_Negedge",
    PaModuleInstantiation => "paModule_instantiation",
    PaParameterValueAssignment => "paParameter_value_assignment",
    PaOrderedParameterAssignment => "paOrdered_parameter_assignment",
    PaNamedParameterAssignment => "paNamed_parameter_assignment",
    PaHierarchicalInstance => "paHierarchical_instance",
    PaNameOfInstance => "paName_of_instance",
    PaListOfPortConnections => "paList_of_port_connections",
    PaOrderedPortConnection => "paOrdered_port_connection",
    PaNamedPortConnection => "paNamed_port_connection",
    PaDotStar => "paDOTSTAR",
    PaGateInstantiation => "paGate_instantiation",
    PaNInputGateInstance => "paN_input_gate_instance",
    PaNInpGateAnd => "paNInpGate_And",
    PaNInpGateNand => "paNInpGate_Nand",
    PaNInpGateOr => "paNInpGate_Or",
    PaNInpGateNor => "paNInpGate_Nor",
    PaNInpGateXor => "paNInpGate_Xor",
    PaNInpGateXnor => "paNInpGate_Xnor",
    PaGenvarDeclaration => "paGenvar_declaration",
    PaModportDeclaration => "paModport_declaration",
    PaModportItem => "paModport_item",
    PaModportPortsDeclaration => "paModport_ports_declaration",
    PaModportSimplePortsDeclaration => "paModport_simple_ports_declaration",
    PaModportSimplePort => "paModport_simple_port",
    PaModportClockingDeclaration => "paModport_clocking_declaration",
    PaClockingDeclaration => "paClocking_declaration",
    PaFunctionDeclaration => "paFunction_declaration",
    PaTaskDeclaration => "paTask_declaration",
    PaGenerateRegion => "paGenerate_region",
    PaGenerateBlock => "paGenerate_block",
    PaGenerateBeginEndBlock => "paGenerate_begin_end_block",
    PaConditionalGenerateConstruct => "paConditional_generate_construct",
    PaIfGenerateConstruct => "paIf_generate_construct",
    PaIf => "paIF",
    PaElse => "paELSE",
    PaCaseGenerateConstruct => "paCase_generate_construct",
    PaCaseGenerateItem => "paCase_generate_item",
    PaLoopGenerateConstruct => "paLoop_generate_construct",
    PaGenvarInitialization => "paGenvar_initialization",
    PaGenvarDeclAssignment => "paGenvar_decl_assignment",
    PaGenvarIteration => "paGenvar_iteration",
    PaSeqBlock => "paSeq_block",
    PaSystemTfCall => "paSystem_task",
    PaSystemTaskNames => "paSystem_task_names",
    PaListOfArguments => "paList_of_arguments",
    PaNonblockingAssignment => "paNonblocking_assignment",
    PaOperatorAssignment => "paOperator_assignment",
    PaConditionalStatement => "paConditional_statement",
    PaSubroutineCallStatement => "paSubroutine_call_statement",
    PaProceduralTimingControlStatement => "paProcedural_timing_control_statement",
    PaDelayControl => "paDelay_control",
    PaCaseStatement => "paCase_statement",
    PaCaseItem => "paCase_item",
    PaLoopStatement => "paLoop_statement",
    PaForInitialization => "paFor_initialization",
    PaForStep => "paFor_step",
    PaPackageImportDeclaration => "paPackage_import_declaration",
    PaExpression => "paExpression",
    PaConstantExpression => "paConstant_expression",
    PaPrimary => "paPrimary",
    PaConstantPrimary => "paConstant_primary",
    PaPrimaryLiteral => "paPrimary_literal",
    PaConcatenation => "paConcatenation",
    PaMultipleConcatenation => "paMultiple_concatenation",
    PaSelect => "paSelect",
    PaBitSelect => "paBit_select",
    PaPartSelectRange => "paPart_select_range",
    PaComplexFuncCall => "paComplex_func_call",
    PaStringValue => "paString_value",
    PaQmark => "paQmark",
    PaBinOpPlus => "paBinOp_Plus",
    PaBinOpMinus => "paBinOp_Minus",
    PaBinOpMult => "paBinOp_Mult",
    PaBinOpDiv => "paBinOp_Div",
    PaBinOpPercent => "paBinOp_Percent",
    PaBinOpMultMult => "paBinOp_MultMult",
    PaBinOpShiftLeft => "paBinOp_ShiftLeft",
    PaBinOpShiftRight => "paBinOp_ShiftRight",
    PaBinOpArithShiftLeft => "paBinOp_ArithShiftLeft",
    PaBinOpArithShiftRight => "paBinOp_ArithShiftRight",
    PaBinOpLess => "paBinOp_Less",
    PaBinOpLessEqual => "paBinOp_LessEqual",
    PaBinOpGreat => "paBinOp_Great",
    PaBinOpGreatEqual => "paBinOp_GreatEqual",
    PaBinOpEquiv => "paBinOp_Equiv",
    PaBinOpNot => "paBinOp_Not",
    PaBinOpFourStateLogicEqual => "paBinOp_FourStateLogicEqual",
    PaBinOpFourStateLogicNotEqual => "paBinOp_FourStateLogicNotEqual",
    PaBinOpBitwAnd => "paBinOp_BitwAnd",
    PaBinOpBitwOr => "paBinOp_BitwOr",
    PaBinOpBitwXor => "paBinOp_BitwXor",
    PaBinOpBitwXnor => "paBinOp_BitwXnor",
    PaBinOpReductNand => "paBinOp_ReductNand",
    PaBinOpReductNor => "paBinOp_ReductNor",
    PaBinOpLogicAnd => "paBinOp_LogicAnd",
    PaBinOpLogicOr => "paBinOp_LogicOr",
    PaUnaryPlus => "paUnary_Plus",
    PaUnaryMinus => "paUnary_Minus",
    PaUnaryNot => "paUnary_Not",
    PaUnaryTilda => "paUnary_Tilda",
    PaUnaryBitwAnd => "paUnary_BitwAnd",
    PaUnaryBitwOr => "paUnary_BitwOr",
    PaUnaryBitwXor => "paUnary_BitwXor",
    PaUnaryReductNand => "paUnary_ReductNand",
    PaUnaryReductNor => "paUnary_ReductNor",
    PaUnaryReductXnor => "paUnary_ReductXnor",
    PaAssignOpAssign => "paAssignOp_Assign",
    PaAssignOpAdd => "paAssignOp_Add",
    PaAssignOpSub => "paAssignOp_Sub",
    PaAssignOpMult => "paAssignOp_Mult",
    PaAssignOpDiv => "paAssignOp_Div",
    PaAssignOpModulo => "paAssignOp_Modulo",
    PaAssignOpBitwAnd => "paAssignOp_BitwAnd",
    PaAssignOpBitwOr => "paAssignOp_BitwOr",
    PaAssignOpBitwXor => "paAssignOp_BitwXor",
    PaAssignOpBitwLeftShift => "paAssignOp_BitwLeftShift",
    PaAssignOpBitwRightShift => "paAssignOp_BitwRightShift",
    PaAssignOpArithShiftLeft => "paAssignOp_ArithShiftLeft",
    PaAssignOpArithShiftRight => "paAssignOp_ArithShiftRight",
    PaIncDecPlusPlus => "paIncDec_PlusPlus",
    PaIncDecMinusMinus => "paIncDec_MinusMinus",
    PaOneLineComment => "paOne_line_comment",
    PaBlockComment => "paBlock_comment",
    PaWhiteSpace => "paWhite_space",
}

impl Default for VObjectType {
    fn default() -> Self {
        VObjectType::SlNoType
    }
}

impl VObjectType {
    /// Production of the preprocessor grammar.
    pub fn is_preproc(self) -> bool {
        self.name().starts_with("pp")
    }

    /// Nodes that hang off the tree without being part of the grammar shape.
    pub fn is_trivia(self) -> bool {
        matches!(
            self,
            VObjectType::PaOneLineComment
                | VObjectType::PaBlockComment
                | VObjectType::PaWhiteSpace
                | VObjectType::SlPreprocBegin
                | VObjectType::SlPreprocEnd
        )
    }

    pub fn is_macro_definition(self) -> bool {
        matches!(
            self,
            VObjectType::PpSimpleNoArgsMacroDefinition
                | VObjectType::PpSimpleArgsMacroDefinition
                | VObjectType::PpMultilineNoArgsMacroDefinition
                | VObjectType::PpMultilineArgsMacroDefinition
        )
    }

    pub fn is_macro_instance(self) -> bool {
        matches!(
            self,
            VObjectType::PpMacroInstanceWithArgs | VObjectType::PpMacroInstanceNoArgs
        )
    }

    pub fn from_name(name: &str) -> Option<VObjectType> {
        VObjectType::ALL.iter().copied().find(|t| t.name() == name)
    }
}

impl fmt::Display for VObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VObject {
    pub name: SymbolId,
    pub vtype: VObjectType,
    pub file_id: PathId,
    pub line: u32,
    pub column: u16,
    pub end_line: u32,
    pub end_column: u16,
    pub parent: NodeId,
    pub definition: NodeId,
    pub child: NodeId,
    pub sibling: NodeId,
}

impl VObject {
    pub fn new(name: SymbolId, vtype: VObjectType, file_id: PathId, parent: NodeId) -> Self {
        Self {
            name,
            vtype,
            file_id,
            line: 0,
            column: 0,
            end_line: 0,
            end_column: 0,
            parent,
            definition: NodeId::INVALID,
            child: NodeId::INVALID,
            sibling: NodeId::INVALID,
        }
    }

    pub fn with_range(mut self, line: u32, column: u16, end_line: u32, end_column: u16) -> Self {
        self.line = line;
        self.column = column;
        self.end_line = end_line;
        self.end_column = end_column;
        self
    }

    /// One-line debug rendering: `n<> u<> t<> p<> c<> s<> d<> f<> l<> el<>`.
    pub fn print(&self, symbols: &SymbolTable, uid: NodeId) -> String {
        let mut text = format!("n<{}> u<{}> t<{}>", self.display_name(symbols), uid, self.vtype);
        if self.parent.is_valid() {
            text.push_str(&format!(" p<{}>", self.parent));
        }
        if self.child.is_valid() {
            text.push_str(&format!(" c<{}>", self.child));
        }
        if self.sibling.is_valid() {
            text.push_str(&format!(" s<{}>", self.sibling));
        }
        if self.definition.is_valid() {
            text.push_str(&format!(" d<{}>", self.definition));
        }
        if self.file_id.is_valid() {
            text.push_str(&format!(" f<{}>", symbols.path(self.file_id)));
        }
        text.push_str(&format!(
            " l<{}:{}> el<{}:{}>",
            self.line, self.column, self.end_line, self.end_column
        ));
        text
    }

    fn display_name<'a>(&self, symbols: &'a SymbolTable) -> &'a str {
        if self.name.is_bad() {
            ""
        } else {
            symbols.symbol(self.name)
        }
    }
}
