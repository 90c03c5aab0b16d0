use design_ir::{AnyId, OpType, Serializer};

use super::{shape_children, CompileHelper};
use crate::file_content::FileContent;
use crate::num_utils::{parse_integral_literal, parse_uint64};
use crate::vobject::{NodeId, VObjectType};

/// IR opcode of an assignment operator.
pub fn vpi_op_type(vtype: VObjectType) -> Option<OpType> {
    use VObjectType::*;
    let op = match vtype {
        PaAssignOpAssign => OpType::Assignment,
        PaAssignOpAdd => OpType::Add,
        PaAssignOpSub => OpType::Sub,
        PaAssignOpMult => OpType::Mult,
        PaAssignOpDiv => OpType::Div,
        PaAssignOpModulo => OpType::Mod,
        PaAssignOpBitwAnd => OpType::BitAnd,
        PaAssignOpBitwOr => OpType::BitOr,
        PaAssignOpBitwXor => OpType::BitXor,
        PaAssignOpBitwLeftShift => OpType::LShift,
        PaAssignOpBitwRightShift => OpType::RShift,
        PaAssignOpArithShiftLeft => OpType::ArithLShift,
        PaAssignOpArithShiftRight => OpType::ArithRShift,
        _ => return None,
    };
    Some(op)
}

fn unary_op_type(vtype: VObjectType) -> Option<OpType> {
    use VObjectType::*;
    let op = match vtype {
        PaUnaryPlus => OpType::Plus,
        PaUnaryMinus => OpType::Minus,
        PaUnaryNot => OpType::Not,
        PaUnaryTilda => OpType::BitNeg,
        PaUnaryBitwAnd => OpType::UnaryAnd,
        PaUnaryReductNand => OpType::UnaryNand,
        PaUnaryBitwOr => OpType::UnaryOr,
        PaUnaryReductNor => OpType::UnaryNor,
        PaUnaryBitwXor => OpType::UnaryXor,
        PaUnaryReductXnor => OpType::UnaryXNor,
        _ => return None,
    };
    Some(op)
}

fn binary_op_type(vtype: VObjectType) -> Option<OpType> {
    use VObjectType::*;
    let op = match vtype {
        PaBinOpPlus => OpType::Add,
        PaBinOpMinus => OpType::Sub,
        PaBinOpMult => OpType::Mult,
        PaBinOpDiv => OpType::Div,
        PaBinOpPercent => OpType::Mod,
        PaBinOpMultMult => OpType::Power,
        PaBinOpEquiv => OpType::Eq,
        PaBinOpNot => OpType::Neq,
        PaBinOpFourStateLogicEqual => OpType::CaseEq,
        PaBinOpFourStateLogicNotEqual => OpType::CaseNeq,
        PaBinOpGreat => OpType::Gt,
        PaBinOpGreatEqual => OpType::Ge,
        PaBinOpLess => OpType::Lt,
        PaBinOpLessEqual => OpType::Le,
        PaBinOpShiftLeft => OpType::LShift,
        PaBinOpShiftRight => OpType::RShift,
        PaBinOpArithShiftLeft => OpType::ArithLShift,
        PaBinOpArithShiftRight => OpType::ArithRShift,
        PaBinOpLogicAnd => OpType::LogAnd,
        PaBinOpLogicOr => OpType::LogOr,
        PaBinOpBitwAnd => OpType::BitAnd,
        PaBinOpBitwOr => OpType::BitOr,
        PaBinOpBitwXor => OpType::BitXor,
        PaBinOpBitwXnor => OpType::BitXNor,
        _ => return None,
    };
    Some(op)
}

/// `VALUE_KIND:value` text of an integral literal.
fn integral_value(text: &str) -> String {
    let Some(tick) = text.find('\'') else {
        return match parse_uint64(text) {
            Some(value) => format!("UINT:{value}"),
            None => format!("DEC:{text}"),
        };
    };
    let spec = text[tick + 1..].trim_start_matches(['s', 'S']);
    let mut chars = spec.chars();
    let base = chars.next().map(|c| c.to_ascii_lowercase());
    let digits: String = chars.filter(|c| *c != '_').collect();
    match base {
        Some('b') => format!("BIN:{digits}"),
        Some('o') => format!("OCT:{digits}"),
        Some('h') => format!("HEX:{digits}"),
        Some('d') => match parse_integral_literal(text) {
            Some(value) => format!("UINT:{value}"),
            None => format!("DEC:{digits}"),
        },
        Some(bit) => format!("BIN:{bit}"),
        None => format!("DEC:{text}"),
    }
}

impl CompileHelper<'_> {
    /// Lowers the expression at `id`. `parent`, when given, becomes the
    /// parent of the result.
    pub fn compile_expression(
        &self,
        fc: &FileContent,
        id: NodeId,
        s: &mut Serializer,
        parent: Option<AnyId>,
    ) -> Option<AnyId> {
        let result = self.expression(fc, id, s)?;
        if let Some(parent) = parent {
            s.set_vpi_parent(result, parent);
        }
        Some(result)
    }

    fn expression(&self, fc: &FileContent, id: NodeId, s: &mut Serializer) -> Option<AnyId> {
        use VObjectType::*;
        if !id.is_valid() {
            return None;
        }
        match fc.vtype(id) {
            PaExpression | PaConstantExpression => self.operation(fc, id, s),
            PaPrimary | PaConstantPrimary | PaVariableLvalue | PaNetLvalue => {
                let kids = shape_children(fc, id);
                match kids.first().map(|k| fc.vtype(*k)) {
                    Some(SlStringConst | PaClassScope) => Some(self.reference(fc, id, &kids, s)),
                    Some(_) => self.expression(fc, kids[0], s),
                    None => None,
                }
            }
            SlStringConst => Some(self.reference(fc, id, &[id], s)),
            PaPrimaryLiteral | PaStringValue => self.expression(fc, fc.child(id), s),
            SlIntConst | SlRealConst | SlStringLiteral => Some(self.constant(fc, id, s)),
            PaConcatenation => {
                let operands = shape_children(fc, id);
                Some(self.make_operation(fc, id, OpType::Concat, &operands, s))
            }
            PaMultipleConcatenation => {
                let operands = shape_children(fc, id);
                Some(self.make_operation(fc, id, OpType::MultiConcat, &operands, s))
            }
            PaSystemTfCall => {
                let name = fc.sl_collect(fc.sl_get(id, PaSystemTaskNames), SlStringConst);
                let call = s.make_sys_func_call();
                s.set_vpi_name(call, fc.sym_name(name));
                self.call_arguments(fc, id, call, s);
                fc.populate_core_members(id, id, s, call);
                Some(call)
            }
            PaComplexFuncCall => {
                let call = s.make_func_call();
                s.set_vpi_name(call, &reference_name(fc, &shape_children(fc, id)));
                self.call_arguments(fc, id, call, s);
                fc.populate_core_members(id, id, s, call);
                Some(call)
            }
            PaGenvarIteration | PaOperatorAssignment | PaForStep => self.inc_dec(fc, id, s),
            _ => None,
        }
    }

    fn operation(&self, fc: &FileContent, id: NodeId, s: &mut Serializer) -> Option<AnyId> {
        let kids = shape_children(fc, id);
        match kids.as_slice() {
            [only] => self.expression(fc, *only, s),
            [op, operand] => {
                let op_type = unary_op_type(fc.vtype(*op))?;
                Some(self.make_operation(fc, id, op_type, &[*operand], s))
            }
            [cond, qmark, then, otherwise] if fc.vtype(*qmark) == VObjectType::PaQmark => Some(
                self.make_operation(fc, id, OpType::Condition, &[*cond, *then, *otherwise], s),
            ),
            [lhs, op, rhs] => {
                let operation = s.make_operation();
                if let Some(op_type) = binary_op_type(fc.vtype(*op)) {
                    s.set_vpi_op_type(operation, op_type);
                }
                fc.populate_core_members(id, id, s, operation);
                let operands = s.make_any_vec();
                for operand in [*lhs, *rhs] {
                    if let Some(child) = self.compile_expression(fc, operand, s, Some(operation)) {
                        s.push(operands, child);
                    }
                }
                s.set_operands(operation, operands);
                Some(operation)
            }
            _ => None,
        }
    }

    fn make_operation(
        &self,
        fc: &FileContent,
        id: NodeId,
        op_type: OpType,
        operands: &[NodeId],
        s: &mut Serializer,
    ) -> AnyId {
        let operation = s.make_operation();
        s.set_vpi_op_type(operation, op_type);
        fc.populate_core_members(id, id, s, operation);
        let vec = s.make_any_vec();
        for operand in operands {
            if let Some(child) = self.compile_expression(fc, *operand, s, Some(operation)) {
                s.push(vec, child);
            }
        }
        s.set_operands(operation, vec);
        operation
    }

    /// `i++`, `--i` and friends as a pre/post increment operation.
    fn inc_dec(&self, fc: &FileContent, id: NodeId, s: &mut Serializer) -> Option<AnyId> {
        use VObjectType::*;
        let kids = shape_children(fc, id);
        let (op_type, var) = match kids.as_slice() {
            [var, op] if fc.vtype(*op) == PaIncDecPlusPlus => (OpType::PostInc, *var),
            [var, op] if fc.vtype(*op) == PaIncDecMinusMinus => (OpType::PostDec, *var),
            [op, var] if fc.vtype(*op) == PaIncDecPlusPlus => (OpType::PreInc, *var),
            [op, var] if fc.vtype(*op) == PaIncDecMinusMinus => (OpType::PreDec, *var),
            _ => return None,
        };
        Some(self.make_operation(fc, id, op_type, &[var], s))
    }

    fn call_arguments(&self, fc: &FileContent, id: NodeId, call: AnyId, s: &mut Serializer) {
        let list = fc.sl_get(id, VObjectType::PaListOfArguments);
        if !list.is_valid() {
            return;
        }
        let args = s.make_any_vec();
        for arg in shape_children(fc, list) {
            if let Some(child) = self.compile_expression(fc, arg, s, Some(call)) {
                s.push(args, child);
            }
        }
        s.set_tf_call_args(call, args);
    }

    fn constant(&self, fc: &FileContent, id: NodeId, s: &mut Serializer) -> AnyId {
        let text = fc.sym_name(id);
        let value = match fc.vtype(id) {
            VObjectType::SlIntConst => integral_value(text),
            VObjectType::SlRealConst => format!("REAL:{text}"),
            _ => format!("STRING:{text}"),
        };
        let constant = s.make_constant();
        s.set_value(constant, &value);
        fc.populate_core_members(id, id, s, constant);
        constant
    }

    /// Hierarchical or package-scoped name, with its first select applied.
    fn reference(&self, fc: &FileContent, id: NodeId, kids: &[NodeId], s: &mut Serializer) -> AnyId {
        use VObjectType::*;
        let name = reference_name(fc, kids);
        let select = kids
            .iter()
            .copied()
            .find(|k| fc.vtype(*k) == PaSelect)
            .map(|select| fc.child(select))
            .filter(|first| first.is_valid());

        let Some(select) = select else {
            let reference = s.make_ref_obj();
            s.set_vpi_name(reference, &name);
            fc.populate_core_members(id, id, s, reference);
            return reference;
        };
        if fc.vtype(select) == PaPartSelectRange {
            let part = s.make_part_select();
            s.set_vpi_name(part, &name);
            fc.populate_core_members(id, id, s, part);
            let bounds = shape_children(fc, select);
            if let Some(left) = bounds.first() {
                if let Some(left) = self.compile_expression(fc, *left, s, Some(part)) {
                    s.set_left_range(part, left);
                }
            }
            if let Some(right) = bounds.get(1) {
                if let Some(right) = self.compile_expression(fc, *right, s, Some(part)) {
                    s.set_right_range(part, right);
                }
            }
            part
        } else {
            let bit = s.make_bit_select();
            s.set_vpi_name(bit, &name);
            fc.populate_core_members(id, id, s, bit);
            if let Some(index) = self.compile_expression(fc, fc.child(select), s, Some(bit)) {
                s.set_index(bit, index);
            }
            bit
        }
    }
}

/// `pkg::a.b` from the leading identifier nodes of a reference.
fn reference_name(fc: &FileContent, kids: &[NodeId]) -> String {
    let mut name = String::new();
    let mut parts = Vec::new();
    for kid in kids {
        match fc.vtype(*kid) {
            VObjectType::PaClassScope => {
                name.push_str(fc.sym_name(fc.child(fc.child(*kid))));
                name.push_str("::");
            }
            VObjectType::SlStringConst => parts.push(fc.sym_name(*kid)),
            _ => break,
        }
    }
    name.push_str(&parts.join("."));
    name
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assignment_operators_map_to_opcodes() {
        assert_eq!(vpi_op_type(VObjectType::PaAssignOpAssign).map(OpType::code), Some(82));
        assert_eq!(vpi_op_type(VObjectType::PaAssignOpAdd), Some(OpType::Add));
        assert_eq!(
            vpi_op_type(VObjectType::PaAssignOpArithShiftRight),
            Some(OpType::ArithRShift)
        );
        assert_eq!(vpi_op_type(VObjectType::PaBinOpPlus), None);
    }

    #[test]
    fn literal_values_carry_their_radix() {
        assert_eq!(integral_value("42"), "UINT:42");
        assert_eq!(integral_value("8'hF_F"), "HEX:FF");
        assert_eq!(integral_value("4'sb1010"), "BIN:1010");
        assert_eq!(integral_value("'d12"), "UINT:12");
        assert_eq!(integral_value("'1"), "BIN:1");
        assert_eq!(integral_value("18446744073709551615"), "UINT:18446744073709551615");
        assert_eq!(integral_value("18446744073709551616"), "DEC:18446744073709551616");
    }
}
