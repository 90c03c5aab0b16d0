use design_ir::{AnyId, AnyVecId, Serializer};
use log::{debug, trace};

use super::expr::vpi_op_type;
use super::{shape_children, CompileHelper};
use crate::design::ModuleDefinition;
use crate::error::{Diagnostic, ErrorKind, Result};
use crate::file_content::FileContent;
use crate::vobject::{NodeId, VObjectType};

/// Label of a `begin : name` generate block.
fn block_name(fc: &FileContent, block: NodeId) -> Option<&str> {
    let inner = shape_children(fc, block).first().copied()?;
    if fc.vtype(inner) != VObjectType::PaGenerateBeginEndBlock {
        return None;
    }
    let label = shape_children(fc, inner).first().copied()?;
    (fc.vtype(label) == VObjectType::SlStringConst).then(|| fc.sym_name(label))
}

/// Items of a generate block: the contents of `begin ... end`, or the single
/// item of an unbracketed block.
fn block_items(fc: &FileContent, block: NodeId) -> Vec<NodeId> {
    let kids = shape_children(fc, block);
    match kids.first() {
        Some(inner) if fc.vtype(*inner) == VObjectType::PaGenerateBeginEndBlock => {
            shape_children(fc, *inner)
                .into_iter()
                .filter(|k| !matches!(fc.vtype(*k), VObjectType::SlStringConst | VObjectType::PaEndLabel))
                .collect()
        }
        _ => kids,
    }
}

fn gate_name(vtype: VObjectType) -> &'static str {
    match vtype {
        VObjectType::PaNInpGateAnd => "and",
        VObjectType::PaNInpGateNand => "nand",
        VObjectType::PaNInpGateOr => "or",
        VObjectType::PaNInpGateNor => "nor",
        VObjectType::PaNInpGateXor => "xor",
        VObjectType::PaNInpGateXnor => "xnor",
        _ => "",
    }
}

impl CompileHelper<'_> {
    /// Lowers the generate region or generate construct at `id` into the
    /// IR. The result is parented to the component's IR instance.
    pub fn compile_gen_stmt(
        &self,
        component: &ModuleDefinition<'_>,
        fc: &FileContent,
        id: NodeId,
        s: &mut Serializer,
    ) -> Result<Vec<AnyId>> {
        self.gen_stmt(component, fc, id, component.ir(), s)
    }

    fn gen_stmt(
        &self,
        component: &ModuleDefinition<'_>,
        fc: &FileContent,
        id: NodeId,
        parent: AnyId,
        s: &mut Serializer,
    ) -> Result<Vec<AnyId>> {
        let guard = self.check_for_loops();
        if guard.exceeded() {
            self.report(
                fc,
                id,
                Diagnostic::new(
                    format!("generate constructs of {} nested too deeply", component.name()),
                    ErrorKind::CompLoopDepth,
                ),
            )?;
            return Ok(Vec::new());
        }

        let vtype = fc.vtype(id);
        let construct = if vtype == VObjectType::PaConditionalGenerateConstruct {
            shape_children(fc, id).first().copied().unwrap_or(NodeId::INVALID)
        } else {
            id
        };
        trace!("{}: lowering {} at line {}", component.name(), vtype, fc.line(id));
        let stmt = match (vtype, fc.vtype(construct)) {
            (VObjectType::PaGenerateRegion, _) => self.gen_region(component, fc, id, parent, s)?,
            (_, VObjectType::PaIfGenerateConstruct) => {
                self.if_generate(component, fc, id, construct, parent, s)?
            }
            (_, VObjectType::PaCaseGenerateConstruct) => {
                self.case_generate(component, fc, construct, parent, s)?
            }
            (_, VObjectType::PaLoopGenerateConstruct) => {
                self.for_generate(component, fc, construct, parent, s)?
            }
            _ => {
                self.report(
                    fc,
                    id,
                    Diagnostic::new(
                        format!("unsupported generate construct {vtype}"),
                        ErrorKind::CompUnknownGenConstruct,
                    ),
                )?;
                return Ok(Vec::new());
            }
        };
        Ok(vec![stmt])
    }

    fn gen_region(
        &self,
        component: &ModuleDefinition<'_>,
        fc: &FileContent,
        id: NodeId,
        parent: AnyId,
        s: &mut Serializer,
    ) -> Result<AnyId> {
        let region = s.make_gen_region();
        s.set_vpi_parent(region, parent);
        fc.populate_core_members(id, id, s, region);

        let items = shape_children(fc, id);
        let first = items.first().copied().unwrap_or(id);
        let begin = s.make_begin();
        s.set_vpi_parent(begin, region);
        fc.populate_core_members(first, first, s, begin);
        s.set_vpi_stmt(region, begin);
        // `generate begin : name ... end endgenerate` names the region.
        if let Some(name) = block_name(fc, first) {
            s.set_vpi_name(begin, name);
        }

        let _guard = self.check_for_loops();
        let stmts = self.compile_items(component, fc, &items, begin, s)?;
        s.set_stmts(begin, stmts);
        Ok(region)
    }

    /// `begin` holding the items of a generate block.
    fn gen_block(
        &self,
        component: &ModuleDefinition<'_>,
        fc: &FileContent,
        block: NodeId,
        parent: AnyId,
        s: &mut Serializer,
    ) -> Result<AnyId> {
        let begin = s.make_begin();
        s.set_vpi_parent(begin, parent);
        fc.populate_core_members(block, block, s, begin);
        if let Some(name) = block_name(fc, block) {
            s.set_vpi_name(begin, name);
        }

        let _guard = self.check_for_loops();
        let stmts = self.compile_items(component, fc, &block_items(fc, block), begin, s)?;
        s.set_stmts(begin, stmts);
        Ok(begin)
    }

    fn condition(
        &self,
        fc: &FileContent,
        id: Option<NodeId>,
        owner: NodeId,
        parent: AnyId,
        s: &mut Serializer,
    ) -> Result<()> {
        let _guard = self.check_for_loops();
        let condition = id.and_then(|id| self.compile_expression(fc, id, s, Some(parent)));
        match condition {
            Some(condition) => s.set_vpi_condition(parent, condition),
            None => self.report(
                fc,
                owner,
                Diagnostic::new("generate construct without a usable condition", ErrorKind::CompMissingCondition),
            )?,
        }
        Ok(())
    }

    fn if_generate(
        &self,
        component: &ModuleDefinition<'_>,
        fc: &FileContent,
        id: NodeId,
        construct: NodeId,
        parent: AnyId,
        s: &mut Serializer,
    ) -> Result<AnyId> {
        let kids = shape_children(fc, construct);
        let has_else = kids.iter().any(|k| fc.vtype(*k) == VObjectType::PaElse);
        let condition = kids.iter().copied().find(|k| {
            matches!(
                fc.vtype(*k),
                VObjectType::PaConstantExpression | VObjectType::PaExpression
            )
        });
        let blocks: Vec<NodeId> = kids
            .iter()
            .copied()
            .filter(|k| fc.vtype(*k) == VObjectType::PaGenerateBlock)
            .collect();

        if has_else && blocks.len() == 2 {
            let gen_if = s.make_gen_if_else();
            s.set_vpi_parent(gen_if, parent);
            let first = kids.first().copied().unwrap_or(construct);
            fc.populate_core_members(first, blocks[1], s, gen_if);
            self.condition(fc, condition, construct, gen_if, s)?;

            let then_stmt = self.gen_block(component, fc, blocks[0], gen_if, s)?;
            s.set_vpi_stmt(gen_if, then_stmt);
            let else_stmt = self.gen_block(component, fc, blocks[1], gen_if, s)?;
            s.set_vpi_else_stmt(gen_if, else_stmt);
            return Ok(gen_if);
        }

        if has_else {
            self.report(
                fc,
                construct,
                Diagnostic::new(
                    "malformed if-generate, lowered without its else branch",
                    ErrorKind::CompUnknownGenConstruct,
                ),
            )?;
        }
        let gen_if = s.make_gen_if();
        s.set_vpi_parent(gen_if, parent);
        fc.populate_core_members(id, id, s, gen_if);
        self.condition(fc, condition, construct, gen_if, s)?;
        let stmt = match blocks.first() {
            Some(block) => self.gen_block(component, fc, *block, gen_if, s)?,
            None => {
                let begin = s.make_begin();
                s.set_vpi_parent(begin, gen_if);
                fc.populate_core_members(construct, construct, s, begin);
                let stmts = s.make_any_vec();
                s.set_stmts(begin, stmts);
                begin
            }
        };
        s.set_vpi_stmt(gen_if, stmt);
        Ok(gen_if)
    }

    fn case_generate(
        &self,
        component: &ModuleDefinition<'_>,
        fc: &FileContent,
        construct: NodeId,
        parent: AnyId,
        s: &mut Serializer,
    ) -> Result<AnyId> {
        let gen_case = s.make_gen_case();
        s.set_vpi_parent(gen_case, parent);
        fc.populate_core_members(construct, construct, s, gen_case);

        let kids = shape_children(fc, construct);
        self.condition(fc, kids.first().copied(), construct, gen_case, s)?;

        let items = s.make_any_vec();
        s.set_case_items(gen_case, items);
        for item in kids
            .iter()
            .copied()
            .filter(|k| fc.vtype(*k) == VObjectType::PaCaseGenerateItem)
        {
            let case_item = s.make_case_item();
            s.set_vpi_parent(case_item, gen_case);
            fc.populate_core_members(item, item, s, case_item);
            s.push(items, case_item);

            // No expression means `default`.
            let exprs = s.make_any_vec();
            s.set_vpi_exprs(case_item, exprs);
            let parts = shape_children(fc, item);
            for expr in parts
                .iter()
                .copied()
                .filter(|k| fc.vtype(*k) == VObjectType::PaConstantExpression)
            {
                let _guard = self.check_for_loops();
                if let Some(expr) = self.compile_expression(fc, expr, s, Some(case_item)) {
                    s.push(exprs, expr);
                }
            }

            if let Some(block) = parts
                .iter()
                .copied()
                .find(|k| fc.vtype(*k) == VObjectType::PaGenerateBlock)
            {
                let stmt = self.gen_block(component, fc, block, case_item, s)?;
                s.set_vpi_stmt(case_item, stmt);
            }
        }
        Ok(gen_case)
    }

    fn for_generate(
        &self,
        component: &ModuleDefinition<'_>,
        fc: &FileContent,
        construct: NodeId,
        parent: AnyId,
        s: &mut Serializer,
    ) -> Result<AnyId> {
        let gen_for = s.make_gen_for();
        s.set_vpi_parent(gen_for, parent);
        fc.populate_core_members(construct, construct, s, gen_for);

        let kids = shape_children(fc, construct);
        let find = |vtypes: &[VObjectType]| {
            kids.iter()
                .copied()
                .find(|k| vtypes.contains(&fc.vtype(*k)))
        };

        // Init: `genvar i = 0` becomes `i = 0` with a variable on the left.
        if let Some(init) = find(&[
            VObjectType::PaGenvarDeclAssignment,
            VObjectType::PaGenvarInitialization,
        ]) {
            let assign = s.make_assignment();
            s.set_vpi_parent(assign, gen_for);
            fc.populate_core_members(init, init, s, assign);
            let parts = shape_children(fc, init);
            if let Some(var) = parts.first().copied() {
                let variable = s.make_variable();
                s.set_vpi_parent(variable, assign);
                s.set_vpi_name(variable, fc.sym_name(var));
                fc.populate_core_members(var, var, s, variable);
                s.set_lhs(assign, variable);
            }
            if let Some(value) = parts.get(1).copied() {
                let _guard = self.check_for_loops();
                if let Some(rhs) = self.compile_expression(fc, value, s, Some(assign)) {
                    s.set_rhs(assign, rhs);
                }
            }
            let inits = s.make_any_vec();
            s.push(inits, assign);
            s.set_vpi_for_init_stmts(gen_for, inits);
        }

        let condition = kids
            .iter()
            .copied()
            .find(|k| fc.vtype(*k) == VObjectType::PaConstantExpression);
        self.condition(fc, condition, construct, gen_for, s)?;

        if let Some(iteration) = find(&[VObjectType::PaGenvarIteration]) {
            let inc = self.for_increment(fc, iteration, gen_for, s)?;
            if let Some(inc) = inc {
                s.set_vpi_for_inc_stmt(gen_for, inc);
            }
        }

        if let Some(block) = find(&[VObjectType::PaGenerateBlock]) {
            let stmt = self.gen_block(component, fc, block, gen_for, s)?;
            s.set_vpi_stmt(gen_for, stmt);
        }
        Ok(gen_for)
    }

    /// `i = i + 1` / `i += 2` become an assignment with an op type; `i++`
    /// stays a bare expression.
    fn for_increment(
        &self,
        fc: &FileContent,
        iteration: NodeId,
        gen_for: AnyId,
        s: &mut Serializer,
    ) -> Result<Option<AnyId>> {
        let _guard = self.check_for_loops();
        let parts = shape_children(fc, iteration);
        if let [var, op, value] = parts.as_slice() {
            if let Some(op_type) = vpi_op_type(fc.vtype(*op)) {
                let assign = s.make_assignment();
                s.set_vpi_parent(assign, gen_for);
                s.set_vpi_op_type(assign, op_type);
                fc.populate_core_members(iteration, iteration, s, assign);
                if let Some(lhs) = self.compile_expression(fc, *var, s, Some(assign)) {
                    s.set_lhs(assign, lhs);
                }
                if let Some(rhs) = self.compile_expression(fc, *value, s, Some(assign)) {
                    s.set_rhs(assign, rhs);
                }
                return Ok(Some(assign));
            }
            self.report(
                fc,
                iteration,
                Diagnostic::new(
                    format!("unexpected operator {} in generate loop increment", fc.vtype(*op)),
                    ErrorKind::CompMalformedIncrement,
                ),
            )?;
            return Ok(self.compile_expression(fc, *var, s, Some(gen_for)));
        }
        Ok(self.compile_expression(fc, iteration, s, Some(gen_for)))
    }

    /// Module items inside a generate body.
    fn compile_items(
        &self,
        component: &ModuleDefinition<'_>,
        fc: &FileContent,
        items: &[NodeId],
        parent: AnyId,
        s: &mut Serializer,
    ) -> Result<AnyVecId> {
        use VObjectType::*;
        let stmts = s.make_any_vec();
        for item in items.iter().copied() {
            match fc.vtype(item) {
                PaGenerateBlock => {
                    let _guard = self.check_for_loops();
                    let inner = self.compile_items(component, fc, &block_items(fc, item), parent, s)?;
                    for stmt in s.vec(inner).to_vec() {
                        s.push(stmts, stmt);
                    }
                }
                PaGenerateRegion | PaConditionalGenerateConstruct | PaLoopGenerateConstruct => {
                    for stmt in self.gen_stmt(component, fc, item, parent, s)? {
                        s.push(stmts, stmt);
                    }
                }
                PaContinuousAssign => {
                    for assign in self.compile_cont_assigns(fc, item, parent, s) {
                        s.push(stmts, assign);
                    }
                }
                PaModuleInstantiation => {
                    let def_name = fc.sym_name(fc.sl_get(item, SlStringConst)).to_string();
                    for instance in fc.sl_get_all(item, PaHierarchicalInstance) {
                        let name = fc.sl_get(fc.sl_get(instance, PaNameOfInstance), SlStringConst);
                        let reference = s.make_ref_module();
                        s.set_vpi_parent(reference, parent);
                        s.set_vpi_def_name(reference, &def_name);
                        s.set_vpi_name(reference, fc.sym_name(name));
                        fc.populate_core_members(instance, instance, s, reference);
                        s.push(stmts, reference);
                    }
                }
                PaGateInstantiation => {
                    let gate = shape_children(fc, item).first().copied().unwrap_or(item);
                    for instance in fc.sl_get_all(item, PaNInputGateInstance) {
                        let reference = s.make_ref_module();
                        s.set_vpi_parent(reference, parent);
                        s.set_vpi_def_name(reference, gate_name(fc.vtype(gate)));
                        let name = fc.sl_get(fc.sl_get(instance, PaNameOfInstance), SlStringConst);
                        if name.is_valid() {
                            s.set_vpi_name(reference, fc.sym_name(name));
                        }
                        fc.populate_core_members(instance, instance, s, reference);
                        s.push(stmts, reference);
                    }
                }
                PaNetDeclaration | PaDataDeclaration => {
                    for decl in fc.children(item).filter(|k| {
                        matches!(fc.vtype(*k), PaNetDeclAssignment | PaVariableDeclAssignment)
                    }) {
                        let name = fc.sl_get(decl, SlStringConst);
                        let variable = s.make_variable();
                        s.set_vpi_parent(variable, parent);
                        s.set_vpi_name(variable, fc.sym_name(name));
                        fc.populate_core_members(name, decl, s, variable);
                        s.push(stmts, variable);
                    }
                }
                other => debug!("{}: {other} not lowered in generate body", component.name()),
            }
        }
        Ok(stmts)
    }

    /// One `cont_assign` per net assignment of an `assign` item.
    pub(crate) fn compile_cont_assigns(
        &self,
        fc: &FileContent,
        item: NodeId,
        parent: AnyId,
        s: &mut Serializer,
    ) -> Vec<AnyId> {
        let mut assigns = Vec::new();
        for net_assign in fc.sl_get_all(item, VObjectType::PaNetAssignment) {
            let assign = s.make_cont_assign();
            s.set_vpi_parent(assign, parent);
            fc.populate_core_members(net_assign, net_assign, s, assign);
            let parts = shape_children(fc, net_assign);
            if let Some(lhs) = parts.first() {
                if let Some(lhs) = self.compile_expression(fc, *lhs, s, Some(assign)) {
                    s.set_lhs(assign, lhs);
                }
            }
            if let Some(rhs) = parts.get(1) {
                if let Some(rhs) = self.compile_expression(fc, *rhs, s, Some(assign)) {
                    s.set_rhs(assign, rhs);
                }
            }
            assigns.push(assign);
        }
        assigns
    }
}
