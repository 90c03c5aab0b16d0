//! Turns the SystemVerilog parse tree into the parse [`FileContent`].
//!
//! The walk records every rule as a node in preprocessed coordinates,
//! attaches comments and preprocessor markers as orphans, and finally maps
//! all positions back to the original sources through the column pins
//! computed by [`compute_offsets`] and the preprocessor's line map.

use std::collections::BTreeMap;

use log::trace;

use super::lexer::{SvKind, SvToken};
use crate::error::{FrontendError, Result};
use crate::file_content::{DesignElement, DesignElementKind, FileContent};
use crate::location::{LocationMapper, OffsetMap};
use crate::parse_tree::{ParseNode, ParseTreeListener, RuleNode};
use crate::preprocessor::{parse_preproc_end, PreprocessedFile};
use crate::session::Session;
use crate::symbols::SymbolId;
use crate::vobject::{NodeId, VObject, VObjectType};

/// Pp node of every begin and end marker token, checked to be balanced.
pub(crate) fn match_markers(tokens: &[SvToken], file: &str) -> Result<Vec<Option<NodeId>>> {
    let mut nodes = vec![None; tokens.len()];
    let mut open: Vec<usize> = Vec::new();
    for (index, token) in tokens.iter().enumerate() {
        match token.kind {
            SvKind::PreprocBegin => open.push(index),
            SvKind::PreprocEnd => {
                let Some(begin) = open.pop() else {
                    return Err(FrontendError::UnbalancedPreprocMarkers {
                        file: file.to_string(),
                        detail: format!("end marker without begin at {}:{}", token.line, token.column),
                    });
                };
                let Some(node) = parse_preproc_end(&token.text).filter(|n| n.is_valid()) else {
                    return Err(FrontendError::UnbalancedPreprocMarkers {
                        file: file.to_string(),
                        detail: format!("malformed end marker at {}:{}", token.line, token.column),
                    });
                };
                nodes[begin] = Some(node);
                nodes[index] = Some(node);
            }
            _ => {}
        }
    }
    if let Some(begin) = open.last() {
        let token = &tokens[*begin];
        return Err(FrontendError::UnbalancedPreprocMarkers {
            file: file.to_string(),
            detail: format!("begin marker at {}:{} is never closed", token.line, token.column),
        });
    }
    Ok(nodes)
}

/// Column pins mapping every token of the preprocessed text back to its
/// original column.
///
/// Outside markers a token keeps its distance to the last anchor (the start
/// of its line, or the end of the last marker). Text inside a one-line macro
/// use is clamped to the call site; end markers land on the end of the
/// directive or macro use they close.
pub(crate) fn compute_offsets(
    tokens: &[SvToken],
    markers: &[Option<NodeId>],
    pp: &FileContent,
) -> OffsetMap {
    struct Region {
        column: u16,
        end_column: u16,
        single_line: bool,
        include: bool,
    }

    let mut offsets = OffsetMap::new();
    let mut regions: Vec<Region> = Vec::new();
    // (pp column, original column) of the last anchor.
    let mut anchor: (i32, i32) = (1, 1);

    for (index, token) in tokens.iter().enumerate() {
        if token.column == 1 {
            anchor = (1, 1);
        }
        let generic = anchor.1 + (i32::from(token.column) - anchor.0);
        let node = markers.get(index).copied().flatten();
        match (token.kind, node) {
            (SvKind::PreprocBegin, Some(node)) => {
                let object = pp.object(node);
                offsets.pin(token.line, token.column, object.column.max(1));
                regions.push(Region {
                    column: object.column,
                    end_column: object.end_column,
                    single_line: object.line == object.end_line,
                    include: object.vtype == VObjectType::PpIncludeDirective,
                });
                anchor = (i32::from(token.end_column), i32::from(object.column));
            }
            (SvKind::PreprocEnd, Some(node)) => {
                regions.pop();
                let object = pp.object(node);
                offsets.pin(token.line, token.column, object.end_column.max(1));
                anchor = (i32::from(token.end_column), i32::from(object.end_column));
            }
            _ => {
                let mut desired = generic;
                if let Some(region) = regions.last() {
                    if !region.include && region.single_line {
                        let last = i32::from(region.end_column) - 1;
                        desired = desired.min(last).max(i32::from(region.column));
                    }
                }
                offsets.pin(token.line, token.column, clamp_column(desired));
            }
        }
    }
    offsets
}

fn clamp_column(column: i32) -> u16 {
    column.clamp(1, i32::from(u16::MAX)) as u16
}

/// Node type of a terminal, `None` for tokens that only shape the tree.
fn terminal_type(kind: SvKind, parent: VObjectType, unary: Option<bool>) -> Option<VObjectType> {
    use SvKind as K;
    use VObjectType::*;
    let in_expression = matches!(parent, PaExpression | PaConstantExpression);
    let vtype = match kind {
        K::Identifier | K::EscapedIdentifier | K::SystemIdentifier => SlStringConst,
        K::IntConst | K::BasedNumber | K::UnbasedUnsized => SlIntConst,
        K::RealConst => SlRealConst,
        K::StringLiteral => SlStringLiteral,

        K::Eq if matches!(parent, PaGenvarIteration | PaOperatorAssignment | PaForStep) => {
            PaAssignOpAssign
        }
        K::PlusEq => PaAssignOpAdd,
        K::MinusEq => PaAssignOpSub,
        K::StarEq => PaAssignOpMult,
        K::SlashEq => PaAssignOpDiv,
        K::PercentEq => PaAssignOpModulo,
        K::AmpEq => PaAssignOpBitwAnd,
        K::PipeEq => PaAssignOpBitwOr,
        K::CaretEq => PaAssignOpBitwXor,
        K::ShlEq => PaAssignOpBitwLeftShift,
        K::ShrEq => PaAssignOpBitwRightShift,
        K::AShlEq => PaAssignOpArithShiftLeft,
        K::AShrEq => PaAssignOpArithShiftRight,
        K::PlusPlus => PaIncDecPlusPlus,
        K::MinusMinus => PaIncDecMinusMinus,

        K::Question if in_expression => PaQmark,
        K::Bang if in_expression => PaUnaryNot,
        K::Tilde if in_expression => PaUnaryTilda,
        K::Plus if in_expression => pick(unary, PaUnaryPlus, PaBinOpPlus),
        K::Minus if in_expression => pick(unary, PaUnaryMinus, PaBinOpMinus),
        K::Amp if in_expression => pick(unary, PaUnaryBitwAnd, PaBinOpBitwAnd),
        K::Pipe if in_expression => pick(unary, PaUnaryBitwOr, PaBinOpBitwOr),
        K::Caret if in_expression => pick(unary, PaUnaryBitwXor, PaBinOpBitwXor),
        K::TildeAmp if in_expression => pick(unary, PaUnaryReductNand, PaBinOpReductNand),
        K::TildePipe if in_expression => pick(unary, PaUnaryReductNor, PaBinOpReductNor),
        K::TildeCaret if in_expression => pick(unary, PaUnaryReductXnor, PaBinOpBitwXnor),
        K::Star if in_expression => PaBinOpMult,
        K::Slash if in_expression => PaBinOpDiv,
        K::Percent if in_expression => PaBinOpPercent,
        K::StarStar if in_expression => PaBinOpMultMult,
        K::Shl if in_expression => PaBinOpShiftLeft,
        K::Shr if in_expression => PaBinOpShiftRight,
        K::AShl if in_expression => PaBinOpArithShiftLeft,
        K::AShr if in_expression => PaBinOpArithShiftRight,
        K::Lt if in_expression => PaBinOpLess,
        K::Le if in_expression => PaBinOpLessEqual,
        K::Gt if in_expression => PaBinOpGreat,
        K::Ge if in_expression => PaBinOpGreatEqual,
        K::EqEq if in_expression => PaBinOpEquiv,
        K::NotEq if in_expression => PaBinOpNot,
        K::CaseEq if in_expression => PaBinOpFourStateLogicEqual,
        K::CaseNeq if in_expression => PaBinOpFourStateLogicNotEqual,
        K::AmpAmp if in_expression => PaBinOpLogicAnd,
        K::PipePipe if in_expression => PaBinOpLogicOr,

        K::If => PaIf,
        K::Else => PaElse,
        K::Interface => PaInterface,
        K::Primitive => PaPrimitive,
        K::DotStar => PaDotStar,
        K::Posedge => PaEdgePosedge,
        K::Negedge => PaEdgeNegedge,
        K::Always => PaAlways,
        K::AlwaysComb => PaAlwaysComb,
        K::AlwaysFf => PaAlwaysFf,
        K::AlwaysLatch => PaAlwaysLatch,

        K::And if parent == PaGateInstantiation => PaNInpGateAnd,
        K::Nand if parent == PaGateInstantiation => PaNInpGateNand,
        K::Or if parent == PaGateInstantiation => PaNInpGateOr,
        K::Nor if parent == PaGateInstantiation => PaNInpGateNor,
        K::Xor if parent == PaGateInstantiation => PaNInpGateXor,
        K::Xnor if parent == PaGateInstantiation => PaNInpGateXnor,

        K::Wire => PaNetTypeWire,
        K::Uwire => PaNetTypeUwire,
        K::Tri => PaNetTypeTri,
        K::Wand => PaNetTypeWand,
        K::Wor => PaNetTypeWor,
        K::Supply0 => PaNetTypeSupply0,
        K::Supply1 => PaNetTypeSupply1,
        K::Logic => PaIntVecTypeLogic,
        K::Reg => PaIntVecTypeReg,
        K::Bit => PaIntVecTypeBit,
        K::Int => PaIntegerAtomTypeInt,
        K::Integer => PaIntegerAtomTypeInteger,
        K::Byte => PaIntegerAtomTypeByte,
        K::Shortint => PaIntegerAtomTypeShortint,
        K::Longint => PaIntegerAtomTypeLongInt,
        K::Real => PaNonIntTypeReal,
        K::StringKw => PaStringType,
        K::Signed => PaSigningSigned,
        K::Unsigned => PaSigningUnsigned,
        K::Input => PaPortDirInp,
        K::Output => PaPortDirOut,
        K::Inout => PaPortDirInout,
        K::Ref => PaPortDirRef,
        _ => return None,
    };
    Some(vtype)
}

fn pick(unary: Option<bool>, if_unary: VObjectType, otherwise: VObjectType) -> VObjectType {
    if unary == Some(true) {
        if_unary
    } else {
        otherwise
    }
}

/// Whether an operator terminal is a prefix operator: `Some(true)` when it
/// opens its expression, `Some(false)` when it follows an operand, `None`
/// outside expressions.
pub fn is_unary_operator(token: usize, parent: &RuleNode) -> Option<bool> {
    if !matches!(
        parent.rule,
        VObjectType::PaExpression | VObjectType::PaConstantExpression
    ) {
        return None;
    }
    Some(parent.children.first() == Some(&ParseNode::Terminal(token)))
}

/// Canonical text of a string literal: quotes removed, escape sequences
/// decoded.
pub fn normalize_string_literal(text: &str) -> String {
    let inner = text
        .strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .unwrap_or(text);
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('v') => out.push('\u{b}'),
            Some('f') => out.push('\u{c}'),
            Some('a') => out.push('\u{7}'),
            Some('\n') => {}
            Some('x') => {
                let mut value = 0u32;
                let mut digits = 0;
                while digits < 2 {
                    match chars.peek().and_then(|c| c.to_digit(16)) {
                        Some(d) => {
                            value = value * 16 + d;
                            chars.next();
                            digits += 1;
                        }
                        None => break,
                    }
                }
                out.extend(char::from_u32(value));
            }
            Some(d) if d.is_digit(8) => {
                let mut value = d.to_digit(8).unwrap_or(0);
                for _ in 0..2 {
                    match chars.peek().and_then(|c| c.to_digit(8)) {
                        Some(d) => {
                            value = value * 8 + d;
                            chars.next();
                        }
                        None => break,
                    }
                }
                out.extend(char::from_u32(value));
            }
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

/// Per line of the subtree under `root`: the smallest start column and the
/// largest end column of the nodes starting on it.
pub fn collect_line_ranges(fc: &FileContent, root: NodeId) -> BTreeMap<u32, (u16, u16)> {
    let mut ranges: BTreeMap<u32, (u16, u16)> = BTreeMap::new();
    for id in fc.preorder(root) {
        let object = fc.object(id);
        let entry = ranges
            .entry(object.line)
            .or_insert((object.column, object.end_column));
        entry.0 = entry.0.min(object.column);
        if object.end_line == object.line {
            entry.1 = entry.1.max(object.end_column);
        }
    }
    ranges
}

fn element_kind(vtype: VObjectType) -> Option<DesignElementKind> {
    use VObjectType::*;
    let kind = match vtype {
        PaModuleDeclaration => DesignElementKind::Module,
        PaInterfaceDeclaration => DesignElementKind::Interface,
        PaUdpDeclaration => DesignElementKind::Primitive,
        PaPackageDeclaration => DesignElementKind::Package,
        PaProgramDeclaration => DesignElementKind::Program,
        PaClassDeclaration => DesignElementKind::Class,
        PaConfigDeclaration => DesignElementKind::Config,
        PaCheckerDeclaration => DesignElementKind::Checker,
        PaFunctionDeclaration => DesignElementKind::Function,
        PaTaskDeclaration => DesignElementKind::Task,
        _ => return None,
    };
    Some(kind)
}

#[derive(Debug, Clone, Copy)]
struct Frame {
    rule: VObjectType,
    /// Invalid while emission is paused.
    id: NodeId,
    needs_sort: bool,
    element: bool,
}

pub(crate) struct ParseListener<'a> {
    session: &'a Session,
    pp: &'a PreprocessedFile,
    tokens: &'a [SvToken],
    markers: &'a [Option<NodeId>],
    keep_whitespace: bool,
    out: FileContent,
    root: NodeId,
    stack: Vec<Frame>,
    paused: i32,
    /// First token neither visited nor drained as an orphan.
    next_pending: usize,
    /// Open begin markers: (begin node, its parent, pp node).
    preproc_begin_stack: Vec<(NodeId, NodeId, NodeId)>,
    /// Begin nodes and the pp subtree to copy under them.
    merges: Vec<(NodeId, NodeId)>,
    /// Open design elements: index and dotted name.
    elements: Vec<(usize, String)>,
}

impl<'a> ParseListener<'a> {
    pub(crate) fn new(
        session: &'a Session,
        pp: &'a PreprocessedFile,
        tokens: &'a [SvToken],
        markers: &'a [Option<NodeId>],
    ) -> Self {
        let config = session.config();
        Self {
            session,
            pp,
            tokens,
            markers,
            keep_whitespace: config.keep_whitespace,
            out: FileContent::new(pp.file, config.library.clone(), session.shared_symbols()),
            root: NodeId::INVALID,
            stack: Vec::new(),
            paused: 0,
            next_pending: 0,
            preproc_begin_stack: Vec::new(),
            merges: Vec::new(),
            elements: Vec::new(),
        }
    }

    /// Finishes the walk: drains trailing orphans, maps every position to
    /// the original sources and stitches the preprocessor subtrees in.
    pub(crate) fn finish(mut self, offsets: &OffsetMap) -> Result<FileContent> {
        let root = self.root;
        let orphans = self.process_pending_tokens(self.tokens.len(), root);
        self.process_orphan_objects(root, orphans);
        if !self.preproc_begin_stack.is_empty() {
            return Err(FrontendError::UnbalancedPreprocMarkers {
                file: self.file_name(),
                detail: "begin marker left open after the walk".to_string(),
            });
        }
        if self.root.is_valid() {
            self.out.sort_children(self.root);
        }
        self.apply_location_offsets(offsets);
        let merges = std::mem::take(&mut self.merges);
        for (begin, pp_node) in merges {
            self.merge_object_tree(begin, pp_node);
        }
        Ok(self.out)
    }

    fn file_name(&self) -> String {
        self.session.symbols().path(self.pp.file).to_string()
    }

    fn parent(&self) -> NodeId {
        self.stack
            .iter()
            .rev()
            .map(|f| f.id)
            .find(|id| id.is_valid())
            .unwrap_or(self.root)
    }

    fn token_range(&self, node: &RuleNode) -> (u32, u16, u32, u16) {
        let first = node.start.and_then(|i| self.tokens.get(i));
        let last = node.stop.and_then(|i| self.tokens.get(i));
        match (first, last) {
            (Some(first), Some(last)) => (first.line, first.column, last.end_line, last.end_column),
            _ => {
                // Empty rule: sits on the next token.
                let next = self.tokens[self.next_pending.min(self.tokens.len())..]
                    .iter()
                    .find(|t| !t.kind.is_hidden())
                    .or_else(|| self.tokens.last());
                match next {
                    Some(t) => (t.line, t.column, t.line, t.column),
                    None => (1, 1, 1, 1),
                }
            }
        }
    }

    fn add(&mut self, object: VObject, parent: NodeId) -> NodeId {
        let id = self.out.add_object(object);
        self.out.append_child(parent, id);
        id
    }

    /// Orphan nodes for the hidden tokens before `end`. Begin and end markers
    /// are linked to their pp node here.
    fn process_pending_tokens(&mut self, end: usize, parent: NodeId) -> Vec<NodeId> {
        let tokens = self.tokens;
        let mut orphans = Vec::new();
        while self.next_pending < end.min(tokens.len()) {
            let index = self.next_pending;
            self.next_pending += 1;
            let token = &tokens[index];
            let pp_node = self.markers.get(index).copied().flatten();
            let file = self.pp.file;
            let object = |vtype| {
                VObject::new(SymbolId::BAD, vtype, file, NodeId::INVALID).with_range(
                    token.line,
                    token.column,
                    token.end_line,
                    token.end_column,
                )
            };
            match token.kind {
                SvKind::Whitespace | SvKind::Newline if self.keep_whitespace => {
                    let id = self.out.add_object(object(VObjectType::PaWhiteSpace));
                    orphans.push(id);
                }
                SvKind::OneLineComment => {
                    let id = self.out.add_object(object(VObjectType::PaOneLineComment));
                    orphans.push(id);
                }
                SvKind::BlockComment => {
                    let id = self.out.add_object(object(VObjectType::PaBlockComment));
                    orphans.push(id);
                }
                SvKind::PreprocBegin => {
                    let Some(pp_node) = pp_node else { continue };
                    let mut begin = object(VObjectType::SlPreprocBegin);
                    begin.name = self.pp.file_content.name(pp_node);
                    begin.definition = pp_node;
                    let id = self.out.add_object(begin);
                    self.preproc_begin_stack.push((id, parent, pp_node));
                    self.merges.push((id, pp_node));
                    orphans.push(id);
                }
                SvKind::PreprocEnd => {
                    let Some((_, begin_parent, begin_node)) = self.preproc_begin_stack.pop() else {
                        continue;
                    };
                    let mut end = object(VObjectType::SlPreprocEnd);
                    end.name = self.pp.file_content.name(begin_node);
                    end.definition = pp_node.unwrap_or(begin_node);
                    let id = self.out.add_object(end);
                    if begin_parent == parent {
                        orphans.push(id);
                    } else {
                        // Ends beside its begin marker.
                        self.out.append_child(begin_parent, id);
                        self.mark_for_sort(begin_parent);
                    }
                }
                _ => {}
            }
        }
        orphans
    }

    fn process_orphan_objects(&mut self, parent: NodeId, orphans: Vec<NodeId>) {
        if orphans.is_empty() {
            return;
        }
        for id in orphans {
            self.out.append_child(parent, id);
        }
        self.mark_for_sort(parent);
    }

    fn mark_for_sort(&mut self, parent: NodeId) {
        match self.stack.iter_mut().rev().find(|f| f.id == parent) {
            Some(frame) => frame.needs_sort = true,
            None => self.out.sort_children(parent),
        }
    }

    fn drain_into_parent(&mut self, end: usize) {
        let parent = self.parent();
        let orphans = self.process_pending_tokens(end, parent);
        self.process_orphan_objects(parent, orphans);
    }

    /// Rewrites every position recorded so far into original coordinates.
    pub(crate) fn apply_location_offsets(&mut self, offsets: &OffsetMap) {
        let mapper = LocationMapper {
            offsets,
            lines: &self.pp.line_map,
            pp_file: self.pp.file,
            use_pp_output_location: self.session.config().use_pp_output_location,
        };
        let ids: Vec<NodeId> = self.out.ids().collect();
        for id in ids {
            let Some(object) = self.out.object_mut(id) else {
                continue;
            };
            let (file, line, column) = mapper.map(object.line, object.column);
            let (_, end_line, end_column) = mapper.map(object.end_line, object.end_column);
            object.file_id = file;
            object.line = line;
            object.column = column;
            if (end_line, end_column) >= (line, column) {
                object.end_line = end_line;
                object.end_column = end_column;
            } else {
                object.end_line = line;
                object.end_column = column;
            }
        }
        let elements: Vec<(usize, NodeId)> = self
            .out
            .design_elements()
            .iter()
            .enumerate()
            .map(|(i, e)| (i, e.node))
            .collect();
        for (index, node) in elements {
            let object = *self.out.object(node);
            let element = &mut self.out.design_elements_mut()[index];
            element.file = object.file_id;
            element.line = object.line;
            element.column = object.column;
            element.end_line = object.end_line;
            element.end_column = object.end_column;
        }
    }

    /// Copies the pp node `pp_node` and everything below it under `begin`.
    pub(crate) fn merge_object_tree(&mut self, begin: NodeId, pp_node: NodeId) {
        let copy = self.copy_pp_node(pp_node, begin);
        trace!("merged pp node {pp_node} as {copy}");
    }

    fn copy_pp_node(&mut self, pp_node: NodeId, parent: NodeId) -> NodeId {
        let source = *self.pp.file_content.object(pp_node);
        let mut object = VObject::new(
            source.name,
            source.vtype,
            self.pp.file_content.file_of(pp_node),
            NodeId::INVALID,
        )
        .with_range(source.line, source.column, source.end_line, source.end_column);
        object.definition = source.definition;
        let id = self.add(object, parent);
        let children: Vec<NodeId> = self.pp.file_content.children(pp_node).collect();
        for child in children {
            self.copy_pp_node(child, id);
        }
        id
    }

    fn name_of(&self, node: &RuleNode) -> Option<String> {
        let tokens = self.tokens;
        let terminals = node.terminals();
        let text = |i: &usize| tokens.get(*i).map(|t| identifier_text(&t.text));
        match node.rule {
            VObjectType::PaFunctionDeclaration | VObjectType::PaTaskDeclaration => {
                // Last identifier before the port list or the `;`.
                terminals
                    .iter()
                    .take_while(|i| {
                        !matches!(
                            tokens.get(**i).map(|t| t.kind),
                            Some(SvKind::LParen | SvKind::Semi)
                        )
                    })
                    .filter(|i| tokens.get(**i).is_some_and(|t| t.kind.is_identifier()))
                    .last()
                    .and_then(text)
            }
            VObjectType::PaClassDeclaration
            | VObjectType::PaConfigDeclaration
            | VObjectType::PaCheckerDeclaration => terminals
                .iter()
                .find(|i| tokens.get(**i).is_some_and(|t| t.kind.is_identifier()))
                .and_then(text),
            _ => node
                .children
                .iter()
                .filter_map(|c| match c {
                    ParseNode::Terminal(i) => Some(*i),
                    ParseNode::Rule(_) => None,
                })
                .find(|i| tokens.get(*i).is_some_and(|t| t.kind.is_identifier()))
                .as_ref()
                .and_then(text),
        }
    }

    fn record_design_element(&mut self, node: &RuleNode, id: NodeId, kind: DesignElementKind) -> bool {
        let Some(name) = self.name_of(node) else {
            return false;
        };
        let dotted = match self.elements.last() {
            Some((_, outer)) => format!("{outer}.{name}"),
            None => name,
        };
        let full = format!("{}@{}", self.out.library(), dotted);
        let symbol = self.session.symbols().register(&full);
        let mut element = DesignElement::new(symbol, self.pp.file, kind, id);
        element.parent = self.elements.last().map(|(index, _)| *index);
        let pp_line = node.start.and_then(|i| self.tokens.get(i)).map_or(1, |t| t.line);
        let state = self.pp.state_at(pp_line);
        element.time_info = state.time_info;
        element.default_net_type = state.default_net_type;
        let index = self.out.add_design_element(element);
        trace!("design element {full}");
        self.elements.push((index, dotted));
        true
    }
}

fn identifier_text(text: &str) -> String {
    text.strip_prefix('\\').unwrap_or(text).trim_end().to_string()
}

impl ParseTreeListener for ParseListener<'_> {
    fn enter_every_rule(&mut self, node: &RuleNode) -> Result<()> {
        let is_root = self.stack.is_empty() && !self.root.is_valid();
        if let (Some(start), false) = (node.start, is_root) {
            self.drain_into_parent(start);
        }
        if self.paused > 0 {
            self.stack.push(Frame {
                rule: node.rule,
                id: NodeId::INVALID,
                needs_sort: false,
                element: false,
            });
            return Ok(());
        }

        let (line, column, end_line, end_column) = if is_root {
            match (self.tokens.first(), self.tokens.last()) {
                (Some(first), Some(last)) => (first.line, first.column, last.end_line, last.end_column),
                _ => (1, 1, 1, 1),
            }
        } else {
            self.token_range(node)
        };
        let object = VObject::new(SymbolId::BAD, node.rule, self.pp.file, NodeId::INVALID)
            .with_range(line, column, end_line, end_column);
        let parent = self.parent();
        let id = self.add(object, parent);
        if is_root {
            self.root = id;
        }
        if node.rule == VObjectType::PaOpaqueBody {
            self.paused += 1;
        }
        let element = match element_kind(node.rule) {
            Some(kind) => self.record_design_element(node, id, kind),
            None => false,
        };
        self.stack.push(Frame {
            rule: node.rule,
            id,
            needs_sort: false,
            element,
        });
        Ok(())
    }

    fn exit_every_rule(&mut self, _node: &RuleNode) -> Result<()> {
        let Some(frame) = self.stack.pop() else {
            return Ok(());
        };
        if !frame.id.is_valid() {
            return Ok(());
        }
        if frame.rule == VObjectType::PaOpaqueBody {
            self.paused -= 1;
            if self.paused < 0 {
                return Err(FrontendError::NegativePauseCount {
                    file: self.file_name(),
                });
            }
        }
        if frame.needs_sort {
            self.out.sort_children(frame.id);
        }
        if frame.element {
            self.elements.pop();
        }
        Ok(())
    }

    fn visit_terminal(&mut self, index: usize, parent: &RuleNode) -> Result<()> {
        self.drain_into_parent(index);
        self.next_pending = self.next_pending.max(index + 1);
        if self.paused > 0 {
            return Ok(());
        }
        let Some(token) = self.tokens.get(index) else {
            return Ok(());
        };
        let unary = is_unary_operator(index, parent);
        let Some(vtype) = terminal_type(token.kind, parent.rule, unary) else {
            return Ok(());
        };
        let name = match vtype {
            VObjectType::SlStringConst => self.session.symbols().register(&identifier_text(&token.text)),
            VObjectType::SlIntConst | VObjectType::SlRealConst => {
                self.session.symbols().register(token.text.trim())
            }
            VObjectType::SlStringLiteral => self.enter_string_value(&token.text),
            _ => SymbolId::BAD,
        };
        let object = VObject::new(name, vtype, self.pp.file, NodeId::INVALID).with_range(
            token.line,
            token.column,
            token.end_line,
            token.end_column,
        );
        let parent = self.parent();
        self.add(object, parent);
        Ok(())
    }
}

impl ParseListener<'_> {
    fn enter_string_value(&self, text: &str) -> SymbolId {
        self.session.symbols().register(&normalize_string_literal(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_are_decoded() {
        assert_eq!(normalize_string_literal(r#""a\tb\n""#), "a\tb\n");
        assert_eq!(normalize_string_literal(r#""q\"x\\""#), "q\"x\\");
        assert_eq!(normalize_string_literal(r#""\101\x42""#), "AB");
    }

    #[test]
    fn unary_position() {
        let unary = RuleNode::new(
            VObjectType::PaExpression,
            vec![ParseNode::Terminal(3), ParseNode::Terminal(4)],
        );
        assert_eq!(is_unary_operator(3, &unary), Some(true));
        let binary = RuleNode::new(
            VObjectType::PaExpression,
            vec![ParseNode::Terminal(1), ParseNode::Terminal(2), ParseNode::Terminal(3)],
        );
        assert_eq!(is_unary_operator(2, &binary), Some(false));
        let other = RuleNode::new(VObjectType::PaContinuousAssign, vec![ParseNode::Terminal(2)]);
        assert_eq!(is_unary_operator(2, &other), None);
    }

    #[test]
    fn ambiguous_operators_follow_position() {
        use VObjectType::*;
        assert_eq!(
            terminal_type(SvKind::Minus, PaExpression, Some(true)),
            Some(PaUnaryMinus)
        );
        assert_eq!(
            terminal_type(SvKind::Minus, PaConstantExpression, Some(false)),
            Some(PaBinOpMinus)
        );
        assert_eq!(terminal_type(SvKind::Le, PaNonblockingAssignment, None), None);
        assert_eq!(
            terminal_type(SvKind::Eq, PaGenvarIteration, None),
            Some(PaAssignOpAssign)
        );
        assert_eq!(terminal_type(SvKind::Eq, PaNetAssignment, None), None);
        assert_eq!(
            terminal_type(SvKind::Or, PaGateInstantiation, None),
            Some(PaNInpGateOr)
        );
        assert_eq!(terminal_type(SvKind::Or, PaEventControl, None), None);
    }
}
