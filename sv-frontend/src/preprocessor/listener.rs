//! Walks the preprocessor tree of one piece of text, interpreting
//! directives and expanding macros into [`PpOutput`].

use log::{debug, trace};

use super::grammar;
use super::lexer::{lex, PpKind, PpToken, RESERVED_MACRO_NAMES};
use super::macros::{BodyToken, FormalArg, MacroInfo};
use super::{
    preproc_end_marker, DirectiveState, IncludeDriver, IncludeEdge, IncludeRequest, PpOutput,
    PREPROC_BEGIN,
};
use crate::error::{Diagnostic, ErrorKind, Result};
use crate::file_content::TimeInfo;
use crate::location::LineSection;
use crate::num_utils::parse_uint32;
use crate::parse_tree::{walk, ParseTreeListener, RuleNode};
use crate::session::Session;
use crate::symbols::{PathId, SymbolId};
use crate::vobject::{NodeId, VObject, VObjectType};

/// Nested expansions deeper than this are treated as runaway recursion.
const MAX_EXPANSION_DEPTH: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Mode {
    /// Top level text of a file: nodes and markers are recorded.
    Record,
    /// Re-walk of substituted macro text: only text is produced.
    Expand,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CallFrame {
    Directive,
    MacroInstance,
    EscapedIdentifier,
    MacroDefinitionBody,
    Other,
}

impl CallFrame {
    fn of(vtype: VObjectType) -> Self {
        use VObjectType::*;
        match vtype {
            PpMacroInstanceWithArgs | PpMacroInstanceNoArgs => CallFrame::MacroInstance,
            PpEscapedIdentifier => CallFrame::EscapedIdentifier,
            PpSimpleMacroDefinitionBody | PpEscapedMacroDefinitionBody => {
                CallFrame::MacroDefinitionBody
            }
            t if is_directive(t) => CallFrame::Directive,
            _ => CallFrame::Other,
        }
    }
}

fn is_directive(vtype: VObjectType) -> bool {
    use VObjectType::*;
    vtype.is_macro_definition()
        || matches!(
            vtype,
            PpIncludeDirective
                | PpLineDirective
                | PpTimescaleDirective
                | PpResetallDirective
                | PpDefaultNettypeDirective
                | PpUndefDirective
                | PpUndefineallDirective
                | PpIfdefDirective
                | PpIfndefDirective
                | PpElsifDirective
                | PpElseDirective
                | PpEndifDirective
                | PpCelldefineDirective
                | PpEndcelldefineDirective
                | PpSvFileDirective
                | PpSvLineDirective
        )
}

#[derive(Debug, Clone, Copy)]
struct Conditional {
    outer_active: bool,
    branch_taken: bool,
    active: bool,
    line: u32,
    column: u16,
}

/// The outermost directive or macro instance being processed.
#[derive(Debug, Clone, Copy)]
struct OpenRegion {
    node: NodeId,
    marked: bool,
    active: bool,
}

pub(crate) struct PpListener<'a> {
    session: &'a Session,
    out: &'a mut PpOutput,
    driver: &'a mut dyn IncludeDriver,
    tokens: &'a [PpToken],
    file: PathId,
    parent: NodeId,
    mode: Mode,
    call_stack: Vec<CallFrame>,
    processing_directive: u32,
    processing_macro_instance: u32,
    conditions: Vec<Conditional>,
    open: Option<OpenRegion>,
    /// Set by `` `line ``: file and line delta applied to later lines.
    line_origin: Option<(PathId, i64)>,
}

/// Lexes, parses and walks `source`, appending to `out`.
pub(crate) fn run(
    session: &Session,
    out: &mut PpOutput,
    driver: &mut dyn IncludeDriver,
    source: &str,
    file: PathId,
    parent: NodeId,
    mode: Mode,
) -> Result<()> {
    let tokens = lex(source);
    let tree = match grammar::parse(&tokens) {
        Ok(tree) => tree,
        Err(errors) => {
            for error in errors {
                let location = match tokens.get(error.span().start) {
                    Some(token) => session.location(file, token.line, token.column),
                    None => session.location(file, 0, 0),
                };
                session.report(
                    Diagnostic::new(format!("preprocessor: {error:?}"), ErrorKind::ParseError)
                        .with_location(location),
                )?;
            }
            return Ok(());
        }
    };
    let mut listener = PpListener {
        session,
        out,
        driver,
        tokens: &tokens,
        file,
        parent,
        mode,
        call_stack: Vec::new(),
        processing_directive: 0,
        processing_macro_instance: 0,
        conditions: Vec::new(),
        open: None,
        line_origin: None,
    };
    walk(&mut listener, &tree)?;
    listener.finish()
}

impl ParseTreeListener for PpListener<'_> {
    fn enter_every_rule(&mut self, node: &RuleNode) -> Result<()> {
        let frame = CallFrame::of(node.rule);
        let outermost = self.processing_directive == 0 && self.processing_macro_instance == 0;
        self.call_stack.push(frame);
        match frame {
            CallFrame::Directive => {
                self.processing_directive += 1;
                if outermost {
                    self.open_region(node, true);
                }
            }
            CallFrame::MacroInstance => {
                self.processing_macro_instance += 1;
                if outermost {
                    let active = self.active();
                    self.open_region(node, active);
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn exit_every_rule(&mut self, node: &RuleNode) -> Result<()> {
        let frame = self.call_stack.pop().unwrap_or(CallFrame::Other);
        match frame {
            CallFrame::Directive => {
                self.processing_directive = self.processing_directive.saturating_sub(1);
                if self.processing_directive == 0 && self.processing_macro_instance == 0 {
                    let region = self.open.take();
                    self.finish_directive(node, region)?;
                }
            }
            CallFrame::MacroInstance => {
                self.processing_macro_instance = self.processing_macro_instance.saturating_sub(1);
                if self.processing_directive == 0 && self.processing_macro_instance == 0 {
                    let region = self.open.take();
                    self.finish_macro_instance(node, region)?;
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn visit_terminal(&mut self, index: usize, _parent: &RuleNode) -> Result<()> {
        if self.processing_directive > 0 || self.processing_macro_instance > 0 {
            return Ok(());
        }
        let tokens = self.tokens;
        let Some(token) = tokens.get(index) else {
            return Ok(());
        };
        if token.kind.is_directive() {
            // A directive keyword the grammar could not complete.
            if self.active() {
                self.report(
                    ErrorKind::PpMalformedDirective,
                    format!("malformed directive {}", token.text),
                    Some(index),
                )?;
            }
            self.emit_newlines(token.newline_count());
            return Ok(());
        }
        if !self.active() {
            self.emit_newlines(token.newline_count());
            return Ok(());
        }
        match token.kind {
            PpKind::LineContinuation => self.out.append("\n"),
            _ => self.out.append(&token.text),
        }
        Ok(())
    }
}

impl PpListener<'_> {
    fn is_on_call_stack(&self, frame: CallFrame) -> bool {
        self.call_stack.contains(&frame)
    }

    fn is_any_on_call_stack(&self, frames: &[CallFrame]) -> bool {
        frames.iter().any(|f| self.is_on_call_stack(*f))
    }

    fn active(&self) -> bool {
        self.conditions.last().map_or(true, |c| c.active)
    }

    fn recording(&self) -> bool {
        self.mode == Mode::Record
    }

    fn open_region(&mut self, node: &RuleNode, marked: bool) {
        let active = self.active();
        let marked = marked && self.recording();
        let id = if self.recording() {
            self.record_node(node, self.parent)
        } else {
            NodeId::INVALID
        };
        if marked {
            self.out.append(PREPROC_BEGIN);
        }
        self.open = Some(OpenRegion {
            node: id,
            marked,
            active,
        });
    }

    fn close_region(&mut self, region: &OpenRegion, pending_newlines: usize) {
        self.emit_newlines(pending_newlines);
        if region.marked {
            self.out.append(&preproc_end_marker(region.node));
        }
    }

    fn finish(&mut self) -> Result<()> {
        let open = std::mem::take(&mut self.conditions);
        if self.recording() {
            for frame in open {
                let location = self.session.location(self.file, frame.line, frame.column);
                self.session.report(
                    Diagnostic::new("conditional is not closed at end of file", ErrorKind::PpUnterminatedConditional)
                        .with_location(location)
                        .with_suggestion("add a matching `endif"),
                )?;
            }
        }
        Ok(())
    }

    fn emit_newlines(&mut self, count: usize) {
        if count > 0 {
            self.out.append(&"\n".repeat(count));
        }
    }

    fn report(&self, kind: ErrorKind, message: impl Into<String>, token: Option<usize>) -> Result<()> {
        let (line, column) = token
            .and_then(|i| self.tokens.get(i))
            .map_or((0, 0), |t| (t.line, t.column));
        let location = self.session.location(self.file, line, column);
        self.session
            .report(Diagnostic::new(message, kind).with_location(location))
    }

    fn text_of(&self, node: &RuleNode) -> String {
        node.terminals()
            .into_iter()
            .filter_map(|i| self.tokens.get(i))
            .map(|t| t.text.as_str())
            .collect()
    }

    fn newlines_in(&self, node: &RuleNode) -> usize {
        node.terminals()
            .into_iter()
            .filter_map(|i| self.tokens.get(i))
            .map(PpToken::newline_count)
            .sum()
    }

    fn range_of(&self, node: &RuleNode) -> (u32, u16, u32, u16) {
        let first = node.start.and_then(|i| self.tokens.get(i));
        let last = node.stop.and_then(|i| self.tokens.get(i));
        match (first, last) {
            (Some(first), Some(last)) => (first.line, first.column, last.end_line, last.end_column),
            _ => (0, 0, 0, 0),
        }
    }

    fn original_position(&self, line: u32) -> (PathId, u32) {
        match self.line_origin {
            Some((file, delta)) => (file, (i64::from(line) + delta).max(1) as u32),
            None => (self.file, line),
        }
    }

    fn macro_name_of(&self, node: &RuleNode) -> Option<String> {
        node.child_rules()
            .find(|r| {
                matches!(
                    r.rule,
                    VObjectType::PpPsIdentifier | VObjectType::PpEscapedIdentifier
                )
            })
            .map(|r| self.text_of(r).trim().to_string())
    }

    fn instance_name(&self, node: &RuleNode) -> Option<String> {
        let first = node.terminals().into_iter().next()?;
        let token = self.tokens.get(first)?;
        Some(token.text.trim_start_matches('`').to_string())
    }

    fn node_name(&self, node: &RuleNode) -> SymbolId {
        use VObjectType::*;
        let name = match node.rule {
            PpMacroInstanceWithArgs | PpMacroInstanceNoArgs => self.instance_name(node),
            PpUndefDirective | PpIfdefDirective | PpIfndefDirective | PpElsifDirective => {
                self.macro_name_of(node)
            }
            t if t.is_macro_definition() => self.macro_name_of(node),
            PpPsIdentifier | PpEscapedIdentifier | PpString | PpNumber | PpDefaultValue
            | PpMacroArg | PpSimpleMacroDefinitionBody | PpEscapedMacroDefinitionBody => {
                Some(self.text_of(node).trim().to_string())
            }
            _ => None,
        };
        match name {
            Some(name) if !name.is_empty() => self.session.symbols().register(&name),
            _ => SymbolId::BAD,
        }
    }

    /// Adds `node` and the rules below it to the preprocessor content.
    fn record_node(&mut self, node: &RuleNode, parent: NodeId) -> NodeId {
        let (line, column, end_line, end_column) = self.range_of(node);
        let object = VObject::new(self.node_name(node), node.rule, self.file, NodeId::INVALID)
            .with_range(line, column, end_line, end_column);
        let id = self.out.file_content.add_object(object);
        self.out.file_content.append_child(parent, id);
        for child in node.child_rules() {
            self.record_node(child, id);
        }
        id
    }

    fn finish_directive(&mut self, node: &RuleNode, region: Option<OpenRegion>) -> Result<()> {
        use VObjectType::*;
        let region = region.unwrap_or(OpenRegion {
            node: NodeId::INVALID,
            marked: false,
            active: self.active(),
        });
        trace!("directive {} at {:?}", node.rule, self.range_of(node));
        match node.rule {
            PpIfdefDirective | PpIfndefDirective => self.push_conditional(node),
            PpElsifDirective => self.elsif(node)?,
            PpElseDirective => self.else_branch(node)?,
            PpEndifDirective => self.endif(node)?,
            _ if !region.active => {}
            t if t.is_macro_definition() => self.define(node, region.node)?,
            PpUndefDirective => self.undef(node)?,
            PpUndefineallDirective => self.out.macros.clear(),
            PpIncludeDirective => self.include(node, region.node)?,
            PpLineDirective => self.line_directive(node)?,
            PpTimescaleDirective => self.timescale(node)?,
            PpDefaultNettypeDirective => self.default_nettype(node)?,
            PpResetallDirective => self.update_state(|state| *state = DirectiveState::default()),
            PpSvFileDirective => {
                let path = self.session.symbols().path(self.original_position(0).0).to_string();
                self.out.append(&format!("\"{path}\""));
            }
            PpSvLineDirective => {
                let (line, ..) = self.range_of(node);
                let line = self.original_position(line).1;
                self.out.append(&line.to_string());
            }
            _ => {}
        }
        let pending = self.newlines_in(node);
        self.close_region(&region, pending);
        Ok(())
    }

    fn push_conditional(&mut self, node: &RuleNode) {
        let name = self.macro_name_of(node).unwrap_or_default();
        let defined = self.out.macros.contains(&name);
        let taken = if node.rule == VObjectType::PpIfdefDirective {
            defined
        } else {
            !defined
        };
        let outer = self.active();
        let (line, column, ..) = self.range_of(node);
        self.conditions.push(Conditional {
            outer_active: outer,
            branch_taken: outer && taken,
            active: outer && taken,
            line,
            column,
        });
    }

    fn elsif(&mut self, node: &RuleNode) -> Result<()> {
        let name = self.macro_name_of(node).unwrap_or_default();
        let defined = self.out.macros.contains(&name);
        match self.conditions.last_mut() {
            Some(frame) => {
                frame.active = frame.outer_active && !frame.branch_taken && defined;
                frame.branch_taken |= frame.active;
                Ok(())
            }
            None => self.report(ErrorKind::PpElsifWithoutIf, "`elsif without `ifdef", node.start),
        }
    }

    fn else_branch(&mut self, node: &RuleNode) -> Result<()> {
        match self.conditions.last_mut() {
            Some(frame) => {
                frame.active = frame.outer_active && !frame.branch_taken;
                frame.branch_taken = true;
                Ok(())
            }
            None => self.report(ErrorKind::PpElseWithoutIf, "`else without `ifdef", node.start),
        }
    }

    fn endif(&mut self, node: &RuleNode) -> Result<()> {
        match self.conditions.pop() {
            Some(_) => Ok(()),
            None => self.report(ErrorKind::PpEndifWithoutIf, "`endif without `ifdef", node.start),
        }
    }

    fn define(&mut self, node: &RuleNode, pp_node: NodeId) -> Result<()> {
        let Some(name) = self.macro_name_of(node) else {
            return Ok(());
        };
        if RESERVED_MACRO_NAMES.contains(&name.as_str()) {
            return self.report(
                ErrorKind::PpReservedMacroName(name.clone()),
                format!("`{name}` is a reserved directive name"),
                node.start,
            );
        }
        let formals = node.find(VObjectType::PpFormalArgList).map(|list| {
            list.child_rules()
                .filter(|r| r.rule == VObjectType::PpFormalArg)
                .map(|arg| FormalArg {
                    name: arg
                        .find(VObjectType::PpPsIdentifier)
                        .map(|n| self.text_of(n).trim().to_string())
                        .unwrap_or_default(),
                    default: arg
                        .find(VObjectType::PpDefaultValue)
                        .map(|d| self.text_of(d).trim().to_string()),
                })
                .collect::<Vec<_>>()
        });
        let body_node = node.child_rules().find(|r| {
            matches!(
                r.rule,
                VObjectType::PpSimpleMacroDefinitionBody | VObjectType::PpEscapedMacroDefinitionBody
            )
        });
        let body = body_node
            .map(|b| {
                b.terminals()
                    .into_iter()
                    .filter_map(|i| self.tokens.get(i))
                    .map(|t| BodyToken {
                        kind: t.kind,
                        text: t.text.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default();
        let escaped = body_node.is_some_and(|b| b.rule == VObjectType::PpEscapedMacroDefinitionBody);
        let (line, column, end_line, end_column) = self.range_of(node);
        let info = MacroInfo {
            name: name.clone(),
            formals,
            body,
            escaped,
            node: pp_node,
            file: self.file,
            line,
            column,
            end_line,
            end_column,
        };
        let redefined = self
            .out
            .macros
            .get(&name)
            .is_some_and(|previous| previous.formals != info.formals || previous.body_text() != info.body_text());
        if redefined {
            self.report(
                ErrorKind::PpMacroRedefinition(name.clone()),
                format!("macro {name} redefined"),
                node.start,
            )?;
        }
        debug!("define {name}");
        self.out.macros.define(info);
        Ok(())
    }

    fn undef(&mut self, node: &RuleNode) -> Result<()> {
        let name = self.macro_name_of(node).unwrap_or_default();
        if self.out.macros.undef(&name).is_none() {
            self.report(
                ErrorKind::PpUndefUnknownMacro(name.clone()),
                format!("undefining unknown macro {name}"),
                node.start,
            )?;
        }
        Ok(())
    }

    fn include(&mut self, node: &RuleNode, pp_node: NodeId) -> Result<()> {
        if !self.recording() {
            return Ok(());
        }
        let raw = if let Some(string) = node.find(VObjectType::PpString) {
            self.text_of(string)
        } else if let Some(instance) = node.child_rules().find(|r| r.rule.is_macro_instance()) {
            match self.evaluate_instance(instance)? {
                Some(text) => text,
                None => return Ok(()),
            }
        } else {
            return Ok(());
        };
        let name = raw
            .trim()
            .trim_matches(|c| c == '"' || c == '<' || c == '>')
            .to_string();
        let (line, column, end_line, _) = self.range_of(node);
        self.out.includes.push(IncludeEdge {
            from: self.file,
            name: name.clone(),
            resolved: None,
            line,
            column,
            node: pp_node,
        });
        let edge = self.out.includes.len() - 1;

        self.out.append("\n");
        let request = IncludeRequest {
            from: self.file,
            name,
            node: pp_node,
            line,
            column,
        };
        let resolved = self.driver.include(self.session, self.out, &request)?;
        self.out.includes[edge].resolved = resolved;
        if !self.out.text.ends_with('\n') {
            self.out.append("\n");
        }
        let (file, line) = self.original_position(end_line);
        self.out.line_map.push(LineSection {
            pp_line: self.out.line,
            file,
            line,
        });
        Ok(())
    }

    fn line_directive(&mut self, node: &RuleNode) -> Result<()> {
        let numbers: Vec<&RuleNode> = node
            .child_rules()
            .filter(|r| r.rule == VObjectType::PpNumber)
            .collect();
        let target = numbers.first().and_then(|n| parse_uint32(self.text_of(n).trim()));
        let level = numbers.get(1).and_then(|n| parse_uint32(self.text_of(n).trim()));
        let path = node.find(VObjectType::PpString).map(|s| self.text_of(s));
        let (Some(target), Some(level), Some(path)) = (target, level, path) else {
            return self.report(ErrorKind::PpMalformedDirective, "malformed `line", node.start);
        };
        if level > 2 {
            return self.report(
                ErrorKind::PpIllegalLineLevel,
                format!("`line level {level} must be 0, 1 or 2"),
                node.start,
            );
        }
        let file = self.session.symbols().register_path(path.trim_matches('"'));
        let (.., end_line, _) = self.range_of(node);
        self.line_origin = Some((file, i64::from(target) - (i64::from(end_line) + 1)));
        self.out.line_map.push(LineSection {
            pp_line: self.out.line + 1,
            file,
            line: target,
        });
        Ok(())
    }

    fn timescale(&mut self, node: &RuleNode) -> Result<()> {
        let text: String = node
            .terminals()
            .into_iter()
            .skip(1)
            .filter_map(|i| self.tokens.get(i))
            .map(|t| t.text.as_str())
            .collect();
        match TimeInfo::parse_timescale(&text) {
            Some(info) => {
                self.update_state(|state| state.time_info = info);
                Ok(())
            }
            None => self.report(
                ErrorKind::PpMalformedDirective,
                format!("malformed `timescale {}", text.trim()),
                node.start,
            ),
        }
    }

    fn default_nettype(&mut self, node: &RuleNode) -> Result<()> {
        let name = self.macro_name_of(node).unwrap_or_default();
        let net_type = match name.as_str() {
            "wire" => VObjectType::PaNetTypeWire,
            "uwire" => VObjectType::PaNetTypeUwire,
            "tri" => VObjectType::PaNetTypeTri,
            "wand" => VObjectType::PaNetTypeWand,
            "wor" => VObjectType::PaNetTypeWor,
            "none" => VObjectType::SlNoType,
            _ => {
                return self.report(
                    ErrorKind::PpMalformedDirective,
                    format!("unsupported `default_nettype {name}"),
                    node.start,
                )
            }
        };
        self.update_state(|state| state.default_net_type = net_type);
        Ok(())
    }

    fn update_state(&mut self, change: impl FnOnce(&mut DirectiveState)) {
        if !self.recording() {
            return;
        }
        let mut state = self.out.states.last().copied().unwrap_or_default();
        change(&mut state);
        state.pp_line = self.out.line;
        self.out.states.push(state);
    }

    fn finish_macro_instance(&mut self, node: &RuleNode, region: Option<OpenRegion>) -> Result<()> {
        let region = region.unwrap_or(OpenRegion {
            node: NodeId::INVALID,
            marked: false,
            active: self.active(),
        });
        if region.active && !self.is_any_on_call_stack(&[CallFrame::EscapedIdentifier, CallFrame::MacroDefinitionBody]) {
            if let Some(text) = self.evaluate_instance(node)? {
                let joined = text.replace('\r', "").replace('\n', " ");
                self.out.append(&joined);
            }
            let definition = self
                .instance_name(node)
                .and_then(|name| self.out.macros.get(&name).map(|m| m.node))
                .unwrap_or(NodeId::INVALID);
            if let Some(object) = self.out.file_content.object_mut(region.node) {
                object.definition = definition;
            }
        }
        let pending = self.newlines_in(node);
        self.close_region(&region, pending);
        Ok(())
    }

    /// Fully expanded text of a macro instance, `None` when it cannot be
    /// expanded (the error is already reported).
    fn evaluate_instance(&mut self, node: &RuleNode) -> Result<Option<String>> {
        let Some(name) = self.instance_name(node) else {
            return Ok(None);
        };
        let Some(info) = self.out.macros.get(&name).cloned() else {
            self.report(
                ErrorKind::PpUnknownMacro(name.clone()),
                format!("unknown macro {name}"),
                node.start,
            )?;
            return Ok(None);
        };
        if self.out.expansion_stack.contains(&name) || self.out.expansion_stack.len() >= MAX_EXPANSION_DEPTH {
            self.report(
                ErrorKind::PpRecursiveMacro(name.clone()),
                format!("recursive expansion of macro {name}"),
                node.start,
            )?;
            return Ok(None);
        }

        let args_node = node.find(VObjectType::PpMacroActualArgs);
        let mut actuals: Vec<String> = args_node
            .map(|args| {
                args.child_rules()
                    .filter(|r| r.rule == VObjectType::PpMacroArg)
                    .map(|r| self.text_of(r).trim().to_string())
                    .collect()
            })
            .unwrap_or_default();

        let mut trailing = String::new();
        match &info.formals {
            None => {
                // Object-like macro followed by parentheses: keep them.
                if args_node.is_some() {
                    if let (Some(start), Some(stop)) = (node.start, node.stop) {
                        trailing = self.tokens[start + 1..=stop]
                            .iter()
                            .map(|t| t.text.as_str())
                            .collect();
                    }
                }
                actuals.clear();
            }
            Some(formals) => {
                if formals.is_empty() && actuals.len() == 1 && actuals[0].is_empty() {
                    actuals.clear();
                }
                let missing_required = formals
                    .iter()
                    .skip(actuals.len())
                    .any(|f| f.default.is_none());
                if actuals.len() > formals.len() || missing_required {
                    self.report(
                        ErrorKind::PpMacroArity(name.clone()),
                        format!(
                            "macro {name} expects {} argument(s), got {}",
                            formals.len(),
                            actuals.len()
                        ),
                        node.start,
                    )?;
                    return Ok(None);
                }
                for (actual, formal) in actuals.iter_mut().zip(formals) {
                    if actual.is_empty() {
                        if let Some(default) = &formal.default {
                            actual.clone_from(default);
                        }
                    }
                }
            }
        }

        let text = format!("{}{}", info.substitute(&actuals), trailing);
        self.expand_text(&name, &text).map(Some)
    }

    /// Expands macro uses left in substituted text.
    fn expand_text(&mut self, name: &str, text: &str) -> Result<String> {
        if !text.contains('`') {
            return Ok(text.to_string());
        }
        self.out.expansion_stack.push(name.to_string());
        let saved_text = std::mem::take(&mut self.out.text);
        let saved_line = self.out.line;
        let result = run(
            self.session,
            &mut *self.out,
            &mut *self.driver,
            text,
            self.file,
            NodeId::INVALID,
            Mode::Expand,
        );
        let expanded = std::mem::replace(&mut self.out.text, saved_text);
        self.out.line = saved_line;
        self.out.expansion_stack.pop();
        result?;
        Ok(expanded)
    }
}
