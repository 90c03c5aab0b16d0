//! SystemVerilog grammar over [`SvKind`] tokens.
//!
//! Hidden tokens (whitespace, comments, preprocessor markers) are filtered
//! out before parsing; leaves keep their index in the full token vector so
//! the listener can find the hidden tokens between them. Bodies the front
//! end does not shape (classes, functions, UDP tables, ...) are kept as
//! [`VObjectType::PaOpaqueBody`] runs of terminals.

use chumsky::prelude::*;
use chumsky::Stream;

use super::lexer::{SvKind as K, SvToken};
use crate::parse_tree::{nodes, rule, terminal, terminal_if, Node, Nodes, ParseNode, RuleNode};
use crate::vobject::VObjectType::{self, *};

type P<'a> = Node<'a, K>;
type Ps<'a> = Nodes<'a, K>;

const NUMBERS: &[K] = &[K::IntConst, K::BasedNumber, K::UnbasedUnsized, K::RealConst];
const UNARY_OPS: &[K] = &[
    K::Plus,
    K::Minus,
    K::Bang,
    K::Tilde,
    K::Amp,
    K::Pipe,
    K::Caret,
    K::TildeAmp,
    K::TildePipe,
    K::TildeCaret,
];
const ASSIGN_OPS: &[K] = &[
    K::Eq,
    K::PlusEq,
    K::MinusEq,
    K::StarEq,
    K::SlashEq,
    K::PercentEq,
    K::AmpEq,
    K::PipeEq,
    K::CaretEq,
    K::ShlEq,
    K::ShrEq,
    K::AShlEq,
    K::AShrEq,
];
const NET_TYPES: &[K] = &[
    K::Wire,
    K::Uwire,
    K::Tri,
    K::Wand,
    K::Wor,
    K::Supply0,
    K::Supply1,
];
const DIRECTIONS: &[K] = &[K::Input, K::Output, K::Inout, K::Ref];
const GATES: &[K] = &[K::And, K::Nand, K::Or, K::Nor, K::Xor, K::Xnor];
const LIFETIMES: &[K] = &[K::Static, K::Automatic];

/// Tokens that close an item list or open a new description. No item starts
/// at one of these, and a broken item is never skipped past one.
const ITEM_STOPS: [K; 18] = [
    K::End,
    K::Endmodule,
    K::Endinterface,
    K::Endprogram,
    K::Endpackage,
    K::Endgenerate,
    K::Endprimitive,
    K::Endcase,
    K::Table,
    K::Else,
    K::Module,
    K::Macromodule,
    K::Interface,
    K::Program,
    K::Primitive,
    K::Package,
    K::Config,
    K::Checker,
];

fn t<'a>(kind: K) -> P<'a> {
    terminal(kind)
}

fn any_of<'a>(kinds: &'static [K]) -> P<'a> {
    terminal_if(move |k: &K| kinds.contains(k))
}

fn ident<'a>() -> P<'a> {
    terminal_if(|k: &K| k.is_identifier())
}

fn end_label<'a>() -> P<'a> {
    rule(PaEndLabel, t(K::Colon).then(ident()))
}

fn opaque_until<'a>(end: K) -> P<'a> {
    rule(PaOpaqueBody, terminal_if(move |k: &K| *k != end).repeated())
}

fn braces<'a>() -> Ps<'a> {
    recursive(|group| {
        let plain = terminal_if(|k: &K| !matches!(k, K::LBrace | K::RBrace)).map(|n| vec![n]);
        t(K::LBrace)
            .then(group.or(plain).repeated())
            .then(t(K::RBrace))
            .map(nodes)
    })
    .boxed()
}

/// Everything up to the `;` closing a declaration, braces kept balanced.
fn opaque_statement<'a>() -> P<'a> {
    let plain =
        terminal_if(|k: &K| !matches!(k, K::LBrace | K::RBrace | K::Semi)).map(|n| vec![n]);
    rule(PaOpaqueBody, braces().or(plain).repeated())
}

/// An item that could not be parsed, kept as an opaque run over the
/// skipped tokens.
fn skipped_item(span: std::ops::Range<usize>) -> ParseNode {
    let mut children = vec![ParseNode::Terminal(span.start)];
    if span.end > span.start + 1 {
        children.push(ParseNode::Terminal(span.end - 1));
    }
    ParseNode::Rule(RuleNode::new(PaOpaqueBody, children))
}

fn binary_level<'a>(prev: P<'a>, ops: &'static [K], vtype: VObjectType) -> P<'a> {
    prev.clone()
        .then(any_of(ops).then(prev).repeated())
        .foldl(move |lhs, (op, rhs)| ParseNode::Rule(RuleNode::new(vtype, vec![lhs, op, rhs])))
        .boxed()
}

fn select<'a>(expr: P<'a>) -> Ps<'a> {
    let part = rule(
        PaPartSelectRange,
        expr.clone().then(t(K::Colon)).then(expr.clone()),
    );
    let bit = rule(PaBitSelect, expr);
    rule(
        PaSelect,
        t(K::LBracket)
            .then(choice((part, bit)))
            .then(t(K::RBracket))
            .repeated()
            .at_least(1),
    )
    .or_not()
    .map(nodes)
    .boxed()
}

/// `[pkg::]name(.name)*[select]`
fn reference<'a>(expr: P<'a>) -> Ps<'a> {
    let scope = rule(
        PaClassScope,
        rule(PaClassType, ident()).then(t(K::ColonColon)),
    );
    scope
        .or_not()
        .then(ident())
        .then(t(K::Dot).then(ident()).repeated())
        .then(select(expr))
        .map(nodes)
        .boxed()
}

fn call_arguments<'a>(expr: P<'a>) -> Ps<'a> {
    t(K::LParen)
        .then(rule(PaListOfArguments, expr.separated_by(t(K::Comma))))
        .then(t(K::RParen))
        .map(nodes)
        .boxed()
}

fn system_call<'a>(expr: P<'a>) -> P<'a> {
    rule(
        PaSystemTfCall,
        rule(PaSystemTaskNames, t(K::SystemIdentifier)).then(call_arguments(expr).or_not()),
    )
}

fn concatenation<'a>(expr: P<'a>) -> P<'a> {
    rule(
        PaConcatenation,
        t(K::LBrace)
            .then(expr.separated_by(t(K::Comma)).at_least(1))
            .then(t(K::RBrace)),
    )
}

/// Expression with full operator precedence. Constant expressions only
/// differ in the node types they produce.
fn expression<'a>(constant: bool) -> P<'a> {
    let (expr_type, primary_type) = if constant {
        (PaConstantExpression, PaConstantPrimary)
    } else {
        (PaExpression, PaPrimary)
    };
    recursive(move |expr| {
        let expr: P<'a> = expr.boxed();
        let concat = concatenation(expr.clone());
        let multiple = rule(
            PaMultipleConcatenation,
            t(K::LBrace)
                .then(expr.clone())
                .then(concat.clone())
                .then(t(K::RBrace)),
        );
        let func_call = rule(
            PaComplexFuncCall,
            ident().then(call_arguments(expr.clone())),
        );
        let literal = rule(
            PaPrimaryLiteral,
            choice((
                any_of(NUMBERS),
                rule(PaStringValue, t(K::StringLiteral)),
            )),
        );
        let paren = t(K::LParen).then(expr.clone()).then(t(K::RParen));

        let primary = rule(
            primary_type,
            choice((
                multiple.map(nodes),
                concat.map(nodes),
                system_call(expr.clone()).map(nodes),
                func_call.map(nodes),
                reference(expr.clone()),
                literal.map(nodes),
                paren.map(nodes),
            )),
        );

        let unary = recursive(|unary| {
            rule(
                expr_type,
                any_of(UNARY_OPS).then(choice((unary, primary.clone()))),
            )
        })
        .boxed();
        let atom = choice((unary, rule(expr_type, primary))).boxed();

        let power = binary_level(atom, &[K::StarStar], expr_type);
        let product = binary_level(power, &[K::Star, K::Slash, K::Percent], expr_type);
        let sum = binary_level(product, &[K::Plus, K::Minus], expr_type);
        let shift = binary_level(sum, &[K::Shl, K::Shr, K::AShl, K::AShr], expr_type);
        let relational = binary_level(shift, &[K::Lt, K::Le, K::Gt, K::Ge], expr_type);
        let equality = binary_level(
            relational,
            &[K::EqEq, K::NotEq, K::CaseEq, K::CaseNeq],
            expr_type,
        );
        let bit_and = binary_level(equality, &[K::Amp, K::TildeAmp], expr_type);
        let bit_xor = binary_level(bit_and, &[K::Caret, K::TildeCaret], expr_type);
        let bit_or = binary_level(bit_xor, &[K::Pipe, K::TildePipe], expr_type);
        let logic_and = binary_level(bit_or, &[K::AmpAmp], expr_type);
        let logic_or = binary_level(logic_and, &[K::PipePipe], expr_type);

        logic_or
            .then(
                t(K::Question)
                    .then(expr.clone())
                    .then(t(K::Colon))
                    .then(expr)
                    .or_not(),
            )
            .map(move |(cond, rest)| match rest {
                None => cond,
                Some((((qmark, then), colon), otherwise)) => ParseNode::Rule(RuleNode::new(
                    expr_type,
                    vec![cond, qmark, then, colon, otherwise],
                )),
            })
    })
    .boxed()
}

/// Parsers shared by several productions.
#[derive(Clone)]
struct Shared<'a> {
    expr: P<'a>,
    const_expr: P<'a>,
    packed: P<'a>,
    unpacked: P<'a>,
    data_type: P<'a>,
    implicit: Ps<'a>,
    lvalue: Ps<'a>,
}

impl<'a> Shared<'a> {
    fn new() -> Self {
        let expr = expression(false);
        let const_expr = expression(true);
        let range = rule(
            PaConstantRange,
            const_expr.clone().then(t(K::Colon)).then(const_expr.clone()),
        );
        let packed = rule(
            PaPackedDimension,
            t(K::LBracket).then(range.clone()).then(t(K::RBracket)),
        );
        let unpacked = rule(
            PaUnpackedDimension,
            t(K::LBracket)
                .then(choice((range, const_expr.clone())))
                .then(t(K::RBracket)),
        );

        let signing = any_of(&[K::Signed, K::Unsigned]);
        let vector = any_of(&[K::Logic, K::Reg, K::Bit])
            .then(signing.clone().or_not())
            .then(packed.clone().repeated())
            .map(nodes);
        let atom = any_of(&[K::Int, K::Integer, K::Byte, K::Shortint, K::Longint])
            .then(signing.clone().or_not())
            .map(nodes);
        let scoped = rule(
            PaClassScope,
            rule(PaClassType, ident()).then(t(K::ColonColon)),
        )
        .then(ident())
        .then(packed.clone().repeated())
        .map(nodes);
        let user = ident().then(packed.clone().repeated()).map(nodes);
        let data_type = rule(
            PaDataType,
            choice((
                vector,
                atom,
                any_of(&[K::Real, K::StringKw]).map(nodes),
                scoped,
                user,
            )),
        );
        let implicit = signing
            .or_not()
            .then(packed.clone().repeated())
            .map(nodes)
            .boxed();
        let lvalue = choice((
            concatenation(expr.clone()).map(nodes),
            reference(expr.clone()),
        ))
        .boxed();

        Self {
            expr,
            const_expr,
            packed,
            unpacked,
            data_type,
            implicit,
            lvalue,
        }
    }

    /// `tail` preceded by an explicit data type or by an implicit one
    /// (signing and packed dimensions only).
    fn typed(&self, tail: Ps<'a>) -> Ps<'a> {
        choice((
            self.data_type.clone().then(tail.clone()).map(nodes),
            self.implicit.clone().then(tail).map(nodes),
        ))
        .boxed()
    }

    fn named_decl(&self, vtype: VObjectType, value: P<'a>) -> P<'a> {
        rule(
            vtype,
            ident()
                .then(self.unpacked.clone().repeated())
                .then(t(K::Eq).then(value).or_not()),
        )
    }

    fn statement(&self) -> P<'a> {
        let g = self.clone();
        recursive(move |stmt| {
            let stmt: P<'a> = stmt.boxed();
            let expr = g.expr.clone();
            let label = t(K::Colon).then(ident()).or_not();
            let lvalue = rule(PaVariableLvalue, g.lvalue.clone());
            let inc_dec = any_of(&[K::PlusPlus, K::MinusMinus]);

            let seq_block = rule(
                PaSeqBlock,
                t(K::Begin)
                    .then(label.clone())
                    .then(stmt.clone().repeated())
                    .then(t(K::End))
                    .then(label),
            );
            let conditional = rule(
                PaConditionalStatement,
                t(K::If)
                    .then(t(K::LParen))
                    .then(expr.clone())
                    .then(t(K::RParen))
                    .then(stmt.clone())
                    .then(t(K::Else).then(stmt.clone()).or_not()),
            );
            let case_item = rule(
                PaCaseItem,
                choice((
                    expr.clone()
                        .separated_by(t(K::Comma))
                        .at_least(1)
                        .then(t(K::Colon))
                        .map(nodes),
                    t(K::Default).then(t(K::Colon).or_not()).map(nodes),
                ))
                .then(stmt.clone()),
            );
            let case = rule(
                PaCaseStatement,
                any_of(&[K::Case, K::Casex, K::Casez])
                    .then(t(K::LParen))
                    .then(expr.clone())
                    .then(t(K::RParen))
                    .then(case_item.repeated().at_least(1))
                    .then(t(K::Endcase)),
            );

            let init_tail = ident().then(t(K::Eq)).then(expr.clone());
            let for_init = rule(
                PaForInitialization,
                choice((
                    g.data_type.clone().then(init_tail.clone()).map(nodes),
                    init_tail.map(nodes),
                ))
                .separated_by(t(K::Comma)),
            );
            let for_step = rule(
                PaForStep,
                choice((
                    lvalue
                        .clone()
                        .then(any_of(ASSIGN_OPS))
                        .then(expr.clone())
                        .map(nodes),
                    lvalue.clone().then(inc_dec.clone()).map(nodes),
                    inc_dec.clone().then(lvalue.clone()).map(nodes),
                ))
                .separated_by(t(K::Comma)),
            );
            let for_loop = rule(
                PaLoopStatement,
                t(K::For)
                    .then(t(K::LParen))
                    .then(for_init)
                    .then(t(K::Semi))
                    .then(expr.clone())
                    .then(t(K::Semi))
                    .then(for_step)
                    .then(t(K::RParen))
                    .then(stmt.clone()),
            );

            let event_expr = rule(
                PaEventExpression,
                any_of(&[K::Posedge, K::Negedge])
                    .or_not()
                    .then(expr.clone()),
            );
            let event_control = rule(
                PaEventControl,
                t(K::At).then(choice((
                    t(K::Star).map(nodes),
                    t(K::LParen)
                        .then(t(K::Star))
                        .then(t(K::RParen))
                        .map(nodes),
                    t(K::LParen)
                        .then(
                            event_expr
                                .separated_by(any_of(&[K::Or, K::Comma]))
                                .at_least(1),
                        )
                        .then(t(K::RParen))
                        .map(nodes),
                    ident().map(nodes),
                ))),
            );
            let delay_control = rule(
                PaDelayControl,
                t(K::Hash).then(choice((
                    any_of(NUMBERS).map(nodes),
                    ident().map(nodes),
                    t(K::LParen)
                        .then(expr.clone())
                        .then(t(K::RParen))
                        .map(nodes),
                ))),
            );
            let timing = rule(
                PaProceduralTimingControlStatement,
                choice((event_control, delay_control)).then(stmt),
            );

            let nonblocking = rule(
                PaNonblockingAssignment,
                lvalue
                    .clone()
                    .then(t(K::Le))
                    .then(expr.clone())
                    .then(t(K::Semi)),
            );
            let operator_assignment = rule(
                PaOperatorAssignment,
                choice((
                    lvalue
                        .clone()
                        .then(any_of(ASSIGN_OPS))
                        .then(expr.clone())
                        .map(nodes),
                    lvalue.clone().then(inc_dec.clone()).map(nodes),
                    inc_dec.then(lvalue).map(nodes),
                ))
                .then(t(K::Semi)),
            );
            let subroutine_call = rule(
                PaSubroutineCallStatement,
                choice((
                    system_call(expr.clone()),
                    rule(
                        PaComplexFuncCall,
                        reference(expr.clone()).then(call_arguments(expr).or_not()),
                    ),
                ))
                .then(t(K::Semi)),
            );

            choice((
                seq_block,
                conditional,
                case,
                for_loop,
                timing,
                nonblocking,
                operator_assignment,
                subroutine_call,
                t(K::Semi),
            ))
        })
        .boxed()
    }

    fn ports(&self) -> P<'a> {
        let non_ansi = rule(
            PaListOfPorts,
            t(K::LParen)
                .then(rule(PaPort, ident()).separated_by(t(K::Comma)).at_least(1))
                .then(t(K::RParen)),
        );
        let port_tail = ident()
            .then(self.unpacked.clone().repeated())
            .then(t(K::Eq).then(self.expr.clone()).or_not())
            .map(nodes)
            .boxed();
        let interface_port = rule(
            PaInterfacePortHeader,
            ident().then(t(K::Dot).then(ident()).or_not()),
        )
        .then(ident())
        .then(self.unpacked.clone().repeated())
        .map(nodes);
        let typed_port = any_of(DIRECTIONS)
            .or_not()
            .then(any_of(NET_TYPES).or_not())
            .then(t(K::Var).or_not())
            .then(self.typed(port_tail))
            .map(nodes);
        let ansi = rule(
            PaListOfPortDeclarations,
            t(K::LParen)
                .then(
                    rule(PaAnsiPortDeclaration, choice((interface_port, typed_port)))
                        .separated_by(t(K::Comma)),
                )
                .then(t(K::RParen)),
        );
        choice((non_ansi, ansi)).boxed()
    }

    fn parameter_ports(&self) -> P<'a> {
        let assignment = self.named_decl(PaParamAssignment, self.const_expr.clone());
        let declaration = rule(
            PaParameterDeclaration,
            any_of(&[K::Parameter, K::Localparam])
                .or_not()
                .then(self.typed(assignment.map(nodes).boxed())),
        );
        rule(
            PaParameterPortList,
            t(K::Hash)
                .then(t(K::LParen))
                .then(declaration.separated_by(t(K::Comma)))
                .then(t(K::RParen)),
        )
    }

    fn module_item(&self) -> P<'a> {
        let g = self.clone();
        recursive(move |item| {
            let item: P<'a> = item.boxed();
            let expr = g.expr.clone();
            let const_expr = g.const_expr.clone();
            let stmt = g.statement();

            // Declarations.
            let port_ids = rule(
                PaListOfPortIdentifiers,
                ident()
                    .then(g.unpacked.clone().repeated())
                    .separated_by(t(K::Comma))
                    .at_least(1),
            )
            .map(nodes)
            .boxed();
            let direction = |kind: K, vtype: VObjectType| {
                rule(
                    vtype,
                    t(kind)
                        .then(any_of(NET_TYPES).or_not())
                        .then(t(K::Var).or_not())
                        .then(g.typed(port_ids.clone())),
                )
            };
            let port_declaration = rule(
                PaPortDeclaration,
                choice((
                    direction(K::Input, PaInputDeclaration),
                    direction(K::Output, PaOutputDeclaration),
                    direction(K::Inout, PaInoutDeclaration),
                ))
                .then(t(K::Semi)),
            );
            let param_assignments = g
                .named_decl(PaParamAssignment, const_expr.clone())
                .separated_by(t(K::Comma))
                .at_least(1)
                .map(nodes)
                .boxed();
            let parameter = rule(
                PaParameterDeclaration,
                t(K::Parameter)
                    .then(g.typed(param_assignments.clone()))
                    .then(t(K::Semi)),
            );
            let localparam = rule(
                PaLocalParameterDeclaration,
                t(K::Localparam)
                    .then(g.typed(param_assignments))
                    .then(t(K::Semi)),
            );
            let genvar = rule(
                PaGenvarDeclaration,
                t(K::Genvar)
                    .then(ident().separated_by(t(K::Comma)).at_least(1))
                    .then(t(K::Semi)),
            );
            let net_assignments = g
                .named_decl(PaNetDeclAssignment, expr.clone())
                .separated_by(t(K::Comma))
                .at_least(1)
                .map(nodes)
                .boxed();
            let net = rule(
                PaNetDeclaration,
                any_of(NET_TYPES)
                    .then(g.typed(net_assignments))
                    .then(t(K::Semi)),
            );
            let data = rule(
                PaDataDeclaration,
                any_of(&[K::Const, K::Var, K::Static, K::Automatic])
                    .repeated()
                    .then(g.data_type.clone())
                    .then(
                        g.named_decl(PaVariableDeclAssignment, expr.clone())
                            .separated_by(t(K::Comma))
                            .at_least(1),
                    )
                    .then(t(K::Semi)),
            );
            let bare_name = rule(
                PaDataDeclaration,
                rule(PaVariableDeclAssignment, ident()).then(t(K::Semi)),
            );
            let typedef = rule(
                PaTypeDeclaration,
                t(K::Typedef).then(opaque_statement()).then(t(K::Semi)),
            );
            let import = rule(
                PaPackageImportDeclaration,
                t(K::Import).then(opaque_statement()).then(t(K::Semi)),
            );
            let continuous_assign = rule(
                PaContinuousAssign,
                t(K::Assign)
                    .then(
                        rule(
                            PaNetAssignment,
                            rule(PaNetLvalue, g.lvalue.clone())
                                .then(t(K::Eq))
                                .then(expr.clone()),
                        )
                        .separated_by(t(K::Comma))
                        .at_least(1),
                    )
                    .then(t(K::Semi)),
            );

            // Processes.
            let initial = rule(PaInitialConstruct, t(K::Initial).then(stmt.clone()));
            let always = rule(
                PaAlwaysConstruct,
                rule(
                    PaAlwaysKeyword,
                    any_of(&[K::Always, K::AlwaysComb, K::AlwaysFf, K::AlwaysLatch]),
                )
                .then(stmt),
            );

            // Instances.
            let named_parameter = rule(
                PaNamedParameterAssignment,
                t(K::Dot)
                    .then(ident())
                    .then(t(K::LParen))
                    .then(expr.clone().or_not())
                    .then(t(K::RParen)),
            );
            let parameter_values = rule(
                PaParameterValueAssignment,
                t(K::Hash).then(choice((
                    t(K::LParen)
                        .then(choice((
                            named_parameter
                                .separated_by(t(K::Comma))
                                .at_least(1)
                                .map(nodes),
                            rule(PaOrderedParameterAssignment, expr.clone())
                                .separated_by(t(K::Comma))
                                .map(nodes),
                        )))
                        .then(t(K::RParen))
                        .map(nodes),
                    any_of(NUMBERS).map(nodes),
                ))),
            );
            let named_connection = rule(
                PaNamedPortConnection,
                choice((
                    t(K::DotStar).map(nodes),
                    t(K::Dot)
                        .then(ident())
                        .then(
                            t(K::LParen)
                                .then(expr.clone().or_not())
                                .then(t(K::RParen))
                                .or_not(),
                        )
                        .map(nodes),
                )),
            );
            let connections = rule(
                PaListOfPortConnections,
                choice((
                    named_connection
                        .separated_by(t(K::Comma))
                        .at_least(1)
                        .map(nodes),
                    rule(PaOrderedPortConnection, expr.clone())
                        .separated_by(t(K::Comma))
                        .map(nodes),
                )),
            );
            let instance = rule(
                PaHierarchicalInstance,
                rule(
                    PaNameOfInstance,
                    ident().then(g.unpacked.clone().repeated()),
                )
                .then(t(K::LParen))
                .then(connections)
                .then(t(K::RParen)),
            );
            let module_instantiation = rule(
                PaModuleInstantiation,
                ident()
                    .then(parameter_values.or_not())
                    .then(instance.separated_by(t(K::Comma)).at_least(1))
                    .then(t(K::Semi)),
            );
            let gate_instantiation = rule(
                PaGateInstantiation,
                any_of(GATES)
                    .then(
                        rule(
                            PaNInputGateInstance,
                            rule(PaNameOfInstance, ident())
                                .or_not()
                                .then(t(K::LParen))
                                .then(expr.clone().separated_by(t(K::Comma)).at_least(1))
                                .then(t(K::RParen)),
                        )
                        .separated_by(t(K::Comma))
                        .at_least(1),
                    )
                    .then(t(K::Semi)),
            );

            // Interface pieces and opaque bodies.
            let modport = g.modport();
            let clocking = rule(
                PaClockingDeclaration,
                t(K::Default)
                    .or_not()
                    .then(t(K::Clocking))
                    .then(opaque_until(K::Endclocking))
                    .then(t(K::Endclocking))
                    .then(end_label().or_not()),
            );
            let function = rule(
                PaFunctionDeclaration,
                t(K::Function)
                    .then(opaque_until(K::Endfunction))
                    .then(t(K::Endfunction))
                    .then(end_label().or_not()),
            );
            let task = rule(
                PaTaskDeclaration,
                t(K::Task)
                    .then(opaque_until(K::Endtask))
                    .then(t(K::Endtask))
                    .then(end_label().or_not()),
            );
            let class = rule(
                PaClassDeclaration,
                t(K::Virtual)
                    .or_not()
                    .then(t(K::Class))
                    .then(opaque_until(K::Endclass))
                    .then(t(K::Endclass))
                    .then(end_label().or_not()),
            );

            // Generate constructs.
            let begin_end = rule(
                PaGenerateBeginEndBlock,
                ident()
                    .then(t(K::Colon))
                    .or_not()
                    .then(t(K::Begin))
                    .then(t(K::Colon).then(ident()).or_not())
                    .then(item.clone().repeated())
                    .then(t(K::End))
                    .then(end_label().or_not()),
            );
            let block = rule(PaGenerateBlock, choice((begin_end.clone(), item.clone()))).boxed();
            let if_generate = rule(
                PaIfGenerateConstruct,
                t(K::If)
                    .then(t(K::LParen))
                    .then(const_expr.clone())
                    .then(t(K::RParen))
                    .then(block.clone())
                    .then(t(K::Else).then(block.clone()).or_not()),
            );
            let case_generate_item = rule(
                PaCaseGenerateItem,
                choice((
                    const_expr
                        .clone()
                        .separated_by(t(K::Comma))
                        .at_least(1)
                        .then(t(K::Colon))
                        .map(nodes),
                    t(K::Default).then(t(K::Colon).or_not()).map(nodes),
                ))
                .then(block.clone()),
            );
            let case_generate = rule(
                PaCaseGenerateConstruct,
                t(K::Case)
                    .then(t(K::LParen))
                    .then(const_expr.clone())
                    .then(t(K::RParen))
                    .then(case_generate_item.repeated().at_least(1))
                    .then(t(K::Endcase)),
            );
            let conditional_generate = rule(
                PaConditionalGenerateConstruct,
                choice((if_generate, case_generate)),
            );
            let genvar_init = choice((
                rule(
                    PaGenvarDeclAssignment,
                    t(K::Genvar)
                        .then(ident())
                        .then(t(K::Eq))
                        .then(const_expr.clone()),
                ),
                rule(
                    PaGenvarInitialization,
                    ident().then(t(K::Eq)).then(const_expr.clone()),
                ),
            ));
            let inc_dec = any_of(&[K::PlusPlus, K::MinusMinus]);
            let genvar_iteration = rule(
                PaGenvarIteration,
                choice((
                    ident()
                        .then(any_of(ASSIGN_OPS))
                        .then(const_expr.clone())
                        .map(nodes),
                    ident().then(inc_dec.clone()).map(nodes),
                    inc_dec.then(ident()).map(nodes),
                )),
            );
            let loop_generate = rule(
                PaLoopGenerateConstruct,
                t(K::For)
                    .then(t(K::LParen))
                    .then(genvar_init)
                    .then(t(K::Semi))
                    .then(const_expr)
                    .then(t(K::Semi))
                    .then(genvar_iteration)
                    .then(t(K::RParen))
                    .then(block),
            );
            let generate_region = rule(
                PaGenerateRegion,
                t(K::Generate)
                    .then(choice((rule(PaGenerateBlock, begin_end), item)).repeated())
                    .then(t(K::Endgenerate)),
            );

            let item = choice((
                port_declaration,
                parameter,
                localparam,
                typedef,
                import,
                genvar,
                net,
                continuous_assign,
                initial,
                always,
                generate_region,
                conditional_generate,
                loop_generate,
                modport,
                clocking,
                function,
                task,
                class,
                module_instantiation,
                gate_instantiation,
                data,
                bare_name,
                t(K::Semi),
            ))
            .recover_with(skip_then_retry_until(ITEM_STOPS))
            .recover_with(skip_until(ITEM_STOPS, skipped_item));

            filter::<K, _, Simple<K>>(|k: &K| !ITEM_STOPS.contains(k))
                .rewind()
                .ignore_then(item)
        })
        .boxed()
    }

    fn modport(&self) -> P<'a> {
        let simple_port = rule(
            PaModportSimplePort,
            choice((
                t(K::Dot)
                    .then(ident())
                    .then(t(K::LParen))
                    .then(self.expr.clone().or_not())
                    .then(t(K::RParen))
                    .map(nodes),
                ident().map(nodes),
            )),
        );
        let entry = choice((
            t(K::Clocking)
                .then(ident())
                .map(|(keyword, name)| ModportEntry::Clocking(vec![keyword, name])),
            any_of(DIRECTIONS)
                .or_not()
                .then(simple_port)
                .map(|(direction, port)| ModportEntry::Simple(direction, port)),
        ));
        let item = rule(
            PaModportItem,
            ident()
                .then(t(K::LParen))
                .then(entry.separated_by(t(K::Comma)).map(group_modport_ports))
                .then(t(K::RParen)),
        );
        rule(
            PaModportDeclaration,
            t(K::Modport)
                .then(item.separated_by(t(K::Comma)).at_least(1))
                .then(t(K::Semi)),
        )
    }
}

enum ModportEntry {
    Simple(Option<ParseNode>, ParseNode),
    Clocking(Vec<ParseNode>),
}

/// A direction applies to every following port up to the next direction.
fn group_modport_ports(entries: Vec<ModportEntry>) -> Vec<ParseNode> {
    let mut groups: Vec<(VObjectType, Vec<ParseNode>)> = Vec::new();
    for entry in entries {
        match entry {
            ModportEntry::Clocking(children) => {
                groups.push((VObjectType::PaModportClockingDeclaration, children))
            }
            ModportEntry::Simple(Some(direction), port) => groups.push((
                VObjectType::PaModportSimplePortsDeclaration,
                vec![direction, port],
            )),
            ModportEntry::Simple(None, port) => match groups.last_mut() {
                Some((VObjectType::PaModportSimplePortsDeclaration, children)) => {
                    children.push(port)
                }
                _ => groups.push((VObjectType::PaModportSimplePortsDeclaration, vec![port])),
            },
        }
    }
    groups
        .into_iter()
        .map(|(vtype, children)| {
            ParseNode::Rule(RuleNode::new(
                PaModportPortsDeclaration,
                vec![ParseNode::Rule(RuleNode::new(vtype, children))],
            ))
        })
        .collect()
}

fn source_text<'a>() -> impl Parser<K, RuleNode, Error = Simple<K>> + 'a {
    let g = Shared::new();
    let item = g.module_item();
    let lifetime = || any_of(LIFETIMES).or_not();
    let header = |keyword: P<'a>| {
        keyword
            .then(lifetime())
            .then(ident())
            .then(g.parameter_ports().or_not())
            .then(g.ports().or_not())
            .then(t(K::Semi))
            .map(nodes)
            .boxed()
    };

    let module = rule(
        PaModuleDeclaration,
        header(rule(
            PaModuleKeyword,
            any_of(&[K::Module, K::Macromodule]),
        ))
        .then(item.clone().repeated())
        .then(t(K::Endmodule))
        .then(end_label().or_not()),
    );
    let interface = rule(
        PaInterfaceDeclaration,
        header(t(K::Interface))
            .then(item.clone().repeated())
            .then(t(K::Endinterface))
            .then(end_label().or_not()),
    );
    let program = rule(
        PaProgramDeclaration,
        header(t(K::Program))
            .then(item.clone().repeated())
            .then(t(K::Endprogram))
            .then(end_label().or_not()),
    );
    let udp = rule(
        PaUdpDeclaration,
        t(K::Primitive)
            .then(ident())
            .then(g.ports())
            .then(t(K::Semi))
            .then(item.clone().repeated())
            .then(rule(
                PaUdpBody,
                t(K::Table)
                    .then(opaque_until(K::Endtable))
                    .then(t(K::Endtable)),
            ))
            .then(t(K::Endprimitive))
            .then(end_label().or_not()),
    );
    let package = rule(
        PaPackageDeclaration,
        t(K::Package)
            .then(lifetime())
            .then(ident())
            .then(t(K::Semi))
            .then(item.clone().repeated())
            .then(t(K::Endpackage))
            .then(end_label().or_not()),
    );
    let config = rule(
        PaConfigDeclaration,
        t(K::Config)
            .then(opaque_until(K::Endconfig))
            .then(t(K::Endconfig))
            .then(end_label().or_not()),
    );
    let checker = rule(
        PaCheckerDeclaration,
        t(K::Checker)
            .then(opaque_until(K::Endchecker))
            .then(t(K::Endchecker))
            .then(end_label().or_not()),
    );

    let nothing: [K; 0] = [];
    let description = choice((
        module, interface, program, udp, package, config, checker, item,
    ))
    .recover_with(skip_then_retry_until(nothing));

    description
        .repeated()
        .then_ignore(end())
        .map(|descriptions| {
            RuleNode::new(
                PaTopLevelRule,
                vec![ParseNode::Rule(RuleNode::new(
                    PaSourceText,
                    nodes(descriptions),
                ))],
            )
        })
}

/// Builds the parse tree of `tokens`, recovering from errors where it can.
/// Leaf `Terminal(i)` is `tokens[i]`.
pub fn parse(tokens: &[SvToken]) -> (Option<RuleNode>, Vec<Simple<K>>) {
    let len = tokens.len();
    let stream = Stream::from_iter(
        len..len,
        tokens
            .iter()
            .enumerate()
            .filter(|(_, t)| !t.kind.is_hidden())
            .map(|(i, t)| (t.kind, i..i + 1)),
    );
    source_text().parse_recovery(stream)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::lexer::lex;

    fn tree(source: &str) -> RuleNode {
        let tokens = lex(source);
        let (tree, errors) = parse(&tokens);
        assert!(errors.is_empty(), "{errors:?}");
        tree.unwrap()
    }

    fn descriptions(tree: &RuleNode) -> Vec<VObjectType> {
        tree.find(PaSourceText)
            .unwrap()
            .child_rules()
            .map(|r| r.rule)
            .collect()
    }

    fn collect<'t>(node: &'t RuleNode, vtype: VObjectType, out: &mut Vec<&'t RuleNode>) {
        if node.rule == vtype {
            out.push(node);
        }
        for child in node.child_rules() {
            collect(child, vtype, out);
        }
    }

    #[test]
    fn top_level_descriptions() {
        let tree = tree(
            "module m(input logic a, output b); endmodule\n\
             interface bus; modport mp(input a, output b); endinterface\n\
             package p; parameter int W = 4; endpackage\n\
             primitive u(o, a); output o; input a; table 0 : 1; endtable endprimitive\n",
        );
        assert_eq!(
            descriptions(&tree),
            vec![
                PaModuleDeclaration,
                PaInterfaceDeclaration,
                PaPackageDeclaration,
                PaUdpDeclaration
            ]
        );
    }

    #[test]
    fn binary_operators_follow_precedence() {
        let tree = tree("module m; assign x = a + b * c; endmodule");
        let mut exprs = Vec::new();
        collect(&tree, PaExpression, &mut exprs);
        // a + (b * c): the outer node has three children, the right one is
        // the product.
        let outer = exprs[0];
        assert_eq!(outer.children.len(), 3);
        let right = outer.children[2].as_rule().unwrap();
        assert_eq!(right.children.len(), 3);
    }

    #[test]
    fn generate_constructs() {
        let tree = tree(
            "module m; generate if (W>1) begin:g x y; end endgenerate\n\
             for (genvar i=0; i<N; i=i+1) begin:blk u u_i(); end\n\
             case (N) 1: begin a; end default: begin b; end endcase endmodule",
        );
        let mut found = Vec::new();
        collect(&tree, PaIfGenerateConstruct, &mut found);
        collect(&tree, PaLoopGenerateConstruct, &mut found);
        collect(&tree, PaCaseGenerateConstruct, &mut found);
        assert_eq!(found.len(), 3);
        let mut items = Vec::new();
        collect(&tree, PaCaseGenerateItem, &mut items);
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn modport_directions_group_ports() {
        let tree = tree("interface i; modport mp(input a, b, output c, clocking cb); endinterface");
        let mut groups = Vec::new();
        collect(&tree, PaModportSimplePortsDeclaration, &mut groups);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].child_rules().count(), 2);
        let mut clocking = Vec::new();
        collect(&tree, PaModportClockingDeclaration, &mut clocking);
        assert_eq!(clocking.len(), 1);
    }

    #[test]
    fn item_lists_stop_at_closing_keywords() {
        let tree = tree(
            "module top; wire a; endmodule\n\
             interface bus; endinterface\n\
             primitive u(o, a); output o; input a; table 0 ; 1 : 0 ; endtable endprimitive\n\
             module g; generate case (N) 1: begin wire a; end default: begin wire b; end endcase endgenerate endmodule\n",
        );
        assert_eq!(
            descriptions(&tree),
            vec![
                PaModuleDeclaration,
                PaInterfaceDeclaration,
                PaUdpDeclaration,
                PaModuleDeclaration
            ]
        );
        let mut bodies = Vec::new();
        collect(&tree, PaUdpBody, &mut bodies);
        assert_eq!(bodies.len(), 1);
        let mut items = Vec::new();
        collect(&tree, PaCaseGenerateItem, &mut items);
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn unfinished_item_does_not_swallow_endmodule() {
        let tokens = lex("module a; wire w endmodule module b; endmodule");
        let (tree, errors) = parse(&tokens);
        assert!(!errors.is_empty());
        let tree = tree.unwrap();
        assert_eq!(
            descriptions(&tree),
            vec![PaModuleDeclaration, PaModuleDeclaration]
        );
        let mut skipped = Vec::new();
        collect(&tree, PaOpaqueBody, &mut skipped);
        assert_eq!(skipped.len(), 1);
        // `wire` and `w`; the whitespace between them is tokens 6 and 8.
        assert_eq!(skipped[0].terminals(), vec![5, 7]);
    }

    #[test]
    fn broken_item_is_skipped() {
        let tokens = lex("module m; wire a; assign = ; wire b; endmodule");
        let (tree, errors) = parse(&tokens);
        assert!(!errors.is_empty());
        let tree = tree.unwrap();
        let mut nets = Vec::new();
        collect(&tree, PaNetDeclaration, &mut nets);
        assert_eq!(nets.len(), 2);
    }
}
