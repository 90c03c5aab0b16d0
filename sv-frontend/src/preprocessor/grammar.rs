//! Preprocessor grammar over [`PpKind`] tokens.
//!
//! Every token ends up in the tree: directives and macro instances become
//! rule nodes, everything else stays a terminal of the top level rule so the
//! listener can copy it through.

use chumsky::prelude::*;
use chumsky::Stream;

use super::lexer::{PpKind, PpToken};
use crate::parse_tree::{nodes, rule, terminal, terminal_if, Node, Nodes, ParseNode, RuleNode};
use crate::vobject::VObjectType;

fn t<'a>(kind: PpKind) -> Node<'a, PpKind> {
    terminal(kind)
}

fn spaces<'a>() -> Nodes<'a, PpKind> {
    t(PpKind::Spaces).repeated().boxed()
}

fn is_bracket(kind: &PpKind) -> bool {
    matches!(
        kind,
        PpKind::LParen
            | PpKind::RParen
            | PpKind::LBracket
            | PpKind::RBracket
            | PpKind::LBrace
            | PpKind::RBrace
    )
}

/// A bracketed group with anything balanced inside.
fn balanced<'a>() -> Nodes<'a, PpKind> {
    recursive(|group| {
        let plain = terminal_if(|k: &PpKind| !is_bracket(k)).map(|n| vec![n]);
        let inner = group.or(plain).repeated();
        choice((
            t(PpKind::LParen)
                .then(inner.clone())
                .then(t(PpKind::RParen))
                .map(nodes),
            t(PpKind::LBracket)
                .then(inner.clone())
                .then(t(PpKind::RBracket))
                .map(nodes),
            t(PpKind::LBrace)
                .then(inner)
                .then(t(PpKind::RBrace))
                .map(nodes),
        ))
    })
    .boxed()
}

fn macro_name<'a>() -> Node<'a, PpKind> {
    choice((
        rule(VObjectType::PpPsIdentifier, t(PpKind::Identifier)),
        rule(VObjectType::PpEscapedIdentifier, t(PpKind::EscapedIdentifier)),
    ))
    .boxed()
}

fn actual_args<'a>() -> Node<'a, PpKind> {
    let plain = terminal_if(|k: &PpKind| !is_bracket(k) && *k != PpKind::Comma).map(|n| vec![n]);
    let arg = rule(VObjectType::PpMacroArg, balanced().or(plain).repeated());
    rule(
        VObjectType::PpMacroActualArgs,
        t(PpKind::LParen)
            .then(arg.separated_by(t(PpKind::Comma)))
            .then(t(PpKind::RParen)),
    )
}

fn macro_instance<'a>() -> Node<'a, PpKind> {
    choice((
        rule(
            VObjectType::PpMacroInstanceWithArgs,
            t(PpKind::MacroIdentifier).then(spaces()).then(actual_args()),
        ),
        rule(VObjectType::PpMacroInstanceNoArgs, t(PpKind::MacroIdentifier)),
    ))
    .boxed()
}

fn define<'a>() -> Node<'a, PpKind> {
    let plain = terminal_if(|k: &PpKind| {
        !is_bracket(k) && !matches!(k, PpKind::Comma | PpKind::Cr)
    })
    .map(|n| vec![n]);
    let default_value = rule(VObjectType::PpDefaultValue, balanced().or(plain).repeated());
    let formal = rule(
        VObjectType::PpFormalArg,
        spaces()
            .then(rule(VObjectType::PpPsIdentifier, t(PpKind::Identifier)))
            .then(spaces())
            .then(t(PpKind::Equals).then(default_value).or_not())
            .then(spaces()),
    );
    let formals = rule(
        VObjectType::PpFormalArgList,
        t(PpKind::LParen)
            .then(formal.separated_by(t(PpKind::Comma)))
            .then(t(PpKind::RParen)),
    );

    let body = filter(|k: &PpKind| *k != PpKind::Cr)
        .map_with_span(|kind, span: std::ops::Range<usize>| (kind, span.start))
        .repeated()
        .map(|items: Vec<(PpKind, usize)>| {
            let escaped = items.iter().any(|(k, _)| *k == PpKind::LineContinuation);
            let vtype = if escaped {
                VObjectType::PpEscapedMacroDefinitionBody
            } else {
                VObjectType::PpSimpleMacroDefinitionBody
            };
            let children = items.into_iter().map(|(_, i)| ParseNode::Terminal(i)).collect();
            ParseNode::Rule(RuleNode::new(vtype, children))
        });

    t(PpKind::Define)
        .then(spaces())
        .then(macro_name())
        .then(formals.or_not())
        .then(body)
        .map(|((((keyword, ws), name), formals), body)| {
            let escaped = matches!(
                &body,
                ParseNode::Rule(r) if r.rule == VObjectType::PpEscapedMacroDefinitionBody
            );
            let vtype = match (formals.is_some(), escaped) {
                (false, false) => VObjectType::PpSimpleNoArgsMacroDefinition,
                (true, false) => VObjectType::PpSimpleArgsMacroDefinition,
                (false, true) => VObjectType::PpMultilineNoArgsMacroDefinition,
                (true, true) => VObjectType::PpMultilineArgsMacroDefinition,
            };
            ParseNode::Rule(RuleNode::new(
                vtype,
                nodes(((((keyword, ws), name), formals), body)),
            ))
        })
        .boxed()
}

fn include<'a>() -> Node<'a, PpKind> {
    let angle = rule(
        VObjectType::PpString,
        t(PpKind::Lt)
            .then(terminal_if(|k: &PpKind| !matches!(k, PpKind::Gt | PpKind::Cr)).repeated())
            .then(t(PpKind::Gt)),
    );
    rule(
        VObjectType::PpIncludeDirective,
        t(PpKind::Include).then(spaces()).then(choice((
            rule(VObjectType::PpString, t(PpKind::String)),
            macro_instance(),
            angle,
        ))),
    )
}

fn line<'a>() -> Node<'a, PpKind> {
    rule(
        VObjectType::PpLineDirective,
        t(PpKind::Line)
            .then(spaces())
            .then(rule(VObjectType::PpNumber, t(PpKind::Number)))
            .then(spaces())
            .then(rule(VObjectType::PpString, t(PpKind::String)))
            .then(spaces())
            .then(rule(VObjectType::PpNumber, t(PpKind::Number))),
    )
}

fn named<'a>(vtype: VObjectType, kind: PpKind) -> Node<'a, PpKind> {
    rule(vtype, t(kind).then(spaces()).then(macro_name()))
}

fn source_text<'a>() -> impl Parser<PpKind, RuleNode, Error = Simple<PpKind>> + 'a {
    let timescale = rule(
        VObjectType::PpTimescaleDirective,
        t(PpKind::Timescale).then(
            terminal_if(|k: &PpKind| !matches!(k, PpKind::Cr | PpKind::OneLineComment)).repeated(),
        ),
    );
    let default_nettype = rule(
        VObjectType::PpDefaultNettypeDirective,
        t(PpKind::DefaultNettype)
            .then(spaces())
            .then(rule(VObjectType::PpPsIdentifier, t(PpKind::Identifier))),
    );

    let description = choice((
        define(),
        named(VObjectType::PpUndefDirective, PpKind::Undef),
        named(VObjectType::PpIfdefDirective, PpKind::Ifdef),
        named(VObjectType::PpIfndefDirective, PpKind::Ifndef),
        named(VObjectType::PpElsifDirective, PpKind::Elsif),
        rule(VObjectType::PpElseDirective, t(PpKind::Else)),
        rule(VObjectType::PpEndifDirective, t(PpKind::Endif)),
        include(),
        line(),
        timescale,
        default_nettype,
        rule(VObjectType::PpResetallDirective, t(PpKind::Resetall)),
        rule(VObjectType::PpUndefineallDirective, t(PpKind::Undefineall)),
        rule(VObjectType::PpCelldefineDirective, t(PpKind::Celldefine)),
        rule(VObjectType::PpEndcelldefineDirective, t(PpKind::Endcelldefine)),
        rule(VObjectType::PpSvFileDirective, t(PpKind::SvFile)),
        rule(VObjectType::PpSvLineDirective, t(PpKind::SvLine)),
        macro_instance(),
        rule(VObjectType::PpEscapedIdentifier, t(PpKind::EscapedIdentifier)),
        any().map_with_span(|_, span: std::ops::Range<usize>| ParseNode::Terminal(span.start)),
    ));

    description
        .repeated()
        .then_ignore(end())
        .map(|items| RuleNode::new(VObjectType::PpTopLevelRule, items))
}

/// Builds the preprocessor tree of `tokens`. Token `i` of the input is leaf
/// `Terminal(i)`.
pub fn parse(tokens: &[PpToken]) -> Result<RuleNode, Vec<Simple<PpKind>>> {
    let len = tokens.len();
    let stream = Stream::from_iter(
        len..len,
        tokens.iter().enumerate().map(|(i, t)| (t.kind, i..i + 1)),
    );
    source_text().parse(stream)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preprocessor::lexer::lex;

    fn top_rules(source: &str) -> Vec<VObjectType> {
        let tokens = lex(source);
        let tree = parse(&tokens).unwrap();
        tree.child_rules().map(|r| r.rule).collect()
    }

    #[test]
    fn define_shapes() {
        assert_eq!(
            top_rules("`define A 1\n`define B(x) x\n`define C a \\\n b\n"),
            vec![
                VObjectType::PpSimpleNoArgsMacroDefinition,
                VObjectType::PpSimpleArgsMacroDefinition,
                VObjectType::PpMultilineNoArgsMacroDefinition,
            ]
        );
    }

    #[test]
    fn macro_instance_arguments_keep_nesting() {
        let tokens = lex("`M((a,b), c)");
        let tree = parse(&tokens).unwrap();
        let instance = tree.child_rules().next().unwrap();
        assert_eq!(instance.rule, VObjectType::PpMacroInstanceWithArgs);
        let args = instance.find(VObjectType::PpMacroActualArgs).unwrap();
        assert_eq!(args.child_rules().count(), 2);
    }

    #[test]
    fn conditionals_and_plain_text() {
        assert_eq!(
            top_rules("`ifdef A\nx\n`else\ny\n`endif\n"),
            vec![
                VObjectType::PpIfdefDirective,
                VObjectType::PpElseDirective,
                VObjectType::PpEndifDirective,
            ]
        );
    }
}
