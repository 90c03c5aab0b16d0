use std::ops::Range;

use chumsky::prelude::*;

use crate::token::{positioned, Token};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PpKind {
    Define,
    Undef,
    Undefineall,
    Ifdef,
    Ifndef,
    Elsif,
    Else,
    Endif,
    Include,
    Line,
    Timescale,
    Resetall,
    DefaultNettype,
    Celldefine,
    Endcelldefine,
    SvFile,
    SvLine,
    /// `` `name`` that is not a directive keyword.
    MacroIdentifier,
    /// `` `" ``
    TickQuote,
    /// ``` `` ```
    TickTick,
    Identifier,
    EscapedIdentifier,
    Number,
    String,
    OneLineComment,
    BlockComment,
    Spaces,
    Cr,
    /// Backslash immediately followed by a newline.
    LineContinuation,
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Comma,
    Equals,
    Lt,
    Gt,
    Other,
}

impl PpKind {
    pub fn is_directive(self) -> bool {
        matches!(
            self,
            PpKind::Define
                | PpKind::Undef
                | PpKind::Undefineall
                | PpKind::Ifdef
                | PpKind::Ifndef
                | PpKind::Elsif
                | PpKind::Else
                | PpKind::Endif
                | PpKind::Include
                | PpKind::Line
                | PpKind::Timescale
                | PpKind::Resetall
                | PpKind::DefaultNettype
                | PpKind::Celldefine
                | PpKind::Endcelldefine
        )
    }
}

pub type PpToken = Token<PpKind>;

/// Names that cannot be used for user macros.
pub const RESERVED_MACRO_NAMES: &[&str] = &[
    "define",
    "undef",
    "undefineall",
    "ifdef",
    "ifndef",
    "elsif",
    "else",
    "endif",
    "include",
    "line",
    "timescale",
    "resetall",
    "default_nettype",
    "celldefine",
    "endcelldefine",
    "unconnected_drive",
    "nounconnected_drive",
    "pragma",
    "begin_keywords",
    "end_keywords",
    "__FILE__",
    "__LINE__",
];

fn directive_kind(name: &str) -> PpKind {
    match name {
        "define" => PpKind::Define,
        "undef" => PpKind::Undef,
        "undefineall" => PpKind::Undefineall,
        "ifdef" => PpKind::Ifdef,
        "ifndef" => PpKind::Ifndef,
        "elsif" => PpKind::Elsif,
        "else" => PpKind::Else,
        "endif" => PpKind::Endif,
        "include" => PpKind::Include,
        "line" => PpKind::Line,
        "timescale" => PpKind::Timescale,
        "resetall" => PpKind::Resetall,
        "default_nettype" => PpKind::DefaultNettype,
        "celldefine" => PpKind::Celldefine,
        "endcelldefine" => PpKind::Endcelldefine,
        "__FILE__" => PpKind::SvFile,
        "__LINE__" => PpKind::SvLine,
        _ => PpKind::MacroIdentifier,
    }
}

fn lexer() -> impl Parser<char, Vec<(PpKind, Range<usize>)>, Error = Simple<char>> {
    let ident_start = filter(|c: &char| c.is_ascii_alphabetic() || *c == '_');
    let ident_rest = filter(|c: &char| c.is_ascii_alphanumeric() || *c == '_' || *c == '$');
    let ident = ident_start.chain(ident_rest.repeated()).collect::<String>();

    let directive = just('`')
        .ignore_then(ident.clone())
        .map(|name| directive_kind(&name));

    let line_continuation = just('\\')
        .then(just('\r').or_not())
        .then(just('\n'))
        .to(PpKind::LineContinuation);

    let escaped_identifier = just('\\')
        .then(filter(|c: &char| !c.is_whitespace()).repeated().at_least(1))
        .to(PpKind::EscapedIdentifier);

    // A backslash-newline ends the comment so that continued macro bodies
    // keep their next line.
    let comment_char = filter(|c: &char| *c != '\n' && *c != '\\')
        .ignored()
        .or(just('\\')
            .then(just('\n').or(just('\r')).not().rewind())
            .ignored());
    let one_line_comment = just("//")
        .then(comment_char.repeated())
        .to(PpKind::OneLineComment);

    let block_comment = just("/*")
        .then(take_until(just("*/")))
        .to(PpKind::BlockComment);

    let string = just('"')
        .then(
            filter(|c: &char| *c != '"' && *c != '\\' && *c != '\n')
                .ignored()
                .or(just('\\').then(any()).ignored())
                .repeated(),
        )
        .then(just('"'))
        .to(PpKind::String);

    let number = filter(|c: &char| c.is_ascii_digit())
        .then(filter(|c: &char| c.is_ascii_alphanumeric() || *c == '_' || *c == '.').repeated())
        .to(PpKind::Number);

    let spaces = one_of(" \t\r\u{c}")
        .repeated()
        .at_least(1)
        .to(PpKind::Spaces);

    let punct = choice((
        just('\n').to(PpKind::Cr),
        just('(').to(PpKind::LParen),
        just(')').to(PpKind::RParen),
        just('[').to(PpKind::LBracket),
        just(']').to(PpKind::RBracket),
        just('{').to(PpKind::LBrace),
        just('}').to(PpKind::RBrace),
        just(',').to(PpKind::Comma),
        just('=').to(PpKind::Equals),
        just('<').to(PpKind::Lt),
        just('>').to(PpKind::Gt),
    ));

    let token = choice((
        just("``").to(PpKind::TickTick),
        just("`\"").to(PpKind::TickQuote),
        directive,
        line_continuation,
        escaped_identifier,
        one_line_comment,
        block_comment,
        string,
        ident.to(PpKind::Identifier),
        number,
        spaces,
        punct,
        any().to(PpKind::Other),
    ))
    .map_with_span(|kind, span: Range<usize>| (kind, span));

    token.repeated().then_ignore(end())
}

pub fn lex(source: &str) -> Vec<PpToken> {
    let lexed = match lexer().parse(source) {
        Ok(lexed) => lexed,
        // The last alternative accepts any char, so this is unreachable in
        // practice; fall back to one opaque token.
        Err(_) => vec![(PpKind::Other, 0..source.chars().count())],
    };
    positioned(source, lexed)
}
