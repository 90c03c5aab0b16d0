//! SystemVerilog tokens of preprocessed text.

use std::ops::Range;

use chumsky::prelude::*;

use crate::token::{positioned, Token};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SvKind {
    // Hidden channel.
    Whitespace,
    Newline,
    OneLineComment,
    BlockComment,
    PreprocBegin,
    PreprocEnd,

    Identifier,
    EscapedIdentifier,
    SystemIdentifier,
    IntConst,
    BasedNumber,
    UnbasedUnsized,
    RealConst,
    StringLiteral,

    Module,
    Macromodule,
    Endmodule,
    Interface,
    Endinterface,
    Primitive,
    Endprimitive,
    Package,
    Endpackage,
    Program,
    Endprogram,
    Class,
    Virtual,
    Endclass,
    Config,
    Endconfig,
    Checker,
    Endchecker,
    Function,
    Endfunction,
    Task,
    Endtask,
    Table,
    Endtable,
    Modport,
    Clocking,
    Endclocking,
    Input,
    Output,
    Inout,
    Ref,
    Wire,
    Uwire,
    Tri,
    Wand,
    Wor,
    Supply0,
    Supply1,
    Logic,
    Reg,
    Bit,
    Int,
    Integer,
    Byte,
    Shortint,
    Longint,
    Real,
    StringKw,
    Signed,
    Unsigned,
    Var,
    Const,
    Parameter,
    Localparam,
    Typedef,
    Import,
    Genvar,
    Generate,
    Endgenerate,
    If,
    Else,
    Case,
    Casex,
    Casez,
    Endcase,
    Default,
    For,
    Begin,
    End,
    Assign,
    Initial,
    Always,
    AlwaysComb,
    AlwaysFf,
    AlwaysLatch,
    Posedge,
    Negedge,
    Or,
    And,
    Nand,
    Nor,
    Xor,
    Xnor,
    Automatic,
    Static,

    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Semi,
    Colon,
    ColonColon,
    Comma,
    Dot,
    DotStar,
    Hash,
    At,
    Question,
    Eq,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    StarStar,
    Shl,
    Shr,
    AShl,
    AShr,
    Lt,
    Le,
    Gt,
    Ge,
    EqEq,
    NotEq,
    CaseEq,
    CaseNeq,
    Amp,
    Pipe,
    Caret,
    TildeCaret,
    TildeAmp,
    TildePipe,
    Tilde,
    Bang,
    AmpAmp,
    PipePipe,
    PlusPlus,
    MinusMinus,
    PlusEq,
    MinusEq,
    StarEq,
    SlashEq,
    PercentEq,
    AmpEq,
    PipeEq,
    CaretEq,
    ShlEq,
    ShrEq,
    AShlEq,
    AShrEq,
    Apostrophe,
    Unknown,
}

impl SvKind {
    /// Tokens the grammar never sees; the parse listener handles them as
    /// orphans.
    pub fn is_hidden(self) -> bool {
        matches!(
            self,
            SvKind::Whitespace
                | SvKind::Newline
                | SvKind::OneLineComment
                | SvKind::BlockComment
                | SvKind::PreprocBegin
                | SvKind::PreprocEnd
        )
    }

    pub fn is_identifier(self) -> bool {
        matches!(self, SvKind::Identifier | SvKind::EscapedIdentifier)
    }
}

pub type SvToken = Token<SvKind>;

fn keyword(word: &str) -> Option<SvKind> {
    let kind = match word {
        "module" => SvKind::Module,
        "macromodule" => SvKind::Macromodule,
        "endmodule" => SvKind::Endmodule,
        "interface" => SvKind::Interface,
        "endinterface" => SvKind::Endinterface,
        "primitive" => SvKind::Primitive,
        "endprimitive" => SvKind::Endprimitive,
        "package" => SvKind::Package,
        "endpackage" => SvKind::Endpackage,
        "program" => SvKind::Program,
        "endprogram" => SvKind::Endprogram,
        "class" => SvKind::Class,
        "virtual" => SvKind::Virtual,
        "endclass" => SvKind::Endclass,
        "config" => SvKind::Config,
        "endconfig" => SvKind::Endconfig,
        "checker" => SvKind::Checker,
        "endchecker" => SvKind::Endchecker,
        "function" => SvKind::Function,
        "endfunction" => SvKind::Endfunction,
        "task" => SvKind::Task,
        "endtask" => SvKind::Endtask,
        "table" => SvKind::Table,
        "endtable" => SvKind::Endtable,
        "modport" => SvKind::Modport,
        "clocking" => SvKind::Clocking,
        "endclocking" => SvKind::Endclocking,
        "input" => SvKind::Input,
        "output" => SvKind::Output,
        "inout" => SvKind::Inout,
        "ref" => SvKind::Ref,
        "wire" => SvKind::Wire,
        "uwire" => SvKind::Uwire,
        "tri" => SvKind::Tri,
        "wand" => SvKind::Wand,
        "wor" => SvKind::Wor,
        "supply0" => SvKind::Supply0,
        "supply1" => SvKind::Supply1,
        "logic" => SvKind::Logic,
        "reg" => SvKind::Reg,
        "bit" => SvKind::Bit,
        "int" => SvKind::Int,
        "integer" => SvKind::Integer,
        "byte" => SvKind::Byte,
        "shortint" => SvKind::Shortint,
        "longint" => SvKind::Longint,
        "real" => SvKind::Real,
        "string" => SvKind::StringKw,
        "signed" => SvKind::Signed,
        "unsigned" => SvKind::Unsigned,
        "var" => SvKind::Var,
        "const" => SvKind::Const,
        "parameter" => SvKind::Parameter,
        "localparam" => SvKind::Localparam,
        "typedef" => SvKind::Typedef,
        "import" => SvKind::Import,
        "genvar" => SvKind::Genvar,
        "generate" => SvKind::Generate,
        "endgenerate" => SvKind::Endgenerate,
        "if" => SvKind::If,
        "else" => SvKind::Else,
        "case" => SvKind::Case,
        "casex" => SvKind::Casex,
        "casez" => SvKind::Casez,
        "endcase" => SvKind::Endcase,
        "default" => SvKind::Default,
        "for" => SvKind::For,
        "begin" => SvKind::Begin,
        "end" => SvKind::End,
        "assign" => SvKind::Assign,
        "initial" => SvKind::Initial,
        "always" => SvKind::Always,
        "always_comb" => SvKind::AlwaysComb,
        "always_ff" => SvKind::AlwaysFf,
        "always_latch" => SvKind::AlwaysLatch,
        "posedge" => SvKind::Posedge,
        "negedge" => SvKind::Negedge,
        "or" => SvKind::Or,
        "and" => SvKind::And,
        "nand" => SvKind::Nand,
        "nor" => SvKind::Nor,
        "xor" => SvKind::Xor,
        "xnor" => SvKind::Xnor,
        "automatic" => SvKind::Automatic,
        "static" => SvKind::Static,
        _ => return None,
    };
    Some(kind)
}

fn lexer() -> impl Parser<char, Vec<(SvKind, Range<usize>)>, Error = Simple<char>> {
    let marker_begin = just("\u{1}PPB\u{1}").to(SvKind::PreprocBegin);
    let marker_end = just("\u{1}PPE")
        .then(filter(|c: &char| c.is_ascii_digit()).repeated().at_least(1))
        .then(just('\u{1}'))
        .to(SvKind::PreprocEnd);

    let whitespace = one_of(" \t\r\u{c}")
        .repeated()
        .at_least(1)
        .to(SvKind::Whitespace);
    let newline = just('\n').to(SvKind::Newline);
    let one_line_comment = just("//")
        .then(filter(|c: &char| *c != '\n').repeated())
        .to(SvKind::OneLineComment);
    let block_comment = just("/*")
        .then(take_until(just("*/")))
        .to(SvKind::BlockComment);

    let string = just('"')
        .then(
            filter(|c: &char| *c != '"' && *c != '\\' && *c != '\n')
                .ignored()
                .or(just('\\').then(any()).ignored())
                .repeated(),
        )
        .then(just('"'))
        .to(SvKind::StringLiteral);

    let ident_rest = filter(|c: &char| c.is_ascii_alphanumeric() || *c == '_' || *c == '$');
    let word = filter(|c: &char| c.is_ascii_alphabetic() || *c == '_')
        .chain(ident_rest.repeated())
        .collect::<String>()
        .map(|word| keyword(&word).unwrap_or(SvKind::Identifier));
    let system_identifier = just('$')
        .then(ident_rest.repeated().at_least(1))
        .to(SvKind::SystemIdentifier);
    let escaped_identifier = just('\\')
        .then(filter(|c: &char| !c.is_whitespace()).repeated().at_least(1))
        .to(SvKind::EscapedIdentifier);

    let digits = filter(|c: &char| c.is_ascii_digit())
        .then(filter(|c: &char| c.is_ascii_digit() || *c == '_').repeated());
    let spacing = one_of(" \t").repeated();
    let based = digits
        .clone()
        .then(spacing.clone())
        .or_not()
        .then(just('\''))
        .then(one_of("sS").or_not())
        .then(one_of("bBoOdDhH"))
        .then(spacing)
        .then(
            filter(|c: &char| c.is_ascii_hexdigit() || matches!(c, 'x' | 'X' | 'z' | 'Z' | '?' | '_'))
                .repeated()
                .at_least(1),
        )
        .to(SvKind::BasedNumber);
    let unbased = just('\'')
        .then(one_of("01xXzZ"))
        .then(ident_rest.not().rewind().ignored().or(end()))
        .to(SvKind::UnbasedUnsized);
    let exponent = one_of("eE").then(one_of("+-").or_not()).then(digits.clone());
    let real = digits
        .clone()
        .then(just('.').then(digits.clone()).ignored().then(exponent.clone().or_not()).ignored()
            .or(exponent.ignored()))
        .to(SvKind::RealConst);
    let int = digits.to(SvKind::IntConst);

    let compound = choice((
        just("<<<=").to(SvKind::AShlEq),
        just(">>>=").to(SvKind::AShrEq),
        just("===").to(SvKind::CaseEq),
        just("!==").to(SvKind::CaseNeq),
        just("<<<").to(SvKind::AShl),
        just(">>>").to(SvKind::AShr),
        just("<<=").to(SvKind::ShlEq),
        just(">>=").to(SvKind::ShrEq),
        just("**").to(SvKind::StarStar),
        just("<<").to(SvKind::Shl),
        just(">>").to(SvKind::Shr),
        just("<=").to(SvKind::Le),
        just(">=").to(SvKind::Ge),
        just("==").to(SvKind::EqEq),
        just("!=").to(SvKind::NotEq),
        just("&&").to(SvKind::AmpAmp),
        just("||").to(SvKind::PipePipe),
        just("++").to(SvKind::PlusPlus),
        just("--").to(SvKind::MinusMinus),
        just("+=").to(SvKind::PlusEq),
        just("-=").to(SvKind::MinusEq),
        just("*=").to(SvKind::StarEq),
        just("/=").to(SvKind::SlashEq),
        just("%=").to(SvKind::PercentEq),
    ));
    let compound2 = choice((
        just("&=").to(SvKind::AmpEq),
        just("|=").to(SvKind::PipeEq),
        just("^=").to(SvKind::CaretEq),
        just("~&").to(SvKind::TildeAmp),
        just("~|").to(SvKind::TildePipe),
        just("~^").to(SvKind::TildeCaret),
        just("^~").to(SvKind::TildeCaret),
        just("::").to(SvKind::ColonColon),
        just(".*").to(SvKind::DotStar),
    ));
    let single = choice((
        just('(').to(SvKind::LParen),
        just(')').to(SvKind::RParen),
        just('[').to(SvKind::LBracket),
        just(']').to(SvKind::RBracket),
        just('{').to(SvKind::LBrace),
        just('}').to(SvKind::RBrace),
        just(';').to(SvKind::Semi),
        just(':').to(SvKind::Colon),
        just(',').to(SvKind::Comma),
        just('.').to(SvKind::Dot),
        just('#').to(SvKind::Hash),
        just('@').to(SvKind::At),
        just('?').to(SvKind::Question),
    ));
    let operator = choice((
        just('=').to(SvKind::Eq),
        just('+').to(SvKind::Plus),
        just('-').to(SvKind::Minus),
        just('*').to(SvKind::Star),
        just('/').to(SvKind::Slash),
        just('%').to(SvKind::Percent),
        just('<').to(SvKind::Lt),
        just('>').to(SvKind::Gt),
        just('&').to(SvKind::Amp),
        just('|').to(SvKind::Pipe),
        just('^').to(SvKind::Caret),
        just('~').to(SvKind::Tilde),
        just('!').to(SvKind::Bang),
    ));

    let token = choice((
        marker_begin,
        marker_end,
        whitespace,
        newline,
        one_line_comment,
        block_comment,
        string,
        system_identifier,
        escaped_identifier,
        based,
        unbased,
        real,
        int,
        word,
        compound,
        compound2,
        single,
        operator,
        just('\'').to(SvKind::Apostrophe),
        any().to(SvKind::Unknown),
    ))
    .map_with_span(|kind, span: Range<usize>| (kind, span));

    token.repeated().then_ignore(end())
}

pub fn lex(source: &str) -> Vec<SvToken> {
    let lexed = match lexer().parse(source) {
        Ok(lexed) => lexed,
        Err(_) => vec![(SvKind::Unknown, 0..source.chars().count())],
    };
    positioned(source, lexed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn visible(source: &str) -> Vec<SvKind> {
        lex(source)
            .into_iter()
            .map(|t| t.kind)
            .filter(|k| !k.is_hidden())
            .collect()
    }

    #[test]
    fn keywords_and_identifiers() {
        assert_eq!(
            visible("module m_1; endmodule"),
            vec![SvKind::Module, SvKind::Identifier, SvKind::Semi, SvKind::Endmodule]
        );
    }

    #[test]
    fn numbers() {
        assert_eq!(
            visible("8'hFF 'b1 4 'sd3 '0 1.5 12"),
            vec![
                SvKind::BasedNumber,
                SvKind::BasedNumber,
                SvKind::BasedNumber,
                SvKind::UnbasedUnsized,
                SvKind::RealConst,
                SvKind::IntConst
            ]
        );
    }

    #[test]
    fn markers_are_hidden() {
        let tokens = lex("a\u{1}PPB\u{1}(1+2)\u{1}PPE12\u{1};");
        assert_eq!(tokens[1].kind, SvKind::PreprocBegin);
        assert_eq!(tokens[7].kind, SvKind::PreprocEnd);
        assert_eq!(tokens[7].text, "\u{1}PPE12\u{1}");
    }

    #[test]
    fn operators_take_the_longest_match() {
        assert_eq!(
            visible("a <<<= b !== c ~^ d"),
            vec![
                SvKind::Identifier,
                SvKind::AShlEq,
                SvKind::Identifier,
                SvKind::CaseNeq,
                SvKind::Identifier,
                SvKind::TildeCaret,
                SvKind::Identifier
            ]
        );
    }

    #[test]
    fn single_character_punctuation() {
        assert_eq!(
            visible("( ) [ ] { } ; : , . # @ ? = + - * / % < > & | ^ ~ !"),
            vec![
                SvKind::LParen,
                SvKind::RParen,
                SvKind::LBracket,
                SvKind::RBracket,
                SvKind::LBrace,
                SvKind::RBrace,
                SvKind::Semi,
                SvKind::Colon,
                SvKind::Comma,
                SvKind::Dot,
                SvKind::Hash,
                SvKind::At,
                SvKind::Question,
                SvKind::Eq,
                SvKind::Plus,
                SvKind::Minus,
                SvKind::Star,
                SvKind::Slash,
                SvKind::Percent,
                SvKind::Lt,
                SvKind::Gt,
                SvKind::Amp,
                SvKind::Pipe,
                SvKind::Caret,
                SvKind::Tilde,
                SvKind::Bang
            ]
        );
    }
}
