//! Positioned tokens shared by both lexers.

use std::ops::Range;

/// A lexed token. Lines and columns are 1-based, the end column is
/// exclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<K> {
    pub kind: K,
    pub text: String,
    pub line: u32,
    pub column: u16,
    pub end_line: u32,
    pub end_column: u16,
}

impl<K> Token<K> {
    pub fn newline_count(&self) -> usize {
        self.text.matches('\n').count()
    }
}

/// Attaches text and positions to the spans produced by a lexer. Spans are
/// char offsets and are expected to cover `source` contiguously.
pub(crate) fn positioned<K>(source: &str, lexed: Vec<(K, Range<usize>)>) -> Vec<Token<K>> {
    let chars: Vec<char> = source.chars().collect();
    let mut tokens = Vec::with_capacity(lexed.len());
    let mut line = 1u32;
    let mut column = 1u32;
    let mut cursor = 0usize;

    for (kind, span) in lexed {
        // Catch up on anything the lexer skipped.
        for c in &chars[cursor.min(chars.len())..span.start.min(chars.len())] {
            advance(*c, &mut line, &mut column);
        }
        let (start_line, start_column) = (line, column);
        let end = span.end.min(chars.len());
        let text: String = chars[span.start.min(end)..end].iter().collect();
        for c in text.chars() {
            advance(c, &mut line, &mut column);
        }
        cursor = end;
        tokens.push(Token {
            kind,
            text,
            line: start_line,
            column: clamp_column(start_column),
            end_line: line,
            end_column: clamp_column(column),
        });
    }
    tokens
}

fn advance(c: char, line: &mut u32, column: &mut u32) {
    if c == '\n' {
        *line += 1;
        *column = 1;
    } else {
        *column += 1;
    }
}

fn clamp_column(column: u32) -> u16 {
    column.min(u16::MAX as u32) as u16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positions_follow_newlines() {
        let tokens = positioned("ab\n c", vec![(0, 0..2), (1, 2..3), (2, 3..4), (3, 4..5)]);
        assert_eq!((tokens[0].line, tokens[0].column), (1, 1));
        assert_eq!((tokens[0].end_line, tokens[0].end_column), (1, 3));
        assert_eq!((tokens[1].end_line, tokens[1].end_column), (2, 1));
        assert_eq!((tokens[3].line, tokens[3].column), (2, 2));
        assert_eq!(tokens[3].text, "c");
    }
}
