//! SystemVerilog parsing of preprocessed text into a parse [`FileContent`].

pub mod grammar;
pub mod lexer;
mod listener;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chumsky::error::{Simple, SimpleReason};
use indexmap::IndexMap;
use log::{debug, info};

use crate::config::Config;
use crate::error::{Diagnostic, ErrorKind, Result};
use crate::file_content::FileContent;
use crate::location::{LocationMapper, OffsetMap};
use crate::parse_tree::walk;
use crate::preprocessor::{PreprocessedFile, Preprocessor};
use crate::session::Session;
use crate::symbols::PathId;
use crate::vobject::NodeId;

use self::lexer::{lex, SvKind, SvToken};
use self::listener::ParseListener;

pub use self::listener::{collect_line_ranges, is_unary_operator, normalize_string_literal};

/// Everything known about one parsed file.
#[derive(Debug, Clone)]
pub struct ParsedFile {
    pub file: PathId,
    pub file_content: FileContent,
    pub preprocessed: PreprocessedFile,
    /// Column corrections of the preprocessed text.
    pub offsets: OffsetMap,
}

impl ParsedFile {
    pub fn mapper(&self, use_pp_output_location: bool) -> LocationMapper<'_> {
        LocationMapper {
            offsets: &self.offsets,
            lines: &self.preprocessed.line_map,
            pp_file: self.file,
            use_pp_output_location,
        }
    }

    pub fn line_ranges(&self, root: NodeId) -> BTreeMap<u32, (u16, u16)> {
        collect_line_ranges(&self.file_content, root)
    }
}

pub struct SystemVerilogParser {
    preprocessor: Preprocessor,
}

impl SystemVerilogParser {
    pub fn new(include_dirs: Vec<PathBuf>, initial_macros: IndexMap<String, String>) -> Self {
        Self {
            preprocessor: Preprocessor::new(include_dirs, initial_macros),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            preprocessor: Preprocessor::from_config(config),
        }
    }

    pub fn parse_file(&mut self, session: &Session, file_path: &Path) -> Result<ParsedFile> {
        // First preprocess the file
        let preprocessed = self.preprocessor.preprocess_file(session, file_path)?;

        // Then parse the preprocessed text
        self.parse_preprocessed(session, preprocessed)
    }

    pub fn parse_content(
        &mut self,
        session: &Session,
        content: &str,
        file_path: &Path,
    ) -> Result<ParsedFile> {
        let preprocessed = self
            .preprocessor
            .preprocess_content(session, content, file_path)?;
        self.parse_preprocessed(session, preprocessed)
    }

    pub fn parse_preprocessed(
        &self,
        session: &Session,
        preprocessed: PreprocessedFile,
    ) -> Result<ParsedFile> {
        let file_name = session.symbols().path(preprocessed.file).to_string();
        let tokens = lex(&preprocessed.text);
        let markers = listener::match_markers(&tokens, &file_name)?;
        let offsets = listener::compute_offsets(&tokens, &markers, &preprocessed.file_content);
        debug!("{file_name}: {} tokens", tokens.len());

        let (tree, errors) = grammar::parse(&tokens);
        let mapper = LocationMapper {
            offsets: &offsets,
            lines: &preprocessed.line_map,
            pp_file: preprocessed.file,
            use_pp_output_location: session.config().use_pp_output_location,
        };
        report_lex_errors(session, &tokens, &mapper)?;
        report_parse_errors(session, &tokens, &errors, &mapper)?;

        let file_content = match tree {
            Some(tree) => {
                let mut listener = ParseListener::new(session, &preprocessed, &tokens, &markers);
                walk(&mut listener, &tree)?;
                listener.finish(&offsets)?
            }
            None => FileContent::new(
                preprocessed.file,
                session.config().library.clone(),
                session.shared_symbols(),
            ),
        };
        info!(
            "parsed {file_name} ({} nodes, {} design elements)",
            file_content.len(),
            file_content.design_elements().len()
        );
        Ok(ParsedFile {
            file: preprocessed.file,
            file_content,
            preprocessed,
            offsets,
        })
    }
}

fn location_of(
    session: &Session,
    mapper: &LocationMapper<'_>,
    tokens: &[SvToken],
    index: usize,
) -> crate::error::Location {
    let (line, column) = match tokens.get(index) {
        Some(token) => (token.line, token.column),
        None => tokens
            .last()
            .map_or((1, 1), |t| (t.end_line, t.end_column)),
    };
    let (file, line, column) = mapper.map(line, column);
    session.location(file, line, column)
}

fn report_lex_errors(session: &Session, tokens: &[SvToken], mapper: &LocationMapper<'_>) -> Result<()> {
    for (index, token) in tokens.iter().enumerate() {
        if token.kind == SvKind::Unknown {
            session.report(
                Diagnostic::new(
                    format!("unexpected character sequence '{}'", token.text.trim()),
                    ErrorKind::LexError,
                )
                .with_location(location_of(session, mapper, tokens, index)),
            )?;
        }
    }
    Ok(())
}

fn report_parse_errors(
    session: &Session,
    tokens: &[SvToken],
    errors: &[Simple<SvKind>],
    mapper: &LocationMapper<'_>,
) -> Result<()> {
    let mut located: Vec<(crate::error::Location, String, Vec<String>)> = errors
        .iter()
        .map(|error| {
            let (message, suggestions) = convert_chumsky_error(error, tokens);
            let location = location_of(session, mapper, tokens, error.span().start);
            (location, message, suggestions)
        })
        .collect();
    // Sort errors by location for better presentation
    located.sort_by(|a, b| (a.0.line, a.0.column).cmp(&(b.0.line, b.0.column)));

    for (location, message, suggestions) in located {
        session.report(
            Diagnostic::new(message, ErrorKind::ParseError)
                .with_location(location)
                .with_suggestions(suggestions),
        )?;
    }
    Ok(())
}

fn describe(kind: Option<&SvKind>) -> String {
    match kind {
        Some(kind) => format!("{kind:?}"),
        None => "end of input".to_string(),
    }
}

fn convert_chumsky_error(error: &Simple<SvKind>, tokens: &[SvToken]) -> (String, Vec<String>) {
    match error.reason() {
        SimpleReason::Unexpected => {
            let found = match tokens.get(error.span().start) {
                Some(token) if error.found().is_some() => format!("'{}'", token.text),
                _ => describe(error.found()),
            };
            let mut expected: Vec<String> = error.expected().map(|e| describe(e.as_ref())).collect();
            expected.sort();
            expected.dedup();

            let mut suggestions = Vec::new();
            if error.expected().any(|e| e == &Some(SvKind::Semi)) {
                suggestions.push("Add ';' to complete the statement".to_string());
            }
            if error.expected().any(|e| e == &Some(SvKind::Endmodule)) {
                suggestions.push("Add 'endmodule' to close the module".to_string());
            }
            let message = if expected.is_empty() {
                format!("Unexpected {found}")
            } else {
                format!("Unexpected {found}, expected {}", expected.join(", "))
            };
            (message, suggestions)
        }
        SimpleReason::Unclosed { delimiter, .. } => (
            format!("Unclosed delimiter {delimiter:?}"),
            vec![format!("Add the closing counterpart of {delimiter:?}")],
        ),
        SimpleReason::Custom(msg) => (msg.clone(), Vec::new()),
    }
}
