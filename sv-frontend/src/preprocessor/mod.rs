//! SystemVerilog preprocessor.
//!
//! The output text keeps one preprocessed line per source line outside of
//! includes. Every directive and macro use is wrapped between a begin marker
//! and an end marker naming its node in the preprocessor [`FileContent`], so
//! the parser can stitch both trees together and recover original positions.

pub mod grammar;
pub mod lexer;
mod listener;
pub mod macros;

use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use log::{debug, info};

use crate::config::Config;
use crate::error::{Diagnostic, ErrorKind, FrontendError, Result};
use crate::file_content::{FileContent, TimeInfo};
use crate::location::{LineMap, LineSection};
use crate::num_utils::parse_uint32;
use crate::session::Session;
use crate::symbols::{PathId, SymbolId};
use crate::vobject::{NodeId, VObject, VObjectType};

use self::listener::Mode;
use self::macros::MacroTable;

pub const PREPROC_BEGIN: &str = "\u{1}PPB\u{1}";
const PREPROC_END_PREFIX: &str = "\u{1}PPE";

pub fn preproc_end_marker(node: NodeId) -> String {
    format!("{PREPROC_END_PREFIX}{}\u{1}", node.raw())
}

/// Node id carried by an end marker.
pub fn parse_preproc_end(text: &str) -> Option<NodeId> {
    let digits = text.strip_prefix(PREPROC_END_PREFIX)?.strip_suffix('\u{1}')?;
    parse_uint32(digits).map(|raw| NodeId::new(raw as usize))
}

/// `` `include `` seen while preprocessing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncludeEdge {
    pub from: PathId,
    pub name: String,
    /// Included file, `None` when it could not be read.
    pub resolved: Option<PathId>,
    pub line: u32,
    pub column: u16,
    pub node: NodeId,
}

/// Compiler directive state from `pp_line` onwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirectiveState {
    pub pp_line: u32,
    pub time_info: TimeInfo,
    pub default_net_type: VObjectType,
}

impl Default for DirectiveState {
    fn default() -> Self {
        Self {
            pp_line: 0,
            time_info: TimeInfo::default(),
            default_net_type: VObjectType::PaNetTypeWire,
        }
    }
}

/// Everything the listeners of one file write into.
pub(crate) struct PpOutput {
    pub(crate) text: String,
    /// Line the next character of `text` lands on.
    pub(crate) line: u32,
    pub(crate) file_content: FileContent,
    pub(crate) line_map: LineMap,
    pub(crate) macros: MacroTable,
    pub(crate) includes: Vec<IncludeEdge>,
    pub(crate) expansion_stack: Vec<String>,
    pub(crate) states: Vec<DirectiveState>,
}

impl PpOutput {
    pub(crate) fn append(&mut self, text: &str) {
        self.line += text.matches('\n').count() as u32;
        self.text.push_str(text);
    }
}

pub(crate) struct IncludeRequest {
    pub from: PathId,
    pub name: String,
    pub node: NodeId,
    pub line: u32,
    pub column: u16,
}

/// Performs `` `include ``: appends the preprocessed included text to `out`
/// and returns the file it came from.
pub(crate) trait IncludeDriver {
    fn include(
        &mut self,
        session: &Session,
        out: &mut PpOutput,
        request: &IncludeRequest,
    ) -> Result<Option<PathId>>;
}

#[derive(Debug, Clone)]
pub struct PreprocessedFile {
    pub file: PathId,
    /// Preprocessed text with markers.
    pub text: String,
    pub file_content: FileContent,
    pub line_map: LineMap,
    pub includes: Vec<IncludeEdge>,
    /// Macros defined at the end of the file.
    pub macros: MacroTable,
    pub directive_states: Vec<DirectiveState>,
}

impl PreprocessedFile {
    /// Preprocessed text without markers, as written by `--write-pp`.
    pub fn stripped_text(&self) -> String {
        let mut out = String::with_capacity(self.text.len());
        let mut rest = self.text.as_str();
        while let Some(start) = rest.find('\u{1}') {
            out.push_str(&rest[..start]);
            let after = &rest[start + 1..];
            match after.find('\u{1}') {
                Some(end) => rest = &after[end + 1..],
                None => {
                    rest = after;
                }
            }
        }
        out.push_str(rest);
        out
    }

    /// Directive state in effect on a preprocessed line.
    pub fn state_at(&self, pp_line: u32) -> DirectiveState {
        self.directive_states
            .iter()
            .rev()
            .find(|s| s.pp_line <= pp_line)
            .copied()
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone)]
pub struct Preprocessor {
    include_dirs: Vec<PathBuf>,
    defines: IndexMap<String, String>,
}

impl Preprocessor {
    pub fn new(include_dirs: Vec<PathBuf>, defines: IndexMap<String, String>) -> Self {
        Self {
            include_dirs,
            defines,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.include_dirs.clone(), config.defines.clone())
    }

    pub fn preprocess_file(&mut self, session: &Session, file_path: &Path) -> Result<PreprocessedFile> {
        let content = fs::read_to_string(file_path).map_err(|source| FrontendError::Io {
            path: file_path.to_path_buf(),
            source,
        })?;
        self.preprocess_content(session, &content, file_path)
    }

    pub fn preprocess_content(
        &mut self,
        session: &Session,
        content: &str,
        file_path: &Path,
    ) -> Result<PreprocessedFile> {
        let file = session.symbols().register_path(&file_path.to_string_lossy());
        let mut macros = MacroTable::new();
        macros.define_all(self.defines.iter().map(|(k, v)| (k.as_str(), v.as_str())));

        let mut file_content = FileContent::new(file, session.config().library.clone(), session.shared_symbols());
        let last_line = content.lines().count().max(1) as u32;
        let last_column = content.lines().last().map_or(0, |l| l.chars().count()) as u16 + 1;
        let top = file_content.add_object(
            VObject::new(SymbolId::BAD, VObjectType::PpTopLevelRule, file, NodeId::INVALID)
                .with_range(1, 1, last_line, last_column),
        );

        let mut out = PpOutput {
            text: String::with_capacity(content.len()),
            line: 1,
            file_content,
            line_map: LineMap::new(file),
            macros,
            includes: Vec::new(),
            expansion_stack: Vec::new(),
            states: Vec::new(),
        };
        let mut resolver = IncludeResolver {
            include_dirs: &self.include_dirs,
            stack: vec![file_path.to_path_buf()],
        };
        listener::run(session, &mut out, &mut resolver, content, file, top, Mode::Record)?;

        info!(
            "preprocessed {} ({} pp nodes, {} macros, {} includes)",
            file_path.display(),
            out.file_content.len(),
            out.macros.len(),
            out.includes.len()
        );
        Ok(PreprocessedFile {
            file,
            text: out.text,
            file_content: out.file_content,
            line_map: out.line_map,
            includes: out.includes,
            macros: out.macros,
            directive_states: out.states,
        })
    }
}

struct IncludeResolver<'p> {
    include_dirs: &'p [PathBuf],
    /// Files being preprocessed, outermost first.
    stack: Vec<PathBuf>,
}

impl IncludeResolver<'_> {
    fn resolve(&self, session: &Session, from: PathId, name: &str) -> Option<PathBuf> {
        // First relative to the including file, then the include dirs.
        let including = Path::new(session.symbols().path(from));
        let local = including.parent().map(|dir| dir.join(name));
        local
            .into_iter()
            .chain(self.include_dirs.iter().map(|dir| dir.join(name)))
            .chain(std::iter::once(PathBuf::from(name)))
            .find(|candidate| candidate.is_file())
    }
}

impl IncludeDriver for IncludeResolver<'_> {
    fn include(
        &mut self,
        session: &Session,
        out: &mut PpOutput,
        request: &IncludeRequest,
    ) -> Result<Option<PathId>> {
        let location = session.location(request.from, request.line, request.column);
        let Some(path) = self.resolve(session, request.from, &request.name) else {
            session.report(
                Diagnostic::new(
                    format!("cannot find include file {}", request.name),
                    ErrorKind::PpIncludeNotFound(request.name.clone()),
                )
                .with_location(location)
                .with_suggestion("check +incdir+ paths"),
            )?;
            return Ok(None);
        };
        if self.stack.iter().any(|p| same_file(p, &path)) {
            session.report(
                Diagnostic::new(
                    format!("include cycle through {}", path.display()),
                    ErrorKind::PpIncludeCycle(request.name.clone()),
                )
                .with_location(location),
            )?;
            return Ok(None);
        }
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) => {
                session.report(
                    Diagnostic::new(
                        format!("cannot read include file {}: {err}", path.display()),
                        ErrorKind::PpIncludeNotFound(request.name.clone()),
                    )
                    .with_location(location),
                )?;
                return Ok(None);
            }
        };

        let file = session.symbols().register_path(&path.to_string_lossy());
        debug!("including {} at pp line {}", path.display(), out.line);
        out.line_map.push(LineSection {
            pp_line: out.line,
            file,
            line: 1,
        });
        self.stack.push(path);
        let result = listener::run(session, out, self, &text, file, request.node, Mode::Record);
        self.stack.pop();
        result?;
        Ok(Some(file))
    }
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn end_marker_round_trip() {
        let marker = preproc_end_marker(NodeId::new(42));
        assert_eq!(parse_preproc_end(&marker), Some(NodeId::new(42)));
        assert_eq!(parse_preproc_end(PREPROC_BEGIN), None);
    }
}
