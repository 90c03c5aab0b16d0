//! Diagnostics reported while preprocessing, parsing and compiling.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use log::debug;
use parking_lot::Mutex;
use thiserror::Error;

use crate::log_listener::LogListener;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Severity {
    Note,
    Warning,
    Error,
    Fatal,
}

impl Severity {
    fn tag(self) -> &'static str {
        match self {
            Severity::Note => "NTE",
            Severity::Warning => "WRN",
            Severity::Error => "ERR",
            Severity::Fatal => "FAT",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    LexError,
    ParseError,
    PpElseWithoutIf,
    PpElsifWithoutIf,
    PpEndifWithoutIf,
    PpUnterminatedConditional,
    PpUnknownMacro(String),
    PpUndefUnknownMacro(String),
    PpMacroRedefinition(String),
    PpMacroArity(String),
    PpRecursiveMacro(String),
    PpReservedMacroName(String),
    PpIncludeNotFound(String),
    PpIncludeCycle(String),
    PpIllegalLineLevel,
    PpMalformedDirective,
    CompUnknownGenConstruct,
    CompMissingCondition,
    CompMalformedIncrement,
    CompLoopDepth,
    CompDuplicateDefinition(String),
    LogFileOpenFailed,
}

impl ErrorKind {
    pub fn severity(&self) -> Severity {
        match self {
            ErrorKind::PpUndefUnknownMacro(_) => Severity::Note,
            ErrorKind::PpMacroRedefinition(_)
            | ErrorKind::CompUnknownGenConstruct
            | ErrorKind::CompMalformedIncrement
            | ErrorKind::CompDuplicateDefinition(_)
            | ErrorKind::LogFileOpenFailed => Severity::Warning,
            _ => Severity::Error,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::LexError => "PA0101",
            ErrorKind::ParseError => "PA0203",
            ErrorKind::PpElseWithoutIf => "PP0101",
            ErrorKind::PpElsifWithoutIf => "PP0102",
            ErrorKind::PpEndifWithoutIf => "PP0103",
            ErrorKind::PpUnterminatedConditional => "PP0104",
            ErrorKind::PpUnknownMacro(_) => "PP0105",
            ErrorKind::PpUndefUnknownMacro(_) => "PP0106",
            ErrorKind::PpMacroRedefinition(_) => "PP0107",
            ErrorKind::PpMacroArity(_) => "PP0108",
            ErrorKind::PpRecursiveMacro(_) => "PP0109",
            ErrorKind::PpReservedMacroName(_) => "PP0110",
            ErrorKind::PpIncludeNotFound(_) => "PP0111",
            ErrorKind::PpIncludeCycle(_) => "PP0112",
            ErrorKind::PpIllegalLineLevel => "PP0113",
            ErrorKind::PpMalformedDirective => "PP0114",
            ErrorKind::CompUnknownGenConstruct => "CP0301",
            ErrorKind::CompMissingCondition => "CP0302",
            ErrorKind::CompMalformedIncrement => "CP0303",
            ErrorKind::CompLoopDepth => "CP0304",
            ErrorKind::CompDuplicateDefinition(_) => "CP0305",
            ErrorKind::LogFileOpenFailed => "CM0001",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub file: String,
    pub line: u32,   // 1-based
    pub column: u16, // 1-based
}

impl Location {
    pub fn new(file: impl Into<String>, line: u32, column: u16) -> Self {
        Self {
            file: file.into(),
            line,
            column,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub message: String,
    pub kind: ErrorKind,
    pub location: Option<Location>,
    pub suggestions: Vec<String>,
}

impl Diagnostic {
    pub fn new(message: impl Into<String>, kind: ErrorKind) -> Self {
        Self {
            message: message.into(),
            kind,
            location: None,
            suggestions: Vec::new(),
        }
    }

    pub fn with_location(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    pub fn with_suggestions(mut self, suggestions: Vec<String>) -> Self {
        self.suggestions.extend(suggestions);
        self
    }

    pub fn severity(&self) -> Severity {
        self.kind.severity()
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}:{}] ", self.severity().tag(), self.kind.code())?;
        if let Some(location) = &self.location {
            write!(
                f,
                "{}:{}:{}: ",
                location.file, location.line, location.column
            )?;
        }
        write!(f, "{}", self.message)?;

        if !self.suggestions.is_empty() {
            write!(f, " (Suggestions: {})", self.suggestions.join(", "))?;
        }

        Ok(())
    }
}

/// Shared collector for diagnostics of a whole session.
#[derive(Debug, Default)]
pub struct ErrorContainer {
    diagnostics: Mutex<Vec<Diagnostic>>,
    log_listener: Option<Arc<LogListener>>,
}

impl ErrorContainer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_log_listener(listener: Arc<LogListener>) -> Self {
        Self {
            diagnostics: Mutex::new(Vec::new()),
            log_listener: Some(listener),
        }
    }

    pub fn add(&self, diagnostic: Diagnostic) {
        debug!("{}", diagnostic);
        if let Some(listener) = &self.log_listener {
            listener.log(&diagnostic.to_string());
        }
        self.diagnostics.lock().push(diagnostic);
    }

    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics.lock().clone()
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .lock()
            .iter()
            .filter(|d| d.severity() == severity)
            .count()
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .lock()
            .iter()
            .any(|d| d.severity() >= Severity::Error)
    }

    pub fn contains(&self, code: &str) -> bool {
        self.diagnostics.lock().iter().any(|d| d.kind.code() == code)
    }

    pub fn len(&self) -> usize {
        self.diagnostics.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.lock().is_empty()
    }

    pub fn log_listener(&self) -> Option<&Arc<LogListener>> {
        self.log_listener.as_ref()
    }

    pub fn summary(&self) -> String {
        let syntax = self
            .diagnostics
            .lock()
            .iter()
            .filter(|d| matches!(d.kind, ErrorKind::LexError | ErrorKind::ParseError))
            .count();
        format!(
            "[  FATAL] : {}\n[ SYNTAX] : {}\n[  ERROR] : {}\n[WARNING] : {}\n[   NOTE] : {}",
            self.count(Severity::Fatal),
            syntax,
            self.count(Severity::Error),
            self.count(Severity::Warning),
            self.count(Severity::Note),
        )
    }
}

/// Errors that abort processing of a file.
#[derive(Debug, Error)]
pub enum FrontendError {
    #[error("unbalanced preprocessor markers in {file}: {detail}")]
    UnbalancedPreprocMarkers { file: String, detail: String },

    #[error("emission pause count went negative in {file}")]
    NegativePauseCount { file: String },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration {}: {message}", path.display())]
    Config { path: PathBuf, message: String },

    #[error("stopping after first error: {0}")]
    FailFast(Diagnostic),
}

pub type Result<T, E = FrontendError> = std::result::Result<T, E>;
