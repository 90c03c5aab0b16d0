use std::sync::Arc;

use log::warn;

use crate::config::Config;
use crate::error::{Diagnostic, ErrorContainer, ErrorKind, FrontendError, Location, Result, Severity};
use crate::log_listener::LogListener;
use crate::precompiled::Precompiled;
use crate::symbols::{PathId, SymbolTable};

/// State shared by every file of one run: configuration, interned names and
/// collected diagnostics.
#[derive(Debug)]
pub struct Session {
    config: Config,
    symbols: Arc<SymbolTable>,
    errors: ErrorContainer,
    precompiled: Precompiled,
    log_listener: Arc<LogListener>,
}

impl Session {
    pub fn new(config: Config) -> Self {
        let log_listener = Arc::new(LogListener::with_max_queued(
            config.max_queued_log_messages,
        ));
        let errors = ErrorContainer::with_log_listener(Arc::clone(&log_listener));
        if let Some(path) = &config.log_file {
            if log_listener.initialize(path).failed() {
                warn!("log file {} could not be opened", path.display());
                errors.add(Diagnostic::new(
                    format!("cannot open log file {}", path.display()),
                    ErrorKind::LogFileOpenFailed,
                ));
            }
        }
        Self {
            config,
            symbols: Arc::new(SymbolTable::new()),
            errors,
            precompiled: Precompiled::new(),
            log_listener,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    /// Shared handle for file contents built in this session.
    pub fn shared_symbols(&self) -> Arc<SymbolTable> {
        Arc::clone(&self.symbols)
    }

    pub fn errors(&self) -> &ErrorContainer {
        &self.errors
    }

    pub fn precompiled(&self) -> &Precompiled {
        &self.precompiled
    }

    pub fn log_listener(&self) -> &Arc<LogListener> {
        &self.log_listener
    }

    pub fn location(&self, file: PathId, line: u32, column: u16) -> Location {
        Location::new(self.symbols.path(file), line, column)
    }

    /// Records a diagnostic. With `fail_fast` set, the first error turns
    /// into a fatal one.
    pub fn report(&self, diagnostic: Diagnostic) -> Result<()> {
        let stop = self.config.fail_fast && diagnostic.severity() >= Severity::Error;
        if stop {
            self.errors.add(diagnostic.clone());
            return Err(FrontendError::FailFast(diagnostic));
        }
        self.errors.add(diagnostic);
        Ok(())
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(Config::default())
    }
}
