//! Session configuration, read from TOML and overridden from the command
//! line.

use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::cli::ParsedArgs;
use crate::error::{FrontendError, Result};
use crate::log_listener::DEFAULT_MAX_QUEUED_MESSAGE_COUNT;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Library every design element is registered under (`library@name`).
    pub library: String,
    pub include_dirs: Vec<PathBuf>,
    pub defines: IndexMap<String, String>,
    /// Report locations in the preprocessed text instead of the original
    /// sources.
    pub use_pp_output_location: bool,
    /// Record whitespace tokens as orphan nodes of the parse tree.
    pub keep_whitespace: bool,
    pub fail_fast: bool,
    pub log_file: Option<PathBuf>,
    pub max_queued_log_messages: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            library: "work".to_string(),
            include_dirs: Vec::new(),
            defines: IndexMap::new(),
            use_pp_output_location: false,
            keep_whitespace: false,
            fail_fast: false,
            log_file: None,
            max_queued_log_messages: DEFAULT_MAX_QUEUED_MESSAGE_COUNT,
        }
    }
}

impl Config {
    pub fn from_toml_str(text: &str, origin: &Path) -> Result<Self> {
        toml::from_str(text).map_err(|err| FrontendError::Config {
            path: origin.to_path_buf(),
            message: err.to_string(),
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| FrontendError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text, path)
    }

    /// Command-line values win over the file: include dirs are appended,
    /// defines replace entries of the same name.
    pub fn apply_args(&mut self, args: &ParsedArgs) {
        self.include_dirs.extend(args.include_dirs.iter().cloned());
        for define in &args.defines {
            let (name, value) = match define.split_once('=') {
                Some((name, value)) => (name.to_string(), value.to_string()),
                None => (define.clone(), String::new()),
            };
            self.defines.insert(name, value);
        }
        if args.fail_fast {
            self.fail_fast = true;
        }
        if args.pp_output_location {
            self.use_pp_output_location = true;
        }
        if let Some(library) = &args.library {
            self.library = library.clone();
        }
        if let Some(log_file) = &args.log_file {
            self.log_file = Some(log_file.clone());
        }
    }
}
