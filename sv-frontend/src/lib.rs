pub mod cli;
pub mod compile;
pub mod config;
pub mod design;
pub mod error;
pub mod file_content;
pub mod location;
pub mod log_listener;
pub mod num_utils;
pub mod parse_tree;
pub mod parser;
pub mod precompiled;
pub mod preprocessor;
pub mod session;
pub mod symbols;
pub mod token;
pub mod vobject;

pub use cli::{parse_vcs_style_args, CliFlags, ParsedArgs};
pub use compile::{compile_design, CompileHelper, Design};
pub use config::Config;
pub use error::{Diagnostic, ErrorKind, FrontendError, Result, Severity};
pub use file_content::FileContent;
pub use parser::{ParsedFile, SystemVerilogParser};
pub use preprocessor::Preprocessor;
pub use session::Session;
pub use vobject::{NodeId, VObject, VObjectType};
