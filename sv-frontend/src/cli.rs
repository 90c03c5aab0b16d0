use std::path::PathBuf;

use log::warn;

/// Flags clap already understood; carried into [`ParsedArgs`] unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CliFlags {
    pub verbose: bool,
    pub syntax_only: bool,
    pub fail_fast: bool,
    pub pp_output_location: bool,
    pub library: Option<String>,
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, PartialEq)]
pub struct ParsedArgs {
    pub files: Vec<PathBuf>,
    pub include_dirs: Vec<PathBuf>,
    pub defines: Vec<String>,
    pub verbose: bool,
    pub syntax_only: bool,
    pub fail_fast: bool,
    pub pp_output_location: bool,
    pub library: Option<String>,
    pub log_file: Option<PathBuf>,
}

/// Splits VCS-style arguments (`+incdir+`, `+define+`, files) left over
/// after clap handled the regular flags. Both plus options accept several
/// values separated by `+`.
pub fn parse_vcs_style_args(raw_args: Vec<String>, flags: CliFlags) -> Result<ParsedArgs, String> {
    let mut files = Vec::new();
    let mut include_dirs = Vec::new();
    let mut defines = Vec::new();

    for arg in raw_args {
        if let Some(incdir_paths) = arg.strip_prefix("+incdir+") {
            if incdir_paths.is_empty() {
                return Err("Empty path in +incdir+ directive".to_string());
            }
            include_dirs.extend(
                incdir_paths
                    .split('+')
                    .filter(|p| !p.is_empty())
                    .map(PathBuf::from),
            );
        } else if let Some(define_str) = arg.strip_prefix("+define+") {
            if define_str.is_empty() {
                return Err("Empty define in +define+ directive".to_string());
            }
            defines.extend(
                define_str
                    .split('+')
                    .filter(|d| !d.is_empty())
                    .map(str::to_string),
            );
        } else if arg.starts_with('+') {
            // Other VCS-style options that we don't support yet
            warn!("Unsupported VCS option: {}", arg);
        } else if arg.starts_with('-') {
            // Skip clap flags that might have been passed through
            if matches!(
                arg.as_str(),
                "-v" | "--verbose" | "-s" | "--syntax-only" | "--fail-fast"
            ) {
                continue;
            }
            return Err(format!("Unknown option: {}", arg));
        } else {
            files.push(PathBuf::from(arg));
        }
    }

    if files.is_empty() {
        return Err("No input files specified".to_string());
    }

    Ok(ParsedArgs {
        files,
        include_dirs,
        defines,
        verbose: flags.verbose,
        syntax_only: flags.syntax_only,
        fail_fast: flags.fail_fast,
        pp_output_location: flags.pp_output_location,
        library: flags.library,
        log_file: flags.log_file,
    })
}
