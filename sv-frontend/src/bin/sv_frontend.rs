use std::fs;
use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use clap::Parser;
use design_ir::Serializer;
use log::{debug, error, info};
use sv_frontend::{
    compile_design, parse_vcs_style_args, CliFlags, Config, Session, SystemVerilogParser,
};

#[derive(Parser)]
#[command(name = "sv-frontend")]
#[command(about = "Preprocesses, parses and compiles SystemVerilog sources.")]
#[command(version)]
#[command(disable_help_flag = true)]
struct Cli {
    /// All arguments (mix of +incdir+, +define+ options and files)
    #[arg(allow_hyphen_values = true)]
    args: Vec<String>,

    /// Show help information
    #[arg(long = "help", short = 'h', action = clap::ArgAction::Help)]
    help: Option<bool>,

    /// Verbose output (debug logging)
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,

    /// Stop after parsing
    #[arg(short = 's', long = "syntax-only")]
    syntax_only: bool,

    /// TOML configuration file
    #[arg(long = "config")]
    config: Option<PathBuf>,

    /// Write the design IR as JSON to this file
    #[arg(long = "dump-ir")]
    dump_ir: Option<PathBuf>,

    /// Write each preprocessed file next to its source with a `.pp` suffix
    #[arg(long = "write-pp")]
    write_pp: bool,

    /// Also write diagnostics to this file
    #[arg(long = "log-file")]
    log_file: Option<PathBuf>,

    /// Library the design elements are registered under
    #[arg(long = "lib")]
    library: Option<String>,

    /// Stop at the first error
    #[arg(long = "fail-fast")]
    fail_fast: bool,

    /// Report locations in the preprocessed text
    #[arg(long = "pp-output-location")]
    pp_output_location: bool,
}

fn main() {
    let cli = Cli::parse();

    let mut logger = env_logger::Builder::from_env(
        env_logger::Env::new()
            .filter_or("SV_FRONTEND_LOG", "warn")
            .write_style("SV_FRONTEND_LOG_STYLE"),
    );
    if cli.verbose {
        logger.filter_level(log::LevelFilter::Debug);
    }
    logger.init();

    match run(cli) {
        Ok(true) => process::exit(0),
        Ok(false) => process::exit(1),
        Err(err) => {
            error!("{err:#}");
            eprintln!("Error: {err:#}");
            process::exit(2);
        }
    }
}

fn run(cli: Cli) -> Result<bool> {
    let flags = CliFlags {
        verbose: cli.verbose,
        syntax_only: cli.syntax_only,
        fail_fast: cli.fail_fast,
        pp_output_location: cli.pp_output_location,
        library: cli.library,
        log_file: cli.log_file,
    };
    let args = match parse_vcs_style_args(cli.args, flags) {
        Ok(args) => args,
        Err(err) => {
            eprintln!("Error: {err}");
            eprintln!();
            eprintln!("Usage: sv-frontend [OPTIONS] [+incdir+<path>]... [+define+<macro>[=<value>]]... <file>...");
            return Ok(false);
        }
    };

    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    config.apply_args(&args);
    debug!("configuration: {config:?}");

    let session = Session::new(config);
    let mut parser = SystemVerilogParser::from_config(session.config());
    let mut parsed = Vec::with_capacity(args.files.len());
    for file in &args.files {
        info!("parsing {}", file.display());
        let result = parser
            .parse_file(&session, file)
            .with_context(|| format!("while parsing {}", file.display()))?;
        if cli.write_pp {
            let mut target = file.clone().into_os_string();
            target.push(".pp");
            fs::write(&target, result.preprocessed.stripped_text())
                .with_context(|| format!("cannot write {}", PathBuf::from(&target).display()))?;
        }
        parsed.push(result);
    }

    if !args.syntax_only {
        let mut serializer = Serializer::new();
        let design = compile_design(&session, &parsed, &mut serializer)?;
        info!("{} definitions compiled", design.definitions().count());
        if let Some(path) = &cli.dump_ir {
            let json = serializer.to_json()?;
            fs::write(path, json).with_context(|| format!("cannot write {}", path.display()))?;
        }
    }

    let errors = session.errors();
    if !errors.is_empty() {
        eprintln!("{}", errors.summary());
    }
    session.log_listener().flush();
    Ok(!errors.has_errors())
}
