use std::fs;
use std::path::{Path, PathBuf};

use sv_frontend::{parse_vcs_style_args, CliFlags, Config, FrontendError};
use tempfile::TempDir;

mod common;
use common::TestHarness;

fn args(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

#[test]
fn test_parse_simple_file() {
    let result = parse_vcs_style_args(args(&["test.sv"]), CliFlags::default()).unwrap();

    assert_eq!(result.files, vec![PathBuf::from("test.sv")]);
    assert_eq!(result.include_dirs, Vec::<PathBuf>::new());
    assert_eq!(result.defines, Vec::<String>::new());
    assert!(!result.verbose);
    assert!(!result.syntax_only);
    assert!(!result.fail_fast);
    assert_eq!(result.library, None);
}

#[test]
fn test_parse_incdir_with_several_paths() {
    let result = parse_vcs_style_args(
        args(&["+incdir+/one+/two", "+incdir+/three", "test.sv"]),
        CliFlags::default(),
    )
    .unwrap();

    assert_eq!(
        result.include_dirs,
        vec![
            PathBuf::from("/one"),
            PathBuf::from("/two"),
            PathBuf::from("/three")
        ]
    );
}

#[test]
fn test_parse_defines() {
    let result = parse_vcs_style_args(
        args(&["+define+DEBUG=1+VERBOSE", "+define+MODE=test", "test.sv"]),
        CliFlags::default(),
    )
    .unwrap();

    assert_eq!(result.defines, vec!["DEBUG=1", "VERBOSE", "MODE=test"]);
}

#[test]
fn test_flags_are_carried_over() {
    let flags = CliFlags {
        verbose: true,
        syntax_only: true,
        fail_fast: true,
        pp_output_location: true,
        library: Some("lib2".to_string()),
        log_file: Some(PathBuf::from("run.log")),
    };
    let result = parse_vcs_style_args(args(&["-v", "a.sv", "b.sv"]), flags).unwrap();

    assert_eq!(result.files, vec![PathBuf::from("a.sv"), PathBuf::from("b.sv")]);
    assert!(result.verbose);
    assert!(result.syntax_only);
    assert!(result.fail_fast);
    assert!(result.pp_output_location);
    assert_eq!(result.library.as_deref(), Some("lib2"));
    assert_eq!(result.log_file, Some(PathBuf::from("run.log")));
}

#[test]
fn test_rejected_arguments() {
    let no_files = parse_vcs_style_args(args(&["+define+A"]), CliFlags::default());
    assert_eq!(no_files.unwrap_err(), "No input files specified");

    let empty_incdir = parse_vcs_style_args(args(&["+incdir+", "a.sv"]), CliFlags::default());
    assert!(empty_incdir.unwrap_err().contains("+incdir+"));

    let empty_define = parse_vcs_style_args(args(&["+define+", "a.sv"]), CliFlags::default());
    assert!(empty_define.unwrap_err().contains("+define+"));

    let unknown = parse_vcs_style_args(args(&["--bogus", "a.sv"]), CliFlags::default());
    assert_eq!(unknown.unwrap_err(), "Unknown option: --bogus");
}

#[test]
fn test_unsupported_plus_options_are_ignored() {
    let result =
        parse_vcs_style_args(args(&["+libext+.v", "test.sv"]), CliFlags::default()).unwrap();
    assert_eq!(result.files, vec![PathBuf::from("test.sv")]);
}

#[test]
fn test_config_from_toml() {
    let config = Config::from_toml_str(
        r#"
library = "rtl"
include_dirs = ["inc", "/abs/inc"]
keep_whitespace = true
max_queued_log_messages = 8

[defines]
WIDTH = "8"
DEBUG = ""
"#,
        Path::new("frontend.toml"),
    )
    .unwrap();

    assert_eq!(config.library, "rtl");
    assert_eq!(
        config.include_dirs,
        vec![PathBuf::from("inc"), PathBuf::from("/abs/inc")]
    );
    assert!(config.keep_whitespace);
    assert!(!config.fail_fast);
    assert_eq!(config.max_queued_log_messages, 8);
    let defines: Vec<_> = config
        .defines
        .iter()
        .map(|(name, value)| (name.as_str(), value.as_str()))
        .collect();
    assert_eq!(defines, vec![("WIDTH", "8"), ("DEBUG", "")]);
}

#[test]
fn test_config_defaults_and_errors() {
    let config = Config::from_toml_str("", Path::new("empty.toml")).unwrap();
    assert_eq!(config, Config::default());
    assert_eq!(config.library, "work");
    assert_eq!(config.max_queued_log_messages, 100);

    let err = Config::from_toml_str("library = 3", Path::new("bad.toml")).unwrap_err();
    assert!(matches!(err, FrontendError::Config { .. }));

    let err = Config::load(Path::new("/definitely/not/here.toml")).unwrap_err();
    assert!(matches!(err, FrontendError::Io { .. }));
}

#[test]
fn test_config_load_from_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("frontend.toml");
    fs::write(&path, "fail_fast = true\n").unwrap();
    let config = Config::load(&path).unwrap();
    assert!(config.fail_fast);
}

#[test]
fn test_command_line_overrides_config() {
    let mut config = Config::from_toml_str(
        "include_dirs = [\"inc\"]\n[defines]\nA = \"1\"\nB = \"2\"\n",
        Path::new("frontend.toml"),
    )
    .unwrap();
    let flags = CliFlags {
        library: Some("other".to_string()),
        fail_fast: true,
        ..CliFlags::default()
    };
    let parsed = parse_vcs_style_args(
        args(&["+incdir+more", "+define+A=3+C", "top.sv"]),
        flags,
    )
    .unwrap();
    config.apply_args(&parsed);

    assert_eq!(
        config.include_dirs,
        vec![PathBuf::from("inc"), PathBuf::from("more")]
    );
    assert_eq!(config.defines.get("A").map(String::as_str), Some("3"));
    assert_eq!(config.defines.get("B").map(String::as_str), Some("2"));
    assert_eq!(config.defines.get("C").map(String::as_str), Some(""));
    assert_eq!(config.library, "other");
    assert!(config.fail_fast);
    assert!(!config.use_pp_output_location);
}

#[test]
fn test_fail_fast_stops_at_the_first_error() {
    let config = Config {
        fail_fast: true,
        ..Config::default()
    };
    let mut harness = TestHarness::with_config(config);
    let result = harness.try_parse("module m;\n  wire w\nendmodule\n");
    assert!(matches!(result, Err(FrontendError::FailFast(_))));
    assert_eq!(harness.session().errors().len(), 1);

    let mut lenient = TestHarness::new();
    let parsed = lenient.try_parse("module m;\n  wire w\nendmodule\n");
    assert!(parsed.is_ok());
    assert!(lenient.session().errors().has_errors());
}
