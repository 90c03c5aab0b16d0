use std::fs;
use std::sync::Arc;
use std::thread;

use sv_frontend::log_listener::{LogListener, LogResult, DEFAULT_MAX_QUEUED_MESSAGE_COUNT};
use sv_frontend::{Config, Diagnostic, ErrorKind, Session};
use tempfile::TempDir;

#[test]
fn test_queue_drops_oldest_messages() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("frontend.log");
    let listener = LogListener::new();

    for i in 0..101 {
        assert_eq!(listener.log(&format!("message {i}")), LogResult::Enqueued);
    }
    assert_eq!(listener.queued_message_count(), DEFAULT_MAX_QUEUED_MESSAGE_COUNT);
    assert_eq!(listener.dropped_message_count(), 1);

    assert_eq!(listener.initialize(&path), LogResult::Ok);
    let text = fs::read_to_string(&path).unwrap();
    let lines: Vec<_> = text.lines().collect();
    assert_eq!(lines.len(), 100);
    assert_eq!(lines[0], "message 1");
    assert_eq!(lines[99], "message 100");
    assert_eq!(listener.queued_message_count(), 0);
    assert_eq!(listener.dropped_message_count(), 1);

    assert_eq!(listener.log("after"), LogResult::Ok);
    let text = fs::read_to_string(&path).unwrap();
    assert_eq!(text.lines().last(), Some("after"));
}

#[test]
fn test_zero_capacity_drops_everything() {
    let listener = LogListener::with_max_queued(0);
    assert_eq!(listener.log("lost"), LogResult::Enqueued);
    assert_eq!(listener.queued_message_count(), 0);
    assert_eq!(listener.dropped_message_count(), 1);
    assert_eq!(listener.max_queued_message_count(), 0);
}

#[test]
fn test_messages_keep_their_newline() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("newline.log");
    let listener = LogListener::default();
    assert_eq!(listener.initialize(&path), LogResult::Ok);
    assert_eq!(listener.log("first\n"), LogResult::Ok);
    assert_eq!(listener.log("second"), LogResult::Ok);
    assert_eq!(fs::read_to_string(&path).unwrap(), "first\nsecond\n");
    assert_eq!(listener.log_file(), Some(path));
}

#[test]
fn test_initialize_appends_to_existing_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("existing.log");
    fs::write(&path, "earlier run\n").unwrap();

    let listener = LogListener::new();
    listener.log("queued");
    assert_eq!(listener.initialize(&path), LogResult::Ok);
    assert_eq!(fs::read_to_string(&path).unwrap(), "earlier run\nqueued\n");
}

#[test]
fn test_open_failure_keeps_messages_queued() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("missing").join("dir").join("x.log");
    let listener = LogListener::new();
    listener.log("kept");

    let result = listener.initialize(&path);
    assert_eq!(result, LogResult::FailedToOpenFileForWrite);
    assert!(result.failed());
    assert_eq!(result.code(), -1);
    assert_eq!(listener.queued_message_count(), 1);
    assert_eq!(listener.log("also kept"), LogResult::FailedToOpenFileForWrite);
    assert_eq!(listener.queued_message_count(), 2);
}

#[test]
fn test_result_codes() {
    assert!(LogResult::Ok.succeeded());
    assert!(LogResult::Enqueued.succeeded());
    assert_eq!(LogResult::Enqueued.code(), 1);
    assert_eq!(LogResult::Ok.code(), 0);
    assert!(!LogResult::Ok.failed());
}

#[test]
fn test_flush_without_file() {
    let listener = LogListener::new();
    assert_eq!(listener.flush(), LogResult::Ok);
    listener.log("pending");
    assert_eq!(listener.flush(), LogResult::Enqueued);
}

#[test]
fn test_concurrent_logging() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("threads.log");
    let listener = Arc::new(LogListener::new());
    assert_eq!(listener.initialize(&path), LogResult::Ok);

    let handles: Vec<_> = (0..4)
        .map(|t| {
            let listener = Arc::clone(&listener);
            thread::spawn(move || {
                for i in 0..25 {
                    assert_eq!(listener.log(&format!("t{t} m{i}")), LogResult::Ok);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(fs::read_to_string(&path).unwrap().lines().count(), 100);
}

#[test]
fn test_session_writes_diagnostics_to_log_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("session.log");
    let config = Config {
        log_file: Some(path.clone()),
        ..Config::default()
    };
    let session = Session::new(config);
    session
        .report(Diagnostic::new("something odd", ErrorKind::CompMalformedIncrement))
        .unwrap();
    session.log_listener().flush();

    let text = fs::read_to_string(&path).unwrap();
    assert!(text.contains("something odd"));
    assert!(text.contains("CP0303"));
}

#[test]
fn test_session_reports_unopenable_log_file() {
    let temp_dir = TempDir::new().unwrap();
    let config = Config {
        log_file: Some(temp_dir.path().join("no").join("such.log")),
        ..Config::default()
    };
    let session = Session::new(config);
    assert!(session.errors().contains("CM0001"));
    assert!(!session.errors().has_errors());
}
