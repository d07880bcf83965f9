use linkdupe::action_log::{ActionLog, ActionLogError};
use linkdupe::dedupe::{process_directory, SessionConfig};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

#[test]
fn test_sessions_append_to_the_same_log() {
    let tree = tempdir().unwrap();
    let logs = tempdir().unwrap();
    let log_path = logs.path().join("duplicate_log.txt");

    fs::write(tree.path().join("a"), "one").unwrap();
    fs::write(tree.path().join("b"), "one").unwrap();
    {
        let mut log = ActionLog::open(&log_path, 100).unwrap();
        process_directory(tree.path(), &SessionConfig::default(), &mut log).unwrap();
        assert_eq!(log.flush().unwrap(), 1);
    }

    fs::write(tree.path().join("c"), "two").unwrap();
    fs::write(tree.path().join("d"), "two").unwrap();
    {
        let mut log = ActionLog::open(&log_path, 100).unwrap();
        process_directory(tree.path(), &SessionConfig::default(), &mut log).unwrap();
        assert_eq!(log.flush().unwrap(), 1);
    }

    let lines: Vec<String> = fs::read_to_string(&log_path)
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].ends_with(&format!("b -> {}", tree.path().join("a").display())));
    assert!(lines[1].ends_with(&format!("d -> {}", tree.path().join("c").display())));
}

#[test]
fn test_capacity_overflow_keeps_newest() {
    let tree = tempdir().unwrap();
    for name in ["f0", "f1", "f2", "f3", "f4"] {
        fs::write(tree.path().join(name), "same").unwrap();
    }
    let logs = tempdir().unwrap();
    let log_path = logs.path().join("log.txt");
    let mut log = ActionLog::open(&log_path, 2).unwrap();

    let summary = process_directory(tree.path(), &SessionConfig::default(), &mut log).unwrap();
    assert_eq!(summary.substitutions, 4);
    assert_eq!(log.evicted(), 2);
    log.flush().unwrap();

    let content = fs::read_to_string(&log_path).unwrap();
    let lines: Vec<_> = content.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with(&format!("Duplicate: {}", tree.path().join("f3").display())));
    assert!(lines[1].starts_with(&format!("Duplicate: {}", tree.path().join("f4").display())));
}

#[test]
fn test_dry_run_log_is_never_written() {
    let tree = tempdir().unwrap();
    fs::write(tree.path().join("a"), "x").unwrap();
    fs::write(tree.path().join("b"), "x").unwrap();
    let mut log = ActionLog::in_memory(10);

    let config = SessionConfig::default().with_dry_run(true);
    process_directory(tree.path(), &config, &mut log).unwrap();

    let pending: Vec<String> = log.entries().map(ToString::to_string).collect();
    assert_eq!(pending.len(), 1);
    assert_eq!(log.flush().unwrap(), 0);
    assert!(log.path().is_none());
}

#[test]
fn test_unopenable_log_is_reported_up_front() {
    let dir = tempdir().unwrap();
    let err = ActionLog::open(&dir.path().join("no/such/dir/log.txt"), 10).unwrap_err();
    assert!(matches!(err, ActionLogError::Open { .. }));
    assert!(err.to_string().starts_with("cannot open log file"));
}

#[cfg(unix)]
#[test]
fn test_write_failure_is_not_fatal() {
    // /dev/full accepts opens but fails every write with ENOSPC
    let path = Path::new("/dev/full");
    if !path.exists() {
        return;
    }
    let mut log = ActionLog::open(path, 10).unwrap();
    log.record(Path::new("/d"), Path::new("/r"));

    let err = log.flush().unwrap_err();
    assert!(matches!(err, ActionLogError::Write { .. }));
    assert!(log.is_empty());
    assert_eq!(log.flush().unwrap(), 0);
}
