use linkdupe::action_log::ActionLog;
use linkdupe::dedupe::{process_directory, ScanSession, SessionConfig};
use linkdupe::scanner::hardlink::same_inode;
use linkdupe::scanner::WalkerConfig;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

#[test]
fn test_scan_empty_directory() {
    let dir = tempdir().unwrap();
    let mut log = ActionLog::in_memory(10);

    let summary = process_directory(dir.path(), &SessionConfig::default(), &mut log).unwrap();

    assert_eq!(summary.files_visited, 0);
    assert_eq!(summary.substitutions, 0);
    assert!(log.is_empty());
}

#[test]
fn test_scan_unique_files_untouched() {
    let dir = tempdir().unwrap();
    write(dir.path(), "a.txt", "content a");
    write(dir.path(), "b.txt", "content b");
    write(dir.path(), "c.txt", "content c");
    let mut log = ActionLog::in_memory(10);

    let summary = process_directory(dir.path(), &SessionConfig::default(), &mut log).unwrap();

    assert_eq!(summary.files_visited, 3);
    assert_eq!(summary.unique_files, 3);
    assert_eq!(summary.substitutions, 0);
    assert_eq!(fs::read_to_string(dir.path().join("b.txt")).unwrap(), "content b");
}

#[test]
fn test_scan_hello_world_scenario() {
    let dir = tempdir().unwrap();
    write(dir.path(), "a/1.txt", "hello");
    write(dir.path(), "a/2.txt", "hello");
    write(dir.path(), "b/3.txt", "world");
    // Keep the log outside the tree being scanned
    let log_dir = tempdir().unwrap();
    let log_path = log_dir.path().join("actions.log");
    let mut log = ActionLog::open(&log_path, 100).unwrap();

    let summary = process_directory(dir.path(), &SessionConfig::default(), &mut log).unwrap();
    log.flush().unwrap();

    let one = dir.path().join("a/1.txt");
    let two = dir.path().join("a/2.txt");
    let three = dir.path().join("b/3.txt");

    assert_eq!(summary.substitutions, 1);
    assert_eq!(summary.events[0].duplicate, two);
    assert_eq!(summary.events[0].representative, one);
    #[cfg(unix)]
    {
        assert_eq!(same_inode(&one, &two).unwrap(), Some(true));
        assert_eq!(same_inode(&one, &three).unwrap(), Some(false));
    }
    assert_eq!(fs::read_to_string(&three).unwrap(), "world");

    let logged = fs::read_to_string(&log_path).unwrap();
    assert_eq!(logged.lines().count(), 1);
    assert_eq!(
        logged,
        format!("Duplicate: {} -> {}\n", two.display(), one.display())
    );
}

#[test]
fn test_scan_empty_files_share_one_representative() {
    let dir = tempdir().unwrap();
    for name in ["x", "y", "z"] {
        write(dir.path(), name, "");
    }
    let mut log = ActionLog::in_memory(10);

    let summary = process_directory(dir.path(), &SessionConfig::default(), &mut log).unwrap();

    assert_eq!(summary.substitutions, 2);
    assert_eq!(summary.unique_files, 1);
    assert!(summary
        .events
        .iter()
        .all(|e| e.representative == dir.path().join("x")));

    #[cfg(unix)]
    {
        use std::os::unix::fs::MetadataExt;
        assert_eq!(fs::metadata(dir.path().join("x")).unwrap().nlink(), 3);
    }
}

#[test]
fn test_log_file_inside_root_keeps_empty_files_empty() {
    let dir = tempdir().unwrap();
    for name in ["x", "y", "z"] {
        write(dir.path(), name, "");
    }
    let log_path = dir.path().join("duplicate_log.txt");
    let mut log = ActionLog::open(&log_path, 10).unwrap();

    let summary = process_directory(dir.path(), &SessionConfig::default(), &mut log).unwrap();
    log.flush().unwrap();

    assert_eq!(summary.files_visited, 3);
    assert_eq!(summary.substitutions, 2);
    assert!(summary
        .events
        .iter()
        .all(|e| e.representative == dir.path().join("x")));
    for name in ["x", "y", "z"] {
        assert_eq!(fs::read(dir.path().join(name)).unwrap(), b"");
    }
    #[cfg(unix)]
    assert_eq!(
        same_inode(&log_path, &dir.path().join("x")).unwrap(),
        Some(false)
    );
    assert_eq!(fs::read_to_string(&log_path).unwrap().lines().count(), 2);

    // The log now has content; a second pass must still leave it alone
    let mut again = ActionLog::open(&log_path, 10).unwrap();
    let second = process_directory(dir.path(), &SessionConfig::default(), &mut again).unwrap();
    assert_eq!(second.files_visited, 1);
    assert_eq!(second.substitutions, 0);
}

#[test]
fn test_no_temporary_links_left_in_root() {
    let dir = tempdir().unwrap();
    write(dir.path(), "a/1", "same");
    write(dir.path(), "a/2", "same");
    write(dir.path(), "b/3", "same");
    let mut log = ActionLog::in_memory(10);

    let summary = process_directory(dir.path(), &SessionConfig::default(), &mut log).unwrap();
    assert_eq!(summary.substitutions, 2);

    for sub in ["", "a", "b"] {
        let names: Vec<String> = fs::read_dir(dir.path().join(sub))
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert!(names.iter().all(|n| !n.ends_with(".tmp")), "{names:?}");
    }
}

#[test]
fn test_leftover_temporary_link_is_not_a_representative() {
    let dir = tempdir().unwrap();
    write(dir.path(), "a", "same");
    write(dir.path(), "b", "same");
    write(dir.path(), ".a.linkdupe-1-0.tmp", "same");
    let mut log = ActionLog::in_memory(10);

    let summary = process_directory(dir.path(), &SessionConfig::default(), &mut log).unwrap();

    assert_eq!(summary.files_visited, 2);
    assert_eq!(summary.events[0].representative, dir.path().join("a"));
}

#[test]
fn test_default_walk_ignores_gitignore() {
    let dir = tempdir().unwrap();
    write(dir.path(), ".gitignore", "*.bin\n");
    write(dir.path(), "a.bin", "same");
    write(dir.path(), "b.bin", "same");
    let mut log = ActionLog::in_memory(10);

    let summary = process_directory(dir.path(), &SessionConfig::default(), &mut log).unwrap();

    assert_eq!(summary.files_visited, 3);
    assert_eq!(summary.substitutions, 1);
    assert_eq!(summary.events[0].duplicate, dir.path().join("b.bin"));
}

#[test]
fn test_gitignore_is_honoured_when_asked() {
    let dir = tempdir().unwrap();
    write(dir.path(), ".gitignore", "*.bin\n");
    write(dir.path(), "a.bin", "same");
    write(dir.path(), "b.bin", "same");
    let mut log = ActionLog::in_memory(10);

    let config =
        SessionConfig::default().with_walker(WalkerConfig::default().with_respect_gitignore(true));
    let summary = process_directory(dir.path(), &config, &mut log).unwrap();

    assert_eq!(summary.files_visited, 1);
    assert_eq!(summary.substitutions, 0);
}

#[test]
fn test_rescan_is_idempotent() {
    let dir = tempdir().unwrap();
    write(dir.path(), "one/a.bin", "payload");
    write(dir.path(), "two/b.bin", "payload");
    write(dir.path(), "two/c.bin", "payload");
    write(dir.path(), "other.bin", "different");

    let mut first_log = ActionLog::in_memory(10);
    let first = process_directory(dir.path(), &SessionConfig::default(), &mut first_log).unwrap();
    assert_eq!(first.substitutions, 2);

    let mut second_log = ActionLog::in_memory(10);
    let second = process_directory(dir.path(), &SessionConfig::default(), &mut second_log).unwrap();
    assert_eq!(second.substitutions, 0);
    assert!(second_log.is_empty());
}

#[test]
fn test_representative_is_first_in_walk_order() {
    let dir = tempdir().unwrap();
    write(dir.path(), "b/deep/file", "same");
    write(dir.path(), "a/file", "same");
    write(dir.path(), "c", "same");
    let mut log = ActionLog::in_memory(10);

    let summary = process_directory(dir.path(), &SessionConfig::default(), &mut log).unwrap();

    let representative = dir.path().join("a/file");
    assert_eq!(summary.substitutions, 2);
    assert_eq!(summary.events[0].duplicate, dir.path().join("b/deep/file"));
    assert_eq!(summary.events[1].duplicate, dir.path().join("c"));
    assert!(summary.events.iter().all(|e| e.representative == representative));
}

#[test]
fn test_deep_nesting_visits_every_file_once() {
    let dir = tempdir().unwrap();
    let mut rel = String::new();
    for depth in 0..12 {
        rel.push_str(&format!("d{depth}/"));
        write(dir.path(), &format!("{rel}f.txt"), &format!("level {depth}"));
    }
    let mut log = ActionLog::in_memory(10);

    let summary = process_directory(dir.path(), &SessionConfig::default(), &mut log).unwrap();

    assert_eq!(summary.files_visited, 12);
    assert_eq!(summary.unique_files, 12);
}

#[test]
fn test_filters_limit_what_is_linked() {
    let dir = tempdir().unwrap();
    write(dir.path(), "big1", "0123456789");
    write(dir.path(), "big2", "0123456789");
    write(dir.path(), "s1", "ab");
    write(dir.path(), "s2", "ab");
    write(dir.path(), ".h1", "0123456789");
    write(dir.path(), "skip/me", "0123456789");

    let config = SessionConfig::default().with_walker(
        WalkerConfig::default()
            .with_min_size(Some(5))
            .with_skip_hidden(true)
            .with_ignore_patterns(vec!["skip/".to_string()]),
    );
    let mut log = ActionLog::in_memory(10);
    let summary = process_directory(dir.path(), &config, &mut log).unwrap();

    assert_eq!(summary.files_visited, 2);
    assert_eq!(summary.substitutions, 1);
    assert_eq!(summary.events[0].duplicate, dir.path().join("big2"));
}

#[test]
fn test_sha256_sessions_link_the_same_files() {
    let dir = tempdir().unwrap();
    write(dir.path(), "a", "twin");
    write(dir.path(), "b", "twin");

    let config = SessionConfig::default()
        .with_algorithm(linkdupe::scanner::FingerprintAlgorithm::Sha256);
    let mut log = ActionLog::in_memory(10);
    let summary = ScanSession::new(dir.path(), config)
        .unwrap()
        .run(&mut log, None);

    assert_eq!(summary.substitutions, 1);
}

#[cfg(unix)]
#[test]
fn test_symlinked_duplicate_links_its_target() {
    let dir = tempdir().unwrap();
    write(dir.path(), "a/original", "shared");
    write(dir.path(), "z/copy", "shared");
    std::os::unix::fs::symlink(dir.path().join("z/copy"), dir.path().join("m_alias")).unwrap();
    let mut log = ActionLog::in_memory(10);

    let summary = process_directory(dir.path(), &SessionConfig::default(), &mut log).unwrap();

    // m_alias is visited before z/copy and resolves to it
    assert_eq!(summary.substitutions, 1);
    assert_eq!(summary.events[0].duplicate, dir.path().join("z/copy"));
    assert_eq!(summary.events[0].representative, dir.path().join("a/original"));
    assert!(fs::symlink_metadata(dir.path().join("m_alias"))
        .unwrap()
        .file_type()
        .is_symlink());
    assert_eq!(
        same_inode(&dir.path().join("a/original"), &dir.path().join("z/copy")).unwrap(),
        Some(true)
    );
}

#[cfg(unix)]
#[test]
fn test_symlink_escaping_root_is_not_touched() {
    let dir = tempdir().unwrap();
    let outside = tempdir().unwrap();
    write(dir.path(), "inside", "same bytes");
    write(outside.path(), "elsewhere", "same bytes");
    std::os::unix::fs::symlink(outside.path().join("elsewhere"), dir.path().join("link")).unwrap();
    std::os::unix::fs::symlink(outside.path(), dir.path().join("dirlink")).unwrap();
    let mut log = ActionLog::in_memory(10);

    let summary = process_directory(dir.path(), &SessionConfig::default(), &mut log).unwrap();

    assert_eq!(summary.files_visited, 1);
    assert_eq!(summary.substitutions, 0);
    assert_eq!(
        same_inode(&dir.path().join("inside"), &outside.path().join("elsewhere")).unwrap(),
        Some(false)
    );
}
