use linkdupe::dedupe::{HardLinker, SubstituteError, SubstituteOutcome, Substituter};
use linkdupe::scanner::hardlink::same_inode;
use linkdupe::scanner::{FingerprintAlgorithm, Fingerprinter};
use std::fs;
use tempfile::tempdir;

#[test]
fn test_substitute_large_file() {
    let dir = tempdir().unwrap();
    let rep = dir.path().join("rep.bin");
    let dup = dir.path().join("dup.bin");
    let content: Vec<u8> = (0..300_000u32).map(|i| (i % 251) as u8).collect();
    fs::write(&rep, &content).unwrap();
    fs::write(&dup, &content).unwrap();

    let fingerprinter = Fingerprinter::new(FingerprintAlgorithm::Sha256).with_chunk_size(4096);
    let fp = fingerprinter.fingerprint(&dup).unwrap();

    let outcome = Substituter::new(&fingerprinter, &HardLinker)
        .substitute(&dup, &rep, &fp)
        .unwrap();

    assert_eq!(outcome, SubstituteOutcome::Linked);
    assert_eq!(fs::read(&dup).unwrap(), content);
    #[cfg(unix)]
    assert_eq!(same_inode(&dup, &rep).unwrap(), Some(true));
}

#[test]
fn test_substitute_across_directories() {
    let dir = tempdir().unwrap();
    fs::create_dir_all(dir.path().join("x/y")).unwrap();
    let rep = dir.path().join("rep.txt");
    let dup = dir.path().join("x/y/dup.txt");
    fs::write(&rep, "shared").unwrap();
    fs::write(&dup, "shared").unwrap();

    let fingerprinter = Fingerprinter::default();
    let fp = fingerprinter.fingerprint(&rep).unwrap();
    Substituter::new(&fingerprinter, &HardLinker)
        .substitute(&dup, &rep, &fp)
        .unwrap();

    // Only the duplicate's name remains in its directory
    let names: Vec<_> = fs::read_dir(dir.path().join("x/y"))
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .collect();
    assert_eq!(names, vec![std::ffi::OsString::from("dup.txt")]);
}

#[test]
fn test_substitute_second_time_is_noop() {
    let dir = tempdir().unwrap();
    let rep = dir.path().join("rep");
    let dup = dir.path().join("dup");
    fs::write(&rep, "z").unwrap();
    fs::write(&dup, "z").unwrap();

    let fingerprinter = Fingerprinter::default();
    let fp = fingerprinter.fingerprint(&rep).unwrap();
    let substituter = Substituter::new(&fingerprinter, &HardLinker);

    assert_eq!(
        substituter.substitute(&dup, &rep, &fp).unwrap(),
        SubstituteOutcome::Linked
    );
    #[cfg(unix)]
    assert_eq!(
        substituter.substitute(&dup, &rep, &fp).unwrap(),
        SubstituteOutcome::AlreadyLinked
    );
}

#[test]
fn test_representative_replaced_by_directory() {
    let dir = tempdir().unwrap();
    let rep = dir.path().join("rep");
    let dup = dir.path().join("dup");
    fs::write(&rep, "z").unwrap();
    fs::write(&dup, "z").unwrap();

    let fingerprinter = Fingerprinter::default();
    let fp = fingerprinter.fingerprint(&rep).unwrap();
    fs::remove_file(&rep).unwrap();
    fs::create_dir(&rep).unwrap();

    let err = Substituter::new(&fingerprinter, &HardLinker)
        .substitute(&dup, &rep, &fp)
        .unwrap_err();
    assert!(matches!(err, SubstituteError::RepresentativeMissing(_)));
    assert_eq!(fs::read_to_string(&dup).unwrap(), "z");
}
