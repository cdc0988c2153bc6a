// Loader behaviour against a mocked FileSource: ordering, size gates and
// per-file failures that must not abort the batch.

use repo_extract_core::contract::MockFileSource;
use repo_extract_core::loader::{load, LoadOptions};
use std::io;

const OPTIONS: LoadOptions = LoadOptions {
    max_file_size: 1024,
    detect_binary: false,
};

#[tokio::test]
async fn failures_drop_only_the_failing_path() {
    let mut source = MockFileSource::new();
    source.expect_file_size().returning(|path| match path {
        "gone.rs" => Err(io::Error::new(io::ErrorKind::NotFound, "vanished")),
        "huge.rs" => Ok(4096),
        _ => Ok(5),
    });
    source.expect_read_file().returning(|path| match path {
        "denied.rs" => Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied")),
        other => Ok(format!("// {other}").into_bytes()),
    });

    let listing: Vec<String> = ["z.rs", "gone.rs", "huge.rs", "denied.rs", "a.rs"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    let files = load(&source, &listing, OPTIONS).await;

    let paths: Vec<&str> = files.iter().map(|f| f.path.as_str()).collect();
    assert_eq!(paths, vec!["z.rs", "a.rs"]);
    assert_eq!(files[0].content, "// z.rs");
}

#[tokio::test]
async fn oversized_files_are_never_read() {
    let mut source = MockFileSource::new();
    source.expect_file_size().returning(|_| Ok(2048));
    source.expect_read_file().times(0);

    let files = load(&source, &["big.txt".to_string()], OPTIONS).await;
    assert!(files.is_empty());
}

#[tokio::test]
async fn file_at_exact_limit_is_kept() {
    let mut source = MockFileSource::new();
    source.expect_file_size().returning(|_| Ok(1024));
    source
        .expect_read_file()
        .returning(|_| Ok(vec![b'x'; 1024]));

    let files = load(&source, &["edge.txt".to_string()], OPTIONS).await;
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].size, 1024);
}

#[tokio::test]
async fn invalid_utf8_is_replaced_not_rejected() {
    let mut source = MockFileSource::new();
    source.expect_file_size().returning(|_| Ok(4));
    source
        .expect_read_file()
        .returning(|_| Ok(vec![b'o', b'k', 0xff, b'!']));

    let files = load(&source, &["latin1.txt".to_string()], OPTIONS).await;
    assert_eq!(files[0].content, "ok\u{fffd}!");
}
