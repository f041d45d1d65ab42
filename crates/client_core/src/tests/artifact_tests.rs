use super::*;
use std::sync::Arc;

async fn directory_entries(dir: &Path) -> Vec<String> {
    let mut names = Vec::new();
    let mut entries = tokio::fs::read_dir(dir).await.expect("read dir");
    while let Some(entry) = entries.next_entry().await.expect("entry") {
        names.push(entry.file_name().to_string_lossy().into_owned());
    }
    names.sort();
    names
}

#[tokio::test]
async fn materializes_named_file_without_leaving_staging_files() {
    let dir = tempfile::tempdir().expect("tempdir");
    let sink = DirectorySink::new(dir.path());

    let path = sink
        .materialize("user_details.pdf", b"%PDF-1.4")
        .await
        .expect("materialize");

    assert_eq!(path, dir.path().join("user_details.pdf"));
    assert_eq!(tokio::fs::read(&path).await.expect("read"), b"%PDF-1.4".to_vec());
    assert_eq!(directory_entries(dir.path()).await, vec!["user_details.pdf"]);
}

#[tokio::test]
async fn creates_missing_download_directory() {
    let dir = tempfile::tempdir().expect("tempdir");
    let nested = dir.path().join("downloads").join("forms");
    let sink = DirectorySink::new(&nested);

    let path = sink
        .materialize("user_details.pdf", b"doc")
        .await
        .expect("materialize");

    assert!(path.starts_with(&nested));
}

#[tokio::test]
async fn numbers_colliding_names_like_a_browser() {
    let dir = tempfile::tempdir().expect("tempdir");
    let sink = DirectorySink::new(dir.path());

    let first = sink.materialize("user_details.pdf", b"one").await.expect("first");
    let second = sink.materialize("user_details.pdf", b"two").await.expect("second");
    let third = sink.materialize("user_details.pdf", b"three").await.expect("third");

    assert_eq!(first.file_name().unwrap(), "user_details.pdf");
    assert_eq!(second.file_name().unwrap(), "user_details (1).pdf");
    assert_eq!(third.file_name().unwrap(), "user_details (2).pdf");
    assert_eq!(tokio::fs::read(&first).await.expect("read"), b"one".to_vec());
    assert_eq!(directory_entries(dir.path()).await.len(), 3);
}

#[tokio::test]
async fn rejects_names_that_escape_the_directory() {
    let dir = tempfile::tempdir().expect("tempdir");
    let sink = DirectorySink::new(dir.path());

    for name in ["../user_details.pdf", "nested/user_details.pdf", ".hidden", ""] {
        let err = sink.materialize(name, b"doc").await.expect_err(name);
        assert!(matches!(err, ArtifactError::InvalidName(_)), "{name}: {err}");
    }
    assert!(directory_entries(dir.path()).await.is_empty());
}

#[tokio::test]
async fn staging_file_is_removed_when_not_persisted() {
    let dir = tempfile::tempdir().expect("tempdir");

    let staged = stage(dir.path(), "user_details.pdf", b"partial")
        .await
        .expect("stage");
    let staging = staged.to_path_buf();
    assert!(staging.exists());
    let name = staging.file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with(".user_details.pdf."), "{name}");
    assert!(name.ends_with(".part"), "{name}");

    drop(staged);
    assert!(!staging.exists());
}

#[tokio::test]
async fn existing_download_is_never_overwritten() {
    let dir = tempfile::tempdir().expect("tempdir");
    tokio::fs::write(dir.path().join("user_details.pdf"), b"earlier")
        .await
        .expect("seed");
    let sink = DirectorySink::new(dir.path());

    let path = sink
        .materialize("user_details.pdf", b"later")
        .await
        .expect("materialize");

    assert_eq!(path, dir.path().join("user_details (1).pdf"));
    assert_eq!(
        tokio::fs::read(dir.path().join("user_details.pdf")).await.expect("read"),
        b"earlier".to_vec()
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_saves_keep_their_own_documents() {
    let dir = tempfile::tempdir().expect("tempdir");
    let sink = Arc::new(DirectorySink::new(dir.path()));

    for round in 0..25u32 {
        let first_bytes = format!("first document {round}").into_bytes();
        let second_bytes = format!("second document {round}").into_bytes();
        let first = {
            let sink = sink.clone();
            let bytes = first_bytes.clone();
            tokio::spawn(async move { sink.materialize("user_details.pdf", &bytes).await })
        };
        let second = {
            let sink = sink.clone();
            let bytes = second_bytes.clone();
            tokio::spawn(async move { sink.materialize("user_details.pdf", &bytes).await })
        };

        let first = first.await.expect("join").expect("first save");
        let second = second.await.expect("join").expect("second save");
        assert_ne!(first, second, "round {round}");
        assert_eq!(tokio::fs::read(&first).await.expect("read"), first_bytes);
        assert_eq!(tokio::fs::read(&second).await.expect("read"), second_bytes);
    }

    let entries = directory_entries(dir.path()).await;
    assert_eq!(entries.len(), 50);
    assert!(entries.iter().all(|name| !name.ends_with(".part")));
}
