use async_trait::async_trait;
use blobmutx::store::{LocalFsStore, MemoryStore, ObjectStore};
use blobmutx::{BlobmutxError, Result, VirtualFs};
use std::collections::HashSet;
use std::sync::Arc;
use tempfile::TempDir;

async fn seeded(keys: &[&str]) -> (Arc<MemoryStore>, VirtualFs) {
    let store = Arc::new(MemoryStore::new());
    for key in keys {
        store.put(key, key.as_bytes()).await.unwrap();
    }
    let fs = VirtualFs::new(store.clone());
    (store, fs)
}

#[tokio::test]
async fn test_readdir_lists_unique_children() {
    let (_, fs) = seeded(&["a/b/c", "a/b/d", "a/e"]).await;

    let entries: HashSet<String> = fs.readdir("/a").await.unwrap().into_iter().collect();
    let expected: HashSet<String> = ["b", "e"].iter().map(|s| s.to_string()).collect();
    assert_eq!(entries, expected);
}

#[tokio::test]
async fn test_readdir_ignores_sibling_prefixes() {
    let (_, fs) = seeded(&["a/b", "ab/c", "a/"]).await;

    assert_eq!(fs.readdir("/a").await.unwrap(), vec!["b"]);
    assert_eq!(fs.readdir("/").await.unwrap(), vec!["a", "ab"]);
}

#[tokio::test]
async fn test_read_and_write_strip_leading_separator() {
    let (store, fs) = seeded(&[]).await;

    fs.write_file("/docs/readme.md", b"hello").await.unwrap();
    assert!(store.head_exists("docs/readme.md").await.unwrap());
    assert_eq!(fs.read_file("docs/readme.md").await.unwrap(), b"hello");
}

#[tokio::test]
async fn test_read_missing_file_is_not_found() {
    let (_, fs) = seeded(&[]).await;
    assert!(fs.read_file("/missing").await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_append_to_missing_file_matches_write() {
    let (appended_store, appended) = seeded(&[]).await;
    let (written_store, written) = seeded(&[]).await;

    appended.append_file("/log.txt", b"line 1\n").await.unwrap();
    written.write_file("/log.txt", b"line 1\n").await.unwrap();

    assert_eq!(appended_store.keys().await, written_store.keys().await);
    assert_eq!(
        appended.read_file("/log.txt").await.unwrap(),
        written.read_file("/log.txt").await.unwrap()
    );
}

#[tokio::test]
async fn test_append_concatenates() {
    let (_, fs) = seeded(&[]).await;
    fs.append_file("/log.txt", b"one,").await.unwrap();
    fs.append_file("/log.txt", b"two").await.unwrap();
    assert_eq!(fs.read_file("/log.txt").await.unwrap(), b"one,two");
}

#[tokio::test]
async fn test_rename_moves_every_object_under_prefix() {
    let (store, fs) = seeded(&["p/x", "p/y/z", "keep/me"]).await;

    let outcome = fs.rename("/p", "/pp").await.unwrap();
    assert!(outcome.is_complete());
    assert_eq!(outcome.completed.len(), 2);

    assert_eq!(store.keys().await, vec!["keep/me", "pp/x", "pp/y/z"]);
    assert_eq!(fs.read_file("/pp/y/z").await.unwrap(), b"p/y/z");
    assert!(store.list("p/").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_rename_single_file() {
    let (store, fs) = seeded(&["dir/old.txt", "dir/old.txt.bak"]).await;

    fs.rename("/dir/old.txt", "/dir/new.txt").await.unwrap();
    assert_eq!(store.keys().await, vec!["dir/new.txt", "dir/old.txt.bak"]);
}

#[tokio::test]
async fn test_rename_onto_itself_is_noop() {
    let (store, fs) = seeded(&["a/b"]).await;
    let outcome = fs.rename("/a", "a").await.unwrap();
    assert!(outcome.completed.is_empty());
    assert_eq!(store.keys().await, vec!["a/b"]);
}

#[tokio::test]
async fn test_remove_deletes_prefix() {
    let (store, fs) = seeded(&["t/1", "t/2/3", "tx"]).await;

    let removed = fs.remove("/t").await.unwrap().into_result("remove").unwrap();
    assert_eq!(removed.len(), 2);
    assert_eq!(store.keys().await, vec!["tx"]);
}

#[tokio::test]
async fn test_stat_and_exists() {
    let (_, fs) = seeded(&["a/file"]).await;

    assert!(fs.exists("/a/file").await.unwrap());
    assert!(fs.stat("/a/file").await.unwrap().is_file());

    assert!(!fs.exists("/a").await.unwrap());
    assert!(fs.stat("/a").await.unwrap().is_directory());
    // No object at all is still reported as a directory
    assert!(fs.stat("/nowhere").await.unwrap().is_directory());
}

#[tokio::test]
async fn test_mkdir_is_noop() {
    let (store, fs) = seeded(&[]).await;
    fs.mkdir("/new/dir").await.unwrap();
    assert!(store.keys().await.is_empty());
}

/// Fails copies and deletes for keys containing "bad".
struct FlakyStore {
    inner: MemoryStore,
}

#[async_trait]
impl ObjectStore for FlakyStore {
    async fn list(&self, prefix: &str) -> Result<Vec<String>> {
        self.inner.list(prefix).await
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>> {
        self.inner.get(key).await
    }

    async fn put(&self, key: &str, data: &[u8]) -> Result<()> {
        self.inner.put(key, data).await
    }

    async fn copy(&self, src_key: &str, dst_key: &str) -> Result<()> {
        if src_key.contains("bad") {
            return Err(BlobmutxError::store("copy", src_key, "injected failure"));
        }
        self.inner.copy(src_key, dst_key).await
    }

    async fn delete(&self, key: &str) -> Result<()> {
        if key.contains("bad") {
            return Err(BlobmutxError::store("delete", key, "injected failure"));
        }
        self.inner.delete(key).await
    }

    async fn head_exists(&self, key: &str) -> Result<bool> {
        self.inner.head_exists(key).await
    }
}

#[tokio::test]
async fn test_rename_reports_partial_failure() {
    let store = Arc::new(FlakyStore {
        inner: MemoryStore::new(),
    });
    for key in ["src/good", "src/bad", "src/also-good"] {
        store.put(key, b"x").await.unwrap();
    }
    let fs = VirtualFs::new(store.clone());

    let outcome = fs.rename("/src", "/dst").await.unwrap();
    assert_eq!(outcome.failed_keys(), vec!["src/bad".to_string()]);
    assert_eq!(outcome.completed.len(), 2);

    // The failed object stays where it was; the others moved
    assert_eq!(store.inner.keys().await, vec!["dst/also-good", "dst/good", "src/bad"]);

    let err = outcome.into_result("rename").unwrap_err();
    assert!(matches!(err, BlobmutxError::PartialFailure { .. }));
    assert!(err.to_string().contains("src/bad"));
}

#[tokio::test]
async fn test_remove_continues_past_failures() {
    let store = Arc::new(FlakyStore {
        inner: MemoryStore::new(),
    });
    for key in ["r/1", "r/bad", "r/2"] {
        store.put(key, b"x").await.unwrap();
    }
    let fs = VirtualFs::new(store.clone());

    let outcome = fs.remove("/r").await.unwrap();
    assert_eq!(outcome.failed_keys(), vec!["r/bad".to_string()]);
    assert_eq!(store.inner.keys().await, vec!["r/bad"]);
}

#[tokio::test]
async fn test_local_store_backs_filesystem() {
    let temp = TempDir::new().unwrap();
    let fs = VirtualFs::new(Arc::new(LocalFsStore::new(temp.path())));

    fs.write_file("/a/b/c", b"1").await.unwrap();
    fs.append_file("/a/e", b"2").await.unwrap();
    fs.append_file("/a/e", b"3").await.unwrap();

    let mut entries = fs.readdir("/a").await.unwrap();
    entries.sort();
    assert_eq!(entries, vec!["b", "e"]);
    assert_eq!(fs.read_file("/a/e").await.unwrap(), b"23");

    fs.rename("/a", "/z").await.unwrap().into_result("rename").unwrap();
    assert!(fs.readdir("/a").await.unwrap().is_empty());
    assert_eq!(fs.read_file("/z/b/c").await.unwrap(), b"1");

    fs.remove("/z").await.unwrap().into_result("remove").unwrap();
    assert!(fs.readdir("/").await.unwrap().is_empty());
}
