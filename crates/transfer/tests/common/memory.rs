use async_trait::async_trait;
use bytes::Bytes;
use larder_storage::{ObjectStore, StorageError, StorageResult};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// In-memory object store with injectable failures.
///
/// Keys registered with `fail_key` return an I/O error on every access.
/// Keys registered with `corrupt_key` return bytes that do not match the key.
#[derive(Default)]
pub struct MemoryStore {
    objects: Mutex<HashMap<String, Bytes>>,
    failing: Mutex<HashSet<String>>,
    corrupt: Mutex<HashSet<String>>,
    gets: AtomicUsize,
}

#[allow(dead_code)]
impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, key: impl Into<String>, data: Bytes) {
        self.objects.lock().unwrap().insert(key.into(), data);
    }

    pub fn fail_key(&self, key: impl Into<String>) {
        self.failing.lock().unwrap().insert(key.into());
    }

    pub fn corrupt_key(&self, key: impl Into<String>) {
        self.corrupt.lock().unwrap().insert(key.into());
    }

    pub fn len(&self) -> usize {
        self.objects.lock().unwrap().len()
    }

    pub fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    fn check(&self, key: &str) -> StorageResult<()> {
        if self.failing.lock().unwrap().contains(key) {
            return Err(StorageError::Io(std::io::Error::other(format!(
                "injected failure for {key}"
            ))));
        }
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn exists(&self, key: &str) -> StorageResult<bool> {
        self.check(key)?;
        Ok(self.objects.lock().unwrap().contains_key(key))
    }

    async fn get(&self, key: &str) -> StorageResult<Bytes> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.check(key)?;
        if self.corrupt.lock().unwrap().contains(key) {
            return Ok(Bytes::from_static(b"corrupted"));
        }
        self.objects
            .lock()
            .unwrap()
            .get(key)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(key.to_string()))
    }

    async fn put(&self, key: &str, data: Bytes) -> StorageResult<()> {
        self.check(key)?;
        self.objects.lock().unwrap().insert(key.to_string(), data);
        Ok(())
    }

    async fn put_if_not_exists(&self, key: &str, data: Bytes) -> StorageResult<bool> {
        self.check(key)?;
        let mut objects = self.objects.lock().unwrap();
        if objects.contains_key(key) {
            return Ok(false);
        }
        objects.insert(key.to_string(), data);
        Ok(true)
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        self.check(key)?;
        self.objects
            .lock()
            .unwrap()
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| StorageError::NotFound(key.to_string()))
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
