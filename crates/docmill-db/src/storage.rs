//! Blob storage backends.
//!
//! `FilesystemStore` maps bucket-prefixed keys (`uploads/{id}/{name}`) to
//! paths under a base directory, with atomic writes and HMAC-signed
//! download URLs standing in for a hosted object store's signing
//! capability. `MemoryStore` is an in-process fake for tests.

use std::path::PathBuf;

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use docmill_core::{BlobStore, Error, Result};

type HmacSha256 = Hmac<Sha256>;

/// Reject keys that could escape the base directory.
fn validate_key(key: &str) -> Result<()> {
    if key.is_empty()
        || key.contains("..")
        || key.contains('\0')
        || key.contains('\\')
        || key.starts_with('/')
    {
        return Err(Error::Storage(format!("invalid storage key: {key:?}")));
    }
    Ok(())
}

/// Percent-encode each key segment, preserving the separators.
fn encode_key_for_url(key: &str) -> String {
    key.split('/')
        .map(|seg| urlencoding::encode(seg).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

fn sign(secret: &[u8], key: &str, expires_unix: i64) -> String {
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC accepts any key length");
    mac.update(format!("{key}:{expires_unix}").as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

fn verify(secret: &[u8], key: &str, expires_unix: i64, sig: &str) -> bool {
    if expires_unix < chrono::Utc::now().timestamp() {
        return false;
    }
    let Ok(sig_bytes) = hex::decode(sig) else {
        return false;
    };
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC accepts any key length");
    mac.update(format!("{key}:{expires_unix}").as_bytes());
    mac.verify_slice(&sig_bytes).is_ok()
}

/// Filesystem blob store.
pub struct FilesystemStore {
    base_path: PathBuf,
    public_base_url: String,
    signing_secret: Vec<u8>,
}

impl FilesystemStore {
    /// Create a new filesystem store.
    ///
    /// `public_base_url` is the externally reachable server base (no
    /// trailing slash); signed URLs are issued under it.
    pub fn new(
        base_path: impl Into<PathBuf>,
        public_base_url: impl Into<String>,
        signing_secret: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            base_path: base_path.into(),
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
            signing_secret: signing_secret.into(),
        }
    }

    fn full_path(&self, key: &str) -> Result<PathBuf> {
        validate_key(key)?;
        Ok(self.base_path.join(key))
    }

    /// Validate that the store can write, read, and delete files.
    ///
    /// Performs a full round-trip at startup to catch filesystem issues
    /// (permission errors, missing mounts) before the first upload does.
    pub async fn validate(&self) -> std::result::Result<(), String> {
        let test_dir = self.base_path.join(".health-check");
        let test_file = test_dir.join("probe.bin");

        fs::create_dir_all(&test_dir)
            .await
            .map_err(|e| format!("create_dir_all({:?}): {}", test_dir, e))?;

        let data = b"storage-health-check";
        fs::write(&test_file, data)
            .await
            .map_err(|e| format!("write({:?}): {}", test_file, e))?;

        let read_back = fs::read(&test_file)
            .await
            .map_err(|e| format!("read({:?}): {}", test_file, e))?;
        if read_back != data {
            return Err("read-back mismatch".to_string());
        }

        fs::remove_file(&test_file)
            .await
            .map_err(|e| format!("remove_file({:?}): {}", test_file, e))?;
        let _ = fs::remove_dir(&test_dir).await;

        Ok(())
    }
}

#[async_trait]
impl BlobStore for FilesystemStore {
    async fn put(&self, key: &str, data: &[u8], _content_type: &str) -> Result<()> {
        let full_path = self.full_path(key)?;
        debug!(storage_key = %key, size = data.len(), "blob_store: put");

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                warn!(parent = %parent.display(), error = %e, "blob_store: create_dir_all failed");
                Error::Storage(e.to_string())
            })?;
        }

        // Atomic write: temp file + rename
        let temp_path = full_path.with_extension("tmp");
        let mut file = fs::File::create(&temp_path)
            .await
            .map_err(|e| Error::Storage(e.to_string()))?;
        file.write_all(data)
            .await
            .map_err(|e| Error::Storage(e.to_string()))?;
        file.sync_all()
            .await
            .map_err(|e| Error::Storage(e.to_string()))?;
        drop(file);

        fs::rename(&temp_path, &full_path).await.map_err(|e| {
            warn!(from = %temp_path.display(), to = %full_path.display(), error = %e, "blob_store: rename failed");
            Error::Storage(e.to_string())
        })?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&full_path, std::fs::Permissions::from_mode(0o644))
                .await
                .map_err(|e| Error::Storage(e.to_string()))?;
        }

        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>> {
        let full_path = self.full_path(key)?;
        fs::read(&full_path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::NotFound(format!("blob not found: {key}"))
            } else {
                Error::Storage(e.to_string())
            }
        })
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let full_path = self.full_path(key)?;
        match fs::remove_file(&full_path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::Storage(e.to_string())),
        }
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let full_path = self.full_path(key)?;
        fs::try_exists(&full_path)
            .await
            .map_err(|e| Error::Storage(e.to_string()))
    }

    fn signed_url(&self, key: &str, expires_in_secs: u64) -> Result<String> {
        validate_key(key)?;
        let expires = chrono::Utc::now().timestamp() + expires_in_secs as i64;
        let sig = sign(&self.signing_secret, key, expires);
        Ok(format!(
            "{}/api/files/{}?expires={}&sig={}",
            self.public_base_url,
            encode_key_for_url(key),
            expires,
            sig
        ))
    }

    fn verify_signature(&self, key: &str, expires_unix: i64, sig: &str) -> bool {
        verify(&self.signing_secret, key, expires_unix, sig)
    }

    async fn check(&self) -> Result<()> {
        fs::create_dir_all(&self.base_path)
            .await
            .map_err(|e| Error::Storage(e.to_string()))?;
        Ok(())
    }
}

/// In-memory blob store for tests.
///
/// Shares the signing scheme with `FilesystemStore` so signed-URL behavior
/// can be tested without a filesystem. `fail_reads`/`fail_writes` inject
/// storage faults for failure-path tests.
#[derive(Default)]
pub struct MemoryStore {
    blobs: std::sync::Mutex<std::collections::HashMap<String, Vec<u8>>>,
    fail_reads: std::sync::atomic::AtomicBool,
    fail_writes: std::sync::atomic::AtomicBool,
}

impl MemoryStore {
    const SIGNING_SECRET: &'static [u8] = b"memory-store-test-secret";

    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `get` fail with a storage error.
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads
            .store(fail, std::sync::atomic::Ordering::SeqCst);
    }

    /// Make every subsequent `put` fail with a storage error.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes
            .store(fail, std::sync::atomic::Ordering::SeqCst);
    }

    /// Number of stored blobs.
    pub fn len(&self) -> usize {
        self.blobs.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl BlobStore for MemoryStore {
    async fn put(&self, key: &str, data: &[u8], _content_type: &str) -> Result<()> {
        validate_key(key)?;
        if self.fail_writes.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(Error::Storage("injected write failure".to_string()));
        }
        self.blobs
            .lock()
            .unwrap()
            .insert(key.to_string(), data.to_vec());
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>> {
        validate_key(key)?;
        if self.fail_reads.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(Error::Storage("injected read failure".to_string()));
        }
        self.blobs
            .lock()
            .unwrap()
            .get(key)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("blob not found: {key}")))
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.blobs.lock().unwrap().remove(key);
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.blobs.lock().unwrap().contains_key(key))
    }

    fn signed_url(&self, key: &str, expires_in_secs: u64) -> Result<String> {
        validate_key(key)?;
        let expires = chrono::Utc::now().timestamp() + expires_in_secs as i64;
        let sig = sign(Self::SIGNING_SECRET, key, expires);
        Ok(format!(
            "http://localhost/api/files/{}?expires={}&sig={}",
            encode_key_for_url(key),
            expires,
            sig
        ))
    }

    fn verify_signature(&self, key: &str, expires_unix: i64, sig: &str) -> bool {
        verify(Self::SIGNING_SECRET, key, expires_unix, sig)
    }

    async fn check(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn fs_store(dir: &TempDir) -> FilesystemStore {
        FilesystemStore::new(dir.path(), "http://localhost:3000", b"test-secret".to_vec())
    }

    #[tokio::test]
    async fn test_put_get_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = fs_store(&dir);

        store
            .put("uploads/abc/report.pdf", b"%PDF-1.7", "application/pdf")
            .await
            .unwrap();
        let data = store.get("uploads/abc/report.pdf").await.unwrap();
        assert_eq!(data, b"%PDF-1.7");
        assert!(store.exists("uploads/abc/report.pdf").await.unwrap());
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let dir = TempDir::new().unwrap();
        let store = fs_store(&dir);

        let err = store.get("processed/missing/file.md").await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let store = fs_store(&dir);

        store.put("uploads/x/a.pdf", b"data", "application/pdf").await.unwrap();
        store.delete("uploads/x/a.pdf").await.unwrap();
        store.delete("uploads/x/a.pdf").await.unwrap();
        assert!(!store.exists("uploads/x/a.pdf").await.unwrap());
    }

    #[tokio::test]
    async fn test_rejects_traversal_keys() {
        let dir = TempDir::new().unwrap();
        let store = fs_store(&dir);

        for key in ["../escape", "/absolute", "a/../../b", "back\\slash", ""] {
            assert!(store.get(key).await.is_err(), "key {key:?} should be rejected");
        }
    }

    #[tokio::test]
    async fn test_validate_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = fs_store(&dir);
        store.validate().await.unwrap();
    }

    #[tokio::test]
    async fn test_signed_url_verifies() {
        let dir = TempDir::new().unwrap();
        let store = fs_store(&dir);

        let url = store.signed_url("processed/abc/doc.md", 3600).unwrap();
        assert!(url.starts_with("http://localhost:3000/api/files/processed/abc/doc.md?"));

        // Extract expires and sig back out of the URL
        let query = url.split('?').nth(1).unwrap();
        let mut expires = 0i64;
        let mut sig = String::new();
        for pair in query.split('&') {
            let (k, v) = pair.split_once('=').unwrap();
            match k {
                "expires" => expires = v.parse().unwrap(),
                "sig" => sig = v.to_string(),
                _ => {}
            }
        }

        assert!(store.verify_signature("processed/abc/doc.md", expires, &sig));
        // Wrong key, tampered expiry, and garbage sig all fail
        assert!(!store.verify_signature("processed/abc/other.md", expires, &sig));
        assert!(!store.verify_signature("processed/abc/doc.md", expires + 1, &sig));
        assert!(!store.verify_signature("processed/abc/doc.md", expires, "deadbeef"));
    }

    #[tokio::test]
    async fn test_expired_signature_rejected() {
        let dir = TempDir::new().unwrap();
        let store = fs_store(&dir);

        let expires = chrono::Utc::now().timestamp() - 10;
        let sig = sign(b"test-secret", "processed/abc/doc.md", expires);
        assert!(!store.verify_signature("processed/abc/doc.md", expires, &sig));
    }

    #[tokio::test]
    async fn test_memory_store_fault_injection() {
        let store = MemoryStore::new();
        store.put("uploads/a/b.pdf", b"data", "application/pdf").await.unwrap();

        store.set_fail_reads(true);
        assert!(matches!(
            store.get("uploads/a/b.pdf").await.unwrap_err(),
            Error::Storage(_)
        ));

        store.set_fail_reads(false);
        assert_eq!(store.get("uploads/a/b.pdf").await.unwrap(), b"data");
    }

    #[test]
    fn test_key_encoding_preserves_separators() {
        assert_eq!(
            encode_key_for_url("processed/abc/Мой_отчёт.md"),
            format!(
                "processed/abc/{}",
                urlencoding::encode("Мой_отчёт.md")
            )
        );
    }
}
