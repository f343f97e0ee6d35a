use crate::adapters::memory::InMemoryRepository;
use crate::domain::model::{Categories, Lens, LensQuery};
use crate::domain::ports::{LensRepository, Storage};
use crate::utils::error::{LensError, Result};
use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::Mutex;

/// 記憶體庫存 + JSON 快照。
///
/// 每個批次先把「目前庫存 + 本批」寫成快照，寫入成功後才併入記憶體，
/// 所以失敗的批次既不會留在記憶體，也不會被下一次快照帶上磁碟。
pub struct SnapshotRepository<S: Storage> {
    storage: S,
    file_name: String,
    inner: InMemoryRepository,
    // 序列化「組快照 → 寫檔 → 併入」，避免兩個批次交錯
    write_lock: Mutex<()>,
}

impl<S: Storage> SnapshotRepository<S> {
    /// 載入快照；檔案不存在時從空庫存開始
    pub async fn open(storage: S, file_name: impl Into<String>) -> Result<Self> {
        let file_name = file_name.into();

        let lenses = match storage.read_file(&file_name).await {
            Ok(bytes) => serde_json::from_slice::<Vec<Lens>>(&bytes)?,
            Err(LensError::IoError(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("📭 No snapshot at '{}', starting with empty inventory", file_name);
                Vec::new()
            }
            Err(e) => return Err(e),
        };

        tracing::debug!("Loaded {} lenses from '{}'", lenses.len(), file_name);

        Ok(Self {
            storage,
            file_name,
            inner: InMemoryRepository::with_lenses(lenses),
            write_lock: Mutex::new(()),
        })
    }

    pub async fn len(&self) -> usize {
        self.inner.len().await
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.is_empty().await
    }

    async fn persist(&self, lenses: Vec<&Lens>) -> Result<()> {
        let json = serde_json::to_vec_pretty(&lenses)?;
        self.storage
            .write_file(&self.file_name, &json)
            .await
            .map_err(|e| LensError::RepositoryError {
                message: format!("failed to write snapshot '{}': {}", self.file_name, e),
            })
    }
}

#[async_trait]
impl<S: Storage> LensRepository for SnapshotRepository<S> {
    async fn find(&self, query: &LensQuery) -> Result<Vec<Lens>> {
        self.inner.find(query).await
    }

    async fn categories(&self) -> Result<Categories> {
        self.inner.categories().await
    }

    async fn upsert_batch(&self, lenses: &[Lens]) -> Result<usize> {
        let _guard = self.write_lock.lock().await;

        let mut staged: BTreeMap<String, Lens> = self
            .inner
            .snapshot()
            .await
            .into_iter()
            .map(|lens| (lens.qr_code.clone(), lens))
            .collect();
        for lens in lenses {
            staged.insert(lens.qr_code.clone(), lens.clone());
        }

        self.persist(staged.values().collect()).await?;
        self.inner.upsert_batch(lenses).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Clone, Default)]
    struct MockStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
        // 接下來要失敗的寫入次數
        failing_writes: Arc<AtomicUsize>,
    }

    impl Storage for MockStorage {
        async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned().ok_or_else(|| {
                LensError::IoError(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("File not found: {}", path),
                ))
            })
        }

        async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            let failing = self
                .failing_writes
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
            if failing.is_ok() {
                return Err(LensError::IoError(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    "disk full",
                )));
            }

            let mut files = self.files.lock().await;
            files.insert(path.to_string(), data.to_vec());
            Ok(())
        }
    }

    fn lens(qr: &str) -> Lens {
        Lens {
            qr_code: qr.to_string(),
            sph: "+00.00".to_string(),
            cyl: "-01.00".to_string(),
            price: 50.0,
            diameter: 65.0,
            main_category: String::new(),
            sub_category: String::new(),
            main_category_en: String::new(),
            sub_category_en: String::new(),
        }
    }

    #[tokio::test]
    async fn test_open_missing_snapshot_is_empty() {
        let repo = SnapshotRepository::open(MockStorage::default(), "inventory.json")
            .await
            .unwrap();
        assert!(repo.is_empty().await);
    }

    #[tokio::test]
    async fn test_upsert_persists_and_reloads() {
        let storage = MockStorage::default();
        let repo = SnapshotRepository::open(storage.clone(), "inventory.json")
            .await
            .unwrap();
        repo.upsert_batch(&[lens("QR-1"), lens("QR-2")]).await.unwrap();

        let reopened = SnapshotRepository::open(storage, "inventory.json")
            .await
            .unwrap();
        assert_eq!(reopened.len().await, 2);
    }

    #[tokio::test]
    async fn test_failed_write_leaves_batch_out_of_memory_and_disk() {
        let storage = MockStorage::default();
        storage.failing_writes.store(1, Ordering::SeqCst);
        let repo = SnapshotRepository::open(storage.clone(), "inventory.json")
            .await
            .unwrap();

        let result = repo.upsert_batch(&[lens("QR-1"), lens("QR-2")]).await;
        assert!(matches!(result, Err(LensError::RepositoryError { .. })));
        assert!(repo.is_empty().await);

        repo.upsert_batch(&[lens("QR-3"), lens("QR-4")]).await.unwrap();
        assert_eq!(repo.len().await, 2);

        let reopened = SnapshotRepository::open(storage, "inventory.json")
            .await
            .unwrap();
        let codes: Vec<String> = reopened
            .inner
            .snapshot()
            .await
            .into_iter()
            .map(|l| l.qr_code)
            .collect();
        assert_eq!(codes, vec!["QR-3", "QR-4"]);
    }

    #[tokio::test]
    async fn test_corrupt_snapshot_is_an_error() {
        let storage = MockStorage::default();
        storage
            .write_file("inventory.json", b"not json")
            .await
            .unwrap();
        let result = SnapshotRepository::open(storage, "inventory.json").await;
        assert!(matches!(result, Err(LensError::SerializationError(_))));
    }
}
