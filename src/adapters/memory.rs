use crate::domain::model::{Categories, Lens, LensQuery};
use crate::domain::ports::LensRepository;
use crate::utils::error::Result;
use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

/// 以 QR code 為鍵的記憶體庫存表
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    lenses: RwLock<BTreeMap<String, Lens>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_lenses(lenses: Vec<Lens>) -> Self {
        let map = lenses
            .into_iter()
            .map(|lens| (lens.qr_code.clone(), lens))
            .collect();
        Self {
            lenses: RwLock::new(map),
        }
    }

    pub async fn len(&self) -> usize {
        self.lenses.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.lenses.read().await.is_empty()
    }

    pub async fn snapshot(&self) -> Vec<Lens> {
        self.lenses.read().await.values().cloned().collect()
    }
}

#[async_trait]
impl LensRepository for InMemoryRepository {
    async fn find(&self, query: &LensQuery) -> Result<Vec<Lens>> {
        let lenses = self.lenses.read().await;
        let found: Vec<Lens> = lenses
            .values()
            .filter(|lens| query.matches(lens))
            .cloned()
            .collect();
        tracing::debug!("Query {:?} matched {} lenses", query, found.len());
        Ok(found)
    }

    async fn categories(&self) -> Result<Categories> {
        let lenses = self.lenses.read().await;
        Ok(Categories::collect(lenses.values()))
    }

    async fn upsert_batch(&self, batch: &[Lens]) -> Result<usize> {
        let mut lenses = self.lenses.write().await;
        for lens in batch {
            lenses.insert(lens.qr_code.clone(), lens.clone());
        }
        Ok(batch.len())
    }
}
