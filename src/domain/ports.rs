use crate::domain::model::{Categories, Lens, LensQuery};
use crate::domain::optics::PowerRange;
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn data_dir(&self) -> &str;
    fn snapshot_file(&self) -> &str;
    fn batch_size(&self) -> usize;
    fn sphere_range(&self) -> PowerRange;
    fn cylinder_range(&self) -> PowerRange;
    fn default_discount(&self) -> f64;
}

/// 庫存表。寫入端必須已經正規化 `sph` / `cyl`。
#[async_trait]
pub trait LensRepository: Send + Sync {
    async fn find(&self, query: &LensQuery) -> Result<Vec<Lens>>;
    async fn categories(&self) -> Result<Categories>;
    /// 以 QR code 為鍵新增或覆寫，回傳寫入筆數
    async fn upsert_batch(&self, lenses: &[Lens]) -> Result<usize>;
}

#[async_trait]
impl<T: LensRepository + ?Sized> LensRepository for std::sync::Arc<T> {
    async fn find(&self, query: &LensQuery) -> Result<Vec<Lens>> {
        (**self).find(query).await
    }

    async fn categories(&self) -> Result<Categories> {
        (**self).categories().await
    }

    async fn upsert_batch(&self, lenses: &[Lens]) -> Result<usize> {
        (**self).upsert_batch(lenses).await
    }
}
