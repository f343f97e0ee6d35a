use crate::domain::model::{Categories, Lens, LensQuery, PricedLens, SearchResults};
use crate::domain::optics::{round2, Power, Prescription};
use crate::domain::ports::LensRepository;
use crate::utils::error::Result;
use crate::utils::validation::validate_range;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// 使用者在表單中輸入的原始條件（文字未經處理）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchFilters {
    pub sph: String,
    pub cyl: String,
    pub main_category: String,
    pub sub_category: String,
    /// 折扣百分比 0-100
    pub discount: f64,
    pub search: String,
}

impl SearchFilters {
    /// 掃描 QR code 後的搜尋條件
    pub fn from_scan(code: &str) -> Self {
        Self {
            search: code.trim().to_string(),
            ..Default::default()
        }
    }

    /// 轉成查詢條件。SPH、CYL 都有值時先做 transposition 再編碼；
    /// 只有其中一個時單獨編碼。無法解析的度數回傳 `InvalidPowerError`。
    pub fn build_query(&self) -> Result<LensQuery> {
        let sph = non_empty(&self.sph);
        let cyl = non_empty(&self.cyl);

        let (sph, cyl) = match (sph, cyl) {
            (Some(sph), Some(cyl)) => {
                let encoded = Prescription::parse(sph, cyl)?.encode();
                (Some(encoded.sph), Some(encoded.cyl))
            }
            (Some(sph), None) => (Some(Power::parse("SPH", sph)?.encode()), None),
            (None, Some(cyl)) => (None, Some(Power::parse("CYL", cyl)?.encode())),
            (None, None) => (None, None),
        };

        Ok(LensQuery {
            sph,
            cyl,
            main_category: non_empty(&self.main_category).map(str::to_string),
            sub_category: non_empty(&self.sub_category).map(str::to_string),
            search: non_empty(&self.search).map(str::to_string),
        })
    }
}

fn non_empty(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

pub fn validate_discount(discount: f64) -> Result<()> {
    validate_range("discount", discount, 0.0, 100.0)
}

/// `price * (1 - discount / 100)`，取到小數第二位
pub fn discounted_price(price: f64, discount: f64) -> f64 {
    round2(price * (1.0 - discount / 100.0))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    Category,
    QrCode,
    Price,
    Sph,
    Cyl,
    Diameter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortConfig {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl SortConfig {
    /// 再點同一欄時切換方向，換欄位則從升冪開始
    pub fn toggle(current: Option<SortConfig>, key: SortKey) -> SortConfig {
        let direction = match current {
            Some(c) if c.key == key && c.direction == SortDirection::Ascending => {
                SortDirection::Descending
            }
            _ => SortDirection::Ascending,
        };
        SortConfig { key, direction }
    }
}

fn power_value(text: &str) -> f64 {
    Power::parse("power", text).map(Power::value).unwrap_or(0.0)
}

fn compare_lenses(a: &Lens, b: &Lens, key: SortKey) -> Ordering {
    match key {
        SortKey::Category => a.main_category.cmp(&b.main_category),
        SortKey::QrCode => a.qr_code.cmp(&b.qr_code),
        SortKey::Price => a.price.total_cmp(&b.price),
        SortKey::Sph => power_value(&a.sph).total_cmp(&power_value(&b.sph)),
        SortKey::Cyl => power_value(&a.cyl).total_cmp(&power_value(&b.cyl)),
        SortKey::Diameter => a.diameter.total_cmp(&b.diameter),
    }
}

/// 穩定排序，相同值保持原順序
pub fn sort_lenses(lenses: &mut [PricedLens], sort: SortConfig) {
    lenses.sort_by(|a, b| {
        let ordering = compare_lenses(&a.lens, &b.lens, sort.key);
        match sort.direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    });
}

pub struct LensFinder<R: LensRepository> {
    repository: R,
}

impl<R: LensRepository> LensFinder<R> {
    pub fn new(repository: R) -> Self {
        Self { repository }
    }

    pub async fn search(
        &self,
        filters: &SearchFilters,
        sort: Option<SortConfig>,
    ) -> Result<SearchResults> {
        validate_discount(filters.discount)?;
        let query = filters.build_query()?;

        tracing::info!("🔎 Searching lenses: {}", query.to_query_string());

        let found = self.repository.find(&query).await?;
        let mut lenses: Vec<PricedLens> = found
            .into_iter()
            .map(|lens| PricedLens {
                discounted_price: discounted_price(lens.price, filters.discount),
                lens,
            })
            .collect();

        if let Some(sort) = sort {
            sort_lenses(&mut lenses, sort);
        }

        tracing::info!("Found {} lenses", lenses.len());

        Ok(SearchResults {
            query,
            discount: filters.discount,
            lenses,
        })
    }

    pub async fn categories(&self) -> Result<Categories> {
        self.repository.categories().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::InMemoryRepository;
    use crate::utils::error::LensError;

    fn lens(qr: &str, sph: &str, cyl: &str, price: f64) -> Lens {
        Lens {
            qr_code: qr.to_string(),
            sph: sph.to_string(),
            cyl: cyl.to_string(),
            price,
            diameter: 70.0,
            main_category: "Single Vision".to_string(),
            sub_category: "1.56".to_string(),
            main_category_en: String::new(),
            sub_category_en: String::new(),
        }
    }

    #[test]
    fn test_build_query_transposes_when_both_present() {
        let filters = SearchFilters {
            sph: "-1".to_string(),
            cyl: "+1".to_string(),
            ..Default::default()
        };
        let query = filters.build_query().unwrap();
        assert_eq!(query.sph.as_deref(), Some("+00.00"));
        assert_eq!(query.cyl.as_deref(), Some("-01.00"));
    }

    #[test]
    fn test_build_query_formats_single_power() {
        let filters = SearchFilters {
            sph: "1.5".to_string(),
            ..Default::default()
        };
        let query = filters.build_query().unwrap();
        assert_eq!(query.sph.as_deref(), Some("+01.50"));
        assert_eq!(query.cyl, None);

        let filters = SearchFilters {
            cyl: "0.75".to_string(),
            ..Default::default()
        };
        let query = filters.build_query().unwrap();
        assert_eq!(query.cyl.as_deref(), Some("+00.75"));
    }

    #[test]
    fn test_build_query_rejects_non_numeric() {
        let filters = SearchFilters {
            sph: "abc".to_string(),
            cyl: "-1".to_string(),
            ..Default::default()
        };
        let err = filters.build_query().unwrap_err();
        assert_eq!(err.user_friendly_message(), "Please enter a valid SPH value");

        let filters = SearchFilters {
            cyl: "x".to_string(),
            ..Default::default()
        };
        let err = filters.build_query().unwrap_err();
        assert_eq!(err.user_friendly_message(), "Please enter a valid CYL value");
    }

    #[test]
    fn test_build_query_omits_blank_fields() {
        let filters = SearchFilters {
            main_category: "  ".to_string(),
            search: " QR-9 ".to_string(),
            ..Default::default()
        };
        let query = filters.build_query().unwrap();
        assert_eq!(query.main_category, None);
        assert_eq!(query.search.as_deref(), Some("QR-9"));
    }

    #[test]
    fn test_from_scan() {
        let filters = SearchFilters::from_scan("LENS-0042\n");
        assert_eq!(filters.search, "LENS-0042");
        assert!(filters.sph.is_empty());
    }

    #[test]
    fn test_discounted_price() {
        assert_eq!(discounted_price(100.0, 0.0), 100.0);
        assert_eq!(discounted_price(100.0, 15.0), 85.0);
        assert_eq!(discounted_price(59.99, 10.0), 53.99);
        assert!(validate_discount(101.0).is_err());
        assert!(validate_discount(-1.0).is_err());
    }

    #[test]
    fn test_sort_toggle() {
        let first = SortConfig::toggle(None, SortKey::Price);
        assert_eq!(first.direction, SortDirection::Ascending);
        let second = SortConfig::toggle(Some(first), SortKey::Price);
        assert_eq!(second.direction, SortDirection::Descending);
        let other = SortConfig::toggle(Some(second), SortKey::Sph);
        assert_eq!(other.direction, SortDirection::Ascending);
    }

    #[test]
    fn test_sort_powers_numerically() {
        let mut lenses: Vec<PricedLens> = ["+02.00", "-10.00", "-02.00", "+10.00"]
            .iter()
            .enumerate()
            .map(|(i, sph)| PricedLens {
                lens: lens(&format!("QR-{}", i), sph, "+00.00", 1.0),
                discounted_price: 1.0,
            })
            .collect();

        sort_lenses(
            &mut lenses,
            SortConfig {
                key: SortKey::Sph,
                direction: SortDirection::Ascending,
            },
        );
        let order: Vec<&str> = lenses.iter().map(|l| l.lens.sph.as_str()).collect();
        assert_eq!(order, vec!["-10.00", "-02.00", "+02.00", "+10.00"]);
    }

    #[tokio::test]
    async fn test_search_applies_discount_and_sort() {
        let repo = InMemoryRepository::with_lenses(vec![
            lens("QR-1", "+00.00", "-01.00", 200.0),
            lens("QR-2", "+00.00", "-01.00", 100.0),
            lens("QR-3", "+01.00", "-01.00", 50.0),
        ]);
        let finder = LensFinder::new(repo);

        let filters = SearchFilters {
            sph: "-1".to_string(),
            cyl: "1".to_string(),
            discount: 10.0,
            ..Default::default()
        };
        let results = finder
            .search(
                &filters,
                Some(SortConfig {
                    key: SortKey::Price,
                    direction: SortDirection::Descending,
                }),
            )
            .await
            .unwrap();

        assert_eq!(results.lenses.len(), 2);
        assert_eq!(results.lenses[0].lens.qr_code, "QR-1");
        assert_eq!(results.lenses[0].discounted_price, 180.0);
        assert_eq!(results.lenses[1].discounted_price, 90.0);
    }

    #[tokio::test]
    async fn test_search_rejects_bad_discount() {
        let finder = LensFinder::new(InMemoryRepository::new());
        let filters = SearchFilters {
            discount: 150.0,
            ..Default::default()
        };
        let result = finder.search(&filters, None).await;
        assert!(matches!(
            result,
            Err(LensError::InvalidConfigValueError { .. })
        ));
    }
}
