use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use url::form_urlencoded;

/// 一筆鏡片庫存。`sph` / `cyl` 儲存的是正規化後的編碼字串。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lens {
    pub qr_code: String,
    pub sph: String,
    pub cyl: String,
    pub price: f64,
    pub diameter: f64,
    #[serde(default)]
    pub main_category: String,
    #[serde(default)]
    pub sub_category: String,
    #[serde(default)]
    pub main_category_en: String,
    #[serde(default)]
    pub sub_category_en: String,
}

/// 送往查詢端的條件。所有欄位以 AND 組合。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LensQuery {
    pub sph: Option<String>,
    pub cyl: Option<String>,
    pub main_category: Option<String>,
    pub sub_category: Option<String>,
    pub search: Option<String>,
}

impl LensQuery {
    /// `sph` / `cyl` / 分類為精確比對；`search` 為不分大小寫的子字串比對
    /// （QR code、主分類、子分類任一命中即可）。
    pub fn matches(&self, lens: &Lens) -> bool {
        let exact = |filter: &Option<String>, value: &str| {
            filter.as_deref().map_or(true, |expected| expected == value)
        };

        if !exact(&self.sph, &lens.sph)
            || !exact(&self.cyl, &lens.cyl)
            || !exact(&self.main_category, &lens.main_category)
            || !exact(&self.sub_category, &lens.sub_category)
        {
            return false;
        }

        match self.search.as_deref() {
            None => true,
            Some(needle) => {
                let needle = needle.to_lowercase();
                [&lens.qr_code, &lens.main_category, &lens.sub_category]
                    .iter()
                    .any(|field| field.to_lowercase().contains(&needle))
            }
        }
    }

    /// 查詢參數字串，例如 `sph=%2B01.00&cyl=-02.50`
    pub fn to_query_string(&self) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        let pairs = [
            ("sph", &self.sph),
            ("cyl", &self.cyl),
            ("mainCategory", &self.main_category),
            ("subCategory", &self.sub_category),
            ("search", &self.search),
        ];
        for (key, value) in pairs {
            if let Some(value) = value {
                serializer.append_pair(key, value);
            }
        }
        serializer.finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Categories {
    pub main_categories: Vec<String>,
    pub sub_categories: Vec<String>,
    pub sub_categories_by_main: BTreeMap<String, Vec<String>>,
}

impl Categories {
    /// 收集不重複、非空白的分類並排序
    pub fn collect<'a, I>(lenses: I) -> Self
    where
        I: IntoIterator<Item = &'a Lens>,
    {
        let mut main = BTreeSet::new();
        let mut sub = BTreeSet::new();
        let mut by_main: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();

        for lens in lenses {
            let main_name = lens.main_category.trim();
            let sub_name = lens.sub_category.trim();

            if !main_name.is_empty() {
                main.insert(main_name.to_string());
            }
            if !sub_name.is_empty() {
                sub.insert(sub_name.to_string());
                if !main_name.is_empty() {
                    by_main
                        .entry(main_name.to_string())
                        .or_default()
                        .insert(sub_name.to_string());
                }
            }
        }

        Self {
            main_categories: main.into_iter().collect(),
            sub_categories: sub.into_iter().collect(),
            sub_categories_by_main: by_main
                .into_iter()
                .map(|(k, v)| (k, v.into_iter().collect()))
                .collect(),
        }
    }
}

/// 附上折扣價的查詢結果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PricedLens {
    #[serde(flatten)]
    pub lens: Lens,
    pub discounted_price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResults {
    pub query: LensQuery,
    pub discount: f64,
    pub lenses: Vec<PricedLens>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportSummary {
    pub message: String,
    pub total: usize,
    pub success: usize,
    pub failed: usize,
    pub skipped: usize,
    pub invalid: usize,
    pub completed_at: DateTime<Utc>,
}
