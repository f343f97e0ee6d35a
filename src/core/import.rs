use crate::domain::model::{ImportSummary, Lens};
use crate::domain::optics::Prescription;
use crate::domain::ports::LensRepository;
use crate::utils::error::Result;
use crate::utils::validation::validate_positive_number;
use chrono::Utc;
use csv::{ReaderBuilder, StringRecord, Trim};

pub const DEFAULT_BATCH_SIZE: usize = 500;

// 各欄位接受的標題寫法，依序取第一個非空值
const QR_CODE: &[&str] = &["QRCODE", "qrCode", "qrcode", "qr_code"];
const SPH: &[&str] = &["SPH", "sph"];
const CYL: &[&str] = &["CYL", "cyl"];
const PRICE: &[&str] = &["PRICE", "price"];
const DIAMETER: &[&str] = &["DIAMETER", "diameter"];
const MAIN_CATEGORY: &[&str] = &["MAINCATEGORY", "mainCategory", "main_category"];
const SUB_CATEGORY: &[&str] = &["SUBCATEGORY", "subCategory", "sub_category"];
const MAIN_CATEGORY_EN: &[&str] = &["MAINCATEGORYEN", "mainCategoryEn"];
const SUB_CATEGORY_EN: &[&str] = &["SUBCATEGORYEN", "subCategoryEn"];

/// CSV 解析結果。`lenses` 的 `sph` / `cyl` 已正規化。
#[derive(Debug, Clone, Default)]
pub struct LensRows {
    pub lenses: Vec<Lens>,
    pub total: usize,
    pub skipped: usize,
    pub invalid: usize,
}

struct Columns {
    headers: Vec<String>,
}

impl Columns {
    fn new(headers: &StringRecord) -> Self {
        Self {
            headers: headers
                .iter()
                .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
                .collect(),
        }
    }

    fn get<'r>(&self, record: &'r StringRecord, aliases: &[&str]) -> Option<&'r str> {
        aliases.iter().find_map(|alias| {
            let index = self.headers.iter().position(|h| h.as_str() == *alias)?;
            record.get(index).filter(|value| !value.is_empty())
        })
    }

    fn text(&self, record: &StringRecord, aliases: &[&str]) -> String {
        self.get(record, aliases).unwrap_or_default().to_string()
    }

    fn number(&self, record: &StringRecord, aliases: &[&str], row: usize) -> f64 {
        let Some(raw) = self.get(record, aliases) else {
            return 0.0;
        };
        match raw.parse::<f64>() {
            Ok(value) if value.is_finite() => value,
            _ => {
                tracing::warn!("Row {}: '{}' is not a number for {}, using 0", row, raw, aliases[0]);
                0.0
            }
        }
    }
}

/// 讀取庫存 CSV：沒有 QR code 的列略過，SPH / CYL 無法解析的列視為無效。
pub fn read_lens_rows(data: &[u8]) -> Result<LensRows> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(data);

    let columns = Columns::new(reader.headers()?);
    let mut rows = LensRows::default();

    for (index, record) in reader.records().enumerate() {
        // 第 1 列是標題
        let row = index + 2;
        rows.total += 1;

        let record = match record {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!("Row {}: unreadable record: {}", row, e);
                rows.invalid += 1;
                continue;
            }
        };

        let Some(qr_code) = columns.get(&record, QR_CODE) else {
            tracing::debug!("Row {}: no QR code, skipped", row);
            rows.skipped += 1;
            continue;
        };

        let raw_sph = columns.get(&record, SPH).unwrap_or("0");
        let raw_cyl = columns.get(&record, CYL).unwrap_or("0");
        let encoded = match Prescription::parse(raw_sph, raw_cyl) {
            Ok(prescription) => prescription.encode(),
            Err(e) => {
                tracing::warn!("Row {} ({}): {}", row, qr_code, e);
                rows.invalid += 1;
                continue;
            }
        };

        rows.lenses.push(Lens {
            qr_code: qr_code.to_string(),
            sph: encoded.sph,
            cyl: encoded.cyl,
            price: columns.number(&record, PRICE, row),
            diameter: columns.number(&record, DIAMETER, row),
            main_category: columns.text(&record, MAIN_CATEGORY),
            sub_category: columns.text(&record, SUB_CATEGORY),
            main_category_en: columns.text(&record, MAIN_CATEGORY_EN),
            sub_category_en: columns.text(&record, SUB_CATEGORY_EN),
        });
    }

    Ok(rows)
}

pub struct CsvImporter<R: LensRepository> {
    repository: R,
    batch_size: usize,
}

impl<R: LensRepository> CsvImporter<R> {
    pub fn new(repository: R, batch_size: usize) -> Result<Self> {
        validate_positive_number("batch_size", batch_size, 1)?;
        Ok(Self {
            repository,
            batch_size,
        })
    }

    /// 解析並分批寫入。單一批次失敗時整批計為失敗，繼續處理下一批。
    pub async fn import(&self, data: &[u8]) -> Result<ImportSummary> {
        let rows = read_lens_rows(data)?;
        tracing::info!(
            "📥 Parsed {} rows ({} valid, {} skipped, {} invalid)",
            rows.total,
            rows.lenses.len(),
            rows.skipped,
            rows.invalid
        );

        let mut success = 0;
        let mut failed = 0;

        for (batch_no, batch) in rows.lenses.chunks(self.batch_size).enumerate() {
            match self.repository.upsert_batch(batch).await {
                Ok(written) => {
                    tracing::debug!("Batch {}: {} lenses written", batch_no + 1, written);
                    success += batch.len();
                }
                Err(e) => {
                    tracing::error!("❌ Batch {} failed: {}", batch_no + 1, e);
                    failed += batch.len();
                }
            }
        }

        Ok(ImportSummary {
            message: "Upload processing complete".to_string(),
            total: rows.total,
            success,
            failed,
            skipped: rows.skipped,
            invalid: rows.invalid,
            completed_at: Utc::now(),
        })
    }
}
