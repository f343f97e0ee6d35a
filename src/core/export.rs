use crate::core::import::read_lens_rows;
use crate::domain::model::Lens;
use crate::utils::error::Result;
use crate::utils::validation::validate_positive_number;

const INSERT_HEADER: &str = "INSERT INTO lenses (sph, cyl, price, main_category, sub_category, diameter, qr_code, MAINCATEGORYEN, SUBCATEGORYEN) VALUES";

const UPSERT_CLAUSE: &str = "ON DUPLICATE KEY UPDATE
    sph = VALUES(sph),
    cyl = VALUES(cyl),
    price = VALUES(price),
    main_category = VALUES(main_category),
    sub_category = VALUES(sub_category),
    diameter = VALUES(diameter),
    MAINCATEGORYEN = VALUES(MAINCATEGORYEN),
    SUBCATEGORYEN = VALUES(SUBCATEGORYEN)";

#[derive(Debug, Clone)]
pub struct SqlScript {
    pub sql: String,
    pub rows: usize,
    pub skipped: usize,
    pub invalid: usize,
}

/// 由庫存 CSV 產生 MySQL 匯入腳本，度數與 CSV 匯入走同一套正規化
pub struct SqlExporter {
    batch_size: usize,
}

impl SqlExporter {
    pub fn new(batch_size: usize) -> Result<Self> {
        validate_positive_number("batch_size", batch_size, 1)?;
        Ok(Self { batch_size })
    }

    pub fn render_csv(&self, data: &[u8]) -> Result<SqlScript> {
        let rows = read_lens_rows(data)?;
        tracing::info!("🧾 Generating SQL for {} lenses", rows.lenses.len());

        Ok(SqlScript {
            sql: self.render(&rows.lenses),
            rows: rows.lenses.len(),
            skipped: rows.skipped,
            invalid: rows.invalid,
        })
    }

    pub fn render(&self, lenses: &[Lens]) -> String {
        let mut sql = String::from("SET FOREIGN_KEY_CHECKS = 0;\n");

        for batch in lenses.chunks(self.batch_size) {
            let values: Vec<String> = batch.iter().map(render_values).collect();
            sql.push_str(INSERT_HEADER);
            sql.push('\n');
            sql.push_str(&values.join(",\n"));
            sql.push('\n');
            sql.push_str(UPSERT_CLAUSE);
            sql.push_str(";\n");
        }

        sql
    }
}

fn render_values(lens: &Lens) -> String {
    format!(
        "({}, {}, {}, {}, {}, {}, {}, {}, {})",
        escape_sql(&lens.sph),
        escape_sql(&lens.cyl),
        lens.price,
        escape_sql(&lens.main_category),
        escape_sql(&lens.sub_category),
        lens.diameter,
        escape_sql(&lens.qr_code),
        escape_sql(&lens.main_category_en),
        escape_sql(&lens.sub_category_en),
    )
}

/// 單引號字串，內部的 `'` 重複一次
pub fn escape_sql(value: &str) -> String {
    format!("'{}'", value.trim().replace('\'', "''"))
}
