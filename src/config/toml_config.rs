use crate::core::import::DEFAULT_BATCH_SIZE;
use crate::domain::optics::PowerRange;
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{LensError, Result};
use crate::utils::validation::{
    validate_non_empty_string, validate_path, validate_positive_number, validate_power_bounds,
    validate_range, Validate,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub inventory: InventoryConfig,
    pub import: ImportConfig,
    pub ranges: RangesConfig,
    pub search: SearchConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InventoryConfig {
    pub data_dir: String,
    pub snapshot_file: String,
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            data_dir: "./data".to_string(),
            snapshot_file: "inventory.json".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    pub batch_size: usize,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RangesConfig {
    pub sph: PowerRange,
    pub cyl: PowerRange,
}

impl Default for RangesConfig {
    fn default() -> Self {
        Self {
            sph: PowerRange::SPHERE,
            cyl: PowerRange::CYLINDER,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub default_discount: f64,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(LensError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置，`${VAR}` 以環境變數替換
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| LensError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    // 找不到的變數保留原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| LensError::ConfigError {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        validate_path("inventory.data_dir", &self.inventory.data_dir)?;
        validate_non_empty_string("inventory.snapshot_file", &self.inventory.snapshot_file)?;
        validate_positive_number("import.batch_size", self.import.batch_size, 1)?;

        let RangesConfig { sph, cyl } = &self.ranges;
        validate_power_bounds("ranges.sph", sph.min, sph.max, sph.step)?;
        validate_power_bounds("ranges.cyl", cyl.min, cyl.max, cyl.step)?;

        validate_range("search.default_discount", self.search.default_discount, 0.0, 100.0)
    }
}

impl ConfigProvider for TomlConfig {
    fn data_dir(&self) -> &str {
        &self.inventory.data_dir
    }

    fn snapshot_file(&self) -> &str {
        &self.inventory.snapshot_file
    }

    fn batch_size(&self) -> usize {
        self.import.batch_size
    }

    fn sphere_range(&self) -> PowerRange {
        self.ranges.sph
    }

    fn cylinder_range(&self) -> PowerRange {
        self.ranges.cyl
    }

    fn default_discount(&self) -> f64 {
        self.search.default_discount
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
