use crate::config::toml_config::TomlConfig;
use crate::core::search::{SearchFilters, SortConfig, SortDirection, SortKey};
use crate::utils::error::Result;
use crate::utils::validation::Validate;
use clap::{Parser, Subcommand, ValueEnum};

#[derive(Debug, Clone, Parser)]
#[command(name = "lens-finder")]
#[command(about = "Find lens stock by optical prescription or QR code")]
pub struct CliConfig {
    #[arg(long, global = true, help = "Inventory data directory (overrides config file)")]
    pub data_dir: Option<String>,

    #[arg(long, global = true, help = "Path to a TOML config file")]
    pub config: Option<String>,

    #[arg(long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Emit logs as JSON")]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Import lens stock from a CSV file
    Import {
        file: String,
        #[arg(long)]
        batch_size: Option<usize>,
    },
    /// Search lens stock
    Search(SearchArgs),
    /// List main / sub categories
    Categories {
        #[arg(long)]
        json: bool,
    },
    /// Print selectable power values
    Range {
        #[arg(value_enum)]
        kind: RangeKind,
    },
    /// Show the canonical form of a prescription
    #[command(allow_negative_numbers = true)]
    Transpose {
        #[arg(allow_hyphen_values = true)]
        sph: String,
        #[arg(allow_hyphen_values = true)]
        cyl: String,
    },
    /// Generate a MySQL import script from a CSV file
    ExportSql {
        file: String,
        #[arg(long, default_value = "insert_lenses.sql")]
        output: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RangeKind {
    Sph,
    Cyl,
}

#[derive(Debug, Clone, clap::Args)]
pub struct SearchArgs {
    #[arg(long, allow_hyphen_values = true)]
    pub sph: Option<String>,

    #[arg(long, allow_hyphen_values = true)]
    pub cyl: Option<String>,

    #[arg(long)]
    pub main_category: Option<String>,

    #[arg(long)]
    pub sub_category: Option<String>,

    #[arg(long, help = "Match QR code or category text")]
    pub search: Option<String>,

    #[arg(long, conflicts_with = "search", help = "Scanned QR code contents")]
    pub qr: Option<String>,

    #[arg(long, help = "Discount percentage (0-100)")]
    pub discount: Option<f64>,

    #[arg(long, value_enum)]
    pub sort: Option<SortKey>,

    #[arg(long, requires = "sort")]
    pub desc: bool,

    #[arg(long)]
    pub json: bool,
}

impl SearchArgs {
    pub fn filters(&self, default_discount: f64) -> SearchFilters {
        if let Some(code) = &self.qr {
            let mut filters = SearchFilters::from_scan(code);
            filters.discount = self.discount.unwrap_or(default_discount);
            return filters;
        }

        SearchFilters {
            sph: self.sph.clone().unwrap_or_default(),
            cyl: self.cyl.clone().unwrap_or_default(),
            main_category: self.main_category.clone().unwrap_or_default(),
            sub_category: self.sub_category.clone().unwrap_or_default(),
            discount: self.discount.unwrap_or(default_discount),
            search: self.search.clone().unwrap_or_default(),
        }
    }

    pub fn sort_config(&self) -> Option<SortConfig> {
        self.sort.map(|key| SortConfig {
            key,
            direction: if self.desc {
                SortDirection::Descending
            } else {
                SortDirection::Ascending
            },
        })
    }
}

impl CliConfig {
    /// 讀取設定檔（若有）並套用命令列覆寫
    pub fn resolve(&self) -> Result<TomlConfig> {
        let mut config = match &self.config {
            Some(path) => TomlConfig::from_file(path)?,
            None => TomlConfig::default(),
        };

        if let Some(data_dir) = &self.data_dir {
            config.inventory.data_dir = data_dir.clone();
        }
        if let Command::Import {
            batch_size: Some(batch_size),
            ..
        } = &self.command
        {
            config.import.batch_size = *batch_size;
        }

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::ConfigProvider;

    #[test]
    fn test_parse_search_with_negative_powers() {
        let cli = CliConfig::parse_from([
            "lens-finder",
            "search",
            "--sph",
            "-1.25",
            "--cyl",
            "+0.50",
            "--sort",
            "price",
            "--desc",
        ]);

        let Command::Search(args) = &cli.command else {
            panic!("expected search command");
        };
        let filters = args.filters(0.0);
        assert_eq!(filters.sph, "-1.25");
        assert_eq!(filters.cyl, "+0.50");
        assert_eq!(
            args.sort_config(),
            Some(SortConfig {
                key: SortKey::Price,
                direction: SortDirection::Descending,
            })
        );
    }

    #[test]
    fn test_qr_scan_uses_search_text() {
        let cli = CliConfig::parse_from(["lens-finder", "search", "--qr", "LENS-77"]);
        let Command::Search(args) = &cli.command else {
            panic!("expected search command");
        };
        let filters = args.filters(5.0);
        assert_eq!(filters.search, "LENS-77");
        assert_eq!(filters.discount, 5.0);
    }

    #[test]
    fn test_resolve_applies_overrides() {
        let cli = CliConfig::parse_from([
            "lens-finder",
            "--data-dir",
            "/tmp/stock",
            "import",
            "stock.csv",
            "--batch-size",
            "50",
        ]);
        let config = cli.resolve().unwrap();
        assert_eq!(config.data_dir(), "/tmp/stock");
        assert_eq!(config.batch_size(), 50);
    }

    #[test]
    fn test_resolve_rejects_zero_batch_size() {
        let cli = CliConfig::parse_from(["lens-finder", "import", "stock.csv", "--batch-size", "0"]);
        assert!(cli.resolve().is_err());
    }

    #[test]
    fn test_transpose_accepts_hyphen_values() {
        let cli = CliConfig::parse_from(["lens-finder", "transpose", "-2", "1"]);
        assert!(matches!(cli.command, Command::Transpose { ref sph, .. } if sph == "-2"));
    }
}
