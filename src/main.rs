use clap::Parser;
use lens_finder::config::{Command, RangeKind, SearchArgs};
use lens_finder::core::ConfigProvider;
use lens_finder::domain::model::SearchResults;
use lens_finder::domain::optics::{PowerSign, Prescription};
use lens_finder::domain::ports::Storage;
use lens_finder::utils::error::{ErrorSeverity, LensError};
use lens_finder::utils::logger;
use lens_finder::utils::validation::validate_file_extensions;
use lens_finder::{
    CliConfig, CsvImporter, LensFinder, LocalStorage, SnapshotRepository, SqlExporter, TomlConfig,
};
use std::path::Path;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    // 初始化日誌
    if cli.json_logs {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::debug!("CLI config: {:?}", cli);

    if let Err(e) = run(&cli).await {
        tracing::error!(
            "❌ Command failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 建議: {}", e.recovery_suggestion());

        let exit_code = match e.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        };
        if exit_code > 0 {
            std::process::exit(exit_code);
        }
    }

    Ok(())
}

async fn run(cli: &CliConfig) -> Result<(), LensError> {
    let config = cli.resolve()?;

    match &cli.command {
        Command::Import { file, .. } => import(&config, file).await,
        Command::Search(args) => search(&config, args).await,
        Command::Categories { json } => categories(&config, *json).await,
        Command::Range { kind } => {
            let range = match kind {
                RangeKind::Sph => config.sphere_range(),
                RangeKind::Cyl => config.cylinder_range(),
            };
            for value in range.values() {
                println!("{}", value);
            }
            Ok(())
        }
        Command::Transpose { sph, cyl } => {
            let prescription = Prescription::parse(sph, cyl)?;
            let encoded = prescription.encode();
            println!("SPH {}  CYL {}", encoded.sph, encoded.cyl);
            Ok(())
        }
        Command::ExportSql { file, output } => export_sql(&config, file, output).await,
    }
}

async fn open_repository(config: &TomlConfig) -> Result<SnapshotRepository<LocalStorage>, LensError> {
    let storage = LocalStorage::new(config.data_dir());
    SnapshotRepository::open(storage, config.snapshot_file()).await
}

async fn read_csv(file: &str) -> Result<Vec<u8>, LensError> {
    validate_file_extensions("file", &[file.to_string()], &["csv"])?;
    // 相對路徑以目前目錄為準
    LocalStorage::new(".").read_file(file).await
}

async fn import(config: &TomlConfig, file: &str) -> Result<(), LensError> {
    let data = read_csv(file).await?;
    let repository = open_repository(config).await?;
    let importer = CsvImporter::new(repository, config.batch_size())?;

    let summary = importer.import(&data).await?;
    tracing::info!("✅ {}", summary.message);
    println!(
        "✅ {}: total {}, success {}, failed {}, skipped {}, invalid {}",
        summary.message,
        summary.total,
        summary.success,
        summary.failed,
        summary.skipped,
        summary.invalid
    );
    Ok(())
}

async fn search(config: &TomlConfig, args: &SearchArgs) -> Result<(), LensError> {
    let finder = LensFinder::new(open_repository(config).await?);
    let filters = args.filters(config.default_discount());
    let results = finder.search(&filters, args.sort_config()).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else {
        print_results(&results);
    }
    Ok(())
}

fn sign_marker(text: &str) -> &'static str {
    match PowerSign::of_text(text) {
        PowerSign::Negative => "▼",
        PowerSign::Zero => " ",
        PowerSign::Positive => "▲",
    }
}

fn print_results(results: &SearchResults) {
    println!("Available Lenses ({})", results.lenses.len());
    if results.discount > 0.0 {
        println!("{}% Discount Applied", results.discount);
    }
    if results.lenses.is_empty() {
        println!("No lenses found. Adjust filters and search again.");
        return;
    }

    println!(
        "{:<20} {:<16} {:>10} {:>8} {:>8} {:>8}",
        "Category", "QR Code", "Price", "SPH", "CYL", "Diameter"
    );
    for priced in &results.lenses {
        let lens = &priced.lens;
        println!(
            "{:<20} {:<16} {:>10.2} {}{:>7} {}{:>7} {:>8}",
            lens.main_category,
            lens.qr_code,
            priced.discounted_price,
            sign_marker(&lens.sph),
            lens.sph,
            sign_marker(&lens.cyl),
            lens.cyl,
            lens.diameter
        );
    }
}

async fn categories(config: &TomlConfig, json: bool) -> Result<(), LensError> {
    let finder = LensFinder::new(open_repository(config).await?);
    let categories = finder.categories().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&categories)?);
        return Ok(());
    }

    for (main, subs) in &categories.sub_categories_by_main {
        println!("{}: {}", main, subs.join(", "));
    }
    let orphan_mains = categories
        .main_categories
        .iter()
        .filter(|main| !categories.sub_categories_by_main.contains_key(*main));
    for main in orphan_mains {
        println!("{}", main);
    }
    Ok(())
}

async fn export_sql(config: &TomlConfig, file: &str, output: &str) -> Result<(), LensError> {
    let data = read_csv(file).await?;
    let script = SqlExporter::new(config.batch_size())?.render_csv(&data)?;

    let output_path = Path::new(output);
    let storage = LocalStorage::new(
        output_path
            .parent()
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_default(),
    );
    let file_name = output_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| LensError::ValidationError {
            message: format!("output path '{}' has no file name", output),
        })?;
    storage.write_file(&file_name, script.sql.as_bytes()).await?;

    println!(
        "✅ Wrote {} rows to {} ({} skipped, {} invalid)",
        script.rows, output, script.skipped, script.invalid
    );
    println!("To import, run: mysql -u [user] -p [db_name] < {}", output);
    Ok(())
}
