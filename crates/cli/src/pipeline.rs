//! Load, compute, assemble, write.

use std::path::PathBuf;

use anyhow::{Context, Result};
use cb_auction_core::config::SourceConfig;
use cb_auction_core::{AuctionRecord, Config, InstrumentRecord};
use cb_auction_ingestion::{AuctionLoader, InstrumentLoader, LoadedSheet, Workbook};
use cb_auction_report::summary::total_partitions;
use cb_auction_report::{log_summary, write_json, InstrumentRegistry, IntegratedDocument};
use cb_auction_stats::StatisticsEngine;
use chrono::NaiveDateTime;
use tracing::{info, warn};

use crate::cli::{Cli, Input};

/// What a run produced.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub output: PathBuf,
    pub bytes: u64,
    pub auctions_used: usize,
    pub auctions_skipped: usize,
    pub instruments: usize,
    pub partitions: usize,
}

/// Configuration from file (or defaults), with command-line overrides applied.
pub fn resolve_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::from_path(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => Config::default(),
    };
    if let Some(output) = &cli.output {
        config.output.path = output.display().to_string();
    }
    if cli.compact {
        config.output.pretty = false;
    }
    Ok(config)
}

type Sheets = (LoadedSheet<AuctionRecord>, LoadedSheet<InstrumentRecord>);

/// Load both sheets from the workbook or the CSV pair.
pub fn load_sheets(input: &Input, source: &SourceConfig) -> Result<Sheets> {
    match input {
        Input::Workbook(path) => {
            let mut workbook = Workbook::open(path)
                .with_context(|| format!("failed to open workbook {}", path.display()))?;
            let auctions = workbook
                .sheet(&source.auction_sheet)
                .and_then(|range| AuctionLoader::from_range(&range))
                .with_context(|| format!("failed to load auction sheet {}", source.auction_sheet))?;
            let instruments = workbook
                .sheet(&source.instrument_sheet)
                .and_then(|range| InstrumentLoader::from_range(&range))
                .with_context(|| format!("failed to load instrument sheet {}", source.instrument_sheet))?;
            Ok((auctions, instruments))
        }
        Input::Csv { auctions, instruments } => {
            let auction_sheet = AuctionLoader::from_path(auctions)
                .with_context(|| format!("failed to load auction sheet {}", auctions.display()))?;
            let instrument_sheet = InstrumentLoader::from_path(instruments)
                .with_context(|| format!("failed to load instrument sheet {}", instruments.display()))?;
            Ok((auction_sheet, instrument_sheet))
        }
    }
}

pub fn run(cli: &Cli, generated_at: NaiveDateTime) -> Result<RunSummary> {
    let config = resolve_config(cli)?;
    let input = cli
        .input()
        .context("either a workbook or both --auctions and --instruments are required")?;

    let (mut auctions, mut instruments) = load_sheets(&input, &config.source)?;
    if cli.strict {
        auctions = auctions.into_strict().context("unusable row in auction sheet")?;
        instruments = instruments.into_strict().context("unusable row in instrument sheet")?;
    }
    if !auctions.row_errors.is_empty() {
        warn!(skipped = auctions.row_errors.len(), "auction rows skipped");
    }
    if !instruments.row_errors.is_empty() {
        warn!(skipped = instruments.row_errors.len(), "instrument rows skipped");
    }

    let statistics = StatisticsEngine::new(&config)
        .compute(&auctions.records, generated_at)
        .context("failed to compute statistics")?;
    log_summary(&statistics);
    let partitions = total_partitions(&statistics);

    let registry = InstrumentRegistry::build(instruments.records);
    let instrument_count = registry.len();
    let document = IntegratedDocument::assemble(statistics, registry);

    let output = PathBuf::from(&config.output.path);
    let bytes = write_json(&output, &document, config.output.pretty)
        .with_context(|| format!("failed to write {}", output.display()))?;
    info!(path = %output.display(), kib = bytes as f64 / 1024.0, "update complete");

    Ok(RunSummary {
        output,
        bytes,
        auctions_used: auctions.rows_used(),
        auctions_skipped: auctions.row_errors.len(),
        instruments: instrument_count,
        partitions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::fs;
    use std::path::Path;

    const AUCTIONS: &str = "\
開標日期,產業分類,發行規模,股本,年期,擔保,信評,轉換價,理論價,最低得標,最低溢價,平均得標,平均溢價
2025/10/05,電子,6,12,3,無擔保,BBB,88,101,104,2%,106,4%
2025/10/20,電子,6,12,3,無擔保,BBB,88,101,104,4%,106,6%
2025/03/01,生技,3,4,5,有擔保,6,45,97,102,6%,103,7%
2025/10/31,航運,12,25,3,無擔保,BBB,160,111,109,5%,110,6%
not-a-date,航運,12,25,3,無擔保,BBB,160,111,109,5%,110,6%
";

    const INSTRUMENTS: &str = "\
股票代號,代號,名稱,掛牌最高,掛牌最低,資金用途
2330,23301,台積一,118.5,105,償還銀行借款
1582,15821,信錦一,,,
";

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("cb-update-{}-{}", name, std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn base_cli(dir: &Path) -> Cli {
        Cli {
            workbook: None,
            auctions: None,
            instruments: None,
            output: Some(dir.join("out.json")),
            config: None,
            compact: false,
            strict: false,
        }
    }

    fn csv_cli(dir: &Path) -> Cli {
        let auctions = dir.join("auctions.csv");
        let instruments = dir.join("instruments.csv");
        fs::write(&auctions, AUCTIONS).unwrap();
        fs::write(&instruments, INSTRUMENTS).unwrap();
        Cli {
            auctions: Some(auctions),
            instruments: Some(instruments),
            ..base_cli(dir)
        }
    }

    fn workbook_cli(dir: &Path) -> Cli {
        let workbook = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../ingestion/testdata/cb_sample.xlsx");
        Cli {
            workbook: Some(workbook),
            ..base_cli(dir)
        }
    }

    fn generated_at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 11, 4).unwrap().and_hms_opt(9, 15, 0).unwrap()
    }

    fn read_output(summary: &RunSummary) -> serde_json::Value {
        let text = fs::read_to_string(&summary.output).unwrap();
        assert_eq!(summary.bytes as usize, text.len());
        serde_json::from_str(&text).unwrap()
    }

    fn assert_scenario(value: &serde_json::Value) {
        let stats = &value["統計數據"];
        assert_eq!(stats["資料期間"]["總筆數"], 4);
        assert_eq!(stats["資料期間"]["開始"], "2025-03-01");
        assert_eq!(stats["更新時間"], "2025-11-04 09:15:00");
        assert_eq!(stats["維度統計"]["產業"]["電子"]["樣本數"], 2);
        assert_eq!(stats["維度統計"]["產業"]["電子"]["平均最低溢價"], 3.0);
        assert_eq!(stats["維度統計"]["信評"]["6-7分"]["樣本數"], 1);
        assert_eq!(stats["市場氛圍"]["近1月"]["趨勢"], "強勢上升");

        let registry = &value["CB資料庫"];
        assert_eq!(registry["23301"]["名稱"], "台積一");
        assert!(registry["15821"]["掛牌最高"].is_null());
    }

    #[test]
    fn test_end_to_end_from_csv() {
        let dir = scratch_dir("csv");
        let summary = run(&csv_cli(&dir), generated_at()).unwrap();

        assert_eq!(summary.auctions_used, 4);
        assert_eq!(summary.auctions_skipped, 1);
        assert_eq!(summary.instruments, 2);
        // industry 3, issue size 3, capital 3, tenor 2, guarantee 2, rating 2, conversion 3, theoretical 3
        assert_eq!(summary.partitions, 21);
        assert_scenario(&read_output(&summary));

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_end_to_end_from_workbook() {
        let dir = scratch_dir("workbook");
        let summary = run(&workbook_cli(&dir), generated_at()).unwrap();

        assert_eq!(summary.auctions_used, 4);
        assert_eq!(summary.auctions_skipped, 1);
        assert_eq!(summary.instruments, 2);
        let value = read_output(&summary);
        assert_scenario(&value);
        assert!(value["CB資料庫"].get("99991").is_none());

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_strict_fails_on_skipped_row() {
        let dir = scratch_dir("strict");
        let mut cli = csv_cli(&dir);
        cli.strict = true;

        let err = run(&cli, generated_at()).unwrap_err();
        let chain = format!("{err:#}");
        assert!(chain.contains("unusable row in auction sheet"));
        assert!(chain.contains("Row 6"));
        assert!(!dir.join("out.json").exists());

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_compact_flag_overrides_config() {
        let dir = scratch_dir("compact");
        let mut cli = csv_cli(&dir);
        cli.compact = true;

        let config = resolve_config(&cli).unwrap();
        assert!(!config.output.pretty);
        assert_eq!(config.output.path, dir.join("out.json").display().to_string());

        let summary = run(&cli, generated_at()).unwrap();
        let text = fs::read_to_string(&summary.output).unwrap();
        assert!(!text.contains('\n'));

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_config_file_is_applied() {
        let dir = scratch_dir("config");
        let mut cli = csv_cli(&dir);
        let config_path = dir.join("cb.toml");
        fs::write(&config_path, "[source]\nlabel = \"測試來源\"\n").unwrap();
        cli.config = Some(config_path);

        let summary = run(&cli, generated_at()).unwrap();
        assert_eq!(read_output(&summary)["統計數據"]["資料來源"], "測試來源");

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_missing_sheet_in_workbook() {
        let dir = scratch_dir("nosheet");
        let mut cli = workbook_cli(&dir);
        let config_path = dir.join("cb.toml");
        fs::write(&config_path, "[source]\nauction_sheet = \"05_不存在\"\n").unwrap();
        cli.config = Some(config_path);

        let err = run(&cli, generated_at()).unwrap_err();
        assert!(format!("{err:#}").contains("failed to load auction sheet 05_不存在"));

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_missing_input_reports_context() {
        let dir = scratch_dir("missing");
        let mut cli = csv_cli(&dir);
        cli.auctions = Some(dir.join("nope.csv"));

        let err = run(&cli, generated_at()).unwrap_err();
        assert!(format!("{err:#}").contains("failed to load auction sheet"));
        assert!(!dir.join("out.json").exists());

        fs::remove_dir_all(&dir).unwrap();
    }
}
