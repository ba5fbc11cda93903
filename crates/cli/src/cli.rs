use std::path::PathBuf;

use clap::Parser;

/// Rebuild the integrated CB auction statistics document from the source workbook.
#[derive(Parser, Debug, Clone)]
#[command(name = "cb-update", author, version, about, long_about = None)]
pub struct Cli {
    /// Workbook holding the auction and instrument sheets (.xlsx, .xls, .ods)
    #[arg(
        value_name = "WORKBOOK",
        required_unless_present_all = ["auctions", "instruments"],
        conflicts_with_all = ["auctions", "instruments"]
    )]
    pub workbook: Option<PathBuf>,

    /// CSV export of the auction history sheet (instead of a workbook)
    #[arg(long, value_name = "CSV", requires = "instruments")]
    pub auctions: Option<PathBuf>,

    /// CSV export of the instrument name sheet (instead of a workbook)
    #[arg(long, value_name = "CSV", requires = "auctions")]
    pub instruments: Option<PathBuf>,

    /// Output JSON path (overrides the config file)
    #[arg(long, short, value_name = "JSON")]
    pub output: Option<PathBuf>,

    /// TOML configuration file
    #[arg(long, short, value_name = "TOML")]
    pub config: Option<PathBuf>,

    /// Write single-line JSON instead of pretty-printed
    #[arg(long)]
    pub compact: bool,

    /// Fail on the first unusable row instead of skipping it
    #[arg(long)]
    pub strict: bool,
}

/// Where the two sheets come from.
#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    Workbook(PathBuf),
    Csv { auctions: PathBuf, instruments: PathBuf },
}

impl Cli {
    pub fn input(&self) -> Option<Input> {
        match (&self.workbook, &self.auctions, &self.instruments) {
            (Some(workbook), _, _) => Some(Input::Workbook(workbook.clone())),
            (None, Some(auctions), Some(instruments)) => Some(Input::Csv {
                auctions: auctions.clone(),
                instruments: instruments.clone(),
            }),
            _ => None,
        }
    }
}
