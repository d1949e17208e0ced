//! Command-line interface and the top-level report run.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, info};
use serde::Serialize;

use crate::data::filter::{self, DEFAULT_FLAG_COLUMN};
use crate::data::loader::load_table;
use crate::data::model::{exposures_from_table, tiles_from_table};
use crate::report::{self, ReportOptions, ReportOutput, SurveyData};

/// Generate static HTML QA pages from survey exposure and tile catalogs.
#[derive(Debug, Clone, Parser)]
#[command(name = "surveyqa", version, about)]
pub struct Cli {
    /// Exposures table (.csv, .json or .parquet)
    #[arg(long, value_name = "PATH")]
    pub exposures: PathBuf,

    /// Tiles table (.csv, .json or .parquet)
    #[arg(long, value_name = "PATH")]
    pub tiles: PathBuf,

    /// Directory the HTML pages are written to
    #[arg(short, long, value_name = "DIR", default_value = ".")]
    pub outdir: PathBuf,

    /// Tiles column marking footprint membership
    #[arg(long, value_name = "NAME", default_value = DEFAULT_FLAG_COLUMN)]
    pub flag_column: String,

    /// Only report exposures of this program (repeatable)
    #[arg(long = "program", value_name = "NAME")]
    pub programs: Vec<String>,

    /// Skip calendar.html
    #[arg(long)]
    pub no_calendar: bool,

    /// Page title
    #[arg(long, default_value = "Survey QA")]
    pub title: String,

    /// Debug logging (RUST_LOG takes precedence)
    #[arg(short, long)]
    pub verbose: bool,
}

/// Resolved settings for one report run.
#[derive(Debug, Clone, Serialize)]
pub struct ReportConfig {
    pub exposures: PathBuf,
    pub tiles: PathBuf,
    pub outdir: PathBuf,
    pub flag_column: String,
    pub programs: Vec<String>,
    pub calendar: bool,
    pub title: String,
}

impl From<Cli> for ReportConfig {
    fn from(cli: Cli) -> Self {
        ReportConfig {
            exposures: cli.exposures,
            tiles: cli.tiles,
            outdir: cli.outdir,
            flag_column: cli.flag_column.trim().to_ascii_uppercase(),
            programs: cli.programs,
            calendar: !cli.no_calendar,
            title: cli.title,
        }
    }
}

impl ReportConfig {
    pub fn report_options(&self) -> ReportOptions {
        ReportOptions {
            title: self.title.clone(),
            calendar: self.calendar,
        }
    }
}

/// Load both catalogs, apply the tile flag filter and program selection,
/// and write the report pages.
pub fn run(config: &ReportConfig) -> Result<ReportOutput> {
    debug!(
        "Configuration: {}",
        serde_json::to_string(config).unwrap_or_else(|_| format!("{config:?}"))
    );

    let exposure_table = load_table(&config.exposures)?;
    let tile_table = load_table(&config.tiles)?;
    info!(
        "Read {} exposures and {} tiles",
        exposure_table.len(),
        tile_table.len()
    );

    let tile_table = filter::filter_by_flag(&tile_table, &config.flag_column);

    let selection = filter::program_filter(&exposure_table, &config.programs);
    let exposure_table = if selection.is_empty() {
        exposure_table
    } else {
        let kept = filter::filtered_indices(&exposure_table, &selection);
        info!(
            "Program selection {:?} kept {} of {} exposures",
            config.programs,
            kept.len(),
            exposure_table.len()
        );
        exposure_table.select(&kept)
    };

    let data = SurveyData {
        exposures: exposures_from_table(&exposure_table)
            .with_context(|| format!("reading exposures from {}", config.exposures.display()))?,
        tiles: tiles_from_table(&tile_table)
            .with_context(|| format!("reading tiles from {}", config.tiles.display()))?,
    };

    report::make_reports(&data, &config.outdir, &config.report_options())
}
