/// Report layer: assembles statistics and figures into static HTML pages.
///
/// ```text
///   SurveyData ──► summary  ──► summary.html
///              ──► nightly  ──► night-YYYYMMDD.html  (one per night)
///              ──► calendar ──► calendar.html
/// ```
pub mod calendar;
pub mod nightly;
pub mod page;
pub mod summary;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::info;

use crate::data::{Exposure, Tile};
use crate::error::QaError;
use crate::stats;

pub const SUMMARY_FILE: &str = "summary.html";
pub const CALENDAR_FILE: &str = "calendar.html";

/// File name of the page for `night`. Characters other than ASCII
/// letters, digits, `-` and `_` become `_`, so the page always lands in the
/// output directory.
pub fn night_filename(night: &str) -> String {
    let stem: String = night
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("night-{stem}.html")
}

/// Typed catalog rows the pages are built from.
#[derive(Debug, Clone, Default)]
pub struct SurveyData {
    pub exposures: Vec<Exposure>,
    /// Tiles in the survey footprint (flag filter already applied).
    pub tiles: Vec<Tile>,
}

#[derive(Debug, Clone)]
pub struct ReportOptions {
    pub title: String,
    /// Write `calendar.html` and link it from the other pages.
    pub calendar: bool,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            title: "Survey QA".to_string(),
            calendar: true,
        }
    }
}

/// What a report run wrote.
#[derive(Debug, Clone, Default)]
pub struct ReportOutput {
    pub files: Vec<PathBuf>,
    pub n_exposures: usize,
    pub n_tiles: usize,
    pub n_nights: usize,
}

fn write_page(path: PathBuf, html: &str, files: &mut Vec<PathBuf>) -> Result<()> {
    std::fs::write(&path, html).with_context(|| format!("writing {}", path.display()))?;
    info!("Wrote {}", path.display());
    files.push(path);
    Ok(())
}

/// Generate every report page into `outdir`: the summary, one page per
/// night in night order, then the calendar.
pub fn make_reports(data: &SurveyData, outdir: &Path, opts: &ReportOptions) -> Result<ReportOutput> {
    if data.exposures.is_empty() {
        return Err(QaError::NoExposures.into());
    }
    let exptiles = stats::unique_tiles(&data.exposures);
    info!(
        "Generating QA for {} exposures on {} tiles",
        data.exposures.len(),
        exptiles.len()
    );

    std::fs::create_dir_all(outdir)
        .with_context(|| format!("creating output directory {}", outdir.display()))?;

    let nights = stats::night_summaries(&data.exposures);
    let mut files = Vec::with_capacity(nights.len() + 2);

    let html = summary::render(data, &nights, opts)?;
    write_page(outdir.join(SUMMARY_FILE), &html, &mut files)?;

    let by_night = stats::group_by_night(&data.exposures);
    for (i, summary) in nights.iter().enumerate() {
        let exposures = by_night
            .get(&summary.night)
            .map(Vec::as_slice)
            .unwrap_or_default();
        let neighbours = nightly::Neighbours {
            previous: i.checked_sub(1).map(|p| nights[p].night.as_str()),
            next: nights.get(i + 1).map(|n| n.night.as_str()),
        };
        let html = nightly::render(summary, exposures, &data.tiles, neighbours, opts);
        write_page(outdir.join(night_filename(&summary.night)), &html, &mut files)?;
    }

    if opts.calendar {
        let labels: Vec<String> = nights.iter().map(|n| n.night.clone()).collect();
        let html = calendar::render(&labels, opts);
        write_page(outdir.join(CALENDAR_FILE), &html, &mut files)?;
    }

    Ok(ReportOutput {
        files,
        n_exposures: data.exposures.len(),
        n_tiles: exptiles.len(),
        n_nights: nights.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::tests::{exposure, tile};

    fn sample() -> SurveyData {
        SurveyData {
            exposures: vec![
                exposure("20191202", 2, 58820.2),
                exposure("20191201", 1, 58819.1),
                exposure("20191203", 3, 58821.3),
            ],
            tiles: vec![tile(1, Some("DARK")), tile(2, Some("BRIGHT")), tile(3, None)],
        }
    }

    #[test]
    fn writes_summary_nights_and_calendar() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("qa");
        let output = make_reports(&sample(), &out, &ReportOptions::default()).unwrap();

        let names: Vec<String> = output
            .files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            vec![
                "summary.html",
                "night-20191201.html",
                "night-20191202.html",
                "night-20191203.html",
                "calendar.html",
            ]
        );
        assert_eq!(output.n_nights, 3);
        assert_eq!(output.n_tiles, 3);
        assert!(output.files.iter().all(|p| p.exists()));

        let summary = std::fs::read_to_string(out.join(SUMMARY_FILE)).unwrap();
        assert!(summary.contains("Through night 20191203"));
        assert!(summary.contains("100.0%"));

        let middle = std::fs::read_to_string(out.join("night-20191202.html")).unwrap();
        assert!(middle.contains("Previous (20191201)"));
        assert!(middle.contains("Next (20191203)"));
    }

    #[test]
    fn calendar_can_be_disabled() {
        let dir = tempfile::tempdir().unwrap();
        let opts = ReportOptions {
            calendar: false,
            ..ReportOptions::default()
        };
        let output = make_reports(&sample(), dir.path(), &opts).unwrap();
        assert_eq!(output.files.len(), 4);
        assert!(!dir.path().join(CALENDAR_FILE).exists());
        let summary = std::fs::read_to_string(dir.path().join(SUMMARY_FILE)).unwrap();
        assert!(!summary.contains(CALENDAR_FILE));
    }

    #[test]
    fn night_filenames_stay_in_outdir() {
        assert_eq!(night_filename("20191201"), "night-20191201.html");
        assert_eq!(night_filename("2019/12/01"), "night-2019_12_01.html");
        assert_eq!(night_filename("../x"), "night-___x.html");
        assert_eq!(night_filename(r#"N"1"#), "night-N_1.html");
    }

    #[test]
    fn slashed_night_gets_its_own_page() {
        let dir = tempfile::tempdir().unwrap();
        let data = SurveyData {
            exposures: vec![
                exposure("2019/12/01", 1, 58819.1),
                exposure("20191202", 2, 58820.2),
            ],
            tiles: vec![tile(1, Some("DARK")), tile(2, Some("DARK"))],
        };
        let output = make_reports(&data, dir.path(), &ReportOptions::default()).unwrap();

        assert_eq!(output.n_nights, 2);
        assert!(output.files.iter().all(|p| p.parent() == Some(dir.path())));
        let page = std::fs::read_to_string(dir.path().join("night-2019_12_01.html")).unwrap();
        assert!(page.contains("Night 2019/12/01"));
        let summary = std::fs::read_to_string(dir.path().join(SUMMARY_FILE)).unwrap();
        assert!(summary.contains(r#"href="night-2019_12_01.html""#));
        assert!(dir.path().join(CALENDAR_FILE).exists());
    }

    #[test]
    fn no_exposures_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = make_reports(&SurveyData::default(), dir.path(), &ReportOptions::default())
            .unwrap_err();
        assert!(matches!(err.downcast_ref::<QaError>(), Some(QaError::NoExposures)));
        assert!(!dir.path().join(SUMMARY_FILE).exists());
    }
}
