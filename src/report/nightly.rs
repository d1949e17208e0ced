use super::page::{data_table, fmt_opt, html_escape, key_value_table, plot_grid, Page};
use super::{night_filename, ReportOptions, CALENDAR_FILE, SUMMARY_FILE};
use crate::data::{Exposure, Tile};
use crate::plot::charts;
use crate::stats::NightSummary;

/// Neighbouring nights for the previous/next links.
#[derive(Debug, Clone, Copy, Default)]
pub struct Neighbours<'a> {
    pub previous: Option<&'a str>,
    pub next: Option<&'a str>,
}

/// Render the page for one night. `exposures` must already be restricted to
/// that night.
pub fn render(
    summary: &NightSummary,
    exposures: &[&Exposure],
    tiles: &[Tile],
    neighbours: Neighbours<'_>,
    opts: &ReportOptions,
) -> String {
    let night = summary.night.as_str();

    let overview = key_value_table(&[
        ("Exposures", summary.n_exposures.to_string()),
        ("Tiles", summary.n_tiles.to_string()),
        ("First-time tiles", summary.n_new_tiles.to_string()),
        (
            "Total exposure time",
            format!("{:.2} h", summary.total_exptime / 3600.0),
        ),
        ("First MJD", format!("{:.5}", summary.first_mjd)),
        ("Last MJD", format!("{:.5}", summary.last_mjd)),
        ("Median airmass", fmt_opt(summary.median_airmass, 3)),
        ("Median seeing [arcsec]", fmt_opt(summary.median_seeing, 2)),
    ]);

    let mut figures = vec![charts::night_sky_plot(tiles, exposures)];
    figures.extend(charts::night_time_series(exposures));

    let mut ordered: Vec<&Exposure> = exposures.to_vec();
    ordered.sort_by(|a, b| a.mjd.total_cmp(&b.mjd));
    let rows: Vec<Vec<String>> = ordered
        .iter()
        .map(|e| {
            vec![
                e.expid.map_or_else(|| "-".to_string(), |id| id.to_string()),
                e.tileid.to_string(),
                e.program.clone().unwrap_or_else(|| "-".to_string()),
                format!("{:.5}", e.mjd),
                fmt_opt(e.exptime, 1),
                fmt_opt(e.airmass, 3),
                fmt_opt(e.seeing, 2),
                format!("{:.1}", e.hour_angle),
            ]
        })
        .collect();
    let table = data_table(
        &[
            "EXPID", "TILEID", "PROGRAM", "MJD", "EXPTIME", "AIRMASS", "SEEING", "HA",
        ],
        &rows,
    );

    let mut page = Page::new(format!("{} - Night {night}", opts.title)).link(SUMMARY_FILE, "Summary");
    if opts.calendar {
        page = page.link(CALENDAR_FILE, "Calendar");
    }
    if let Some(prev) = neighbours.previous {
        page = page.link(night_filename(prev), format!("Previous ({prev})"));
    }
    if let Some(next) = neighbours.next {
        page = page.link(night_filename(next), format!("Next ({next})"));
    }

    page.section(format!("<h1>Night {}</h1>", html_escape(night)))
        .section(overview)
        .section(plot_grid(&figures))
        .section(format!("<h2>Exposures</h2>\n{table}"))
        .render()
}
