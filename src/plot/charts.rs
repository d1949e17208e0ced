use std::collections::BTreeSet;

use super::Figure;
use crate::color::{Color, ColorMap};
use crate::data::{Exposure, Tile};
use crate::stats::{self, NightSummary, ProgressPoint};

const HOURS_PER_DAY: f64 = 24.0;

// ---------------------------------------------------------------------------
// Summary page
// ---------------------------------------------------------------------------

/// Sky map of the footprint: every tile in gray, observed tiles in red.
pub fn sky_plot(tiles: &[Tile], observed: &BTreeSet<i64>) -> Figure {
    let all: Vec<[f64; 2]> = tiles.iter().map(|t| [t.ra, t.dec]).collect();
    let done: Vec<[f64; 2]> = tiles
        .iter()
        .filter(|t| observed.contains(&t.tileid))
        .map(|t| [t.ra, t.dec])
        .collect();

    Figure::new("Observed Tiles", 600, 300)
        .x_label("RA [degrees]")
        .y_label("Declination [degrees]")
        .x_range(0.0, 360.0)
        .scatter(all, Color::GRAY, 1.0)
        .scatter(done, Color::RED, 3.0)
}

/// Completion in percent against MJD: overall, then one line per program.
pub fn progress_plot(
    overall: &[ProgressPoint],
    per_program: &[(String, Vec<ProgressPoint>)],
    color_map: &ColorMap,
) -> Figure {
    let to_points = |progress: &[ProgressPoint]| -> Vec<[f64; 2]> {
        progress
            .iter()
            .map(|p| [p.mjd, p.completion * 100.0])
            .collect()
    };

    let mut fig = Figure::new("Survey Progress", 300, 300)
        .x_label("MJD")
        .y_label("Tiles completed [%]")
        .line(to_points(overall), Color::BLACK, 2.0)
        .named("ALL");
    // A single program line would duplicate the overall one.
    if per_program.len() > 1 {
        for (program, progress) in per_program {
            fig = fig
                .line(to_points(progress), color_map.color_for(program), 1.5)
                .named(program.clone());
        }
    }
    fig
}

/// Bar chart of exposure counts, one bar per night.
pub fn exposures_per_night_plot(summaries: &[NightSummary]) -> Figure {
    let bars: Vec<[f64; 2]> = summaries
        .iter()
        .enumerate()
        .map(|(i, s)| [i as f64, s.n_exposures as f64])
        .collect();
    Figure::new("Exposures per Night", 600, 250)
        .x_label("Night")
        .y_label("Exposures")
        .categories(summaries.iter().map(|s| s.night.clone()).collect())
        .bars(bars, Color::STEEL_BLUE, 0.8)
}

/// Distribution of exposure hour angles.
pub fn hour_angle_histogram(exposures: &[Exposure]) -> Figure {
    let values: Vec<f64> = exposures.iter().map(|e| e.hour_angle).collect();
    let bins = stats::histogram(&values, 20);
    let width = bins.first().map_or(1.0, |b| b.hi - b.lo);
    let bars: Vec<[f64; 2]> = bins
        .iter()
        .map(|b| [(b.lo + b.hi) / 2.0, b.count as f64])
        .collect();
    Figure::new("Hour Angle Distribution", 300, 300)
        .x_label("Hour angle [degrees]")
        .y_label("Exposures")
        .bars(bars, Color::STEEL_BLUE, width)
}

// ---------------------------------------------------------------------------
// Nightly pages
// ---------------------------------------------------------------------------

/// Footprint with the tiles observed during one night highlighted.
pub fn night_sky_plot(tiles: &[Tile], night_exposures: &[&Exposure]) -> Figure {
    let all: Vec<[f64; 2]> = tiles.iter().map(|t| [t.ra, t.dec]).collect();
    let tonight: Vec<[f64; 2]> = night_exposures.iter().map(|e| [e.ra, e.dec]).collect();
    Figure::new("Tiles Observed Tonight", 450, 250)
        .x_label("RA [degrees]")
        .y_label("Declination [degrees]")
        .x_range(0.0, 360.0)
        .scatter(all, Color::LIGHT_GRAY, 1.0)
        .scatter(tonight, Color::DARK_RED, 3.0)
}

/// A per-exposure quantity against hours since the first exposure of the
/// night. Exposures where `value` is `None` are left out.
pub fn time_series<F>(title: &str, y_label: &str, night_exposures: &[&Exposure], value: F) -> Figure
where
    F: Fn(&Exposure) -> Option<f64>,
{
    let start = night_exposures
        .iter()
        .map(|e| e.mjd)
        .fold(f64::INFINITY, f64::min);
    let mut points: Vec<[f64; 2]> = night_exposures
        .iter()
        .filter_map(|e| value(e).map(|v| [(e.mjd - start) * HOURS_PER_DAY, v]))
        .collect();
    points.sort_by(|a, b| a[0].total_cmp(&b[0]));

    Figure::new(title, 300, 200)
        .x_label("Hours since first exposure")
        .y_label(y_label)
        .line(points.clone(), Color::STEEL_BLUE, 1.0)
        .scatter(points, Color::DARK_RED, 2.5)
}

/// The standard set of nightly time series.
pub fn night_time_series(night_exposures: &[&Exposure]) -> Vec<Figure> {
    vec![
        time_series("Exposure Time", "EXPTIME [s]", night_exposures, |e| e.exptime),
        time_series("Airmass", "Airmass", night_exposures, |e| e.airmass),
        time_series("Seeing", "Seeing [arcsec]", night_exposures, |e| e.seeing),
        time_series("Hour Angle", "Hour angle [degrees]", night_exposures, |e| {
            Some(e.hour_angle)
        }),
    ]
}
