use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::data::{Exposure, Tile};

/// Program label for tiles without one.
pub const UNKNOWN_PROGRAM: &str = "UNKNOWN";

// ---------------------------------------------------------------------------
// Grouping
// ---------------------------------------------------------------------------

/// Distinct tile ids that have at least one exposure.
pub fn unique_tiles(exposures: &[Exposure]) -> BTreeSet<i64> {
    exposures.iter().map(|e| e.tileid).collect()
}

/// Distinct nights, ascending.
pub fn nights(exposures: &[Exposure]) -> Vec<String> {
    let set: BTreeSet<&str> = exposures.iter().map(|e| e.night.as_str()).collect();
    set.into_iter().map(str::to_string).collect()
}

pub fn group_by_night(exposures: &[Exposure]) -> BTreeMap<String, Vec<&Exposure>> {
    let mut groups: BTreeMap<String, Vec<&Exposure>> = BTreeMap::new();
    for exp in exposures {
        groups.entry(exp.night.clone()).or_default().push(exp);
    }
    groups
}

/// Night on which each tile was first observed.
pub fn first_night_per_tile(exposures: &[Exposure]) -> BTreeMap<i64, String> {
    let mut first: BTreeMap<i64, String> = BTreeMap::new();
    for exp in exposures {
        first
            .entry(exp.tileid)
            .and_modify(|night| {
                if exp.night < *night {
                    night.clone_from(&exp.night);
                }
            })
            .or_insert_with(|| exp.night.clone());
    }
    first
}

// ---------------------------------------------------------------------------
// Per-night summary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NightSummary {
    pub night: String,
    pub n_exposures: usize,
    pub n_tiles: usize,
    /// Tiles observed for the first time this night.
    pub n_new_tiles: usize,
    /// Seconds.
    pub total_exptime: f64,
    pub first_mjd: f64,
    pub last_mjd: f64,
    pub median_airmass: Option<f64>,
    pub median_seeing: Option<f64>,
}

/// Summarize one night's exposures. `first_nights` comes from
/// [`first_night_per_tile`] over the whole survey.
pub fn summarize_night(
    night: &str,
    exposures: &[&Exposure],
    first_nights: &BTreeMap<i64, String>,
) -> NightSummary {
    let tiles: BTreeSet<i64> = exposures.iter().map(|e| e.tileid).collect();
    let n_new_tiles = tiles
        .iter()
        .filter(|t| first_nights.get(t).is_some_and(|n| n == night))
        .count();
    let airmass: Vec<f64> = exposures.iter().filter_map(|e| e.airmass).collect();
    let seeing: Vec<f64> = exposures.iter().filter_map(|e| e.seeing).collect();

    NightSummary {
        night: night.to_string(),
        n_exposures: exposures.len(),
        n_tiles: tiles.len(),
        n_new_tiles,
        total_exptime: exposures.iter().filter_map(|e| e.exptime).sum(),
        first_mjd: exposures.iter().map(|e| e.mjd).fold(f64::INFINITY, f64::min),
        last_mjd: exposures
            .iter()
            .map(|e| e.mjd)
            .fold(f64::NEG_INFINITY, f64::max),
        median_airmass: median(&airmass),
        median_seeing: median(&seeing),
    }
}

/// One summary per night, in night order.
pub fn night_summaries(exposures: &[Exposure]) -> Vec<NightSummary> {
    let first_nights = first_night_per_tile(exposures);
    group_by_night(exposures)
        .iter()
        .map(|(night, exps)| summarize_night(night, exps, &first_nights))
        .collect()
}

// ---------------------------------------------------------------------------
// Survey-wide summary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SurveySummary {
    pub n_exposures: usize,
    pub n_nights: usize,
    pub n_tiles_total: usize,
    /// Tiles of the tile table with at least one exposure.
    pub n_tiles_observed: usize,
    /// `n_tiles_observed / n_tiles_total`, 0 when there are no tiles.
    pub completion: f64,
    pub last_night: Option<String>,
    pub total_exptime_hours: f64,
}

pub fn summarize_survey(exposures: &[Exposure], tiles: &[Tile]) -> SurveySummary {
    let observed = unique_tiles(exposures);
    let tile_ids: BTreeSet<i64> = tiles.iter().map(|t| t.tileid).collect();
    let n_tiles_observed = tile_ids.intersection(&observed).count();
    let all_nights = nights(exposures);

    SurveySummary {
        n_exposures: exposures.len(),
        n_nights: all_nights.len(),
        n_tiles_total: tile_ids.len(),
        n_tiles_observed,
        completion: fraction(n_tiles_observed, tile_ids.len()),
        last_night: all_nights.last().cloned(),
        total_exptime_hours: exposures.iter().filter_map(|e| e.exptime).sum::<f64>() / 3600.0,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgramCompletion {
    pub program: String,
    pub n_tiles: usize,
    pub n_observed: usize,
    pub completion: f64,
}

fn tile_program(tile: &Tile) -> &str {
    tile.program.as_deref().unwrap_or(UNKNOWN_PROGRAM)
}

/// Completion per tile program, sorted by program name.
pub fn program_completion(exposures: &[Exposure], tiles: &[Tile]) -> Vec<ProgramCompletion> {
    let observed = unique_tiles(exposures);
    let mut by_program: BTreeMap<&str, BTreeSet<i64>> = BTreeMap::new();
    for tile in tiles {
        by_program
            .entry(tile_program(tile))
            .or_default()
            .insert(tile.tileid);
    }
    by_program
        .into_iter()
        .map(|(program, ids)| {
            let n_observed = ids.intersection(&observed).count();
            ProgramCompletion {
                program: program.to_string(),
                n_tiles: ids.len(),
                n_observed,
                completion: fraction(n_observed, ids.len()),
            }
        })
        .collect()
}

/// Distinct tile programs, sorted.
pub fn tile_programs(tiles: &[Tile]) -> BTreeSet<String> {
    tiles.iter().map(|t| tile_program(t).to_string()).collect()
}

// ---------------------------------------------------------------------------
// Progress over time
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressPoint {
    pub night: String,
    /// Last exposure of the night.
    pub mjd: f64,
    /// Cumulative tiles observed up to and including this night.
    pub n_observed: usize,
    pub completion: f64,
}

/// Cumulative completion after each night, optionally restricted to the
/// tiles of one program.
pub fn survey_progress(
    exposures: &[Exposure],
    tiles: &[Tile],
    program: Option<&str>,
) -> Vec<ProgressPoint> {
    let tile_ids: BTreeSet<i64> = tiles
        .iter()
        .filter(|t| program.map_or(true, |p| tile_program(t) == p))
        .map(|t| t.tileid)
        .collect();

    let mut seen: BTreeSet<i64> = BTreeSet::new();
    group_by_night(exposures)
        .into_iter()
        .map(|(night, exps)| {
            seen.extend(
                exps.iter()
                    .map(|e| e.tileid)
                    .filter(|id| tile_ids.contains(id)),
            );
            ProgressPoint {
                night,
                mjd: exps.iter().map(|e| e.mjd).fold(f64::NEG_INFINITY, f64::max),
                n_observed: seen.len(),
                completion: fraction(seen.len(), tile_ids.len()),
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Numeric helpers
// ---------------------------------------------------------------------------

fn fraction(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}

/// Median of the finite values.
pub fn median(values: &[f64]) -> Option<f64> {
    let mut finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() {
        return None;
    }
    finite.sort_by(f64::total_cmp);
    let mid = finite.len() / 2;
    if finite.len() % 2 == 0 {
        Some((finite[mid - 1] + finite[mid]) / 2.0)
    } else {
        Some(finite[mid])
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bin {
    pub lo: f64,
    pub hi: f64,
    pub count: usize,
}

/// Equal-width histogram over the range of the finite values.
pub fn histogram(values: &[f64], n_bins: usize) -> Vec<Bin> {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() || n_bins == 0 {
        return Vec::new();
    }
    let lo = finite.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = finite.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if hi - lo < f64::EPSILON {
        return vec![Bin {
            lo: lo - 0.5,
            hi: lo + 0.5,
            count: finite.len(),
        }];
    }

    let width = (hi - lo) / n_bins as f64;
    let mut counts = vec![0usize; n_bins];
    for v in finite {
        // The maximum lands in the last bin.
        let idx = (((v - lo) / width) as usize).min(n_bins - 1);
        counts[idx] += 1;
    }
    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| Bin {
            lo: lo + i as f64 * width,
            hi: lo + (i + 1) as f64 * width,
            count,
        })
        .collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn exposure(night: &str, tileid: i64, mjd: f64) -> Exposure {
        Exposure {
            expid: None,
            night: night.to_string(),
            mjd,
            ra: 150.0,
            dec: 0.0,
            tileid,
            exptime: Some(600.0),
            airmass: Some(1.2),
            seeing: None,
            transparency: None,
            sky: None,
            program: None,
            hour_angle: 0.0,
        }
    }

    pub(crate) fn tile(tileid: i64, program: Option<&str>) -> Tile {
        Tile {
            tileid,
            ra: tileid as f64,
            dec: 0.0,
            pass: None,
            program: program.map(str::to_string),
        }
    }

    fn sample() -> (Vec<Exposure>, Vec<Tile>) {
        let exposures = vec![
            exposure("20191202", 2, 58820.2),
            exposure("20191201", 1, 58819.1),
            exposure("20191201", 1, 58819.15),
            exposure("20191202", 3, 58820.3),
            exposure("20191202", 99, 58820.4),
        ];
        let tiles = vec![
            tile(1, Some("DARK")),
            tile(2, Some("DARK")),
            tile(3, Some("BRIGHT")),
            tile(4, None),
        ];
        (exposures, tiles)
    }

    #[test]
    fn nights_are_sorted_and_unique() {
        let (exposures, _) = sample();
        assert_eq!(nights(&exposures), vec!["20191201", "20191202"]);
        assert_eq!(group_by_night(&exposures)["20191201"].len(), 2);
    }

    #[test]
    fn first_night_per_tile_ignores_row_order() {
        let exposures = vec![exposure("20191203", 5, 0.0), exposure("20191201", 5, 0.0)];
        assert_eq!(first_night_per_tile(&exposures)[&5], "20191201");
    }

    #[test]
    fn night_summary_counts() {
        let (exposures, _) = sample();
        let summaries = night_summaries(&exposures);
        assert_eq!(summaries.len(), 2);
        let second = &summaries[1];
        assert_eq!(second.night, "20191202");
        assert_eq!(second.n_exposures, 3);
        assert_eq!(second.n_tiles, 3);
        assert_eq!(second.n_new_tiles, 3);
        assert_eq!(second.total_exptime, 1800.0);
        assert_eq!(second.first_mjd, 58820.2);
        assert_eq!(second.last_mjd, 58820.4);
        assert_eq!(second.median_airmass, Some(1.2));
        assert_eq!(second.median_seeing, None);
    }

    #[test]
    fn completion_only_counts_known_tiles() {
        let (exposures, tiles) = sample();
        let summary = summarize_survey(&exposures, &tiles);
        assert_eq!(summary.n_tiles_total, 4);
        assert_eq!(summary.n_tiles_observed, 3);
        assert!((summary.completion - 0.75).abs() < 1e-12);
        assert_eq!(summary.last_night.as_deref(), Some("20191202"));
        assert!((summary.total_exptime_hours - 5.0 * 600.0 / 3600.0).abs() < 1e-12);
    }

    #[test]
    fn empty_tile_table_has_zero_completion() {
        let (exposures, _) = sample();
        assert_eq!(summarize_survey(&exposures, &[]).completion, 0.0);
    }

    #[test]
    fn completion_by_program() {
        let (exposures, tiles) = sample();
        let rows = program_completion(&exposures, &tiles);
        let names: Vec<&str> = rows.iter().map(|r| r.program.as_str()).collect();
        assert_eq!(names, vec!["BRIGHT", "DARK", UNKNOWN_PROGRAM]);
        assert_eq!(rows[1].n_tiles, 2);
        assert_eq!(rows[1].n_observed, 2);
        assert_eq!(rows[1].completion, 1.0);
        assert_eq!(rows[2].completion, 0.0);
    }

    #[test]
    fn progress_is_cumulative() {
        let (exposures, tiles) = sample();
        let progress = survey_progress(&exposures, &tiles, None);
        assert_eq!(progress.len(), 2);
        assert_eq!(progress[0].n_observed, 1);
        assert_eq!(progress[0].mjd, 58819.15);
        assert_eq!(progress[1].n_observed, 3);
        assert!((progress[1].completion - 0.75).abs() < 1e-12);

        let dark = survey_progress(&exposures, &tiles, Some("DARK"));
        assert_eq!(dark[0].completion, 0.5);
        assert_eq!(dark[1].completion, 1.0);
    }

    #[test]
    fn median_skips_non_finite() {
        assert_eq!(median(&[]), None);
        assert_eq!(median(&[3.0, f64::NAN, 1.0]), Some(2.0));
        assert_eq!(median(&[5.0, 1.0, 3.0]), Some(3.0));
    }

    #[test]
    fn histogram_places_max_in_last_bin() {
        let bins = histogram(&[0.0, 1.0, 2.0, 3.0, 4.0], 4);
        assert_eq!(bins.len(), 4);
        assert_eq!(bins[0].lo, 0.0);
        assert_eq!(bins[3].hi, 4.0);
        let counts: Vec<usize> = bins.iter().map(|b| b.count).collect();
        assert_eq!(counts, vec![1, 1, 1, 2]);
    }

    #[test]
    fn histogram_degenerate_range() {
        let bins = histogram(&[7.0, 7.0], 10);
        assert_eq!(bins, vec![Bin { lo: 6.5, hi: 7.5, count: 2 }]);
        assert!(histogram(&[f64::NAN], 10).is_empty());
    }
}
