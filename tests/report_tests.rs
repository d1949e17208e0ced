//! End-to-end tests: catalog files on disk → HTML pages on disk.
//!
//! Uses tempfile for inputs and the output directory.

use std::path::{Path, PathBuf};

use surveyqa::cli::{run, ReportConfig};
use surveyqa::QaError;
use tempfile::TempDir;

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

fn create_temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// Two nights, three tiles observed, one of them twice.
fn create_exposures_csv(dir: &Path) -> PathBuf {
    let path = dir.join("exposures.csv");
    let content = "\
EXPID,NIGHT,MJD,TILEID,RA,DEC,EXPTIME,AIRMASS,SEEING,PROGRAM
1,20191201,58819.10,1001,150.0,10.0,900,1.10,1.05,DARK
2,20191201,58819.12,1002,160.0,12.0,900,1.15,0.95,DARK
3,20191202,58820.10,1002,160.0,12.0,600,1.20,,DARK
4,20191202,58820.15,2001,200.0,30.0,300,1.05,1.30,BRIGHT
";
    std::fs::write(&path, content).unwrap();
    path
}

/// Five tiles, one outside the footprint.
fn create_tiles_json(dir: &Path) -> PathBuf {
    let path = dir.join("tiles.json");
    let content = r#"{
        "TILEID":  [1001, 1002, 1003, 2001, 9999],
        "RA":      [150.0, 160.0, 170.0, 200.0, 10.0],
        "DEC":     [10.0, 12.0, 14.0, 30.0, -60.0],
        "PROGRAM": ["DARK", "DARK", "DARK", "BRIGHT", "DARK"],
        "IN_DESI": [1, 1, 1, 1, 0]
    }"#;
    std::fs::write(&path, content).unwrap();
    path
}

fn config(dir: &TempDir) -> ReportConfig {
    ReportConfig {
        exposures: create_exposures_csv(dir.path()),
        tiles: create_tiles_json(dir.path()),
        outdir: dir.path().join("qa"),
        flag_column: "IN_DESI".to_string(),
        programs: Vec::new(),
        calendar: true,
        title: "Survey QA".to_string(),
    }
}

fn read(path: PathBuf) -> String {
    std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("reading {}: {e}", path.display()))
}

// =============================================================================
// FULL RUN
// =============================================================================

#[test]
fn test_run_writes_all_pages() {
    let temp = create_temp_dir();
    let config = config(&temp);

    let output = run(&config).unwrap();

    assert_eq!(output.n_exposures, 4);
    assert_eq!(output.n_tiles, 3);
    assert_eq!(output.n_nights, 2);
    assert_eq!(output.files.len(), 4);
    for name in [
        "summary.html",
        "night-20191201.html",
        "night-20191202.html",
        "calendar.html",
    ] {
        assert!(config.outdir.join(name).exists(), "{name} missing");
    }
}

#[test]
fn test_summary_uses_flag_filtered_tiles() {
    let temp = create_temp_dir();
    let config = config(&temp);
    run(&config).unwrap();

    let summary = read(config.outdir.join("summary.html"));
    assert!(summary.contains("<h1>Survey QA</h1>"));
    assert!(summary.contains("Through night 20191202"));
    // Tile 9999 is outside the footprint: 3 of 4 tiles observed.
    assert!(summary.contains("<th>Tiles in footprint</th><td>4</td>"));
    assert!(summary.contains("<th>Tiles observed</th><td>3</td>"));
    assert!(summary.contains("<th>Completion</th><td>75.0%</td>"));
    // Per-program completion rows.
    assert!(summary.contains("<td>BRIGHT</td><td>1</td><td>1</td><td>100.0%</td>"));
    assert!(summary.contains("<td>DARK</td><td>3</td><td>2</td><td>66.7%</td>"));
    assert!(summary.contains(r#"href="night-20191201.html""#));
    assert!(summary.contains(r#"href="calendar.html""#));
    assert!(summary.contains("Observed Tiles"));
}

#[test]
fn test_night_page_only_holds_that_night() {
    let temp = create_temp_dir();
    let config = config(&temp);
    run(&config).unwrap();

    let night = read(config.outdir.join("night-20191202.html"));
    assert!(night.contains("<h1>Night 20191202</h1>"));
    assert!(night.contains("<th>Exposures</th><td>2</td>"));
    // Tile 2001 is new on this night, 1002 was seen the night before.
    assert!(night.contains("<th>First-time tiles</th><td>1</td>"));
    assert!(night.contains("<td>3</td><td>1002</td>"));
    assert!(!night.contains("<td>1</td><td>1001</td>"));
    assert!(night.contains("Previous (20191201)"));
}

#[test]
fn test_calendar_links_observed_nights() {
    let temp = create_temp_dir();
    let config = config(&temp);
    run(&config).unwrap();

    let calendar = read(config.outdir.join("calendar.html"));
    assert!(calendar.contains("<caption>December 2019</caption>"));
    assert!(calendar.contains(r#"<a href="night-20191201.html""#));
    assert!(calendar.contains(r#"<a href="night-20191202.html""#));
}

// =============================================================================
// OPTIONS
// =============================================================================

#[test]
fn test_program_selection_limits_exposures() {
    let temp = create_temp_dir();
    let mut config = config(&temp);
    config.programs = vec!["bright".to_string()];
    config.calendar = false;

    let output = run(&config).unwrap();

    assert_eq!(output.n_exposures, 1);
    assert_eq!(output.n_nights, 1);
    assert!(config.outdir.join("night-20191202.html").exists());
    assert!(!config.outdir.join("night-20191201.html").exists());
    assert!(!config.outdir.join("calendar.html").exists());
}

#[test]
fn test_missing_flag_column_keeps_all_tiles() {
    let temp = create_temp_dir();
    let mut config = config(&temp);
    config.flag_column = "NOT_THERE".to_string();
    run(&config).unwrap();

    let summary = read(config.outdir.join("summary.html"));
    assert!(summary.contains("<th>Tiles in footprint</th><td>5</td>"));
}

// =============================================================================
// ERRORS
// =============================================================================

#[test]
fn test_program_selection_with_no_match_fails() {
    let temp = create_temp_dir();
    let mut config = config(&temp);
    config.programs = vec!["GRAY".to_string()];

    let err = run(&config).unwrap_err();
    assert!(matches!(err.downcast_ref::<QaError>(), Some(QaError::NoExposures)));
}

#[test]
fn test_unsupported_input_format() {
    let temp = create_temp_dir();
    let mut config = config(&temp);
    config.tiles = temp.path().join("tiles.fits");

    let err = run(&config).unwrap_err();
    assert!(format!("{err:#}").contains("unsupported table format"));
}

#[test]
fn test_missing_required_column_is_reported() {
    let temp = create_temp_dir();
    let mut config = config(&temp);
    let path = temp.path().join("bad_exposures.csv");
    std::fs::write(&path, "NIGHT,MJD,RA,DEC\n20191201,58819.1,150.0,10.0\n").unwrap();
    config.exposures = path;

    let err = run(&config).unwrap_err();
    let message = format!("{err:#}");
    assert!(message.contains("TILEID"), "{message}");
    assert!(message.contains("bad_exposures.csv"), "{message}");
}
