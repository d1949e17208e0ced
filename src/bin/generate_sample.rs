//! Writes `sample_tiles.parquet` and `sample_exposures.parquet`: a small
//! deterministic survey for trying out `surveyqa`.

use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, BooleanArray, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use arrow::util::pretty::pretty_format_batches;
use parquet::arrow::ArrowWriter;

use surveyqa::astro;

const PROGRAMS: [&str; 3] = ["DARK", "GRAY", "BRIGHT"];
const FIRST_NIGHT_MJD: f64 = 58819.0;
const N_NIGHTS: usize = 20;

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn uniform(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.next_f64()
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

struct SampleTile {
    tileid: i64,
    ra: f64,
    dec: f64,
    pass: i64,
    program: &'static str,
    in_desi: bool,
}

/// A grid of tiles; a band along the southern edge is outside the footprint.
fn make_tiles(rng: &mut SimpleRng) -> Vec<SampleTile> {
    let mut tiles = Vec::new();
    let mut tileid = 1000;
    for (pass, &program) in PROGRAMS.iter().enumerate() {
        for dec_step in 0..8 {
            for ra_step in 0..36 {
                let dec = -15.0 + dec_step as f64 * 10.0 + rng.gauss(0.0, 0.5);
                let ra = (ra_step as f64 * 10.0 + pass as f64 * 3.0 + rng.uniform(0.0, 1.0))
                    .rem_euclid(360.0);
                tiles.push(SampleTile {
                    tileid,
                    ra,
                    dec,
                    pass: pass as i64,
                    program,
                    in_desi: dec > -10.0,
                });
                tileid += 1;
            }
        }
    }
    tiles
}

struct SampleExposure {
    expid: i64,
    tileid: i64,
    night: i64,
    mjd: f64,
    ra: f64,
    dec: f64,
    exptime: f64,
    airmass: f64,
    seeing: f64,
    program: &'static str,
}

/// Each night observes tiles close to the meridian, one or two exposures each.
fn make_exposures(tiles: &[SampleTile], rng: &mut SimpleRng) -> Vec<SampleExposure> {
    let mut exposures = Vec::new();
    let mut expid = 1;
    let mut done = vec![false; tiles.len()];

    for n in 0..N_NIGHTS {
        let night_start = FIRST_NIGHT_MJD + n as f64 + 0.05;
        let night = 20191201 + n as i64;
        let mut mjd = night_start;
        while mjd < night_start + 0.4 {
            let lst = astro::local_sidereal_time(mjd);
            let Some(idx) = (0..tiles.len())
                .filter(|&i| !done[i] && tiles[i].in_desi)
                .min_by(|&a, &b| {
                    let ha_a = astro::wrap_degrees(lst - tiles[a].ra).abs();
                    let ha_b = astro::wrap_degrees(lst - tiles[b].ra).abs();
                    ha_a.total_cmp(&ha_b)
                })
            else {
                break;
            };
            done[idx] = true;
            let tile = &tiles[idx];

            let repeats = if rng.next_f64() < 0.2 { 2 } else { 1 };
            for _ in 0..repeats {
                let exptime = rng.uniform(600.0, 1200.0).round();
                let airmass = 1.0 + (tile.dec - 32.0).abs() / 90.0 + rng.uniform(0.0, 0.1);
                exposures.push(SampleExposure {
                    expid,
                    tileid: tile.tileid,
                    night,
                    mjd,
                    ra: tile.ra,
                    dec: tile.dec,
                    exptime,
                    airmass,
                    seeing: rng.gauss(1.1, 0.2).max(0.5),
                    program: tile.program,
                });
                expid += 1;
                mjd += (exptime + 120.0) / 86400.0;
            }
        }
    }
    exposures
}

fn write_parquet(path: &str, schema: Arc<Schema>, columns: Vec<ArrayRef>) -> Result<RecordBatch> {
    let batch = RecordBatch::try_new(schema.clone(), columns).context("building record batch")?;
    let file = std::fs::File::create(path).with_context(|| format!("creating {path}"))?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(batch)
}

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);
    let tiles = make_tiles(&mut rng);
    let exposures = make_exposures(&tiles, &mut rng);

    let tile_schema = Arc::new(Schema::new(vec![
        Field::new("TILEID", DataType::Int64, false),
        Field::new("RA", DataType::Float64, false),
        Field::new("DEC", DataType::Float64, false),
        Field::new("PASS", DataType::Int64, false),
        Field::new("PROGRAM", DataType::Utf8, false),
        Field::new("IN_DESI", DataType::Boolean, false),
    ]));
    let tile_batch = write_parquet(
        "sample_tiles.parquet",
        tile_schema,
        vec![
            Arc::new(Int64Array::from_iter_values(tiles.iter().map(|t| t.tileid))) as ArrayRef,
            Arc::new(Float64Array::from_iter_values(tiles.iter().map(|t| t.ra))) as ArrayRef,
            Arc::new(Float64Array::from_iter_values(tiles.iter().map(|t| t.dec))) as ArrayRef,
            Arc::new(Int64Array::from_iter_values(tiles.iter().map(|t| t.pass))) as ArrayRef,
            Arc::new(StringArray::from_iter_values(tiles.iter().map(|t| t.program))) as ArrayRef,
            Arc::new(BooleanArray::from(
                tiles.iter().map(|t| t.in_desi).collect::<Vec<_>>(),
            )) as ArrayRef,
        ],
    )?;

    let exposure_schema = Arc::new(Schema::new(vec![
        Field::new("EXPID", DataType::Int64, false),
        Field::new("TILEID", DataType::Int64, false),
        Field::new("NIGHT", DataType::Int64, false),
        Field::new("MJD", DataType::Float64, false),
        Field::new("RA", DataType::Float64, false),
        Field::new("DEC", DataType::Float64, false),
        Field::new("EXPTIME", DataType::Float64, false),
        Field::new("AIRMASS", DataType::Float64, false),
        Field::new("SEEING", DataType::Float64, false),
        Field::new("PROGRAM", DataType::Utf8, false),
    ]));
    let exposure_batch = write_parquet(
        "sample_exposures.parquet",
        exposure_schema,
        vec![
            Arc::new(Int64Array::from_iter_values(exposures.iter().map(|e| e.expid))) as ArrayRef,
            Arc::new(Int64Array::from_iter_values(exposures.iter().map(|e| e.tileid))) as ArrayRef,
            Arc::new(Int64Array::from_iter_values(exposures.iter().map(|e| e.night))) as ArrayRef,
            Arc::new(Float64Array::from_iter_values(exposures.iter().map(|e| e.mjd))) as ArrayRef,
            Arc::new(Float64Array::from_iter_values(exposures.iter().map(|e| e.ra))) as ArrayRef,
            Arc::new(Float64Array::from_iter_values(exposures.iter().map(|e| e.dec))) as ArrayRef,
            Arc::new(Float64Array::from_iter_values(exposures.iter().map(|e| e.exptime))) as ArrayRef,
            Arc::new(Float64Array::from_iter_values(exposures.iter().map(|e| e.airmass))) as ArrayRef,
            Arc::new(Float64Array::from_iter_values(exposures.iter().map(|e| e.seeing))) as ArrayRef,
            Arc::new(StringArray::from_iter_values(exposures.iter().map(|e| e.program))) as ArrayRef,
        ],
    )?;

    println!(
        "{}",
        pretty_format_batches(&[exposure_batch.slice(0, exposure_batch.num_rows().min(5))])
            .context("formatting preview")?
    );
    println!(
        "Wrote {} tiles to sample_tiles.parquet and {} exposures over {N_NIGHTS} nights to sample_exposures.parquet",
        tile_batch.num_rows(),
        exposure_batch.num_rows()
    );
    Ok(())
}
