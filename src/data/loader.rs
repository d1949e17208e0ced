use std::path::Path;

use anyhow::{bail, Context, Result};
use arrow::array::{Array, ArrayRef, AsArray};
use arrow::datatypes::{
    DataType, Float32Type, Float64Type, Int16Type, Int32Type, Int64Type, Int8Type, UInt16Type,
    UInt32Type, UInt64Type, UInt8Type,
};
use log::debug;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{Record, Table, Value};
use crate::error::QaError;

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a catalog table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.parquet` – one column per catalog field (recommended)
/// * `.json`    – `[{ "TILEID": 1, ... }, ...]` or `{ "TILEID": [...], ... }`
/// * `.csv`     – header row followed by one row per record
///
/// Column names are upper-cased.
pub fn load_table(path: &Path) -> Result<Table> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let table = match ext.as_str() {
        "parquet" | "pq" => load_parquet(path),
        "json" => load_json(path),
        "csv" => load_csv(path),
        _ => {
            return Err(QaError::UnsupportedFormat {
                path: path.to_path_buf(),
                extension: ext,
            }
            .into())
        }
    }
    .with_context(|| format!("loading {}", path.display()))?;

    debug!(
        "Loaded {} rows, columns {:?} from {}",
        table.len(),
        table.column_names,
        path.display()
    );
    Ok(table)
}

fn column_key(name: &str) -> String {
    name.trim().to_ascii_uppercase()
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Two layouts are accepted.  Records-oriented (`df.to_json(orient='records')`):
///
/// ```json
/// [ { "TILEID": 1001, "RA": 150.1, "DEC": 2.2 }, ... ]
/// ```
///
/// and column-oriented, every array of equal length:
///
/// ```json
/// { "TILEID": [1001, 1002], "RA": [150.1, 151.0], "DEC": [2.2, 2.4] }
/// ```
fn load_json(path: &Path) -> Result<Table> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    match root {
        JsonValue::Array(records) => json_records(&records),
        JsonValue::Object(columns) => json_columns(&columns),
        _ => bail!("Expected a top-level JSON array or object"),
    }
}

fn json_records(records: &[JsonValue]) -> Result<Table> {
    let mut rows = Vec::with_capacity(records.len());
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;
        let row: Record = obj
            .iter()
            .map(|(key, val)| (column_key(key), json_to_value(val)))
            .collect();
        rows.push(row);
    }
    Ok(Table::from_records(rows))
}

fn json_columns(columns: &serde_json::Map<String, JsonValue>) -> Result<Table> {
    let mut names = Vec::with_capacity(columns.len());
    let mut arrays = Vec::with_capacity(columns.len());
    for (key, val) in columns {
        let values = val
            .as_array()
            .with_context(|| format!("Column '{key}' is not a JSON array"))?;
        names.push(column_key(key));
        arrays.push(values);
    }

    let n_rows = arrays.first().map_or(0, |a| a.len());
    if let Some((name, arr)) = names.iter().zip(&arrays).find(|(_, a)| a.len() != n_rows) {
        bail!(
            "Column '{name}' has {} values but the first column has {n_rows}",
            arr.len()
        );
    }

    let records = (0..n_rows)
        .map(|row| {
            names
                .iter()
                .zip(&arrays)
                .map(|(name, arr)| (name.clone(), json_to_value(&arr[row])))
                .collect()
        })
        .collect();
    Ok(Table::new(names, records))
}

fn json_to_value(val: &JsonValue) -> Value {
    match val {
        JsonValue::String(s) => Value::Str(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Int(i)
            } else if let Some(f) = n.as_f64() {
                Value::Float(f)
            } else {
                Value::Str(n.to_string())
            }
        }
        JsonValue::Bool(b) => Value::Bool(*b),
        JsonValue::Null => Value::Null,
        other => Value::Str(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names, one record per line.
/// Cell types are guessed per value.
fn load_csv(path: &Path) -> Result<Table> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .context("opening CSV")?;
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(column_key)
        .collect();

    let mut records = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        let row: Record = headers
            .iter()
            .zip(record.iter())
            .map(|(name, cell)| (name.clone(), guess_value_type(cell)))
            .collect();
        records.push(row);
    }

    Ok(Table::new(headers, records))
}

fn guess_value_type(s: &str) -> Value {
    if s.is_empty() {
        return Value::Null;
    }
    if let Ok(i) = s.parse::<i64>() {
        return Value::Int(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        return Value::Float(f);
    }
    if s.eq_ignore_ascii_case("true") || s.eq_ignore_ascii_case("false") {
        return Value::Bool(s.eq_ignore_ascii_case("true"));
    }
    Value::Str(s.to_string())
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file holding one catalog field per column.
///
/// Works with files written by **Pandas** (`df.to_parquet()`), **Polars**
/// (`df.write_parquet()`) and astropy tables converted through either.
fn load_parquet(path: &Path) -> Result<Table> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let names: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| column_key(f.name()))
        .collect();
    let reader = builder.build().context("building parquet reader")?;

    let mut records = Vec::new();
    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        for row in 0..batch.num_rows() {
            let record: Record = names
                .iter()
                .zip(batch.columns())
                .map(|(name, col)| (name.clone(), extract_value(col, row)))
                .collect();
            records.push(record);
        }
    }

    Ok(Table::new(names, records))
}

/// Extract a single cell from an Arrow column at a given row.
fn extract_value(col: &ArrayRef, row: usize) -> Value {
    if col.is_null(row) {
        return Value::Null;
    }
    match col.data_type() {
        DataType::Utf8 => Value::Str(col.as_string::<i32>().value(row).to_string()),
        DataType::LargeUtf8 => Value::Str(col.as_string::<i64>().value(row).to_string()),
        DataType::Int8 => Value::Int(col.as_primitive::<Int8Type>().value(row) as i64),
        DataType::Int16 => Value::Int(col.as_primitive::<Int16Type>().value(row) as i64),
        DataType::Int32 => Value::Int(col.as_primitive::<Int32Type>().value(row) as i64),
        DataType::Int64 => Value::Int(col.as_primitive::<Int64Type>().value(row)),
        DataType::UInt8 => Value::Int(col.as_primitive::<UInt8Type>().value(row) as i64),
        DataType::UInt16 => Value::Int(col.as_primitive::<UInt16Type>().value(row) as i64),
        DataType::UInt32 => Value::Int(col.as_primitive::<UInt32Type>().value(row) as i64),
        DataType::UInt64 => {
            let v = col.as_primitive::<UInt64Type>().value(row);
            i64::try_from(v).map_or(Value::Float(v as f64), Value::Int)
        }
        DataType::Float32 => Value::Float(col.as_primitive::<Float32Type>().value(row) as f64),
        DataType::Float64 => Value::Float(col.as_primitive::<Float64Type>().value(row)),
        DataType::Boolean => Value::Bool(col.as_boolean().value(row)),
        other => Value::Str(format!("{other:?}")),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use arrow::array::{
        BooleanArray, Date32Array, Float32Array, Float64Array, Int32Array, LargeStringArray,
        StringArray, UInt32Array, UInt64Array,
    };
    use arrow::datatypes::{Field, Schema};
    use arrow::record_batch::RecordBatch;
    use parquet::arrow::ArrowWriter;

    use super::*;

    #[test]
    fn csv_cells_are_typed_and_headers_upper_cased() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tiles.csv");
        std::fs::write(
            &path,
            "tileid, ra ,dec,in_desi,program\n1001,150.5,2.0,true,DARK\n1002,151,,False,\n",
        )
        .unwrap();

        let table = load_table(&path).unwrap();
        assert_eq!(table.column_names, vec!["TILEID", "RA", "DEC", "IN_DESI", "PROGRAM"]);
        assert_eq!(table.len(), 2);
        let first = &table.records[0];
        assert_eq!(first["TILEID"], Value::Int(1001));
        assert_eq!(first["RA"], Value::Float(150.5));
        assert_eq!(first["IN_DESI"], Value::Bool(true));
        assert_eq!(first["PROGRAM"], Value::Str("DARK".into()));
        let second = &table.records[1];
        assert_eq!(second["RA"], Value::Int(151));
        assert_eq!(second["DEC"], Value::Null);
        assert_eq!(second["IN_DESI"], Value::Bool(false));
    }

    #[test]
    fn json_records_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("exposures.json");
        std::fs::write(
            &path,
            r#"[{"night": 20191201, "mjd": 58818.1, "tileid": 5},
                {"night": 20191202, "mjd": 58819.2, "tileid": 6, "program": null}]"#,
        )
        .unwrap();

        let table = load_table(&path).unwrap();
        assert_eq!(table.len(), 2);
        assert!(table.has_column("PROGRAM"));
        assert_eq!(table.records[0]["NIGHT"], Value::Int(20191201));
        assert_eq!(table.records[1]["PROGRAM"], Value::Null);
    }

    #[test]
    fn json_columns_layout_requires_equal_lengths() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.json");
        std::fs::write(&good, r#"{"TILEID": [1, 2], "RA": [10.0, 20.0]}"#).unwrap();
        let table = load_table(&good).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.records[1]["RA"], Value::Float(20.0));

        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, r#"{"TILEID": [1, 2], "RA": [10.0]}"#).unwrap();
        let err = load_table(&bad).unwrap_err();
        assert!(format!("{err:#}").contains("'RA'"));
    }

    fn write_parquet(path: &Path, batch: &RecordBatch) {
        let file = std::fs::File::create(path).unwrap();
        let mut writer = ArrowWriter::try_new(file, batch.schema(), None).unwrap();
        writer.write(batch).unwrap();
        writer.close().unwrap();
    }

    #[test]
    fn parquet_columns_map_onto_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tiles.parquet");

        let schema = Arc::new(Schema::new(vec![
            Field::new("TILEID", DataType::Int32, false),
            Field::new("RA", DataType::Float64, false),
            Field::new("PROGRAM", DataType::Utf8, true),
            Field::new("IN_DESI", DataType::Boolean, false),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(Int32Array::from(vec![1, 2])) as ArrayRef,
                Arc::new(Float64Array::from(vec![10.0, 20.0])) as ArrayRef,
                Arc::new(StringArray::from(vec![Some("DARK"), None])) as ArrayRef,
                Arc::new(BooleanArray::from(vec![true, false])) as ArrayRef,
            ],
        )
        .unwrap();
        write_parquet(&path, &batch);

        let table = load_table(&path).unwrap();
        assert_eq!(table.column_names, vec!["TILEID", "RA", "PROGRAM", "IN_DESI"]);
        assert_eq!(table.records[0]["TILEID"], Value::Int(1));
        assert_eq!(table.records[1]["RA"], Value::Float(20.0));
        assert_eq!(table.records[1]["PROGRAM"], Value::Null);
        assert_eq!(table.records[0]["IN_DESI"], Value::Bool(true));
    }

    #[test]
    fn parquet_wide_and_unusual_types() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("exposures.parquet");

        let schema = Arc::new(Schema::new(vec![
            Field::new("expid", DataType::UInt32, false),
            Field::new("tileid", DataType::UInt64, false),
            Field::new("seeing", DataType::Float32, false),
            Field::new("program", DataType::LargeUtf8, false),
            Field::new("date", DataType::Date32, false),
        ]));
        let batch = RecordBatch::try_new(
            schema,
            vec![
                Arc::new(UInt32Array::from(vec![7, u32::MAX])) as ArrayRef,
                Arc::new(UInt64Array::from(vec![1001, u64::MAX])) as ArrayRef,
                Arc::new(Float32Array::from(vec![1.25, 0.5])) as ArrayRef,
                Arc::new(LargeStringArray::from(vec!["DARK", "BRIGHT"])) as ArrayRef,
                Arc::new(Date32Array::from(vec![18231, 18232])) as ArrayRef,
            ],
        )
        .unwrap();
        write_parquet(&path, &batch);

        let table = load_table(&path).unwrap();
        let first = &table.records[0];
        let second = &table.records[1];
        assert_eq!(first["EXPID"], Value::Int(7));
        assert_eq!(second["EXPID"], Value::Int(u32::MAX as i64));
        assert_eq!(first["TILEID"], Value::Int(1001));
        // Beyond i64 range: kept as a float rather than wrapped.
        assert_eq!(second["TILEID"], Value::Float(u64::MAX as f64));
        assert_eq!(first["SEEING"], Value::Float(1.25));
        assert_eq!(second["PROGRAM"], Value::Str("BRIGHT".into()));
        assert_eq!(first["DATE"], Value::Str("Date32".into()));
    }

    #[test]
    fn fits_is_rejected_with_format_error() {
        let err = load_table(Path::new("tiles.fits")).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<QaError>(),
            Some(QaError::UnsupportedFormat { extension, .. }) if extension == "fits"
        ));
    }
}
