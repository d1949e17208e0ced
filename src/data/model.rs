use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::astro;
use crate::error::{QaError, Result};

// ---------------------------------------------------------------------------
// Value – a single cell in a catalog column
// ---------------------------------------------------------------------------

/// A dynamically-typed cell mirroring the column types found in catalogs.
/// Used as a key in `BTreeMap` / `BTreeSet` downstream so `Value` must be `Ord`.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Null,
}

// -- Manual Eq/Ord so we can put Value in BTreeSet --

impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use Value::*;
        fn discriminant(v: &Value) -> u8 {
            match v {
                Null => 0,
                Bool(_) => 1,
                Int(_) => 2,
                Float(_) => 3,
                Str(_) => 4,
            }
        }
        let da = discriminant(self);
        let db = discriminant(other);
        if da != db {
            return da.cmp(&db);
        }
        match (self, other) {
            (Bool(a), Bool(b)) => a.cmp(b),
            (Int(a), Int(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            (Str(a), Str(b)) => a.cmp(b),
            _ => std::cmp::Ordering::Equal,
        }
    }
}

impl std::hash::Hash for Value {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Str(s) => s.hash(state),
            Value::Int(i) => i.hash(state),
            Value::Float(f) => f.to_bits().hash(state),
            Value::Bool(b) => b.hash(state),
            Value::Null => {}
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => write!(f, "{s}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(v) => write!(f, "{v:.4}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Null => write!(f, "<null>"),
        }
    }
}

impl Value {
    /// Numeric view of the cell. Numeric strings are accepted because CSV
    /// exports sometimes quote every field.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            Value::Int(i) => Some(*i as f64),
            Value::Str(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Integer view of the cell; floats must be integral and inside the
    /// `i64` range.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            Value::Float(v)
                if v.fract() == 0.0 && *v >= i64::MIN as f64 && *v < i64::MAX as f64 =>
            {
                Some(*v as i64)
            }
            Value::Str(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

// ---------------------------------------------------------------------------
// Table – rows keyed by upper-case column name
// ---------------------------------------------------------------------------

/// One row of a catalog table.
pub type Record = BTreeMap<String, Value>;

/// A loaded catalog table.
#[derive(Debug, Clone, Default)]
pub struct Table {
    /// All rows.
    pub records: Vec<Record>,
    /// Column names in source order.
    pub column_names: Vec<String>,
}

impl Table {
    pub fn new(column_names: Vec<String>, records: Vec<Record>) -> Self {
        Table {
            records,
            column_names,
        }
    }

    /// Build a table whose column list is the sorted union of the row keys.
    pub fn from_records(records: Vec<Record>) -> Self {
        let column_names: BTreeSet<String> = records
            .iter()
            .flat_map(|rec| rec.keys().cloned())
            .collect();
        Table {
            records,
            column_names: column_names.into_iter().collect(),
        }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.column_names.iter().any(|c| c == column)
    }

    /// Sorted set of the values found in `column`. Rows lacking the column
    /// contribute `Null`.
    pub fn unique_values(&self, column: &str) -> BTreeSet<Value> {
        self.records
            .iter()
            .map(|rec| rec.get(column).cloned().unwrap_or(Value::Null))
            .collect()
    }

    /// New table holding the rows at `indices`, same columns.
    pub fn select(&self, indices: &[usize]) -> Table {
        Table {
            records: indices
                .iter()
                .filter_map(|&i| self.records.get(i).cloned())
                .collect(),
            column_names: self.column_names.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Typed rows
// ---------------------------------------------------------------------------

/// A single exposure (one row of the exposures table).
#[derive(Debug, Clone, PartialEq)]
pub struct Exposure {
    pub expid: Option<i64>,
    /// Observing night, `YYYYMMDD`.
    pub night: String,
    pub mjd: f64,
    pub ra: f64,
    pub dec: f64,
    pub tileid: i64,
    /// Seconds.
    pub exptime: Option<f64>,
    pub airmass: Option<f64>,
    /// Arcseconds.
    pub seeing: Option<f64>,
    pub transparency: Option<f64>,
    pub sky: Option<f64>,
    pub program: Option<String>,
    /// Derived from MJD and RA, degrees in [-180, 180].
    pub hour_angle: f64,
}

/// A survey tile (one row of the tiles table).
#[derive(Debug, Clone, PartialEq)]
pub struct Tile {
    pub tileid: i64,
    pub ra: f64,
    pub dec: f64,
    pub pass: Option<i64>,
    pub program: Option<String>,
}

/// Column accessor bound to one row, so errors can name table, row and column.
struct Row<'a> {
    table: &'static str,
    index: usize,
    record: &'a Record,
}

impl<'a> Row<'a> {
    fn cell(&self, column: &str) -> Option<&'a Value> {
        self.record.get(column).filter(|v| !v.is_null())
    }

    fn missing(&self, column: &str) -> QaError {
        QaError::MissingColumn {
            table: self.table,
            row: self.index,
            column: column.to_string(),
        }
    }

    fn invalid(&self, column: &str, value: &Value) -> QaError {
        QaError::InvalidValue {
            table: self.table,
            row: self.index,
            column: column.to_string(),
            value: value.to_string(),
        }
    }

    fn f64(&self, column: &str) -> Result<f64> {
        let value = self.cell(column).ok_or_else(|| self.missing(column))?;
        value.as_f64().ok_or_else(|| self.invalid(column, value))
    }

    fn i64(&self, column: &str) -> Result<i64> {
        let value = self.cell(column).ok_or_else(|| self.missing(column))?;
        value.as_i64().ok_or_else(|| self.invalid(column, value))
    }

    fn opt_f64(&self, column: &str) -> Result<Option<f64>> {
        match self.cell(column) {
            None => Ok(None),
            Some(value) => value
                .as_f64()
                .map(Some)
                .ok_or_else(|| self.invalid(column, value)),
        }
    }

    fn opt_i64(&self, column: &str) -> Result<Option<i64>> {
        match self.cell(column) {
            None => Ok(None),
            Some(value) => value
                .as_i64()
                .map(Some)
                .ok_or_else(|| self.invalid(column, value)),
        }
    }

    fn opt_string(&self, column: &str) -> Option<String> {
        self.cell(column)
            .map(|v| v.to_string().trim().to_string())
            .filter(|s| !s.is_empty())
    }

    /// NIGHT may be stored as an integer, an integral float or text.
    fn night(&self) -> Result<String> {
        let value = self.cell("NIGHT").ok_or_else(|| self.missing("NIGHT"))?;
        match value {
            Value::Str(s) if !s.trim().is_empty() => Ok(s.trim().to_string()),
            other => other
                .as_i64()
                .map(|n| n.to_string())
                .ok_or_else(|| self.invalid("NIGHT", other)),
        }
    }
}

impl Exposure {
    /// Convert one exposures-table row; the hour angle is derived here.
    pub fn from_record(index: usize, record: &Record) -> Result<Self> {
        let row = Row {
            table: "exposures",
            index,
            record,
        };
        let mjd = row.f64("MJD")?;
        let ra = row.f64("RA")?;
        Ok(Exposure {
            expid: row.opt_i64("EXPID")?,
            night: row.night()?,
            mjd,
            ra,
            dec: row.f64("DEC")?,
            tileid: row.i64("TILEID")?,
            exptime: row.opt_f64("EXPTIME")?,
            airmass: row.opt_f64("AIRMASS")?,
            seeing: row.opt_f64("SEEING")?,
            transparency: row.opt_f64("TRANSP")?,
            sky: row.opt_f64("SKY")?,
            program: row.opt_string("PROGRAM"),
            hour_angle: astro::hour_angle(mjd, ra),
        })
    }
}

impl Tile {
    pub fn from_record(index: usize, record: &Record) -> Result<Self> {
        let row = Row {
            table: "tiles",
            index,
            record,
        };
        Ok(Tile {
            tileid: row.i64("TILEID")?,
            ra: row.f64("RA")?,
            dec: row.f64("DEC")?,
            pass: row.opt_i64("PASS")?,
            program: row.opt_string("PROGRAM"),
        })
    }
}

/// Convert every row of an exposures table.
pub fn exposures_from_table(table: &Table) -> Result<Vec<Exposure>> {
    table
        .records
        .iter()
        .enumerate()
        .map(|(i, rec)| Exposure::from_record(i, rec))
        .collect()
}

/// Convert every row of a tiles table.
pub fn tiles_from_table(table: &Table) -> Result<Vec<Tile>> {
    table
        .records
        .iter()
        .enumerate()
        .map(|(i, rec)| Tile::from_record(i, rec))
        .collect()
}
