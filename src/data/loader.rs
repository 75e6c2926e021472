use std::collections::BTreeMap;
use std::fmt;
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use arrow::array::{
    Array, BooleanArray, Date32Array, Float32Array, Float64Array, Int32Array, Int64Array,
    LargeStringArray, StringArray,
};
use arrow::datatypes::DataType;
use bytes::Bytes;
use calamine::{open_workbook_auto_from_rs, Data, Reader};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{CellValue, Row, Table};

// ---------------------------------------------------------------------------
// Source identity
// ---------------------------------------------------------------------------

/// Where a table comes from: a URL or a local path, plus a sheet name for
/// workbooks. This is also the cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DataSource {
    pub location: String,
    pub sheet: Option<String>,
}

impl DataSource {
    pub fn new(location: &str, sheet: Option<&str>) -> Self {
        DataSource {
            location: location.to_string(),
            sheet: sheet.map(str::to_string),
        }
    }

    pub fn path(path: &Path) -> Self {
        DataSource::new(&path.to_string_lossy(), None)
    }

    pub fn is_remote(&self) -> bool {
        let lower = self.location.to_ascii_lowercase();
        lower.starts_with("http://") || lower.starts_with("https://")
    }

    /// Lower-case file extension, ignoring any URL query string.
    pub fn extension(&self) -> String {
        let path = self.location.split(['?', '#']).next().unwrap_or("");
        Path::new(path)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase()
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.sheet {
            Some(sheet) => write!(f, "{} [{sheet}]", self.location),
            None => write!(f, "{}", self.location),
        }
    }
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Fetch and parse a dataset. Dispatch by extension.
///
/// Supported formats:
/// * `.xlsx` / `.xls` – workbook, sheet picked by `source.sheet` (default: first)
/// * `.csv`           – header row, types inferred per cell
/// * `.json`          – `[{ "col": value, ... }, ...]` (`orient='records'`)
/// * `.parquet`       – flat columns of strings, ints, floats, bools, dates
///
/// Remote sources are downloaded with a blocking client bounded by `timeout`.
pub fn load(source: &DataSource, timeout: Duration) -> Result<Table> {
    let bytes = fetch_bytes(source, timeout)?;
    log::debug!("Fetched {} bytes from {source}", bytes.len());

    let table = match source.extension().as_str() {
        "xlsx" | "xlsm" | "xlsb" | "xls" => parse_excel(bytes, source.sheet.as_deref()),
        "csv" => parse_csv(&bytes),
        "json" => parse_json(&bytes),
        "parquet" | "pq" => parse_parquet(bytes),
        other => bail!("Unsupported file extension: .{other}"),
    }
    .with_context(|| format!("parsing {source}"))?;

    Ok(drop_index_columns(table))
}

fn fetch_bytes(source: &DataSource, timeout: Duration) -> Result<Bytes> {
    if source.is_remote() {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .context("building HTTP client")?;
        let response = client
            .get(&source.location)
            .send()
            .with_context(|| format!("downloading {}", source.location))?
            .error_for_status()
            .with_context(|| format!("downloading {}", source.location))?;
        response.bytes().context("reading response body")
    } else {
        let data = std::fs::read(&source.location)
            .with_context(|| format!("reading {}", source.location))?;
        Ok(Bytes::from(data))
    }
}

/// Remove index columns written by pandas (`Unnamed: 0`, blank header,
/// `__index_level_0__`).
fn drop_index_columns(table: Table) -> Table {
    let index_cols: Vec<String> = table
        .column_names
        .iter()
        .filter(|c| c.trim().is_empty() || c.starts_with("Unnamed: ") || *c == "__index_level_0__")
        .cloned()
        .collect();

    index_cols
        .iter()
        .fold(table, |table, col| table.drop_column(col))
}

// ---------------------------------------------------------------------------
// Excel loader
// ---------------------------------------------------------------------------

/// First row holds the column names; empty cells become `Null`.
fn parse_excel(bytes: Bytes, sheet: Option<&str>) -> Result<Table> {
    let mut workbook =
        open_workbook_auto_from_rs(Cursor::new(bytes.to_vec())).context("opening workbook")?;

    let sheet_name = match sheet {
        Some(name) => name.to_string(),
        None => workbook
            .sheet_names()
            .first()
            .cloned()
            .context("workbook has no sheets")?,
    };

    let range = workbook
        .worksheet_range(&sheet_name)
        .with_context(|| format!("reading sheet '{sheet_name}'"))?;

    let mut sheet_rows = range.rows();
    let headers: Vec<String> = sheet_rows
        .next()
        .with_context(|| format!("sheet '{sheet_name}' is empty"))?
        .iter()
        .map(|c| c.to_string())
        .collect();

    let rows = sheet_rows
        .map(|cells| {
            let mut row = Row::new();
            for (col, cell) in headers.iter().zip(cells) {
                row.set(col.clone(), excel_to_cell(cell));
            }
            row
        })
        .collect();

    Ok(Table::new(headers, rows))
}

fn excel_to_cell(cell: &Data) -> CellValue {
    match cell {
        Data::Int(i) => CellValue::Integer(*i),
        Data::Float(f) => CellValue::Float(*f),
        Data::String(s) if s.is_empty() => CellValue::Null,
        Data::String(s) => CellValue::String(s.clone()),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(_) => CellValue::Date(cell.to_string()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Date(s.clone()),
        Data::Error(_) | Data::Empty => CellValue::Null,
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

fn parse_csv(bytes: &[u8]) -> Result<Table> {
    let mut reader = csv::Reader::from_reader(bytes);
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut rows = Vec::new();

    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;

        let mut row = Row::new();
        for (col_name, value) in headers.iter().zip(record.iter()) {
            row.set(col_name.clone(), guess_cell_type(value));
        }
        rows.push(row);
    }

    Ok(Table::new(headers, rows))
}

fn guess_cell_type(s: &str) -> CellValue {
    if s.is_empty() {
        return CellValue::Null;
    }
    if let Ok(i) = s.parse::<i64>() {
        return CellValue::Integer(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        return CellValue::Float(f);
    }
    match s {
        "true" | "True" | "TRUE" => CellValue::Bool(true),
        "false" | "False" | "FALSE" => CellValue::Bool(false),
        _ => CellValue::String(s.to_string()),
    }
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "rental_id": 505000, "checkin_type": "mobile", "state": "ended" },
///   ...
/// ]
/// ```
fn parse_json(bytes: &[u8]) -> Result<Table> {
    let root: JsonValue = serde_json::from_slice(bytes).context("parsing JSON")?;

    let records = root.as_array().context("Expected top-level JSON array")?;

    let mut rows = Vec::with_capacity(records.len());

    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;

        let cells: BTreeMap<String, CellValue> = obj
            .iter()
            .map(|(key, val)| (key.clone(), json_to_cell(val)))
            .collect();
        rows.push(Row { cells });
    }

    Ok(Table::from_rows(rows))
}

fn json_to_cell(val: &JsonValue) -> CellValue {
    match val {
        JsonValue::String(s) => CellValue::String(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                CellValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                CellValue::Float(f)
            } else {
                CellValue::String(n.to_string())
            }
        }
        JsonValue::Bool(b) => CellValue::Bool(*b),
        JsonValue::Null => CellValue::Null,
        other => CellValue::String(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`).
fn parse_parquet(bytes: Bytes) -> Result<Table> {
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(bytes).context("reading parquet metadata")?;
    let column_names: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build().context("building parquet reader")?;

    let mut rows = Vec::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;

        for row_idx in 0..batch.num_rows() {
            let mut row = Row::new();
            for (col_idx, col_name) in column_names.iter().enumerate() {
                let value = extract_cell(batch.column(col_idx), row_idx)
                    .with_context(|| format!("Row {row_idx}: failed to read '{col_name}'"))?;
                row.set(col_name.clone(), value);
            }
            rows.push(row);
        }
    }

    Ok(Table::new(column_names, rows))
}

macro_rules! downcast {
    ($col:expr, $ty:ty) => {
        $col.as_any()
            .downcast_ref::<$ty>()
            .with_context(|| format!("expected {}", stringify!($ty)))?
    };
}

/// Extract a single value from an Arrow column at a given row.
fn extract_cell(col: &Arc<dyn Array>, row: usize) -> Result<CellValue> {
    if col.is_null(row) {
        return Ok(CellValue::Null);
    }
    let value = match col.data_type() {
        DataType::Utf8 => CellValue::String(downcast!(col, StringArray).value(row).to_string()),
        DataType::LargeUtf8 => {
            CellValue::String(downcast!(col, LargeStringArray).value(row).to_string())
        }
        DataType::Int32 => CellValue::Integer(downcast!(col, Int32Array).value(row) as i64),
        DataType::Int64 => CellValue::Integer(downcast!(col, Int64Array).value(row)),
        DataType::Float32 => CellValue::Float(downcast!(col, Float32Array).value(row) as f64),
        DataType::Float64 => CellValue::Float(downcast!(col, Float64Array).value(row)),
        DataType::Boolean => CellValue::Bool(downcast!(col, BooleanArray).value(row)),
        DataType::Date32 => match downcast!(col, Date32Array).value_as_date(row) {
            Some(d) => CellValue::Date(d.to_string()),
            None => CellValue::Null,
        },
        other => CellValue::String(format!("{other:?}")),
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static COUNTER: AtomicUsize = AtomicUsize::new(0);

    fn temp_file(ext: &str, contents: &[u8]) -> PathBuf {
        let n = COUNTER.fetch_add(1, Ordering::SeqCst);
        let path = std::env::temp_dir().join(format!(
            "getaround-loader-{}-{n}.{ext}",
            std::process::id()
        ));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn csv_types_are_inferred_and_index_dropped() {
        let path = temp_file(
            "csv",
            b",model_key,mileage,engine_power,has_gps\n0,Citroen,140411,100.5,True\n1,Renault,,135,False\n",
        );
        let table = load(&DataSource::path(&path), Duration::from_secs(1)).unwrap();

        assert_eq!(
            table.column_names,
            vec!["model_key", "mileage", "engine_power", "has_gps"]
        );
        assert_eq!(table.len(), 2);
        let first = &table.rows[0];
        assert_eq!(first.get("model_key"), &CellValue::String("Citroen".into()));
        assert_eq!(first.get("mileage"), &CellValue::Integer(140411));
        assert_eq!(first.get("engine_power"), &CellValue::Float(100.5));
        assert_eq!(first.get("has_gps"), &CellValue::Bool(true));
        assert!(table.rows[1].get("mileage").is_null());
        assert!(!first.cells.contains_key(""));
    }

    #[test]
    fn json_records_load() {
        let path = temp_file(
            "json",
            br#"[{"rental_id": 1, "state": "ended", "delay": null}, {"rental_id": 2, "state": "canceled", "delay": 12.5}]"#,
        );
        let table = load(&DataSource::path(&path), Duration::from_secs(1)).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[1].number("delay"), Some(12.5));
        assert!(table.rows[0].get("delay").is_null());
    }

    #[test]
    fn parquet_columns_load() {
        use arrow::datatypes::{Field, Schema};
        use arrow::record_batch::RecordBatch;
        use parquet::arrow::ArrowWriter;

        let schema = Arc::new(Schema::new(vec![
            Field::new("rental_id", DataType::Int64, false),
            Field::new("checkin_type", DataType::Utf8, false),
            Field::new("delay_at_checkout_in_minutes", DataType::Float64, true),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(Int64Array::from(vec![1, 2])),
                Arc::new(StringArray::from(vec!["mobile", "connect"])),
                Arc::new(Float64Array::from(vec![Some(15.0), None])),
            ],
        )
        .unwrap();

        let mut buf = Vec::new();
        let mut writer = ArrowWriter::try_new(&mut buf, schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let path = temp_file("parquet", &buf);
        let table = load(&DataSource::path(&path), Duration::from_secs(1)).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[0].get("checkin_type"), &CellValue::String("mobile".into()));
        assert_eq!(table.rows[0].number("delay_at_checkout_in_minutes"), Some(15.0));
        assert!(table.rows[1].get("delay_at_checkout_in_minutes").is_null());
    }

    #[test]
    fn workbook_sheet_is_selected_by_name() {
        use crate::data::delay::{compute_delay_impact, CHECKOUT_DELAY, DELAY_FROM_PREVIOUS};
        use rust_xlsxwriter::Workbook;

        let path = std::env::temp_dir().join(format!(
            "getaround-loader-{}-{}.xlsx",
            std::process::id(),
            COUNTER.fetch_add(1, Ordering::SeqCst)
        ));

        let mut workbook = Workbook::new();
        let docs = workbook.add_worksheet().set_name("Documentation").unwrap();
        docs.write_string(0, 0, "field").unwrap();
        docs.write_string(1, 0, "rental_id").unwrap();

        let headers = [
            "rental_id",
            "car_id",
            "checkin_type",
            "state",
            "delay_at_checkout_in_minutes",
            "previous_ended_rental_id",
            "time_delta_with_previous_rental_in_minutes",
        ];
        let data = workbook.add_worksheet().set_name("rentals_data").unwrap();
        for (col, name) in headers.iter().enumerate() {
            data.write_string(0, col as u16, *name).unwrap();
        }
        // ids are stored as floats, the way spreadsheets keep them
        data.write_number(1, 0, 1.0).unwrap();
        data.write_number(1, 1, 10.0).unwrap();
        data.write_string(1, 2, "mobile").unwrap();
        data.write_string(1, 3, "ended").unwrap();
        data.write_number(1, 4, 15.0).unwrap();
        data.write_number(2, 0, 2.0).unwrap();
        data.write_number(2, 1, 10.0).unwrap();
        data.write_string(2, 2, "connect").unwrap();
        data.write_string(2, 3, "ended").unwrap();
        data.write_number(2, 5, 1.0).unwrap();
        data.write_number(2, 6, 60.0).unwrap();
        workbook.save(&path).unwrap();

        let location = path.to_string_lossy();
        let rentals = load(&DataSource::new(&location, Some("rentals_data")), Duration::from_secs(1)).unwrap();
        assert_eq!(rentals.column_names, headers);
        assert_eq!(rentals.len(), 2);
        assert!(rentals.rows[1].get(CHECKOUT_DELAY).is_null());

        let impact = compute_delay_impact(&rentals);
        assert_eq!(impact.len(), 1);
        assert_eq!(impact.rows[0].number(DELAY_FROM_PREVIOUS), Some(15.0));

        let first = load(&DataSource::new(&location, None), Duration::from_secs(1)).unwrap();
        assert_eq!(first.column_names, vec!["field"]);
        assert_eq!(first.len(), 1);

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn missing_file_is_an_error() {
        let source = DataSource::new("/nonexistent/get_around_delay_analysis.xlsx", Some("rentals_data"));
        assert!(load(&source, Duration::from_secs(1)).is_err());
    }

    #[test]
    fn malformed_workbook_is_an_error() {
        let path = temp_file("xlsx", b"definitely not a zip archive");
        let source = DataSource::new(&path.to_string_lossy(), Some("rentals_data"));
        let err = load(&source, Duration::from_secs(1)).unwrap_err();
        assert!(format!("{err:#}").contains("opening workbook"));
    }

    #[test]
    fn unsupported_extension_is_an_error() {
        let path = temp_file("txt", b"hello");
        let err = load(&DataSource::path(&path), Duration::from_secs(1)).unwrap_err();
        assert!(err.to_string().contains("Unsupported file extension"));
    }

    #[test]
    fn extension_ignores_query_string() {
        let source = DataSource::new("https://host/data/pricing.CSV?x=1", None);
        assert!(source.is_remote());
        assert_eq!(source.extension(), "csv");
    }
}
