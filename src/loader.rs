use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use arrow::array::{
    Array, AsArray, BooleanArray, Float32Array, Float64Array, Int32Array, Int64Array, StringArray,
};
use arrow::datatypes::DataType;
use log::info;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use crate::db::model::FieldValue;
use crate::error::IngestError;

// ---------------------------------------------------------------------------
// CatalogTable – a loaded input file
// ---------------------------------------------------------------------------

/// One row of an input catalog: column name → value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatalogRow(pub BTreeMap<String, FieldValue>);

impl CatalogRow {
    pub fn get(&self, column: &str) -> &FieldValue {
        static NULL: FieldValue = FieldValue::Null;
        self.0.get(column).unwrap_or(&NULL)
    }

    /// Non-blank text of a column.
    pub fn text(&self, column: &str) -> Option<String> {
        self.get(column).as_text()
    }

    /// Numeric value of a column. Null and blank cells are absent; any
    /// other non-numeric cell is rejected rather than dropped.
    pub fn number(&self, column: &str) -> crate::error::Result<Option<f64>> {
        let value = self.get(column);
        if let Some(v) = value.as_f64() {
            return Ok(Some(v));
        }
        match value.as_text() {
            None => Ok(None),
            Some(text) => text
                .parse::<f64>()
                .map(Some)
                .map_err(|_| IngestError::invalid(column, text, "is not a number")),
        }
    }
}

impl<K: Into<String>, V: Into<FieldValue>> FromIterator<(K, V)> for CatalogRow {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        CatalogRow(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// A parsed input catalog with its header order preserved.
#[derive(Debug, Clone, Default)]
pub struct CatalogTable {
    pub column_names: Vec<String>,
    pub rows: Vec<CatalogRow>,
}

impl CatalogTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.column_names.iter().any(|c| c == column)
    }
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a catalog table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row, one catalog row per line
/// * `.json`    – `[{ "source": "...", "spectral_type": "...", ... }, ...]`
/// * `.parquet` – flat scalar columns
pub fn load_file(path: &Path) -> Result<CatalogTable> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let table = match ext.as_str() {
        "csv" => load_csv(path),
        "json" => load_json(path),
        "parquet" | "pq" => load_parquet(path),
        other => bail!("Unsupported file extension: .{other}"),
    }
    .with_context(|| format!("loading {}", path.display()))?;

    info!(
        "Read {} rows ({} columns) from {}",
        table.len(),
        table.column_names.len(),
        path.display()
    );
    Ok(table)
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented):
///
/// ```json
/// [
///   { "source": "Fake 1", "spectral_type": "M5.6", "reference": "Ref 1", "regime": "nir" },
///   ...
/// ]
/// ```
fn load_json(path: &Path) -> Result<CatalogTable> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let records = root
        .as_array()
        .context("Expected top-level JSON array")?;

    let mut column_names: Vec<String> = Vec::new();
    let mut rows = Vec::with_capacity(records.len());

    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;

        let mut row = BTreeMap::new();
        for (key, val) in obj {
            if !column_names.contains(key) {
                column_names.push(key.clone());
            }
            row.insert(key.clone(), FieldValue::from_json(val));
        }
        rows.push(CatalogRow(row));
    }

    Ok(CatalogTable { column_names, rows })
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names, cells typed by inference.
fn load_csv(path: &Path) -> Result<CatalogTable> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .context("opening CSV")?;
    let column_names: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut rows = Vec::new();

    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;

        let row = column_names
            .iter()
            .zip(record.iter())
            .map(|(col, value)| (col.clone(), guess_field_type(value)))
            .collect();
        rows.push(CatalogRow(row));
    }

    Ok(CatalogTable { column_names, rows })
}

fn guess_field_type(s: &str) -> FieldValue {
    if s.is_empty() {
        return FieldValue::Null;
    }
    if let Ok(i) = s.parse::<i64>() {
        return FieldValue::Integer(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        return FieldValue::Float(f);
    }
    if s == "true" || s == "false" {
        return FieldValue::Bool(s == "true");
    }
    FieldValue::String(s.to_string())
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file of scalar columns (strings, ints, floats, bools).
///
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`).
fn load_parquet(path: &Path) -> Result<CatalogTable> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .context("reading parquet metadata")?;
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
        let schema = batch.schema();

        for row in 0..batch.num_rows() {
            let mut values = BTreeMap::new();
            for (col_idx, field) in schema.fields().iter().enumerate() {
                let value = extract_field_value(batch.column(col_idx), row)
                    .with_context(|| format!("Row {row}: failed to read '{}'", field.name()))?;
                values.insert(field.name().clone(), value);
            }
            rows.push(CatalogRow(values));
        }
    }

    Ok(CatalogTable { column_names, rows })
}

/// Extract a single value from an Arrow column at a given row.
fn extract_field_value(col: &Arc<dyn Array>, row: usize) -> Result<FieldValue> {
    if col.is_null(row) {
        return Ok(FieldValue::Null);
    }
    let value = match col.data_type() {
        DataType::Utf8 => {
            let arr = col
                .as_any()
                .downcast_ref::<StringArray>()
                .context("expected StringArray")?;
            FieldValue::String(arr.value(row).to_string())
        }
        DataType::LargeUtf8 => FieldValue::String(col.as_string::<i64>().value(row).to_string()),
        DataType::Int32 => {
            let arr = col
                .as_any()
                .downcast_ref::<Int32Array>()
                .context("expected Int32Array")?;
            FieldValue::Integer(arr.value(row) as i64)
        }
        DataType::Int64 => {
            let arr = col
                .as_any()
                .downcast_ref::<Int64Array>()
                .context("expected Int64Array")?;
            FieldValue::Integer(arr.value(row))
        }
        DataType::Float32 => {
            let arr = col
                .as_any()
                .downcast_ref::<Float32Array>()
                .context("expected Float32Array")?;
            FieldValue::Float(arr.value(row) as f64)
        }
        DataType::Float64 => {
            let arr = col
                .as_any()
                .downcast_ref::<Float64Array>()
                .context("expected Float64Array")?;
            FieldValue::Float(arr.value(row))
        }
        DataType::Boolean => {
            let arr = col
                .as_any()
                .downcast_ref::<BooleanArray>()
                .context("expected BooleanArray")?;
            FieldValue::Bool(arr.value(row))
        }
        other => bail!("unsupported column type {other:?}"),
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_load_csv_infers_types() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("spt.csv");
        fs::write(
            &path,
            "source,spectral_type,reference,plx\nFake 1,M5.6,Ref 1,113.0\nFake 2, T0.1 ,Ref 1,\n",
        )
        .unwrap();

        let table = load_file(&path).unwrap();
        assert_eq!(table.column_names, ["source", "spectral_type", "reference", "plx"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[0].number("plx").unwrap(), Some(113.0));
        assert_eq!(table.rows[1].text("spectral_type").as_deref(), Some("T0.1"));
        assert!(table.rows[1].get("plx").is_null());
        assert!(table.rows[1].get("missing").is_null());
    }

    #[test]
    fn test_load_json_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pm.json");
        fs::write(
            &path,
            r#"[{"source": "Fake 1", "mu_ra": 113.0, "reference": "Ref 1"},
                {"source": "Fake 3", "mu_ra": 55, "reference": null}]"#,
        )
        .unwrap();

        let table = load_file(&path).unwrap();
        assert_eq!(table.len(), 2);
        assert!(table.has_column("mu_ra"));
        assert_eq!(table.rows[1].number("mu_ra").unwrap(), Some(55.0));
        assert_eq!(table.rows[1].text("reference"), None);
    }

    #[test]
    fn test_load_parquet_with_nulls() {
        use arrow::datatypes::{Field, Schema};
        use arrow::record_batch::RecordBatch;
        use parquet::arrow::ArrowWriter;

        let schema = Arc::new(Schema::new(vec![
            Field::new("source", DataType::Utf8, false),
            Field::new("parallax", DataType::Float64, true),
            Field::new("n_obs", DataType::Int32, false),
            Field::new("flagged", DataType::Boolean, false),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(StringArray::from(vec!["Fake 1", "Fake 2", "Fake 3"])),
                Arc::new(Float64Array::from(vec![Some(113.0), None, Some(f64::NAN)])),
                Arc::new(Int32Array::from(vec![3, 1, 2])),
                Arc::new(BooleanArray::from(vec![false, true, false])),
            ],
        )
        .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plx.parquet");
        let mut writer = ArrowWriter::try_new(fs::File::create(&path).unwrap(), schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let table = load_file(&path).unwrap();
        assert_eq!(table.column_names, ["source", "parallax", "n_obs", "flagged"]);
        assert_eq!(table.len(), 3);
        assert_eq!(table.rows[0].text("source").as_deref(), Some("Fake 1"));
        assert_eq!(table.rows[0].number("parallax").unwrap(), Some(113.0));
        assert_eq!(table.rows[0].get("n_obs"), &FieldValue::Integer(3));
        assert!(table.rows[1].get("parallax").is_null());
        assert_eq!(table.rows[1].number("parallax").unwrap(), None);
        assert_eq!(table.rows[1].get("flagged"), &FieldValue::Bool(true));
        assert!(table.rows[2].number("parallax").unwrap().unwrap().is_nan());
    }

    #[test]
    fn test_number_rejects_text() {
        let row: CatalogRow = [
            ("sep", FieldValue::from("-5 arcsec")),
            ("plx", FieldValue::from(" 12.5")),
            ("blank", FieldValue::from("  ")),
        ]
        .into_iter()
        .collect();
        assert!(matches!(
            row.number("sep"),
            Err(IngestError::InvalidValue { .. })
        ));
        assert_eq!(row.number("plx").unwrap(), Some(12.5));
        assert_eq!(row.number("blank").unwrap(), None);
        assert_eq!(row.number("absent").unwrap(), None);
    }

    #[test]
    fn test_unsupported_extension() {
        let err = load_file(Path::new("catalog.vot")).unwrap_err();
        assert!(err.to_string().contains("Unsupported file extension"));
    }

    #[test]
    fn test_json_must_be_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, r#"{"source": "Fake 1"}"#).unwrap();
        let err = load_file(&path).unwrap_err();
        assert!(format!("{err:#}").contains("Expected top-level JSON array"));
    }
}
