use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use arrow::array::{Array, AsArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Float64Type, Int64Type};
use parking_lot::{Mutex, const_mutex};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use super::model::Series;

/// Extensions understood by [`load_series`].
pub const SUPPORTED_EXTENSIONS: &[&str] = &["parquet", "pq", "csv", "json"];

/// Candidate index column names, in priority order.
const INDEX_COLUMNS: &[&str] = &["timestamp", "time", "date", "index"];
const VALUE_COLUMN: &str = "value";

/// Held while decoding a file in [`LoadMode::Serialized`].
static LOADER_LOCK: Mutex<()> = const_mutex(());

// ---------------------------------------------------------------------------
// Load mode
// ---------------------------------------------------------------------------

/// How concurrent load tasks share the decoders.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadMode {
    /// Every file is decoded independently on its own worker.
    #[default]
    Parallel,
    /// Loads still run on the pool, but only one file is decoded at a time.
    /// For decoders that must not be entered from several threads at once.
    Serialized,
}

// ---------------------------------------------------------------------------
// Discovery
// ---------------------------------------------------------------------------

/// List the files directly inside `dir` whose extension is in `extensions`
/// (case-insensitive), sorted by path.
pub fn discover_files(dir: &Path, extensions: &[String]) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("reading data directory {}", dir.display()))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("listing {}", dir.display()))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let matches = extension_of(&path)
            .map(|ext| extensions.iter().any(|e| e.eq_ignore_ascii_case(&ext)))
            .unwrap_or(false);
        if matches {
            files.push(path);
        } else {
            log::debug!("skipping {}", path.display());
        }
    }

    files.sort();
    Ok(files)
}

fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

/// The series name for a file: its stem.
pub fn series_name(path: &Path) -> Result<String> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(str::to_string)
        .with_context(|| format!("cannot derive a series name from {}", path.display()))
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load one time series from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.parquet` – an index column (`timestamp`, `time`, `date` or `index`,
///   optional) and a value column (`value`, else the first numeric column)
/// * `.csv`     – same column rules, header row required
/// * `.json`    – `[1.0, 2.0, null, ...]` or `{ "index": [...], "values": [...] }`
pub fn load_series(path: &Path) -> Result<Series> {
    #[cfg(test)]
    let _decoding = decode_tracking::enter(path);

    let name = series_name(path)?;
    let ext = extension_of(path).unwrap_or_default();

    let series = match ext.as_str() {
        "parquet" | "pq" => load_parquet(path, name),
        "json" => load_json(path, name),
        "csv" => load_csv(path, name),
        other => bail!("Unsupported file extension: .{other}"),
    }
    .with_context(|| format!("loading {}", path.display()))?;

    log::debug!("loaded {series}");
    Ok(series)
}

/// [`load_series`] honouring a [`LoadMode`].
pub fn load_series_with(path: &Path, mode: LoadMode) -> Result<Series> {
    match mode {
        LoadMode::Parallel => load_series(path),
        LoadMode::Serialized => {
            let _guard = LOADER_LOCK.lock();
            load_series(path)
        }
    }
}

/// Counts concurrent decodes of files whose name starts with [`TRACKED_PREFIX`].
/// Each tracked decode also lingers briefly so overlapping loads would be seen.
#[cfg(test)]
mod decode_tracking {
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    pub(super) const TRACKED_PREFIX: &str = "tracked-";

    static ACTIVE: AtomicUsize = AtomicUsize::new(0);
    static PEAK: AtomicUsize = AtomicUsize::new(0);

    pub(super) struct Decoding {
        tracked: bool,
    }

    pub(super) fn enter(path: &Path) -> Decoding {
        let tracked = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with(TRACKED_PREFIX));
        if tracked {
            let now = ACTIVE.fetch_add(1, Ordering::SeqCst) + 1;
            PEAK.fetch_max(now, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(25));
        }
        Decoding { tracked }
    }

    impl Drop for Decoding {
        fn drop(&mut self) {
            if self.tracked {
                ACTIVE.fetch_sub(1, Ordering::SeqCst);
            }
        }
    }

    pub(super) fn reset_peak() {
        PEAK.store(0, Ordering::SeqCst);
    }

    pub(super) fn peak() -> usize {
        PEAK.load(Ordering::SeqCst)
    }
}

// ---------------------------------------------------------------------------
// Column selection (shared by CSV and Parquet)
// ---------------------------------------------------------------------------

#[derive(Debug, PartialEq)]
struct ColumnChoice {
    index: Option<usize>,
    value: usize,
}

/// Pick the index and value columns. `numeric(i)` tells whether column `i`
/// can serve as a value column when no column is called `value`.
fn choose_columns(names: &[&str], numeric: impl Fn(usize) -> bool) -> Result<ColumnChoice> {
    let index = INDEX_COLUMNS.iter().find_map(|candidate| {
        names
            .iter()
            .position(|n| n.trim().eq_ignore_ascii_case(candidate))
    });

    let value = names
        .iter()
        .position(|n| n.trim().eq_ignore_ascii_case(VALUE_COLUMN))
        .or_else(|| (0..names.len()).find(|&i| Some(i) != index && numeric(i)))
        .context("no value column found")?;

    Ok(ColumnChoice { index, value })
}

fn build_series(name: String, index: Option<Vec<i64>>, values: Vec<f64>) -> Result<Series> {
    match index {
        Some(index) => Ok(Series::new(name, index, values)?),
        None => Ok(Series::from_values(name, values)),
    }
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Two accepted shapes:
///
/// ```json
/// [101.2, 101.5, null, 102.0]
/// ```
///
/// ```json
/// { "index": [1000, 1060, 1120], "values": [101.2, 101.5, 102.0] }
/// ```
fn load_json(path: &Path, name: String) -> Result<Series> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    match root {
        JsonValue::Array(items) => {
            let values = json_values(&items)?;
            Ok(Series::from_values(name, values))
        }
        JsonValue::Object(obj) => {
            let values = obj
                .get("values")
                .and_then(|v| v.as_array())
                .context("missing or invalid 'values' array")?;
            let values = json_values(values)?;

            let index = match obj.get("index") {
                None | Some(JsonValue::Null) => None,
                Some(v) => {
                    let arr = v.as_array().context("'index' is not an array")?;
                    let index = arr
                        .iter()
                        .enumerate()
                        .map(|(j, v)| {
                            v.as_i64()
                                .with_context(|| format!("index[{j}]: not an integer"))
                        })
                        .collect::<Result<Vec<_>>>()?;
                    Some(index)
                }
            };

            build_series(name, index, values)
        }
        _ => bail!("Expected a JSON array or object at top level"),
    }
}

fn json_values(items: &[JsonValue]) -> Result<Vec<f64>> {
    items
        .iter()
        .enumerate()
        .map(|(j, v)| match v {
            JsonValue::Null => Ok(f64::NAN),
            other => other
                .as_f64()
                .with_context(|| format!("values[{j}]: not a number")),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row, one observation per line.
///   `timestamp,value`
///   `1000,101.2`
/// Empty value cells are read as `NaN`.
fn load_csv(path: &Path, name: String) -> Result<Series> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();
    let records = reader
        .records()
        .enumerate()
        .map(|(row_no, r)| r.with_context(|| format!("CSV row {row_no}")))
        .collect::<Result<Vec<_>>>()?;

    let header_refs: Vec<&str> = headers.iter().map(String::as_str).collect();
    let choice = choose_columns(&header_refs, |col| csv_column_is_numeric(&records, col))?;

    let mut index = choice.index.map(|_| Vec::with_capacity(records.len()));
    let mut values = Vec::with_capacity(records.len());

    for (row_no, record) in records.iter().enumerate() {
        let raw = record.get(choice.value).unwrap_or("").trim();
        let value = if raw.is_empty() {
            f64::NAN
        } else {
            raw.parse::<f64>()
                .with_context(|| format!("Row {row_no}: '{raw}' is not a number"))?
        };
        values.push(value);

        if let (Some(idx_col), Some(index)) = (choice.index, index.as_mut()) {
            let raw = record.get(idx_col).unwrap_or("").trim();
            let at = raw
                .parse::<i64>()
                .with_context(|| format!("Row {row_no}: index '{raw}' is not an integer"))?;
            index.push(at);
        }
    }

    build_series(name, index, values)
}

/// A column is numeric when it has at least one non-empty cell and every
/// non-empty cell parses as `f64`.
fn csv_column_is_numeric(records: &[csv::StringRecord], col: usize) -> bool {
    let mut cells = records
        .iter()
        .map(|r| r.get(col).unwrap_or("").trim())
        .filter(|cell| !cell.is_empty())
        .peekable();
    cells.peek().is_some() && cells.all(|cell| cell.parse::<f64>().is_ok())
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file holding one series.
///
/// The index column may be any integer, date or timestamp type (cast to
/// `i64`); the value column any numeric type (cast to `f64`). Null values
/// become `NaN`; a null index is an error.
fn load_parquet(path: &Path, name: String) -> Result<Series> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .context("reading parquet metadata")?;

    let schema = builder.schema().clone();
    let names: Vec<&str> = schema.fields().iter().map(|f| f.name().as_str()).collect();
    let choice = choose_columns(&names, |i| schema.field(i).data_type().is_numeric())?;

    let reader = builder.build().context("building parquet reader")?;

    let mut index = choice.index.map(|_| Vec::new());
    let mut values = Vec::new();
    // Rows read in earlier batches, so errors name the row in the file.
    let mut row_offset = 0;

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;

        let value_col = cast(batch.column(choice.value), &DataType::Float64)
            .context("casting value column to Float64")?;
        values.extend(
            value_col
                .as_primitive::<Float64Type>()
                .iter()
                .map(|v| v.unwrap_or(f64::NAN)),
        );

        if let (Some(idx_col), Some(index)) = (choice.index, index.as_mut()) {
            let index_col = cast(batch.column(idx_col), &DataType::Int64)
                .context("casting index column to Int64")?;
            let index_arr = index_col.as_primitive::<Int64Type>();
            for row in 0..index_arr.len() {
                if index_arr.is_null(row) {
                    bail!("Row {}: null index value", row_offset + row);
                }
                index.push(index_arr.value(row));
            }
        }
        row_offset += batch.num_rows();
    }

    build_series(name, index, values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::Arc;

    use arrow::array::{Float64Array, Int64Array, TimestampMillisecondArray};
    use arrow::datatypes::{Field, Schema, TimeUnit};
    use arrow::record_batch::RecordBatch;
    use parquet::arrow::ArrowWriter;

    fn exts() -> Vec<String> {
        SUPPORTED_EXTENSIONS.iter().map(|s| s.to_string()).collect()
    }

    fn write_parquet(path: &Path, batch: RecordBatch) {
        let file = fs::File::create(path).unwrap();
        let mut writer = ArrowWriter::try_new(file, batch.schema(), None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();
    }

    #[test]
    fn discover_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.csv", "a.JSON", "c.txt", "d.parquet"] {
            fs::write(dir.path().join(name), "").unwrap();
        }
        fs::create_dir(dir.path().join("nested.csv")).unwrap();

        let files = discover_files(dir.path(), &exts()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["a.JSON", "b.csv", "d.parquet"]);
    }

    #[test]
    fn discover_missing_dir_fails() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        let err = discover_files(&missing, &exts()).unwrap_err();
        assert!(format!("{err:#}").contains("reading data directory"));
    }

    #[test]
    fn csv_with_index_and_gaps() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("aapl.csv");
        fs::write(&path, "timestamp,value\n3,30.5\n1,10.5\n2,\n").unwrap();

        let s = load_series(&path).unwrap();
        assert_eq!(s.name(), "aapl");
        assert_eq!(s.index(), &[1, 2, 3]);
        assert_eq!(s.values()[0], 10.5);
        assert!(s.values()[1].is_nan());
        assert_eq!(s.values()[2], 30.5);
    }

    #[test]
    fn csv_without_value_header_uses_first_other_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("x.csv");
        fs::write(&path, "Time,close,volume\n10,1.0,5\n20,2.0,6\n").unwrap();

        let s = load_series(&path).unwrap();
        assert_eq!(s.index(), &[10, 20]);
        assert_eq!(s.values(), &[1.0, 2.0]);
    }

    #[test]
    fn csv_skips_text_columns_when_choosing_value() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ibm.csv");
        fs::write(&path, "timestamp,symbol,close\n1,IBM,10.5\n2,IBM,11.0\n").unwrap();

        let s = load_series(&path).unwrap();
        assert_eq!(s.index(), &[1, 2]);
        assert_eq!(s.values(), &[10.5, 11.0]);
    }

    #[test]
    fn csv_numeric_column_may_have_gaps() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gaps.csv");
        fs::write(&path, "note,empty,close\nx,,1.0\ny,,\nz,,3.0\n").unwrap();

        let s = load_series(&path).unwrap();
        assert_eq!(s.values()[0], 1.0);
        assert!(s.values()[1].is_nan());
        assert_eq!(s.values()[2], 3.0);
    }

    #[test]
    fn csv_without_numeric_column_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("words.csv");
        fs::write(&path, "time,label\n1,a\n2,b\n").unwrap();

        let err = load_series(&path).unwrap_err();
        assert!(format!("{err:#}").contains("no value column found"));
    }

    #[test]
    fn csv_bad_number_reports_row() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.csv");
        fs::write(&path, "value\n1.0\nabc\n").unwrap();

        let err = load_series(&path).unwrap_err();
        assert!(format!("{err:#}").contains("Row 1"));
    }

    #[test]
    fn json_bare_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("s.json");
        fs::write(&path, "[1.0, null, 3]").unwrap();

        let s = load_series(&path).unwrap();
        assert_eq!(s.index(), &[0, 1, 2]);
        assert!(s.values()[1].is_nan());
        assert_eq!(s.values()[2], 3.0);
    }

    #[test]
    fn json_object_with_index() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("s.json");
        fs::write(&path, r#"{"index": [5, 6], "values": [0.5, 0.6]}"#).unwrap();

        let s = load_series(&path).unwrap();
        assert_eq!(s.index(), &[5, 6]);
        assert_eq!(s.values(), &[0.5, 0.6]);
    }

    #[test]
    fn json_duplicate_index_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dup.json");
        fs::write(&path, r#"{"index": [1, 1], "values": [0.5, 0.6]}"#).unwrap();

        let err = load_series(&path).unwrap_err();
        assert!(format!("{err:#}").contains("duplicate index"));
    }

    #[test]
    fn parquet_with_timestamp_index() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("msft.parquet");
        let schema = Arc::new(Schema::new(vec![
            Field::new("timestamp", DataType::Timestamp(TimeUnit::Millisecond, None), false),
            Field::new("value", DataType::Float64, true),
        ]));
        let batch = RecordBatch::try_new(
            schema,
            vec![
                Arc::new(TimestampMillisecondArray::from(vec![60_000, 0, 120_000])),
                Arc::new(Float64Array::from(vec![Some(2.0), Some(1.0), None])),
            ],
        )
        .unwrap();
        write_parquet(&path, batch);

        let s = load_series(&path).unwrap();
        assert_eq!(s.name(), "msft");
        assert_eq!(s.index(), &[0, 60_000, 120_000]);
        assert_eq!(&s.values()[..2], &[1.0, 2.0]);
        assert!(s.values()[2].is_nan());
    }

    #[test]
    fn parquet_integer_values_without_index() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ints.pq");
        let schema = Arc::new(Schema::new(vec![Field::new("close", DataType::Int64, false)]));
        let batch =
            RecordBatch::try_new(schema, vec![Arc::new(Int64Array::from(vec![4, 5, 6]))]).unwrap();
        write_parquet(&path, batch);

        let s = load_series(&path).unwrap();
        assert_eq!(s.index(), &[0, 1, 2]);
        assert_eq!(s.values(), &[4.0, 5.0, 6.0]);
    }

    #[test]
    fn parquet_null_index_reports_row_in_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("holes.parquet");
        let rows = 3000;
        let index: Vec<Option<i64>> = (0..rows as i64)
            .map(|t| if t == 2500 { None } else { Some(t) })
            .collect();
        let schema = Arc::new(Schema::new(vec![
            Field::new("timestamp", DataType::Int64, true),
            Field::new("value", DataType::Float64, false),
        ]));
        let batch = RecordBatch::try_new(
            schema,
            vec![
                Arc::new(Int64Array::from(index)),
                Arc::new(Float64Array::from(vec![1.0; rows])),
            ],
        )
        .unwrap();
        write_parquet(&path, batch);

        // The reader hands this back in several batches.
        let err = load_series(&path).unwrap_err();
        assert!(format!("{err:#}").contains("Row 2500: null index value"), "{err:#}");
    }

    #[test]
    fn unsupported_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("s.txt");
        fs::write(&path, "1").unwrap();
        let err = load_series(&path).unwrap_err();
        assert!(err.to_string().contains("Unsupported file extension"));
    }

    #[test]
    fn serialized_mode_loads_the_same() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("s.json");
        fs::write(&path, "[1, 2, 3]").unwrap();
        let a = load_series_with(&path, LoadMode::Parallel).unwrap();
        let b = load_series_with(&path, LoadMode::Serialized).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn serialized_mode_decodes_one_file_at_a_time() {
        use crate::executor::Executor;

        let dir = tempfile::tempdir().unwrap();
        let paths: Vec<PathBuf> = (0..8)
            .map(|i| {
                let path = dir
                    .path()
                    .join(format!("{}{i}.json", decode_tracking::TRACKED_PREFIX));
                fs::write(&path, "[1, 2, 3]").unwrap();
                path
            })
            .collect();

        let load_all = |mode: LoadMode| {
            let executor = Executor::new(4);
            let futures: Vec<_> = paths
                .iter()
                .cloned()
                .map(|p| executor.try_submit(move || load_series_with(&p, mode)))
                .collect();
            for fut in futures {
                assert_eq!(fut.result().unwrap().len(), 3);
            }
        };

        decode_tracking::reset_peak();
        load_all(LoadMode::Serialized);
        assert_eq!(decode_tracking::peak(), 1);

        // Same workload without the lock does overlap.
        decode_tracking::reset_peak();
        load_all(LoadMode::Parallel);
        assert!(decode_tracking::peak() > 1);
    }

    #[test]
    fn column_choice_priority() {
        let choice = choose_columns(&["index", "value", "time"], |_| true).unwrap();
        assert_eq!(
            choice,
            ColumnChoice {
                index: Some(2),
                value: 1
            }
        );

        let choice = choose_columns(&["label", "price"], |i| i == 1).unwrap();
        assert_eq!(
            choice,
            ColumnChoice {
                index: None,
                value: 1
            }
        );

        assert!(choose_columns(&["timestamp"], |_| true).is_err());
    }
}
