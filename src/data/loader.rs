use std::path::Path;

use arrow::array::{Array, ArrayRef, AsArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Float64Type, Int64Type};
use arrow::util::display::array_value_to_string;
use log::{debug, info};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{CellValue, Column, Table};
use crate::error::LoadError;

/// Text cells treated as missing, following Pandas' default NA markers.
const NA_MARKERS: &[&str] = &["", "NaN", "nan", "NA", "N/A", "null"];

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`            – header row followed by comma-separated records
/// * `.tsv` / `.tab`   – same, tab-separated (UniProt's download format)
/// * `.json`           – `[{ "Entry": "P1", "Mass": 100, ... }, ...]`
/// * `.parquet` / `.pq`
///
/// Each call returns an independently owned table.
pub fn load_file(path: &Path) -> Result<Table, LoadError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let table = match ext.as_str() {
        "csv" => load_delimited(path, b',')?,
        "tsv" | "tab" => load_delimited(path, b'\t')?,
        "json" => load_json(path)?,
        "parquet" | "pq" => load_parquet(path)?,
        other => return Err(LoadError::UnsupportedFormat(other.to_string())),
    };

    info!(
        "Loaded {} rows x {} columns from {}",
        table.len(),
        table.column_names().count(),
        path.display()
    );
    Ok(table)
}

// ---------------------------------------------------------------------------
// CSV / TSV loader
// ---------------------------------------------------------------------------

/// Header row declares the fields; every record must have exactly that many.
fn load_delimited(path: &Path, delimiter: u8) -> Result<Table, LoadError> {
    let csv_err = |source| LoadError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let file = std::fs::File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .from_reader(file);

    let headers: Vec<String> = reader
        .headers()
        .map_err(csv_err)?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect();

    let mut raw: Vec<Vec<String>> = vec![Vec::new(); headers.len()];
    for result in reader.records() {
        let record = result.map_err(csv_err)?;
        for (cells, field) in raw.iter_mut().zip(record.iter()) {
            cells.push(field.to_string());
        }
    }

    debug!("{}: {} header fields", path.display(), headers.len());
    let columns = headers
        .into_iter()
        .zip(raw)
        .map(|(name, cells)| Column::new(name, type_column(cells)))
        .collect();
    Table::from_columns(path.display().to_string(), columns)
}

fn is_na(s: &str) -> bool {
    NA_MARKERS.contains(&s.trim())
}

/// Pick one type for the whole column, the way Pandas infers a dtype: a
/// column is numeric (or boolean) only when every non-missing cell parses,
/// otherwise all cells keep their raw text. Exponent notation is not read as
/// a number, so PDB codes such as `1E10` stay text.
fn type_column(cells: Vec<String>) -> Vec<CellValue> {
    let mut present = cells.iter().map(String::as_str).filter(|s| !is_na(s));

    if present.clone().all(|s| s.parse::<i64>().is_ok()) {
        convert_cells(&cells, |s| s.parse().ok().map(CellValue::Integer))
    } else if present.clone().all(is_decimal) {
        convert_cells(&cells, |s| s.parse().ok().map(CellValue::Float))
    } else if present.all(|s| s == "true" || s == "false") {
        convert_cells(&cells, |s| Some(CellValue::Bool(s == "true")))
    } else {
        cells
            .into_iter()
            .map(|s| if is_na(&s) { CellValue::Null } else { CellValue::String(s) })
            .collect()
    }
}

/// `12`, `-0.5`, `.5`: digits with at most one decimal point.
fn is_decimal(s: &str) -> bool {
    let body = s.strip_prefix('-').or_else(|| s.strip_prefix('+')).unwrap_or(s);
    body.chars().any(|c| c.is_ascii_digit())
        && body.chars().all(|c| c.is_ascii_digit() || c == '.')
        && body.matches('.').count() <= 1
}

fn convert_cells(cells: &[String], parse: impl Fn(&str) -> Option<CellValue>) -> Vec<CellValue> {
    cells
        .iter()
        .map(|s| if is_na(s) { None } else { parse(s) })
        .map(|v| v.unwrap_or(CellValue::Null))
        .collect()
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, the default `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "DrugBank ID": "DB00123", "Name": "Aspirin", "Molecular Weight": 180.16 },
///   ...
/// ]
/// ```
///
/// The declared fields are the union of keys in first-seen order; a record
/// lacking a key gets a missing cell there.
fn load_json(path: &Path) -> Result<Table, LoadError> {
    let origin = path.display().to_string();
    let text = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let root: JsonValue = serde_json::from_str(&text).map_err(|source| LoadError::Json {
        path: path.to_path_buf(),
        source,
    })?;

    let records = root.as_array().ok_or_else(|| LoadError::Malformed {
        origin: origin.clone(),
        message: "expected top-level JSON array".to_string(),
    })?;

    let mut columns: Vec<Column> = Vec::new();

    for (i, rec) in records.iter().enumerate() {
        let obj = rec.as_object().ok_or_else(|| LoadError::Malformed {
            origin: origin.clone(),
            message: format!("row {i} is not a JSON object"),
        })?;

        for key in obj.keys() {
            if !columns.iter().any(|c| &c.name == key) {
                // Earlier rows did not have this field.
                columns.push(Column::new(key.clone(), vec![CellValue::Null; i]));
            }
        }
        for col in &mut columns {
            col.values
                .push(obj.get(&col.name).map_or(CellValue::Null, json_to_cell));
        }
    }

    Table::from_columns(origin, columns)
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

/// Load a Parquet file; every schema field becomes a column.
///
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`).
fn load_parquet(path: &Path) -> Result<Table, LoadError> {
    let parquet_err = |source| LoadError::Parquet {
        path: path.to_path_buf(),
        source,
    };

    let file = std::fs::File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file).map_err(parquet_err)?;

    let mut columns: Vec<Column> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| Column::new(f.name().clone(), Vec::new()))
        .collect();

    let reader = builder.build().map_err(parquet_err)?;

    for batch_result in reader {
        let batch = batch_result?;
        for (col, array) in columns.iter_mut().zip(batch.columns()) {
            append_cells(&mut col.values, array)?;
        }
    }

    Table::from_columns(path.display().to_string(), columns)
}

// -- Parquet / Arrow helpers --

/// Append every cell of an Arrow column, mapping nulls to [`CellValue::Null`].
fn append_cells(out: &mut Vec<CellValue>, col: &ArrayRef) -> Result<(), LoadError> {
    match col.data_type() {
        DataType::Utf8 => {
            let arr = col.as_string::<i32>();
            out.extend(arr.iter().map(|v| v.map_or(CellValue::Null, CellValue::from)));
        }
        DataType::LargeUtf8 => {
            let arr = col.as_string::<i64>();
            out.extend(arr.iter().map(|v| v.map_or(CellValue::Null, CellValue::from)));
        }
        DataType::Boolean => {
            let arr = col.as_boolean();
            out.extend(arr.iter().map(|v| v.map_or(CellValue::Null, CellValue::Bool)));
        }
        DataType::Int8
        | DataType::Int16
        | DataType::Int32
        | DataType::Int64
        | DataType::UInt8
        | DataType::UInt16
        | DataType::UInt32 => {
            let widened = cast(col, &DataType::Int64)?;
            let arr = widened.as_primitive::<Int64Type>();
            out.extend(arr.iter().map(|v| v.map_or(CellValue::Null, CellValue::Integer)));
        }
        DataType::UInt64 | DataType::Float16 | DataType::Float32 | DataType::Float64 => {
            let widened = cast(col, &DataType::Float64)?;
            let arr = widened.as_primitive::<Float64Type>();
            out.extend(arr.iter().map(|v| v.map_or(CellValue::Null, CellValue::Float)));
        }
        _ => {
            for row in 0..col.len() {
                if col.is_null(row) {
                    out.push(CellValue::Null);
                } else {
                    out.push(CellValue::String(array_value_to_string(col, row)?));
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Arc;

    use arrow::array::{Float64Array, Int32Array, StringArray};
    use arrow::datatypes::{Field, Schema};
    use arrow::record_batch::RecordBatch;
    use parquet::arrow::ArrowWriter;

    fn write_file(dir: &tempfile::TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn csv_columns_are_typed_as_a_whole() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "uniprot.csv",
            "Entry,Mass,Organism,Length\nP1,100,Human,12.5\nP2,,Mouse,NaN\n",
        );
        let table = load_file(&path).unwrap();

        assert_eq!(
            table.column_names().collect::<Vec<_>>(),
            vec!["Entry", "Mass", "Organism", "Length"]
        );
        assert_eq!(table.len(), 2);
        assert_eq!(table.cell(0, "Mass"), Some(&CellValue::Integer(100)));
        assert_eq!(table.cell(0, "Length"), Some(&CellValue::Float(12.5)));
        assert_eq!(table.cell(1, "Mass"), Some(&CellValue::Null));
        assert_eq!(table.cell(1, "Length"), Some(&CellValue::Null));
        assert_eq!(table.cell(1, "Organism"), Some(&CellValue::from("Mouse")));
    }

    #[test]
    fn digit_like_identifiers_keep_their_text() {
        use crate::data::fields::FieldCatalog;
        use crate::data::filter::{evaluate, Criteria, Criterion};
        use crate::data::project::project;

        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "uniprot.csv",
            "Entry,Entry Name,PDB\nP1,ESR1_HUMAN,1E10\nP2,0071,2E3\nP3,,\n",
        );
        let table = load_file(&path).unwrap();

        let values = project(&table, &[0, 1, 2], &["PDB", "Entry Name"]).unwrap();
        assert_eq!(
            values["PDB"],
            vec![CellValue::from("1E10"), CellValue::from("2E3"), CellValue::Null]
        );
        assert_eq!(
            values["Entry Name"],
            vec![CellValue::from("ESR1_HUMAN"), CellValue::from("0071"), CellValue::Null]
        );

        let catalog = FieldCatalog::protein();
        let pdb = Criteria::new().with("PDB", Criterion::contains("1e10"));
        assert_eq!(evaluate(&table, &catalog, &pdb), vec![0]);
        let name = Criteria::new().with("Entry Name", Criterion::contains("0071"));
        assert_eq!(evaluate(&table, &catalog, &name), vec![1]);
    }

    #[test]
    fn all_numeric_column_with_leading_zeros_is_numeric() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "t.csv", "Length\n0071\n595\n");
        let table = load_file(&path).unwrap();
        assert_eq!(table.cell(0, "Length"), Some(&CellValue::Integer(71)));
    }

    #[test]
    fn quoted_reference_fields_survive_csv_quoting() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "uniprot.csv",
            "Entry,DrugBank-reference\nP1,\"\"\"DB00123; AspirinX\"\" \"\"DB00456; Other\"\"\"\n",
        );
        let table = load_file(&path).unwrap();
        assert_eq!(
            table.cell(0, "DrugBank-reference"),
            Some(&CellValue::from(r#""DB00123; AspirinX" "DB00456; Other""#))
        );
    }

    #[test]
    fn tsv_uses_tabs() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "uniprot.tsv", "Entry\tGene Names\nP1\tESR1 ESR\n");
        let table = load_file(&path).unwrap();
        assert_eq!(table.cell(0, "Gene Names"), Some(&CellValue::from("ESR1 ESR")));
    }

    #[test]
    fn ragged_csv_is_a_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "bad.csv", "a,b\n1,2\n3\n");
        assert!(matches!(load_file(&path), Err(LoadError::Csv { .. })));
    }

    #[test]
    fn missing_file_is_a_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.csv");
        assert!(matches!(load_file(&path), Err(LoadError::Io { .. })));
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let err = load_file(Path::new("table.xlsx")).unwrap_err();
        assert!(matches!(err, LoadError::UnsupportedFormat(ext) if ext == "xlsx"));
    }

    #[test]
    fn json_records_fill_absent_keys_with_null() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "drugs.json",
            r#"[{"DrugBank ID": "DB00123", "Name": "Aspirin"},
               {"DrugBank ID": "DB00456", "Molecular Weight": 180.5}]"#,
        );
        let table = load_file(&path).unwrap();
        assert_eq!(
            table.column_names().collect::<Vec<_>>(),
            vec!["DrugBank ID", "Name", "Molecular Weight"]
        );
        assert_eq!(table.cell(0, "Molecular Weight"), Some(&CellValue::Null));
        assert_eq!(table.cell(1, "Name"), Some(&CellValue::Null));
        assert_eq!(table.cell(1, "Molecular Weight"), Some(&CellValue::Float(180.5)));
    }

    #[test]
    fn json_must_be_an_array_of_objects() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "bad.json", r#"{"Entry": "P1"}"#);
        assert!(matches!(load_file(&path), Err(LoadError::Malformed { .. })));
        let path = write_file(&dir, "bad2.json", r#"[1, 2]"#);
        assert!(matches!(load_file(&path), Err(LoadError::Malformed { .. })));
    }

    #[test]
    fn parquet_columns_and_nulls_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("uniprot.parquet");

        let schema = Arc::new(Schema::new(vec![
            Field::new("Entry", DataType::Utf8, false),
            Field::new("Length", DataType::Int32, true),
            Field::new("Mass", DataType::Float64, true),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(StringArray::from(vec!["P1", "P2"])),
                Arc::new(Int32Array::from(vec![Some(595), None])),
                Arc::new(Float64Array::from(vec![Some(66216.0), None])),
            ],
        )
        .unwrap();
        let file = std::fs::File::create(&path).unwrap();
        let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let table = load_file(&path).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.cell(0, "Length"), Some(&CellValue::Integer(595)));
        assert_eq!(table.cell(0, "Mass"), Some(&CellValue::Float(66216.0)));
        assert_eq!(table.cell(1, "Length"), Some(&CellValue::Null));
        assert_eq!(table.cell(1, "Entry"), Some(&CellValue::from("P2")));
    }

    #[test]
    fn loading_twice_gives_equal_independent_tables() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "t.csv", "Entry\nP1\n");
        let a = load_file(&path).unwrap();
        let b = load_file(&path).unwrap();
        assert_eq!(a, b);
    }
}
