use std::path::Path;

use ndarray::Array2;

use super::model::{Table, CMC_COLUMNS};
use crate::error::{HarnessError, Result};

pub const DEFAULT_DATA_DIR: &str = "../data";
pub const DEFAULT_DATA_FILE: &str = "cmc.data";

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load the CMC data file and name its columns.
///
/// The raw file is headerless; the ten attribute names are assigned
/// positionally from [`CMC_COLUMNS`]. Every record must carry exactly ten
/// finite numeric fields, and the file must hold at least one record.
pub fn load_data(data_dir: impl AsRef<Path>, data_file: &str) -> Result<Table> {
    let path = data_dir.as_ref().join(data_file);
    let table = load_csv(&path)?;
    log::info!(
        "Loaded {} rows x {} columns from {}",
        table.n_rows(),
        table.n_cols(),
        path.display()
    );
    Ok(table)
}

// ---------------------------------------------------------------------------
// CSV reader / writer
// ---------------------------------------------------------------------------

fn load_csv(path: &Path) -> Result<Table> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .trim(csv::Trim::All)
        .from_path(path)?;

    let width = CMC_COLUMNS.len();
    let mut flat = Vec::new();
    let mut n_rows = 0;

    for (row_no, result) in reader.records().enumerate() {
        let record = result?;
        if record.len() != width {
            return Err(HarnessError::ColumnCount {
                row: row_no,
                expected: width,
                found: record.len(),
            });
        }
        for (col_idx, field) in record.iter().enumerate() {
            let parse_error = || HarnessError::ParseValue {
                row: row_no,
                column: CMC_COLUMNS[col_idx].to_string(),
                value: field.to_string(),
            };
            let value = field.parse::<f64>().map_err(|_| parse_error())?;
            // `parse` accepts "nan" and "inf"; the survey only has finite codes.
            if !value.is_finite() {
                return Err(parse_error());
            }
            flat.push(value);
        }
        n_rows += 1;
    }
    if n_rows == 0 {
        return Err(HarnessError::EmptyInput(format!(
            "{} has no records",
            path.display()
        )));
    }

    let values = Array2::from_shape_vec((n_rows, width), flat)?;
    Table::new(CMC_COLUMNS.iter().map(|c| c.to_string()).collect(), values)
}

/// Write a table in the same headerless layout the loader reads.
/// Integral values are written without a fractional part.
pub fn write_data(table: &Table, path: impl AsRef<Path>) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path.as_ref())?;

    for row in table.values().rows() {
        let fields: Vec<String> = row.iter().map(|&v| format_value(v)).collect();
        writer.write_record(&fields)?;
    }
    writer.flush()?;
    log::debug!("Wrote {} rows to {}", table.n_rows(), path.as_ref().display());
    Ok(())
}

fn format_value(v: f64) -> String {
    if v.fract() == 0.0 && v.is_finite() {
        format!("{}", v as i64)
    } else {
        format!("{v}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(dir: &Path, name: &str, contents: &str) {
        let mut f = std::fs::File::create(dir.join(name)).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
    }

    #[test]
    fn assigns_fixed_column_names_in_order() {
        let dir = tempfile::tempdir().unwrap();
        write_file(
            dir.path(),
            "cmc.data",
            "24,2,3,3,1,1,2,3,0,1\n45,1,3,10,1,1,3,4,0,1\n43,2,3,7,1,1,3,4,0,1\n",
        );

        let table = load_data(dir.path(), "cmc.data").unwrap();
        assert_eq!(table.columns(), &CMC_COLUMNS);
        assert_eq!(table.n_rows(), 3);
        assert_eq!(table.column("n_children").unwrap().to_vec(), vec![3.0, 10.0, 7.0]);
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_data(dir.path(), "nope.data").is_err());
    }

    #[test]
    fn wrong_column_count_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "short.data", "1,2,3\n4,5,6\n");
        let err = load_data(dir.path(), "short.data").unwrap_err();
        assert!(matches!(
            err,
            HarnessError::ColumnCount {
                expected: 10,
                found: 3,
                ..
            }
        ));
    }

    #[test]
    fn ragged_rows_are_an_error() {
        let dir = tempfile::tempdir().unwrap();
        write_file(
            dir.path(),
            "ragged.data",
            "24,2,3,3,1,1,2,3,0,1\n45,1,3,10,1,1,3,4,0\n",
        );
        assert!(load_data(dir.path(), "ragged.data").is_err());
    }

    #[test]
    fn non_numeric_cell_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "bad.data", "24,2,3,x,1,1,2,3,0,1\n");
        let err = load_data(dir.path(), "bad.data").unwrap_err();
        assert!(matches!(err, HarnessError::ParseValue { ref column, .. } if column == "n_children"));
    }

    #[test]
    fn nan_cell_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut contents = String::new();
        for i in 0..20 {
            let age = if i == 7 { "nan".to_string() } else { (20 + i).to_string() };
            contents.push_str(&format!("{age},2,3,3,1,1,2,3,0,1\n"));
        }
        write_file(dir.path(), "nan.data", &contents);

        let err = load_data(dir.path(), "nan.data").unwrap_err();
        assert!(matches!(
            err,
            HarnessError::ParseValue { row: 7, ref column, ref value } if column == "wife_age" && value == "nan"
        ));
    }

    #[test]
    fn infinite_cell_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "inf.data", "24,2,3,inf,1,1,2,3,0,1\n");
        let err = load_data(dir.path(), "inf.data").unwrap_err();
        assert!(matches!(err, HarnessError::ParseValue { ref column, .. } if column == "n_children"));
    }

    #[test]
    fn empty_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "empty.data", "");
        assert!(matches!(
            load_data(dir.path(), "empty.data"),
            Err(HarnessError::EmptyInput(_))
        ));
    }

    #[test]
    fn write_then_load_preserves_values() {
        let dir = tempfile::tempdir().unwrap();
        let table = Table::from_rows(
            &CMC_COLUMNS,
            &[
                vec![24.0, 2.0, 3.0, 3.0, 1.0, 1.0, 2.0, 3.0, 0.0, 1.0],
                vec![31.0, 4.0, 4.0, 2.0, 0.0, 0.0, 1.0, 4.0, 1.0, 3.0],
            ],
        )
        .unwrap();
        write_data(&table, dir.path().join("out.data")).unwrap();

        let text = std::fs::read_to_string(dir.path().join("out.data")).unwrap();
        assert!(text.starts_with("24,2,3,3,1,1,2,3,0,1\n"));
        assert_eq!(load_data(dir.path(), "out.data").unwrap(), table);
    }
}
